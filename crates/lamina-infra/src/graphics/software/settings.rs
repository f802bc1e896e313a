// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Device creation settings, loadable from JSON.

use lamina_core::renderer::api::enums::{CullMode, FillMode, TextureFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// An error raised while loading or validating a [`DeviceDescriptor`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read device settings from {path}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The JSON was malformed or had unexpected fields.
    #[error("failed to parse device settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// The values were parsed but are unusable.
    #[error("invalid device settings: {0}")]
    Invalid(String),
}

/// How to create a device and, unless compute-only, its swap chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceDescriptor {
    /// The adapter to create the device on.
    pub adapter_index: u32,
    /// Only create the device and its immediate context, no swap chain.
    pub compute_only: bool,
    /// Title of the output window.
    pub window_name: String,
    /// Backbuffer width in pixels.
    pub width: u32,
    /// Backbuffer height in pixels.
    pub height: u32,
    /// Backbuffer format.
    pub backbuffer_format: TextureFormat,
    /// Backbuffer multisample count.
    pub sample_count: u32,
    /// Allow unordered access to the backbuffer, so compute shaders can write it.
    pub backbuffer_unordered_access: bool,
    /// Allow shaders to read the backbuffer.
    pub backbuffer_shader_input: bool,
    /// Format of the depth buffer created with the swap chain, `None` for no depth buffer.
    pub depth_format: Option<TextureFormat>,
    /// Default face culling of the rasterizer state created with the device.
    pub cull_mode: CullMode,
    /// Default fill mode of the rasterizer state created with the device.
    pub fill_mode: FillMode,
    /// Record binding violations the way a native debug layer reports them.
    pub debug_layer: bool,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            compute_only: false,
            window_name: "Lamina".to_owned(),
            width: 1024,
            height: 1024,
            backbuffer_format: TextureFormat::Rgba8Unorm,
            sample_count: 1,
            backbuffer_unordered_access: false,
            backbuffer_shader_input: false,
            depth_format: Some(TextureFormat::Depth24PlusStencil8),
            cull_mode: CullMode::Back,
            fill_mode: FillMode::Solid,
            debug_layer: true,
        }
    }
}

impl DeviceDescriptor {
    /// Parses settings from a JSON document. Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let descriptor: Self = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading device settings from {}", path.display());
        Self::from_json(&json)
    }

    /// Checks the values are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compute_only {
            return Ok(());
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "backbuffer size {}x{} is empty",
                self.width, self.height
            )));
        }
        if !matches!(self.sample_count, 1 | 2 | 4 | 8) {
            return Err(ConfigError::Invalid(format!(
                "sample count {} is not 1, 2, 4 or 8",
                self.sample_count
            )));
        }
        if self.backbuffer_format.is_depth() || self.backbuffer_format == TextureFormat::Unknown {
            return Err(ConfigError::Invalid(format!(
                "{:?} cannot be a backbuffer format",
                self.backbuffer_format
            )));
        }
        if let Some(depth) = self.depth_format {
            if !depth.is_depth() {
                return Err(ConfigError::Invalid(format!(
                    "{depth:?} is not a depth format"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let descriptor = DeviceDescriptor::from_json(r#"{ "width": 640, "height": 480 }"#).unwrap();
        assert_eq!(descriptor.width, 640);
        assert_eq!(descriptor.window_name, "Lamina");
        assert_eq!(descriptor.depth_format, Some(TextureFormat::Depth24PlusStencil8));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = DeviceDescriptor::from_json(r#"{ "widht": 640 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_backbuffer_is_rejected_unless_compute_only() {
        let err = DeviceDescriptor::from_json(r#"{ "width": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let compute = DeviceDescriptor::from_json(r#"{ "width": 0, "compute_only": true }"#);
        assert!(compute.is_ok());
    }

    #[test]
    fn depth_format_must_be_a_depth_format() {
        let err = DeviceDescriptor::from_json(r#"{ "depth_format": "Rgba8Unorm" }"#).unwrap_err();
        assert!(err.to_string().contains("not a depth format"));
    }

    #[test]
    fn load_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "window_name": "Test", "backbuffer_unordered_access": true }}"#).unwrap();

        let descriptor = DeviceDescriptor::load(file.path()).unwrap();

        assert_eq!(descriptor.window_name, "Test");
        assert!(descriptor.backbuffer_unordered_access);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = DeviceDescriptor::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
