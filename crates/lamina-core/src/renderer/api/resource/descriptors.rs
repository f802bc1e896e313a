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

//! Descriptors for buffers, textures, views and samplers.

use crate::lamina_bitflags;
use crate::renderer::api::enums::{CompareFunction, ResourceUsage, TextureFormat};
use serde::{Deserialize, Serialize};

lamina_bitflags! {
    /// How a resource may be bound to the pipeline.
    ///
    /// A view of a given kind can only be created for a resource carrying the
    /// matching flag.
    pub struct BindFlags: u32 {
        /// Readable from shaders through a shader resource view.
        const SHADER_RESOURCE = 1 << 0;
        /// Writable as a render target.
        const RENDER_TARGET = 1 << 1;
        /// Writable as a depth/stencil target.
        const DEPTH_STENCIL = 1 << 2;
        /// Read/write through an unordered access view.
        const UNORDERED_ACCESS = 1 << 3;
        /// Bindable as a vertex buffer.
        const VERTEX_BUFFER = 1 << 4;
        /// Bindable as an index buffer.
        const INDEX_BUFFER = 1 << 5;
        /// Bindable as a constant buffer.
        const CONSTANT_BUFFER = 1 << 6;
    }
}

/// A descriptor used to create a 2D [`TextureId`](crate::renderer::api::handles::TextureId).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format.
    pub format: TextureFormat,
    /// Number of mip levels.
    pub mip_levels: u32,
    /// Samples per texel.
    pub sample_count: u32,
    /// Multisample quality level.
    pub sample_quality: u32,
    /// Access pattern.
    pub usage: ResourceUsage,
    /// Allowed bindings.
    pub bind: BindFlags,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 0,
            height: 0,
            format: TextureFormat::Rgba8Unorm,
            mip_levels: 1,
            sample_count: 1,
            sample_quality: 0,
            usage: ResourceUsage::Default,
            bind: BindFlags::SHADER_RESOURCE,
        }
    }
}

impl TextureDescriptor {
    /// Size in bytes of the top mip level.
    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}

/// A descriptor used to create a [`BufferId`](crate::renderer::api::handles::BufferId).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Access pattern.
    pub usage: ResourceUsage,
    /// Allowed bindings.
    pub bind: BindFlags,
    /// Element stride of a structured buffer, zero otherwise.
    pub structure_stride: u32,
}

/// Selects what part of a resource a view exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewDescriptor {
    /// View format; `None` reuses the resource format.
    pub format: Option<TextureFormat>,
    /// Mip level for texture views.
    pub mip_slice: u32,
    /// First element for buffer views.
    pub first_element: u32,
    /// Element count for buffer views; `None` covers the rest of the buffer.
    pub element_count: Option<u32>,
}

/// Texture filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest texel.
    Point,
    /// Linear interpolation.
    #[default]
    Linear,
    /// Anisotropic filtering.
    Anisotropic,
}

/// Handling of coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressMode {
    /// Repeat the texture.
    #[default]
    Wrap,
    /// Repeat with mirroring.
    Mirror,
    /// Clamp to the edge texel.
    Clamp,
    /// Use the border color.
    Border,
}

/// A descriptor used to create a [`SamplerId`](crate::renderer::api::handles::SamplerId).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplerDescriptor {
    /// Filtering.
    pub filter: FilterMode,
    /// Addressing on all three axes.
    pub address: AddressMode,
    /// Comparison for shadow sampling.
    pub compare: Option<CompareFunction>,
    /// Anisotropy clamp, from 1 to 16.
    pub max_anisotropy: u8,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            filter: FilterMode::Linear,
            address: AddressMode::Wrap,
            compare: None,
            max_anisotropy: 1,
        }
    }
}
