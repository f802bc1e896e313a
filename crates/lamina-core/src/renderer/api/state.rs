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

//! Fixed-function state descriptors and the vertex layout.

use super::enums::{CompareFunction, CullMode, FillMode, VertexFormat};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A viewport rectangle with its depth range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Minimum depth, usually 0.
    pub min_depth: f32,
    /// Maximum depth, usually 1.
    pub max_depth: f32,
}

impl Viewport {
    /// A viewport covering `width` x `height` pixels with the full depth range.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// One attribute of a vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexElement {
    /// The semantic name the vertex shader reads it under (e.g. `POSITION`).
    pub semantic: Cow<'static, str>,
    /// The semantic index (e.g. `TEXCOORD1` has index 1).
    pub semantic_index: u32,
    /// The attribute format.
    pub format: VertexFormat,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

/// The layout of a single interleaved vertex stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexLayout {
    /// The attributes, in declaration order.
    pub elements: Vec<VertexElement>,
}

impl VertexLayout {
    /// Builds a tightly packed layout, computing offsets in declaration order.
    pub fn packed(attributes: &[(&'static str, VertexFormat)]) -> Self {
        let mut offset = 0;
        let elements = attributes
            .iter()
            .map(|(semantic, format)| {
                let element = VertexElement {
                    semantic: Cow::Borrowed(*semantic),
                    semantic_index: 0,
                    format: *format,
                    offset,
                };
                offset += format.size();
                element
            })
            .collect();
        Self { elements }
    }

    /// The byte distance between two consecutive vertices.
    pub fn stride(&self) -> u32 {
        self.elements
            .iter()
            .map(|e| e.offset + e.format.size())
            .max()
            .unwrap_or(0)
    }
}

/// Describes a rasterizer state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RasterStateDescriptor {
    /// Polygon fill.
    pub fill_mode: FillMode,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Counter-clockwise triangles are front facing.
    pub front_counter_clockwise: bool,
    /// Clip against the depth range.
    pub depth_clip: bool,
    /// Enable the scissor test.
    pub scissor: bool,
}

/// Describes a depth/stencil state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepthStencilStateDescriptor {
    /// Enable the depth test.
    pub depth_enabled: bool,
    /// Write passing depth values.
    pub depth_write: bool,
    /// The depth comparison.
    pub depth_compare: CompareFunction,
    /// Enable the stencil test.
    pub stencil_enabled: bool,
}

impl Default for DepthStencilStateDescriptor {
    fn default() -> Self {
        Self {
            depth_enabled: true,
            depth_write: true,
            depth_compare: CompareFunction::Less,
            stencil_enabled: false,
        }
    }
}

/// Describes a blend state object for the first render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlendStateDescriptor {
    /// Enable blending.
    pub enabled: bool,
    /// Use the blend factor constant as source weight instead of source alpha.
    pub use_blend_factor: bool,
    /// Enable alpha-to-coverage.
    pub alpha_to_coverage: bool,
}
