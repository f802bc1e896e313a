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

//! Generic rendering enums.

use serde::{Deserialize, Serialize};

/// One of the programmable stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The hull (tessellation control) stage.
    Hull,
    /// The domain (tessellation evaluation) stage.
    Domain,
    /// The geometry shader stage.
    Geometry,
    /// The pixel shader stage.
    Pixel,
    /// The compute shader stage.
    Compute,
}

impl ShaderStage {
    /// The number of stages.
    pub const COUNT: usize = 6;

    /// Every stage, in pipeline order.
    pub const ALL: [ShaderStage; Self::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Geometry,
        ShaderStage::Pixel,
        ShaderStage::Compute,
    ];

    /// The position of the stage in [`ShaderStage::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name used in logs and traces.
    pub const fn short_name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VS",
            ShaderStage::Hull => "HS",
            ShaderStage::Domain => "DS",
            ShaderStage::Geometry => "GS",
            ShaderStage::Pixel => "PS",
            ShaderStage::Compute => "CS",
        }
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    PointList,
    /// Each pair of vertices is a line.
    LineList,
    /// Consecutive vertices form a connected line.
    LineStrip,
    /// Each triplet of vertices is a triangle.
    #[default]
    TriangleList,
    /// Consecutive vertices form a triangle strip.
    TriangleStrip,
    /// Patches of N control points, consumed by the tessellation stages.
    PatchList(u8),
}

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    #[default]
    Uint32,
}

impl IndexFormat {
    /// Size of a single index in bytes.
    pub const fn size(self) -> u32 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// Defines the memory format of texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// Format chosen from the view or buffer structure.
    Unknown,
    /// Four 8-bit unsigned normalized components (RGBA).
    #[default]
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (BGRA).
    Bgra8Unorm,
    /// Four 16-bit float components.
    Rgba16Float,
    /// One 32-bit float component.
    R32Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// One 32-bit unsigned integer component.
    R32Uint,
    /// 24-bit depth with an 8-bit stencil.
    Depth24PlusStencil8,
    /// 32-bit float depth.
    Depth32Float,
}

impl TextureFormat {
    /// Bytes per texel, zero for [`TextureFormat::Unknown`].
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Unknown => 0,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Bgra8Unorm
            | TextureFormat::R32Float
            | TextureFormat::R32Uint
            | TextureFormat::Depth24PlusStencil8
            | TextureFormat::Depth32Float => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }

    /// Returns `true` for depth and depth/stencil formats.
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth24PlusStencil8 | TextureFormat::Depth32Float
        )
    }
}

/// The format of one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// One 32-bit unsigned integer.
    Uint32,
    /// Four 8-bit unsigned normalized values.
    Unorm8x4,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub const fn size(self) -> u32 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 | VertexFormat::Unorm8x4 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// Which triangle faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    /// Draw every triangle.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    #[default]
    Back,
}

/// How triangles are filled when rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Fill the interior.
    #[default]
    Solid,
    /// Draw edges only.
    Wireframe,
}

/// The expected CPU/GPU access pattern of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceUsage {
    /// GPU read/write, CPU updates through copies.
    #[default]
    Default,
    /// GPU read only, contents fixed at creation.
    Immutable,
    /// GPU read only, CPU writes every frame.
    Dynamic,
    /// CPU readback target.
    Staging,
}

/// A comparison used by depth/stencil tests and comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less than the existing one.
    #[default]
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the new value is less than or equal.
    LessEqual,
    /// Passes if the new value is greater.
    Greater,
    /// Passes if the values differ.
    NotEqual,
    /// Passes if the new value is greater than or equal.
    GreaterEqual,
    /// Always passes.
    Always,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_index_matches_all_order() {
        for (i, stage) in ShaderStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        assert_eq!(ShaderStage::Compute.short_name(), "CS");
    }

    #[test]
    fn format_sizes() {
        assert_eq!(TextureFormat::Rgba8Unorm.bytes_per_pixel(), 4);
        assert_eq!(TextureFormat::Rgba32Float.bytes_per_pixel(), 16);
        assert!(TextureFormat::Depth32Float.is_depth());
        assert!(!TextureFormat::R32Float.is_depth());
        assert_eq!(VertexFormat::Float32x3.size(), 12);
        assert_eq!(IndexFormat::Uint16.size(), 2);
    }
}
