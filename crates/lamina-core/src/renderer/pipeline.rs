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

//! The pipeline state snapshot.
//!
//! A snapshot describes everything bound to the pipeline. `None` fields and
//! empty lists mean "not specified": the binder leaves the matching native
//! state untouched. List entries may be `None` to leave an explicit hole
//! inside a contiguous slot range.

use crate::renderer::api::{
    enums::{IndexFormat, PrimitiveTopology, ShaderStage},
    handles::*,
    resource::Owned,
    state::{VertexLayout, Viewport},
};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDevice;
use std::sync::Arc;

/// Input assembler bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshContext {
    /// The vertex buffer of the single vertex stream.
    pub vertex_buffer: Option<BufferId>,
    /// Bytes between consecutive vertices.
    pub vertex_stride: u32,
    /// The index buffer.
    pub index_buffer: Option<BufferId>,
    /// Format of the indices.
    pub index_format: IndexFormat,
    /// Primitive assembly mode.
    pub topology: Option<PrimitiveTopology>,
    /// The input layout.
    pub input_layout: Option<InputLayoutId>,
}

/// The bindings of one programmable stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderContext {
    /// The shader program.
    pub shader: Option<ShaderId>,
    /// Shader resource views, slot-indexed from 0.
    pub resources: Vec<Option<ShaderResourceViewId>>,
    /// Constant buffers, slot-indexed from 0.
    pub constant_buffers: Vec<Option<BufferId>>,
    /// Samplers, slot-indexed from 0.
    pub samplers: Vec<Option<SamplerId>>,
}

/// Output merger, rasterizer and compute output bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputContext {
    /// Render targets, slot-indexed from 0.
    pub render_targets: Vec<Option<RenderTargetViewId>>,
    /// Unordered access views of the output merger, placed after the render targets.
    pub unordered_access_views: Vec<Option<UnorderedAccessViewId>>,
    /// Unordered access views of the compute stage, slot-indexed from 0.
    pub compute_unordered_access_views: Vec<Option<UnorderedAccessViewId>>,
    /// The depth/stencil attachment.
    pub depth_stencil_view: Option<DepthStencilViewId>,
    /// Viewports, slot-indexed from 0.
    pub viewports: Vec<Viewport>,
    /// The rasterizer state.
    pub raster_state: Option<RasterStateId>,
    /// The depth/stencil state.
    pub depth_stencil_state: Option<DepthStencilStateId>,
    /// Stencil reference value bound with the depth/stencil state.
    pub stencil_ref: u32,
    /// The blend state.
    pub blend_state: Option<BlendStateId>,
    /// Constant blend factors bound with the blend state.
    pub blend_factors: [f32; 4],
}

impl Default for OutputContext {
    fn default() -> Self {
        Self {
            render_targets: Vec::new(),
            unordered_access_views: Vec::new(),
            compute_unordered_access_views: Vec::new(),
            depth_stencil_view: None,
            viewports: Vec::new(),
            raster_state: None,
            depth_stencil_state: None,
            stencil_ref: 0,
            blend_state: None,
            blend_factors: [1.0; 4],
        }
    }
}

/// A full description of the pipeline state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStateSnapshot {
    /// Input assembler bindings.
    pub mesh: MeshContext,
    /// Per-stage bindings, indexed by [`ShaderStage::index`].
    pub shaders: [ShaderContext; ShaderStage::COUNT],
    /// Output bindings.
    pub output: OutputContext,
}

impl PipelineStateSnapshot {
    /// The bindings of `stage`.
    pub fn stage(&self, stage: ShaderStage) -> &ShaderContext {
        &self.shaders[stage.index()]
    }

    /// The bindings of `stage`, mutably.
    pub fn stage_mut(&mut self, stage: ShaderStage) -> &mut ShaderContext {
        &mut self.shaders[stage.index()]
    }

    /// Creates an input layout for `layout` against the vertex shader of this
    /// snapshot and stores it, with the matching stride, in the mesh context.
    ///
    /// Fails with [`ResourceError::MissingShader`] when no vertex shader is set.
    pub fn build_input_layout(
        &mut self,
        device: &Arc<dyn GraphicsDevice>,
        layout: &VertexLayout,
    ) -> Result<Owned<InputLayoutId>, ResourceError> {
        let vertex_shader = self
            .stage(ShaderStage::Vertex)
            .shader
            .ok_or(ResourceError::MissingShader {
                stage: ShaderStage::Vertex,
            })?;
        let id = device.create_input_layout(layout, vertex_shader)?;
        self.mesh.input_layout = Some(id);
        self.mesh.vertex_stride = layout.stride();
        Ok(Owned::new(device.clone(), id))
    }
}
