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

use crate::renderer::api::{
    enums::{IndexFormat, PrimitiveTopology, ShaderStage},
    handles::*,
    state::Viewport,
};

/// Maps any view to the storage resource behind it.
///
/// Hazard tracking relies on this: an SRV and an RTV of the same texture must
/// resolve to the same [`ResourceId`].
pub trait ViewResolver {
    /// Returns the resource `view` was created for, or `None` for an unknown view.
    fn resource_of(&self, view: ViewId) -> Option<ResourceId>;
}

/// An immediate context issuing native state-setting calls.
///
/// Every setter is infallible: the native calls return nothing and an invalid
/// argument is only reported by a debug layer. Slot setters write
/// `views.len()` consecutive slots starting at `start_slot` and leave the other
/// slots alone, except [`DeviceContext::set_output_merger`] which replaces the
/// whole output-merger binding.
pub trait DeviceContext: ViewResolver {
    /// Binds the index buffer.
    fn set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat);

    /// Binds the vertex buffer of the single vertex stream.
    fn set_vertex_buffer(&mut self, buffer: Option<BufferId>, stride: u32);

    /// Binds the input layout.
    fn set_input_layout(&mut self, layout: Option<InputLayoutId>);

    /// Sets the primitive topology.
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    /// Replaces every viewport; an empty slice unbinds them all.
    fn set_viewports(&mut self, viewports: &[Viewport]);

    /// Binds the rasterizer state.
    fn set_raster_state(&mut self, state: Option<RasterStateId>);

    /// Binds the depth/stencil state with its stencil reference value.
    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>, stencil_ref: u32);

    /// Binds the blend state with its constant blend factors.
    fn set_blend_state(&mut self, state: Option<BlendStateId>, blend_factors: [f32; 4]);

    /// Binds the shader program of `stage`.
    fn set_shader(&mut self, stage: ShaderStage, shader: Option<ShaderId>);

    /// Binds constant buffers of `stage`.
    fn set_constant_buffers(&mut self, stage: ShaderStage, start_slot: u32, buffers: &[Option<BufferId>]);

    /// Binds samplers of `stage`.
    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<SamplerId>]);

    /// Binds shader resource views of `stage`.
    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Option<ShaderResourceViewId>],
    );

    /// Replaces the render targets, the depth/stencil view and the
    /// output-merger unordered access views in one call.
    ///
    /// Slots past the end of each slice are unbound.
    fn set_output_merger(
        &mut self,
        render_targets: &[Option<RenderTargetViewId>],
        depth_stencil: Option<DepthStencilViewId>,
        unordered_access_views: &[Option<UnorderedAccessViewId>],
    );

    /// Binds unordered access views of the compute stage.
    fn set_compute_unordered_access_views(
        &mut self,
        start_slot: u32,
        views: &[Option<UnorderedAccessViewId>],
    );

    /// Fills a render target with a color.
    fn clear_render_target(&mut self, view: RenderTargetViewId, color: [f32; 4]);

    /// Resets the depth and stencil planes of a depth/stencil view.
    fn clear_depth_stencil(&mut self, view: DepthStencilViewId, depth: f32, stencil: u8);

    /// Draws non-indexed primitives.
    fn draw(&mut self, vertex_count: u32, start_vertex: u32);

    /// Draws indexed primitives.
    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32);

    /// Runs the bound compute shader over `groups` thread groups.
    fn dispatch(&mut self, groups: [u32; 3]);
}
