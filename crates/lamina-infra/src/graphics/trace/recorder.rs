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

//! A context that records what it forwards.

use super::command::{CommandList, ContextCommand};
use lamina_core::renderer::api::{
    enums::{IndexFormat, PrimitiveTopology, ShaderStage},
    handles::*,
    state::Viewport,
};
use lamina_core::renderer::traits::{DeviceContext, ViewResolver};

/// Forwards every call to an inner context and records it.
#[derive(Debug)]
pub struct RecordingContext<C> {
    inner: C,
    commands: CommandList,
}

impl<C: DeviceContext> RecordingContext<C> {
    /// Starts recording calls made on `inner`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            commands: CommandList::new(),
        }
    }

    /// The wrapped context.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The wrapped context, for calls that should not be recorded.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// What has been recorded so far.
    pub fn commands(&self) -> &CommandList {
        &self.commands
    }

    /// Returns the recorded list and starts a new one.
    pub fn take_commands(&mut self) -> CommandList {
        std::mem::take(&mut self.commands)
    }

    /// Stops recording.
    pub fn into_parts(self) -> (C, CommandList) {
        (self.inner, self.commands)
    }

    fn record(&mut self, command: ContextCommand) {
        command.apply(&mut self.inner);
        self.commands.push(command);
    }
}

impl<C: DeviceContext> ViewResolver for RecordingContext<C> {
    fn resource_of(&self, view: ViewId) -> Option<ResourceId> {
        self.inner.resource_of(view)
    }
}

impl<C: DeviceContext> DeviceContext for RecordingContext<C> {
    fn set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat) {
        self.record(ContextCommand::SetIndexBuffer(buffer, format));
    }

    fn set_vertex_buffer(&mut self, buffer: Option<BufferId>, stride: u32) {
        self.record(ContextCommand::SetVertexBuffer(buffer, stride));
    }

    fn set_input_layout(&mut self, layout: Option<InputLayoutId>) {
        self.record(ContextCommand::SetInputLayout(layout));
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.record(ContextCommand::SetPrimitiveTopology(topology));
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.record(ContextCommand::SetViewports(viewports.to_vec()));
    }

    fn set_raster_state(&mut self, state: Option<RasterStateId>) {
        self.record(ContextCommand::SetRasterState(state));
    }

    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>, stencil_ref: u32) {
        self.record(ContextCommand::SetDepthStencilState(state, stencil_ref));
    }

    fn set_blend_state(&mut self, state: Option<BlendStateId>, blend_factors: [f32; 4]) {
        self.record(ContextCommand::SetBlendState(state, blend_factors));
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: Option<ShaderId>) {
        self.record(ContextCommand::SetShader(stage, shader));
    }

    fn set_constant_buffers(&mut self, stage: ShaderStage, start_slot: u32, buffers: &[Option<BufferId>]) {
        self.record(ContextCommand::SetConstantBuffers {
            stage,
            start_slot,
            buffers: buffers.to_vec(),
        });
    }

    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<SamplerId>]) {
        self.record(ContextCommand::SetSamplers {
            stage,
            start_slot,
            samplers: samplers.to_vec(),
        });
    }

    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Option<ShaderResourceViewId>],
    ) {
        self.record(ContextCommand::SetShaderResources {
            stage,
            start_slot,
            views: views.to_vec(),
        });
    }

    fn set_output_merger(
        &mut self,
        render_targets: &[Option<RenderTargetViewId>],
        depth_stencil: Option<DepthStencilViewId>,
        unordered_access_views: &[Option<UnorderedAccessViewId>],
    ) {
        self.record(ContextCommand::SetOutputMerger {
            render_targets: render_targets.to_vec(),
            depth_stencil,
            unordered_access_views: unordered_access_views.to_vec(),
        });
    }

    fn set_compute_unordered_access_views(
        &mut self,
        start_slot: u32,
        views: &[Option<UnorderedAccessViewId>],
    ) {
        self.record(ContextCommand::SetComputeUnorderedAccessViews {
            start_slot,
            views: views.to_vec(),
        });
    }

    fn clear_render_target(&mut self, view: RenderTargetViewId, color: [f32; 4]) {
        self.record(ContextCommand::ClearRenderTarget(view, color));
    }

    fn clear_depth_stencil(&mut self, view: DepthStencilViewId, depth: f32, stencil: u8) {
        self.record(ContextCommand::ClearDepthStencil(view, depth, stencil));
    }

    fn draw(&mut self, vertex_count: u32, start_vertex: u32) {
        self.record(ContextCommand::Draw {
            vertex_count,
            start_vertex,
        });
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        self.record(ContextCommand::DrawIndexed {
            index_count,
            start_index,
            base_vertex,
        });
    }

    fn dispatch(&mut self, groups: [u32; 3]) {
        self.record(ContextCommand::Dispatch(groups));
    }
}
