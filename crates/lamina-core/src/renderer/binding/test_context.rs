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

//! A recording context for binder tests.

use crate::renderer::api::{
    enums::{IndexFormat, PrimitiveTopology, ShaderStage},
    handles::*,
    state::Viewport,
};
use crate::renderer::traits::{DeviceContext, ViewResolver};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    IndexBuffer(Option<BufferId>, IndexFormat),
    VertexBuffer(Option<BufferId>, u32),
    InputLayout(Option<InputLayoutId>),
    Topology(PrimitiveTopology),
    Viewports(Vec<Viewport>),
    RasterState(Option<RasterStateId>),
    DepthStencilState(Option<DepthStencilStateId>, u32),
    BlendState(Option<BlendStateId>, [f32; 4]),
    Shader(ShaderStage, Option<ShaderId>),
    ConstantBuffers(ShaderStage, u32, Vec<Option<BufferId>>),
    Samplers(ShaderStage, u32, Vec<Option<SamplerId>>),
    ShaderResources(ShaderStage, u32, Vec<Option<ShaderResourceViewId>>),
    OutputMerger(
        Vec<Option<RenderTargetViewId>>,
        Option<DepthStencilViewId>,
        Vec<Option<UnorderedAccessViewId>>,
    ),
    ComputeUavs(u32, Vec<Option<UnorderedAccessViewId>>),
    Other,
}

impl Call {
    /// `true` for a call made only of null bindings.
    pub(crate) fn is_clear(&self) -> bool {
        match self {
            Call::ShaderResources(_, _, views) => views.iter().all(Option::is_none),
            Call::OutputMerger(rtvs, dsv, uavs) => {
                rtvs.iter().all(Option::is_none) && dsv.is_none() && uavs.iter().all(Option::is_none)
            }
            Call::ComputeUavs(_, views) => views.iter().all(Option::is_none),
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockContext {
    views: HashMap<ViewId, ResourceId>,
    pub(crate) calls: Vec<Call>,
}

/// The views of one mock texture.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MockTexture {
    pub(crate) resource: ResourceId,
    pub(crate) srv: ShaderResourceViewId,
    pub(crate) rtv: RenderTargetViewId,
    pub(crate) uav: UnorderedAccessViewId,
    pub(crate) dsv: DepthStencilViewId,
}

impl MockContext {
    /// Registers a texture `id` with one view of each kind, all numbered `id`.
    pub(crate) fn texture(&mut self, id: usize) -> MockTexture {
        let resource = ResourceId::Texture(TextureId(id));
        let texture = MockTexture {
            resource,
            srv: ShaderResourceViewId(id),
            rtv: RenderTargetViewId(id),
            uav: UnorderedAccessViewId(id),
            dsv: DepthStencilViewId(id),
        };
        self.views.insert(texture.srv.into(), resource);
        self.views.insert(texture.rtv.into(), resource);
        self.views.insert(texture.uav.into(), resource);
        self.views.insert(texture.dsv.into(), resource);
        texture
    }

    pub(crate) fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }
}

impl ViewResolver for MockContext {
    fn resource_of(&self, view: ViewId) -> Option<ResourceId> {
        self.views.get(&view).copied()
    }
}

impl DeviceContext for MockContext {
    fn set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat) {
        self.calls.push(Call::IndexBuffer(buffer, format));
    }

    fn set_vertex_buffer(&mut self, buffer: Option<BufferId>, stride: u32) {
        self.calls.push(Call::VertexBuffer(buffer, stride));
    }

    fn set_input_layout(&mut self, layout: Option<InputLayoutId>) {
        self.calls.push(Call::InputLayout(layout));
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.calls.push(Call::Topology(topology));
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.calls.push(Call::Viewports(viewports.to_vec()));
    }

    fn set_raster_state(&mut self, state: Option<RasterStateId>) {
        self.calls.push(Call::RasterState(state));
    }

    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>, stencil_ref: u32) {
        self.calls.push(Call::DepthStencilState(state, stencil_ref));
    }

    fn set_blend_state(&mut self, state: Option<BlendStateId>, blend_factors: [f32; 4]) {
        self.calls.push(Call::BlendState(state, blend_factors));
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: Option<ShaderId>) {
        self.calls.push(Call::Shader(stage, shader));
    }

    fn set_constant_buffers(&mut self, stage: ShaderStage, start_slot: u32, buffers: &[Option<BufferId>]) {
        self.calls
            .push(Call::ConstantBuffers(stage, start_slot, buffers.to_vec()));
    }

    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<SamplerId>]) {
        self.calls
            .push(Call::Samplers(stage, start_slot, samplers.to_vec()));
    }

    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Option<ShaderResourceViewId>],
    ) {
        self.calls
            .push(Call::ShaderResources(stage, start_slot, views.to_vec()));
    }

    fn set_output_merger(
        &mut self,
        render_targets: &[Option<RenderTargetViewId>],
        depth_stencil: Option<DepthStencilViewId>,
        unordered_access_views: &[Option<UnorderedAccessViewId>],
    ) {
        self.calls.push(Call::OutputMerger(
            render_targets.to_vec(),
            depth_stencil,
            unordered_access_views.to_vec(),
        ));
    }

    fn set_compute_unordered_access_views(
        &mut self,
        start_slot: u32,
        views: &[Option<UnorderedAccessViewId>],
    ) {
        self.calls.push(Call::ComputeUavs(start_slot, views.to_vec()));
    }

    fn clear_render_target(&mut self, _view: RenderTargetViewId, _color: [f32; 4]) {
        self.calls.push(Call::Other);
    }

    fn clear_depth_stencil(&mut self, _view: DepthStencilViewId, _depth: f32, _stencil: u8) {
        self.calls.push(Call::Other);
    }

    fn draw(&mut self, _vertex_count: u32, _start_vertex: u32) {
        self.calls.push(Call::Other);
    }

    fn draw_indexed(&mut self, _index_count: u32, _start_index: u32, _base_vertex: i32) {
        self.calls.push(Call::Other);
    }

    fn dispatch(&mut self, _groups: [u32; 3]) {
        self.calls.push(Call::Other);
    }
}
