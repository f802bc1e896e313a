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

//! The pipeline state binder.
//!
//! The binder keeps a copy of what it last bound and, for each new snapshot,
//! only issues the native calls whose state changed. It also resolves
//! read/write hazards: a resource about to be bound as an output is first
//! unbound from every stage reading it, and a resource about to be read is
//! first unbound from the output it was written through.
//!
//! A call runs in seven phases:
//!
//! 1. input assembler bindings;
//! 2. viewports and fixed-function states, while render targets, the
//!    depth/stencil view and unordered access views are only staged;
//! 3. shader programs;
//! 4. constant buffers and samplers;
//! 5. shader resource views, staged;
//! 6. forced clears of the hazards found in phases 2 and 5;
//! 7. the staged output and shader resource bindings.

use super::registry::{BoundResourceRegistry, OutputUsage};
use crate::renderer::api::{
    enums::ShaderStage,
    handles::{ResourceId, ShaderResourceViewId, ViewId},
    limits::{RENDER_TARGET_SLOT_COUNT, SHADER_RESOURCE_SLOT_COUNT, UNORDERED_ACCESS_SLOT_COUNT},
};
use crate::renderer::pipeline::{
    MeshContext, OutputContext, PipelineStateSnapshot, ShaderContext,
};
use crate::renderer::traits::DeviceContext;

/// A group of bindings [`PipelineStateBinder::clear`] unbinds at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClearTarget {
    /// The shader, constant buffers, samplers and shader resource views of a
    /// stage, plus the compute unordered access views for the compute stage.
    Stage(ShaderStage),
    /// Render targets, depth/stencil view, output-merger unordered access
    /// views, viewports and the rasterizer, depth and blend states.
    OutputMerger,
    /// Vertex buffer, index buffer and input layout.
    Mesh,
}

/// Clears and rebinds gathered during phases 2 and 5.
#[derive(Debug, Default)]
struct Deferred {
    clear_compute_uavs: bool,
    clear_output_merger: bool,
    clear_resources: [bool; ShaderStage::COUNT],
    rebind_output_merger: bool,
    /// Width of the compute UAV rebind.
    rebind_compute_uavs: Option<usize>,
    /// Width of the shader resource rebind of each stage.
    rebind_resources: [Option<usize>; ShaderStage::COUNT],
}

/// `true` when a specified `next` list must replace `current`.
fn list_changed<T: PartialEq>(first: bool, current: &[T], next: &[T]) -> bool {
    !next.is_empty() && (first || current != next)
}

/// `list` extended with nulls up to `width`, so slots a shorter list no
/// longer covers get unbound.
fn padded<T: Copy>(list: &[Option<T>], width: usize) -> Vec<Option<T>> {
    let mut out = list.to_vec();
    out.resize(width.max(list.len()), None);
    out
}

/// Diffs pipeline state snapshots into native bind calls.
///
/// The binder belongs to a single context and is driven from the thread
/// owning it. It only tracks handles; it never keeps resources alive.
#[derive(Debug, Default)]
pub struct PipelineStateBinder {
    current: PipelineStateSnapshot,
    registry: BoundResourceRegistry,
}

impl PipelineStateBinder {
    /// A binder with nothing recorded; its first [`bind`](Self::bind) binds
    /// every specified field.
    pub fn new() -> Self {
        Self::default()
    }

    /// The state the binder believes is bound.
    pub fn current(&self) -> &PipelineStateSnapshot {
        &self.current
    }

    /// The bound-resource registry.
    pub fn registry(&self) -> &BoundResourceRegistry {
        &self.registry
    }

    /// Forgets everything recorded, for instance after the native context
    /// state was reset behind the binder's back.
    pub fn invalidate(&mut self) {
        self.current = PipelineStateSnapshot::default();
        self.registry.reset();
    }

    /// Transitions the pipeline from the recorded state to `next`.
    ///
    /// Fields of `next` that are `None` or empty are left as they are.
    /// Hazards between `next` and the recorded state are resolved with forced
    /// clears, and a resource read as input is left out of any output group
    /// rebound in the same call. On the first bind a resource used both ways
    /// inside `next` itself is not detected.
    pub fn bind<C: DeviceContext + ?Sized>(&mut self, ctx: &mut C, next: &PipelineStateSnapshot) {
        let first = !self.registry.is_valid();
        let mut deferred = Deferred::default();

        self.bind_mesh(ctx, &next.mesh, first);
        self.bind_output_states(ctx, &next.output, first);
        self.stage_output_views(ctx, &next.output, first, &mut deferred);

        for stage in ShaderStage::ALL {
            let shader = next.stage(stage).shader;
            if shader.is_some() && (first || shader != self.current.stage(stage).shader) {
                log::trace!("{}: shader {:?}", stage.short_name(), shader);
                ctx.set_shader(stage, shader);
                self.current.stage_mut(stage).shader = shader;
            }
        }

        for stage in ShaderStage::ALL {
            self.bind_constants_and_samplers(ctx, stage, next.stage(stage), first);
        }

        for stage in ShaderStage::ALL {
            self.stage_shader_resources(ctx, stage, &next.stage(stage).resources, first, &mut deferred);
        }

        self.apply_clears(ctx, &deferred);
        self.apply_rebinds(ctx, &deferred);

        if first {
            self.current = next.clone();
            self.registry.mark_valid();
        }
        debug_assert!(self.registry.is_exclusive());
    }

    /// Unbinds a group of bindings and forgets them.
    pub fn clear<C: DeviceContext + ?Sized>(&mut self, ctx: &mut C, target: ClearTarget) {
        log::debug!("Clearing {:?}", target);
        match target {
            ClearTarget::Stage(stage) => {
                let recorded = self.current.stage_mut(stage);
                ctx.set_shader(stage, None);
                if !recorded.constant_buffers.is_empty() {
                    ctx.set_constant_buffers(stage, 0, &vec![None; recorded.constant_buffers.len()]);
                }
                if !recorded.samplers.is_empty() {
                    ctx.set_samplers(stage, 0, &vec![None; recorded.samplers.len()]);
                }
                ctx.set_shader_resources(stage, 0, &[None; SHADER_RESOURCE_SLOT_COUNT]);
                *recorded = ShaderContext::default();
                self.registry.release_stage(stage);

                if stage == ShaderStage::Compute {
                    ctx.set_compute_unordered_access_views(0, &[None; UNORDERED_ACCESS_SLOT_COUNT]);
                    self.current.output.compute_unordered_access_views.clear();
                    self.registry.release_outputs(OutputUsage::COMPUTE_UAV);
                }
            }
            ClearTarget::OutputMerger => {
                ctx.set_output_merger(
                    &[None; RENDER_TARGET_SLOT_COUNT],
                    None,
                    &[None; UNORDERED_ACCESS_SLOT_COUNT],
                );
                ctx.set_viewports(&[]);
                ctx.set_raster_state(None);
                ctx.set_depth_stencil_state(None, 0);
                let defaults = OutputContext::default();
                ctx.set_blend_state(None, defaults.blend_factors);

                let compute_unordered_access_views =
                    std::mem::take(&mut self.current.output.compute_unordered_access_views);
                self.current.output = OutputContext {
                    compute_unordered_access_views,
                    ..defaults
                };
                self.registry.release_outputs(OutputUsage::OUTPUT_MERGER);
            }
            ClearTarget::Mesh => {
                let mesh = &mut self.current.mesh;
                ctx.set_index_buffer(None, mesh.index_format);
                ctx.set_vertex_buffer(None, 0);
                ctx.set_input_layout(None);
                mesh.index_buffer = None;
                mesh.vertex_buffer = None;
                mesh.vertex_stride = 0;
                mesh.input_layout = None;
            }
        }
    }

    fn bind_mesh<C: DeviceContext + ?Sized>(&mut self, ctx: &mut C, next: &MeshContext, first: bool) {
        let recorded = &mut self.current.mesh;

        if next.index_buffer.is_some()
            && (first
                || next.index_buffer != recorded.index_buffer
                || next.index_format != recorded.index_format)
        {
            ctx.set_index_buffer(next.index_buffer, next.index_format);
            recorded.index_buffer = next.index_buffer;
            recorded.index_format = next.index_format;
        }

        if next.vertex_buffer.is_some()
            && (first
                || next.vertex_buffer != recorded.vertex_buffer
                || next.vertex_stride != recorded.vertex_stride)
        {
            ctx.set_vertex_buffer(next.vertex_buffer, next.vertex_stride);
            recorded.vertex_buffer = next.vertex_buffer;
            recorded.vertex_stride = next.vertex_stride;
        }

        if next.input_layout.is_some() && (first || next.input_layout != recorded.input_layout) {
            ctx.set_input_layout(next.input_layout);
            recorded.input_layout = next.input_layout;
        }

        if let Some(topology) = next.topology {
            if first || recorded.topology != Some(topology) {
                ctx.set_primitive_topology(topology);
                recorded.topology = Some(topology);
            }
        }
    }

    fn bind_output_states<C: DeviceContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        next: &OutputContext,
        first: bool,
    ) {
        let recorded = &mut self.current.output;

        if list_changed(first, &recorded.viewports, &next.viewports) {
            ctx.set_viewports(&next.viewports);
            recorded.viewports = next.viewports.clone();
        }

        if next.depth_stencil_state.is_some()
            && (first
                || next.depth_stencil_state != recorded.depth_stencil_state
                || next.stencil_ref != recorded.stencil_ref)
        {
            ctx.set_depth_stencil_state(next.depth_stencil_state, next.stencil_ref);
            recorded.depth_stencil_state = next.depth_stencil_state;
            recorded.stencil_ref = next.stencil_ref;
        }

        if next.blend_state.is_some()
            && (first
                || next.blend_state != recorded.blend_state
                || next.blend_factors != recorded.blend_factors)
        {
            ctx.set_blend_state(next.blend_state, next.blend_factors);
            recorded.blend_state = next.blend_state;
            recorded.blend_factors = next.blend_factors;
        }

        if next.raster_state.is_some() && (first || next.raster_state != recorded.raster_state) {
            ctx.set_raster_state(next.raster_state);
            recorded.raster_state = next.raster_state;
        }
    }

    /// Phase 2: records the output views that changed and claims their
    /// resources for writing. Binding happens in phase 7.
    fn stage_output_views<C: DeviceContext + ?Sized>(
        &mut self,
        ctx: &C,
        next: &OutputContext,
        first: bool,
        deferred: &mut Deferred,
    ) {
        let recorded = &self.current.output;
        let render_targets = list_changed(first, &recorded.render_targets, &next.render_targets);
        let om_uavs = list_changed(
            first,
            &recorded.unordered_access_views,
            &next.unordered_access_views,
        );
        let depth_stencil = next.depth_stencil_view.is_some()
            && (first || next.depth_stencil_view != recorded.depth_stencil_view);

        if render_targets || om_uavs || depth_stencil {
            let recorded = &mut self.current.output;
            if render_targets {
                recorded.render_targets = next.render_targets.clone();
            }
            if om_uavs {
                recorded.unordered_access_views = next.unordered_access_views.clone();
            }
            if depth_stencil {
                recorded.depth_stencil_view = next.depth_stencil_view;
            }

            // The combined call replaces the whole output merger, so every
            // view it will carry is claimed again.
            let mut claims: Vec<(ViewId, OutputUsage)> = Vec::new();
            claims.extend(
                recorded
                    .render_targets
                    .iter()
                    .flatten()
                    .map(|view| (ViewId::from(*view), OutputUsage::RENDER_TARGET)),
            );
            claims.extend(
                recorded
                    .depth_stencil_view
                    .map(|view| (ViewId::from(view), OutputUsage::DEPTH_STENCIL)),
            );
            claims.extend(
                recorded
                    .unordered_access_views
                    .iter()
                    .flatten()
                    .map(|view| (ViewId::from(*view), OutputUsage::OUTPUT_MERGER_UAV)),
            );

            self.registry.release_outputs(OutputUsage::OUTPUT_MERGER);
            for (view, usage) in claims {
                self.claim_output(ctx, view, usage, deferred);
            }
            deferred.rebind_output_merger = true;
        }

        let recorded = &self.current.output.compute_unordered_access_views;
        let next_uavs = &next.compute_unordered_access_views;
        if list_changed(first, recorded, next_uavs) {
            let width = recorded.len().max(next_uavs.len());
            self.registry.release_outputs(OutputUsage::COMPUTE_UAV);
            for view in next_uavs.iter().flatten() {
                self.claim_output(ctx, ViewId::from(*view), OutputUsage::COMPUTE_UAV, deferred);
            }
            self.current.output.compute_unordered_access_views = next_uavs.clone();
            deferred.rebind_compute_uavs = Some(width);
        }
    }

    fn bind_constants_and_samplers<C: DeviceContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        stage: ShaderStage,
        next: &ShaderContext,
        first: bool,
    ) {
        let recorded = self.current.stage_mut(stage);

        if list_changed(first, &recorded.constant_buffers, &next.constant_buffers) {
            let width = recorded.constant_buffers.len();
            ctx.set_constant_buffers(stage, 0, &padded(&next.constant_buffers, width));
            recorded.constant_buffers = next.constant_buffers.clone();
        }

        if list_changed(first, &recorded.samplers, &next.samplers) {
            let width = recorded.samplers.len();
            ctx.set_samplers(stage, 0, &padded(&next.samplers, width));
            recorded.samplers = next.samplers.clone();
        }
    }

    /// Phase 5: records the shader resource views that changed and claims
    /// their resources for reading. Binding happens in phase 7.
    fn stage_shader_resources<C: DeviceContext + ?Sized>(
        &mut self,
        ctx: &C,
        stage: ShaderStage,
        next: &[Option<ShaderResourceViewId>],
        first: bool,
        deferred: &mut Deferred,
    ) {
        let recorded = &self.current.stage(stage).resources;
        if !list_changed(first, recorded, next) {
            return;
        }
        let width = recorded.len().max(next.len());

        self.registry.release_stage(stage);
        for view in next.iter().flatten() {
            self.claim_input(ctx, stage, *view, deferred);
        }
        self.current.stage_mut(stage).resources = next.to_vec();
        deferred.rebind_resources[stage.index()] = Some(width);
    }

    fn claim_output<C: DeviceContext + ?Sized>(
        &mut self,
        ctx: &C,
        view: ViewId,
        usage: OutputUsage,
        deferred: &mut Deferred,
    ) {
        let Some(resource) = ctx.resource_of(view) else {
            log::warn!("{:?} resolves to no resource, it is bound untracked", view);
            return;
        };
        let readers = self.registry.take_input(resource);
        for stage in readers.stages() {
            log::debug!(
                "{:?} becomes {:?} while read by {}, clearing its shader resources",
                resource,
                usage,
                stage.short_name()
            );
            deferred.clear_resources[stage.index()] = true;
        }
        self.registry.register_output(resource, usage);
    }

    fn claim_input<C: DeviceContext + ?Sized>(
        &mut self,
        ctx: &C,
        stage: ShaderStage,
        view: ShaderResourceViewId,
        deferred: &mut Deferred,
    ) {
        let Some(resource) = ctx.resource_of(view.into()) else {
            log::warn!("{:?} resolves to no resource, it is bound untracked", view);
            return;
        };
        let usage = self.registry.take_output(resource);
        if usage.contains(OutputUsage::COMPUTE_UAV) {
            log::debug!(
                "{:?} is read by {} while bound as a compute UAV, clearing compute UAVs",
                resource,
                stage.short_name()
            );
            deferred.clear_compute_uavs = true;
        }
        if usage.intersects(OutputUsage::OUTPUT_MERGER) {
            log::debug!(
                "{:?} is read by {} while bound to the output merger, clearing it",
                resource,
                stage.short_name()
            );
            deferred.clear_output_merger = true;
        }
        if !usage.is_empty() {
            self.forget_recorded_outputs(ctx, resource, usage);
        }
        self.registry.register_input(resource, stage);
    }

    /// Nulls every recorded output slot whose view shows `resource`, so a
    /// group rebound in phase 7 leaves out a resource now read as input.
    fn forget_recorded_outputs<C: DeviceContext + ?Sized>(
        &mut self,
        ctx: &C,
        resource: ResourceId,
        usage: OutputUsage,
    ) {
        let shows = |view: ViewId| ctx.resource_of(view) == Some(resource);
        let recorded = &mut self.current.output;

        if usage.intersects(OutputUsage::OUTPUT_MERGER) {
            for slot in recorded.render_targets.iter_mut() {
                if slot.is_some_and(|view| shows(view.into())) {
                    *slot = None;
                }
            }
            for slot in recorded.unordered_access_views.iter_mut() {
                if slot.is_some_and(|view| shows(view.into())) {
                    *slot = None;
                }
            }
            if recorded
                .depth_stencil_view
                .is_some_and(|view| shows(view.into()))
            {
                recorded.depth_stencil_view = None;
            }
        }

        if usage.contains(OutputUsage::COMPUTE_UAV) {
            for slot in recorded.compute_unordered_access_views.iter_mut() {
                if slot.is_some_and(|view| shows(view.into())) {
                    *slot = None;
                }
            }
        }
    }

    /// Phase 6. A cleared group that is not rebound in phase 7 is dropped from
    /// the recorded state and the registry.
    fn apply_clears<C: DeviceContext + ?Sized>(&mut self, ctx: &mut C, deferred: &Deferred) {
        if deferred.clear_compute_uavs {
            ctx.set_compute_unordered_access_views(0, &[None; UNORDERED_ACCESS_SLOT_COUNT]);
            if deferred.rebind_compute_uavs.is_none() {
                self.current.output.compute_unordered_access_views.clear();
                self.registry.release_outputs(OutputUsage::COMPUTE_UAV);
            }
        }

        if deferred.clear_output_merger {
            ctx.set_output_merger(
                &[None; RENDER_TARGET_SLOT_COUNT],
                None,
                &[None; UNORDERED_ACCESS_SLOT_COUNT],
            );
            if !deferred.rebind_output_merger {
                let recorded = &mut self.current.output;
                recorded.render_targets.clear();
                recorded.unordered_access_views.clear();
                recorded.depth_stencil_view = None;
                self.registry.release_outputs(OutputUsage::OUTPUT_MERGER);
            }
        }

        for stage in ShaderStage::ALL {
            if !deferred.clear_resources[stage.index()] {
                continue;
            }
            ctx.set_shader_resources(stage, 0, &[None; SHADER_RESOURCE_SLOT_COUNT]);
            if deferred.rebind_resources[stage.index()].is_none() {
                self.current.stage_mut(stage).resources.clear();
                self.registry.release_stage(stage);
            }
        }
    }

    /// Phase 7.
    fn apply_rebinds<C: DeviceContext + ?Sized>(&mut self, ctx: &mut C, deferred: &Deferred) {
        let recorded = &self.current;

        if deferred.rebind_output_merger {
            ctx.set_output_merger(
                &recorded.output.render_targets,
                recorded.output.depth_stencil_view,
                &recorded.output.unordered_access_views,
            );
        }

        if let Some(width) = deferred.rebind_compute_uavs {
            ctx.set_compute_unordered_access_views(
                0,
                &padded(&recorded.output.compute_unordered_access_views, width),
            );
        }

        for stage in ShaderStage::ALL {
            if let Some(width) = deferred.rebind_resources[stage.index()] {
                ctx.set_shader_resources(stage, 0, &padded(&recorded.stage(stage).resources, width));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::enums::PrimitiveTopology;
    use crate::renderer::api::handles::*;
    use crate::renderer::api::state::Viewport;
    use crate::renderer::binding::registry::StageMask;
    use crate::renderer::binding::test_context::{Call, MockContext};

    fn with_pixel_resources(views: Vec<Option<ShaderResourceViewId>>) -> PipelineStateSnapshot {
        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.stage_mut(ShaderStage::Pixel).resources = views;
        snapshot
    }

    fn with_render_targets(views: Vec<Option<RenderTargetViewId>>) -> PipelineStateSnapshot {
        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.output.render_targets = views;
        snapshot
    }

    fn position(calls: &[Call], predicate: impl Fn(&Call) -> bool) -> usize {
        calls
            .iter()
            .position(predicate)
            .unwrap_or_else(|| panic!("no matching call in {calls:?}"))
    }

    #[test]
    fn first_call_binds_every_specified_field() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();

        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.mesh.vertex_buffer = Some(BufferId(10));
        snapshot.mesh.vertex_stride = 32;
        snapshot.mesh.topology = Some(PrimitiveTopology::TriangleList);
        snapshot.output.viewports = vec![Viewport::from_size(640, 480)];
        snapshot.output.raster_state = Some(RasterStateId(2));
        snapshot.output.render_targets = vec![Some(t1.rtv)];
        snapshot.stage_mut(ShaderStage::Vertex).shader = Some(ShaderId(3));
        snapshot.stage_mut(ShaderStage::Vertex).constant_buffers = vec![Some(BufferId(11))];

        binder.bind(&mut ctx, &snapshot);

        assert_eq!(
            ctx.take_calls(),
            vec![
                Call::VertexBuffer(Some(BufferId(10)), 32),
                Call::Topology(PrimitiveTopology::TriangleList),
                Call::Viewports(vec![Viewport::from_size(640, 480)]),
                Call::RasterState(Some(RasterStateId(2))),
                Call::Shader(ShaderStage::Vertex, Some(ShaderId(3))),
                Call::ConstantBuffers(ShaderStage::Vertex, 0, vec![Some(BufferId(11))]),
                Call::OutputMerger(vec![Some(t1.rtv)], None, vec![]),
            ]
        );
        assert!(binder.registry().is_valid());
        assert_eq!(binder.current(), &snapshot);
    }

    #[test]
    fn first_call_binds_even_default_looking_values() {
        let mut ctx = MockContext::default();
        let mut binder = PipelineStateBinder::new();
        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.output.depth_stencil_state = Some(DepthStencilStateId(0));

        binder.bind(&mut ctx, &snapshot);

        assert_eq!(
            ctx.take_calls(),
            vec![Call::DepthStencilState(Some(DepthStencilStateId(0)), 0)]
        );
    }

    #[test]
    fn identical_snapshot_issues_no_calls() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let t2 = ctx.texture(2);
        let mut binder = PipelineStateBinder::new();
        let mut snapshot = with_pixel_resources(vec![Some(t1.srv)]);
        snapshot.output.render_targets = vec![Some(t2.rtv)];
        snapshot.output.blend_state = Some(BlendStateId(4));
        snapshot.stage_mut(ShaderStage::Pixel).samplers = vec![Some(SamplerId(5))];

        binder.bind(&mut ctx, &snapshot);
        ctx.take_calls();
        binder.bind(&mut ctx, &snapshot);

        assert!(ctx.take_calls().is_empty());
    }

    #[test]
    fn null_fields_leave_recorded_state_alone() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();
        let mut first = with_pixel_resources(vec![Some(t1.srv)]);
        first.output.raster_state = Some(RasterStateId(7));
        first.stage_mut(ShaderStage::Pixel).shader = Some(ShaderId(1));
        binder.bind(&mut ctx, &first);
        ctx.take_calls();

        binder.bind(&mut ctx, &PipelineStateSnapshot::default());

        assert!(ctx.take_calls().is_empty());
        assert_eq!(binder.current().output.raster_state, Some(RasterStateId(7)));
        assert_eq!(
            binder.current().stage(ShaderStage::Pixel).resources,
            vec![Some(t1.srv)]
        );
        assert_eq!(binder.registry().input_stages(t1.resource), StageMask::PIXEL);
    }

    #[test]
    fn render_target_then_shader_resource() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();

        binder.bind(&mut ctx, &with_render_targets(vec![Some(t1.rtv)]));
        assert_eq!(
            ctx.take_calls(),
            vec![Call::OutputMerger(vec![Some(t1.rtv)], None, vec![])]
        );
        assert_eq!(
            binder.registry().output_usage(t1.resource),
            OutputUsage::RENDER_TARGET
        );

        binder.bind(&mut ctx, &with_pixel_resources(vec![Some(t1.srv)]));
        assert_eq!(
            ctx.take_calls(),
            vec![
                Call::OutputMerger(
                    vec![None; RENDER_TARGET_SLOT_COUNT],
                    None,
                    vec![None; UNORDERED_ACCESS_SLOT_COUNT]
                ),
                Call::ShaderResources(ShaderStage::Pixel, 0, vec![Some(t1.srv)]),
            ]
        );
        assert!(binder.registry().output_usage(t1.resource).is_empty());
        assert_eq!(binder.registry().input_stages(t1.resource), StageMask::PIXEL);
        assert!(binder.current().output.render_targets.is_empty());
    }

    #[test]
    fn render_target_read_while_output_merger_changes() {
        let mut ctx = MockContext::default();
        let color = ctx.texture(1);
        let storage = ctx.texture(2);
        let mut binder = PipelineStateBinder::new();
        binder.bind(&mut ctx, &with_render_targets(vec![Some(color.rtv)]));
        ctx.take_calls();

        let mut snapshot = with_pixel_resources(vec![Some(color.srv)]);
        snapshot.output.unordered_access_views = vec![Some(storage.uav)];
        binder.bind(&mut ctx, &snapshot);

        let calls = ctx.take_calls();
        let rebind = calls
            .iter()
            .rposition(|c| matches!(c, Call::OutputMerger(..)))
            .expect("output merger is rebound");
        let Call::OutputMerger(rtvs, dsv, uavs) = &calls[rebind] else {
            unreachable!();
        };
        assert!(!rtvs.contains(&Some(color.rtv)));
        assert_eq!(*dsv, None);
        assert_eq!(uavs, &vec![Some(storage.uav)]);
        let read = position(&calls, |c| {
            c == &Call::ShaderResources(ShaderStage::Pixel, 0, vec![Some(color.srv)])
        });
        assert!(rebind < read);

        assert!(binder.registry().is_exclusive());
        assert_eq!(binder.registry().input_stages(color.resource), StageMask::PIXEL);
        assert!(binder.registry().output_usage(color.resource).is_empty());
        assert_eq!(
            binder.registry().output_usage(storage.resource),
            OutputUsage::OUTPUT_MERGER_UAV
        );
        assert!(!binder
            .current()
            .output
            .render_targets
            .contains(&Some(color.rtv)));
    }

    #[test]
    fn compute_uav_read_while_compute_uavs_change() {
        let mut ctx = MockContext::default();
        let first = ctx.texture(1);
        let second = ctx.texture(2);
        let mut binder = PipelineStateBinder::new();
        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.output.compute_unordered_access_views = vec![Some(first.uav)];
        binder.bind(&mut ctx, &snapshot);
        ctx.take_calls();

        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.output.compute_unordered_access_views = vec![Some(second.uav), Some(first.uav)];
        snapshot.stage_mut(ShaderStage::Compute).resources = vec![Some(first.srv)];
        binder.bind(&mut ctx, &snapshot);

        let calls = ctx.take_calls();
        assert!(calls.contains(&Call::ComputeUavs(0, vec![Some(second.uav), None])));
        assert!(!calls
            .iter()
            .any(|c| matches!(c, Call::ComputeUavs(_, v) if v.contains(&Some(first.uav)))));
        assert!(binder.registry().is_exclusive());
        assert_eq!(
            binder.registry().input_stages(first.resource),
            StageMask::of(ShaderStage::Compute)
        );
    }

    #[test]
    fn shader_resource_then_render_target() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();
        binder.bind(&mut ctx, &with_pixel_resources(vec![Some(t1.srv)]));
        ctx.take_calls();

        binder.bind(&mut ctx, &with_render_targets(vec![Some(t1.rtv)]));

        let calls = ctx.take_calls();
        let clear = position(&calls, |c| {
            matches!(c, Call::ShaderResources(ShaderStage::Pixel, 0, v) if v.len() == SHADER_RESOURCE_SLOT_COUNT)
                && c.is_clear()
        });
        let bind = position(&calls, |c| matches!(c, Call::OutputMerger(rtvs, _, _) if rtvs == &vec![Some(t1.rtv)]));
        assert!(clear < bind);
        assert_eq!(calls.len(), 2);
        assert!(binder.registry().input_stages(t1.resource).is_empty());
        assert_eq!(
            binder.registry().output_usage(t1.resource),
            OutputUsage::RENDER_TARGET
        );
        assert!(binder.current().stage(ShaderStage::Pixel).resources.is_empty());
    }

    #[test]
    fn every_reading_stage_is_cleared() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();
        let mut reads = with_pixel_resources(vec![Some(t1.srv)]);
        reads.stage_mut(ShaderStage::Vertex).resources = vec![Some(t1.srv)];
        binder.bind(&mut ctx, &reads);
        ctx.take_calls();

        let mut writes = PipelineStateSnapshot::default();
        writes.output.compute_unordered_access_views = vec![Some(t1.uav)];
        binder.bind(&mut ctx, &writes);

        let calls = ctx.take_calls();
        let vs_clear = position(&calls, |c| {
            matches!(c, Call::ShaderResources(ShaderStage::Vertex, ..)) && c.is_clear()
        });
        let ps_clear = position(&calls, |c| {
            matches!(c, Call::ShaderResources(ShaderStage::Pixel, ..)) && c.is_clear()
        });
        let uav_bind = position(&calls, |c| *c == Call::ComputeUavs(0, vec![Some(t1.uav)]));
        assert!(vs_clear < uav_bind && ps_clear < uav_bind);
        assert_eq!(
            binder.registry().output_usage(t1.resource),
            OutputUsage::COMPUTE_UAV
        );
        assert!(binder.registry().is_exclusive());
    }

    #[test]
    fn compute_uav_then_shader_resource() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();
        let mut writes = PipelineStateSnapshot::default();
        writes.output.compute_unordered_access_views = vec![Some(t1.uav)];
        binder.bind(&mut ctx, &writes);
        ctx.take_calls();

        let mut reads = PipelineStateSnapshot::default();
        reads.stage_mut(ShaderStage::Compute).resources = vec![Some(t1.srv)];
        binder.bind(&mut ctx, &reads);

        assert_eq!(
            ctx.take_calls(),
            vec![
                Call::ComputeUavs(0, vec![None; UNORDERED_ACCESS_SLOT_COUNT]),
                Call::ShaderResources(ShaderStage::Compute, 0, vec![Some(t1.srv)]),
            ]
        );
        assert!(binder
            .current()
            .output
            .compute_unordered_access_views
            .is_empty());
        assert_eq!(binder.registry().input_stages(t1.resource), StageMask::COMPUTE);
    }

    #[test]
    fn depth_stencil_view_is_an_output_merger_output() {
        let mut ctx = MockContext::default();
        let depth = ctx.texture(2);
        let mut binder = PipelineStateBinder::new();
        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.output.depth_stencil_view = Some(depth.dsv);
        binder.bind(&mut ctx, &snapshot);
        assert_eq!(
            binder.registry().output_usage(depth.resource),
            OutputUsage::DEPTH_STENCIL
        );
        ctx.take_calls();

        binder.bind(&mut ctx, &with_pixel_resources(vec![Some(depth.srv)]));

        let calls = ctx.take_calls();
        assert!(calls[0].is_clear());
        assert!(matches!(calls[0], Call::OutputMerger(..)));
        assert_eq!(binder.current().output.depth_stencil_view, None);
    }

    #[test]
    fn depth_only_change_keeps_render_targets() {
        let mut ctx = MockContext::default();
        let color = ctx.texture(1);
        let depth = ctx.texture(2);
        let mut binder = PipelineStateBinder::new();
        binder.bind(&mut ctx, &with_render_targets(vec![Some(color.rtv)]));
        ctx.take_calls();

        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.output.depth_stencil_view = Some(depth.dsv);
        binder.bind(&mut ctx, &snapshot);

        assert_eq!(
            ctx.take_calls(),
            vec![Call::OutputMerger(vec![Some(color.rtv)], Some(depth.dsv), vec![])]
        );
        assert_eq!(
            binder.registry().output_usage(color.resource),
            OutputUsage::RENDER_TARGET
        );
    }

    #[test]
    fn shrinking_list_unbinds_stale_slots() {
        let mut ctx = MockContext::default();
        let a = ctx.texture(1);
        let b = ctx.texture(2);
        let c = ctx.texture(3);
        let mut binder = PipelineStateBinder::new();
        binder.bind(
            &mut ctx,
            &with_pixel_resources(vec![Some(a.srv), Some(b.srv), Some(c.srv)]),
        );
        ctx.take_calls();

        binder.bind(&mut ctx, &with_pixel_resources(vec![Some(a.srv)]));

        assert_eq!(
            ctx.take_calls(),
            vec![Call::ShaderResources(
                ShaderStage::Pixel,
                0,
                vec![Some(a.srv), None, None]
            )]
        );
        assert!(binder.registry().input_stages(b.resource).is_empty());
        assert_eq!(binder.registry().input_stages(a.resource), StageMask::PIXEL);
    }

    #[test]
    fn null_entries_are_bound_but_not_tracked() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();

        binder.bind(&mut ctx, &with_pixel_resources(vec![None, Some(t1.srv)]));

        assert_eq!(
            ctx.take_calls(),
            vec![Call::ShaderResources(ShaderStage::Pixel, 0, vec![None, Some(t1.srv)])]
        );
        assert_eq!(binder.registry().inputs().count(), 1);
    }

    #[test]
    fn unknown_view_is_bound_untracked() {
        let mut ctx = MockContext::default();
        let mut binder = PipelineStateBinder::new();

        binder.bind(
            &mut ctx,
            &with_pixel_resources(vec![Some(ShaderResourceViewId(99))]),
        );

        assert_eq!(ctx.take_calls().len(), 1);
        assert_eq!(binder.registry().inputs().count(), 0);
    }

    #[test]
    fn clearing_a_stage_forgets_its_bindings() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();
        let mut snapshot = with_pixel_resources(vec![Some(t1.srv)]);
        snapshot.stage_mut(ShaderStage::Pixel).shader = Some(ShaderId(1));
        snapshot.stage_mut(ShaderStage::Pixel).samplers = vec![Some(SamplerId(1))];
        binder.bind(&mut ctx, &snapshot);
        ctx.take_calls();

        binder.clear(&mut ctx, ClearTarget::Stage(ShaderStage::Pixel));
        assert_eq!(
            ctx.take_calls(),
            vec![
                Call::Shader(ShaderStage::Pixel, None),
                Call::Samplers(ShaderStage::Pixel, 0, vec![None]),
                Call::ShaderResources(
                    ShaderStage::Pixel,
                    0,
                    vec![None; SHADER_RESOURCE_SLOT_COUNT]
                ),
            ]
        );
        assert_eq!(binder.registry().inputs().count(), 0);

        binder.bind(&mut ctx, &snapshot);
        assert_eq!(ctx.take_calls().len(), 3);
    }

    #[test]
    fn clearing_the_output_merger_keeps_compute_uavs() {
        let mut ctx = MockContext::default();
        let color = ctx.texture(1);
        let storage = ctx.texture(2);
        let mut binder = PipelineStateBinder::new();
        let mut snapshot = with_render_targets(vec![Some(color.rtv)]);
        snapshot.output.compute_unordered_access_views = vec![Some(storage.uav)];
        binder.bind(&mut ctx, &snapshot);

        binder.clear(&mut ctx, ClearTarget::OutputMerger);

        assert!(binder.registry().output_usage(color.resource).is_empty());
        assert_eq!(
            binder.registry().output_usage(storage.resource),
            OutputUsage::COMPUTE_UAV
        );
        assert_eq!(
            binder.current().output.compute_unordered_access_views,
            vec![Some(storage.uav)]
        );
        approx::assert_relative_eq!(binder.current().output.blend_factors[0], 1.0);
    }

    #[test]
    fn invalidate_rebinds_everything() {
        let mut ctx = MockContext::default();
        let mut binder = PipelineStateBinder::new();
        let mut snapshot = PipelineStateSnapshot::default();
        snapshot.mesh.input_layout = Some(InputLayoutId(1));
        binder.bind(&mut ctx, &snapshot);
        ctx.take_calls();

        binder.invalidate();
        binder.bind(&mut ctx, &snapshot);

        assert_eq!(ctx.take_calls(), vec![Call::InputLayout(Some(InputLayoutId(1)))]);
    }
}
