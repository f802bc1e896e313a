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

//! The immediate context of a [`SoftwareDevice`].
//!
//! The context keeps the same fixed-width slot tables a native immediate
//! context has and applies the same hazard rules to them: a view whose
//! resource is bound for writing cannot be read, and binding a resource for
//! writing evicts it from every read slot. Each time a rule fires a
//! [`Violation`] is recorded, which is what a debug layer would print.

use super::device::SoftwareDevice;
use lamina_core::renderer::api::{
    enums::{IndexFormat, PrimitiveTopology, ShaderStage},
    handles::*,
    limits::*,
    state::Viewport,
};
use lamina_core::renderer::traits::{DeviceContext, ViewResolver};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The slot tables of one shader stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSlots {
    /// The bound program.
    pub shader: Option<ShaderId>,
    /// Constant buffer slots.
    pub constant_buffers: Vec<Option<BufferId>>,
    /// Sampler slots.
    pub samplers: Vec<Option<SamplerId>>,
    /// Shader resource view slots.
    pub resources: Vec<Option<ShaderResourceViewId>>,
}

impl Default for StageSlots {
    fn default() -> Self {
        Self {
            shader: None,
            constant_buffers: vec![None; CONSTANT_BUFFER_SLOT_COUNT],
            samplers: vec![None; SAMPLER_SLOT_COUNT],
            resources: vec![None; SHADER_RESOURCE_SLOT_COUNT],
        }
    }
}

/// Everything bound on the context.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeState {
    /// Index buffer and its format.
    pub index_buffer: (Option<BufferId>, IndexFormat),
    /// Vertex buffer and its stride.
    pub vertex_buffer: (Option<BufferId>, u32),
    /// Input layout.
    pub input_layout: Option<InputLayoutId>,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Viewports.
    pub viewports: Vec<Viewport>,
    /// Rasterizer state.
    pub raster_state: Option<RasterStateId>,
    /// Depth/stencil state and stencil reference.
    pub depth_stencil_state: (Option<DepthStencilStateId>, u32),
    /// Blend state and blend factors.
    pub blend_state: (Option<BlendStateId>, [f32; 4]),
    /// Per-stage tables, indexed by [`ShaderStage::index`].
    pub stages: [StageSlots; ShaderStage::COUNT],
    /// Render target slots.
    pub render_targets: [Option<RenderTargetViewId>; RENDER_TARGET_SLOT_COUNT],
    /// Depth/stencil target.
    pub depth_stencil_view: Option<DepthStencilViewId>,
    /// Output merger unordered access slots.
    pub output_unordered_access_views: [Option<UnorderedAccessViewId>; UNORDERED_ACCESS_SLOT_COUNT],
    /// Compute unordered access slots.
    pub compute_unordered_access_views: [Option<UnorderedAccessViewId>; UNORDERED_ACCESS_SLOT_COUNT],
}

impl Default for NativeState {
    fn default() -> Self {
        Self {
            index_buffer: (None, IndexFormat::default()),
            vertex_buffer: (None, 0),
            input_layout: None,
            topology: PrimitiveTopology::default(),
            viewports: Vec::new(),
            raster_state: None,
            depth_stencil_state: (None, 0),
            blend_state: (None, [1.0; 4]),
            stages: Default::default(),
            render_targets: [None; RENDER_TARGET_SLOT_COUNT],
            depth_stencil_view: None,
            output_unordered_access_views: [None; UNORDERED_ACCESS_SLOT_COUNT],
            compute_unordered_access_views: [None; UNORDERED_ACCESS_SLOT_COUNT],
        }
    }
}

impl NativeState {
    /// The slot tables of `stage`.
    pub fn stage(&self, stage: ShaderStage) -> &StageSlots {
        &self.stages[stage.index()]
    }

    /// Every bound view that writes, in no particular order.
    fn output_views(&self) -> impl Iterator<Item = ViewId> + '_ {
        let rtvs = self.render_targets.iter().flatten().map(|v| ViewId::from(*v));
        let dsv = self.depth_stencil_view.iter().map(|v| ViewId::from(*v));
        let uavs = self
            .output_unordered_access_views
            .iter()
            .chain(self.compute_unordered_access_views.iter())
            .flatten()
            .map(|v| ViewId::from(*v));
        rtvs.chain(dsv).chain(uavs)
    }
}

/// Counts of context calls, by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallStats {
    /// Index buffer, vertex buffer, input layout and topology calls.
    pub input_assembler: u32,
    /// Shader calls.
    pub shaders: u32,
    /// Constant buffer calls.
    pub constant_buffers: u32,
    /// Sampler calls.
    pub samplers: u32,
    /// Shader resource view calls.
    pub shader_resources: u32,
    /// Output merger calls.
    pub output_merger: u32,
    /// Compute unordered access calls.
    pub compute_unordered_access: u32,
    /// Viewport, rasterizer, depth/stencil and blend state calls.
    pub fixed_function: u32,
    /// Render target and depth/stencil clears.
    pub clears: u32,
    /// Draw calls.
    pub draws: u32,
    /// Dispatch calls.
    pub dispatches: u32,
}

impl CallStats {
    /// Number of calls that changed pipeline state.
    pub fn state_calls(&self) -> u32 {
        self.input_assembler
            + self.shaders
            + self.constant_buffers
            + self.samplers
            + self.shader_resources
            + self.output_merger
            + self.compute_unordered_access
            + self.fixed_function
    }
}

/// A binding rule the context had to enforce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Violation {
    /// A shader resource view was bound while its resource was bound for writing.
    /// The slot was set to null instead.
    InputBoundAsOutput {
        /// The reading stage.
        stage: ShaderStage,
        /// The slot that was nulled.
        slot: u32,
        /// The contended resource.
        resource: ResourceId,
    },
    /// A resource was bound for writing while still readable. The read slot
    /// was set to null.
    OutputBoundAsInput {
        /// The reading stage.
        stage: ShaderStage,
        /// The slot that was nulled.
        slot: u32,
        /// The contended resource.
        resource: ResourceId,
    },
    /// A call reached past the end of a slot table and was ignored.
    SlotOutOfRange {
        /// The call.
        call: &'static str,
        /// First slot of the call.
        start_slot: u32,
        /// Number of slots it covered.
        count: usize,
        /// Size of the table.
        limit: usize,
    },
    /// A draw or dispatch ran without a program on a required stage.
    MissingShader {
        /// The empty stage.
        stage: ShaderStage,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InputBoundAsOutput {
                stage,
                slot,
                resource,
            } => write!(
                f,
                "{resource:?} is bound as output, forcing {} shader resource slot {slot} to null",
                stage.short_name()
            ),
            Violation::OutputBoundAsInput {
                stage,
                slot,
                resource,
            } => write!(
                f,
                "{resource:?} is being bound as output while readable, forcing {} shader resource slot {slot} to null",
                stage.short_name()
            ),
            Violation::SlotOutOfRange {
                call,
                start_slot,
                count,
                limit,
            } => write!(
                f,
                "{call}: slots {start_slot}..{} exceed the {limit} available, call ignored",
                *start_slot as usize + count
            ),
            Violation::MissingShader { stage } => {
                write!(f, "No {} shader is bound", stage.short_name())
            }
        }
    }
}

/// A [`DeviceContext`] over a [`SoftwareDevice`].
#[derive(Debug)]
pub struct SoftwareContext {
    device: Arc<SoftwareDevice>,
    state: NativeState,
    stats: CallStats,
    violations: Vec<Violation>,
}

impl SoftwareContext {
    /// Creates the immediate context of `device`.
    pub fn new(device: Arc<SoftwareDevice>) -> Self {
        Self {
            device,
            state: NativeState::default(),
            stats: CallStats::default(),
            violations: Vec::new(),
        }
    }

    /// The device the context belongs to.
    pub fn device(&self) -> &Arc<SoftwareDevice> {
        &self.device
    }

    /// What is currently bound.
    pub fn state(&self) -> &NativeState {
        &self.state
    }

    /// Calls made since creation or the last [`SoftwareContext::take_stats`].
    pub fn stats(&self) -> CallStats {
        self.stats
    }

    /// Returns the call counts and resets them.
    pub fn take_stats(&mut self) -> CallStats {
        std::mem::take(&mut self.stats)
    }

    /// Violations recorded so far.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns the recorded violations and forgets them.
    pub fn take_violations(&mut self) -> Vec<Violation> {
        std::mem::take(&mut self.violations)
    }

    /// Unbinds everything.
    pub fn clear_state(&mut self) {
        self.state = NativeState::default();
    }

    fn report(&mut self, violation: Violation) {
        if self.device.descriptor().debug_layer {
            log::warn!("{violation}");
            self.violations.push(violation);
        }
    }

    /// Returns `false` and reports if `start_slot..start_slot + count` exceeds `limit`.
    fn check_range(&mut self, call: &'static str, start_slot: u32, count: usize, limit: usize) -> bool {
        if start_slot as usize + count <= limit {
            return true;
        }
        self.report(Violation::SlotOutOfRange {
            call,
            start_slot,
            count,
            limit,
        });
        false
    }

    fn is_bound_as_output(&self, resource: ResourceId) -> bool {
        self.state
            .output_views()
            .any(|view| self.device.resource_of(view) == Some(resource))
    }

    /// Nulls every read slot of every stage that shows `resource`.
    fn evict_inputs(&mut self, resource: ResourceId) {
        let mut evicted = Vec::new();
        for stage in ShaderStage::ALL {
            let slots = &mut self.state.stages[stage.index()].resources;
            for (slot, view) in slots.iter_mut().enumerate() {
                let Some(srv) = *view else { continue };
                if self.device.resource_of(srv.into()) == Some(resource) {
                    *view = None;
                    evicted.push(Violation::OutputBoundAsInput {
                        stage,
                        slot: slot as u32,
                        resource,
                    });
                }
            }
        }
        for violation in evicted {
            self.report(violation);
        }
    }

    fn evict_inputs_of(&mut self, views: Vec<ViewId>) {
        for view in views {
            if let Some(resource) = self.device.resource_of(view) {
                self.evict_inputs(resource);
            }
        }
    }

    fn require_shader(&mut self, stage: ShaderStage) {
        if self.state.stage(stage).shader.is_none() {
            self.report(Violation::MissingShader { stage });
        }
    }
}

/// Writes `values` into `table` from `start_slot`. The range must have been checked.
fn write_slots<T: Copy>(table: &mut [Option<T>], start_slot: u32, values: &[Option<T>]) {
    let start = start_slot as usize;
    table[start..start + values.len()].copy_from_slice(values);
}

impl ViewResolver for SoftwareContext {
    fn resource_of(&self, view: ViewId) -> Option<ResourceId> {
        self.device.resource_of(view)
    }
}

impl DeviceContext for SoftwareContext {
    fn set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat) {
        self.stats.input_assembler += 1;
        self.state.index_buffer = (buffer, format);
    }

    fn set_vertex_buffer(&mut self, buffer: Option<BufferId>, stride: u32) {
        self.stats.input_assembler += 1;
        self.state.vertex_buffer = (buffer, stride);
    }

    fn set_input_layout(&mut self, layout: Option<InputLayoutId>) {
        self.stats.input_assembler += 1;
        self.state.input_layout = layout;
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.stats.input_assembler += 1;
        self.state.topology = topology;
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.stats.fixed_function += 1;
        if self.check_range("set_viewports", 0, viewports.len(), VIEWPORT_SLOT_COUNT) {
            self.state.viewports = viewports.to_vec();
        }
    }

    fn set_raster_state(&mut self, state: Option<RasterStateId>) {
        self.stats.fixed_function += 1;
        self.state.raster_state = state;
    }

    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>, stencil_ref: u32) {
        self.stats.fixed_function += 1;
        self.state.depth_stencil_state = (state, stencil_ref);
    }

    fn set_blend_state(&mut self, state: Option<BlendStateId>, blend_factors: [f32; 4]) {
        self.stats.fixed_function += 1;
        self.state.blend_state = (state, blend_factors);
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: Option<ShaderId>) {
        self.stats.shaders += 1;
        if let Some(actual) = shader.and_then(|id| self.device.shader_stage(id)) {
            if actual != stage {
                log::error!("A {actual:?} shader cannot be bound to the {stage:?} stage");
                return;
            }
        }
        self.state.stages[stage.index()].shader = shader;
    }

    fn set_constant_buffers(&mut self, stage: ShaderStage, start_slot: u32, buffers: &[Option<BufferId>]) {
        self.stats.constant_buffers += 1;
        if self.check_range("set_constant_buffers", start_slot, buffers.len(), CONSTANT_BUFFER_SLOT_COUNT) {
            write_slots(&mut self.state.stages[stage.index()].constant_buffers, start_slot, buffers);
        }
    }

    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<SamplerId>]) {
        self.stats.samplers += 1;
        if self.check_range("set_samplers", start_slot, samplers.len(), SAMPLER_SLOT_COUNT) {
            write_slots(&mut self.state.stages[stage.index()].samplers, start_slot, samplers);
        }
    }

    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Option<ShaderResourceViewId>],
    ) {
        self.stats.shader_resources += 1;
        if !self.check_range("set_shader_resources", start_slot, views.len(), SHADER_RESOURCE_SLOT_COUNT) {
            return;
        }
        let mut accepted = Vec::with_capacity(views.len());
        for (offset, view) in views.iter().enumerate() {
            let resource = view.and_then(|srv| self.device.resource_of(srv.into()));
            match resource {
                Some(resource) if self.is_bound_as_output(resource) => {
                    self.report(Violation::InputBoundAsOutput {
                        stage,
                        slot: start_slot + offset as u32,
                        resource,
                    });
                    accepted.push(None);
                }
                _ => accepted.push(*view),
            }
        }
        write_slots(&mut self.state.stages[stage.index()].resources, start_slot, &accepted);
    }

    fn set_output_merger(
        &mut self,
        render_targets: &[Option<RenderTargetViewId>],
        depth_stencil: Option<DepthStencilViewId>,
        unordered_access_views: &[Option<UnorderedAccessViewId>],
    ) {
        self.stats.output_merger += 1;
        if !self.check_range("set_output_merger", 0, render_targets.len(), RENDER_TARGET_SLOT_COUNT)
            || !self.check_range(
                "set_output_merger",
                0,
                unordered_access_views.len(),
                UNORDERED_ACCESS_SLOT_COUNT,
            )
        {
            return;
        }

        self.state.render_targets = [None; RENDER_TARGET_SLOT_COUNT];
        write_slots(&mut self.state.render_targets, 0, render_targets);
        self.state.depth_stencil_view = depth_stencil;
        self.state.output_unordered_access_views = [None; UNORDERED_ACCESS_SLOT_COUNT];
        write_slots(&mut self.state.output_unordered_access_views, 0, unordered_access_views);

        let written = render_targets
            .iter()
            .flatten()
            .map(|v| ViewId::from(*v))
            .chain(depth_stencil.map(ViewId::from))
            .chain(unordered_access_views.iter().flatten().map(|v| ViewId::from(*v)))
            .collect();
        self.evict_inputs_of(written);
    }

    fn set_compute_unordered_access_views(
        &mut self,
        start_slot: u32,
        views: &[Option<UnorderedAccessViewId>],
    ) {
        self.stats.compute_unordered_access += 1;
        if !self.check_range(
            "set_compute_unordered_access_views",
            start_slot,
            views.len(),
            UNORDERED_ACCESS_SLOT_COUNT,
        ) {
            return;
        }
        write_slots(&mut self.state.compute_unordered_access_views, start_slot, views);
        let written = views.iter().flatten().map(|v| ViewId::from(*v)).collect();
        self.evict_inputs_of(written);
    }

    fn clear_render_target(&mut self, view: RenderTargetViewId, color: [f32; 4]) {
        self.stats.clears += 1;
        if let Err(e) = self.device.fill_view(view.into(), color) {
            log::error!("Failed to clear {view:?}: {e}");
        }
    }

    fn clear_depth_stencil(&mut self, view: DepthStencilViewId, depth: f32, stencil: u8) {
        self.stats.clears += 1;
        if let Err(e) = self.device.fill_view(view.into(), [depth, stencil as f32, 0.0, 0.0]) {
            log::error!("Failed to clear {view:?}: {e}");
        }
    }

    fn draw(&mut self, vertex_count: u32, start_vertex: u32) {
        self.stats.draws += 1;
        self.require_shader(ShaderStage::Vertex);
        log::trace!("draw({vertex_count}, {start_vertex})");
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        self.stats.draws += 1;
        self.require_shader(ShaderStage::Vertex);
        if self.state.index_buffer.0.is_none() {
            log::warn!("draw_indexed without an index buffer");
        }
        log::trace!("draw_indexed({index_count}, {start_index}, {base_vertex})");
    }

    fn dispatch(&mut self, groups: [u32; 3]) {
        self.stats.dispatches += 1;
        self.require_shader(ShaderStage::Compute);
        log::trace!("dispatch({groups:?})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::software::settings::DeviceDescriptor;
    use lamina_core::renderer::api::resource::{BindFlags, Texture2D, TextureDescriptor};
    use lamina_core::renderer::traits::GraphicsDevice;

    fn setup(debug_layer: bool) -> (SoftwareContext, Texture2D) {
        let device = Arc::new(SoftwareDevice::new(DeviceDescriptor {
            debug_layer,
            ..Default::default()
        }));
        let dyn_device: Arc<dyn GraphicsDevice> = device.clone();
        let texture = Texture2D::new(
            &dyn_device,
            TextureDescriptor {
                width: 2,
                height: 2,
                bind: BindFlags::SHADER_RESOURCE
                    | BindFlags::RENDER_TARGET
                    | BindFlags::UNORDERED_ACCESS,
                ..Default::default()
            },
            None,
        )
        .unwrap();
        (SoftwareContext::new(device), texture)
    }

    #[test]
    fn reading_a_bound_output_is_nulled() {
        let (mut ctx, texture) = setup(true);
        ctx.set_output_merger(&[texture.rtv()], None, &[]);
        ctx.set_shader_resources(ShaderStage::Pixel, 2, &[texture.srv()]);

        assert_eq!(ctx.state().stage(ShaderStage::Pixel).resources[2], None);
        assert_eq!(
            ctx.violations(),
            &[Violation::InputBoundAsOutput {
                stage: ShaderStage::Pixel,
                slot: 2,
                resource: texture.resource(),
            }]
        );
    }

    #[test]
    fn writing_a_bound_input_evicts_it_everywhere() {
        let (mut ctx, texture) = setup(true);
        ctx.set_shader_resources(ShaderStage::Vertex, 0, &[texture.srv()]);
        ctx.set_shader_resources(ShaderStage::Compute, 5, &[texture.srv()]);

        ctx.set_compute_unordered_access_views(0, &[texture.uav()]);

        assert_eq!(ctx.state().stage(ShaderStage::Vertex).resources[0], None);
        assert_eq!(ctx.state().stage(ShaderStage::Compute).resources[5], None);
        assert_eq!(ctx.take_violations().len(), 2);
        assert_eq!(ctx.state().compute_unordered_access_views[0], texture.uav());
    }

    #[test]
    fn output_merger_call_replaces_all_targets() {
        let (mut ctx, texture) = setup(true);
        ctx.set_output_merger(&[None, texture.rtv()], None, &[]);
        ctx.set_output_merger(&[], None, &[]);

        assert!(ctx.state().render_targets.iter().all(Option::is_none));
        assert!(ctx.violations().is_empty());
    }

    #[test]
    fn out_of_range_call_is_ignored() {
        let (mut ctx, texture) = setup(true);
        ctx.set_shader_resources(ShaderStage::Pixel, 127, &[texture.srv(), texture.srv()]);

        assert!(ctx.state().stage(ShaderStage::Pixel).resources.iter().all(Option::is_none));
        assert!(matches!(
            ctx.violations(),
            [Violation::SlotOutOfRange { limit: 128, count: 2, .. }]
        ));
    }

    #[test]
    fn rules_apply_without_debug_layer() {
        let (mut ctx, texture) = setup(false);
        ctx.set_shader_resources(ShaderStage::Pixel, 0, &[texture.srv()]);
        ctx.set_output_merger(&[texture.rtv()], None, &[]);

        assert_eq!(ctx.state().stage(ShaderStage::Pixel).resources[0], None);
        assert!(ctx.violations().is_empty());
    }

    #[test]
    fn stats_count_state_calls_only() {
        let (mut ctx, _texture) = setup(true);
        ctx.set_primitive_topology(PrimitiveTopology::TriangleList);
        ctx.set_viewports(&[Viewport::from_size(2, 2)]);
        ctx.dispatch([1, 1, 1]);

        let stats = ctx.take_stats();
        assert_eq!(stats.state_calls(), 2);
        assert_eq!(stats.dispatches, 1);
        assert_eq!(ctx.stats(), CallStats::default());
        assert_eq!(
            ctx.violations(),
            &[Violation::MissingShader {
                stage: ShaderStage::Compute
            }]
        );
    }

    #[test]
    fn clear_render_target_fills_texture() {
        let (mut ctx, texture) = setup(true);
        let rtv = texture.rtv().unwrap();
        ctx.clear_render_target(rtv, [1.0, 0.0, 0.0, 1.0]);

        let bytes = ctx.device().read_texture(texture.texture()).unwrap();
        assert_eq!(&bytes[..4], &[255, 0, 0, 255]);
        assert_eq!(ctx.stats().clears, 1);
    }
}
