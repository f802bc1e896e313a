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

//! Bindable groups of pipeline state.
//!
//! A [`Bindable`] owns the handles of one shader stage, of the output stage or
//! of a mesh. Applying it binds them through the
//! [`PipelineStateBinder`], so hazards are resolved the same way as for a full
//! snapshot; reverting it clears the group again.

use super::binder::{ClearTarget, PipelineStateBinder};
use crate::renderer::api::{
    enums::{IndexFormat, PrimitiveTopology, ShaderStage},
    handles::*,
    limits::*,
    state::Viewport,
};
use crate::renderer::error::BindError;
use crate::renderer::pipeline::PipelineStateSnapshot;
use crate::renderer::traits::DeviceContext;

fn link_slot<T: Copy>(
    list: &mut Vec<Option<T>>,
    kind: &'static str,
    slot: u32,
    limit: usize,
    value: T,
) -> Result<(), BindError> {
    let index = slot as usize;
    if index >= limit {
        return Err(BindError::SlotOutOfRange {
            kind,
            slot,
            limit: limit as u32,
        });
    }
    if list.len() <= index {
        list.resize(index + 1, None);
    }
    list[index] = Some(value);
    Ok(())
}

/// A shader with the resources, constant buffers and samplers it reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderStageBinding {
    stage: ShaderStage,
    shader: ShaderId,
    resources: Vec<Option<ShaderResourceViewId>>,
    constant_buffers: Vec<Option<BufferId>>,
    samplers: Vec<Option<SamplerId>>,
    unordered_access_views: Vec<Option<UnorderedAccessViewId>>,
}

impl ShaderStageBinding {
    /// A binding running `shader` on `stage`, with nothing linked yet.
    pub fn new(stage: ShaderStage, shader: ShaderId) -> Self {
        Self {
            stage,
            shader,
            resources: Vec::new(),
            constant_buffers: Vec::new(),
            samplers: Vec::new(),
            unordered_access_views: Vec::new(),
        }
    }

    /// The stage the shader runs on.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Links a shader resource view at `slot`.
    pub fn link_resource(
        &mut self,
        slot: u32,
        view: ShaderResourceViewId,
    ) -> Result<&mut Self, BindError> {
        link_slot(
            &mut self.resources,
            "shader resource view",
            slot,
            SHADER_RESOURCE_SLOT_COUNT,
            view,
        )?;
        Ok(self)
    }

    /// Links a constant buffer at `slot`.
    pub fn link_constant_buffer(
        &mut self,
        slot: u32,
        buffer: BufferId,
    ) -> Result<&mut Self, BindError> {
        link_slot(
            &mut self.constant_buffers,
            "constant buffer",
            slot,
            CONSTANT_BUFFER_SLOT_COUNT,
            buffer,
        )?;
        Ok(self)
    }

    /// Links a sampler at `slot`.
    pub fn link_sampler(&mut self, slot: u32, sampler: SamplerId) -> Result<&mut Self, BindError> {
        link_slot(
            &mut self.samplers,
            "sampler",
            slot,
            SAMPLER_SLOT_COUNT,
            sampler,
        )?;
        Ok(self)
    }

    /// Links an unordered access view at `slot`. Only the compute stage has
    /// its own unordered access views; the pixel stage writes through the
    /// output stage.
    pub fn link_unordered_access_view(
        &mut self,
        slot: u32,
        view: UnorderedAccessViewId,
    ) -> Result<&mut Self, BindError> {
        if self.stage != ShaderStage::Compute {
            return Err(BindError::ComputeOnly { stage: self.stage });
        }
        link_slot(
            &mut self.unordered_access_views,
            "unordered access view",
            slot,
            UNORDERED_ACCESS_SLOT_COUNT,
            view,
        )?;
        Ok(self)
    }

    fn write_into(&self, snapshot: &mut PipelineStateSnapshot) {
        let context = snapshot.stage_mut(self.stage);
        context.shader = Some(self.shader);
        context.resources = self.resources.clone();
        context.constant_buffers = self.constant_buffers.clone();
        context.samplers = self.samplers.clone();
        if self.stage == ShaderStage::Compute {
            snapshot.output.compute_unordered_access_views = self.unordered_access_views.clone();
        }
    }
}

/// Render targets, depth buffer and fixed-function output state.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputStageBinding {
    render_targets: Vec<Option<RenderTargetViewId>>,
    unordered_access_views: Vec<Option<UnorderedAccessViewId>>,
    depth_stencil_view: Option<DepthStencilViewId>,
    viewports: Vec<Viewport>,
    raster_state: Option<RasterStateId>,
    depth_stencil_state: Option<DepthStencilStateId>,
    stencil_ref: u32,
    blend_state: Option<BlendStateId>,
    blend_factors: [f32; 4],
}

impl Default for OutputStageBinding {
    fn default() -> Self {
        Self {
            render_targets: Vec::new(),
            unordered_access_views: Vec::new(),
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

impl OutputStageBinding {
    /// An output binding with nothing linked yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links a render target at `slot`.
    pub fn link_render_target(
        &mut self,
        slot: u32,
        view: RenderTargetViewId,
    ) -> Result<&mut Self, BindError> {
        link_slot(
            &mut self.render_targets,
            "render target view",
            slot,
            RENDER_TARGET_SLOT_COUNT,
            view,
        )?;
        Ok(self)
    }

    /// Links an output-merger unordered access view at `slot`.
    pub fn link_unordered_access_view(
        &mut self,
        slot: u32,
        view: UnorderedAccessViewId,
    ) -> Result<&mut Self, BindError> {
        link_slot(
            &mut self.unordered_access_views,
            "unordered access view",
            slot,
            UNORDERED_ACCESS_SLOT_COUNT,
            view,
        )?;
        Ok(self)
    }

    /// Links the depth/stencil attachment.
    pub fn link_depth_stencil_view(&mut self, view: DepthStencilViewId) -> &mut Self {
        self.depth_stencil_view = Some(view);
        self
    }

    /// Sets the viewport at `slot`; slots below it that were never set
    /// cover nothing.
    pub fn link_viewport(&mut self, slot: u32, viewport: Viewport) -> Result<&mut Self, BindError> {
        let index = slot as usize;
        if index >= VIEWPORT_SLOT_COUNT {
            return Err(BindError::SlotOutOfRange {
                kind: "viewport",
                slot,
                limit: VIEWPORT_SLOT_COUNT as u32,
            });
        }
        if self.viewports.len() <= index {
            self.viewports.resize(index + 1, Viewport::from_size(0, 0));
        }
        self.viewports[index] = viewport;
        Ok(self)
    }

    /// Links the rasterizer state.
    pub fn link_raster_state(&mut self, state: RasterStateId) -> &mut Self {
        self.raster_state = Some(state);
        self
    }

    /// Links the depth/stencil state and its stencil reference value.
    pub fn link_depth_stencil_state(
        &mut self,
        state: DepthStencilStateId,
        stencil_ref: u32,
    ) -> &mut Self {
        self.depth_stencil_state = Some(state);
        self.stencil_ref = stencil_ref;
        self
    }

    /// Links the blend state and its constant blend factors.
    pub fn link_blend_state(&mut self, state: BlendStateId, blend_factors: [f32; 4]) -> &mut Self {
        self.blend_state = Some(state);
        self.blend_factors = blend_factors;
        self
    }

    fn write_into(&self, snapshot: &mut PipelineStateSnapshot) {
        let output = &mut snapshot.output;
        output.render_targets = self.render_targets.clone();
        output.unordered_access_views = self.unordered_access_views.clone();
        output.depth_stencil_view = self.depth_stencil_view;
        output.viewports = self.viewports.clone();
        output.raster_state = self.raster_state;
        output.depth_stencil_state = self.depth_stencil_state;
        output.stencil_ref = self.stencil_ref;
        output.blend_state = self.blend_state;
        output.blend_factors = self.blend_factors;
    }
}

/// The input assembler bindings of a mesh and how to draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshBinding {
    /// The vertex buffer.
    pub vertex_buffer: BufferId,
    /// Bytes between two vertices.
    pub vertex_stride: u32,
    /// Number of vertices, used by non-indexed draws.
    pub vertex_count: u32,
    /// The index buffer, if the mesh is indexed.
    pub index_buffer: Option<BufferId>,
    /// Format of the indices.
    pub index_format: IndexFormat,
    /// Number of indices.
    pub index_count: u32,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
    /// The input layout, usually built with
    /// [`PipelineStateSnapshot::build_input_layout`].
    pub input_layout: Option<InputLayoutId>,
}

impl MeshBinding {
    /// Issues the draw call for the whole mesh.
    pub fn draw<C: DeviceContext + ?Sized>(&self, ctx: &mut C) {
        if self.index_buffer.is_some() {
            ctx.draw_indexed(self.index_count, 0, 0);
        } else {
            ctx.draw(self.vertex_count, 0);
        }
    }

    fn write_into(&self, snapshot: &mut PipelineStateSnapshot) {
        let mesh = &mut snapshot.mesh;
        mesh.vertex_buffer = Some(self.vertex_buffer);
        mesh.vertex_stride = self.vertex_stride;
        mesh.index_buffer = self.index_buffer;
        mesh.index_format = self.index_format;
        mesh.topology = Some(self.topology);
        mesh.input_layout = self.input_layout;
    }
}

/// Anything that can be bound to and cleared from the pipeline as a unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Bindable {
    /// A programmable stage.
    ShaderStage(ShaderStageBinding),
    /// The output stage.
    OutputStage(OutputStageBinding),
    /// A mesh.
    Mesh(MeshBinding),
}

impl Bindable {
    /// Writes this group into `snapshot`, leaving the other groups as they are.
    pub fn write_into(&self, snapshot: &mut PipelineStateSnapshot) {
        match self {
            Bindable::ShaderStage(binding) => binding.write_into(snapshot),
            Bindable::OutputStage(binding) => binding.write_into(snapshot),
            Bindable::Mesh(binding) => binding.write_into(snapshot),
        }
    }

    /// A snapshot specifying this group only.
    pub fn to_snapshot(&self) -> PipelineStateSnapshot {
        let mut snapshot = PipelineStateSnapshot::default();
        self.write_into(&mut snapshot);
        snapshot
    }

    /// The bindings [`Bindable::revert`] clears.
    pub fn clear_target(&self) -> ClearTarget {
        match self {
            Bindable::ShaderStage(binding) => ClearTarget::Stage(binding.stage),
            Bindable::OutputStage(_) => ClearTarget::OutputMerger,
            Bindable::Mesh(_) => ClearTarget::Mesh,
        }
    }

    /// Binds this group.
    pub fn apply<C: DeviceContext + ?Sized>(&self, binder: &mut PipelineStateBinder, ctx: &mut C) {
        binder.bind(ctx, &self.to_snapshot());
    }

    /// Clears the pipeline group this bindable occupies.
    pub fn revert<C: DeviceContext + ?Sized>(&self, binder: &mut PipelineStateBinder, ctx: &mut C) {
        binder.clear(ctx, self.clear_target());
    }
}

impl From<ShaderStageBinding> for Bindable {
    fn from(binding: ShaderStageBinding) -> Self {
        Bindable::ShaderStage(binding)
    }
}

impl From<OutputStageBinding> for Bindable {
    fn from(binding: OutputStageBinding) -> Self {
        Bindable::OutputStage(binding)
    }
}

impl From<MeshBinding> for Bindable {
    fn from(binding: MeshBinding) -> Self {
        Bindable::Mesh(binding)
    }
}

/// Keeps a set of bindables applied for its lifetime.
///
/// All bindables are applied with a single binder call on creation and
/// reverted, in reverse order, on drop. The context stays reachable through
/// [`ScopedBinding::context`] to issue draws and dispatches.
pub struct ScopedBinding<'a, C: DeviceContext + ?Sized> {
    binder: &'a mut PipelineStateBinder,
    ctx: &'a mut C,
    targets: Vec<ClearTarget>,
}

impl<'a, C: DeviceContext + ?Sized> ScopedBinding<'a, C> {
    /// Applies `bindables`.
    pub fn new(
        binder: &'a mut PipelineStateBinder,
        ctx: &'a mut C,
        bindables: impl IntoIterator<Item = &'a Bindable>,
    ) -> Self {
        let mut snapshot = PipelineStateSnapshot::default();
        let mut targets = Vec::new();
        for bindable in bindables {
            bindable.write_into(&mut snapshot);
            let target = bindable.clear_target();
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        binder.bind(ctx, &snapshot);
        Self {
            binder,
            ctx,
            targets,
        }
    }

    /// The context the bindables are applied on.
    pub fn context(&mut self) -> &mut C {
        &mut *self.ctx
    }

    /// The binder, to inspect what is bound.
    pub fn binder(&self) -> &PipelineStateBinder {
        &*self.binder
    }
}

impl<C: DeviceContext + ?Sized> Drop for ScopedBinding<'_, C> {
    fn drop(&mut self) {
        for target in self.targets.iter().rev() {
            self.binder.clear(&mut *self.ctx, *target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::binding::registry::{OutputUsage, StageMask};
    use crate::renderer::binding::test_context::{Call, MockContext};

    #[test]
    fn link_checks_slot_limits() {
        let mut binding = ShaderStageBinding::new(ShaderStage::Pixel, ShaderId(1));
        let err = binding
            .link_sampler(SAMPLER_SLOT_COUNT as u32, SamplerId(0))
            .unwrap_err();
        assert_eq!(
            err,
            BindError::SlotOutOfRange {
                kind: "sampler",
                slot: 16,
                limit: 16
            }
        );

        let mut output = OutputStageBinding::new();
        assert!(output.link_render_target(8, RenderTargetViewId(0)).is_err());
        assert!(output.link_viewport(15, Viewport::from_size(1, 1)).is_ok());
    }

    #[test]
    fn unordered_access_views_are_compute_only() {
        let mut pixel = ShaderStageBinding::new(ShaderStage::Pixel, ShaderId(1));
        assert_eq!(
            pixel
                .link_unordered_access_view(0, UnorderedAccessViewId(0))
                .unwrap_err(),
            BindError::ComputeOnly {
                stage: ShaderStage::Pixel
            }
        );

        let mut compute = ShaderStageBinding::new(ShaderStage::Compute, ShaderId(2));
        compute
            .link_unordered_access_view(1, UnorderedAccessViewId(4))
            .unwrap();
        let snapshot = Bindable::from(compute).to_snapshot();
        assert_eq!(
            snapshot.output.compute_unordered_access_views,
            vec![None, Some(UnorderedAccessViewId(4))]
        );
    }

    #[test]
    fn linking_past_the_end_leaves_holes() {
        let mut binding = ShaderStageBinding::new(ShaderStage::Vertex, ShaderId(1));
        binding
            .link_resource(2, ShaderResourceViewId(7))
            .unwrap()
            .link_constant_buffer(0, BufferId(3))
            .unwrap();

        let snapshot = Bindable::from(binding).to_snapshot();
        let vertex = snapshot.stage(ShaderStage::Vertex);
        assert_eq!(vertex.shader, Some(ShaderId(1)));
        assert_eq!(vertex.resources, vec![None, None, Some(ShaderResourceViewId(7))]);
        assert_eq!(vertex.constant_buffers, vec![Some(BufferId(3))]);
        assert_eq!(snapshot.stage(ShaderStage::Pixel).shader, None);
    }

    #[test]
    fn apply_then_revert() {
        let mut ctx = MockContext::default();
        let t1 = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();
        let mut binding = ShaderStageBinding::new(ShaderStage::Pixel, ShaderId(1));
        binding.link_resource(0, t1.srv).unwrap();
        let bindable = Bindable::from(binding);

        bindable.apply(&mut binder, &mut ctx);
        assert_eq!(binder.registry().input_stages(t1.resource), StageMask::PIXEL);

        bindable.revert(&mut binder, &mut ctx);
        assert_eq!(binder.registry().inputs().count(), 0);
        assert_eq!(binder.current().stage(ShaderStage::Pixel).shader, None);
        assert_eq!(ctx.calls.last().map(Call::is_clear), Some(true));
    }

    #[test]
    fn scoped_binding_reverts_on_drop() {
        let mut ctx = MockContext::default();
        let target = ctx.texture(1);
        let mut binder = PipelineStateBinder::new();

        let mut output = OutputStageBinding::new();
        output
            .link_render_target(0, target.rtv)
            .unwrap()
            .link_viewport(0, Viewport::from_size(64, 64))
            .unwrap();
        let mesh = MeshBinding {
            vertex_buffer: BufferId(1),
            vertex_stride: 12,
            vertex_count: 3,
            index_buffer: None,
            index_format: IndexFormat::Uint32,
            index_count: 0,
            topology: PrimitiveTopology::TriangleList,
            input_layout: Some(InputLayoutId(1)),
        };
        let bindables = [Bindable::from(output), Bindable::from(mesh.clone())];

        {
            let mut scope = ScopedBinding::new(&mut binder, &mut ctx, &bindables);
            assert_eq!(
                scope
                    .binder()
                    .registry()
                    .output_usage(target.resource),
                OutputUsage::RENDER_TARGET
            );
            mesh.draw(scope.context());
        }

        assert_eq!(binder.registry().outputs().count(), 0);
        assert!(binder.current().output.render_targets.is_empty());
        assert_eq!(binder.current().mesh.vertex_buffer, None);
        assert!(ctx.calls.contains(&Call::InputLayout(None)));
        assert!(ctx.calls.contains(&Call::Other));
    }
}
