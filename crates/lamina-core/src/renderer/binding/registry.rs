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

//! Tracks which storage resources are bound for reading and which for writing.

use crate::lamina_bitflags;
use crate::renderer::api::enums::ShaderStage;
use crate::renderer::api::handles::ResourceId;
use std::collections::HashMap;

lamina_bitflags! {
    /// The set of stages reading a resource through shader resource views.
    pub struct StageMask: u8 {
        /// Vertex stage.
        const VERTEX = 1 << 0;
        /// Hull stage.
        const HULL = 1 << 1;
        /// Domain stage.
        const DOMAIN = 1 << 2;
        /// Geometry stage.
        const GEOMETRY = 1 << 3;
        /// Pixel stage.
        const PIXEL = 1 << 4;
        /// Compute stage.
        const COMPUTE = 1 << 5;
    }
}

impl StageMask {
    /// The mask holding only `stage`.
    pub const fn of(stage: ShaderStage) -> Self {
        Self::from_bits_retain(1 << stage.index())
    }

    /// The stages in the mask, in pipeline order.
    pub fn stages(self) -> impl Iterator<Item = ShaderStage> {
        ShaderStage::ALL
            .into_iter()
            .filter(move |stage| self.contains(Self::of(*stage)))
    }
}

lamina_bitflags! {
    /// The ways a resource is bound for writing.
    pub struct OutputUsage: u8 {
        /// Unordered access view of the compute stage.
        const COMPUTE_UAV = 1 << 0;
        /// Render target of the output merger.
        const RENDER_TARGET = 1 << 1;
        /// Unordered access view of the output merger.
        const OUTPUT_MERGER_UAV = 1 << 2;
        /// Depth/stencil attachment of the output merger.
        const DEPTH_STENCIL = 1 << 3;
    }
}

impl OutputUsage {
    /// Everything the combined output-merger call binds and clears.
    pub const OUTPUT_MERGER: Self = Self::from_bits_retain(
        Self::RENDER_TARGET.bits() | Self::OUTPUT_MERGER_UAV.bits() | Self::DEPTH_STENCIL.bits(),
    );
}

/// The bound-resource registry of a [`PipelineStateBinder`](super::PipelineStateBinder).
///
/// Keys are storage identities, never views. A resource is either an input
/// or an output, never both.
#[derive(Debug, Default, Clone)]
pub struct BoundResourceRegistry {
    inputs: HashMap<ResourceId, StageMask>,
    outputs: HashMap<ResourceId, OutputUsage>,
    valid: bool,
}

impl BoundResourceRegistry {
    /// An empty registry that is not yet valid.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once a first full pipeline state has been bound.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) fn mark_valid(&mut self) {
        self.valid = true;
    }

    /// Forgets every binding and marks the registry invalid.
    pub fn reset(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
        self.valid = false;
    }

    /// The stages reading `resource`, empty if it is not an input.
    pub fn input_stages(&self, resource: ResourceId) -> StageMask {
        self.inputs.get(&resource).copied().unwrap_or_default()
    }

    /// How `resource` is written, empty if it is not an output.
    pub fn output_usage(&self, resource: ResourceId) -> OutputUsage {
        self.outputs.get(&resource).copied().unwrap_or_default()
    }

    /// Every input and the stages reading it.
    pub fn inputs(&self) -> impl Iterator<Item = (ResourceId, StageMask)> + '_ {
        self.inputs.iter().map(|(r, s)| (*r, *s))
    }

    /// Every output and how it is written.
    pub fn outputs(&self) -> impl Iterator<Item = (ResourceId, OutputUsage)> + '_ {
        self.outputs.iter().map(|(r, u)| (*r, *u))
    }

    /// `true` when no resource is both an input and an output.
    pub fn is_exclusive(&self) -> bool {
        self.inputs.keys().all(|r| !self.outputs.contains_key(r))
    }

    /// Records `resource` as read by `stage`.
    ///
    /// The caller must have taken it out of the outputs first.
    pub fn register_input(&mut self, resource: ResourceId, stage: ShaderStage) {
        debug_assert!(!self.outputs.contains_key(&resource));
        self.inputs
            .entry(resource)
            .or_default()
            .insert(StageMask::of(stage));
    }

    /// Records `resource` as written with `usage`.
    ///
    /// The caller must have taken it out of the inputs first.
    pub fn register_output(&mut self, resource: ResourceId, usage: OutputUsage) {
        debug_assert!(!self.inputs.contains_key(&resource));
        self.outputs.entry(resource).or_default().insert(usage);
    }

    /// Removes `resource` from the inputs, returning the stages that read it.
    pub fn take_input(&mut self, resource: ResourceId) -> StageMask {
        self.inputs.remove(&resource).unwrap_or_default()
    }

    /// Removes `resource` from the outputs, returning how it was written.
    pub fn take_output(&mut self, resource: ResourceId) -> OutputUsage {
        self.outputs.remove(&resource).unwrap_or_default()
    }

    /// Drops `stage` from every input, removing resources no stage reads anymore.
    pub fn release_stage(&mut self, stage: ShaderStage) {
        self.inputs.retain(|_, stages| {
            stages.remove(StageMask::of(stage));
            !stages.is_empty()
        });
    }

    /// Drops `usage` from every output, removing resources no longer written.
    pub fn release_outputs(&mut self, usage: OutputUsage) {
        self.outputs.retain(|_, current| {
            current.remove(usage);
            !current.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::handles::{BufferId, TextureId};

    fn tex(id: usize) -> ResourceId {
        TextureId(id).into()
    }

    #[test]
    fn stage_mask_lists_stages_in_pipeline_order() {
        let mask = StageMask::of(ShaderStage::Pixel) | StageMask::of(ShaderStage::Vertex);
        let stages: Vec<_> = mask.stages().collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Pixel]);
        assert_eq!(StageMask::of(ShaderStage::Compute), StageMask::COMPUTE);
    }

    #[test]
    fn input_can_be_read_by_several_stages() {
        let mut registry = BoundResourceRegistry::new();
        registry.register_input(tex(1), ShaderStage::Vertex);
        registry.register_input(tex(1), ShaderStage::Pixel);

        registry.release_stage(ShaderStage::Vertex);
        assert_eq!(registry.input_stages(tex(1)), StageMask::PIXEL);

        registry.release_stage(ShaderStage::Pixel);
        assert!(registry.input_stages(tex(1)).is_empty());
        assert_eq!(registry.inputs().count(), 0);
    }

    #[test]
    fn take_moves_resource_between_maps() {
        let mut registry = BoundResourceRegistry::new();
        registry.register_input(tex(1), ShaderStage::Pixel);

        let stages = registry.take_input(tex(1));
        registry.register_output(tex(1), OutputUsage::RENDER_TARGET);

        assert_eq!(stages, StageMask::PIXEL);
        assert!(registry.is_exclusive());
        assert_eq!(registry.output_usage(tex(1)), OutputUsage::RENDER_TARGET);
    }

    #[test]
    fn release_outputs_keeps_other_usages() {
        let mut registry = BoundResourceRegistry::new();
        let buffer: ResourceId = BufferId(3).into();
        registry.register_output(buffer, OutputUsage::COMPUTE_UAV);
        registry.register_output(buffer, OutputUsage::OUTPUT_MERGER_UAV);
        registry.register_output(tex(2), OutputUsage::DEPTH_STENCIL);

        registry.release_outputs(OutputUsage::OUTPUT_MERGER);

        assert_eq!(registry.output_usage(buffer), OutputUsage::COMPUTE_UAV);
        assert!(registry.output_usage(tex(2)).is_empty());
    }

    #[test]
    fn reset_invalidates() {
        let mut registry = BoundResourceRegistry::new();
        registry.register_input(tex(1), ShaderStage::Pixel);
        registry.mark_valid();
        assert!(registry.is_valid());

        registry.reset();
        assert!(!registry.is_valid());
        assert_eq!(registry.inputs().count(), 0);
    }
}
