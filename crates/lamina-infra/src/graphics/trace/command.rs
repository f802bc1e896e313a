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

//! The recorded command format.

use bincode::config;
use lamina_core::renderer::api::{
    enums::{IndexFormat, PrimitiveTopology, ShaderStage},
    handles::*,
    state::Viewport,
};
use lamina_core::renderer::traits::DeviceContext;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version written at the start of every encoded list.
pub const TRACE_FORMAT_VERSION: u32 = 1;

/// An error raised while storing or loading a [`CommandList`].
#[derive(Debug, Error)]
pub enum TraceError {
    /// The list could not be encoded.
    #[error("failed to encode trace: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The bytes are not a trace.
    #[error("failed to decode trace: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// The trace was written by an incompatible version.
    #[error("trace format version {found} is not supported (expected {expected})")]
    Version {
        /// The version in the trace.
        found: u32,
        /// The version this build reads.
        expected: u32,
    },
    /// The trace file could not be read or written.
    #[error("trace I/O failed on {path}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// One call made on a device context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContextCommand {
    /// `set_index_buffer`.
    SetIndexBuffer(Option<BufferId>, IndexFormat),
    /// `set_vertex_buffer`.
    SetVertexBuffer(Option<BufferId>, u32),
    /// `set_input_layout`.
    SetInputLayout(Option<InputLayoutId>),
    /// `set_primitive_topology`.
    SetPrimitiveTopology(PrimitiveTopology),
    /// `set_viewports`.
    SetViewports(Vec<Viewport>),
    /// `set_raster_state`.
    SetRasterState(Option<RasterStateId>),
    /// `set_depth_stencil_state`.
    SetDepthStencilState(Option<DepthStencilStateId>, u32),
    /// `set_blend_state`.
    SetBlendState(Option<BlendStateId>, [f32; 4]),
    /// `set_shader`.
    SetShader(ShaderStage, Option<ShaderId>),
    /// `set_constant_buffers`.
    SetConstantBuffers {
        /// The stage.
        stage: ShaderStage,
        /// First slot.
        start_slot: u32,
        /// The buffers.
        buffers: Vec<Option<BufferId>>,
    },
    /// `set_samplers`.
    SetSamplers {
        /// The stage.
        stage: ShaderStage,
        /// First slot.
        start_slot: u32,
        /// The samplers.
        samplers: Vec<Option<SamplerId>>,
    },
    /// `set_shader_resources`.
    SetShaderResources {
        /// The stage.
        stage: ShaderStage,
        /// First slot.
        start_slot: u32,
        /// The views.
        views: Vec<Option<ShaderResourceViewId>>,
    },
    /// `set_output_merger`.
    SetOutputMerger {
        /// Render targets.
        render_targets: Vec<Option<RenderTargetViewId>>,
        /// Depth/stencil target.
        depth_stencil: Option<DepthStencilViewId>,
        /// Output merger unordered access views.
        unordered_access_views: Vec<Option<UnorderedAccessViewId>>,
    },
    /// `set_compute_unordered_access_views`.
    SetComputeUnorderedAccessViews {
        /// First slot.
        start_slot: u32,
        /// The views.
        views: Vec<Option<UnorderedAccessViewId>>,
    },
    /// `clear_render_target`.
    ClearRenderTarget(RenderTargetViewId, [f32; 4]),
    /// `clear_depth_stencil`.
    ClearDepthStencil(DepthStencilViewId, f32, u8),
    /// `draw`.
    Draw {
        /// Vertices to draw.
        vertex_count: u32,
        /// First vertex.
        start_vertex: u32,
    },
    /// `draw_indexed`.
    DrawIndexed {
        /// Indices to draw.
        index_count: u32,
        /// First index.
        start_index: u32,
        /// Value added to each index.
        base_vertex: i32,
    },
    /// `dispatch`.
    Dispatch([u32; 3]),
}

impl ContextCommand {
    /// Returns `true` for calls that change pipeline state.
    pub fn is_state_change(&self) -> bool {
        !matches!(
            self,
            ContextCommand::ClearRenderTarget(..)
                | ContextCommand::ClearDepthStencil(..)
                | ContextCommand::Draw { .. }
                | ContextCommand::DrawIndexed { .. }
                | ContextCommand::Dispatch(_)
        )
    }

    /// Issues the call on `ctx`.
    pub fn apply<C: DeviceContext + ?Sized>(&self, ctx: &mut C) {
        match self {
            ContextCommand::SetIndexBuffer(buffer, format) => ctx.set_index_buffer(*buffer, *format),
            ContextCommand::SetVertexBuffer(buffer, stride) => ctx.set_vertex_buffer(*buffer, *stride),
            ContextCommand::SetInputLayout(layout) => ctx.set_input_layout(*layout),
            ContextCommand::SetPrimitiveTopology(topology) => ctx.set_primitive_topology(*topology),
            ContextCommand::SetViewports(viewports) => ctx.set_viewports(viewports),
            ContextCommand::SetRasterState(state) => ctx.set_raster_state(*state),
            ContextCommand::SetDepthStencilState(state, stencil_ref) => {
                ctx.set_depth_stencil_state(*state, *stencil_ref)
            }
            ContextCommand::SetBlendState(state, factors) => ctx.set_blend_state(*state, *factors),
            ContextCommand::SetShader(stage, shader) => ctx.set_shader(*stage, *shader),
            ContextCommand::SetConstantBuffers {
                stage,
                start_slot,
                buffers,
            } => ctx.set_constant_buffers(*stage, *start_slot, buffers),
            ContextCommand::SetSamplers {
                stage,
                start_slot,
                samplers,
            } => ctx.set_samplers(*stage, *start_slot, samplers),
            ContextCommand::SetShaderResources {
                stage,
                start_slot,
                views,
            } => ctx.set_shader_resources(*stage, *start_slot, views),
            ContextCommand::SetOutputMerger {
                render_targets,
                depth_stencil,
                unordered_access_views,
            } => ctx.set_output_merger(render_targets, *depth_stencil, unordered_access_views),
            ContextCommand::SetComputeUnorderedAccessViews { start_slot, views } => {
                ctx.set_compute_unordered_access_views(*start_slot, views)
            }
            ContextCommand::ClearRenderTarget(view, color) => ctx.clear_render_target(*view, *color),
            ContextCommand::ClearDepthStencil(view, depth, stencil) => {
                ctx.clear_depth_stencil(*view, *depth, *stencil)
            }
            ContextCommand::Draw {
                vertex_count,
                start_vertex,
            } => ctx.draw(*vertex_count, *start_vertex),
            ContextCommand::DrawIndexed {
                index_count,
                start_index,
                base_vertex,
            } => ctx.draw_indexed(*index_count, *start_index, *base_vertex),
            ContextCommand::Dispatch(groups) => ctx.dispatch(*groups),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct TraceFile {
    version: u32,
    commands: Vec<ContextCommand>,
}

/// An ordered list of recorded context calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandList {
    commands: Vec<ContextCommand>,
}

impl CommandList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command.
    pub fn push(&mut self, command: ContextCommand) {
        self.commands.push(command);
    }

    /// The recorded commands, in call order.
    pub fn commands(&self) -> &[ContextCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands that change pipeline state.
    pub fn state_changes(&self) -> usize {
        self.commands.iter().filter(|c| c.is_state_change()).count()
    }

    /// Issues every command on `ctx`, in order.
    pub fn replay<C: DeviceContext + ?Sized>(&self, ctx: &mut C) {
        log::debug!("Replaying {} commands", self.commands.len());
        for command in &self.commands {
            command.apply(ctx);
        }
    }

    /// Encodes the list, prefixed with [`TRACE_FORMAT_VERSION`].
    pub fn encode(&self) -> Result<Vec<u8>, TraceError> {
        let file = TraceFile {
            version: TRACE_FORMAT_VERSION,
            commands: self.commands.clone(),
        };
        Ok(bincode::serde::encode_to_vec(&file, config::standard())?)
    }

    /// Decodes a list produced by [`CommandList::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, TraceError> {
        let (file, _): (TraceFile, _) = bincode::serde::decode_from_slice(bytes, config::standard())?;
        if file.version != TRACE_FORMAT_VERSION {
            return Err(TraceError::Version {
                found: file.version,
                expected: TRACE_FORMAT_VERSION,
            });
        }
        Ok(Self {
            commands: file.commands,
        })
    }

    /// Writes the encoded list to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TraceError> {
        let path = path.as_ref();
        let bytes = self.encode()?;
        fs::write(path, &bytes).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Saved {} commands to {}", self.commands.len(), path.display());
        Ok(())
    }

    /// Reads a list written by [`CommandList::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }
}

impl FromIterator<ContextCommand> for CommandList {
    fn from_iter<I: IntoIterator<Item = ContextCommand>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a ContextCommand;
    type IntoIter = std::slice::Iter<'a, ContextCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
