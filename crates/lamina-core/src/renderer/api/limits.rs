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

//! Slot counts exposed by the native pipeline.
//!
//! Clears are issued with null arrays of exactly these widths.

/// Shader resource view slots per stage.
pub const SHADER_RESOURCE_SLOT_COUNT: usize = 128;

/// Constant buffer slots per stage.
pub const CONSTANT_BUFFER_SLOT_COUNT: usize = 14;

/// Sampler slots per stage.
pub const SAMPLER_SLOT_COUNT: usize = 16;

/// Simultaneously bound render targets.
pub const RENDER_TARGET_SLOT_COUNT: usize = 8;

/// Unordered access view slots, shared by the output merger and counted
/// separately for the compute stage.
pub const UNORDERED_ACCESS_SLOT_COUNT: usize = 8;

/// Viewports (and scissor rectangles) per pipeline.
pub const VIEWPORT_SLOT_COUNT: usize = 16;
