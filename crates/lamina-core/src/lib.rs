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

//! # Lamina Core
//!
//! Backend-agnostic contracts and value types of the Lamina rendering layer,
//! and the pipeline state binder that diffs snapshots into native bind calls
//! while keeping read and write bindings of a resource apart.

#![warn(missing_docs)]

pub mod event;
pub mod platform;
pub mod renderer;
pub mod utils;

pub use renderer::{Bindable, PipelineStateBinder, PipelineStateSnapshot};
