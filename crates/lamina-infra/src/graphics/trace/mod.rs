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

//! Capture and replay of device context calls.
//!
//! A [`RecordingContext`] wraps another context, forwards every call to it and
//! keeps a [`CommandList`]. Lists can be stored in a compact binary form and
//! replayed on any [`DeviceContext`](lamina_core::renderer::traits::DeviceContext).

mod command;
mod recorder;

pub use self::command::*;
pub use self::recorder::*;
