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

//! Shader object descriptors.
//!
//! Shaders arrive as precompiled bytecode; compiling source text is left to
//! external tooling.

use super::enums::ShaderStage;
use std::borrow::Cow;

/// A descriptor used to create a [`ShaderId`](super::handles::ShaderId).
#[derive(Debug, Clone)]
pub struct ShaderDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The stage the bytecode was compiled for.
    pub stage: ShaderStage,
    /// The compiled program.
    pub bytecode: Cow<'a, [u8]>,
    /// Thread group size, as reflected from a compute shader.
    /// Ignored for the other stages.
    pub group_size: [u32; 3],
}

/// Information the device reflects from a created shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderInfo {
    /// The stage of the program.
    pub stage: ShaderStage,
    /// Thread group size; `[1, 1, 1]` outside the compute stage.
    pub group_size: [u32; 3],
}

impl ShaderInfo {
    /// Number of thread groups needed to cover `extent` threads per axis.
    pub fn dispatch_groups(&self, extent: [u32; 3]) -> [u32; 3] {
        dispatch_groups(extent, self.group_size)
    }
}

/// Divides `extent` by `group_size` per axis, rounding up.
///
/// A zero group size is treated as one.
pub fn dispatch_groups(extent: [u32; 3], group_size: [u32; 3]) -> [u32; 3] {
    let mut groups = [0; 3];
    for axis in 0..3 {
        let size = group_size[axis].max(1);
        groups[axis] = extent[axis].div_ceil(size);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_rounds_up_partial_groups() {
        assert_eq!(dispatch_groups([1920, 1080, 1], [8, 8, 1]), [240, 135, 1]);
        assert_eq!(dispatch_groups([1921, 1, 1], [8, 8, 1]), [241, 1, 1]);
    }

    #[test]
    fn dispatch_with_degenerate_group_size() {
        assert_eq!(dispatch_groups([5, 0, 3], [0, 4, 1]), [5, 0, 3]);
    }
}
