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

//! Opaque handles to device objects.
//!
//! Handles are plain identifiers handed out by a [`GraphicsDevice`]. They do not
//! own anything; ownership is expressed with [`Owned`] wrappers.
//!
//! [`GraphicsDevice`]: crate::renderer::traits::GraphicsDevice
//! [`Owned`]: crate::renderer::api::resource::Owned

use serde::{Deserialize, Serialize};

macro_rules! define_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub usize);
    };
}

define_handle!(
    /// A GPU buffer (vertex, index, constant or structured storage).
    BufferId
);
define_handle!(
    /// A GPU texture.
    TextureId
);
define_handle!(
    /// A read-only view of a resource, bindable to any shader stage.
    ShaderResourceViewId
);
define_handle!(
    /// A color output view used by the output merger.
    RenderTargetViewId
);
define_handle!(
    /// A read-write view usable from pixel or compute shaders.
    UnorderedAccessViewId
);
define_handle!(
    /// A depth/stencil output view.
    DepthStencilViewId
);
define_handle!(
    /// A sampler state object.
    SamplerId
);
define_handle!(
    /// A shader program for one pipeline stage.
    ShaderId
);
define_handle!(
    /// An input layout matching a vertex layout with a vertex shader signature.
    InputLayoutId
);
define_handle!(
    /// A rasterizer state object.
    RasterStateId
);
define_handle!(
    /// A depth/stencil state object.
    DepthStencilStateId
);
define_handle!(
    /// A blend state object.
    BlendStateId
);

/// The identity of the storage behind a view.
///
/// Several views (SRV, RTV, UAV, DSV) may share one identity. Hazard tracking
/// is keyed on this value, never on view handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceId {
    /// The storage is a buffer.
    Buffer(BufferId),
    /// The storage is a texture.
    Texture(TextureId),
}

impl From<BufferId> for ResourceId {
    fn from(id: BufferId) -> Self {
        ResourceId::Buffer(id)
    }
}

impl From<TextureId> for ResourceId {
    fn from(id: TextureId) -> Self {
        ResourceId::Texture(id)
    }
}

/// Any of the four view kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewId {
    /// A shader resource view.
    ShaderResource(ShaderResourceViewId),
    /// A render target view.
    RenderTarget(RenderTargetViewId),
    /// An unordered access view.
    UnorderedAccess(UnorderedAccessViewId),
    /// A depth/stencil view.
    DepthStencil(DepthStencilViewId),
}

impl From<ShaderResourceViewId> for ViewId {
    fn from(id: ShaderResourceViewId) -> Self {
        ViewId::ShaderResource(id)
    }
}

impl From<RenderTargetViewId> for ViewId {
    fn from(id: RenderTargetViewId) -> Self {
        ViewId::RenderTarget(id)
    }
}

impl From<UnorderedAccessViewId> for ViewId {
    fn from(id: UnorderedAccessViewId) -> Self {
        ViewId::UnorderedAccess(id)
    }
}

impl From<DepthStencilViewId> for ViewId {
    fn from(id: DepthStencilViewId) -> Self {
        ViewId::DepthStencil(id)
    }
}

/// Any object a device can release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceObjectId {
    /// A buffer.
    Buffer(BufferId),
    /// A texture.
    Texture(TextureId),
    /// A view of any kind.
    View(ViewId),
    /// A sampler.
    Sampler(SamplerId),
    /// A shader.
    Shader(ShaderId),
    /// An input layout.
    InputLayout(InputLayoutId),
    /// A rasterizer state.
    RasterState(RasterStateId),
    /// A depth/stencil state.
    DepthStencilState(DepthStencilStateId),
    /// A blend state.
    BlendState(BlendStateId),
}

macro_rules! impl_device_object {
    ($($handle:ty => |$id:ident| $object:expr;)*) => {
        $(
            impl From<$handle> for DeviceObjectId {
                fn from($id: $handle) -> Self {
                    $object
                }
            }
        )*
    };
}

impl_device_object! {
    BufferId => |id| DeviceObjectId::Buffer(id);
    TextureId => |id| DeviceObjectId::Texture(id);
    ShaderResourceViewId => |id| DeviceObjectId::View(ViewId::ShaderResource(id));
    RenderTargetViewId => |id| DeviceObjectId::View(ViewId::RenderTarget(id));
    UnorderedAccessViewId => |id| DeviceObjectId::View(ViewId::UnorderedAccess(id));
    DepthStencilViewId => |id| DeviceObjectId::View(ViewId::DepthStencil(id));
    SamplerId => |id| DeviceObjectId::Sampler(id);
    ShaderId => |id| DeviceObjectId::Shader(id);
    InputLayoutId => |id| DeviceObjectId::InputLayout(id);
    RasterStateId => |id| DeviceObjectId::RasterState(id);
    DepthStencilStateId => |id| DeviceObjectId::DepthStencilState(id);
    BlendStateId => |id| DeviceObjectId::BlendState(id);
}
