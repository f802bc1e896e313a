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

use crate::renderer::api::{
    handles::*,
    resource::{BufferDescriptor, SamplerDescriptor, TextureDescriptor, ViewDescriptor},
    shader::{ShaderDescriptor, ShaderInfo},
    state::{BlendStateDescriptor, DepthStencilStateDescriptor, RasterStateDescriptor, VertexLayout},
};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::ViewResolver;
use std::fmt::Debug;

/// The object factory of a backend.
///
/// A device creates and releases everything a context later binds. It is
/// shared between threads, so implementations guard their tables internally.
/// Created objects are plain handles; wrap them in
/// [`Owned`](crate::renderer::api::resource::Owned) to have them released on drop.
pub trait GraphicsDevice: ViewResolver + Send + Sync + Debug + 'static {
    /// Creates a 2D texture, optionally filled with `data` (top mip, tightly packed).
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureId, ResourceError>;

    /// Creates a buffer, optionally filled with `data`.
    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<BufferId, ResourceError>;

    /// Overwrites part of a buffer.
    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Creates a shader resource view of a texture or buffer.
    fn create_shader_resource_view(
        &self,
        resource: ResourceId,
        descriptor: &ViewDescriptor,
    ) -> Result<ShaderResourceViewId, ResourceError>;

    /// Creates a render target view of a texture.
    fn create_render_target_view(
        &self,
        texture: TextureId,
        descriptor: &ViewDescriptor,
    ) -> Result<RenderTargetViewId, ResourceError>;

    /// Creates an unordered access view of a texture or buffer.
    fn create_unordered_access_view(
        &self,
        resource: ResourceId,
        descriptor: &ViewDescriptor,
    ) -> Result<UnorderedAccessViewId, ResourceError>;

    /// Creates a depth/stencil view of a texture.
    fn create_depth_stencil_view(
        &self,
        texture: TextureId,
        descriptor: &ViewDescriptor,
    ) -> Result<DepthStencilViewId, ResourceError>;

    /// Creates a sampler.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Creates a rasterizer state.
    fn create_raster_state(
        &self,
        descriptor: &RasterStateDescriptor,
    ) -> Result<RasterStateId, ResourceError>;

    /// Creates a depth/stencil state.
    fn create_depth_stencil_state(
        &self,
        descriptor: &DepthStencilStateDescriptor,
    ) -> Result<DepthStencilStateId, ResourceError>;

    /// Creates a blend state.
    fn create_blend_state(
        &self,
        descriptor: &BlendStateDescriptor,
    ) -> Result<BlendStateId, ResourceError>;

    /// Creates a shader from precompiled bytecode.
    fn create_shader(&self, descriptor: &ShaderDescriptor<'_>) -> Result<ShaderId, ResourceError>;

    /// Reflection data of a shader, `None` for an unknown handle.
    fn shader_info(&self, shader: ShaderId) -> Option<ShaderInfo>;

    /// Creates an input layout matching `layout` against the signature of
    /// `vertex_shader`.
    fn create_input_layout(
        &self,
        layout: &VertexLayout,
        vertex_shader: ShaderId,
    ) -> Result<InputLayoutId, ResourceError>;

    /// Releases an object. Views keep their resource's identity valid for
    /// resolution until they are released themselves.
    fn destroy(&self, object: DeviceObjectId) -> Result<(), ResourceError>;
}
