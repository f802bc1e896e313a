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

use super::{BindFlags, Owned, TextureDescriptor, ViewDescriptor};
use crate::renderer::api::handles::*;
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDevice;
use std::sync::Arc;

/// A 2D texture with one view per bind flag it was created with.
///
/// Views are released before the texture.
#[derive(Debug)]
pub struct Texture2D {
    descriptor: TextureDescriptor,
    shader_resource_view: Option<Owned<ShaderResourceViewId>>,
    render_target_view: Option<Owned<RenderTargetViewId>>,
    unordered_access_view: Option<Owned<UnorderedAccessViewId>>,
    depth_stencil_view: Option<Owned<DepthStencilViewId>>,
    texture: Owned<TextureId>,
}

impl Texture2D {
    /// Creates the texture, then a view for each of `SHADER_RESOURCE`,
    /// `RENDER_TARGET`, `UNORDERED_ACCESS` and `DEPTH_STENCIL` in its bind flags.
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        descriptor: TextureDescriptor,
        data: Option<&[u8]>,
    ) -> Result<Self, ResourceError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "texture size {}x{} is empty",
                descriptor.width, descriptor.height
            )));
        }
        if let Some(data) = data {
            if data.len() as u64 != descriptor.byte_size() {
                return Err(ResourceError::InvalidDescriptor(format!(
                    "initial data is {} bytes, expected {}",
                    data.len(),
                    descriptor.byte_size()
                )));
            }
        }
        let texture = device.create_texture(&descriptor, data)?;
        Self::from_texture(device, Owned::new(device.clone(), texture), descriptor)
    }

    /// Wraps an existing texture, such as a swap chain backbuffer, and creates
    /// its views.
    pub fn from_texture(
        device: &Arc<dyn GraphicsDevice>,
        texture: Owned<TextureId>,
        descriptor: TextureDescriptor,
    ) -> Result<Self, ResourceError> {
        let id = texture.id();
        let view = ViewDescriptor::default();

        let mut this = Self {
            descriptor,
            shader_resource_view: None,
            render_target_view: None,
            unordered_access_view: None,
            depth_stencil_view: None,
            texture,
        };
        let bind = this.descriptor.bind;
        if bind.contains(BindFlags::SHADER_RESOURCE) {
            this.shader_resource_view = Some(Owned::new(
                device.clone(),
                device.create_shader_resource_view(id.into(), &view)?,
            ));
        }
        if bind.contains(BindFlags::RENDER_TARGET) {
            this.render_target_view = Some(Owned::new(
                device.clone(),
                device.create_render_target_view(id, &view)?,
            ));
        }
        if bind.contains(BindFlags::UNORDERED_ACCESS) {
            this.unordered_access_view = Some(Owned::new(
                device.clone(),
                device.create_unordered_access_view(id.into(), &view)?,
            ));
        }
        if bind.contains(BindFlags::DEPTH_STENCIL) {
            this.depth_stencil_view = Some(Owned::new(
                device.clone(),
                device.create_depth_stencil_view(id, &view)?,
            ));
        }
        Ok(this)
    }

    /// The descriptor the texture was created with.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// The texture handle.
    pub fn texture(&self) -> TextureId {
        self.texture.id()
    }

    /// The storage identity shared by every view of this texture.
    pub fn resource(&self) -> ResourceId {
        self.texture.id().into()
    }

    /// The shader resource view, if the texture is shader readable.
    pub fn srv(&self) -> Option<ShaderResourceViewId> {
        self.shader_resource_view.as_ref().map(Owned::id)
    }

    /// The render target view, if the texture is a render target.
    pub fn rtv(&self) -> Option<RenderTargetViewId> {
        self.render_target_view.as_ref().map(Owned::id)
    }

    /// The unordered access view, if the texture allows unordered access.
    pub fn uav(&self) -> Option<UnorderedAccessViewId> {
        self.unordered_access_view.as_ref().map(Owned::id)
    }

    /// The depth/stencil view, if the texture is a depth buffer.
    pub fn dsv(&self) -> Option<DepthStencilViewId> {
        self.depth_stencil_view.as_ref().map(Owned::id)
    }
}
