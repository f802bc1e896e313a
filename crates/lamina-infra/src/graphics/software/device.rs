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

//! An in-memory [`GraphicsDevice`].
//!
//! Objects live in tables guarded by mutexes; handles come from one atomic
//! counter so no two objects ever share an id. Buffers and textures keep
//! their bytes, which makes uploads and clears observable from tests.

use super::settings::DeviceDescriptor;
use lamina_core::renderer::api::{
    enums::{ResourceUsage, ShaderStage, TextureFormat},
    handles::*,
    resource::{
        BindFlags, BufferDescriptor, Owned, SamplerDescriptor, Texture2D, TextureDescriptor,
        ViewDescriptor,
    },
    shader::{ShaderDescriptor, ShaderInfo},
    state::{BlendStateDescriptor, DepthStencilStateDescriptor, RasterStateDescriptor, VertexLayout},
};
use lamina_core::renderer::error::{LogCategory, ResourceError, StatusCode};
use lamina_core::renderer::traits::{GraphicsDevice, ViewResolver};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct BufferEntry {
    descriptor: BufferDescriptor,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct TextureEntry {
    descriptor: TextureDescriptor,
    bytes: Vec<u8>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, table: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::Backend(format!("Mutex poisoned ({table}): {e}")))
}

/// Rejects a call the way the native runtime would, logging it as an error.
#[track_caller]
fn reject(code: StatusCode, reason: &str) -> ResourceError {
    log::warn!("{reason}");
    match code.check(LogCategory::Error) {
        Ok(()) => ResourceError::Native(StatusCode::Failed),
        Err(code) => ResourceError::Native(code),
    }
}

/// Encodes one texel of `format` from a normalized color.
fn encode_texel(format: TextureFormat, color: [f32; 4]) -> Vec<u8> {
    let unorm = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    match format {
        TextureFormat::Rgba8Unorm => color.iter().map(|c| unorm(*c)).collect(),
        TextureFormat::Bgra8Unorm => [color[2], color[1], color[0], color[3]]
            .iter()
            .map(|c| unorm(*c))
            .collect(),
        TextureFormat::R32Float | TextureFormat::Depth32Float => color[0].to_le_bytes().to_vec(),
        TextureFormat::Rgba32Float => bytemuck::cast_slice::<f32, u8>(&color).to_vec(),
        TextureFormat::R32Uint => (color[0] as u32).to_le_bytes().to_vec(),
        TextureFormat::Depth24PlusStencil8 => {
            let depth = (color[0].clamp(0.0, 1.0) * 16_777_215.0).round() as u32;
            let stencil = color[1] as u32 & 0xFF;
            (depth | (stencil << 24)).to_le_bytes().to_vec()
        }
        TextureFormat::Rgba16Float => color
            .iter()
            .flat_map(|c| f16_bits(*c).to_le_bytes())
            .collect(),
        TextureFormat::Unknown => Vec::new(),
    }
}

/// Converts to half precision, flushing denormals to zero and saturating to infinity.
fn f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let mantissa = bits & 0x007F_FFFF;
    if exponent == 0xFF {
        let nan = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7C00 | nan;
    }
    let exponent = exponent - 127 + 15;
    if exponent >= 0x1F {
        sign | 0x7C00
    } else if exponent <= 0 {
        sign
    } else {
        sign | ((exponent as u16) << 10) | (mantissa >> 13) as u16
    }
}

/// The textures created with a swap chain.
#[derive(Debug)]
pub struct SwapChain {
    /// The color target presented to the window.
    pub backbuffer: Texture2D,
    /// The depth buffer, if one was requested.
    pub depth_buffer: Option<Texture2D>,
    presented: u64,
}

impl SwapChain {
    /// Marks the current backbuffer as shown.
    pub fn present(&mut self) {
        self.presented += 1;
        log::trace!("Presented frame {}", self.presented);
    }

    /// Number of frames presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }
}

/// A [`GraphicsDevice`] that keeps every object in memory.
#[derive(Debug)]
pub struct SoftwareDevice {
    descriptor: DeviceDescriptor,
    buffers: Mutex<HashMap<BufferId, BufferEntry>>,
    textures: Mutex<HashMap<TextureId, TextureEntry>>,
    views: Mutex<HashMap<ViewId, ResourceId>>,
    shaders: Mutex<HashMap<ShaderId, ShaderInfo>>,
    /// Samplers, fixed-function states and input layouts. Their descriptors
    /// are validated on creation and never read back.
    states: Mutex<HashSet<DeviceObjectId>>,
    next_id: AtomicUsize,
}

impl SoftwareDevice {
    /// Creates a device with the given settings.
    pub fn new(descriptor: DeviceDescriptor) -> Self {
        log::info!(
            "Software device created on adapter {} ({})",
            descriptor.adapter_index,
            if descriptor.compute_only {
                "compute only"
            } else {
                "with swap chain"
            }
        );
        Self {
            descriptor,
            buffers: Mutex::new(HashMap::new()),
            textures: Mutex::new(HashMap::new()),
            views: Mutex::new(HashMap::new()),
            shaders: Mutex::new(HashMap::new()),
            states: Mutex::new(HashSet::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// The settings the device was created with.
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn generate_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Creates the backbuffer and, if configured, the depth buffer.
    ///
    /// Fails with [`StatusCode::InvalidCall`] on a compute-only device.
    pub fn create_swap_chain(self: &Arc<Self>) -> Result<SwapChain, ResourceError> {
        if self.descriptor.compute_only {
            return Err(reject(
                StatusCode::InvalidCall,
                "A compute-only device has no swap chain",
            ));
        }
        let device: Arc<dyn GraphicsDevice> = self.clone();
        let settings = &self.descriptor;

        let mut bind = BindFlags::RENDER_TARGET;
        if settings.backbuffer_unordered_access {
            bind |= BindFlags::UNORDERED_ACCESS;
        }
        if settings.backbuffer_shader_input {
            bind |= BindFlags::SHADER_RESOURCE;
        }
        let backbuffer = Texture2D::new(
            &device,
            TextureDescriptor {
                label: Some(format!("{} backbuffer", settings.window_name)),
                width: settings.width,
                height: settings.height,
                format: settings.backbuffer_format,
                sample_count: settings.sample_count,
                bind,
                ..Default::default()
            },
            None,
        )?;

        let depth_buffer = settings
            .depth_format
            .map(|format| {
                Texture2D::new(
                    &device,
                    TextureDescriptor {
                        label: Some(format!("{} depth buffer", settings.window_name)),
                        width: settings.width,
                        height: settings.height,
                        format,
                        sample_count: settings.sample_count,
                        bind: BindFlags::DEPTH_STENCIL,
                        ..Default::default()
                    },
                    None,
                )
            })
            .transpose()?;

        log::info!(
            "Swap chain '{}' created: {}x{} {:?}",
            settings.window_name,
            settings.width,
            settings.height,
            settings.backbuffer_format
        );
        Ok(SwapChain {
            backbuffer,
            depth_buffer,
            presented: 0,
        })
    }

    /// Creates the rasterizer state described by the device settings.
    pub fn create_default_raster_state(
        self: &Arc<Self>,
    ) -> Result<Owned<RasterStateId>, ResourceError> {
        let descriptor = RasterStateDescriptor {
            fill_mode: self.descriptor.fill_mode,
            cull_mode: self.descriptor.cull_mode,
            depth_clip: true,
            ..Default::default()
        };
        let id = self.create_raster_state(&descriptor)?;
        Ok(Owned::new(self.clone(), id))
    }

    /// A copy of a buffer's contents.
    pub fn read_buffer(&self, buffer: BufferId) -> Result<Vec<u8>, ResourceError> {
        let buffers = lock(&self.buffers, "buffers")?;
        buffers
            .get(&buffer)
            .map(|entry| entry.bytes.clone())
            .ok_or(ResourceError::InvalidHandle)
    }

    /// A copy of a texture's top mip level.
    pub fn read_texture(&self, texture: TextureId) -> Result<Vec<u8>, ResourceError> {
        let textures = lock(&self.textures, "textures")?;
        textures
            .get(&texture)
            .map(|entry| entry.bytes.clone())
            .ok_or(ResourceError::InvalidHandle)
    }

    /// Fills the texture behind `view` with `color`, encoded in the texture format.
    pub(crate) fn fill_view(&self, view: ViewId, color: [f32; 4]) -> Result<(), ResourceError> {
        let Some(ResourceId::Texture(texture)) = self.resource_of(view) else {
            return Err(ResourceError::InvalidHandle);
        };
        let mut textures = lock(&self.textures, "textures")?;
        let entry = textures
            .get_mut(&texture)
            .ok_or(ResourceError::InvalidHandle)?;
        let texel = encode_texel(entry.descriptor.format, color);
        if !texel.is_empty() {
            for chunk in entry.bytes.chunks_exact_mut(texel.len()) {
                chunk.copy_from_slice(&texel);
            }
        }
        Ok(())
    }

    /// The shader stage a shader was compiled for.
    pub(crate) fn shader_stage(&self, shader: ShaderId) -> Option<ShaderStage> {
        self.shader_info(shader).map(|info| info.stage)
    }

    /// Number of objects not yet destroyed.
    pub fn live_object_count(&self) -> usize {
        let count = |len: Result<usize, ResourceError>| len.unwrap_or(0);
        count(lock(&self.buffers, "buffers").map(|t| t.len()))
            + count(lock(&self.textures, "textures").map(|t| t.len()))
            + count(lock(&self.views, "views").map(|t| t.len()))
            + count(lock(&self.shaders, "shaders").map(|t| t.len()))
            + count(lock(&self.states, "states").map(|t| t.len()))
    }

    /// Bind flags and mip count of a resource; buffers have one level.
    fn resource_layout(&self, resource: ResourceId) -> Result<(BindFlags, u32), ResourceError> {
        match resource {
            ResourceId::Buffer(id) => lock(&self.buffers, "buffers")?
                .get(&id)
                .map(|entry| (entry.descriptor.bind, 1))
                .ok_or(ResourceError::InvalidHandle),
            ResourceId::Texture(id) => lock(&self.textures, "textures")?
                .get(&id)
                .map(|entry| (entry.descriptor.bind, entry.descriptor.mip_levels))
                .ok_or(ResourceError::InvalidHandle),
        }
    }

    fn create_view(
        &self,
        resource: ResourceId,
        descriptor: &ViewDescriptor,
        required: BindFlags,
        kind: &str,
    ) -> Result<usize, ResourceError> {
        let (bind, mip_levels) = self.resource_layout(resource)?;
        if !bind.contains(required) {
            return Err(reject(
                StatusCode::InvalidArgument,
                &format!("Cannot create a {kind} view of {resource:?}, its bind flags are {bind:?}"),
            ));
        }
        if descriptor.mip_slice >= mip_levels.max(1) {
            return Err(reject(
                StatusCode::InvalidArgument,
                &format!("Mip slice {} is out of range for {resource:?}", descriptor.mip_slice),
            ));
        }
        Ok(self.generate_id())
    }

    fn insert_view(&self, view: ViewId, resource: ResourceId) -> Result<(), ResourceError> {
        lock(&self.views, "views")?.insert(view, resource);
        Ok(())
    }

    fn insert_state(&self, object: impl Into<DeviceObjectId>) -> Result<(), ResourceError> {
        lock(&self.states, "states")?.insert(object.into());
        Ok(())
    }
}

impl ViewResolver for SoftwareDevice {
    fn resource_of(&self, view: ViewId) -> Option<ResourceId> {
        self.views
            .lock()
            .ok()
            .and_then(|views| views.get(&view).copied())
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureId, ResourceError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(reject(StatusCode::InvalidArgument, "Texture size is empty"));
        }
        if descriptor.format == TextureFormat::Unknown {
            return Err(reject(StatusCode::InvalidArgument, "Texture format is unknown"));
        }
        if descriptor.usage == ResourceUsage::Immutable && data.is_none() {
            return Err(reject(
                StatusCode::InvalidArgument,
                "An immutable texture needs initial data",
            ));
        }
        if descriptor.format.is_depth()
            && descriptor
                .bind
                .intersects(BindFlags::RENDER_TARGET | BindFlags::UNORDERED_ACCESS)
        {
            return Err(reject(
                StatusCode::InvalidArgument,
                "A depth texture cannot be a render target or have unordered access",
            ));
        }

        let size = descriptor.byte_size() as usize;
        let bytes = match data {
            Some(data) if data.len() != size => {
                return Err(reject(
                    StatusCode::InvalidArgument,
                    &format!("Texture data is {} bytes, expected {size}", data.len()),
                ));
            }
            Some(data) => data.to_vec(),
            None => vec![0; size],
        };

        let id = TextureId(self.generate_id());
        lock(&self.textures, "textures")?.insert(
            id,
            TextureEntry {
                descriptor: descriptor.clone(),
                bytes,
            },
        );
        log::debug!("Created {:?} ({:?})", id, descriptor.label);
        Ok(id)
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<BufferId, ResourceError> {
        if descriptor.size == 0 {
            return Err(reject(StatusCode::InvalidArgument, "Buffer size is zero"));
        }
        if descriptor.usage == ResourceUsage::Dynamic
            && descriptor.bind.contains(BindFlags::UNORDERED_ACCESS)
        {
            return Err(reject(
                StatusCode::InvalidArgument,
                "A dynamic buffer cannot have unordered access",
            ));
        }
        if descriptor.usage == ResourceUsage::Immutable && data.is_none() {
            return Err(reject(
                StatusCode::InvalidArgument,
                "An immutable buffer needs initial data",
            ));
        }
        if descriptor.structure_stride != 0
            && descriptor.size % descriptor.structure_stride as u64 != 0
        {
            return Err(reject(
                StatusCode::InvalidArgument,
                "Buffer size is not a multiple of its structure stride",
            ));
        }

        let mut bytes = vec![0; descriptor.size as usize];
        if let Some(data) = data {
            if data.len() > bytes.len() {
                return Err(reject(
                    StatusCode::InvalidArgument,
                    "Initial data is larger than the buffer",
                ));
            }
            bytes[..data.len()].copy_from_slice(data);
        }

        let id = BufferId(self.generate_id());
        lock(&self.buffers, "buffers")?.insert(
            id,
            BufferEntry {
                descriptor: descriptor.clone(),
                bytes,
            },
        );
        log::debug!("Created {:?} ({} bytes)", id, descriptor.size);
        Ok(id)
    }

    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut buffers = lock(&self.buffers, "buffers")?;
        let entry = buffers.get_mut(&buffer).ok_or(ResourceError::InvalidHandle)?;
        if entry.descriptor.usage == ResourceUsage::Immutable {
            return Err(reject(
                StatusCode::InvalidCall,
                "An immutable buffer cannot be written",
            ));
        }
        let start = offset as usize;
        let end = start.saturating_add(data.len());
        if end > entry.bytes.len() {
            return Err(reject(
                StatusCode::InvalidArgument,
                &format!("Write of {start}..{end} is outside {buffer:?}"),
            ));
        }
        entry.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn create_shader_resource_view(
        &self,
        resource: ResourceId,
        descriptor: &ViewDescriptor,
    ) -> Result<ShaderResourceViewId, ResourceError> {
        let id = ShaderResourceViewId(self.create_view(
            resource,
            descriptor,
            BindFlags::SHADER_RESOURCE,
            "shader resource",
        )?);
        self.insert_view(id.into(), resource)?;
        Ok(id)
    }

    fn create_render_target_view(
        &self,
        texture: TextureId,
        descriptor: &ViewDescriptor,
    ) -> Result<RenderTargetViewId, ResourceError> {
        let resource = ResourceId::Texture(texture);
        let id = RenderTargetViewId(self.create_view(
            resource,
            descriptor,
            BindFlags::RENDER_TARGET,
            "render target",
        )?);
        self.insert_view(id.into(), resource)?;
        Ok(id)
    }

    fn create_unordered_access_view(
        &self,
        resource: ResourceId,
        descriptor: &ViewDescriptor,
    ) -> Result<UnorderedAccessViewId, ResourceError> {
        let id = UnorderedAccessViewId(self.create_view(
            resource,
            descriptor,
            BindFlags::UNORDERED_ACCESS,
            "unordered access",
        )?);
        self.insert_view(id.into(), resource)?;
        Ok(id)
    }

    fn create_depth_stencil_view(
        &self,
        texture: TextureId,
        descriptor: &ViewDescriptor,
    ) -> Result<DepthStencilViewId, ResourceError> {
        let resource = ResourceId::Texture(texture);
        let id = DepthStencilViewId(self.create_view(
            resource,
            descriptor,
            BindFlags::DEPTH_STENCIL,
            "depth/stencil",
        )?);
        self.insert_view(id.into(), resource)?;
        Ok(id)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        if !(1..=16).contains(&descriptor.max_anisotropy) {
            return Err(reject(
                StatusCode::InvalidArgument,
                "Sampler anisotropy must be between 1 and 16",
            ));
        }
        let id = SamplerId(self.generate_id());
        self.insert_state(id)?;
        Ok(id)
    }

    fn create_raster_state(
        &self,
        descriptor: &RasterStateDescriptor,
    ) -> Result<RasterStateId, ResourceError> {
        let id = RasterStateId(self.generate_id());
        self.insert_state(id)?;
        log::debug!("Created {:?}: {:?}", id, descriptor);
        Ok(id)
    }

    fn create_depth_stencil_state(
        &self,
        descriptor: &DepthStencilStateDescriptor,
    ) -> Result<DepthStencilStateId, ResourceError> {
        if descriptor.depth_write && !descriptor.depth_enabled {
            log::warn!("Depth writes are ignored while the depth test is disabled");
        }
        let id = DepthStencilStateId(self.generate_id());
        self.insert_state(id)?;
        log::debug!("Created {:?}: {:?}", id, descriptor);
        Ok(id)
    }

    fn create_blend_state(
        &self,
        descriptor: &BlendStateDescriptor,
    ) -> Result<BlendStateId, ResourceError> {
        let id = BlendStateId(self.generate_id());
        self.insert_state(id)?;
        log::debug!("Created {:?}: {:?}", id, descriptor);
        Ok(id)
    }

    fn create_shader(&self, descriptor: &ShaderDescriptor<'_>) -> Result<ShaderId, ResourceError> {
        if descriptor.bytecode.is_empty() {
            return Err(reject(StatusCode::InvalidArgument, "Shader bytecode is empty"));
        }
        let group_size = if descriptor.stage == ShaderStage::Compute {
            descriptor.group_size
        } else {
            [1, 1, 1]
        };
        let id = ShaderId(self.generate_id());
        lock(&self.shaders, "shaders")?.insert(
            id,
            ShaderInfo {
                stage: descriptor.stage,
                group_size,
            },
        );
        log::debug!(
            "Created {} shader {:?} ({:?})",
            descriptor.stage.short_name(),
            id,
            descriptor.label
        );
        Ok(id)
    }

    fn shader_info(&self, shader: ShaderId) -> Option<ShaderInfo> {
        self.shaders
            .lock()
            .ok()
            .and_then(|shaders| shaders.get(&shader).copied())
    }

    fn create_input_layout(
        &self,
        layout: &VertexLayout,
        vertex_shader: ShaderId,
    ) -> Result<InputLayoutId, ResourceError> {
        match self.shader_stage(vertex_shader) {
            Some(ShaderStage::Vertex) => {}
            Some(stage) => {
                return Err(reject(
                    StatusCode::InvalidArgument,
                    &format!("{vertex_shader:?} is a {stage:?} shader, not a vertex shader"),
                ));
            }
            None => return Err(ResourceError::InvalidHandle),
        }
        if layout.elements.is_empty() {
            return Err(reject(StatusCode::InvalidArgument, "Vertex layout is empty"));
        }
        let id = InputLayoutId(self.generate_id());
        self.insert_state(id)?;
        Ok(id)
    }

    fn destroy(&self, object: DeviceObjectId) -> Result<(), ResourceError> {
        let removed = match object {
            DeviceObjectId::Buffer(id) => lock(&self.buffers, "buffers")?.remove(&id).is_some(),
            DeviceObjectId::Texture(id) => lock(&self.textures, "textures")?.remove(&id).is_some(),
            DeviceObjectId::View(id) => lock(&self.views, "views")?.remove(&id).is_some(),
            DeviceObjectId::Shader(id) => lock(&self.shaders, "shaders")?.remove(&id).is_some(),
            DeviceObjectId::Sampler(_)
            | DeviceObjectId::InputLayout(_)
            | DeviceObjectId::RasterState(_)
            | DeviceObjectId::DepthStencilState(_)
            | DeviceObjectId::BlendState(_) => {
                lock(&self.states, "states")?.remove(&object)
            }
        };
        if removed {
            log::trace!("Destroyed {:?}", object);
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_core::renderer::api::enums::VertexFormat;

    fn device() -> Arc<SoftwareDevice> {
        Arc::new(SoftwareDevice::new(DeviceDescriptor {
            width: 4,
            height: 2,
            ..Default::default()
        }))
    }

    #[test]
    fn views_resolve_to_their_resource() {
        let device = device();
        let texture = device
            .create_texture(
                &TextureDescriptor {
                    width: 2,
                    height: 2,
                    bind: BindFlags::SHADER_RESOURCE | BindFlags::RENDER_TARGET,
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        let srv = device
            .create_shader_resource_view(texture.into(), &ViewDescriptor::default())
            .unwrap();
        let rtv = device
            .create_render_target_view(texture, &ViewDescriptor::default())
            .unwrap();

        assert_eq!(device.resource_of(srv.into()), Some(ResourceId::Texture(texture)));
        assert_eq!(device.resource_of(rtv.into()), device.resource_of(srv.into()));
    }

    #[test]
    fn view_needs_matching_bind_flag() {
        let device = device();
        let texture = device
            .create_texture(&TextureDescriptor { width: 1, height: 1, ..Default::default() }, None)
            .unwrap();

        let err = device
            .create_unordered_access_view(texture.into(), &ViewDescriptor::default())
            .unwrap_err();

        assert!(matches!(err, ResourceError::Native(StatusCode::InvalidArgument)));
    }

    #[test]
    fn dynamic_buffer_cannot_be_unordered() {
        let device = device();
        let err = device
            .create_buffer(
                &BufferDescriptor {
                    label: None,
                    size: 64,
                    usage: ResourceUsage::Dynamic,
                    bind: BindFlags::UNORDERED_ACCESS,
                    structure_stride: 16,
                },
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ResourceError::Native(StatusCode::InvalidArgument)));
    }

    #[test]
    fn write_buffer_checks_bounds() {
        let device = device();
        let buffer = device
            .create_buffer(
                &BufferDescriptor {
                    label: None,
                    size: 8,
                    usage: ResourceUsage::Default,
                    bind: BindFlags::CONSTANT_BUFFER,
                    structure_stride: 0,
                },
                None,
            )
            .unwrap();

        device.write_buffer(buffer, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(device.read_buffer(buffer).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
        assert!(device.write_buffer(buffer, 6, &[0; 4]).is_err());
    }

    #[test]
    fn swap_chain_textures_follow_settings() {
        let device = Arc::new(SoftwareDevice::new(DeviceDescriptor {
            width: 8,
            height: 4,
            backbuffer_unordered_access: true,
            ..Default::default()
        }));

        let swap_chain = device.create_swap_chain().unwrap();

        assert!(swap_chain.backbuffer.rtv().is_some());
        assert!(swap_chain.backbuffer.uav().is_some());
        assert!(swap_chain.backbuffer.srv().is_none());
        let depth = swap_chain.depth_buffer.as_ref().unwrap();
        assert!(depth.dsv().is_some());
        assert_eq!(depth.descriptor().width, 8);
    }

    #[test]
    fn compute_only_device_has_no_swap_chain() {
        let device = Arc::new(SoftwareDevice::new(DeviceDescriptor {
            compute_only: true,
            ..Default::default()
        }));
        assert!(matches!(
            device.create_swap_chain(),
            Err(ResourceError::Native(StatusCode::InvalidCall))
        ));
    }

    #[test]
    fn owned_handles_release_on_drop() {
        let device = device();
        let dyn_device: Arc<dyn GraphicsDevice> = device.clone();
        {
            let _texture = Texture2D::new(
                &dyn_device,
                TextureDescriptor {
                    width: 2,
                    height: 2,
                    bind: BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS,
                    ..Default::default()
                },
                None,
            )
            .unwrap();
            assert_eq!(device.live_object_count(), 3);
        }
        assert_eq!(device.live_object_count(), 0);
    }

    #[test]
    fn input_layout_needs_a_vertex_shader() {
        let device = device();
        let pixel = device
            .create_shader(&ShaderDescriptor {
                label: None,
                stage: ShaderStage::Pixel,
                bytecode: vec![0xDE, 0xAD].into(),
                group_size: [1, 1, 1],
            })
            .unwrap();
        let layout = VertexLayout::packed(&[("POSITION", VertexFormat::Float32x3)]);

        assert!(device.create_input_layout(&layout, pixel).is_err());
        assert!(matches!(
            device.create_input_layout(&layout, ShaderId(999)),
            Err(ResourceError::InvalidHandle)
        ));
    }

    #[test]
    fn clear_color_is_encoded_in_texture_format() {
        let device = device();
        let texture = device
            .create_texture(
                &TextureDescriptor {
                    width: 1,
                    height: 2,
                    format: TextureFormat::Bgra8Unorm,
                    bind: BindFlags::RENDER_TARGET,
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        let rtv = device
            .create_render_target_view(texture, &ViewDescriptor::default())
            .unwrap();

        device.fill_view(rtv.into(), [1.0, 0.0, 0.5, 1.0]).unwrap();

        assert_eq!(
            device.read_texture(texture).unwrap(),
            vec![128, 0, 255, 255, 128, 0, 255, 255]
        );
    }
}
