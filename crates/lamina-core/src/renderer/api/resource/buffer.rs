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

use super::{BindFlags, BufferDescriptor, Owned, ViewDescriptor};
use crate::renderer::api::enums::{IndexFormat, ResourceUsage};
use crate::renderer::api::handles::*;
use crate::renderer::error::{LogCategory, ResourceError, StatusCode};
use crate::renderer::traits::GraphicsDevice;
use bytemuck::Pod;
use std::mem::size_of;
use std::sync::Arc;

fn check_16_byte_multiple<T>(what: &str) -> Result<(), ResourceError> {
    let size = size_of::<T>();
    if size == 0 || size % 16 != 0 {
        return Err(ResourceError::InvalidDescriptor(format!(
            "{what} element is {size} bytes, expected a non-zero multiple of 16"
        )));
    }
    Ok(())
}

/// Creates an immutable vertex buffer holding `vertices`.
pub fn create_vertex_buffer<V: Pod>(
    device: &Arc<dyn GraphicsDevice>,
    vertices: &[V],
) -> Result<Owned<BufferId>, ResourceError> {
    let bytes: &[u8] = bytemuck::cast_slice(vertices);
    let descriptor = BufferDescriptor {
        label: Some("vertex buffer".to_owned()),
        size: bytes.len() as u64,
        usage: ResourceUsage::Immutable,
        bind: BindFlags::VERTEX_BUFFER,
        structure_stride: 0,
    };
    let id = device.create_buffer(&descriptor, Some(bytes))?;
    Ok(Owned::new(device.clone(), id))
}

/// Creates an immutable 32-bit index buffer holding `indices`.
pub fn create_index_buffer(
    device: &Arc<dyn GraphicsDevice>,
    indices: &[u32],
) -> Result<(Owned<BufferId>, IndexFormat), ResourceError> {
    let bytes: &[u8] = bytemuck::cast_slice(indices);
    let descriptor = BufferDescriptor {
        label: Some("index buffer".to_owned()),
        size: bytes.len() as u64,
        usage: ResourceUsage::Immutable,
        bind: BindFlags::INDEX_BUFFER,
        structure_stride: 0,
    };
    let id = device.create_buffer(&descriptor, Some(bytes))?;
    Ok((Owned::new(device.clone(), id), IndexFormat::Uint32))
}

/// A structured buffer of `T`, readable from shaders and optionally writable
/// through an unordered access view.
#[derive(Debug)]
pub struct StructuredBuffer<T: Pod> {
    /// The CPU copy, written to the GPU by [`StructuredBuffer::update`].
    pub data: Vec<T>,
    usage: ResourceUsage,
    shader_resource_view: Owned<ShaderResourceViewId>,
    unordered_access_view: Option<Owned<UnorderedAccessViewId>>,
    buffer: Owned<BufferId>,
}

impl<T: Pod> StructuredBuffer<T> {
    /// Creates the buffer from `data` with a shader resource view, and an
    /// unordered access view when `writable` is set.
    ///
    /// A dynamic buffer cannot be written by the GPU, so `Dynamic` together
    /// with `writable` fails with [`StatusCode::InvalidArgument`].
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        data: Vec<T>,
        usage: ResourceUsage,
        writable: bool,
    ) -> Result<Self, ResourceError> {
        check_16_byte_multiple::<T>("structured buffer")?;
        if writable && matches!(usage, ResourceUsage::Dynamic | ResourceUsage::Immutable) {
            StatusCode::InvalidArgument.check(LogCategory::Error)?;
        }

        let mut bind = BindFlags::SHADER_RESOURCE;
        if writable {
            bind |= BindFlags::UNORDERED_ACCESS;
        }
        let bytes: &[u8] = bytemuck::cast_slice(&data);
        let descriptor = BufferDescriptor {
            label: None,
            size: bytes.len() as u64,
            usage,
            bind,
            structure_stride: size_of::<T>() as u32,
        };
        let buffer = Owned::new(device.clone(), device.create_buffer(&descriptor, Some(bytes))?);

        let view = ViewDescriptor {
            element_count: Some(data.len() as u32),
            ..Default::default()
        };
        let resource = ResourceId::from(buffer.id());
        let shader_resource_view = Owned::new(
            device.clone(),
            device.create_shader_resource_view(resource, &view)?,
        );
        let unordered_access_view = if writable {
            Some(Owned::new(
                device.clone(),
                device.create_unordered_access_view(resource, &view)?,
            ))
        } else {
            None
        };

        Ok(Self {
            data,
            usage,
            shader_resource_view,
            unordered_access_view,
            buffer,
        })
    }

    /// Writes [`StructuredBuffer::data`] to the GPU.
    pub fn update(&self) -> Result<(), ResourceError> {
        if self.usage == ResourceUsage::Immutable {
            return Err(ResourceError::InvalidDescriptor(
                "an immutable buffer cannot be updated".to_owned(),
            ));
        }
        self.buffer
            .device()
            .write_buffer(self.buffer.id(), 0, bytemuck::cast_slice(&self.data))
    }

    /// The buffer handle.
    pub fn buffer(&self) -> BufferId {
        self.buffer.id()
    }

    /// The storage identity shared by both views.
    pub fn resource(&self) -> ResourceId {
        self.buffer.id().into()
    }

    /// The shader resource view.
    pub fn srv(&self) -> ShaderResourceViewId {
        self.shader_resource_view.id()
    }

    /// The unordered access view, when created writable.
    pub fn uav(&self) -> Option<UnorderedAccessViewId> {
        self.unordered_access_view.as_ref().map(Owned::id)
    }
}

/// A constant buffer mirroring a single `T`.
///
/// `T` must be a non-zero multiple of 16 bytes, the constant buffer register size.
#[derive(Debug)]
pub struct ConstantBuffer<T: Pod> {
    /// The CPU copy, written to the GPU by [`ConstantBuffer::update`].
    pub data: T,
    buffer: Owned<BufferId>,
}

impl<T: Pod> ConstantBuffer<T> {
    /// Creates a dynamic constant buffer initialized with `data`.
    pub fn new(device: &Arc<dyn GraphicsDevice>, data: T) -> Result<Self, ResourceError> {
        check_16_byte_multiple::<T>("constant buffer")?;
        let descriptor = BufferDescriptor {
            label: None,
            size: size_of::<T>() as u64,
            usage: ResourceUsage::Dynamic,
            bind: BindFlags::CONSTANT_BUFFER,
            structure_stride: 0,
        };
        let id = device.create_buffer(&descriptor, Some(bytemuck::bytes_of(&data)))?;
        Ok(Self {
            data,
            buffer: Owned::new(device.clone(), id),
        })
    }

    /// Writes [`ConstantBuffer::data`] to the GPU.
    pub fn update(&self) -> Result<(), ResourceError> {
        self.buffer
            .device()
            .write_buffer(self.buffer.id(), 0, bytemuck::bytes_of(&self.data))
    }

    /// The buffer handle.
    pub fn buffer(&self) -> BufferId {
        self.buffer.id()
    }
}
