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

//! Scoped ownership of device objects.
//!
//! An [`Owned`] handle is the single owner of a device object and releases it
//! when dropped. Sharing is explicit: [`Owned::into_shared`] moves the owner
//! behind an `Arc`, and the object is released when the last clone goes away.

use crate::renderer::api::handles::DeviceObjectId;
use crate::renderer::traits::GraphicsDevice;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A handle type that names a releasable device object.
pub trait DeviceObject: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// The object as the device sees it.
    fn object_id(self) -> DeviceObjectId;
}

impl<T> DeviceObject for T
where
    T: Into<DeviceObjectId> + Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn object_id(self) -> DeviceObjectId {
        self.into()
    }
}

/// The unique owner of a device object.
pub struct Owned<T: DeviceObject> {
    id: T,
    device: Arc<dyn GraphicsDevice>,
}

/// A device object shared between several owners.
pub type Shared<T> = Arc<Owned<T>>;

impl<T: DeviceObject> Owned<T> {
    /// Takes ownership of `id`, which must have been created by `device`.
    pub fn new(device: Arc<dyn GraphicsDevice>, id: T) -> Self {
        Self { id, device }
    }

    /// The raw handle. It stays valid as long as `self` is alive.
    pub fn id(&self) -> T {
        self.id
    }

    /// The device that created the object.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Moves ownership behind an `Arc` so it can be cloned.
    pub fn into_shared(self) -> Shared<T> {
        Arc::new(self)
    }
}

impl<T: DeviceObject> Drop for Owned<T> {
    fn drop(&mut self) {
        if let Err(e) = self.device.destroy(self.id.object_id()) {
            log::error!("Failed to release {:?}: {}", self.id, e);
        }
    }
}

impl<T: DeviceObject> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.id).finish()
    }
}

impl<T: DeviceObject> PartialEq for Owned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: DeviceObject> Eq for Owned<T> {}
