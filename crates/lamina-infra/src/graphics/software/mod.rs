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

//! An in-memory backend that follows native slot and hazard rules.

pub mod context;
pub mod device;
pub mod settings;

pub use self::context::*;
pub use self::device::*;
pub use self::settings::*;

use lamina_core::renderer::error::ResourceError;
use std::sync::Arc;
use thiserror::Error;

/// An error raised by [`create_device`].
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The settings were rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A swap chain object could not be created.
    #[error("failed to create the swap chain: {0}")]
    Resource(#[from] ResourceError),
}

/// Creates a device, its immediate context and, unless the settings ask for
/// compute only, a swap chain.
pub fn create_device(
    descriptor: DeviceDescriptor,
) -> Result<(Arc<SoftwareDevice>, SoftwareContext, Option<SwapChain>), DeviceError> {
    descriptor.validate()?;
    let device = Arc::new(SoftwareDevice::new(descriptor));
    let swap_chain = if device.descriptor().compute_only {
        None
    } else {
        Some(device.create_swap_chain()?)
    };
    let context = SoftwareContext::new(device.clone());
    Ok((device, context, swap_chain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_only_device_skips_swap_chain() {
        let (device, _context, swap_chain) = create_device(DeviceDescriptor {
            compute_only: true,
            width: 0,
            height: 0,
            ..Default::default()
        })
        .unwrap();
        assert!(swap_chain.is_none());
        assert_eq!(device.live_object_count(), 0);
    }

    #[test]
    fn invalid_settings_are_rejected_before_creation() {
        let result = create_device(DeviceDescriptor {
            sample_count: 3,
            ..Default::default()
        });
        assert!(matches!(result, Err(DeviceError::Config(ConfigError::Invalid(_)))));
    }
}
