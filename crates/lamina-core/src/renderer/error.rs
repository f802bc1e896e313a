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

//! Defines the status codes and error types of the rendering layer.
//!
//! Native result codes are folded into a single [`StatusCode`] enumeration.
//! Failures are logged through the `log` facade at a level chosen by a
//! [`LogCategory`]; callers decide whether a category aborts what they were doing.

use crate::renderer::api::enums::ShaderStage;
use std::fmt;
use std::panic::Location;

/// The severity attached to a logged failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Informational, the operation still succeeded in a degraded way.
    Info,
    /// Something unexpected that the caller can continue from.
    Warning,
    /// The operation failed.
    Error,
    /// The operation failed and initialization must not continue.
    CriticalError,
}

impl LogCategory {
    /// The `log` level used when recording a failure of this category.
    pub fn level(self) -> log::Level {
        match self {
            LogCategory::Info => log::Level::Info,
            LogCategory::Warning => log::Level::Warn,
            LogCategory::Error | LogCategory::CriticalError => log::Level::Error,
        }
    }

    /// Returns `true` for categories that abort initialization.
    pub fn is_critical(self) -> bool {
        matches!(self, LogCategory::CriticalError)
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogCategory::Info => "Info",
            LogCategory::Warning => "Warning",
            LogCategory::Error => "Error",
            LogCategory::CriticalError => "CriticalError",
        };
        f.write_str(name)
    }
}

/// A native result code.
///
/// The known codes are the HRESULT values a Direct3D 11 style runtime returns.
/// Anything else is kept verbatim in [`StatusCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The call succeeded.
    Ok,
    /// The operation was aborted.
    Aborted,
    /// General access denied.
    AccessDenied,
    /// Unspecified failure.
    Failed,
    /// The handle is invalid.
    InvalidHandle,
    /// One or more arguments are invalid.
    InvalidArgument,
    /// The requested interface is not supported.
    InterfaceNotSupported,
    /// The method is not implemented.
    NotImplemented,
    /// An allocation failed.
    OutOfMemory,
    /// A pointer argument is invalid.
    InvalidPointer,
    /// A file passed to the runtime was not found.
    FileNotFound,
    /// Too many unique instances of a state object were created.
    TooManyUniqueStateObjects,
    /// Too many unique instances of a view object were created.
    TooManyUniqueViewObjects,
    /// A deferred context mapped a resource without an initial discard.
    MapWithoutInitialDiscard,
    /// The call was invalid in the current state.
    InvalidCall,
    /// The GPU was still busy with the resource.
    StillDrawing,
    /// A result code outside the known set.
    Unknown(u32),
}

const KNOWN_CODES: [(StatusCode, u32); 16] = [
    (StatusCode::Ok, 0x0000_0000),
    (StatusCode::Aborted, 0x8000_4004),
    (StatusCode::AccessDenied, 0x8007_0005),
    (StatusCode::Failed, 0x8000_4005),
    (StatusCode::InvalidHandle, 0x8007_0006),
    (StatusCode::InvalidArgument, 0x8007_0057),
    (StatusCode::InterfaceNotSupported, 0x8000_4002),
    (StatusCode::NotImplemented, 0x8000_4001),
    (StatusCode::OutOfMemory, 0x8007_000E),
    (StatusCode::InvalidPointer, 0x8000_4003),
    (StatusCode::FileNotFound, 0x887C_0002),
    (StatusCode::TooManyUniqueStateObjects, 0x887C_0001),
    (StatusCode::TooManyUniqueViewObjects, 0x887C_0003),
    (StatusCode::MapWithoutInitialDiscard, 0x887C_0004),
    (StatusCode::InvalidCall, 0x887A_0001),
    (StatusCode::StillDrawing, 0x887A_000A),
];

impl StatusCode {
    /// Maps a raw native result code onto the enumeration.
    pub fn from_raw(raw: u32) -> Self {
        KNOWN_CODES
            .iter()
            .find(|(_, code)| *code == raw)
            .map(|(status, _)| *status)
            .unwrap_or(StatusCode::Unknown(raw))
    }

    /// The raw native result code.
    pub fn raw(self) -> u32 {
        match self {
            StatusCode::Unknown(raw) => raw,
            known => KNOWN_CODES
                .iter()
                .find(|(status, _)| *status == known)
                .map(|(_, code)| *code)
                .unwrap_or(0x8000_4005),
        }
    }

    /// Returns `true` for [`StatusCode::Ok`].
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }

    /// Logs a failure under `category` and turns the code into a `Result`.
    ///
    /// The log record carries the caller's location.
    #[track_caller]
    pub fn check(self, category: LogCategory) -> Result<(), StatusCode> {
        if self.is_ok() {
            return Ok(());
        }
        let caller = Location::caller();
        log::log!(
            category.level(),
            "[{category}] call failed with code {self} ({:#010x}) at {}:{}",
            self.raw(),
            caller.file(),
            caller.line()
        );
        Err(self)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Ok => write!(f, "Ok"),
            StatusCode::Aborted => write!(f, "Aborted"),
            StatusCode::AccessDenied => write!(f, "Access Denied"),
            StatusCode::Failed => write!(f, "Failed"),
            StatusCode::InvalidHandle => write!(f, "Invalid Handle"),
            StatusCode::InvalidArgument => write!(f, "Invalid Argument"),
            StatusCode::InterfaceNotSupported => write!(f, "Interface Not Supported"),
            StatusCode::NotImplemented => write!(f, "Not Implemented"),
            StatusCode::OutOfMemory => write!(f, "Out Of Memory"),
            StatusCode::InvalidPointer => write!(f, "Invalid Pointer"),
            StatusCode::FileNotFound => write!(f, "File Not Found"),
            StatusCode::TooManyUniqueStateObjects => write!(f, "Too Many Unique State Objects"),
            StatusCode::TooManyUniqueViewObjects => write!(f, "Too Many Unique View Objects"),
            StatusCode::MapWithoutInitialDiscard => write!(f, "Map Without Initial Discard"),
            StatusCode::InvalidCall => write!(f, "Invalid Call"),
            StatusCode::StillDrawing => write!(f, "Still Drawing"),
            StatusCode::Unknown(raw) => write!(f, "Unknown Status Code {raw:#010x}"),
        }
    }
}

impl std::error::Error for StatusCode {}

/// An error related to the creation, lookup or release of a device object.
#[derive(Debug)]
pub enum ResourceError {
    /// The native runtime rejected the call.
    Native(StatusCode),
    /// The handle does not name a live object.
    InvalidHandle,
    /// A descriptor was rejected before reaching the runtime.
    InvalidDescriptor(String),
    /// The backend failed for a reason of its own.
    Backend(String),
    /// An operation needed a shader on a stage that has none.
    MissingShader {
        /// The stage that had no shader bound.
        stage: ShaderStage,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Native(code) => write!(f, "Native call failed: {code}"),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle."),
            ResourceError::InvalidDescriptor(msg) => write!(f, "Invalid descriptor: {msg}"),
            ResourceError::Backend(msg) => write!(f, "Backend error: {msg}"),
            ResourceError::MissingShader { stage } => {
                write!(f, "No shader is set for the {stage:?} stage")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Native(code) => Some(code),
            _ => None,
        }
    }
}

impl From<StatusCode> for ResourceError {
    fn from(code: StatusCode) -> Self {
        ResourceError::Native(code)
    }
}

/// An error raised while linking views or states to a bindable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The slot index is past what the native pipeline exposes.
    SlotOutOfRange {
        /// What was being linked (e.g. "shader resource view").
        kind: &'static str,
        /// The requested slot.
        slot: u32,
        /// The number of slots available.
        limit: u32,
    },
    /// Unordered-access views may only be linked to the compute stage.
    ComputeOnly {
        /// The stage the view was linked to.
        stage: ShaderStage,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::SlotOutOfRange { kind, slot, limit } => {
                write!(f, "Slot {slot} is out of range for {kind} (limit {limit})")
            }
            BindError::ComputeOnly { stage } => {
                write!(
                    f,
                    "Unordered access views can only be linked to the compute stage, not {stage:?}"
                )
            }
        }
    }
}

impl std::error::Error for BindError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn status_code_raw_round_trip_for_known_codes() {
        for (status, raw) in KNOWN_CODES {
            assert_eq!(StatusCode::from_raw(raw), status);
            assert_eq!(status.raw(), raw);
        }
    }

    #[test]
    fn unknown_status_code_is_preserved() {
        let status = StatusCode::from_raw(0x1234_5678);
        assert_eq!(status, StatusCode::Unknown(0x1234_5678));
        assert_eq!(status.raw(), 0x1234_5678);
        assert_eq!(format!("{status}"), "Unknown Status Code 0x12345678");
    }

    #[test]
    fn check_maps_to_result() {
        assert_eq!(StatusCode::Ok.check(LogCategory::Error), Ok(()));
        assert_eq!(
            StatusCode::InvalidArgument.check(LogCategory::Warning),
            Err(StatusCode::InvalidArgument)
        );
    }

    #[test]
    fn resource_error_wraps_status_code() {
        let err: ResourceError = StatusCode::OutOfMemory.into();
        assert_eq!(format!("{err}"), "Native call failed: Out Of Memory");
        assert!(err.source().is_some());
    }

    #[test]
    fn bind_error_display() {
        let err = BindError::SlotOutOfRange {
            kind: "render target view",
            slot: 9,
            limit: 8,
        };
        assert_eq!(
            format!("{err}"),
            "Slot 9 is out of range for render target view (limit 8)"
        );
        assert!(LogCategory::CriticalError.is_critical());
        assert_eq!(LogCategory::Warning.level(), log::Level::Warn);
    }
}
