// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for mapbridge.

use thiserror::Error;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Call errors --
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    // -- Script context errors --
    #[error("script dispatch failed: {0}")]
    DispatchFailure(String),

    #[error("map SDK is not initialised")]
    SdkUninitialized,

    #[error("no map instance has been initialised")]
    MapNotInitialized,

    #[error("script evaluation failed: {0}")]
    ScriptFailure(String),

    // -- Platform --
    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Shorthand for a parameter that failed extraction or validation.
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code surfaced to the web layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::UnknownMethod(_) => "UNKNOWN_METHOD",
            Self::UnknownPlugin(_) => "UNKNOWN_PLUGIN",
            Self::DispatchFailure(_) => "DISPATCH_FAILURE",
            Self::SdkUninitialized => "SDK_UNINITIALIZED",
            Self::MapNotInitialized => "MAP_NOT_INITIALIZED",
            Self::ScriptFailure(_) => "SCRIPT_FAILURE",
            Self::PlatformUnavailable => "PLATFORM_UNAVAILABLE",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
            Self::Serialization(_) => "SERIALIZATION",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message_names_the_parameter() {
        let err = BridgeError::invalid_parameter("lat", "missing required parameter");
        assert_eq!(err.to_string(), "invalid parameter `lat`: missing required parameter");
        assert_eq!(err.code(), "INVALID_PARAMETER");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BridgeError = io.into();
        assert_eq!(err.code(), "IO");
    }
}
