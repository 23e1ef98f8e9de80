// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rejection messages shown to the web layer.
//
// Every error that leaves a plugin method is prefixed with a short label for
// the operation that failed, so the page can show it without knowing the
// error taxonomy.

use crate::error::BridgeError;
use crate::types::Rejection;

/// Label for the operation behind a method name.
pub fn operation_label(method: &str) -> &'static str {
    match method {
        "initializeMap" => "map initialization failed",
        "addMarker" => "adding marker failed",
        "removeMarker" => "removing marker failed",
        "setMapCenter" => "moving map center failed",
        "getCurrentLocation" => "getting current location failed",
        _ => "call failed",
    }
}

/// Convert an error raised while handling `method` into a rejection.
pub fn rejection_for(method: &str, err: &BridgeError) -> Rejection {
    Rejection {
        message: format!("{}: {err}", operation_label(method)),
        code: err.code().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_prefixed_with_operation() {
        let err = BridgeError::invalid_parameter("lat", "missing required parameter");
        let rejection = rejection_for("addMarker", &err);
        assert_eq!(
            rejection.message,
            "adding marker failed: invalid parameter `lat`: missing required parameter"
        );
        assert_eq!(rejection.code, "INVALID_PARAMETER");
    }

    #[test]
    fn unknown_methods_get_generic_label() {
        let err = BridgeError::UnknownMethod("zoomIn".into());
        let rejection = rejection_for("zoomIn", &err);
        assert_eq!(rejection.message, "call failed: unknown method: zoomIn");
        assert_eq!(rejection.code, "UNKNOWN_METHOD");
    }

    #[test]
    fn sdk_errors_keep_their_code() {
        let rejection = rejection_for("initializeMap", &BridgeError::SdkUninitialized);
        assert_eq!(rejection.code, "SDK_UNINITIALIZED");
        assert!(rejection.message.starts_with("map initialization failed"));
    }
}
