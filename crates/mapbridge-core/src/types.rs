// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the mapbridge call/result contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{BridgeError, Result};

/// JSON object carried by calls and successful results.
pub type JsonObject = Map<String, Value>;

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Seoul City Hall: the default map center and the stub location.
    pub const SEOUL: Coordinates = Coordinates {
        lat: 37.5665,
        lng: 126.9780,
    };

    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(BridgeError::invalid_parameter(
                "lat",
                format!("latitude {lat} is outside [-90, 90]"),
            ));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(BridgeError::invalid_parameter(
                "lng",
                format!("longitude {lng} is outside [-180, 180]"),
            ));
        }
        Ok(Self { lat, lng })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Map handles
// ---------------------------------------------------------------------------

/// Opaque reference to one map surface living in the script context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapHandle(pub Uuid);

impl MapHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a handle previously returned to the web layer as `mapId`.
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|e| BridgeError::invalid_parameter("mapId", e.to_string()))
    }
}

impl Default for MapHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// A single request from the web layer to a plugin method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginCall {
    pub method: String,
    #[serde(default)]
    pub params: JsonObject,
}

impl PluginCall {
    pub fn new(method: impl Into<String>, params: JsonObject) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Build a call from a `serde_json::json!` object literal.
    ///
    /// Non-object values produce a call with no parameters.
    pub fn with_json(method: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        };
        Self::new(method, params)
    }

    /// Numeric parameter that may be absent (or explicitly `null`).
    pub fn optional_f64(&self, name: &str) -> Result<Option<f64>> {
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| {
                BridgeError::invalid_parameter(name, "number is not representable as f64")
            }),
            Some(other) => Err(BridgeError::invalid_parameter(
                name,
                format!("expected a number, got {}", json_kind(other)),
            )),
        }
    }

    /// Numeric parameter that must be present.
    pub fn require_f64(&self, name: &str) -> Result<f64> {
        self.optional_f64(name)?
            .ok_or_else(|| BridgeError::invalid_parameter(name, "missing required parameter"))
    }

    /// String parameter that may be absent (or explicitly `null`).
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>> {
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(BridgeError::invalid_parameter(
                name,
                format!("expected a string, got {}", json_kind(other)),
            )),
        }
    }

    /// String parameter that must be present.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.optional_str(name)?
            .ok_or_else(|| BridgeError::invalid_parameter(name, "missing required parameter"))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a call was rejected, as shown to the web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub message: String,
    pub code: String,
}

/// Final state of a call: resolved with data, or rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Resolved(JsonObject),
    Rejected(Rejection),
}

impl CallOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Resolved data, if any.
    pub fn data(&self) -> Option<&JsonObject> {
        match self {
            Self::Resolved(data) => Some(data),
            Self::Rejected(_) => None,
        }
    }

    /// Rejection details, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Resolved(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

/// A call as posted by web content: `{callbackId, pluginId, methodName, options}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnvelope {
    pub callback_id: String,
    pub plugin_id: String,
    pub method_name: String,
    #[serde(default)]
    pub options: JsonObject,
}

impl CallEnvelope {
    /// Strip the routing fields, leaving the plugin-level call.
    pub fn to_call(&self) -> PluginCall {
        PluginCall::new(self.method_name.clone(), self.options.clone())
    }
}

/// The reply sent back to web content for one envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub callback_id: String,
    pub plugin_id: String,
    pub method_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Rejection>,
}

impl CallResult {
    pub fn new(envelope: &CallEnvelope, outcome: CallOutcome) -> Self {
        let (success, data, error) = match outcome {
            CallOutcome::Resolved(data) => (true, Some(data), None),
            CallOutcome::Rejected(rejection) => (false, None, Some(rejection)),
        };
        Self {
            callback_id: envelope.callback_id.clone(),
            plugin_id: envelope.plugin_id.clone(),
            method_name: envelope.method_name.clone(),
            success,
            data,
            error,
        }
    }
}
