// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The map plugin: five remote operations exposed to web content.
//
// Mutating operations render a script, hand it to the script host, and wait
// for the page to acknowledge it. A call therefore resolves only once the
// map actually changed, and a page without the SDK is reported as
// `SdkUninitialized` instead of a false success.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use mapbridge_core::BridgeConfig;
use mapbridge_core::error::{BridgeError, Result};
use mapbridge_core::rejection::rejection_for;
use mapbridge_core::types::{CallOutcome, Coordinates, JsonObject, MapHandle, PluginCall};
use mapbridge_webview::traits::{ScriptAck, ScriptHost, ScriptOutcome};

use crate::bootstrap::SdkBootstrap;
use crate::script::{self, ScriptContext};

/// Methods understood by [`MapPlugin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMethod {
    InitializeMap,
    AddMarker,
    RemoveMarker,
    SetMapCenter,
    GetCurrentLocation,
}

impl MapMethod {
    pub const ALL: [MapMethod; 5] = [
        Self::InitializeMap,
        Self::AddMarker,
        Self::RemoveMarker,
        Self::SetMapCenter,
        Self::GetCurrentLocation,
    ];

    /// Wire name used by web content.
    pub fn name(self) -> &'static str {
        match self {
            Self::InitializeMap => "initializeMap",
            Self::AddMarker => "addMarker",
            Self::RemoveMarker => "removeMarker",
            Self::SetMapCenter => "setMapCenter",
            Self::GetCurrentLocation => "getCurrentLocation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

/// Bridge between web calls and the map living in the script context.
pub struct MapPlugin {
    name: String,
    host: Arc<dyn ScriptHost>,
    sdk: Arc<SdkBootstrap>,
    script: ScriptContext,
    default_center: Coordinates,
    fallback_location: Coordinates,
    ack_timeout: Duration,
    /// Most recently initialised map; target of calls without `mapId`.
    current: Mutex<Option<MapHandle>>,
}

impl MapPlugin {
    pub fn new(config: &BridgeConfig, host: Arc<dyn ScriptHost>, sdk: Arc<SdkBootstrap>) -> Self {
        Self {
            name: config.plugin_name.clone(),
            host,
            sdk,
            script: ScriptContext::from_config(config),
            default_center: config.default_center,
            fallback_location: config.fallback_location,
            ack_timeout: config.ack_timeout(),
            current: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle that calls without an explicit `mapId` target.
    pub fn current_map(&self) -> Option<MapHandle> {
        *self.current.lock().expect("current map lock poisoned")
    }

    /// Route `call` by method name and convert every error into a rejection.
    pub async fn dispatch(&self, call: &PluginCall) -> CallOutcome {
        let result = match MapMethod::from_name(&call.method) {
            Some(method) => self.invoke(method, call).await,
            None => Err(BridgeError::UnknownMethod(call.method.clone())),
        };
        match result {
            Ok(data) => {
                debug!(plugin = %self.name, method = %call.method, "call resolved");
                CallOutcome::Resolved(data)
            }
            Err(e) => {
                warn!(plugin = %self.name, method = %call.method, code = e.code(), "call rejected: {e}");
                CallOutcome::Rejected(rejection_for(&call.method, &e))
            }
        }
    }

    async fn invoke(&self, method: MapMethod, call: &PluginCall) -> Result<JsonObject> {
        match method {
            MapMethod::InitializeMap => self.initialize_map(call).await,
            MapMethod::AddMarker => self.add_marker(call).await,
            MapMethod::RemoveMarker => self.remove_marker(call),
            MapMethod::SetMapCenter => self.set_map_center(call).await,
            MapMethod::GetCurrentLocation => Ok(self.get_current_location()),
        }
    }

    /// `initializeMap(lat?, lng?)` → `{success, message, mapId}`.
    pub async fn initialize_map(&self, call: &PluginCall) -> Result<JsonObject> {
        let lat = call.optional_f64("lat")?.unwrap_or(self.default_center.lat);
        let lng = call.optional_f64("lng")?.unwrap_or(self.default_center.lng);
        let center = Coordinates::new(lat, lng)?;
        self.ensure_sdk_ready()?;

        let handle = MapHandle::new();
        info!(%center, map_id = %handle, "initialising map");
        self.evaluate(script::initialize_map(&self.script, &handle, center))
            .await?;

        // Last writer wins when initialisations race.
        let previous = self
            .current
            .lock()
            .expect("current map lock poisoned")
            .replace(handle);
        if let Some(previous) = previous {
            debug!(previous = %previous, current = %handle, "replaced current map");
        }

        Ok(object(json!({
            "success": true,
            "message": "map initialized",
            "mapId": handle.to_string(),
        })))
    }

    /// `addMarker(lat, lng, title?, mapId?)` → `{success}`.
    pub async fn add_marker(&self, call: &PluginCall) -> Result<JsonObject> {
        let position = Coordinates::new(call.require_f64("lat")?, call.require_f64("lng")?)?;
        let title = call.optional_str("title")?.unwrap_or("");
        self.ensure_sdk_ready()?;
        let handle = self.target_map(call)?;

        info!(%position, title, map_id = %handle, "adding marker");
        self.evaluate(script::add_marker(&self.script, &handle, position, title))
            .await?;
        Ok(success())
    }

    /// `removeMarker(markerId)` → `{success}`.
    ///
    /// Markers are owned by the script context and never tracked natively,
    /// so this only validates the id and changes nothing.
    pub fn remove_marker(&self, call: &PluginCall) -> Result<JsonObject> {
        let marker_id = call.require_str("markerId")?;
        info!(marker_id, "removeMarker accepted; markers are not tracked natively");
        Ok(success())
    }

    /// `setMapCenter(lat, lng, mapId?)` → `{success}`.
    pub async fn set_map_center(&self, call: &PluginCall) -> Result<JsonObject> {
        let center = Coordinates::new(call.require_f64("lat")?, call.require_f64("lng")?)?;
        self.ensure_sdk_ready()?;
        let handle = self.target_map(call)?;

        info!(%center, map_id = %handle, "moving map center");
        self.evaluate(script::set_map_center(&self.script, &handle, center))
            .await?;
        Ok(success())
    }

    /// `getCurrentLocation()` → `{lat, lng}`.
    ///
    /// Answers the configured fallback location; no location provider is
    /// consulted.
    pub fn get_current_location(&self) -> JsonObject {
        debug!(location = %self.fallback_location, "current location requested");
        object(json!({
            "lat": self.fallback_location.lat,
            "lng": self.fallback_location.lng,
        }))
    }

    // -- internal helpers ---------------------------------------------------

    fn ensure_sdk_ready(&self) -> Result<()> {
        if self.sdk.is_ready() {
            Ok(())
        } else {
            Err(BridgeError::SdkUninitialized)
        }
    }

    /// Explicit `mapId`, else the current map.
    fn target_map(&self, call: &PluginCall) -> Result<MapHandle> {
        match call.optional_str("mapId")? {
            Some(raw) => MapHandle::parse(raw),
            None => self.current_map().ok_or(BridgeError::MapNotInitialized),
        }
    }

    /// Dispatch `script` and wait for the page's acknowledgment.
    async fn evaluate(&self, script: String) -> Result<()> {
        let (ack, rx) = ScriptAck::channel();
        self.host.evaluate_script(script, ack)?;

        let outcome = match tokio::time::timeout(self.ack_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                return Err(BridgeError::DispatchFailure(
                    "script host dropped the acknowledgment".into(),
                ));
            }
            Err(_) => {
                return Err(BridgeError::DispatchFailure(format!(
                    "no acknowledgment within {} ms",
                    self.ack_timeout.as_millis()
                )));
            }
        };

        match outcome {
            ScriptOutcome::Evaluated(raw) => script::parse_ack(&raw),
            ScriptOutcome::Failed(reason) => Err(BridgeError::DispatchFailure(reason)),
        }
    }
}

fn success() -> JsonObject {
    object(json!({ "success": true }))
}

fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}
