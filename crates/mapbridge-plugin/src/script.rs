// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JavaScript templates evaluated inside the WebView.
//
// Every script is a self-contained IIFE whose completion value is an
// acknowledgment object `{ok, error?, detail?}`. `evaluateJavascript`
// serialises that value to JSON, which `parse_ack` turns back into a typed
// result. Maps live in `window.__mapBridge.maps`, keyed by `MapHandle`, as
// `{container, map}` entries. A container holds at most one live map, so
// handles superseded by a later `initializeMap` answer `map-missing`.
//
// Strings are embedded as JSON string literals (valid JavaScript), so a
// marker title can never terminate the surrounding script.

use serde::Deserialize;

use mapbridge_core::error::{BridgeError, Result};
use mapbridge_core::types::{Coordinates, MapHandle};

/// Registry object holding every map created through the bridge.
const REGISTRY: &str = "(window.__mapBridge = window.__mapBridge || { maps: {} })";

/// Where and how scripts find the SDK and the map container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptContext {
    /// Dotted path below `window`, e.g. `kakao.maps`.
    pub sdk_namespace: String,
    pub container_id: String,
    pub zoom_level: u8,
}

impl ScriptContext {
    pub fn from_config(config: &mapbridge_core::BridgeConfig) -> Self {
        Self {
            sdk_namespace: config.sdk_namespace.clone(),
            container_id: config.container_id.clone(),
            zoom_level: config.zoom_level,
        }
    }

    /// Guarded lookup: `window.kakao && window.kakao.maps`.
    fn namespace_expr(&self) -> String {
        let mut path = String::from("window");
        let mut guards = Vec::new();
        for segment in self.sdk_namespace.split('.') {
            path.push('.');
            path.push_str(segment);
            guards.push(path.clone());
        }
        guards.join(" && ")
    }

    /// Wrap `body` with SDK detection and exception capture.
    fn wrap(&self, body: &str) -> String {
        format!(
            "(function () {{\
             try {{\
             var ns = {ns};\
             if (!ns) {{ return {{ ok: false, error: 'sdk-uninitialized' }}; }}\
             var registry = {REGISTRY};\
             {body}\
             }} catch (e) {{\
             return {{ ok: false, error: 'exception', detail: String(e && e.message || e) }};\
             }}\
             }})()",
            ns = self.namespace_expr(),
        )
    }

    /// Lookup of a registered map, bailing out when it is gone.
    fn map_lookup(handle: &MapHandle) -> String {
        format!(
            "var entry = registry.maps[{id}];\
             if (!entry) {{ return {{ ok: false, error: 'map-missing' }}; }}\
             var map = entry.map;",
            id = js_string(&handle.to_string()),
        )
    }
}

/// Create a map in the container and register it under `handle`.
///
/// Re-initialising replaces whatever map the container held before: older
/// entries bound to the same container are dropped from the registry.
pub fn initialize_map(ctx: &ScriptContext, handle: &MapHandle, center: Coordinates) -> String {
    let body = format!(
        "var containerId = {container};\
         var container = document.getElementById(containerId);\
         if (!container) {{ return {{ ok: false, error: 'container-missing' }}; }}\
         Object.keys(registry.maps).forEach(function (key) {{\
         if (registry.maps[key].container === containerId) {{ delete registry.maps[key]; }}\
         }});\
         var options = {{ center: new ns.LatLng({lat}, {lng}), level: {level} }};\
         registry.maps[{id}] = {{ container: containerId, map: new ns.Map(container, options) }};\
         return {{ ok: true }};",
        container = js_string(&ctx.container_id),
        lat = center.lat,
        lng = center.lng,
        level = ctx.zoom_level,
        id = js_string(&handle.to_string()),
    );
    ctx.wrap(&body)
}

/// Drop a marker with `title` on the map registered under `handle`.
pub fn add_marker(
    ctx: &ScriptContext,
    handle: &MapHandle,
    position: Coordinates,
    title: &str,
) -> String {
    let body = format!(
        "{lookup}\
         new ns.Marker({{ position: new ns.LatLng({lat}, {lng}), map: map, title: {title} }});\
         return {{ ok: true }};",
        lookup = ScriptContext::map_lookup(handle),
        lat = position.lat,
        lng = position.lng,
        title = js_string(title),
    );
    ctx.wrap(&body)
}

/// Move the center of the map registered under `handle`.
pub fn set_map_center(ctx: &ScriptContext, handle: &MapHandle, center: Coordinates) -> String {
    let body = format!(
        "{lookup}\
         map.setCenter(new ns.LatLng({lat}, {lng}));\
         return {{ ok: true }};",
        lookup = ScriptContext::map_lookup(handle),
        lat = center.lat,
        lng = center.lng,
    );
    ctx.wrap(&body)
}

/// JSON string literal; also a valid JavaScript string literal.
fn js_string(raw: &str) -> String {
    // U+2028/U+2029 are legal in JSON strings but were line terminators in
    // pre-ES2019 JavaScript.
    serde_json::Value::String(raw.to_owned())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

// ---------------------------------------------------------------------------
// Acknowledgments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScriptAckBody {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Interpret the JSON completion value of a bridge script.
pub fn parse_ack(raw: &str) -> Result<()> {
    let body: Option<ScriptAckBody> = serde_json::from_str(raw).map_err(|e| {
        BridgeError::DispatchFailure(format!("unreadable script acknowledgment `{raw}`: {e}"))
    })?;
    let body = body.ok_or_else(|| {
        BridgeError::DispatchFailure("script produced no acknowledgment".into())
    })?;
    if body.ok {
        return Ok(());
    }
    match body.error.as_deref() {
        Some("sdk-uninitialized") => Err(BridgeError::SdkUninitialized),
        Some("map-missing") => Err(BridgeError::MapNotInitialized),
        Some("container-missing") => Err(BridgeError::ScriptFailure(
            "map container element not found".into(),
        )),
        Some(other) => Err(BridgeError::ScriptFailure(match body.detail {
            Some(detail) => format!("{other}: {detail}"),
            None => other.to_owned(),
        })),
        None => Err(BridgeError::ScriptFailure("script reported failure".into())),
    }
}
