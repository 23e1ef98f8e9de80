// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration and map-provider credential resolution.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::types::Coordinates;

/// Sentinel value shipped in templates when no key has been provisioned.
pub const PLACEHOLDER_KEY: &str = "YOUR_NATIVE_APP_KEY_HERE";

/// Key baked in at build time, if the build environment provided one.
pub const BUILD_TIME_KEY: Option<&str> = option_env!("KAKAO_MAP_NATIVE_KEY");

/// Settings shared by the shell, the plugin, and the SDK bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name the map plugin is registered under.
    pub plugin_name: String,
    /// Center used by `initializeMap` when the call omits coordinates.
    pub default_center: Coordinates,
    /// Fixed coordinate answered by `getCurrentLocation`.
    pub fallback_location: Coordinates,
    /// Map zoom level (1 = closest, 14 = farthest).
    pub zoom_level: u8,
    /// DOM id of the element hosting the map.
    pub container_id: String,
    /// Dotted path of the SDK namespace under `window`.
    pub sdk_namespace: String,
    /// How long to wait for the script context to acknowledge a dispatch.
    pub ack_timeout_ms: u64,
    /// Bundled fallback for the native SDK key.
    pub native_key: Option<String>,
    /// Package whose signing certificates are hashed at startup.
    pub package_name: String,
    /// Log signature key hashes on startup.
    pub log_key_hashes: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            plugin_name: "KakaoMapPlugin".into(),
            default_center: Coordinates::SEOUL,
            fallback_location: Coordinates::SEOUL,
            zoom_level: 3,
            container_id: "map".into(),
            sdk_namespace: "kakao.maps".into(),
            ack_timeout_ms: 5_000,
            native_key: None,
            package_name: "com.mompick.app".into(),
            log_key_hashes: true,
        }
    }
}

impl BridgeConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Persist as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the script templates cannot render safely.
    pub fn validate(&self) -> Result<()> {
        if !(1..=14).contains(&self.zoom_level) {
            return Err(BridgeError::Config(format!(
                "zoom_level {} is outside 1..=14",
                self.zoom_level
            )));
        }
        if self.ack_timeout_ms == 0 {
            return Err(BridgeError::Config("ack_timeout_ms must be positive".into()));
        }
        if self.container_id.is_empty() {
            return Err(BridgeError::Config("container_id must not be empty".into()));
        }
        if self.plugin_name.is_empty() {
            return Err(BridgeError::Config("plugin_name must not be empty".into()));
        }
        let namespace_ok = !self.sdk_namespace.is_empty()
            && self.sdk_namespace.split('.').all(is_js_identifier);
        if !namespace_ok {
            return Err(BridgeError::Config(format!(
                "sdk_namespace `{}` is not a dotted identifier path",
                self.sdk_namespace
            )));
        }
        Coordinates::new(self.default_center.lat, self.default_center.lng)?;
        Coordinates::new(self.fallback_location.lat, self.fallback_location.lng)?;
        Ok(())
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

fn is_js_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The map-provider key after resolution.
#[derive(Clone, PartialEq, Eq)]
pub enum MapCredential {
    Configured(String),
    Unset,
}

impl MapCredential {
    /// Build-time constant first, then the bundled resource, then unset.
    /// Empty values and the placeholder sentinel count as absent.
    pub fn resolve(build_time: Option<&str>, resource: Option<&str>) -> Self {
        [build_time, resource]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty() && *key != PLACEHOLDER_KEY)
            .map(|key| Self::Configured(key.to_owned()))
            .unwrap_or(Self::Unset)
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::resolve(BUILD_TIME_KEY, config.native_key.as_deref())
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Configured(key) => Some(key),
            Self::Unset => None,
        }
    }
}

impl std::fmt::Debug for MapCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configured(_) => f.write_str("Configured(<redacted>)"),
            Self::Unset => f.write_str("Unset"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BridgeConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.default_center, Coordinates::SEOUL);
        assert_eq!(config.zoom_level, 3);
        assert_eq!(config.ack_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BridgeConfig::load(&dir.path().join("absent.json")).expect("load");
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, r#"{ "zoom_level": 5, "native_key": "abc123" }"#).expect("write");

        let config = BridgeConfig::load(&path).expect("load");
        assert_eq!(config.zoom_level, 5);
        assert_eq!(config.native_key.as_deref(), Some("abc123"));
        assert_eq!(config.container_id, "map");
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bridge.json");
        let config = BridgeConfig {
            plugin_name: "MapPlugin".into(),
            ack_timeout_ms: 250,
            ..BridgeConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(BridgeConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = BridgeConfig::load(&path).expect_err("malformed");
        assert_eq!(err.code(), "CONFIG");
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        let config = BridgeConfig {
            sdk_namespace: "kakao.maps'); alert(1".into(),
            ..BridgeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn credential_prefers_build_time_key() {
        let credential = MapCredential::resolve(Some("build-key"), Some("resource-key"));
        assert_eq!(credential.key(), Some("build-key"));
    }

    #[test]
    fn credential_falls_back_past_placeholder() {
        let credential = MapCredential::resolve(Some(PLACEHOLDER_KEY), Some("resource-key"));
        assert_eq!(credential.key(), Some("resource-key"));
    }

    #[test]
    fn credential_unset_when_every_source_is_placeholder() {
        let credential = MapCredential::resolve(Some(PLACEHOLDER_KEY), Some(PLACEHOLDER_KEY));
        assert_eq!(credential, MapCredential::Unset);
        assert_eq!(MapCredential::resolve(None, Some("  ")), MapCredential::Unset);
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = MapCredential::Configured("secret-native-key".into());
        assert!(!format!("{credential:?}").contains("secret"));
    }
}
