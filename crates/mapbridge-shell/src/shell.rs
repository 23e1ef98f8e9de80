// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host shell: owns the platform bridge, bootstraps the map SDK, and routes
// web calls to registered plugins.
//
// Startup order matters: the SDK must be initialised before the map plugin
// can accept calls, and the plugin must be registered before any envelope
// is routed.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use mapbridge_core::config::{BridgeConfig, MapCredential};
use mapbridge_core::error::BridgeError;
use mapbridge_core::rejection::rejection_for;
use mapbridge_core::types::{CallEnvelope, CallOutcome, CallResult};
use mapbridge_plugin::{MapPlugin, Plugin, SdkBootstrap, SdkState};
use mapbridge_security::log_key_hashes;
use mapbridge_webview::traits::{PlatformBridge, ScriptHost};

/// The native side of the WebView: bridge, SDK state, and plugin registry.
pub struct HostShell {
    platform: String,
    sdk: Arc<SdkBootstrap>,
    key_hashes: Vec<String>,
    plugins: RwLock<HashMap<String, Arc<dyn Plugin>>>,
}

impl HostShell {
    /// Bootstrap the SDK, log key hashes, and register the map plugin.
    ///
    /// The SDK goes through the process-wide bootstrap, so a second shell in
    /// the same process reuses the first initialisation.
    pub fn start<B>(config: BridgeConfig, bridge: Arc<B>) -> Self
    where
        B: PlatformBridge + 'static,
    {
        Self::start_with(config, bridge, SdkBootstrap::process())
    }

    /// [`HostShell::start`] with an explicit bootstrap. Shells sharing `sdk`
    /// share its single initialisation.
    pub fn start_with<B>(config: BridgeConfig, bridge: Arc<B>, sdk: Arc<SdkBootstrap>) -> Self
    where
        B: PlatformBridge + 'static,
    {
        info!(platform = bridge.platform_name(), "starting host shell");

        let state = sdk.run(bridge.as_ref(), &MapCredential::from_config(&config));
        debug!(?state, "map SDK bootstrap state");

        let key_hashes = if config.log_key_hashes {
            log_key_hashes(bridge.as_ref(), &config.package_name)
        } else {
            Vec::new()
        };

        let shell = Self {
            platform: bridge.platform_name().to_owned(),
            sdk: Arc::clone(&sdk),
            key_hashes,
            plugins: RwLock::new(HashMap::new()),
        };

        let host: Arc<dyn ScriptHost> = bridge;
        shell.register(Arc::new(MapPlugin::new(&config, host, sdk)));
        shell
    }

    /// Attach `plugin` under its name, replacing any earlier registration.
    pub fn register(&self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_owned();
        info!(plugin = %name, methods = ?plugin.methods(), "registering plugin");
        let previous = self
            .plugins
            .write()
            .expect("plugin registry lock poisoned")
            .insert(name.clone(), plugin);
        if previous.is_some() {
            warn!(plugin = %name, "plugin re-registered; previous instance replaced");
        }
    }

    pub fn platform_name(&self) -> &str {
        &self.platform
    }

    pub fn sdk_state(&self) -> Option<&SdkState> {
        self.sdk.state()
    }

    /// Key hashes logged at startup.
    pub fn key_hashes(&self) -> &[String] {
        &self.key_hashes
    }

    /// Names of every registered plugin, sorted.
    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .plugins
            .read()
            .expect("plugin registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Route one envelope and build the reply.
    pub async fn handle(&self, envelope: &CallEnvelope) -> CallResult {
        let plugin = self
            .plugins
            .read()
            .expect("plugin registry lock poisoned")
            .get(&envelope.plugin_id)
            .cloned();

        let outcome = match plugin {
            Some(plugin) => plugin.call(envelope.to_call()).await,
            None => {
                let err = BridgeError::UnknownPlugin(envelope.plugin_id.clone());
                warn!(plugin = %envelope.plugin_id, "call for unregistered plugin");
                CallOutcome::Rejected(rejection_for(&envelope.method_name, &err))
            }
        };
        CallResult::new(envelope, outcome)
    }

    /// Parse one JSON envelope and route it. Unparseable input is rejected,
    /// echoing whatever routing fields could be recovered.
    pub async fn handle_line(&self, line: &str) -> CallResult {
        match serde_json::from_str::<CallEnvelope>(line) {
            Ok(envelope) => self.handle(&envelope).await,
            Err(e) => {
                warn!("malformed call envelope: {e}");
                malformed_envelope(line, &e)
            }
        }
    }
}

fn malformed_envelope(line: &str, cause: &serde_json::Error) -> CallResult {
    let partial: Value = serde_json::from_str(line).unwrap_or(Value::Null);
    let field = |key: &str| {
        partial
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    let envelope = CallEnvelope {
        callback_id: field("callbackId"),
        plugin_id: field("pluginId"),
        method_name: field("methodName"),
        options: Default::default(),
    };
    let err = BridgeError::invalid_parameter("envelope", cause.to_string());
    CallResult::new(
        &envelope,
        CallOutcome::Rejected(rejection_for(&envelope.method_name, &err)),
    )
}
