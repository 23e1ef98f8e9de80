// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mapbridge-plugin: the map plugin exposed to web content.
//
// Plugins are registered with the host shell under a name and receive calls
// by method name. Each call produces exactly one `CallOutcome`.

use async_trait::async_trait;
use mapbridge_core::types::{CallOutcome, PluginCall};

pub mod bootstrap;
pub mod plugin;
pub mod script;

pub use bootstrap::{SdkBootstrap, SdkState};
pub use plugin::{MapMethod, MapPlugin};

/// A named set of remote methods callable from web content.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name the web layer addresses the plugin by.
    fn name(&self) -> &str;

    /// Method names this plugin answers.
    fn methods(&self) -> Vec<&'static str>;

    /// Handle one call. Never panics; failures become rejections.
    async fn call(&self, call: PluginCall) -> CallOutcome;
}

#[async_trait]
impl Plugin for MapPlugin {
    fn name(&self) -> &str {
        MapPlugin::name(self)
    }

    fn methods(&self) -> Vec<&'static str> {
        MapMethod::ALL.iter().map(|m| m.name()).collect()
    }

    async fn call(&self, call: PluginCall) -> CallOutcome {
        self.dispatch(&call).await
    }
}
