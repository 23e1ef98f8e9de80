// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-time native map SDK initialisation.

use std::sync::{Arc, OnceLock};

use mapbridge_core::config::MapCredential;
use mapbridge_security::mask_credential;
use mapbridge_webview::traits::NativeMapSdk;
use tracing::{info, warn};

/// Result of the process-wide SDK bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkState {
    /// The SDK accepted the key.
    Ready,
    /// No usable key was provisioned.
    Unconfigured,
    /// The SDK rejected the key or could not be reached.
    Failed(String),
}

/// Runs SDK initialisation at most once and remembers the outcome.
#[derive(Debug, Default)]
pub struct SdkBootstrap {
    state: OnceLock<SdkState>,
}

static PROCESS_BOOTSTRAP: OnceLock<Arc<SdkBootstrap>> = OnceLock::new();

impl SdkBootstrap {
    /// A private bootstrap, independent of [`SdkBootstrap::process`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The bootstrap shared by the whole process. The native SDK is a
    /// process-wide singleton, so every shell should go through this one.
    pub fn process() -> Arc<SdkBootstrap> {
        Arc::clone(PROCESS_BOOTSTRAP.get_or_init(|| Arc::new(SdkBootstrap::new())))
    }

    /// Initialise the SDK with `credential`. Later calls return the first result.
    pub fn run(&self, sdk: &dyn NativeMapSdk, credential: &MapCredential) -> &SdkState {
        self.state.get_or_init(|| match credential.key() {
            None => {
                warn!("map SDK native key is not configured; map calls will be rejected");
                SdkState::Unconfigured
            }
            Some(key) => match sdk.init_sdk(key) {
                Ok(()) => {
                    info!(key = %mask_credential(key), "map SDK initialised");
                    SdkState::Ready
                }
                Err(e) => {
                    warn!(key = %mask_credential(key), "map SDK initialisation failed: {e}");
                    SdkState::Failed(e.to_string())
                }
            },
        })
    }

    /// Recorded state, or `None` before `run` was called.
    pub fn state(&self) -> Option<&SdkState> {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state.get(), Some(SdkState::Ready))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapbridge_webview::stub::HeadlessBridge;

    #[test]
    fn not_ready_before_run() {
        let bootstrap = SdkBootstrap::new();
        assert!(bootstrap.state().is_none());
        assert!(!bootstrap.is_ready());
    }

    #[test]
    fn configured_key_initialises_sdk() {
        let bridge = HeadlessBridge::new();
        let bootstrap = SdkBootstrap::new();
        let state = bootstrap.run(&bridge, &MapCredential::Configured("0123456789abcdef".into()));
        assert_eq!(state, &SdkState::Ready);
        assert!(bridge.sdk_ready());
        assert!(bootstrap.is_ready());
    }

    #[test]
    fn unset_key_leaves_sdk_untouched() {
        let bridge = HeadlessBridge::new();
        let bootstrap = SdkBootstrap::new();
        assert_eq!(bootstrap.run(&bridge, &MapCredential::Unset), &SdkState::Unconfigured);
        assert!(!bridge.sdk_ready());
    }

    #[test]
    fn runs_only_once() {
        let bridge = HeadlessBridge::new();
        let bootstrap = SdkBootstrap::new();
        bootstrap.run(&bridge, &MapCredential::Unset);
        let second = bootstrap.run(&bridge, &MapCredential::Configured("late-key-123".into()));
        assert_eq!(second, &SdkState::Unconfigured);
        assert!(!bridge.sdk_ready());
    }

    #[test]
    fn process_bootstrap_is_shared() {
        assert!(Arc::ptr_eq(&SdkBootstrap::process(), &SdkBootstrap::process()));
    }

    #[test]
    fn sdk_rejection_is_recorded() {
        let bridge = HeadlessBridge::new();
        let bootstrap = SdkBootstrap::new();
        // The headless SDK refuses empty keys.
        let state = bootstrap.run(&bridge, &MapCredential::Configured(String::new()));
        assert!(matches!(state, SdkState::Failed(_)));
    }
}
