// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Headless bridge for desktop/CI builds where no real WebView exists.
//
// A dedicated thread plays the role of the UI thread: scripts are evaluated
// one at a time in submission order, recorded, and answered by a responder
// that stands in for the page's script context.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, RwLock};

use mapbridge_core::error::{BridgeError, Result};
use tracing::{debug, error, info, warn};

use crate::traits::*;

/// Decides what the emulated page answers for a script.
///
/// Receives the script and whether the SDK has been initialised. Returning
/// `None` holds the ack without answering, like a page that hung.
pub type Responder = Arc<dyn Fn(&str, bool) -> Option<ScriptOutcome> + Send + Sync>;

/// Acknowledgment of a healthy page.
pub const ACK_OK: &str = r#"{"ok":true}"#;

/// Acknowledgment of a page whose SDK namespace never loaded.
pub const ACK_SDK_MISSING: &str = r#"{"ok":false,"error":"sdk-uninitialized"}"#;

struct ScriptJob {
    script: String,
    ack: ScriptAck,
}

/// In-process bridge with an emulated UI thread.
pub struct HeadlessBridge {
    queue: Option<mpsc::Sender<ScriptJob>>,
    responder: Arc<RwLock<Responder>>,
    sdk_ready: Arc<AtomicBool>,
    evaluated: Arc<Mutex<Vec<String>>>,
    held: Arc<Mutex<Vec<ScriptAck>>>,
    signatures: HashMap<String, Vec<Vec<u8>>>,
}

impl HeadlessBridge {
    /// Start the emulated UI thread with the default responder.
    pub fn new() -> Self {
        let initial: Responder = Arc::new(default_responder);
        let responder = Arc::new(RwLock::new(initial));
        let sdk_ready = Arc::new(AtomicBool::new(false));
        let evaluated = Arc::new(Mutex::new(Vec::new()));
        let held = Arc::new(Mutex::new(Vec::new()));

        let (tx, rx) = mpsc::channel::<ScriptJob>();
        let queue = {
            let responder = Arc::clone(&responder);
            let sdk_ready = Arc::clone(&sdk_ready);
            let evaluated = Arc::clone(&evaluated);
            let held = Arc::clone(&held);
            let spawned = std::thread::Builder::new()
                .name("mapbridge-ui".into())
                .spawn(move || run_ui_thread(rx, responder, sdk_ready, evaluated, held));
            match spawned {
                Ok(_) => Some(tx),
                Err(e) => {
                    error!("failed to spawn headless UI thread: {e}");
                    None
                }
            }
        };

        Self {
            queue,
            responder,
            sdk_ready,
            evaluated,
            held,
            signatures: HashMap::new(),
        }
    }

    /// Replace the emulated page.
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: Fn(&str, bool) -> Option<ScriptOutcome> + Send + Sync + 'static,
    {
        let responder: Responder = Arc::new(responder);
        *self.responder.write().expect("responder lock poisoned") = responder;
        self
    }

    /// Register signing certificates reported for `package`.
    pub fn with_signatures(mut self, package: &str, certs: Vec<Vec<u8>>) -> Self {
        self.signatures.insert(package.to_owned(), certs);
        self
    }

    /// Pretend the SDK was initialised earlier in the process.
    pub fn with_sdk_ready(self) -> Self {
        self.sdk_ready.store(true, Ordering::SeqCst);
        self
    }

    pub fn sdk_ready(&self) -> bool {
        self.sdk_ready.load(Ordering::SeqCst)
    }

    /// Every script evaluated so far, in UI-thread order.
    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.evaluated.lock().expect("script log lock poisoned").clone()
    }

    /// Number of acks the responder is holding unanswered.
    pub fn held_acks(&self) -> usize {
        self.held.lock().expect("held ack lock poisoned").len()
    }
}

impl Default for HeadlessBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn default_responder(_script: &str, sdk_ready: bool) -> Option<ScriptOutcome> {
    let reply = if sdk_ready { ACK_OK } else { ACK_SDK_MISSING };
    Some(ScriptOutcome::Evaluated(reply.into()))
}

fn run_ui_thread(
    rx: mpsc::Receiver<ScriptJob>,
    responder: Arc<RwLock<Responder>>,
    sdk_ready: Arc<AtomicBool>,
    evaluated: Arc<Mutex<Vec<String>>>,
    held: Arc<Mutex<Vec<ScriptAck>>>,
) {
    // Runs until every sender (i.e. the bridge) is dropped.
    while let Ok(ScriptJob { script, ack }) = rx.recv() {
        let respond = Arc::clone(&*responder.read().expect("responder lock poisoned"));
        let outcome = respond(&script, sdk_ready.load(Ordering::SeqCst));
        debug!(bytes = script.len(), answered = outcome.is_some(), "headless script evaluated");
        evaluated.lock().expect("script log lock poisoned").push(script);
        match outcome {
            Some(outcome) => ack.send(outcome),
            None => held.lock().expect("held ack lock poisoned").push(ack),
        }
    }
    debug!("headless UI thread exiting");
}

impl PlatformBridge for HeadlessBridge {
    fn platform_name(&self) -> &str {
        "Headless (stub)"
    }
}

impl ScriptHost for HeadlessBridge {
    fn evaluate_script(&self, script: String, ack: ScriptAck) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| BridgeError::DispatchFailure("headless UI thread is not running".into()))?;
        queue
            .send(ScriptJob { script, ack })
            .map_err(|_| BridgeError::DispatchFailure("headless UI thread has stopped".into()))
    }
}

impl NativeMapSdk for HeadlessBridge {
    fn init_sdk(&self, native_key: &str) -> Result<()> {
        if native_key.is_empty() {
            warn!("NativeMapSdk::init_sdk called with an empty key on stub bridge");
            return Err(BridgeError::SdkUninitialized);
        }
        info!("headless map SDK initialised");
        self.sdk_ready.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl NativePackageSignatures for HeadlessBridge {
    fn package_signatures(&self, package: &str) -> Result<Vec<Vec<u8>>> {
        self.signatures.get(package).cloned().ok_or_else(|| {
            warn!(package, "NativePackageSignatures called for unknown package on stub bridge");
            BridgeError::PlatformUnavailable
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn evaluate(bridge: &HeadlessBridge, script: &str) -> ScriptOutcome {
        let (ack, rx) = ScriptAck::channel();
        bridge.evaluate_script(script.into(), ack).expect("dispatch");
        rx.await.expect("ack")
    }

    #[tokio::test]
    async fn reports_missing_sdk_until_initialised() {
        let bridge = HeadlessBridge::new();
        assert_eq!(
            evaluate(&bridge, "1").await,
            ScriptOutcome::Evaluated(ACK_SDK_MISSING.into())
        );

        bridge.init_sdk("native-key").expect("init");
        assert_eq!(evaluate(&bridge, "2").await, ScriptOutcome::Evaluated(ACK_OK.into()));
    }

    #[tokio::test]
    async fn records_scripts_in_submission_order() {
        let bridge = HeadlessBridge::new().with_sdk_ready();
        let mut receivers = Vec::new();
        for i in 0..5 {
            let (ack, rx) = ScriptAck::channel();
            bridge.evaluate_script(format!("step({i})"), ack).expect("dispatch");
            receivers.push(rx);
        }
        for rx in receivers {
            rx.await.expect("ack");
        }
        let expected: Vec<String> = (0..5).map(|i| format!("step({i})")).collect();
        assert_eq!(bridge.evaluated_scripts(), expected);
    }

    #[tokio::test]
    async fn custom_responder_can_hold_acks() {
        let bridge = HeadlessBridge::new().with_responder(|_, _| None);
        let (ack, rx) = ScriptAck::channel();
        bridge.evaluate_script("hang()".into(), ack).expect("dispatch");

        let waited = tokio::time::timeout(std::time::Duration::from_millis(50), rx).await;
        assert!(waited.is_err(), "held ack must not resolve");
        assert_eq!(bridge.held_acks(), 1);
    }

    #[test]
    fn empty_key_does_not_initialise() {
        let bridge = HeadlessBridge::new();
        assert!(bridge.init_sdk("").is_err());
        assert!(!bridge.sdk_ready());
    }

    #[test]
    fn unknown_package_is_unavailable() {
        let bridge = HeadlessBridge::new().with_signatures("com.example", vec![vec![1, 2, 3]]);
        assert_eq!(
            bridge.package_signatures("com.example").expect("known"),
            vec![vec![1, 2, 3]]
        );
        assert!(matches!(
            bridge.package_signatures("com.other"),
            Err(BridgeError::PlatformUnavailable)
        ));
    }
}
