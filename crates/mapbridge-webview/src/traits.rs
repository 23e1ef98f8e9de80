// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the WebView seam.
//
// Script evaluation always happens on the platform's UI thread. Callers hand
// over a script together with a `ScriptAck`; the host fires the ack once the
// script context has produced a value, so callers can await real completion
// instead of dispatch.

use mapbridge_core::error::Result;
use tokio::sync::oneshot;
use tracing::debug;

/// What the script context reported for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// JSON encoding of the script's completion value (`"null"` if none).
    Evaluated(String),
    /// The host could not evaluate the script at all.
    Failed(String),
}

/// Receiving half of an acknowledgment.
pub type AckReceiver = oneshot::Receiver<ScriptOutcome>;

/// One-shot acknowledgment handed to a host along with a script.
#[derive(Debug)]
pub struct ScriptAck {
    tx: oneshot::Sender<ScriptOutcome>,
}

impl ScriptAck {
    pub fn channel() -> (Self, AckReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Report the script's completion value.
    pub fn complete(self, raw: impl Into<String>) {
        self.send(ScriptOutcome::Evaluated(raw.into()));
    }

    /// Report that the script never ran.
    pub fn fail(self, reason: impl Into<String>) {
        self.send(ScriptOutcome::Failed(reason.into()));
    }

    pub fn send(self, outcome: ScriptOutcome) {
        if self.tx.send(outcome).is_err() {
            debug!("script acknowledgment arrived after the caller gave up");
        }
    }

    /// Whether the caller has stopped waiting.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Evaluates scripts inside the hosted WebView.
pub trait ScriptHost: Send + Sync {
    /// Queue `script` for evaluation on the UI thread and return at once.
    ///
    /// `Err` means the host refused the script (no WebView attached, queue
    /// closed). Otherwise the outcome is delivered through `ack`.
    fn evaluate_script(&self, script: String, ack: ScriptAck) -> Result<()>;
}

/// Native map SDK lifecycle.
pub trait NativeMapSdk: Send + Sync {
    /// Initialise the native SDK with the provider key.
    fn init_sdk(&self, native_key: &str) -> Result<()>;
}

/// Signing certificates of installed packages.
pub trait NativePackageSignatures: Send + Sync {
    /// Raw bytes of each signing certificate of `package`.
    fn package_signatures(&self, package: &str) -> Result<Vec<Vec<u8>>>;
}

/// Unified bridge grouping every native capability the shell needs.
pub trait PlatformBridge: ScriptHost + NativeMapSdk + NativePackageSignatures {
    /// Human-readable platform name (e.g. "Android", "Headless").
    fn platform_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ack_delivers_completion_value() {
        let (ack, rx) = ScriptAck::channel();
        ack.complete(r#"{"ok":true}"#);
        assert_eq!(
            rx.await.expect("ack"),
            ScriptOutcome::Evaluated(r#"{"ok":true}"#.into())
        );
    }

    #[tokio::test]
    async fn dropped_ack_closes_receiver() {
        let (ack, rx) = ScriptAck::channel();
        drop(ack);
        assert!(rx.await.is_err());
    }

    #[test]
    fn ack_notices_abandoned_caller() {
        let (ack, rx) = ScriptAck::channel();
        assert!(!ack.is_abandoned());
        drop(rx);
        assert!(ack.is_abandoned());
        ack.fail("late");
    }
}
