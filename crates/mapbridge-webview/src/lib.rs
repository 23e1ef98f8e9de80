// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mapbridge-webview: platform script hosts.
//
// Defines the traits at the native/WebView seam and picks the implementation
// for the target: JNI into an Android WebView, or a headless host that
// emulates the UI thread for desktop and CI builds.

use std::sync::Arc;

pub mod pending;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

/// Bridge implementation compiled for this target.
#[cfg(target_os = "android")]
pub type NativeBridge = android::AndroidBridge;

/// Bridge implementation compiled for this target.
#[cfg(not(target_os = "android"))]
pub type NativeBridge = stub::HeadlessBridge;

/// Returns the bridge implementation for the target operating system.
///
/// Android: `jni-rs` calls into the WebView attached by the host Activity.
/// Desktop/CI: emulated UI thread with a scripted page.
pub fn platform_bridge() -> Arc<NativeBridge> {
    Arc::new(NativeBridge::new())
}
