// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mapbridge: headless host shell.
//
// Reads one JSON call envelope per line on stdin and writes one JSON call
// result per line on stdout. Calls run concurrently, so results may come
// back out of order; match them by `callbackId`. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::BufReader;

use mapbridge_core::BridgeConfig;
use mapbridge_shell::{HostShell, serve};
use mapbridge_webview::platform_bridge;

const CONFIG_ENV: &str = "MAPBRIDGE_CONFIG";
const DEFAULT_CONFIG: &str = "mapbridge.json";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = match BridgeConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "cannot load configuration");
            return ExitCode::from(2);
        }
    };

    tracing::info!(path = %path.display(), "mapbridge starting");
    let shell = Arc::new(HostShell::start(config, platform_bridge()));

    match serve(shell, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "call loop terminated");
            ExitCode::FAILURE
        }
    }
}
