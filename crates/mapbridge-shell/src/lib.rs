// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mapbridge-shell: the native host for a WebView-based app.
//
// The shell owns the platform bridge, runs SDK bootstrap once at startup,
// and routes call envelopes from the web layer to registered plugins.

pub mod serve;
pub mod shell;

pub use serve::serve;
pub use shell::HostShell;
