// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mapbridge-security: signing-certificate key hashes and credential redaction.

pub mod keyhash;
pub mod redact;

pub use keyhash::{key_hash, log_key_hashes};
pub use redact::mask_credential;
