// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signing-certificate key hashes: base64(SHA-1(cert)), the form map
// provider consoles ask for when registering an Android app.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ring::digest::{SHA1_FOR_LEGACY_USE_ONLY, digest};
use tracing::{info, warn};

use mapbridge_webview::traits::NativePackageSignatures;

/// Key hash of one signing certificate: standard base64, no line breaks.
pub fn key_hash(signature: &[u8]) -> String {
    STANDARD.encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, signature).as_ref())
}

/// Log the key hash of every signing certificate of `package`.
///
/// Returns the hashes that were logged. Lookup failures are logged and
/// yield an empty list; they never abort startup.
pub fn log_key_hashes(signatures: &dyn NativePackageSignatures, package: &str) -> Vec<String> {
    let certs = match signatures.package_signatures(package) {
        Ok(certs) => certs,
        Err(e) => {
            warn!(package, "could not read package signatures: {e}");
            return Vec::new();
        }
    };

    info!(package, count = certs.len(), "computing signature key hashes");
    certs
        .iter()
        .enumerate()
        .map(|(index, cert)| {
            let hash = key_hash(cert);
            info!(package, index = index + 1, key_hash = %hash, len = hash.len(), "key hash");
            hash
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapbridge_webview::stub::HeadlessBridge;

    #[test]
    fn key_hash_of_empty_input() {
        // SHA-1("") = da39a3ee5e6b4b0d3255bfef95601890afd80709
        assert_eq!(key_hash(b""), "2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
    }

    #[test]
    fn key_hash_known_value() {
        // SHA-1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
        assert_eq!(key_hash(b"abc"), "qZk+NkcGgWq6PiVxeFDCbJzQ2J0=");
    }

    #[test]
    fn key_hash_has_no_line_breaks() {
        let hash = key_hash(&[0xAB; 4096]);
        assert!(!hash.contains('\n') && !hash.contains('\r'));
        assert_eq!(hash.len(), 28);
    }

    #[test]
    fn logs_one_hash_per_signature() {
        let bridge = HeadlessBridge::new()
            .with_signatures("com.example.app", vec![b"abc".to_vec(), Vec::new()]);
        let hashes = log_key_hashes(&bridge, "com.example.app");
        assert_eq!(
            hashes,
            vec![
                "qZk+NkcGgWq6PiVxeFDCbJzQ2J0=".to_owned(),
                "2jmj7l5rSw0yVb/vlWAYkK/YBwk=".to_owned()
            ]
        );
    }

    #[test]
    fn unknown_package_yields_no_hashes() {
        let bridge = HeadlessBridge::new();
        assert!(log_key_hashes(&bridge, "com.unknown").is_empty());
    }
}
