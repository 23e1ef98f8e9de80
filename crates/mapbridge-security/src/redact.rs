// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Credential redaction for log output.

/// Characters of a key that may appear in logs.
const VISIBLE_PREFIX: usize = 8;

/// Mask a credential for logging: the first eight characters, then `...`.
///
/// Keys too short to keep anything hidden are fully masked.
pub fn mask_credential(key: &str) -> String {
    if key.chars().count() <= VISIBLE_PREFIX {
        return "***".into();
    }
    let prefix: String = key.chars().take(VISIBLE_PREFIX).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_eight_character_prefix() {
        assert_eq!(mask_credential("0123456789abcdef"), "01234567...");
    }

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(mask_credential("short"), "***");
        assert_eq!(mask_credential("exactly8"), "***");
        assert_eq!(mask_credential(""), "***");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(mask_credential("지도지도지도지도키"), "지도지도지도지도...");
    }
}
