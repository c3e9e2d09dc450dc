//! USCN - Unified String Canonicalization Normalizer
//!
//! This crate is the first stage of the protocol admission pipeline. It
//! reduces syntactic-variant byte sequences (percent escapes, overlong UTF-8
//! forms, mixed encodings, case and whitespace variants) to a single
//! canonical form before any validation decision is made.
//!
//! # Overview
//!
//! The `uscn` crate is responsible for:
//! - **Encoding substitution**: rewriting exploit-prone sequences via the
//!   ordered [`ENCODING_RULES`] table (longest match wins)
//! - **Case folding**: lowercasing ASCII letters, leaving other bytes alone
//! - **Whitespace folding**: collapsing runs of space/tab/CR/LF to one space
//! - **Origin hashing**: a version-aware SHA-256 digest linking the
//!   canonical buffer back to its raw input
//! - **Equivalence**: the public [`equivalent`] predicate that defines when
//!   two wire representations denote the same message
//!
//! # Core Guarantee
//!
//! > **Same input bytes + same [`UscnConfig`] -> identical
//! > [`CanonicalBuffer`], forever. And `normalize` is idempotent.**
//!
//! The crate is pure and side-effect free: no I/O, no clock, no locale, no
//! global state. The recognizer downstream inspects canonical bytes only;
//! any path around this crate is a security defect by definition.
//!
//! # Pipeline Position
//!
//! ```text
//! Raw Bytes ──▶ USCN ──▶ DFA Recognizer ──▶ IR + Governance Cost
//!                ↑
//!           (this crate)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use uscn::{equivalent, normalize, UscnConfig};
//!
//! let cfg = UscnConfig::default();
//!
//! let buf = normalize(b"%2e%2e%2fETC", &cfg).unwrap();
//! assert_eq!(buf.as_bytes(), b"../etc");
//!
//! // All encoding variants of a traversal collapse to one form.
//! assert!(equivalent(b"%2e%2e%2f", b"../", &cfg));
//! assert!(equivalent(b".%2e/", b"%2E%2e/", &cfg));
//! ```
//!
//! # Bounds and Failure
//!
//! Canonical output never exceeds [`OBI_CANONICAL_BUFFER_SIZE`] bytes; a
//! substitution pass that would cross the bound fails with
//! [`UscnError::BufferOverflow`] and returns no partial buffer. With
//! `strict_utf8` enabled the canonical stream must also be valid UTF-8.

mod buffer;
mod config;
mod encoding;
mod error;
mod hash;
mod normalize;

pub use crate::buffer::CanonicalBuffer;
pub use crate::config::UscnConfig;
pub use crate::encoding::{longest_match, EncodingRule, RiskClass, ENCODING_RULES};
pub use crate::error::UscnError;
pub use crate::hash::hash_origin_bytes;
pub use crate::normalize::{equivalent, fold_whitespace, normalize};

/// Hard bound on canonical buffer length, in bytes.
pub const OBI_CANONICAL_BUFFER_SIZE: usize = 8192;

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> UscnConfig {
        UscnConfig::default()
    }

    #[test]
    fn mandatory_rewrites_reach_canonical_form() {
        let cases: &[(&[u8], &[u8])] = &[
            (b"%2e%2e%2f", b"../"),
            (b"%c0%af", b"../"),
            (b".%2e/", b"../"),
            (b"%2e%2e/", b"../"),
            (b"%c0%ae", b"."),
            (b"%2f", b"/"),
            (b"%2e", b"."),
            (b"%20", b" "),
            (b"%3a", b":"),
            (b"%7c", b"|"),
        ];
        for (encoded, canonical) in cases {
            let buf = normalize(encoded, &cfg()).expect("mandatory rule normalizes");
            assert_eq!(
                buf.as_bytes(),
                *canonical,
                "rewrite failed for {:?}",
                String::from_utf8_lossy(encoded)
            );
        }
    }

    #[test]
    fn longest_rule_wins_over_shorter_prefix() {
        // "%2e%2e%2f" must apply as one traversal rule, not three "%2e"/"%2f"
        // singles; both spellings land on "../" either way, but the longest
        // match must be chosen so risk attribution is right.
        let rule = longest_match(b"%2e%2e%2fx").expect("rule applies");
        assert_eq!(rule.encoded, "%2e%2e%2f");
        assert_eq!(rule.risk, RiskClass::PathTraversal);
    }

    #[test]
    fn overlong_slash_prefers_path_traversal_reading() {
        // %c0%af maps both to "../" and "/" in the table; equal length, so
        // the earlier path-traversal row must win.
        let rule = longest_match(b"%c0%af").expect("rule applies");
        assert_eq!(rule.canonical, "../");
        assert_eq!(rule.risk, RiskClass::PathTraversal);
    }

    #[test]
    fn hex_digits_match_case_insensitively() {
        let upper = normalize(b"%2E%2E%2F", &cfg()).unwrap();
        let lower = normalize(b"%2e%2e%2f", &cfg()).unwrap();
        assert_eq!(upper.as_bytes(), b"../");
        assert_eq!(upper.bytes, lower.bytes);

        let overlong = normalize(b"%C0%AF", &cfg()).unwrap();
        assert_eq!(overlong.as_bytes(), b"../");
    }

    #[test]
    fn case_folding_lowercases_ascii_only() {
        let buf = normalize("SEC:ABC\u{00e9}".as_bytes(), &cfg()).unwrap();
        assert_eq!(buf.as_bytes(), "sec:abc\u{00e9}".as_bytes());

        let unfolded = normalize(
            b"SEC:ABC",
            &UscnConfig {
                fold_case: false,
                ..UscnConfig::default()
            },
        )
        .unwrap();
        assert_eq!(unfolded.as_bytes(), b"SEC:ABC");
    }

    #[test]
    fn whitespace_folds_without_trimming() {
        let buf = normalize(b"  a\t\r\nb ", &cfg()).unwrap();
        assert_eq!(buf.as_bytes(), b" a b ");

        let unfolded = normalize(
            b"a  b",
            &UscnConfig {
                fold_whitespace: false,
                ..UscnConfig::default()
            },
        )
        .unwrap();
        assert_eq!(unfolded.as_bytes(), b"a  b");
    }

    #[test]
    fn normalization_is_idempotent_on_samples() {
        let samples: &[&[u8]] = &[
            b"%2e%2e%2fetc%2fpasswd",
            b"OBI-PROTOCOL-1.0:SEC:%20%20payload",
            b"  mixed \t CASE %3A runs  ",
            b"plain",
            b"%c0%ae%2e/",
            b"%25%32%65",
        ];
        let cfg = cfg();
        for s in samples {
            let once = normalize(s, &cfg).unwrap();
            let twice = normalize(once.as_bytes(), &cfg).unwrap();
            assert_eq!(once.bytes, twice.bytes, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn exact_bound_is_admitted_and_one_past_overflows() {
        let exact = vec![b'a'; OBI_CANONICAL_BUFFER_SIZE];
        let buf = normalize(&exact, &cfg()).unwrap();
        assert_eq!(buf.len(), OBI_CANONICAL_BUFFER_SIZE);

        let over = vec![b'a'; OBI_CANONICAL_BUFFER_SIZE + 1];
        assert_eq!(
            normalize(&over, &cfg()),
            Err(UscnError::BufferOverflow {
                limit: OBI_CANONICAL_BUFFER_SIZE
            })
        );
    }

    #[test]
    fn strict_utf8_rejects_stray_continuation_bytes() {
        let strict = UscnConfig {
            strict_utf8: true,
            ..UscnConfig::default()
        };
        assert_eq!(
            normalize(b"ok\xffrest", &strict),
            Err(UscnError::InvalidUtf8 { position: 2 })
        );
        // The overlong forms themselves are rewritten before the check runs.
        assert!(normalize(b"%c0%ae", &strict).is_ok());
        // Default config passes arbitrary bytes through.
        assert!(normalize(b"ok\xffrest", &cfg()).is_ok());
    }

    #[test]
    fn version_zero_is_rejected() {
        let bad = UscnConfig {
            version: 0,
            ..UscnConfig::default()
        };
        assert!(matches!(
            normalize(b"x", &bad),
            Err(UscnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn origin_hash_is_version_aware() {
        let v1 = normalize(b"same input", &cfg()).unwrap();
        let v2 = normalize(
            b"same input",
            &UscnConfig {
                version: 2,
                ..UscnConfig::default()
            },
        )
        .unwrap();
        assert_eq!(v1.bytes, v2.bytes);
        assert_ne!(v1.origin_hash, v2.origin_hash);
        assert_eq!(v1.origin_hash.len(), 64);
    }

    #[test]
    fn equivalence_holds_for_encoding_and_case_variants() {
        let cfg = cfg();
        assert!(equivalent(b"%2e%2e%2f", b"../", &cfg));
        assert!(equivalent(b"SEC:abc", b"sec:ABC", &cfg));
        assert!(equivalent(b"a \t b", b"a b", &cfg));
        assert!(!equivalent(b"a", b"b", &cfg));
    }

    #[test]
    fn oversized_inputs_are_equivalent_to_nothing() {
        let cfg = cfg();
        let huge = vec![b'a'; OBI_CANONICAL_BUFFER_SIZE + 1];
        assert!(!equivalent(&huge, &huge, &cfg));
        assert!(!equivalent(&huge, b"a", &cfg));
    }

    #[test]
    fn empty_input_normalizes_to_empty_buffer() {
        // Rejecting empty messages is an admission-level decision; the
        // normalizer itself stays total.
        let buf = normalize(b"", &cfg()).unwrap();
        assert!(buf.is_empty());
    }
}
