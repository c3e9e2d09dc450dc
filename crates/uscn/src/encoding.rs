//! The encoding substitution table.
//!
//! Every byte sequence listed here is one that must never reach a validation
//! decision in its raw form: percent-encodings, overlong UTF-8 forms, and
//! mixed-encoding tricks that all denote the same canonical characters. The
//! table is ordered with longer rules ahead of shorter overlapping ones, and
//! [`longest_match`] resolves ambiguity by maximal munch with table order as
//! the tie breaker.
//!
//! The overlong form `%c0%af` appears twice: once rewriting to the traversal
//! sequence `../` and once to a bare `/`. Both rows are the same length, so
//! the earlier row (the path-traversal rewrite) always wins; the second row is
//! retained so the serialized engine spec documents both risk readings.

use serde::{Deserialize, Serialize};

/// Why a rewrite exists: the class of exploit the encoded form belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum RiskClass {
    /// Encoded directory-traversal sequences (`%2e%2e%2f` and friends).
    PathTraversal,
    /// Overlong UTF-8 encodings of ASCII characters.
    Utf8Overlong,
    /// Partially encoded sequences mixing literal and escaped bytes.
    MixedEncoding,
    /// Plain single-character percent escapes.
    Basic,
    /// Escaped structural delimiters (`:` and `|`).
    Delimiter,
    /// Escaped whitespace.
    Whitespace,
}

impl RiskClass {
    /// Hyphenated name used in the serialized engine spec.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskClass::PathTraversal => "path-traversal",
            RiskClass::Utf8Overlong => "utf8-overlong",
            RiskClass::MixedEncoding => "mixed-encoding",
            RiskClass::Basic => "basic",
            RiskClass::Delimiter => "delimiter",
            RiskClass::Whitespace => "whitespace",
        }
    }
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rewrite of an exploit-prone byte sequence to its canonical form.
///
/// Rules are immutable and compiled into the engine. The `encoded` side is
/// stored lowercase; matching lowercases input bytes first, which makes the
/// hex digits of percent escapes case-insensitive without touching bytes
/// outside the rule window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRule {
    /// The byte sequence as it may appear on the wire (lowercase form).
    pub encoded: &'static str,
    /// The canonical replacement emitted by the normalizer.
    pub canonical: &'static str,
    /// Exploit class this rule defends against.
    pub risk: RiskClass,
}

/// The mandatory substitution table.
///
/// Order matters twice over: longer rules precede shorter overlapping ones,
/// and among equal-length candidates the earlier row wins.
pub static ENCODING_RULES: &[EncodingRule] = &[
    EncodingRule {
        encoded: "%2e%2e%2f",
        canonical: "../",
        risk: RiskClass::PathTraversal,
    },
    EncodingRule {
        encoded: "%c0%af",
        canonical: "../",
        risk: RiskClass::Utf8Overlong,
    },
    EncodingRule {
        encoded: ".%2e/",
        canonical: "../",
        risk: RiskClass::MixedEncoding,
    },
    EncodingRule {
        encoded: "%2e%2e/",
        canonical: "../",
        risk: RiskClass::MixedEncoding,
    },
    EncodingRule {
        encoded: "%c0%ae",
        canonical: ".",
        risk: RiskClass::Utf8Overlong,
    },
    // Shadowed by the path-traversal reading above; kept for spec export.
    EncodingRule {
        encoded: "%c0%af",
        canonical: "/",
        risk: RiskClass::Utf8Overlong,
    },
    EncodingRule {
        encoded: "%2f",
        canonical: "/",
        risk: RiskClass::Basic,
    },
    EncodingRule {
        encoded: "%2e",
        canonical: ".",
        risk: RiskClass::Basic,
    },
    EncodingRule {
        encoded: "%20",
        canonical: " ",
        risk: RiskClass::Whitespace,
    },
    EncodingRule {
        encoded: "%3a",
        canonical: ":",
        risk: RiskClass::Delimiter,
    },
    EncodingRule {
        encoded: "%7c",
        canonical: "|",
        risk: RiskClass::Delimiter,
    },
];

/// Returns true when `input` begins with `rule.encoded`, ignoring ASCII case.
fn rule_matches(rule: &EncodingRule, input: &[u8]) -> bool {
    let encoded = rule.encoded.as_bytes();
    input.len() >= encoded.len()
        && input
            .iter()
            .zip(encoded)
            .all(|(a, b)| a.to_ascii_lowercase() == *b)
}

/// Finds the substitution rule to apply at the head of `input`.
///
/// Longest match wins; equal lengths resolve to the earliest table row. A
/// `None` means the leading byte passes through the normalizer unchanged.
pub fn longest_match(input: &[u8]) -> Option<&'static EncodingRule> {
    let mut best: Option<&'static EncodingRule> = None;
    for rule in ENCODING_RULES {
        let longer = best.map_or(true, |b| rule.encoded.len() > b.encoded.len());
        if longer && rule_matches(rule, input) {
            best = Some(rule);
        }
    }
    best
}
