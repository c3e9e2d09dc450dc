//! Core normalization pipeline implementation.
//!
//! [`normalize`] runs three phases in order:
//!
//! 1. **Encoding substitution**: a left-to-right scan applying the longest
//!    matching [`EncodingRule`](crate::EncodingRule) at each position, with
//!    the output bound enforced as bytes are emitted.
//! 2. **Case folding** (optional, default on): ASCII uppercase letters are
//!    lowercased in place; non-ASCII bytes pass through verbatim.
//! 3. **Whitespace folding** (optional, default on): each maximal run of
//!    space, tab, CR, and LF collapses to one space. Edges are collapsed,
//!    never trimmed.
//!
//! The pipeline is total over bounded inputs and idempotent: substitution
//! never emits a `%` byte it did not read, so a second pass finds nothing
//! left to rewrite, and the folded stream contains no upper-case ASCII and
//! no whitespace runs.

use crate::buffer::CanonicalBuffer;
use crate::config::UscnConfig;
use crate::encoding::longest_match;
use crate::error::UscnError;
use crate::hash::hash_origin_bytes;
use crate::OBI_CANONICAL_BUFFER_SIZE;

/// Normalize raw bytes into a deterministic, bounded canonical form.
///
/// This is the only path by which input may reach the recognizer. The
/// equivalence `validate(s) == validate(normalize(s))` is what makes the
/// admission decision independent of encoding tricks.
///
/// # Errors
///
/// - [`UscnError::InvalidConfig`] when `cfg.version == 0`.
/// - [`UscnError::BufferOverflow`] when the substituted stream would exceed
///   the canonical buffer bound; no partial buffer is returned.
/// - [`UscnError::InvalidUtf8`] when `cfg.strict_utf8` is on and the
///   canonical stream is not valid UTF-8.
///
/// # Guarantees
///
/// - Deterministic for a fixed `cfg` across platforms.
/// - Idempotent: `normalize(normalize(s)) == normalize(s)` whenever the
///   first pass succeeds.
/// - Output length <= [`OBI_CANONICAL_BUFFER_SIZE`].
pub fn normalize(input: &[u8], cfg: &UscnConfig) -> Result<CanonicalBuffer, UscnError> {
    if cfg.version == 0 {
        return Err(UscnError::InvalidConfig(
            "config version must be >= 1".into(),
        ));
    }

    let mut out = substitute(input)?;

    if cfg.fold_case {
        out.make_ascii_lowercase();
    }

    if cfg.fold_whitespace {
        out = fold_whitespace(&out);
    }

    if cfg.strict_utf8 {
        if let Err(err) = std::str::from_utf8(&out) {
            return Err(UscnError::InvalidUtf8 {
                position: err.valid_up_to(),
            });
        }
    }

    Ok(CanonicalBuffer {
        origin_hash: hash_origin_bytes(cfg.version, input),
        version: cfg.version,
        bytes: out,
    })
}

/// Phase 1: longest-match encoding substitution with the bound enforced.
fn substitute(input: &[u8]) -> Result<Vec<u8>, UscnError> {
    let mut out = Vec::with_capacity(input.len().min(OBI_CANONICAL_BUFFER_SIZE));
    let mut pos = 0;
    while pos < input.len() {
        let (emit, consumed): (&[u8], usize) = match longest_match(&input[pos..]) {
            Some(rule) => (rule.canonical.as_bytes(), rule.encoded.len()),
            None => (&input[pos..pos + 1], 1),
        };
        if out.len() + emit.len() > OBI_CANONICAL_BUFFER_SIZE {
            return Err(UscnError::BufferOverflow {
                limit: OBI_CANONICAL_BUFFER_SIZE,
            });
        }
        out.extend_from_slice(emit);
        pos += consumed;
    }
    Ok(out)
}

/// Collapse each maximal run of space, tab, CR, and LF into one space.
///
/// Collapsing only: a leading or trailing run becomes a single leading or
/// trailing space rather than disappearing, so byte positions stay honest
/// for offset reporting.
pub fn fold_whitespace(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_run = false;
    for &b in bytes {
        if matches!(b, b' ' | b'\t' | b'\r' | b'\n') {
            if !in_run {
                out.push(b' ');
                in_run = true;
            }
        } else {
            out.push(b);
            in_run = false;
        }
    }
    out
}

/// The canonical equivalence predicate.
///
/// Two byte strings are equivalent exactly when both normalize successfully
/// under `cfg` and their canonical bytes are equal. This is the operational
/// meaning of Zero Trust for the admission engine: every decision made over
/// one representative holds for the whole equivalence class.
///
/// Inputs that fail normalization (for example by exceeding the canonical
/// buffer bound) are equivalent to nothing, themselves included.
pub fn equivalent(a: &[u8], b: &[u8], cfg: &UscnConfig) -> bool {
    match (normalize(a, cfg), normalize(b, cfg)) {
        (Ok(left), Ok(right)) => left.bytes == right.bytes,
        _ => false,
    }
}
