//! The admission engine.
//!
//! An [`Engine`] owns a compiled state table over a shared pattern registry
//! and runs one admission at a time: normalize, recognize, account. The
//! `admit` call is synchronous, performs no I/O, and runs to completion;
//! callers needing concurrent admissions instantiate one engine per thread
//! over the same `Arc<Registry>`.

use std::sync::Arc;

use tracing::{info, warn, Level};

use registry::{PatternKind, Registry, RegistryError};
use uscn::{hash_origin_bytes, normalize, CanonicalBuffer, UscnConfig};

use crate::error::{Rejection, RejectionKind};
use crate::governance::{CostAccumulator, GovernanceZone};
use crate::ir::{IrKind, IrNode, IrStream};
use crate::state::{StateTable, Transition, TransitionValidator, REJECTED_STATE};

/// Engine construction knobs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Zero-trust enforcement: every admission must take the normalized
    /// path, and the structural prelude carries a surcharge. Default on.
    pub zero_trust: bool,

    /// Normalization configuration applied by [`Engine::admit`].
    pub uscn: UscnConfig,

    /// Consecutive one-byte error-recovery skips tolerated before a
    /// `NoMatch` rejection. Zero (the strict default) rejects at the first
    /// unmatched position.
    pub max_recovery_skips: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zero_trust: true,
            uscn: UscnConfig::default(),
            max_recovery_skips: 0,
        }
    }
}

/// A successful admission: the IR stream plus its governance accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Recognized lexemes in byte-position order.
    pub ir: IrStream,
    /// Total accumulated cost, structural prelude included.
    pub cost: f64,
    /// Zone the final cost fell in; `Warning` admissions are flagged.
    pub zone: GovernanceZone,
    /// Accepting state recognition ended in.
    pub final_state: u16,
}

/// One configured recognizer session.
///
/// The registry and state table are immutable after construction and may be
/// shared across engines; per-admission state (cursor, accumulator, IR under
/// construction) is exclusive to the `&mut self` admission call. Current
/// state and cost reset at the start of every admission, so an engine is
/// reusable across messages; after a rejection it parks in the rejection
/// sink until the next admission or an explicit [`Engine::reset`].
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    table: StateTable,
    config: EngineConfig,
    current_state: u16,
    last_cost: f64,
}

impl Engine {
    /// Build an engine over a shared registry.
    pub fn new(registry: Arc<Registry>, config: EngineConfig) -> Result<Self, RegistryError> {
        let table = StateTable::build(&registry)?;
        Ok(Self {
            registry,
            table,
            config,
            current_state: 0,
            last_cost: 0.0,
        })
    }

    /// Build an engine over the mandatory protocol grammar.
    pub fn with_builtins(config: EngineConfig) -> Result<Self, RegistryError> {
        Self::new(Arc::new(Registry::with_builtins()?), config)
    }

    /// Admit a raw message: normalize, then recognize.
    ///
    /// This is the zero-trust path; the recognizer only ever sees the
    /// canonical form. The canonical buffer lives for the duration of the
    /// call; every IR node copies its lexeme out of it.
    pub fn admit(&mut self, input: &[u8]) -> Result<Admission, Rejection> {
        if input.is_empty() {
            return Err(self.reject_empty());
        }
        let canonical = match normalize(input, &self.config.uscn) {
            Ok(buffer) => buffer,
            Err(err) => {
                self.current_state = REJECTED_STATE;
                let rejection = Rejection::from_normalize(err);
                self.last_cost = rejection.cost;
                warn!(error = %rejection, "admission_rejected");
                return Err(rejection);
            }
        };
        self.run(&canonical, true)
    }

    /// Admit an already-normalized buffer.
    ///
    /// Callers that normalize once and fan a buffer out to several engines
    /// use this to skip the second pass; the buffer is trusted to be
    /// canonical because only [`normalize`] produces the type.
    pub fn admit_canonical(&mut self, canonical: &CanonicalBuffer) -> Result<Admission, Rejection> {
        self.run(canonical, true)
    }

    /// Admit raw bytes without normalization.
    ///
    /// Rejected `Unnormalized` up front when zero trust is on, and at the
    /// first zero-trust pattern otherwise; only a fully non-ZT grammar can
    /// recognize anything on this path.
    pub fn admit_raw(&mut self, input: &[u8]) -> Result<Admission, Rejection> {
        if input.is_empty() {
            return Err(self.reject_empty());
        }
        let pseudo = CanonicalBuffer {
            origin_hash: hash_origin_bytes(self.config.uscn.version, input),
            version: self.config.uscn.version,
            bytes: input.to_vec(),
        };
        self.run(&pseudo, false)
    }

    /// Clear the rejection sink and the retained cost of the last admission.
    pub fn reset(&mut self) {
        self.current_state = 0;
        self.last_cost = 0.0;
    }

    /// Accumulated cost of the most recent admission (successful or not).
    pub fn cost(&self) -> f64 {
        self.last_cost
    }

    /// Current recognizer state id; [`REJECTED_STATE`] while parked.
    pub fn current_state(&self) -> u16 {
        self.current_state
    }

    /// True while the engine is parked in the rejection sink.
    pub fn is_rejected(&self) -> bool {
        self.current_state == REJECTED_STATE
    }

    /// The shared pattern registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The compiled state table.
    pub fn state_table(&self) -> &StateTable {
        &self.table
    }

    /// Construction configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn run(&mut self, canonical: &CanonicalBuffer, normalized: bool) -> Result<Admission, Rejection> {
        let span = tracing::span!(
            Level::INFO,
            "engine.admit",
            origin = %canonical.origin_hash,
            canonical_len = canonical.len()
        );
        let _guard = span.enter();

        match self.recognize(canonical.as_bytes(), normalized) {
            Ok(admission) => {
                self.current_state = admission.final_state;
                self.last_cost = admission.cost;
                if admission.zone == GovernanceZone::Warning {
                    warn!(
                        cost = admission.cost,
                        final_state = admission.final_state,
                        "admission_warning_zone"
                    );
                }
                info!(
                    cost = admission.cost,
                    nodes = admission.ir.len(),
                    final_state = admission.final_state,
                    "admission_success"
                );
                Ok(admission)
            }
            Err(pending) => {
                self.current_state = REJECTED_STATE;
                self.last_cost = pending.cost;
                let mut partial = pending.partial;
                if let Some(state_id) = pending.mark_state {
                    // Mark the rejection point within the stream.
                    partial.push(IrNode {
                        kind: IrKind::ErrorCondition,
                        content: Vec::new(),
                        source_state: state_id,
                        cost: 0.0,
                    });
                }
                let rejection = Rejection {
                    kind: pending.kind,
                    position: pending.position,
                    cost: pending.cost,
                    partial,
                };
                warn!(position = pending.position, error = %rejection, "admission_rejected");
                Err(rejection)
            }
        }
    }

    /// The recognition loop proper. Pure with respect to the engine: all
    /// per-admission state lives in locals, and the caller commits the
    /// outcome to the engine afterwards.
    fn recognize(&self, bytes: &[u8], normalized: bool) -> Result<Admission, PendingRejection> {
        let mut acc = CostAccumulator::with_prelude(
            self.table.state_count(),
            self.table.transition_count(),
            self.config.zero_trust,
        );
        let mut current: u16 = 0;
        let mut ir = IrStream::new();
        let mut pos = 0usize;
        let mut skips = 0usize;
        // Span of the previous consuming match; zero-width validators
        // inspect it instead of the stream.
        let mut last_lexeme = 0usize..0usize;
        // Payload bound declared by the most recent framing lexeme.
        let mut declared_len: Option<usize> = None;

        if bytes.is_empty() {
            return Err(PendingRejection::halt(
                RejectionKind::InvalidInput,
                0,
                acc.total(),
                ir,
            ));
        }
        if self.config.zero_trust && !normalized {
            return Err(PendingRejection::halt(
                RejectionKind::Unnormalized,
                0,
                acc.total(),
                ir,
            ));
        }

        loop {
            let Some(state) = self.table.state(current) else {
                return Err(PendingRejection::marked(
                    RejectionKind::NoMatch,
                    pos,
                    acc.total(),
                    ir,
                    current,
                ));
            };

            if pos >= bytes.len() && state.is_accepting {
                return Ok(Admission {
                    ir,
                    cost: acc.total(),
                    zone: acc.zone(),
                    final_state: state.id,
                });
            }

            if state.transitions.is_empty() {
                // Trailing bytes past the end of the grammar, or the input
                // ran out in a non-accepting terminal state.
                return Err(PendingRejection::marked(
                    RejectionKind::NoMatch,
                    pos,
                    acc.total(),
                    ir,
                    current,
                ));
            }

            // Longest match wins; `state.transitions` is in registration
            // priority order with ascending target ids, so keeping the
            // first candidate at equal length settles both tie rules.
            let mut best: Option<(usize, usize)> = None;
            for &ti in &state.transitions {
                let transition = &self.table.transitions()[ti];
                if let Some(len) = self.evaluate(transition, bytes, pos, &last_lexeme, declared_len)
                {
                    if best.map_or(true, |(_, best_len)| len > best_len) {
                        best = Some((ti, len));
                    }
                }
            }

            let Some((ti, len)) = best else {
                // Error-recovery skip: advance one byte and try again, up
                // to the configured bound. Never skips past the input end.
                if pos < bytes.len() && skips < self.config.max_recovery_skips {
                    skips += 1;
                    warn!(position = pos, skips, "admission_soft_miss");
                    pos += 1;
                    continue;
                }
                return Err(PendingRejection::marked(
                    RejectionKind::NoMatch,
                    pos,
                    acc.total(),
                    ir,
                    current,
                ));
            };

            let transition = &self.table.transitions()[ti];
            let (target, zero_width, cost_weight, pattern_idx) = (
                transition.to,
                transition.zero_width,
                transition.cost_weight,
                transition.pattern as usize,
            );
            let pattern_kind = self.registry.patterns()[pattern_idx].kind;
            let pattern_requires_zt = self.registry.patterns()[pattern_idx].requires_zt;

            if pattern_requires_zt && !normalized {
                return Err(PendingRejection::halt(
                    RejectionKind::Unnormalized,
                    pos,
                    acc.total(),
                    ir,
                ));
            }

            let increment = acc.charge(cost_weight, len);
            if acc.exhausted() {
                let cost = acc.total();
                return Err(PendingRejection::halt(
                    RejectionKind::BudgetExceeded { cost },
                    pos,
                    cost,
                    ir,
                ));
            }

            let start = pos;
            if !zero_width {
                pos += len;
                last_lexeme = start..pos;
                if pattern_kind == PatternKind::PayloadDelimiter {
                    declared_len = parse_declared_len(&bytes[start..pos]);
                }
            }

            if let Some(kind) = IrKind::from_pattern(pattern_kind) {
                ir.push(IrNode {
                    kind,
                    content: bytes[start..pos].to_vec(),
                    source_state: target,
                    cost: increment,
                });
            }

            current = target;
            skips = 0;
        }
    }

    /// Match length of `transition` at `pos`, or `None` when its guard does
    /// not apply. Zero-width guards validate the previous lexeme and report
    /// a zero-byte match.
    fn evaluate(
        &self,
        transition: &Transition,
        bytes: &[u8],
        pos: usize,
        last_lexeme: &std::ops::Range<usize>,
        declared_len: Option<usize>,
    ) -> Option<usize> {
        let pattern = &self.registry.patterns()[transition.pattern as usize];

        if transition.zero_width {
            let lexeme = &bytes[last_lexeme.clone()];
            return pattern.matches_within(lexeme).then_some(0);
        }

        match transition.validator {
            TransitionValidator::DeclaredLength => match declared_len {
                Some(declared) => {
                    let remaining = bytes.len() - pos;
                    if remaining < declared {
                        return None;
                    }
                    let window = &bytes[pos..pos + declared];
                    (pattern.prefix_len(window) == Some(declared)).then_some(declared)
                }
                // No framing lexeme declared a bound; the pattern itself
                // delimits the payload (custom grammars).
                None => pattern.prefix_len(&bytes[pos..]),
            },
            TransitionValidator::TokenHex => {
                let len = pattern.prefix_len(&bytes[pos..])?;
                token_hex_ok(&bytes[pos..pos + len]).then_some(len)
            }
            _ => pattern.prefix_len(&bytes[pos..]),
        }
    }

    fn reject_empty(&mut self) -> Rejection {
        self.current_state = REJECTED_STATE;
        self.last_cost = 0.0;
        Rejection {
            kind: RejectionKind::InvalidInput,
            position: 0,
            cost: 0.0,
            partial: IrStream::new(),
        }
    }
}

/// Rejection data gathered by the recognition loop before the engine
/// commits it (parks in the sink, stamps the marker node, logs).
struct PendingRejection {
    kind: RejectionKind,
    position: usize,
    cost: f64,
    partial: IrStream,
    /// State to stamp on the `ErrorCondition` marker, when one is wanted.
    mark_state: Option<u16>,
}

impl PendingRejection {
    fn halt(kind: RejectionKind, position: usize, cost: f64, partial: IrStream) -> Self {
        Self {
            kind,
            position,
            cost,
            partial,
            mark_state: None,
        }
    }

    fn marked(
        kind: RejectionKind,
        position: usize,
        cost: f64,
        partial: IrStream,
        state_id: u16,
    ) -> Self {
        Self {
            kind,
            position,
            cost,
            partial,
            mark_state: Some(state_id),
        }
    }
}

/// Parse the payload bound out of a framing lexeme such as `payload|5|`:
/// the digit run between the first two pipes. Unparseable bounds leave the
/// payload pattern to delimit itself.
fn parse_declared_len(lexeme: &[u8]) -> Option<usize> {
    let mut pipes = lexeme.iter().enumerate().filter(|(_, b)| **b == b'|');
    let open = pipes.next()?.0;
    let close = pipes.next()?.0;
    std::str::from_utf8(&lexeme[open + 1..close])
        .ok()?
        .parse()
        .ok()
}

/// Re-validate a token lexeme as `sec:` plus exactly 64 canonical hex
/// digits. Lexemes of other shapes (custom token grammars) are left to
/// their own pattern.
fn token_hex_ok(lexeme: &[u8]) -> bool {
    match lexeme.strip_prefix(b"sec:") {
        Some(digits) => {
            digits.len() == 64
                && digits
                    .iter()
                    .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        }
        None => true,
    }
}
