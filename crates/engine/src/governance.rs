//! Sinphase governance-cost accounting.
//!
//! Every admission carries a monotone cost accumulator. Construction of the
//! state table charges a structural prelude (scaled by state and transition
//! counts, plus a zero-trust surcharge), and every transition charges its
//! pattern's weight plus a per-byte term for the matched lexeme. Match
//! length is metered in hundreds of bytes so the full canonical buffer
//! bound maps onto the governance scale.
//!
//! The accumulated cost is compared against two thresholds: up to
//! [`COST_THRESHOLD`] the admission proceeds silently, between the
//! thresholds it proceeds with a warning, and past [`WARNING_THRESHOLD`]
//! the admission is rejected mid-flight. This bounds the worst-case work an
//! adversarial, pattern-heavy input can extract from the engine.

use serde::{Deserialize, Serialize};

/// Upper edge of the autonomous zone.
pub const COST_THRESHOLD: f64 = 0.5;

/// Upper edge of the warning zone; costs beyond this reject.
pub const WARNING_THRESHOLD: f64 = 0.6;

/// Per-state structural prelude factor.
const STATE_PRELUDE: f64 = 0.01;

/// Per-transition structural prelude factor.
const TRANSITION_PRELUDE: f64 = 0.005;

/// Flat surcharge when zero-trust enforcement is on.
const ZT_PRELUDE: f64 = 0.05;

/// Per-byte match term: 0.1 per hundred matched bytes.
const MATCH_LENGTH_FACTOR: f64 = 0.1 / 100.0;

/// Zone the accumulated cost currently falls in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceZone {
    /// Cost <= 0.5: admission permitted silently.
    Autonomous,
    /// 0.5 < cost <= 0.6: admission permitted, flagged for observability.
    Warning,
    /// Cost > 0.6: admission rejected.
    Governance,
}

/// Monotone per-admission cost counter.
#[derive(Debug, Clone, Default)]
pub struct CostAccumulator {
    total: f64,
}

impl CostAccumulator {
    /// A zeroed accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// An accumulator pre-charged with the structural prelude for a table
    /// of the given size.
    pub fn with_prelude(state_count: usize, transition_count: usize, zero_trust: bool) -> Self {
        let mut total = STATE_PRELUDE * state_count as f64
            + TRANSITION_PRELUDE * transition_count as f64;
        if zero_trust {
            total += ZT_PRELUDE;
        }
        Self { total }
    }

    /// Charge one transition: its weight plus the match-length term.
    /// Returns the increment, which the emitted IR node records.
    pub fn charge(&mut self, cost_weight: f64, match_len: usize) -> f64 {
        let increment = transition_cost(cost_weight, match_len);
        self.total += increment;
        increment
    }

    /// Accumulated cost so far.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Zone the current total falls in.
    pub fn zone(&self) -> GovernanceZone {
        if self.total <= COST_THRESHOLD {
            GovernanceZone::Autonomous
        } else if self.total <= WARNING_THRESHOLD {
            GovernanceZone::Warning
        } else {
            GovernanceZone::Governance
        }
    }

    /// True when the total has crossed into the governance zone.
    pub fn exhausted(&self) -> bool {
        self.total > WARNING_THRESHOLD
    }
}

/// Cost of one transition with the given weight and matched length.
pub fn transition_cost(cost_weight: f64, match_len: usize) -> f64 {
    cost_weight + MATCH_LENGTH_FACTOR * match_len as f64
}
