// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — State, Coefficient and Trajectory Types
// ─────────────────────────────────────────────────────────────────────

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{ChamberError, ChamberResult};

/// Range for α, ε, ζ.
pub const UNIT_RANGE: RangeInclusive<f64> = 0.0..=1.0;
/// Range for β, γ, δ, η.
pub const DOUBLE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
/// Widest initial-condition range any parameter source offers.
pub const INITIAL_STATE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
/// Upper bound on samples per request.
pub const MAX_SAMPLE_COUNT: usize = 1_000_000;

/// Ordered triple (U, E, A) at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVector {
    /// Understanding.
    pub u: f64,
    /// Echo-chamber intensity.
    pub e: f64,
    /// Foolish-participant intensity.
    pub a: f64,
}

impl StateVector {
    pub const fn new(u: f64, e: f64, a: f64) -> Self {
        Self { u, e, a }
    }

    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.u, self.e, self.a]
    }

    #[inline]
    pub fn from_array(y: [f64; 3]) -> Self {
        Self::new(y[0], y[1], y[2])
    }

    pub fn is_finite(&self) -> bool {
        self.u.is_finite() && self.e.is_finite() && self.a.is_finite()
    }

    pub fn scaled(self, k: f64) -> Self {
        Self::new(self.u * k, self.e * k, self.a * k)
    }

    /// Componentwise `max(x, floor)`. NaN components map to the floor.
    pub fn floored(self, floor: f64) -> Self {
        Self::new(self.u.max(floor), self.e.max(floor), self.a.max(floor))
    }

    pub fn min_component(&self) -> f64 {
        self.u.min(self.e).min(self.a)
    }

    /// Largest absolute componentwise difference.
    pub fn max_abs_diff(&self, other: &StateVector) -> f64 {
        (self.u - other.u)
            .abs()
            .max((self.e - other.e).abs())
            .max((self.a - other.a).abs())
    }
}

/// The seven linear-coupling constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSet {
    /// Autonomous growth rate of understanding.
    pub alpha: f64,
    /// Suppression of understanding by the echo chamber.
    pub beta: f64,
    /// Suppression of understanding by foolish participants.
    pub gamma: f64,
    /// Reinforcement of the echo chamber by foolish participants.
    pub delta: f64,
    /// Suppression of the echo chamber by understanding.
    pub epsilon: f64,
    /// Induction of foolish participants by the echo chamber.
    pub eta: f64,
    /// Suppression of foolish participants by understanding.
    pub zeta: f64,
}

impl Default for CoefficientSet {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.8,
            gamma: 0.6,
            delta: 0.7,
            epsilon: 0.4,
            eta: 0.5,
            zeta: 0.3,
        }
    }
}

impl CoefficientSet {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        alpha: f64,
        beta: f64,
        gamma: f64,
        delta: f64,
        epsilon: f64,
        eta: f64,
        zeta: f64,
    ) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            delta,
            epsilon,
            eta,
            zeta,
        }
    }

    /// Named coefficients with their admissible ranges.
    fn bounded(&self) -> [(&'static str, f64, RangeInclusive<f64>); 7] {
        [
            ("alpha", self.alpha, UNIT_RANGE),
            ("beta", self.beta, DOUBLE_RANGE),
            ("gamma", self.gamma, DOUBLE_RANGE),
            ("delta", self.delta, DOUBLE_RANGE),
            ("epsilon", self.epsilon, UNIT_RANGE),
            ("eta", self.eta, DOUBLE_RANGE),
            ("zeta", self.zeta, UNIT_RANGE),
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.bounded().iter().all(|(_, v, _)| v.is_finite())
    }

    /// Every coefficient multiplied by `k`.
    pub fn scaled(&self, k: f64) -> Self {
        Self::new(
            self.alpha * k,
            self.beta * k,
            self.gamma * k,
            self.delta * k,
            self.epsilon * k,
            self.eta * k,
            self.zeta * k,
        )
    }

    /// Check every coefficient is finite and inside its documented range.
    pub fn validate(&self) -> ChamberResult<()> {
        for (name, value, range) in self.bounded() {
            if !value.is_finite() {
                return Err(ChamberError::InvalidParameter(format!(
                    "{name} must be finite, got {value}"
                )));
            }
            if !range.contains(&value) {
                return Err(ChamberError::InvalidParameter(format!(
                    "{name} must be in [{}, {}], got {value}",
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }
}

/// Full input to one integration call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub coefficients: CoefficientSet,
    pub initial: StateVector,
    /// Horizon T; samples span [0, T].
    pub horizon: f64,
    pub sample_count: usize,
    /// Floor every output component for log-scale or size-encoded rendering.
    #[serde(default)]
    pub log_safe: bool,
}

impl SimulationRequest {
    pub fn new(
        coefficients: CoefficientSet,
        initial: StateVector,
        horizon: f64,
        sample_count: usize,
    ) -> Self {
        Self {
            coefficients,
            initial,
            horizon,
            sample_count,
            log_safe: false,
        }
    }

    pub fn with_log_safe(mut self, log_safe: bool) -> Self {
        self.log_safe = log_safe;
        self
    }

    /// Reject out-of-range or non-finite inputs before integrating.
    pub fn validate(&self) -> ChamberResult<()> {
        self.coefficients.validate()?;
        for (name, value) in [
            ("U0", self.initial.u),
            ("E0", self.initial.e),
            ("A0", self.initial.a),
        ] {
            if !value.is_finite() || !INITIAL_STATE_RANGE.contains(&value) {
                return Err(ChamberError::InvalidParameter(format!(
                    "{name} must be in [{}, {}], got {value}",
                    INITIAL_STATE_RANGE.start(),
                    INITIAL_STATE_RANGE.end()
                )));
            }
        }
        validate_horizon(self.horizon)?;
        validate_sample_count(self.sample_count)
    }
}

pub fn validate_horizon(horizon: f64) -> ChamberResult<()> {
    if !horizon.is_finite() || horizon <= 0.0 {
        return Err(ChamberError::InvalidParameter(format!(
            "horizon must be finite and > 0, got {horizon}"
        )));
    }
    Ok(())
}

pub fn validate_sample_count(sample_count: usize) -> ChamberResult<()> {
    if !(2..=MAX_SAMPLE_COUNT).contains(&sample_count) {
        return Err(ChamberError::InvalidParameter(format!(
            "sample_count must be in [2, {MAX_SAMPLE_COUNT}], got {sample_count}"
        )));
    }
    Ok(())
}

/// One (t, state) point of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,
    pub state: StateVector,
}

/// Solver work counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub accepted_steps: u64,
    pub rejected_steps: u64,
    pub evaluations: u64,
}

/// Time-ordered solution samples for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    samples: Vec<Sample>,
    stats: IntegrationStats,
    complete: bool,
}

impl Trajectory {
    /// Trajectory covering the whole requested horizon.
    pub fn complete(samples: Vec<Sample>, stats: IntegrationStats) -> Self {
        Self {
            samples,
            stats,
            complete: true,
        }
    }

    /// Trajectory cut short by a solver failure.
    pub fn partial(samples: Vec<Sample>, stats: IntegrationStats) -> Self {
        Self {
            samples,
            stats,
            complete: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn stats(&self) -> IntegrationStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    pub fn states(&self) -> Vec<StateVector> {
        self.samples.iter().map(|s| s.state).collect()
    }

    /// Apply `f` to every state, keeping times, stats and completeness.
    pub fn map_states(&self, mut f: impl FnMut(StateVector) -> StateVector) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .map(|s| Sample {
                    t: s.t,
                    state: f(s.state),
                })
                .collect(),
            stats: self.stats,
            complete: self.complete,
        }
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
