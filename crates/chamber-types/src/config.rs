// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Solver Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{ChamberError, ChamberResult};

/// Tolerances and budgets for the adaptive integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Relative local error tolerance.
    /// Default: 1e-8.
    pub rtol: f64,

    /// Absolute local error tolerance.
    /// Default: 1e-10.
    pub atol: f64,

    /// Maximum attempted steps (accepted + rejected) per request.
    /// Default: 100_000.
    pub max_steps: u64,

    /// Initial step size. `None` selects one from the local derivative scale.
    pub first_step: Option<f64>,

    /// Minimum component value after log-safe clamping.
    /// Default: 1e-4.
    pub log_floor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-10,
            max_steps: 100_000,
            first_step: None,
            log_floor: 1e-4,
        }
    }
}

impl SolverConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> ChamberResult<()> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 || self.rtol >= 1.0 {
            return Err(ChamberError::Config(format!(
                "rtol must be in (0, 1), got {}",
                self.rtol
            )));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(ChamberError::Config(format!(
                "atol must be > 0, got {}",
                self.atol
            )));
        }
        if self.max_steps == 0 {
            return Err(ChamberError::Config("max_steps must be > 0".to_string()));
        }
        if let Some(h) = self.first_step {
            if !h.is_finite() || h <= 0.0 {
                return Err(ChamberError::Config(format!(
                    "first_step must be > 0, got {h}"
                )));
            }
        }
        if !self.log_floor.is_finite() || self.log_floor <= 0.0 {
            return Err(ChamberError::Config(format!(
                "log_floor must be > 0, got {}",
                self.log_floor
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ChamberResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ChamberError::Config(format!("JSON parse error: {e}")))
    }
}
