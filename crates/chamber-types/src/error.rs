// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

use crate::state::Trajectory;

/// Root error type for all kernel failures.
#[derive(Error, Debug, Clone)]
pub enum ChamberError {
    /// Coefficient, initial condition, horizon or sample count out of range
    /// or non-finite.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Solver could not cover the full horizon. `partial` holds every sample
    /// produced before the stop and is flagged incomplete.
    #[error("integration failed at t = {t_reached}: {reason}")]
    IntegrationFailure {
        t_reached: f64,
        reason: String,
        partial: Trajectory,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl ChamberError {
    /// The samples computed before an integration failure, if any.
    pub fn partial_trajectory(&self) -> Option<&Trajectory> {
        match self {
            ChamberError::IntegrationFailure { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

pub type ChamberResult<T> = Result<T, ChamberError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::IntegrationStats;

    #[test]
    fn test_failure_message_names_time() {
        let err = ChamberError::IntegrationFailure {
            t_reached: 12.5,
            reason: "step budget exhausted".into(),
            partial: Trajectory::partial(Vec::new(), IntegrationStats::default()),
        };
        let msg = err.to_string();
        assert!(msg.contains("12.5"), "{msg}");
        assert!(msg.contains("step budget"), "{msg}");
        assert!(err.partial_trajectory().is_some());
    }

    #[test]
    fn test_invalid_parameter_has_no_partial() {
        let err = ChamberError::InvalidParameter("alpha".into());
        assert!(err.partial_trajectory().is_none());
    }
}
