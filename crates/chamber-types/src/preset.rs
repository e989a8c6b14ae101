// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Rendering Presets
// ─────────────────────────────────────────────────────────────────────
//! Named starting points for the parameter source. Every preset drives the
//! same dynamics; they differ only in defaults and how output is drawn.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChamberError;
use crate::state::{CoefficientSet, SimulationRequest, StateVector};

/// Sample count for static time-series charts.
pub const CHART_SAMPLES: usize = 500;
/// Sample count for animated phase-plane scatters.
pub const ANIMATION_SAMPLES: usize = 200;
/// Default horizon for every preset.
pub const DEFAULT_HORIZON: f64 = 50.0;

/// How the rendering collaborator draws a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderMode {
    /// U, E, A against t.
    TimeSeries { log_scale: bool },
    /// U on x, E on y, A as marker size, one frame per sample.
    PhaseScatter { log_scale: bool },
}

impl RenderMode {
    pub fn log_scale(&self) -> bool {
        match *self {
            RenderMode::TimeSeries { log_scale } | RenderMode::PhaseScatter { log_scale } => {
                log_scale
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    TimeSeries,
    LogTimeSeries,
    PhaseScatter,
    LogPhaseScatter,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::TimeSeries,
        Preset::LogTimeSeries,
        Preset::PhaseScatter,
        Preset::LogPhaseScatter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::TimeSeries => "time_series",
            Preset::LogTimeSeries => "log_time_series",
            Preset::PhaseScatter => "phase_scatter",
            Preset::LogPhaseScatter => "log_phase_scatter",
        }
    }

    pub fn render_mode(&self) -> RenderMode {
        match self {
            Preset::TimeSeries => RenderMode::TimeSeries { log_scale: false },
            Preset::LogTimeSeries => RenderMode::TimeSeries { log_scale: true },
            Preset::PhaseScatter => RenderMode::PhaseScatter { log_scale: false },
            Preset::LogPhaseScatter => RenderMode::PhaseScatter { log_scale: true },
        }
    }

    pub fn coefficients(&self) -> CoefficientSet {
        match self {
            Preset::TimeSeries | Preset::LogTimeSeries => CoefficientSet::default(),
            Preset::PhaseScatter | Preset::LogPhaseScatter => {
                CoefficientSet::new(0.6, 0.3, 0.4, 0.7, 0.4, 0.6, 0.5)
            }
        }
    }

    pub fn initial_state(&self) -> StateVector {
        match self {
            Preset::TimeSeries | Preset::LogTimeSeries => StateVector::new(0.3, 0.6, 0.5),
            Preset::PhaseScatter | Preset::LogPhaseScatter => StateVector::new(0.5, 0.6, 0.6),
        }
    }

    pub fn sample_count(&self) -> usize {
        match self {
            Preset::TimeSeries | Preset::LogTimeSeries => CHART_SAMPLES,
            Preset::PhaseScatter | Preset::LogPhaseScatter => ANIMATION_SAMPLES,
        }
    }

    /// Default request for this preset. Only log-scale presets ask for
    /// floored output; marker sizes are floored when frames are built.
    pub fn request(&self) -> SimulationRequest {
        let log_safe = self.render_mode().log_scale();
        SimulationRequest::new(
            self.coefficients(),
            self.initial_state(),
            DEFAULT_HORIZON,
            self.sample_count(),
        )
        .with_log_safe(log_safe)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ChamberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ChamberError::Config(format!("unknown preset: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_valid() {
        for p in Preset::ALL {
            assert!(p.request().validate().is_ok(), "{p} invalid");
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for p in Preset::ALL {
            assert_eq!(p.name().parse::<Preset>().unwrap(), p);
        }
        assert!("bogus".parse::<Preset>().is_err());
    }

    #[test]
    fn test_sample_counts() {
        assert_eq!(Preset::TimeSeries.request().sample_count, 500);
        assert_eq!(Preset::PhaseScatter.request().sample_count, 200);
    }

    #[test]
    fn test_log_safe_flags() {
        assert!(!Preset::TimeSeries.request().log_safe);
        assert!(Preset::LogTimeSeries.request().log_safe);
        assert!(!Preset::PhaseScatter.request().log_safe);
        assert!(Preset::LogPhaseScatter.request().log_safe);
        for p in Preset::ALL {
            assert_eq!(p.request().log_safe, p.render_mode().log_scale(), "{p}");
        }
    }

    #[test]
    fn test_presets_share_dynamics_shape() {
        assert_eq!(
            Preset::TimeSeries.coefficients(),
            Preset::LogTimeSeries.coefficients()
        );
        assert_eq!(
            Preset::PhaseScatter.coefficients(),
            Preset::LogPhaseScatter.coefficients()
        );
    }
}
