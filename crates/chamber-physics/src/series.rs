// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Render Series
// ─────────────────────────────────────────────────────────────────────
//! Post-processing that turns a trajectory into what a rendering sink
//! draws: log-safe flooring, time-series columns, and phase-plane scatter
//! frames (U on x, E on y, A as marker size).

use serde::{Deserialize, Serialize};

use chamber_types::{RenderMode, Trajectory};

/// Floor every component of every state to at least `floor`.
///
/// A rendering accommodation only: the dynamics never see floored values.
pub fn floor_for_log(trajectory: &Trajectory, floor: f64) -> Trajectory {
    let clamped = trajectory
        .iter()
        .filter(|s| !s.state.is_finite() || s.state.min_component() < floor)
        .count();
    if clamped > 0 {
        log::warn!(
            "floor_for_log: {clamped}/{} samples raised to floor {floor:e}",
            trajectory.len()
        );
    }
    trajectory.map_states(|s| s.floored(floor))
}

/// Three curves of U, E, A against t.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub t: Vec<f64>,
    pub u: Vec<f64>,
    pub e: Vec<f64>,
    pub a: Vec<f64>,
    pub log_scale: bool,
}

impl TimeSeries {
    /// Column vectors of `trajectory`. With `log_scale`, values below
    /// `floor` are raised to it so every point is drawable on a log axis.
    pub fn from_trajectory(trajectory: &Trajectory, log_scale: bool, floor: f64) -> Self {
        let n = trajectory.len();
        let mut out = Self {
            t: Vec::with_capacity(n),
            u: Vec::with_capacity(n),
            e: Vec::with_capacity(n),
            a: Vec::with_capacity(n),
            log_scale,
        };
        for s in trajectory {
            let state = if log_scale {
                s.state.floored(floor)
            } else {
                s.state
            };
            out.t.push(s.t);
            out.u.push(state.u);
            out.e.push(state.e);
            out.a.push(state.a);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// One animation frame of the phase-plane scatter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterFrame {
    pub index: usize,
    pub t: f64,
    /// Understanding.
    pub x: f64,
    /// Echo-chamber intensity.
    pub y: f64,
    /// Foolish-participant intensity, floored and scaled to a marker size.
    pub size: f64,
}

/// Axis extents covering every frame, so the animation keeps fixed axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterFrames {
    pub frames: Vec<ScatterFrame>,
    pub log_scale: bool,
}

impl ScatterFrames {
    /// One frame per sample. Marker size is `max(A, floor) · size_scale`, so
    /// it stays positive even when A crosses zero.
    pub fn from_trajectory(
        trajectory: &Trajectory,
        size_scale: f64,
        floor: f64,
        log_scale: bool,
    ) -> Self {
        let frames = trajectory
            .iter()
            .enumerate()
            .map(|(index, s)| {
                let state = if log_scale {
                    s.state.floored(floor)
                } else {
                    s.state
                };
                ScatterFrame {
                    index,
                    t: s.t,
                    x: state.u,
                    y: state.e,
                    size: s.state.a.max(floor) * size_scale,
                }
            })
            .collect();
        Self { frames, log_scale }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `None` when there are no frames.
    pub fn bounds(&self) -> Option<FrameBounds> {
        let first = self.frames.first()?;
        let init = FrameBounds {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        Some(self.frames.iter().fold(init, |b, f| FrameBounds {
            x_min: b.x_min.min(f.x),
            x_max: b.x_max.max(f.x),
            y_min: b.y_min.min(f.y),
            y_max: b.y_max.max(f.y),
        }))
    }
}

/// Render-ready output for either mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderSeries {
    TimeSeries(TimeSeries),
    PhaseScatter(ScatterFrames),
}

impl RenderSeries {
    pub fn build(trajectory: &Trajectory, mode: RenderMode, size_scale: f64, floor: f64) -> Self {
        match mode {
            RenderMode::TimeSeries { log_scale } => {
                RenderSeries::TimeSeries(TimeSeries::from_trajectory(trajectory, log_scale, floor))
            }
            RenderMode::PhaseScatter { log_scale } => RenderSeries::PhaseScatter(
                ScatterFrames::from_trajectory(trajectory, size_scale, floor, log_scale),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_types::{IntegrationStats, Sample, StateVector};

    fn traj() -> Trajectory {
        Trajectory::complete(
            vec![
                Sample {
                    t: 0.0,
                    state: StateVector::new(0.5, 0.6, 0.6),
                },
                Sample {
                    t: 1.0,
                    state: StateVector::new(-0.2, 1.4, 0.0),
                },
                Sample {
                    t: 2.0,
                    state: StateVector::new(0.9, 1e-7, -3.0),
                },
            ],
            IntegrationStats::default(),
        )
    }

    #[test]
    fn test_floor_for_log() {
        let floored = floor_for_log(&traj(), 1e-4);
        assert_eq!(floored.len(), 3);
        assert!(floored.iter().all(|s| s.state.min_component() >= 1e-4));
        assert_eq!(floored.samples()[0].state, StateVector::new(0.5, 0.6, 0.6));
        assert_eq!(floored.times(), traj().times());
    }

    #[test]
    fn test_floor_keeps_partial_flag() {
        let partial = Trajectory::partial(traj().samples().to_vec(), IntegrationStats::default());
        assert!(!floor_for_log(&partial, 1e-4).is_complete());
    }

    #[test]
    fn test_time_series_linear_keeps_negatives() {
        let ts = TimeSeries::from_trajectory(&traj(), false, 1e-4);
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.u[1], -0.2);
        assert_eq!(ts.a[2], -3.0);
    }

    #[test]
    fn test_time_series_log_floors() {
        let ts = TimeSeries::from_trajectory(&traj(), true, 1e-4);
        assert!(ts.log_scale);
        assert!(ts.u.iter().chain(&ts.e).chain(&ts.a).all(|&v| v >= 1e-4));
    }

    #[test]
    fn test_scatter_axes_and_size() {
        let frames = ScatterFrames::from_trajectory(&traj(), 100.0, 1e-4, false);
        assert_eq!(frames.len(), 3);
        let f0 = frames.frames[0];
        assert_eq!((f0.index, f0.t, f0.x, f0.y), (0, 0.0, 0.5, 0.6));
        assert!((f0.size - 60.0).abs() < 1e-12);
        assert!((frames.frames[2].size - 1e-2).abs() < 1e-15);
        assert!(frames.frames.iter().all(|f| f.size > 0.0));
    }

    #[test]
    fn test_scatter_bounds() {
        let b = ScatterFrames::from_trajectory(&traj(), 1.0, 1e-4, false)
            .bounds()
            .unwrap();
        assert_eq!(b.x_min, -0.2);
        assert_eq!(b.x_max, 0.9);
        assert_eq!(b.y_min, 1e-7);
        assert_eq!(b.y_max, 1.4);
    }

    #[test]
    fn test_scatter_bounds_follow_log_scale() {
        let linear = ScatterFrames::from_trajectory(&traj(), 1.0, 1e-4, false)
            .bounds()
            .unwrap();
        let log = ScatterFrames::from_trajectory(&traj(), 1.0, 1e-4, true)
            .bounds()
            .unwrap();
        assert_eq!(linear.x_min, -0.2);
        assert_eq!(log.x_min, 1e-4);
        assert_eq!(log.y_min, 1e-4);
        assert_eq!((log.x_max, log.y_max), (linear.x_max, linear.y_max));
    }

    #[test]
    fn test_empty_bounds() {
        let empty = Trajectory::complete(Vec::new(), IntegrationStats::default());
        assert!(ScatterFrames::from_trajectory(&empty, 1.0, 1e-4, false)
            .bounds()
            .is_none());
    }

    #[test]
    fn test_render_series_dispatch() {
        let ts = RenderSeries::build(&traj(), RenderMode::TimeSeries { log_scale: true }, 1.0, 1e-4);
        assert!(matches!(ts, RenderSeries::TimeSeries(ref s) if s.log_scale));
        let sc = RenderSeries::build(&traj(), RenderMode::PhaseScatter { log_scale: false }, 1.0, 1e-4);
        assert!(matches!(sc, RenderSeries::PhaseScatter(ref f) if f.len() == 3));
    }
}
