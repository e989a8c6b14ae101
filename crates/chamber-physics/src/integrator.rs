// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Adaptive Trajectory Integrator
// ─────────────────────────────────────────────────────────────────────
//! Embedded Dormand–Prince 5(4) integrator with FSAL and local error
//! control.
//!
//! Each accepted step is propagated with the 5th-order solution; the
//! difference to the embedded 4th-order solution drives step-size control:
//!
//!   err = RMS_i( e_i / (atol + rtol · max(|y_i|, |ŷ_i|)) )
//!   h_new = h · clamp(0.9 · err^(-1/5), 0.2, 10)
//!
//! Output samples sit on a uniform grid over [0, T]. Steps are clipped so
//! the solver lands on every grid point exactly; the unclipped step size is
//! carried forward so the grid does not throttle the solver.

use chamber_types::state::{validate_horizon, validate_sample_count};
use chamber_types::{
    ChamberError, ChamberResult, IntegrationStats, Sample, SolverConfig, StateVector, Trajectory,
};

use crate::model::OdeSystem;

type Vec3 = [f64; 3];

// Butcher tableau (Dormand & Prince, 1980).
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (also row 7 of A, hence FSAL).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 5th minus embedded 4th-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

/// Smallest step that still advances `t` meaningfully. Near the origin the
/// floor follows the horizon so very short runs stay solvable.
#[inline]
fn min_step(t: f64, horizon: f64) -> f64 {
    16.0 * f64::EPSILON * t.abs().max(horizon.min(1.0))
}

/// `y + h · Σ w_j k_j`.
#[inline]
fn combine(y: &Vec3, h: f64, terms: &[(f64, &Vec3)]) -> Vec3 {
    let mut out = *y;
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for &(w, k) in terms {
            acc += w * k[i];
        }
        *o += h * acc;
    }
    out
}

/// Result of one trial step.
struct Trial {
    y: Vec3,
    f: Vec3,
    err: f64,
}

/// Dormand–Prince 5(4) integrator configured by a [`SolverConfig`].
#[derive(Debug, Clone, Default)]
pub struct DormandPrince {
    config: SolverConfig,
}

impl DormandPrince {
    /// Build an integrator after validating `config`.
    pub fn new(config: SolverConfig) -> ChamberResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the initial-value problem on [0, `horizon`] and return
    /// `sample_count` uniformly spaced samples including both endpoints.
    ///
    /// On failure the error carries every sample produced so far as an
    /// incomplete trajectory, plus the last time the solver reached.
    pub fn integrate<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        initial: StateVector,
        horizon: f64,
        sample_count: usize,
    ) -> ChamberResult<Trajectory> {
        if !initial.is_finite() {
            return Err(ChamberError::InvalidParameter(format!(
                "initial state must be finite, got {initial:?}"
            )));
        }
        validate_horizon(horizon)?;
        validate_sample_count(sample_count)?;

        let mut stats = IntegrationStats::default();
        let mut samples = Vec::with_capacity(sample_count);
        samples.push(Sample {
            t: 0.0,
            state: initial,
        });

        let mut t = 0.0;
        let mut y = initial.to_array();
        let mut f = self.eval(system, t, &y, &mut stats);
        let mut h = match self.config.first_step {
            Some(h0) => h0.min(horizon),
            None => self.initial_step(system, &y, &f, horizon, &mut stats),
        };
        let mut rejected_last = false;
        let mut diverged = false;
        let last = (sample_count - 1) as f64;

        for i in 1..sample_count {
            let t_target = if i == sample_count - 1 {
                horizon
            } else {
                horizon * (i as f64 / last)
            };

            while t < t_target {
                if stats.accepted_steps + stats.rejected_steps >= self.config.max_steps {
                    let reason = format!("step budget of {} exhausted", self.config.max_steps);
                    return Err(Self::fail(t, reason, samples, stats));
                }

                if h < min_step(t, horizon) {
                    let reason = if diverged {
                        "state diverged to non-finite values".to_string()
                    } else {
                        format!("step size underflow (h = {h:e})")
                    };
                    return Err(Self::fail(t, reason, samples, stats));
                }

                let remaining = t_target - t;
                let clipped = h >= remaining;
                let step = if clipped { remaining } else { h };

                let trial = self.attempt(system, t, &y, &f, step, &mut stats);
                let finite = trial.err.is_finite() && trial.y.iter().all(|v| v.is_finite());

                if finite && trial.err <= 1.0 {
                    stats.accepted_steps += 1;
                    t = if clipped { t_target } else { t + step };
                    y = trial.y;
                    f = trial.f;

                    let mut factor = if trial.err == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * trial.err.powf(ERROR_EXPONENT)).clamp(MIN_FACTOR, MAX_FACTOR)
                    };
                    if rejected_last {
                        factor = factor.min(1.0);
                    }
                    rejected_last = false;
                    diverged = false;

                    let proposed = step * factor;
                    h = if clipped { h.max(proposed) } else { proposed };
                    h = h.min(horizon);
                } else {
                    stats.rejected_steps += 1;
                    rejected_last = true;

                    let factor = if finite {
                        (SAFETY * trial.err.powf(ERROR_EXPONENT)).max(MIN_FACTOR)
                    } else {
                        MIN_FACTOR
                    };
                    diverged = !finite;
                    h = step * factor;
                }
            }

            samples.push(Sample {
                t: t_target,
                state: StateVector::from_array(y),
            });
        }

        log::debug!(
            "integrated [0, {horizon}] into {sample_count} samples: {} accepted, {} rejected, {} evaluations",
            stats.accepted_steps,
            stats.rejected_steps,
            stats.evaluations
        );
        Ok(Trajectory::complete(samples, stats))
    }

    fn fail(
        t_reached: f64,
        reason: String,
        samples: Vec<Sample>,
        stats: IntegrationStats,
    ) -> ChamberError {
        log::error!(
            "integration stopped at t = {t_reached} after {} samples: {reason}",
            samples.len()
        );
        ChamberError::IntegrationFailure {
            t_reached,
            reason,
            partial: Trajectory::partial(samples, stats),
        }
    }

    #[inline]
    fn eval<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        y: &Vec3,
        stats: &mut IntegrationStats,
    ) -> Vec3 {
        stats.evaluations += 1;
        system
            .derivative(t, &StateVector::from_array(*y))
            .to_array()
    }

    /// Weighted RMS norm against the mixed tolerance scale.
    fn error_norm(&self, err: &Vec3, y: &Vec3, y_new: &Vec3) -> f64 {
        let sum: f64 = (0..3)
            .map(|i| {
                let scale = self.config.atol + self.config.rtol * y[i].abs().max(y_new[i].abs());
                (err[i] / scale).powi(2)
            })
            .sum();
        (sum / 3.0).sqrt()
    }

    /// One Dormand–Prince trial step of size `h` from (t, y) with f = y'(t).
    fn attempt<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        y: &Vec3,
        k1: &Vec3,
        h: f64,
        stats: &mut IntegrationStats,
    ) -> Trial {
        let k2 = self.eval(system, t + C2 * h, &combine(y, h, &[(A21, k1)]), stats);
        let k3 = self.eval(
            system,
            t + C3 * h,
            &combine(y, h, &[(A31, k1), (A32, &k2)]),
            stats,
        );
        let k4 = self.eval(
            system,
            t + C4 * h,
            &combine(y, h, &[(A41, k1), (A42, &k2), (A43, &k3)]),
            stats,
        );
        let k5 = self.eval(
            system,
            t + C5 * h,
            &combine(y, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
            stats,
        );
        let k6 = self.eval(
            system,
            t + h,
            &combine(
                y,
                h,
                &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
            ),
            stats,
        );
        let y_new = combine(
            y,
            h,
            &[(B1, k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
        );
        let k7 = self.eval(system, t + h, &y_new, stats);

        let err_vec = combine(
            &[0.0; 3],
            h,
            &[
                (E1, k1),
                (E3, &k3),
                (E4, &k4),
                (E5, &k5),
                (E6, &k6),
                (E7, &k7),
            ],
        );
        Trial {
            err: self.error_norm(&err_vec, y, &y_new),
            y: y_new,
            f: k7,
        }
    }

    /// Starting step from the local derivative scale (Hairer, Nørsett & Wanner
    /// §II.4), capped at the horizon.
    fn initial_step<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        y0: &Vec3,
        f0: &Vec3,
        horizon: f64,
        stats: &mut IntegrationStats,
    ) -> f64 {
        let scale: Vec3 = std::array::from_fn(|i| self.config.atol + self.config.rtol * y0[i].abs());
        let rms = |v: &Vec3| -> f64 {
            ((0..3).map(|i| (v[i] / scale[i]).powi(2)).sum::<f64>() / 3.0).sqrt()
        };

        let d0 = rms(y0);
        let d1 = rms(f0);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };

        let y1 = combine(y0, h0, &[(1.0, f0)]);
        let f1 = self.eval(system, h0, &y1, stats);
        let df: Vec3 = std::array::from_fn(|i| f1[i] - f0[i]);
        let d2 = rms(&df) / h0;

        let h1 = if d1.max(d2) <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };
        (100.0 * h0).min(h1).min(horizon)
    }
}

/// Integrate with the default [`SolverConfig`].
pub fn integrate<S: OdeSystem + ?Sized>(
    system: &S,
    initial: StateVector,
    horizon: f64,
    sample_count: usize,
) -> ChamberResult<Trajectory> {
    DormandPrince::default().integrate(system, initial, horizon, sample_count)
}
