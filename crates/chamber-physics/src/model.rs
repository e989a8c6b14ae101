// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Model Evaluator
// ─────────────────────────────────────────────────────────────────────
//! Linear cross-coupling of understanding U, echo-chamber intensity E and
//! foolish-participant intensity A:
//!
//!   dU/dt = α − β·E − γ·A
//!   dE/dt = δ·A − ε·U
//!   dA/dt = η·E − ζ·U
//!
//! Time-invariant; `t` is accepted only because the integrator passes it.

use chamber_types::{CoefficientSet, StateVector};

/// Right-hand side of an autonomous or non-autonomous ODE in (U, E, A).
pub trait OdeSystem {
    fn derivative(&self, t: f64, state: &StateVector) -> StateVector;
}

impl<F> OdeSystem for F
where
    F: Fn(f64, &StateVector) -> StateVector,
{
    #[inline]
    fn derivative(&self, t: f64, state: &StateVector) -> StateVector {
        self(t, state)
    }
}

/// Instantaneous derivative of the three-quantity model.
#[inline]
pub fn derivative(_t: f64, state: &StateVector, c: &CoefficientSet) -> StateVector {
    let StateVector { u, e, a } = *state;
    StateVector {
        u: c.alpha - c.beta * e - c.gamma * a,
        e: c.delta * a - c.epsilon * u,
        a: c.eta * e - c.zeta * u,
    }
}

/// The model closed over one coefficient set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChamberModel {
    pub coefficients: CoefficientSet,
}

impl ChamberModel {
    pub fn new(coefficients: CoefficientSet) -> Self {
        Self { coefficients }
    }
}

impl OdeSystem for ChamberModel {
    #[inline]
    fn derivative(&self, t: f64, state: &StateVector) -> StateVector {
        derivative(t, state, &self.coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coeffs() -> CoefficientSet {
        CoefficientSet::new(0.6, 0.3, 0.4, 0.7, 0.4, 0.6, 0.5)
    }

    #[test]
    fn test_derivative_matches_closed_form() {
        let s = StateVector::new(0.5, 0.6, 0.6);
        let d = derivative(0.0, &s, &coeffs());
        assert!((d.u - (0.6 - 0.3 * 0.6 - 0.4 * 0.6)).abs() < 1e-15);
        assert!((d.e - (0.7 * 0.6 - 0.4 * 0.5)).abs() < 1e-15);
        assert!((d.a - (0.6 * 0.6 - 0.5 * 0.5)).abs() < 1e-15);
    }

    #[test]
    fn test_origin_only_alpha_drives() {
        let d = derivative(0.0, &StateVector::default(), &coeffs());
        assert_eq!(d, StateVector::new(0.6, 0.0, 0.0));
    }

    #[test]
    fn test_time_invariant() {
        let s = StateVector::new(1.2, 0.1, 1.9);
        let m = ChamberModel::new(coeffs());
        assert_eq!(m.derivative(0.0, &s), m.derivative(123.4, &s));
    }

    #[test]
    fn test_sign_of_each_coupling() {
        // Each term isolated: only one coefficient non-zero at a time.
        let s = StateVector::new(1.0, 1.0, 1.0);
        let zero = CoefficientSet::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let only = |f: fn(&mut CoefficientSet)| {
            let mut c = zero;
            f(&mut c);
            derivative(0.0, &s, &c)
        };
        assert_eq!(only(|c| c.beta = 1.0), StateVector::new(-1.0, 0.0, 0.0));
        assert_eq!(only(|c| c.gamma = 1.0), StateVector::new(-1.0, 0.0, 0.0));
        assert_eq!(only(|c| c.delta = 1.0), StateVector::new(0.0, 1.0, 0.0));
        assert_eq!(only(|c| c.epsilon = 1.0), StateVector::new(0.0, -1.0, 0.0));
        assert_eq!(only(|c| c.eta = 1.0), StateVector::new(0.0, 0.0, 1.0));
        assert_eq!(only(|c| c.zeta = 1.0), StateVector::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_closure_is_ode_system() {
        let f = |_t: f64, s: &StateVector| s.scaled(-1.0);
        let d = f.derivative(0.0, &StateVector::new(1.0, 2.0, 3.0));
        assert_eq!(d, StateVector::new(-1.0, -2.0, -3.0));
    }
}
