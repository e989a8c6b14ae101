// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Trajectory Property Tests
// ─────────────────────────────────────────────────────────────────────
//! Properties that must hold for every admissible request, checked over
//! seeded random coefficient sets and initial states.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use chamber_physics::{integrate, simulate, ChamberModel, SimulationEngine};
use chamber_types::{
    CoefficientSet, SimulationRequest, SolverConfig, StateVector, Trajectory,
};

const CASES: usize = 24;

fn random_coefficients(rng: &mut StdRng) -> CoefficientSet {
    CoefficientSet::new(
        rng.gen_range(0.0..=1.0),
        rng.gen_range(0.0..=2.0),
        rng.gen_range(0.0..=2.0),
        rng.gen_range(0.0..=2.0),
        rng.gen_range(0.0..=1.0),
        rng.gen_range(0.0..=2.0),
        rng.gen_range(0.0..=1.0),
    )
}

fn random_state(rng: &mut StdRng) -> StateVector {
    StateVector::new(
        rng.gen_range(0.0..=2.0),
        rng.gen_range(0.0..=2.0),
        rng.gen_range(0.0..=2.0),
    )
}

fn random_request(rng: &mut StdRng) -> SimulationRequest {
    SimulationRequest::new(
        random_coefficients(rng),
        random_state(rng),
        rng.gen_range(1.0..=20.0),
        rng.gen_range(2..=300),
    )
}

fn magnitude(s: &StateVector) -> f64 {
    s.u.abs().max(s.e.abs()).max(s.a.abs()).max(1.0)
}

/// Max over samples of |a − b| relative to the size of `b`.
fn max_rel_diff(a: &Trajectory, b: &Trajectory) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.state.max_abs_diff(&y.state) / magnitude(&y.state))
        .fold(0.0, f64::max)
}

#[test]
fn first_sample_is_initial_state() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..CASES {
        let r = random_request(&mut rng);
        let traj = simulate(&r, &SolverConfig::default()).unwrap();
        let first = traj.first().unwrap();
        assert_eq!(first.t, 0.0);
        assert!(first.state.max_abs_diff(&r.initial) < 1e-6);
    }
}

#[test]
fn length_and_time_grid() {
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..CASES {
        let r = random_request(&mut rng);
        let traj = simulate(&r, &SolverConfig::default()).unwrap();
        assert!(traj.is_complete());
        assert_eq!(traj.len(), r.sample_count);
        assert_eq!(traj.last().unwrap().t, r.horizon);
        assert!(traj.samples().windows(2).all(|w| w[1].t > w[0].t));
    }
}

#[test]
fn identical_requests_identical_trajectories() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..CASES {
        let r = random_request(&mut rng);
        let a = simulate(&r, &SolverConfig::default()).unwrap();
        let b = simulate(&r, &SolverConfig::default()).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn forcing_and_initial_state_scale_linearly() {
    // y' = M·y + (α, 0, 0): scaling α and y0 by k scales y(t) by k.
    let mut rng = StdRng::seed_from_u64(14);
    for _ in 0..CASES {
        let c = random_coefficients(&mut rng);
        let y0 = random_state(&mut rng);
        let k: f64 = rng.gen_range(0.2..=3.0);

        let base = integrate(&ChamberModel::new(c), y0, 10.0, 101).unwrap();
        let mut scaled_c = c;
        scaled_c.alpha *= k;
        let scaled = integrate(&ChamberModel::new(scaled_c), y0.scaled(k), 10.0, 101).unwrap();

        let expected = base.map_states(|s| s.scaled(k));
        let diff = max_rel_diff(&scaled, &expected);
        assert!(diff < 1e-5, "k = {k}: relative deviation {diff:e}");
    }
}

#[test]
fn scaling_all_coefficients_stretches_time() {
    // Scaling every coefficient by k multiplies the vector field by k, so
    // y_k(t) = y(k·t).
    let mut rng = StdRng::seed_from_u64(15);
    for _ in 0..CASES {
        let c = random_coefficients(&mut rng);
        let y0 = random_state(&mut rng);
        let k: f64 = rng.gen_range(0.3..=1.0);
        let horizon = 8.0;

        let scaled = integrate(&ChamberModel::new(c.scaled(k)), y0, horizon, 81).unwrap();
        let stretched = integrate(&ChamberModel::new(c), y0, k * horizon, 81).unwrap();

        let diff = max_rel_diff(&scaled, &stretched);
        assert!(diff < 1e-5, "k = {k}: relative deviation {diff:e}");
    }
}

#[test]
fn zero_coupling_is_linear_growth() {
    let y0 = StateVector::new(0.4, 1.3, 0.7);
    let r = SimulationRequest::new(
        CoefficientSet::new(0.75, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        y0,
        50.0,
        500,
    );
    let traj = simulate(&r, &SolverConfig::default()).unwrap();
    for s in &traj {
        assert!((s.state.u - (0.4 + 0.75 * s.t)).abs() < 1e-9, "U({})", s.t);
        assert_eq!(s.state.e, 1.3);
        assert_eq!(s.state.a, 0.7);
    }
}

#[test]
fn log_floor_holds_everywhere() {
    let mut rng = StdRng::seed_from_u64(16);
    let cfg = SolverConfig::default();
    for _ in 0..CASES {
        let r = random_request(&mut rng).with_log_safe(true);
        let traj = simulate(&r, &cfg).unwrap();
        assert!(traj.iter().all(|s| s.state.min_component() >= cfg.log_floor));
    }
}

#[test]
fn example_scenario() {
    let r = SimulationRequest::new(
        CoefficientSet::new(0.6, 0.3, 0.4, 0.7, 0.4, 0.6, 0.5),
        StateVector::new(0.5, 0.6, 0.6),
        50.0,
        200,
    );
    let traj = simulate(&r, &SolverConfig::default()).unwrap();
    assert!(traj.is_complete());
    assert_eq!(traj.len(), 200);
    assert!(traj.samples().windows(2).all(|w| w[1].t > w[0].t));
    assert!(traj.iter().all(|s| s.state.is_finite()));
    assert!(traj.stats().accepted_steps > 0);
}

#[test]
fn concurrent_requests_match_sequential() {
    let mut rng = StdRng::seed_from_u64(17);
    let requests: Vec<SimulationRequest> = (0..8).map(|_| random_request(&mut rng)).collect();
    let engine = SimulationEngine::with_memo(SolverConfig::default(), 16).unwrap();

    let sequential: Vec<Trajectory> = requests
        .iter()
        .map(|r| simulate(r, &SolverConfig::default()).unwrap())
        .collect();

    let engine = &engine;
    let parallel: Vec<Trajectory> = std::thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|r| scope.spawn(move || engine.run(r).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
    assert_eq!(engine.memo_len(), 8);
}
