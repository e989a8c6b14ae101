// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the echo-chamber simulation engine.
//!
//! The Python UI owns sliders and charts; it hands scalar parameters to
//! `simulate` (or a `SimulationEngine`) and draws the returned series.
//!
//! # FFI Safety
//!
//! - Every request is validated in Rust before integrating.
//! - `InvalidParameter` and config errors → `ValueError`.
//! - `IntegrationFailure` → `RuntimeError` naming the time reached; no
//!   partial series is ever returned as if it were complete.
//!
//! Install: `pip install -e crates/chamber-ffi` (requires maturin, builds
//! with `--features extension-module`).
//!
//! Usage from Python:
//! ```python
//! from chamber_kernel import CoefficientSet, simulate
//!
//! traj = simulate(CoefficientSet(alpha=0.6), 0.5, 0.6, 0.6, horizon=50.0, samples=200)
//! series = traj.time_series(log_scale=True)
//! ```

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use chamber_physics::{
    derivative as model_derivative, simulate as run_simulation, ScatterFrames, SimulationEngine,
    TimeSeries,
};
use chamber_types::{
    ChamberError, CoefficientSet, Preset, RenderMode, SimulationRequest, SolverConfig,
    StateVector, Trajectory,
};

fn to_py_err(err: ChamberError) -> PyErr {
    match err {
        ChamberError::IntegrationFailure { .. } => PyRuntimeError::new_err(err.to_string()),
        ChamberError::InvalidParameter(_) | ChamberError::Config(_) => {
            PyValueError::new_err(err.to_string())
        }
    }
}

fn build_request(
    coefficients: &CoefficientSet,
    u0: f64,
    e0: f64,
    a0: f64,
    horizon: f64,
    samples: usize,
    log_safe: bool,
) -> SimulationRequest {
    SimulationRequest::new(
        *coefficients,
        StateVector::new(u0, e0, a0),
        horizon,
        samples,
    )
    .with_log_safe(log_safe)
}

// ─── PySolverConfig ─────────────────────────────────────────────────

/// Python-visible solver configuration.
#[pyclass(name = "SolverConfig")]
#[derive(Clone)]
struct PySolverConfig {
    inner: SolverConfig,
}

#[pymethods]
impl PySolverConfig {
    #[new]
    #[pyo3(signature = (
        rtol = 1e-8,
        atol = 1e-10,
        max_steps = 100_000,
        first_step = None,
        log_floor = 1e-4,
    ))]
    fn new(
        rtol: f64,
        atol: f64,
        max_steps: u64,
        first_step: Option<f64>,
        log_floor: f64,
    ) -> PyResult<Self> {
        let config = SolverConfig {
            rtol,
            atol,
            max_steps,
            first_step,
            log_floor,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = SolverConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    #[getter]
    fn rtol(&self) -> f64 {
        self.inner.rtol
    }

    #[getter]
    fn atol(&self) -> f64 {
        self.inner.atol
    }

    #[getter]
    fn max_steps(&self) -> u64 {
        self.inner.max_steps
    }

    #[getter]
    fn log_floor(&self) -> f64 {
        self.inner.log_floor
    }

    fn __repr__(&self) -> String {
        format!(
            "SolverConfig(rtol={:e}, atol={:e}, max_steps={}, log_floor={:e})",
            self.inner.rtol, self.inner.atol, self.inner.max_steps, self.inner.log_floor
        )
    }
}

// ─── PyCoefficientSet ───────────────────────────────────────────────

/// The seven coupling coefficients, range-checked on construction.
#[pyclass(name = "CoefficientSet")]
#[derive(Clone)]
struct PyCoefficientSet {
    inner: CoefficientSet,
}

#[pymethods]
impl PyCoefficientSet {
    #[new]
    #[pyo3(signature = (
        alpha = 0.5,
        beta = 0.8,
        gamma = 0.6,
        delta = 0.7,
        epsilon = 0.4,
        eta = 0.5,
        zeta = 0.3,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        alpha: f64,
        beta: f64,
        gamma: f64,
        delta: f64,
        epsilon: f64,
        eta: f64,
        zeta: f64,
    ) -> PyResult<Self> {
        let inner = CoefficientSet::new(alpha, beta, gamma, delta, epsilon, eta, zeta);
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn alpha(&self) -> f64 {
        self.inner.alpha
    }

    #[getter]
    fn beta(&self) -> f64 {
        self.inner.beta
    }

    #[getter]
    fn gamma(&self) -> f64 {
        self.inner.gamma
    }

    #[getter]
    fn delta(&self) -> f64 {
        self.inner.delta
    }

    #[getter]
    fn epsilon(&self) -> f64 {
        self.inner.epsilon
    }

    #[getter]
    fn eta(&self) -> f64 {
        self.inner.eta
    }

    #[getter]
    fn zeta(&self) -> f64 {
        self.inner.zeta
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let c = &self.inner;
        let dict = PyDict::new(py);
        dict.set_item("alpha", c.alpha)?;
        dict.set_item("beta", c.beta)?;
        dict.set_item("gamma", c.gamma)?;
        dict.set_item("delta", c.delta)?;
        dict.set_item("epsilon", c.epsilon)?;
        dict.set_item("eta", c.eta)?;
        dict.set_item("zeta", c.zeta)?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        let c = &self.inner;
        format!(
            "CoefficientSet(alpha={}, beta={}, gamma={}, delta={}, epsilon={}, eta={}, zeta={})",
            c.alpha, c.beta, c.gamma, c.delta, c.epsilon, c.eta, c.zeta
        )
    }
}

// ─── PyTrajectory ───────────────────────────────────────────────────

/// A complete simulated trajectory.
#[pyclass(name = "Trajectory")]
struct PyTrajectory {
    inner: Trajectory,
    log_floor: f64,
}

#[pymethods]
impl PyTrajectory {
    #[getter]
    fn t(&self) -> Vec<f64> {
        self.inner.times()
    }

    #[getter]
    fn u(&self) -> Vec<f64> {
        self.inner.iter().map(|s| s.state.u).collect()
    }

    #[getter]
    fn e(&self) -> Vec<f64> {
        self.inner.iter().map(|s| s.state.e).collect()
    }

    #[getter]
    fn a(&self) -> Vec<f64> {
        self.inner.iter().map(|s| s.state.a).collect()
    }

    #[getter]
    fn complete(&self) -> bool {
        self.inner.is_complete()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn stats<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let s = self.inner.stats();
        let dict = PyDict::new(py);
        dict.set_item("accepted_steps", s.accepted_steps)?;
        dict.set_item("rejected_steps", s.rejected_steps)?;
        dict.set_item("evaluations", s.evaluations)?;
        Ok(dict)
    }

    /// Columns `t`, `u`, `e`, `a` for a time-series chart.
    #[pyo3(signature = (log_scale = false))]
    fn time_series<'py>(&self, py: Python<'py>, log_scale: bool) -> PyResult<Bound<'py, PyDict>> {
        let ts = TimeSeries::from_trajectory(&self.inner, log_scale, self.log_floor);
        let dict = PyDict::new(py);
        dict.set_item("t", ts.t)?;
        dict.set_item("u", ts.u)?;
        dict.set_item("e", ts.e)?;
        dict.set_item("a", ts.a)?;
        dict.set_item("log_scale", ts.log_scale)?;
        Ok(dict)
    }

    /// One dict per animation frame: `index`, `t`, `x` (U), `y` (E),
    /// `size` (A scaled).
    #[pyo3(signature = (size_scale = 40.0, log_scale = false))]
    fn scatter_frames<'py>(
        &self,
        py: Python<'py>,
        size_scale: f64,
        log_scale: bool,
    ) -> PyResult<Vec<Bound<'py, PyDict>>> {
        if !size_scale.is_finite() || size_scale <= 0.0 {
            return Err(PyValueError::new_err(format!(
                "size_scale must be > 0, got {size_scale}"
            )));
        }
        let frames =
            ScatterFrames::from_trajectory(&self.inner, size_scale, self.log_floor, log_scale);
        frames
            .frames
            .iter()
            .map(|f| {
                let dict = PyDict::new(py);
                dict.set_item("index", f.index)?;
                dict.set_item("t", f.t)?;
                dict.set_item("x", f.x)?;
                dict.set_item("y", f.y)?;
                dict.set_item("size", f.size)?;
                Ok(dict)
            })
            .collect()
    }

    /// `(x_min, x_max, y_min, y_max)` over every scatter frame, on the same
    /// axes as `scatter_frames(log_scale=...)`.
    #[pyo3(signature = (log_scale = false))]
    fn frame_bounds(&self, log_scale: bool) -> Option<(f64, f64, f64, f64)> {
        ScatterFrames::from_trajectory(&self.inner, 1.0, self.log_floor, log_scale)
            .bounds()
            .map(|b| (b.x_min, b.x_max, b.y_min, b.y_max))
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "Trajectory(samples={}, t_end={}, complete={})",
            self.inner.len(),
            self.inner.last().map_or(0.0, |s| s.t),
            self.inner.is_complete()
        )
    }
}

// ─── PySimulationEngine ─────────────────────────────────────────────

/// Reusable engine, optionally memoizing identical requests.
#[pyclass(name = "SimulationEngine")]
struct PySimulationEngine {
    inner: Arc<SimulationEngine>,
}

#[pymethods]
impl PySimulationEngine {
    #[new]
    #[pyo3(signature = (config = None, memo_capacity = None))]
    fn new(config: Option<PyRef<'_, PySolverConfig>>, memo_capacity: Option<usize>) -> PyResult<Self> {
        let config = config.map(|c| c.inner).unwrap_or_default();
        let engine = match memo_capacity {
            Some(capacity) => SimulationEngine::with_memo(config, capacity),
            None => SimulationEngine::new(config),
        }
        .map_err(to_py_err)?;
        Ok(Self {
            inner: Arc::new(engine),
        })
    }

    #[pyo3(signature = (coefficients, u0, e0, a0, horizon = 50.0, samples = 500, log_safe = false))]
    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        py: Python<'_>,
        coefficients: PyRef<'_, PyCoefficientSet>,
        u0: f64,
        e0: f64,
        a0: f64,
        horizon: f64,
        samples: usize,
        log_safe: bool,
    ) -> PyResult<PyTrajectory> {
        let request = build_request(&coefficients.inner, u0, e0, a0, horizon, samples, log_safe);
        let engine = Arc::clone(&self.inner);
        let trajectory = py
            .allow_threads(move || engine.run(&request))
            .map_err(to_py_err)?;
        Ok(PyTrajectory {
            inner: trajectory,
            log_floor: self.inner.config().log_floor,
        })
    }

    /// Run a named preset's default request.
    fn run_preset(&self, py: Python<'_>, name: &str) -> PyResult<PyTrajectory> {
        let preset: Preset = name.parse().map_err(to_py_err)?;
        let request = preset.request();
        let engine = Arc::clone(&self.inner);
        let trajectory = py
            .allow_threads(move || engine.run(&request))
            .map_err(to_py_err)?;
        Ok(PyTrajectory {
            inner: trajectory,
            log_floor: self.inner.config().log_floor,
        })
    }

    fn memo_len(&self) -> usize {
        self.inner.memo_len()
    }

    fn clear_memo(&self) {
        self.inner.clear_memo();
    }
}

// ─── Module Functions ───────────────────────────────────────────────

/// One-shot simulation with an optional solver configuration.
#[pyfunction]
#[pyo3(signature = (coefficients, u0, e0, a0, horizon = 50.0, samples = 500, log_safe = false, config = None))]
#[allow(clippy::too_many_arguments)]
fn simulate(
    py: Python<'_>,
    coefficients: PyRef<'_, PyCoefficientSet>,
    u0: f64,
    e0: f64,
    a0: f64,
    horizon: f64,
    samples: usize,
    log_safe: bool,
    config: Option<PyRef<'_, PySolverConfig>>,
) -> PyResult<PyTrajectory> {
    let config = config.map(|c| c.inner).unwrap_or_default();
    let request = build_request(&coefficients.inner, u0, e0, a0, horizon, samples, log_safe);
    let trajectory = py
        .allow_threads(move || run_simulation(&request, &config))
        .map_err(to_py_err)?;
    Ok(PyTrajectory {
        inner: trajectory,
        log_floor: config.log_floor,
    })
}

/// Instantaneous derivative `(dU/dt, dE/dt, dA/dt)`.
#[pyfunction]
fn derivative(coefficients: PyRef<'_, PyCoefficientSet>, u: f64, e: f64, a: f64) -> (f64, f64, f64) {
    let d = model_derivative(0.0, &StateVector::new(u, e, a), &coefficients.inner);
    (d.u, d.e, d.a)
}

/// Defaults of a named preset: coefficients, initial state, horizon,
/// sample count, log-safe flag and render mode.
#[pyfunction]
fn preset<'py>(py: Python<'py>, name: &str) -> PyResult<Bound<'py, PyDict>> {
    let preset: Preset = name.parse().map_err(to_py_err)?;
    let request = preset.request();
    let dict = PyDict::new(py);
    let coefficients = PyCoefficientSet {
        inner: request.coefficients,
    };
    dict.set_item("coefficients", coefficients.to_dict(py)?)?;
    dict.set_item("u0", request.initial.u)?;
    dict.set_item("e0", request.initial.e)?;
    dict.set_item("a0", request.initial.a)?;
    dict.set_item("horizon", request.horizon)?;
    dict.set_item("samples", request.sample_count)?;
    dict.set_item("log_safe", request.log_safe)?;
    let (mode, log_scale) = match preset.render_mode() {
        RenderMode::TimeSeries { log_scale } => ("time_series", log_scale),
        RenderMode::PhaseScatter { log_scale } => ("phase_scatter", log_scale),
    };
    dict.set_item("render_mode", mode)?;
    dict.set_item("log_scale", log_scale)?;
    Ok(dict)
}

/// Names accepted by `preset()` and `SimulationEngine.run_preset()`.
#[pyfunction]
fn preset_names() -> Vec<&'static str> {
    Preset::ALL.iter().map(|p| p.name()).collect()
}

// ─── Module Registration ────────────────────────────────────────────

/// Chamber Kernel — Rust simulation engine for the understanding /
/// echo-chamber / foolish-participant model.
///
/// - `SolverConfig` — integrator tolerances and budgets
/// - `CoefficientSet` — the seven coupling coefficients
/// - `Trajectory` — sampled solution plus render series
/// - `SimulationEngine` — reusable, optionally memoizing front end
/// - `simulate`, `derivative`, `preset`, `preset_names`
#[pymodule]
fn chamber_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySolverConfig>()?;
    m.add_class::<PyCoefficientSet>()?;
    m.add_class::<PyTrajectory>()?;
    m.add_class::<PySimulationEngine>()?;
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_function(wrap_pyfunction!(derivative, m)?)?;
    m.add_function(wrap_pyfunction!(preset, m)?)?;
    m.add_function(wrap_pyfunction!(preset_names, m)?)?;
    Ok(())
}
