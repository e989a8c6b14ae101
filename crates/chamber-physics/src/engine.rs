// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Simulation Engine
// ─────────────────────────────────────────────────────────────────────
//! One request in, one trajectory out. Parameters always arrive as an
//! explicit [`SimulationRequest`]; nothing is read from ambient state.
//!
//! [`SimulationEngine`] can memoize identical requests. Keys compare every
//! f64 field bit-for-bit, so a hit returns exactly what a fresh run would.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use chamber_types::{
    ChamberError, ChamberResult, RenderMode, SimulationRequest, SolverConfig, Trajectory,
};

use crate::integrator::DormandPrince;
use crate::model::ChamberModel;
use crate::series::{floor_for_log, RenderSeries};

/// Validate `request`, integrate the model it describes, and apply the log
/// floor when requested.
pub fn simulate(request: &SimulationRequest, config: &SolverConfig) -> ChamberResult<Trajectory> {
    let solver = DormandPrince::new(*config)?;
    run_with(&solver, request)
}

fn run_with(solver: &DormandPrince, request: &SimulationRequest) -> ChamberResult<Trajectory> {
    request.validate()?;
    let model = ChamberModel::new(request.coefficients);
    let trajectory = solver.integrate(
        &model,
        request.initial,
        request.horizon,
        request.sample_count,
    )?;
    if request.log_safe {
        Ok(floor_for_log(&trajectory, solver.config().log_floor))
    } else {
        Ok(trajectory)
    }
}

/// Bit-exact identity of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RequestKey {
    bits: [u64; 11],
    sample_count: usize,
    log_safe: bool,
}

impl From<&SimulationRequest> for RequestKey {
    fn from(r: &SimulationRequest) -> Self {
        let c = &r.coefficients;
        let bits = [
            c.alpha, c.beta, c.gamma, c.delta, c.epsilon, c.eta, c.zeta, r.initial.u, r.initial.e,
            r.initial.a, r.horizon,
        ]
        .map(f64::to_bits);
        Self {
            bits,
            sample_count: r.sample_count,
            log_safe: r.log_safe,
        }
    }
}

/// FIFO-bounded memo of completed trajectories.
struct MemoCache {
    entries: HashMap<RequestKey, Trajectory>,
    order: VecDeque<RequestKey>,
    capacity: usize,
}

impl MemoCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn insert(&mut self, key: RequestKey, trajectory: Trajectory) {
        if self.entries.contains_key(&key) {
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(old) => {
                    self.entries.remove(&old);
                }
                None => break,
            }
        }
        self.order.push_back(key);
        self.entries.insert(key, trajectory);
    }
}

/// Blocking simulation front end, optionally memoizing.
///
/// Thread-safe: the memo is guarded by a `parking_lot::Mutex` held only for
/// lookups and inserts, never across an integration.
pub struct SimulationEngine {
    solver: DormandPrince,
    memo: Option<Mutex<MemoCache>>,
}

impl SimulationEngine {
    pub fn new(config: SolverConfig) -> ChamberResult<Self> {
        Ok(Self {
            solver: DormandPrince::new(config)?,
            memo: None,
        })
    }

    /// Engine that remembers up to `capacity` completed trajectories.
    pub fn with_memo(config: SolverConfig, capacity: usize) -> ChamberResult<Self> {
        if capacity == 0 {
            return Err(ChamberError::Config(
                "memo capacity must be > 0".to_string(),
            ));
        }
        Ok(Self {
            solver: DormandPrince::new(config)?,
            memo: Some(Mutex::new(MemoCache::new(capacity))),
        })
    }

    pub fn config(&self) -> &SolverConfig {
        self.solver.config()
    }

    /// Run one request to completion. Failures are never memoized.
    pub fn run(&self, request: &SimulationRequest) -> ChamberResult<Trajectory> {
        let Some(memo) = &self.memo else {
            return run_with(&self.solver, request);
        };

        let key = RequestKey::from(request);
        if let Some(hit) = memo.lock().entries.get(&key) {
            log::debug!("memo hit for request with {} samples", request.sample_count);
            return Ok(hit.clone());
        }

        let trajectory = run_with(&self.solver, request)?;
        memo.lock().insert(key, trajectory.clone());
        Ok(trajectory)
    }

    /// Run `request` and shape the result for `mode`.
    pub fn render(
        &self,
        request: &SimulationRequest,
        mode: RenderMode,
        size_scale: f64,
    ) -> ChamberResult<RenderSeries> {
        if !size_scale.is_finite() || size_scale <= 0.0 {
            return Err(ChamberError::InvalidParameter(format!(
                "size_scale must be > 0, got {size_scale}"
            )));
        }
        let trajectory = self.run(request)?;
        Ok(RenderSeries::build(
            &trajectory,
            mode,
            size_scale,
            self.solver.config().log_floor,
        ))
    }

    /// Number of memoized trajectories (0 without a memo).
    pub fn memo_len(&self) -> usize {
        self.memo.as_ref().map_or(0, |m| m.lock().entries.len())
    }

    pub fn clear_memo(&self) {
        if let Some(memo) = &self.memo {
            let mut memo = memo.lock();
            memo.entries.clear();
            memo.order.clear();
        }
    }
}
