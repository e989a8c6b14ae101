// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Simulation Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Model evaluator, adaptive Dormand–Prince integrator, render series and
//! memoizing engine for the three-quantity echo-chamber model.
//!
//! # Invariants
//!
//! 1. **Exact sample grid**: a complete trajectory has exactly the requested
//!    number of samples at `T · i / (N − 1)`, first sample equal to the
//!    initial state, last time equal to `T`.
//!
//! 2. **No fabricated samples**: a solver failure returns every sample it
//!    reached, flagged incomplete, together with the time it stopped at.
//!
//! 3. **Floors are cosmetic**: log-safe flooring happens after integration
//!    and never feeds back into the dynamics.

pub mod engine;
pub mod integrator;
pub mod model;
pub mod series;

pub use engine::{simulate, SimulationEngine};
pub use integrator::{integrate, DormandPrince};
pub use model::{derivative, ChamberModel, OdeSystem};
pub use series::{floor_for_log, FrameBounds, RenderSeries, ScatterFrame, ScatterFrames, TimeSeries};
