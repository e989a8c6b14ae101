// ─────────────────────────────────────────────────────────────────────
// Echo-Chamber Dynamics — Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Data model, solver configuration, presets, and error hierarchy for the
//! understanding / echo-chamber / foolish-participant dynamics kernel.

pub mod config;
pub mod error;
pub mod preset;
pub mod state;

pub use config::SolverConfig;
pub use error::{ChamberError, ChamberResult};
pub use preset::{Preset, RenderMode};
pub use state::{
    CoefficientSet, IntegrationStats, Sample, SimulationRequest, StateVector, Trajectory,
};
