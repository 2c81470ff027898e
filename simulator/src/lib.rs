//! Immune Simulator Core - Rust Engine
//!
//! Agent-based immune-cell interaction core with deterministic execution.
//! Antigen presenting cells and T-Cells (regulatory and conventional)
//! exchange surface ligands and receptors upon spatial contact, driving
//! each T-Cell through an activation state machine.
//!
//! # Architecture
//!
//! - **core**: Time management
//! - **config**: Fixed simulation constants (thresholds, wait times, weights)
//! - **models**: Domain types (Apc, TCell, SimulationState, Event)
//! - **metrics**: Aggregate counters for the reporting collaborator
//! - **engine**: Per-pair interaction and the activation state machine
//! - **driver**: Synchronous tick loop over an external adjacency source
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Surface quantities are never negative (consumption saturates)
//! 2. Aggregate counters equal the live-entity sums at every tick boundary
//! 3. All randomness is deterministic (seeded RNG behind a choice seam)
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod config;
pub mod core;
pub mod driver;
pub mod engine;
pub mod metrics;
pub mod models;
pub mod rng;

// Re-exports for convenience
pub use crate::core::time::TimeManager;
pub use config::{ApcQuantities, ConfigError, ReceptorWeights, SimulationConfig, TCellQuantities};
pub use driver::{NeighborProvider, ScheduledNeighbors, StepDriver, TickResult};
pub use engine::{EngineError, InteractionEngine, InteractionOutcome};
pub use metrics::Metrics;
pub use models::{
    Apc, CellClass, CellId, Event, EventLog, Ligand, QuantityTotals, Receptor, SimulationState,
    TCell, TCellKind, TCellState,
};
pub use rng::{ChoiceSource, RngManager, ScriptedChoices};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn immune_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PyInteractionEngine>()?;
    Ok(())
}
