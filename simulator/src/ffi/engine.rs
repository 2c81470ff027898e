//! PyO3 wrapper for InteractionEngine
//!
//! This module provides the Python interface to the Rust engine.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::SimulationConfig;
use crate::engine::InteractionEngine as RustEngine;
use crate::models::{CellId, TCellState};

use super::types::{metrics_to_py, outcome_tag, parse_kind, parse_state, state_tag};

/// Python wrapper for the Rust interaction engine
///
/// The Python spatial simulation owns the tick loop and cell adjacency;
/// it calls `interact` once per adjacent pair per tick and samples
/// `metrics` for reporting.
///
/// # Example (from Python)
///
/// ```python
/// from immune_simulator_core_rs import InteractionEngine
///
/// engine = InteractionEngine(seed=12345)
/// engine.spawn_apc(1)
/// engine.spawn_tcell(2, "tconv")
///
/// for tick, pairs in enumerate(adjacency_stream):
///     for cell, neighbor in pairs:
///         engine.interact(cell, neighbor, tick)
///     report(engine.metrics())
/// ```
#[pyclass(name = "InteractionEngine")]
pub struct PyInteractionEngine {
    inner: RustEngine,
}

#[pymethods]
impl PyInteractionEngine {
    /// Create an engine from a seed and an optional JSON configuration.
    ///
    /// # Arguments
    ///
    /// * `seed` - RNG seed for deterministic simulation
    /// * `config_json` - Optional JSON-encoded `SimulationConfig`;
    ///   defaults to the published model constants
    ///
    /// # Errors
    ///
    /// Raises ValueError when the JSON is malformed or the configuration
    /// fails validation.
    #[new]
    #[pyo3(signature = (seed, config_json = None))]
    fn new(seed: u64, config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => SimulationConfig::from_json(json)
                .map_err(|e| PyValueError::new_err(format!("invalid config JSON: {}", e)))?,
            None => SimulationConfig::default(),
        };

        let inner = RustEngine::new(config, seed)
            .map_err(|e| PyValueError::new_err(format!("failed to create engine: {}", e)))?;

        Ok(Self { inner })
    }

    /// Register a new APC with the configured initial quantities.
    fn spawn_apc(&mut self, id: u64) -> PyResult<()> {
        self.inner
            .spawn_apc(CellId(id))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Register a new T-Cell.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier assigned by the spatial simulation
    /// * `kind` - `"treg"` or `"tconv"`
    /// * `state` - Optional initial state (default `"inactive"`)
    #[pyo3(signature = (id, kind, state = None))]
    fn spawn_tcell(&mut self, id: u64, kind: &str, state: Option<&str>) -> PyResult<()> {
        let kind = parse_kind(kind)?;
        let state = match state {
            Some(s) => parse_state(s)?,
            None => TCellState::Inactive,
        };
        self.inner
            .spawn_tcell(CellId(id), kind, state)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Interact one adjacent pair for the given tick.
    ///
    /// # Returns
    ///
    /// A compact outcome tag, e.g. `"tcr_bound/matched"`, `"not_engaged"`,
    /// `"costim_failed"`.
    fn interact(&mut self, cell: u64, neighbor: u64, tick: u64) -> PyResult<String> {
        let outcome = self
            .inner
            .interact(CellId(cell), CellId(neighbor), tick)
            .map_err(|e| PyRuntimeError::new_err(format!("interaction failed: {}", e)))?;
        Ok(outcome_tag(&outcome))
    }

    /// Snapshot the aggregate counters as a dict.
    fn metrics(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        metrics_to_py(py, self.inner.metrics())
    }

    /// Current activation state of a T-Cell.
    fn tcell_state(&self, id: u64) -> PyResult<String> {
        match self.inner.state().tcell(CellId(id)) {
            Some(tcell) => Ok(state_tag(tcell.state()).to_string()),
            None => Err(PyValueError::new_err(format!("unknown T-Cell id {}", id))),
        }
    }

    /// Record a stochastic apoptosis decided by the lifecycle layer.
    fn apply_apoptosis(&mut self, id: u64) -> PyResult<()> {
        self.inner
            .apply_apoptosis(CellId(id))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Record a stochastic division decided by the lifecycle layer.
    fn record_division(&mut self) {
        self.inner.record_division();
    }

    /// Record a stochastic quiescence decided by the lifecycle layer.
    fn record_quiescence(&mut self) {
        self.inner.record_quiescence();
    }

    /// Drop a cell record after the spatial simulation removed the cell.
    fn remove_cell(&mut self, id: u64) -> PyResult<()> {
        self.inner
            .remove_cell(CellId(id))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Number of live APC records.
    fn num_apcs(&self) -> usize {
        self.inner.state().num_apcs()
    }

    /// Number of live T-Cell records.
    fn num_tcells(&self) -> usize {
        self.inner.state().num_tcells()
    }

    /// Total events logged.
    fn event_count(&self) -> usize {
        self.inner.event_log().len()
    }
}
