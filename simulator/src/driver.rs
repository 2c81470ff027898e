//! Step driver harness
//!
//! The spatial simulation that decides which cells are adjacent lives
//! outside this crate; it is modeled here as the [`NeighborProvider`]
//! black box. The [`StepDriver`] supplies the synchronous loop around it:
//! one [`InteractionEngine::interact`] call per supplied pair,
//! sequentially, then advance the tick.
//!
//! Execution is single-threaded and every engine call is atomic with
//! respect to the tick. Pair ordering within a tick is entirely the
//! provider's; the driver imposes no ordering policy of its own.

use crate::core::time::TimeManager;
use crate::engine::{EngineError, InteractionEngine, InteractionOutcome};
use crate::models::CellId;

/// Source of adjacency information, one list of pairs per tick.
///
/// Implemented by the external spatial engine; tests use
/// [`ScheduledNeighbors`].
pub trait NeighborProvider {
    /// Adjacent (cell, neighbor) pairs for the given tick, in the order
    /// they should interact.
    fn neighbor_pairs(&mut self, tick: u64) -> Vec<(CellId, CellId)>;
}

/// Replays a fixed per-tick schedule of adjacent pairs.
///
/// Ticks beyond the end of the schedule yield no pairs.
///
/// NOTE: Available in all builds to support integration testing,
/// but should only be used in test code.
#[derive(Debug, Clone, Default)]
pub struct ScheduledNeighbors {
    schedule: Vec<Vec<(CellId, CellId)>>,
}

impl ScheduledNeighbors {
    /// Create a schedule where entry `t` lists the pairs for tick `t`.
    pub fn new(schedule: Vec<Vec<(CellId, CellId)>>) -> Self {
        Self { schedule }
    }

    /// Repeat the same pairs for `ticks` consecutive ticks.
    pub fn repeating(pairs: Vec<(CellId, CellId)>, ticks: usize) -> Self {
        Self {
            schedule: vec![pairs; ticks],
        }
    }
}

impl NeighborProvider for ScheduledNeighbors {
    fn neighbor_pairs(&mut self, tick: u64) -> Vec<(CellId, CellId)> {
        self.schedule
            .get(tick as usize)
            .cloned()
            .unwrap_or_default()
    }
}

/// Result of a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Tick number
    pub tick: u64,

    /// Number of adjacent pairs supplied this tick
    pub num_pairs: usize,

    /// Number of TCR to peptide-MHC engagements this tick
    pub num_tcr_engagements: usize,

    /// Number of co-stimulatory matches this tick
    pub num_matches: usize,

    /// Number of T-Cells that activated this tick
    pub num_activations: usize,

    /// Number of T-Cells that became anergic this tick
    pub num_anergic: usize,

    /// Number of forced unbinds this tick
    pub num_forced_unbinds: usize,
}

impl TickResult {
    fn tally(&mut self, outcome: &InteractionOutcome) {
        match outcome {
            InteractionOutcome::TcrBound(chained) => {
                self.num_tcr_engagements += 1;
                self.tally(chained);
            }
            InteractionOutcome::Matched { activated, .. } => {
                self.num_matches += 1;
                if *activated {
                    self.num_activations += 1;
                }
            }
            InteractionOutcome::CoStimFailed => self.num_anergic += 1,
            InteractionOutcome::ForcedUnbind => self.num_forced_unbinds += 1,
            _ => {}
        }
    }
}

/// Synchronous tick loop around an [`InteractionEngine`].
///
/// # Example
///
/// ```
/// use immune_simulator_core_rs::{
///     CellId, InteractionEngine, ScheduledNeighbors, SimulationConfig, StepDriver,
/// };
/// use immune_simulator_core_rs::models::{TCellKind, TCellState};
///
/// let mut engine = InteractionEngine::new(SimulationConfig::default(), 42).unwrap();
/// engine.spawn_apc(CellId(1)).unwrap();
/// engine.spawn_tcell(CellId(2), TCellKind::Tconv, TCellState::Inactive).unwrap();
///
/// let mut driver = StepDriver::new(engine);
/// let mut neighbors = ScheduledNeighbors::repeating(vec![(CellId(2), CellId(1))], 5);
///
/// let results = driver.run(&mut neighbors, 5).unwrap();
/// assert_eq!(results.len(), 5);
/// ```
pub struct StepDriver {
    engine: InteractionEngine,
    time: TimeManager,
}

impl StepDriver {
    /// Create a driver around an engine, starting at tick 0.
    pub fn new(engine: InteractionEngine) -> Self {
        Self {
            engine,
            time: TimeManager::new(),
        }
    }

    /// Get reference to the engine.
    pub fn engine(&self) -> &InteractionEngine {
        &self.engine
    }

    /// Get mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut InteractionEngine {
        &mut self.engine
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.time.current_tick()
    }

    /// Execute one simulation tick.
    ///
    /// Queries the provider for this tick's adjacent pairs, interacts
    /// each pair in order, then advances time.
    pub fn step(&mut self, provider: &mut dyn NeighborProvider) -> Result<TickResult, EngineError> {
        let tick = self.time.current_tick();
        let pairs = provider.neighbor_pairs(tick);

        let mut result = TickResult {
            tick,
            num_pairs: pairs.len(),
            ..TickResult::default()
        };

        for (cell, neighbor) in pairs {
            let outcome = self.engine.interact(cell, neighbor, tick)?;
            result.tally(&outcome);
        }

        self.time.advance_tick();
        Ok(result)
    }

    /// Run `ticks` consecutive steps, collecting per-tick results.
    pub fn run(
        &mut self,
        provider: &mut dyn NeighborProvider,
        ticks: u64,
    ) -> Result<Vec<TickResult>, EngineError> {
        let mut results = Vec::with_capacity(ticks as usize);
        for _ in 0..ticks {
            results.push(self.step(provider)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::models::{TCellKind, TCellState};

    #[test]
    fn test_step_advances_time_without_pairs() {
        let engine = InteractionEngine::new(SimulationConfig::default(), 42).unwrap();
        let mut driver = StepDriver::new(engine);
        let mut neighbors = ScheduledNeighbors::default();

        let result = driver.step(&mut neighbors).unwrap();

        assert_eq!(result.tick, 0);
        assert_eq!(result.num_pairs, 0);
        assert_eq!(driver.current_tick(), 1);
    }

    #[test]
    fn test_step_counts_tcr_engagement_and_match() {
        let mut engine = InteractionEngine::new(SimulationConfig::default(), 42).unwrap();
        engine.spawn_apc(CellId(1)).unwrap();
        engine
            .spawn_tcell(CellId(2), TCellKind::Tconv, TCellState::Inactive)
            .unwrap();

        let mut driver = StepDriver::new(engine);
        let mut neighbors = ScheduledNeighbors::repeating(vec![(CellId(2), CellId(1))], 1);

        let result = driver.step(&mut neighbors).unwrap();

        assert_eq!(result.num_pairs, 1);
        assert_eq!(result.num_tcr_engagements, 1);
        // Tconv has no CTLA-4, so the chained co-activation matched CD28
        assert_eq!(result.num_matches, 1);
    }

    #[test]
    fn test_unknown_cell_in_schedule_is_error() {
        let engine = InteractionEngine::new(SimulationConfig::default(), 42).unwrap();
        let mut driver = StepDriver::new(engine);
        let mut neighbors = ScheduledNeighbors::repeating(vec![(CellId(1), CellId(2))], 1);

        assert_eq!(
            driver.step(&mut neighbors),
            Err(EngineError::UnknownCell(CellId(1)))
        );
    }
}
