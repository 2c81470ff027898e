//! Interaction engine implementation
//!
//! Implements the per-pair entry point invoked by the external step
//! driver once per adjacent (cell, neighbor) pair per tick, and the
//! T-Cell state machine behind it:
//!
//! ```text
//! INACTIVE ──bind_tcr──▶ AWAITING_COACTIVATION ──CD28 over threshold──▶ ACTIVE
//!                                 │
//!                                 └──no ligand available──▶ ANERGIC (terminal)
//! ```
//!
//! Every "failure" path (no ligand, no receptor, below threshold, not
//! engaged) is an ordinary [`InteractionOutcome`] variant that leaves the
//! cell retryable on a future tick; the only terminal transition is
//! ANERGIC. No operation blocks or yields: each `interact` call is
//! atomic with respect to the tick, and pair ordering is entirely the
//! step driver's.
//!
//! # Determinism
//!
//! All randomness goes through the injected [`ChoiceSource`]. Same seed +
//! same pair schedule = identical results (deterministic replay).

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{ConfigError, SimulationConfig};
use crate::metrics::Metrics;
use crate::models::{
    Apc, CellClass, CellId, Event, EventLog, Ligand, Receptor, SimulationState, TCell, TCellKind,
    TCellState,
};
use crate::rng::{ChoiceSource, RngManager};

/// Errors produced at the engine boundary.
///
/// Domain outcomes (no ligand, no receptor, lost contact) are NOT errors;
/// they are [`InteractionOutcome`] variants.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("unknown cell id: {0}")]
    UnknownCell(CellId),

    #[error("cell id {0} is already registered")]
    DuplicateCell(CellId),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result of one per-pair interaction.
///
/// Consumed by the step driver and by tests; the engine itself never
/// branches on a previous outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The pair has no defined interaction (T-Cell/T-Cell, APC/anything)
    Ignored,

    /// The T-Cell is engaged to a different APC and tolerated the
    /// lost contact for now
    NotEngaged,

    /// The contact-loss tolerance expired: previous partner reset,
    /// T-Cell reset, and (Treg only) a ligand loss recorded on the
    /// adjacent APC
    ForcedUnbind,

    /// Engaged, but TCR or peptide-MHC was unavailable; stays INACTIVE
    TcrNotBound,

    /// One TCR bound one peptide-MHC; carries the outcome of the
    /// co-activation attempt chained in the same tick
    TcrBound(Box<InteractionOutcome>),

    /// Co-stimulation was required but no ligand was available; the
    /// T-Cell became anergic (terminal)
    CoStimFailed,

    /// No ligand was available but the cell was not awaiting
    /// co-activation, so no transition was taken
    NoLigand,

    /// A ligand was available but no receptor was free; stays
    /// AWAITING_COACTIVATION for a future tick
    NoReceptor,

    /// A receptor won a ligand
    Matched {
        ligand: Ligand,
        receptor: Receptor,
        /// True when this match pushed bound CD28 over the threshold
        activated: bool,
    },

    /// ACTIVE-state CTLA-4 shuttle step
    CtlaCycled {
        /// Shuttle direction after this tick's toggle check
        internalizing: bool,
    },

    /// The T-Cell is anergic; nothing happens
    Terminal,
}

/// Outcome of the friendship/contact check.
enum Contact {
    Engaged,
    NotEngaged,
    ForcedUnbind,
}

/// Split-borrow context threaded through the interaction functions.
struct Ctx<'a> {
    config: &'a SimulationConfig,
    choices: &'a mut dyn ChoiceSource,
    metrics: &'a mut Metrics,
    events: &'a mut EventLog,
}

// ============================================================================
// Engine
// ============================================================================

/// The interaction engine.
///
/// Owns the id-to-record registry, the configuration, the choice source,
/// the aggregate counters, and the event log. The external step driver
/// holds only identifiers and invokes [`InteractionEngine::interact`]
/// once per adjacent pair per tick.
///
/// # Example
///
/// ```
/// use immune_simulator_core_rs::{InteractionEngine, SimulationConfig, CellId};
/// use immune_simulator_core_rs::models::{TCellKind, TCellState};
///
/// let mut engine = InteractionEngine::new(SimulationConfig::default(), 42).unwrap();
/// engine.spawn_apc(CellId(1)).unwrap();
/// engine.spawn_tcell(CellId(2), TCellKind::Tconv, TCellState::Inactive).unwrap();
///
/// let outcome = engine.interact(CellId(2), CellId(1), 0).unwrap();
/// println!("tick 0: {:?}", outcome);
/// ```
pub struct InteractionEngine {
    /// Fixed configuration, read-only at simulation time
    config: SimulationConfig,

    /// Id-to-record registry
    state: SimulationState,

    /// Source of uniform and weighted random choices
    choices: Box<dyn ChoiceSource>,

    /// Aggregate counters (reporting only)
    metrics: Metrics,

    /// Interaction history
    event_log: EventLog,
}

impl InteractionEngine {
    /// Create an engine with a seeded xorshift64* choice source.
    ///
    /// # Errors
    /// Returns `EngineError::Config` when the configuration fails
    /// validation.
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self, EngineError> {
        Self::with_choice_source(config, Box::new(RngManager::new(seed)))
    }

    /// Create an engine with an explicit choice source.
    ///
    /// Used by tests to supply scripted choice sequences.
    pub fn with_choice_source(
        config: SimulationConfig,
        choices: Box<dyn ChoiceSource>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            state: SimulationState::new(),
            choices,
            metrics: Metrics::new(),
            event_log: EventLog::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Get reference to the cell registry.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Get mutable reference to the cell registry.
    ///
    /// This is primarily for testing. Direct state mutation bypasses
    /// engine invariants. Use with caution.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Read-only view of the aggregate counters.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get reference to the event log.
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    // ========================================================================
    // Population management
    // ========================================================================

    /// Register a new APC with the configured initial quantities.
    pub fn spawn_apc(&mut self, id: CellId) -> Result<(), EngineError> {
        if self.state.contains(id) {
            return Err(EngineError::DuplicateCell(id));
        }
        let apc = Apc::new(id, self.config.apc_quantities, &mut self.metrics);
        self.state.insert_apc(apc);
        Ok(())
    }

    /// Register a new T-Cell with kind-dependent initial quantities.
    pub fn spawn_tcell(
        &mut self,
        id: CellId,
        kind: TCellKind,
        state: TCellState,
    ) -> Result<(), EngineError> {
        if self.state.contains(id) {
            return Err(EngineError::DuplicateCell(id));
        }
        let quantities = self.config.tcell_quantities(kind);
        let tcell = TCell::new(id, kind, state, quantities, &mut self.metrics);
        self.state.insert_tcell(tcell);
        Ok(())
    }

    // ========================================================================
    // Lifecycle collaborator contract
    // ========================================================================

    /// Record a stochastic apoptosis decided by the lifecycle collaborator.
    ///
    /// Marks the cell killed and decrements the cell-count and population
    /// counters matching the cell's kind and state at time of death. The
    /// collaborator remains responsible for removing the cell from the
    /// spatial simulation and then calling [`InteractionEngine::remove_cell`].
    ///
    /// The decrement is applied unconditionally, including for cells the
    /// engine already moved to the anergic bucket; the reporting counters
    /// deliberately mirror that duplicated responsibility.
    pub fn apply_apoptosis(&mut self, id: CellId) -> Result<(), EngineError> {
        match self.state.classify(id) {
            Some(CellClass::Apc) => {
                self.metrics.total_apc -= 1;
            }
            Some(CellClass::TCell) => {
                let (kind, state) = match self.state.tcell_mut(id) {
                    Some(tcell) => {
                        tcell.mark_killed();
                        (tcell.kind(), tcell.state())
                    }
                    None => return Err(EngineError::UnknownCell(id)),
                };
                self.metrics.total_tcells -= 1;
                self.metrics.decr_population(kind, state);
            }
            None => return Err(EngineError::UnknownCell(id)),
        }
        self.metrics.total_apoptosis += 1;
        Ok(())
    }

    /// Record a stochastic division decided by the lifecycle collaborator.
    pub fn record_division(&mut self) {
        self.metrics.total_division += 1;
    }

    /// Record a stochastic quiescence decided by the lifecycle
    /// collaborator.
    pub fn record_quiescence(&mut self) {
        self.metrics.total_quiescence += 1;
    }

    /// Drop a cell record after the spatial simulation removed the cell.
    ///
    /// Subtracts the record's current quantities from the amount counters
    /// so they keep matching the live-entity sums.
    pub fn remove_cell(&mut self, id: CellId) -> Result<(), EngineError> {
        match self.state.remove(id, &mut self.metrics) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownCell(id)),
        }
    }

    // ========================================================================
    // Per-pair entry point
    // ========================================================================

    /// Interact one adjacent pair for the given tick.
    ///
    /// Dispatches on the neighbor's class: a T-Cell adjacent to an APC
    /// runs the state machine below; every other pairing is an accepted
    /// no-op (`InteractionOutcome::Ignored`).
    ///
    /// # Errors
    /// Returns `EngineError::UnknownCell` when either identifier is not
    /// registered.
    pub fn interact(
        &mut self,
        cell: CellId,
        neighbor: CellId,
        tick: u64,
    ) -> Result<InteractionOutcome, EngineError> {
        let cell_class = self
            .state
            .classify(cell)
            .ok_or(EngineError::UnknownCell(cell))?;
        let neighbor_class = self
            .state
            .classify(neighbor)
            .ok_or(EngineError::UnknownCell(neighbor))?;

        match (cell_class, neighbor_class) {
            (CellClass::TCell, CellClass::Apc) => self.tcell_apc_interaction(cell, neighbor, tick),
            // T-Cell/T-Cell interaction is an accepted no-op extension
            // point; APCs initiate nothing on their own
            _ => Ok(InteractionOutcome::Ignored),
        }
    }

    fn tcell_apc_interaction(
        &mut self,
        tcell_id: CellId,
        apc_id: CellId,
        tick: u64,
    ) -> Result<InteractionOutcome, EngineError> {
        let (apcs, tcells) = self.state.split_mut();
        let tcell = tcells
            .get_mut(&tcell_id)
            .ok_or(EngineError::UnknownCell(tcell_id))?;

        let mut ctx = Ctx {
            config: &self.config,
            choices: self.choices.as_mut(),
            metrics: &mut self.metrics,
            events: &mut self.event_log,
        };

        Ok(match tcell.state() {
            TCellState::Inactive => bind_tcr(&mut ctx, tcell, apcs, apc_id, tick),
            TCellState::AwaitingCoactivation => {
                select_interaction(&mut ctx, tcell, apcs, apc_id, tick)
            }
            TCellState::Active => active_ctla4_cycle(&mut ctx, tcell, tick),
            TCellState::Anergic => InteractionOutcome::Terminal,
        })
    }
}

// ============================================================================
// Friendship / contact protocol
// ============================================================================

/// Decide whether the T-Cell is engaged with this APC, tolerating
/// transient loss of contact.
///
/// An unbound T-Cell binds to the first APC it touches. While bound, any
/// contact with a different APC advances the unbound timer; once the
/// accumulated lost-contact time reaches the configured tolerance the
/// binding is torn down: the previous partner is reset to its initial
/// quantities (if it still exists), the T-Cell is reset, and a regulatory
/// T-Cell records a parting ligand theft on the new APC.
fn contact_with_friend(
    ctx: &mut Ctx<'_>,
    tcell: &mut TCell,
    apcs: &mut HashMap<CellId, Apc>,
    apc_id: CellId,
    tick: u64,
) -> Contact {
    let partner = match tcell.bound_apc() {
        None => {
            tcell.bind_to(apc_id);
            ctx.events.log(Event::Bound {
                tick,
                tcell: tcell.id(),
                apc: apc_id,
            });
            return Contact::Engaged;
        }
        Some(partner) => partner,
    };

    if partner == apc_id {
        return Contact::Engaged;
    }

    // Contact with a stranger: advance the lost-contact timer
    match tcell.last_contact_tick() {
        None => tcell.set_last_contact(tick),
        Some(last) => {
            let elapsed = tick.saturating_sub(last);
            if elapsed >= 1 {
                tcell.set_last_contact(tick);
                tcell.add_unbound_ticks(elapsed);
            }
        }
    }

    if tcell.unbound_ticks() < ctx.config.wait_time {
        return Contact::NotEngaged;
    }

    // Tolerance expired: tear the binding down
    tcell.zero_bound_ticks();
    if let Some(previous) = apcs.get_mut(&partner) {
        // The partner may already have been removed by the lifecycle
        // collaborator
        previous.reset(ctx.metrics);
    }
    tcell.reset(ctx.metrics);

    if tcell.kind() == TCellKind::Treg {
        if let Some(apc) = apcs.get_mut(&apc_id) {
            if let Some(ligand) = apc.remove_ligand(ctx.choices, ctx.metrics) {
                ctx.events.log(Event::LigandLost {
                    tick,
                    apc: apc_id,
                    ligand,
                });
            }
        }
    }

    ctx.events.log(Event::ForcedUnbind {
        tick,
        tcell: tcell.id(),
        previous_apc: partner,
        apc: apc_id,
    });

    Contact::ForcedUnbind
}

// ============================================================================
// TCR binding (INACTIVE)
// ============================================================================

/// Attempt to bind one TCR to one peptide-MHC complex.
///
/// Requires engagement. On success the cell moves to
/// AWAITING_COACTIVATION and immediately attempts co-activation in the
/// same tick.
fn bind_tcr(
    ctx: &mut Ctx<'_>,
    tcell: &mut TCell,
    apcs: &mut HashMap<CellId, Apc>,
    apc_id: CellId,
    tick: u64,
) -> InteractionOutcome {
    match contact_with_friend(ctx, tcell, apcs, apc_id, tick) {
        Contact::NotEngaged => return InteractionOutcome::NotEngaged,
        Contact::ForcedUnbind => return InteractionOutcome::ForcedUnbind,
        Contact::Engaged => {}
    }

    // We are in contact with our partner: the lost-contact timer restarts
    // and bound time accumulates
    tcell.zero_unbound_ticks();
    match tcell.last_contact_tick() {
        None => tcell.set_last_contact(tick),
        Some(last) => {
            let elapsed = tick.saturating_sub(last);
            if elapsed >= 1 {
                tcell.set_last_contact(tick);
                tcell.add_bound_ticks(elapsed);
            }
        }
    }

    let engaged = match apcs.get_mut(&apc_id) {
        Some(apc) => {
            if tcell.tcr() > 0 && apc.peptide_mhc() > 0 {
                // Co-activation is required from here on; the state moves
                // before the chained selection below so a same-tick
                // co-stimulation failure can reach the anergic branch
                tcell.set_state(TCellState::AwaitingCoactivation);
                tcell.consume_tcr(ctx.metrics);
                apc.consume_peptide_mhc(ctx.metrics);
                true
            } else {
                false
            }
        }
        None => false,
    };

    if !engaged {
        return InteractionOutcome::TcrNotBound;
    }

    ctx.events.log(Event::TcrEngaged {
        tick,
        tcell: tcell.id(),
        apc: apc_id,
    });

    let chained = select_interaction(ctx, tcell, apcs, apc_id, tick);
    InteractionOutcome::TcrBound(Box::new(chained))
}

// ============================================================================
// Co-activation selection (AWAITING_COACTIVATION)
// ============================================================================

/// Select a (ligand, receptor) pair and dispatch the match.
///
/// Requires engagement. With no ligand available the cell becomes
/// anergic; with no receptor available it stays awaiting for a future
/// tick. When both receptors compete, the winner is drawn with the
/// chosen ligand's affinity weights.
fn select_interaction(
    ctx: &mut Ctx<'_>,
    tcell: &mut TCell,
    apcs: &mut HashMap<CellId, Apc>,
    apc_id: CellId,
    tick: u64,
) -> InteractionOutcome {
    match contact_with_friend(ctx, tcell, apcs, apc_id, tick) {
        Contact::NotEngaged => return InteractionOutcome::NotEngaged,
        Contact::ForcedUnbind => return InteractionOutcome::ForcedUnbind,
        Contact::Engaged => {}
    }

    let apc = match apcs.get_mut(&apc_id) {
        Some(apc) => apc,
        None => return InteractionOutcome::NotEngaged,
    };

    // CD86 is checked first; both are collected
    let mut ligands: Vec<Ligand> = Vec::with_capacity(2);
    if apc.cd86() > 0 {
        ligands.push(Ligand::Cd86);
    }
    if apc.cd80() > 0 {
        ligands.push(Ligand::Cd80);
    }

    if ligands.is_empty() {
        // The cell needed co-stimulation but didn't receive it. The
        // anergic transition only applies to a cell already awaiting
        // co-activation.
        if tcell.state() == TCellState::AwaitingCoactivation {
            tcell.set_state(TCellState::Anergic);
            tcell.mark_killed();
            ctx.metrics.total_tcells -= 1;
            ctx.metrics.decr_population(tcell.kind(), TCellState::Inactive);
            ctx.metrics.incr_population(tcell.kind(), TCellState::Anergic);
            ctx.events.log(Event::BecameAnergic {
                tick,
                tcell: tcell.id(),
                kind: tcell.kind(),
            });
            return InteractionOutcome::CoStimFailed;
        }
        return InteractionOutcome::NoLigand;
    }

    // The ligand is drawn before receptors are examined
    let ligand = if ligands.len() == 1 {
        ligands[0]
    } else {
        ligands[ctx.choices.uniform_index(ligands.len())]
    };

    // CTLA-4 MUST be collected first: the weight vectors follow this order
    let mut receptors: Vec<Receptor> = Vec::with_capacity(2);
    if tcell.external_ctla4() > 0 {
        receptors.push(Receptor::Ctla4);
    }
    if tcell.cd28() > 0 {
        receptors.push(Receptor::Cd28);
    }

    if receptors.is_empty() {
        return InteractionOutcome::NoReceptor;
    }

    let receptor = if receptors.len() == 1 {
        receptors[0]
    } else {
        let weights = ctx.config.weights_for(ligand);
        receptors[ctx.choices.weighted_index(&weights)]
    };

    match_with_apc(ctx, tcell, apc, ligand, receptor, tick)
}

// ============================================================================
// Matching
// ============================================================================

/// Consume the chosen (ligand, receptor) pair.
///
/// CD28 consumes one ligand unit and counts toward the activation
/// threshold; CTLA-4 consumes two ligand units (saturating at zero) and
/// never activates.
fn match_with_apc(
    ctx: &mut Ctx<'_>,
    tcell: &mut TCell,
    apc: &mut Apc,
    ligand: Ligand,
    receptor: Receptor,
    tick: u64,
) -> InteractionOutcome {
    match receptor {
        Receptor::Cd28 if tcell.cd28() > 0 => {
            ctx.metrics.total_engaged_cd28 += 1;
            let bound = tcell.increment_bound_cd28();
            tcell.consume_cd28(ctx.metrics);
            apc.consume_ligand(ligand, 1, ctx.metrics);

            ctx.events.log(Event::CoStimMatched {
                tick,
                tcell: tcell.id(),
                apc: apc.id(),
                ligand,
                receptor,
            });

            let mut activated = false;
            if bound > ctx.config.cd28_threshold {
                tcell.set_state(TCellState::Active);
                ctx.metrics.decr_population(tcell.kind(), TCellState::Inactive);
                ctx.metrics.incr_population(tcell.kind(), TCellState::Active);

                // Tconv acquires CTLA-4 upon activation; Treg is
                // pre-stocked at creation
                if tcell.kind() == TCellKind::Tconv {
                    tcell.grant_activation_ctla4(ctx.metrics);
                }

                ctx.events.log(Event::Activated {
                    tick,
                    tcell: tcell.id(),
                    kind: tcell.kind(),
                });
                activated = true;
            }

            InteractionOutcome::Matched {
                ligand,
                receptor,
                activated,
            }
        }

        Receptor::Ctla4 if tcell.external_ctla4() > 0 => {
            ctx.metrics.total_engaged_external_ctla4 += 1;
            tcell.consume_external_ctla4(ctx.metrics);
            // CTLA-4 takes two ligand units per binding; consumption
            // saturates at zero and the counter moves by the amount
            // actually consumed
            apc.consume_ligand(ligand, 2, ctx.metrics);

            ctx.events.log(Event::CoStimMatched {
                tick,
                tcell: tcell.id(),
                apc: apc.id(),
                ligand,
                receptor,
            });

            InteractionOutcome::Matched {
                ligand,
                receptor,
                activated: false,
            }
        }

        // Selection only offers available receptors; the guards above are
        // the same availability checks the selection ran
        _ => InteractionOutcome::NoReceptor,
    }
}

// ============================================================================
// ACTIVE-state behavior
// ============================================================================

/// One step of the CTLA-4 internalization oscillation.
///
/// Moves one unit between the internal and external pools per the
/// persistent direction flag and flips the direction on every tick where
/// `tick % ctla4_cycle_period == 0`. This is a step-function
/// oscillation, not a reaction network.
fn active_ctla4_cycle(ctx: &mut Ctx<'_>, tcell: &mut TCell, tick: u64) -> InteractionOutcome {
    tcell.shuttle_ctla4(ctx.metrics);

    if tick % ctx.config.ctla4_cycle_period == 0 {
        tcell.toggle_internalizing();
    }

    InteractionOutcome::CtlaCycled {
        internalizing: tcell.is_internalizing(),
    }
}
