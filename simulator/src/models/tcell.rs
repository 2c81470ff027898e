//! T-Cell model
//!
//! A T-Cell owns its receptor quantities (TCR, CD28, external and internal
//! CTLA-4), its activation state, and the bookkeeping for the binding
//! ("friendship") protocol: which APC it is engaged with, when it last
//! had contact, and how much CD28 it has bound toward the activation
//! threshold.
//!
//! The interaction logic itself lives in the engine module; this record
//! only exposes the primitive mutations, each of which keeps the
//! aggregate counters in lock-step.

use serde::{Deserialize, Serialize};

use crate::config::TCellQuantities;
use crate::metrics::Metrics;
use crate::models::{CellId, TCellKind, TCellState};

/// A T-Cell record.
///
/// # Example
///
/// ```
/// use immune_simulator_core_rs::{CellId, Metrics, SimulationConfig, TCell};
/// use immune_simulator_core_rs::models::{TCellKind, TCellState};
///
/// let config = SimulationConfig::default();
/// let mut metrics = Metrics::new();
/// let cell = TCell::new(
///     CellId(7),
///     TCellKind::Treg,
///     TCellState::Inactive,
///     config.tcell_quantities(TCellKind::Treg),
///     &mut metrics,
/// );
///
/// assert_eq!(cell.tcr(), 50);
/// assert_eq!(cell.external_ctla4(), 10);
/// assert_eq!(metrics.total_treg_inactive, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TCell {
    /// Identifier assigned by the spatial engine
    id: CellId,

    /// Subtype (regulatory or conventional)
    kind: TCellKind,

    /// Activation state
    state: TCellState,

    /// ACTIVE-state CTLA-4 shuttle direction: true while internalizing
    internalizing: bool,

    /// Configured initial quantities, restored on every reset
    initial: TCellQuantities,

    /// Current TCR count
    tcr: u32,

    /// Current CD28 count
    cd28: u32,

    /// Current surface CTLA-4 count
    external_ctla4: u32,

    /// Current internal CTLA-4 count
    internal_ctla4: u32,

    /// The APC this cell is currently engaged with, if any
    bound_apc: Option<CellId>,

    /// Tick of the most recent bound-time or unbound-time update
    last_contact_tick: Option<u64>,

    /// Accumulated ticks spent engaged with the partner APC
    bound_ticks: u64,

    /// Accumulated ticks of lost contact with the partner APC
    unbound_ticks: u64,

    /// CD28 units bound toward the activation threshold
    bound_cd28: u32,

    /// Lifecycle kill signal: marked for removal by the collaborator
    killed: bool,
}

impl TCell {
    /// Create a new T-Cell with kind-dependent initial quantities.
    ///
    /// Registers the cell, its population bucket, and its quantities in
    /// the aggregate counters.
    pub fn new(
        id: CellId,
        kind: TCellKind,
        state: TCellState,
        quantities: TCellQuantities,
        metrics: &mut Metrics,
    ) -> Self {
        let mut cell = Self {
            id,
            kind,
            state,
            internalizing: false,
            initial: quantities,
            tcr: 0,
            cd28: 0,
            external_ctla4: 0,
            internal_ctla4: 0,
            bound_apc: None,
            last_contact_tick: None,
            bound_ticks: 0,
            unbound_ticks: 0,
            bound_cd28: 0,
            killed: false,
        };
        cell.restock(metrics);
        metrics.total_tcells += 1;
        metrics.incr_population(kind, state);
        cell
    }

    /// Restore initial receptor quantities and clear binding bookkeeping.
    ///
    /// Called on forced unbinding. Subtracts the current quantities from
    /// the aggregate counters before restocking. The activation state and
    /// the internalization flag are deliberately left untouched.
    pub fn reset(&mut self, metrics: &mut Metrics) {
        self.clear_binding();
        metrics.sub_tcell_amounts(&self.current_amounts());
        self.restock(metrics);
    }

    fn clear_binding(&mut self) {
        self.bound_apc = None;
        self.last_contact_tick = None;
        self.bound_ticks = 0;
        self.unbound_ticks = 0;
        self.bound_cd28 = 0;
    }

    fn restock(&mut self, metrics: &mut Metrics) {
        self.tcr = self.initial.tcr;
        self.cd28 = self.initial.cd28;
        self.external_ctla4 = self.initial.external_ctla4;
        self.internal_ctla4 = self.initial.internal_ctla4;
        metrics.add_tcell_amounts(&self.initial);
    }

    /// Current quantities as a bundle (for counter bookkeeping).
    pub(crate) fn current_amounts(&self) -> TCellQuantities {
        TCellQuantities {
            tcr: self.tcr,
            cd28: self.cd28,
            external_ctla4: self.external_ctla4,
            internal_ctla4: self.internal_ctla4,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the cell identifier.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Get the subtype.
    pub fn kind(&self) -> TCellKind {
        self.kind
    }

    /// Get the activation state.
    pub fn state(&self) -> TCellState {
        self.state
    }

    /// Current TCR count.
    pub fn tcr(&self) -> u32 {
        self.tcr
    }

    /// Current CD28 count.
    pub fn cd28(&self) -> u32 {
        self.cd28
    }

    /// Current surface CTLA-4 count.
    pub fn external_ctla4(&self) -> u32 {
        self.external_ctla4
    }

    /// Current internal CTLA-4 count.
    pub fn internal_ctla4(&self) -> u32 {
        self.internal_ctla4
    }

    /// The APC this cell is currently engaged with.
    pub fn bound_apc(&self) -> Option<CellId> {
        self.bound_apc
    }

    /// Ticks spent engaged with the partner.
    pub fn bound_ticks(&self) -> u64 {
        self.bound_ticks
    }

    /// Ticks of lost contact with the partner.
    pub fn unbound_ticks(&self) -> u64 {
        self.unbound_ticks
    }

    /// CD28 units bound toward the activation threshold.
    pub fn bound_cd28(&self) -> u32 {
        self.bound_cd28
    }

    /// True while the ACTIVE-state shuttle is internalizing CTLA-4.
    pub fn is_internalizing(&self) -> bool {
        self.internalizing
    }

    /// True once the lifecycle collaborator has marked this cell for
    /// removal.
    pub fn is_killed(&self) -> bool {
        self.killed
    }

    // =========================================================================
    // Mutations used by the interaction engine
    // =========================================================================

    pub(crate) fn set_state(&mut self, state: TCellState) {
        self.state = state;
    }

    /// Mark this cell for removal (lifecycle kill signal).
    pub fn mark_killed(&mut self) {
        self.killed = true;
    }

    pub(crate) fn bind_to(&mut self, apc: CellId) {
        self.bound_apc = Some(apc);
    }

    pub(crate) fn last_contact_tick(&self) -> Option<u64> {
        self.last_contact_tick
    }

    pub(crate) fn set_last_contact(&mut self, tick: u64) {
        self.last_contact_tick = Some(tick);
    }

    pub(crate) fn add_bound_ticks(&mut self, elapsed: u64) {
        self.bound_ticks += elapsed;
    }

    pub(crate) fn zero_bound_ticks(&mut self) {
        self.bound_ticks = 0;
    }

    pub(crate) fn add_unbound_ticks(&mut self, elapsed: u64) {
        self.unbound_ticks += elapsed;
    }

    pub(crate) fn zero_unbound_ticks(&mut self) {
        self.unbound_ticks = 0;
    }

    /// Consume one TCR unit. Caller must have checked availability.
    pub(crate) fn consume_tcr(&mut self, metrics: &mut Metrics) {
        assert!(self.tcr > 0, "TCR must be available");
        self.tcr -= 1;
        metrics.total_amount_tcr -= 1;
    }

    /// Consume one CD28 unit. Caller must have checked availability.
    pub(crate) fn consume_cd28(&mut self, metrics: &mut Metrics) {
        assert!(self.cd28 > 0, "CD28 must be available");
        self.cd28 -= 1;
        metrics.total_amount_cd28 -= 1;
    }

    /// Consume one external CTLA-4 unit. Caller must have checked
    /// availability.
    pub(crate) fn consume_external_ctla4(&mut self, metrics: &mut Metrics) {
        assert!(self.external_ctla4 > 0, "external CTLA-4 must be available");
        self.external_ctla4 -= 1;
        metrics.total_amount_external_ctla4 -= 1;
    }

    /// Count one more CD28 unit toward the activation threshold.
    ///
    /// # Returns
    /// The new bound-CD28 count.
    pub(crate) fn increment_bound_cd28(&mut self) -> u32 {
        self.bound_cd28 += 1;
        self.bound_cd28
    }

    /// Grant the +1 external / +1 internal CTLA-4 a conventional T-Cell
    /// receives upon activation.
    pub(crate) fn grant_activation_ctla4(&mut self, metrics: &mut Metrics) {
        self.external_ctla4 += 1;
        metrics.total_amount_external_ctla4 += 1;
        self.internal_ctla4 += 1;
        metrics.total_amount_internal_ctla4 += 1;
    }

    /// Move one CTLA-4 unit between the internal and external pools,
    /// in the direction of the internalization flag.
    ///
    /// The move saturates: nothing happens when the source pool is empty,
    /// and the counters adjust only by the amount actually moved.
    ///
    /// # Returns
    /// The number of units moved (0 or 1).
    pub(crate) fn shuttle_ctla4(&mut self, metrics: &mut Metrics) -> u32 {
        if self.internalizing {
            let moved = self.external_ctla4.min(1);
            self.external_ctla4 -= moved;
            self.internal_ctla4 += moved;
            metrics.total_amount_external_ctla4 -= i64::from(moved);
            metrics.total_amount_internal_ctla4 += i64::from(moved);
            moved
        } else {
            let moved = self.internal_ctla4.min(1);
            self.internal_ctla4 -= moved;
            self.external_ctla4 += moved;
            metrics.total_amount_internal_ctla4 -= i64::from(moved);
            metrics.total_amount_external_ctla4 += i64::from(moved);
            moved
        }
    }

    /// Flip the CTLA-4 shuttle direction.
    pub(crate) fn toggle_internalizing(&mut self) {
        self.internalizing = !self.internalizing;
    }
}
