//! Simulation state
//!
//! The id-to-record registry owned by the interaction engine. The external
//! spatial engine holds only [`CellId`]s; every lookup goes through this
//! registry, and the optional T-Cell → APC "friendship" reference is an
//! identifier resolved here, never a direct owning reference (either side
//! may be destroyed independently by the lifecycle collaborator).
//!
//! # Critical invariants
//!
//! 1. Each identifier maps to at most one record (APC or T-Cell)
//! 2. Removing a record subtracts its current quantities from the
//!    aggregate counters, keeping counters equal to the live-entity sums

use std::collections::HashMap;

use crate::metrics::Metrics;
use crate::models::apc::Apc;
use crate::models::tcell::TCell;
use crate::models::CellId;

/// Which class of record an identifier resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    Apc,
    TCell,
}

/// Per-quantity sums over all live entity records.
///
/// Compared against the aggregate counters in invariant tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuantityTotals {
    pub peptide_mhc: i64,
    pub cd80: i64,
    pub cd86: i64,
    pub tcr: i64,
    pub cd28: i64,
    pub external_ctla4: i64,
    pub internal_ctla4: i64,
}

/// Registry of all live cell records, indexed by identifier.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    apcs: HashMap<CellId, Apc>,
    tcells: HashMap<CellId, TCell>,
}

impl SimulationState {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify an identifier, if registered.
    pub fn classify(&self, id: CellId) -> Option<CellClass> {
        if self.apcs.contains_key(&id) {
            Some(CellClass::Apc)
        } else if self.tcells.contains_key(&id) {
            Some(CellClass::TCell)
        } else {
            None
        }
    }

    /// Check whether an identifier is registered (as either class).
    pub fn contains(&self, id: CellId) -> bool {
        self.classify(id).is_some()
    }

    /// Get reference to an APC by id.
    pub fn apc(&self, id: CellId) -> Option<&Apc> {
        self.apcs.get(&id)
    }

    /// Get mutable reference to an APC by id.
    pub fn apc_mut(&mut self, id: CellId) -> Option<&mut Apc> {
        self.apcs.get_mut(&id)
    }

    /// Get reference to a T-Cell by id.
    pub fn tcell(&self, id: CellId) -> Option<&TCell> {
        self.tcells.get(&id)
    }

    /// Get mutable reference to a T-Cell by id.
    pub fn tcell_mut(&mut self, id: CellId) -> Option<&mut TCell> {
        self.tcells.get_mut(&id)
    }

    /// Get reference to all APCs.
    pub fn apcs(&self) -> &HashMap<CellId, Apc> {
        &self.apcs
    }

    /// Get reference to all T-Cells.
    pub fn tcells(&self) -> &HashMap<CellId, TCell> {
        &self.tcells
    }

    /// Number of APC records.
    pub fn num_apcs(&self) -> usize {
        self.apcs.len()
    }

    /// Number of T-Cell records.
    pub fn num_tcells(&self) -> usize {
        self.tcells.len()
    }

    /// Register an APC record.
    ///
    /// # Panics
    /// Panics if the identifier is already registered (duplicate ids are
    /// rejected with a typed error at the engine boundary).
    pub(crate) fn insert_apc(&mut self, apc: Apc) {
        let id = apc.id();
        assert!(!self.contains(id), "cell id {} already registered", id);
        self.apcs.insert(id, apc);
    }

    /// Register a T-Cell record.
    ///
    /// # Panics
    /// Panics if the identifier is already registered.
    pub(crate) fn insert_tcell(&mut self, tcell: TCell) {
        let id = tcell.id();
        assert!(!self.contains(id), "cell id {} already registered", id);
        self.tcells.insert(id, tcell);
    }

    /// Disjoint mutable borrows of the APC and T-Cell maps.
    ///
    /// The interaction engine needs a T-Cell and one or two APCs mutable
    /// at once (the current neighbor plus a previous binding partner);
    /// splitting the registry keeps those borrows provably disjoint.
    pub(crate) fn split_mut(&mut self) -> (&mut HashMap<CellId, Apc>, &mut HashMap<CellId, TCell>) {
        (&mut self.apcs, &mut self.tcells)
    }

    /// Remove a record of either class, subtracting its current
    /// quantities from the aggregate counters.
    ///
    /// # Returns
    /// The class of the removed record, or `None` if the id was unknown.
    pub(crate) fn remove(&mut self, id: CellId, metrics: &mut Metrics) -> Option<CellClass> {
        if let Some(apc) = self.apcs.remove(&id) {
            metrics.sub_apc_amounts(&apc.current_amounts());
            return Some(CellClass::Apc);
        }
        if let Some(tcell) = self.tcells.remove(&id) {
            metrics.sub_tcell_amounts(&tcell.current_amounts());
            return Some(CellClass::TCell);
        }
        None
    }

    /// Sum every tracked quantity over the live entity records.
    pub fn quantity_totals(&self) -> QuantityTotals {
        let mut totals = QuantityTotals::default();

        for apc in self.apcs.values() {
            totals.peptide_mhc += i64::from(apc.peptide_mhc());
            totals.cd80 += i64::from(apc.cd80());
            totals.cd86 += i64::from(apc.cd86());
        }

        for tcell in self.tcells.values() {
            totals.tcr += i64::from(tcell.tcr());
            totals.cd28 += i64::from(tcell.cd28());
            totals.external_ctla4 += i64::from(tcell.external_ctla4());
            totals.internal_ctla4 += i64::from(tcell.internal_ctla4());
        }

        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::models::{TCellKind, TCellState};

    fn populated_state(metrics: &mut Metrics) -> SimulationState {
        let config = SimulationConfig::default();
        let mut state = SimulationState::new();

        state.insert_apc(Apc::new(CellId(1), config.apc_quantities, metrics));
        state.insert_tcell(TCell::new(
            CellId(2),
            TCellKind::Treg,
            TCellState::Inactive,
            config.tcell_quantities(TCellKind::Treg),
            metrics,
        ));

        state
    }

    #[test]
    fn test_classify() {
        let mut metrics = Metrics::new();
        let state = populated_state(&mut metrics);

        assert_eq!(state.classify(CellId(1)), Some(CellClass::Apc));
        assert_eq!(state.classify(CellId(2)), Some(CellClass::TCell));
        assert_eq!(state.classify(CellId(3)), None);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_id_rejected() {
        let mut metrics = Metrics::new();
        let config = SimulationConfig::default();
        let mut state = populated_state(&mut metrics);

        state.insert_apc(Apc::new(CellId(2), config.apc_quantities, &mut metrics));
    }

    #[test]
    fn test_quantity_totals_match_counters() {
        let mut metrics = Metrics::new();
        let state = populated_state(&mut metrics);
        let totals = state.quantity_totals();

        assert_eq!(totals.peptide_mhc, metrics.total_amount_peptide_mhc);
        assert_eq!(totals.cd80, metrics.total_amount_cd80);
        assert_eq!(totals.cd86, metrics.total_amount_cd86);
        assert_eq!(totals.tcr, metrics.total_amount_tcr);
        assert_eq!(totals.cd28, metrics.total_amount_cd28);
        assert_eq!(totals.external_ctla4, metrics.total_amount_external_ctla4);
        assert_eq!(totals.internal_ctla4, metrics.total_amount_internal_ctla4);
    }

    #[test]
    fn test_remove_subtracts_amounts() {
        let mut metrics = Metrics::new();
        let mut state = populated_state(&mut metrics);

        assert_eq!(state.remove(CellId(1), &mut metrics), Some(CellClass::Apc));

        assert_eq!(metrics.total_amount_peptide_mhc, 0);
        assert_eq!(metrics.total_amount_cd80, 0);
        assert_eq!(metrics.total_amount_cd86, 0);
        // T-Cell amounts are untouched
        assert_eq!(metrics.total_amount_tcr, 50);

        assert_eq!(state.remove(CellId(1), &mut metrics), None);
    }
}
