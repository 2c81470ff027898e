//! Aggregate simulation counters
//!
//! Process-wide counters tracking surface-molecule totals, lost ligands,
//! engagement events, and per-state population counts. They exist for
//! reporting only: the interaction engine mutates them in lock-step with
//! every entity mutation but never reads them back to make decisions.
//!
//! # Exactness contract
//!
//! After any sequence of creates, resets, interactions, and removals,
//! every `total_amount_*` counter equals the sum of that quantity over the
//! live entity records. Tests treat a mismatch as a programming-invariant
//! violation.
//!
//! All counters are i64 so that a hypothetical bookkeeping bug shows up
//! as a negative value in assertions rather than unsigned wraparound.

use serde::{Deserialize, Serialize};

use crate::config::{ApcQuantities, TCellQuantities};
use crate::models::{Ligand, TCellKind, TCellState};

/// Aggregate counters sampled once per tick by the reporting collaborator.
///
/// # Example
///
/// ```
/// use immune_simulator_core_rs::Metrics;
///
/// let metrics = Metrics::new();
/// assert_eq!(metrics.total_tcells, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    // Ligand losing
    pub total_lost_peptide_mhc: i64,
    pub total_lost_cd80: i64,
    pub total_lost_cd86: i64,

    // Receptor engagement
    pub total_engaged_cd28: i64,
    pub total_engaged_external_ctla4: i64,

    // APC downregulation / ligands
    pub total_amount_peptide_mhc: i64,
    pub total_amount_cd80: i64,
    pub total_amount_cd86: i64,

    // T-Cell downregulation / receptors
    pub total_amount_tcr: i64,
    pub total_amount_cd28: i64,
    pub total_amount_external_ctla4: i64,
    pub total_amount_internal_ctla4: i64,

    // Total cell counts
    pub total_apc: i64,
    pub total_tcells: i64,

    // Treg population by state
    pub total_treg_inactive: i64,
    pub total_treg_active: i64,
    pub total_treg_anergic: i64,

    // Tconv population by state
    pub total_tconv_inactive: i64,
    pub total_tconv_active: i64,
    pub total_tconv_anergic: i64,

    // Stochastic lifecycle occurrences (recorded by the lifecycle collaborator)
    pub total_apoptosis: i64,
    pub total_division: i64,
    pub total_quiescence: i64,
}

impl Metrics {
    /// Create a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the counters for per-tick sampling.
    pub fn snapshot(&self) -> Metrics {
        self.clone()
    }

    /// Population bucket for a `(kind, state)` pair.
    ///
    /// A T-Cell awaiting co-activation is still counted in the inactive
    /// bucket; only the ACTIVE and ANERGIC transitions move it out.
    fn population_bucket_mut(&mut self, kind: TCellKind, state: TCellState) -> &mut i64 {
        match (kind, state) {
            (TCellKind::Treg, TCellState::Inactive | TCellState::AwaitingCoactivation) => {
                &mut self.total_treg_inactive
            }
            (TCellKind::Treg, TCellState::Active) => &mut self.total_treg_active,
            (TCellKind::Treg, TCellState::Anergic) => &mut self.total_treg_anergic,
            (TCellKind::Tconv, TCellState::Inactive | TCellState::AwaitingCoactivation) => {
                &mut self.total_tconv_inactive
            }
            (TCellKind::Tconv, TCellState::Active) => &mut self.total_tconv_active,
            (TCellKind::Tconv, TCellState::Anergic) => &mut self.total_tconv_anergic,
        }
    }

    pub(crate) fn incr_population(&mut self, kind: TCellKind, state: TCellState) {
        *self.population_bucket_mut(kind, state) += 1;
    }

    pub(crate) fn decr_population(&mut self, kind: TCellKind, state: TCellState) {
        *self.population_bucket_mut(kind, state) -= 1;
    }

    /// Amount counter tracking the given ligand.
    pub(crate) fn ligand_amount_mut(&mut self, ligand: Ligand) -> &mut i64 {
        match ligand {
            Ligand::Cd80 => &mut self.total_amount_cd80,
            Ligand::Cd86 => &mut self.total_amount_cd86,
        }
    }

    pub(crate) fn record_lost_ligand(&mut self, ligand: Ligand) {
        match ligand {
            Ligand::Cd80 => self.total_lost_cd80 += 1,
            Ligand::Cd86 => self.total_lost_cd86 += 1,
        }
    }

    pub(crate) fn add_apc_amounts(&mut self, quantities: &ApcQuantities) {
        self.total_amount_peptide_mhc += i64::from(quantities.peptide_mhc);
        self.total_amount_cd80 += i64::from(quantities.cd80);
        self.total_amount_cd86 += i64::from(quantities.cd86);
    }

    pub(crate) fn sub_apc_amounts(&mut self, quantities: &ApcQuantities) {
        self.total_amount_peptide_mhc -= i64::from(quantities.peptide_mhc);
        self.total_amount_cd80 -= i64::from(quantities.cd80);
        self.total_amount_cd86 -= i64::from(quantities.cd86);
    }

    pub(crate) fn add_tcell_amounts(&mut self, quantities: &TCellQuantities) {
        self.total_amount_tcr += i64::from(quantities.tcr);
        self.total_amount_cd28 += i64::from(quantities.cd28);
        self.total_amount_external_ctla4 += i64::from(quantities.external_ctla4);
        self.total_amount_internal_ctla4 += i64::from(quantities.internal_ctla4);
    }

    pub(crate) fn sub_tcell_amounts(&mut self, quantities: &TCellQuantities) {
        self.total_amount_tcr -= i64::from(quantities.tcr);
        self.total_amount_cd28 -= i64::from(quantities.cd28);
        self.total_amount_external_ctla4 -= i64::from(quantities.external_ctla4);
        self.total_amount_internal_ctla4 -= i64::from(quantities.internal_ctla4);
    }
}
