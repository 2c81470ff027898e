//! Antigen Presenting Cell model
//!
//! An APC owns three surface quantities: peptide-MHC complexes (bound by
//! the T-Cell receptor) and the CD80/CD86 co-stimulatory ligands (bound
//! by CTLA-4 or CD28). Quantities are consumed during interaction and
//! restored to their configured initial values whenever an engaged T-Cell
//! breaks contact.
//!
//! # Critical invariants
//!
//! 1. Quantities are never negative: consumption saturates at zero
//! 2. Every quantity change adjusts the matching aggregate counter by the
//!    amount actually consumed, never by the requested amount

use serde::{Deserialize, Serialize};

use crate::config::ApcQuantities;
use crate::metrics::Metrics;
use crate::models::{CellId, Ligand};
use crate::rng::ChoiceSource;

/// An antigen presenting cell record.
///
/// # Example
///
/// ```
/// use immune_simulator_core_rs::{Apc, CellId, Metrics, SimulationConfig};
///
/// let config = SimulationConfig::default();
/// let mut metrics = Metrics::new();
/// let apc = Apc::new(CellId(1), config.apc_quantities, &mut metrics);
///
/// assert_eq!(apc.peptide_mhc(), 10);
/// assert_eq!(metrics.total_amount_cd80, 15);
/// assert_eq!(metrics.total_apc, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apc {
    /// Identifier assigned by the spatial engine
    id: CellId,

    /// Configured initial quantities, restored on every reset
    initial: ApcQuantities,

    /// Current peptide-MHC count
    peptide_mhc: u32,

    /// Current CD80 ligand count
    cd80: u32,

    /// Current CD86 ligand count
    cd86: u32,
}

impl Apc {
    /// Create a new APC with the given initial quantities.
    ///
    /// Registers the cell and its quantities in the aggregate counters.
    pub fn new(id: CellId, quantities: ApcQuantities, metrics: &mut Metrics) -> Self {
        let mut apc = Self {
            id,
            initial: quantities,
            peptide_mhc: 0,
            cd80: 0,
            cd86: 0,
        };
        apc.restock(metrics);
        metrics.total_apc += 1;
        apc
    }

    /// Restore the configured initial quantities.
    ///
    /// Called whenever an engaged T-Cell breaks contact. Subtracts the
    /// current quantities from the aggregate counters before restocking so
    /// the counters stay equal to the live-entity sums.
    pub fn reset(&mut self, metrics: &mut Metrics) {
        metrics.sub_apc_amounts(&self.current_amounts());
        self.restock(metrics);
    }

    fn restock(&mut self, metrics: &mut Metrics) {
        self.peptide_mhc = self.initial.peptide_mhc;
        self.cd80 = self.initial.cd80;
        self.cd86 = self.initial.cd86;
        metrics.add_apc_amounts(&self.initial);
    }

    /// Get the cell identifier.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Current peptide-MHC count.
    pub fn peptide_mhc(&self) -> u32 {
        self.peptide_mhc
    }

    /// Current CD80 count.
    pub fn cd80(&self) -> u32 {
        self.cd80
    }

    /// Current CD86 count.
    pub fn cd86(&self) -> u32 {
        self.cd86
    }

    /// Current count of the given ligand.
    pub fn ligand(&self, ligand: Ligand) -> u32 {
        match ligand {
            Ligand::Cd80 => self.cd80,
            Ligand::Cd86 => self.cd86,
        }
    }

    /// Current quantities as a bundle (for counter bookkeeping).
    pub(crate) fn current_amounts(&self) -> ApcQuantities {
        ApcQuantities {
            peptide_mhc: self.peptide_mhc,
            cd80: self.cd80,
            cd86: self.cd86,
        }
    }

    /// Consume one peptide-MHC complex.
    ///
    /// Caller must have checked availability; the counter moves in
    /// lock-step.
    pub(crate) fn consume_peptide_mhc(&mut self, metrics: &mut Metrics) {
        assert!(self.peptide_mhc > 0, "peptide-MHC must be available");
        self.peptide_mhc -= 1;
        metrics.total_amount_peptide_mhc -= 1;
    }

    /// Consume up to `amount` units of a ligand, saturating at zero.
    ///
    /// The aggregate counter is decremented by the amount actually
    /// consumed, so over-consumption is credited back rather than
    /// producing a phantom negative quantity.
    ///
    /// # Returns
    /// The number of units actually consumed.
    pub(crate) fn consume_ligand(
        &mut self,
        ligand: Ligand,
        amount: u32,
        metrics: &mut Metrics,
    ) -> u32 {
        let available = self.ligand(ligand);
        let consumed = amount.min(available);

        match ligand {
            Ligand::Cd80 => self.cd80 -= consumed,
            Ligand::Cd86 => self.cd86 -= consumed,
        }
        *metrics.ligand_amount_mut(ligand) -= i64::from(consumed);

        consumed
    }

    /// Record the statistical loss of one ligand.
    ///
    /// Chooses among ligand types whose *initial configured* quantity is
    /// nonzero (a single candidate is picked deterministically) and
    /// increments the matching lost-ligand counter. Current quantities are
    /// left untouched: this tracks how many ligands would hypothetically
    /// be lost, it does not deplete the cell.
    ///
    /// # Returns
    /// The ligand recorded as lost, or `None` when neither ligand is
    /// configured.
    pub fn remove_ligand(
        &mut self,
        choices: &mut dyn ChoiceSource,
        metrics: &mut Metrics,
    ) -> Option<Ligand> {
        let mut candidates: Vec<Ligand> = Vec::with_capacity(2);
        if self.initial.cd80 > 0 {
            candidates.push(Ligand::Cd80);
        }
        if self.initial.cd86 > 0 {
            candidates.push(Ligand::Cd86);
        }

        if candidates.is_empty() {
            return None;
        }

        let ligand = if candidates.len() == 1 {
            candidates[0]
        } else {
            candidates[choices.uniform_index(candidates.len())]
        };

        metrics.record_lost_ligand(ligand);
        Some(ligand)
    }
}
