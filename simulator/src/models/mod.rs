//! Domain types (APC, TCell, SimulationState, Event)

pub mod apc;
pub mod event;
pub mod state;
pub mod tcell;

pub use apc::Apc;
pub use event::{Event, EventLog};
pub use state::{CellClass, QuantityTotals, SimulationState};
pub use tcell::TCell;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a cell, assigned by the external spatial engine.
///
/// The core never generates identifiers; the spatial simulation owns them
/// and the engine keeps an id-to-record registry (see
/// [`state::SimulationState`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell_{}", self.0)
    }
}

/// T-Cell subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TCellKind {
    /// Regulatory T-Cell (starts with external CTLA-4 pre-stocked)
    Treg,
    /// Conventional T-Cell (acquires CTLA-4 upon activation)
    Tconv,
}

/// Activation state of a T-Cell.
///
/// Transitions: `Inactive → AwaitingCoactivation → Active`, or
/// `AwaitingCoactivation → Anergic` (terminal, on failed co-stimulation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TCellState {
    Inactive,
    AwaitingCoactivation,
    Active,
    Anergic,
}

/// Co-stimulatory ligand presented by an APC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ligand {
    Cd80,
    Cd86,
}

/// T-Cell receptor competing for a co-stimulatory ligand.
///
/// Variant order is semantic: available receptors are always collected as
/// [CTLA-4, CD28], and the per-ligand weight vectors follow that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Receptor {
    Ctla4,
    Cd28,
}
