//! Interaction Engine
//!
//! The cell-interaction and state-transition core: binding/unbinding with
//! a contact-tolerance timer, stochastic ligand/receptor selection with
//! fixed affinity weights, threshold activation, ligand depletion, and
//! aggregate-counter bookkeeping.

mod interaction;

pub use interaction::{EngineError, InteractionEngine, InteractionOutcome};
