//! Event logging for simulation auditing.
//!
//! This module defines the Event enum which captures the significant
//! state changes produced by the interaction engine. Events enable:
//! - Debugging (understand what happened and when)
//! - Auditing (verify correctness of interactions)
//! - Analysis (extract patterns from the interaction history)
//!
//! # Event Types
//!
//! - **Bound / ForcedUnbind**: friendship protocol transitions
//! - **TcrEngaged**: TCR to peptide-MHC binding
//! - **CoStimMatched**: a ligand/receptor pair consumed
//! - **Activated / BecameAnergic**: terminal-direction state transitions
//! - **LigandLost**: statistical ligand loss recorded on an APC

use crate::models::{CellId, Ligand, Receptor, TCellKind};

/// Simulation event capturing a state change.
///
/// All events include a tick number for temporal ordering. Events are
/// logged in the order they occur within a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A T-Cell bound to an APC (friendship established)
    Bound {
        tick: u64,
        tcell: CellId,
        apc: CellId,
    },

    /// Contact-loss tolerance expired: the T-Cell was force-unbound from
    /// its previous partner while adjacent to a different APC
    ForcedUnbind {
        tick: u64,
        tcell: CellId,
        previous_apc: CellId,
        apc: CellId,
    },

    /// One TCR bound one peptide-MHC complex
    TcrEngaged {
        tick: u64,
        tcell: CellId,
        apc: CellId,
    },

    /// A receptor won a co-stimulatory ligand
    CoStimMatched {
        tick: u64,
        tcell: CellId,
        apc: CellId,
        ligand: Ligand,
        receptor: Receptor,
    },

    /// A T-Cell crossed the CD28 threshold and became active
    Activated {
        tick: u64,
        tcell: CellId,
        kind: TCellKind,
    },

    /// A T-Cell required co-stimulation but received none (terminal)
    BecameAnergic {
        tick: u64,
        tcell: CellId,
        kind: TCellKind,
    },

    /// A hypothetical ligand loss was recorded on an APC
    LigandLost {
        tick: u64,
        apc: CellId,
        ligand: Ligand,
    },
}

impl Event {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> u64 {
        match self {
            Event::Bound { tick, .. } => *tick,
            Event::ForcedUnbind { tick, .. } => *tick,
            Event::TcrEngaged { tick, .. } => *tick,
            Event::CoStimMatched { tick, .. } => *tick,
            Event::Activated { tick, .. } => *tick,
            Event::BecameAnergic { tick, .. } => *tick,
            Event::LigandLost { tick, .. } => *tick,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Bound { .. } => "Bound",
            Event::ForcedUnbind { .. } => "ForcedUnbind",
            Event::TcrEngaged { .. } => "TcrEngaged",
            Event::CoStimMatched { .. } => "CoStimMatched",
            Event::Activated { .. } => "Activated",
            Event::BecameAnergic { .. } => "BecameAnergic",
            Event::LigandLost { .. } => "LigandLost",
        }
    }

    /// Get the T-Cell involved, if any
    pub fn tcell_id(&self) -> Option<CellId> {
        match self {
            Event::Bound { tcell, .. } => Some(*tcell),
            Event::ForcedUnbind { tcell, .. } => Some(*tcell),
            Event::TcrEngaged { tcell, .. } => Some(*tcell),
            Event::CoStimMatched { tcell, .. } => Some(*tcell),
            Event::Activated { tcell, .. } => Some(*tcell),
            Event::BecameAnergic { tcell, .. } => Some(*tcell),
            Event::LigandLost { .. } => None,
        }
    }

    /// Get the APC involved, if any
    pub fn apc_id(&self) -> Option<CellId> {
        match self {
            Event::Bound { apc, .. } => Some(*apc),
            Event::ForcedUnbind { apc, .. } => Some(*apc),
            Event::TcrEngaged { apc, .. } => Some(*apc),
            Event::CoStimMatched { apc, .. } => Some(*apc),
            Event::Activated { .. } => None,
            Event::BecameAnergic { .. } => None,
            Event::LigandLost { apc, .. } => Some(*apc),
        }
    }
}

/// Event log for storing and querying simulation events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: u64) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events involving a specific cell (as T-Cell or APC)
    pub fn events_for_cell(&self, id: CellId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.tcell_id() == Some(id) || e.apc_id() == Some(id))
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
