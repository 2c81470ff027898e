//! Simulation configuration
//!
//! A fixed table of named constants (thresholds, wait times, initial
//! surface quantities, binding-affinity weight vectors) supplied at
//! process start and read-only at simulation time.
//!
//! The defaults reproduce the published co-activation model: CD28
//! activation threshold of 2, a 10-tick contact-loss tolerance, and the
//! receptor affinity weights for CD80 and CD86.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Ligand, TCellKind};

/// Tolerance when checking that a weight pair sums to 1.0.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Errors produced by configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{ligand:?} receptor weights must sum to 1.0, got {sum}")]
    WeightSumMismatch { ligand: Ligand, sum: f64 },

    #[error("{ligand:?} receptor weights must lie in [0.0, 1.0]")]
    WeightOutOfRange { ligand: Ligand },

    #[error("wait_time must be > 0")]
    ZeroWaitTime,

    #[error("ctla4_cycle_period must be > 0")]
    ZeroCyclePeriod,
}

/// Initial surface quantities for an antigen presenting cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApcQuantities {
    /// Peptide-MHC complexes available for TCR binding
    pub peptide_mhc: u32,
    /// CD80 ligand count
    pub cd80: u32,
    /// CD86 ligand count
    pub cd86: u32,
}

/// Initial surface quantities for a T-Cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TCellQuantities {
    /// T-Cell receptor count
    pub tcr: u32,
    /// CD28 co-stimulatory receptor count
    pub cd28: u32,
    /// CTLA-4 on the cell surface
    pub external_ctla4: u32,
    /// CTLA-4 held inside the cell
    pub internal_ctla4: u32,
}

/// Receptor binding weights for one ligand.
///
/// Order is semantic: weight vectors are always [CTLA-4, CD28], matching
/// the order in which available receptors are collected during
/// co-activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceptorWeights {
    /// Probability that CTLA-4 wins the binding
    pub ctla4: f64,
    /// Probability that CD28 wins the binding
    pub cd28: f64,
}

impl ReceptorWeights {
    /// Weight vector in receptor collection order ([CTLA-4, CD28]).
    pub fn as_vector(&self) -> [f64; 2] {
        [self.ctla4, self.cd28]
    }

    fn validate(&self, ligand: Ligand) -> Result<(), ConfigError> {
        let in_range = |w: f64| (0.0..=1.0).contains(&w);
        if !in_range(self.ctla4) || !in_range(self.cd28) {
            return Err(ConfigError::WeightOutOfRange { ligand });
        }

        let sum = self.ctla4 + self.cd28;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSumMismatch { ligand, sum });
        }

        Ok(())
    }
}

/// Complete simulation configuration.
///
/// # Example
///
/// ```
/// use immune_simulator_core_rs::SimulationConfig;
///
/// let config = SimulationConfig::default();
/// assert_eq!(config.cd28_threshold, 2);
/// assert_eq!(config.wait_time, 10);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Bound-CD28 count that must be exceeded for a T-Cell to activate
    pub cd28_threshold: u32,

    /// Ticks of lost contact tolerated before a forced unbind
    pub wait_time: u64,

    /// The ACTIVE-state CTLA-4 internalization toggle flips on every tick
    /// where `tick % ctla4_cycle_period == 0`
    pub ctla4_cycle_period: u64,

    /// Initial quantities for APCs
    pub apc_quantities: ApcQuantities,

    /// Initial quantities for regulatory T-Cells
    pub treg_quantities: TCellQuantities,

    /// Initial quantities for conventional T-Cells
    pub tconv_quantities: TCellQuantities,

    /// Receptor weights when the chosen ligand is CD80
    pub cd80_weights: ReceptorWeights,

    /// Receptor weights when the chosen ligand is CD86
    pub cd86_weights: ReceptorWeights,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cd28_threshold: 2,
            wait_time: 10,
            ctla4_cycle_period: 10,
            apc_quantities: ApcQuantities {
                peptide_mhc: 10,
                cd80: 15,
                cd86: 15,
            },
            treg_quantities: TCellQuantities {
                tcr: 50,
                cd28: 25,
                external_ctla4: 10,
                internal_ctla4: 0,
            },
            tconv_quantities: TCellQuantities {
                tcr: 50,
                cd28: 25,
                // Tconv acquires CTLA-4 only upon activation
                external_ctla4: 0,
                internal_ctla4: 0,
            },
            cd80_weights: ReceptorWeights {
                ctla4: 0.9524,
                cd28: 0.0476,
            },
            cd86_weights: ReceptorWeights {
                ctla4: 0.8837,
                cd28: 0.1163,
            },
        }
    }
}

impl SimulationConfig {
    /// Validate the configuration.
    ///
    /// Checks that each receptor weight pair sums to 1.0 and that the
    /// timing constants are nonzero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wait_time == 0 {
            return Err(ConfigError::ZeroWaitTime);
        }
        if self.ctla4_cycle_period == 0 {
            return Err(ConfigError::ZeroCyclePeriod);
        }
        self.cd80_weights.validate(Ligand::Cd80)?;
        self.cd86_weights.validate(Ligand::Cd86)?;
        Ok(())
    }

    /// Parse a configuration from JSON (used at the FFI boundary).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Receptor weight vector for the given ligand, in [CTLA-4, CD28] order.
    pub fn weights_for(&self, ligand: Ligand) -> [f64; 2] {
        match ligand {
            Ligand::Cd80 => self.cd80_weights.as_vector(),
            Ligand::Cd86 => self.cd86_weights.as_vector(),
        }
    }

    /// Initial quantities for a T-Cell of the given kind.
    pub fn tcell_quantities(&self, kind: TCellKind) -> TCellQuantities {
        match kind {
            TCellKind::Treg => self.treg_quantities,
            TCellKind::Tconv => self.tconv_quantities,
        }
    }
}
