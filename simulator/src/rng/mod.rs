//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm for fast, deterministic random number
//! generation. CRITICAL: All randomness in the simulator MUST go through
//! this module.
//!
//! The interaction engine never touches the raw generator directly. It
//! draws through the [`ChoiceSource`] trait (uniform and weighted index
//! selection), so tests can substitute a scripted sequence of choices
//! while production code uses the seeded xorshift generator.

mod xorshift;

pub use xorshift::RngManager;

/// Source of uniform and weighted random choices.
///
/// This is the single seam through which the engine consumes randomness.
/// [`RngManager`] is the production implementation; [`ScriptedChoices`]
/// replays a fixed sequence for deterministic tests.
pub trait ChoiceSource {
    /// Pick an index uniformly from `0..len`.
    ///
    /// # Panics
    /// Panics if `len` is zero.
    fn uniform_index(&mut self, len: usize) -> usize;

    /// Pick an index with the given weights.
    ///
    /// Weights need not be normalized; selection is proportional to each
    /// weight's share of the total.
    ///
    /// # Panics
    /// Panics if `weights` is empty.
    fn weighted_index(&mut self, weights: &[f64]) -> usize;
}

impl ChoiceSource for RngManager {
    fn uniform_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot choose from an empty set");
        self.range(0, len as i64) as usize
    }

    fn weighted_index(&mut self, weights: &[f64]) -> usize {
        assert!(!weights.is_empty(), "cannot choose from an empty set");

        let total: f64 = weights.iter().sum();
        let mut target = self.next_f64() * total;

        for (index, weight) in weights.iter().enumerate() {
            target -= weight;
            if target <= 0.0 {
                return index;
            }
        }

        // Floating-point residue: fall back to the last index
        weights.len() - 1
    }
}

/// Replays a pre-programmed sequence of choice indices.
///
/// Every call to [`ChoiceSource::uniform_index`] or
/// [`ChoiceSource::weighted_index`] pops the next scripted index in order.
///
/// NOTE: Available in all builds to support integration testing,
/// but should only be used in test code.
///
/// # Panics
/// Panics when the script runs out of indices or a scripted index is out
/// of range for the requested choice.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChoices {
    indices: std::collections::VecDeque<usize>,
}

impl ScriptedChoices {
    /// Create a scripted source that yields `indices` in order.
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices: indices.into(),
        }
    }

    fn pop(&mut self, len: usize) -> usize {
        let index = self
            .indices
            .pop_front()
            .expect("scripted choices exhausted");
        assert!(
            index < len,
            "scripted index {} out of range for {} candidates",
            index,
            len
        );
        index
    }
}

impl ChoiceSource for ScriptedChoices {
    fn uniform_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot choose from an empty set");
        self.pop(len)
    }

    fn weighted_index(&mut self, weights: &[f64]) -> usize {
        assert!(!weights.is_empty(), "cannot choose from an empty set");
        self.pop(weights.len())
    }
}
