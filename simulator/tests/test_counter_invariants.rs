//! Property tests for the bookkeeping invariants: quantities never go
//! negative, and every aggregate amount counter equals the sum of that
//! quantity over the live entity records, at every tick boundary.

use proptest::prelude::*;

use immune_simulator_core_rs::models::{TCellKind, TCellState};
use immune_simulator_core_rs::{CellId, InteractionEngine, SimulationConfig};

const NUM_APCS: u64 = 3;
const NUM_TCELLS: u64 = 4;

fn build_engine(seed: u64) -> InteractionEngine {
    let mut engine = InteractionEngine::new(SimulationConfig::default(), seed).unwrap();

    for id in 0..NUM_APCS {
        engine.spawn_apc(CellId(100 + id)).unwrap();
    }
    for id in 0..NUM_TCELLS {
        let kind = if id % 2 == 0 {
            TCellKind::Treg
        } else {
            TCellKind::Tconv
        };
        engine
            .spawn_tcell(CellId(id), kind, TCellState::Inactive)
            .unwrap();
    }

    engine
}

fn check_amount_invariants(engine: &InteractionEngine) -> Result<(), TestCaseError> {
    let totals = engine.state().quantity_totals();
    let metrics = engine.metrics();

    // Counter == live-entity sum, per quantity
    prop_assert_eq!(totals.peptide_mhc, metrics.total_amount_peptide_mhc);
    prop_assert_eq!(totals.cd80, metrics.total_amount_cd80);
    prop_assert_eq!(totals.cd86, metrics.total_amount_cd86);
    prop_assert_eq!(totals.tcr, metrics.total_amount_tcr);
    prop_assert_eq!(totals.cd28, metrics.total_amount_cd28);
    prop_assert_eq!(totals.external_ctla4, metrics.total_amount_external_ctla4);
    prop_assert_eq!(totals.internal_ctla4, metrics.total_amount_internal_ctla4);

    // No counter ever observes phantom negative consumption
    prop_assert!(metrics.total_amount_peptide_mhc >= 0);
    prop_assert!(metrics.total_amount_cd80 >= 0);
    prop_assert!(metrics.total_amount_cd86 >= 0);
    prop_assert!(metrics.total_amount_tcr >= 0);
    prop_assert!(metrics.total_amount_cd28 >= 0);
    prop_assert!(metrics.total_amount_external_ctla4 >= 0);
    prop_assert!(metrics.total_amount_internal_ctla4 >= 0);

    Ok(())
}

/// Population buckets account for every live T-Cell. This holds only
/// while no records have been removed: the bucket decrement at death
/// belongs to the lifecycle collaborator, not to removal.
fn check_population_buckets(engine: &InteractionEngine) -> Result<(), TestCaseError> {
    let metrics = engine.metrics();

    prop_assert_eq!(
        metrics.total_treg_inactive
            + metrics.total_treg_active
            + metrics.total_treg_anergic
            + metrics.total_tconv_inactive
            + metrics.total_tconv_active
            + metrics.total_tconv_anergic,
        engine.state().num_tcells() as i64
    );

    Ok(())
}

proptest! {
    /// Arbitrary interaction schedules keep the counters exact.
    #[test]
    fn counters_match_live_sums(
        seed in any::<u64>(),
        pairs in prop::collection::vec((0..NUM_TCELLS, 0..NUM_APCS), 0..200),
    ) {
        let mut engine = build_engine(seed);

        for (tick, (tcell, apc)) in pairs.iter().enumerate() {
            engine
                .interact(CellId(*tcell), CellId(100 + *apc), tick as u64)
                .unwrap();
            check_amount_invariants(&engine)?;
            check_population_buckets(&engine)?;
        }
    }

    /// Removing records (the lifecycle collaborator's path) keeps the
    /// counters exact, all the way down to an empty registry.
    #[test]
    fn removal_preserves_counter_exactness(
        seed in any::<u64>(),
        pairs in prop::collection::vec((0..NUM_TCELLS, 0..NUM_APCS), 0..100),
    ) {
        let mut engine = build_engine(seed);

        for (tick, (tcell, apc)) in pairs.iter().enumerate() {
            engine
                .interact(CellId(*tcell), CellId(100 + *apc), tick as u64)
                .unwrap();
        }

        for id in 0..NUM_TCELLS {
            engine.remove_cell(CellId(id)).unwrap();
            check_amount_invariants(&engine)?;
        }
        for id in 0..NUM_APCS {
            engine.remove_cell(CellId(100 + id)).unwrap();
            check_amount_invariants(&engine)?;
        }

        let metrics = engine.metrics();
        prop_assert_eq!(metrics.total_amount_peptide_mhc, 0);
        prop_assert_eq!(metrics.total_amount_cd80, 0);
        prop_assert_eq!(metrics.total_amount_cd86, 0);
        prop_assert_eq!(metrics.total_amount_tcr, 0);
        prop_assert_eq!(metrics.total_amount_cd28, 0);
        prop_assert_eq!(metrics.total_amount_external_ctla4, 0);
        prop_assert_eq!(metrics.total_amount_internal_ctla4, 0);
    }

    /// A T-Cell with zero TCR never leaves INACTIVE under any schedule.
    #[test]
    fn zero_tcr_never_leaves_inactive(
        seed in any::<u64>(),
        pairs in prop::collection::vec((0..NUM_TCELLS, 0..NUM_APCS), 0..200),
    ) {
        let mut config = SimulationConfig::default();
        config.treg_quantities.tcr = 0;
        config.tconv_quantities.tcr = 0;

        let mut engine = InteractionEngine::new(config, seed).unwrap();
        for id in 0..NUM_APCS {
            engine.spawn_apc(CellId(100 + id)).unwrap();
        }
        for id in 0..NUM_TCELLS {
            let kind = if id % 2 == 0 { TCellKind::Treg } else { TCellKind::Tconv };
            engine.spawn_tcell(CellId(id), kind, TCellState::Inactive).unwrap();
        }

        for (tick, (tcell, apc)) in pairs.iter().enumerate() {
            engine
                .interact(CellId(*tcell), CellId(100 + *apc), tick as u64)
                .unwrap();
        }

        for id in 0..NUM_TCELLS {
            prop_assert_eq!(
                engine.state().tcell(CellId(id)).unwrap().state(),
                TCellState::Inactive
            );
        }
    }
}
