//! Scenario tests for the activation state machine: threshold-based CD28
//! activation, anergy on failed co-stimulation, and CTLA-4 clamped
//! double-consumption.

use immune_simulator_core_rs::models::{TCellKind, TCellState};
use immune_simulator_core_rs::{CellId, InteractionEngine, InteractionOutcome, SimulationConfig};

const APC: CellId = CellId(1);
const TCELL: CellId = CellId(2);

fn assert_counters_match_live_sums(engine: &InteractionEngine) {
    let totals = engine.state().quantity_totals();
    let metrics = engine.metrics();

    assert_eq!(totals.peptide_mhc, metrics.total_amount_peptide_mhc);
    assert_eq!(totals.cd80, metrics.total_amount_cd80);
    assert_eq!(totals.cd86, metrics.total_amount_cd86);
    assert_eq!(totals.tcr, metrics.total_amount_tcr);
    assert_eq!(totals.cd28, metrics.total_amount_cd28);
    assert_eq!(totals.external_ctla4, metrics.total_amount_external_ctla4);
    assert_eq!(totals.internal_ctla4, metrics.total_amount_internal_ctla4);
}

/// A conventional T-Cell with no CTLA-4 always matches CD28; three
/// matches against the default threshold of 2 activate it.
#[test]
fn tconv_activates_after_three_cd28_matches() {
    let mut engine = InteractionEngine::new(SimulationConfig::default(), 42).unwrap();
    engine.spawn_apc(APC).unwrap();
    engine
        .spawn_tcell(TCELL, TCellKind::Tconv, TCellState::Inactive)
        .unwrap();

    // Tick 0: TCR binds and the chained co-activation lands the first
    // CD28 match
    let outcome = engine.interact(TCELL, APC, 0).unwrap();
    match outcome {
        InteractionOutcome::TcrBound(chained) => match *chained {
            InteractionOutcome::Matched {
                activated: false, ..
            } => {}
            other => panic!("expected a non-activating match, got {:?}", other),
        },
        other => panic!("expected TCR binding, got {:?}", other),
    }
    assert_eq!(
        engine.state().tcell(TCELL).unwrap().state(),
        TCellState::AwaitingCoactivation
    );

    // Tick 1: second match, still below threshold
    let outcome = engine.interact(TCELL, APC, 1).unwrap();
    assert!(matches!(
        outcome,
        InteractionOutcome::Matched {
            activated: false,
            ..
        }
    ));

    // Tick 2: third match exceeds the threshold of 2
    let outcome = engine.interact(TCELL, APC, 2).unwrap();
    assert!(matches!(
        outcome,
        InteractionOutcome::Matched {
            activated: true,
            ..
        }
    ));

    let tcell = engine.state().tcell(TCELL).unwrap();
    assert_eq!(tcell.state(), TCellState::Active);
    assert_eq!(tcell.cd28(), 22);
    assert_eq!(tcell.bound_cd28(), 3);

    // Activation grants the conventional cell its CTLA-4
    assert_eq!(tcell.external_ctla4(), 1);
    assert_eq!(tcell.internal_ctla4(), 1);

    // One TCR and one peptide-MHC were consumed at binding; three ligand
    // units were consumed by the matches
    assert_eq!(tcell.tcr(), 49);
    let apc = engine.state().apc(APC).unwrap();
    assert_eq!(apc.peptide_mhc(), 9);
    assert_eq!(apc.cd80() + apc.cd86(), 27);

    // Population counters moved from inactive to active
    let metrics = engine.metrics();
    assert_eq!(metrics.total_tconv_inactive, 0);
    assert_eq!(metrics.total_tconv_active, 1);
    assert_eq!(metrics.total_tcells, 1);
    assert_eq!(metrics.total_engaged_cd28, 3);

    assert_counters_match_live_sums(&engine);
}

/// An APC without co-stimulatory ligands turns an awaiting T-Cell
/// anergic, moving it from the inactive to the anergic bucket.
#[test]
fn costim_failure_turns_cell_anergic() {
    let mut config = SimulationConfig::default();
    config.apc_quantities.cd80 = 0;
    config.apc_quantities.cd86 = 0;

    let mut engine = InteractionEngine::new(config, 42).unwrap();
    engine.spawn_apc(APC).unwrap();
    engine
        .spawn_tcell(TCELL, TCellKind::Tconv, TCellState::Inactive)
        .unwrap();

    assert_eq!(engine.metrics().total_tconv_inactive, 1);

    // TCR binds (peptide-MHC is present), then the chained co-activation
    // finds no ligand at all
    let outcome = engine.interact(TCELL, APC, 0).unwrap();
    assert_eq!(
        outcome,
        InteractionOutcome::TcrBound(Box::new(InteractionOutcome::CoStimFailed))
    );

    let tcell = engine.state().tcell(TCELL).unwrap();
    assert_eq!(tcell.state(), TCellState::Anergic);
    assert!(tcell.is_killed());

    let metrics = engine.metrics();
    assert_eq!(metrics.total_tconv_anergic, 1);
    assert_eq!(metrics.total_tconv_inactive, 0);
    assert_eq!(metrics.total_tcells, 0);

    // Terminal: further contact does nothing
    let outcome = engine.interact(TCELL, APC, 1).unwrap();
    assert_eq!(outcome, InteractionOutcome::Terminal);
    assert_eq!(engine.metrics().total_tconv_anergic, 1);

    assert_counters_match_live_sums(&engine);
}

/// The same failure path for a regulatory cell moves the Treg buckets.
#[test]
fn treg_costim_failure_moves_treg_buckets() {
    let mut config = SimulationConfig::default();
    config.apc_quantities.cd80 = 0;
    config.apc_quantities.cd86 = 0;

    let mut engine = InteractionEngine::new(config, 42).unwrap();
    engine.spawn_apc(APC).unwrap();
    engine
        .spawn_tcell(TCELL, TCellKind::Treg, TCellState::Inactive)
        .unwrap();

    engine.interact(TCELL, APC, 0).unwrap();

    let metrics = engine.metrics();
    assert_eq!(metrics.total_treg_anergic, 1);
    assert_eq!(metrics.total_treg_inactive, 0);
    assert_eq!(metrics.total_tconv_anergic, 0);
}

/// CTLA-4 consumes two ligand units per binding, but against a single
/// remaining CD80 the count clamps at zero and the aggregate counter
/// moves by the one unit actually consumed.
#[test]
fn ctla4_double_consumption_clamps_at_zero() {
    let mut config = SimulationConfig::default();
    config.apc_quantities.cd80 = 1;
    config.apc_quantities.cd86 = 0;
    // No CD28: the receptor choice is deterministically CTLA-4
    config.treg_quantities.cd28 = 0;

    let mut engine = InteractionEngine::new(config, 42).unwrap();
    engine.spawn_apc(APC).unwrap();
    engine
        .spawn_tcell(TCELL, TCellKind::Treg, TCellState::Inactive)
        .unwrap();

    assert_eq!(engine.metrics().total_amount_cd80, 1);

    let outcome = engine.interact(TCELL, APC, 0).unwrap();
    match outcome {
        InteractionOutcome::TcrBound(chained) => {
            assert!(matches!(*chained, InteractionOutcome::Matched { .. }))
        }
        other => panic!("expected TCR binding, got {:?}", other),
    }

    let apc = engine.state().apc(APC).unwrap();
    assert_eq!(apc.cd80(), 0, "CD80 clamps at zero, never negative");

    // Decremented by exactly 1 (the actual consumption), not 2
    assert_eq!(engine.metrics().total_amount_cd80, 0);
    assert_eq!(engine.metrics().total_engaged_external_ctla4, 1);
    assert_eq!(engine.state().tcell(TCELL).unwrap().external_ctla4(), 9);

    assert_counters_match_live_sums(&engine);
}

/// Activation does not grant extra CTLA-4 to a regulatory cell; it is
/// pre-stocked at creation.
#[test]
fn treg_activation_grants_no_extra_ctla4() {
    let mut config = SimulationConfig::default();
    // No external CTLA-4: every match is CD28, so the Treg activates
    // deterministically like a conventional cell
    config.treg_quantities.external_ctla4 = 0;

    let mut engine = InteractionEngine::new(config, 42).unwrap();
    engine.spawn_apc(APC).unwrap();
    engine
        .spawn_tcell(TCELL, TCellKind::Treg, TCellState::Inactive)
        .unwrap();

    for tick in 0..3 {
        engine.interact(TCELL, APC, tick).unwrap();
    }

    let tcell = engine.state().tcell(TCELL).unwrap();
    assert_eq!(tcell.state(), TCellState::Active);
    assert_eq!(tcell.external_ctla4(), 0);
    assert_eq!(tcell.internal_ctla4(), 0);
    assert_eq!(engine.metrics().total_treg_active, 1);
}
