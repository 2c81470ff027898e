//! Tests for the friendship/contact protocol: binding, tolerance of lost
//! contact, forced unbinding, and the regulatory cell's parting ligand
//! theft.

use immune_simulator_core_rs::models::{TCellKind, TCellState};
use immune_simulator_core_rs::{CellId, InteractionEngine, InteractionOutcome, SimulationConfig};

const APC_A: CellId = CellId(1);
const APC_B: CellId = CellId(2);
const TCELL: CellId = CellId(3);

/// Engine with a CD28-free Treg so every co-stimulation deterministically
/// matches CTLA-4 and the cell never activates mid-scenario.
fn treg_engine() -> InteractionEngine {
    let mut config = SimulationConfig::default();
    config.treg_quantities.cd28 = 0;

    let mut engine = InteractionEngine::new(config, 42).unwrap();
    engine.spawn_apc(APC_A).unwrap();
    engine.spawn_apc(APC_B).unwrap();
    engine
        .spawn_tcell(TCELL, TCellKind::Treg, TCellState::Inactive)
        .unwrap();
    engine
}

/// A bound Treg that only sees a stranger APC is force-unbound once the
/// accumulated lost-contact time reaches the configured tolerance of 10
/// ticks: the previous partner is reset, the Treg itself is reset, and a
/// ligand loss is recorded on the stranger.
#[test]
fn forced_unbind_fires_once_after_wait_time() {
    let mut engine = treg_engine();

    // Bind to APC-A at tick 0 and keep interacting with it for 5 ticks,
    // depleting it along the way
    for tick in 0..5 {
        let outcome = engine.interact(TCELL, APC_A, tick).unwrap();
        assert!(
            !matches!(outcome, InteractionOutcome::NotEngaged),
            "tick {}: expected engagement with the partner",
            tick
        );
    }

    let apc_a = engine.state().apc(APC_A).unwrap();
    assert_eq!(apc_a.peptide_mhc(), 9);
    assert!(
        apc_a.cd80() + apc_a.cd86() < 30,
        "the partner should be depleted before the unbind"
    );
    assert_eq!(engine.state().tcell(TCELL).unwrap().bound_apc(), Some(APC_A));

    // From tick 5 on the cell is adjacent only to APC-B. The timer last
    // advanced at tick 0, so the tolerance of 10 expires at tick 10.
    for tick in 5..10 {
        let outcome = engine.interact(TCELL, APC_B, tick).unwrap();
        assert_eq!(
            outcome,
            InteractionOutcome::NotEngaged,
            "tick {}: still within the tolerance",
            tick
        );
    }

    let outcome = engine.interact(TCELL, APC_B, 10).unwrap();
    assert_eq!(outcome, InteractionOutcome::ForcedUnbind);

    // Exactly one forced unbind, at tick 10
    let unbinds = engine.event_log().events_of_type("ForcedUnbind");
    assert_eq!(unbinds.len(), 1);
    assert_eq!(unbinds[0].tick(), 10);

    // The previous partner is restored to its initial quantities
    let apc_a = engine.state().apc(APC_A).unwrap();
    assert_eq!(apc_a.peptide_mhc(), 10);
    assert_eq!(apc_a.cd80(), 15);
    assert_eq!(apc_a.cd86(), 15);

    // The Treg is reset: receptors restocked, bookkeeping cleared
    let tcell = engine.state().tcell(TCELL).unwrap();
    assert_eq!(tcell.bound_apc(), None);
    assert_eq!(tcell.external_ctla4(), 10);
    assert_eq!(tcell.tcr(), 50);
    assert_eq!(tcell.unbound_ticks(), 0);

    // The parting theft was recorded on APC-B without depleting it
    let metrics = engine.metrics();
    assert_eq!(metrics.total_lost_cd80 + metrics.total_lost_cd86, 1);
    let apc_b = engine.state().apc(APC_B).unwrap();
    assert_eq!(apc_b.cd80(), 15);
    assert_eq!(apc_b.cd86(), 15);

    // Counters still match the live records after the resets
    let totals = engine.state().quantity_totals();
    assert_eq!(totals.peptide_mhc, metrics.total_amount_peptide_mhc);
    assert_eq!(totals.cd80, metrics.total_amount_cd80);
    assert_eq!(totals.cd86, metrics.total_amount_cd86);
    assert_eq!(totals.tcr, metrics.total_amount_tcr);
    assert_eq!(totals.external_ctla4, metrics.total_amount_external_ctla4);
}

/// After the forced unbind the cell is free again and befriends the APC
/// it is actually touching.
#[test]
fn unbound_cell_rebinds_to_the_new_apc() {
    let mut engine = treg_engine();

    for tick in 0..5 {
        engine.interact(TCELL, APC_A, tick).unwrap();
    }
    for tick in 5..=10 {
        engine.interact(TCELL, APC_B, tick).unwrap();
    }

    // Tick 11: fresh binding to APC-B
    let outcome = engine.interact(TCELL, APC_B, 11).unwrap();
    assert!(matches!(outcome, InteractionOutcome::TcrBound(_)));
    assert_eq!(engine.state().tcell(TCELL).unwrap().bound_apc(), Some(APC_B));
}

/// Conventional cells do not steal a ligand when force-unbound.
#[test]
fn tconv_forced_unbind_records_no_ligand_loss() {
    let mut engine = InteractionEngine::new(SimulationConfig::default(), 42).unwrap();
    engine.spawn_apc(APC_A).unwrap();
    engine.spawn_apc(APC_B).unwrap();
    engine
        .spawn_tcell(TCELL, TCellKind::Tconv, TCellState::Inactive)
        .unwrap();

    engine.interact(TCELL, APC_A, 0).unwrap();
    for tick in 1..=10 {
        engine.interact(TCELL, APC_B, tick).unwrap();
    }

    assert_eq!(
        engine.event_log().events_of_type("ForcedUnbind").len(),
        1
    );
    assert_eq!(engine.metrics().total_lost_cd80, 0);
    assert_eq!(engine.metrics().total_lost_cd86, 0);
}

/// A partner already removed by the lifecycle collaborator is tolerated
/// at unbind time: the T-Cell still resets and rebinds cleanly.
#[test]
fn forced_unbind_tolerates_missing_partner() {
    let mut engine = treg_engine();

    for tick in 0..3 {
        engine.interact(TCELL, APC_A, tick).unwrap();
    }

    // The spatial simulation destroys APC-A
    engine.apply_apoptosis(APC_A).unwrap();
    engine.remove_cell(APC_A).unwrap();

    for tick in 3..20 {
        engine.interact(TCELL, APC_B, tick).unwrap();
    }

    let tcell = engine.state().tcell(TCELL).unwrap();
    assert_eq!(tcell.bound_apc(), Some(APC_B));
    assert_eq!(engine.event_log().events_of_type("ForcedUnbind").len(), 1);
}

/// While within the tolerance, contact with a stranger accumulates
/// unbound time but does not interact.
#[test]
fn stranger_contact_within_tolerance_is_inert() {
    let mut engine = treg_engine();

    engine.interact(TCELL, APC_A, 0).unwrap();
    let outcome = engine.interact(TCELL, APC_B, 3).unwrap();

    assert_eq!(outcome, InteractionOutcome::NotEngaged);
    let tcell = engine.state().tcell(TCELL).unwrap();
    assert_eq!(tcell.bound_apc(), Some(APC_A));
    assert_eq!(tcell.unbound_ticks(), 3);

    // The stranger was never consumed from
    let apc_b = engine.state().apc(APC_B).unwrap();
    assert_eq!(apc_b.peptide_mhc(), 10);
    assert_eq!(apc_b.cd80() + apc_b.cd86(), 30);
}
