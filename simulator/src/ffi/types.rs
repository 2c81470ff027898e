//! Conversions between Python values and core types.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::engine::InteractionOutcome;
use crate::metrics::Metrics;
use crate::models::{TCellKind, TCellState};

/// Parse a T-Cell kind from its Python string form.
pub fn parse_kind(kind: &str) -> PyResult<TCellKind> {
    match kind {
        "treg" => Ok(TCellKind::Treg),
        "tconv" => Ok(TCellKind::Tconv),
        other => Err(PyValueError::new_err(format!(
            "unknown T-Cell kind {:?} (expected \"treg\" or \"tconv\")",
            other
        ))),
    }
}

/// Parse a T-Cell state from its Python string form.
pub fn parse_state(state: &str) -> PyResult<TCellState> {
    match state {
        "inactive" => Ok(TCellState::Inactive),
        "awaiting_coactivation" => Ok(TCellState::AwaitingCoactivation),
        "active" => Ok(TCellState::Active),
        "anergic" => Ok(TCellState::Anergic),
        other => Err(PyValueError::new_err(format!(
            "unknown T-Cell state {:?}",
            other
        ))),
    }
}

/// String form of a T-Cell state for Python callers.
pub fn state_tag(state: TCellState) -> &'static str {
    match state {
        TCellState::Inactive => "inactive",
        TCellState::AwaitingCoactivation => "awaiting_coactivation",
        TCellState::Active => "active",
        TCellState::Anergic => "anergic",
    }
}

/// Compact string form of an interaction outcome.
///
/// A TCR binding that chained into co-activation reports both halves,
/// e.g. `"tcr_bound/matched"`.
pub fn outcome_tag(outcome: &InteractionOutcome) -> String {
    match outcome {
        InteractionOutcome::Ignored => "ignored".to_string(),
        InteractionOutcome::NotEngaged => "not_engaged".to_string(),
        InteractionOutcome::ForcedUnbind => "forced_unbind".to_string(),
        InteractionOutcome::TcrNotBound => "tcr_not_bound".to_string(),
        InteractionOutcome::TcrBound(chained) => {
            format!("tcr_bound/{}", outcome_tag(chained))
        }
        InteractionOutcome::CoStimFailed => "costim_failed".to_string(),
        InteractionOutcome::NoLigand => "no_ligand".to_string(),
        InteractionOutcome::NoReceptor => "no_receptor".to_string(),
        InteractionOutcome::Matched { .. } => "matched".to_string(),
        InteractionOutcome::CtlaCycled { .. } => "ctla_cycled".to_string(),
        InteractionOutcome::Terminal => "terminal".to_string(),
    }
}

/// Build a Python dict from the aggregate counters.
pub fn metrics_to_py(py: Python<'_>, metrics: &Metrics) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);

    dict.set_item("total_lost_peptide_mhc", metrics.total_lost_peptide_mhc)?;
    dict.set_item("total_lost_cd80", metrics.total_lost_cd80)?;
    dict.set_item("total_lost_cd86", metrics.total_lost_cd86)?;

    dict.set_item("total_engaged_cd28", metrics.total_engaged_cd28)?;
    dict.set_item(
        "total_engaged_external_ctla4",
        metrics.total_engaged_external_ctla4,
    )?;

    dict.set_item("total_amount_peptide_mhc", metrics.total_amount_peptide_mhc)?;
    dict.set_item("total_amount_cd80", metrics.total_amount_cd80)?;
    dict.set_item("total_amount_cd86", metrics.total_amount_cd86)?;

    dict.set_item("total_amount_tcr", metrics.total_amount_tcr)?;
    dict.set_item("total_amount_cd28", metrics.total_amount_cd28)?;
    dict.set_item(
        "total_amount_external_ctla4",
        metrics.total_amount_external_ctla4,
    )?;
    dict.set_item(
        "total_amount_internal_ctla4",
        metrics.total_amount_internal_ctla4,
    )?;

    dict.set_item("total_apc", metrics.total_apc)?;
    dict.set_item("total_tcells", metrics.total_tcells)?;

    dict.set_item("total_treg_inactive", metrics.total_treg_inactive)?;
    dict.set_item("total_treg_active", metrics.total_treg_active)?;
    dict.set_item("total_treg_anergic", metrics.total_treg_anergic)?;
    dict.set_item("total_tconv_inactive", metrics.total_tconv_inactive)?;
    dict.set_item("total_tconv_active", metrics.total_tconv_active)?;
    dict.set_item("total_tconv_anergic", metrics.total_tconv_anergic)?;

    dict.set_item("total_apoptosis", metrics.total_apoptosis)?;
    dict.set_item("total_division", metrics.total_division)?;
    dict.set_item("total_quiescence", metrics.total_quiescence)?;

    Ok(dict.into())
}
