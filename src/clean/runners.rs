//! Batch runner functions
//!
//! Contains the entry points for cleaning a batch of vias:
//! - `classify` over a prebuilt snapshot and index
//! - `run_clean` from a board document and settings

use crate::board::{BoardData, ViaId};
use crate::settings::CleanerSettings;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::checks;
use super::snapshot::{BoardSnapshot, CandidateSelection, ObstacleIndex};
use super::types::{
    ClearanceThresholds, CleanError, CleanReport, RemovedVia, RuleSet, Via, Violation,
    ViolationCounts,
};

/// Shared cancellation signal for a running batch
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Evaluate every candidate and collect the removal set
///
/// Each via is evaluated independently in parallel; counts are reduced after
/// all workers return. Removals are ordered by via id, so the result does not
/// depend on the order of `candidates`. A via id listed more than once is
/// checked and counted once. Once `cancel` is raised no further
/// via is evaluated and the whole batch returns `CleanError::Cancelled`.
pub fn classify(
    candidates: &[Via],
    snapshot: &BoardSnapshot,
    index: &ObstacleIndex,
    thresholds: &ClearanceThresholds,
    rules: &RuleSet,
    cancel: &CancelFlag,
) -> Result<CleanReport, CleanError> {
    let start = Instant::now();

    let mut verdicts: Vec<(ViaId, Option<Violation>)> = candidates
        .par_iter()
        .map(|via| {
            if cancel.is_cancelled() {
                return Err(CleanError::Cancelled);
            }
            Ok((via.id, checks::evaluate(via, snapshot, index, thresholds, rules)))
        })
        .collect::<Result<Vec<_>, CleanError>>()?;

    if cancel.is_cancelled() {
        return Err(CleanError::Cancelled);
    }

    // One verdict per via id; a repeated id keeps its highest-priority violation
    verdicts.sort_by_key(|(id, verdict)| (*id, verdict.is_none(), *verdict));
    verdicts.dedup_by_key(|(id, _)| *id);

    let mut counts = ViolationCounts::default();
    let removals: Vec<RemovedVia> = verdicts
        .iter()
        .filter_map(|(id, verdict)| verdict.map(|reason| RemovedVia { id: *id, reason }))
        .collect();
    for removal in &removals {
        counts.record(removal.reason);
    }

    let report = CleanReport {
        checked: verdicts.len(),
        kept: verdicts.len() - removals.len(),
        removals,
        counts,
        warnings: snapshot.warnings.clone(),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    log::info!(
        "Checked {} vias in {:.2}ms: {} to remove (outside board {}, component {}, net {}, edge {}, zone {})",
        report.checked,
        report.elapsed_ms,
        report.removals.len(),
        counts.outside_board,
        counts.component_collision,
        counts.net_collision,
        counts.board_edge_collision,
        counts.zone_collision
    );

    Ok(report)
}

/// Validate settings, build snapshot and index, then classify
///
/// The reported elapsed time covers the whole run, snapshot included.
pub fn run_clean(
    board: &BoardData,
    settings: &CleanerSettings,
    selection: CandidateSelection,
    cancel: &CancelFlag,
) -> Result<CleanReport, CleanError> {
    let start = Instant::now();
    let (thresholds, rules, cell_size) = settings.validate()?;

    log::info!(
        "Cleaning vias: clearance {:.3}mm, edge {:.3}mm, zone {:.3}mm",
        settings.min_clearance_mm,
        settings.board_edge_clearance_mm,
        settings.zone_clearance_mm
    );

    let snapshot = BoardSnapshot::build(board, &rules, selection);
    let index = ObstacleIndex::build(&snapshot, cell_size);

    let mut report = classify(
        &snapshot.candidates,
        &snapshot,
        &index,
        &thresholds,
        &rules,
        cancel,
    )?;
    report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    Ok(report)
}
