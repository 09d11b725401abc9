//! Clean handlers: CleanVias, CancelClean, GetReport, ApplyRemovals

use crate::clean::{run_clean, CancelFlag, CandidateSelection, CleanError};
use crate::lsp::protocol::{error_codes, Response};
use crate::lsp::state::{CleanAsyncResult, ServerState};
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

/// Handle CleanVias request asynchronously
///
/// The batch runs on a background thread over a copy of the board; its
/// outcome arrives on `tx` and is turned into a `cleanComplete` notification
/// by `handle_clean_complete`.
pub fn handle_clean_vias_async(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    tx: Option<Sender<CleanAsyncResult>>,
) -> Response {
    #[derive(Deserialize, Default)]
    struct CleanViasParams {
        #[serde(default)]
        all_vias: bool,
    }

    let params: CleanViasParams = params
        .and_then(|p| serde_json::from_value(p).ok())
        .unwrap_or_default();

    let board = match &state.board {
        Some(board) => board.clone(),
        None => {
            return Response::error(id, error_codes::NO_BOARD_LOADED,
                "No board loaded. Call Load first.".to_string());
        }
    };

    if state.is_cleaning() {
        return Response::error(id, error_codes::CLEAN_IN_PROGRESS,
            "A clean batch is already running".to_string());
    }

    // Reject bad settings before spawning anything
    if let Err(e) = state.settings.validate() {
        return Response::error(id, error_codes::INVALID_PARAMS, e.to_string());
    }

    let tx = match tx {
        Some(tx) => tx,
        None => {
            return Response::error(id, error_codes::INTERNAL_ERROR,
                "Clean channel not available".to_string());
        }
    };

    let selection = if params.all_vias {
        CandidateSelection::All
    } else {
        CandidateSelection::Selected
    };
    let settings = state.settings.clone();
    let cancel = CancelFlag::new();
    state.running = Some(cancel.clone());
    state.last_report = None;

    log::info!("Starting clean batch ({:?} vias)", selection);

    thread::spawn(move || {
        let start = Instant::now();
        let result = run_clean(&board, &settings, selection, &cancel);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let _ = tx.send(CleanAsyncResult { result, elapsed_ms });
    });

    Response::success(id, serde_json::json!({
        "status": "started",
        "message": "Via cleaning running in background"
    }))
}

/// Record a finished batch and build the `cleanComplete` notification
pub fn handle_clean_complete(state: &mut ServerState, done: CleanAsyncResult) -> serde_json::Value {
    state.running = None;

    match done.result {
        Ok(report) => {
            log::info!("{}", report.summary());
            let notification = serde_json::json!({
                "id": null,
                "method": "cleanComplete",
                "result": {
                    "status": "ok",
                    "summary": report.summary(),
                    "removed": report.removals.len(),
                    "checked": report.checked,
                    "counts": report.counts,
                    "warnings": report.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
                    "elapsed_ms": done.elapsed_ms,
                }
            });
            state.last_report = Some(report);
            notification
        }
        Err(CleanError::Cancelled) => {
            log::info!("Clean batch cancelled after {:.2}ms", done.elapsed_ms);
            serde_json::json!({
                "id": null,
                "method": "cleanComplete",
                "result": { "status": "cancelled", "elapsed_ms": done.elapsed_ms }
            })
        }
        Err(e) => {
            log::error!("Clean batch failed: {}", e);
            serde_json::json!({
                "id": null,
                "method": "cleanComplete",
                "result": { "status": "error", "message": e.to_string() }
            })
        }
    }
}

/// Handle CancelClean request - raises the running batch's cancel flag
pub fn handle_cancel_clean(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    match &state.running {
        Some(cancel) => {
            cancel.cancel();
            log::info!("Cancel requested for running clean batch");
            Response::success(id, serde_json::json!({ "status": "cancelling" }))
        }
        None => Response::success(id, serde_json::json!({ "status": "idle" })),
    }
}

/// Handle GetReport request - returns the last completed report
pub fn handle_get_report(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    let report = match &state.last_report {
        Some(report) => report,
        None => {
            return Response::error(id, error_codes::NO_REPORT,
                "No clean report available. Run CleanVias first.".to_string());
        }
    };
    match serde_json::to_value(report) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Handle ApplyRemovals request - drops the reported vias from the board
///
/// The report is consumed so the same removals are never applied twice.
pub fn handle_apply_removals(state: &mut ServerState, id: Option<serde_json::Value>) -> Response {
    if state.is_cleaning() {
        return Response::error(id, error_codes::CLEAN_IN_PROGRESS,
            "A clean batch is running. Cancel it or wait for completion.".to_string());
    }
    let board = match state.board.as_mut() {
        Some(board) => board,
        None => {
            return Response::error(id, error_codes::NO_BOARD_LOADED,
                "No board loaded. Call Load first.".to_string());
        }
    };
    let report = match state.last_report.take() {
        Some(report) => report,
        None => {
            return Response::error(id, error_codes::NO_REPORT,
                "No clean report available. Run CleanVias first.".to_string());
        }
    };

    let removed = board.remove_vias(&report.removed_ids());
    log::info!("Removed {} vias from board ({} remain)", removed, board.vias.len());

    Response::success(id, serde_json::json!({
        "status": "ok",
        "removed": removed,
        "remaining": board.vias.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardData;
    use std::sync::mpsc;
    use std::time::Duration;

    // Two selected vias: one 0.1mm from a foreign-net track, one far away
    fn board() -> BoardData {
        serde_json::from_value(serde_json::json!({
            "vias": [
                { "id": 1, "position": { "x": 0, "y": 100000 }, "net": 1,
                  "diameter": 0, "drill": 0, "selected": true },
                { "id": 2, "position": { "x": 5000000, "y": 5000000 }, "net": 1,
                  "diameter": 0, "drill": 0, "selected": true },
                { "id": 3, "position": { "x": 0, "y": 100000 }, "net": 3,
                  "diameter": 0, "drill": 0, "selected": false }
            ],
            "tracks": [
                { "type": "segment", "id": 10, "start": { "x": -1000000, "y": 0 },
                  "end": { "x": 1000000, "y": 0 }, "width": 0, "net": 2 }
            ],
            "edge_bounds": { "min": { "x": -10000000, "y": -10000000 },
                             "max": { "x": 10000000, "y": 10000000 } }
        }))
        .unwrap()
    }

    fn loaded_state() -> ServerState {
        let mut state = ServerState::new();
        state.board = Some(board());
        state
    }

    fn run_to_completion(state: &mut ServerState, params: serde_json::Value) -> serde_json::Value {
        let (tx, rx) = mpsc::channel();
        let response = handle_clean_vias_async(state, Some(1.into()), Some(params), Some(tx));
        assert!(response.error.is_none());
        assert!(state.is_cleaning());
        let done = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        handle_clean_complete(state, done)
    }

    #[test]
    fn test_clean_requires_board() {
        let mut state = ServerState::new();
        let (tx, _rx) = mpsc::channel();
        let response = handle_clean_vias_async(&mut state, None, None, Some(tx));
        assert_eq!(response.error.unwrap().code, error_codes::NO_BOARD_LOADED);
        assert!(!state.is_cleaning());
    }

    #[test]
    fn test_clean_rejects_invalid_settings() {
        let mut state = loaded_state();
        state.settings.zone_clearance_mm = -1.0;
        let (tx, _rx) = mpsc::channel();
        let response = handle_clean_vias_async(&mut state, None, None, Some(tx));
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
        assert!(!state.is_cleaning());
    }

    #[test]
    fn test_clean_then_apply_removals() {
        let mut state = loaded_state();
        let notification = run_to_completion(&mut state, serde_json::json!({}));

        assert_eq!(notification["method"], "cleanComplete");
        assert_eq!(notification["result"]["status"], "ok");
        assert_eq!(notification["result"]["removed"], 1);
        assert_eq!(notification["result"]["checked"], 2);
        assert!(!state.is_cleaning());

        let report = handle_get_report(&state, None).result.unwrap();
        assert_eq!(report["removals"][0]["id"], 1);
        assert_eq!(report["removals"][0]["reason"], "net_collision");

        let applied = handle_apply_removals(&mut state, None).result.unwrap();
        assert_eq!(applied["removed"], 1);
        assert_eq!(applied["remaining"], 2);

        // Report is consumed
        let again = handle_apply_removals(&mut state, None);
        assert_eq!(again.error.unwrap().code, error_codes::NO_REPORT);
    }

    #[test]
    fn test_all_vias_includes_unselected() {
        let mut state = loaded_state();
        let notification = run_to_completion(&mut state, serde_json::json!({ "all_vias": true }));
        assert_eq!(notification["result"]["checked"], 3);
        assert_eq!(notification["result"]["removed"], 2);
    }

    #[test]
    fn test_cancelled_batch_leaves_no_report() {
        let mut state = loaded_state();
        let cancel = CancelFlag::new();
        cancel.cancel();
        state.running = Some(cancel.clone());

        let result = run_clean(&board(), &state.settings, CandidateSelection::Selected, &cancel);
        let notification = handle_clean_complete(
            &mut state,
            CleanAsyncResult { result, elapsed_ms: 0.0 },
        );
        assert_eq!(notification["result"]["status"], "cancelled");
        assert!(!state.is_cleaning());
        assert!(state.last_report.is_none());
    }

    #[test]
    fn test_cancel_when_idle() {
        let state = loaded_state();
        let response = handle_cancel_clean(&state, None);
        assert_eq!(response.result.unwrap()["status"], "idle");
    }
}
