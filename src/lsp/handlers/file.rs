//! File operations: Load, Save

use crate::board::{load_board, save_board};
use crate::lsp::protocol::{error_codes, Response};
use crate::lsp::state::ServerState;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Deserialize)]
struct FileParams {
    file_path: PathBuf,
}

fn file_params(params: Option<serde_json::Value>) -> Option<FileParams> {
    params.and_then(|p| serde_json::from_value(p).ok())
}

/// Handle Load request - reads a board document into memory
pub fn handle_load(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let params = match file_params(params) {
        Some(p) => p,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {file_path: string}".to_string());
        }
    };

    if state.is_cleaning() {
        return Response::error(id, error_codes::CLEAN_IN_PROGRESS,
            "A clean batch is running. Cancel it or wait for completion.".to_string());
    }

    log::info!("Loading board: {}", params.file_path.display());
    let start = Instant::now();

    let board = match load_board(&params.file_path) {
        Ok(board) => board,
        Err(e) => return Response::error(id, error_codes::LOAD_FAILED, format!("{:#}", e)),
    };

    let selected = board.vias.iter().filter(|v| v.selected).count();
    let result = serde_json::json!({
        "status": "ok",
        "vias": board.vias.len(),
        "selected_vias": selected,
        "tracks": board.tracks.len(),
        "footprints": board.footprints.len(),
        "zones": board.zones.len(),
        "outline_shapes": board.outline.len(),
        "elapsed_ms": start.elapsed().as_secs_f64() * 1000.0,
    });

    log::info!("Board loaded in {:.2?}: {} vias ({} selected)",
        start.elapsed(), board.vias.len(), selected);

    state.board = Some(board);
    state.board_path = Some(params.file_path);
    state.last_report = None;

    Response::success(id, result)
}

/// Handle Save request - writes the in-memory board (with applied removals)
pub fn handle_save(
    state: &ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let board = match &state.board {
        Some(board) => board,
        None => {
            return Response::error(id, error_codes::NO_BOARD_LOADED,
                "No board loaded. Call Load first.".to_string());
        }
    };

    // Default to overwriting the loaded file
    let path = match file_params(params).map(|p| p.file_path).or_else(|| state.board_path.clone()) {
        Some(path) => path,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {file_path: string}".to_string());
        }
    };

    match save_board(board, &path) {
        Ok(()) => {
            log::info!("Board saved to {}", path.display());
            Response::success(id, serde_json::json!({
                "status": "ok",
                "file_path": path,
                "vias": board.vias.len(),
            }))
        }
        Err(e) => Response::error(id, error_codes::SAVE_FAILED, format!("{:#}", e)),
    }
}
