//! Via cleaner server - JSON-RPC over stdio
//!
//! Keeps one board in memory, runs clean batches in the background and lets
//! the client apply the resulting removals and save the board.
//!
//! # Module Structure
//! - `protocol` - JSON-RPC request/response types
//! - `state` - Server state management
//! - `handlers` - Request handlers organized by functionality

pub mod handlers;
pub mod protocol;
pub mod state;

use std::sync::mpsc::Sender;

use handlers::*;

// Re-export key types for convenience
pub use protocol::{error_codes, ErrorResponse, Request, Response};
pub use state::{CleanAsyncResult, ServerState};

/// Route one request to its handler
///
/// Batch outcomes are delivered on `clean_tx`; see `handle_clean_complete`.
pub fn dispatch(
    state: &mut ServerState,
    request: Request,
    clean_tx: &Sender<CleanAsyncResult>,
) -> Response {
    let Request { id, method, params } = request;
    match method.as_str() {
        "Load" => handle_load(state, id, params),
        "Save" => handle_save(state, id, params),
        "GetSettings" => handle_get_settings(state, id),
        "UpdateSettings" => handle_update_settings(state, id, params),
        "CleanVias" => handle_clean_vias_async(state, id, params, Some(clean_tx.clone())),
        "CancelClean" => handle_cancel_clean(state, id),
        "GetReport" => handle_get_report(state, id),
        "ApplyRemovals" => handle_apply_removals(state, id),
        _ => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        ),
    }
}
