//! Settings handlers: GetSettings, UpdateSettings

use crate::lsp::protocol::{error_codes, Response};
use crate::lsp::state::ServerState;
use crate::settings::SettingsUpdate;

/// Handle GetSettings request - returns the active settings
pub fn handle_get_settings(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    match serde_json::to_value(&state.settings) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Handle UpdateSettings request - merges, validates and persists settings
///
/// Invalid values are rejected and leave the active settings untouched.
pub fn handle_update_settings(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let update: SettingsUpdate = match params.map(serde_json::from_value).transpose() {
        Ok(update) => update.unwrap_or_default(),
        Err(e) => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                format!("Invalid settings: {}", e));
        }
    };

    let merged = update.apply(&state.settings);
    if let Err(e) = merged.validate() {
        return Response::error(id, error_codes::INVALID_PARAMS, e.to_string());
    }
    state.settings = merged;

    if let Some(path) = &state.settings_path {
        if let Err(e) = state.settings.save(path) {
            log::warn!("{:#}", e);
        }
    }

    handle_get_settings(state, id)
}
