//! Server state management for the via cleaner server

use crate::board::BoardData;
use crate::clean::{CancelFlag, CleanError, CleanReport};
use crate::settings::CleanerSettings;
use std::path::PathBuf;

/// In-memory state: loaded board, settings, last batch
pub struct ServerState {
    pub board_path: Option<PathBuf>,
    pub board: Option<BoardData>,
    pub settings: CleanerSettings,
    /// Where settings updates are persisted, if anywhere
    pub settings_path: Option<PathBuf>,
    pub last_report: Option<CleanReport>,
    /// Cancellation handle of the batch running in the background
    pub running: Option<CancelFlag>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            board_path: None,
            board: None,
            settings: CleanerSettings::default(),
            settings_path: None,
            last_report: None,
            running: None,
        }
    }

    /// Start from settings persisted at `path` (defaults if absent)
    pub fn with_settings_file(path: PathBuf) -> Self {
        Self {
            settings: CleanerSettings::load_or_default(&path),
            settings_path: Some(path),
            ..Self::new()
        }
    }

    pub fn is_board_loaded(&self) -> bool {
        self.board.is_some()
    }

    pub fn is_cleaning(&self) -> bool {
        self.running.is_some()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result from a background clean batch
pub struct CleanAsyncResult {
    pub result: Result<CleanReport, CleanError>,
    pub elapsed_ms: f64,
}
