//! Via clearance cleaner
//!
//! Loads a board document exported by a PCB editor, decides which vias
//! violate clearance rules and reports (or applies) their removal.
//!
//! # Modules
//! - `board` - Board document model and footprint R-tree
//! - `clean` - Clearance engine: geometry, spatial index, snapshot, checks, batch
//! - `settings` - User thresholds and rule toggles
//! - `lsp` - JSON-RPC server over stdio

pub mod board;
pub mod clean;
pub mod lsp;
pub mod settings;

pub use board::{load_board, save_board, BoardData, Point, ViaId};
pub use clean::{run_clean, CancelFlag, CandidateSelection, CleanError, CleanReport, Violation};
pub use settings::{CleanerSettings, ConfigError, SettingsUpdate};
