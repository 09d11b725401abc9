//! Handler module declarations and re-exports

pub mod clean;
pub mod file;
pub mod settings;

// Re-export all handlers for convenient access
pub use clean::*;
pub use file::*;
pub use settings::*;
