//! Presentation adapters: terminal output and CSV export.

pub mod console;
pub mod csv;
