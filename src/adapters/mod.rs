// Adapters layer: concrete implementations for external systems (local files, remote sheets).

pub mod csv_file;
pub mod google_sheets;

pub use google_sheets::GoogleSheetsStore;
