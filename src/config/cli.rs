use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "csvimport")]
#[command(about = "Import and transform CSV files for multiple organizations")]
pub struct CliArgs {
    /// Comma-separated list of input CSV files
    #[arg(long, required = true)]
    pub input_files: String,

    /// Path to the output (transformed) CSV file
    #[arg(long)]
    pub output: Option<String>,

    /// Input format (comma-separated or YAML list, e.g. "[A, B]")
    #[arg(long)]
    pub input_format: Option<String>,

    /// Output format (comma-separated or YAML list)
    #[arg(long)]
    pub output_format: Option<String>,

    /// Config file with organization formats (default: confs/csvimport.conf)
    #[arg(long)]
    pub config: Option<String>,

    /// Organization name for config lookup
    #[arg(long)]
    pub org: Option<String>,

    /// Enable debug logging to STDOUT
    #[arg(long)]
    pub debug: bool,

    #[arg(long, default_value = "logs/csvimport.log")]
    pub log_file: String,

    /// CSV file with existing entries for duplicate removal
    #[arg(long)]
    pub existing_csv: Option<String>,

    /// Google Sheet ID holding existing entries
    #[arg(long)]
    pub existing_sheet_id: Option<String>,

    /// Worksheet name for Google Sheet operations (overrides config)
    #[arg(long)]
    pub sheet_name: Option<String>,

    /// Deprecated, use --sheet-name
    #[arg(long)]
    pub existing_sheet_name: Option<String>,

    /// Path to Google service account credentials JSON file
    #[arg(long)]
    pub google_creds: Option<String>,

    /// Comma-separated list of columns used for duplicate detection
    #[arg(long)]
    pub key_columns: Option<String>,

    #[arg(long, default_value = "backups")]
    pub backup_dir: String,

    /// Run everything except the output write and the sheet update
    #[arg(long)]
    pub dry_run: bool,

    /// Allow inserting into the sheet without key columns (nothing is deduplicated)
    #[arg(long)]
    pub allow_unkeyed_insert: bool,
}

impl CliArgs {
    /// Input paths, split on commas and trimmed.
    pub fn input_paths(&self) -> Vec<String> {
        self.input_files
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }
}
