use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cannot parse format '{input}': {reason}")]
    FormatParse { input: String, reason: String },

    #[error("Failed to read '{path}': {source}")]
    SourceRead {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to load Google credentials file '{path}': {reason}")]
    CredentialLoad { path: String, reason: String },

    #[error("Failed to authorize Google Sheets client: {reason}")]
    Authorization { reason: String },

    #[error("Failed to open Google Sheet with ID '{table_id}': {reason}")]
    TableOpen { table_id: String, reason: String },

    #[error("Failed to open worksheet '{worksheet}' in Google Sheet: {reason}")]
    WorksheetOpen { worksheet: String, reason: String },

    #[error("Failed to fetch records from worksheet '{worksheet}': {reason}")]
    RecordFetch { worksheet: String, reason: String },

    #[error("Failed to write backup '{path}': {source}")]
    Backup {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to {destination}: {reason}")]
    SinkWrite { destination: String, reason: String },

    #[error("Refusing operation: {message}")]
    UnboundedOperation { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse grouping used for exit codes and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    SourceRead,
    RemoteAccess,
    SinkWrite,
    Internal,
}

impl ImportError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ImportError::Configuration {
            message: message.into(),
        }
    }

    pub fn sink_write(destination: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ImportError::SinkWrite {
            destination: destination.into(),
            reason: reason.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::Configuration { .. }
            | ImportError::FormatParse { .. }
            | ImportError::UnboundedOperation { .. } => ErrorCategory::Configuration,
            ImportError::SourceRead { .. } | ImportError::Csv(_) => ErrorCategory::SourceRead,
            ImportError::CredentialLoad { .. }
            | ImportError::Authorization { .. }
            | ImportError::TableOpen { .. }
            | ImportError::WorksheetOpen { .. }
            | ImportError::RecordFetch { .. }
            | ImportError::Backup { .. } => ErrorCategory::RemoteAccess,
            ImportError::SinkWrite { .. } => ErrorCategory::SinkWrite,
            ImportError::Io(_) | ImportError::Http(_) | ImportError::Json(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Process exit code for this failure.
    ///
    /// Remote failures raised while writing are wrapped into `SinkWrite` by the
    /// sink, so every `RemoteAccess` error seen here comes from the
    /// existing-record fetch.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            ErrorCategory::RemoteAccess => 3,
            ErrorCategory::SinkWrite => 4,
            ErrorCategory::SourceRead | ErrorCategory::Internal => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Error: {}", self),
            ErrorCategory::RemoteAccess => {
                format!("Error: Failed to fetch Google Sheet entries: {}", self)
            }
            ErrorCategory::SinkWrite
            | ErrorCategory::SourceRead
            | ErrorCategory::Internal => format!("Error: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ImportError::Configuration { .. } | ImportError::FormatParse { .. } => {
                "Input and output formats must be specified via CLI (--input-format/--output-format) or the organization config.".to_string()
            }
            ImportError::UnboundedOperation { .. } => {
                "Provide --key-columns (or key_fields in the organization config), or pass --allow-unkeyed-insert.".to_string()
            }
            ImportError::SourceRead { .. } | ImportError::Csv(_) => {
                "Check that the file exists, is UTF-8 and has a header row.".to_string()
            }
            ImportError::CredentialLoad { .. }
            | ImportError::Authorization { .. }
            | ImportError::TableOpen { .. }
            | ImportError::WorksheetOpen { .. }
            | ImportError::RecordFetch { .. } => [
                "Troubleshooting tips:",
                "- Check that your credentials file is a valid Google service account JSON.",
                "- Ensure the file path, sheet ID, and worksheet name are correct.",
                "- Make sure the service account has access to the target sheet.",
            ]
            .join("\n"),
            ImportError::Backup { .. } => {
                "Check that the backup directory is writable.".to_string()
            }
            ImportError::SinkWrite { .. } => {
                "Check write access to the destination; the backup file (if any) still holds the previous sheet contents.".to_string()
            }
            ImportError::Io(_) | ImportError::Http(_) | ImportError::Json(_) => {
                "Re-run with --debug and inspect the log file for details.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
