use crate::adapters::csv_file;
use crate::config::settings::{RemoteTarget, RunSettings};
use crate::core::context::RunContext;
use crate::domain::model::{Format, Record};
use crate::domain::ports::{AccessScope, SortOrder, TabularStore};
use crate::utils::error::{ImportError, Result};
use std::fmt;
use std::path::PathBuf;

/// First data row, just below the header.
pub const INSERT_AT_ROW: usize = 2;
pub const SORT_COLUMN: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Remote(RemoteTarget),
    LocalFile(PathBuf),
    Nowhere,
}

impl Destination {
    /// Remote store when its coordinates are complete, otherwise the output
    /// file if one was given.
    pub fn select(settings: &RunSettings) -> Self {
        match (&settings.remote, &settings.output) {
            (Some(remote), output) => {
                if let Some(path) = output {
                    tracing::debug!(
                        "Remote sheet configured, output file {} not written",
                        path.display()
                    );
                }
                Destination::Remote(remote.clone())
            }
            (None, Some(path)) => Destination::LocalFile(path.clone()),
            (None, None) => Destination::Nowhere,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Remote(target) => write!(f, "Google Sheet '{}'", target.worksheet),
            Destination::LocalFile(path) => write!(f, "{}", path.display()),
            Destination::Nowhere => write!(f, "no destination"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Remote { worksheet: String, inserted: usize },
    LocalFile { path: PathBuf, written: usize },
    Skipped,
}

impl SinkOutcome {
    pub fn summary(&self) -> String {
        match self {
            SinkOutcome::Remote { worksheet, .. } => format!(
                "Deduplicated data appended and sorted in Google Sheet '{}'.",
                worksheet
            ),
            SinkOutcome::LocalFile { path, .. } => {
                format!("Deduplicated data written to {}.", path.display())
            }
            SinkOutcome::Skipped => "No output destination given; nothing written.".to_string(),
        }
    }
}

/// Sheet rows: output-format values followed by the extra literal columns.
pub fn sheet_rows(rows: &[Record], output_format: &Format, extra_columns: &[String]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut values = row.values_in(output_format);
            values.extend(extra_columns.iter().cloned());
            values
        })
        .collect()
}

/// Writes the rows to `destination`.
///
/// The remote path is insert-then-sort: two separate store calls with no
/// atomicity between them.
pub async fn emit<S>(
    rows: &[Record],
    output_format: &Format,
    extra_columns: &[String],
    destination: &Destination,
    store: &S,
    ctx: &RunContext,
) -> Result<SinkOutcome>
where
    S: TabularStore + ?Sized,
{
    match destination {
        Destination::Remote(target) => {
            tracing::debug!(
                "Writing {} rows to sheet {} ({})",
                rows.len(),
                ctx.redact(&target.table_id),
                target.worksheet
            );
            let inserted = emit_remote(rows, output_format, extra_columns, target, store)
                .await
                .map_err(|e| match e {
                    ImportError::SinkWrite { .. } => e,
                    other => ImportError::sink_write(destination.to_string(), other),
                })?;
            Ok(SinkOutcome::Remote {
                worksheet: target.worksheet.clone(),
                inserted,
            })
        }
        Destination::LocalFile(path) => {
            csv_file::write_records(path, output_format, rows)
                .map_err(|e| ImportError::sink_write(destination.to_string(), e))?;
            tracing::info!("Deduplicated data written to {}.", path.display());
            Ok(SinkOutcome::LocalFile {
                path: path.clone(),
                written: rows.len(),
            })
        }
        Destination::Nowhere => {
            tracing::info!("No output file or Google Sheet configured; skipping output");
            Ok(SinkOutcome::Skipped)
        }
    }
}

async fn emit_remote<S>(
    rows: &[Record],
    output_format: &Format,
    extra_columns: &[String],
    target: &RemoteTarget,
    store: &S,
) -> Result<usize>
where
    S: TabularStore + ?Sized,
{
    store
        .authenticate(&target.credentials, AccessScope::ReadWrite)
        .await?;
    let table = store.open_table(&target.table_id).await?;
    let worksheet = store.open_worksheet(&table, &target.worksheet).await?;

    let to_insert = sheet_rows(rows, output_format, extra_columns);
    if to_insert.is_empty() {
        tracing::info!("No new rows to insert into Google Sheet '{}'.", target.worksheet);
    } else {
        store
            .insert_rows(&worksheet, INSERT_AT_ROW, &to_insert)
            .await?;
        tracing::info!(
            "Deduplicated data inserted at top of Google Sheet '{}'. ({} rows)",
            target.worksheet,
            to_insert.len()
        );
    }

    store
        .sort_by_column(&worksheet, SORT_COLUMN, SortOrder::Descending)
        .await?;
    tracing::info!("Sheet '{}' sorted by column A descending.", target.worksheet);

    Ok(to_insert.len())
}
