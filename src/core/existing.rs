use crate::adapters::csv_file;
use crate::config::settings::RemoteTarget;
use crate::core::context::RunContext;
use crate::domain::model::Record;
use crate::domain::ports::{AccessScope, TabularStore};
use crate::utils::error::{ImportError, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Where previously imported records come from. A local file wins over the
/// remote store when both are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingSource {
    File(PathBuf),
    Remote(RemoteTarget),
}

/// Loads the existing records. Remote rows are backed up to `backup_dir`
/// before they are returned.
pub async fn load_existing<S>(
    source: &ExistingSource,
    store: &S,
    backup_dir: &Path,
    ctx: &RunContext,
) -> Result<Vec<Record>>
where
    S: TabularStore + ?Sized,
{
    match source {
        ExistingSource::File(path) => {
            let records = csv_file::read_records(path)?;
            tracing::info!(
                "Loaded {} existing entries from CSV for duplicate removal.",
                records.len()
            );
            Ok(records)
        }
        ExistingSource::Remote(target) => {
            let records = fetch_remote(store, target, ctx).await?;
            backup_rows(backup_dir, &target.worksheet, &records, Local::now())?;
            Ok(records)
        }
    }
}

async fn fetch_remote<S>(store: &S, target: &RemoteTarget, ctx: &RunContext) -> Result<Vec<Record>>
where
    S: TabularStore + ?Sized,
{
    store
        .authenticate(&target.credentials, AccessScope::ReadOnly)
        .await?;
    let table = store.open_table(&target.table_id).await?;
    let worksheet = store.open_worksheet(&table, &target.worksheet).await?;
    let records = store.fetch_rows(&worksheet).await?;

    tracing::info!(
        "Fetched {} entries from Google Sheet '{}' (ID: {})",
        records.len(),
        target.worksheet,
        ctx.redact(&target.table_id)
    );
    Ok(records)
}

/// Path of the backup file for `worksheet` taken at `at`.
pub fn backup_path(backup_dir: &Path, worksheet: &str, at: DateTime<Local>) -> PathBuf {
    backup_dir.join(format!(
        "{}_backup_{}.csv",
        worksheet,
        at.format("%Y%m%d_%H%M%S")
    ))
}

/// Writes `records` to a timestamped CSV under `backup_dir`. Nothing is
/// written for an empty worksheet.
pub fn backup_rows(
    backup_dir: &Path,
    worksheet: &str,
    records: &[Record],
    at: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    let Some(first) = records.first() else {
        tracing::info!("No rows to backup from Google Sheet '{}'", worksheet);
        return Ok(None);
    };

    let path = backup_path(backup_dir, worksheet, at);
    let backup_err = |source: std::io::Error| ImportError::Backup {
        path: path.display().to_string(),
        source,
    };

    fs::create_dir_all(backup_dir).map_err(backup_err)?;
    let file = File::create(&path).map_err(backup_err)?;
    let header: Vec<String> = first.columns().map(str::to_string).collect();
    csv_file::write_rows(file, &header, records).map_err(|e| match e {
        ImportError::Io(source) => backup_err(source),
        ImportError::Csv(err) => backup_err(std::io::Error::other(err)),
        other => other,
    })?;

    tracing::info!("Google Sheet backed up to: {}", path.display());
    Ok(Some(path))
}
