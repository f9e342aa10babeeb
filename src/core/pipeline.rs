use crate::adapters::csv_file;
use crate::config::settings::RunSettings;
use crate::core::context::RunContext;
use crate::core::dedup::dedup;
use crate::core::existing::load_existing;
use crate::core::sink::{emit, Destination, SinkOutcome};
use crate::core::transform::{transform, unmapped_columns};
use crate::core::{Pipeline, Record, TransformResult};
use crate::domain::ports::TabularStore;
use crate::utils::error::{ImportError, Result};

/// Merge, map, deduplicate and emit CSV rows for one run.
pub struct ImportPipeline<S: TabularStore> {
    settings: RunSettings,
    store: S,
    ctx: RunContext,
}

impl<S: TabularStore> ImportPipeline<S> {
    pub fn new(settings: RunSettings, store: S) -> Self {
        let ctx = RunContext::for_settings(&settings);
        Self::with_context(settings, store, ctx)
    }

    pub fn with_context(settings: RunSettings, store: S, ctx: RunContext) -> Self {
        Self {
            settings,
            store,
            ctx,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn destination(&self) -> Destination {
        Destination::select(&self.settings)
    }
}

#[async_trait::async_trait]
impl<S: TabularStore> Pipeline for ImportPipeline<S> {
    async fn preflight(&self) -> Result<()> {
        let remote_insert = matches!(self.destination(), Destination::Remote(_));
        if remote_insert
            && self.settings.key_columns.is_empty()
            && !self.settings.allow_unkeyed_insert
            && !self.settings.dry_run
        {
            return Err(ImportError::UnboundedOperation {
                message: "no key columns resolved, every input row would be inserted into the sheet"
                    .to_string(),
            });
        }
        Ok(())
    }

    async fn extract(&self) -> Result<Vec<Record>> {
        let mut rows = Vec::new();
        for path in &self.settings.input_files {
            let records = csv_file::read_records(path)?;
            tracing::debug!("{}: {} rows", path.display(), records.len());
            rows.extend(records);
        }
        Ok(rows)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let settings = &self.settings;

        let undeclared = unmapped_columns(&data, &settings.input_format);
        if !undeclared.is_empty() {
            tracing::warn!(
                "Input columns not listed in the input format: {}",
                undeclared.join(", ")
            );
        }
        if settings.input_format != settings.output_format {
            tracing::info!(
                "Transforming CSV with input format: {} and output format: {}",
                settings.input_format,
                settings.output_format
            );
        }

        let rows = transform(&data, &settings.output_format);
        let total = rows.len();

        let rows = match &settings.existing {
            Some(source) => {
                let existing =
                    load_existing(source, &self.store, &settings.backup_dir, &self.ctx).await?;
                dedup(rows, &existing, &settings.key_columns, &self.ctx)
            }
            None => {
                if !settings.key_columns.is_empty() {
                    tracing::info!("No existing entries source provided for duplicate removal.");
                }
                rows
            }
        };

        Ok(TransformResult {
            duplicates_removed: total - rows.len(),
            rows,
            output_format: settings.output_format.clone(),
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let destination = self.destination();

        if self.settings.dry_run {
            tracing::info!(
                "Dry run: {} rows ({} duplicates removed) would go to {}",
                result.rows.len(),
                result.duplicates_removed,
                self.ctx.redact(&destination.to_string())
            );
            return Ok(format!(
                "Dry run: {} rows would be written to {}.",
                result.rows.len(),
                destination
            ));
        }

        let outcome = emit(
            &result.rows,
            &result.output_format,
            &self.settings.extra_columns,
            &destination,
            &self.store,
            &self.ctx,
        )
        .await?;

        if let SinkOutcome::Remote { inserted, .. } | SinkOutcome::LocalFile { written: inserted, .. } =
            &outcome
        {
            tracing::debug!("{} rows emitted", inserted);
        }
        Ok(outcome.summary())
    }
}
