use crate::domain::model::{Record, TransformResult};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Access level requested when authenticating against a remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetInfo {
    pub id: i64,
    pub title: String,
}

/// An opened remote table and the worksheets it contains.
#[derive(Debug, Clone)]
pub struct TableHandle {
    pub table_id: String,
    pub worksheets: Vec<WorksheetInfo>,
}

#[derive(Debug, Clone)]
pub struct WorksheetHandle {
    pub table_id: String,
    pub worksheet: WorksheetInfo,
}

/// Remote tabular store (a spreadsheet service or anything shaped like one).
///
/// Every call blocks the pipeline until it completes; callers issue them one
/// at a time. Row and column positions are 1-based, row 1 being the header.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Loads the credential material at `credentials` and obtains an
    /// authorization for `scope`. Replaces any earlier authorization.
    async fn authenticate(&self, credentials: &Path, scope: AccessScope) -> Result<()>;

    async fn open_table(&self, table_id: &str) -> Result<TableHandle>;

    async fn open_worksheet(&self, table: &TableHandle, name: &str) -> Result<WorksheetHandle> {
        table
            .worksheets
            .iter()
            .find(|ws| ws.title == name)
            .map(|ws| WorksheetHandle {
                table_id: table.table_id.clone(),
                worksheet: ws.clone(),
            })
            .ok_or_else(|| ImportError::WorksheetOpen {
                worksheet: name.to_string(),
                reason: format!("no worksheet named '{}' in table", name),
            })
    }

    /// All data rows, keyed by the header row.
    async fn fetch_rows(&self, worksheet: &WorksheetHandle) -> Result<Vec<Record>>;

    /// Inserts `rows` as new rows starting at `row`, shifting existing rows down.
    async fn insert_rows(
        &self,
        worksheet: &WorksheetHandle,
        row: usize,
        rows: &[Vec<String>],
    ) -> Result<()>;

    /// Sorts every row below the header by `column`.
    async fn sort_by_column(
        &self,
        worksheet: &WorksheetHandle,
        column: usize,
        order: SortOrder,
    ) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Checks run before any input is read.
    async fn preflight(&self) -> Result<()> {
        Ok(())
    }
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
