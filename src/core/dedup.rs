use crate::core::context::RunContext;
use crate::domain::model::{Key, Record};
use std::collections::HashSet;

/// Drops every row whose key matches the key of an existing record.
///
/// Kept rows stay in their original order. With no key columns or no
/// existing records nothing is removed. Missing key columns read as empty
/// strings, on both sides.
pub fn dedup(
    rows: Vec<Record>,
    existing: &[Record],
    key_columns: &[String],
    ctx: &RunContext,
) -> Vec<Record> {
    tracing::debug!(key_columns = ?key_columns, "Deduplication");
    tracing::debug!(
        "Input rows: {}, Existing entries: {}",
        rows.len(),
        existing.len()
    );

    if key_columns.is_empty() || existing.is_empty() {
        return rows;
    }

    let sample = ctx.sample_size();
    for (i, entry) in existing.iter().take(sample).enumerate() {
        tracing::debug!("Sample existing key {}: {}", i, Key::project(entry, key_columns));
    }
    for (i, row) in rows.iter().take(sample).enumerate() {
        tracing::debug!("Sample input key {}: {}", i, Key::project(row, key_columns));
    }

    let existing_keys: HashSet<Key> = existing
        .iter()
        .map(|entry| Key::project(entry, key_columns))
        .collect();

    let total = rows.len();
    let kept: Vec<Record> = rows
        .into_iter()
        .filter(|row| {
            let key = Key::project(row, key_columns);
            let duplicate = existing_keys.contains(&key);
            if duplicate {
                tracing::info!("Duplicate found and removed: {}", key);
            }
            !duplicate
        })
        .collect();

    tracing::info!("Total duplicates removed: {}", total - kept.len());
    kept
}
