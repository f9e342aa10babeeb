//! Bank statement reshaping: one signed `Amount` column plus an indicator
//! becomes separate `Debit` and `Credit` columns.

use crate::adapters::csv_file;
use crate::domain::model::{Format, Record};
use crate::utils::error::{ImportError, Result};
use std::path::Path;

pub const BOOKING_DATE: &str = "Booking Date";
pub const CHECK_SERIAL: &str = "Check Serial Number";
pub const DESCRIPTION: &str = "Description";
pub const AMOUNT: &str = "Amount";
pub const INDICATOR: &str = "Credit Debit Indicator";
pub const CATEGORY: &str = "Category";
pub const DEBIT: &str = "Debit";
pub const CREDIT: &str = "Credit";

const REQUIRED: [&str; 6] = [BOOKING_DATE, CHECK_SERIAL, DESCRIPTION, AMOUNT, INDICATOR, CATEGORY];

pub fn statement_format() -> Format {
    Format::new([BOOKING_DATE, CHECK_SERIAL, DESCRIPTION, DEBIT, CREDIT, CATEGORY])
}

/// Returns the first required column missing from `record`.
fn missing_column(record: &Record) -> Option<&'static str> {
    REQUIRED.iter().copied().find(|col| record.get(col).is_none())
}

pub fn split_record(record: &Record) -> Record {
    let amount = record.value_or_empty(AMOUNT);
    let (debit, credit) = match record.value_or_empty(INDICATOR) {
        "Debit" => (amount, ""),
        "Credit" => ("", amount),
        other => {
            tracing::warn!(
                "Unknown credit/debit indicator '{}' for '{}', amount left blank",
                other,
                record.value_or_empty(DESCRIPTION)
            );
            ("", "")
        }
    };

    Record::from_pairs([
        (BOOKING_DATE, record.value_or_empty(BOOKING_DATE)),
        (CHECK_SERIAL, record.value_or_empty(CHECK_SERIAL)),
        (DESCRIPTION, record.value_or_empty(DESCRIPTION)),
        (DEBIT, debit),
        (CREDIT, credit),
        (CATEGORY, record.value_or_empty(CATEGORY)),
    ])
}

/// Reads `input`, splits amounts and writes `output`. Returns the row count.
pub fn transform_statement(input: &Path, output: &Path) -> Result<usize> {
    let records = csv_file::read_records(input)?;

    if let Some(column) = records.first().and_then(missing_column) {
        return Err(ImportError::SourceRead {
            path: input.display().to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("missing column '{}'", column),
            )),
        });
    }

    let rows: Vec<Record> = records.iter().map(split_record).collect();
    csv_file::write_records(output, &statement_format(), &rows)
        .map_err(|e| ImportError::sink_write(output.display().to_string(), e))?;
    Ok(rows.len())
}
