use crate::domain::model::{Format, Record};
use crate::utils::error::{ImportError, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

const BOM: char = '\u{feff}';

fn source_error(path: &Path, err: impl std::error::Error + Send + Sync + 'static) -> ImportError {
    ImportError::SourceRead {
        path: path.display().to_string(),
        source: Box::new(err),
    }
}

/// Reads a header-row CSV file into records.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path).map_err(|e| source_error(path, e))?;
    let records = read_records_from(file).map_err(|e| match e {
        ImportError::Csv(err) => source_error(path, err),
        other => other,
    })?;
    tracing::debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses CSV from any reader. Short rows are padded with empty strings;
/// surplus cells past the header are dropped.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches(BOM).to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        records.push(Record::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), row.get(i).unwrap_or("").to_string())),
        ));
    }
    Ok(records)
}

/// Writes `header` then one line per record, values in header order.
pub fn write_rows<W: Write>(writer: W, header: &[String], records: &[Record]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(header)?;
    for record in records {
        wtr.write_record(header.iter().map(|column| record.value_or_empty(column)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes records to `path` in `format` column order, creating parent
/// directories as needed.
pub fn write_records(path: &Path, format: &Format, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_rows(file, format.columns(), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_pads_short_rows_and_strips_bom() {
        let data = "\u{feff}A,B,C\n1,2\n3,4,5,6\n";
        let records = read_records_from(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(records[0].get("C"), Some(""));
        assert_eq!(records[1].get("C"), Some("5"));
    }

    #[test]
    fn test_read_handles_quoted_fields() {
        let data = "name,notes\n\"Smith, J\",\"said \"\"hi\"\"\"\n";
        let records = read_records_from(data.as_bytes()).unwrap();
        assert_eq!(records[0].get("name"), Some("Smith, J"));
        assert_eq!(records[0].get("notes"), Some("said \"hi\""));
    }

    #[test]
    fn test_missing_file_is_source_read_error() {
        let err = read_records(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, ImportError::SourceRead { .. }));
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let format = Format::new(["col1", "col2"]);
        let records = vec![
            Record::from_pairs([("col1", "A"), ("col2", "1")]),
            Record::from_pairs([("col2", "2")]),
        ];

        write_records(&path, &format, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "col1,col2\nA,1\n,2\n");
    }
}
