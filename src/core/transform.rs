use crate::domain::model::{Format, Record};

/// Projects every record onto `output_format`: exactly those columns, in that
/// order, with absent source columns as empty strings.
pub fn transform(source: &[Record], output_format: &Format) -> Vec<Record> {
    source
        .iter()
        .map(|record| project(record, output_format))
        .collect()
}

pub fn project(record: &Record, format: &Format) -> Record {
    Record::from_pairs(
        format
            .columns()
            .iter()
            .map(|column| (column.clone(), record.value_or_empty(column).to_string())),
    )
}

/// Source columns that `format` does not name, in first-seen order.
pub fn unmapped_columns(source: &[Record], format: &Format) -> Vec<String> {
    let mut unmapped: Vec<String> = Vec::new();
    for record in source {
        for column in record.columns() {
            if !format.contains(column) && !unmapped.iter().any(|c| c == column) {
                unmapped.push(column.to_string());
            }
        }
    }
    unmapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_adds_missing_and_drops_unrequested() {
        let source = vec![
            Record::from_pairs([("A", "1"), ("B", "x")]),
            Record::from_pairs([("A", "2"), ("B", "y")]),
        ];
        let output = transform(&source, &Format::new(["A", "C"]));

        assert_eq!(output.len(), 2);
        for record in &output {
            assert_eq!(record.columns().collect::<Vec<_>>(), vec!["A", "C"]);
            assert_eq!(record.get("C"), Some(""));
        }
        assert_eq!(output[1].get("A"), Some("2"));
    }

    #[test]
    fn test_projection_reorders_columns() {
        let source = vec![Record::from_pairs([("A", "1"), ("B", "2")])];
        let output = transform(&source, &Format::new(["B", "A"]));
        assert_eq!(output[0].columns().collect::<Vec<_>>(), vec!["B", "A"]);
    }

    #[test]
    fn test_unmapped_columns() {
        let source = vec![
            Record::from_pairs([("A", "1"), ("Z", "2")]),
            Record::from_pairs([("Y", "1"), ("Z", "2")]),
        ];
        assert_eq!(
            unmapped_columns(&source, &Format::new(["A"])),
            vec!["Z", "Y"]
        );
    }
}
