use crate::config::file_config::OrgConfig;
use crate::domain::model::Format;
use crate::utils::error::{ImportError, Result};
use serde_yaml::Value;

/// Which format entry of an organization config to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRole {
    Input,
    Output,
}

/// Parses a CLI format string.
///
/// `"A, B ,C"` is split on commas and trimmed; a value starting with `[` is
/// read as a YAML flow list (`"[A, B, C]"`). Empty input, or an empty list,
/// yields `None`.
pub fn parse_format(raw: &str) -> Result<Option<Format>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let columns: Vec<String> = if trimmed.starts_with('[') {
        parse_list_literal(trimmed)?
    } else {
        trimmed.split(',').map(|col| col.trim().to_string()).collect()
    };

    if columns.is_empty() {
        return Ok(None);
    }
    Ok(Some(Format::new(columns)))
}

fn parse_list_literal(raw: &str) -> Result<Vec<String>> {
    let value: Value = serde_yaml::from_str(raw).map_err(|e| ImportError::FormatParse {
        input: raw.to_string(),
        reason: e.to_string(),
    })?;

    let items = match value {
        Value::Sequence(items) => items,
        other => {
            return Err(ImportError::FormatParse {
                input: raw.to_string(),
                reason: format!("expected a list, found {:?}", other),
            })
        }
    };

    items
        .into_iter()
        .map(|item| {
            scalar_to_string(&item).ok_or_else(|| ImportError::FormatParse {
                input: raw.to_string(),
                reason: format!("list items must be scalars, found {:?}", item),
            })
        })
        .collect()
}

/// String form of a YAML scalar; `None` for sequences and mappings.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// CLI value first, then the organization's entry, else nothing.
pub fn resolve_format(
    cli_value: Option<Format>,
    org: Option<&OrgConfig>,
    role: FormatRole,
) -> Option<Format> {
    if let Some(format) = cli_value.filter(|f| !f.is_empty()) {
        return Some(format);
    }

    let configured = org.and_then(|org| match role {
        FormatRole::Input => org.input_format.as_ref(),
        FormatRole::Output => org.output_format.as_ref(),
    })?;

    if configured.is_empty() {
        None
    } else {
        Some(Format::new(configured.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(format: Option<Format>) -> Vec<String> {
        format.map(|f| f.columns().to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_parse_comma_separated() {
        assert_eq!(cols(parse_format("A,B,C").unwrap()), vec!["A", "B", "C"]);
        assert_eq!(
            cols(parse_format(" Date , Venue,City ").unwrap()),
            vec!["Date", "Venue", "City"]
        );
    }

    #[test]
    fn test_parse_list_literal() {
        assert_eq!(cols(parse_format("[A, B, C]").unwrap()), vec!["A", "B", "C"]);
        assert_eq!(
            cols(parse_format("[\"Event Date\", 2024]").unwrap()),
            vec!["Event Date", "2024"]
        );
    }

    #[test]
    fn test_parse_empty_is_absent() {
        assert!(parse_format("").unwrap().is_none());
        assert!(parse_format("   ").unwrap().is_none());
        assert!(parse_format("[]").unwrap().is_none());
    }

    #[test]
    fn test_parse_malformed_list_fails() {
        let err = parse_format("[A, B, C").unwrap_err();
        assert!(matches!(err, ImportError::FormatParse { .. }));
    }

    #[test]
    fn test_resolve_precedence() {
        let org = OrgConfig {
            input_format: Some(vec!["x".to_string(), "y".to_string()]),
            ..Default::default()
        };

        let cli = Some(Format::new(["A"]));
        assert_eq!(
            resolve_format(cli, Some(&org), FormatRole::Input),
            Some(Format::new(["A"]))
        );
        assert_eq!(
            resolve_format(None, Some(&org), FormatRole::Input),
            Some(Format::new(["x", "y"]))
        );
        assert_eq!(resolve_format(None, Some(&org), FormatRole::Output), None);
        assert_eq!(resolve_format(None, None, FormatRole::Input), None);
    }
}
