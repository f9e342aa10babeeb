use crate::utils::error::{ImportError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: &str) -> ImportError {
    ImportError::configuration(format!(
        "invalid value for {}: '{}' ({})",
        field_name, value, reason
    ))
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Columns named more than once, each reported once, in first-repeat order.
pub fn repeated_columns(columns: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    let mut repeated: Vec<&str> = Vec::new();
    for column in columns {
        if !seen.insert(column.as_str()) && !repeated.contains(&column.as_str()) {
            repeated.push(column);
        }
    }
    repeated
}
