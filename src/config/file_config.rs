use crate::utils::error::{ImportError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "confs/csvimport.conf";

/// Contents of `csvimport.conf`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub organizations: HashMap<String, OrgConfig>,
    #[serde(default)]
    pub google: Option<GoogleConfig>,
}

/// Per-organization column layout and sheet settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgConfig {
    #[serde(default, deserialize_with = "string_list_opt")]
    pub input_format: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list_opt")]
    pub output_format: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list_opt")]
    pub key_fields: Option<Vec<String>>,
    pub sheet_name: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub extra_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub sheet_id: Option<String>,
    pub sheet_name: Option<String>,
    pub creds: Option<String>,
}

/// Config lists may hold numbers or booleans; they are kept as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarItem {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<ScalarItem> for String {
    fn from(item: ScalarItem) -> Self {
        match item {
            ScalarItem::Str(s) => s,
            ScalarItem::Int(i) => i.to_string(),
            ScalarItem::Float(f) => f.to_string(),
            ScalarItem::Bool(b) => b.to_string(),
        }
    }
}

fn string_list_opt<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Option<Vec<ScalarItem>> = Option::deserialize(deserializer)?;
    Ok(items.map(|items| items.into_iter().map(String::from).collect()))
}

fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_list_opt(deserializer)?.unwrap_or_default())
}

impl ImportConfig {
    /// Loads the config file. A missing file is an empty config unless the
    /// path was given explicitly.
    pub fn load<P: AsRef<Path>>(path: P, explicit: bool) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            if explicit {
                return Err(ImportError::configuration(format!(
                    "config file '{}' not found",
                    path.display()
                )));
            }
            tracing::debug!("No config file at {}, using empty config", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        if processed.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&processed)
            .map_err(|e| ImportError::configuration(format!("YAML parsing error: {}", e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        toml::from_str(&processed)
            .map_err(|e| ImportError::configuration(format!("TOML parsing error: {}", e)))
    }

    pub fn organization(&self, name: Option<&str>) -> Option<&OrgConfig> {
        name.and_then(|name| self.organizations.get(name))
    }
}

/// Replaces `${VAR}` with the environment value; unset variables stay as written.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}
