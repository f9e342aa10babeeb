use crate::config::file_config::{GoogleConfig, ImportConfig};
use crate::core::existing::ExistingSource;
use crate::core::format::{parse_format, resolve_format, FormatRole};
use crate::domain::model::Format;
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{
    repeated_columns, validate_non_empty_string, validate_path, Validate,
};
use std::path::PathBuf;

#[cfg(feature = "cli")]
use crate::config::cli::CliArgs;

pub const ENV_SHEET_ID: &str = "GOOGLE_SHEET_ID";
pub const ENV_SHEET_NAME: &str = "GOOGLE_SHEET_NAME";
pub const ENV_CREDS: &str = "GOOGLE_CREDS";

/// Coordinates of a worksheet in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub table_id: String,
    pub worksheet: String,
    pub credentials: PathBuf,
}

/// Raw, unresolved inputs from the command line. Mirrors the CLI flags so
/// the resolution can be driven without clap.
#[derive(Debug, Clone, Default)]
pub struct SettingsInput {
    pub input_files: Vec<String>,
    pub output: Option<String>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub org: Option<String>,
    pub existing_csv: Option<String>,
    pub existing_sheet_id: Option<String>,
    pub sheet_name: Option<String>,
    pub existing_sheet_name: Option<String>,
    pub google_creds: Option<String>,
    pub key_columns: Option<String>,
    pub backup_dir: String,
    pub dry_run: bool,
    pub allow_unkeyed_insert: bool,
}

#[cfg(feature = "cli")]
impl From<&CliArgs> for SettingsInput {
    fn from(args: &CliArgs) -> Self {
        Self {
            input_files: args.input_paths(),
            output: args.output.clone(),
            input_format: args.input_format.clone(),
            output_format: args.output_format.clone(),
            org: args.org.clone(),
            existing_csv: args.existing_csv.clone(),
            existing_sheet_id: args.existing_sheet_id.clone(),
            sheet_name: args.sheet_name.clone(),
            existing_sheet_name: args.existing_sheet_name.clone(),
            google_creds: args.google_creds.clone(),
            key_columns: args.key_columns.clone(),
            backup_dir: args.backup_dir.clone(),
            dry_run: args.dry_run,
            allow_unkeyed_insert: args.allow_unkeyed_insert,
        }
    }
}

/// Fully resolved settings for one run. Immutable once built.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub org: Option<String>,
    pub input_files: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub input_format: Format,
    pub output_format: Format,
    pub key_columns: Vec<String>,
    pub existing: Option<ExistingSource>,
    pub remote: Option<RemoteTarget>,
    pub extra_columns: Vec<String>,
    pub backup_dir: PathBuf,
    pub dry_run: bool,
    pub allow_unkeyed_insert: bool,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl RunSettings {
    /// Resolves CLI values against the config file and the environment.
    ///
    /// Fails before any file is touched when either format cannot be resolved.
    pub fn resolve<F>(input: &SettingsInput, config: &ImportConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let org = config.organization(input.org.as_deref());
        if input.org.is_some() && org.is_none() {
            tracing::warn!(
                "Organization '{}' not found in config",
                input.org.as_deref().unwrap_or_default()
            );
        }

        let cli_input = match input.input_format.as_deref() {
            Some(raw) => parse_format(raw)?,
            None => None,
        };
        let cli_output = match input.output_format.as_deref() {
            Some(raw) => parse_format(raw)?,
            None => None,
        };
        let input_format = resolve_format(cli_input, org, FormatRole::Input);
        let output_format = resolve_format(cli_output, org, FormatRole::Output);

        let (input_format, output_format) = match (input_format, output_format) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                return Err(ImportError::configuration(
                    "Input and output formats must be specified via CLI or config.",
                ))
            }
        };

        let key_columns: Vec<String> = match non_empty(input.key_columns.as_deref()) {
            Some(raw) => raw.split(',').map(|c| c.trim().to_string()).collect(),
            None => org
                .and_then(|o| o.key_fields.as_ref())
                .map(|fields| fields.iter().map(|c| c.trim().to_string()).collect())
                .unwrap_or_default(),
        };

        let google = config.google.clone().unwrap_or_default();
        let remote = resolve_remote(input, org.and_then(|o| o.sheet_name.as_deref()), &google, &env);

        let existing = if key_columns.is_empty() {
            None
        } else if let Some(path) = non_empty(input.existing_csv.as_deref()) {
            Some(ExistingSource::File(PathBuf::from(path)))
        } else {
            remote.clone().map(ExistingSource::Remote)
        };

        let settings = Self {
            org: input.org.clone(),
            input_files: input.input_files.iter().map(PathBuf::from).collect(),
            output: non_empty(input.output.as_deref()).map(PathBuf::from),
            input_format,
            output_format,
            key_columns,
            existing,
            remote,
            extra_columns: org.map(|o| o.extra_columns.clone()).unwrap_or_default(),
            backup_dir: PathBuf::from(&input.backup_dir),
            dry_run: input.dry_run,
            allow_unkeyed_insert: input.allow_unkeyed_insert,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Store id, worksheet and credentials, each from the first source that has
/// it. All three must be present for a remote target.
fn resolve_remote<F>(
    input: &SettingsInput,
    org_sheet_name: Option<&str>,
    google: &GoogleConfig,
    env: &F,
) -> Option<RemoteTarget>
where
    F: Fn(&str) -> Option<String>,
{
    let table_id = non_empty(input.existing_sheet_id.as_deref())
        .or_else(|| non_empty(google.sheet_id.as_deref()))
        .or_else(|| non_empty(env(ENV_SHEET_ID).as_deref()));

    let worksheet = non_empty(input.sheet_name.as_deref())
        .or_else(|| non_empty(org_sheet_name))
        .or_else(|| non_empty(input.existing_sheet_name.as_deref()))
        .or_else(|| non_empty(google.sheet_name.as_deref()))
        .or_else(|| non_empty(env(ENV_SHEET_NAME).as_deref()));

    let credentials = non_empty(input.google_creds.as_deref())
        .or_else(|| non_empty(google.creds.as_deref()))
        .or_else(|| non_empty(env(ENV_CREDS).as_deref()));

    Some(RemoteTarget {
        table_id: table_id?,
        worksheet: worksheet?,
        credentials: PathBuf::from(credentials?),
    })
}

impl Validate for RunSettings {
    fn validate(&self) -> Result<()> {
        if self.input_files.is_empty() {
            return Err(ImportError::configuration("no input files given"));
        }
        for path in &self.input_files {
            validate_path("input_files", &path.to_string_lossy())?;
        }
        if let Some(output) = &self.output {
            validate_path("output", &output.to_string_lossy())?;
        }
        let repeated = repeated_columns(self.output_format.columns());
        if !repeated.is_empty() {
            tracing::warn!(
                "Output format lists columns more than once: {}",
                repeated.join(", ")
            );
        }
        for column in &self.key_columns {
            validate_non_empty_string("key_columns", column)?;
        }
        if let Some(remote) = &self.remote {
            validate_non_empty_string("sheet_id", &remote.table_id)?;
            validate_non_empty_string("sheet_name", &remote.worksheet)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn config() -> ImportConfig {
        ImportConfig::from_yaml_str(
            r#"
organizations:
  acme:
    input_format: [A, B]
    output_format: [B, A]
    key_fields: [" A "]
    sheet_name: OrgSheet
    extra_columns: [x]
google:
  sheet_id: sheet-1
  sheet_name: GlobalSheet
  creds: creds.json
"#,
        )
        .unwrap()
    }

    fn input() -> SettingsInput {
        SettingsInput {
            input_files: vec!["in.csv".to_string()],
            backup_dir: "backups".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_formats_is_configuration_error() {
        let err = RunSettings::resolve(&input(), &ImportConfig::default(), no_env).unwrap_err();
        assert!(matches!(err, ImportError::Configuration { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_org_config_fills_formats_keys_and_sheet() {
        let mut inp = input();
        inp.org = Some("acme".to_string());

        let settings = RunSettings::resolve(&inp, &config(), no_env).unwrap();
        assert_eq!(settings.input_format, Format::new(["A", "B"]));
        assert_eq!(settings.output_format, Format::new(["B", "A"]));
        assert_eq!(settings.key_columns, vec!["A"]);
        assert_eq!(settings.extra_columns, vec!["x"]);

        let remote = settings.remote.clone().unwrap();
        assert_eq!(remote.worksheet, "OrgSheet");
        assert_eq!(remote.table_id, "sheet-1");
        assert_eq!(settings.existing, Some(ExistingSource::Remote(remote)));
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut inp = input();
        inp.org = Some("acme".to_string());
        inp.output_format = Some("[C]".to_string());
        inp.key_columns = Some("B, C".to_string());
        inp.sheet_name = Some("CliSheet".to_string());
        inp.existing_csv = Some("existing.csv".to_string());

        let settings = RunSettings::resolve(&inp, &config(), no_env).unwrap();
        assert_eq!(settings.output_format, Format::new(["C"]));
        assert_eq!(settings.key_columns, vec!["B", "C"]);
        assert_eq!(settings.remote.as_ref().unwrap().worksheet, "CliSheet");
        assert_eq!(
            settings.existing,
            Some(ExistingSource::File(PathBuf::from("existing.csv")))
        );
    }

    #[test]
    fn test_remote_from_environment() {
        let mut inp = input();
        inp.input_format = Some("A".to_string());
        inp.output_format = Some("A".to_string());
        let env = |name: &str| match name {
            ENV_SHEET_ID => Some("env-id".to_string()),
            ENV_SHEET_NAME => Some("EnvSheet".to_string()),
            ENV_CREDS => Some("/env/creds.json".to_string()),
            _ => None,
        };

        let settings = RunSettings::resolve(&inp, &ImportConfig::default(), env).unwrap();
        let remote = settings.remote.unwrap();
        assert_eq!(remote.table_id, "env-id");
        assert_eq!(remote.worksheet, "EnvSheet");
        assert_eq!(remote.credentials, PathBuf::from("/env/creds.json"));
        // No key columns, so nothing to compare against.
        assert!(settings.existing.is_none());
    }

    #[test]
    fn test_incomplete_remote_is_absent() {
        let mut inp = input();
        inp.input_format = Some("A".to_string());
        inp.output_format = Some("A".to_string());
        inp.existing_sheet_id = Some("id".to_string());

        let settings = RunSettings::resolve(&inp, &ImportConfig::default(), no_env).unwrap();
        assert!(settings.remote.is_none());
    }

    #[test]
    fn test_repeated_output_column_is_accepted() {
        let mut inp = input();
        inp.input_format = Some("A".to_string());
        inp.output_format = Some("A,A".to_string());

        let settings = RunSettings::resolve(&inp, &ImportConfig::default(), no_env).unwrap();
        assert_eq!(settings.output_format, Format::new(["A", "A"]));
    }

    #[test]
    fn test_malformed_cli_format_fails() {
        let mut inp = input();
        inp.input_format = Some("[A, B".to_string());
        inp.output_format = Some("A".to_string());
        let err = RunSettings::resolve(&inp, &ImportConfig::default(), no_env).unwrap_err();
        assert!(matches!(err, ImportError::FormatParse { .. }));
    }
}
