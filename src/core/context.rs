use crate::config::settings::RunSettings;
use crate::utils::error::ImportError;

pub const DEFAULT_SAMPLE_SIZE: usize = 5;
const REDACTED: &str = "[REDACTED]";

/// Masks configured secret strings before they reach a log line.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.add_secret(secret);
        self
    }

    pub fn add_secret(&mut self, secret: impl Into<String>) {
        let secret = secret.into();
        if !secret.is_empty() && !self.secrets.contains(&secret) {
            self.secrets.push(secret);
            // longest first so a secret containing another is masked whole
            self.secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        }
    }

    pub fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret, REDACTED))
    }
}

/// Per-run diagnostics context handed to each stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    redactor: Redactor,
    sample_size: usize,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            redactor: Redactor::default(),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl RunContext {
    pub fn new(redactor: Redactor, sample_size: usize) -> Self {
        Self {
            redactor,
            sample_size,
        }
    }

    /// Context whose redaction rules cover the run's remote store id and
    /// credential path.
    pub fn for_settings(settings: &RunSettings) -> Self {
        let mut redactor = Redactor::new();
        if let Some(remote) = &settings.remote {
            redactor.add_secret(remote.table_id.clone());
            redactor.add_secret(remote.credentials.to_string_lossy().into_owned());
        }
        Self::new(redactor, DEFAULT_SAMPLE_SIZE)
    }

    pub fn redact(&self, text: &str) -> String {
        self.redactor.redact(text)
    }

    /// How many keys the deduplicator samples into the debug log.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Logs a fatal run error once, with secrets masked.
    pub fn log_failure(&self, err: &ImportError) {
        tracing::error!(
            category = ?err.category(),
            "csvimport failed: {}",
            self.redact(&err.to_string())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_all_secrets() {
        let redactor = Redactor::new()
            .with_secret("sheet-123")
            .with_secret("/secure/creds.json");
        assert_eq!(
            redactor.redact("open sheet-123 with /secure/creds.json"),
            "open [REDACTED] with [REDACTED]"
        );
    }

    #[test]
    fn test_longer_secret_masked_first() {
        let redactor = Redactor::new().with_secret("abc").with_secret("abcdef");
        assert_eq!(redactor.redact("id=abcdef"), "id=[REDACTED]");
    }

    #[test]
    fn test_empty_secret_ignored() {
        let redactor = Redactor::new().with_secret("");
        assert_eq!(redactor.redact("nothing hidden"), "nothing hidden");
    }
}
