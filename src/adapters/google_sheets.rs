//! Google Sheets v4 REST implementation of [`TabularStore`], authenticated
//! with a service-account key (JWT bearer grant).

use crate::domain::model::Record;
use crate::domain::ports::{
    AccessScope, SortOrder, TableHandle, TabularStore, WorksheetHandle, WorksheetInfo,
};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tokio::sync::RwLock;
use url::Url;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const SCOPE_READONLY: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const SCOPE_READWRITE: &str = "https://www.googleapis.com/auth/spreadsheets";
const SCOPE_DRIVE: &str = "https://www.googleapis.com/auth/drive";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: SecretString,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn scopes(scope: AccessScope) -> String {
    match scope {
        AccessScope::ReadOnly => SCOPE_READONLY.to_string(),
        AccessScope::ReadWrite => format!("{} {}", SCOPE_READWRITE, SCOPE_DRIVE),
    }
}

/// A1 range naming a whole worksheet, e.g. `'Q1 Events'` or `'Q1 Events'!A2`.
fn sheet_range(title: &str, cell: Option<&str>) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    match cell {
        Some(cell) => format!("{}!{}", quoted, cell),
        None => quoted,
    }
}

fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Header row plus data rows to records; short rows are padded.
fn rows_to_records(values: &[Vec<serde_json::Value>]) -> Vec<Record> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(cell_to_string).collect();

    rows.iter()
        .map(|row| {
            Record::from_pairs(header.iter().enumerate().map(|(i, column)| {
                (
                    column.clone(),
                    row.get(i).map(cell_to_string).unwrap_or_default(),
                )
            }))
        })
        .collect()
}

async fn ensure_success(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("HTTP {}: {}", status, body.trim()))
}

pub struct GoogleSheetsStore {
    client: Client,
    api_base: String,
    access_token: RwLock<Option<SecretString>>,
}

impl GoogleSheetsStore {
    pub fn new() -> Self {
        Self::with_api_base(SHEETS_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: RwLock::new(None),
        }
    }

    async fn bearer(&self) -> Result<String> {
        self.access_token
            .read()
            .await
            .as_ref()
            .map(|token| token.expose_secret().clone())
            .ok_or_else(|| ImportError::Authorization {
                reason: "store used before authenticate()".to_string(),
            })
    }

    /// `<api_base>/<segments...>` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, String> {
        let mut url = Url::parse(&self.api_base).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("invalid API base URL '{}'", self.api_base))?
            .extend(segments);
        Ok(url)
    }

    fn load_key(path: &Path) -> Result<(ServiceAccountKey, EncodingKey)> {
        let load_err = |reason: String| ImportError::CredentialLoad {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let key: ServiceAccountKey =
            serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| load_err(format!("invalid private key: {}", e)))?;
        Ok((key, encoding_key))
    }

    async fn batch_update(&self, worksheet: &WorksheetHandle, body: serde_json::Value) -> std::result::Result<(), String> {
        let token = self.bearer().await.map_err(|e| e.to_string())?;
        let url = self.endpoint(&[&format!("{}:batchUpdate", worksheet.table_id)])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        ensure_success(response).await?;
        Ok(())
    }
}

impl Default for GoogleSheetsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabularStore for GoogleSheetsStore {
    async fn authenticate(&self, credentials: &Path, scope: AccessScope) -> Result<()> {
        let (key, encoding_key) = Self::load_key(credentials)?;
        let token_uri = key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &key.client_email,
            scope: scopes(scope),
            aud: token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| ImportError::Authorization {
                reason: format!("cannot sign token request: {}", e),
            })?;

        let auth_err = |reason: String| ImportError::Authorization { reason };
        let response = self
            .client
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| auth_err(e.to_string()))?;
        let token: TokenResponse = ensure_success(response)
            .await
            .map_err(auth_err)?
            .json()
            .await
            .map_err(|e| auth_err(e.to_string()))?;

        *self.access_token.write().await = Some(SecretString::new(token.access_token));
        tracing::debug!(scope = ?scope, "Authorized Google Sheets client");
        Ok(())
    }

    async fn open_table(&self, table_id: &str) -> Result<TableHandle> {
        let token = self.bearer().await?;
        let open_err = |reason: String| ImportError::TableOpen {
            table_id: table_id.to_string(),
            reason,
        };

        let mut url = self.endpoint(&[table_id]).map_err(open_err)?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| open_err(e.to_string()))?;
        let meta: SpreadsheetMeta = ensure_success(response)
            .await
            .map_err(open_err)?
            .json()
            .await
            .map_err(|e| open_err(e.to_string()))?;

        Ok(TableHandle {
            table_id: table_id.to_string(),
            worksheets: meta
                .sheets
                .into_iter()
                .map(|s| WorksheetInfo {
                    id: s.properties.sheet_id,
                    title: s.properties.title,
                })
                .collect(),
        })
    }

    async fn fetch_rows(&self, worksheet: &WorksheetHandle) -> Result<Vec<Record>> {
        let token = self.bearer().await?;
        let fetch_err = |reason: String| ImportError::RecordFetch {
            worksheet: worksheet.worksheet.title.clone(),
            reason,
        };

        let range = sheet_range(&worksheet.worksheet.title, None);
        let mut url = self
            .endpoint(&[&worksheet.table_id, "values", &range])
            .map_err(fetch_err)?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        let values: ValueRange = ensure_success(response)
            .await
            .map_err(fetch_err)?
            .json()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        Ok(rows_to_records(&values.values))
    }

    async fn insert_rows(
        &self,
        worksheet: &WorksheetHandle,
        row: usize,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let destination = format!("Google Sheet '{}'", worksheet.worksheet.title);
        let write_err = |reason: String| ImportError::sink_write(destination.clone(), reason);
        let start = row.saturating_sub(1);

        // Make room first, then fill the new rows.
        self.batch_update(
            worksheet,
            json!({
                "requests": [{
                    "insertDimension": {
                        "range": {
                            "sheetId": worksheet.worksheet.id,
                            "dimension": "ROWS",
                            "startIndex": start,
                            "endIndex": start + rows.len(),
                        },
                        "inheritFromBefore": false,
                    }
                }]
            }),
        )
        .await
        .map_err(write_err)?;

        let token = self.bearer().await?;
        let range = sheet_range(&worksheet.worksheet.title, Some(&format!("A{}", row)));
        let mut url = self
            .endpoint(&[&worksheet.table_id, "values", &range])
            .map_err(write_err)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": rows,
            }))
            .send()
            .await
            .map_err(|e| write_err(e.to_string()))?;
        ensure_success(response).await.map_err(write_err)?;
        Ok(())
    }

    async fn sort_by_column(
        &self,
        worksheet: &WorksheetHandle,
        column: usize,
        order: SortOrder,
    ) -> Result<()> {
        let sort_order = match order {
            SortOrder::Ascending => "ASCENDING",
            SortOrder::Descending => "DESCENDING",
        };

        self.batch_update(
            worksheet,
            json!({
                "requests": [{
                    "sortRange": {
                        "range": {
                            "sheetId": worksheet.worksheet.id,
                            "startRowIndex": 1,
                        },
                        "sortSpecs": [{
                            "dimensionIndex": column.saturating_sub(1),
                            "sortOrder": sort_order,
                        }]
                    }
                }]
            }),
        )
        .await
        .map_err(|reason| {
            ImportError::sink_write(format!("Google Sheet '{}'", worksheet.worksheet.title), reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_range_quotes_title() {
        assert_eq!(sheet_range("Events", None), "'Events'");
        assert_eq!(sheet_range("Bob's List", Some("A2")), "'Bob''s List'!A2");
    }

    #[test]
    fn test_rows_to_records_pads_short_rows() {
        let values = vec![
            vec![json!("Date"), json!("Venue"), json!("Count")],
            vec![json!("2025-01-01"), json!("Hall")],
            vec![json!("2025-01-02"), json!("Club"), json!(7)],
        ];
        let records = rows_to_records(&values);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Count"), Some(""));
        assert_eq!(records[1].get("Count"), Some("7"));
    }

    #[test]
    fn test_rows_to_records_empty_sheet() {
        assert!(rows_to_records(&[]).is_empty());
        assert!(rows_to_records(&[vec![json!("Only"), json!("Header")]]).is_empty());
    }

    #[test]
    fn test_scopes() {
        assert_eq!(scopes(AccessScope::ReadOnly), SCOPE_READONLY);
        assert!(scopes(AccessScope::ReadWrite).contains(SCOPE_DRIVE));
    }

    #[tokio::test]
    async fn test_missing_credentials_file() {
        let store = GoogleSheetsStore::new();
        let err = store
            .authenticate(Path::new("/no/such/creds.json"), AccessScope::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::CredentialLoad { .. }));
    }

    #[tokio::test]
    async fn test_unauthenticated_use_is_rejected() {
        let store = GoogleSheetsStore::new();
        let err = store.open_table("abc").await.unwrap_err();
        assert!(matches!(err, ImportError::Authorization { .. }));
    }
}
