//! Google Sheets client
//!
//! Each logical table is a tab of one spreadsheet. Authentication uses a
//! service account: an RS256-signed assertion is exchanged for a short-lived
//! access token, which is cached until shortly before it expires.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{Row, RowValues, TabularStore};
use crate::config::GoogleCredentials;
use crate::utils::errors::StoreError;
use crate::utils::fields::{fold_key, scalar_to_string};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Refresh this many seconds before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Cells are stored as sent. Form values starting with `=` or `+` are never
/// parsed as formulas.
const APPEND_QUERY: &[(&str, &str)] = &[
    ("valueInputOption", "RAW"),
    ("insertDataOption", "INSERT_ROWS"),
];

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Cached access token
#[derive(Clone, Debug)]
struct AccessToken {
    token: String,
    expires_at: chrono::DateTime<Utc>,
}

impl AccessToken {
    fn new(token: String, expires_in_secs: i64) -> Self {
        Self {
            token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in_secs - EXPIRY_MARGIN_SECS),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

pub struct GoogleSheetsClient {
    client: Client,
    credentials: GoogleCredentials,
    spreadsheet_id: String,
    token: RwLock<Option<AccessToken>>,
}

impl GoogleSheetsClient {
    pub fn new(
        credentials: GoogleCredentials,
        spreadsheet_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unreachable(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            spreadsheet_id: spreadsheet_id.into(),
            token: RwLock::new(None),
        })
    }

    /// Signed service-account assertion for the token exchange
    fn assertion(&self) -> Result<String, StoreError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: SCOPE,
            aud: TOKEN_URL,
            exp: now + 3600,
            iat: now,
        };
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid service account key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StoreError::Auth(format!("cannot sign assertion: {}", e)))
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if !cached.is_expired() {
                return Ok(cached.token.clone());
            }
        }

        let mut slot = self.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = slot.as_ref() {
            if !cached.is_expired() {
                return Ok(cached.token.clone());
            }
        }

        log::info!("🔐 Requesting spreadsheet access token for {}", self.credentials.client_email);
        let assertion = self.assertion()?;
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ Token exchange failed ({}): {}", status, body);
            return Err(if status.is_server_error() {
                StoreError::Unreachable(format!("token endpoint returned {}", status))
            } else {
                StoreError::Auth(format!("token exchange rejected ({})", status))
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("token response: {}", e)))?;
        let cached = AccessToken::new(token.access_token, token.expires_in);
        let value = cached.token.clone();
        *slot = Some(cached);
        Ok(value)
    }

    /// `<api>/<spreadsheet>/values/<range><suffix>`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(SHEETS_API)
            .map_err(|e| StoreError::InvalidResponse(format!("bad API url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidResponse("API url cannot be a base".to_string()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn get_values(&self, table: &str, range: &str) -> Result<Vec<Vec<Value>>, StoreError> {
        let token = self.access_token().await?;
        let url = self.values_url(range, "")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(table, response).await?;
        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("values response: {}", e)))?;
        Ok(body.values)
    }

    async fn write_values(
        &self,
        table: &str,
        range: &str,
        suffix: &str,
        query: &[(&str, &str)],
        values: Vec<Vec<String>>,
        append: bool,
    ) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let url = self.values_url(range, suffix)?;
        let request = if append {
            self.client.post(url)
        } else {
            self.client.put(url)
        };
        let response = request
            .bearer_auth(token)
            .query(query)
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(table, response).await?;
        Ok(())
    }

    /// Header row of a tab; writes `columns` as the header when the tab is empty
    async fn ensure_header(&self, table: &str, columns: &[&str]) -> Result<Vec<String>, StoreError> {
        let header: Vec<String> = self
            .get_values(table, &header_range(table))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default()
            .iter()
            .map(|cell| scalar_to_string(cell).unwrap_or_default())
            .collect();

        if header.iter().any(|h| !h.is_empty()) {
            return Ok(header);
        }

        log::info!("📝 Tab '{}' has no header, writing {} columns", table, columns.len());
        let header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.write_values(
            table,
            &header_range(table),
            "",
            &[("valueInputOption", "RAW")],
            vec![header.clone()],
            false,
        )
        .await?;
        Ok(header)
    }
}

fn quoted_tab(table: &str) -> String {
    format!("'{}'", table.replace('\'', "''"))
}

fn header_range(table: &str) -> String {
    format!("{}!1:1", quoted_tab(table))
}

/// Order `row` by `header`. Unknown columns are left blank; columns the
/// header lacks are dropped with a warning.
pub(crate) fn align_to_header(table: &str, header: &[String], row: &RowValues) -> Vec<String> {
    let folded: Vec<String> = header.iter().map(|h| fold_key(h)).collect();
    for (column, _) in row {
        if !folded.contains(&fold_key(column)) {
            log::warn!("⚠️ Column '{}' missing from tab '{}', value dropped", column, table);
        }
    }

    folded
        .iter()
        .map(|key| {
            row.iter()
                .find(|(column, _)| fold_key(column) == *key)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// Zip a value grid (header first) into rows keyed by header
pub(crate) fn rows_from_values(values: Vec<Vec<Value>>) -> Vec<Row> {
    let mut lines = values.into_iter();
    let header: Vec<String> = match lines.next() {
        Some(header) => header
            .iter()
            .map(|cell| scalar_to_string(cell).unwrap_or_default())
            .collect(),
        None => return Vec::new(),
    };

    lines
        .filter(|line| line.iter().any(|cell| scalar_to_string(cell).is_some()))
        .map(|line| {
            header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(i, name)| {
                    let value = line.get(i).and_then(scalar_to_string).unwrap_or_default();
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

fn map_transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Unreachable(format!("request timed out: {}", err))
    } else {
        StoreError::Unreachable(err.to_string())
    }
}

async fn check_status(table: &str, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(table, status, &body))
}

/// Map a failed Sheets API response onto the store taxonomy
pub(crate) fn classify_failure(table: &str, status: StatusCode, body: &str) -> StoreError {
    match status {
        StatusCode::BAD_REQUEST if body.contains("Unable to parse range") => {
            StoreError::TableNotFound(table.to_string())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::Auth(format!("{} on tab '{}'", status, table))
        }
        StatusCode::TOO_MANY_REQUESTS => StoreError::Unreachable("rate limited".to_string()),
        s if s.is_server_error() => StoreError::Unreachable(format!("sheets API returned {}", s)),
        s => StoreError::InvalidResponse(format!("sheets API returned {}: {}", s, body)),
    }
}

#[async_trait]
impl TabularStore for GoogleSheetsClient {
    async fn append_row(&self, table: &str, row: &RowValues) -> Result<(), StoreError> {
        let columns: Vec<&str> = row.iter().map(|(column, _)| *column).collect();
        let header = self.ensure_header(table, &columns).await?;
        let values = align_to_header(table, &header, row);

        self.write_values(
            table,
            &quoted_tab(table),
            ":append",
            APPEND_QUERY,
            vec![values],
            true,
        )
        .await?;
        log::info!("✅ Row appended to tab '{}'", table);
        Ok(())
    }

    async fn read_rows(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let values = self.get_values(table, &quoted_tab(table)).await?;
        let rows = rows_from_values(values);
        log::debug!("📖 Read {} rows from tab '{}'", rows.len(), table);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleSheetsClient {
        GoogleSheetsClient::new(
            GoogleCredentials {
                client_email: "svc@project.iam.gserviceaccount.com".into(),
                private_key: "not a key".into(),
            },
            "sheet-123",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_values_url_escapes_range() {
        let url = client().values_url(&quoted_tab("bookings"), ":append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/'bookings':append"
        );
        let url = client().values_url(&header_range("my tab"), "").unwrap();
        assert!(url.as_str().ends_with("/values/'my%20tab'!1:1"));
    }

    #[test]
    fn test_align_to_header_matches_folded_names() {
        let header = vec!["booking_id".to_string(), "Customer Name".to_string(), "Notes".to_string()];
        let row = vec![
            ("Booking_ID", "ST-1019-ABCD".to_string()),
            ("Customer_Name", "Asha".to_string()),
            ("Mobile_Number", "9876543210".to_string()),
        ];
        assert_eq!(
            align_to_header("bookings", &header, &row),
            vec!["ST-1019-ABCD".to_string(), "Asha".to_string(), String::new()]
        );
    }

    #[test]
    fn test_appended_values_are_not_interpreted() {
        assert!(APPEND_QUERY.contains(&("valueInputOption", "RAW")));
        assert!(!APPEND_QUERY.iter().any(|(_, v)| *v == "USER_ENTERED"));

        let header = vec!["Customer_Name".to_string(), "Mobile_Number".to_string()];
        let row = vec![
            ("Customer_Name", "=HYPERLINK(\"http://evil.example\",\"x\")".to_string()),
            ("Mobile_Number", "+91 98765 43210".to_string()),
        ];
        assert_eq!(
            align_to_header("bookings", &header, &row),
            vec![
                "=HYPERLINK(\"http://evil.example\",\"x\")".to_string(),
                "+91 98765 43210".to_string(),
            ]
        );
    }

    #[test]
    fn test_rows_from_values() {
        let values = vec![
            vec![json!("Origin"), json!("Destination"), json!("Distance")],
            vec![json!("Chennai"), json!("Pondicherry"), json!(150)],
            vec![json!(""), json!("")],
            vec![json!("Chennai")],
        ];
        let rows = rows_from_values(values);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Distance"], "150");
        assert_eq!(rows[1]["Destination"], "");
        assert!(rows_from_values(Vec::new()).is_empty());
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure("careers", StatusCode::BAD_REQUEST, "Unable to parse range: 'careers'"),
            StoreError::TableNotFound("careers".into())
        );
        assert!(matches!(
            classify_failure("bookings", StatusCode::FORBIDDEN, ""),
            StoreError::Auth(_)
        ));
        assert!(classify_failure("bookings", StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(classify_failure("bookings", StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(matches!(
            classify_failure("bookings", StatusCode::NOT_FOUND, "no such spreadsheet"),
            StoreError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_bad_private_key_is_an_auth_error() {
        assert!(matches!(client().assertion(), Err(StoreError::Auth(_))));
    }

    #[test]
    fn test_access_token_expiry() {
        assert!(!AccessToken::new("t".into(), 3600).is_expired());
        assert!(AccessToken::new("t".into(), 30).is_expired());
    }
}
