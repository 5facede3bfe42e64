//! Sheets v4 `values` API client implementing `RowSource`.

use async_trait::async_trait;
use guestpass_core::config::SheetsConfig;
use guestpass_core::error::{GuestPassError, Result};
use guestpass_core::traits::RowSource;
use serde::Deserialize;

use crate::auth::TokenProvider;

/// Columns fetched on every read.
const READ_COLUMNS: &str = "A:Z";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Google Sheets backed row source.
pub struct SheetsRowSource {
    api_base: String,
    spreadsheet_id: String,
    sheet_name: Option<String>,
    http: reqwest::Client,
    auth: TokenProvider,
}

impl SheetsRowSource {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GuestPassError::Config(format!("HTTP client: {e}")))?;
        let auth = TokenProvider::new(&config.credentials, http.clone())?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            http,
            auth,
        })
    }

    /// Prefix an A1 range with the worksheet title, if one is configured.
    fn qualified(&self, a1: &str) -> String {
        match &self.sheet_name {
            Some(sheet) => format!("'{}'!{a1}", sheet.replace('\'', "''")),
            None => a1.to_string(),
        }
    }

    fn values_url(&self, range: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| GuestPassError::Config(format!("Invalid Sheets API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GuestPassError::Config("Sheets API base cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    /// Send a request with a bearer token. Transport failures become `err`.
    /// A 401 drops the cached token so the next call re-authenticates.
    async fn send_authed(
        &self,
        req: reqwest::RequestBuilder,
        err: fn(String) -> GuestPassError,
    ) -> Result<reqwest::Response> {
        let token = self.auth.access_token().await?;
        let resp = req
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| err(format!("Sheets request failed: {e}")))?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
        }
        Ok(resp)
    }
}

/// `1 → A`, `26 → Z`, `27 → AA`.
pub fn column_letters(column: u32) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RowSource for SheetsRowSource {
    fn name(&self) -> &str {
        "google-sheets"
    }

    async fn get_all_rows(&self) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(&self.qualified(READ_COLUMNS))?;
        let resp = self
            .send_authed(self.http.get(url), GuestPassError::SourceRead)
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GuestPassError::SourceRead(format!("Sheets API {status}: {body}")));
        }

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| GuestPassError::SourceRead(format!("Bad values response: {e}")))?;

        let rows: Vec<Vec<String>> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        tracing::debug!("📄 Read {} row(s) from spreadsheet {}", rows.len(), self.spreadsheet_id);
        Ok(rows)
    }

    async fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<()> {
        if row == 0 || column == 0 {
            return Err(GuestPassError::StateWrite(format!(
                "Cell address is 1-based, got row {row} column {column}"
            )));
        }
        let a1 = format!("{}{row}", column_letters(column));
        let mut url = self.values_url(&self.qualified(&a1))?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let req = self
            .http
            .put(url)
            .json(&serde_json::json!({ "values": [[value]] }));
        let resp = self
            .send_authed(req, GuestPassError::StateWrite)
            .await
            .map_err(|e| e.restage(GuestPassError::StateWrite))?;

        if resp.status().is_success() {
            tracing::debug!("✏️ {a1} ← '{value}'");
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(GuestPassError::StateWrite(format!("Sheets API {status} writing {a1}: {body}")))
        }
    }
}
