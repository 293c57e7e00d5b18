//! Google Sheets RowStore over the Sheets REST v4 values API.
//!
//! This module is feature-gated behind `sheets`. Authentication uses a
//! service-account key file; the worksheet is addressed by spreadsheet id and
//! worksheet title.
//!
//! Sheets grids have a fixed column count. Appending a column past that count
//! fails with a write error until an operator widens the worksheet; the schema
//! manager then degrades to the columns that exist.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::LedgerError;
use super::store::{check_coordinates, last_header_column, RowStore};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Location of the worksheet backing the ledger.
#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

pub struct SheetsRowStore {
    config: SheetsConfig,
    token_provider: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl fmt::Debug for SheetsRowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsRowStore")
            .field("config", &self.config)
            .field("token_provider", &"<TokenProvider>")
            .finish()
    }
}

impl SheetsRowStore {
    /// Builds a store authenticated with the service-account key at `credentials_path`.
    pub fn from_credentials_file(
        config: SheetsConfig,
        credentials_path: impl AsRef<Path>,
    ) -> Result<Self, LedgerError> {
        let path = credentials_path.as_ref();
        let account = CustomServiceAccount::from_file(path).map_err(|e| {
            LedgerError::unavailable(format!(
                "load service account credentials '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::with_token_provider(config, Arc::new(account))
    }

    pub fn with_token_provider(
        config: SheetsConfig,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, LedgerError> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(LedgerError::unavailable("spreadsheet id must not be empty"));
        }
        if config.worksheet.trim().is_empty() {
            return Err(LedgerError::unavailable("worksheet title must not be empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::unavailable(format!("build http client: {}", e)))?;
        Ok(Self {
            config,
            token_provider,
            client,
        })
    }

    async fn access_token(&self) -> Result<String, LedgerError> {
        let token = self
            .token_provider
            .token(&[SHEETS_SCOPE])
            .await
            .map_err(|e| LedgerError::unavailable(format!("fetch sheets access token: {}", e)))?;
        Ok(token.as_str().to_string())
    }

    fn values_url(&self, range: &str) -> Result<Url, LedgerError> {
        values_url(&self.config.api_base, &self.config.spreadsheet_id, range)
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, LedgerError> {
        let mut url = self.values_url(range)?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| LedgerError::unavailable(format!("sheets read {}: {}", range, e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LedgerError::unavailable(format!("sheets read body {}: {}", range, e)))?;
        if !status.is_success() {
            return Err(LedgerError::unavailable(format!(
                "sheets read {} returned {}: {}",
                range, status, body
            )));
        }
        decode_value_range(&body)
    }

    async fn put_cell(&self, range: &str, value: &str) -> Result<(), LedgerError> {
        let mut url = self.values_url(range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let token = self.access_token().await?;
        let body = ValueRangeUpdate {
            range,
            major_dimension: "ROWS",
            values: [[value]],
        };
        let response = self
            .client
            .put(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::write(format!("sheets write {}: {}", range, e)))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LedgerError::write(format!(
                "sheets write {} returned {}: {}",
                range, status, detail
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RowStore for SheetsRowStore {
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, LedgerError> {
        self.get_values(&worksheet_range(&self.config.worksheet))
            .await
    }

    async fn read_header(&self) -> Result<Vec<String>, LedgerError> {
        let range = format!("{}!1:1", quote_worksheet(&self.config.worksheet));
        Ok(self.get_values(&range).await?.into_iter().next().unwrap_or_default())
    }

    async fn read_cell(&self, row: usize, col: usize) -> Result<String, LedgerError> {
        check_coordinates(row, col)?;
        let range = cell_range(&self.config.worksheet, row, col);
        Ok(self
            .get_values(&range)
            .await?
            .into_iter()
            .next()
            .and_then(|r| r.into_iter().next())
            .unwrap_or_default())
    }

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), LedgerError> {
        check_coordinates(row, col)?;
        let range = cell_range(&self.config.worksheet, row, col);
        self.put_cell(&range, value).await
    }

    async fn append_column(&self, name: &str) -> Result<usize, LedgerError> {
        let header = self.read_header().await?;
        let col = last_header_column(&header) + 1;
        let range = cell_range(&self.config.worksheet, 1, col);
        self.put_cell(&range, name).await?;
        Ok(col)
    }
}

/// Spreadsheet column letters for a 1-based column: 1 -> `A`, 27 -> `AA`.
pub fn column_letters(col: usize) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn quote_worksheet(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

fn worksheet_range(worksheet: &str) -> String {
    quote_worksheet(worksheet)
}

/// A1 range of a single cell, worksheet title quoted.
pub fn cell_range(worksheet: &str, row: usize, col: usize) -> String {
    format!("{}!{}{}", quote_worksheet(worksheet), column_letters(col), row)
}

fn values_url(api_base: &str, spreadsheet_id: &str, range: &str) -> Result<Url, LedgerError> {
    let mut url = Url::parse(api_base)
        .map_err(|e| LedgerError::unavailable(format!("invalid sheets api base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| LedgerError::unavailable("sheets api base cannot carry a path"))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

fn decode_value_range(body: &str) -> Result<Vec<Vec<String>>, LedgerError> {
    let range: ValueRange = serde_json::from_str(body)
        .map_err(|e| LedgerError::unavailable(format!("decode sheets values: {}", e)))?;
    Ok(range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
