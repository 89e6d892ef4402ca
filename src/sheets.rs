use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("sheets request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("sheets api returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),
    #[error("api key access is read-only")]
    ReadOnly,
    #[error("row {0} is not a spreadsheet row")]
    RowOutOfRange(usize),
}

/// How requests authenticate against the Sheets API.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetsAuth {
    /// OAuth access token, sent as a bearer header. Allows writes.
    AccessToken(String),
    /// API key, sent as the `key` query parameter. Public sheets, reads only.
    ApiKey(String),
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// Minimal Google Sheets v4 client for whole-row reads and writes.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl SheetsClient {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        auth: SheetsAuth,
        timeout: Duration,
    ) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(SheetsClient {
            http,
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn can_write(&self) -> bool {
        matches!(self.auth, SheetsAuth::AccessToken(_))
    }

    /// Reads every populated row of `worksheet` as text.
    pub async fn read_rows(&self, worksheet: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(&sheet_range(worksheet), "");
        let request = self
            .authorize(self.http.get(url))
            .query(&[("majorDimension", "ROWS")]);
        let range: ValueRange = send(request).await?.json().await?;

        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    /// Appends one row after the last populated row of `worksheet`.
    pub async fn append_row(&self, worksheet: &str, cells: &[String]) -> Result<(), SheetsError> {
        self.ensure_writable()?;
        let url = self.values_url(&sheet_range(worksheet), ":append");
        let request = self
            .authorize(self.http.post(url))
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": [cells] }));
        send(request).await?;
        Ok(())
    }

    /// Overwrites spreadsheet row `sheet_row` (1-based) starting at column A.
    pub async fn update_row(
        &self,
        worksheet: &str,
        sheet_row: usize,
        cells: &[String],
    ) -> Result<(), SheetsError> {
        self.ensure_writable()?;
        let range = row_range(worksheet, sheet_row);
        let url = self.values_url(&range, "");
        let request = self
            .authorize(self.http.put(url))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [cells] }));
        send(request).await?;
        Ok(())
    }

    /// Removes spreadsheet row `sheet_row` (1-based), shifting later rows up.
    pub async fn delete_row(&self, worksheet: &str, sheet_row: usize) -> Result<(), SheetsError> {
        self.ensure_writable()?;
        let sheet_id = self.sheet_id(worksheet).await?;
        let url = format!("{}/{}:batchUpdate", API_BASE, self.spreadsheet_id);
        let request = self
            .authorize(self.http.post(url))
            .json(&delete_row_request(sheet_id, sheet_row)?);
        send(request).await?;
        Ok(())
    }

    /// Fetches the spreadsheet title; used as a connectivity probe.
    pub async fn title(&self) -> Result<String, SheetsError> {
        let url = format!("{}/{}", API_BASE, self.spreadsheet_id);
        let request = self
            .authorize(self.http.get(url))
            .query(&[("fields", "properties.title")]);
        let body: Value = send(request).await?.json().await?;
        Ok(body["properties"]["title"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn sheet_id(&self, worksheet: &str) -> Result<i64, SheetsError> {
        let url = format!("{}/{}", API_BASE, self.spreadsheet_id);
        let request = self
            .authorize(self.http.get(url))
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let meta: SpreadsheetMeta = send(request).await?.json().await?;

        meta.sheets
            .into_iter()
            .find(|s| s.properties.title == worksheet)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| SheetsError::WorksheetNotFound(worksheet.to_string()))
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            API_BASE,
            self.spreadsheet_id,
            urlencoding::encode(range),
            suffix
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            SheetsAuth::AccessToken(token) => request.bearer_auth(token),
            SheetsAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
        }
    }

    fn ensure_writable(&self) -> Result<(), SheetsError> {
        if self.can_write() {
            Ok(())
        } else {
            Err(SheetsError::ReadOnly)
        }
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, SheetsError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SheetsError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// A1 range covering a whole worksheet: `'Ders Planı'`.
pub fn sheet_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// A1 range anchored at column A of one row: `'Programlar'!A7`.
pub fn row_range(worksheet: &str, sheet_row: usize) -> String {
    format!("{}!A{}", sheet_range(worksheet), sheet_row)
}

fn delete_row_request(sheet_id: i64, sheet_row: usize) -> Result<Value, SheetsError> {
    let start = sheet_row
        .checked_sub(1)
        .ok_or(SheetsError::RowOutOfRange(sheet_row))?;
    Ok(json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": start,
                    "endIndex": sheet_row,
                }
            }
        }]
    }))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
