//! Google Sheets v4 REST adapter for [`DocumentClient`].

use crate::config::ApiConfig;
use crate::document::{
    DocumentClient, SheetProperties, SheetReply, SheetRequest, ValueRange, ValueWrite,
};
use crate::error::{Result, SheetError};
use crate::range::ColumnRange;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub struct SheetsApiClient {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

impl SheetsApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, doc_id: &str, suffix: &str) -> String {
        format!("{}/spreadsheets/{doc_id}{suffix}", self.base_url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SheetError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        })
    }
}

/// Pull `error.message` out of a Google error envelope, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Inner,
    }
    #[derive(Deserialize)]
    struct Inner {
        message: String,
    }
    match serde_json::from_str::<Envelope>(body) {
        Ok(env) => env.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<WireValueRange>,
}

#[derive(Deserialize)]
struct WireValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn request_json(request: &SheetRequest) -> Value {
    match request {
        SheetRequest::Delete { sheet_id } => json!({ "deleteSheet": { "sheetId": sheet_id } }),
        SheetRequest::Duplicate {
            source_sheet_id,
            insert_index,
            new_title,
        } => json!({
            "duplicateSheet": {
                "sourceSheetId": source_sheet_id,
                "insertSheetIndex": insert_index,
                "newSheetName": new_title,
            }
        }),
        SheetRequest::Rename { sheet_id, title } => json!({
            "updateSheetProperties": {
                "properties": { "sheetId": sheet_id, "title": title },
                "fields": "title",
            }
        }),
    }
}

fn reply_from_json(request: &SheetRequest, reply: Option<&Value>) -> Result<SheetReply> {
    match request {
        SheetRequest::Duplicate { new_title, .. } => {
            let props = reply
                .and_then(|r| r.pointer("/duplicateSheet/properties"))
                .ok_or_else(|| {
                    SheetError::UnexpectedResponse(format!(
                        "no duplicateSheet reply for '{new_title}'"
                    ))
                })?;
            Ok(SheetReply::Duplicated(serde_json::from_value(props.clone())?))
        }
        _ => Ok(SheetReply::Empty),
    }
}

fn write_json(write: &ValueWrite) -> Value {
    let values: Vec<Value> = write
        .values
        .iter()
        .map(|v| match v {
            Some(n) => json!([n]),
            None => json!([]),
        })
        .collect();
    json!({ "range": write.range.to_a1(), "values": values })
}

// ---------------------------------------------------------------------------
// DocumentClient
// ---------------------------------------------------------------------------

impl DocumentClient for SheetsApiClient {
    fn list_sheets(&self, doc_id: &str) -> Result<Vec<SheetProperties>> {
        debug!(doc_id, "GET sheet properties");
        let response = self.send(
            self.http
                .get(self.url(doc_id, ""))
                .query(&[("fields", "sheets.properties")]),
        )?;
        let body: SpreadsheetResponse = response.json()?;
        Ok(body.sheets.into_iter().map(|s| s.properties).collect())
    }

    fn batch_get_values(&self, doc_id: &str, ranges: &[ColumnRange]) -> Result<Vec<ValueRange>> {
        debug!(doc_id, ranges = ranges.len(), "GET values:batchGet");
        let mut query: Vec<(&str, String)> =
            ranges.iter().map(|r| ("ranges", r.to_a1())).collect();
        query.push(("majorDimension", "ROWS".to_string()));
        let response = self.send(
            self.http
                .get(self.url(doc_id, "/values:batchGet"))
                .query(&query),
        )?;
        let body: BatchGetResponse = response.json()?;
        if body.value_ranges.len() != ranges.len() {
            return Err(SheetError::UnexpectedResponse(format!(
                "asked for {} ranges, got {}",
                ranges.len(),
                body.value_ranges.len()
            )));
        }
        Ok(body
            .value_ranges
            .into_iter()
            .map(|vr| {
                let rows = vr
                    .values
                    .iter()
                    .map(|row| row.iter().map(cell_text).collect())
                    .collect();
                ValueRange::new(rows)
            })
            .collect())
    }

    fn batch_update(&self, doc_id: &str, requests: &[SheetRequest]) -> Result<Vec<SheetReply>> {
        debug!(doc_id, requests = requests.len(), "POST batchUpdate");
        let payload = json!({ "requests": requests.iter().map(request_json).collect::<Vec<_>>() });
        let response = self.send(self.http.post(self.url(doc_id, ":batchUpdate")).json(&payload))?;
        let body: BatchUpdateResponse = response.json()?;
        requests
            .iter()
            .enumerate()
            .map(|(i, req)| reply_from_json(req, body.replies.get(i)))
            .collect()
    }

    fn batch_write_values(&self, doc_id: &str, writes: &[ValueWrite]) -> Result<()> {
        debug!(doc_id, writes = writes.len(), "POST values:batchUpdate");
        let payload = json!({
            "valueInputOption": "USER_ENTERED",
            "data": writes.iter().map(write_json).collect::<Vec<_>>(),
        });
        self.send(
            self.http
                .post(self.url(doc_id, "/values:batchUpdate"))
                .json(&payload),
        )?;
        Ok(())
    }
}
