//! Store backed by a hosted PostgREST endpoint (Supabase-style `/rest/v1`)

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{validate_identifier, Filter, Query, Row, Store, StoreError, StoreResult};

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl PostgrestStore {
    /// Create a client authenticated with the service key
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> StoreResult<String> {
        Ok(format!("{}/rest/v1/{}", self.base_url, validate_identifier(table)?))
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Vec<Row>> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        parse_rows(&body)
    }
}

#[async_trait]
impl Store for PostgrestStore {
    fn backend(&self) -> &'static str {
        "postgrest"
    }

    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>> {
        if matches_nothing(query) {
            return Ok(Vec::new());
        }

        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter_params(&query.filters)?);

        let request = self.client.get(self.table_url(&query.table)?).query(&params);
        self.send(request).await
    }

    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row> {
        let request = self
            .client
            .post(self.table_url(table)?)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&row);

        self.send(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed("insert returned no rows".to_string()))
    }

    async fn update(&self, query: &Query, changes: Row) -> StoreResult<u64> {
        if changes.is_empty() {
            return Err(StoreError::Rejected("no columns to update".to_string()));
        }
        if matches_nothing(query) {
            return Ok(0);
        }

        let request = self
            .client
            .patch(self.table_url(&query.table)?)
            .query(&filter_params(&query.filters)?)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&changes);

        Ok(self.send(request).await?.len() as u64)
    }

    async fn delete(&self, query: &Query) -> StoreResult<u64> {
        if matches_nothing(query) {
            return Ok(0);
        }

        let request = self
            .client
            .delete(self.table_url(&query.table)?)
            .query(&filter_params(&query.filters)?)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1);

        Ok(self.send(request).await?.len() as u64)
    }

    async fn health_check(&self) -> bool {
        match self.client.get(format!("{}/rest/v1/", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::error!("PostgREST health check failed: {}", e);
                false
            }
        }
    }
}

/// An empty `In` filter can never match, so the request is skipped
fn matches_nothing(query: &Query) -> bool {
    query
        .filters
        .iter()
        .any(|f| matches!(f, Filter::In(_, values) if values.is_empty()))
}

/// Translate filters into PostgREST query parameters
fn filter_params(filters: &[Filter]) -> StoreResult<Vec<(String, String)>> {
    filters
        .iter()
        .map(|filter| {
            let column = validate_identifier(filter.column())?.to_string();
            let operand = match filter {
                Filter::Eq(_, Value::Null) => "is.null".to_string(),
                Filter::Eq(_, value) => format!("eq.{}", scalar(value)),
                Filter::ILike(_, needle) => format!("ilike.*{}*", needle),
                Filter::In(_, values) => {
                    let items: Vec<String> = values.iter().map(list_item).collect();
                    format!("in.({})", items.join(","))
                }
            };
            Ok((column, operand))
        })
        .collect()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strings inside `in.(...)` are double-quoted so commas and parens survive
fn list_item(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

fn parse_rows(body: &str) -> StoreResult<Vec<Row>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| StoreError::Malformed(e.to_string()))?;

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Malformed(format!("expected a row object, got {}", other))),
            })
            .collect(),
        other => Err(StoreError::Malformed(format!("expected a row array, got {}", other))),
    }
}

fn error_from_body(status: StatusCode, body: &str) -> StoreError {
    match serde_json::from_str::<PostgrestErrorBody>(body) {
        Ok(err) => {
            let mut message = err.message.unwrap_or_else(|| status.to_string());
            if let Some(details) = err.details {
                message = format!("{} ({})", message, details);
            }
            match err.code {
                Some(code) => StoreError::from_sqlstate(&code, message),
                None => StoreError::Rejected(message),
            }
        }
        Err(_) if status.is_server_error() => StoreError::Request(format!("{}: {}", status, body)),
        Err(_) => StoreError::Rejected(format!("{}: {}", status, body)),
    }
}
