//! Client for the listing import API.
//!
//! Uploaded spreadsheets are re-sent as multipart to
//! `<base>/v1/import/<kind>` with the shared `X-HRTAJ-IMPORT-KEY` header.
//! The upstream status and JSON body are returned unchanged.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::ImportConfig;

const IMPORT_KEY_HEADER: &str = "X-HRTAJ-IMPORT-KEY";

/// Errors from the import proxy.
#[derive(Debug, Error)]
pub enum ImportError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with something other than JSON.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Which import pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Resale,
    Projects,
}

impl ImportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resale => "resale",
            Self::Projects => "projects",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resale" => Ok(Self::Resale),
            "projects" => Ok(Self::Projects),
            _ => Err(()),
        }
    }
}

/// One field of the uploaded form.
#[derive(Debug, Clone)]
pub struct ImportPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Upstream answer.
#[derive(Debug, Clone)]
pub struct ImportResponse {
    pub status: u16,
    pub body: Value,
}

impl ImportResponse {
    /// Row counters reported by the import API, for the activity log.
    #[must_use]
    pub fn summary(&self) -> Value {
        let data = self.body.get("data");
        let counter = |key: &str| data.and_then(|d| d.get(key)).cloned().unwrap_or(Value::Null);
        serde_json::json!({
            "rows_total": counter("rows_total"),
            "rows_inserted": counter("rows_inserted"),
            "rows_updated": counter("rows_updated"),
            "rows_failed": counter("rows_failed"),
        })
    }
}

/// Import API client.
#[derive(Clone)]
pub struct ImportClient {
    client: reqwest::Client,
    config: ImportConfig,
}

impl ImportClient {
    /// Create a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: ImportConfig) -> Result<Self, ImportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { client, config })
    }

    /// Forward an upload to the import pipeline for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Http` if the request fails and
    /// `ImportError::InvalidResponse` if the answer is not JSON.
    #[instrument(skip(self, parts), fields(parts = parts.len()))]
    pub async fn forward(
        &self,
        kind: ImportKind,
        parts: Vec<ImportPart>,
    ) -> Result<ImportResponse, ImportError> {
        let mut form = Form::new().text("type", kind.as_str());
        for part in parts {
            let mut body = Part::bytes(part.data);
            if let Some(file_name) = part.file_name {
                body = body.file_name(file_name);
            }
            if let Some(content_type) = part.content_type {
                body = body.mime_str(&content_type)?;
            }
            form = form.part(part.name, body);
        }

        let response = self
            .client
            .post(self.config.endpoint(kind.as_str()))
            .header(IMPORT_KEY_HEADER, self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ImportError::InvalidResponse(e.to_string()))?;
        debug!(status, "Import API responded");

        Ok(ImportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_kind_parse() {
        assert_eq!("resale".parse::<ImportKind>(), Ok(ImportKind::Resale));
        assert_eq!("projects".parse::<ImportKind>(), Ok(ImportKind::Projects));
        assert!("Resale".parse::<ImportKind>().is_err());
        assert!("".parse::<ImportKind>().is_err());
    }

    #[test]
    fn test_summary_reads_counters() {
        let response = ImportResponse {
            status: 200,
            body: serde_json::json!({
                "ok": true,
                "data": { "rows_total": 10, "rows_inserted": 7, "rows_updated": 2 }
            }),
        };
        let summary = response.summary();
        assert_eq!(summary["rows_total"], 10);
        assert_eq!(summary["rows_inserted"], 7);
        assert_eq!(summary["rows_updated"], 2);
        assert!(summary["rows_failed"].is_null());
    }

    #[test]
    fn test_summary_without_data() {
        let response = ImportResponse {
            status: 502,
            body: serde_json::json!({ "detail": "bad" }),
        };
        assert!(response.summary()["rows_total"].is_null());
    }
}
