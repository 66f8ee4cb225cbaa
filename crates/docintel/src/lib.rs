//! Document-analysis client
//!
//! Sends a binary document to a layout-analysis service, polls the
//! long-running operation, and flattens the extracted lines and tables
//! into Markdown for upload.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const API_VERSION: &str = "2024-11-30";

/// Errors from the analysis service
#[derive(Error, Debug)]
pub enum DocIntelError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, DocIntelError>;

/// Extracted layout of one document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Line {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub row_count: usize,
    pub column_count: usize,
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub row_index: usize,
    pub column_index: usize,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
}

/// Client for the layout-analysis REST API
pub struct DocIntelClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    poll_interval: Duration,
    max_checks: u32,
}

impl DocIntelClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(1),
            max_checks: 60,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run layout analysis on a file and wait for the result
    pub async fn analyze(&self, path: &Path) -> Result<AnalyzeResult> {
        let bytes = tokio::fs::read(path).await?;
        debug!("◆ submitting {} bytes for layout analysis", bytes.len());

        let url = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout:analyze?api-version={}",
            self.endpoint, API_VERSION
        );
        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(DocIntelError::Api(format!("{}: {}", status, text)));
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| DocIntelError::Api("missing operation-location header".to_string()))?;

        self.wait_for_result(&operation_url).await
    }

    async fn wait_for_result(&self, operation_url: &str) -> Result<AnalyzeResult> {
        for _ in 0..self.max_checks {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await?;
            let text = response.text().await?;
            let operation: OperationStatus = serde_json::from_str(&text)?;

            match operation.status.as_str() {
                "succeeded" => {
                    debug!("◆ layout analysis finished");
                    return operation
                        .analyze_result
                        .ok_or_else(|| DocIntelError::Api("result missing on success".to_string()));
                }
                "failed" => {
                    return Err(DocIntelError::Api("layout analysis failed".to_string()));
                }
                other => debug!("◆ layout analysis {}", other),
            }
        }
        Err(DocIntelError::Api("layout analysis timed out".to_string()))
    }
}

/// Flatten an analysis result into Markdown: page lines verbatim, then each
/// table as pipe-delimited rows with a separator under the header row
pub fn to_markdown(result: &AnalyzeResult) -> String {
    let mut out = String::new();

    for page in &result.pages {
        for line in &page.lines {
            out.push_str(&line.content);
            out.push('\n');
        }
    }

    for table in &result.tables {
        out.push_str(&table_to_markdown(table));
    }

    out
}

fn table_to_markdown(table: &Table) -> String {
    if table.row_count == 0 || table.column_count == 0 {
        return String::new();
    }

    let mut grid = vec![vec![String::new(); table.column_count]; table.row_count];
    for cell in &table.cells {
        if let Some(slot) = grid
            .get_mut(cell.row_index)
            .and_then(|row| row.get_mut(cell.column_index))
        {
            *slot = cell.content.clone();
        }
    }

    let mut out = String::new();

    out.push('|');
    for cell in &grid[0] {
        out.push_str(&format!(" {} |", cell));
    }
    out.push('\n');

    out.push('|');
    for _ in 0..table.column_count {
        out.push_str(" --- |");
    }
    out.push('\n');

    for row in grid.iter().skip(1) {
        out.push('|');
        for cell in row {
            out.push_str(&format!(" {} |", cell));
        }
        out.push('\n');
    }

    out.push('\n');
    out
}
