//! JSON-lines tabular writer
//!
//! One [`TabularRow`](crate::models::TabularRow) per line under
//! `<data_dir>/<subfolder>/<name>.jsonl`. Each write replaces the file, so the
//! file always holds the latest run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{to_rows, ArticleSink, SinkReceipt};
use crate::error::{Error, Result};
use crate::models::CleanArticle;

pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(data_dir: &Path, subfolder: &str, name: &str) -> Self {
        Self {
            path: data_dir.join(subfolder).join(format!("{name}.jsonl")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ArticleSink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn write(&self, articles: &[CleanArticle]) -> Result<SinkReceipt> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                Error::storage(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }

        let rows = to_rows(articles);
        let mut buf = String::new();
        for row in &rows {
            buf.push_str(&serde_json::to_string(row)?);
            buf.push('\n');
        }
        tokio::fs::write(&self.path, buf).await?;

        info!(path = %self.path.display(), rows = rows.len(), "Rows written");
        Ok(SinkReceipt {
            sink: self.name(),
            location: self.path.display().to_string(),
            rows: rows.len(),
        })
    }
}
