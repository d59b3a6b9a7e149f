use crate::core::{Pipeline, RunSummary};
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// 依序執行 extract → transform → load；任何階段失敗即中止，不寫出檔案
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("🚀 Starting feed conversion");

        // Extract
        let snapshot = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Fetched {} feed item(s) for {}",
            snapshot.items.len(),
            snapshot.actor
        );

        // Transform
        let result = self.pipeline.transform(snapshot).await?;
        tracing::info!(
            "🔄 Rendered {} RSS item(s) for @{}",
            result.document.entries.len(),
            result.handle
        );

        // Load
        let summary = self.pipeline.load(result).await?;
        tracing::info!(
            "📁 Output saved to: {} ({:?})",
            summary.output_path,
            started.elapsed()
        );

        Ok(summary)
    }
}
