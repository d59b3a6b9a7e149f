use crate::core::classifier::classify;
use crate::core::fetcher::{collect_feed_items, FetchOptions};
use crate::core::renderer::render_entry;
use crate::core::serializer::{build_document, render_rss_xml, ChannelOptions};
use crate::core::{
    ConfigProvider, FeedSnapshot, FeedSource, Pipeline, RunSummary, Storage, TransformResult,
};
use crate::utils::error::Result;
use chrono::Utc;

/// Bluesky 作者動態 → RSS 檔案
pub struct FeedPipeline<S: Storage, C: ConfigProvider, F: FeedSource> {
    storage: S,
    config: C,
    source: F,
}

impl<S: Storage, C: ConfigProvider, F: FeedSource> FeedPipeline<S, C, F> {
    pub fn new(storage: S, config: C, source: F) -> Self {
        Self {
            storage,
            config,
            source,
        }
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            limit: self.config.limit(),
            include_replies: self.config.include_replies(),
            include_reposts: self.config.include_reposts(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, F: FeedSource> Pipeline for FeedPipeline<S, C, F> {
    async fn extract(&self) -> Result<FeedSnapshot> {
        let actor = self.source.resolve_actor(self.config.handle()).await?;
        tracing::debug!("Actor identifier: {}", actor);

        let profile = self.source.fetch_profile(&actor).await?;
        let items = collect_feed_items(&self.source, &actor, &self.fetch_options()).await?;

        Ok(FeedSnapshot {
            actor,
            profile,
            items,
        })
    }

    async fn transform(&self, snapshot: FeedSnapshot) -> Result<TransformResult> {
        let now = Utc::now();
        let handle = snapshot
            .profile
            .handle
            .clone()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.config.handle().to_string());

        let entries = snapshot
            .items
            .into_iter()
            .map(classify)
            .map(|classified| {
                tracing::debug!("Classified {:?} as {:?}", classified.item.post.uri, classified.tags);
                render_entry(&classified, &handle, now)
            })
            .collect();

        let options = ChannelOptions {
            handle: self.config.handle(),
            out_path: self.config.output_path(),
            site_url: self.config.site_url(),
        };
        let document = build_document(&snapshot.profile, entries, &options, now);
        let xml_output = render_rss_xml(&document)?;

        Ok(TransformResult {
            document,
            xml_output,
            handle,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<RunSummary> {
        let output_path = self.config.output_path().to_string();

        tracing::debug!(
            "Writing RSS document ({} bytes) to {}",
            result.xml_output.len(),
            output_path
        );
        self.storage
            .write_file(&output_path, result.xml_output.as_bytes())
            .await?;

        Ok(RunSummary {
            output_path,
            item_count: result.document.entries.len(),
            handle: result.handle,
        })
    }
}
