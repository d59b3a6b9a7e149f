use crate::domain::model::{FeedPage, FeedSnapshot, Profile, RunSummary, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn handle(&self) -> &str;
    fn output_path(&self) -> &str;
    fn limit(&self) -> usize;
    fn include_replies(&self) -> bool;
    fn include_reposts(&self) -> bool;
    fn site_url(&self) -> &str;
}

/// 遠端讀取 API：解析 handle、取得個人資料、分頁讀取作者動態
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn resolve_actor(&self, handle_or_did: &str) -> Result<String>;
    async fn fetch_profile(&self, actor: &str) -> Result<Profile>;
    async fn fetch_author_feed(
        &self,
        actor: &str,
        filter: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<FeedPage>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<FeedSnapshot>;
    async fn transform(&self, snapshot: FeedSnapshot) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<RunSummary>;
}
