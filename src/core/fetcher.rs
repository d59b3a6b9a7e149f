use crate::core::{FeedItem, FeedPage, FeedSource, Profile};
use crate::domain::model::ResolvedHandle;
use crate::utils::error::{Result, RssError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://public.api.bsky.app/xrpc";
pub const DEFAULT_USER_AGENT: &str = "bsky-rss/0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 最多讀取的頁數
pub const MAX_PAGE_FETCHES: usize = 5;
const MIN_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 100;

/// Bluesky 公開 AppView 的唯讀客戶端
pub struct BskyClient {
    client: Client,
    api_base: String,
}

impl BskyClient {
    pub fn new(api_base: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, Option<String>)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.api_base, endpoint);
        let query: Vec<(&str, String)> = params
            .iter()
            .filter_map(|(key, value)| match value {
                Some(v) if !v.is_empty() => Some((*key, v.clone())),
                _ => None,
            })
            .collect();

        tracing::debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RssError::FetchError {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl FeedSource for BskyClient {
    async fn resolve_actor(&self, handle_or_did: &str) -> Result<String> {
        if handle_or_did.starts_with("did:") {
            return Ok(handle_or_did.to_string());
        }

        let resolved: ResolvedHandle = self
            .fetch_json(
                "com.atproto.identity.resolveHandle",
                &[("handle", Some(handle_or_did.to_string()))],
            )
            .await?;
        tracing::debug!("Resolved @{} to {}", handle_or_did, resolved.did);
        Ok(resolved.did)
    }

    async fn fetch_profile(&self, actor: &str) -> Result<Profile> {
        self.fetch_json("app.bsky.actor.getProfile", &[("actor", Some(actor.to_string()))])
            .await
    }

    async fn fetch_author_feed(
        &self,
        actor: &str,
        filter: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<FeedPage> {
        self.fetch_json(
            "app.bsky.feed.getAuthorFeed",
            &[
                ("actor", Some(actor.to_string())),
                ("filter", Some(filter.to_string())),
                ("limit", Some(limit.to_string())),
                ("cursor", cursor.map(str::to_string)),
            ],
        )
        .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub limit: usize,
    pub include_replies: bool,
    pub include_reposts: bool,
}

impl FetchOptions {
    pub fn page_size(&self) -> usize {
        self.limit.saturating_mul(2).clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    pub fn filter(&self) -> &'static str {
        if self.include_replies {
            "posts_with_replies"
        } else {
            "posts_no_replies"
        }
    }
}

/// 依 cursor 分頁收集動態，直到數量足夠、沒有下一頁，或達到頁數上限
pub async fn collect_feed_items<S: FeedSource + ?Sized>(
    source: &S,
    actor: &str,
    options: &FetchOptions,
) -> Result<Vec<FeedItem>> {
    let mut collected =
        Vec::with_capacity(options.limit.min(MAX_PAGE_SIZE * MAX_PAGE_FETCHES));
    let mut cursor: Option<String> = None;
    let mut attempts = 0;
    let page_size = options.page_size();

    while collected.len() < options.limit && attempts < MAX_PAGE_FETCHES {
        attempts += 1;
        let page = source
            .fetch_author_feed(actor, options.filter(), page_size, cursor.as_deref())
            .await?;
        tracing::debug!(
            "Page {} returned {} item(s), cursor: {:?}",
            attempts,
            page.feed.len(),
            page.cursor
        );

        for item in page.feed {
            if !options.include_reposts && item.is_repost() {
                continue;
            }
            collected.push(item);
            if collected.len() >= options.limit {
                break;
            }
        }

        match page.cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    if collected.len() < options.limit && attempts >= MAX_PAGE_FETCHES {
        tracing::warn!(
            "Stopped after {} page fetches with {} of {} item(s)",
            attempts,
            collected.len(),
            options.limit
        );
    }

    collected.truncate(options.limit);
    Ok(collected)
}
