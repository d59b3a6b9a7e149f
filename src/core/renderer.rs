use crate::core::{ClassifiedItem, FeedItem, RenderedEntry, Tag};
use crate::utils::text::{format_rfc1123, parse_or_now};
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;

pub const PROFILE_BASE_URL: &str = "https://bsky.app/profile";
const EMPTY_TITLE: &str = "Bluesky post";
const DEFAULT_IMAGE_ALT: &str = "Bluesky image";
const MAX_TITLE_CHARS: usize = 90;
const TRUNCATED_TITLE_CHARS: usize = 87;
const ELLIPSIS: &str = "...";
const LINE_BREAK: &str = "<br/>";

/// 壓縮空白後作為標題，超過 90 字元截斷為 87 字元加 "..."
pub fn text_to_title(text: Option<&str>) -> String {
    let collapsed = text
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.is_empty() {
        return EMPTY_TITLE.to_string();
    }
    if collapsed.chars().count() <= MAX_TITLE_CHARS {
        return collapsed;
    }

    let mut truncated: String = collapsed.chars().take(TRUNCATED_TITLE_CHARS).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

pub fn title_with_tag_prefixes(text: Option<&str>, tags: &[Tag]) -> String {
    let base = text_to_title(text);
    let prefixes: Vec<String> = tags
        .iter()
        .filter(|tag| **tag != Tag::Post)
        .map(|tag| format!("[{}]", tag.label()))
        .collect();

    if prefixes.is_empty() {
        base
    } else {
        format!("{} {}", prefixes.join(" "), base)
    }
}

pub fn profile_url(handle: &str) -> String {
    format!("{}/{}", PROFILE_BASE_URL, handle)
}

/// 以 at:// URI 最後一段作為 record key 組出貼文網址
pub fn post_url_from_uri(uri: Option<&str>, handle: &str) -> String {
    let rkey = uri.unwrap_or_default().rsplit('/').next().unwrap_or_default();
    if rkey.is_empty() {
        profile_url(handle)
    } else {
        format!("{}/{}/post/{}", PROFILE_BASE_URL, handle, rkey)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub fn item_pub_date(item: &FeedItem, now: DateTime<Utc>) -> String {
    let raw = match item.repost() {
        Some(reason) => non_empty(&reason.indexed_at).or(non_empty(&item.post.indexed_at)),
        None => non_empty(&item.post.record.created_at).or(non_empty(&item.post.indexed_at)),
    };
    format_rfc1123(&parse_or_now(raw, now))
}

pub fn item_guid(item: &FeedItem, link: &str) -> String {
    match item.repost() {
        Some(reason) => {
            let by_did = reason
                .by
                .as_ref()
                .and_then(|by| by.did.as_deref())
                .unwrap_or("unknown");
            let reposted_at = reason.indexed_at.as_deref().unwrap_or("unknown");
            let post_uri = item.post.uri.as_deref().unwrap_or("unknown");
            format!("repost:{}:{}:{}", by_did, reposted_at, post_uri)
        }
        None => item
            .post
            .uri
            .clone()
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| link.to_string()),
    }
}

pub fn build_description(classified: &ClassifiedItem, post_url: &str) -> String {
    let item = &classified.item;
    let tags = &classified.tags;
    let mut lines = Vec::new();

    if tags.contains(&Tag::Reply) {
        lines.push("<strong>Reply</strong>".to_string());
    }
    if tags.contains(&Tag::Quote) {
        lines.push("<strong>Quote post</strong>".to_string());
    }
    if tags.contains(&Tag::Repost) {
        let by_handle = item
            .repost()
            .and_then(|reason| reason.by.as_ref())
            .and_then(|by| by.handle.as_deref())
            .filter(|handle| !handle.is_empty())
            .map(|handle| format!("@{}", escape(handle)))
            .unwrap_or_else(|| "this account".to_string());
        lines.push(format!("<strong>Repost</strong> by {}", by_handle));
    }

    let text = item.post.record.text.as_deref().unwrap_or_default();
    if !text.trim().is_empty() {
        lines.push(escape(text).replace('\n', LINE_BREAK));
    }

    if let Some(embed) = &item.post.embed {
        for image in embed.images() {
            let Some(src) = image.fullsize.as_deref().or(image.thumb.as_deref()) else {
                continue;
            };
            let alt = image
                .alt
                .as_deref()
                .filter(|alt| !alt.is_empty())
                .unwrap_or(DEFAULT_IMAGE_ALT);
            lines.push(format!(
                r#"<img src="{}" alt="{}" />"#,
                escape(src),
                escape(alt)
            ));
        }
    }

    lines.push(format!(
        r#"<a href="{}">View post on Bluesky</a>"#,
        escape(post_url)
    ));
    lines.join(LINE_BREAK)
}

/// 將分類後的動態轉為 RSS 項目；`fallback_handle` 用於作者 handle 缺漏時
pub fn render_entry(
    classified: &ClassifiedItem,
    fallback_handle: &str,
    now: DateTime<Utc>,
) -> RenderedEntry {
    let post = &classified.item.post;
    let handle = post
        .author
        .as_ref()
        .and_then(|author| author.handle.as_deref())
        .filter(|handle| !handle.is_empty())
        .unwrap_or(fallback_handle);

    let link = post_url_from_uri(post.uri.as_deref(), handle);
    let mut tags = classified.tags.clone();
    tags.dedup();

    RenderedEntry {
        title: title_with_tag_prefixes(post.record.text.as_deref(), &classified.tags),
        pub_date: item_pub_date(&classified.item, now),
        guid: item_guid(&classified.item, &link),
        description: build_description(classified, &link),
        link,
        tags,
    }
}
