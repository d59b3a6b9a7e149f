use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `app.bsky.feed.getAuthorFeed` 的單筆資料
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub post: Post,
    #[serde(default, deserialize_with = "lenient_reason")]
    pub reason: Option<Reason>,
}

impl FeedItem {
    pub fn repost(&self) -> Option<&RepostReason> {
        match &self.reason {
            Some(Reason::Repost(reason)) => Some(reason),
            _ => None,
        }
    }

    pub fn is_repost(&self) -> bool {
        self.repost().is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "lenient_field")]
    pub author: Option<Author>,
    #[serde(default)]
    pub record: PostRecord,
    #[serde(default, deserialize_with = "lenient_embed")]
    pub embed: Option<Embed>,
    pub indexed_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub did: Option<String>,
    pub handle: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub text: Option<String>,
    pub created_at: Option<String>,
    pub reply: Option<Value>,
}

impl PostRecord {
    /// 有非空的 reply 參照才算回覆
    pub fn has_reply(&self) -> bool {
        match &self.reply {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }
}

/// 已知的 embed 種類；無法辨識或格式錯誤的一律視為 `Unknown`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "$type")]
pub enum Embed {
    #[serde(rename = "app.bsky.embed.images#view")]
    Images {
        #[serde(default)]
        images: Vec<ImageView>,
    },
    #[serde(rename = "app.bsky.embed.record#view")]
    Record { record: Option<Value> },
    #[serde(rename = "app.bsky.embed.recordWithMedia#view")]
    RecordWithMedia {
        record: Option<Value>,
        #[serde(default, deserialize_with = "lenient_boxed_embed")]
        media: Option<Box<Embed>>,
    },
    #[serde(other)]
    Unknown,
}

impl Embed {
    pub fn quotes_record(&self) -> bool {
        match self {
            Embed::Record { record } | Embed::RecordWithMedia { record, .. } => {
                record.as_ref().is_some_and(|r| !r.is_null())
            }
            _ => false,
        }
    }

    /// 直接附圖，或 recordWithMedia 內的附圖
    pub fn images(&self) -> &[ImageView] {
        match self {
            Embed::Images { images } => images.as_slice(),
            Embed::RecordWithMedia {
                media: Some(media), ..
            } => match media.as_ref() {
                Embed::Images { images } => images.as_slice(),
                _ => &[],
            },
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageView {
    pub fullsize: Option<String>,
    pub thumb: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "$type")]
pub enum Reason {
    #[serde(rename = "app.bsky.feed.defs#reasonRepost")]
    Repost(RepostReason),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepostReason {
    #[serde(default, deserialize_with = "lenient_field")]
    pub by: Option<Author>,
    #[serde(default, deserialize_with = "lenient_field")]
    pub indexed_at: Option<String>,
}

fn lenient_embed<'de, D>(deserializer: D) -> std::result::Result<Option<Embed>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(decode_embed))
}

fn lenient_boxed_embed<'de, D>(deserializer: D) -> std::result::Result<Option<Box<Embed>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_embed(deserializer)?.map(Box::new))
}

fn decode_embed(value: Value) -> Embed {
    match serde_json::from_value::<Embed>(value) {
        Ok(embed) => embed,
        Err(e) => {
            tracing::debug!("Unrecognized embed shape ({}), treating as unknown", e);
            Embed::Unknown
        }
    }
}

/// 欄位格式不符時當作缺漏
fn lenient_field<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_reason<'de, D>(deserializer: D) -> std::result::Result<Option<Reason>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| serde_json::from_value::<Reason>(v).unwrap_or(Reason::Other)))
}

/// `getAuthorFeed` 的一頁
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub feed: Vec<FeedItem>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub did: Option<String>,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedHandle {
    pub did: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Post,
    Reply,
    Quote,
    Repost,
}

impl Tag {
    pub fn label(&self) -> &'static str {
        match self {
            Tag::Post => "Post",
            Tag::Reply => "Reply",
            Tag::Quote => "Quote",
            Tag::Repost => "Repost",
        }
    }

    pub fn category(&self) -> String {
        self.label().to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedItem {
    pub item: FeedItem,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEntry {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    pub guid: String,
    /// 已跳脫的 HTML 片段，序列化時原樣輸出
    pub description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RssDocument {
    pub title: String,
    pub link: String,
    pub description: String,
    pub last_build_date: String,
    pub self_link: Option<String>,
    pub entries: Vec<RenderedEntry>,
}

/// extract 階段的輸出
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub actor: String,
    pub profile: Profile,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub document: RssDocument,
    pub xml_output: String,
    pub handle: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_path: String,
    pub item_count: usize,
    pub handle: String,
}
