use crate::core::{ClassifiedItem, FeedItem, Tag};

/// 轉貼只標 `Repost`；其餘依回覆與引用標記，兩者皆無則為 `Post`
pub fn classify_tags(item: &FeedItem) -> Vec<Tag> {
    if item.is_repost() {
        return vec![Tag::Repost];
    }

    let mut tags = Vec::with_capacity(2);
    if item.post.record.has_reply() {
        tags.push(Tag::Reply);
    }
    if item.post.embed.as_ref().is_some_and(|e| e.quotes_record()) {
        tags.push(Tag::Quote);
    }
    if tags.is_empty() {
        tags.push(Tag::Post);
    }
    tags
}

pub fn classify(item: FeedItem) -> ClassifiedItem {
    let tags = classify_tags(&item);
    ClassifiedItem { item, tags }
}
