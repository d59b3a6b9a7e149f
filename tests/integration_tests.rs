use bsky_rss::{BskyClient, EtlEngine, FeedConfig, FeedPipeline, LocalStorage, RssError};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn config_for(server: &MockServer) -> FeedConfig {
    FeedConfig {
        limit: 1,
        api_base: server.url("/xrpc"),
        timeout_secs: 5,
        ..FeedConfig::default()
    }
}

fn engine_for(
    config: FeedConfig,
    output_dir: &TempDir,
) -> EtlEngine<FeedPipeline<LocalStorage, FeedConfig, BskyClient>> {
    let client = BskyClient::new(&config.api_base, &config.user_agent, Duration::from_secs(5))
        .expect("client");
    let storage = LocalStorage::new(output_dir.path());
    EtlEngine::new(FeedPipeline::new(storage, config, client))
}

fn mock_identity(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/com.atproto.identity.resolveHandle")
            .query_param("handle", "oblachek.eu");
        then.status(200).json_body(json!({"did": "did:plc:abc"}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/app.bsky.actor.getProfile")
            .query_param("actor", "did:plc:abc");
        then.status(200).json_body(json!({
            "did": "did:plc:abc",
            "handle": "oblachek.eu",
            "displayName": "Oblachek",
            "description": "Clouds & <code>"
        }));
    });
}

#[tokio::test]
async fn test_end_to_end_single_post() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_identity(&server);

    let feed_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/app.bsky.feed.getAuthorFeed")
            .query_param("actor", "did:plc:abc")
            .query_param("filter", "posts_no_replies")
            .query_param("limit", "50");
        then.status(200).json_body(json!({
            "feed": [
                {"post": {
                    "uri": "at://did:plc:abc/app.bsky.feed.post/xyz",
                    "author": {"did": "did:plc:abc", "handle": "oblachek.eu"},
                    "record": {"text": "Hello <world>", "createdAt": "2025-10-14T10:00:00.000Z"},
                    "indexedAt": "2025-10-14T10:00:01.000Z"
                }},
                {"post": {
                    "uri": "at://did:plc:abc/app.bsky.feed.post/older",
                    "record": {"text": "older"}
                }}
            ],
            "cursor": "next"
        }));
    });

    let summary = assert_ok!(engine_for(config_for(&server), &temp_dir).run().await);
    feed_mock.assert();

    assert_eq!(summary.item_count, 1);
    assert_eq!(summary.handle, "oblachek.eu");
    assert_eq!(summary.output_path, "rss/bluesky.xml");

    let xml = std::fs::read_to_string(temp_dir.path().join("rss/bluesky.xml")).unwrap();
    assert_eq!(xml.matches("<item>").count(), 1);
    assert!(xml.contains("<title>Hello &lt;world&gt;</title>"));
    assert!(xml.contains("<link>https://bsky.app/profile/oblachek.eu/post/xyz</link>"));
    assert_eq!(xml.matches("<category>").count(), 1);
    assert!(xml.contains("<category>post</category>"));
    assert!(xml.contains("<pubDate>Tue, 14 Oct 2025 10:00:00 GMT</pubDate>"));
    assert!(xml.contains("<title>Oblachek on Bluesky</title>"));
    assert!(xml.contains("<description>Clouds &amp; &lt;code&gt;</description>"));
    assert!(!xml.contains("atom:link href"));
}

#[tokio::test]
async fn test_self_link_with_site_url() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_identity(&server);
    server.mock(|when, then| {
        when.method(GET).path("/xrpc/app.bsky.feed.getAuthorFeed");
        then.status(200).json_body(json!({"feed": []}));
    });

    let config = FeedConfig {
        site_url: "https://example.com".to_string(),
        ..config_for(&server)
    };
    let summary = assert_ok!(engine_for(config, &temp_dir).run().await);
    assert_eq!(summary.item_count, 0);

    let xml = std::fs::read_to_string(temp_dir.path().join("rss/bluesky.xml")).unwrap();
    assert!(xml.contains(
        "<atom:link href=\"https://example.com/rss/bluesky.xml\" rel=\"self\" type=\"application/rss+xml\"/>"
    ));
}

#[tokio::test]
async fn test_pagination_stops_after_five_pages() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_identity(&server);

    let feed_mock = server.mock(|when, then| {
        when.method(GET).path("/xrpc/app.bsky.feed.getAuthorFeed");
        then.status(200).json_body(json!({
            "feed": [
                {
                    "post": {"uri": "at://did:plc:other/app.bsky.feed.post/1", "record": {"text": "r"}},
                    "reason": {"$type": "app.bsky.feed.defs#reasonRepost", "by": {"did": "did:plc:abc"}}
                },
                {"post": {"uri": "at://did:plc:abc/app.bsky.feed.post/2", "record": {"text": "p"}}}
            ],
            "cursor": "always-more"
        }));
    });

    let config = FeedConfig {
        limit: 30,
        ..config_for(&server)
    };
    let summary = assert_ok!(engine_for(config, &temp_dir).run().await);

    feed_mock.assert_hits(5);
    assert_eq!(summary.item_count, 5);
}

#[tokio::test]
async fn test_reposts_and_replies_when_included() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_identity(&server);

    let feed_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/app.bsky.feed.getAuthorFeed")
            .query_param("filter", "posts_with_replies");
        then.status(200).json_body(json!({
            "feed": [
                {
                    "post": {
                        "uri": "at://did:plc:other/app.bsky.feed.post/r1",
                        "author": {"handle": "other.bsky.social"},
                        "record": {"text": "shared", "reply": {"parent": {"uri": "at://p"}}}
                    },
                    "reason": {
                        "$type": "app.bsky.feed.defs#reasonRepost",
                        "by": {"did": "did:plc:abc", "handle": "oblachek.eu"},
                        "indexedAt": "2025-10-14T10:00:00Z"
                    }
                },
                {
                    "post": {
                        "uri": "at://did:plc:abc/app.bsky.feed.post/q1",
                        "record": {"text": "answer", "reply": {"parent": {"uri": "at://p"}}},
                        "embed": {"$type": "app.bsky.embed.record#view", "record": {"uri": "at://q"}}
                    }
                }
            ]
        }));
    });

    let config = FeedConfig {
        limit: 10,
        include_replies: true,
        include_reposts: true,
        ..config_for(&server)
    };
    let summary = assert_ok!(engine_for(config, &temp_dir).run().await);
    feed_mock.assert();
    assert_eq!(summary.item_count, 2);

    let xml = std::fs::read_to_string(temp_dir.path().join("rss/bluesky.xml")).unwrap();
    assert!(xml.contains("<title>[Repost] shared</title>"));
    assert!(xml.contains(
        "<guid isPermaLink=\"false\">repost:did:plc:abc:2025-10-14T10:00:00Z:at://did:plc:other/app.bsky.feed.post/r1</guid>"
    ));
    assert!(xml.contains("<link>https://bsky.app/profile/other.bsky.social/post/r1</link>"));
    assert!(xml.contains("<strong>Repost</strong> by @oblachek.eu"));
    assert!(xml.contains("<title>[Reply] [Quote] answer</title>"));
    assert!(xml.contains("<category>reply</category>\n      <category>quote</category>"));

    let repost_pos = xml.find("[Repost] shared").unwrap();
    let reply_pos = xml.find("[Reply] [Quote] answer").unwrap();
    assert!(repost_pos < reply_pos);
}

#[tokio::test]
async fn test_resolve_failure_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let resolve_mock = server.mock(|when, then| {
        when.method(GET).path("/xrpc/com.atproto.identity.resolveHandle");
        then.status(400)
            .json_body(json!({"error": "InvalidRequest", "message": "Unable to resolve handle"}));
    });
    let feed_mock = server.mock(|when, then| {
        when.method(GET).path("/xrpc/app.bsky.feed.getAuthorFeed");
        then.status(200).json_body(json!({"feed": []}));
    });

    let err = assert_err!(engine_for(config_for(&server), &temp_dir).run().await);

    resolve_mock.assert();
    feed_mock.assert_hits(0);
    match err {
        RssError::FetchError { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("Unable to resolve handle"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!temp_dir.path().join("rss").exists());
}

#[tokio::test]
async fn test_did_is_not_resolved() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let resolve_mock = server.mock(|when, then| {
        when.method(GET).path("/xrpc/com.atproto.identity.resolveHandle");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/app.bsky.actor.getProfile")
            .query_param("actor", "did:plc:direct");
        then.status(200).json_body(json!({"handle": "direct.bsky.social"}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/xrpc/app.bsky.feed.getAuthorFeed")
            .query_param("actor", "did:plc:direct");
        then.status(200).json_body(json!({"feed": []}));
    });

    let config = FeedConfig {
        handle: "did:plc:direct".to_string(),
        ..config_for(&server)
    };
    let summary = engine_for(config, &temp_dir).run().await?;

    resolve_mock.assert_hits(0);
    assert_eq!(summary.handle, "direct.bsky.social");

    let xml = std::fs::read_to_string(temp_dir.path().join("rss/bluesky.xml"))?;
    assert!(xml.contains("<title>@direct.bsky.social on Bluesky</title>"));
    Ok(())
}
