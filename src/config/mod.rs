pub mod cli;
pub mod toml_config;

use crate::core::fetcher::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use std::time::Duration;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_HANDLE: &str = "oblachek.eu";
pub const DEFAULT_OUTPUT: &str = "rss/bluesky.xml";
pub const DEFAULT_LIMIT: usize = 20;
const MAX_TIMEOUT_SECS: u64 = 300;

/// 合併命令列、設定檔與預設值後的最終設定
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub handle: String,
    pub output_path: String,
    pub limit: usize,
    pub include_replies: bool,
    pub include_reposts: bool,
    pub site_url: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            handle: DEFAULT_HANDLE.to_string(),
            output_path: DEFAULT_OUTPUT.to_string(),
            limit: DEFAULT_LIMIT,
            include_replies: false,
            include_reposts: false,
            site_url: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FeedConfig {
    /// 以設定檔覆蓋預設值
    pub fn from_toml(file: &TomlConfig) -> Self {
        let defaults = Self::default();
        let feed = file.feed();
        let api = file.api();

        Self {
            handle: feed.handle.unwrap_or(defaults.handle),
            output_path: feed.out.unwrap_or(defaults.output_path),
            limit: feed.limit.unwrap_or(defaults.limit),
            include_replies: feed.include_replies.unwrap_or(defaults.include_replies),
            include_reposts: feed.include_reposts.unwrap_or(defaults.include_reposts),
            site_url: feed.site_url.unwrap_or(defaults.site_url),
            api_base: api.base_url.unwrap_or(defaults.api_base),
            timeout_secs: api.timeout_seconds.unwrap_or(defaults.timeout_secs),
            user_agent: api.user_agent.unwrap_or(defaults.user_agent),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConfigProvider for FeedConfig {
    fn handle(&self) -> &str {
        &self.handle
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn include_replies(&self) -> bool {
        self.include_replies
    }

    fn include_reposts(&self) -> bool {
        self.include_reposts
    }

    fn site_url(&self) -> &str {
        &self.site_url
    }
}

impl Validate for FeedConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("--handle", &self.handle)?;
        validate_path("--out", &self.output_path)?;
        validate_positive_number("--limit", self.limit, 1)?;
        validate_url("--api-base", &self.api_base)?;
        validate_range("--timeout-secs", self.timeout_secs, 1, MAX_TIMEOUT_SECS)?;
        validate_non_empty_string("--user-agent", &self.user_agent)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "bsky-rss")]
#[command(about = "Generate an RSS 2.0 feed from a Bluesky author feed")]
pub struct CliConfig {
    /// Bluesky handle or DID [default: oblachek.eu]
    #[arg(long)]
    pub handle: Option<String>,

    /// Output XML path [default: rss/bluesky.xml]
    #[arg(long)]
    pub out: Option<String>,

    /// Number of items in RSS [default: 20]
    #[arg(long)]
    pub limit: Option<usize>,

    /// Include replies
    #[arg(long)]
    pub include_replies: bool,

    /// Include reposts
    #[arg(long)]
    pub include_reposts: bool,

    /// Site URL joined with --out for the atom:link self reference (may be relative)
    #[arg(long)]
    pub site_url: Option<String>,

    /// Optional TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bluesky XRPC base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent to the API
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列 > 設定檔 > 預設值
    pub fn resolve(&self) -> Result<FeedConfig> {
        let file = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        Ok(self.merge(FeedConfig::from_toml(&file)))
    }

    fn merge(&self, base: FeedConfig) -> FeedConfig {
        FeedConfig {
            handle: self.handle.clone().unwrap_or(base.handle),
            output_path: self.out.clone().unwrap_or(base.output_path),
            limit: self.limit.unwrap_or(base.limit),
            include_replies: self.include_replies || base.include_replies,
            include_reposts: self.include_reposts || base.include_reposts,
            site_url: self.site_url.clone().unwrap_or(base.site_url),
            api_base: self.api_base.clone().unwrap_or(base.api_base),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(base.user_agent),
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> std::result::Result<CliConfig, clap::Error> {
        CliConfig::try_parse_from(std::iter::once("bsky-rss").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap().resolve().unwrap();

        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.handle, "oblachek.eu");
        assert_eq!(config.output_path, "rss/bluesky.xml");
        assert_eq!(config.limit, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = parse(&[
            "--handle",
            "did:plc:abc",
            "--out",
            "public/feed.xml",
            "--limit",
            "5",
            "--include-replies",
            "--include-reposts",
            "--site-url",
            "https://example.com",
        ])
        .unwrap()
        .resolve()
        .unwrap();

        assert_eq!(config.handle, "did:plc:abc");
        assert_eq!(config.output_path, "public/feed.xml");
        assert_eq!(config.limit, 5);
        assert!(config.include_replies);
        assert!(config.include_reposts);
        assert_eq!(config.site_url, "https://example.com");
    }

    #[test]
    fn test_argument_errors() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--limit", "abc"]).is_err());
        assert!(parse(&["--handle"]).is_err());

        let zero = parse(&["--limit", "0"]).unwrap().resolve().unwrap();
        assert!(zero.validate().is_err());

        let empty = parse(&["--handle", ""]).unwrap().resolve().unwrap();
        let err = empty.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing --handle value");
    }

    #[test]
    fn test_help_is_reported_as_display_help() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"[feed]\nhandle = \"file.bsky.social\"\nlimit = 3\ninclude_reposts = true\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = parse(&["--config", path.as_str(), "--limit", "7"])
            .unwrap()
            .resolve()
            .unwrap();

        assert_eq!(config.handle, "file.bsky.social");
        assert_eq!(config.limit, 7);
        assert!(config.include_reposts);
        assert!(!config.include_replies);
    }

    #[test]
    fn test_site_url_may_be_relative() {
        let config = parse(&["--site-url", "/feeds"]).unwrap().resolve().unwrap();
        assert_eq!(config.site_url, "/feeds");
        assert!(config.validate().is_ok());
    }
}
