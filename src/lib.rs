pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, FeedConfig};

pub use crate::core::{etl::EtlEngine, fetcher::BskyClient, pipeline::FeedPipeline};
pub use utils::error::{Result, RssError};
