pub mod classifier;
pub mod etl;
pub mod fetcher;
pub mod pipeline;
pub mod renderer;
pub mod serializer;

pub use crate::domain::model::{
    ClassifiedItem, FeedItem, FeedPage, FeedSnapshot, Profile, RenderedEntry, RssDocument,
    RunSummary, Tag, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, FeedSource, Pipeline, Storage};
pub use crate::utils::error::Result;
