// Pipeline ingestion: reading raw items handed over by the crawler

pub mod feed;

pub use feed::{read_feed, FeedReader};
