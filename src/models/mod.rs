pub mod mangadex;

pub use mangadex::{
    AtHomeServer, CacheStatsResponse, ChapterPages, ErrorBody, HealthStatus, MessageBody,
};
