mod response;

pub use response::{CacheEntry, CacheStats, ResponseCache};
