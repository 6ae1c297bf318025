use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// The subset of `GET /at-home/server/{id}` this service reads. Every field is optional so
/// a reshaped upstream payload degrades to an empty page list instead of an error.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AtHomeServer {
    pub base_url: Option<String>,
    pub chapter: Option<AtHomeChapter>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AtHomeChapter {
    pub hash: Option<String>,
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub data_saver: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterPages {
    pub chapter_id: String,
    pub hash: Option<String>,
    pub data_saver: bool,
    pub pages: Vec<String>,
}

impl ChapterPages {
    fn empty(chapter_id: &str, data_saver: bool) -> Self {
        Self {
            chapter_id: chapter_id.to_string(),
            hash: None,
            data_saver,
            pages: Vec::new(),
        }
    }

    pub fn from_at_home(chapter_id: &str, at_home: AtHomeServer, data_saver: bool) -> Self {
        // every page URL needs the base URL and the chapter hash
        let (base_url, chapter, hash) = match (at_home.base_url, at_home.chapter) {
            (Some(base_url), Some(mut chapter)) => match chapter.hash.take() {
                Some(hash) if !hash.is_empty() => (base_url, chapter, hash),
                _ => return Self::empty(chapter_id, data_saver),
            },
            _ => return Self::empty(chapter_id, data_saver),
        };

        let (quality, files) = if data_saver {
            ("data-saver", chapter.data_saver)
        } else {
            ("data", chapter.data)
        };
        let base_url = base_url.trim_end_matches('/');

        let pages = files
            .iter()
            .map(|file| format!("{}/{}/{}/{}", base_url, quality, hash, file))
            .collect();

        Self {
            chapter_id: chapter_id.to_string(),
            hash: Some(hash),
            data_saver,
            pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub images: CacheStats,
    pub api: CacheStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}
