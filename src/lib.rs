pub mod clustering;
pub mod config;
pub mod engagement;
pub mod error;
pub mod features;
pub mod models;
pub mod normalize;
pub mod performance;
pub mod sentiment;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub use crate::error::AnalysisError;

/// One social post as stored by the collection backend.
///
/// Records arrive as loosely-typed JSON documents. Every field except the
/// identifier is lenient: a value that is absent or of the wrong type
/// deserializes to `None` instead of rejecting the whole record, so the
/// feature deriver can default it downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub hashtags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub mentions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub post_type: Option<String>,
    #[serde(rename = "likesCount", default, deserialize_with = "lenient")]
    pub likes_count: Option<u64>,
    #[serde(rename = "commentsCount", default, deserialize_with = "lenient")]
    pub comments_count: Option<u64>,
    #[serde(rename = "media_url", default, deserialize_with = "lenient")]
    pub media_url: Option<String>,
}

impl PostRecord {
    pub fn likes(&self) -> u64 {
        self.likes_count.unwrap_or(0)
    }

    pub fn comments(&self) -> u64 {
        self.comments_count.unwrap_or(0)
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Parse a JSON array of post documents, skipping entries that are not
/// objects at all. Wrongly-typed fields inside an object are absorbed by
/// the lenient field deserializer, not by this filter.
pub fn parse_records(payload: &str) -> Result<Vec<PostRecord>, AnalysisError> {
    let documents: Vec<serde_json::Value> = serde_json::from_str(payload)
        .map_err(|err| AnalysisError::InvalidInput(format!("invalid records payload: {}", err)))?;
    Ok(documents
        .into_iter()
        .filter_map(|doc| serde_json::from_value(doc).ok())
        .collect())
}
