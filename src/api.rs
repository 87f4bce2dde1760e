use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use postlens::engagement::PostTypeRecommendation;
use postlens::normalize::normalize;
use postlens::performance::RankedPost;

/// Body of every analysis endpoint: either identifier names the source
/// collection.
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub container_id: Option<String>,
    pub collection_name: Option<String>,
}

impl AnalysisRequest {
    pub fn collection(&self) -> Option<&str> {
        self.container_id
            .as_deref()
            .or(self.collection_name.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub engagement_models: Vec<&'static str>,
    pub performance_models: Vec<&'static str>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub status: &'static str,
    pub recommendations: Value,
}

impl RecommendResponse {
    /// The recommendation contract is a mapping ordered by descending
    /// engagement score; serde_json's order-preserving map carries it.
    pub fn from_recommendations(recommendations: Vec<PostTypeRecommendation>) -> Self {
        let mut map = Map::new();
        for entry in recommendations {
            map.insert(
                entry.post_type.clone(),
                serde_json::json!({
                    "expected_average_likes": entry.expected_average_likes,
                    "expected_average_comments": entry.expected_average_comments,
                    "engagement_score": entry.engagement_score,
                }),
            );
        }
        Self {
            status: "success",
            recommendations: Value::Object(map),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopPostsResponse {
    pub status: &'static str,
    pub message: String,
    pub top_posts: Vec<Value>,
}

impl TopPostsResponse {
    pub fn from_ranked(ranked: Vec<RankedPost>) -> Self {
        let top_posts: Vec<Value> = ranked.iter().map(top_post_value).collect();
        Self {
            status: "success",
            message: format!("Found {} top posts", top_posts.len()),
            top_posts,
        }
    }
}

/// One caller-facing top post: identifying fields first, then the
/// composite score and per-metric predictions, numbers rounded to two
/// decimals by the result normalizer.
fn top_post_value(post: &RankedPost) -> Value {
    let record = &post.record;
    let mut map = Map::new();
    map.insert("_id".to_string(), Value::String(record.id.clone()));
    if let Some(post_type) = &record.post_type {
        map.insert("type".to_string(), Value::String(post_type.clone()));
    }
    map.insert(
        "engagement_score".to_string(),
        serde_json::json!(post.performance_score),
    );
    if let Some(timestamp) = record.timestamp {
        map.insert(
            "timestamp".to_string(),
            Value::String(timestamp.to_rfc3339()),
        );
    }
    if let Some(caption) = &record.caption {
        map.insert("caption".to_string(), Value::String(caption.clone()));
    }
    if let Some(media_url) = &record.media_url {
        map.insert("media_url".to_string(), Value::String(media_url.clone()));
    }
    if let Some(likes) = record.likes_count {
        map.insert("likesCount".to_string(), serde_json::json!(likes));
    }
    if let Some(comments) = record.comments_count {
        map.insert("commentsCount".to_string(), serde_json::json!(comments));
    }
    map.insert(
        "predicted_likesCount".to_string(),
        serde_json::json!(post.predicted_likes),
    );
    map.insert(
        "predicted_commentsCount".to_string(),
        serde_json::json!(post.predicted_comments),
    );
    if let Some(reach) = post.predicted_reach {
        map.insert("predicted_reach".to_string(), serde_json::json!(reach));
    }
    normalize(Value::Object(map))
}

#[derive(Debug, Serialize)]
pub struct PostingTimeResponse {
    pub status: &'static str,
    pub message: String,
    pub best_peak_posting_times: Vec<postlens::clustering::PeakTime>,
}

pub fn health_response(models: &postlens::models::ModelStore) -> HealthResponse {
    HealthResponse {
        status: "healthy",
        engagement_models: models.engagement.loaded_targets(),
        performance_models: models.performance.loaded_targets(),
        timestamp: Utc::now().to_rfc3339(),
    }
}
