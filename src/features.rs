//! Feature derivation from raw post records.
//!
//! Both derivations are total: every feature gets a value (defaulting
//! absent raw fields to a neutral one), so no model is ever invoked on a
//! missing column. One output row per input row, input order preserved.

use chrono::{Datelike, Timelike};

use crate::PostRecord;

const DEFAULT_HOUR: f64 = 12.0;
const DEFAULT_DAY_OF_WEEK: f64 = 0.0;

/// Features the engagement models were trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementFeatures {
    pub caption_length: f64,
    pub caption_sentiment: f64,
    pub hashtag_count: f64,
    pub mentions_count: f64,
    pub hour: f64,
    pub day_of_week_encoded: f64,
}

impl EngagementFeatures {
    /// The ordered column layout the engagement scaler and models expect.
    pub fn columns(&self) -> [f64; 6] {
        [
            self.caption_length,
            self.hour,
            self.hashtag_count,
            self.mentions_count,
            self.day_of_week_encoded,
            self.caption_sentiment,
        ]
    }
}

/// Features the performance models were trained on. Time columns stay
/// absent (rather than defaulted) when the record has no timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceFeatures {
    pub interaction: f64,
    pub hour: Option<f64>,
    pub day_of_week: Option<f64>,
    pub month: Option<f64>,
    pub hashtags_count: f64,
    pub mentions_count: f64,
}

pub fn engagement_features(record: &PostRecord) -> EngagementFeatures {
    let (hour, day_of_week_encoded) = match record.timestamp {
        Some(ts) => (
            f64::from(ts.hour()),
            f64::from(ts.weekday().num_days_from_monday()),
        ),
        None => (DEFAULT_HOUR, DEFAULT_DAY_OF_WEEK),
    };

    EngagementFeatures {
        caption_length: record
            .caption
            .as_deref()
            .map(|caption| caption.chars().count() as f64)
            .unwrap_or(0.0),
        caption_sentiment: record
            .caption
            .as_deref()
            .map(crate::sentiment::polarity)
            .unwrap_or(0.0),
        hashtag_count: list_len(record.hashtags.as_deref()),
        mentions_count: list_len(record.mentions.as_deref()),
        hour,
        day_of_week_encoded,
    }
}

pub fn performance_features(record: &PostRecord) -> PerformanceFeatures {
    let likes = record.likes() as f64;
    let comments = record.comments() as f64;

    PerformanceFeatures {
        interaction: likes * comments / 100.0,
        hour: record.timestamp.map(|ts| f64::from(ts.hour())),
        day_of_week: record
            .timestamp
            .map(|ts| f64::from(ts.weekday().num_days_from_monday())),
        month: record.timestamp.map(|ts| f64::from(ts.month())),
        hashtags_count: list_len(record.hashtags.as_deref()),
        mentions_count: list_len(record.mentions.as_deref()),
    }
}

/// Derive engagement features for a whole batch, one row per record.
pub fn engagement_matrix(records: &[PostRecord]) -> Vec<EngagementFeatures> {
    records.iter().map(engagement_features).collect()
}

/// Derive performance features for a whole batch, one row per record.
pub fn performance_matrix(records: &[PostRecord]) -> Vec<PerformanceFeatures> {
    records.iter().map(performance_features).collect()
}

fn list_len(list: Option<&[String]>) -> f64 {
    list.map(|items| items.len() as f64).unwrap_or(0.0)
}
