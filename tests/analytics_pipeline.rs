use chrono::{TimeZone, Utc};
use serde_json::json;

use postlens::config::AnalysisConfig;
use postlens::engagement::EngagementPredictor;
use postlens::features::{engagement_features, engagement_matrix, performance_features};
use postlens::models::{EngagementModels, FeatureScaler, PerformanceModels, RegressionModel};
use postlens::performance::{PerformanceRanker, PredictionSource};
use postlens::{parse_records, PostRecord};

fn record(id: &str, likes: u64, comments: u64) -> PostRecord {
    PostRecord {
        id: id.to_string(),
        likes_count: Some(likes),
        comments_count: Some(comments),
        ..PostRecord::default()
    }
}

fn identity_model() -> RegressionModel {
    RegressionModel {
        intercept: 0.0,
        coefficients: vec![1.0],
    }
}

fn passthrough_scaler() -> FeatureScaler {
    FeatureScaler {
        center: vec![0.0; 6],
        scale: vec![1.0; 6],
    }
}

fn constant_model(prediction: f64) -> RegressionModel {
    RegressionModel {
        intercept: prediction,
        coefficients: vec![0.0; 6],
    }
}

#[test]
fn feature_derivation_is_total_and_preserves_rows() {
    let records = vec![
        record("a", 10, 2),
        PostRecord::default(),
        PostRecord {
            id: "c".to_string(),
            caption: Some("amazing day".to_string()),
            hashtags: Some(vec!["sunset".to_string(), "beach".to_string()]),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 7, 18, 30, 0).unwrap()),
            ..PostRecord::default()
        },
    ];

    let features = engagement_matrix(&records);
    assert_eq!(features.len(), records.len());

    // 2024-05-07 is a Tuesday, encoded 1.
    assert!((features[2].hour - 18.0).abs() < 1e-9);
    assert!((features[2].day_of_week_encoded - 1.0).abs() < 1e-9);
    assert!((features[2].hashtag_count - 2.0).abs() < 1e-9);
    assert!(features[2].caption_sentiment > 0.0);

    // Missing timestamp falls back to neutral defaults.
    assert!((features[0].hour - 12.0).abs() < 1e-9);
    assert!((features[0].day_of_week_encoded - 0.0).abs() < 1e-9);
}

#[test]
fn wrong_typed_fields_default_to_zero() {
    let payload = json!([
        {"_id": "x", "caption": 42, "hashtags": "not-a-list", "mentions": 7, "likesCount": "many"}
    ])
    .to_string();

    let records = parse_records(&payload).unwrap();
    assert_eq!(records.len(), 1);

    let features = engagement_features(&records[0]);
    assert_eq!(features.caption_length, 0.0);
    assert_eq!(features.caption_sentiment, 0.0);
    assert_eq!(features.hashtag_count, 0.0);
    assert_eq!(features.mentions_count, 0.0);
    assert_eq!(records[0].likes(), 0);
}

#[test]
fn interaction_treats_missing_counts_as_zero() {
    let full = record("a", 40, 5);
    assert!((performance_features(&full).interaction - 2.0).abs() < 1e-9);

    let bare = PostRecord::default();
    assert_eq!(performance_features(&bare).interaction, 0.0);
    // Time columns stay absent without a timestamp, not defaulted.
    assert!(performance_features(&bare).hour.is_none());
    assert!(performance_features(&bare).month.is_none());
}

#[test]
fn recommendation_scores_single_type_exactly() {
    // Constant log-space predictions: expm1 recovers 100.5 likes and
    // 50.5 comments, kept off integer boundaries so truncation is stable.
    let models = EngagementModels {
        likes: Some(constant_model(101.5_f64.ln())),
        comments: Some(constant_model(51.5_f64.ln())),
        scaler: Some(passthrough_scaler()),
    };
    let config = AnalysisConfig::default();

    let mut records = vec![record("a", 1, 1), record("b", 2, 2)];
    for r in &mut records {
        r.post_type = Some("Image".to_string());
    }

    let recommendations = EngagementPredictor::new(&models, &config)
        .recommend(&records)
        .unwrap();

    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].post_type, "Image");
    assert_eq!(recommendations[0].expected_average_likes, 100);
    assert_eq!(recommendations[0].expected_average_comments, 50);
    // score = avg_likes + 2 * avg_comments = 100.5 + 2 * 50.5, truncated.
    assert_eq!(recommendations[0].engagement_score, 201);
}

#[test]
fn recommendation_defaults_candidate_types_without_type_field() {
    let models = EngagementModels {
        likes: Some(constant_model(0.0)),
        comments: Some(constant_model(0.0)),
        scaler: Some(passthrough_scaler()),
    };
    let config = AnalysisConfig::default();

    let records = vec![record("a", 1, 1)];
    let recommendations = EngagementPredictor::new(&models, &config)
        .recommend(&records)
        .unwrap();

    let types: Vec<&str> = recommendations
        .iter()
        .map(|r| r.post_type.as_str())
        .collect();
    assert_eq!(types.len(), 3);
    assert!(types.contains(&"Image"));
    assert!(types.contains(&"Video"));
    assert!(types.contains(&"Sidecar"));
    // No matching records: zeros, not an error.
    assert!(recommendations.iter().all(|r| r.engagement_score == 0));
}

#[test]
fn recommendation_requires_full_engagement_models() {
    let models = EngagementModels {
        likes: Some(constant_model(0.0)),
        comments: None,
        scaler: Some(passthrough_scaler()),
    };
    let config = AnalysisConfig::default();
    let err = EngagementPredictor::new(&models, &config)
        .recommend(&[record("a", 1, 1)])
        .unwrap_err();
    assert!(err.to_string().contains("not available"));
}

#[test]
fn missing_reach_model_uses_likes_comments_approximation() {
    let models = PerformanceModels {
        likes: Some(identity_model()),
        comments: Some(identity_model()),
        reach: None,
    };
    let config = AnalysisConfig::default();

    // interaction = likes * comments / 100 = 10 * i^2; not all below the
    // log-scale threshold, so predictions stay in natural units.
    let records: Vec<PostRecord> = (1..=10)
        .map(|i| record(&format!("post{}", i), 100 * i, 10 * i))
        .collect();

    let ranked = PerformanceRanker::new(&models, &config)
        .rank(&records)
        .unwrap();
    assert_eq!(ranked.len(), 5);

    for post in &ranked {
        let reach = post.predicted_reach.unwrap();
        let expected = post.predicted_likes * 5.0 + post.predicted_comments * 10.0;
        assert!((reach - expected).abs() < 1e-9);
        assert!(post.performance_score >= 0.0 && post.performance_score <= 1.0);
        assert_eq!(post.sources.likes, PredictionSource::Model);
        assert_eq!(post.sources.reach, PredictionSource::Approximated);
    }

    // Highest interaction wins, descending.
    assert_eq!(ranked[0].record.id, "post10");
    assert!((ranked[0].performance_score - 1.0).abs() < 1e-9);
    assert_eq!(ranked[1].record.id, "post9");
}

#[test]
fn performance_score_is_invariant_under_batch_reordering() {
    let models = PerformanceModels {
        likes: Some(identity_model()),
        comments: Some(identity_model()),
        reach: None,
    };
    let config = AnalysisConfig::default();

    let records: Vec<PostRecord> = (1..=8)
        .map(|i| record(&format!("post{}", i), 90 * i, 11 * i))
        .collect();
    let mut reversed = records.clone();
    reversed.reverse();

    let ranker = PerformanceRanker::new(&models, &config);
    let forward = ranker.rank(&records).unwrap();
    let backward = ranker.rank(&reversed).unwrap();

    for post in &forward {
        let twin = backward
            .iter()
            .find(|other| other.record.id == post.record.id)
            .unwrap();
        assert!((post.performance_score - twin.performance_score).abs() < 1e-9);
    }
}

#[test]
fn small_predictions_are_treated_as_log_space() {
    let models = PerformanceModels {
        likes: Some(constant_log_model()),
        comments: Some(constant_log_model()),
        reach: None,
    };
    let config = AnalysisConfig::default();

    let ranked = PerformanceRanker::new(&models, &config)
        .rank(&[record("a", 10, 10), record("b", 20, 20)])
        .unwrap();

    // ln(4) < 20 for every record, so expm1 recovers 3.0.
    for post in &ranked {
        assert!((post.predicted_likes - 3.0).abs() < 1e-9);
    }
}

fn constant_log_model() -> RegressionModel {
    RegressionModel {
        intercept: 4.0_f64.ln(),
        coefficients: vec![0.0],
    }
}

#[test]
fn failed_metric_falls_back_to_raw_values() {
    // Two-column model against a one-column feature: dimension mismatch.
    let broken = RegressionModel {
        intercept: 0.0,
        coefficients: vec![1.0, 1.0],
    };
    let models = PerformanceModels {
        likes: Some(broken),
        comments: Some(identity_model()),
        reach: None,
    };
    let config = AnalysisConfig::default();

    let records = vec![record("a", 70, 100), record("b", 35, 100)];
    let ranked = PerformanceRanker::new(&models, &config)
        .rank(&records)
        .unwrap();

    let top = &ranked[0];
    assert_eq!(top.record.id, "a");
    assert_eq!(top.sources.likes, PredictionSource::RawValue);
    assert!((top.predicted_likes - 70.0).abs() < 1e-9);
    // The failure stays isolated: comments still come from the model.
    assert_eq!(top.sources.comments, PredictionSource::Model);
}

#[test]
fn empty_batch_ranks_to_empty_result() {
    let models = PerformanceModels {
        likes: Some(identity_model()),
        comments: None,
        reach: None,
    };
    let config = AnalysisConfig::default();
    let ranked = PerformanceRanker::new(&models, &config).rank(&[]).unwrap();
    assert!(ranked.is_empty());
}

#[test]
fn ranking_without_any_model_is_unavailable() {
    let models = PerformanceModels::default();
    let config = AnalysisConfig::default();
    assert!(PerformanceRanker::new(&models, &config)
        .rank(&[record("a", 1, 1)])
        .is_err());
}
