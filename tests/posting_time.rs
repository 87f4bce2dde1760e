use chrono::{TimeZone, Utc};

use postlens::clustering::PostingTimeClusterer;
use postlens::config::ClusteringConfig;
use postlens::error::AnalysisError;
use postlens::PostRecord;

fn post_at(hour: u32, likes: u64, comments: u64) -> PostRecord {
    PostRecord {
        id: format!("post-{}-{}", hour, likes),
        timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()),
        likes_count: Some(likes),
        comments_count: Some(comments),
        ..PostRecord::default()
    }
}

/// Three well-separated (hour, engagement) groups.
fn separated_history() -> Vec<PostRecord> {
    let mut records = Vec::new();
    for i in 0..4 {
        records.push(post_at(8, 100 + i, 10));
        records.push(post_at(14, 900 + i, 80));
        records.push(post_at(21, 3000 + i, 300));
    }
    records
}

#[test]
fn partitions_history_into_three_clusters() {
    let config = ClusteringConfig::default();
    let outcome = PostingTimeClusterer::new(&config)
        .analyze(&separated_history())
        .unwrap();

    let mut clusters: Vec<usize> = outcome.table.iter().map(|row| row.cluster).collect();
    clusters.sort_unstable();
    clusters.dedup();
    assert_eq!(clusters.len(), 3);

    // One enriched row per input record.
    assert_eq!(outcome.table.len(), 12);
    assert!(outcome.peak_times.len() <= 3);
}

#[test]
fn clustering_is_reproducible() {
    let config = ClusteringConfig::default();
    let clusterer = PostingTimeClusterer::new(&config);
    let first = clusterer.analyze(&separated_history()).unwrap();
    let second = clusterer.analyze(&separated_history()).unwrap();

    let assignments = |outcome: &postlens::clustering::ClusteringOutcome| {
        outcome
            .table
            .iter()
            .map(|row| row.cluster)
            .collect::<Vec<_>>()
    };
    assert_eq!(assignments(&first), assignments(&second));
}

#[test]
fn uniform_hour_collapses_to_single_window() {
    let config = ClusteringConfig::default();
    let records: Vec<PostRecord> = (0..9)
        .map(|i| post_at(14, 50 * (i + 1), 5 * (i + 1)))
        .collect();

    let outcome = PostingTimeClusterer::new(&config).analyze(&records).unwrap();

    // Every cluster's mode hour is 14, so the windows deduplicate.
    assert_eq!(outcome.peak_times.len(), 1);
    assert_eq!(outcome.peak_times[0].peak_hours, "13-14 Hrs");
}

#[test]
fn midnight_window_floors_at_zero() {
    let config = ClusteringConfig::default();
    let records: Vec<PostRecord> = (0..6)
        .map(|i| post_at(0, 10 * (i + 1), i + 1))
        .collect();

    let outcome = PostingTimeClusterer::new(&config).analyze(&records).unwrap();
    assert_eq!(outcome.peak_times[0].peak_hours, "0-0 Hrs");
}

#[test]
fn missing_timestamp_is_named_in_the_error() {
    let config = ClusteringConfig::default();
    let mut records = separated_history();
    records[2].timestamp = None;

    let err = PostingTimeClusterer::new(&config)
        .analyze(&records)
        .unwrap_err();
    match err {
        AnalysisError::MissingData(fields) => {
            assert_eq!(fields, vec!["timestamp".to_string()]);
        }
        other => panic!("expected missing-data error, got {}", other),
    }
}

#[test]
fn missing_counts_are_all_named() {
    let config = ClusteringConfig::default();
    let records = vec![PostRecord::default(), PostRecord::default(), PostRecord::default()];

    let err = PostingTimeClusterer::new(&config)
        .analyze(&records)
        .unwrap_err();
    match err {
        AnalysisError::MissingData(fields) => {
            assert_eq!(
                fields,
                vec![
                    "likesCount".to_string(),
                    "timestamp".to_string(),
                    "commentsCount".to_string()
                ]
            );
        }
        other => panic!("expected missing-data error, got {}", other),
    }
}

#[test]
fn too_few_records_is_an_input_error() {
    let config = ClusteringConfig::default();
    let records = vec![post_at(9, 10, 1), post_at(20, 50, 5)];

    let err = PostingTimeClusterer::new(&config)
        .analyze(&records)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[test]
fn peak_windows_report_cluster_mode_hours() {
    let config = ClusteringConfig::default();
    let outcome = PostingTimeClusterer::new(&config)
        .analyze(&separated_history())
        .unwrap();

    // Each window ends on one of the three posting hours.
    for peak in &outcome.peak_times {
        let window = peak.peak_hours.strip_suffix(" Hrs").unwrap();
        let (start, end) = window.split_once('-').unwrap();
        let start: u32 = start.parse().unwrap();
        let end: u32 = end.parse().unwrap();
        assert_eq!(start, end.saturating_sub(1));
        assert!([8, 14, 21].contains(&end));
    }
}
