//! Posting-time clustering over (hour, engagement) history.
//!
//! Records are standardized, partitioned into a fixed number of clusters
//! with seeded k-means (k-means++ seeding, several independent starts,
//! lowest inertia wins), and each cluster reports a representative
//! two-hour peak window built around its mode hour.

use chrono::{DateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::ClusteringConfig;
use crate::error::AnalysisError;
use crate::PostRecord;

/// One row of the enriched clustering table handed to the reporting
/// collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteredPost {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "likesCount")]
    pub likes_count: u64,
    #[serde(rename = "commentsCount")]
    pub comments_count: u64,
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "Engagement")]
    pub engagement: u64,
    #[serde(rename = "Cluster")]
    pub cluster: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakTime {
    pub cluster: usize,
    pub peak_hours: String,
}

#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    pub peak_times: Vec<PeakTime>,
    pub table: Vec<ClusteredPost>,
}

pub struct PostingTimeClusterer<'a> {
    config: &'a ClusteringConfig,
}

impl<'a> PostingTimeClusterer<'a> {
    pub fn new(config: &'a ClusteringConfig) -> Self {
        Self { config }
    }

    /// Cluster posting history and extract up to `clusters` peak windows.
    ///
    /// Every record must carry likesCount, timestamp, and commentsCount;
    /// otherwise the absent fields are named in a missing-data error and
    /// the whole request aborts (no local recovery for this path).
    pub fn analyze(&self, records: &[PostRecord]) -> Result<ClusteringOutcome, AnalysisError> {
        let missing = missing_fields(records);
        if !missing.is_empty() {
            return Err(AnalysisError::MissingData(missing));
        }
        if records.len() < self.config.clusters {
            return Err(AnalysisError::InvalidInput(format!(
                "at least {} posts are required for posting-time clustering, got {}",
                self.config.clusters,
                records.len()
            )));
        }

        let mut table: Vec<ClusteredPost> = records
            .iter()
            .map(|record| {
                // missing_fields already guaranteed the timestamp.
                let timestamp = record.timestamp.unwrap_or_default();
                ClusteredPost {
                    timestamp,
                    likes_count: record.likes(),
                    comments_count: record.comments(),
                    hour: timestamp.hour(),
                    engagement: record.likes() + record.comments(),
                    cluster: 0,
                }
            })
            .collect();

        let points: Vec<[f64; 2]> = table
            .iter()
            .map(|row| [f64::from(row.hour), row.engagement as f64])
            .collect();
        let standardized = standardize(&points);

        let kmeans = KMeans {
            k: self.config.clusters,
            n_init: self.config.n_init,
            max_iter: self.config.max_iter,
            seed: self.config.seed,
        };
        let assignments = kmeans.fit(&standardized)?;
        for (row, cluster) in table.iter_mut().zip(&assignments) {
            row.cluster = *cluster;
        }

        let peak_times = extract_peak_times(&table, self.config.clusters);
        Ok(ClusteringOutcome { peak_times, table })
    }
}

fn missing_fields(records: &[PostRecord]) -> Vec<String> {
    let mut missing = Vec::new();
    if records.iter().any(|record| record.likes_count.is_none()) {
        missing.push("likesCount".to_string());
    }
    if records.iter().any(|record| record.timestamp.is_none()) {
        missing.push("timestamp".to_string());
    }
    if records.iter().any(|record| record.comments_count.is_none()) {
        missing.push("commentsCount".to_string());
    }
    missing
}

/// Zero-mean unit-variance scaling per dimension; a constant dimension
/// keeps scale 1 so it contributes zero distance instead of NaN.
fn standardize(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let count = points.len() as f64;
    let mut scaled = points.to_vec();
    for dim in 0..2 {
        let mean: f64 = points.iter().map(|p| p[dim]).sum::<f64>() / count;
        let variance: f64 = points.iter().map(|p| (p[dim] - mean).powi(2)).sum::<f64>() / count;
        let std = variance.sqrt();
        let scale = if std == 0.0 { 1.0 } else { std };
        for point in &mut scaled {
            point[dim] = (point[dim] - mean) / scale;
        }
    }
    scaled
}

struct KMeans {
    k: usize,
    n_init: usize,
    max_iter: usize,
    seed: u64,
}

impl KMeans {
    /// Run `n_init` seeded initializations and keep the assignment with
    /// the lowest inertia.
    fn fit(&self, points: &[[f64; 2]]) -> Result<Vec<usize>, AnalysisError> {
        if points.len() < self.k {
            return Err(AnalysisError::InvalidInput(format!(
                "cannot form {} clusters from {} points",
                self.k,
                points.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best_assignments = None;
        let mut best_inertia = f64::INFINITY;

        for _ in 0..self.n_init.max(1) {
            let (assignments, inertia) = self.run_once(points, &mut rng);
            if inertia < best_inertia {
                best_inertia = inertia;
                best_assignments = Some(assignments);
            }
        }

        best_assignments
            .ok_or_else(|| AnalysisError::Internal("clustering produced no assignment".to_string()))
    }

    fn run_once(&self, points: &[[f64; 2]], rng: &mut StdRng) -> (Vec<usize>, f64) {
        let mut centroids = self.seed_centroids(points, rng);
        let mut assignments = vec![0usize; points.len()];

        for _ in 0..self.max_iter {
            let mut changed = false;
            for (idx, point) in points.iter().enumerate() {
                let nearest = nearest_centroid(point, &centroids);
                if assignments[idx] != nearest {
                    assignments[idx] = nearest;
                    changed = true;
                }
            }

            let mut sums = vec![[0.0_f64; 2]; self.k];
            let mut counts = vec![0usize; self.k];
            for (point, &cluster) in points.iter().zip(&assignments) {
                sums[cluster][0] += point[0];
                sums[cluster][1] += point[1];
                counts[cluster] += 1;
            }
            for cluster in 0..self.k {
                // An emptied cluster keeps its previous centroid.
                if counts[cluster] > 0 {
                    centroids[cluster] = [
                        sums[cluster][0] / counts[cluster] as f64,
                        sums[cluster][1] / counts[cluster] as f64,
                    ];
                }
            }

            if !changed {
                break;
            }
        }

        let inertia = points
            .iter()
            .zip(&assignments)
            .map(|(point, &cluster)| squared_distance(point, &centroids[cluster]))
            .sum();
        (assignments, inertia)
    }

    /// k-means++ seeding: first centroid uniform, each next one sampled
    /// proportionally to squared distance from the chosen set.
    fn seed_centroids(&self, points: &[[f64; 2]], rng: &mut StdRng) -> Vec<[f64; 2]> {
        let mut centroids = Vec::with_capacity(self.k);
        centroids.push(points[rng.gen_range(0..points.len())]);

        while centroids.len() < self.k {
            let distances: Vec<f64> = points
                .iter()
                .map(|point| {
                    centroids
                        .iter()
                        .map(|centroid| squared_distance(point, centroid))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let total: f64 = distances.iter().sum();
            if total <= 0.0 {
                // All remaining points coincide with a centroid.
                centroids.push(points[rng.gen_range(0..points.len())]);
                continue;
            }
            let mut threshold = rng.gen::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (idx, distance) in distances.iter().enumerate() {
                threshold -= distance;
                if threshold <= 0.0 {
                    chosen = idx;
                    break;
                }
            }
            centroids.push(points[chosen]);
        }
        centroids
    }
}

fn nearest_centroid(point: &[f64; 2], centroids: &[[f64; 2]]) -> usize {
    let mut nearest = 0;
    let mut best = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best {
            best = distance;
            nearest = idx;
        }
    }
    nearest
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Peak windows per cluster id ascending: the mode hour (first-seen wins
/// ties) defines a [mode-1, mode] window; identical window strings are
/// deduplicated keeping the first, and the list is capped.
fn extract_peak_times(table: &[ClusteredPost], cap: usize) -> Vec<PeakTime> {
    let mut clusters: Vec<usize> = table.iter().map(|row| row.cluster).collect();
    clusters.sort_unstable();
    clusters.dedup();

    let mut peak_times: Vec<PeakTime> = Vec::new();
    let mut seen_windows: Vec<String> = Vec::new();

    for cluster in clusters {
        let hours = table
            .iter()
            .filter(|row| row.cluster == cluster)
            .map(|row| row.hour);
        let Some(mode_hour) = mode_first_seen(hours) else {
            continue;
        };
        let start = mode_hour.saturating_sub(1);
        let window = format!("{}-{} Hrs", start, mode_hour);
        if seen_windows.iter().any(|known| *known == window) {
            continue;
        }
        seen_windows.push(window.clone());
        peak_times.push(PeakTime {
            cluster,
            peak_hours: window,
        });
    }

    peak_times.truncate(cap);
    peak_times
}

/// Most frequent value; on count ties the value seen first wins.
fn mode_first_seen(values: impl Iterator<Item = u32>) -> Option<u32> {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(known, _)| *known == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    let mut best: Option<(u32, usize)> = None;
    for (value, count) in counts {
        if best.map(|(_, best_count)| count > best_count).unwrap_or(true) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
