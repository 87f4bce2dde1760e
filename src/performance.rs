//! Per-post performance ranking and top-K selection.
//!
//! Each target metric is predicted independently from the single
//! `interaction` feature. A failing or missing metric model never aborts
//! the ranking; it triggers the fallback chain and the chosen source is
//! recorded on the result so degraded predictions stay observable.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, LogNormal};
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::performance_matrix;
use crate::models::{PerformanceModels, RegressionModel};
use crate::PostRecord;

/// Where a metric's predictions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// The metric's own model produced the values.
    Model,
    /// Reach derived from predicted likes and comments.
    Approximated,
    /// The records' raw counts, used when the model failed or was absent.
    RawValue,
    /// Log-normal placeholder, explicitly non-authoritative.
    Synthetic,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSources {
    pub likes: PredictionSource,
    pub comments: PredictionSource,
    pub reach: PredictionSource,
}

/// A post record augmented with predictions and its composite score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPost {
    #[serde(flatten)]
    pub record: PostRecord,
    pub predicted_likes: f64,
    pub predicted_comments: f64,
    pub predicted_reach: Option<f64>,
    pub performance_score: f64,
    pub sources: MetricSources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Likes,
    Comments,
    Reach,
}

impl Target {
    fn label(self) -> &'static str {
        match self {
            Target::Likes => "likesCount",
            Target::Comments => "commentsCount",
            Target::Reach => "reach",
        }
    }
}

struct MetricPrediction {
    values: Vec<f64>,
    source: PredictionSource,
}

pub struct PerformanceRanker<'a> {
    models: &'a PerformanceModels,
    config: &'a AnalysisConfig,
}

impl<'a> PerformanceRanker<'a> {
    pub fn new(models: &'a PerformanceModels, config: &'a AnalysisConfig) -> Self {
        Self { models, config }
    }

    /// Score every record and keep the configured top K (default 5),
    /// ties broken by encounter order. An empty batch yields an empty,
    /// schema-valid result.
    pub fn rank(&self, records: &[PostRecord]) -> Result<Vec<RankedPost>, AnalysisError> {
        if self.models.is_empty() {
            return Err(AnalysisError::ModelsUnavailable("performance ranking"));
        }
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let interactions: Vec<f64> = performance_matrix(records)
            .into_iter()
            .map(|features| features.interaction)
            .collect();
        let mut rng = StdRng::seed_from_u64(self.config.synthetic_seed);

        let likes = self.predict_metric(Target::Likes, records, &interactions, None, &mut rng);
        let comments =
            self.predict_metric(Target::Comments, records, &interactions, None, &mut rng);
        let reach = self.predict_metric(
            Target::Reach,
            records,
            &interactions,
            Some((&likes.values, &comments.values)),
            &mut rng,
        );

        let max_likes = batch_max(&likes.values);
        let max_comments = batch_max(&comments.values);
        let max_reach = batch_max(&reach.values);
        let weights = &self.config.score_weights;

        let mut ranked: Vec<RankedPost> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let performance_score = weights.likes * likes.values[idx] / max_likes
                    + weights.comments * comments.values[idx] / max_comments
                    + weights.reach * reach.values[idx] / max_reach;
                RankedPost {
                    record: record.clone(),
                    predicted_likes: likes.values[idx],
                    predicted_comments: comments.values[idx],
                    predicted_reach: Some(reach.values[idx]),
                    performance_score,
                    sources: MetricSources {
                        likes: likes.source,
                        comments: comments.source,
                        reach: reach.source,
                    },
                }
            })
            .collect();

        // Stable sort keeps encounter order among equal scores.
        ranked.sort_by(|a, b| {
            b.performance_score
                .partial_cmp(&a.performance_score)
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(self.config.top_posts);
        Ok(ranked)
    }

    fn predict_metric(
        &self,
        target: Target,
        records: &[PostRecord],
        interactions: &[f64],
        predicted: Option<(&[f64], &[f64])>,
        rng: &mut StdRng,
    ) -> MetricPrediction {
        match self.model_for(target) {
            Some(model) => match self.run_model(model, interactions) {
                Ok(values) => MetricPrediction {
                    values,
                    source: PredictionSource::Model,
                },
                Err(err) => {
                    tracing::warn!(metric = target.label(), error = %err, "prediction failed, falling back");
                    self.fallback(target, records, rng)
                }
            },
            None => match (target, predicted) {
                (Target::Reach, Some((likes, comments))) => MetricPrediction {
                    values: likes
                        .iter()
                        .zip(comments)
                        .map(|(l, c)| l * 5.0 + c * 10.0)
                        .collect(),
                    source: PredictionSource::Approximated,
                },
                // Guard for callers without approximation inputs; rank
                // always derives reach from the likes and comments
                // predictions, so it never lands here.
                (Target::Reach, None) => MetricPrediction {
                    values: sample_lognormal(rng, 8.0, 1.0, records.len()),
                    source: PredictionSource::Synthetic,
                },
                _ => {
                    tracing::warn!(metric = target.label(), "model not found, using fallback");
                    self.fallback(target, records, rng)
                }
            },
        }
    }

    fn run_model(
        &self,
        model: &RegressionModel,
        interactions: &[f64],
    ) -> Result<Vec<f64>, AnalysisError> {
        let mut values = Vec::with_capacity(interactions.len());
        for interaction in interactions {
            values.push(model.predict(std::slice::from_ref(interaction))?);
        }
        // Heuristic: uniformly small predictions are in log1p space.
        // Raw-scale predictions routinely exceed the threshold.
        if values
            .iter()
            .all(|value| *value < self.config.log_scale_threshold)
        {
            for value in &mut values {
                *value = value.exp_m1();
            }
        }
        for value in &mut values {
            *value = value.max(0.0);
        }
        Ok(values)
    }

    /// Fall back to the records' own raw counts when the metric exists on
    /// the records, otherwise synthesize plausible positive values.
    fn fallback(&self, target: Target, records: &[PostRecord], rng: &mut StdRng) -> MetricPrediction {
        let raw = |record: &PostRecord| match target {
            Target::Likes => record.likes_count,
            Target::Comments => record.comments_count,
            Target::Reach => None,
        };
        if records.iter().any(|record| raw(record).is_some()) {
            MetricPrediction {
                values: records
                    .iter()
                    .map(|record| raw(record).unwrap_or(0) as f64)
                    .collect(),
                source: PredictionSource::RawValue,
            }
        } else {
            MetricPrediction {
                values: sample_lognormal(rng, 4.0, 1.0, records.len()),
                source: PredictionSource::Synthetic,
            }
        }
    }

    fn model_for(&self, target: Target) -> Option<&RegressionModel> {
        match target {
            Target::Likes => self.models.likes.as_ref(),
            Target::Comments => self.models.comments.as_ref(),
            Target::Reach => self.models.reach.as_ref(),
        }
    }
}

fn batch_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(1.0_f64, f64::max)
}

fn sample_lognormal(rng: &mut StdRng, location: f64, scale: f64, count: usize) -> Vec<f64> {
    match LogNormal::new(location, scale) {
        Ok(distribution) => (0..count).map(|_| distribution.sample(rng)).collect(),
        Err(_) => vec![0.0; count],
    }
}
