//! Pre-trained model artifacts and the store that loads them at startup.
//!
//! Artifacts are JSON exports of fitted regressors (intercept plus
//! coefficients) and of the feature scaler (per-column center and scale).
//! They are immutable after load and shared read-only between in-flight
//! requests. A missing artifact degrades the matching capability instead
//! of failing the process.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ModelConfig;
use crate::error::AnalysisError;

/// A pre-trained linear regressor bound to one target metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl RegressionModel {
    pub fn predict(&self, features: &[f64]) -> Result<f64, AnalysisError> {
        if features.len() != self.coefficients.len() {
            return Err(AnalysisError::Internal(format!(
                "feature width {} does not match model width {}",
                features.len(),
                self.coefficients.len()
            )));
        }
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }
}

/// A fitted robust scaler: `(x - center) / scale` per column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        if row.len() != self.center.len() || row.len() != self.scale.len() {
            return Err(AnalysisError::Internal(format!(
                "feature width {} does not match scaler width {}",
                row.len(),
                self.center.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.center.iter().zip(&self.scale))
            .map(|(x, (center, scale))| {
                if *scale == 0.0 {
                    x - center
                } else {
                    (x - center) / scale
                }
            })
            .collect())
    }
}

/// Models backing the next-post-type recommendation.
#[derive(Debug, Clone, Default)]
pub struct EngagementModels {
    pub likes: Option<RegressionModel>,
    pub comments: Option<RegressionModel>,
    pub scaler: Option<FeatureScaler>,
}

impl EngagementModels {
    pub fn is_ready(&self) -> bool {
        self.likes.is_some() && self.comments.is_some() && self.scaler.is_some()
    }

    pub fn loaded_targets(&self) -> Vec<&'static str> {
        let mut targets = Vec::new();
        if self.likes.is_some() {
            targets.push("likesCount");
        }
        if self.comments.is_some() {
            targets.push("commentsCount");
        }
        targets
    }
}

/// Models backing the top-posts ranking, one per target metric.
#[derive(Debug, Clone, Default)]
pub struct PerformanceModels {
    pub likes: Option<RegressionModel>,
    pub comments: Option<RegressionModel>,
    pub reach: Option<RegressionModel>,
}

impl PerformanceModels {
    pub fn is_empty(&self) -> bool {
        self.likes.is_none() && self.comments.is_none() && self.reach.is_none()
    }

    pub fn loaded_targets(&self) -> Vec<&'static str> {
        let mut targets = Vec::new();
        if self.likes.is_some() {
            targets.push("likesCount");
        }
        if self.comments.is_some() {
            targets.push("commentsCount");
        }
        if self.reach.is_some() {
            targets.push("reach");
        }
        targets
    }
}

/// All model artifacts, loaded once at process start.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    pub engagement: EngagementModels,
    pub performance: PerformanceModels,
}

impl ModelStore {
    /// Load every artifact the config points at. Absent or unreadable
    /// artifacts are logged and skipped; the matching operation later
    /// reports an unavailable-capability error instead.
    pub fn load(config: &ModelConfig) -> Self {
        let engagement_dir = config.engagement_dir.as_path();
        let engagement = EngagementModels {
            likes: load_artifact(engagement_dir, "likes_model.json"),
            comments: load_artifact(engagement_dir, "comments_model.json"),
            scaler: load_artifact(engagement_dir, "features_scaler.json"),
        };
        if engagement.is_ready() {
            tracing::info!("engagement prediction models loaded");
        } else {
            tracing::warn!(
                dir = %engagement_dir.display(),
                "engagement models incomplete; recommendation will be unavailable"
            );
        }

        let performance_dir = config.performance_dir.as_path();
        let performance = PerformanceModels {
            likes: load_artifact(performance_dir, "likes_model.json"),
            comments: load_artifact(performance_dir, "comments_model.json"),
            reach: load_artifact(performance_dir, "reach_model.json"),
        };
        if performance.is_empty() {
            tracing::warn!(
                dir = %performance_dir.display(),
                "no performance models; top-posts ranking will be unavailable"
            );
        } else if performance.reach.is_none() {
            tracing::info!("reach model not found, will use approximation");
        } else {
            tracing::info!("performance ranking models loaded");
        }

        Self {
            engagement,
            performance,
        }
    }
}

fn load_artifact<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> Option<T> {
    let path = dir.join(name);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "model artifact not loaded");
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(artifact) => Some(artifact),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "model artifact not parsed");
            None
        }
    }
}
