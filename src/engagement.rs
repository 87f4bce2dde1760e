//! Next-post-type recommendation from the engagement models.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::engagement_matrix;
use crate::models::EngagementModels;
use crate::PostRecord;

/// Expected engagement for one candidate post type. Values are truncated
/// to whole counts, matching the contract of the recommendation output.
#[derive(Debug, Clone, Serialize)]
pub struct PostTypeRecommendation {
    pub post_type: String,
    pub expected_average_likes: i64,
    pub expected_average_comments: i64,
    pub engagement_score: i64,
}

pub struct EngagementPredictor<'a> {
    models: &'a EngagementModels,
    config: &'a AnalysisConfig,
}

impl<'a> EngagementPredictor<'a> {
    pub fn new(models: &'a EngagementModels, config: &'a AnalysisConfig) -> Self {
        Self { models, config }
    }

    /// Rank candidate post types by expected engagement, descending.
    ///
    /// Requires the fitted scaler and both per-metric models; anything
    /// missing is an unavailable-capability error, never a partial
    /// computation. A candidate type with no matching records scores
    /// zeros rather than erroring.
    pub fn recommend(
        &self,
        records: &[PostRecord],
    ) -> Result<Vec<PostTypeRecommendation>, AnalysisError> {
        let (Some(likes_model), Some(comments_model), Some(scaler)) = (
            self.models.likes.as_ref(),
            self.models.comments.as_ref(),
            self.models.scaler.as_ref(),
        ) else {
            return Err(AnalysisError::ModelsUnavailable("engagement prediction"));
        };

        let features = engagement_matrix(records);
        let mut likes_predictions = Vec::with_capacity(records.len());
        let mut comments_predictions = Vec::with_capacity(records.len());
        for row in &features {
            let scaled = scaler.transform_row(&row.columns())?;
            // Both models were trained against log1p targets.
            likes_predictions.push(likes_model.predict(&scaled)?.exp_m1());
            comments_predictions.push(comments_model.predict(&scaled)?.exp_m1());
        }

        let mut recommendations: Vec<PostTypeRecommendation> = self
            .candidate_types(records)
            .into_iter()
            .map(|post_type| {
                let indices: Vec<usize> = records
                    .iter()
                    .enumerate()
                    .filter(|(_, record)| record.post_type.as_deref() == Some(post_type.as_str()))
                    .map(|(idx, _)| idx)
                    .collect();

                let avg_likes = mean_at(&likes_predictions, &indices);
                let avg_comments = mean_at(&comments_predictions, &indices);
                let engagement_score = avg_likes + avg_comments * self.config.comments_weight;

                PostTypeRecommendation {
                    post_type,
                    expected_average_likes: avg_likes as i64,
                    expected_average_comments: avg_comments as i64,
                    engagement_score: engagement_score as i64,
                }
            })
            .collect();

        recommendations.sort_by(|a, b| b.engagement_score.cmp(&a.engagement_score));

        Ok(recommendations)
    }

    /// Distinct post types in encounter order, or the configured
    /// candidate set when no record carries a type.
    fn candidate_types(&self, records: &[PostRecord]) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for record in records {
            if let Some(post_type) = record.post_type.as_deref() {
                if !types.iter().any(|known| known == post_type) {
                    types.push(post_type.to_string());
                }
            }
        }
        if types.is_empty() {
            types = self.config.default_post_types.clone();
        }
        types
    }
}

fn mean_at(values: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let total: f64 = indices.iter().map(|&idx| values[idx]).sum();
    total / indices.len() as f64
}
