use thiserror::Error;

/// Failure classes the analytics pipeline can surface to a caller.
///
/// Per-metric prediction failures never appear here; the performance
/// ranker absorbs them via fallbacks and records the source instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0} models not available")]
    ModelsUnavailable(&'static str),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingData(Vec<String>),

    #[error("no data available")]
    NoData,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}
