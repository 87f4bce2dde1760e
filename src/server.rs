use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};

use postlens::clustering::PostingTimeClusterer;
use postlens::config::AppConfig;
use postlens::engagement::EngagementPredictor;
use postlens::error::AnalysisError;
use postlens::models::ModelStore;
use postlens::performance::PerformanceRanker;
use postlens::PostRecord;

use crate::api::{
    health_response, AnalysisRequest, CollectionsResponse, HealthResponse, PostingTimeResponse,
    RecommendResponse, TopPostsResponse,
};
use crate::report;
use crate::storage::StorageClient;

#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
    models: Arc<ModelStore>,
    storage: StorageClient,
}

type ApiError = (StatusCode, String);

pub async fn serve(args: crate::ServeArgs) -> Result<(), String> {
    let (config, config_path) = AppConfig::load(args.config)?;
    if let Some(path) = config_path {
        tracing::info!(path = %path.display(), "configuration loaded");
    }

    let models = ModelStore::load(&config.models);
    let storage = StorageClient::from_config(&config.storage)?;
    let state = AppState {
        config: Arc::new(config),
        models: Arc::new(models),
        storage,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/collections", get(collections))
        .route("/recommend", post(recommend))
        .route("/top5_posts", post(top5_posts))
        .route("/posting_time", post(posting_time))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    tracing::info!(%addr, "listening");

    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_response(&state.models))
}

async fn collections(State(state): State<AppState>) -> Result<Json<CollectionsResponse>, ApiError> {
    let collections = state
        .storage
        .list_collections()
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err))?;
    Ok(Json(CollectionsResponse { collections }))
}

async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    if !state.models.engagement.is_ready() {
        return Err(analysis_error(&AnalysisError::ModelsUnavailable(
            "engagement prediction",
        )));
    }
    let records = fetch_records(&state, &request).await?;
    tracing::info!(count = records.len(), "computing recommendation");

    let models = Arc::clone(&state.models);
    let config = Arc::clone(&state.config);
    let recommendations = run_blocking(move || {
        EngagementPredictor::new(&models.engagement, &config.analysis).recommend(&records)
    })
    .await?;

    Ok(Json(RecommendResponse::from_recommendations(
        recommendations,
    )))
}

async fn top5_posts(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<TopPostsResponse>, ApiError> {
    if state.models.performance.is_empty() {
        return Err(analysis_error(&AnalysisError::ModelsUnavailable(
            "performance ranking",
        )));
    }
    let records = fetch_records(&state, &request).await?;
    tracing::info!(count = records.len(), "ranking posts");

    let models = Arc::clone(&state.models);
    let config = Arc::clone(&state.config);
    let ranked = run_blocking(move || {
        PerformanceRanker::new(&models.performance, &config.analysis).rank(&records)
    })
    .await?;

    Ok(Json(TopPostsResponse::from_ranked(ranked)))
}

async fn posting_time(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<PostingTimeResponse>, ApiError> {
    let Some(collection) = request.collection_name.as_deref().map(str::trim) else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Collection name is required".to_string(),
        ));
    };
    if collection.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Collection name is required".to_string(),
        ));
    }

    let records = state
        .storage
        .fetch(collection)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err))?;
    if records.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No data found in collection: {}", collection),
        ));
    }
    let analyzed = records.len();
    tracing::info!(count = analyzed, "analyzing posting times");

    let config = Arc::clone(&state.config);
    let outcome = run_blocking(move || {
        let outcome = PostingTimeClusterer::new(&config.clustering).analyze(&records)?;
        if config.export.enabled {
            match report::write_csv(&outcome.table, &config.export.dir) {
                Ok(path) => tracing::info!(path = %path.display(), "cluster table exported"),
                Err(err) => tracing::warn!(error = %err, "cluster table export failed"),
            }
        }
        Ok(outcome)
    })
    .await?;

    Ok(Json(PostingTimeResponse {
        status: "success",
        message: format!("Analyzed {} posts", analyzed),
        best_peak_posting_times: outcome.peak_times,
    }))
}

async fn fetch_records(
    state: &AppState,
    request: &AnalysisRequest,
) -> Result<Vec<PostRecord>, ApiError> {
    let Some(collection) = request.collection() else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Missing collection identifier. Please provide either container_id or collection_name"
                .to_string(),
        ));
    };

    let records = state
        .storage
        .fetch(collection)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err))?;
    if records.is_empty() {
        return Err(analysis_error(&AnalysisError::NoData));
    }
    Ok(records)
}

/// The analytics core is CPU-bound and synchronous; run it off the
/// request executor so in-flight requests keep being served.
async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("analysis task failed: {}", err),
            )
        })?
        .map_err(|err| analysis_error(&err))
}

fn analysis_error(err: &AnalysisError) -> ApiError {
    let status = match err {
        AnalysisError::ModelsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::MissingData(_) | AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AnalysisError::NoData => StatusCode::NOT_FOUND,
        AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "analysis failed");
    }
    (status, err.to_string())
}
