use crate::api_errors::ApiError;
use crate::app_state::AppState;
use crate::model::ModelInfo;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResponse {
    pub prediction: f64,
}

/// Build the service router: prediction, model metadata and health
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/model", get(model_info))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        // Any origin, method and header; the request origin is mirrored so credentials work
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn predict(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<ForecastInput>, JsonRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let outcome = match payload {
        Ok(Json(input)) => st.predictor.predict(input.features).await,
        Err(rejection) => Err(ApiError::from(rejection)),
    };

    match outcome {
        Ok(prediction) => {
            debug!(prediction, "Prediction served");
            Ok(Json(ForecastResponse { prediction }))
        }
        Err(err) => {
            warn!(error = %err, "Prediction rejected");
            Err(err)
        }
    }
}

async fn model_info(State(st): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(st.predictor.info().clone())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Serve `app` on `listener` until Ctrl-C
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
