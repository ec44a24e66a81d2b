use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use common::config::{Config, ServiceConfig};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use serde_json::Value;
use std::{sync::Arc, time::Instant};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::ScoringError,
    model::{
        deserialize_customer_id, GenericError, PredictionResponse, ScoreAndNotifyResponse, ScoredPrediction,
        UpdateRecord,
    },
    notifier::Notifier,
    predictor::Predictor,
    scorers::ModelStatus,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "target/debug/config/total_config.yaml")]
    pub config: String,
}

/// Loads `.env`, parses arguments, reads the config file and applies
/// environment overrides.
pub fn initialize_executable() -> Result<Config, GenericError> {
    match dotenvy::dotenv() {
        Ok(path) => println!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let args = Args::parse();
    println!("Loading config from: {}", args.config);
    let mut config = Config::load(&args.config)?;
    config.apply_env_overrides()?;

    Ok(config)
}

/// `RUST_LOG` wins over the configured level when set.
pub fn initialize_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Tracing already initialized: {}", e);
    }
}

pub fn install_metrics_recorder() -> Result<PrometheusHandle, GenericError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Predictor>,
    notifier: Notifier,
    started_at: DateTime<Utc>,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(predictor: Predictor, notifier: Notifier) -> Self {
        Self {
            predictor: Arc::new(predictor),
            notifier,
            started_at: Utc::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }
}

pub fn build_router(state: AppState, cors_origin: Option<&str>) -> Router {
    let mut app = Router::new()
        .route("/predict", post(predict))
        .route("/predict-and-update", post(predict_and_update))
        .route("/update-churn", post(update_churn))
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = cors_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_methods(Any)
                        .allow_headers(Any),
                );
            }
            Err(e) => tracing::warn!(error = %e, origin, "Ignoring invalid CORS origin"),
        }
    }

    app.with_state(state)
}

pub async fn run_service(config: &ServiceConfig, state: AppState) -> Result<(), GenericError> {
    let app = build_router(state, config.cors_origin.as_deref());

    tracing::info!("Starting scoring service at {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Scoring service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for ScoringError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScoringError::Validation { .. } => StatusCode::BAD_REQUEST,
            ScoringError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ScoringError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
            field: self.field().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ScoringError {
    ScoringError::validation("body", rejection.body_text())
}

/// Error response for the prediction endpoints, counted per error kind.
fn prediction_error(error: ScoringError) -> Response {
    metrics::counter!("churn_prediction_errors_total", "kind" => error.kind().to_string()).increment(1);
    error.into_response()
}

fn score(predictor: &Predictor, body: &Value) -> Result<ScoredPrediction, ScoringError> {
    let started = Instant::now();
    let result = predictor.predict(body);
    metrics::histogram!("churn_prediction_seconds").record(started.elapsed().as_secs_f64());

    if let Ok(prediction) = &result {
        metrics::counter!("churn_predictions_total", "level" => prediction.label.clone()).increment(1);
    }
    result
}

/// Optional free-text insight under `insight` or its `gpt_insight` alias.
fn insight_field(body: &Value) -> Result<Option<String>, ScoringError> {
    let (field, raw) = match (body.get("insight"), body.get("gpt_insight")) {
        (Some(raw), _) => ("insight", raw),
        (None, Some(raw)) => ("gpt_insight", raw),
        (None, None) => return Ok(None),
    };
    match raw {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        _ => Err(ScoringError::validation(field, "expected a string")),
    }
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return prediction_error(rejection_to_error(rejection)),
    };

    match score(&state.predictor, &body) {
        Ok(prediction) => {
            tracing::info!(
                probability = prediction.probability,
                risk_level = %prediction.label,
                "Prediction served"
            );
            (StatusCode::OK, Json(PredictionResponse::from(&prediction))).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, kind = %e.kind(), "Prediction failed");
            prediction_error(e)
        }
    }
}

pub async fn update_churn(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRecord>, JsonRejection>,
) -> Response {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => return rejection_to_error(rejection).into_response(),
    };
    if let Err(e) = record.validate() {
        return e.into_response();
    }

    tracing::info!(customer_id = %record.customer_id, risk_level = %record.risk_level, "Forwarding churn update");
    let response = state.notifier.notify(&record).await;
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn predict_and_update(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return prediction_error(rejection_to_error(rejection)),
    };
    if !body.is_object() {
        return prediction_error(ScoringError::validation("body", "expected a JSON object"));
    }

    let customer_id = match body.get("customer_id") {
        None | Some(Value::Null) => {
            return prediction_error(ScoringError::validation("customer_id", "missing required field"));
        }
        Some(raw) => match deserialize_customer_id(raw.clone()) {
            Ok(id) => id,
            Err(e) => return prediction_error(ScoringError::validation("customer_id", e.to_string())),
        },
    };
    let insight = match insight_field(&body) {
        Ok(insight) => insight,
        Err(e) => return prediction_error(e),
    };

    let prediction = match score(&state.predictor, &body) {
        Ok(prediction) => prediction,
        Err(e) => {
            tracing::warn!(error = %e, customer_id = %customer_id, "Prediction failed, nothing forwarded");
            return prediction_error(e);
        }
    };

    let record = UpdateRecord::from_prediction(customer_id, &prediction, insight);
    let notification = state.notifier.notify(&record).await;

    let response = ScoreAndNotifyResponse {
        risk_score: record.risk_score,
        risk_level: record.risk_level,
        notification,
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[derive(Debug, Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    #[serde(flatten)]
    model: ModelStatus,
    schema: &'a str,
    notifier_enabled: bool,
    started_at: DateTime<Utc>,
}

/// Always 200 so liveness probes keep a degraded instance up for diagnosis;
/// `status` reports whether the model is usable.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let body = HealthResponse {
        status: if state.predictor.is_ready() { "ok" } else { "degraded" },
        model: state.predictor.model_status(),
        schema: state.predictor.schema().name(),
        notifier_enabled: state.notifier.is_enabled(),
        started_at: state.started_at,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
