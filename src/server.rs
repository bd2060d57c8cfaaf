use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use blog_insights::config::AppConfig;
use blog_insights::export::{self, CsvSection};

use crate::api::{
    run_analysis, ApiAnalyzeRequest, ApiExportRequest, ApiGenerateRequest, ApiInsightsResponse,
    ApiTopicIdeasResponse, ReportEnvelope, RunError,
};
use crate::llm::LlmClient;

#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn router(config: AppConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/generate-insights", post(insights_handler))
        .route("/api/generate-topic-ideas", post(topic_ideas_handler))
        .route("/api/export", post(export_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(args: crate::ServeArgs, config: AppConfig) -> Result<(), String> {
    let app = router(config);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiAnalyzeRequest>,
) -> Result<Json<ReportEnvelope>, ApiError> {
    let envelope = run_analysis(&state.config, request.into_job())
        .await
        .map_err(|err| {
            let status = match err {
                RunError::BadRequest(_) => StatusCode::BAD_REQUEST,
                RunError::Upstream(_) => StatusCode::BAD_GATEWAY,
                RunError::NoData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            };
            api_error(status, err.to_string())
        })?;
    Ok(Json(envelope))
}

async fn insights_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiGenerateRequest>,
) -> Result<Json<ApiInsightsResponse>, ApiError> {
    let data = request
        .analysis_data(&state.config)
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, err))?;
    let client = llm_client(&state.config, request.llm_provider.as_deref())?;
    let insights = client
        .generate_insights(&data)
        .await
        .map_err(|err| api_error(StatusCode::BAD_GATEWAY, err))?;
    Ok(Json(ApiInsightsResponse {
        llm_provider: client.provider().label().to_string(),
        insights,
    }))
}

async fn topic_ideas_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiGenerateRequest>,
) -> Result<Json<ApiTopicIdeasResponse>, ApiError> {
    let data = request
        .analysis_data(&state.config)
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, err))?;
    let client = llm_client(&state.config, request.llm_provider.as_deref())?;
    let count = request.count.unwrap_or(state.config.llm.topic_ideas).clamp(1, 20);
    let topic_ideas = client
        .generate_topic_ideas(&data, count)
        .await
        .map_err(|err| api_error(StatusCode::BAD_GATEWAY, err))?;
    Ok(Json(ApiTopicIdeasResponse {
        llm_provider: client.provider().label().to_string(),
        topic_ideas,
    }))
}

async fn export_handler(Json(request): Json<ApiExportRequest>) -> Result<Response, ApiError> {
    let format = request.format.as_deref().unwrap_or("json").to_lowercase();
    match format.as_str() {
        "json" => {
            let body = export::to_json(&request.report)
                .map_err(|err| api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
            Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
        }
        "csv" => {
            let section = CsvSection::from_str(request.section.as_deref().unwrap_or("tags"))
                .map_err(|err| api_error(StatusCode::BAD_REQUEST, err.to_string()))?;
            let body = export::to_csv(&request.report, section);
            Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
        }
        other => Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("unsupported export format: {}", other),
        )),
    }
}

fn llm_client(config: &AppConfig, provider: Option<&str>) -> Result<LlmClient, ApiError> {
    match LlmClient::from_config(&config.llm, provider) {
        Ok(Some(client)) => Ok(client),
        Ok(None) => Err(api_error(
            StatusCode::BAD_REQUEST,
            "LLM provider is disabled",
        )),
        Err(err) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, err)),
    }
}
