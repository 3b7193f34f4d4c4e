//! HTTP surface: `POST /plan-trip` and `GET /health`.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    config::ServerConfig,
    core::TripPlanner,
    error::{PlannerError, Result},
    types::ItineraryRequest,
};

#[derive(Clone, Debug)]
pub struct AppState {
    planner: Arc<TripPlanner>,
}

#[derive(Debug, Deserialize)]
struct PlanTripBody {
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    configured: bool,
}

pub fn build_router(planner: Arc<TripPlanner>, config: &ServerConfig) -> Router {
    let state = AppState { planner };

    Router::new()
        .route("/health", get(health))
        .route("/plan-trip", post(plan_trip))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(planner: Arc<TripPlanner>, config: &ServerConfig) -> std::io::Result<()> {
    let bind = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(
        bind = %bind,
        configured = planner.is_configured(),
        "trip planner listening"
    );

    axum::serve(listener, build_router(planner, config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            configured: state.planner.is_configured(),
        }),
    )
}

async fn plan_trip(State(state): State<AppState>, request: Request) -> Response {
    let itinerary_request = match read_plan_request(&state, request).await {
        Ok(itinerary_request) => itinerary_request,
        Err(err) => return error_response(&err),
    };

    match state.planner.plan_trip(itinerary_request).await {
        Ok(itinerary) => (StatusCode::OK, Json(itinerary)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Accepts the browser's `multipart/form-data` upload or a JSON `{prompt}` body.
async fn read_plan_request(state: &AppState, request: Request) -> Result<ItineraryRequest> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|rejection| PlannerError::InvalidRequest(rejection.body_text()))?;
        return read_multipart(multipart).await;
    }

    let Json(body) = Json::<PlanTripBody>::from_request(request, state)
        .await
        .map_err(|rejection| PlannerError::InvalidRequest(rejection.body_text()))?;
    ItineraryRequest::new(body.prompt.unwrap_or_default())
}

async fn read_multipart(mut multipart: Multipart) -> Result<ItineraryRequest> {
    let mut prompt = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PlannerError::InvalidRequest(err.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("prompt") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| PlannerError::InvalidRequest(err.body_text()))?;
                prompt = Some(text);
            }
            Some("image") => {
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| PlannerError::InvalidRequest(err.body_text()))?;
                if !bytes.is_empty() {
                    image = Some((bytes.to_vec(), mime_type));
                }
            }
            _ => {}
        }
    }

    let request = ItineraryRequest::new(prompt.unwrap_or_default())?;
    Ok(match image {
        Some((bytes, mime_type)) => request.with_image(bytes, mime_type),
        None => request,
    })
}

fn error_response(err: &PlannerError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(code = err.error_code(), status = status.as_u16(), error = %err, "plan-trip failed");
    } else {
        warn!(code = err.error_code(), status = status.as_u16(), error = %err, "plan-trip rejected");
    }

    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}
