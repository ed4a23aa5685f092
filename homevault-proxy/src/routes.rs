//! HTTP routes and handlers.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router, middleware};
use chrono::Utc;
use homevault_types::AskRequest;
use serde::de::DeserializeOwned;

use crate::error::ProxyError;
use crate::gateway::GatewayClient;
use crate::types::{IdentifyImageRequest, Suggestions};

/// Path of the streaming question endpoint.
pub const ASK_ASSISTANT_PATH: &str = "/functions/v1/ask-assistant";

/// Path of the photo identification endpoint.
pub const IDENTIFY_IMAGE_PATH: &str = "/functions/v1/identify-image";

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type, x-supabase-client-platform, x-supabase-client-platform-version, x-supabase-client-runtime, x-supabase-client-runtime-version";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayClient>,
}

impl AppState {
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

/// Build the proxy router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ASK_ASSISTANT_PATH, post(ask_assistant).options(preflight))
        .route(IDENTIFY_IMAGE_PATH, post(identify_image).options(preflight))
        .layer(middleware::map_response(with_cors))
        .with_state(state)
}

async fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ProxyError> {
    serde_json::from_slice(body).map_err(|e| ProxyError::BadRequest(e.to_string()))
}

async fn ask_assistant(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let request: AskRequest = parse_body(&body)?;
    tracing::debug!(items = request.items.len(), "ask-assistant request");

    let today = Utc::now().date_naive();
    let upstream = state.gateway.stream_answer(&request, today).await?;

    Ok((
        [(CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// Failures other than 429/402 answer with an empty suggestion list.
async fn identify_image(State(state): State<AppState>, body: Bytes) -> Response {
    match suggest_names(&state, &body).await {
        Ok(suggestions) => Json(Suggestions { suggestions }).into_response(),
        Err(ProxyError::Upstream { status }) => {
            tracing::warn!(status, "identify failed upstream, returning no suggestions");
            Json(Suggestions::default()).into_response()
        }
        Err(e @ (ProxyError::RateLimited | ProxyError::PaymentRequired)) => e.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "identify-image failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Suggestions::default())).into_response()
        }
    }
}

async fn suggest_names(state: &AppState, body: &Bytes) -> Result<Vec<String>, ProxyError> {
    let request: IdentifyImageRequest = parse_body(body)?;
    tracing::debug!(bytes = request.image_base64.len(), "identify-image request");
    state
        .gateway
        .suggest_names(&request.image_base64, request.mime_type.as_deref())
        .await
}
