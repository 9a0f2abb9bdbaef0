use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::error::GatewayError;
use crate::handlers::advisor::{decode_image, fingerprint};
use crate::handlers::AdvisorHandler;
use crate::models::{ChatPayload, Envelope, GeneratePayload, GeneratedAdvice, ProcessPayload, Scenario};

pub mod cors;

use cors::CorsPolicy;

pub struct AppState {
    pub advisor: Arc<AdvisorHandler>,
}

pub fn create_router(advisor: Arc<AdvisorHandler>, policy: CorsPolicy, max_body_bytes: usize) -> Router {
    let state = Arc::new(AppState { advisor });

    Router::new()
        .route("/", post(chat_handler).fallback(method_not_allowed))
        .route("/chat", post(chat_handler).fallback(method_not_allowed))
        .route("/process", post(process_handler).fallback(method_not_allowed))
        .route("/generate", post(generate_handler).fallback(method_not_allowed))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(Arc::new(policy), cors::cors))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
}

fn bad_body(rejection: JsonRejection) -> GatewayError {
    log::warn!("⚠️ Rejecting request body: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return GatewayError::PayloadTooLarge(rejection.body_text());
    }
    GatewayError::InvalidBody(rejection.body_text())
}

/// Gateway: image + scenario in, advice + analysis out.
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection).into_response(),
    };

    match state.advisor.advise(payload).await {
        Ok(result) => (StatusCode::OK, Json(Envelope::ok(result))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Collaborator endpoints report the hop's own error, without the gateway prefix.
fn collaborator_failure(err: GatewayError) -> Response {
    let status = err.status();
    let message = match err {
        GatewayError::Analysis(inner) => inner.to_string(),
        GatewayError::Generation(inner) => inner.to_string(),
        other => other.to_string(),
    };
    (status, Json(Envelope::<()>::failure(message))).into_response()
}

async fn process_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => return collaborator_failure(bad_body(rejection)),
    };

    let image = match payload.image_data.as_deref().map(str::trim) {
        Some(data) if !data.is_empty() => match decode_image(data) {
            Ok(image) => image,
            Err(e) => return collaborator_failure(e),
        },
        _ => return collaborator_failure(GatewayError::MissingField("image_data")),
    };

    match state.advisor.analyze(&image, &fingerprint(&image)).await {
        Ok(analysis) => (StatusCode::OK, Json(Envelope::ok(analysis))).into_response(),
        Err(e) => collaborator_failure(e),
    }
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GeneratePayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => return collaborator_failure(bad_body(rejection)),
    };

    let scenario = match payload.scenario.filter(|s| !s.trim().is_empty()) {
        Some(s) => Scenario::from(s),
        None => return collaborator_failure(GatewayError::MissingField("scenario")),
    };

    match state
        .advisor
        .advice_for(&scenario, &payload.image_analysis, payload.context.as_deref())
        .await
    {
        Ok(advice) => (StatusCode::OK, Json(Envelope::ok(GeneratedAdvice { advice }))).into_response(),
        Err(e) => collaborator_failure(e),
    }
}

async fn method_not_allowed() -> Response {
    GatewayError::MethodNotAllowed.into_response()
}

async fn health_check() -> &'static str {
    "OK"
}
