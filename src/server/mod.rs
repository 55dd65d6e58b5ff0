pub use self::error::ApiError;
use crate::stack::ImageStacker;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use reqwest::Client;
use serde::Deserialize;

mod error;

#[derive(Debug, Deserialize)]
struct StackRequest {
    images: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    client: Client,
    stacker: ImageStacker,
}

impl AppState {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            stacker: ImageStacker::new(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/stack-images",
            post(stack_images).fallback(method_not_allowed),
        )
        .with_state(state)
}

#[axum::debug_handler]
async fn stack_images(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    // Any body that isn't an object with an array of URL strings is rejected
    // before a single network call is made.
    let request: StackRequest = serde_json::from_slice(&body).map_err(|err| {
        log::debug!("Rejected request body: {err}");
        ApiError::BadRequest
    })?;

    if request.images.is_empty() {
        return Err(ApiError::BadRequest);
    }

    let png = state
        .stacker
        .stack(&request.images, &state.client)
        .await
        .map_err(|error| {
            log::error!("Failed to stack {} images: {error}", request.images.len());
            ApiError::Internal
        })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
