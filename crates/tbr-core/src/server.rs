//! Read-only registry HTTP handler.
//!
//! The server knows nothing about the registry protocol. A request path is
//! taken as a bucket key and the object stored there is streamed back with
//! its recorded content type. The documents the publisher writes already
//! sit at the paths Terraform asks for, so that is all a registry needs.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use tracing::{error, info};

use crate::store::ObjectStore;

/// Shared handler state: the bucket being served.
#[derive(Debug, Clone)]
pub struct RegistryState {
    store: Arc<dyn ObjectStore>,
}

impl RegistryState {
    /// State serving `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

/// Router answering every request from `store`.
pub fn router(store: Arc<dyn ObjectStore>) -> Router {
    Router::new()
        .fallback(serve_object)
        .with_state(RegistryState::new(store))
}

async fn serve_object(State(state): State<RegistryState>, uri: Uri) -> Response {
    let (status, response) = match state.store.open(uri.path()).await {
        Ok(object) => {
            let request_uri = uri.clone();
            let body = object.body.inspect_err(move |err| {
                error!(request_uri = %request_uri, error = %err, "response stream aborted");
            });
            (
                StatusCode::OK,
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, object.content_type)],
                    Body::from_stream(body),
                )
                    .into_response(),
            )
        }
        Err(err) if err.is_not_found() => (
            StatusCode::NOT_FOUND,
            (StatusCode::NOT_FOUND, "Not Found").into_response(),
        ),
        Err(err) => {
            error!(request_uri = %uri, error = %err, "bucket read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
            )
        }
    };

    info!(
        request_uri = %uri,
        handler = "bucket",
        status = status.as_u16(),
        "finished response"
    );
    response
}
