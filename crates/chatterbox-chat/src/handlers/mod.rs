//! API endpoint handlers.
//!
//! Each handler owns its [`Job`], runs the endpoint logic as a function
//! returning [`ApiResult<Reply>`], and hands the result to [`reply`], the
//! single place where errors become HTTP responses.

pub(crate) mod invites;
pub(crate) mod messages;
pub(crate) mod users;

use std::future::Future;
use std::sync::Arc;

use chatterbox_core::{Job, JobError};
use chatterbox_router::Captures;
use chatterbox_server::{handler_fn, Handler};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::ChatState;

pub(crate) const INVALID_BODY: &str = "Invalid body.";

/// Successful handler outcome.
#[derive(Debug)]
pub(crate) enum Reply {
    Json(StatusCode, serde_json::Value),
    NoContent,
}

impl Reply {
    pub(crate) fn ok<T: Serialize + ?Sized>(value: &T) -> ApiResult<Self> {
        serde_json::to_value(value)
            .map(|value| Self::Json(StatusCode::OK, value))
            .map_err(|e| ApiError::internal(format!("failed to serialise response: {e}")))
    }
}

/// Writes the outcome of a handler to its job.
pub(crate) fn reply(job: &mut Job, result: ApiResult<Reply>) {
    let written = match result {
        Ok(Reply::Json(status, value)) => job.respond_json(status, &value),
        Ok(Reply::NoContent) => {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            job.close_head(StatusCode::NO_CONTENT, headers)
        }
        Err(e) => {
            if e.is_server_error() {
                tracing::error!(error = %e, "request failed");
            } else {
                tracing::debug!(status = e.status().as_u16(), error = %e, "request rejected");
            }
            job.respond_json(
                e.status(),
                &serde_json::json!({ "message": e.client_message() }),
            )
        }
    };

    match written {
        Ok(()) => {}
        Err(e) if e.is_disconnected() => tracing::debug!("client went away before the reply"),
        Err(e) => tracing::error!(error = %e, "failed to write reply"),
    }
}

/// Reads a JSON request body; anything unreadable is an invalid body.
pub(crate) async fn read_json<T: DeserializeOwned>(job: &mut Job) -> ApiResult<T> {
    match job.read_json().await {
        Ok(value) => Ok(value),
        Err(JobError::Protocol(e)) => Err(ApiError::internal(e.to_string())),
        Err(e) => {
            tracing::debug!(error = %e, "unreadable request body");
            Err(ApiError::validation(INVALID_BODY))
        }
    }
}

/// Binds a handler function to the shared state.
pub(crate) fn bind<F, Fut>(state: &Arc<ChatState>, f: F) -> Handler
where
    F: Fn(Arc<ChatState>, Job, Captures) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let state = Arc::clone(state);
    handler_fn(move |job, captures| f(Arc::clone(&state), job, captures))
}
