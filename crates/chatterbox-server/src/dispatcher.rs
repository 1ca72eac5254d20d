//! Request dispatch.
//!
//! The [`Dispatcher`] turns a transport request into a [`Job`], runs routing
//! and the matched handler on their own task, and hands back a response as
//! soon as the handler writes its head. The body then streams from the
//! handler while it keeps running.
//!
//! # Fallback responses
//!
//! | Condition | Status |
//! |---|---|
//! | request target does not decode | `501` |
//! | no endpoint matches the path | `404` |
//! | endpoint lacks the method | `405` with `Allow` |
//! | `OPTIONS` without an explicit handler | `204` with `Allow` and CORS headers |
//! | handler ends without a head | `500` |
//! | no head before the request deadline | `504` |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chatterbox_core::{BoxError, Job, JobBody, JobError};
use chatterbox_router::{MethodOutcome, Router};
use chatterbox_telemetry::metrics::{record_request, InFlightGuard};
use http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use hyper::body::Body;
use tokio::time::Instant;

use crate::config::{CorsPolicy, ServerConfig};
use crate::handler::Handler;
use crate::routes::Routes;

const INTERNAL_ERROR: &str = "Internal server error.";

/// Headers for responses the dispatcher synthesizes for an endpoint.
#[derive(Debug)]
struct SynthesizedHeaders {
    options: HeaderMap,
    not_allowed: HeaderMap,
}

impl SynthesizedHeaders {
    fn new(allow: &str, cors: &CorsPolicy) -> Self {
        let mut options = HeaderMap::new();
        match HeaderValue::from_str(allow) {
            Ok(value) => {
                options.insert(ALLOW, value);
            }
            Err(_) => tracing::warn!(allow, "endpoint has an unrepresentable Allow header"),
        }

        let mut not_allowed = options.clone();
        not_allowed.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));

        // 204 responses carry no Content-Length.
        cors.apply(&mut options);
        Self {
            options,
            not_allowed,
        }
    }
}

/// Routes requests to endpoint handlers.
///
/// Built once from a [`Routes`] table and shared through an `Arc`.
pub struct Dispatcher {
    router: Router<Handler>,
    synthesized: HashMap<String, SynthesizedHeaders>,
    request_deadline: Duration,
    max_body_bytes: usize,
}

impl Dispatcher {
    /// Freezes `routes` and precomputes the `OPTIONS` and `405` headers of
    /// every endpoint.
    #[must_use]
    pub fn new(routes: Routes, config: &ServerConfig) -> Self {
        let router = routes.into_router();
        let mut synthesized = HashMap::new();
        for endpoint in router.iter() {
            synthesized
                .entry(endpoint.allow().to_string())
                .or_insert_with(|| SynthesizedHeaders::new(endpoint.allow(), config.cors()));
        }

        Self {
            router,
            synthesized,
            request_deadline: config.request_deadline(),
            max_body_bytes: config.max_body_bytes(),
        }
    }

    /// Returns the endpoint table.
    #[must_use]
    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn request_deadline(&self) -> Duration {
        self.request_deadline
    }

    /// Dispatches one request and waits for its response head.
    ///
    /// The handler keeps running after this returns; the response body
    /// streams whatever it writes until it closes the body or the deadline
    /// passes.
    pub async fn dispatch<B>(self: &Arc<Self>, request: Request<B>) -> Response<JobBody>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let method = request.method().clone();
        let target = request.uri().path().to_string();
        tracing::debug!(http.method = %method, http.path = %target, "request");

        let response = match Job::from_request(request, self.max_body_bytes) {
            Ok((job, pending)) => {
                let deadline = started + self.request_deadline;
                let dispatcher = Arc::clone(self);
                tokio::spawn(async move {
                    let _in_flight = InFlightGuard::new();
                    if tokio::time::timeout_at(deadline, dispatcher.route(job))
                        .await
                        .is_err()
                    {
                        tracing::debug!("handler cancelled at request deadline");
                    }
                });

                match tokio::time::timeout_at(deadline, pending.into_response()).await {
                    Ok(Ok(response)) => response,
                    // The handler task shares the deadline and may drop its
                    // job just before this timer fires.
                    Ok(Err(JobError::Abandoned)) if Instant::now() >= deadline => {
                        self.timed_out(&method, &target)
                    }
                    Ok(Err(JobError::Abandoned)) => {
                        tracing::warn!(
                            http.method = %method,
                            http.path = %target,
                            "job dropped without a response head"
                        );
                        message_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
                    }
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "failed to receive response head");
                        message_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
                    }
                    Err(_) => self.timed_out(&method, &target),
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "unroutable request");
                message_response(StatusCode::NOT_IMPLEMENTED, "Not implemented.")
            }
        };

        record_request(method.as_str(), response.status().as_u16(), started.elapsed());
        response
    }

    fn timed_out(&self, method: &http::Method, target: &str) -> Response<JobBody> {
        tracing::warn!(
            http.method = %method,
            http.path = %target,
            deadline_secs = self.request_deadline.as_secs(),
            "no response head before request deadline"
        );
        message_response(StatusCode::GATEWAY_TIMEOUT, "Request timed out.")
    }

    async fn route(&self, mut job: Job) {
        let Some(resolved) = self.router.resolve(job.path()) else {
            let result = job.respond_json(
                StatusCode::NOT_FOUND,
                &serde_json::json!({"message": "Endpoint not found."}),
            );
            log_write_error(result);
            return;
        };

        let synthesized = self.synthesized.get(resolved.endpoint.allow());
        match resolved.outcome(job.method()) {
            MethodOutcome::Handler(handler) => handler(job, resolved.captures).await,
            MethodOutcome::HeadViaGet(handler) => {
                handler(job.into_head_only(), resolved.captures).await;
            }
            MethodOutcome::Options => {
                let headers = synthesized.map(|s| s.options.clone()).unwrap_or_default();
                log_write_error(job.close_head(StatusCode::NO_CONTENT, headers));
            }
            MethodOutcome::NotAllowed => {
                let headers = synthesized
                    .map(|s| s.not_allowed.clone())
                    .unwrap_or_default();
                log_write_error(job.close_head(StatusCode::METHOD_NOT_ALLOWED, headers));
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoints", &self.router.len())
            .field("request_deadline", &self.request_deadline)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

fn log_write_error(result: Result<(), JobError>) {
    if let Err(e) = result {
        if e.is_disconnected() {
            tracing::debug!("client went away before the response was written");
        } else {
            tracing::error!(error = %e, "failed to write synthesized response");
        }
    }
}

fn message_response(status: StatusCode, message: &str) -> Response<JobBody> {
    let payload = serde_json::json!({ "message": message }).to_string();
    let mut response = Response::new(JobBody::full(payload.clone()));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(payload.len()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    use chatterbox_router::{Captures, MethodTable};
    use http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
    use http::Method;
    use http_body_util::{BodyExt, Empty};

    use crate::handler::handler_fn;

    fn dispatcher(routes: Routes, config: ServerConfig) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(routes, &config))
    }

    fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::new())
            .unwrap()
    }

    async fn body_string(response: Response<JobBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn user_routes() -> Routes {
        let mut routes = Routes::new();
        routes
            .route(
                "/api/v1/users/{name}",
                MethodTable::new().get(handler_fn(|mut job: Job, captures: Captures| async move {
                    let name = captures.get(0).unwrap_or_default().to_string();
                    job.respond_json(200, &serde_json::json!({ "name": name }))
                        .unwrap();
                })),
            )
            .unwrap();
        routes
    }

    #[tokio::test]
    async fn test_dispatch_passes_captures() {
        let dispatcher = dispatcher(user_routes(), ServerConfig::default());
        let response = dispatcher
            .dispatch(request(Method::GET, "/api/v1/users/john"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"name":"john"}"#);
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let dispatcher = dispatcher(user_routes(), ServerConfig::default());
        let response = dispatcher.dispatch(request(Method::GET, "/nope")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_string(response).await,
            r#"{"message":"Endpoint not found."}"#
        );
    }

    #[tokio::test]
    async fn test_dispatch_unroutable_target() {
        let dispatcher = dispatcher(user_routes(), ServerConfig::default());
        let response = dispatcher
            .dispatch(request(Method::GET, "/api/v1/users/%FF"))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_dispatch_head_via_get() {
        let dispatcher = dispatcher(user_routes(), ServerConfig::default());

        let get = dispatcher
            .dispatch(request(Method::GET, "/api/v1/users/bob"))
            .await;
        let head = dispatcher
            .dispatch(request(Method::HEAD, "/api/v1/users/bob"))
            .await;

        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(head.headers(), get.headers());
        assert!(body_string(head).await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_options_with_cors() {
        let config = ServerConfig::builder()
            .cors(CorsPolicy::new(vec!["*".into()], Vec::new(), Vec::new()))
            .build();
        let dispatcher = dispatcher(user_routes(), config);

        let response = dispatcher
            .dispatch(request(Method::OPTIONS, "/api/v1/users/bob"))
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD, OPTIONS");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(response
            .headers()
            .get(http::header::ACCESS_CONTROL_ALLOW_METHODS)
            .is_none());
    }

    #[tokio::test]
    async fn test_dispatch_method_not_allowed() {
        let dispatcher = dispatcher(user_routes(), ServerConfig::default());
        let response = dispatcher
            .dispatch(request(Method::DELETE, "/api/v1/users/bob"))
            .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD, OPTIONS");
    }

    #[tokio::test]
    async fn test_dispatch_abandoned_job() {
        let mut routes = Routes::new();
        routes
            .route(
                "/drop",
                MethodTable::new().get(handler_fn(|job: Job, _| async move { drop(job) })),
            )
            .unwrap();
        let dispatcher = dispatcher(routes, ServerConfig::default());

        let response = dispatcher.dispatch(request(Method::GET, "/drop")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_deadline() {
        let mut routes = Routes::new();
        routes
            .route(
                "/slow",
                MethodTable::new().get(handler_fn(|_job: Job, _| async move {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                })),
            )
            .unwrap();
        let config = ServerConfig::builder()
            .request_deadline(Duration::from_secs(5))
            .build();
        let dispatcher = dispatcher(routes, config);

        let started = Instant::now();
        let response = dispatcher.dispatch(request(Method::GET, "/slow")).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert_eq!(
            body_string(response).await,
            r#"{"message":"Request timed out."}"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_job_dropped_at_deadline_is_timeout() {
        let mut routes = Routes::new();
        routes
            .route(
                "/exact",
                MethodTable::new().get(handler_fn(|job: Job, _| async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    drop(job);
                })),
            )
            .unwrap();
        let config = ServerConfig::builder()
            .request_deadline(Duration::from_secs(5))
            .build();
        let dispatcher = dispatcher(routes, config);

        let response = dispatcher.dispatch(request(Method::GET, "/exact")).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_dispatch_returns_at_head_and_streams() {
        let release = Arc::new(tokio::sync::Notify::new());
        let handler_release = Arc::clone(&release);

        let mut routes = Routes::new();
        routes
            .route(
                "/stream",
                MethodTable::new().get(handler_fn(move |mut job: Job, _| {
                    let release = Arc::clone(&handler_release);
                    async move {
                        job.write_head(200, HeaderMap::new()).unwrap();
                        job.write_body("first,").unwrap();
                        release.notified().await;
                        job.close_body_with("second").unwrap();
                    }
                })),
            )
            .unwrap();
        let dispatcher = dispatcher(routes, ServerConfig::default());

        let response = dispatcher.dispatch(request(Method::GET, "/stream")).await;
        assert_eq!(response.status(), StatusCode::OK);

        release.notify_one();
        assert_eq!(body_string(response).await, "first,second");
    }
}
