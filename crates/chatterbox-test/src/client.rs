//! In-memory test client.

use std::sync::Arc;

use bytes::Bytes;
use chatterbox_server::{Dispatcher, Routes, ServerConfig};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Sends requests straight to a [`Dispatcher`], without a socket.
///
/// Requests go through the same routing, CORS, `HEAD` and deadline handling
/// as on a live server.
///
/// ```
/// use chatterbox_server::Routes;
/// use chatterbox_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let client = TestClient::new(Routes::new());
/// let response = client.get("/nowhere").send().await;
/// response.assert_status_code(404);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    default_headers: HeaderMap,
}

impl TestClient {
    /// Creates a client over `routes` with the default server settings.
    pub fn new(routes: Routes) -> Self {
        Self::with_config(routes, &ServerConfig::default())
    }

    /// Creates a client over `routes` with the given server settings.
    pub fn with_config(routes: Routes, config: &ServerConfig) -> Self {
        Self::from_dispatcher(Arc::new(Dispatcher::new(routes, config)))
    }

    /// Creates a client over an existing dispatcher.
    pub fn from_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            default_headers: HeaderMap::new(),
        }
    }

    /// Adds a header sent with every request unless the request sets it.
    #[must_use]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Returns the dispatcher behind this client.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts an OPTIONS request.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, uri)
    }

    /// Starts a HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            builder: TestRequestBuilder::new(method, uri),
        }
    }

    /// Dispatches a built request and collects the response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] if the request is invalid or the response body
    /// is aborted.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let mut http = request.into_http_request()?;
        for (name, value) in &self.default_headers {
            if !http.headers().contains_key(name) {
                http.headers_mut().insert(name.clone(), value.clone());
            }
        }

        let response = self.dispatcher.dispatch(http).await;
        TestResponse::from_http(response).await
    }
}

/// A request being built against a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets HTTP Basic credentials.
    pub fn basic_auth(mut self, name: &str, password: &str) -> Self {
        self.builder = self.builder.basic_auth(name, password);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the response body is
    /// aborted. Use [`try_send`](Self::try_send) to inspect those failures.
    pub async fn send(self) -> TestResponse {
        self.try_send().await.expect("request failed")
    }

    /// Sends the request, returning failures instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] if the request is invalid or the response body
    /// is aborted.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }
}
