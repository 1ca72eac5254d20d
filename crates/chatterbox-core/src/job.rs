//! A single request/response exchange.
//!
//! A [`Job`] carries the decoded request and the writing half of the
//! response. The response head travels over a oneshot channel and body
//! chunks over an unbounded mpsc channel, so none of the write operations
//! block. The transport holds the other half as a [`PendingResponse`],
//! which resolves into a streaming [`Response<JobBody>`] as soon as the head
//! has been written.
//!
//! # Example
//!
//! ```rust
//! use bytes::{Bytes, BytesMut};
//! use chatterbox_core::Job;
//! use http::{HeaderMap, Request};
//! use http_body_util::{BodyExt, Full};
//!
//! # tokio_test::block_on(async {
//! let request = Request::get("/api/v1/me").body(Full::new(Bytes::new())).unwrap();
//! let (mut job, pending) = Job::from_request(request, 1024).unwrap();
//! assert_eq!(job.path(), ["api", "v1", "me"]);
//!
//! job.write_head(200, HeaderMap::new()).unwrap();
//! job.write_body("hello ").unwrap();
//! job.close_body_with("world").unwrap();
//!
//! let response = pending.into_response().await.unwrap();
//! let body = response.into_body().collect().await.unwrap().to_bytes();
//! assert_eq!(body, "hello world");
//! # });
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http::header::{AsHeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Frame, SizeHint};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::error::{BoxError, JobError, JobResult, ProtocolError, RoutingError, StreamAborted};
use crate::status::{IntoStatus, Status};

/// Type-erased request body held by a [`Job`].
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Pending read of a whole request body, see [`Job::read_body`].
pub type BodyFuture = Pin<Box<dyn Future<Output = JobResult<Bytes>> + Send + 'static>>;

/// Status and headers of a response, sent once per job.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// Response status.
    pub status: Status,
    /// Response headers.
    pub headers: HeaderMap,
}

/// Whether the response head has been handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadState {
    /// Not written yet.
    Pending,
    /// Written; further `write_head` calls fail.
    Sent,
}

/// Whether more body chunks may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    /// Accepting chunks.
    Open,
    /// End of stream queued; further writes fail.
    Closed,
}

#[derive(Debug)]
enum ChunkFrame {
    Data(Bytes),
    End,
}

/// One or more body chunks, written in order.
///
/// Built from strings, byte buffers, or vectors of either.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunks(Vec<Bytes>);

impl Chunks {
    /// No chunks.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Total length of all chunks in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.iter().map(Bytes::len).sum()
    }

    /// Returns true if there are no bytes to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Bytes> for Chunks {
    fn from(chunk: Bytes) -> Self {
        Self(vec![chunk])
    }
}

impl From<&'static str> for Chunks {
    fn from(chunk: &'static str) -> Self {
        Self(vec![Bytes::from_static(chunk.as_bytes())])
    }
}

impl From<String> for Chunks {
    fn from(chunk: String) -> Self {
        Self(vec![Bytes::from(chunk)])
    }
}

impl From<&'static [u8]> for Chunks {
    fn from(chunk: &'static [u8]) -> Self {
        Self(vec![Bytes::from_static(chunk)])
    }
}

impl From<Vec<u8>> for Chunks {
    fn from(chunk: Vec<u8>) -> Self {
        Self(vec![Bytes::from(chunk)])
    }
}

impl From<Vec<Bytes>> for Chunks {
    fn from(chunks: Vec<Bytes>) -> Self {
        Self(chunks)
    }
}

impl From<Vec<String>> for Chunks {
    fn from(chunks: Vec<String>) -> Self {
        Self(chunks.into_iter().map(Bytes::from).collect())
    }
}

impl From<Vec<&'static str>> for Chunks {
    fn from(chunks: Vec<&'static str>) -> Self {
        Self(
            chunks
                .into_iter()
                .map(|c| Bytes::from_static(c.as_bytes()))
                .collect(),
        )
    }
}

/// One request/response exchange.
///
/// Created by the dispatcher for each request and owned by the handler task
/// until the response is finished. The head must be written exactly once
/// before any body bytes; the body is then written zero or more times and
/// closed exactly once.
///
/// Dropping a job whose head was never written makes the dispatcher answer
/// `500`. Dropping a job with an open body aborts the response stream.
pub struct Job {
    method: Method,
    path: Vec<String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<RequestBody>,
    max_body_bytes: usize,
    head_tx: Option<oneshot::Sender<ResponseHead>>,
    body_tx: mpsc::UnboundedSender<ChunkFrame>,
    head: HeadState,
    body_state: BodyState,
    head_only: bool,
}

impl Job {
    /// Decodes a transport request into a job and its pending response.
    ///
    /// `max_body_bytes` bounds [`read_body`](Self::read_body).
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Unroutable`] if a path segment does not
    /// percent-decode to UTF-8 or the query string is malformed.
    pub fn from_request<B>(
        request: Request<B>,
        max_body_bytes: usize,
    ) -> Result<(Self, PendingResponse), RoutingError>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let path = parse_path(parts.uri.path())?;
        let query = parse_query(parts.uri.query().unwrap_or(""))?;

        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::unbounded_channel();

        let job = Self {
            method: parts.method,
            path,
            query,
            headers: parts.headers,
            body: Some(body.map_err(Into::into).boxed_unsync()),
            max_body_bytes,
            head_tx: Some(head_tx),
            body_tx,
            head: HeadState::Pending,
            body_state: BodyState::Open,
            head_only: false,
        };
        Ok((job, PendingResponse { head_rx, body_rx }))
    }

    /// Turns this job into its head-only variant.
    ///
    /// The returned job reports `GET` as its method, closes the body right
    /// after the head is written and silently discards later body writes.
    #[must_use]
    pub fn into_head_only(mut self) -> Self {
        self.head_only = true;
        self.method = Method::GET;
        self
    }

    /// Returns true for the head-only variant.
    #[must_use]
    pub fn is_head_only(&self) -> bool {
        self.head_only
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the percent-decoded path segments.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Returns the query parameters in request order, duplicates included.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the first value of the query parameter `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value if present and valid visible ASCII.
    #[must_use]
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the head state.
    #[must_use]
    pub fn head_state(&self) -> HeadState {
        self.head
    }

    /// Returns the body state.
    #[must_use]
    pub fn body_state(&self) -> BodyState {
        self.body_state
    }

    /// Reads the whole request body. Can be called once.
    ///
    /// The body is taken from the job when this is called, so the returned
    /// future does not borrow the job.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::BodyAlreadyRead`] on a second call,
    /// [`JobError::BodyTooLarge`] past the configured limit, or
    /// [`JobError::Body`] if the transport fails.
    pub fn read_body(&mut self) -> BodyFuture {
        let body = self.body.take();
        let limit = self.max_body_bytes;

        Box::pin(async move {
            let body = body.ok_or(ProtocolError::BodyAlreadyRead)?;
            let mut body = Limited::new(body, limit);
            let mut collected = BytesMut::new();

            while let Some(frame) = body.frame().await {
                let frame = frame.map_err(|err| {
                    if err.downcast_ref::<LengthLimitError>().is_some() {
                        JobError::BodyTooLarge { limit }
                    } else {
                        JobError::Body(err.to_string())
                    }
                })?;
                if let Ok(data) = frame.into_data() {
                    collected.extend_from_slice(&data);
                }
            }
            Ok(collected.freeze())
        })
    }

    /// Reads the request body and deserialises it as JSON.
    pub async fn read_json<T: DeserializeOwned>(&mut self) -> JobResult<T> {
        let bytes = self.read_body().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes the response status and headers.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::BodyClosed`] after the body was closed,
    /// [`ProtocolError::HeadAlreadyWritten`] on a second call,
    /// [`ProtocolError::InvalidStatus`] for an unusable status, and
    /// [`JobError::Disconnected`] if nobody is waiting for the response.
    pub fn write_head(&mut self, status: impl IntoStatus, headers: HeaderMap) -> JobResult<()> {
        if self.body_state == BodyState::Closed {
            return Err(ProtocolError::BodyClosed.into());
        }
        let status = status.into_status()?;
        let head_tx = self
            .head_tx
            .take()
            .ok_or(ProtocolError::HeadAlreadyWritten)?;
        self.head = HeadState::Sent;

        let delivered = head_tx.send(ResponseHead { status, headers }).is_ok();

        if self.head_only {
            self.body_state = BodyState::Closed;
            let _ = self.body_tx.send(ChunkFrame::End);
        }

        if delivered {
            Ok(())
        } else {
            Err(JobError::Disconnected)
        }
    }

    /// Queues body chunks for the transport.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::HeadNotWritten`] before the head,
    /// [`ProtocolError::BodyClosed`] after close, and
    /// [`JobError::Disconnected`] if the response stream was dropped.
    pub fn write_body(&mut self, chunks: impl Into<Chunks>) -> JobResult<()> {
        if !self.check_writable()? {
            return Ok(());
        }
        self.send_chunks(chunks.into())
    }

    /// Closes the body without a final chunk.
    pub fn close_body(&mut self) -> JobResult<()> {
        self.close_body_with(Chunks::none())
    }

    /// Writes a final chunk and closes the body.
    ///
    /// # Errors
    ///
    /// Same as [`write_body`](Self::write_body); closing twice fails with
    /// [`ProtocolError::BodyClosed`].
    pub fn close_body_with(&mut self, last: impl Into<Chunks>) -> JobResult<()> {
        if !self.check_writable()? {
            return Ok(());
        }
        let sent = self.send_chunks(last.into());
        self.body_state = BodyState::Closed;
        sent?;
        self.body_tx
            .send(ChunkFrame::End)
            .map_err(|_| JobError::Disconnected)
    }

    /// Writes the head and closes an empty body.
    pub fn close_head(&mut self, status: impl IntoStatus, headers: HeaderMap) -> JobResult<()> {
        self.write_head(status, headers)?;
        self.close_body()
    }

    /// Answers `204 No Content`.
    pub fn done(&mut self) -> JobResult<()> {
        self.close_head(StatusCode::NO_CONTENT, HeaderMap::new())
    }

    /// Serialises `value` and sends it as the complete JSON response.
    pub fn respond_json<T>(&mut self, status: impl IntoStatus, value: &T) -> JobResult<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(value)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(payload.len()));

        self.write_head(status, headers)?;
        self.close_body_with(payload)
    }

    /// Returns `Ok(false)` when writes should be silently dropped.
    fn check_writable(&self) -> JobResult<bool> {
        if self.head == HeadState::Pending {
            return Err(ProtocolError::HeadNotWritten.into());
        }
        if self.head_only {
            return Ok(false);
        }
        if self.body_state == BodyState::Closed {
            return Err(ProtocolError::BodyClosed.into());
        }
        Ok(true)
    }

    fn send_chunks(&self, chunks: Chunks) -> JobResult<()> {
        for chunk in chunks.0 {
            if chunk.is_empty() {
                continue;
            }
            self.body_tx
                .send(ChunkFrame::Data(chunk))
                .map_err(|_| JobError::Disconnected)?;
        }
        Ok(())
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if self.head == HeadState::Sent
            && self.body_state == BodyState::Open
            && !self.body_tx.is_closed()
        {
            warn!(
                method = %self.method,
                path = %self.path.join("/"),
                "job dropped with an open response body, aborting stream"
            );
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("head", &self.head)
            .field("body_state", &self.body_state)
            .field("head_only", &self.head_only)
            .finish_non_exhaustive()
    }
}

/// Transport side of a [`Job`]: resolves once the head is written.
#[derive(Debug)]
pub struct PendingResponse {
    head_rx: oneshot::Receiver<ResponseHead>,
    body_rx: mpsc::UnboundedReceiver<ChunkFrame>,
}

impl PendingResponse {
    /// Waits for the response head and returns a streaming response.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Abandoned`] if the job is dropped first.
    pub async fn into_response(self) -> JobResult<Response<JobBody>> {
        let head = self.head_rx.await.map_err(|_| JobError::Abandoned)?;

        let mut response = Response::new(JobBody::stream(self.body_rx));
        *response.status_mut() = head.status.code();
        *response.headers_mut() = head.headers;
        Ok(response)
    }
}

/// Response body fed by a [`Job`], or a fixed payload.
///
/// A job-fed body that ends without its end-of-stream marker yields
/// [`StreamAborted`], which makes hyper reset the connection.
#[derive(Debug)]
pub struct JobBody {
    kind: BodyKind,
}

#[derive(Debug)]
enum BodyKind {
    Full(Option<Bytes>),
    Stream {
        rx: mpsc::UnboundedReceiver<ChunkFrame>,
        done: bool,
    },
}

impl JobBody {
    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kind: BodyKind::Full(None),
        }
    }

    /// A body with a single fixed payload.
    #[must_use]
    pub fn full(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        Self {
            kind: BodyKind::Full((!payload.is_empty()).then_some(payload)),
        }
    }

    fn stream(rx: mpsc::UnboundedReceiver<ChunkFrame>) -> Self {
        Self {
            kind: BodyKind::Stream { rx, done: false },
        }
    }
}

impl Body for JobBody {
    type Data = Bytes;
    type Error = StreamAborted;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            BodyKind::Full(payload) => Poll::Ready(payload.take().map(|p| Ok(Frame::data(p)))),
            BodyKind::Stream { rx, done } => {
                if *done {
                    return Poll::Ready(None);
                }
                match rx.poll_recv(cx) {
                    Poll::Ready(Some(ChunkFrame::Data(chunk))) => {
                        Poll::Ready(Some(Ok(Frame::data(chunk))))
                    }
                    Poll::Ready(Some(ChunkFrame::End)) => {
                        *done = true;
                        Poll::Ready(None)
                    }
                    Poll::Ready(None) => {
                        *done = true;
                        Poll::Ready(Some(Err(StreamAborted)))
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            BodyKind::Full(payload) => payload.is_none(),
            BodyKind::Stream { done, .. } => *done,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            BodyKind::Full(payload) => {
                SizeHint::with_exact(payload.as_ref().map_or(0, |p| p.len() as u64))
            }
            BodyKind::Stream { .. } => SizeHint::default(),
        }
    }
}

/// Splits a request path into percent-decoded segments.
///
/// The leading empty segment is dropped, so `/` yields no segments and
/// `/users/` yields `["users", ""]`.
///
/// # Errors
///
/// Returns [`RoutingError::Unroutable`] if a segment does not decode to UTF-8.
pub fn parse_path(raw: &str) -> Result<Vec<String>, RoutingError> {
    let rest = raw.strip_prefix('/').unwrap_or(raw);
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    rest.split('/')
        .map(|segment| {
            urlencoding::decode(segment)
                .map(Cow::into_owned)
                .map_err(|_| RoutingError::Unroutable(raw.to_string()))
        })
        .collect()
}

/// Parses a query string into ordered pairs, keeping duplicates and blanks.
///
/// # Errors
///
/// Returns [`RoutingError::Unroutable`] if the query cannot be decoded.
pub fn parse_query(raw: &str) -> Result<Vec<(String, String)>, RoutingError> {
    serde_urlencoded::from_str(raw).map_err(|e| RoutingError::Unroutable(e.to_string()))
}
