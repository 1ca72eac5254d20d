//! # Chatterbox Core
//!
//! Request/response primitives for the Chatterbox chat backend.
//!
//! - [`Job`] - One request/response exchange with deferred, streamed writing
//! - [`PendingResponse`] / [`JobBody`] - The transport side of a job
//! - [`Status`] - Response status from a numeric code or a status line
//! - [`ProtocolError`] / [`JobError`] - Job misuse and I/O failures
//! - [`WaitGate`] - Re-armable broadcast used for long-polling

#![doc(html_root_url = "https://docs.rs/chatterbox-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod job;
mod status;
mod wait_gate;

pub use error::{BoxError, JobError, JobResult, ProtocolError, RoutingError, StreamAborted};
pub use job::{
    parse_path, parse_query, BodyFuture, BodyState, Chunks, HeadState, Job, JobBody,
    PendingResponse, RequestBody, ResponseHead,
};
pub use status::{IntoStatus, Status};
pub use wait_gate::{GateWaiter, WaitGate, WaitOutcome};
