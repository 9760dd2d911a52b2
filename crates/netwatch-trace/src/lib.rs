//! # netwatch-trace
//!
//! The boundary between the operating system's network tracing facility
//! and the netwatch pipeline.
//!
//! - **Event model**: [`RawTraceEvent`](event::RawTraceEvent), one delivered
//!   trace notification with a family-tagged payload.
//! - **Sources**: the [`TraceSource`](source::TraceSource) trait plus two
//!   adapters, a push channel an OS session callback feeds and a replay
//!   source reading newline-delimited JSON captures.
//! - **Cancellation**: [`CancelToken`](source::CancelToken), observed by
//!   every blocking wait.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod channel;
pub mod event;
pub mod replay;
pub mod source;
