//! # netwatch-core
//!
//! The classification, enrichment, and formatting pipeline.
//!
//! Each raw trace event flows through:
//! 1. [`classifier`]: family and event code to an [`EventKind`](netwatch_common::types::EventKind).
//! 2. [`resolver`]: owning process name, inline first, then the startup
//!    [`process_cache`] snapshot.
//! 3. [`formatter`]: a [`FormattedRecord`](record::FormattedRecord), or nothing
//!    for filtered events.
//! 4. [`sink`]: one rendered line, written before the next event is read.
//!
//! [`dispatch`] drives the stages on a single worker thread.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod classifier;
pub mod dispatch;
pub mod formatter;
pub mod process_cache;
pub mod record;
pub mod resolver;
pub mod sink;
