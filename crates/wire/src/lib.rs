// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire contract for the execution state core.
//!
//! Three subject families share the `compozy` prefix:
//! - stream subjects `compozy.<corr>.<component>.<segment>.<exec>.<verb>`
//!   carrying binary command/event envelopes (length-delimited protobuf),
//! - durable log subjects `compozy.logs.<component>.<exec>.<level>`,
//! - request-reply subjects `compozy.<exec>.<component>.<id>.request`
//!   carrying a JSON envelope `{exec_id, type, payload}`.
//!
//! The families are distinct: stream subjects put the correlation ID in
//! the second token, request-reply subjects put the execution ID there.
//! They are never mixed.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod envelope;
pub mod proto;
pub mod subject;

pub use envelope::{
    AgentRequest, AgentResponse, Body, Envelope, LogMessage, ToolRequest, ToolResponse,
    WorkerError,
};
pub use proto::{
    CommandEnvelope, ComponentRef, ErrorDetail, EventCapabilities, EventEnvelope, EventPayload,
    EventResult, Metadata,
};
pub use subject::{ParsedSubject, Segment, SubjectError, PREFIX};

use thiserror::Error;

/// Errors for wire encoding and decoding.
#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Subject(#[from] SubjectError),

    #[error("failed to decode wire payload: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("failed to decode json envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("envelope missing {0}")]
    MissingField(&'static str),
}
