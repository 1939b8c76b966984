// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus error taxonomy.

use thiserror::Error;

/// Errors raised by the bus client, subscription engine, and gateway.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("stream setup failed: {0}")]
    StreamSetup(String),

    #[error("stream not found: {0}")]
    StreamNotFound(String),

    #[error("consumer setup failed: {0}")]
    ConsumerSetup(String),

    #[error("consumer not found: {0}")]
    ConsumerNotFound(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("{0}")]
    Request(String),

    #[error("error from worker: {0}")]
    Worker(String),

    #[error("unexpected response type")]
    UnexpectedResponse,

    #[error("unsupported component: {0}")]
    Unsupported(compozy_core::ComponentKind),

    #[error(transparent)]
    Wire(#[from] compozy_wire::WireError),
}
