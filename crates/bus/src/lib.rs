// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! compozy-bus: JetStream plumbing for the execution state core.
//!
//! Stream catalog, thin bus client, batch-fetching subscription engine,
//! synchronous request-reply gateway, and the embedded server used by
//! single-node deployments and tests.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod error;
pub mod gateway;
pub mod server;
pub mod streams;
pub mod subscribe;

pub use client::BusClient;
pub use error::BusError;
pub use gateway::{AgentResponder, Gateway, LogHandler, ToolResponder};
pub use server::{EmbeddedServer, ServerError, ServerOpts};
pub use streams::{catalog, StreamDef, EVENTS_STREAM, LOGS_STREAM};
pub use subscribe::{subscribe, HandlerError, MessageHandler, SubscribeOpts};
