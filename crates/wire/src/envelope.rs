// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON envelope for the synchronous request-reply protocol and logs.
//!
//! Wire format: `{"exec_id": "...", "type": "...", "payload": {...}}`.

use compozy_core::{ComponentId, ExecutionId, LogLevel, Status};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::WireError;

/// Typed body of a request-reply envelope, tagged by `type` with the
/// content under `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Body {
    AgentRequest(AgentRequest),
    AgentResponse(AgentResponse),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
    Error(WorkerError),
    Log(LogMessage),
}

/// Request sent to a worker to run one agent action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub agent_id: ComponentId,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub input: Value,
}

/// Worker's answer to an [`AgentRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: ComponentId,
    pub status: Status,
    #[serde(default)]
    pub output: Value,
}

/// Request sent to a worker to run one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool_id: ComponentId,
    #[serde(default)]
    pub input: Value,
}

/// Worker's answer to a [`ToolRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub tool_id: ComponentId,
    pub status: Status,
    #[serde(default)]
    pub output: Value,
}

/// Failure reported by a worker instead of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A log line published on a per-execution log subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub time_unix_ms: i64,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, Value>,
}

/// Request-reply wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub exec_id: ExecutionId,
    #[serde(flatten)]
    pub body: Body,
}

impl Envelope {
    pub fn new(exec_id: ExecutionId, body: Body) -> Self {
        Self { exec_id, body }
    }

    pub fn encode_vec(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
