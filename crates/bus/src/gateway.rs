// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous request-reply gateway.
//!
//! `request_agent` / `request_tool` publish a JSON envelope on the
//! request subject and block for the worker's reply. Per-execution logs
//! ride the same connection as plain pub/sub with a level filter.

use std::sync::Arc;
use std::time::Duration;

use compozy_core::{ComponentKind, ExecutionId, LogLevel};
use compozy_wire::{subject, AgentRequest, AgentResponse, Body, Envelope, LogMessage, ToolRequest, ToolResponse};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::BusError;

/// Callback invoked per decoded log message.
pub type LogHandler = Arc<dyn Fn(LogMessage) + Send + Sync>;

/// Worker-side handler answering one agent request.
pub type AgentResponder =
    Arc<dyn Fn(AgentRequest) -> Result<AgentResponse, String> + Send + Sync>;

/// Worker-side handler answering one tool request.
pub type ToolResponder =
    Arc<dyn Fn(ToolRequest) -> Result<ToolResponse, String> + Send + Sync>;

/// Request-reply and log gateway over a shared bus connection.
pub struct Gateway {
    client: async_nats::Client,
}

impl Gateway {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Invoke an agent synchronously, blocking up to `timeout`.
    pub async fn request_agent(
        &self,
        exec_id: &ExecutionId,
        request: AgentRequest,
        timeout: Duration,
    ) -> Result<AgentResponse, BusError> {
        let req_subject =
            subject::request(ComponentKind::Agent, exec_id, request.agent_id.as_str());
        let envelope = Envelope::new(*exec_id, Body::AgentRequest(request));
        let reply = self
            .roundtrip(&req_subject, envelope, timeout)
            .await
            .map_err(|e| BusError::Request(format!("failed to send agent request: {e}")))?;
        match reply.body {
            Body::AgentResponse(response) => Ok(response),
            Body::Error(e) => Err(BusError::Worker(e.message)),
            _ => Err(BusError::UnexpectedResponse),
        }
    }

    /// Invoke a tool synchronously, blocking up to `timeout`.
    pub async fn request_tool(
        &self,
        exec_id: &ExecutionId,
        request: ToolRequest,
        timeout: Duration,
    ) -> Result<ToolResponse, BusError> {
        let req_subject = subject::request(ComponentKind::Tool, exec_id, request.tool_id.as_str());
        let envelope = Envelope::new(*exec_id, Body::ToolRequest(request));
        let reply = self
            .roundtrip(&req_subject, envelope, timeout)
            .await
            .map_err(|e| BusError::Request(format!("failed to send tool request: {e}")))?;
        match reply.body {
            Body::ToolResponse(response) => Ok(response),
            Body::Error(e) => Err(BusError::Worker(e.message)),
            _ => Err(BusError::UnexpectedResponse),
        }
    }

    async fn roundtrip(
        &self,
        req_subject: &str,
        envelope: Envelope,
        timeout: Duration,
    ) -> Result<Envelope, String> {
        let payload = envelope.encode_vec().map_err(|e| e.to_string())?;
        let message = tokio::time::timeout(
            timeout,
            self.client.request(req_subject.to_string(), payload.into()),
        )
        .await
        .map_err(|_| format!("timed out after {timeout:?}"))?
        .map_err(|e| e.to_string())?;
        Envelope::decode_bytes(&message.payload).map_err(|e| e.to_string())
    }

    /// Publish a log message on `compozy.<exec>.log.<level>`.
    pub async fn publish_log(
        &self,
        exec_id: &ExecutionId,
        log: LogMessage,
    ) -> Result<(), BusError> {
        let log_subject = subject::exec_log(exec_id, log.level);
        let envelope = Envelope::new(*exec_id, Body::Log(log));
        let payload = envelope.encode_vec()?;
        self.client
            .publish(log_subject.clone(), payload.into())
            .await
            .map_err(|e| BusError::Publish(format!("{log_subject}: {e}")))?;
        Ok(())
    }

    /// Subscribe to every log level of an execution. Invalid envelopes are
    /// silently dropped.
    pub async fn subscribe_to_logs(
        &self,
        exec_id: &ExecutionId,
        handler: LogHandler,
    ) -> Result<JoinHandle<()>, BusError> {
        self.log_subscription(subject::exec_log_wildcard(exec_id), handler).await
    }

    /// Subscribe to one log level of an execution.
    pub async fn subscribe_to_log_level(
        &self,
        exec_id: &ExecutionId,
        level: LogLevel,
        handler: LogHandler,
    ) -> Result<JoinHandle<()>, BusError> {
        self.log_subscription(subject::exec_log(exec_id, level), handler).await
    }

    /// Worker side of the agent protocol: answer requests for one agent
    /// under one execution. The handler's error becomes an `Error`
    /// envelope, surfaced to the requester as `error from worker: ...`.
    pub async fn serve_agent_requests(
        &self,
        exec_id: &ExecutionId,
        agent_id: &str,
        responder: AgentResponder,
    ) -> Result<JoinHandle<()>, BusError> {
        let req_subject = subject::request(ComponentKind::Agent, exec_id, agent_id);
        let exec_id = *exec_id;
        let client = self.client.clone();
        let mut subscription = client
            .subscribe(req_subject.clone())
            .await
            .map_err(|e| BusError::Subscribe(format!("{req_subject}: {e}")))?;
        Ok(tokio::spawn(async move {
            while let Some(message) = subscription.next().await {
                let Some(reply_to) = message.reply.clone() else { continue };
                let body = match Envelope::decode_bytes(&message.payload) {
                    Ok(Envelope { body: Body::AgentRequest(request), .. }) => {
                        match responder(request) {
                            Ok(response) => Body::AgentResponse(response),
                            Err(message) => Body::Error(compozy_wire::WorkerError {
                                message,
                                code: None,
                            }),
                        }
                    }
                    Ok(_) | Err(_) => {
                        debug!(subject = %message.subject, "dropping non-request envelope");
                        continue;
                    }
                };
                let reply = Envelope::new(exec_id, body);
                match reply.encode_vec() {
                    Ok(payload) => {
                        if let Err(e) = client.publish(reply_to, payload.into()).await {
                            debug!(error = %e, "reply publish failed");
                        }
                    }
                    Err(e) => debug!(error = %e, "reply encode failed"),
                }
            }
        }))
    }

    /// Worker side of the tool protocol; mirrors [`Gateway::serve_agent_requests`].
    pub async fn serve_tool_requests(
        &self,
        exec_id: &ExecutionId,
        tool_id: &str,
        responder: ToolResponder,
    ) -> Result<JoinHandle<()>, BusError> {
        let req_subject = subject::request(ComponentKind::Tool, exec_id, tool_id);
        let exec_id = *exec_id;
        let client = self.client.clone();
        let mut subscription = client
            .subscribe(req_subject.clone())
            .await
            .map_err(|e| BusError::Subscribe(format!("{req_subject}: {e}")))?;
        Ok(tokio::spawn(async move {
            while let Some(message) = subscription.next().await {
                let Some(reply_to) = message.reply.clone() else { continue };
                let body = match Envelope::decode_bytes(&message.payload) {
                    Ok(Envelope { body: Body::ToolRequest(request), .. }) => {
                        match responder(request) {
                            Ok(response) => Body::ToolResponse(response),
                            Err(message) => Body::Error(compozy_wire::WorkerError {
                                message,
                                code: None,
                            }),
                        }
                    }
                    Ok(_) | Err(_) => {
                        debug!(subject = %message.subject, "dropping non-request envelope");
                        continue;
                    }
                };
                let reply = Envelope::new(exec_id, body);
                match reply.encode_vec() {
                    Ok(payload) => {
                        if let Err(e) = client.publish(reply_to, payload.into()).await {
                            debug!(error = %e, "reply publish failed");
                        }
                    }
                    Err(e) => debug!(error = %e, "reply encode failed"),
                }
            }
        }))
    }

    async fn log_subscription(
        &self,
        filter: String,
        handler: LogHandler,
    ) -> Result<JoinHandle<()>, BusError> {
        let mut subscription = self
            .client
            .subscribe(filter.clone())
            .await
            .map_err(|e| BusError::Subscribe(format!("{filter}: {e}")))?;
        Ok(tokio::spawn(async move {
            while let Some(message) = subscription.next().await {
                match Envelope::decode_bytes(&message.payload) {
                    Ok(Envelope { body: Body::Log(log), .. }) => handler(log),
                    Ok(_) | Err(_) => {
                        debug!(subject = %message.subject, "dropping non-log envelope");
                    }
                }
            }
        }))
    }
}
