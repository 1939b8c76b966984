// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper over a bus connection.
//!
//! Exposes stream access, command/event publishing, and durable-consumer
//! creation keyed by `(component, verb)`.

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::consumer::{pull, AckPolicy, PullConsumer};
use async_nats::jetstream::{self, stream::Stream};
use compozy_core::{CommandKind, ComponentKind, EventKind, LogLevel};
use compozy_wire::{subject, CommandEnvelope, EventEnvelope};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::BusError;
use crate::streams;
use crate::subscribe::{self, MessageHandler, SubscribeOpts};

/// How long the bus waits for an ack before redelivering.
pub const ACK_WAIT: Duration = Duration::from_secs(30);

/// Redelivery cap per message.
pub const MAX_DELIVER: i64 = 3;

/// Shared bus handle. Safe for concurrent use by all subscribers and
/// publishers.
#[derive(Debug)]
pub struct BusClient {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl BusClient {
    pub fn new(client: async_nats::Client) -> Self {
        let jetstream = jetstream::new(client.clone());
        Self { client, jetstream }
    }

    /// Connect to a bus URL and wrap the connection.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Connect(format!("{url}: {e}")))?;
        Ok(Self::new(client))
    }

    /// Underlying core connection (request-reply, plain pub/sub).
    pub fn core(&self) -> &async_nats::Client {
        &self.client
    }

    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Create every stream in the catalog. Idempotent.
    pub async fn setup(&self) -> Result<(), BusError> {
        for def in streams::catalog() {
            streams::ensure_stream(&self.jetstream, &def).await?;
            info!(stream = def.name, "stream ready");
        }
        Ok(())
    }

    pub async fn get_stream(&self, name: &str) -> Result<Stream, BusError> {
        self.jetstream
            .get_stream(name)
            .await
            .map_err(|e| BusError::StreamNotFound(format!("{name}: {e}")))
    }

    /// Publish a command to its stream, waiting for stream acceptance.
    pub async fn publish_command(&self, cmd: &CommandEnvelope) -> Result<(), BusError> {
        let subject = cmd.subject()?.to_string();
        let ack = self
            .jetstream
            .publish(subject.clone(), cmd.encode_vec().into())
            .await
            .map_err(|e| BusError::Publish(format!("{subject}: {e}")))?;
        ack.await.map_err(|e| BusError::Publish(format!("{subject}: ack: {e}")))?;
        Ok(())
    }

    /// Publish an event to the events stream, waiting for stream acceptance.
    pub async fn publish_event(&self, event: &EventEnvelope) -> Result<(), BusError> {
        let subject = event.subject()?.to_string();
        let ack = self
            .jetstream
            .publish(subject.clone(), event.encode_vec().into())
            .await
            .map_err(|e| BusError::Publish(format!("{subject}: {e}")))?;
        ack.await.map_err(|e| BusError::Publish(format!("{subject}: ack: {e}")))?;
        Ok(())
    }

    /// Publish a log message to the durable logs stream, on
    /// `compozy.logs.<component>.<exec>.<level>`.
    pub async fn publish_log_record(
        &self,
        component: ComponentKind,
        exec_id: &compozy_core::ExecutionId,
        log: compozy_wire::LogMessage,
    ) -> Result<(), BusError> {
        let log_subject = subject::log_record(component, exec_id, log.level);
        let envelope = compozy_wire::Envelope::new(*exec_id, compozy_wire::Body::Log(log));
        let payload = envelope.encode_vec()?;
        let ack = self
            .jetstream
            .publish(log_subject.clone(), payload.into())
            .await
            .map_err(|e| BusError::Publish(format!("{log_subject}: {e}")))?;
        ack.await.map_err(|e| BusError::Publish(format!("{log_subject}: ack: {e}")))?;
        Ok(())
    }

    /// Deterministic durable consumer name: `UPPER(component_segment_verb)`.
    pub fn consumer_name(component: ComponentKind, segment: subject::Segment, verb: &str) -> String {
        format!("{component}_{segment}_{verb}").to_ascii_uppercase()
    }

    /// Create (or reuse) a durable pull consumer on a stream.
    ///
    /// Explicit ack, 30 s ack wait, 3 deliveries max. A durable pull
    /// consumer shared by replicas load-balances like a queue group.
    pub async fn ensure_consumer(
        &self,
        stream_name: &str,
        durable_name: &str,
        filter_subject: String,
    ) -> Result<PullConsumer, BusError> {
        let stream = self.get_stream(stream_name).await?;
        let config = pull::Config {
            durable_name: Some(durable_name.to_string()),
            filter_subject,
            ack_policy: AckPolicy::Explicit,
            ack_wait: ACK_WAIT,
            max_deliver: MAX_DELIVER,
            ..Default::default()
        };
        stream
            .get_or_create_consumer(durable_name, config)
            .await
            .map_err(|e| BusError::ConsumerSetup(format!("{durable_name}: {e}")))
    }

    /// Durable consumer over one command kind of a component.
    pub async fn consumer_for_command(
        &self,
        component: ComponentKind,
        kind: CommandKind,
    ) -> Result<PullConsumer, BusError> {
        let stream_name = streams::command_stream(component)?;
        let name = Self::consumer_name(component, subject::Segment::Cmds, kind.as_str());
        self.ensure_consumer(stream_name, &name, subject::command_filter(component, kind)).await
    }

    /// Durable consumer over one event kind of a component.
    pub async fn consumer_for_event(
        &self,
        component: ComponentKind,
        kind: EventKind,
    ) -> Result<PullConsumer, BusError> {
        if component == ComponentKind::Log {
            return Err(BusError::Unsupported(component));
        }
        let name = Self::consumer_name(component, subject::Segment::Evts, kind.as_str());
        self.ensure_consumer(streams::EVENTS_STREAM, &name, subject::event_filter(component, kind))
            .await
    }

    /// Durable consumer over one log level of a component.
    pub async fn consumer_for_log(
        &self,
        component: ComponentKind,
        level: LogLevel,
    ) -> Result<PullConsumer, BusError> {
        let name = Self::consumer_name(component, subject::Segment::Logs, level.as_str());
        self.ensure_consumer(streams::LOGS_STREAM, &name, subject::log_filter(component, level))
            .await
    }

    /// Wire a command consumer through the subscription engine.
    pub async fn subscribe_command(
        &self,
        component: ComponentKind,
        kind: CommandKind,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>, BusError> {
        let consumer = self.consumer_for_command(component, kind).await?;
        Ok(subscribe::spawn_subscription(consumer, handler, SubscribeOpts::default(), cancel))
    }
}
