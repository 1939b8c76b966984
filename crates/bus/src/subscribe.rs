// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch-fetching subscription engine.
//!
//! Fetches up to `batch_size` messages per round, dispatches each to the
//! handler, then acks (success) or naks (failure — the bus redelivers up
//! to the consumer's max-deliveries cap). Messages on one subject are
//! dispatched in publish order within a single consumer.

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::consumer::PullConsumer;
use async_nats::jetstream::AckKind;
use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::BusError;

/// Fixed backoff after a fetch error that is neither a deadline nor a
/// missing consumer.
const FETCH_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Failure returned by a message handler; the message is nakked.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receives each fetched message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, subject: &str, payload: &[u8]) -> Result<(), HandlerError>;
}

/// Adapter implementing [`MessageHandler`] for an async closure.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(String, Vec<u8>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, subject: &str, payload: &[u8]) -> Result<(), HandlerError> {
        (self.0)(subject.to_string(), payload.to_vec()).await
    }
}

/// Subscription loop tuning.
#[derive(Debug, Clone)]
pub struct SubscribeOpts {
    /// Messages fetched per round.
    pub batch_size: usize,
    /// Deadline for one fetch round; an expired round is not an error.
    pub fetch_timeout: Duration,
    /// Redelivery cap for nakked messages. Advisory here — enforcement
    /// lives in the consumer's max-deliveries setting.
    pub max_retries: i64,
}

impl Default for SubscribeOpts {
    fn default() -> Self {
        Self { batch_size: 100, fetch_timeout: Duration::from_secs(5), max_retries: 3 }
    }
}

enum FetchFailure {
    /// The consumer is gone; the loop cannot make progress.
    ConsumerGone,
    /// Deadline exceeded; fetch again without delay.
    Deadline,
    /// Anything else; back off briefly before retrying.
    Other,
}

fn classify(error: &str) -> FetchFailure {
    let lower = error.to_ascii_lowercase();
    if lower.contains("consumer") && (lower.contains("not found") || lower.contains("deleted")) {
        FetchFailure::ConsumerGone
    } else if lower.contains("timed out") || lower.contains("timeout") || lower.contains("deadline")
    {
        FetchFailure::Deadline
    } else {
        FetchFailure::Other
    }
}

/// Run the fetch-dispatch loop until cancellation or a fatal error.
///
/// Cancellation exits promptly; in-flight messages are neither acked nor
/// nakked and redeliver after the consumer's ack-wait.
pub async fn subscribe(
    consumer: PullConsumer,
    handler: Arc<dyn MessageHandler>,
    opts: SubscribeOpts,
    cancel: CancellationToken,
) -> Result<(), BusError> {
    loop {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let batch = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            result = consumer
                .batch()
                .max_messages(opts.batch_size)
                .expires(opts.fetch_timeout)
                .messages() => result,
        };

        let mut messages = match batch {
            Ok(messages) => messages,
            Err(e) => {
                match classify(&e.to_string()) {
                    FetchFailure::ConsumerGone => {
                        return Err(BusError::ConsumerNotFound(e.to_string()));
                    }
                    FetchFailure::Deadline => continue,
                    FetchFailure::Other => {
                        warn!(error = %e, "fetch failed, backing off");
                        tokio::select! {
                            _ = cancel.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(FETCH_ERROR_BACKOFF) => continue,
                        }
                    }
                }
            }
        };

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                next = messages.next() => next,
            };
            let Some(result) = next else { break };

            let message = match result {
                Ok(message) => message,
                Err(e) => match classify(&e.to_string()) {
                    FetchFailure::ConsumerGone => {
                        return Err(BusError::ConsumerNotFound(e.to_string()));
                    }
                    FetchFailure::Deadline => break,
                    FetchFailure::Other => {
                        warn!(error = %e, "message receive failed, backing off");
                        tokio::select! {
                            _ = cancel.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(FETCH_ERROR_BACKOFF) => {}
                        }
                        break;
                    }
                },
            };

            let subject = message.subject.to_string();
            match handler.handle(&subject, &message.payload).await {
                Ok(()) => {
                    if let Err(e) = message.ack().await {
                        warn!(%subject, error = %e, "ack failed");
                    }
                }
                Err(e) => {
                    debug!(%subject, error = %e, "handler failed, nakking");
                    if let Err(e) = message.ack_with(AckKind::Nak(None)).await {
                        warn!(%subject, error = %e, "nak failed");
                    }
                }
            }
        }
    }
}

/// Spawn [`subscribe`] on its own task. A fatal loop error is logged.
pub fn spawn_subscription(
    consumer: PullConsumer,
    handler: Arc<dyn MessageHandler>,
    opts: SubscribeOpts,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = subscribe(consumer, handler, opts, cancel).await {
            error!(error = %e, "subscription terminated");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let opts = SubscribeOpts::default();
        assert_eq!(opts.batch_size, 100);
        assert_eq!(opts.fetch_timeout, Duration::from_secs(5));
        assert_eq!(opts.max_retries, 3);
    }

    #[test]
    fn classification_routes_consumer_loss_to_fatal() {
        assert!(matches!(classify("jetstream consumer not found"), FetchFailure::ConsumerGone));
        assert!(matches!(classify("Consumer Deleted"), FetchFailure::ConsumerGone));
        assert!(matches!(classify("request timed out"), FetchFailure::Deadline));
        assert!(matches!(classify("deadline has elapsed"), FetchFailure::Deadline));
        assert!(matches!(classify("connection reset"), FetchFailure::Other));
    }
}
