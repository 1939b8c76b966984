// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State manager: binds the bus to the store.
//!
//! One durable subscription per component consumes the events stream,
//! runs the reducer over the stored state, and persists the result.
//! Shared durable consumers give queue-group semantics: each event is
//! delivered to exactly one replica. Every message is acked regardless of
//! processing outcome — failures are logged, never replayed; duplicate
//! delivery is safe because the reducer merges last-write-wins and
//! terminal statuses are locked.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use compozy_bus::subscribe::{HandlerError, MessageHandler, SubscribeOpts};
use compozy_bus::{subscribe, BusClient, EVENTS_STREAM};
use compozy_core::{ComponentId, ComponentKind, CorrelationId};
use compozy_wire::subject::{self, Segment};
use compozy_wire::EventEnvelope;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::StateError;
use crate::model::{
    AgentState, ComponentState, StateId, TaskState, ToolState, WorkflowState,
};
use crate::store::StateStore;

/// State manager construction config.
#[derive(Clone)]
pub struct ManagerConfig {
    pub data_dir: PathBuf,
    pub client: Option<Arc<BusClient>>,
    /// Component classes this manager materializes.
    pub components: Vec<ComponentKind>,
}

impl ManagerConfig {
    pub fn new(data_dir: impl Into<PathBuf>, client: Arc<BusClient>) -> Self {
        Self {
            data_dir: data_dir.into(),
            client: Some(client),
            components: ComponentKind::STATEFUL.to_vec(),
        }
    }
}

/// Materialized projection of component state, fed by the events stream.
#[derive(Debug)]
pub struct StateManager {
    store: Arc<StateStore>,
    client: Option<Arc<BusClient>>,
    components: Vec<ComponentKind>,
    cancel: CancellationToken,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
}

impl StateManager {
    /// Validate the config, open the store, and build the manager.
    pub fn new(config: ManagerConfig) -> Result<Self, StateError> {
        if config.data_dir.as_os_str().is_empty() {
            return Err(StateError::ConfigInvalid("data dir is required".to_string()));
        }
        if config.components.is_empty() || config.components.contains(&ComponentKind::Log) {
            return Err(StateError::ConfigInvalid(format!(
                "components to handle must be non-empty and stateful: {:?}",
                config.components
            )));
        }
        let client = config
            .client
            .ok_or_else(|| StateError::ConfigInvalid("bus client is required".to_string()))?;
        let store = Arc::new(StateStore::open(&config.data_dir)?);
        Ok(Self {
            store,
            client: Some(client),
            components: config.components,
            cancel: CancellationToken::new(),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Query-only manager over an existing store; used by tests that
    /// exercise projection and queries without a bus.
    #[cfg(test)]
    pub(crate) fn offline(store: Arc<StateStore>) -> Self {
        Self {
            store,
            client: None,
            components: ComponentKind::STATEFUL.to_vec(),
            cancel: CancellationToken::new(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Shared store handle, for collaborators that query directly.
    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    /// Install one durable events subscription per handled component.
    pub async fn start(&self) -> Result<(), StateError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| StateError::ConfigInvalid("bus client is required".to_string()))?;
        for component in &self.components {
            let durable = format!("state_manager_{component}");
            let consumer = client
                .ensure_consumer(EVENTS_STREAM, &durable, subject::event_tail(*component))
                .await?;
            let handler = Arc::new(EventProjection {
                store: Arc::clone(&self.store),
                component: *component,
            });
            let handle = subscribe::spawn_subscription(
                consumer,
                handler,
                SubscribeOpts::default(),
                self.cancel.child_token(),
            );
            self.subscriptions.lock().push(handle);
            info!(component = %component, consumer = %durable, "state manager subscribed");
        }
        Ok(())
    }

    /// Cancel all subscription loops and wait for them to exit. In-flight
    /// messages redeliver after ack-wait.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.subscriptions.lock());
        for handle in handles {
            let _ = handle.await;
        }
        if let Err(e) = self.store.flush() {
            warn!(error = %e, "state store flush on stop failed");
        }
    }

    pub fn get_workflow_state(
        &self,
        id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<WorkflowState, StateError> {
        let state_id = StateId::workflow(*id, *corr);
        match self.store.get(&state_id)? {
            ComponentState::Workflow(state) => Ok(state),
            _ => Err(StateError::NotFound(state_id)),
        }
    }

    pub fn get_task_state(
        &self,
        id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<TaskState, StateError> {
        let state_id = StateId::task(*id, *corr);
        match self.store.get(&state_id)? {
            ComponentState::Task(state) => Ok(state),
            _ => Err(StateError::NotFound(state_id)),
        }
    }

    pub fn get_agent_state(
        &self,
        id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<AgentState, StateError> {
        let state_id = StateId::agent(*id, *corr);
        match self.store.get(&state_id)? {
            ComponentState::Agent(state) => Ok(state),
            _ => Err(StateError::NotFound(state_id)),
        }
    }

    pub fn get_tool_state(
        &self,
        id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<ToolState, StateError> {
        let state_id = StateId::tool(*id, *corr);
        match self.store.get(&state_id)? {
            ComponentState::Tool(state) => Ok(state),
            _ => Err(StateError::NotFound(state_id)),
        }
    }

    /// Task states under a workflow, scoped to one correlation.
    pub fn get_task_states_for_workflow(
        &self,
        workflow_id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<Vec<TaskState>, StateError> {
        let workflow = self.get_workflow_state(workflow_id, corr)?;
        let tasks = self.store.tasks_for_workflow(&workflow.base.exec_id)?;
        Ok(tasks.into_iter().filter(|t| t.base.id.correlation_id == *corr).collect())
    }

    /// Agent states under a task, scoped to one correlation.
    pub fn get_agent_states_for_task(
        &self,
        task_id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<Vec<AgentState>, StateError> {
        let task = self.get_task_state(task_id, corr)?;
        let agents = self.store.agents_for_task(&task.base.exec_id)?;
        Ok(agents.into_iter().filter(|a| a.base.id.correlation_id == *corr).collect())
    }

    /// Tool states under a task, scoped to one correlation.
    pub fn get_tool_states_for_task(
        &self,
        task_id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<Vec<ToolState>, StateError> {
        let task = self.get_task_state(task_id, corr)?;
        let tools = self.store.tools_for_task(&task.base.exec_id)?;
        Ok(tools.into_iter().filter(|t| t.base.id.correlation_id == *corr).collect())
    }

    pub fn get_all_workflow_states(&self) -> Result<Vec<WorkflowState>, StateError> {
        Ok(self
            .store
            .by_component(ComponentKind::Workflow)?
            .into_iter()
            .filter_map(|s| match s {
                ComponentState::Workflow(state) => Some(state),
                _ => None,
            })
            .collect())
    }

    pub fn get_all_task_states(&self) -> Result<Vec<TaskState>, StateError> {
        Ok(self
            .store
            .by_component(ComponentKind::Task)?
            .into_iter()
            .filter_map(|s| match s {
                ComponentState::Task(state) => Some(state),
                _ => None,
            })
            .collect())
    }

    pub fn get_all_agent_states(&self) -> Result<Vec<AgentState>, StateError> {
        Ok(self
            .store
            .by_component(ComponentKind::Agent)?
            .into_iter()
            .filter_map(|s| match s {
                ComponentState::Agent(state) => Some(state),
                _ => None,
            })
            .collect())
    }

    pub fn get_all_tool_states(&self) -> Result<Vec<ToolState>, StateError> {
        Ok(self
            .store
            .by_component(ComponentKind::Tool)?
            .into_iter()
            .filter_map(|s| match s {
                ComponentState::Tool(state) => Some(state),
                _ => None,
            })
            .collect())
    }

    /// Delete a workflow and its transitive children, depth-first:
    /// agents/tools → task → workflow. Aborts on the first failure;
    /// partial deletions are not rolled back — the caller retries.
    pub fn delete_workflow_state(
        &self,
        workflow_id: &ComponentId,
        corr: &CorrelationId,
    ) -> Result<(), StateError> {
        let workflow = self.get_workflow_state(workflow_id, corr)?;
        let tasks = self.store.tasks_for_workflow(&workflow.base.exec_id)?;

        for task in tasks.iter().filter(|t| t.base.id.correlation_id == *corr) {
            for agent in self.store.agents_for_task(&task.base.exec_id)? {
                self.store.delete(&agent.base.id)?;
            }
            for tool in self.store.tools_for_task(&task.base.exec_id)? {
                self.store.delete(&tool.base.id)?;
            }
            self.store.delete(&task.base.id)?;
        }
        self.store.delete(&workflow.base.id)?;
        info!(workflow = %workflow_id, correlation = %corr, "workflow state cascade deleted");
        Ok(())
    }
}

/// Per-component projection handler. Never fails the subscription — every
/// message is acked; failures are logged (poison policy).
struct EventProjection {
    store: Arc<StateStore>,
    component: ComponentKind,
}

#[async_trait]
impl MessageHandler for EventProjection {
    async fn handle(&self, msg_subject: &str, payload: &[u8]) -> Result<(), HandlerError> {
        self.project(msg_subject, payload);
        Ok(())
    }
}

impl EventProjection {
    fn project(&self, msg_subject: &str, payload: &[u8]) {
        let parsed = match subject::parse(msg_subject, Segment::Evts) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(subject = msg_subject, error = %e, "dropping unparseable event subject");
                return;
            }
        };
        let kind = match parsed.event_kind() {
            Ok(kind) => kind,
            Err(e) => {
                warn!(subject = msg_subject, error = %e, "dropping unknown event kind");
                return;
            }
        };
        if let Err(e) = kind.ensure_supported(parsed.component) {
            warn!(subject = msg_subject, error = %e, "dropping unsupported event kind");
            return;
        }

        let envelope = match EventEnvelope::decode_bytes(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(subject = msg_subject, error = %e, "dropping undecodable event payload");
                return;
            }
        };

        // The envelope's source id is authoritative for state identity;
        // the subject's exec token is the fallback.
        let component_id = envelope
            .source
            .as_ref()
            .filter(|source| !source.id.is_empty())
            .map(|source| ComponentId::from_string(&source.id))
            .unwrap_or_else(|| ComponentId::from_string(parsed.exec_id.as_str()));
        let id = StateId::new(self.component, component_id, parsed.correlation_id);

        let mut state = match self.store.try_get(&id) {
            Ok(Some(state)) => state,
            Ok(None) => ComponentState::empty(id),
            Err(e) => {
                error!(state = %id, error = %e, "state lookup failed");
                return;
            }
        };

        if state.base().exec_id.is_empty() {
            if let Some(source) = &envelope.source {
                if !source.exec_id.is_empty() {
                    state.base_mut().exec_id = source.exec_id.as_str().into();
                }
            }
        }

        match state.base_mut().apply(&envelope) {
            Ok(()) => {}
            Err(StateError::TerminalStateLocked(_)) => {
                debug!(state = %id, event = %kind, "event ignored, state is terminal");
                return;
            }
            Err(e) => {
                warn!(state = %id, event = %kind, error = %e, "reduce failed");
                return;
            }
        }

        match self.store.upsert(&state) {
            Ok(()) => debug!(state = %id, event = %kind, status = %state.base().status, "state updated"),
            Err(StateError::TerminalStateLocked(_)) => {
                debug!(state = %id, event = %kind, "upsert refused, state is terminal");
            }
            Err(e) => {
                // Acked anyway: a missed update reconciles via resync, a
                // poison redelivery storm does not.
                error!(state = %id, event = %kind, error = %e, "state write failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
