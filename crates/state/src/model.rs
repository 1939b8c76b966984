// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component state model and reducer.

use chrono::{DateTime, Utc};
use compozy_core::{ComponentId, ComponentKind, CorrelationId, Env, ExecutionId, Status};
use compozy_wire::{EventCapabilities, EventResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StateError;

/// Primary key of a component state:
/// `(component, component_id, correlation_id)`, rendered canonically as
/// `component:component_id:correlation_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId {
    pub component: ComponentKind,
    pub component_id: ComponentId,
    pub correlation_id: CorrelationId,
}

impl StateId {
    pub fn new(
        component: ComponentKind,
        component_id: impl Into<ComponentId>,
        correlation_id: impl Into<CorrelationId>,
    ) -> Self {
        Self { component, component_id: component_id.into(), correlation_id: correlation_id.into() }
    }

    pub fn workflow(id: impl Into<ComponentId>, corr: impl Into<CorrelationId>) -> Self {
        Self::new(ComponentKind::Workflow, id, corr)
    }

    pub fn task(id: impl Into<ComponentId>, corr: impl Into<CorrelationId>) -> Self {
        Self::new(ComponentKind::Task, id, corr)
    }

    pub fn agent(id: impl Into<ComponentId>, corr: impl Into<CorrelationId>) -> Self {
        Self::new(ComponentKind::Agent, id, corr)
    }

    pub fn tool(id: impl Into<ComponentId>, corr: impl Into<CorrelationId>) -> Self {
        Self::new(ComponentKind::Tool, id, corr)
    }

    /// Parse the canonical `component:component_id:correlation_id` form.
    pub fn parse(s: &str) -> Result<Self, StateError> {
        let (kind_token, rest) =
            s.split_once(':').ok_or_else(|| StateError::BadKey(s.to_string()))?;
        let (component_id, correlation_id) =
            rest.rsplit_once(':').ok_or_else(|| StateError::BadKey(s.to_string()))?;
        let component =
            ComponentKind::parse(kind_token).map_err(|_| StateError::BadKey(s.to_string()))?;
        if component == ComponentKind::Log {
            return Err(StateError::BadKey(s.to_string()));
        }
        Ok(Self {
            component,
            component_id: ComponentId::from_string(component_id),
            correlation_id: CorrelationId::from_string(correlation_id),
        })
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.component, self.component_id, self.correlation_id)
    }
}

impl Serialize for StateId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StateId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StateId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// State shared by every component class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseState {
    pub id: StateId,
    /// Execution instance this state tracks. Empty until the initializer
    /// or the first event supplies it.
    pub exec_id: ExecutionId,
    pub status: Status,
    /// Original workflow trigger input, propagated downward unchanged.
    #[serde(default)]
    pub trigger: Map<String, Value>,
    /// The component's own input after normalization.
    #[serde(default)]
    pub input: Map<String, Value>,
    /// Accumulated output, merged last-write-wins per key.
    #[serde(default)]
    pub output: Map<String, Value>,
    /// Merged env after normalization.
    #[serde(default)]
    pub env: Env,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Free-form context propagated from event payloads.
    #[serde(default)]
    pub context: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl BaseState {
    /// Empty state with default fields, as the manager creates on the
    /// first event for an unseen id.
    pub fn new(id: StateId) -> Self {
        Self {
            id,
            exec_id: ExecutionId::from_string(""),
            status: Status::Pending,
            trigger: Map::new(),
            input: Map::new(),
            output: Map::new(),
            env: Env::new(),
            errors: Vec::new(),
            context: Map::new(),
            updated_at: Utc::now(),
        }
    }

    /// Child state seeded from a parent: copies the trigger and uses the
    /// parent env as merge base. Output and errors start empty.
    pub fn child_of(id: StateId, exec_id: ExecutionId, parent: &BaseState) -> Self {
        Self {
            id,
            exec_id,
            status: Status::Pending,
            trigger: parent.trigger.clone(),
            input: Map::new(),
            output: Map::new(),
            env: parent.env.clone(),
            errors: Vec::new(),
            context: Map::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Reduce one event into this state.
    ///
    /// Queries the payload's capabilities: status token, terminal result,
    /// and context. A terminal state is frozen — the reducer refuses any
    /// further event without mutation.
    pub fn apply(&mut self, event: &impl EventCapabilities) -> Result<(), StateError> {
        if self.is_terminal() {
            return Err(StateError::TerminalStateLocked(self.id));
        }

        if let Some(token) = event.status_token() {
            self.status = Status::from_domain(token);
        }

        match event.result() {
            Some(EventResult::Output(output)) => {
                for (key, value) in output {
                    self.output.insert(key, value);
                }
            }
            Some(EventResult::Error(error)) => {
                self.errors.push(error.message.clone());
            }
            None => {}
        }

        if let Some(context) = event.context() {
            for (key, value) in context {
                self.context.insert(key, value);
            }
        }

        // Non-decreasing even under clock regression.
        self.updated_at = self.updated_at.max(Utc::now());
        Ok(())
    }
}

/// Workflow state: no parent linkage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(flatten)]
    pub base: BaseState,
}

/// Task state, linked to its workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    #[serde(flatten)]
    pub base: BaseState,
    pub workflow_exec_id: ExecutionId,
}

/// Agent state, linked to its task and workflow executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(flatten)]
    pub base: BaseState,
    pub task_exec_id: ExecutionId,
    pub workflow_exec_id: ExecutionId,
}

/// Tool state, linked to its task and workflow executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    #[serde(flatten)]
    pub base: BaseState,
    pub task_exec_id: ExecutionId,
    pub workflow_exec_id: ExecutionId,
}

/// A state of any component class. The variant always matches
/// `id.component`.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Workflow(WorkflowState),
    Task(TaskState),
    Agent(AgentState),
    Tool(ToolState),
}

impl ComponentState {
    /// Empty state for an unseen id, variant chosen by the id's kind.
    /// Parent linkage stays empty until an initializer or event fills it.
    pub fn empty(id: StateId) -> Self {
        let base = BaseState::new(id);
        let none = ExecutionId::from_string("");
        match id.component {
            ComponentKind::Task => {
                ComponentState::Task(TaskState { base, workflow_exec_id: none })
            }
            ComponentKind::Agent => ComponentState::Agent(AgentState {
                base,
                task_exec_id: none,
                workflow_exec_id: none,
            }),
            ComponentKind::Tool => ComponentState::Tool(ToolState {
                base,
                task_exec_id: none,
                workflow_exec_id: none,
            }),
            _ => ComponentState::Workflow(WorkflowState { base }),
        }
    }

    pub fn base(&self) -> &BaseState {
        match self {
            ComponentState::Workflow(s) => &s.base,
            ComponentState::Task(s) => &s.base,
            ComponentState::Agent(s) => &s.base,
            ComponentState::Tool(s) => &s.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseState {
        match self {
            ComponentState::Workflow(s) => &mut s.base,
            ComponentState::Task(s) => &mut s.base,
            ComponentState::Agent(s) => &mut s.base,
            ComponentState::Tool(s) => &mut s.base,
        }
    }

    pub fn id(&self) -> StateId {
        self.base().id
    }

    pub fn kind(&self) -> ComponentKind {
        self.base().id.component
    }

    /// Workflow execution this state hangs under, for task/agent/tool.
    pub fn workflow_exec_id(&self) -> Option<&ExecutionId> {
        match self {
            ComponentState::Workflow(_) => None,
            ComponentState::Task(s) => Some(&s.workflow_exec_id),
            ComponentState::Agent(s) => Some(&s.workflow_exec_id),
            ComponentState::Tool(s) => Some(&s.workflow_exec_id),
        }
    }

    /// Task execution this state hangs under, for agent/tool.
    pub fn task_exec_id(&self) -> Option<&ExecutionId> {
        match self {
            ComponentState::Agent(s) => Some(&s.task_exec_id),
            ComponentState::Tool(s) => Some(&s.task_exec_id),
            _ => None,
        }
    }
}

impl From<WorkflowState> for ComponentState {
    fn from(s: WorkflowState) -> Self {
        ComponentState::Workflow(s)
    }
}

impl From<TaskState> for ComponentState {
    fn from(s: TaskState) -> Self {
        ComponentState::Task(s)
    }
}

impl From<AgentState> for ComponentState {
    fn from(s: AgentState) -> Self {
        ComponentState::Agent(s)
    }
}

impl From<ToolState> for ComponentState {
    fn from(s: ToolState) -> Self {
        ComponentState::Tool(s)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
