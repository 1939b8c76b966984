// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-component state initializers.
//!
//! An initializer builds the starting state of a component when its
//! parent dispatches it: merge `parent_env ⊕ own_env` (right-biased),
//! seed a pending state with the original trigger, and run the
//! normalizer. Any normalizer failure aborts initialization.

use chrono::Utc;
use compozy_core::{ComponentId, CorrelationId, Env, ExecutionId, Status};
use serde_json::{Map, Value};

use crate::error::StateError;
use crate::model::{AgentState, BaseState, StateId, TaskState, ToolState, WorkflowState};
use crate::normalize::Normalizer;

/// Inputs for a workflow state.
#[derive(Debug, Clone)]
pub struct WorkflowInit {
    pub component_id: ComponentId,
    pub exec_id: ExecutionId,
    pub correlation_id: CorrelationId,
    /// Original trigger input, propagated downward unchanged.
    pub trigger: Map<String, Value>,
    /// Project-level env.
    pub parent_env: Env,
    /// The workflow's own env, overriding the parent on collision.
    pub env: Env,
}

/// Inputs for a task state.
#[derive(Debug, Clone)]
pub struct TaskInit {
    pub component_id: ComponentId,
    pub exec_id: ExecutionId,
    pub correlation_id: CorrelationId,
    pub workflow_exec_id: ExecutionId,
    pub trigger: Map<String, Value>,
    /// Merged project→workflow env.
    pub parent_env: Env,
    pub env: Env,
}

/// Inputs for an agent state.
#[derive(Debug, Clone)]
pub struct AgentInit {
    pub component_id: ComponentId,
    pub exec_id: ExecutionId,
    pub correlation_id: CorrelationId,
    pub task_exec_id: ExecutionId,
    pub workflow_exec_id: ExecutionId,
    pub trigger: Map<String, Value>,
    /// Merged project→workflow→task env.
    pub parent_env: Env,
    pub env: Env,
}

/// Inputs for a tool state.
pub type ToolInit = AgentInit;

/// Factory for initial component states.
#[derive(Clone)]
pub struct StateInitializer {
    normalizer: Normalizer,
}

impl StateInitializer {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    fn base(
        &self,
        id: StateId,
        exec_id: ExecutionId,
        trigger: Map<String, Value>,
        parent_env: &Env,
        own_env: &Env,
    ) -> Result<BaseState, StateError> {
        let mut state = BaseState {
            id,
            exec_id,
            status: Status::Pending,
            trigger,
            input: Map::new(),
            output: Map::new(),
            env: parent_env.with(own_env),
            errors: Vec::new(),
            context: Map::new(),
            updated_at: Utc::now(),
        };
        self.normalizer.parse_templates(&mut state)?;
        Ok(state)
    }

    pub fn workflow(&self, init: WorkflowInit) -> Result<WorkflowState, StateError> {
        let id = StateId::workflow(init.component_id, init.correlation_id);
        let base = self.base(id, init.exec_id, init.trigger, &init.parent_env, &init.env)?;
        Ok(WorkflowState { base })
    }

    pub fn task(&self, init: TaskInit) -> Result<TaskState, StateError> {
        let id = StateId::task(init.component_id, init.correlation_id);
        let base = self.base(id, init.exec_id, init.trigger, &init.parent_env, &init.env)?;
        Ok(TaskState { base, workflow_exec_id: init.workflow_exec_id })
    }

    pub fn agent(&self, init: AgentInit) -> Result<AgentState, StateError> {
        let id = StateId::agent(init.component_id, init.correlation_id);
        let base = self.base(id, init.exec_id, init.trigger, &init.parent_env, &init.env)?;
        Ok(AgentState {
            base,
            task_exec_id: init.task_exec_id,
            workflow_exec_id: init.workflow_exec_id,
        })
    }

    pub fn tool(&self, init: ToolInit) -> Result<ToolState, StateError> {
        let id = StateId::tool(init.component_id, init.correlation_id);
        let base = self.base(id, init.exec_id, init.trigger, &init.parent_env, &init.env)?;
        Ok(ToolState {
            base,
            task_exec_id: init.task_exec_id,
            workflow_exec_id: init.workflow_exec_id,
        })
    }
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
