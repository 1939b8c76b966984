// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! compozy-state: materialized execution state.
//!
//! Component states are projected from the events stream: the manager
//! consumes events, runs the reducer over the stored state, and persists
//! the result to an embedded key-value store with hierarchical indexes.
//! Initializers create the starting state of a component from its parent
//! context, template-normalizing input and env.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod init;
pub mod manager;
pub mod model;
pub mod normalize;
pub mod store;

pub use error::StateError;
pub use init::{AgentInit, StateInitializer, TaskInit, ToolInit, WorkflowInit};
pub use manager::{ManagerConfig, StateManager};
pub use model::{
    AgentState, BaseState, ComponentState, StateId, TaskState, ToolState, WorkflowState,
};
pub use normalize::{DotPathEngine, Normalizer, TemplateEngine, TemplateError};
pub use store::StateStore;
