// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedded state store.
//!
//! sled-backed, two trees: `states` holds serialized component states
//! keyed by `<kind-prefix><canonical-state-id>`, `index` holds the
//! parent-exec-id secondary indexes. State and index writes share one
//! transaction. Reads deserialize fresh owned values, so callers never
//! alias store buffers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use compozy_core::{ComponentKind, ExecutionId};
use parking_lot::Mutex;
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;

use crate::error::StateError;
use crate::model::{AgentState, ComponentState, StateId, TaskState, ToolState};

// Index key families inside the `index` tree.
const IDX_TASKS: u8 = b't';
const IDX_AGENTS: u8 = b'a';
const IDX_TOOLS: u8 = b'l';
const IDX_SEP: u8 = 0;

/// Persistent component state store with hierarchical indexes.
#[derive(Debug)]
pub struct StateStore {
    _db: sled::Db,
    states: sled::Tree,
    index: sled::Tree,
    /// Per-key upsert locks; serialize writes and guard the terminal
    /// status machine against out-of-order reapplication.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl StateStore {
    /// Open (or create) the store under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StateError> {
        let db = sled::open(data_dir.join("state"))?;
        let states = db.open_tree("states")?;
        let index = db.open_tree("index")?;
        Ok(Self { _db: db, states, index, locks: Mutex::new(HashMap::new()) })
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// Storage key for a state id: kind prefix + canonical form.
    pub fn state_key(id: &StateId) -> String {
        format!("{}{}", id.component.key_prefix(), id)
    }

    fn index_key(state: &ComponentState, state_key: &str) -> Option<Vec<u8>> {
        let (family, parent) = match state {
            ComponentState::Workflow(_) => return None,
            ComponentState::Task(s) => (IDX_TASKS, &s.workflow_exec_id),
            ComponentState::Agent(s) => (IDX_AGENTS, &s.task_exec_id),
            ComponentState::Tool(s) => (IDX_TOOLS, &s.task_exec_id),
        };
        if parent.is_empty() {
            return None;
        }
        let mut key = Vec::with_capacity(2 + parent.len() + state_key.len());
        key.push(family);
        key.extend_from_slice(parent.as_bytes());
        key.push(IDX_SEP);
        key.extend_from_slice(state_key.as_bytes());
        Some(key)
    }

    fn index_prefix(family: u8, parent: &ExecutionId) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(2 + parent.len());
        prefix.push(family);
        prefix.extend_from_slice(parent.as_bytes());
        prefix.push(IDX_SEP);
        prefix
    }

    fn encode(state: &ComponentState) -> Result<Vec<u8>, StateError> {
        let bytes = match state {
            ComponentState::Workflow(s) => serde_json::to_vec(s)?,
            ComponentState::Task(s) => serde_json::to_vec(s)?,
            ComponentState::Agent(s) => serde_json::to_vec(s)?,
            ComponentState::Tool(s) => serde_json::to_vec(s)?,
        };
        Ok(bytes)
    }

    fn decode(kind: ComponentKind, bytes: &[u8]) -> Result<ComponentState, StateError> {
        let state = match kind {
            ComponentKind::Task => ComponentState::Task(serde_json::from_slice(bytes)?),
            ComponentKind::Agent => ComponentState::Agent(serde_json::from_slice(bytes)?),
            ComponentKind::Tool => ComponentState::Tool(serde_json::from_slice(bytes)?),
            _ => ComponentState::Workflow(serde_json::from_slice(bytes)?),
        };
        Ok(state)
    }

    /// Atomically replace a state and its index entry.
    ///
    /// Refuses a write that would move a stored terminal status to a
    /// different status, regardless of what the caller reduced — the
    /// monotonicity guarantee holds even for out-of-order reapplication.
    pub fn upsert(&self, state: &ComponentState) -> Result<(), StateError> {
        let id = state.id();
        let key = Self::state_key(&id);
        let lock = self.key_lock(&key);
        let _guard = lock.lock();

        if let Some(existing) = self.states.get(key.as_bytes())? {
            if let Ok(old) = Self::decode(id.component, &existing) {
                if old.base().is_terminal() && old.base().status != state.base().status {
                    return Err(StateError::TerminalStateLocked(id));
                }
            }
        }

        let bytes = Self::encode(state)?;
        let new_index_key = Self::index_key(state, &key);
        let kind = id.component;

        (&self.states, &self.index)
            .transaction(|(states, index)| {
                // Drop a stale index entry when the parent linkage moved.
                if let Some(existing) = states.get(key.as_bytes())? {
                    if let Ok(old) = Self::decode(kind, &existing) {
                        if let Some(old_key) = Self::index_key(&old, &key) {
                            if Some(&old_key) != new_index_key.as_ref() {
                                index.remove(old_key)?;
                            }
                        }
                    }
                }
                states.insert(key.as_bytes(), bytes.clone())?;
                if let Some(index_key) = &new_index_key {
                    index.insert(index_key.clone(), key.as_bytes())?;
                }
                Ok::<(), ConflictableTransactionError<StateError>>(())
            })
            .map_err(StateError::from)?;
        Ok(())
    }

    /// Fetch a state, or `None` when absent.
    pub fn try_get(&self, id: &StateId) -> Result<Option<ComponentState>, StateError> {
        let key = Self::state_key(id);
        match self.states.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(id.component, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Fetch a state, failing with `NotFound` when absent.
    pub fn get(&self, id: &StateId) -> Result<ComponentState, StateError> {
        self.try_get(id)?.ok_or(StateError::NotFound(*id))
    }

    /// Remove a state and its index entry.
    pub fn delete(&self, id: &StateId) -> Result<(), StateError> {
        let key = Self::state_key(id);
        let lock = self.key_lock(&key);
        let _guard = lock.lock();
        let kind = id.component;

        (&self.states, &self.index)
            .transaction(|(states, index)| {
                if let Some(existing) = states.remove(key.as_bytes())? {
                    if let Ok(old) = Self::decode(kind, &existing) {
                        if let Some(index_key) = Self::index_key(&old, &key) {
                            index.remove(index_key)?;
                        }
                    }
                }
                Ok::<(), ConflictableTransactionError<StateError>>(())
            })
            .map_err(StateError::from)?;
        Ok(())
    }

    /// All states of one component kind.
    pub fn by_component(&self, kind: ComponentKind) -> Result<Vec<ComponentState>, StateError> {
        let mut states = Vec::new();
        for entry in self.states.scan_prefix(kind.key_prefix().as_bytes()) {
            let (_, bytes) = entry?;
            states.push(Self::decode(kind, &bytes)?);
        }
        Ok(states)
    }

    fn children_by_index(
        &self,
        family: u8,
        parent: &ExecutionId,
    ) -> Result<Vec<ComponentState>, StateError> {
        let mut states = Vec::new();
        for entry in self.index.scan_prefix(Self::index_prefix(family, parent)) {
            let (_, state_key) = entry?;
            let key_str = String::from_utf8_lossy(&state_key);
            let Some((_, canonical)) = key_str.split_once(':') else {
                continue;
            };
            let id = StateId::parse(canonical)?;
            if let Some(state) = self.try_get(&id)? {
                states.push(state);
            }
        }
        Ok(states)
    }

    /// Task states whose `workflow_exec_id` matches.
    pub fn tasks_for_workflow(
        &self,
        workflow_exec_id: &ExecutionId,
    ) -> Result<Vec<TaskState>, StateError> {
        Ok(self
            .children_by_index(IDX_TASKS, workflow_exec_id)?
            .into_iter()
            .filter_map(|s| match s {
                ComponentState::Task(task) => Some(task),
                _ => None,
            })
            .collect())
    }

    /// Agent states whose `task_exec_id` matches.
    pub fn agents_for_task(
        &self,
        task_exec_id: &ExecutionId,
    ) -> Result<Vec<AgentState>, StateError> {
        Ok(self
            .children_by_index(IDX_AGENTS, task_exec_id)?
            .into_iter()
            .filter_map(|s| match s {
                ComponentState::Agent(agent) => Some(agent),
                _ => None,
            })
            .collect())
    }

    /// Tool states whose `task_exec_id` matches.
    pub fn tools_for_task(&self, task_exec_id: &ExecutionId) -> Result<Vec<ToolState>, StateError> {
        Ok(self
            .children_by_index(IDX_TOOLS, task_exec_id)?
            .into_iter()
            .filter_map(|s| match s {
                ComponentState::Tool(tool) => Some(tool),
                _ => None,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Block until pending writes reach disk.
    pub fn flush(&self) -> Result<(), StateError> {
        self.states.flush()?;
        self.index.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
