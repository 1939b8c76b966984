// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical execution status and normalization from domain vocabularies.

use serde::{Deserialize, Serialize};

/// Canonical status shared by every component class.
///
/// Domain-specific vocabularies (`WORKFLOW_STATUS_*`, `TASK_STATUS_*`, ...)
/// normalize into this set via [`Status::from_domain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Scheduled,
    Running,
    Waiting,
    RetryScheduled,
    Success,
    Failed,
    TimedOut,
    Cancelled,
    Paused,
}

impl Status {
    /// Normalize a domain status token into the canonical set.
    ///
    /// Total: every input maps to a status, unknown tokens to `Pending`.
    /// Both `CANCELLED` and `CANCELED` spellings are accepted.
    pub fn from_domain(token: &str) -> Self {
        match token {
            "WORKFLOW_STATUS_PAUSED" => Status::Paused,
            "TASK_STATUS_SCHEDULED" => Status::Scheduled,
            "TASK_STATUS_RETRY_SCHEDULED" => Status::RetryScheduled,
            "TASK_STATUS_WAITING" | "WORKFLOW_STATUS_WAITING" => Status::Waiting,
            t if t.ends_with("_UNSPECIFIED") || t.ends_with("_PENDING") => Status::Pending,
            t if t.ends_with("_RUNNING") => Status::Running,
            t if t.ends_with("_SUCCESS") => Status::Success,
            t if t.ends_with("_FAILED") => Status::Failed,
            t if t.ends_with("_CANCELLED") || t.ends_with("_CANCELED") => Status::Cancelled,
            t if t.ends_with("_TIMED_OUT") => Status::TimedOut,
            _ => Status::Pending,
        }
    }

    /// Terminal statuses are frozen: the reducer never transitions out of
    /// them (`Paused` is not terminal — a paused execution resumes).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Success | Status::Failed | Status::TimedOut | Status::Cancelled)
    }

    /// Render the domain status token for a component class, e.g.
    /// `Task` + `Running` → `TASK_STATUS_RUNNING`.
    ///
    /// Inverse of [`Status::from_domain`] for the vocabularies the wire
    /// envelopes carry.
    pub fn domain_token(&self, component: crate::component::ComponentKind) -> String {
        format!("{}_STATUS_{}", component.as_str().to_ascii_uppercase(), self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Scheduled => "SCHEDULED",
            Status::Running => "RUNNING",
            Status::Waiting => "WAITING",
            Status::RetryScheduled => "RETRY_SCHEDULED",
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
            Status::TimedOut => "TIMED_OUT",
            Status::Cancelled => "CANCELLED",
            Status::Paused => "PAUSED",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

crate::simple_display! {
    Status {
        Pending => "PENDING",
        Scheduled => "SCHEDULED",
        Running => "RUNNING",
        Waiting => "WAITING",
        RetryScheduled => "RETRY_SCHEDULED",
        Success => "SUCCESS",
        Failed => "FAILED",
        TimedOut => "TIMED_OUT",
        Cancelled => "CANCELLED",
        Paused => "PAUSED",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
