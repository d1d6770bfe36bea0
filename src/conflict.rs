//! Conflict detection and conflict record types.
//!
//! Detection is pure decision logic with no I/O: given a queued mutation
//! and a freshly fetched server record, decide whether the server diverged
//! from the client's baseline and, if so, whether the queued edit can still
//! be applied silently.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Task;
use crate::mutation::{MutationPayload, PendingMutation};

/// Lifecycle state of a detected divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictStatus {
    Pending,
    Resolved,
}

/// How the user settled a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictResolution {
    KeepLocal,
    KeepServer,
}

/// A detected, unresolved divergence between a queued edit and a concurrent
/// remote edit of the same record.
///
/// Immutable once created, except for `status`/`resolution` which are set
/// exactly once when the user resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    pub id: Uuid,
    pub mutation: PendingMutation,
    /// Server record fetched at detection time.
    pub server_task: Task,
    pub detected_at: DateTime<Utc>,
    pub status: ConflictStatus,
    pub resolution: Option<ConflictResolution>,
}

/// Human-readable summary of what a conflict is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictDescription {
    pub local_change: String,
    pub server_change: String,
}

/// True iff the server record was edited strictly after the client's
/// baseline snapshot. Millisecond resolution; equal timestamps are not a
/// conflict.
pub fn has_conflict(mutation: &PendingMutation, server_task: &Task) -> bool {
    server_task.last_edited_time.timestamp_millis()
        > mutation.original_task.last_edited_time.timestamp_millis()
}

/// True iff the single field this mutation governs is identical between the
/// baseline and the server record.
///
/// Only meaningful when [`has_conflict`] is true: the server's concurrent
/// edit, whatever it was, did not touch the field the queued edit is about
/// to overwrite, so applying it on top is safe.
pub fn can_auto_resolve(mutation: &PendingMutation, server_task: &Task) -> bool {
    let original = &mutation.original_task;
    match &mutation.payload {
        MutationPayload::UpdateStatus { .. } | MutationPayload::UpdateCheckbox { .. } => {
            original.status.id == server_task.status.id
        }
        MutationPayload::UpdateTitle { .. } => original.title == server_task.title,
        MutationPayload::UpdateDoDate { .. } => original.do_date == server_task.do_date,
        MutationPayload::UpdateDueDate { .. } => original.due_date == server_task.due_date,
        MutationPayload::UpdateCompletedDate { .. } => {
            original.completed_date == server_task.completed_date
        }
        MutationPayload::UpdateTaskType { .. } => original.task_type == server_task.task_type,
        MutationPayload::UpdateProject { .. } => {
            original.project.as_ref().map(|r| &r.id) == server_task.project.as_ref().map(|r| &r.id)
        }
        MutationPayload::UpdateUrl { .. } => original.url == server_task.url,
    }
}

/// Build a pending conflict record from a mutation and the server record it
/// diverged from.
pub fn create_conflict(mutation: PendingMutation, server_task: Task) -> SyncConflict {
    SyncConflict {
        id: Uuid::new_v4(),
        mutation,
        server_task,
        detected_at: Utc::now(),
        status: ConflictStatus::Pending,
        resolution: None,
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(crate::constants::REMOTE_DATE_FORMAT).to_string(),
        None => "none".to_string(),
    }
}

/// Describe what the local edit intended versus what the server shows now.
/// Pure presentation logic for the conflict resolution screen.
pub fn describe_conflict(conflict: &SyncConflict) -> ConflictDescription {
    let server = &conflict.server_task;
    let (local_change, server_change) = match &conflict.mutation.payload {
        MutationPayload::UpdateStatus { status_name } => (
            format!("Set status to \"{status_name}\""),
            format!("Status is \"{}\"", server.status.name),
        ),
        MutationPayload::UpdateCheckbox { checked } => (
            if *checked {
                "Mark task complete".to_string()
            } else {
                "Mark task not complete".to_string()
            },
            format!("Status is \"{}\"", server.status.name),
        ),
        MutationPayload::UpdateTitle { title } => (
            format!("Rename to \"{title}\""),
            format!("Title is \"{}\"", server.title),
        ),
        MutationPayload::UpdateDoDate { date } => (
            format!("Set do date to {}", format_date(*date)),
            format!("Do date is {}", format_date(server.do_date)),
        ),
        MutationPayload::UpdateDueDate { date } => (
            format!("Set due date to {}", format_date(*date)),
            format!("Due date is {}", format_date(server.due_date)),
        ),
        MutationPayload::UpdateCompletedDate { date } => (
            format!("Set completed date to {}", format_date(*date)),
            format!("Completed date is {}", format_date(server.completed_date)),
        ),
        MutationPayload::UpdateTaskType { name } => (
            format!("Set task type to {}", name.as_deref().unwrap_or("none")),
            format!(
                "Task type is {}",
                server.task_type.as_deref().unwrap_or("none")
            ),
        ),
        MutationPayload::UpdateProject { relation } => (
            format!(
                "Move to project {}",
                relation.as_ref().map_or("none", |r| r.name.as_str())
            ),
            format!(
                "Project is {}",
                server.project.as_ref().map_or("none", |r| r.name.as_str())
            ),
        ),
        MutationPayload::UpdateUrl { url } => (
            format!("Set URL to {}", url.as_deref().unwrap_or("none")),
            format!("URL is {}", server.url.as_deref().unwrap_or("none")),
        ),
    };

    ConflictDescription {
        local_change,
        server_change,
    }
}
