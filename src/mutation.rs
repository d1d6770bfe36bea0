//! Pending mutation types.
//!
//! A [`PendingMutation`] is a single queued field edit. Its payload is a
//! tagged union with one variant per edit kind, so per-kind dispatch in the
//! conflict detector and the sync manager is exhaustive and compiler
//! checked.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RelationRef, Status, StatusGroup, Task};

/// The fixed tag identifying which single field of a task a mutation
/// changes. Used as half of the (task, kind) coalescing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    UpdateStatus,
    UpdateCheckbox,
    UpdateTitle,
    UpdateDoDate,
    UpdateDueDate,
    UpdateCompletedDate,
    UpdateTaskType,
    UpdateProject,
    UpdateUrl,
}

impl MutationKind {
    /// Stable name used in logs and configuration error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::UpdateStatus => "updateStatus",
            MutationKind::UpdateCheckbox => "updateCheckbox",
            MutationKind::UpdateTitle => "updateTitle",
            MutationKind::UpdateDoDate => "updateDoDate",
            MutationKind::UpdateDueDate => "updateDueDate",
            MutationKind::UpdateCompletedDate => "updateCompletedDate",
            MutationKind::UpdateTaskType => "updateTaskType",
            MutationKind::UpdateProject => "updateProject",
            MutationKind::UpdateUrl => "updateUrl",
        }
    }
}

/// Payload of a queued edit, one variant per edit kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MutationPayload {
    UpdateStatus { status_name: String },
    UpdateCheckbox { checked: bool },
    UpdateTitle { title: String },
    UpdateDoDate { date: Option<NaiveDate> },
    UpdateDueDate { date: Option<NaiveDate> },
    UpdateCompletedDate { date: Option<NaiveDate> },
    UpdateTaskType { name: Option<String> },
    UpdateProject { relation: Option<RelationRef> },
    UpdateUrl { url: Option<String> },
}

impl MutationPayload {
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationPayload::UpdateStatus { .. } => MutationKind::UpdateStatus,
            MutationPayload::UpdateCheckbox { .. } => MutationKind::UpdateCheckbox,
            MutationPayload::UpdateTitle { .. } => MutationKind::UpdateTitle,
            MutationPayload::UpdateDoDate { .. } => MutationKind::UpdateDoDate,
            MutationPayload::UpdateDueDate { .. } => MutationKind::UpdateDueDate,
            MutationPayload::UpdateCompletedDate { .. } => MutationKind::UpdateCompletedDate,
            MutationPayload::UpdateTaskType { .. } => MutationKind::UpdateTaskType,
            MutationPayload::UpdateProject { .. } => MutationKind::UpdateProject,
            MutationPayload::UpdateUrl { .. } => MutationKind::UpdateUrl,
        }
    }

    /// Apply this edit to a local task replica.
    ///
    /// Used only for local-view reconstruction; the status option list lets
    /// status and checkbox edits resolve a display name to a full option.
    pub fn apply_to(&self, task: &mut Task, statuses: &[Status]) {
        match self {
            MutationPayload::UpdateStatus { status_name } => {
                if let Some(status) = statuses.iter().find(|s| s.name == *status_name) {
                    task.status = status.clone();
                } else {
                    // Option list not cached yet; keep id/color, show the name
                    task.status.name = status_name.clone();
                }
            }
            MutationPayload::UpdateCheckbox { checked } => {
                let wanted = if *checked { StatusGroup::Complete } else { StatusGroup::Todo };
                if let Some(status) = statuses.iter().find(|s| s.group == wanted) {
                    task.status = status.clone();
                }
            }
            MutationPayload::UpdateTitle { title } => {
                task.title = title.clone();
            }
            MutationPayload::UpdateDoDate { date } => {
                task.do_date = *date;
            }
            MutationPayload::UpdateDueDate { date } => {
                task.due_date = *date;
            }
            MutationPayload::UpdateCompletedDate { date } => {
                task.completed_date = *date;
            }
            MutationPayload::UpdateTaskType { name } => {
                task.task_type = name.clone();
            }
            MutationPayload::UpdateProject { relation } => {
                task.project = relation.clone();
            }
            MutationPayload::UpdateUrl { url } => {
                task.url = url.clone();
            }
        }
    }
}

/// A single queued field edit awaiting replay against the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMutation {
    pub id: Uuid,
    pub task_id: String,
    #[serde(flatten)]
    pub payload: MutationPayload,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
    /// Snapshot of the task as the client understood it when the edit was
    /// queued. Conflict-detection baseline only; never mutated afterwards.
    pub original_task: Task,
}

impl PendingMutation {
    pub fn new(task_id: impl Into<String>, payload: MutationPayload, original_task: Task) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task_id.into(),
            payload,
            created_at: Utc::now(),
            retry_count: 0,
            original_task,
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.payload.kind()
    }
}
