//! Data models for mirrored task records.
//!
//! The authoritative copy of every [`Task`] lives in the remote workspace
//! service; these types are the local replica that the cache stores and the
//! mutation queue replays edits onto.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kanban-style grouping of a status option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusGroup {
    Todo,
    InProgress,
    Complete,
}

/// A status option as defined by the remote workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub name: String,
    pub color: String,
    pub group: StatusGroup,
}

/// Reference to a related record (e.g. a project page).
///
/// The `name` is display metadata used only for local replay; remote writes
/// send the id alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: String,
    pub name: String,
}

/// A mirrored task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: Status,
    /// Optional classification, a select option name on the remote side.
    pub task_type: Option<String>,
    /// Optional project association, a relation on the remote side.
    pub project: Option<RelationRef>,
    pub do_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub url: Option<String>,
    /// Remote "last edited" timestamp, millisecond resolution.
    pub last_edited_time: DateTime<Utc>,
    /// Back-reference to the record in the remote workspace UI.
    pub remote_url: String,
}

/// Partial update merged into a cached task.
///
/// Outer `None` means "leave the field alone"; for clearable fields the
/// inner `Option` carries the new value, with `Some(None)` clearing it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub task_type: Option<Option<String>>,
    pub project: Option<Option<RelationRef>>,
    pub do_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed_date: Option<Option<NaiveDate>>,
    pub url: Option<Option<String>>,
    pub last_edited_time: Option<DateTime<Utc>>,
}

impl Task {
    /// Merge a partial update into this task, leaving unset fields as-is.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(task_type) = &patch.task_type {
            self.task_type = task_type.clone();
        }
        if let Some(project) = &patch.project {
            self.project = project.clone();
        }
        if let Some(do_date) = &patch.do_date {
            self.do_date = *do_date;
        }
        if let Some(due_date) = &patch.due_date {
            self.due_date = *due_date;
        }
        if let Some(completed_date) = &patch.completed_date {
            self.completed_date = *completed_date;
        }
        if let Some(url) = &patch.url {
            self.url = url.clone();
        }
        if let Some(ts) = patch.last_edited_time {
            self.last_edited_time = ts;
        }
    }
}
