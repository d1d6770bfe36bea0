#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use taskmirror::config::FieldMappings;
use taskmirror::storage::MemoryStore;
use taskmirror::{
    MutationQueue, RemoteError, RemoteTaskService, Status, StatusGroup, SyncManager, Task,
    TaskCache,
};

/// Scriptable in-test remote service: a task map plus failure injection.
#[derive(Default)]
pub struct FakeRemote {
    tasks: Mutex<HashMap<String, Task>>,
    fail_next_writes: Mutex<u32>,
    fail_next_fetches: Mutex<u32>,
    writes: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_task(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id.clone(), task);
    }

    pub fn remove_task(&self, id: &str) {
        self.tasks.lock().unwrap().remove(id);
    }

    /// Make the next `n` write calls fail with a transient error.
    pub fn fail_writes(&self, n: u32) {
        *self.fail_next_writes.lock().unwrap() = n;
    }

    /// Make the next `n` fetches fail with a transient error.
    pub fn fail_fetches(&self, n: u32) {
        *self.fail_next_fetches.lock().unwrap() = n;
    }

    /// Record of every write executed, as "op id property value" strings.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn write(&self, entry: String) -> Result<(), RemoteError> {
        let mut remaining = self.fail_next_writes.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(RemoteError::Transient("injected write failure".into()));
        }
        self.writes.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait]
impl RemoteTaskService for FakeRemote {
    async fn fetch_task_by_id(&self, id: &str) -> Result<Option<Task>, RemoteError> {
        {
            let mut remaining = self.fail_next_fetches.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::Transient("injected fetch failure".into()));
            }
        }
        Ok(self.tasks.lock().unwrap().get(id).cloned())
    }

    async fn set_status(&self, id: &str, property: &str, name: &str) -> Result<(), RemoteError> {
        self.write(format!("set_status {id} {property} {name}"))
    }

    async fn set_checkbox(
        &self,
        id: &str,
        property: &str,
        checked: bool,
    ) -> Result<(), RemoteError> {
        self.write(format!("set_checkbox {id} {property} {checked}"))
    }

    async fn set_title(&self, id: &str, property: &str, title: &str) -> Result<(), RemoteError> {
        self.write(format!("set_title {id} {property} {title}"))
    }

    async fn set_date(
        &self,
        id: &str,
        property: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), RemoteError> {
        let value = date.map_or("null".to_string(), |d| d.to_string());
        self.write(format!("set_date {id} {property} {value}"))
    }

    async fn set_select(
        &self,
        id: &str,
        property: &str,
        name: Option<&str>,
    ) -> Result<(), RemoteError> {
        self.write(format!("set_select {id} {property} {}", name.unwrap_or("null")))
    }

    async fn set_relation(
        &self,
        id: &str,
        property: &str,
        ids: &[String],
    ) -> Result<(), RemoteError> {
        self.write(format!("set_relation {id} {property} {}", ids.join(",")))
    }

    async fn set_url(
        &self,
        id: &str,
        property: &str,
        url: Option<&str>,
    ) -> Result<(), RemoteError> {
        self.write(format!("set_url {id} {property} {}", url.unwrap_or("null")))
    }
}

pub fn status(id: &str, name: &str, group: StatusGroup) -> Status {
    Status {
        id: id.to_string(),
        name: name.to_string(),
        color: "default".to_string(),
        group,
    }
}

pub fn sample_statuses() -> Vec<Status> {
    vec![
        status("st-todo", "To-do", StatusGroup::Todo),
        status("st-doing", "In progress", StatusGroup::InProgress),
        status("st-done", "Done", StatusGroup::Complete),
    ]
}

/// Fixed reference instant plus a millisecond offset, so conflict tests can
/// express "strictly later" precisely.
pub fn ts(offset_ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() + chrono::Duration::milliseconds(offset_ms)
}

pub fn sample_task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        title: "Original".to_string(),
        status: status("st-todo", "To-do", StatusGroup::Todo),
        task_type: None,
        project: None,
        do_date: None,
        due_date: Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
        completed_date: None,
        url: None,
        last_edited_time: ts(0),
        remote_url: format!("https://workspace.example/{id}"),
    }
}

pub fn all_mappings() -> FieldMappings {
    FieldMappings {
        status: Some("prop-status".to_string()),
        checkbox: Some("prop-checkbox".to_string()),
        title: Some("prop-title".to_string()),
        do_date: Some("prop-do".to_string()),
        due_date: Some("prop-due".to_string()),
        completed_date: Some("prop-completed".to_string()),
        task_type: Some("prop-type".to_string()),
        project: Some("prop-project".to_string()),
        url: Some("prop-url".to_string()),
    }
}

pub struct Engine {
    pub remote: Arc<FakeRemote>,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<TaskCache>,
    pub queue: Arc<MutationQueue>,
    pub manager: SyncManager,
}

/// Wire up a full engine over a fake remote and an in-memory store.
pub fn engine() -> Engine {
    let remote = Arc::new(FakeRemote::new());
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(TaskCache::new(store.clone()));
    let queue = Arc::new(MutationQueue::new(store.clone(), cache.clone()));
    let manager = SyncManager::new(
        remote.clone(),
        queue.clone(),
        cache.clone(),
        all_mappings(),
    );

    Engine {
        remote,
        store,
        cache,
        queue,
        manager,
    }
}
