//! Task cache: the last known-good snapshot of every task and status
//! option, as fetched from the remote service.
//!
//! The cache is the base onto which queued edits are replayed for display,
//! and the fallback source of truth when the network is down. In-memory
//! state is committed first; the durable write follows and its failure is
//! logged but never rolls the change back.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::Mutex;

use crate::constants::{STORE_KEY_LAST_SYNCED, STORE_KEY_STATUSES, STORE_KEY_TASKS};
use crate::models::{Status, Task, TaskPatch};
use crate::storage::LocalStore;

#[derive(Default)]
struct CacheState {
    tasks: HashMap<String, Task>,
    statuses: Vec<Status>,
    last_synced: Option<DateTime<Utc>>,
    ready: bool,
}

/// Replica store for remote task records and status options.
pub struct TaskCache {
    store: Arc<dyn LocalStore>,
    state: Mutex<CacheState>,
}

impl TaskCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Load tasks, statuses and the last-synced timestamp from durable
    /// storage at process start.
    ///
    /// Sets the ready flag even if the underlying load fails, so callers
    /// never block indefinitely on a corrupted store.
    pub async fn hydrate(&self) {
        let mut state = self.state.lock().await;

        match self.load_collection::<Vec<Task>>(STORE_KEY_TASKS).await {
            Ok(Some(tasks)) => {
                info!("Hydrated {} cached tasks", tasks.len());
                state.tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to hydrate cached tasks: {e}"),
        }

        match self.load_collection::<Vec<Status>>(STORE_KEY_STATUSES).await {
            Ok(Some(statuses)) => state.statuses = statuses,
            Ok(None) => {}
            Err(e) => warn!("Failed to hydrate cached statuses: {e}"),
        }

        match self
            .load_collection::<DateTime<Utc>>(STORE_KEY_LAST_SYNCED)
            .await
        {
            Ok(ts) => state.last_synced = ts,
            Err(e) => warn!("Failed to hydrate last-synced timestamp: {e}"),
        }

        state.ready = true;
    }

    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.ready
    }

    /// Replace the full cached task collection after a successful fetch.
    pub async fn set_tasks(&self, tasks: Vec<Task>) -> Result<()> {
        let snapshot: Vec<Task>;
        {
            let mut state = self.state.lock().await;
            state.tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
            snapshot = state.tasks.values().cloned().collect();
        }
        self.persist(STORE_KEY_TASKS, &snapshot).await
    }

    /// Replace the full cached status option collection.
    pub async fn set_statuses(&self, statuses: Vec<Status>) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.statuses = statuses.clone();
        }
        self.persist(STORE_KEY_STATUSES, &statuses).await
    }

    pub async fn set_last_synced(&self, timestamp: DateTime<Utc>) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.last_synced = Some(timestamp);
        }
        self.persist(STORE_KEY_LAST_SYNCED, &timestamp).await
    }

    /// Merge partial fields into one cached task.
    ///
    /// Intentionally a no-op (but still persisted) when the id is absent:
    /// optimistic-update callers may race with a cache clear, and erroring
    /// there would surface a phantom failure.
    pub async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<()> {
        let snapshot: Vec<Task>;
        {
            let mut state = self.state.lock().await;
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.apply_patch(patch);
            }
            snapshot = state.tasks.values().cloned().collect();
        }
        self.persist(STORE_KEY_TASKS, &snapshot).await
    }

    /// Overwrite (or insert) one cached task with an authoritative server
    /// copy. Used when a conflict is resolved in the server's favor.
    pub async fn replace_task(&self, task: Task) -> Result<()> {
        let snapshot: Vec<Task>;
        {
            let mut state = self.state.lock().await;
            state.tasks.insert(task.id.clone(), task);
            snapshot = state.tasks.values().cloned().collect();
        }
        self.persist(STORE_KEY_TASKS, &snapshot).await
    }

    pub async fn get_task(&self, task_id: &str) -> Option<Task> {
        self.state.lock().await.tasks.get(task_id).cloned()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.values().cloned().collect()
    }

    pub async fn statuses(&self) -> Vec<Status> {
        self.state.lock().await.statuses.clone()
    }

    pub async fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_synced
    }

    /// Empty tasks, statuses and the last-synced timestamp; used on
    /// sign-out or explicit cache invalidation.
    pub async fn clear_cache(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.tasks.clear();
            state.statuses.clear();
            state.last_synced = None;
        }
        self.store.remove(STORE_KEY_TASKS).await?;
        self.store.remove(STORE_KEY_STATUSES).await?;
        self.store.remove(STORE_KEY_LAST_SYNCED).await?;
        Ok(())
    }

    async fn load_collection<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn persist<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        if let Err(e) = self.store.set(key, &raw).await {
            warn!("Durable write for {key} failed: {e}");
            return Err(e);
        }
        Ok(())
    }
}
