//! Mutation queue: durable, ordered collection of pending edits.
//!
//! Entries are keyed by (task, edit kind): enqueuing an edit of a kind
//! already queued for that task replaces the existing entry instead of
//! appending, which bounds queue growth and gives last-intent-wins
//! semantics per field while offline. The queue also owns the conflict
//! list and the derived local-view reconstruction.

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cache::TaskCache;
use crate::conflict::{ConflictResolution, ConflictStatus, SyncConflict};
use crate::constants::{STORE_KEY_CONFLICTS, STORE_KEY_MUTATIONS};
use crate::models::Task;
use crate::mutation::{MutationPayload, PendingMutation};
use crate::storage::LocalStore;
use crate::sync::SyncStatus;

#[derive(Default)]
struct QueueState {
    mutations: Vec<PendingMutation>,
    conflicts: Vec<SyncConflict>,
    sync_status: SyncStatus,
}

/// Pending-edit queue and conflict list, persisted through the durable
/// store on every mutation.
pub struct MutationQueue {
    store: Arc<dyn LocalStore>,
    cache: Arc<TaskCache>,
    state: Mutex<QueueState>,
}

impl MutationQueue {
    pub fn new(store: Arc<dyn LocalStore>, cache: Arc<TaskCache>) -> Self {
        Self {
            store,
            cache,
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Load the queue and conflict list from durable storage.
    ///
    /// Conflicts already marked resolved are filtered out so a prior
    /// session's resolved-but-not-yet-pruned conflicts never resurface.
    /// The initial sync status is derived from whether pending conflicts
    /// remain.
    pub async fn hydrate(&self) {
        let mut state = self.state.lock().await;

        match self.load::<Vec<PendingMutation>>(STORE_KEY_MUTATIONS).await {
            Ok(Some(mutations)) => {
                info!("Hydrated {} queued mutations", mutations.len());
                state.mutations = mutations;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to hydrate mutation queue: {e}"),
        }

        match self.load::<Vec<SyncConflict>>(STORE_KEY_CONFLICTS).await {
            Ok(Some(conflicts)) => {
                state.conflicts = conflicts
                    .into_iter()
                    .filter(|c| c.status == ConflictStatus::Pending)
                    .collect();
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to hydrate conflict list: {e}"),
        }

        state.sync_status = if state.conflicts.is_empty() {
            SyncStatus::Idle
        } else {
            SyncStatus::HasConflicts
        };
    }

    /// Queue a field edit, coalescing with any existing entry for the same
    /// (task, kind) pair. Returns the identity of the queue entry.
    ///
    /// `original_task` is the caller's pre-edit snapshot; it becomes the
    /// conflict-detection baseline and refreshes on coalesce.
    pub async fn add_mutation(
        &self,
        task_id: &str,
        payload: MutationPayload,
        original_task: Task,
    ) -> Result<Uuid> {
        let kind = payload.kind();
        let mutation = PendingMutation::new(task_id, payload, original_task);
        let id = mutation.id;

        let snapshot: Vec<PendingMutation>;
        {
            let mut state = self.state.lock().await;
            match state
                .mutations
                .iter()
                .position(|m| m.task_id == task_id && m.kind() == kind)
            {
                Some(index) => {
                    // Replace in place: payload, identity and baseline all
                    // refresh, queue position stays stable.
                    state.mutations[index] = mutation;
                }
                None => state.mutations.push(mutation),
            }
            snapshot = state.mutations.clone();
        }

        self.persist(STORE_KEY_MUTATIONS, &snapshot).await?;
        Ok(id)
    }

    /// Delete one entry; no-op if absent.
    pub async fn remove_mutation(&self, id: Uuid) -> Result<()> {
        let snapshot: Vec<PendingMutation>;
        {
            let mut state = self.state.lock().await;
            state.mutations.retain(|m| m.id != id);
            snapshot = state.mutations.clone();
        }
        self.persist(STORE_KEY_MUTATIONS, &snapshot).await
    }

    /// Bump one entry's retry counter, leaving the rest untouched.
    /// Returns the new count, or `None` if the entry is gone.
    pub async fn increment_retry_count(&self, id: Uuid) -> Result<Option<u32>> {
        let snapshot: Vec<PendingMutation>;
        let count;
        {
            let mut state = self.state.lock().await;
            count = match state.mutations.iter_mut().find(|m| m.id == id) {
                Some(mutation) => {
                    mutation.retry_count += 1;
                    Some(mutation.retry_count)
                }
                None => None,
            };
            snapshot = state.mutations.clone();
        }
        self.persist(STORE_KEY_MUTATIONS, &snapshot).await?;
        Ok(count)
    }

    /// All queued mutations, in queue order.
    pub async fn mutations(&self) -> Vec<PendingMutation> {
        self.state.lock().await.mutations.clone()
    }

    /// All queued mutations for one task, in queue order.
    pub async fn get_mutations_for_task(&self, task_id: &str) -> Vec<PendingMutation> {
        self.state
            .lock()
            .await
            .mutations
            .iter()
            .filter(|m| m.task_id == task_id)
            .cloned()
            .collect()
    }

    pub async fn get_mutation(&self, id: Uuid) -> Option<PendingMutation> {
        self.state
            .lock()
            .await
            .mutations
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.mutations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.mutations.is_empty()
    }

    /// Reconstruct the effective local view of one task: the cached
    /// snapshot with every queued edit for it applied in queue order.
    ///
    /// `None` when the task is not cached, regardless of queued mutations;
    /// no cache entry means nothing to replay onto.
    pub async fn get_local_task_state(&self, task_id: &str) -> Option<Task> {
        let mut task = self.cache.get_task(task_id).await?;
        let statuses = self.cache.statuses().await;

        for mutation in self.get_mutations_for_task(task_id).await {
            mutation.payload.apply_to(&mut task, &statuses);
        }

        Some(task)
    }

    /// Register a detected divergence.
    pub async fn add_conflict(&self, conflict: SyncConflict) -> Result<()> {
        let snapshot: Vec<SyncConflict>;
        {
            let mut state = self.state.lock().await;
            state.conflicts.push(conflict);
            snapshot = state.conflicts.clone();
        }
        self.persist(STORE_KEY_CONFLICTS, &snapshot).await
    }

    /// Conflicts still awaiting user resolution.
    pub async fn pending_conflicts(&self) -> Vec<SyncConflict> {
        self.state.lock().await.conflicts.clone()
    }

    pub async fn get_conflict(&self, id: Uuid) -> Option<SyncConflict> {
        self.state
            .lock()
            .await
            .conflicts
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Settle one conflict: mark it resolved, remove it from the pending
    /// list, and hand the queued mutation back when the local edit won so
    /// the sync manager can push it.
    pub async fn resolve_conflict(
        &self,
        id: Uuid,
        resolution: ConflictResolution,
    ) -> Result<Option<PendingMutation>> {
        let snapshot: Vec<SyncConflict>;
        let kept_local;
        {
            let mut state = self.state.lock().await;
            let Some(index) = state.conflicts.iter().position(|c| c.id == id) else {
                return Ok(None);
            };

            let mut conflict = state.conflicts.remove(index);
            conflict.status = ConflictStatus::Resolved;
            conflict.resolution = Some(resolution);

            kept_local = match resolution {
                ConflictResolution::KeepLocal => Some(conflict.mutation.clone()),
                ConflictResolution::KeepServer => None,
            };
            snapshot = state.conflicts.clone();
        }

        self.persist(STORE_KEY_CONFLICTS, &snapshot).await?;
        Ok(kept_local)
    }

    pub async fn sync_status(&self) -> SyncStatus {
        self.state.lock().await.sync_status
    }

    /// The sync manager owns the transition policy; this is just the
    /// setter.
    pub async fn set_sync_status(&self, status: SyncStatus) {
        self.state.lock().await.sync_status = status;
    }

    /// Drop all queued mutations.
    pub async fn clear_queue(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.mutations.clear();
        }
        self.store.remove(STORE_KEY_MUTATIONS).await
    }

    /// Administrative reset: queue, conflicts and status; used on
    /// sign-out.
    pub async fn clear_all(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.mutations.clear();
            state.conflicts.clear();
            state.sync_status = SyncStatus::Idle;
        }
        self.store.remove(STORE_KEY_MUTATIONS).await?;
        self.store.remove(STORE_KEY_CONFLICTS).await?;
        Ok(())
    }

    async fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
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
