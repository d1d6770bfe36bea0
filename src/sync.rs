//! Sync manager: drains the mutation queue against the remote service.
//!
//! Processing is single-flight and sequential: one mutation is handled
//! fully, including its network round trip, before the next starts, so
//! conflicts are detected and resolved one record at a time. Scheduling is
//! the caller's job; this component only counts attempts and caps them.

use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cache::TaskCache;
use crate::config::FieldMappings;
use crate::conflict::{self, ConflictResolution};
use crate::constants::MAX_RETRY_COUNT;
use crate::models::Task;
use crate::mutation::{MutationPayload, PendingMutation};
use crate::queue::MutationQueue;
use crate::remote::{RemoteError, RemoteTaskService};

/// Overall state of the sync engine, surfaced to status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStatus {
    /// Nothing queued, nothing pending
    #[default]
    Idle,
    /// A queue-processing pass is running
    Syncing,
    /// Mutations remain queued for retry after the last pass
    Error,
    /// At least one conflict awaits user resolution
    HasConflicts,
}

/// Aggregate counts returned by a queue-processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Mutations applied remotely or resolved by upstream deletion
    pub processed: usize,
    /// Mutations left in the queue for a later pass
    pub failed: usize,
    /// Conflicts created during this pass
    pub conflicts: usize,
}

enum Outcome {
    Completed,
    Conflicted,
    Retained,
}

/// Orchestrates queue processing, conflict detection and resolution.
pub struct SyncManager {
    remote: Arc<dyn RemoteTaskService>,
    queue: Arc<MutationQueue>,
    cache: Arc<TaskCache>,
    mappings: FieldMappings,
    sync_in_progress: Mutex<bool>,
}

impl SyncManager {
    pub fn new(
        remote: Arc<dyn RemoteTaskService>,
        queue: Arc<MutationQueue>,
        cache: Arc<TaskCache>,
        mappings: FieldMappings,
    ) -> Self {
        Self {
            remote,
            queue,
            cache,
            mappings,
            sync_in_progress: Mutex::new(false),
        }
    }

    /// Whether a queue-processing pass is currently running.
    pub async fn is_syncing(&self) -> bool {
        *self.sync_in_progress.lock().await
    }

    /// Drain the mutation queue against the remote service.
    ///
    /// Per-mutation failures are handled internally and reflected in the
    /// returned counts; this method never fails as a whole. A pass that is
    /// invoked while another is running returns an empty report instead of
    /// interleaving.
    pub async fn process_queue(&self) -> ProcessReport {
        {
            let mut guard = self.sync_in_progress.lock().await;
            if *guard {
                info!("Queue processing already in progress, skipping this pass");
                return ProcessReport::default();
            }
            *guard = true;
        }

        let report = self.drain_queue().await;

        {
            let mut guard = self.sync_in_progress.lock().await;
            *guard = false;
        }

        report
    }

    async fn drain_queue(&self) -> ProcessReport {
        self.queue.set_sync_status(SyncStatus::Syncing).await;

        // Oldest first: edits are applied in the order the user made them
        let mut batch = self.queue.mutations().await;
        batch.sort_by_key(|m| m.created_at);

        info!("Processing {} queued mutations", batch.len());

        let mut report = ProcessReport::default();
        for mutation in &batch {
            match self.process_mutation(mutation).await {
                Outcome::Completed => report.processed += 1,
                Outcome::Conflicted => report.conflicts += 1,
                Outcome::Retained => report.failed += 1,
            }
        }

        let status = if !self.queue.pending_conflicts().await.is_empty() {
            SyncStatus::HasConflicts
        } else if !self.queue.is_empty().await {
            SyncStatus::Error
        } else {
            SyncStatus::Idle
        };
        self.queue.set_sync_status(status).await;

        info!(
            "Queue pass finished: {} processed, {} failed, {} conflicts",
            report.processed, report.failed, report.conflicts
        );
        report
    }

    async fn process_mutation(&self, mutation: &PendingMutation) -> Outcome {
        let server_task = match self.remote.fetch_task_by_id(&mutation.task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                // Deleted upstream: nothing to reconcile, drop the edit
                info!(
                    "Task {} no longer exists upstream, dropping {}",
                    mutation.task_id,
                    mutation.kind().as_str()
                );
                self.discard_mutation(mutation.id).await;
                return Outcome::Completed;
            }
            Err(e) => {
                warn!("Fetch failed for task {}: {e}", mutation.task_id);
                return self.handle_failure(mutation, None).await;
            }
        };

        let diverged = conflict::has_conflict(mutation, &server_task);
        if diverged && !conflict::can_auto_resolve(mutation, &server_task) {
            info!(
                "Conflict on task {} ({}), awaiting user resolution",
                mutation.task_id,
                mutation.kind().as_str()
            );
            let record = conflict::create_conflict(mutation.clone(), server_task);
            if let Err(e) = self.queue.add_conflict(record).await {
                warn!("Failed to persist conflict record: {e}");
            }
            self.discard_mutation(mutation.id).await;
            return Outcome::Conflicted;
        }

        if diverged {
            info!(
                "Auto-resolving {} on task {}: server edit left the field untouched",
                mutation.kind().as_str(),
                mutation.task_id
            );
        }

        match self.apply_local_changes(mutation).await {
            Ok(()) => {
                self.discard_mutation(mutation.id).await;
                Outcome::Completed
            }
            Err(e) => {
                warn!(
                    "Remote write failed for {} on task {}: {e}",
                    mutation.kind().as_str(),
                    mutation.task_id
                );
                self.handle_failure(mutation, Some(server_task)).await
            }
        }
    }

    /// Transient-failure path: bump the retry counter and, once the budget
    /// is exhausted, escalate to a conflict instead of retrying forever.
    async fn handle_failure(
        &self,
        mutation: &PendingMutation,
        server_task: Option<Task>,
    ) -> Outcome {
        let count = match self.queue.increment_retry_count(mutation.id).await {
            Ok(Some(count)) => count,
            Ok(None) => return Outcome::Retained,
            Err(e) => {
                warn!("Failed to persist retry counter: {e}");
                return Outcome::Retained;
            }
        };

        if count < MAX_RETRY_COUNT {
            return Outcome::Retained;
        }

        // Escalate with whatever server state can be fetched; fall back to
        // the client baseline when the record is unreachable.
        let server = match server_task {
            Some(task) => task,
            None => match self.remote.fetch_task_by_id(&mutation.task_id).await {
                Ok(Some(task)) => task,
                _ => mutation.original_task.clone(),
            },
        };

        error!(
            "Mutation {} on task {} exhausted its retry budget, converting to conflict",
            mutation.kind().as_str(),
            mutation.task_id
        );
        let record = conflict::create_conflict(mutation.clone(), server);
        if let Err(e) = self.queue.add_conflict(record).await {
            warn!("Failed to persist conflict record: {e}");
        }
        self.discard_mutation(mutation.id).await;
        Outcome::Conflicted
    }

    async fn discard_mutation(&self, id: Uuid) {
        if let Err(e) = self.queue.remove_mutation(id).await {
            warn!("Failed to persist queue after removing mutation: {e}");
        }
    }

    /// Execute exactly the remote write implied by one mutation's edit
    /// kind and payload. Does not retry internally.
    pub async fn apply_local_changes(&self, mutation: &PendingMutation) -> Result<(), RemoteError> {
        let id = mutation.task_id.as_str();
        let property = self.mappings.property_for(mutation.kind())?;

        match &mutation.payload {
            MutationPayload::UpdateStatus { status_name } => {
                self.remote.set_status(id, property, status_name).await
            }
            MutationPayload::UpdateCheckbox { checked } => {
                self.remote.set_checkbox(id, property, *checked).await
            }
            MutationPayload::UpdateTitle { title } => {
                self.remote.set_title(id, property, title).await
            }
            MutationPayload::UpdateDoDate { date }
            | MutationPayload::UpdateDueDate { date }
            | MutationPayload::UpdateCompletedDate { date } => {
                self.remote.set_date(id, property, *date).await
            }
            MutationPayload::UpdateTaskType { name } => {
                self.remote.set_select(id, property, name.as_deref()).await
            }
            MutationPayload::UpdateProject { relation } => {
                // Only the id list goes over the wire; the display name is
                // local replay metadata
                let ids: Vec<String> = relation.iter().map(|r| r.id.clone()).collect();
                self.remote.set_relation(id, property, &ids).await
            }
            MutationPayload::UpdateUrl { url } => {
                self.remote.set_url(id, property, url.as_deref()).await
            }
        }
    }

    /// Settle a conflict on the user's behalf.
    ///
    /// Keeping the local edit pushes the queued intent onto the server;
    /// keeping the server's version overwrites the cached task with the
    /// record captured at detection time, so the local view converges
    /// without waiting for the next full refetch.
    pub async fn resolve_conflict(&self, id: Uuid, resolution: ConflictResolution) -> Result<()> {
        let conflict = self.queue.get_conflict(id).await;

        let result = match self.queue.resolve_conflict(id, resolution).await? {
            Some(mutation) => {
                info!(
                    "Conflict {id} resolved keeping local {} edit",
                    mutation.kind().as_str()
                );
                self.apply_local_changes(&mutation)
                    .await
                    .map_err(anyhow::Error::from)
            }
            None => {
                if resolution == ConflictResolution::KeepServer {
                    if let Some(conflict) = conflict {
                        info!("Conflict {id} resolved keeping server version");
                        self.cache.replace_task(conflict.server_task).await?;
                    }
                }
                Ok(())
            }
        };

        let status = if !self.queue.pending_conflicts().await.is_empty() {
            SyncStatus::HasConflicts
        } else if !self.queue.is_empty().await {
            SyncStatus::Error
        } else {
            SyncStatus::Idle
        };
        self.queue.set_sync_status(status).await;

        result
    }
}
