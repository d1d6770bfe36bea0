mod common;

use chrono::NaiveDate;
use common::{engine, sample_statuses, sample_task, ts};
use taskmirror::conflict::{self, ConflictResolution, ConflictStatus};
use taskmirror::{MutationPayload, MutationQueue, SyncStatus, TaskCache};

#[tokio::test]
async fn same_kind_same_task_coalesces() {
    let env = engine();
    let baseline = sample_task("t1");

    let first = env
        .queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "First".to_string(),
            },
            baseline.clone(),
        )
        .await
        .unwrap();
    let second = env
        .queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Second".to_string(),
            },
            baseline,
        )
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(env.queue.len().await, 1);

    let queued = env.queue.get_mutations_for_task("t1").await;
    assert_eq!(queued[0].id, second);
    assert_eq!(
        queued[0].payload,
        MutationPayload::UpdateTitle {
            title: "Second".to_string()
        }
    );
}

#[tokio::test]
async fn coalescing_refreshes_the_baseline_snapshot() {
    let env = engine();
    let mut baseline = sample_task("t1");

    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "First".to_string(),
            },
            baseline.clone(),
        )
        .await
        .unwrap();

    baseline.last_edited_time = ts(2000);
    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Second".to_string(),
            },
            baseline,
        )
        .await
        .unwrap();

    let queued = env.queue.get_mutations_for_task("t1").await;
    assert_eq!(queued[0].original_task.last_edited_time, ts(2000));
    assert_eq!(queued[0].retry_count, 0);
}

#[tokio::test]
async fn different_kinds_and_tasks_never_merge() {
    let env = engine();
    let baseline = sample_task("t1");

    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Updated".to_string(),
            },
            baseline.clone(),
        )
        .await
        .unwrap();
    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateDoDate {
                date: NaiveDate::from_ymd_opt(2024, 1, 20),
            },
            baseline.clone(),
        )
        .await
        .unwrap();
    env.queue
        .add_mutation(
            "t2",
            MutationPayload::UpdateTitle {
                title: "Other task".to_string(),
            },
            sample_task("t2"),
        )
        .await
        .unwrap();

    assert_eq!(env.queue.len().await, 3);
    assert_eq!(env.queue.get_mutations_for_task("t1").await.len(), 2);
    assert_eq!(env.queue.get_mutations_for_task("t2").await.len(), 1);
}

#[tokio::test]
async fn local_view_replays_queued_edits_over_the_cache() {
    let env = engine();
    env.cache.set_tasks(vec![sample_task("t1")]).await.unwrap();
    env.cache.set_statuses(sample_statuses()).await.unwrap();

    let baseline = sample_task("t1");
    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Updated".to_string(),
            },
            baseline.clone(),
        )
        .await
        .unwrap();
    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateDoDate {
                date: NaiveDate::from_ymd_opt(2024, 1, 20),
            },
            baseline,
        )
        .await
        .unwrap();

    let local = env.queue.get_local_task_state("t1").await.unwrap();
    assert_eq!(local.title, "Updated");
    assert_eq!(local.do_date, NaiveDate::from_ymd_opt(2024, 1, 20));
    // Untouched fields come straight from the cache
    assert_eq!(local.due_date, NaiveDate::from_ymd_opt(2024, 1, 31));
    assert_eq!(local.status.name, "To-do");
}

#[tokio::test]
async fn local_view_is_none_without_a_cache_entry() {
    let env = engine();

    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Updated".to_string(),
            },
            sample_task("t1"),
        )
        .await
        .unwrap();

    assert!(env.queue.get_local_task_state("t1").await.is_none());
}

#[tokio::test]
async fn checkbox_replay_resolves_a_complete_group_status() {
    let env = engine();
    env.cache.set_tasks(vec![sample_task("t1")]).await.unwrap();
    env.cache.set_statuses(sample_statuses()).await.unwrap();

    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateCheckbox { checked: true },
            sample_task("t1"),
        )
        .await
        .unwrap();

    let local = env.queue.get_local_task_state("t1").await.unwrap();
    assert_eq!(local.status.name, "Done");
}

#[tokio::test]
async fn remove_and_retry_are_scoped_to_one_entry() {
    let env = engine();
    let baseline = sample_task("t1");

    let title_id = env
        .queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Updated".to_string(),
            },
            baseline.clone(),
        )
        .await
        .unwrap();
    let date_id = env
        .queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateDueDate { date: None },
            baseline,
        )
        .await
        .unwrap();

    assert_eq!(
        env.queue.increment_retry_count(title_id).await.unwrap(),
        Some(1)
    );
    assert_eq!(
        env.queue
            .get_mutation(date_id)
            .await
            .unwrap()
            .retry_count,
        0
    );

    env.queue.remove_mutation(title_id).await.unwrap();
    assert_eq!(env.queue.len().await, 1);

    // Removing an absent id is a no-op
    env.queue.remove_mutation(title_id).await.unwrap();
    assert_eq!(env.queue.len().await, 1);
}

#[tokio::test]
async fn hydrate_restores_the_queue_and_drops_resolved_conflicts() {
    let env = engine();
    let baseline = sample_task("t1");

    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Updated".to_string(),
            },
            baseline.clone(),
        )
        .await
        .unwrap();

    let mut server = baseline.clone();
    server.last_edited_time = ts(1000);
    let pending = conflict::create_conflict(
        taskmirror::PendingMutation::new(
            "t1",
            MutationPayload::UpdateStatus {
                status_name: "Done".to_string(),
            },
            baseline.clone(),
        ),
        server.clone(),
    );
    let mut resolved = conflict::create_conflict(
        taskmirror::PendingMutation::new(
            "t2",
            MutationPayload::UpdateTitle {
                title: "Old".to_string(),
            },
            sample_task("t2"),
        ),
        server,
    );
    resolved.status = ConflictStatus::Resolved;
    resolved.resolution = Some(ConflictResolution::KeepServer);

    env.queue.add_conflict(pending.clone()).await.unwrap();
    env.queue.add_conflict(resolved).await.unwrap();

    // Fresh services over the same store, as after a process restart
    let cache = std::sync::Arc::new(TaskCache::new(env.store.clone()));
    let queue = MutationQueue::new(env.store.clone(), cache);
    queue.hydrate().await;

    assert_eq!(queue.len().await, 1);
    let conflicts = queue.pending_conflicts().await;
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].id, pending.id);
    assert_eq!(queue.sync_status().await, SyncStatus::HasConflicts);
}

#[tokio::test]
async fn hydrate_of_an_empty_store_is_idle() {
    let env = engine();
    env.queue.hydrate().await;

    assert!(env.queue.is_empty().await);
    assert!(env.queue.pending_conflicts().await.is_empty());
    assert_eq!(env.queue.sync_status().await, SyncStatus::Idle);
}

#[tokio::test]
async fn clear_all_resets_queue_conflicts_and_status() {
    let env = engine();
    let baseline = sample_task("t1");

    env.queue
        .add_mutation(
            "t1",
            MutationPayload::UpdateTitle {
                title: "Updated".to_string(),
            },
            baseline.clone(),
        )
        .await
        .unwrap();
    let mut server = baseline.clone();
    server.last_edited_time = ts(1000);
    env.queue
        .add_conflict(conflict::create_conflict(
            taskmirror::PendingMutation::new(
                "t1",
                MutationPayload::UpdateStatus {
                    status_name: "Done".to_string(),
                },
                baseline,
            ),
            server,
        ))
        .await
        .unwrap();
    env.queue.set_sync_status(SyncStatus::HasConflicts).await;

    env.queue.clear_all().await.unwrap();

    assert!(env.queue.is_empty().await);
    assert!(env.queue.pending_conflicts().await.is_empty());
    assert_eq!(env.queue.sync_status().await, SyncStatus::Idle);
}
