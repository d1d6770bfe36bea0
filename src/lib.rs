//! Taskmirror - offline mutation queue and conflict-resolving sync engine
//!
//! This library is the sync core of a client that mirrors task records from
//! a remote workspace service and lets a user edit them while connectivity
//! is intermittent. It records edits locally when the network is down,
//! reconstructs a consistent local view of each task by replaying queued
//! edits over a cached snapshot, replays those edits against the remote
//! service once connectivity returns, and detects divergence between a
//! local edit and a concurrent remote edit of the same record.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration and remote field mappings
//! * [`cache`] - Last known-good snapshot of tasks and status options
//! * [`queue`] - Durable, coalescing queue of pending edits
//! * [`conflict`] - Pure conflict detection and resolution types
//! * [`sync`] - Queue processing and sync status orchestration
//! * [`remote`] - Remote task service contract
//! * [`storage`] - Durable local storage contract and implementations

/// Task cache holding the last known-good remote snapshots
pub mod cache;

/// Configuration module for sync tuning and field mappings
pub mod config;

/// Application constants and default values
pub mod constants;

/// Conflict detection logic and conflict record types
pub mod conflict;

/// SeaORM entity models for the durable store
pub mod entities;

/// Logging setup for embedding applications
pub mod logger;

/// Task, status and relation data models
pub mod models;

/// Pending mutation types and payload dispatch
pub mod mutation;

/// Durable, ordered queue of pending edits
pub mod queue;

/// Remote task service abstraction
pub mod remote;

/// Durable local storage layer
pub mod storage;

/// Sync manager orchestrating queue processing
pub mod sync;

// Re-export the core surface for convenient access
pub use cache::TaskCache;
pub use conflict::{ConflictDescription, ConflictResolution, ConflictStatus, SyncConflict};
pub use models::{RelationRef, Status, StatusGroup, Task, TaskPatch};
pub use mutation::{MutationKind, MutationPayload, PendingMutation};
pub use queue::MutationQueue;
pub use remote::{RemoteError, RemoteTaskService};
pub use storage::LocalStore;
pub use sync::{ProcessReport, SyncManager, SyncStatus};
