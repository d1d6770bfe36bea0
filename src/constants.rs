//! Constants used throughout the application
//!
//! This module centralizes storage keys, retry limits, and other constant
//! values to improve maintainability and consistency.

// Durable storage keys
pub const STORE_KEY_TASKS: &str = "cache/tasks";
pub const STORE_KEY_STATUSES: &str = "cache/statuses";
pub const STORE_KEY_LAST_SYNCED: &str = "cache/last_synced";
pub const STORE_KEY_MUTATIONS: &str = "queue/mutations";
pub const STORE_KEY_CONFLICTS: &str = "queue/conflicts";

// Retry budget: a mutation whose remote write fails this many times is
// converted into a conflict instead of being retried again.
pub const MAX_RETRY_COUNT: u32 = 3;

// Sync configuration bounds
pub const SYNC_DEFAULT_INTERVAL_MINUTES: u64 = 5;
pub const SYNC_MAX_INTERVAL_MINUTES: u64 = 1440;

// Default durable store location (shared in-memory SQLite database)
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

// Date format used for date-only task fields on the wire
pub const REMOTE_DATE_FORMAT: &str = "%Y-%m-%d";
