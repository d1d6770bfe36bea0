//! Remote task service abstraction.
//!
//! This module defines the contract the sync engine consumes to talk to the
//! remote workspace service. Implementations (HTTP clients, fixtures) live
//! outside the core; the engine only needs one read operation and one write
//! operation per edit kind.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::Task;

/// Error taxonomy for remote operations.
///
/// `NotFound` is a resolution, not a failure: the record vanished upstream
/// and there is nothing left to reconcile. `Transient` covers network and
/// server errors that the retry counter recovers from. `MissingMapping` is
/// a configuration error raised before any network call; the queue cannot
/// distinguish "will never succeed" from "currently can't succeed", so it
/// follows the same retry/escalation path.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("record not found")]
    NotFound,

    #[error("remote call failed: {0}")]
    Transient(String),

    #[error("no field mapping configured for {0}")]
    MissingMapping(String),
}

/// Write surface of the remote workspace service, one operation per remote
/// property shape. Property references come from the field-mapping
/// configuration, not from this crate.
#[async_trait]
pub trait RemoteTaskService: Send + Sync {
    /// Fetch the current server record; `Ok(None)` when it no longer
    /// exists.
    async fn fetch_task_by_id(&self, id: &str) -> Result<Option<Task>, RemoteError>;

    async fn set_status(&self, id: &str, property: &str, name: &str) -> Result<(), RemoteError>;

    async fn set_checkbox(&self, id: &str, property: &str, checked: bool)
        -> Result<(), RemoteError>;

    async fn set_title(&self, id: &str, property: &str, title: &str) -> Result<(), RemoteError>;

    async fn set_date(
        &self,
        id: &str,
        property: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), RemoteError>;

    async fn set_select(
        &self,
        id: &str,
        property: &str,
        name: Option<&str>,
    ) -> Result<(), RemoteError>;

    async fn set_relation(
        &self,
        id: &str,
        property: &str,
        ids: &[String],
    ) -> Result<(), RemoteError>;

    async fn set_url(&self, id: &str, property: &str, url: Option<&str>)
        -> Result<(), RemoteError>;
}
