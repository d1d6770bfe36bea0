//! Configuration management for taskmirror
//!
//! This module handles loading, parsing, and validation of configuration
//! files, including the remote field mappings the sync engine needs to
//! build writes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_DATABASE_URL, SYNC_DEFAULT_INTERVAL_MINUTES, SYNC_MAX_INTERVAL_MINUTES,
};
use crate::mutation::MutationKind;
use crate::remote::RemoteError;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub mappings: FieldMappings,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Queue processing interval hint in minutes for the external trigger
    /// (0 = event-driven only, no periodic pass)
    pub process_interval_minutes: u64,
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite connection URL for the durable store
    pub database_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log file path; stderr when unset
    pub file: Option<PathBuf>,
}

/// Remote property references, one per edit kind.
///
/// These identify which property of the remote record each edit kind
/// writes to. They come from the workspace schema, not from this crate; an
/// edit kind with no mapping fails its write attempt immediately as a
/// configuration error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FieldMappings {
    pub status: Option<String>,
    pub checkbox: Option<String>,
    pub title: Option<String>,
    pub do_date: Option<String>,
    pub due_date: Option<String>,
    pub completed_date: Option<String>,
    pub task_type: Option<String>,
    pub project: Option<String>,
    pub url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            process_interval_minutes: SYNC_DEFAULT_INTERVAL_MINUTES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl FieldMappings {
    /// Look up the remote property reference for an edit kind.
    pub fn property_for(&self, kind: MutationKind) -> Result<&str, RemoteError> {
        let property = match kind {
            MutationKind::UpdateStatus => &self.status,
            MutationKind::UpdateCheckbox => &self.checkbox,
            MutationKind::UpdateTitle => &self.title,
            MutationKind::UpdateDoDate => &self.do_date,
            MutationKind::UpdateDueDate => &self.due_date,
            MutationKind::UpdateCompletedDate => &self.completed_date,
            MutationKind::UpdateTaskType => &self.task_type,
            MutationKind::UpdateProject => &self.project,
            MutationKind::UpdateUrl => &self.url,
        };

        property
            .as_deref()
            .ok_or_else(|| RemoteError::MissingMapping(kind.as_str().to_string()))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("taskmirror.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("taskmirror").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sync.process_interval_minutes > SYNC_MAX_INTERVAL_MINUTES {
            anyhow::bail!(
                "process_interval_minutes cannot exceed {} (24 hours)",
                SYNC_MAX_INTERVAL_MINUTES
            );
        }

        if self.storage.database_url.is_empty() {
            anyhow::bail!("storage.database_url cannot be empty");
        }

        Ok(())
    }
}
