//! Logging setup for embedding applications.
//!
//! The engine itself only uses the `log` facade; this helper wires a
//! `fern` dispatch for shells that want timestamped file or stderr logs.

use anyhow::Result;

use crate::config::LoggingConfig;

/// Install the global logger per the logging configuration. No-op when
/// logging is disabled. Safe to call once per process.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug);

    let dispatch = match &config.file {
        Some(path) => dispatch.chain(fern::log_file(path)?),
        None => dispatch.chain(std::io::stderr()),
    };

    dispatch.apply()?;
    Ok(())
}
