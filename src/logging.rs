// src/logging.rs

use crate::errors::{AgentError, AgentResult};
use crate::models::ApiCallLog;
use chrono::Utc;
use flexi_logger::{FileSpec, Logger, LoggerHandle};
use std::path::PathBuf;
use std::time::Instant;

/// Directory holding the rotating log file. The terminal is owned by the UI,
/// so nothing is logged to stdout or stderr.
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("insights-agent")
}

/// Starts file logging. `RUST_LOG` wins over the configured level.
/// The returned handle must be kept alive for the lifetime of the program.
pub fn init_logging(level: &str) -> AgentResult<LoggerHandle> {
    Logger::try_with_env_or_str(level)
        .map_err(|e| AgentError::config_error(format!("Invalid log level: {}", e)))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir())
                .basename("insights-agent")
                .suppress_timestamp(),
        )
        .append()
        .format(flexi_logger::detailed_format)
        .start()
        .map_err(|e| AgentError::config_error(format!("Failed to start logger: {}", e)))
}

pub fn format_api_call(log: &ApiCallLog) -> String {
    format!(
        "[{}] {} - {} - Status: {} - Time: {}ms",
        log.timestamp.to_rfc3339(),
        log.endpoint,
        log.request_summary,
        log.response_status,
        log.response_time_ms
    )
}

/// Logs an API call.
pub fn log_api_call(log: &ApiCallLog) {
    log::info!(target: "api", "{}", format_api_call(log));
}

/// Builds the log entry for a finished call and logs it. A status of 0 means
/// no response was received.
pub fn record_api_call(endpoint: &str, summary: &str, status: u16, started: Instant) {
    log_api_call(&ApiCallLog {
        timestamp: Utc::now(),
        endpoint: endpoint.to_string(),
        request_summary: summary.to_string(),
        response_status: status,
        response_time_ms: started.elapsed().as_millis(),
    });
}
