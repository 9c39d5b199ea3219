use std::path::PathBuf;
use std::time;

use thiserror::Error;

/// Every way a neutralization run can fail. None of them are retried: the open transaction is
/// dropped and the run is reported as failed.
#[derive(Error, Debug)]
pub enum NeutralizeError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("connection to database {database} failed with: {error}")]
    ConnectionError {
        database: String,
        error: sqlx::Error,
    },
    #[error("timed out after {0:?} while connecting to database {1}")]
    ConnectionTimeout(time::Duration, String),
    #[error("database {0} is not an initialized Odoo database")]
    NotInitialized(String),
    #[error("{command} query failed with: {error}")]
    QueryError { command: String, error: sqlx::Error },
    #[error("neutralization script for module {module} failed with: {error}")]
    ScriptError { module: String, error: sqlx::Error },
    #[error("failed to read neutralization script {}: {error}", path.display())]
    ScriptReadError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl NeutralizeError {
    pub(crate) fn query(command: &str) -> impl FnOnce(sqlx::Error) -> Self + '_ {
        move |error| NeutralizeError::QueryError {
            command: command.to_owned(),
            error,
        }
    }
}
