use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use tracing::debug;

use crate::config::Config;
use crate::error::NeutralizeError;

// Tables the neutralizer writes to directly. A database missing any of them was never initialized
// by Odoo, or belongs to something else entirely.
const REQUIRED_TABLES: [&str; 3] = ["ir_config_parameter", "res_company", "ir_module_module"];

/// Open the single session used for the whole run.
pub async fn open(config: &Config, db_name: &str) -> Result<PgConnection, NeutralizeError> {
    let options = config.connect_options(db_name)?;

    debug!(
        host = %config.db_host,
        port = config.db_port,
        database = db_name,
        "connecting"
    );

    open_with(&options, config.connect_timeout()).await
}

pub async fn open_with(
    options: &PgConnectOptions,
    timeout: Duration,
) -> Result<PgConnection, NeutralizeError> {
    let database = options.get_database().unwrap_or_default().to_owned();

    let conn = tokio::time::timeout(timeout, PgConnection::connect_with(options))
        .await
        .map_err(|_| NeutralizeError::ConnectionTimeout(timeout, database.clone()))?
        .map_err(|error| NeutralizeError::ConnectionError { database, error })?;

    Ok(conn)
}

/// Fail with `NotInitialized` unless every table the run touches directly exists.
pub async fn ensure_initialized(conn: &mut PgConnection) -> Result<(), NeutralizeError> {
    let database: String = sqlx::query_scalar("SELECT current_database()::text")
        .fetch_one(&mut *conn)
        .await
        .map_err(NeutralizeError::query("current_database"))?;

    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(table)
            .fetch_one(&mut *conn)
            .await
            .map_err(NeutralizeError::query("to_regclass"))?;

        if !exists {
            debug!(table, "required table is missing");
            return Err(NeutralizeError::NotInitialized(database));
        }
    }

    Ok(())
}

pub async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!("failed to close connection cleanly: {}", e);
    }
}
