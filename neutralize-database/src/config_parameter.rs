//! Operations on `ir_config_parameter`, Odoo's key-value settings table.

use chrono::Utc;
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::NeutralizeError;

/// Keys tying a database to a commercial license or subscription.
pub const LICENSE_KEYS: [&str; 6] = [
    "database.enterprise_code",
    "database.expiration_date",
    "database.expiration_reason",
    "database.already_linked_subscription_url",
    "database.already_linked_email",
    "database.already_linked_send_mail_url",
];

pub const DEVELOPMENT_FLAG_KEY: &str = "database.is_development";

pub async fn get_param(
    conn: &mut PgConnection,
    key: &str,
) -> Result<Option<String>, NeutralizeError> {
    sqlx::query_scalar::<_, String>("SELECT value FROM ir_config_parameter WHERE key = $1")
        .bind(key)
        .fetch_optional(conn)
        .await
        .map_err(NeutralizeError::query("get_param"))
}

/// Insert `key`, or overwrite its value if it already exists.
pub async fn set_param(
    conn: &mut PgConnection,
    key: &str,
    value: &str,
) -> Result<(), NeutralizeError> {
    sqlx::query(
        r#"
INSERT INTO ir_config_parameter (key, value)
VALUES ($1, $2)
ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await
    .map_err(NeutralizeError::query("set_param"))?;

    Ok(())
}

/// Delete each of `keys`. Missing keys are not an error; returns the number of rows removed.
pub async fn delete_params(
    conn: &mut PgConnection,
    keys: &[&str],
) -> Result<u64, NeutralizeError> {
    let mut removed = 0;

    for &key in keys {
        let result = sqlx::query("DELETE FROM ir_config_parameter WHERE key = $1")
            .bind(key)
            .execute(&mut *conn)
            .await
            .map_err(NeutralizeError::query("delete_params"))?;

        debug!(key, rows = result.rows_affected(), "deleted parameter");
        removed += result.rows_affected();
    }

    Ok(removed)
}

/// The parameters every database is created with, freshly generated.
fn default_parameters(http_port: u16) -> Vec<(&'static str, String)> {
    vec![
        ("database.secret", Uuid::new_v4().to_string()),
        ("database.uuid", Uuid::now_v7().to_string()),
        (
            "database.create_date",
            Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        ("web.base.url", format!("http://localhost:{}", http_port)),
        ("base.login_cooldown_after", "10".to_owned()),
        ("base.login_cooldown_duration", "60".to_owned()),
    ]
}

/// Overwrite the installation identity (secret, uuid, creation date) and the other default
/// parameters, whether or not they were already set. Returns how many were written.
pub async fn regenerate_defaults(
    conn: &mut PgConnection,
    http_port: u16,
) -> Result<usize, NeutralizeError> {
    let defaults = default_parameters(http_port);

    for (key, value) in &defaults {
        set_param(&mut *conn, key, value).await?;
    }

    Ok(defaults.len())
}
