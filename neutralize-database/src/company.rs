use sqlx::PgConnection;

use crate::error::NeutralizeError;

pub const DEV_PREFIX: &str = "[DEV] ";

// The company created with the database. Odoo always gives it id 1.
pub const MAIN_COMPANY_ID: i32 = 1;

/// Prefix the main company's name with `[DEV] `, unless it already carries the tag.
/// Returns whether the name changed, so a second run reports `false`.
pub async fn tag_as_development(conn: &mut PgConnection) -> Result<bool, NeutralizeError> {
    let result = sqlx::query(
        r#"
UPDATE res_company
SET name = $1 || name
WHERE id = $2
AND name NOT LIKE '[DEV]%'
        "#,
    )
    .bind(DEV_PREFIX)
    .bind(MAIN_COMPANY_ID)
    .execute(conn)
    .await
    .map_err(NeutralizeError::query("tag_as_development"))?;

    Ok(result.rows_affected() > 0)
}

pub async fn company_name(conn: &mut PgConnection) -> Result<Option<String>, NeutralizeError> {
    sqlx::query_scalar::<_, String>("SELECT name FROM res_company WHERE id = $1")
        .bind(MAIN_COMPANY_ID)
        .fetch_optional(conn)
        .await
        .map_err(NeutralizeError::query("company_name"))
}
