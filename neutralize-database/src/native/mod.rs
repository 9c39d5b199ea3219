//! The native neutralization entry point.
//!
//! Every installed module may ship a `data/neutralize.sql` script that switches off whatever the
//! module connects to the outside world (mail servers, crons, webhooks, provider credentials...).
//! Scripts are looked up in the configured addons directories first, then among the scripts built
//! into this binary for the standard modules.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::{debug, info};

use crate::error::NeutralizeError;

const BUILTIN_SCRIPTS: [(&str, &str); 8] = [
    ("base", include_str!("scripts/base.sql")),
    ("base_automation", include_str!("scripts/base_automation.sql")),
    ("delivery", include_str!("scripts/delivery.sql")),
    ("iap", include_str!("scripts/iap.sql")),
    ("mail", include_str!("scripts/mail.sql")),
    ("payment", include_str!("scripts/payment.sql")),
    ("web", include_str!("scripts/web.sql")),
    ("website", include_str!("scripts/website.sql")),
];

#[async_trait]
pub trait Neutralize {
    /// Disable everything the installed modules know how to disable, on the caller's connection
    /// so that an open transaction covers it. Returns the modules whose scripts ran.
    async fn neutralize(&self, conn: &mut PgConnection) -> Result<Vec<String>, NeutralizeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Addon(PathBuf),
    Builtin,
}

#[derive(Debug)]
pub struct ModuleScript {
    pub module: String,
    pub source: ScriptSource,
    pub sql: String,
}

pub fn builtin_script(module: &str) -> Option<&'static str> {
    BUILTIN_SCRIPTS
        .iter()
        .find(|(name, _)| *name == module)
        .map(|(_, sql)| *sql)
}

pub async fn installed_modules(conn: &mut PgConnection) -> Result<Vec<String>, NeutralizeError> {
    sqlx::query_scalar::<_, String>(
        r#"
SELECT name
FROM ir_module_module
WHERE state IN ('installed', 'to upgrade', 'to remove')
ORDER BY name
        "#,
    )
    .fetch_all(conn)
    .await
    .map_err(NeutralizeError::query("installed_modules"))
}

/// Runs the `neutralize.sql` script of each installed module.
pub struct ModuleScripts {
    addons_paths: Vec<PathBuf>,
}

impl ModuleScripts {
    pub fn new(addons_paths: Vec<PathBuf>) -> Self {
        Self { addons_paths }
    }

    /// Find the script for `module`. An addon directory shadows the built-in script.
    pub async fn resolve(&self, module: &str) -> Result<Option<ModuleScript>, NeutralizeError> {
        for dir in &self.addons_paths {
            let path = script_path(dir, module);

            let exists = tokio::fs::try_exists(&path).await.map_err(|error| {
                NeutralizeError::ScriptReadError {
                    path: path.clone(),
                    error,
                }
            })?;
            if !exists {
                continue;
            }

            let sql = tokio::fs::read_to_string(&path)
                .await
                .map_err(|error| NeutralizeError::ScriptReadError {
                    path: path.clone(),
                    error,
                })?;

            return Ok(Some(ModuleScript {
                module: module.to_owned(),
                source: ScriptSource::Addon(path),
                sql: sql.trim().to_owned(),
            }));
        }

        Ok(builtin_script(module).map(|sql| ModuleScript {
            module: module.to_owned(),
            source: ScriptSource::Builtin,
            sql: sql.trim().to_owned(),
        }))
    }
}

fn script_path(addons_dir: &Path, module: &str) -> PathBuf {
    addons_dir.join(module).join("data").join("neutralize.sql")
}

#[async_trait]
impl Neutralize for ModuleScripts {
    async fn neutralize(&self, conn: &mut PgConnection) -> Result<Vec<String>, NeutralizeError> {
        let modules = installed_modules(&mut *conn).await?;
        let mut neutralized = Vec::new();

        for module in modules {
            let script = match self.resolve(&module).await? {
                Some(script) if !script.sql.is_empty() => script,
                _ => continue,
            };

            debug!(
                module = %script.module,
                source = ?script.source,
                "running neutralization script"
            );

            sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(&script.sql))
                .await
                .map_err(|error| NeutralizeError::ScriptError {
                    module: module.clone(),
                    error,
                })?;

            neutralized.push(module);
        }

        info!(modules = neutralized.len(), "neutralization finished");

        Ok(neutralized)
    }
}
