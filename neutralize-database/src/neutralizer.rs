use sqlx::{Connection, PgConnection};
use tracing::{debug, info};

use crate::company;
use crate::config_parameter::{self, DEVELOPMENT_FLAG_KEY, LICENSE_KEYS};
use crate::database;
use crate::error::NeutralizeError;
use crate::native::Neutralize;

// The neutralizer reports what it did, this is mostly for the summary and for tests
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NeutralizeReport {
    pub regenerated_params: usize,
    pub neutralized_modules: Vec<String>,
    pub license_keys_removed: u64,
    pub company_renamed: bool,
}

/// The steps of a run, in order. Handed to the progress callback right before each one starts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Step {
    RegenerateIdentity,
    NativeNeutralization,
    RemoveLicense,
    FlagDevelopment,
    TagCompany,
}

pub struct Neutralizer<N> {
    native: N,
    http_port: u16,
}

impl<N: Neutralize + Send + Sync> Neutralizer<N> {
    pub fn new(native: N, http_port: u16) -> Self {
        Self { native, http_port }
    }

    /// Sanitize the database behind `conn` in place. Either every step is committed, or the
    /// transaction is dropped and rolled back on the first error.
    pub async fn run(&self, conn: &mut PgConnection) -> Result<NeutralizeReport, NeutralizeError> {
        self.run_with_progress(conn, |_| {}).await
    }

    pub async fn run_with_progress<F>(
        &self,
        conn: &mut PgConnection,
        mut progress: F,
    ) -> Result<NeutralizeReport, NeutralizeError>
    where
        F: FnMut(Step),
    {
        let mut step = |step: Step| {
            debug!(?step, "starting step");
            progress(step);
        };

        database::ensure_initialized(&mut *conn).await?;

        let mut tx = conn
            .begin()
            .await
            .map_err(NeutralizeError::query("begin"))?;

        step(Step::RegenerateIdentity);
        let regenerated_params =
            config_parameter::regenerate_defaults(&mut *tx, self.http_port).await?;

        step(Step::NativeNeutralization);
        let neutralized_modules = self.native.neutralize(&mut *tx).await?;

        step(Step::RemoveLicense);
        let license_keys_removed =
            config_parameter::delete_params(&mut *tx, &LICENSE_KEYS).await?;

        step(Step::FlagDevelopment);
        config_parameter::set_param(&mut *tx, DEVELOPMENT_FLAG_KEY, "true").await?;

        step(Step::TagCompany);
        let company_renamed = company::tag_as_development(&mut *tx).await?;

        tx.commit().await.map_err(NeutralizeError::query("commit"))?;

        info!(
            regenerated_params,
            modules = neutralized_modules.len(),
            license_keys_removed,
            company_renamed,
            "database neutralized"
        );

        Ok(NeutralizeReport {
            regenerated_params,
            neutralized_modules,
            license_keys_removed,
            company_renamed,
        })
    }
}
