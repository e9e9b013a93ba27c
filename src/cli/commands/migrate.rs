//! Implementation of the `taskcache migrate` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::adapters::sqlite::{all_embedded_migrations, create_pool, Migrator, PoolConfig};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Database URL (overrides database.url)
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct MigrateOutput {
    pub database_url: String,
    pub applied: usize,
    pub schema_version: i64,
}

impl CommandOutput for MigrateOutput {
    fn to_human(&self) -> String {
        if self.applied == 0 {
            format!(
                "Database {} is up to date (schema version {})",
                self.database_url, self.schema_version
            )
        } else {
            format!(
                "Applied {} migration(s) to {} (schema version {})",
                self.applied, self.database_url, self.schema_version
            )
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn run(database_url: &str, pool_config: PoolConfig) -> Result<MigrateOutput> {
    let pool = create_pool(database_url, Some(pool_config))
        .await
        .context("Failed to connect to database")?;
    let migrator = Migrator::new(pool.clone());

    let applied = migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .context("Failed to run database migrations")?;
    let schema_version = migrator
        .get_current_version()
        .await
        .context("Failed to read schema version")?;
    pool.close().await;

    Ok(MigrateOutput {
        database_url: database_url.to_string(),
        applied,
        schema_version,
    })
}

pub async fn execute(args: MigrateArgs, config: Config, json_mode: bool) -> Result<()> {
    let database_url = args.database_url.unwrap_or_else(|| config.database.url.clone());
    let result = run(&database_url, PoolConfig::from(&config.database)).await?;
    tracing::info!(applied = result.applied, version = result.schema_version, "migrations complete");
    output(&result, json_mode);
    Ok(())
}
