//! Implementation of the `taskcache serve` command.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;

use crate::adapters::cache::TaskCache;
use crate::adapters::http::TasksHttpServer;
use crate::adapters::sqlite::{initialize_database, SqliteTaskStore};
use crate::domain::models::Config;
use crate::services::TaskService;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Start with a cold cache instead of preloading it
    #[arg(long)]
    pub no_preload: bool,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_preload {
            config.cache.preload_on_startup = false;
        }
    }
}

pub async fn execute(args: ServeArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    tracing::info!(url = %config.database.url, "database ready");

    let store = Arc::new(SqliteTaskStore::new(pool.clone()));
    let service = TaskService::new(store, Arc::new(TaskCache::new()))
        .with_request_timeout(config.database.request_timeout())
        .with_preload_timeout(config.cache.preload_timeout());

    if config.cache.preload_on_startup {
        if let Err(err) = service.preload().await {
            if config.cache.abort_on_preload_failure {
                pool.close().await;
                return Err(err).context("Cache preload failed");
            }
            tracing::warn!(
                error = %err,
                cached = service.cache().len(),
                "cache preload failed; serving with a partially populated cache"
            );
        }
    }
    tracing::info!(
        cached = service.cache().len(),
        populated = service.cache().is_populated(),
        "task cache ready"
    );

    let server = TasksHttpServer::new(service, config.server.clone());
    let served = server.serve_with_shutdown(shutdown_signal()).await;

    pool.close().await;
    tracing::info!("server stopped");
    served.context("HTTP server failed")
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let mut config = Config::default();
        let args = ServeArgs {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            no_preload: true,
        };

        args.apply(&mut config);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(!config.cache.preload_on_startup);
    }

    #[test]
    fn test_absent_args_keep_config() {
        let mut config = Config::default();
        ServeArgs::default().apply(&mut config);

        assert_eq!(config.server.port, 3003);
        assert!(config.cache.preload_on_startup);
    }
}
