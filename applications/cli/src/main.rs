//! `recsync` binary: fill recording gaps from peer servers

use anyhow::Context;
use clap::error::ErrorKind;
use clap::CommandFactory;
use recsync_cli::{Cli, CliError, RecSyncConfig};
use recsync_engine::{SyncError, SyncManager};
use recsync_storage::{
    create_pool, run_migrations, LocalRecordStore, SqliteMetadataService, SqliteRemoteRegistry,
};
use recsync_transfer::LocalFileMover;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::parse_from_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(cli_error) = e.downcast_ref::<CliError>() {
                eprintln!("{}", cli_error);
                if matches!(cli_error, CliError::Usage(_)) {
                    eprintln!("{}", Cli::command().render_usage());
                }
                return ExitCode::from(cli_error.exit_code());
            }
            if let Some(SyncError::Configuration(_) | SyncError::AlreadyRunning(_)) =
                e.downcast_ref::<SyncError>()
            {
                eprintln!("{}", e);
                return ExitCode::from(2);
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    let request = cli.command.into_request()?;

    let config = RecSyncConfig::load(cli.config.as_deref())?;
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let pool = create_pool(&config.database.url)
        .await
        .with_context(|| format!("opening {}", config.database.url))?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let remotes = Arc::new(SqliteRemoteRegistry::new(
        config.remote_urls()?,
        config.remote_query_timeout(),
    ));
    tracing::debug!(servers = ?remotes.server_ids(), "Remote servers configured");

    let manager = Arc::new(SyncManager::new(
        Arc::new(LocalRecordStore::new(pool.clone())),
        remotes.clone(),
        Arc::new(SqliteMetadataService::new(pool)),
        Arc::new(LocalFileMover::new()),
        config.sync_settings(),
    ));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current item");
            interrupt.cancel();
        }
    });

    let now = chrono::Local::now().naive_local();
    let (mut progress, handle) = manager.start(request, now, cancel);

    while let Some(update) = progress.recv().await {
        tracing::debug!(
            phase = ?update.phase,
            processed = update.processed_items,
            total = update.total_items,
            percentage = update.percentage,
            item = update.current_item.as_deref().unwrap_or(""),
            "Progress"
        );
    }

    let summary = handle.await??;
    let unreachable = remotes.unreachable_servers();
    if !unreachable.is_empty() {
        tracing::warn!(servers = ?unreachable, "Remote servers were unreachable during the run");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }

    Ok(())
}
