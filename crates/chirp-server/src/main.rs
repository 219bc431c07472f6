//! chirp-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `CHIRP_*` environment variables, opens the SQLite store, starts one
//! ticket-distribution task per configured schedule, and serves the JSON API.
//!
//! The signing secret has no default; set `token_secret` in the file or
//! `CHIRP_TOKEN_SECRET` in the environment.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chirp_auth::TokenService;
use chirp_server::{AppState, ServerConfig, distributor::Distributor};
use chirp_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Chirp API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run every ticket schedule once at startup, then keep the daily timer.
  #[arg(long)]
  distribute_now: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CHIRP"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.validate().context("invalid configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let tokens = TokenService::new(&server_cfg.token_secret)
    .context("failed to initialise token service")?;

  // Ticket distribution.
  let distributor = Distributor::new(Arc::clone(&store), server_cfg.store_timeout());
  for schedule in &server_cfg.schedules {
    if cli.distribute_now {
      match distributor.run_once(schedule).await {
        Ok(report) => tracing::info!(
          right = %schedule.right,
          granted = report.granted,
          failed = report.failed,
          "startup ticket distribution finished"
        ),
        Err(e) => tracing::error!(error = %e, "startup ticket distribution aborted"),
      }
    }
    distributor.spawn(schedule.clone());
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, Arc::new(tokens), server_cfg);
  let app = chirp_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
