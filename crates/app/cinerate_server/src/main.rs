//! Cinerate API server binary.
//!
//! Serves the REST API over PostgreSQL, or over an in-memory store seeded
//! with demo data when started with `--in-memory`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cinerate_api::config::ApiConfig;
use cinerate_core::auth::TokenBlacklist;
use cinerate_core::store::Stores;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// CLI arguments. Unset options fall back to the environment (see `ApiConfig::from_env`).
#[derive(Parser, Debug)]
#[command(name = "cinerate_server", about = "Cinerate movie rating API server")]
struct Args {
    /// Address to listen on, e.g. `0.0.0.0:8080`. Overrides `BIND_ADDR`.
    #[arg(long)]
    bind_addr: Option<String>,

    /// PostgreSQL connection URL. Overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Serve from an in-memory store seeded with demo users and movies.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,cinerate_api=debug,cinerate_core=debug"
                    .parse()
                    .unwrap()
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(addr) = args.bind_addr {
        config.bind_addr = addr;
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }

    info!(
        bind_addr = %config.bind_addr,
        in_memory = args.in_memory,
        token_validity_mins = config.token_validity_mins,
        "starting cinerate_server"
    );

    let stores = if args.in_memory {
        let stores = Stores::in_memory();
        cinerate_core::seed::seed_demo_data(&stores).await?;
        stores
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.database_url)
            .await?;

        info!("running database migrations");
        cinerate_core::migrate::migrate(&pool).await?;
        Stores::postgres(pool)
    };

    let state = cinerate_api::AppState::new(config.clone(), stores);
    let ct = CancellationToken::new();

    let prune_handle = tokio::spawn(prune_blacklist(
        state.blacklist.clone(),
        Duration::from_secs(config.prune_interval_secs),
        ct.clone(),
    ));

    tokio::spawn({
        let ct = ct.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                return;
            }
            info!("shutdown requested");
            ct.cancel();
        }
    });

    let app = cinerate_api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(ct.clone().cancelled_owned())
        .await;

    ct.cancel();
    let _ = prune_handle.await;
    result?;

    info!("server stopped");
    Ok(())
}

/// Periodically drop blacklist entries whose tokens have expired.
async fn prune_blacklist(blacklist: Arc<TokenBlacklist>, every: Duration, ct: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ct.cancelled() => break,
            _ = interval.tick() => {
                let removed = blacklist.prune(Utc::now());
                if removed > 0 {
                    debug!(removed, remaining = blacklist.len(), "pruned token blacklist");
                }
            }
        }
    }
}
