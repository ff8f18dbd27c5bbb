//! otodo session server.
//!
//! Serves password and GitHub login, token refresh and logout over HTTP,
//! backed by PostgreSQL or, for development, an in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use otodo::{
    OAuthBridge, SessionManager,
    db::{CredentialStore, Database, MemoryStore, PgCredentialStore},
    oauth::GithubProvider,
};
use otodo_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging,
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the otodo session server

USAGE:
  otodo_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/otodo]

FLAGS:
  --in-memory              Keep users and revocations in process memory (seeds admin/admin123)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                           Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                          PostgreSQL connection string
  JWT_SECRET                            Token signing secret (required, at least 32 characters)
  PASSWORD_SALT                         Password digest salt
  ACCESS_TOKEN_LIFETIME_SECS            Access token lifetime [default: 900]
  REFRESH_TOKEN_LIFETIME_SECS           Refresh token lifetime [default: 1296000]
  ACCESS_TOKEN_REFRESH_THRESHOLD_SECS   Renewal threshold [default: 300]
  GITHUB_CLIENT_ID                      GitHub OAuth app id (enables GitHub login)
  GITHUB_CLIENT_SECRET                  GitHub OAuth app secret
  GITHUB_CALLBACK_URL                   GitHub OAuth redirect URL
  OAUTH_TIMEOUT_SECS                    GitHub request timeout [default: 10]
  RUST_LOG                              Log filter [default: info,sqlx=warn,hyper=warn]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let in_memory = pargs.contains("--in-memory");
    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url, in_memory)?;
    config.validate()?;

    let database = if config.in_memory {
        info!("Using in-memory credential store");
        None
    } else {
        info!("Connecting to database");
        let database = Database::new(&config.database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
        database
            .migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to apply schema: {}", e))?;
        info!("Database connected successfully");
        Some(database)
    };

    let store: Arc<dyn CredentialStore> = match &database {
        Some(database) => Arc::new(PgCredentialStore::new(database.pool().clone())),
        None => Arc::new(MemoryStore::with_seed_data()),
    };

    let sessions = SessionManager::new(store.clone(), &config.session);

    let oauth = match &config.oauth {
        Some(oauth_config) => {
            let provider = GithubProvider::new(oauth_config.clone())?;
            info!("GitHub login enabled");
            Some(Arc::new(OAuthBridge::new(
                Arc::new(provider),
                store,
                sessions.clone(),
                oauth_config,
            )))
        }
        None => {
            info!("GitHub login disabled (GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET not set)");
            None
        }
    };

    let app = api::create_router(AppState {
        sessions: Arc::new(sessions),
        oauth,
        database: database.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    if let Some(database) = database {
        database.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
