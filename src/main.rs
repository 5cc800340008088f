use anyhow::Context;
use memberhub::{
    api::routes::app,
    cli::{Cli, Commands},
    db::AccountDraft,
    types::Role,
    utils::toml_config::{HubConfig, LogFormat},
    AppState, TursoClient,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RUST_LOG wins over the configured level; `--verbose` forces debug.
fn init_tracing(config: &HubConfig, verbose: bool) {
    let fallback = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    let config = HubConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    init_tracing(&config, cli.verbose);

    let turso = Arc::new(
        TursoClient::new_local(&config.database.url)
            .await
            .context("opening database")?,
    );
    let secret = config.jwt_secret()?;
    let bind_address = config.bind_address();
    let state = AppState::new(config, turso, secret.as_bytes())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(state, &bind_address).await,
        Commands::PurgeSessions => {
            let removed = state.ledger.purge_expired().await?;
            tracing::info!(removed, "Purged expired sessions");
            println!("Removed {} expired session(s)", removed);
            Ok(())
        }
        Commands::CreateAdmin {
            email,
            name,
            password,
        } => {
            let admin = state
                .authenticator
                .provision(AccountDraft {
                    name,
                    email,
                    password,
                    role: Role::Admin,
                    ..Default::default()
                })
                .await?;
            println!("Created admin {} ({})", admin.email, admin.id);
            Ok(())
        }
    }
}

async fn serve(state: AppState, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("binding {}", bind_address))?;
    tracing::info!(address = %bind_address, "memberhub listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
