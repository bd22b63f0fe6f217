use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokengate::jwt::{TokenCategory, TokenCodec};
use tokengate::store::postgres::PgRefreshStore;
use tokengate::{cli, config, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "tokengate=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Token { command }) => handle_token_command(&cfg, command),
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let store = PgRefreshStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    store.migrate().await?;

    let codec = TokenCodec::new(&cfg.secret);
    let sweep_at = cfg.sweep_at;

    let state = Arc::new(AppState {
        codec,
        store: Arc::new(store),
        config: cfg,
    });

    let app = tokengate::router(state.clone());

    jobs::sweeper::spawn(state.store.clone(), sweep_at);
    tracing::info!("Refresh token sweep scheduled daily at {} UTC", sweep_at);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("tokengate listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn handle_token_command(cfg: &config::Config, cmd: cli::TokenCommands) -> anyhow::Result<()> {
    let codec = TokenCodec::new(&cfg.secret);
    match cmd {
        cli::TokenCommands::Mint {
            category,
            subject,
            role,
            ttl_ms,
        } => {
            let category: TokenCategory = category.parse()?;
            let role = role.parse()?;
            let token = codec.mint(
                category,
                &subject,
                role,
                chrono::Duration::milliseconds(ttl_ms),
            )?;
            println!("{token}");
        }
        cli::TokenCommands::Inspect { token } => {
            let claims = codec.decode(&token)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }
    Ok(())
}
