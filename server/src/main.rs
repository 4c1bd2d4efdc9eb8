use anyhow::Result;
use axum::Router;
use catalog_server::{build_app, AppOptions};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Catalog database directory
    #[arg(long, default_value = "./catalog-db")]
    db: PathBuf,
    /// Search tuning (boosts, rules, synonyms) as JSON
    #[arg(long)]
    search_config: Option<PathBuf>,
    /// Search backend base URL, e.g. http://localhost:9200
    #[arg(long)]
    es_url: Option<String>,
    /// Search backend index holding the products
    #[arg(long, default_value = "products")]
    es_index: String,
    /// Search backend request timeout in seconds
    #[arg(long, default_value_t = 5)]
    es_timeout_secs: u64,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app: Router = build_app(AppOptions {
        db_path: args.db,
        search_config: args.search_config,
        es_url: args.es_url,
        es_index: args.es_index,
        es_timeout: Duration::from_secs(args.es_timeout_secs),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    })?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
