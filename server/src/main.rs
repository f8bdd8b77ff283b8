use anyhow::Result;
use axum::Router;
use clap::Parser;
use docqa_core::{Corpus, SharedCorpus, DEFAULT_MAX_CHARS};
use docqa_server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Directory used to resolve relative load paths
    #[arg(long, env = "DOCQA_DOCS_DIR", default_value = "./docs")]
    docs_dir: PathBuf,
    /// Folder to index at startup
    #[arg(long)]
    preload: Option<PathBuf>,
    /// Maximum characters per chunk
    #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
    max_chars: usize,
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let corpus = SharedCorpus::new(Corpus::with_max_chars(args.max_chars));
    if let Some(folder) = &args.preload {
        let (files, chunks) = corpus.add_folder(folder, true);
        tracing::info!(folder = %folder.display(), files, chunks, "preloaded folder");
    }
    let app: Router = build_app(ServerConfig::from_env(args.docs_dir), corpus)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
