//! `midras` command-line entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use midras_embedding::{Embedder, EmbeddingConfig, InMemoryEmbedder};
use midras_server::{AppState, ServerError, serve, shutdown_signal};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "midras", version, about = "Multi-vector document retrieval tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the local embedding server.
    Server(ServerArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// ColPali running in-process.
    Colpali,
    /// Deterministic hash embedder, no model required.
    InMemory,
}

#[derive(Debug, Args)]
struct ServerArgs {
    #[arg(long, env = "MIDRAS_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "MIDRAS_PORT", default_value_t = 8765)]
    port: u16,

    #[arg(long, value_enum, default_value_t = Backend::Colpali)]
    backend: Backend,

    /// Directory holding ColPali weights and tokenizer.json.
    #[arg(long, env = "MIDRAS_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Vector width per token/patch.
    #[arg(long, default_value_t = midras_embedding::COLPALI_DIMENSIONS)]
    dimensions: usize,

    /// Directory containing the pdfium shared library.
    #[cfg(feature = "pdfium")]
    #[arg(long, env = "PDFIUM_DYNAMIC_LIB_PATH")]
    pdfium_dir: Option<PathBuf>,
}

fn build_embedder(args: &ServerArgs) -> Result<Arc<dyn Embedder>, ServerError> {
    let config = EmbeddingConfig::builder().dimensions(args.dimensions).build();
    match args.backend {
        Backend::InMemory => Ok(Arc::new(InMemoryEmbedder::new(config))),
        #[cfg(feature = "local")]
        Backend::Colpali => {
            use midras_embedding::{LocalEmbedder, ModelFiles};
            let embedder = match &args.model_dir {
                Some(dir) => LocalEmbedder::from_files(config, &ModelFiles::from_dir(dir)?)?,
                None => LocalEmbedder::new(config)?,
            };
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "local"))]
        Backend::Colpali => Err(ServerError::from(midras_embedding::EmbeddingError::Unsupported(
            "this build has no local model support; rebuild with the `local` feature".into(),
        ))),
    }
}

fn build_state(args: &ServerArgs) -> Result<AppState, ServerError> {
    let state = AppState::new(build_embedder(args)?);

    #[cfg(feature = "pdfium")]
    let state = {
        let mut rasterizer = midras_embedding::PdfiumRasterizer::new();
        if let Some(dir) = &args.pdfium_dir {
            rasterizer = rasterizer.with_library_dir(dir);
        }
        state.with_rasterizer(Arc::new(rasterizer))
    };

    Ok(state)
}

/// Binds `host:port`; hostnames such as `localhost` are resolved.
async fn bind(args: &ServerArgs) -> Result<TcpListener, ServerError> {
    Ok(TcpListener::bind((args.host.as_str(), args.port)).await?)
}

async fn run_server(args: ServerArgs) -> Result<(), ServerError> {
    tracing::info!(backend = ?args.backend, dimensions = args.dimensions, "loading embedder");
    let state = build_state(&args)?;

    let listener = bind(&args).await?;
    serve(listener, state, shutdown_signal()).await
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Server(args) => run_server(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let cli = Cli::try_parse_from(["midras", "server", "--backend", "in-memory"]).unwrap();
        let Command::Server(args) = cli.command;
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8765);
        assert_eq!(args.backend, Backend::InMemory);
        assert_eq!(args.dimensions, 128);
    }

    #[test]
    fn in_memory_backend_builds_without_model() {
        let cli = Cli::try_parse_from([
            "midras", "server", "--backend", "in-memory", "--dimensions", "32", "--port", "9000",
        ])
        .unwrap();
        let Command::Server(args) = cli.command;
        let embedder = build_embedder(&args).unwrap();
        assert_eq!(embedder.name(), "in-memory");
        assert_eq!(embedder.dimensions(), 32);
        assert_eq!(args.port, 9000);
    }

    #[tokio::test]
    async fn hostname_is_resolved_when_binding() {
        let cli = Cli::try_parse_from([
            "midras", "server", "--backend", "in-memory", "--host", "localhost", "--port", "0",
        ])
        .unwrap();
        let Command::Server(args) = cli.command;
        let listener = bind(&args).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn ip_literal_host_still_binds() {
        let cli = Cli::try_parse_from(["midras", "server", "--host", "127.0.0.1", "--port", "0"])
            .unwrap();
        let Command::Server(args) = cli.command;
        let listener = bind(&args).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["midras", "server", "--backend", "gpt"]).is_err());
    }
}
