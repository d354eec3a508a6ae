use anyhow::{Context, Result};
use clap::Parser;
use docembed::{api, config, logging, processing::EmbeddingService};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "docembed",
    about = "Serve PDF/DOCX to embedding conversion over HTTP"
)]
struct Cli {
    /// Port to listen on (overrides `SERVER_PORT`).
    #[arg(long)]
    port: Option<u16>,
    /// Directory for in-flight uploads (overrides `STAGING_DIR`).
    #[arg(long)]
    staging_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();

    let mut loaded = config::load_config().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        loaded.server_port = Some(port);
    }
    if let Some(staging_dir) = cli.staging_dir {
        loaded.staging_dir = staging_dir;
    }
    let config = config::init_config(loaded);

    let service =
        EmbeddingService::from_config(config).context("failed to initialize embedding service")?;
    let app = api::create_router(Arc::new(service), config.max_upload_bytes);

    let (listener, port) = bind_listener().await.context("failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 5000..=5099;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 5000-5099",
    ))
}
