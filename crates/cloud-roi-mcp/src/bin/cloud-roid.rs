use std::io;

use cloud_roi_mcp::{RoiServer, ServerConfig, Transport};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // stdout carries JSON-RPC replies in stdio mode, so logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let cfg = ServerConfig::from_env()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let server = RoiServer::from_config(&cfg).map_err(io::Error::other)?;

    match cfg.transport {
        Transport::Stdio => {
            tracing::info!(db = %cfg.db_path.display(), "cloud-roid serving stdio");
            server.serve_stdio()
        }
        Transport::Http => server.serve_http(&cfg.http_addr),
    }
}
