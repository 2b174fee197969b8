//! Wheelspin server - hosts one prize wheel room over WebSocket.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wheelspin::prelude::*;
use wheelspin_session::StoreError;

/// Host a shared prize wheel.
#[derive(Debug, Parser)]
#[command(name = "wheelspin-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Room name; namespaces the stored session.
    #[arg(long, default_value = "wheel")]
    room: String,

    /// Directory for the session file. Without it the session lives in
    /// memory and is lost on exit.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), WheelspinError> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log)),
        )
        .init();

    let builder = WheelspinServer::builder().bind(&args.bind).room(&args.room);

    let server = match &args.data_dir {
        Some(dir) => {
            let storage = FileStorage::open(dir).await.map_err(StoreError::from)?;
            builder.build(storage).await?
        }
        None => {
            tracing::warn!("no --data-dir given, session will not survive a restart");
            builder.build(MemoryStorage::new()).await?
        }
    };

    server.run().await
}
