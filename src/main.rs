use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nanohttp::config::Config;
use nanohttp::handlers::{self, PersonStore};
use nanohttp::server::{stop_on_command, Server};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    // One thread multiplexes every connection.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(serve(cfg))
}

async fn serve(cfg: Config) -> anyhow::Result<()> {
    let store = Arc::new(PersonStore::new());
    let router = handlers::router(store)?;

    let server = Server::bind(&cfg.listen_addr, router)
        .await?
        .with_read_timeout(cfg.read_timeout());

    // A closed stdin drops the sender; only Ctrl-C can stop the server then.
    let stop = stop_on_command(std::io::BufReader::new(std::io::stdin()), "stop");

    server
        .run_until(async {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                }
                Ok(()) = stop => {
                    tracing::info!("Stop command received");
                }
            }
        })
        .await
}
