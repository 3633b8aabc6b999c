use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::http::connection::Connection;
use crate::router::Router;

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Owns the listening socket and hands every accepted connection to its own
/// task.
///
/// Driven on a current-thread runtime, all connections share one thread and
/// only yield to each other while waiting for socket readiness.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    read_timeout: Option<Duration>,
}

impl Server {
    pub async fn bind<A: ToSocketAddrs>(addr: A, router: Router) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind listening socket")?;
        Ok(Self::new(listener, router))
    }

    pub fn new(listener: TcpListener, router: Router) -> Self {
        Self {
            listener,
            router: Arc::new(router),
            read_timeout: None,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("listening socket has no local address")
    }

    /// Accepts connections forever. Accept failures only affect the
    /// connection being accepted.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            debug!("Accepted connection from {}", peer);

            let router = Arc::clone(&self.router);
            let read_timeout = self.read_timeout;
            tokio::spawn(async move {
                let mut conn = Connection::new(socket, router).with_read_timeout(read_timeout);
                if let Err(e) = conn.run().await {
                    warn!("Connection error from {}: {:#}", peer, e);
                }
            });
        }
    }

    /// Runs until `shutdown` resolves, then closes the listening socket.
    /// Connections already accepted are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            res = self.run() => res,
            _ = shutdown => {
                info!("Shutting down listener");
                Ok(())
            }
        }
    }
}
