use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::time::Duration;
use compact_str::CompactString;
use tokio::net::TcpListener;
use crate::command::Hub;
use crate::participant::{Msg, DEFAULT_MAILBOX_CAPACITY};
use crate::registry::{Registry, RegistryError};
use crate::router::{self, Router};
use crate::session::handle_user;
use crate::{DEFAULT_IP, DEFAULT_PORT};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// how long a connection may go without sending anything
    pub idle_timeout: Duration,
    pub mailbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(DEFAULT_IP, DEFAULT_PORT),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

/// Shared handle the sessions use to reach the registry and the router.
#[derive(Clone)]
pub struct Lobby {
    registry: Registry,
    router: Router,
}

impl Lobby {
    /// Must be called inside a tokio runtime, it spawns the broadcast fan-out.
    pub fn new() -> Self {
        let registry = Registry::new();
        let router = Router::spawn(registry.clone());
        Self { registry, router }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn broadcast(&self, msg: impl Into<Msg>) {
        self.router.submit(msg).await;
    }
}

impl Hub for Lobby {
    fn online(&self) -> Vec<CompactString> {
        self.registry.names()
    }

    fn send_private(&self, target: &str, msg: Msg) -> Result<(), RegistryError> {
        let participant = self
            .registry
            .lookup(target)
            .ok_or_else(|| RegistryError::Offline(target.into()))?;
        router::deliver_or_evict(&self.registry, &participant, msg);
        Ok(())
    }

    fn rename(&self, old: &str, new: &str) -> Result<(), RegistryError> {
        self.registry.rename(old, new)
    }
}

pub struct Server {
    listener: TcpListener,
    lobby: Lobby,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(mut config: ServerConfig) -> io::Result<Self> {
        if config.idle_timeout.is_zero() {
            config.idle_timeout = DEFAULT_IDLE_TIMEOUT;
        }
        let listener = TcpListener::bind(config.addr).await?;
        Ok(Self {
            listener,
            lobby: Lobby::new(),
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    /// Accepts connections forever, one session task each.
    pub async fn run(self) -> io::Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);
        loop {
            let (tcp, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::error!("accept failed: {err}");
                    if let Some(pause) = accept_backoff(&err) {
                        tokio::time::sleep(pause).await;
                    }
                    continue;
                }
            };
            tracing::trace!("{addr} connected");
            let (reader, writer) = tcp.into_split();
            tokio::spawn(handle_user(reader, writer, addr, self.lobby.clone(), self.config));
        }
    }
}

/// Errors about one connection are retried at once. Anything else, like
/// running out of file descriptors, would fail again immediately, so the
/// loop pauses first.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}
