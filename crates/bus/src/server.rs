// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedded bus server for single-node deployments and tests.
//!
//! Supervises a `nats-server` child process bound to loopback: spawn,
//! poll for readiness, hand out client connections, and shut down with
//! the process. Two or more in-process clients sharing one server is
//! supported; a second server on the same explicit port is refused.

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// How long `start` waits for the server to accept connections.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("nats-server binary not found on PATH")]
    BinaryMissing,

    #[error("server not ready within {READY_TIMEOUT:?}: {0}")]
    NotReady(String),

    #[error("address already in use: 127.0.0.1:{0}")]
    AddrInUse(u16),

    #[error("server is not running")]
    NotRunning,

    #[error("failed to connect client: {0}")]
    Connect(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Embedded server options.
#[derive(Debug, Clone)]
pub struct ServerOpts {
    /// Server name, visible in monitoring output.
    pub name: String,
    /// Enable persistent streams (JetStream) with file storage.
    pub enable_persistent_streams: bool,
    /// Optional persistence domain, isolating streams from other servers.
    pub persistent_domain: Option<String>,
    /// Listen port; 0 picks a random free port.
    pub port: u16,
    /// Storage directory for persistent streams. A temp directory is used
    /// when unset.
    pub store_dir: Option<PathBuf>,
    /// Pass server logging through to stderr.
    pub enable_logging: bool,
}

impl Default for ServerOpts {
    fn default() -> Self {
        Self {
            name: "compozy".to_string(),
            enable_persistent_streams: false,
            persistent_domain: None,
            port: 0,
            store_dir: None,
            enable_logging: false,
        }
    }
}

/// Lifecycle handle for the in-process bus server.
pub struct EmbeddedServer {
    opts: ServerOpts,
    child: Option<Child>,
    port: u16,
}

impl EmbeddedServer {
    pub fn new(opts: ServerOpts) -> Self {
        Self { opts, child: None, port: 0 }
    }

    /// Loopback URL for client connections. Valid after `start`.
    pub fn url(&self) -> String {
        format!("nats://127.0.0.1:{}", self.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Spawn the server and block until it accepts connections.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        if self.child.is_some() {
            return Ok(());
        }

        let port = match self.opts.port {
            0 => free_port()?,
            explicit => {
                // Refuse to double-bind a port another server already owns.
                if std::net::TcpStream::connect(("127.0.0.1", explicit)).is_ok() {
                    return Err(ServerError::AddrInUse(explicit));
                }
                explicit
            }
        };

        let mut command = Command::new("nats-server");
        command.arg("-a").arg("127.0.0.1");
        command.arg("-p").arg(port.to_string());
        command.arg("-n").arg(&self.opts.name);
        if self.opts.enable_persistent_streams {
            command.arg("-js");
            if let Some(dir) = &self.opts.store_dir {
                std::fs::create_dir_all(dir)?;
                command.arg("-sd").arg(dir);
            }
            if let Some(domain) = &self.opts.persistent_domain {
                command.arg("--jetstream_domain").arg(domain);
            }
        }
        if self.opts.enable_logging {
            command.arg("-DV");
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ServerError::BinaryMissing
            } else {
                ServerError::Io(e)
            }
        })?;

        // ReadyForConnections: poll the listen port until it accepts.
        let deadline = tokio::time::Instant::now() + READY_TIMEOUT;
        loop {
            if let Some(status) = child.try_wait()? {
                return Err(ServerError::NotReady(format!("server exited: {status}")));
            }
            if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                let _ = child.start_kill();
                return Err(ServerError::NotReady("listen port never opened".to_string()));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        info!(name = %self.opts.name, port, "embedded bus server ready");
        self.child = Some(child);
        self.port = port;
        Ok(())
    }

    /// Connect a new client to the running server.
    pub async fn client(&self) -> Result<async_nats::Client, ServerError> {
        if self.child.is_none() {
            return Err(ServerError::NotRunning);
        }
        async_nats::connect(self.url()).await.map_err(|e| ServerError::Connect(e.to_string()))
    }

    /// Whether the server process is alive.
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kill the server and wait for the process to drain.
    pub async fn shutdown(&mut self) -> Result<(), ServerError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        debug!(port = self.port, "shutting down embedded bus server");
        child.start_kill()?;
        child.wait().await?;
        Ok(())
    }
}

fn free_port() -> Result<u16, ServerError> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
