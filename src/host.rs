//! Host message channel
//!
//! The host writes newline-delimited JSON messages to a Unix socket. Each
//! connection may carry any number of messages; malformed lines are logged and
//! skipped without closing the connection. A line longer than
//! [`MAX_LINE_BYTES`] closes the connection.

use keyhud_core::{HostMessage, HudError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Longest host line accepted, newline excluded
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to bind {}: {source}", path.display())]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Another keyhud is already listening on {}", .0.display())]
    InUse(PathBuf),

    #[error("No keyhud listening on {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid message: {0}")]
    Message(#[from] HudError),
}

/// Accepts host connections until dropped; removes the socket file on drop
pub struct HostListener {
    path: PathBuf,
    task: JoinHandle<()>,
}

impl HostListener {
    /// Bind `path` and forward every decoded message to `tx`.
    ///
    /// A leftover socket file with nobody behind it is replaced.
    pub fn bind(path: &Path, tx: mpsc::UnboundedSender<HostMessage>) -> Result<Self, HostError> {
        if path.exists() {
            if std::os::unix::net::UnixStream::connect(path).is_ok() {
                return Err(HostError::InUse(path.to_path_buf()));
            }
            debug!("Removing stale socket {}", path.display());
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(path).map_err(|source| HostError::Bind {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Listening for host messages on {}", path.display());

        let task = tokio::spawn(accept_loop(listener, tx));
        Ok(Self {
            path: path.to_path_buf(),
            task,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for HostListener {
    fn drop(&mut self) {
        self.task.abort();
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}

async fn accept_loop(listener: UnixListener, tx: mpsc::UnboundedSender<HostMessage>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                debug!("Host connected");
                tokio::spawn(read_messages(stream, tx.clone()));
            }
            Err(e) => {
                warn!("Accept failed: {}", e);
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    }
}

async fn read_messages(stream: UnixStream, tx: mpsc::UnboundedSender<HostMessage>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let limit = (MAX_LINE_BYTES + 1) as u64;
        match (&mut reader).take(limit).read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) if buf.len() > MAX_LINE_BYTES && buf.last() != Some(&b'\n') => {
                warn!("Host line exceeds {} bytes, closing connection", MAX_LINE_BYTES);
                break;
            }
            Ok(_) => {
                let Ok(line) = std::str::from_utf8(&buf) else {
                    warn!("Discarding host message: not UTF-8");
                    continue;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match HostMessage::decode(line) {
                    Ok(msg) => {
                        debug!("Host message {}", msg.action());
                        if tx.send(msg).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("Discarding host message: {}", e),
                }
            }
            Err(e) => {
                warn!("Host connection error: {}", e);
                break;
            }
        }
    }
    debug!("Host disconnected");
}

/// Read one message from a file (pretty-printed JSON is fine).
pub fn load_message_file(path: &Path) -> Result<HostMessage, HostError> {
    let text = std::fs::read_to_string(path)?;
    Ok(HostMessage::decode(&text)?)
}

/// Validate `text` and deliver it as a single line to the HUD at `path`.
pub async fn send_message(path: &Path, text: &str) -> Result<HostMessage, HostError> {
    let msg = HostMessage::decode(text)?;
    let value: serde_json::Value = serde_json::from_str(text).map_err(HudError::from)?;

    let mut stream = UnixStream::connect(path)
        .await
        .map_err(|source| HostError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
    stream.write_all(value.to_string().as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.shutdown().await?;
    Ok(msg)
}
