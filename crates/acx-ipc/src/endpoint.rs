//! Socket endpoints for the process topology.
//!
//! All four streams are Unix-domain sockets inside one run-scoped
//! directory. Each process binds the sockets it reads and connects to the
//! sockets its peers bind; connects retry briefly because the processes
//! start concurrently.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};

/// Well-known socket names inside the socket directory.
const VIOLATIONS_SOCKET: &str = "violations.sock";
const NOTICES_SOCKET: &str = "notices.sock";
const PAYMENTS_SOCKET: &str = "payments.sock";
const CONFIRMATIONS_SOCKET: &str = "confirmations.sock";

/// The run's socket directory and the paths inside it.
#[derive(Debug, Clone)]
pub struct SocketDir {
    root: PathBuf,
}

impl SocketDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Simulator/radar → notice generator.
    pub fn violations(&self) -> PathBuf {
        self.root.join(VIOLATIONS_SOCKET)
    }

    /// Notice generator → airline portal.
    pub fn notices(&self) -> PathBuf {
        self.root.join(NOTICES_SOCKET)
    }

    /// Airline portal → payment service.
    pub fn payments(&self) -> PathBuf {
        self.root.join(PAYMENTS_SOCKET)
    }

    /// Payment service → notice generator.
    pub fn confirmations(&self) -> PathBuf {
        self.root.join(CONFIRMATIONS_SOCKET)
    }
}

/// Bind a listener, clearing any stale socket file from a previous run.
pub async fn bind(path: &Path) -> std::io::Result<UnixListener> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    UnixListener::bind(path)
}

/// Accept the single expected peer on a listener.
pub async fn accept_one(listener: &UnixListener) -> std::io::Result<UnixStream> {
    let (stream, _addr) = listener.accept().await?;
    Ok(stream)
}

/// Connect to a peer's socket, retrying while it starts up.
pub async fn connect_with_retry(
    path: &Path,
    attempts: u32,
    delay: Duration,
) -> std::io::Result<UnixStream> {
    let mut last_err = None;
    for _ in 0..attempts.max(1) {
        match UnixStream::connect(path).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "connect not ready, retrying");
                last_err = Some(e);
                tokio::time::sleep(delay).await;
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::TimedOut, "no connect attempts made")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn scratch_dir(tag: &str) -> SocketDir {
        SocketDir::new(std::env::temp_dir().join(format!("acx-ipc-test-{}-{}", tag, std::process::id())))
    }

    #[tokio::test]
    async fn connect_retries_until_the_listener_appears() {
        let dir = scratch_dir("retry");
        dir.ensure().await.unwrap();
        let path = dir.violations();

        let server_path = path.clone();
        let server = tokio::spawn(async move {
            // Bind only after a delay; the client must survive it.
            tokio::time::sleep(Duration::from_millis(50)).await;
            let listener = bind(&server_path).await.unwrap();
            let mut stream = accept_one(&listener).await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut client = connect_with_retry(&path, 20, Duration::from_millis(20)).await.unwrap();
        client.write_all(b"ping").await.unwrap();
        assert_eq!(&server.await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn bind_clears_stale_socket_files() {
        let dir = scratch_dir("stale");
        dir.ensure().await.unwrap();
        let path = dir.notices();
        let first = bind(&path).await.unwrap();
        drop(first);
        // The socket file is still on disk; a rebind must succeed anyway.
        bind(&path).await.unwrap();
    }
}
