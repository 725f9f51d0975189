//! Unix domain socket transport.
//!
//! One JSON request per line from the client, one JSON response per line
//! back. Each connection is served on its own thread.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::{IpcError, IpcRequest, IpcResponse};
use crate::cache::get_cache_dir;
use crate::platform::thread::spawn_named_thread;

/// Socket filename within the cache directory.
const SOCKET_FILENAME: &str = "plash.sock";

/// Timeout for socket reads and writes.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of attempts for transient connection failures.
const MAX_RETRIES: u32 = 3;

const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Path of the app's socket.
#[must_use]
pub fn get_socket_path() -> PathBuf { get_cache_dir().join(SOCKET_FILENAME) }

// ============================================================================
// Server (App Side)
// ============================================================================

/// A bound socket. Dropping it stops accepting and removes the file.
pub struct IpcServer {
    path: PathBuf,
    running: Arc<AtomicBool>,
}

impl IpcServer {
    /// Binds the socket at `path`, replacing a stale socket file.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Io`] if the directory cannot be created or the
    /// socket cannot be bound.
    pub fn bind<F>(path: &Path, handler: F) -> Result<Self, IpcError>
    where F: Fn(IpcRequest) -> IpcResponse + Send + Sync + 'static {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(path)?;
        tracing::info!(path = %path.display(), "ipc server listening");

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handler = Arc::new(handler);

        spawn_named_thread("ipc-server", move || {
            for stream in listener.incoming() {
                if !flag.load(Ordering::SeqCst) {
                    break;
                }

                match stream {
                    Ok(stream) => {
                        let handler = Arc::clone(&handler);
                        spawn_named_thread("ipc-conn", move || {
                            handle_connection(stream, handler.as_ref());
                        });
                    }
                    Err(err) => tracing::warn!(error = %err, "ipc connection error"),
                }
            }
            tracing::debug!("ipc server stopped");
        });

        Ok(Self { path: path.to_path_buf(), running })
    }

    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Stops accepting connections and removes the socket file.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            // Wake the accept loop so it sees the flag.
            let _ = UnixStream::connect(&self.path);
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) { self.stop(); }
}

fn handle_connection<F>(stream: UnixStream, handler: &F)
where F: Fn(IpcRequest) -> IpcResponse {
    let _ = stream.set_read_timeout(Some(SOCKET_TIMEOUT));

    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(err) => {
            tracing::warn!(error = %err, "failed to clone ipc stream");
            return;
        }
    };

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
        return;
    }

    let response = match serde_json::from_str::<IpcRequest>(line.trim()) {
        Ok(request) => {
            tracing::debug!(request = request.name(), "ipc request");
            handler(request)
        }
        Err(err) => IpcResponse::error(format!("Invalid request: {err}")),
    };

    let json = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"error":"Failed to serialize response"}"#.to_string());
    let _ = writeln!(writer, "{json}");
}

// ============================================================================
// Client (CLI Side)
// ============================================================================

/// Sends a request to the running app.
///
/// # Errors
///
/// See [`send_request_to`].
pub fn send_request(request: &IpcRequest) -> Result<IpcResponse, IpcError> {
    send_request_to(&get_socket_path(), request)
}

/// Sends a request to the socket at `path`, retrying while the app appears
/// not to be running.
///
/// # Errors
///
/// Returns [`IpcError::AppNotRunning`] if nothing is listening, or another
/// [`IpcError`] if the exchange fails.
pub fn send_request_to(path: &Path, request: &IpcRequest) -> Result<IpcResponse, IpcError> {
    let mut last_error = IpcError::AppNotRunning;

    for attempt in 0..MAX_RETRIES {
        match send_once(path, request) {
            Ok(response) => return Ok(response),
            Err(err) => {
                last_error = err;
                if !matches!(last_error, IpcError::AppNotRunning) {
                    break;
                }
                if attempt + 1 < MAX_RETRIES {
                    thread::sleep(RETRY_DELAY);
                }
            }
        }
    }

    Err(last_error)
}

fn send_once(path: &Path, request: &IpcRequest) -> Result<IpcResponse, IpcError> {
    if !path.exists() {
        return Err(IpcError::AppNotRunning);
    }

    let mut stream = UnixStream::connect(path).map_err(|err| match err.kind() {
        ErrorKind::ConnectionRefused
        | ErrorKind::NotFound
        | ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset => IpcError::AppNotRunning,
        _ => IpcError::Io(err),
    })?;

    stream.set_read_timeout(Some(SOCKET_TIMEOUT))?;
    stream.set_write_timeout(Some(SOCKET_TIMEOUT))?;

    let json = serde_json::to_string(request)
        .map_err(|err| IpcError::InvalidResponse(format!("Failed to serialize request: {err}")))?;

    writeln!(stream, "{json}").map_err(|err| {
        if err.kind() == ErrorKind::BrokenPipe {
            IpcError::AppNotRunning
        } else {
            IpcError::Io(err)
        }
    })?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).map_err(|err| match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => IpcError::Timeout,
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => IpcError::AppNotRunning,
        _ => IpcError::Io(err),
    })?;

    serde_json::from_str(line.trim())
        .map_err(|err| IpcError::InvalidResponse(format!("Failed to parse response: {err}")))
}
