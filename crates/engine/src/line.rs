//! Line-telemetry engine.
//!
//! Listens on a TCP port and forwards every non-empty line a client sends
//! as a status message. Line contents are passed through untouched, except
//! that bytes which are not UTF-8 become U+FFFD. Lines longer than
//! [`MAX_LINE_BYTES`] are dropped.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::{Engine, EngineError, EngineHandle, StatusHook};

/// How long a release waits for in-flight tasks to wind down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Longest line a client may send, terminator included.
pub const MAX_LINE_BYTES: usize = 4096;

/// Where the engine listens.
#[derive(Debug, Clone)]
pub struct LineEngineConfig {
    pub bind_address: String,
    /// TCP port (0 = OS-assigned).
    pub port: u16,
}

impl Default for LineEngineConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".into(),
            port: 0,
        }
    }
}

/// Engine that relays newline-delimited text from TCP clients.
#[derive(Debug, Clone)]
pub struct LineEngine {
    config: LineEngineConfig,
}

impl LineEngine {
    pub fn new(config: LineEngineConfig) -> Self {
        Self { config }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.config.bind_address, self.config.port)
    }
}

impl Engine for LineEngine {
    fn start(&self, hook: StatusHook) -> Result<EngineHandle, EngineError> {
        if self.config.bind_address.trim().is_empty() {
            return Err(EngineError::startup("no bind address configured"));
        }
        let addr = self.addr();
        let candidates: Vec<SocketAddr> = (self.config.bind_address.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|e| EngineError::startup_with(format!("invalid bind address {addr}"), e))?
            .collect();

        // Bind on the caller's thread so a busy port fails startup.
        let std_listener = std::net::TcpListener::bind(&candidates[..])
            .map_err(|source| EngineError::Bind { addr: addr.clone(), source })?;
        std_listener.set_nonblocking(true).map_err(EngineError::Runtime)?;
        let local_addr = std_listener.local_addr().map_err(EngineError::Runtime)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("fanduino-engine")
            .enable_all()
            .build()
            .map_err(EngineError::Runtime)?;

        let listener = {
            let _guard = runtime.enter();
            TcpListener::from_std(std_listener).map_err(EngineError::Runtime)?
        };

        let cancel = CancellationToken::new();
        hook(format!("Listening on {local_addr}"));
        runtime.spawn(accept_loop(listener, hook, cancel.clone()));
        tracing::info!(%local_addr, "line engine started");

        Ok(EngineHandle::new(move || {
            cancel.cancel();
            runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
            tracing::info!(%local_addr, "line engine stopped");
        }))
    }
}

async fn accept_loop(listener: TcpListener, hook: StatusHook, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let hook = Arc::clone(&hook);
                        let cancel = cancel.clone();
                        tokio::spawn(serve_client(stream, peer, hook, cancel));
                    }
                    Err(e) => {
                        tracing::error!("accept error: {e}");
                    }
                }
            }
        }
    }
}

async fn serve_client(stream: TcpStream, peer: SocketAddr, hook: StatusHook, cancel: CancellationToken) {
    tracing::info!(%peer, "client connected");
    hook(format!("Client connected: {peer}"));

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::with_capacity(256);
    let mut discarding = false;
    loop {
        buf.clear();
        let mut limited = (&mut reader).take(MAX_LINE_BYTES as u64);
        let read = tokio::select! {
            _ = cancel.cancelled() => return,
            read = limited.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {
                let complete = buf.ends_with(b"\n");
                if discarding {
                    discarding = !complete;
                    continue;
                }
                if !complete && buf.len() >= MAX_LINE_BYTES {
                    tracing::warn!(%peer, "dropping line longer than {MAX_LINE_BYTES} bytes");
                    discarding = true;
                    continue;
                }
                if let Some(line) = decode_line(&buf) {
                    hook(line);
                }
            }
            Err(e) => {
                tracing::warn!(%peer, "read error: {e}");
                break;
            }
        }
    }

    tracing::info!(%peer, "client disconnected");
    hook(format!("Client disconnected: {peer}"));
}

/// Strips the line terminator. Returns `None` for an empty line.
fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpStream as StdTcpStream;
    use std::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(5);

    fn collecting_hook() -> (StatusHook, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        let hook: StatusHook = Arc::new(move |s: String| {
            let _ = tx.send(s);
        });
        (hook, rx)
    }

    fn start_ephemeral() -> (EngineHandle, mpsc::Receiver<String>, SocketAddr) {
        let (hook, rx) = collecting_hook();
        let handle = LineEngine::new(LineEngineConfig::default()).start(hook).unwrap();

        let first = rx.recv_timeout(WAIT).unwrap();
        let addr = first
            .strip_prefix("Listening on ")
            .expect("first status announces the address")
            .parse()
            .unwrap();
        (handle, rx, addr)
    }

    #[test]
    fn busy_port_fails_startup() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let (hook, rx) = collecting_hook();
        let engine = LineEngine::new(LineEngineConfig {
            bind_address: "127.0.0.1".into(),
            port,
        });
        let err = engine.start(hook).unwrap_err();

        assert!(matches!(err, EngineError::Bind { .. }));
        assert!(err.to_string().contains(&port.to_string()));
        assert!(!err.user_message().is_empty());
        assert!(rx.try_recv().is_err(), "no status before a successful start");
    }

    #[test]
    fn blank_bind_address_fails_startup() {
        let (hook, rx) = collecting_hook();
        let blank = LineEngine::new(LineEngineConfig {
            bind_address: "  ".into(),
            port: 0,
        });
        let err = blank.start(hook).unwrap_err();
        assert!(matches!(err, EngineError::Startup { .. }));
        assert_eq!(err.user_message(), "no bind address configured");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn forwards_lines_verbatim() {
        let (handle, rx, addr) = start_ephemeral();

        let mut client = StdTcpStream::connect(addr).unwrap();
        let connected = rx.recv_timeout(WAIT).unwrap();
        assert!(connected.starts_with("Client connected: "));

        client
            .write_all(b"fan1 rpm=1200 temp=41.5\r\n\n  padded  \n")
            .unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "fan1 rpm=1200 temp=41.5");
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "  padded  ");

        drop(client);
        let gone = rx.recv_timeout(WAIT).unwrap();
        assert!(gone.starts_with("Client disconnected: "));

        handle.release();
    }

    #[test]
    fn invalid_utf8_does_not_drop_the_client() {
        let (handle, rx, addr) = start_ephemeral();

        let mut client = StdTcpStream::connect(addr).unwrap();
        rx.recv_timeout(WAIT).unwrap();

        client.write_all(b"temp 41.5\xB0C\nfan1 1200 rpm\n").unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "temp 41.5\u{FFFD}C");
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "fan1 1200 rpm");

        handle.release();
    }

    #[test]
    fn over_long_lines_are_dropped_and_reading_resumes() {
        let (handle, rx, addr) = start_ephemeral();

        let mut client = StdTcpStream::connect(addr).unwrap();
        rx.recv_timeout(WAIT).unwrap();

        let mut payload = vec![b'x'; MAX_LINE_BYTES * 3];
        payload.extend_from_slice(b"\nfan2 900 rpm\n");
        client.write_all(&payload).unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "fan2 900 rpm");

        handle.release();
    }

    #[test]
    fn unterminated_last_line_is_forwarded() {
        let (handle, rx, addr) = start_ephemeral();

        let mut client = StdTcpStream::connect(addr).unwrap();
        rx.recv_timeout(WAIT).unwrap();

        client.write_all(b"bye").unwrap();
        drop(client);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "bye");
        assert!(rx.recv_timeout(WAIT).unwrap().starts_with("Client disconnected: "));

        handle.release();
    }

    #[test]
    fn decode_line_strips_terminators_only() {
        assert_eq!(decode_line(b"a b \r\n").as_deref(), Some("a b "));
        assert_eq!(decode_line(b"\r\n"), None);
        assert_eq!(decode_line(b"\n"), None);
        assert_eq!(decode_line(b"x\r").as_deref(), Some("x"));
    }

    #[test]
    fn release_stops_listening() {
        let (handle, _rx, addr) = start_ephemeral();
        handle.release();

        assert!(StdTcpStream::connect_timeout(&addr, Duration::from_millis(500)).is_err());
    }

    #[test]
    fn closure_engines_implement_engine() {
        let engine = |hook: StatusHook| -> Result<EngineHandle, EngineError> {
            hook("ready".into());
            Ok(EngineHandle::noop())
        };
        let (hook, rx) = collecting_hook();
        engine.start(hook).unwrap().release();
        assert_eq!(rx.recv().unwrap(), "ready");
    }
}
