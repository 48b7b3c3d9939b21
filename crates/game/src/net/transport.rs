use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8005";
pub const MAX_FRAME_SIZE: usize = 64 * 1024;
pub const MAX_BACKOFF_SECS: u64 = 30;

/// Reconnect delay for the given attempt number (first attempt is 1):
/// `min(30s, 2^attempt - 1)` seconds.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let exp = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(exp.saturating_sub(1).min(MAX_BACKOFF_SECS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransportState {
    Disconnected = 0,
    Connecting = 1,
    Open = 2,
    Closing = 3,
}

impl TransportState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TransportState::Connecting,
            2 => TransportState::Open,
            3 => TransportState::Closing,
            _ => TransportState::Disconnected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Closed { reason: String },
    Error(String),
    Message(Vec<u8>),
}

#[derive(Debug)]
enum Command {
    Send(Vec<u8>),
    Stop,
}

/// Reconnecting message channel over a TCP connection. Frames are a
/// 32-bit big-endian length prefix followed by the payload bytes;
/// messages in flight during a close are lost.
///
/// The connection lifecycle runs on a spawned task, so `start` must be
/// called inside a tokio runtime. Lifecycle and inbound traffic surface
/// as [`TransportEvent`]s; transport failures never escape as panics.
#[derive(Debug)]
pub struct Transport {
    cmd_tx: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    state: Arc<AtomicU8>,
}

impl Transport {
    /// Opens a connection to `addr`. While `auto_reconnect` is true the
    /// transport re-opens after every close with exponential backoff,
    /// resetting the attempt counter on each successful open.
    pub fn start(addr: impl Into<String>, auto_reconnect: bool) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicU8::new(TransportState::Disconnected as u8));

        tokio::spawn(drive(
            addr.into(),
            auto_reconnect,
            cmd_rx,
            event_tx,
            Arc::clone(&state),
        ));

        Self {
            cmd_tx,
            events,
            state,
        }
    }

    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == TransportState::Open
    }

    /// Fire-and-forget send; silently dropped unless the connection is
    /// open.
    pub fn send(&self, bytes: Vec<u8>) {
        if self.is_open() {
            let _ = self.cmd_tx.send(Command::Send(bytes));
        }
    }

    /// Disables reconnection, cancels any pending reconnect timer and
    /// closes the active connection. Terminal and idempotent.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(Command::Stop);
    }

    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.events.try_recv().ok()
    }
}

enum ConnectionEnd {
    Closed(String),
    Stopped,
}

async fn drive(
    addr: String,
    auto_reconnect: bool,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    state: Arc<AtomicU8>,
) {
    let set_state = |value: TransportState| state.store(value as u8, Ordering::SeqCst);
    let mut attempt: u32 = 1;

    loop {
        set_state(TransportState::Connecting);
        log::debug!("connecting to {addr} (attempt {attempt})");

        let connect = TcpStream::connect(&addr);
        tokio::pin!(connect);
        let connected = loop {
            tokio::select! {
                result = &mut connect => break Some(result),
                cmd = cmd_rx.recv() => match cmd {
                    // Not open yet, sends are dropped.
                    Some(Command::Send(_)) => {}
                    Some(Command::Stop) | None => break None,
                }
            }
        };

        let stream = match connected {
            None => {
                set_state(TransportState::Disconnected);
                return;
            }
            Some(Ok(stream)) => Some(stream),
            Some(Err(err)) => {
                let _ = event_tx.send(TransportEvent::Error(err.to_string()));
                let _ = event_tx.send(TransportEvent::Closed {
                    reason: err.to_string(),
                });
                None
            }
        };

        if let Some(stream) = stream {
            attempt = 1;
            set_state(TransportState::Open);
            log::info!("connection to {addr} open");
            let _ = event_tx.send(TransportEvent::Opened);

            let end = run_connection(stream, &mut cmd_rx, &event_tx, &state).await;
            set_state(TransportState::Disconnected);
            match end {
                ConnectionEnd::Stopped => {
                    let _ = event_tx.send(TransportEvent::Closed {
                        reason: "stopped".into(),
                    });
                    return;
                }
                ConnectionEnd::Closed(reason) => {
                    log::warn!("connection to {addr} closed: {reason}");
                    let _ = event_tx.send(TransportEvent::Closed { reason });
                }
            }
        }

        if !auto_reconnect {
            set_state(TransportState::Disconnected);
            return;
        }

        set_state(TransportState::Disconnected);
        let sleep = tokio::time::sleep(reconnect_delay(attempt));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => {
                    attempt += 1;
                    break;
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(_)) => {}
                    Some(Command::Stop) | None => return,
                }
            }
        }
    }
}

async fn run_connection(
    stream: TcpStream,
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    event_tx: &mpsc::UnboundedSender<TransportEvent>,
    state: &Arc<AtomicU8>,
) -> ConnectionEnd {
    let (read_half, mut write_half) = stream.into_split();
    let (done_tx, mut done_rx) = oneshot::channel();
    let reader = tokio::spawn(read_loop(read_half, event_tx.clone(), done_tx));

    let end = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send(bytes)) => {
                    if let Err(err) = write_frame(&mut write_half, &bytes).await {
                        let _ = event_tx.send(TransportEvent::Error(err.to_string()));
                        break ConnectionEnd::Closed(err.to_string());
                    }
                }
                Some(Command::Stop) | None => {
                    state.store(TransportState::Closing as u8, Ordering::SeqCst);
                    let _ = write_half.shutdown().await;
                    break ConnectionEnd::Stopped;
                }
            },
            reason = &mut done_rx => {
                break ConnectionEnd::Closed(
                    reason.unwrap_or_else(|_| "reader task ended".into()),
                );
            }
        }
    };

    reader.abort();
    end
}

async fn write_frame(write_half: &mut OwnedWriteHalf, bytes: &[u8]) -> io::Result<()> {
    write_half
        .write_all(&(bytes.len() as u32).to_be_bytes())
        .await?;
    write_half.write_all(bytes).await
}

async fn read_loop(
    mut read_half: OwnedReadHalf,
    events: mpsc::UnboundedSender<TransportEvent>,
    done: oneshot::Sender<String>,
) {
    let reason = loop {
        let mut len_buf = [0u8; 4];
        match read_half.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                break "closed by peer".to_string();
            }
            Err(err) => {
                let _ = events.send(TransportEvent::Error(err.to_string()));
                break err.to_string();
            }
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_SIZE {
            let _ = events.send(TransportEvent::Error(format!("oversized frame ({len} bytes)")));
            break "oversized frame".to_string();
        }

        let mut frame = vec![0u8; len];
        match read_half.read_exact(&mut frame).await {
            Ok(_) => {
                let _ = events.send(TransportEvent::Message(frame));
            }
            Err(err) => {
                let _ = events.send(TransportEvent::Error(err.to_string()));
                break err.to_string();
            }
        }
    };

    let _ = done.send(reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let delays: Vec<u64> = (1..=5).map(|a| reconnect_delay(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 3, 7, 15, 30]);
    }

    #[test]
    fn test_backoff_never_exceeds_cap() {
        for attempt in 1..200 {
            assert!(reconnect_delay(attempt).as_secs() <= MAX_BACKOFF_SECS);
        }
        assert_eq!(reconnect_delay(100).as_secs(), MAX_BACKOFF_SECS);
    }

    #[test]
    fn test_state_roundtrip() {
        for state in [
            TransportState::Disconnected,
            TransportState::Connecting,
            TransportState::Open,
            TransportState::Closing,
        ] {
            assert_eq!(TransportState::from_u8(state as u8), state);
        }
    }
}
