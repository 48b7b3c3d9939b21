use std::time::Instant;

use cursors::net::{Transport, TransportEvent};
use cursors::wire::TextEncoding;
use cursors::{SessionConfig, SyncSession};

use crate::config::ClientConfig;

/// Drives one session against the server: transport events and a fixed
/// tick feed the session, queued messages go back out, Ctrl-C stops the
/// transport and the loop ends once its event stream drains.
pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let session_config = SessionConfig {
        encoding: if config.legacy_text {
            TextEncoding::Legacy
        } else {
            TextEncoding::Modern
        },
        ..SessionConfig::default()
    };
    let mut session = SyncSession::new(session_config);
    let mut transport = Transport::start(config.server.clone(), true);

    let clock = Instant::now();
    let mut tick = tokio::time::interval(config.tick_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_status_ms = 0u64;

    loop {
        tokio::select! {
            event = transport.recv() => {
                let now_ms = clock.elapsed().as_millis() as u64;
                match event {
                    Some(TransportEvent::Opened) => {
                        log::info!("connected to {}", config.server);
                    }
                    Some(TransportEvent::Message(bytes)) => {
                        session.handle_frame(&bytes, now_ms);
                    }
                    Some(TransportEvent::Error(reason)) => {
                        log::warn!("transport error: {reason}");
                    }
                    Some(TransportEvent::Closed { reason }) => {
                        log::warn!("connection closed: {reason}");
                    }
                    None => break,
                }
            }
            _ = tick.tick() => {
                let now_ms = clock.elapsed().as_millis() as u64;
                session.tick(now_ms);
                for message in session.drain_outbound() {
                    transport.send(message.encode());
                }

                if now_ms.saturating_sub(last_status_ms) >= 1000 {
                    last_status_ms = now_ms;
                    let snapshot = session.snapshot(now_ms);
                    log::debug!(
                        "state {:?}, {} online, {} remote cursors",
                        snapshot.state,
                        snapshot.online_count,
                        snapshot.cursors.len()
                    );
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                log::info!("shutting down");
                transport.stop();
            }
        }
    }

    Ok(())
}
