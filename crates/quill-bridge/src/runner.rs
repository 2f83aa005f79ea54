//! Event loop driving a bridge
//!
//! Reacts to transport input and editor notifications one at a time.
//! Notifications raised while a command runs are handled before the next
//! command is read, so their events go out ahead of any later reply. The
//! optional health check only reports a message that has waited a full
//! interval for its acknowledgment; it never resends or drops anything.

use crate::bridge::Bridge;
use crate::editor::{EditorEventReceiver, EditorFactory};
use crate::transport::{AsyncReader, Transport};
use quill_bridge_core::Result;
use std::time::Duration;
use tokio::time::{Instant, Interval, interval_at};
use tracing::{debug, error, info, warn};

/// Run `bridge` until the transport input closes, then hand it back
pub async fn run<F, T, R>(
    mut bridge: Bridge<F, T>,
    mut reader: R,
    mut events: EditorEventReceiver,
    ack_timeout: Option<Duration>,
) -> Result<Bridge<F, T>>
where
    F: EditorFactory,
    T: Transport,
    R: AsyncReader,
{
    let mut health = ack_timeout.map(|period| interval_at(Instant::now() + period, period));
    let mut last_seen: Option<u64> = None;

    info!("Bridge running (prefix {})", bridge.config().prefix);

    loop {
        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                bridge.handle_editor_event(event);
            }

            msg = reader.read_message() => {
                match msg {
                    Ok(Some(raw)) => {
                        bridge.handle_message(&raw);
                        drain_editor_events(&mut bridge, &mut events);
                    }
                    Ok(None) => {
                        drain_editor_events(&mut bridge, &mut events);
                        info!("Transport closed, bridge stopping");
                        break;
                    }
                    Err(e) => {
                        error!("Transport read failed: {}", e);
                        return Err(e);
                    }
                }
            }

            _ = next_tick(&mut health) => {
                let in_flight = bridge.in_flight();
                match in_flight {
                    Some(id) if last_seen == Some(id) => {
                        warn!(
                            "Message {} still awaiting acknowledgment, {} queued behind it",
                            id,
                            bridge.pending()
                        );
                    }
                    _ => debug!("Acknowledgment health check ok"),
                }
                last_seen = in_flight;
            }
        }
    }

    Ok(bridge)
}

/// Handle every notification the editor has raised so far
fn drain_editor_events<F: EditorFactory, T: Transport>(
    bridge: &mut Bridge<F, T>,
    events: &mut EditorEventReceiver,
) {
    while let Ok(event) = events.try_recv() {
        bridge.handle_editor_event(event);
    }
}

async fn next_tick(health: &mut Option<Interval>) {
    match health {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::memory::MemoryEditorFactory;
    use crate::transport::{ChannelReader, LineReader, RecordingTransport};
    use quill_bridge_core::MESSAGE_PREFIX;
    use serde_json::{Value, json};
    use tokio::io::BufReader;
    use tokio::sync::mpsc;

    fn command(kind: &str, payload: Value) -> String {
        json!({ "prefix": MESSAGE_PREFIX, "type": kind, "payload": payload }).to_string()
    }

    #[tokio::test]
    async fn test_run_processes_until_close() {
        let (bridge, events) = Bridge::new(
            BridgeConfig::default(),
            MemoryEditorFactory,
            RecordingTransport::new(),
        );
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(command("LOAD_EDITOR", Value::Null)).unwrap();
        tx.send(command("GET_DELTA", Value::Null)).unwrap();
        tx.send("not for us".to_string()).unwrap();
        tx.send(command("MESSAGE_ACKNOWLEDGED", Value::Null)).unwrap();
        drop(tx);

        let bridge = run(bridge, ChannelReader(rx), events, None).await.unwrap();

        assert_eq!(
            bridge.transport().sent_types(),
            vec!["EDITOR_LOADED", "RECEIVE_DELTA"]
        );
        assert!(!bridge.is_ready());
        assert_eq!(bridge.pending(), 0);
    }

    fn set_contents(text: &str) -> String {
        command(
            "SET_CONTENTS",
            json!({ "delta": { "ops": [{ "insert": text }] } }),
        )
    }

    #[tokio::test]
    async fn test_text_change_precedes_later_reply() {
        // Branch selection must not let GET_DELTA overtake the change event
        for _ in 0..100 {
            let (bridge, events) = Bridge::new(
                BridgeConfig::default(),
                MemoryEditorFactory,
                RecordingTransport::new(),
            );
            let (tx, rx) = mpsc::unbounded_channel();

            tx.send(command("LOAD_EDITOR", Value::Null)).unwrap();
            tx.send(command("MESSAGE_ACKNOWLEDGED", Value::Null)).unwrap();
            tx.send(set_contents("x\n")).unwrap();
            tx.send(command("GET_DELTA", Value::Null)).unwrap();
            for _ in 0..3 {
                tx.send(command("MESSAGE_ACKNOWLEDGED", Value::Null)).unwrap();
            }
            drop(tx);

            let bridge = run(bridge, ChannelReader(rx), events, None).await.unwrap();
            assert_eq!(
                bridge.transport().sent_types(),
                vec!["EDITOR_LOADED", "TEXT_CHANGED", "RECEIVE_DELTA"]
            );
        }
    }

    #[tokio::test]
    async fn test_pending_editor_events_survive_close() {
        let (bridge, events) = Bridge::new(
            BridgeConfig::default(),
            MemoryEditorFactory,
            RecordingTransport::new(),
        );
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(command("LOAD_EDITOR", Value::Null)).unwrap();
        tx.send(command("MESSAGE_ACKNOWLEDGED", Value::Null)).unwrap();
        tx.send(set_contents("hi\n")).unwrap();
        drop(tx);

        let bridge = run(bridge, ChannelReader(rx), events, None).await.unwrap();
        assert_eq!(
            bridge.transport().sent_types(),
            vec!["EDITOR_LOADED", "TEXT_CHANGED"]
        );
        assert_eq!(bridge.pending(), 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_bridge() {
        let (bridge, events) = Bridge::new(
            BridgeConfig::default(),
            MemoryEditorFactory,
            RecordingTransport::new(),
        );
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(command("LOAD_EDITOR", Value::Null).as_bytes());
        input.push(b'\n');
        let reader = LineReader::new(BufReader::new(&input[..]));

        let bridge = run(bridge, reader, events, None).await.unwrap();
        assert!(bridge.is_loaded());
        assert_eq!(bridge.transport().sent_types(), vec!["EDITOR_LOADED"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_check_never_resends() {
        let (bridge, events) = Bridge::new(
            BridgeConfig::default(),
            MemoryEditorFactory,
            RecordingTransport::new(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(
            bridge,
            ChannelReader(rx),
            events,
            Some(Duration::from_millis(100)),
        ));

        tx.send(command("LOAD_EDITOR", Value::Null)).unwrap();
        tx.send(command("GET_DELTA", Value::Null)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(tx);

        let bridge = handle.await.unwrap().unwrap();
        assert_eq!(bridge.transport().sent_types(), vec!["EDITOR_LOADED"]);
        assert_eq!(bridge.pending(), 1);
        assert_eq!(bridge.in_flight(), Some(0));
    }
}
