//! WebSocket transport.
//!
//! Frames are JSON text envelopes (`{"event", "data"}`). The pump task
//! maintains a persistent connection to the authority, parses inbound
//! frames into [`ServerEvent`]s, and dispatches them onto the bus.
//! On disconnect it reconnects after a fixed delay; outbound requests
//! sent while disconnected stay queued in the channel.

use crate::bus::EventBus;
use crate::error::ClientError;
use crate::transport::Transport;
use cowrite_protocol::{ClientRequest, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Delay before reconnecting after a dropped connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// WebSocket-backed [`Transport`].
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<ClientRequest>,
    pump: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl WsTransport {
    /// Connect to `url` and dispatch every parsed inbound event onto
    /// `bus`. The connection is established and maintained by a
    /// background task; this returns immediately.
    pub fn connect(url: impl Into<String>, bus: EventBus) -> Arc<Self> {
        let url = url.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump_loop(url, bus, rx));
        Arc::new(Self {
            outbound: tx,
            pump: Mutex::new(Some(pump)),
            closed: AtomicBool::new(false),
        })
    }
}

impl Transport for WsTransport {
    fn send(&self, request: ClientRequest) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionClosed);
        }
        self.outbound
            .send(request)
            .map_err(|_| ClientError::ConnectionClosed)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.pump.lock().expect("pump lock poisoned").take() {
            handle.abort();
        }
        debug!("websocket transport closed");
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

async fn pump_loop(
    url: String,
    bus: EventBus,
    mut outbound: mpsc::UnboundedReceiver<ClientRequest>,
) {
    loop {
        info!("connecting to {}", url);
        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                error!("websocket connect failed: {}", e);
                sleep(RECONNECT_DELAY).await;
                continue;
            }
        };
        info!("websocket connected");
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                request = outbound.recv() => match request {
                    Some(request) => {
                        let text = match serde_json::to_string(&request) {
                            Ok(text) => text,
                            Err(e) => {
                                error!("failed to encode {}: {}", request.event_name(), e);
                                continue;
                            }
                        };
                        debug!("-> {}", request.event_name());
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            warn!("websocket send failed: {}", e);
                            break;
                        }
                    }
                    // Transport dropped; shut the connection down cleanly.
                    None => {
                        let _ = sink.close().await;
                        return;
                    }
                },
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                debug!(kind = ?event.kind(), "<- event");
                                bus.dispatch(&event);
                            }
                            Err(e) => warn!("unparseable inbound frame: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!("websocket closed by server");
                        break;
                    }
                    Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                    Some(Err(e)) => {
                        warn!("websocket error: {}", e);
                        break;
                    }
                },
            }
        }

        warn!("connection lost, reconnecting in {:?}", RECONNECT_DELAY);
        sleep(RECONNECT_DELAY).await;
    }
}
