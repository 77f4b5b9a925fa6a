//! Default WebSocket push transport.
//!
//! Opens a WebSocket to the resolved connection URL, pumps incoming text
//! frames to the owning connection, and writes text sent through the handle
//! back to the socket. Frames using the familiar
//! `event:`/`data:` field framing are decoded into named messages; bare text
//! frames become messages with the default name, matching push servers that
//! tag nothing.
//!
//! Declared `http`/`https` URLs are rewritten to `ws`/`wss` against the page
//! scheme, so markup can declare root-relative paths and still reach the
//! socket endpoint.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{CloseSignal, PushMessage, TransportEvent, TransportFactory, TransportHandle};

// ============================================================================
// Constants
// ============================================================================

/// Message name used when a frame carries no `event:` field.
pub const DEFAULT_MESSAGE_NAME: &str = "message";

// ============================================================================
// WebSocketFactory
// ============================================================================

/// Transport factory opening one WebSocket per connection.
///
/// This is the engine's default factory; swap it on the builder for other
/// wire protocols.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketFactory;

#[async_trait]
impl TransportFactory for WebSocketFactory {
    async fn create(&self, url: &Url) -> Result<TransportHandle> {
        let target = to_socket_scheme(url)?;
        let (stream, _response) = connect_async(target.as_str()).await?;

        debug!(url = %target, "WebSocket push channel established");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let signal = CloseSignal::new();

        // the handshake already succeeded; the open signal precedes any frame
        let _ = events_tx.send(TransportEvent::Open);
        tokio::spawn(pump(stream, events_tx, outbound_rx, signal.clone()));

        Ok(TransportHandle::new(events_rx, outbound_tx, signal))
    }
}

// ============================================================================
// Scheme Mapping
// ============================================================================

/// Maps a resolved page URL onto the socket scheme.
///
/// `http` becomes `ws`, `https` becomes `wss`; socket schemes pass through.
///
/// # Errors
///
/// Returns [`Error::UnsupportedScheme`] for anything else.
pub fn to_socket_scheme(url: &Url) -> Result<Url> {
    let mapped = match url.scheme() {
        "ws" | "wss" => return Ok(url.clone()),
        "http" => "ws",
        "https" => "wss",
        other => return Err(Error::unsupported_scheme(other)),
    };

    let mut socket_url = url.clone();
    socket_url
        .set_scheme(mapped)
        .map_err(|()| Error::unsupported_scheme(url.scheme()))?;
    Ok(socket_url)
}

// ============================================================================
// Frame Pump
// ============================================================================

/// Pumps frames both ways until the socket ends or the connection closes the
/// signal.
async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    signal: CloseSignal,
) {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            () = signal.wait() => {
                let _ = write.close().await;
                break;
            }

            // the sender drops with the handle, which also fires the signal
            text = outbound.recv() => match text {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        warn!(error = %e, "WebSocket push send failed");
                        let _ = events.send(TransportEvent::Error {
                            message: e.to_string(),
                        });
                        break;
                    }
                }
                None => break,
            },

            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(message) = decode_frame(&text) {
                        if events.send(TransportEvent::Message(message)).is_err() {
                            break;
                        }
                    }
                }

                Some(Ok(Message::Close(_))) | None => {
                    let _ = events.send(TransportEvent::Closed);
                    break;
                }

                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket push channel error");
                    let _ = events.send(TransportEvent::Error {
                        message: e.to_string(),
                    });
                    break;
                }

                // Binary, Ping, Pong carry no push messages
                _ => {}
            }
        }
    }

    trace!("push frame pump terminated");
}

// ============================================================================
// Frame Decoding
// ============================================================================

/// Decodes one text frame into a named message.
///
/// Frames carrying `event:`/`data:` fields follow server-sent-event framing:
/// `data:` lines join with newlines, `event:` names the message, comment
/// lines (leading `:`) and `id:`/`retry:` fields are ignored. A field-less
/// frame is delivered whole under [`DEFAULT_MESSAGE_NAME`]. Returns `None`
/// for frames with fields but no data.
#[must_use]
pub fn decode_frame(text: &str) -> Option<PushMessage> {
    if !has_field_framing(text) {
        if text.is_empty() {
            return None;
        }
        return Some(PushMessage::new(DEFAULT_MESSAGE_NAME, text));
    }

    let mut name: Option<String> = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => name = Some(value.to_string()),
            "data" => data.push(value),
            // id and retry belong to the wire protocol, not the engine
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }

    Some(PushMessage::new(
        name.unwrap_or_else(|| DEFAULT_MESSAGE_NAME.to_string()),
        data.join("\n"),
    ))
}

/// Returns `true` when a frame uses field framing rather than bare text.
fn has_field_framing(text: &str) -> bool {
    text.lines().any(|line| {
        line.starts_with("data:")
            || line.starts_with("event:")
            || line.starts_with("id:")
            || line.starts_with("retry:")
            || line.starts_with(':')
    })
}

// ============================================================================
// Tests
// ============================================================================
