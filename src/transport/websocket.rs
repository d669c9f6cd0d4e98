use std::io;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::Session;
use crate::dispatch::BroadcastReceipt;
use crate::relay::Relay;
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::error::BroadcastError;

pub async fn start_websocket_server(addr: &str, relay: Relay) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("WebSocket server listening on ws://{}", addr);
    serve(listener, relay).await
}

/// Runs the server on `addr` until it fails or `shutdown` resolves, then
/// drains the relay. A server failure, bind included, is returned after the
/// drain.
pub async fn run_until<S>(addr: &str, relay: Relay, shutdown: S) -> io::Result<()>
where
    S: Future<Output = ()>,
{
    let result = tokio::select! {
        res = start_websocket_server(addr, relay.clone()) => res,
        _ = shutdown => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    };

    relay.shutdown().await;
    result
}

/// Accepts connections on `listener` until it fails.
pub async fn serve(listener: TcpListener, relay: Relay) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let Some(permit) = relay.admit() else {
            warn!(
                %peer,
                max_connections = relay.max_connections(),
                "connection limit reached, refusing connection"
            );
            drop(stream);
            continue;
        };

        let relay = relay.clone();
        spawn(async move {
            let _permit = permit;
            handle_connection(stream, peer, relay).await;
        });
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, relay: Relay) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!(%peer, "WebSocket handshake error: {}", e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Outbound channel for this session; events and replies both go through it
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut session = relay.sessions.connect(tx);
    let session_id = session.id().clone();

    let writer_id = session_id.clone();
    let writer = spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                warn!(session = %writer_id, "Failed to send frame: {}", e);
                break;
            }
        }
        debug!(session = %writer_id, "send loop closed");
    });

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => handle_message(&relay, &mut session, text.as_str()).await,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(session = %session_id, "read error: {}", e);
                break;
            }
        }
    }

    // Dropping the session clears its memberships and closes the channel
    session.disconnect();
    if let Err(e) = writer.await {
        debug!(session = %session_id, "send loop aborted: {}", e);
    }
    info!(session = %session_id, %peer, "disconnected");
}

/// Routes one text frame. Bad frames get an `error` reply and never end the
/// session.
pub async fn handle_message(relay: &Relay, session: &mut Session, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(session = %session.id(), "Invalid client message: {} | {}", err, text);
            session.reply(&ServerMessage::error(format!("invalid message: {err}")));
            return;
        }
    };

    match message {
        ClientMessage::Join(attributes) => {
            let topics = session.join(&attributes);
            session.reply(&ServerMessage::Joined {
                topics: topics.iter().map(ToString::to_string).collect(),
            });
        }

        ClientMessage::LocationUpdate(update) => {
            if let Err(e) = relay.locations.publish_location(update) {
                debug!(session = %session.id(), "rejected location update: {}", e);
                session.reply(&ServerMessage::error(e.to_string()));
            }
        }

        ClientMessage::Alert(request) => {
            if let Err(e) = relay.alerts.publish_alert(request) {
                warn!(session = %session.id(), "rejected alert: {}", e);
                session.reply(&ServerMessage::error(e.to_string()));
            }
        }

        ClientMessage::Broadcast {
            sender_id,
            title,
            message,
            audience,
        } => {
            let result = relay
                .broadcasts
                .create_broadcast(&sender_id, &title, &message, &audience)
                .await;
            reply_to_broadcast(session, result);
        }

        ClientMessage::ClassBroadcast {
            teacher_id,
            title,
            message,
        } => {
            let result = relay
                .broadcasts
                .create_class_broadcast(&teacher_id, &title, &message)
                .await;
            reply_to_broadcast(session, result);
        }

        ClientMessage::LastLocation { driver_id } => match relay.last_location(&driver_id).await {
            Ok(location) => session.reply(&ServerMessage::LastLocation {
                driver_id: driver_id.trim().to_string(),
                location,
            }),
            Err(e) => {
                warn!(session = %session.id(), driver_id = %driver_id, "last location lookup failed: {}", e);
                session.reply(&ServerMessage::error("last location unavailable"));
            }
        },
    }
}

fn reply_to_broadcast(session: &Session, result: Result<BroadcastReceipt, BroadcastError>) {
    match result {
        Ok(receipt) => session.reply(&ServerMessage::BroadcastAccepted {
            record_id: receipt.record_id,
            recipients: receipt.recipients,
            delivered: receipt.delivered,
        }),
        Err(e) => {
            warn!(session = %session.id(), "broadcast rejected: {}", e);
            session.reply(&ServerMessage::error(e.to_string()));
        }
    }
}
