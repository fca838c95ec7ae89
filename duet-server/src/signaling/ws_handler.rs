use crate::signaling::{SignalingLink, SignalingService, SignalingSession};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let (link, mut rx) = SignalingLink::channel();
    let peer_id = link.peer_id();
    info!("Client connected: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = service.open_session(link);

    tokio::select! {
        _ = (&mut send_task) => warn!("Write side of {} closed", peer_id),
        _ = read_loop(&mut receiver, &mut session) => {},
    };

    session.cleanup();
    send_task.abort();
    info!("Client disconnected: {}", peer_id);
}

async fn read_loop(receiver: &mut SplitStream<WebSocket>, session: &mut SignalingSession) {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => session.handle_text(text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read error on {}: {}", session.link().peer_id(), e);
                break;
            }
        }
    }
}
