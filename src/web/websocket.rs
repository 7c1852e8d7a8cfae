use crate::remote::{RemoteMessage, CLIENT_ID_HEADER, CLIENT_NAME_HEADER, PASSWORD_HEADER};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// What the viewer observed from its clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    Connected { name: String, id: String },
    Output { name: String, message: RemoteMessage },
    Disconnected { name: String, id: String },
}

pub struct ViewerState {
    pub password: Option<String>,
    pub events: mpsc::UnboundedSender<ViewerEvent>,
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<ViewerState>>,
) -> Response {
    let name = header(&headers, CLIENT_NAME_HEADER);
    let id = header(&headers, CLIENT_ID_HEADER);

    if let Some(expected) = &state.password {
        if header(&headers, PASSWORD_HEADER) != *expected {
            warn!("Rejected console client {} ({}): wrong password", name, id);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, name, id))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<ViewerState>, name: String, id: String) {
    let _ = state.events.send(ViewerEvent::Connected {
        name: name.clone(),
        id: id.clone(),
    });

    while let Some(frame) = socket.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<RemoteMessage>(&text) {
                Ok(message) => {
                    let event = ViewerEvent::Output {
                        name: name.clone(),
                        message,
                    };
                    if state.events.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Ignoring malformed message from {}: {}", name, e),
            },
            Ok(Message::Close(_)) => {
                debug!("Console client {} disconnected", name);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("WebSocket error from {}: {}", name, e);
                break;
            }
        }
    }

    let _ = state.events.send(ViewerEvent::Disconnected { name, id });
}
