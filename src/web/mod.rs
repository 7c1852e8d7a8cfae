//! A console viewer: the remote end that mirrored output is sent to.
mod render;
mod websocket;

pub use render::{parse_color, render_markup};
pub use websocket::ViewerEvent;

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use websocket::ViewerState;

/// Serves the viewer websocket on `/` until the listener fails.
///
/// When `password` is set, clients must present it in the handshake.
/// Every connection, message and disconnection is reported on `events`.
///
/// # Errors
///
/// Returns an error if the server stops with an I/O failure.
pub async fn start_viewer(
    listener: TcpListener,
    password: Option<String>,
    events: mpsc::UnboundedSender<ViewerEvent>,
) -> Result<()> {
    let state = Arc::new(ViewerState { password, events });

    let app = Router::new()
        .route("/", get(websocket::ws_handler))
        .with_state(state);

    info!("Console viewer listening on ws://{}/", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
