//! This module defines the `RemoteClient`, which owns one outbound websocket
//! connection to a console viewer.
use super::message::RemoteMessage;
use crate::error::{RemoteError, SinkError};
use crate::sink::{OutputMessage, OutputSink};
use async_trait::async_trait;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;

/// Handshake header carrying the client's display name.
pub const CLIENT_NAME_HEADER: &str = "clientname";
/// Handshake header carrying the client's id.
pub const CLIENT_ID_HEADER: &str = "clientid";
/// Handshake header carrying the viewer password.
pub const PASSWORD_HEADER: &str = "password";

/// Identifies a client to the viewer during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub name: String,
    pub id: String,
    pub password: String,
}

impl ClientCredentials {
    pub fn new(name: impl Into<String>, id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            password: password.into(),
        }
    }
}

/// One connection to a remote console viewer.
///
/// Delivery is best-effort: sends on a dead or missing connection are
/// dropped without surfacing an error.
pub struct RemoteClient {
    url: String,
    credentials: ClientCredentials,
    writer: Mutex<Option<WsWriter>>,
    connected: Arc<AtomicBool>,
    reader: StdMutex<Option<JoinHandle<()>>>,
}

impl RemoteClient {
    pub fn new(url: impl Into<String>, credentials: ClientCredentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            writer: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            reader: StdMutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Performs the websocket handshake with the viewer.
    ///
    /// Returns immediately if already connected. There is no built-in
    /// timeout; wrap the call in `tokio::time::timeout` if one is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the url or a header value is invalid, or if the
    /// handshake fails.
    pub async fn connect(&self) -> Result<(), RemoteError> {
        if self.is_connected() {
            return Ok(());
        }

        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        let headers = request.headers_mut();
        for (name, value) in [
            (CLIENT_NAME_HEADER, &self.credentials.name),
            (PASSWORD_HEADER, &self.credentials.password),
            (CLIENT_ID_HEADER, &self.credentials.id),
        ] {
            let value =
                HeaderValue::from_str(value).map_err(|_| RemoteError::InvalidHeader { name })?;
            headers.insert(HeaderName::from_static(name), value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(RemoteError::Handshake)?;
        let (writer, mut reader) = stream.split();

        *self.writer.lock().await = Some(writer);
        self.connected.store(true, Ordering::SeqCst);
        info!(
            "Connected to console viewer at {} as {} ({})",
            self.url, self.credentials.name, self.credentials.id
        );

        // Incoming frames are not used beyond noticing that the viewer went away.
        let connected = self.connected.clone();
        let url = self.url.clone();
        let handle = tokio::spawn(async move {
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(Message::Close(_)) => {
                        debug!("Console viewer at {} closed the connection", url);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Console viewer connection error: {}", e);
                        break;
                    }
                }
            }
            connected.store(false, Ordering::SeqCst);
        });

        if let Some(previous) = self
            .reader
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle)
        {
            previous.abort();
        }

        Ok(())
    }

    /// Sends one record to the viewer.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not connected or the send fails.
    pub async fn try_output_message(&self, text: &str, is_line: bool) -> Result<(), RemoteError> {
        if !self.is_connected() {
            return Err(RemoteError::NotConnected);
        }

        let json = serde_json::to_string(&RemoteMessage::new(text, is_line))?;
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err(RemoteError::NotConnected);
        };

        if let Err(e) = sink.send(Message::Text(json)).await {
            self.connected.store(false, Ordering::SeqCst);
            return Err(RemoteError::Send(e));
        }
        Ok(())
    }

    /// Sends one record if connected, dropping it on any failure.
    pub async fn output_message(&self, text: &str, is_line: bool) {
        match self.try_output_message(text, is_line).await {
            Ok(()) | Err(RemoteError::NotConnected) => {}
            Err(e) => debug!("Dropped message for {}: {}", self.url, e),
        }
    }

    /// Closes the connection. In-flight sends are not cancelled.
    pub async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);

        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.send(Message::Close(None)).await;
            let _ = writer.close().await;
        }

        if let Some(handle) = self.reader.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl OutputSink for RemoteClient {
    fn name(&self) -> &str {
        &self.credentials.name
    }

    async fn output(&self, message: &OutputMessage) -> Result<(), SinkError> {
        self.output_message(&message.markup, message.is_line).await;
        Ok(())
    }

    async fn close(&self) {
        self.disconnect().await;
    }
}
