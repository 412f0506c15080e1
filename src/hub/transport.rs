use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::auth::AuthContext;

use super::protocol::{ClientFrame, ServerFrame};

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid frame: {0}")]
    Frame(#[from] serde_json::Error),
    #[error("hub connection closed")]
    Closed,
}

/// Một kết nối hub đang mở.
#[async_trait]
pub trait HubTransport: Send {
    async fn send(&mut self, frame: ClientFrame) -> Result<(), HubError>;

    /// Frame kế tiếp từ hub; `None` nghĩa là transport đã đóng.
    async fn next_frame(&mut self) -> Option<Result<ServerFrame, HubError>>;

    /// Đóng kết nối, giải phóng socket. Lỗi lúc đóng được bỏ qua.
    async fn close(&mut self);
}

/// Factory mở kết nối mới; hub client gọi lại mỗi lần reconnect.
#[async_trait]
pub trait HubConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn HubTransport>, HubError>;
}

/// Connector WebSocket thật. Token (nếu có) gắn vào query `access_token`
/// vì trình duyệt không đặt được header khi upgrade.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(hub_url: impl Into<String>, auth: &AuthContext) -> Self {
        let mut url = hub_url.into();
        if let Some(token) = auth.bearer_token() {
            let separator = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{separator}access_token={token}");
        }
        Self { url }
    }
}

#[async_trait]
impl HubConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn HubTransport>, HubError> {
        let (stream, _) = connect_async(&self.url).await?;
        Ok(Box::new(WsTransport { stream }))
    }
}

pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl HubTransport for WsTransport {
    async fn send(&mut self, frame: ClientFrame) -> Result<(), HubError> {
        let text = serde_json::to_string(&frame)?;
        self.stream.send(WsMessage::Text(text)).await?;
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<ServerFrame, HubError>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => {
                    return Some(serde_json::from_str(&text).map_err(HubError::from));
                }
                Ok(WsMessage::Ping(payload)) => {
                    if let Err(err) = self.stream.send(WsMessage::Pong(payload)).await {
                        return Some(Err(err.into()));
                    }
                }
                Ok(WsMessage::Close(_)) => return None,
                // Pong/Binary/Frame: không dùng trong protocol này
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
