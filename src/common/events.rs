use chrono::{DateTime, Utc};

use crate::common::types::ChatMessage;

/// Trạng thái kết nối của hub client, cho indicator trên UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Sự kiện từ hub client gửi lên tầng phiên.
#[derive(Debug, Clone)]
pub enum HubEvent {
    MessageReceived(ChatMessage),
    MessageRead {
        message_id: i64,
        read_at: Option<DateTime<Utc>>,
    },
    /// Trạng thái kết nối thay đổi. Best-effort: khi kênh sự kiện đầy,
    /// bản tin này bị rơi; trạng thái chuẩn luôn nằm ở kênh `watch` của
    /// `HubHandle`.
    StatusChanged(HubStatus),
    /// Socket còn sống nhưng lệnh join thất bại: realtime hạn chế,
    /// gửi/nhận vẫn hoạt động qua REST.
    Degraded(String),
}
