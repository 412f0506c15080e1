use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::ChatMessage;

/// Frame client gửi lên hub, JSON có tag `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Tham gia phòng; hub chấp nhận gọi lặp lại (membership idempotent).
    #[serde(rename_all = "camelCase")]
    JoinChatRoom { room_id: i64 },
}

/// Frame hub đẩy xuống client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    ReceiveMessage {
        message: ChatMessage,
    },
    #[serde(rename_all = "camelCase")]
    MessageRead {
        message_id: i64,
        #[serde(default)]
        read_at: Option<DateTime<Utc>>,
    },
}
