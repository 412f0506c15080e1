use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Giới hạn độ dài nội dung tin nhắn (ký tự).
pub const MAX_MESSAGE_LEN: usize = 1000;

/// Phía gửi của một tin nhắn / phía xem của một người tham gia.
///
/// Backend mã hóa thành số: 1 = khách hàng, 2 = nhân viên.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ParticipantKind {
    Customer,
    Employee,
}

impl ParticipantKind {
    pub fn tag(self) -> u8 {
        match self {
            ParticipantKind::Customer => 1,
            ParticipantKind::Employee => 2,
        }
    }
}

impl TryFrom<u8> for ParticipantKind {
    type Error = String;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(ParticipantKind::Customer),
            2 => Ok(ParticipantKind::Employee),
            other => Err(format!("unknown participant tag {other}")),
        }
    }
}

impl From<ParticipantKind> for u8 {
    fn from(kind: ParticipantKind) -> u8 {
        kind.tag()
    }
}

/// Loại tin nhắn. Hiện tại chỉ có text (0); tag lạ được giữ nguyên
/// thay vì làm hỏng cả payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct MessageKind(u8);

impl MessageKind {
    pub const TEXT: MessageKind = MessageKind(0);

    pub fn tag(self) -> u8 {
        self.0
    }
}

impl From<u8> for MessageKind {
    fn from(tag: u8) -> Self {
        MessageKind(tag)
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> u8 {
        kind.0
    }
}

/// Một phòng chat: đúng một khách hàng, tối đa một nhân viên.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub chat_room_id: i64,
    pub customer_id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub is_closed: bool,
    /// Số tin chưa đọc cho người đang xem danh sách phòng (badge).
    #[serde(default)]
    pub unread_count: i64,
}

/// Domain model đại diện một tin nhắn chat.
///
/// `message_id` do server cấp, duy nhất và tăng dần theo thứ tự tạo;
/// client dùng nó làm khóa khử trùng lặp giữa đường REST và đường push.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub message_id: i64,
    pub chat_room_id: i64,
    pub sender_id: i64,
    pub sender_type: ParticipantKind,
    pub message_content: String,
    #[serde(default)]
    pub message_type: MessageKind,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

/// DTO gửi lên backend khi tạo tin nhắn mới (server cấp id và timestamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub chat_room_id: i64,
    pub sender_id: i64,
    pub sender_type: ParticipantKind,
    pub message_content: String,
    pub message_type: MessageKind,
}
