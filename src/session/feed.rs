use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::common::ChatMessage;

/// Cache tin nhắn phía client của một panel chat đang mở.
///
/// Append-only theo thứ tự đến: lịch sử ban đầu do server sắp theo thời
/// gian tăng dần, các push sau đó nối đuôi và không bao giờ sắp lại.
/// Cùng một tin có thể về qua cả REST echo lẫn push fan-out, nên message id
/// là khóa khử trùng lặp duy nhất; index id -> vị trí thay cho quét tuyến tính.
pub struct MessageFeed {
    messages: Vec<ChatMessage>,
    index: HashMap<i64, usize>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Thay toàn bộ nội dung bằng một trang lịch sử mới tải.
    pub fn reset(&mut self, history: Vec<ChatMessage>) {
        self.messages = Vec::with_capacity(history.len());
        self.index = HashMap::with_capacity(history.len());
        for message in history {
            self.push(message);
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.index.clear();
    }

    /// Append nếu id chưa có mặt; trả về `true` khi tin được thêm.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if self.index.contains_key(&message.message_id) {
            return false;
        }
        self.index.insert(message.message_id, self.messages.len());
        self.messages.push(message);
        true
    }

    /// Chuyển unread -> read cho một tin. Đơn điệu: tin đã đọc không bao giờ
    /// quay lại chưa đọc; id chưa thấy là no-op (tin sẽ mang đúng trạng thái
    /// khi về qua lịch sử hoặc push).
    pub fn mark_read(&mut self, message_id: i64, read_at: Option<DateTime<Utc>>) -> bool {
        let Some(&position) = self.index.get(&message_id) else {
            return false;
        };
        let message = &mut self.messages[position];
        if message.is_read {
            return false;
        }
        message.is_read = true;
        message.read_at = read_at.or_else(|| Some(Utc::now()));
        true
    }

    pub fn contains(&self, message_id: i64) -> bool {
        self.index.contains_key(&message_id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for MessageFeed {
    fn default() -> Self {
        Self::new()
    }
}
