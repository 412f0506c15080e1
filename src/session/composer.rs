use std::time::Duration;

use tokio::time::Instant;

use crate::api::ChatBackend;
use crate::auth::AuthContext;
use crate::common::{MessageKind, NewMessage, MAX_MESSAGE_LEN};

use super::Notice;

/// Khoảng cách tối thiểu giữa hai lần gửi thành công (chống double-send
/// phía client; không phải cơ chế đúng đắn, server vẫn tự giới hạn).
pub const MIN_SEND_INTERVAL: Duration = Duration::from_secs(1);

/// Ô nhập tin nhắn: giữ bản nháp, chặn gửi trùng/quá nhanh, xóa lạc quan
/// và khôi phục khi gửi lỗi.
pub struct Composer {
    draft: String,
    last_send: Option<Instant>,
    in_flight: bool,
    min_interval: Duration,
}

impl Composer {
    pub fn new() -> Self {
        Self::with_interval(MIN_SEND_INTERVAL)
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            draft: String::new(),
            last_send: None,
            in_flight: false,
            min_interval,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Gửi bản nháp hiện tại.
    ///
    /// Ô nhập được xóa TRƯỚC khi chờ mạng (optimistic); gửi lỗi thì nội
    /// dung gốc được trả lại nguyên văn. Tin gửi thành công sẽ quay về qua
    /// kênh push, không được append cục bộ ở đây để tránh một đường dedup
    /// thứ hai.
    pub async fn send(
        &mut self,
        backend: &dyn ChatBackend,
        room_id: i64,
        sender: &AuthContext,
    ) -> Result<(), Notice> {
        let text = self.draft.trim().to_string();
        if text.is_empty() {
            return Err(Notice::EmptyMessage);
        }
        let len = text.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(Notice::TooLong { len });
        }
        if self.in_flight {
            return Err(Notice::SendInFlight);
        }
        if let Some(last) = self.last_send {
            if last.elapsed() < self.min_interval {
                return Err(Notice::PleaseWait);
            }
        }

        let original = std::mem::take(&mut self.draft);
        self.in_flight = true;
        let dto = NewMessage {
            chat_room_id: room_id,
            sender_id: sender.user_id(),
            sender_type: sender.kind(),
            message_content: text,
            message_type: MessageKind::TEXT,
        };
        // Future có thể bị hủy ngay tại điểm chờ mạng (panel đóng giữa
        // chừng); guard đảm bảo cờ in-flight được hạ và nháp quay lại.
        let mut guard = SendGuard {
            composer: self,
            original: Some(original),
        };
        let result = backend.send_message(&dto).await;

        match result {
            Ok(_echoed) => {
                guard.composer.last_send = Some(Instant::now());
                // Gửi xong: nháp giữ trạng thái đã xóa
                guard.original = None;
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to send message in room {room_id}: {err}");
                Err(Notice::SendFailed)
            }
        }
    }
}

/// Dọn trạng thái gửi dù `send` chạy hết hay bị hủy giữa chừng: hạ cờ
/// in-flight, và khôi phục nháp nếu chưa được xác nhận gửi thành công.
struct SendGuard<'a> {
    composer: &'a mut Composer,
    original: Option<String>,
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.composer.in_flight = false;
        if let Some(original) = self.original.take() {
            self.composer.draft = original;
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}
