pub mod http;

use async_trait::async_trait;

use crate::auth::AuthContext;
use crate::common::{ChatMessage, ChatRoom, NewMessage, ParticipantKind};

pub use http::HttpChatApi;

/// Trang mặc định khi tải lịch sử tin nhắn.
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {status}")]
    Status { status: u16 },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Contract REST của Message Store. `HttpChatApi` là bản thật chạy trên
/// reqwest; test tiêm bản giả qua trait object này.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Tạo phòng chat cho một khách hàng (khi họ chưa có phòng nào).
    async fn create_room(&self, customer_id: i64) -> ApiResult<ChatRoom>;

    async fn rooms_for_customer(&self, customer_id: i64) -> ApiResult<Vec<ChatRoom>>;

    async fn rooms_for_employee(&self, employee_id: i64) -> ApiResult<Vec<ChatRoom>>;

    /// Một trang tin nhắn của phòng, đã sắp theo thời gian tăng dần phía server.
    async fn messages(&self, room_id: i64, page: u32, page_size: u32)
        -> ApiResult<Vec<ChatMessage>>;

    /// Gửi tin nhắn; server cấp id và timestamp trong bản ghi trả về.
    async fn send_message(&self, message: &NewMessage) -> ApiResult<ChatMessage>;

    async fn mark_message_read(&self, message_id: i64) -> ApiResult<()>;

    async fn mark_all_read(
        &self,
        room_id: i64,
        user_id: i64,
        kind: ParticipantKind,
    ) -> ApiResult<()>;

    async fn unread_count(
        &self,
        room_id: i64,
        user_id: i64,
        kind: ParticipantKind,
    ) -> ApiResult<i64>;

    async fn assign_employee(&self, room_id: i64, employee_id: i64) -> ApiResult<()>;

    async fn close_room(&self, room_id: i64) -> ApiResult<()>;

    // --- Helper: quản lý trạng thái đã đọc, best-effort ---

    /// Đánh dấu đã đọc khi vào phòng. Lỗi chỉ log, không bao giờ chặn
    /// việc vào phòng.
    async fn enter_room(&self, room_id: i64, viewer: &AuthContext) {
        if let Err(err) = self
            .mark_all_read(room_id, viewer.user_id(), viewer.kind())
            .await
        {
            log::warn!("Failed to mark room {room_id} read on entry: {err}");
        }
    }

    /// Có tin chưa đọc hay không; lỗi coi như không có để không chặn
    /// việc render danh sách phòng.
    async fn has_unread(&self, room_id: i64, viewer: &AuthContext) -> bool {
        match self
            .unread_count(room_id, viewer.user_id(), viewer.kind())
            .await
        {
            Ok(count) => count > 0,
            Err(err) => {
                log::warn!("Failed to check unread for room {room_id}: {err}");
                false
            }
        }
    }

    /// Đánh dấu đã đọc từng tin một; tin lỗi không làm dừng cả batch.
    async fn batch_mark_read(&self, message_ids: &[i64]) {
        for id in message_ids {
            if let Err(err) = self.mark_message_read(*id).await {
                log::warn!("Failed to mark message {id} read: {err}");
            }
        }
    }
}
