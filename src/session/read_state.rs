use std::sync::Arc;

use crate::api::ChatBackend;
use crate::auth::AuthContext;

/// Trạng thái đã đọc, theo góc nhìn của một người tham gia.
///
/// Toàn bộ là best-effort UX: lỗi chỉ được log, không bao giờ chặn việc
/// gửi/nhận tin hay render danh sách phòng.
pub struct ReadStateTracker {
    backend: Arc<dyn ChatBackend>,
    viewer: AuthContext,
}

impl ReadStateTracker {
    pub fn new(backend: Arc<dyn ChatBackend>, viewer: AuthContext) -> Self {
        Self { backend, viewer }
    }

    /// Đánh dấu cả phòng đã đọc. Gọi khi phòng được mở và sau mỗi thay đổi
    /// danh sách tin trong lúc phòng còn mở; gọi lại trên phòng đã đọc hết
    /// là no-op an toàn.
    pub async fn mark_all_read(&self, room_id: i64) {
        self.backend.enter_room(room_id, &self.viewer).await;
    }

    /// Số tin chưa đọc cho badge; lỗi coi như 0.
    pub async fn unread_count(&self, room_id: i64) -> i64 {
        match self
            .backend
            .unread_count(room_id, self.viewer.user_id(), self.viewer.kind())
            .await
        {
            Ok(count) => count.max(0),
            Err(err) => {
                log::warn!("Failed to fetch unread count for room {room_id}: {err}");
                0
            }
        }
    }

    pub async fn has_unread(&self, room_id: i64) -> bool {
        self.unread_count(room_id).await > 0
    }
}
