use crate::common::ParticipantKind;

/// Danh tính đã giải mã của người dùng hiện tại.
///
/// Việc decode bearer token (claim `sub` = user id, claim `userType` = loại
/// người dùng) thuộc về shell ứng dụng bên ngoài; tầng chat chỉ nhận kết quả
/// đã resolve. Context này được truyền tường minh vào mọi nơi cần danh tính
/// thay vì tra cứu global, để test có thể tiêm danh tính giả.
#[derive(Debug, Clone)]
pub struct AuthContext {
    user_id: i64,
    kind: ParticipantKind,
    bearer_token: Option<String>,
}

impl AuthContext {
    /// Tạo context từ một danh tính đã resolve. Caller chịu trách nhiệm
    /// redirect sang trang đăng nhập khi chưa có danh tính; constructor này
    /// không nhận id rỗng.
    pub fn new(user_id: i64, kind: ParticipantKind) -> Self {
        Self {
            user_id,
            kind,
            bearer_token: None,
        }
    }

    /// Đính kèm bearer token để gắn vào header REST và URL của hub.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}
