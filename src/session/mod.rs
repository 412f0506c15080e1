pub mod composer;
pub mod feed;
pub mod read_state;
pub mod widget;

use std::fmt;

pub use composer::Composer;
pub use feed::MessageFeed;
pub use read_state::ReadStateTracker;
pub use widget::{AdminConsole, ChatSession};

use crate::common::MAX_MESSAGE_LEN;

/// Thông báo inline cho người dùng. Mọi lỗi đều được bắt tại biên thao tác
/// và đổi thành một notice; không có lỗi nào được phép nổ ra ngoài phiên.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Không resolve/tạo được phòng: widget ở trạng thái đóng.
    CannotLoadChat,
    /// Lịch sử tin nhắn không tải được; danh sách để trống.
    HistoryFailed,
    /// Danh sách phòng (phía nhân viên) không tải được.
    RoomListFailed,
    /// Gửi thất bại; nội dung đã được khôi phục vào ô nhập.
    SendFailed,
    /// Gửi quá nhanh so với lần trước.
    PleaseWait,
    /// Đang có một lần gửi chưa hoàn tất.
    SendInFlight,
    /// Tin nhắn rỗng sau khi trim.
    EmptyMessage,
    /// Vượt quá giới hạn ký tự.
    TooLong { len: usize },
    /// Join phòng realtime thất bại; gửi/nhận vẫn chạy qua REST.
    RealtimeLimited,
    /// Thao tác quản trị (gán nhân viên / đóng phòng) thất bại.
    AdminActionFailed,
}

impl Notice {
    /// Nội dung hiển thị cho người dùng.
    pub fn message(&self) -> String {
        match self {
            Notice::CannotLoadChat => "Không thể tải chat".to_string(),
            Notice::HistoryFailed => "Không thể tải tin nhắn".to_string(),
            Notice::RoomListFailed => "Không thể tải danh sách phòng chat".to_string(),
            Notice::SendFailed => "Không thể gửi tin nhắn".to_string(),
            Notice::PleaseWait => "Vui lòng chờ giây lát rồi gửi tiếp".to_string(),
            Notice::SendInFlight => "Đang gửi tin nhắn trước đó".to_string(),
            Notice::EmptyMessage => "Tin nhắn trống".to_string(),
            Notice::TooLong { len } => {
                format!("Tin nhắn dài {len} ký tự, tối đa {MAX_MESSAGE_LEN}")
            }
            Notice::RealtimeLimited => {
                "Kênh realtime hạn chế, tin nhắn vẫn gửi được".to_string()
            }
            Notice::AdminActionFailed => "Thao tác không thực hiện được".to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
