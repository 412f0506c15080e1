/// Lệnh tầng phiên gửi xuống hub client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubCommand {
    /// Tham gia (hoặc tham gia lại) một phòng. Hub chỉ giữ đúng một phòng
    /// cho mỗi widget; lệnh lặp lại là idempotent phía server.
    JoinRoom(i64),
    /// Đóng widget: ngắt kết nối và kết thúc vòng lặp hub.
    Shutdown,
}
