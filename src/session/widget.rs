use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{ChatBackend, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::auth::AuthContext;
use crate::common::{ChatMessage, ChatRoom, HubEvent, HubStatus};
use crate::hub::{self, HubConnector, HubHandle};

use super::{Composer, MessageFeed, Notice, ReadStateTracker};

/// Một panel chat đang mở trên đúng một phòng.
///
/// Widget khách hàng và khung chat của console nhân viên đều là một
/// `ChatSession`; khác nhau ở cách resolve phòng (xem [`AdminConsole`]).
/// Danh sách tin là cache cục bộ của phiên, dựng lại từ REST mỗi lần mở.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    viewer: AuthContext,
    room: ChatRoom,
    feed: MessageFeed,
    composer: Composer,
    tracker: ReadStateTracker,
    hub: HubHandle,
    events: mpsc::Receiver<HubEvent>,
    notices: Vec<Notice>,
}

impl ChatSession {
    /// Mở widget phía khách hàng: lấy phòng sẵn có, chưa có thì tạo mới.
    ///
    /// Resolve phòng thất bại là lỗi phục hồi được: widget giữ trạng thái
    /// đóng, trang chủ không bị ảnh hưởng.
    pub async fn open_for_customer(
        backend: Arc<dyn ChatBackend>,
        connector: Box<dyn HubConnector>,
        viewer: AuthContext,
    ) -> Result<Self, Notice> {
        let rooms = backend
            .rooms_for_customer(viewer.user_id())
            .await
            .map_err(|err| {
                log::error!("Failed to resolve chat room: {err}");
                Notice::CannotLoadChat
            })?;
        let room = match rooms.into_iter().next() {
            Some(room) => room,
            None => backend.create_room(viewer.user_id()).await.map_err(|err| {
                log::error!("Failed to create chat room: {err}");
                Notice::CannotLoadChat
            })?,
        };
        Ok(Self::start(backend, connector, viewer, room).await)
    }

    /// Mở phiên trên một phòng đã resolve xong (phía nhân viên chọn từ
    /// danh sách; không bao giờ tự tạo phòng).
    pub async fn start(
        backend: Arc<dyn ChatBackend>,
        connector: Box<dyn HubConnector>,
        viewer: AuthContext,
        room: ChatRoom,
    ) -> Self {
        let mut feed = MessageFeed::new();
        let mut notices = Vec::new();
        match backend
            .messages(room.chat_room_id, DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
            .await
        {
            Ok(history) => feed.reset(history),
            Err(err) => {
                // Lịch sử hỏng: danh sách trống + notice, không tự retry
                log::warn!(
                    "Failed to load history for room {}: {err}",
                    room.chat_room_id
                );
                feed.clear();
                notices.push(Notice::HistoryFailed);
            }
        }

        let (hub, events) = hub::spawn(connector);
        hub.join_room(room.chat_room_id).await;

        let tracker = ReadStateTracker::new(backend.clone(), viewer.clone());
        tracker.mark_all_read(room.chat_room_id).await;

        Self {
            backend,
            viewer,
            room,
            feed,
            composer: Composer::new(),
            tracker,
            hub,
            events,
            notices,
        }
    }

    pub fn room(&self) -> &ChatRoom {
        &self.room
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.feed.messages()
    }

    pub fn hub_status(&self) -> HubStatus {
        self.hub.status()
    }

    pub fn draft(&self) -> &str {
        self.composer.draft()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.composer.set_draft(text);
    }

    /// Gửi bản nháp hiện tại; tin sẽ hiện lên qua push echo, không append
    /// tại đây.
    pub async fn send(&mut self) -> Result<(), Notice> {
        self.composer
            .send(self.backend.as_ref(), self.room.chat_room_id, &self.viewer)
            .await
    }

    /// Chờ sự kiện hub kế tiếp, áp vào phiên rồi trả lại cho caller hiển
    /// thị. `None` khi hub đã dừng.
    pub async fn next_event(&mut self) -> Option<HubEvent> {
        let event = self.events.recv().await?;
        if self.apply_event(event.clone()) {
            // Phòng đang mở: tin mới đến được đánh dấu đã đọc ngay
            self.tracker.mark_all_read(self.room.chat_room_id).await;
        }
        Some(event)
    }

    /// Xả các sự kiện đang chờ mà không block (cho vòng lặp UI vẽ lại
    /// theo frame).
    pub async fn pump_events(&mut self) {
        let mut appended = false;
        while let Ok(event) = self.events.try_recv() {
            appended |= self.apply_event(event);
        }
        if appended {
            self.tracker.mark_all_read(self.room.chat_room_id).await;
        }
    }

    /// Trả về `true` khi một tin mới thực sự được thêm vào danh sách.
    fn apply_event(&mut self, event: HubEvent) -> bool {
        match event {
            HubEvent::MessageReceived(message) => self.feed.push(message),
            HubEvent::MessageRead {
                message_id,
                read_at,
            } => {
                self.feed.mark_read(message_id, read_at);
                false
            }
            HubEvent::StatusChanged(_) => false,
            HubEvent::Degraded(reason) => {
                log::warn!("Realtime degraded: {reason}");
                self.notices.push(Notice::RealtimeLimited);
                false
            }
        }
    }

    /// Lấy (và xóa) các notice đã tích lũy.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Đóng panel: dừng hub, giải phóng kết nối. Kết quả các request đang
    /// bay bị bỏ (phiên không còn để nhận).
    pub async fn close(self) {
        self.hub.shutdown().await;
    }
}

/// Console phía nhân viên: danh sách phòng với badge chưa đọc, chọn phòng
/// để mở một [`ChatSession`], gán nhân viên và đóng phòng.
pub struct AdminConsole {
    backend: Arc<dyn ChatBackend>,
    viewer: AuthContext,
    tracker: ReadStateTracker,
    rooms: Vec<ChatRoom>,
    notices: Vec<Notice>,
}

impl AdminConsole {
    pub fn new(backend: Arc<dyn ChatBackend>, viewer: AuthContext) -> Self {
        let tracker = ReadStateTracker::new(backend.clone(), viewer.clone());
        Self {
            backend,
            viewer,
            tracker,
            rooms: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Tải lại danh sách phòng của nhân viên này. Không có phòng là trạng
    /// thái bình thường (danh sách trống, chờ được gán).
    pub async fn load_rooms(&mut self) -> &[ChatRoom] {
        match self
            .backend
            .rooms_for_employee(self.viewer.user_id())
            .await
        {
            Ok(rooms) => self.rooms = rooms,
            Err(err) => {
                log::error!("Failed to load chat rooms: {err}");
                self.rooms.clear();
                self.notices.push(Notice::RoomListFailed);
            }
        }
        &self.rooms
    }

    /// Cập nhật badge chưa đọc cho từng phòng; lỗi từng phòng coi như 0.
    pub async fn refresh_badges(&mut self) {
        for index in 0..self.rooms.len() {
            let room_id = self.rooms[index].chat_room_id;
            self.rooms[index].unread_count = self.tracker.unread_count(room_id).await;
        }
    }

    pub fn rooms(&self) -> &[ChatRoom] {
        &self.rooms
    }

    /// Mở phòng đã chọn. Mỗi lần chọn tạo một phiên (và kết nối hub) mới;
    /// caller tự `close()` phiên cũ trước.
    pub async fn open_room(
        &self,
        room_id: i64,
        connector: Box<dyn HubConnector>,
    ) -> Result<ChatSession, Notice> {
        let room = self
            .rooms
            .iter()
            .find(|room| room.chat_room_id == room_id)
            .cloned()
            .ok_or(Notice::CannotLoadChat)?;
        Ok(ChatSession::start(self.backend.clone(), connector, self.viewer.clone(), room).await)
    }

    pub async fn assign_employee(&self, room_id: i64, employee_id: i64) -> Result<(), Notice> {
        self.backend
            .assign_employee(room_id, employee_id)
            .await
            .map_err(|err| {
                log::error!("Failed to assign employee to room {room_id}: {err}");
                Notice::AdminActionFailed
            })
    }

    pub async fn close_room(&self, room_id: i64) -> Result<(), Notice> {
        self.backend.close_room(room_id).await.map_err(|err| {
            log::error!("Failed to close room {room_id}: {err}");
            Notice::AdminActionFailed
        })
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use tokio::time::timeout;

    use super::*;
    use crate::common::ParticipantKind;
    use crate::hub::protocol::ServerFrame;
    use crate::hub::testing::FakeConnector;
    use crate::session::testing::{message, room, FakeBackend};

    fn customer() -> AuthContext {
        AuthContext::new(42, ParticipantKind::Customer)
    }

    fn employee() -> AuthContext {
        AuthContext::new(7, ParticipantKind::Employee)
    }

    /// Chờ tới khi phiên xử lý xong một sự kiện thỏa điều kiện.
    async fn wait_for(session: &mut ChatSession, pred: impl Fn(&HubEvent) -> bool) {
        loop {
            let event = timeout(Duration::from_secs(5), session.next_event())
                .await
                .expect("timed out waiting for hub event")
                .expect("hub stopped");
            if pred(&event) {
                return;
            }
        }
    }

    #[tokio::test]
    async fn fresh_customer_creates_room_once_and_sees_own_echo() {
        let backend = Arc::new(FakeBackend::new());
        let connector = FakeConnector::new();
        let remote = connector.queue_transport();
        let mut session = ChatSession::open_for_customer(
            backend.clone(),
            Box::new(connector.clone()),
            customer(),
        )
        .await
        .unwrap();

        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 1);
        assert!(session.messages().is_empty());
        assert_eq!(session.room().customer_id, 42);
        let room_id = session.room().chat_room_id;

        session.set_draft("Xin chào");
        session.send().await.unwrap();
        assert_eq!(session.draft(), "");
        {
            let sent = backend.sent.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].message_content, "Xin chào");
            assert_eq!(sent[0].sender_type, ParticipantKind::Customer);
        }

        // tin quay về qua push, không phải composer tự append
        remote.push(ServerFrame::ReceiveMessage {
            message: message(1, room_id, ParticipantKind::Customer, "Xin chào"),
        });
        wait_for(&mut session, |e| matches!(e, HubEvent::MessageReceived(_))).await;
        assert_eq!(session.messages().len(), 1);
        assert_eq!(
            session.messages()[0].sender_type,
            ParticipantKind::Customer
        );

        // fan-out lặp lại cùng id: vẫn đúng một bubble
        remote.push(ServerFrame::ReceiveMessage {
            message: message(1, room_id, ParticipantKind::Customer, "Xin chào"),
        });
        remote.push(ServerFrame::ReceiveMessage {
            message: message(2, room_id, ParticipantKind::Employee, "Chào anh"),
        });
        wait_for(&mut session, |e| matches!(e, HubEvent::MessageReceived(_))).await;
        wait_for(&mut session, |e| matches!(e, HubEvent::MessageReceived(_))).await;
        let ids: Vec<i64> = session.messages().iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![1, 2]);

        session.close().await;
    }

    #[tokio::test]
    async fn returning_customer_reuses_room_and_loads_history() {
        let backend = Arc::new(FakeBackend::new());
        backend.rooms.lock().unwrap().push(room(9, 42));
        backend.history.lock().unwrap().extend([
            message(1, 9, ParticipantKind::Customer, "đơn hàng của tôi?"),
            message(2, 9, ParticipantKind::Employee, "đang giao ạ"),
        ]);
        let connector = FakeConnector::new();
        let _remote = connector.queue_transport();

        let session = ChatSession::open_for_customer(
            backend.clone(),
            Box::new(connector.clone()),
            customer(),
        )
        .await
        .unwrap();

        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.room().chat_room_id, 9);
        assert_eq!(session.messages().len(), 2);
        // vào phòng đánh dấu đã đọc
        assert!(backend.mark_all_calls.load(Ordering::SeqCst) >= 1);

        session.close().await;
    }

    #[tokio::test]
    async fn room_resolution_failure_is_recoverable() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail_rooms.store(true, Ordering::SeqCst);
        let connector = FakeConnector::new();

        let result = ChatSession::open_for_customer(
            backend,
            Box::new(connector.clone()),
            customer(),
        )
        .await;
        assert_eq!(result.err(), Some(Notice::CannotLoadChat));
        // widget đóng/trơ: không có kết nối hub nào được mở
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn history_failure_shows_empty_list_with_notice() {
        let backend = Arc::new(FakeBackend::new());
        backend.rooms.lock().unwrap().push(room(9, 42));
        backend
            .history
            .lock()
            .unwrap()
            .push(message(1, 9, ParticipantKind::Customer, "cũ"));
        backend.fail_history.store(true, Ordering::SeqCst);
        let connector = FakeConnector::new();
        let _remote = connector.queue_transport();

        let mut session = ChatSession::open_for_customer(
            backend,
            Box::new(connector.clone()),
            customer(),
        )
        .await
        .unwrap();

        assert!(session.messages().is_empty());
        assert!(session.take_notices().contains(&Notice::HistoryFailed));
        session.close().await;
    }

    #[tokio::test]
    async fn read_receipt_updates_message_in_place() {
        let backend = Arc::new(FakeBackend::new());
        backend.rooms.lock().unwrap().push(room(9, 42));
        backend
            .history
            .lock()
            .unwrap()
            .push(message(1, 9, ParticipantKind::Customer, "hi"));
        let connector = FakeConnector::new();
        let remote = connector.queue_transport();

        let mut session = ChatSession::open_for_customer(
            backend,
            Box::new(connector.clone()),
            customer(),
        )
        .await
        .unwrap();

        let read_at = Utc::now();
        remote.push(ServerFrame::MessageRead {
            message_id: 1,
            read_at: Some(read_at),
        });
        // receipt cho tin chưa thấy: no-op, không phải lỗi
        remote.push(ServerFrame::MessageRead {
            message_id: 999,
            read_at: None,
        });
        wait_for(&mut session, |e| {
            matches!(e, HubEvent::MessageRead { message_id: 999, .. })
        })
        .await;

        assert!(session.messages()[0].is_read);
        assert_eq!(session.messages()[0].read_at, Some(read_at));
        session.close().await;
    }

    #[tokio::test]
    async fn employee_sees_room_only_after_assignment() {
        let backend = Arc::new(FakeBackend::new());
        backend.rooms.lock().unwrap().push(room(1, 42));
        let mut console = AdminConsole::new(backend.clone(), employee());

        // chưa được gán: danh sách trống, không tự tạo phòng
        assert!(console.load_rooms().await.is_empty());
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);

        console.assign_employee(1, 7).await.unwrap();
        let rooms = console.load_rooms().await;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].employee_id, Some(7));
    }

    #[tokio::test]
    async fn unread_badges_clear_after_opening_room() {
        let backend = Arc::new(FakeBackend::new());
        let mut assigned = room(1, 42);
        assigned.employee_id = Some(7);
        backend.rooms.lock().unwrap().push(assigned);
        backend.unread.lock().unwrap().insert((1, 7), 2);

        let mut console = AdminConsole::new(backend.clone(), employee());
        console.load_rooms().await;
        console.refresh_badges().await;
        assert_eq!(console.rooms()[0].unread_count, 2);

        let connector = FakeConnector::new();
        let _remote = connector.queue_transport();
        let session = console
            .open_room(1, Box::new(connector.clone()))
            .await
            .unwrap();

        console.refresh_badges().await;
        assert_eq!(console.rooms()[0].unread_count, 0);
        session.close().await;
    }

    #[tokio::test]
    async fn room_list_failure_surfaces_notice() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail_rooms.store(true, Ordering::SeqCst);
        let mut console = AdminConsole::new(backend, employee());

        assert!(console.load_rooms().await.is_empty());
        assert!(console.take_notices().contains(&Notice::RoomListFailed));
    }

    #[tokio::test]
    async fn closing_room_marks_it_closed() {
        let backend = Arc::new(FakeBackend::new());
        let mut assigned = room(1, 42);
        assigned.employee_id = Some(7);
        backend.rooms.lock().unwrap().push(assigned);

        let mut console = AdminConsole::new(backend.clone(), employee());
        console.load_rooms().await;
        console.close_room(1).await.unwrap();

        assert!(backend.rooms.lock().unwrap()[0].is_closed);
    }
}
