use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::common::{HubCommand, HubEvent, HubStatus};

use super::protocol::{ClientFrame, ServerFrame};
use super::transport::{HubConnector, HubTransport};

/// Lịch backoff khi kết nối lại (giây); reset sau mỗi lần nối thành công.
/// Transport đóng cứng thì thử lại ngay (phần tử đầu = 0) để giữ độ trễ
/// reconnect trong vài giây ở các lỗi thường gặp.
const RECONNECT_BACKOFF_SECS: [u64; 4] = [0, 2, 10, 30];

const EVENT_BUFFER: usize = 100;
const COMMAND_BUFFER: usize = 100;

/// Kết quả của một vòng kết nối đã thiết lập.
enum Driven {
    Shutdown,
    ConnectionLost,
}

/// Vòng lặp nền giữ kết nối realtime cho đúng một phòng tại một thời điểm.
///
/// Tầng phiên nói chuyện với client này qua kênh lệnh/sự kiện; trạng thái
/// kết nối công bố qua kênh `watch` cho indicator.
pub struct HubClient {
    connector: Box<dyn HubConnector>,
    event_sender: mpsc::Sender<HubEvent>,
    command_receiver: mpsc::Receiver<HubCommand>,
    status_sender: watch::Sender<HubStatus>,
    room: Option<i64>,
    ever_connected: bool,
}

/// Đầu điều khiển phía tầng phiên.
pub struct HubHandle {
    command_sender: mpsc::Sender<HubCommand>,
    status_receiver: watch::Receiver<HubStatus>,
    task: JoinHandle<()>,
}

impl HubHandle {
    pub async fn join_room(&self, room_id: i64) {
        if let Err(err) = self
            .command_sender
            .send(HubCommand::JoinRoom(room_id))
            .await
        {
            log::warn!("Hub task gone; join for room {room_id} dropped: {err}");
        }
    }

    pub fn status(&self) -> HubStatus {
        *self.status_receiver.borrow()
    }

    /// Kênh `watch` là nguồn trạng thái chuẩn; sự kiện `StatusChanged`
    /// trên kênh sự kiện chỉ là tín hiệu đánh thức best-effort.
    pub fn status_receiver(&self) -> watch::Receiver<HubStatus> {
        self.status_receiver.clone()
    }

    /// Ngắt kết nối và chờ task nền kết thúc; không để rò socket/timer.
    pub async fn shutdown(self) {
        let _ = self.command_sender.send(HubCommand::Shutdown).await;
        let _ = self.task.await;
    }
}

/// Khởi chạy hub client trên một task nền, trả về đầu điều khiển và
/// kênh sự kiện cho tầng phiên.
pub fn spawn(connector: Box<dyn HubConnector>) -> (HubHandle, mpsc::Receiver<HubEvent>) {
    let (event_sender, event_receiver) = mpsc::channel(EVENT_BUFFER);
    let (command_sender, command_receiver) = mpsc::channel(COMMAND_BUFFER);
    let (status_sender, status_receiver) = watch::channel(HubStatus::Disconnected);

    let client = HubClient {
        connector,
        event_sender,
        command_receiver,
        status_sender,
        room: None,
        ever_connected: false,
    };
    let task = tokio::spawn(client.run());

    (
        HubHandle {
            command_sender,
            status_receiver,
            task,
        },
        event_receiver,
    )
}

impl HubClient {
    pub async fn run(mut self) {
        // Chưa biết phòng thì chưa mở kết nối
        while self.room.is_none() {
            match self.command_receiver.recv().await {
                Some(HubCommand::JoinRoom(room_id)) => self.room = Some(room_id),
                Some(HubCommand::Shutdown) | None => {
                    self.set_status(HubStatus::Disconnected);
                    return;
                }
            }
        }

        let mut attempt: usize = 0;
        loop {
            if !self.backoff(attempt).await {
                self.set_status(HubStatus::Disconnected);
                return;
            }

            self.set_status(if self.ever_connected {
                HubStatus::Reconnecting
            } else {
                HubStatus::Connecting
            });

            let mut transport = match self.connector.connect().await {
                Ok(transport) => transport,
                Err(err) => {
                    log::warn!("Hub connect failed: {err}");
                    attempt += 1;
                    continue;
                }
            };

            self.set_status(HubStatus::Connected);
            self.ever_connected = true;
            attempt = 0;

            // Membership không sống sót qua reconnect: join lại mỗi lần nối
            self.join_current_room(transport.as_mut()).await;

            match self.drive(transport.as_mut()).await {
                Driven::Shutdown => {
                    transport.close().await;
                    self.set_status(HubStatus::Disconnected);
                    return;
                }
                Driven::ConnectionLost => {
                    self.set_status(HubStatus::Reconnecting);
                }
            }
        }
    }

    /// Chờ theo lịch backoff, vẫn nhận lệnh trong lúc chờ.
    /// Trả về `false` khi nhận Shutdown.
    async fn backoff(&mut self, attempt: usize) -> bool {
        let secs = RECONNECT_BACKOFF_SECS[attempt.min(RECONNECT_BACKOFF_SECS.len() - 1)];
        if secs == 0 {
            return true;
        }
        let sleep = tokio::time::sleep(Duration::from_secs(secs));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                command = self.command_receiver.recv() => match command {
                    Some(HubCommand::JoinRoom(room_id)) => self.room = Some(room_id),
                    Some(HubCommand::Shutdown) | None => return false,
                },
            }
        }
    }

    async fn join_current_room(&mut self, transport: &mut dyn HubTransport) {
        let Some(room_id) = self.room else { return };
        if let Err(err) = transport.send(ClientFrame::JoinChatRoom { room_id }).await {
            // Socket còn sống nhưng join hỏng: ở lại chế độ REST-only,
            // không hạ phiên; reconnect kế tiếp sẽ join lại.
            log::warn!("JoinChatRoom({room_id}) failed: {err}");
            let _ = self
                .event_sender
                .send(HubEvent::Degraded(format!(
                    "join room {room_id} failed: {err}"
                )))
                .await;
        }
    }

    /// Bơm sự kiện trên một kết nối đã mở cho tới khi có Shutdown
    /// hoặc transport đóng.
    async fn drive(&mut self, transport: &mut dyn HubTransport) -> Driven {
        loop {
            tokio::select! {
                command = self.command_receiver.recv() => match command {
                    Some(HubCommand::JoinRoom(room_id)) => {
                        self.room = Some(room_id);
                        self.join_current_room(transport).await;
                    }
                    Some(HubCommand::Shutdown) | None => return Driven::Shutdown,
                },
                frame = transport.next_frame() => match frame {
                    Some(Ok(frame)) => self.forward(frame).await,
                    Some(Err(err)) => log::warn!("Dropping malformed hub frame: {err}"),
                    None => {
                        log::warn!("Hub connection closed; reconnecting");
                        return Driven::ConnectionLost;
                    }
                },
            }
        }
    }

    async fn forward(&mut self, frame: ServerFrame) {
        let event = match frame {
            ServerFrame::ReceiveMessage { message } => HubEvent::MessageReceived(message),
            ServerFrame::MessageRead {
                message_id,
                read_at,
            } => HubEvent::MessageRead {
                message_id,
                read_at,
            },
        };
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to forward hub event to session: {err}");
        }
    }

    fn set_status(&mut self, status: HubStatus) {
        let changed = self.status_sender.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            // try_send: trạng thái chỉ là tín hiệu UI, không được chặn vòng lặp
            let _ = self.event_sender.try_send(HubEvent::StatusChanged(status));
        }
    }
}
