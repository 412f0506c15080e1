//! Test tích hợp cho client REST, chạy trên một server HTTP giả.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support_chat::api::{ApiError, ChatBackend, HttpChatApi};
use support_chat::auth::AuthContext;
use support_chat::common::{MessageKind, NewMessage, ParticipantKind};

fn api(server: &MockServer) -> HttpChatApi {
    let auth = AuthContext::new(42, ParticipantKind::Customer).with_token("jwt-token");
    HttpChatApi::new(format!("{}/api", server.uri()), &auth)
}

#[tokio::test]
async fn attaches_bearer_token_to_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/Chat/messages/7/read"))
        .and(header("authorization", "Bearer jwt-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    api(&server).mark_message_read(7).await.unwrap();
}

#[tokio::test]
async fn creates_room_with_customer_id_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Chat/rooms"))
        .and(body_json(json!({ "customerId": 42 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chatRoomId": 9,
            "customerId": 42,
            "roomName": "Hỗ trợ #9",
            "customerName": "Nguyễn Văn A"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let room = api(&server).create_room(42).await.unwrap();
    assert_eq!(room.chat_room_id, 9);
    assert_eq!(room.customer_id, 42);
    // các trường backend bỏ trống nhận giá trị mặc định
    assert_eq!(room.employee_id, None);
    assert!(!room.is_closed);
    assert_eq!(room.unread_count, 0);
}

#[tokio::test]
async fn loads_rooms_for_employee() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Chat/rooms/employee/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "chatRoomId": 1,
                "customerId": 42,
                "employeeId": 7,
                "roomName": "Hỗ trợ #1",
                "customerName": "Nguyễn Văn A",
                "unreadCount": 3
            }
        ])))
        .mount(&server)
        .await;

    let rooms = api(&server).rooms_for_employee(7).await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].employee_id, Some(7));
    assert_eq!(rooms[0].unread_count, 3);
}

#[tokio::test]
async fn pages_message_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Chat/rooms/9/messages"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "messageId": 1,
                "chatRoomId": 9,
                "senderId": 42,
                "senderType": 1,
                "messageContent": "Xin chào",
                "messageType": 0,
                "createdAt": "2026-08-25T09:30:00Z",
                "isRead": true,
                "readAt": "2026-08-25T09:31:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let messages = api(&server).messages(9, 2, 25).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_content, "Xin chào");
    assert_eq!(messages[0].sender_type, ParticipantKind::Customer);
    assert!(messages[0].is_read);
}

#[tokio::test]
async fn sends_message_and_parses_echo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Chat/messages"))
        .and(body_json(json!({
            "chatRoomId": 9,
            "senderId": 42,
            "senderType": 1,
            "messageContent": "Đơn hàng của tôi đâu?",
            "messageType": 0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messageId": 12,
            "chatRoomId": 9,
            "senderId": 42,
            "senderType": 1,
            "messageContent": "Đơn hàng của tôi đâu?",
            "messageType": 0,
            "createdAt": "2026-08-25T09:30:00Z",
            "isRead": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dto = NewMessage {
        chat_room_id: 9,
        sender_id: 42,
        sender_type: ParticipantKind::Customer,
        message_content: "Đơn hàng của tôi đâu?".to_string(),
        message_type: MessageKind::TEXT,
    };
    let echoed = api(&server).send_message(&dto).await.unwrap();
    assert_eq!(echoed.message_id, 12);
    assert_eq!(echoed.read_at, None);
}

#[tokio::test]
async fn marks_room_read_with_viewer_identity() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/Chat/rooms/9/read-all"))
        .and(query_param("userId", "42"))
        .and(query_param("userType", "1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    api(&server)
        .mark_all_read(9, 42, ParticipantKind::Customer)
        .await
        .unwrap();
}

#[tokio::test]
async fn fetches_unread_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Chat/rooms/9/unread-count"))
        .and(query_param("userId", "42"))
        .and(query_param("userType", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(5)))
        .mount(&server)
        .await;

    let count = api(&server)
        .unread_count(9, 42, ParticipantKind::Customer)
        .await
        .unwrap();
    assert_eq!(count, 5);
}

#[tokio::test]
async fn assigns_employee_with_bare_number_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/Chat/rooms/9/assign"))
        .and(body_json(json!(7)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    api(&server).assign_employee(9, 7).await.unwrap();
}

#[tokio::test]
async fn closes_room() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/Chat/rooms/9/close"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    api(&server).close_room(9).await.unwrap();
}

#[tokio::test]
async fn non_success_status_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Chat/rooms/customer/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = api(&server).rooms_for_customer(42).await.unwrap_err();
    match err {
        ApiError::Status { status } => assert_eq!(status, 500),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn has_unread_is_false_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Chat/rooms/9/unread-count"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let auth = AuthContext::new(42, ParticipantKind::Customer).with_token("jwt-token");
    assert!(!api(&server).has_unread(9, &auth).await);
}

#[tokio::test]
async fn batch_mark_read_continues_past_failures() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/Chat/messages/1/read"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/Chat/messages/2/read"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    // tin lỗi không làm dừng cả batch
    api(&server).batch_mark_read(&[1, 2]).await;
}

#[tokio::test]
async fn enter_room_swallows_backend_failures() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/Chat/rooms/9/read-all"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let auth = AuthContext::new(42, ParticipantKind::Customer).with_token("jwt-token");
    // best-effort: không trả lỗi, không panic
    api(&server).enter_room(9, &auth).await;
}
