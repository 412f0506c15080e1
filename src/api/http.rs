use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::json;

use crate::auth::AuthContext;
use crate::common::{ChatMessage, ChatRoom, NewMessage, ParticipantKind};

use super::{ApiError, ApiResult, ChatBackend};

/// REST client cho backend chat, một instance dùng chung cho cả phiên.
///
/// Token (nếu có) được đính kèm dạng `Authorization: Bearer ...` vào mọi
/// request, tương đương interceptor phía trình duyệt.
pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>, auth: &AuthContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: auth.bearer_token().map(str::to_string),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn expect_success(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatApi {
    async fn create_room(&self, customer_id: i64) -> ApiResult<ChatRoom> {
        let request = self
            .authorize(self.http.post(self.url("Chat/rooms")))
            .json(&json!({ "customerId": customer_id }));
        let response = Self::expect_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn rooms_for_customer(&self, customer_id: i64) -> ApiResult<Vec<ChatRoom>> {
        let url = self.url(&format!("Chat/rooms/customer/{customer_id}"));
        let response = Self::expect_success(self.authorize(self.http.get(url)).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn rooms_for_employee(&self, employee_id: i64) -> ApiResult<Vec<ChatRoom>> {
        let url = self.url(&format!("Chat/rooms/employee/{employee_id}"));
        let response = Self::expect_success(self.authorize(self.http.get(url)).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn messages(
        &self,
        room_id: i64,
        page: u32,
        page_size: u32,
    ) -> ApiResult<Vec<ChatMessage>> {
        let url = self.url(&format!("Chat/rooms/{room_id}/messages"));
        let request = self
            .authorize(self.http.get(url))
            .query(&[("page", page), ("pageSize", page_size)]);
        let response = Self::expect_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_message(&self, message: &NewMessage) -> ApiResult<ChatMessage> {
        let request = self
            .authorize(self.http.post(self.url("Chat/messages")))
            .json(message);
        let response = Self::expect_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn mark_message_read(&self, message_id: i64) -> ApiResult<()> {
        let url = self.url(&format!("Chat/messages/{message_id}/read"));
        Self::expect_success(self.authorize(self.http.put(url)).send().await?).await?;
        Ok(())
    }

    async fn mark_all_read(
        &self,
        room_id: i64,
        user_id: i64,
        kind: ParticipantKind,
    ) -> ApiResult<()> {
        let url = self.url(&format!("Chat/rooms/{room_id}/read-all"));
        let request = self
            .authorize(self.http.put(url))
            .query(&[("userId", user_id)])
            .query(&[("userType", kind.tag() as i64)]);
        Self::expect_success(request.send().await?).await?;
        Ok(())
    }

    async fn unread_count(
        &self,
        room_id: i64,
        user_id: i64,
        kind: ParticipantKind,
    ) -> ApiResult<i64> {
        let url = self.url(&format!("Chat/rooms/{room_id}/unread-count"));
        let request = self
            .authorize(self.http.get(url))
            .query(&[("userId", user_id)])
            .query(&[("userType", kind.tag() as i64)]);
        let response = Self::expect_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn assign_employee(&self, room_id: i64, employee_id: i64) -> ApiResult<()> {
        let url = self.url(&format!("Chat/rooms/{room_id}/assign"));
        // Body là số trần (không bọc object), theo contract của backend
        let request = self.authorize(self.http.put(url)).json(&employee_id);
        Self::expect_success(request.send().await?).await?;
        Ok(())
    }

    async fn close_room(&self, room_id: i64) -> ApiResult<()> {
        let url = self.url(&format!("Chat/rooms/{room_id}/close"));
        Self::expect_success(self.authorize(self.http.put(url)).send().await?).await?;
        Ok(())
    }
}
