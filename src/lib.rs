//! Client chat hỗ trợ khách hàng: REST cho dữ liệu, WebSocket cho push.
//!
//! Tầng `session` là bề mặt chính: [`session::ChatSession`] cho widget
//! khách hàng, [`session::AdminConsole`] cho console nhân viên. Các tầng
//! dưới (`api`, `hub`) được export để test và để nhúng vào UI khác.

pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod hub;
pub mod session;

pub use api::{ChatBackend, HttpChatApi};
pub use auth::AuthContext;
pub use common::{ChatMessage, ChatRoom, HubEvent, HubStatus, ParticipantKind};
pub use session::{AdminConsole, ChatSession, Notice};
