use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use support_chat::api::HttpChatApi;
use support_chat::auth::AuthContext;
use support_chat::common::{ChatMessage, HubEvent, HubStatus, ParticipantKind};
use support_chat::config::{self, AppConfig};
use support_chat::hub::WsConnector;
use support_chat::session::{AdminConsole, ChatSession};

#[derive(Parser)]
#[command(
    name = "support-chat",
    version,
    about = "Terminal client for the customer support chat"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Bearer token for the API and hub (falls back to CHAT_TOKEN)
    #[arg(long)]
    token: Option<String>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Customer-facing chat widget
    Customer {
        /// Logged-in user id
        #[arg(long)]
        user_id: i64,
    },
    /// Support staff console
    Employee {
        #[arg(long)]
        user_id: i64,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);
    let token = cli.token.or_else(|| std::env::var("CHAT_TOKEN").ok());

    match cli.mode {
        Mode::Customer { user_id } => {
            let auth = auth_context(user_id, ParticipantKind::Customer, token);
            run_customer(&app_config, auth).await;
        }
        Mode::Employee { user_id } => {
            let auth = auth_context(user_id, ParticipantKind::Employee, token);
            run_employee(&app_config, auth).await;
        }
    }
}

fn auth_context(user_id: i64, kind: ParticipantKind, token: Option<String>) -> AuthContext {
    let auth = AuthContext::new(user_id, kind);
    match token {
        Some(token) => auth.with_token(token),
        None => auth,
    }
}

async fn run_customer(config: &AppConfig, auth: AuthContext) {
    let backend = Arc::new(HttpChatApi::new(&config.api_base_url, &auth));
    let connector = Box::new(WsConnector::new(&config.hub_url, &auth));

    let mut session = match ChatSession::open_for_customer(backend, connector, auth).await {
        Ok(session) => session,
        Err(notice) => {
            eprintln!("{notice}");
            return;
        }
    };

    println!("== {} ==", session.room().room_name);
    for message in session.messages() {
        print_message(message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    chat_loop(&mut session, &mut lines).await;
    session.close().await;
}

async fn run_employee(config: &AppConfig, auth: AuthContext) {
    let backend = Arc::new(HttpChatApi::new(&config.api_base_url, &auth));
    let mut console = AdminConsole::new(backend, auth.clone());

    console.load_rooms().await;
    console.refresh_badges().await;
    for notice in console.take_notices() {
        eprintln!("{notice}");
    }
    if console.rooms().is_empty() {
        println!("Chưa có phòng chat nào được gán.");
        return;
    }

    println!("Phòng chat:");
    for room in console.rooms() {
        let badge = if room.unread_count > 0 {
            format!(" ({} chưa đọc)", room.unread_count)
        } else {
            String::new()
        };
        println!(
            "  #{} {} / {}{badge}",
            room.chat_room_id, room.room_name, room.customer_name
        );
    }
    println!("Nhập id phòng để mở:");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let Ok(Some(line)) = lines.next_line().await else {
        return;
    };
    let Ok(room_id) = line.trim().parse::<i64>() else {
        eprintln!("Id phòng không hợp lệ");
        return;
    };

    let connector = Box::new(WsConnector::new(&config.hub_url, &auth));
    let mut session = match console.open_room(room_id, connector).await {
        Ok(session) => session,
        Err(notice) => {
            eprintln!("{notice}");
            return;
        }
    };

    for message in session.messages() {
        print_message(message);
    }
    chat_loop(&mut session, &mut lines).await;
    session.close().await;
}

/// Vòng lặp chính: mỗi dòng stdin là một tin gửi đi, sự kiện hub in ra
/// ngay khi đến. `/quit` hoặc EOF kết thúc phiên.
async fn chat_loop(session: &mut ChatSession, lines: &mut Lines<BufReader<Stdin>>) {
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if line.trim() == "/quit" {
                    break;
                }
                session.set_draft(line);
                if let Err(notice) = session.send().await {
                    println!("[!] {notice}");
                }
            }
            event = session.next_event() => {
                let Some(event) = event else { break };
                match event {
                    HubEvent::MessageReceived(message) => print_message(&message),
                    HubEvent::MessageRead { message_id, .. } => {
                        log::debug!("Message {message_id} marked read");
                    }
                    HubEvent::StatusChanged(status) => print_status(status),
                    HubEvent::Degraded(_) => {}
                }
                for notice in session.take_notices() {
                    println!("[!] {notice}");
                }
            }
        }
    }
}

fn print_message(message: &ChatMessage) {
    let who = match message.sender_type {
        ParticipantKind::Customer => "Khách",
        ParticipantKind::Employee => "CSKH",
    };
    let stamp = message
        .created_at
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default();
    println!("[{stamp}] {who}: {}", message.message_content);
}

fn print_status(status: HubStatus) {
    match status {
        HubStatus::Connected => println!("-- realtime đã kết nối --"),
        HubStatus::Reconnecting => println!("-- mất kết nối realtime, đang thử lại --"),
        HubStatus::Connecting | HubStatus::Disconnected => {}
    }
}
