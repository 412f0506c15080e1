pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{spawn, HubClient, HubHandle};
pub use transport::{HubConnector, HubError, HubTransport, WsConnector};
