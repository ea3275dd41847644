//! Flowgrid gateway: the HTTP/WS surface around the engine — the execute
//! event, trigger webhooks, and the per-run status channel.

pub mod auth;
pub mod server;
pub mod ws;

pub use auth::ChannelTokens;
pub use server::{router, start_gateway, AppState, GatewayConfig};
