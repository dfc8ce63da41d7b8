//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! The REST API lives under [`http`]; live application updates are pushed
//! over the WebSocket endpoint in [`ws`].

pub mod http;
pub mod ws;
