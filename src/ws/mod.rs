//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` pushes [`crate::domain::WalletEvent`]s to clients
//! that follow specific users (or `"*"`), and answers balance queries.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
