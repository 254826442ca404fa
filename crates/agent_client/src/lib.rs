//! The `GameClient` capability: typed request/response against the game
//! server, entity DTOs, and the error taxonomy from the error handling
//! design (§7). This is the one crate in the workspace that knows about
//! HTTP and JSON wire shapes — everything above it talks to a
//! `dyn GameClient` trait object.

pub mod client;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;

pub use client::GameClient;
pub use error::GameError;
pub use types::*;
