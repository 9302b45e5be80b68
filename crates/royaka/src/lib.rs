//! # Royaka client hub
//!
//! The realtime transport and subscription hub for the Royaka card
//! battler: one persistent WebSocket connection to the game server,
//! automatic recovery from disconnects, and fan-out of every inbound
//! message to any number of interested consumers.
//!
//! The public seam is [`Client`]:
//!
//! - [`Client::send_message`] — encode and transmit an [`Envelope`]
//!   (a warn-level no-op while disconnected; nothing is buffered).
//! - [`Client::subscribe`] — register a callback for every inbound
//!   envelope; the returned [`Subscription`] unregisters it on drop.
//! - [`Client::is_connected`] / [`Client::watch_state`] — the
//!   connection flag, pollable or reactive.
//! - [`Client::request`] / [`Client::wait_for`] — a thin
//!   request/response correlation helper layered on `subscribe`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use royaka::prelude::*;
//! use std::time::Duration;
//!
//! # async fn run() {
//! let client = Client::builder()
//!     .config(ClientConfig::from_env())
//!     .start();
//! client.wait_until_connected().await;
//!
//! let login = Envelope::request(kind::LOGIN, &LoginRequest {
//!     username: "alice".into(),
//!     password: "hunter2".into(),
//! }).unwrap();
//! let reply = client.request(login, Duration::from_secs(5)).await;
//! # let _ = reply;
//! # }
//! ```
//!
//! One `Client` is meant to exist per running application, constructed
//! explicitly and shared by handle — `Client` is cheap to clone. Tests
//! construct isolated instances over an in-memory transport via
//! [`ClientBuilder::start_with`].

mod client;
mod config;
mod error;
mod manager;
mod registry;
mod request;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ReconnectPolicy, DEFAULT_ENDPOINT, ENDPOINT_ENV};
pub use error::{ClientError, RequestError};
pub use manager::ConnectionState;
pub use registry::{SubscriberId, Subscription};

/// The common imports for application code.
pub mod prelude {
    pub use crate::{
        Client, ClientBuilder, ClientConfig, ConnectionState,
        ReconnectPolicy, Subscription,
    };
    pub use royaka_protocol::{kind, Envelope, LoginRequest, MatchMode};
}
