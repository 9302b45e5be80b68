//! Client-side session identity for Royaka.
//!
//! The transport core is stateless about WHO is connected; this crate
//! holds the client's persisted identity between runs:
//!
//! 1. **Credentials** — the `session_id` issued by a successful login
//! 2. **Identity** — the `username` the player signed in with
//! 3. **Location** — the `room_id` of an in-progress match, if any
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← reads/writes the store around login/match flows
//!     ↕
//! Session store (this crate)  ← holds identity, loads/saves a JSON file
//!
//! Transport core (separate)  ← never touches the store
//! ```

mod error;
mod store;

pub use error::SessionError;
pub use store::SessionStore;
