//! Session core for Wheelspin.
//!
//! This crate holds the authoritative logic for a wheel session:
//!
//! 1. **Rules** — [`SessionMachine`] validates `join`/`start`/`reset` and
//!    produces [`Transition`]s (next state + frame to broadcast).
//! 2. **Limits** — [`SessionLimits`] (name length, capacity, minimum to draw).
//! 3. **Persistence** — [`SessionStore`] saves and loads the whole state
//!    through the host's [`Storage`] capability ([`MemoryStorage`],
//!    [`FileStorage`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← serializes commands, persists, then broadcasts
//!     ↕
//! Session Layer (this crate)  ← decides what a command does
//!     ↕
//! Protocol Layer (below)  ← SessionState, ClientFrame, ServerFrame
//! ```

mod error;
mod limits;
mod machine;
mod storage;
mod store;

pub use error::{CommandError, StoreError};
pub use limits::SessionLimits;
pub use machine::{SessionMachine, Transition};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::SessionStore;
