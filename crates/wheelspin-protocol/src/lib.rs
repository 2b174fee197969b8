//! Wire protocol and data model for Wheelspin.
//!
//! This crate defines the "language" that browsers and the room host speak:
//!
//! - **Model** ([`SessionState`], [`Participant`], [`Phase`]) — the
//!   authoritative session record, stored and sent verbatim.
//! - **Frames** ([`ClientFrame`], [`ServerFrame`]) — the JSON objects that
//!   travel over the transport, discriminated by `type`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames are converted
//!   to and from text.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (text) → Protocol (frames) → Session (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientFrame, Participant, ParticipantId, Phase, ServerFrame, SessionState,
};
