//! Core protocol types: the session data model and the wire frames.
//!
//! Everything here is serialized verbatim, both onto the wire and into
//! storage, so the serde attributes are part of the contract. Browsers
//! read camelCase keys and a lowercase `type` tag.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// Opaque unique token identifying a participant.
///
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entrant on the wheel. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub id: ParticipantId,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle, derived from [`SessionState`].
///
/// ```text
/// Open ──(start)──→ Started ──(reset)──→ Open
/// ```
///
/// `Locked` (entries closed, no winner yet) is never produced by a
/// command: lock and draw happen together. It only shows up if a stored
/// state was written that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    Locked,
    Started,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Open => "open",
            Phase::Locked => "locked",
            Phase::Started => "started",
        };
        f.write_str(s)
    }
}

/// The authoritative record of one wheel session.
///
/// Field order matches what browsers have always received:
/// `{"participants":[…],"isLocked":…,"gameStarted":…,"winner":…}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    /// Entrants in join order. Order defines slice order on the wheel.
    pub participants: Vec<Participant>,

    /// No more joins once set.
    pub is_locked: bool,

    /// A winner has been drawn. Implies `is_locked`.
    pub game_started: bool,

    /// The drawn winner, serialized as `null` when absent.
    pub winner: Option<Participant>,
}

impl SessionState {
    /// Returns the lifecycle phase.
    pub fn phase(&self) -> Phase {
        match (self.is_locked, self.game_started) {
            (_, true) => Phase::Started,
            (true, false) => Phase::Locked,
            (false, false) => Phase::Open,
        }
    }

    /// Returns `true` if a participant has exactly this name.
    pub fn has_name(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p.name == name)
    }

    /// Returns the slice index of the participant with this id.
    pub fn index_of(&self, id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| &p.id == id)
    }

    /// Checks the model invariants:
    ///
    /// - `game_started ⇒ is_locked`
    /// - `winner present ⇒ game_started`, and the winner is a participant
    /// - a started game has at least two participants
    /// - names are unique
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.game_started && !self.is_locked {
            return Err(ProtocolError::InvalidState(
                "game started without entries locked".into(),
            ));
        }
        if self.game_started && self.participants.len() < 2 {
            return Err(ProtocolError::InvalidState(format!(
                "game started with {} participant(s)",
                self.participants.len()
            )));
        }
        if let Some(winner) = &self.winner {
            if !self.game_started {
                return Err(ProtocolError::InvalidState(
                    "winner set before the game started".into(),
                ));
            }
            if !self.participants.contains(winner) {
                return Err(ProtocolError::InvalidState(format!(
                    "winner {} is not a participant",
                    winner.name
                )));
            }
        }
        let mut seen = HashSet::with_capacity(self.participants.len());
        for p in &self.participants {
            if !seen.insert(p.name.as_str()) {
                return Err(ProtocolError::InvalidState(format!(
                    "duplicate participant name {:?}",
                    p.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Client → server commands.
///
/// `name` is kept as a raw JSON value: a join with a missing or non-string
/// name is a validation error reported to the client, not a malformed
/// frame. Any unrecognized `type` decodes to [`ClientFrame::Unknown`] and
/// is ignored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Join {
        #[serde(default)]
        name: serde_json::Value,
    },
    Start,
    Reset,
    #[serde(other)]
    Unknown,
}

impl ClientFrame {
    /// Builds a join command for `name`.
    pub fn join(name: impl Into<String>) -> Self {
        ClientFrame::Join {
            name: serde_json::Value::String(name.into()),
        }
    }
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Full snapshot. Sent on connect and after `join`/`reset`.
    State { state: SessionState },

    /// The draw result, broadcast once per draw.
    Winner {
        winner: Participant,
        #[serde(rename = "winnerIndex")]
        winner_index: usize,
    },

    /// A rejection, sent only to the connection that caused it.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn participant(name: &str, id: &str) -> Participant {
        Participant {
            name: name.into(),
            id: ParticipantId(id.into()),
        }
    }

    fn started_state() -> SessionState {
        let alice = participant("Alice", "a1");
        SessionState {
            participants: vec![alice.clone(), participant("Bob", "b2")],
            is_locked: true,
            game_started: true,
            winner: Some(alice),
        }
    }

    // -- SessionState ------------------------------------------------------

    #[test]
    fn test_session_state_uses_camel_case_keys() {
        let json = serde_json::to_value(started_state()).unwrap();
        assert_eq!(json["isLocked"], true);
        assert_eq!(json["gameStarted"], true);
        assert_eq!(json["winner"]["name"], "Alice");
        assert_eq!(json["participants"][1]["id"], "b2");
    }

    #[test]
    fn test_session_state_missing_fields_default() {
        let state: SessionState =
            serde_json::from_str(r#"{"participants":[]}"#).unwrap();
        assert_eq!(state, SessionState::default());
        assert!(state.winner.is_none());
    }

    #[test]
    fn test_phase_follows_flags() {
        let mut state = SessionState::default();
        assert_eq!(state.phase(), Phase::Open);
        state.is_locked = true;
        assert_eq!(state.phase(), Phase::Locked);
        assert_eq!(started_state().phase(), Phase::Started);
    }

    #[test]
    fn test_validate_accepts_default_and_started() {
        assert!(SessionState::default().validate().is_ok());
        assert!(started_state().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_started_without_lock() {
        let mut state = started_state();
        state.is_locked = false;
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_foreign_winner() {
        let mut state = started_state();
        state.winner = Some(participant("Mallory", "m3"));
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let state = SessionState {
            participants: vec![
                participant("Alice", "a1"),
                participant("Alice", "a2"),
            ],
            ..SessionState::default()
        };
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_index_of_finds_participant() {
        let state = started_state();
        assert_eq!(state.index_of(&ParticipantId("b2".into())), Some(1));
        assert_eq!(state.index_of(&ParticipantId("zz".into())), None);
    }

    // -- ClientFrame -------------------------------------------------------

    #[test]
    fn test_client_frame_join_decodes() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"join","name":"Alice"}"#).unwrap();
        assert_eq!(frame, ClientFrame::join("Alice"));
    }

    #[test]
    fn test_client_frame_join_without_name_is_null() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Join {
                name: serde_json::Value::Null
            }
        );
    }

    #[test]
    fn test_client_frame_join_keeps_non_string_name() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"join","name":42}"#).unwrap();
        assert_eq!(frame, ClientFrame::Join { name: json!(42) });
    }

    #[test]
    fn test_client_frame_start_and_reset_encode_bare_tag() {
        assert_eq!(
            serde_json::to_string(&ClientFrame::Start).unwrap(),
            r#"{"type":"start"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientFrame::Reset).unwrap(),
            r#"{"type":"reset"}"#
        );
    }

    #[test]
    fn test_client_frame_unknown_type_decodes_to_unknown() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"spin","speed":9000}"#).unwrap();
        assert_eq!(frame, ClientFrame::Unknown);
    }

    #[test]
    fn test_client_frame_without_type_is_error() {
        let result: Result<ClientFrame, _> =
            serde_json::from_str(r#"{"name":"Alice"}"#);
        assert!(result.is_err());
    }

    // -- ServerFrame -------------------------------------------------------

    #[test]
    fn test_server_frame_winner_json_format() {
        let frame = ServerFrame::Winner {
            winner: participant("Bob", "b2"),
            winner_index: 1,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "winner",
                "winner": { "name": "Bob", "id": "b2" },
                "winnerIndex": 1
            })
        );
    }

    #[test]
    fn test_server_frame_state_wraps_state() {
        let frame = ServerFrame::State {
            state: SessionState::default(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["state"]["participants"], json!([]));
        assert!(json["state"]["winner"].is_null());
    }

    #[test]
    fn test_server_frame_error_json_format() {
        let frame = ServerFrame::Error {
            message: "Invalid name.".into(),
        };
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"type":"error","message":"Invalid name."}"#
        );
    }

    #[test]
    fn test_server_frame_unknown_type_is_error() {
        let result: Result<ServerFrame, _> =
            serde_json::from_str(r#"{"type":"confetti"}"#);
        assert!(result.is_err());
    }
}
