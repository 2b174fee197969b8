//! The session state machine: validates and applies wheel commands.
//!
//! The machine owns the authoritative [`SessionState`]. Commands never
//! mutate it directly. Each accepted command yields a [`Transition`]: the
//! next state plus the frame to broadcast once that state is durable. The
//! caller persists `transition.state`, then calls
//! [`commit`](SessionMachine::commit), then broadcasts. A failed save
//! leaves the machine untouched.
//!
//! ```text
//!            join (append)
//!            ┌────┐
//!            ▼    │
//!          [Open] ─┘ ──(start: lock + draw)──→ [Started]
//!            ▲                                    │
//!            └──────────────(reset)───────────────┘
//! ```
//!
//! `reset` is accepted in every phase.

use rand::Rng;
use wheelspin_protocol::{
    ClientFrame, Participant, ParticipantId, Phase, ServerFrame, SessionState,
};

use crate::{CommandError, SessionLimits};

/// An accepted command: the state to persist and the frame to fan out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The full next state. Persist this before broadcasting.
    pub state: SessionState,

    /// What every connection receives: `state` for join/reset, `winner`
    /// for start.
    pub broadcast: ServerFrame,
}

/// Validates and applies `join`/`start`/`reset` against one session.
///
/// Not thread-safe on its own. The room actor owns it and feeds it one
/// command at a time, so every read-modify-write runs to completion.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
    limits: SessionLimits,
}

impl SessionMachine {
    /// Creates a machine around an existing (e.g. freshly loaded) state.
    pub fn new(state: SessionState, limits: SessionLimits) -> Self {
        Self {
            state,
            limits: limits.validated(),
        }
    }

    /// The current authoritative state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The limits in force.
    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Dispatches a decoded client frame.
    ///
    /// Returns `None` for frames with an unrecognized `type`, which are
    /// ignored rather than answered.
    pub fn handle<R: Rng>(
        &self,
        frame: &ClientFrame,
        rng: &mut R,
    ) -> Option<Result<Transition, CommandError>> {
        match frame {
            ClientFrame::Join { name } => Some(self.join(name.as_str(), rng)),
            ClientFrame::Start => Some(self.start(rng)),
            ClientFrame::Reset => Some(Ok(self.reset())),
            ClientFrame::Unknown => None,
        }
    }

    /// Adds a participant.
    ///
    /// Checks run in this order, first failure wins:
    /// 1. `InvalidName`: missing, non-string, or empty
    /// 2. `InvalidLength`: trimmed length is 0 or over the limit
    /// 3. `SessionLocked`
    /// 4. `CapacityExceeded`
    /// 5. `DuplicateName`: exact, case-sensitive match after trimming
    pub fn join<R: Rng>(
        &self,
        name: Option<&str>,
        rng: &mut R,
    ) -> Result<Transition, CommandError> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(CommandError::InvalidName),
        };

        let trimmed = name.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > self.limits.max_name_len {
            return Err(CommandError::InvalidLength {
                max: self.limits.max_name_len,
            });
        }
        if self.state.is_locked {
            return Err(CommandError::SessionLocked);
        }
        if self.state.participants.len() >= self.limits.max_participants {
            return Err(CommandError::CapacityExceeded);
        }
        if self.state.has_name(trimmed) {
            return Err(CommandError::DuplicateName);
        }

        let mut next = self.state.clone();
        next.participants.push(Participant {
            name: trimmed.to_string(),
            id: self.fresh_id(rng),
        });

        Ok(Transition {
            broadcast: ServerFrame::State {
                state: next.clone(),
            },
            state: next,
        })
    }

    /// Locks entries and draws the winner, uniformly over the current
    /// participants.
    ///
    /// The draw happens here, once. Later snapshots carry the same winner.
    pub fn start<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<Transition, CommandError> {
        if self.state.game_started {
            return Err(CommandError::AlreadyStarted);
        }
        let count = self.state.participants.len();
        if count < self.limits.min_participants {
            return Err(CommandError::InsufficientParticipants {
                min: self.limits.min_participants,
            });
        }

        let winner_index = rng.random_range(0..count);
        let winner = self.state.participants[winner_index].clone();

        let mut next = self.state.clone();
        next.is_locked = true;
        next.game_started = true;
        next.winner = Some(winner.clone());

        Ok(Transition {
            state: next,
            broadcast: ServerFrame::Winner {
                winner,
                winner_index,
            },
        })
    }

    /// Clears everything back to an open, empty session.
    pub fn reset(&self) -> Transition {
        let next = SessionState::default();
        Transition {
            broadcast: ServerFrame::State {
                state: next.clone(),
            },
            state: next,
        }
    }

    /// Makes a persisted transition's state authoritative.
    pub fn commit(&mut self, state: SessionState) {
        self.state = state;
    }

    fn fresh_id<R: Rng>(&self, rng: &mut R) -> ParticipantId {
        loop {
            let id = ParticipantId(generate_token(rng));
            if self.state.index_of(&id).is_none() {
                return id;
            }
        }
    }
}

/// Generates a random 32-character lowercase hex string (128 bits).
fn generate_token<R: Rng>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
