//! Client-side view state and the UI affordances derived from it.
//!
//! [`ClientViewState`] is what one client believes about the session. It is
//! rebuilt from server frames and never sent back. The agent owns it and
//! publishes copies. Pages read [`PlayerView`] and [`AdminView`], which are
//! plain derivations with no state of their own.

use std::time::Duration;

use tokio::time::Instant;
use wheelspin_protocol::{Participant, ParticipantId, SessionState};

use crate::animation::{SpinAnimation, SpinStep};
use crate::renderer::landing_rotation;

/// How long an error banner stays up.
pub const ERROR_BANNER_TTL: Duration = Duration::from_secs(3);

/// Shown when the agent gives up reconnecting.
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost. Please reload the page.";

/// Shown when a command is issued while no connection is open.
pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to server.";

/// Participants needed before the admin may start a draw.
const MIN_PARTICIPANTS: usize = 2;

/// Transport state as the agent sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// The name this client joined (or is trying to join) with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub name: String,
    /// `false` until a `state` frame newly lists the name.
    pub confirmed: bool,
    /// The name was already listed when the join was requested. Someone
    /// else holds it, so seeing it listed proves nothing until it has
    /// been seen unlisted.
    pub taken: bool,
}

/// A transient error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub expires_at: Instant,
}

/// Everything one client knows about the session.
#[derive(Debug, Clone, Default)]
pub struct ClientViewState {
    /// Last session snapshot received (with any `winner` frame folded in).
    pub snapshot: SessionState,
    pub current_user: Option<CurrentUser>,
    pub is_animating: bool,
    pub rotation: f64,
    pub target_rotation: f64,
    pub connection: ConnectionState,
    pub error_banner: Option<ErrorBanner>,
    /// The winner whose reveal has already played (or been skipped).
    pub revealed_winner: Option<ParticipantId>,
    /// Slice index of a reveal that arrived mid-spin. It plays once the
    /// current spin lands.
    pub queued_reveal: Option<usize>,
    /// Set once reconnection is abandoned. Never cleared.
    pub terminal_error: Option<String>,
}

impl ClientViewState {
    /// Creates an empty view: no participants, disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot with a `state` frame.
    ///
    /// - A pending join is confirmed once its name is newly listed. A
    ///   joined user whose name disappears (the session was reset) is
    ///   forgotten.
    /// - A snapshot with no winner re-arms the reveal for the next draw.
    /// - A winner that hasn't been revealed and isn't animating (a late
    ///   joiner or a reconnect that missed the `winner` frame) snaps the
    ///   wheel straight to its landing angle.
    pub fn apply_state(&mut self, state: SessionState) {
        self.snapshot = state;

        if let Some(user) = &mut self.current_user {
            let listed = self.snapshot.has_name(&user.name);
            match (user.confirmed, listed) {
                (false, true) if !user.taken => user.confirmed = true,
                (false, false) => user.taken = false,
                (true, false) => self.current_user = None,
                _ => {}
            }
        }

        let Some(winner) = &self.snapshot.winner else {
            self.revealed_winner = None;
            self.queued_reveal = None;
            return;
        };
        if self.is_animating || self.revealed_winner.as_ref() == Some(&winner.id) {
            return;
        }
        if let Some(index) = self.snapshot.index_of(&winner.id) {
            let landing = landing_rotation(index, self.snapshot.participants.len());
            self.rotation = landing;
            self.target_rotation = landing;
            self.revealed_winner = Some(winner.id.clone());
        }
    }

    /// Starts the reveal for a `winner` frame.
    ///
    /// Returns `None` (and changes nothing) when this winner was already
    /// revealed. Otherwise the result is folded into the snapshot, as the
    /// admin page shows it, and the spin to play is returned.
    ///
    /// While another spin is running the new one is queued instead and
    /// `None` is returned; [`take_queued_reveal`](Self::take_queued_reveal)
    /// hands it out once the current spin lands.
    pub fn begin_reveal(
        &mut self,
        winner: Participant,
        winner_index: usize,
    ) -> Option<SpinAnimation> {
        if self.revealed_winner.as_ref() == Some(&winner.id) {
            return None;
        }

        self.snapshot.is_locked = true;
        self.snapshot.game_started = true;
        self.revealed_winner = Some(winner.id.clone());
        self.snapshot.winner = Some(winner);

        let count = self.snapshot.participants.len();
        if winner_index >= count {
            tracing::warn!(winner_index, count, "winner index outside the wheel");
            self.queued_reveal = None;
            return None;
        }

        if self.is_animating {
            self.queued_reveal = Some(winner_index);
            return None;
        }
        Some(self.spin_to(winner_index))
    }

    /// Starts the reveal queued by [`begin_reveal`](Self::begin_reveal),
    /// if any. Call after the current spin finishes.
    pub fn take_queued_reveal(&mut self) -> Option<SpinAnimation> {
        if self.is_animating {
            return None;
        }
        let index = self.queued_reveal.take()?;
        if index >= self.snapshot.participants.len() {
            return None;
        }
        Some(self.spin_to(index))
    }

    fn spin_to(&mut self, winner_index: usize) -> SpinAnimation {
        let count = self.snapshot.participants.len();
        let spin = SpinAnimation::new(self.rotation, winner_index, count);
        self.target_rotation = spin.target();
        self.is_animating = true;
        spin
    }

    /// Advances a running reveal by one frame.
    pub fn tick(&mut self, spin: &SpinAnimation) -> SpinStep {
        let step = spin.step(&mut self.rotation);
        if step == SpinStep::Finished {
            self.is_animating = false;
        }
        step
    }

    /// Shows `message` for [`ERROR_BANNER_TTL`].
    ///
    /// An error that arrives while a join is still pending means the join
    /// was refused, so the pending name is dropped and the join form comes
    /// back.
    pub fn apply_error(&mut self, message: String, now: Instant) {
        if self.current_user.as_ref().is_some_and(|u| !u.confirmed) {
            self.current_user = None;
        }
        self.error_banner = Some(ErrorBanner {
            message,
            expires_at: now + ERROR_BANNER_TTL,
        });
    }

    /// The banner text, if it hasn't expired at `now`.
    pub fn active_error(&self, now: Instant) -> Option<&str> {
        self.error_banner
            .as_ref()
            .filter(|b| now < b.expires_at)
            .map(|b| b.message.as_str())
    }

    /// Records a join request and returns the name to send.
    ///
    /// The name is trimmed. A blank name is ignored and nothing is sent.
    pub fn request_join(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.current_user = Some(CurrentUser {
            name: name.to_string(),
            confirmed: false,
            taken: self.snapshot.has_name(name),
        });
        Some(name.to_string())
    }

    /// Marks the connection as permanently lost.
    pub fn set_terminal(&mut self, message: &str) {
        self.connection = ConnectionState::Disconnected;
        self.terminal_error = Some(message.to_string());
    }

    /// Derives the participant page.
    pub fn player_view(&self, now: Instant) -> PlayerView {
        let state = &self.snapshot;
        let me = self.current_user.as_ref().map(|u| u.name.as_str());

        let status = match (state.is_locked, state.game_started) {
            (true, true) => "Game in progress...",
            (true, false) => "Entries locked!",
            (false, _) => "Waiting for game to start...",
        };

        PlayerView {
            panel: if self.current_user.is_some() {
                Panel::Game
            } else {
                Panel::Join
            },
            status,
            participants: state
                .participants
                .iter()
                .map(|p| ParticipantEntry {
                    name: p.name.clone(),
                    highlighted: Some(p.name.as_str()) == me,
                })
                .collect(),
            participant_count: state.participants.len(),
            winner: state
                .winner
                .as_ref()
                .filter(|_| !self.is_animating)
                .map(|w| w.name.clone()),
            error: self.active_error(now).map(str::to_string),
            connection: self.connection,
            terminal_error: self.terminal_error.clone(),
        }
    }

    /// Derives the operator page.
    pub fn admin_view(&self, now: Instant) -> AdminView {
        let state = &self.snapshot;
        let participant_lines = if state.participants.is_empty() {
            vec!["No participants yet".to_string()]
        } else {
            state
                .participants
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}. {}", i + 1, p.name))
                .collect()
        };

        AdminView {
            game_status: if state.game_started { "Started" } else { "Waiting" },
            entries_status: if state.is_locked { "Locked" } else { "Open" },
            current_winner: state
                .winner
                .as_ref()
                .map_or_else(|| "None".to_string(), |w| w.name.clone()),
            participant_lines,
            participant_count: state.participants.len(),
            start_enabled: !state.game_started
                && state.participants.len() >= MIN_PARTICIPANTS,
            error: self.active_error(now).map(str::to_string),
            connection: self.connection,
        }
    }
}

/// Which half of the participant page is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Join,
    Game,
}

/// One row of the participant list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantEntry {
    pub name: String,
    /// This row is the current user.
    pub highlighted: bool,
}

/// The participant page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub panel: Panel,
    pub status: &'static str,
    pub participants: Vec<ParticipantEntry>,
    pub participant_count: usize,
    /// Winner name, shown only after the reveal has finished.
    pub winner: Option<String>,
    pub error: Option<String>,
    pub connection: ConnectionState,
    pub terminal_error: Option<String>,
}

/// The operator page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminView {
    pub game_status: &'static str,
    pub entries_status: &'static str,
    pub current_winner: String,
    pub participant_lines: Vec<String>,
    pub participant_count: usize,
    pub start_enabled: bool,
    pub error: Option<String>,
    pub connection: ConnectionState,
}
