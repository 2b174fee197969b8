//! Session limits: the tunable numbers behind the join and start rules.

/// Limits enforced by the [`SessionMachine`](crate::SessionMachine).
///
/// The defaults are the production values. Tests shrink them to reach the
/// edges without building hundred-entry sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLimits {
    /// Longest accepted name, in characters, after trimming.
    pub max_name_len: usize,

    /// Most participants a session can hold.
    pub max_participants: usize,

    /// Fewest participants needed to start a draw.
    pub min_participants: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_name_len: 50,
            max_participants: 100,
            min_participants: 2,
        }
    }
}

impl SessionLimits {
    /// Clamps out-of-range values so the limits can't break the session
    /// invariants.
    ///
    /// - `min_participants` is at least 2: a draw needs someone to lose.
    /// - `max_participants` is at least `min_participants`.
    /// - `max_name_len` is at least 1.
    pub fn validated(mut self) -> Self {
        if self.min_participants < 2 {
            tracing::warn!(
                min = self.min_participants,
                "min_participants below 2, clamping"
            );
            self.min_participants = 2;
        }
        if self.max_participants < self.min_participants {
            tracing::warn!(
                max = self.max_participants,
                min = self.min_participants,
                "max_participants below min_participants, clamping"
            );
            self.max_participants = self.min_participants;
        }
        self.max_name_len = self.max_name_len.max(1);
        self
    }
}
