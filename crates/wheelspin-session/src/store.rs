//! Loads and saves the whole [`SessionState`] through a [`Storage`].
//!
//! The unit of persistence is the full aggregate, written under one key.
//! There are no partial updates, so no field-level coordination is needed.

use wheelspin_protocol::{Codec, JsonCodec, ProtocolError, SessionState};

use crate::{SessionLimits, Storage, StoreError};

/// Persists one room's session state.
pub struct SessionStore<S: Storage> {
    storage: S,
    key: String,
    limits: SessionLimits,
    codec: JsonCodec,
}

impl<S: Storage> SessionStore<S> {
    /// Creates a store for `room`. The state lives under `<room>/state`.
    pub fn new(storage: S, room: &str) -> Self {
        Self {
            storage,
            key: format!("{room}/state"),
            limits: SessionLimits::default(),
            codec: JsonCodec,
        }
    }

    /// Sets the limits a loaded state is checked against.
    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The storage key this store reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the persisted state, or the empty default when nothing has
    /// been stored yet.
    ///
    /// # Errors
    /// - [`StoreError::Storage`] if the backend fails
    /// - [`StoreError::Codec`] if the blob doesn't decode or breaks a
    ///   session invariant (including holding more than
    ///   `max_participants` entries). A bad blob is reported, never
    ///   papered over.
    pub async fn load(&self) -> Result<SessionState, StoreError> {
        let Some(text) = self.storage.get(&self.key).await? else {
            tracing::info!(key = %self.key, "no stored session, starting empty");
            return Ok(SessionState::default());
        };

        let state: SessionState = self.codec.decode(&text)?;
        state.validate()?;
        if state.participants.len() > self.limits.max_participants {
            return Err(ProtocolError::InvalidState(format!(
                "{} participants stored, at most {} allowed",
                state.participants.len(),
                self.limits.max_participants
            ))
            .into());
        }
        tracing::info!(
            key = %self.key,
            participants = state.participants.len(),
            phase = %state.phase(),
            "session loaded"
        );
        Ok(state)
    }

    /// Overwrites the stored state with `state`.
    pub async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let text = self.codec.encode(state)?;
        self.storage.put(&self.key, text).await?;
        tracing::debug!(
            key = %self.key,
            participants = state.participants.len(),
            "session saved"
        );
        Ok(())
    }
}
