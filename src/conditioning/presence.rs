// PresenceToggle - debounced tag presence driving a boolean output
//
// A matching tag read marks the tag present and refreshes its last-seen
// time. The tag only counts as removed once it has been missing for longer
// than the removal timeout, so a tag resting on the reader (which is read
// intermittently) does not flap.
//
// Two behaviours are supported, selected by `ToggleMode`:
//
// MomentaryOn (default): the output follows presence. Arrival switches ON,
//   removal switches OFF.
// LatchedToggle: each arrival flips the output. Removal only re-arms the
//   edge detector so the next tap can flip it again; the output is kept.

use std::time::{Duration, Instant};

use crate::config::PresenceConfig;
use crate::hal::{Clock, IdentityReader};

/// How presence edges drive the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleMode {
    /// Output is ON while the tag is present
    #[default]
    MomentaryOn,
    /// Each new arrival flips the output; removal leaves it unchanged
    LatchedToggle,
}

/// Presence transitions reported by [`PresenceToggle::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Rising edge; carries the output after the edge effect
    Arrived { state: bool },
    /// Removal timeout elapsed; carries the output after the removal effect
    Removed { state: bool },
}

/// The identity a tag must carry to count as a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedIdentity {
    uid: Vec<u8>,
}

impl AuthorizedIdentity {
    pub fn new(uid: impl Into<Vec<u8>>) -> Self {
        Self { uid: uid.into() }
    }

    /// Exact length and byte-wise match
    pub fn matches(&self, candidate: &[u8]) -> bool {
        self.uid.as_slice() == candidate
    }

    pub fn uid(&self) -> &[u8] {
        &self.uid
    }
}

/// Debounced presence latch
#[derive(Debug, Clone)]
pub struct PresenceToggle<C> {
    clock: C,
    mode: ToggleMode,
    removal_timeout: Duration,
    present: bool,
    toggled_state: bool,
    last_seen: Option<Instant>,
}

impl<C: Clock> PresenceToggle<C> {
    pub fn new(clock: C, mode: ToggleMode, removal_timeout: Duration) -> Self {
        Self {
            clock,
            mode,
            removal_timeout,
            present: false,
            toggled_state: false,
            last_seen: None,
        }
    }

    pub fn from_config(clock: C, config: &PresenceConfig) -> Self {
        Self::new(clock, config.mode, config.removal_timeout())
    }

    /// Advance the latch by one cycle
    ///
    /// `identity_match` is true when a tag was read this cycle and it is the
    /// authorized one. Repeated matches while the tag is already present
    /// only refresh its last-seen time.
    pub fn update(&mut self, identity_match: bool) -> Option<PresenceEvent> {
        let now = self.clock.now();
        let mut event = None;

        if identity_match {
            self.last_seen = Some(now);
            if !self.present {
                self.present = true;
                self.toggled_state = match self.mode {
                    ToggleMode::MomentaryOn => true,
                    ToggleMode::LatchedToggle => !self.toggled_state,
                };
                tracing::info!(
                    "[Presence] tag arrived, output {}",
                    on_off(self.toggled_state)
                );
                event = Some(PresenceEvent::Arrived {
                    state: self.toggled_state,
                });
            }
        }

        if self.present && self.removal_elapsed(now) {
            self.present = false;
            if self.mode == ToggleMode::MomentaryOn {
                self.toggled_state = false;
            }
            tracing::info!(
                "[Presence] tag removed, output {}",
                on_off(self.toggled_state)
            );
            event = Some(PresenceEvent::Removed {
                state: self.toggled_state,
            });
        }

        event
    }

    fn removal_elapsed(&self, now: Instant) -> bool {
        match self.last_seen {
            Some(seen) => now.saturating_duration_since(seen) > self.removal_timeout,
            None => true,
        }
    }

    /// Externally visible output
    pub fn current_state(&self) -> bool {
        self.toggled_state
    }

    /// Whether the tag is currently considered on the reader
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn mode(&self) -> ToggleMode {
        self.mode
    }

    pub fn removal_timeout(&self) -> Duration {
        self.removal_timeout
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

/// Tag reader plus authorized identity feeding a [`PresenceToggle`]
pub struct TagToggle<R, C> {
    reader: R,
    identity: AuthorizedIdentity,
    toggle: PresenceToggle<C>,
}

impl<R: IdentityReader, C: Clock> TagToggle<R, C> {
    pub fn new(reader: R, identity: AuthorizedIdentity, toggle: PresenceToggle<C>) -> Self {
        Self {
            reader,
            identity,
            toggle,
        }
    }

    pub fn from_config(reader: R, clock: C, config: &PresenceConfig) -> Self {
        Self::new(
            reader,
            AuthorizedIdentity::new(config.authorized_uid.clone()),
            PresenceToggle::from_config(clock, config),
        )
    }

    /// Poll the reader once and advance the latch
    pub fn update(&mut self) -> Option<PresenceEvent> {
        let identity_match = match self.reader.read_identity() {
            Some(uid) => {
                let matched = self.identity.matches(&uid);
                if !matched {
                    tracing::debug!("[Presence] ignoring unknown tag {:02X?}", uid);
                }
                matched
            }
            None => false,
        };
        self.toggle.update(identity_match)
    }

    pub fn current_state(&self) -> bool {
        self.toggle.current_state()
    }

    pub fn toggle(&self) -> &PresenceToggle<C> {
        &self.toggle
    }
}

#[cfg(test)]
#[path = "presence_tests.rs"]
mod tests;
