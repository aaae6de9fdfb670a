//! Playback session state machine.
//!
//! Owns the current track index, play/pause state, shuffle flag, and
//! repeat mode, and drives the media transport through them. Play and
//! pause are never applied optimistically: the session only moves to
//! `Playing`/`Paused` when the transport confirms the transition with
//! its own event, so a rejected request cannot desync the state.

use log::{debug, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::protocol::{Direction, RepeatMode, SessionSnapshot};
use crate::track::{Catalog, TrackId};
use crate::transport::{MediaTransport, TransportEvent};

/// Lifecycle of the single playback slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No track loaded into the transport. A track index may still be
    /// set for display-only selection.
    Idle,
    /// Transport asked to load a source, awaiting readiness.
    Loading,
    Playing,
    Paused,
}

pub struct PlaybackSession {
    catalog: Catalog,
    current_index: Option<usize>,
    state: PlaybackState,
    is_shuffling: bool,
    repeat_mode: RepeatMode,
    /// Stable point restored when a load fails: (index, state).
    prior_stable: (Option<usize>, PlaybackState),
    // Use a reseeded StdRng instead of ThreadRng for thread safety
    rng_seed: [u8; 32],
}

impl PlaybackSession {
    pub fn new() -> PlaybackSession {
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed).expect("Failed to generate random seed");

        PlaybackSession {
            catalog: Catalog::default(),
            current_index: None,
            state: PlaybackState::Idle,
            is_shuffling: false,
            repeat_mode: RepeatMode::Off,
            prior_stable: (None, PlaybackState::Idle),
            rng_seed: seed,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&TrackId> {
        self.current_index.and_then(|index| self.catalog.get(index))
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current_index,
            current_track: self.current_track().cloned(),
            is_playing: self.is_playing(),
            is_shuffling: self.is_shuffling,
            repeat_mode: self.repeat_mode,
        }
    }

    /// Selects the track at `index` and asks the transport to load and
    /// play it. Out-of-range indices are a silent no-op (`Ok(false)`).
    /// A synchronously rejected play rolls the session back to the
    /// prior stable state and surfaces the failure.
    pub fn select_and_play(
        &mut self,
        index: usize,
        transport: &mut dyn MediaTransport,
    ) -> Result<bool, String> {
        let track = match self.catalog.get(index) {
            Some(track) => track.clone(),
            None => {
                debug!("select_and_play: index {} out of bounds", index);
                return Ok(false);
            }
        };

        self.prior_stable = (self.current_index, stable_state(self.state));
        self.current_index = Some(index);
        self.state = PlaybackState::Loading;

        transport.set_source(&track.stream_uri());
        transport.load();
        if let Err(err) = transport.play() {
            warn!("transport rejected play for {}: {}", track, err);
            self.restore_prior_stable();
            return Err(format!("Failed to play: {}", track.display_title()));
        }
        Ok(true)
    }

    /// Space-bar semantics: with no track the first catalog entry
    /// starts playing; otherwise the transport toggles and the session
    /// mirrors whichever event the transport confirms.
    pub fn toggle_play_pause(&mut self, transport: &mut dyn MediaTransport) -> Result<(), String> {
        match (self.current_index, self.state) {
            (None, _) => {
                if !self.catalog.is_empty() {
                    self.select_and_play(0, transport)?;
                }
                Ok(())
            }
            (Some(index), PlaybackState::Idle) => {
                // Display-only selection: the transport has no source yet.
                self.select_and_play(index, transport)?;
                Ok(())
            }
            (Some(_), PlaybackState::Playing) => {
                transport.pause();
                Ok(())
            }
            (Some(_), _) => transport.play().map_err(|err| {
                warn!("transport rejected play: {}", err);
                "Failed to play audio".to_string()
            }),
        }
    }

    /// Moves to the next/previous track per the shuffle policy and
    /// plays it. No-op on an empty catalog.
    pub fn advance(
        &mut self,
        direction: Direction,
        transport: &mut dyn MediaTransport,
    ) -> Result<bool, String> {
        if self.catalog.is_empty() {
            return Ok(false);
        }
        let current = self.current_index.unwrap_or(0);
        let target = self.next_index(current, direction);
        self.select_and_play(target, transport)
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.is_shuffling = !self.is_shuffling;
        self.is_shuffling
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.cycled();
        self.repeat_mode
    }

    /// Folds one transport lifecycle event into the session. Returns
    /// `Err` with user-facing text when a failure should be surfaced.
    pub fn handle_transport_event(
        &mut self,
        event: &TransportEvent,
        transport: &mut dyn MediaTransport,
    ) -> Result<(), String> {
        match event {
            TransportEvent::Play => {
                self.state = PlaybackState::Playing;
                Ok(())
            }
            TransportEvent::Pause => {
                if self.state != PlaybackState::Idle {
                    self.state = PlaybackState::Paused;
                }
                Ok(())
            }
            TransportEvent::Ended => self.handle_track_ended(transport),
            TransportEvent::Error(detail) => {
                if self.state == PlaybackState::Loading {
                    warn!("transport failed to load source: {}", detail);
                    self.restore_prior_stable();
                    Err(format!("Failed to load audio: {}", detail))
                } else {
                    warn!("transport error: {}", detail);
                    Err(format!("Playback error: {}", detail))
                }
            }
            // Readiness only; the state follows the play/pause events.
            TransportEvent::CanPlay
            | TransportEvent::LoadStart
            | TransportEvent::TimeUpdate
            | TransportEvent::DurationChange
            | TransportEvent::Seeking
            | TransportEvent::Seeked => Ok(()),
        }
    }

    /// Applies a refreshed catalog. The previously current track keeps
    /// its selection across index remapping; if it vanished from the
    /// new catalog, playback stops rather than continuing from a stale
    /// source. With nothing selected, a non-empty catalog selects
    /// index 0 for display only. Returns whether playback was stopped.
    pub fn catalog_refreshed(
        &mut self,
        catalog: Catalog,
        transport: &mut dyn MediaTransport,
    ) -> bool {
        let previous_track = self.current_track().cloned();
        self.catalog = catalog;

        let mut stopped = false;
        if let Some(track) = previous_track {
            match self.catalog.index_of(&track) {
                Some(index) => self.current_index = Some(index),
                None => {
                    debug!("current track {} vanished from refreshed catalog", track);
                    if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
                        transport.pause();
                        stopped = true;
                    }
                    self.current_index = None;
                    self.state = PlaybackState::Idle;
                }
            }
        }

        if self.current_index.is_none() && !self.catalog.is_empty() {
            // Display-only selection; playback does not start.
            self.current_index = Some(0);
        }
        stopped
    }

    fn handle_track_ended(&mut self, transport: &mut dyn MediaTransport) -> Result<(), String> {
        match self.repeat_mode {
            RepeatMode::One => {
                transport.seek(0.0);
                transport.play().map_err(|err| {
                    warn!("transport rejected repeat-one restart: {}", err);
                    "Failed to play audio".to_string()
                })
            }
            RepeatMode::All => self.advance(Direction::Next, transport).map(|_| ()),
            RepeatMode::Off => {
                let at_last = self.current_index.is_some()
                    && self.current_index == self.catalog.last_index();
                if at_last || self.current_index.is_none() {
                    self.state = PlaybackState::Paused;
                    Ok(())
                } else {
                    self.advance(Direction::Next, transport).map(|_| ())
                }
            }
        }
    }

    /// Next/previous index policy. Shuffling draws a uniformly random
    /// index, redrawing while it matches the current one; a singleton
    /// catalog reuses the current index so the draw cannot stall.
    /// Sequential traversal wraps at both ends.
    fn next_index(&mut self, current: usize, direction: Direction) -> usize {
        let track_count = self.catalog.len();
        if self.is_shuffling {
            if track_count <= 1 {
                return current;
            }
            let mut rng = StdRng::from_seed(self.rng_seed);
            let mut next = rng.random_range(0..track_count);
            while next == current {
                next = rng.random_range(0..track_count);
            }
            self.advance_rng_seed();
            next
        } else {
            match direction {
                Direction::Next => (current + 1) % track_count,
                Direction::Previous => (current + track_count - 1) % track_count,
            }
        }
    }

    fn advance_rng_seed(&mut self) {
        let mut new_seed = [0u8; 32];
        for (i, val) in new_seed.iter_mut().enumerate() {
            *val = self.rng_seed[i].wrapping_add(1);
        }
        self.rng_seed = new_seed;
    }

    fn restore_prior_stable(&mut self) {
        let (index, state) = self.prior_stable;
        self.current_index = index;
        self.state = state;
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A pending load is not a state worth restoring to; fall back to
/// paused when a rollback lands on one.
fn stable_state(state: PlaybackState) -> PlaybackState {
    if state == PlaybackState::Loading {
        PlaybackState::Paused
    } else {
        state
    }
}
