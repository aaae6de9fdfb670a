//! Volume slider and mute controller.
//!
//! Unlike play/pause, volume applies optimistically: the transport's
//! volume knob cannot be rejected, so the controller is the source of
//! truth and pushes every change straight to the transport and the
//! persistent store.

use log::warn;

use crate::protocol::{SliderGeometry, VolumeDisplay};
use crate::state_store::StateStore;
use crate::transport::MediaTransport;

pub const DEFAULT_LEVEL: f64 = 1.0;

/// Icon bucket for the current output level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeGlyph {
    Muted,
    Low,
    High,
}

pub struct VolumeController {
    /// Last user-chosen level; kept while muted so unmute can restore it.
    level: f64,
    is_muted: bool,
    level_before_mute: f64,
    geometry: SliderGeometry,
    dragging: bool,
}

impl VolumeController {
    pub fn new() -> VolumeController {
        VolumeController {
            level: DEFAULT_LEVEL,
            is_muted: false,
            level_before_mute: DEFAULT_LEVEL,
            geometry: SliderGeometry {
                left: 0.0,
                width: 0.0,
            },
            dragging: false,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_geometry(&mut self, geometry: SliderGeometry) {
        self.geometry = geometry;
    }

    /// Loads the persisted level and applies it to the transport.
    /// Missing or unreadable state falls back to full volume.
    pub fn restore(&mut self, store: &StateStore, transport: &mut dyn MediaTransport) {
        let level = match store.load_volume() {
            Ok(Some(level)) => level,
            Ok(None) => DEFAULT_LEVEL,
            Err(err) => {
                warn!("Failed to load persisted volume: {}", err);
                DEFAULT_LEVEL
            }
        };
        self.level = level.clamp(0.0, 1.0);
        self.level_before_mute = self.level;
        transport.set_volume(self.level);
    }

    /// Sets the output level, clamped to `[0, 1]`. While muted the
    /// chosen level is remembered but the transport stays silent.
    pub fn set_level(
        &mut self,
        level: f64,
        transport: &mut dyn MediaTransport,
        store: &StateStore,
    ) {
        self.level = level.clamp(0.0, 1.0);
        let applied = if self.is_muted { 0.0 } else { self.level };
        transport.set_volume(applied);
        if let Err(err) = store.save_volume(self.level) {
            warn!("Failed to persist volume: {}", err);
        }
    }

    /// Mute silences the transport while remembering the level; unmute
    /// restores exactly that level.
    pub fn toggle_mute(&mut self, transport: &mut dyn MediaTransport, store: &StateStore) {
        if self.is_muted {
            self.is_muted = false;
            self.set_level(self.level_before_mute, transport, store);
        } else {
            self.level_before_mute = self.level;
            self.is_muted = true;
            transport.set_volume(0.0);
        }
    }

    pub fn pointer_down(
        &mut self,
        x: f64,
        transport: &mut dyn MediaTransport,
        store: &StateStore,
    ) {
        self.dragging = true;
        self.apply_pointer(x, transport, store);
    }

    pub fn pointer_moved(
        &mut self,
        x: f64,
        transport: &mut dyn MediaTransport,
        store: &StateStore,
    ) {
        if !self.dragging {
            return;
        }
        self.apply_pointer(x, transport, store);
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    fn apply_pointer(&mut self, x: f64, transport: &mut dyn MediaTransport, store: &StateStore) {
        let percent = self.geometry.percent_at(x);
        // Dragging the slider up is an implicit unmute.
        if self.is_muted && percent > 0.0 {
            self.is_muted = false;
        }
        self.set_level(percent, transport, store);
    }

    pub fn glyph(&self) -> VolumeGlyph {
        if self.is_muted || self.level == 0.0 {
            VolumeGlyph::Muted
        } else if self.level < 0.5 {
            VolumeGlyph::Low
        } else {
            VolumeGlyph::High
        }
    }

    pub fn display(&self) -> VolumeDisplay {
        VolumeDisplay {
            percent: (self.level * 100.0).round() as u8,
            is_muted: self.is_muted,
            glyph: self.glyph(),
        }
    }
}

impl Default for VolumeController {
    fn default() -> Self {
        Self::new()
    }
}
