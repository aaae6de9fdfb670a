//! Event-bus protocol shared by all runtime components.
//!
//! This module defines all message payloads exchanged between the
//! playback session, slider controllers, playlist/favorites state, and
//! the rendering layer.

use std::collections::BTreeMap;

use crate::track::TrackId;
use crate::transport::TransportEvent;
use crate::volume::VolumeGlyph;

/// Repeat behavior applied when a track reaches its natural end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum RepeatMode {
    Off, // Stop after the last track
    All, // Wrap back to the first track
    One, // Restart the current track
}

impl RepeatMode {
    /// Cycling order of the single repeat button: off -> all -> one -> off.
    pub fn cycled(self) -> RepeatMode {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Track traversal direction for next/previous operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Transport(TransportEvent),
    Playback(PlaybackMessage),
    Pointer(PointerMessage),
    Catalog(CatalogMessage),
    Playlist(PlaylistMessage),
    Notify(Notification),
}

/// Playback-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum PlaybackMessage {
    TogglePlayPause,
    PlayTrackByIndex(usize),
    Next,
    Previous,
    ToggleShuffle,
    CycleRepeatMode,
    SetRepeatMode(RepeatMode),
    ToggleMute,
    SessionChanged(SessionSnapshot),
    ScrubDisplayChanged(ScrubDisplay),
    VolumeChanged(VolumeDisplay),
}

/// Pointer-drag input forwarded from the rendering layer.
///
/// Down events are scoped to the control the pointer went down on; move
/// and up events are global so an active drag keeps tracking the
/// pointer after it leaves the control's bounds.
#[derive(Debug, Clone)]
pub enum PointerMessage {
    ScrubGeometryChanged(SliderGeometry),
    VolumeGeometryChanged(SliderGeometry),
    ScrubPointerDown { x: f64 },
    VolumePointerDown { x: f64 },
    PointerMoved { x: f64 },
    PointerUp,
}

/// Catalog-domain notifications.
#[derive(Debug, Clone)]
pub enum CatalogMessage {
    /// The remote catalog was fetched and its identity list differs
    /// from the previously known one.
    Refreshed(Vec<TrackId>),
}

/// Playlist- and favorites-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum PlaylistMessage {
    CreatePlaylist {
        name: String,
        seed_tracks: Vec<TrackId>,
    },
    AddTrack {
        playlist: String,
        track: TrackId,
    },
    RemoveTrack {
        playlist: String,
        track: TrackId,
    },
    DeletePlaylist {
        name: String,
    },
    OpenPlaylist {
        name: String,
    },
    CloseActivePlaylist,
    ToggleFavorite(TrackId),
    RefreshPlaylists,
    PlaylistsChanged(BTreeMap<String, Vec<TrackId>>),
    ActivePlaylistChanged(Option<String>),
    FavoritesChanged(Vec<TrackId>),
}

/// Severity bucket for user-facing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Terminal outcome surfaced to the rendering layer's toast area.
/// Notifications never influence control flow.
#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub text: String,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

/// Live session state published for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub current_index: Option<usize>,
    pub current_track: Option<TrackId>,
    pub is_playing: bool,
    pub is_shuffling: bool,
    pub repeat_mode: RepeatMode,
}

/// Progress display derived from transport time and duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrubDisplay {
    /// Played fraction in `[0, 1]`.
    pub percent: f64,
    /// Elapsed time label (`m:ss`).
    pub position_label: String,
    /// Total duration label (`m:ss`).
    pub duration_label: String,
}

/// Output-level display published after every volume change.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDisplay {
    /// Rounded level in `[0, 100]`.
    pub percent: u8,
    pub is_muted: bool,
    pub glyph: VolumeGlyph,
}

/// Bounding geometry of a 1-D slider track on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SliderGeometry {
    /// Left edge of the track in pointer coordinates.
    pub left: f64,
    /// Track width in pointer coordinates.
    pub width: f64,
}

impl SliderGeometry {
    /// Clamped fraction of the track covered at pointer position `x`.
    pub fn percent_at(&self, x: f64) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        ((x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_mode_cycles_off_all_one() {
        assert_eq!(RepeatMode::Off.cycled(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycled(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycled(), RepeatMode::Off);
    }

    #[test]
    fn test_slider_geometry_clamps_pointer_outside_track() {
        let geometry = SliderGeometry {
            left: 100.0,
            width: 200.0,
        };
        assert_eq!(geometry.percent_at(100.0), 0.0);
        assert_eq!(geometry.percent_at(150.0), 0.25);
        assert_eq!(geometry.percent_at(300.0), 1.0);
        assert_eq!(geometry.percent_at(20.0), 0.0);
        assert_eq!(geometry.percent_at(500.0), 1.0);
    }

    #[test]
    fn test_slider_geometry_with_zero_width_is_inert() {
        let geometry = SliderGeometry {
            left: 10.0,
            width: 0.0,
        };
        assert_eq!(geometry.percent_at(10.0), 0.0);
        assert_eq!(geometry.percent_at(999.0), 0.0);
    }
}
