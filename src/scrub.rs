//! Scrub (progress) slider controller.
//!
//! Converts pointer-drag input over the progress bar into transport
//! seeks. Every pointer move during a drag seeks immediately, so the
//! audible position follows the pointer instead of waiting for
//! release.

use crate::protocol::{ScrubDisplay, SliderGeometry};
use crate::transport::MediaTransport;

pub struct ScrubController {
    geometry: SliderGeometry,
    dragging: bool,
}

impl ScrubController {
    pub fn new() -> ScrubController {
        ScrubController {
            geometry: SliderGeometry {
                left: 0.0,
                width: 0.0,
            },
            dragging: false,
        }
    }

    pub fn set_geometry(&mut self, geometry: SliderGeometry) {
        self.geometry = geometry;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Pointer went down on the progress bar: start a drag and seek to
    /// the pointer right away. Returns the seek target, if any.
    pub fn pointer_down(&mut self, x: f64, transport: &mut dyn MediaTransport) -> Option<f64> {
        self.dragging = true;
        self.seek_to_pointer(x, transport)
    }

    /// Global pointer move: only an active drag tracks the pointer, and
    /// the pointer may be far outside the bar's bounds by now.
    pub fn pointer_moved(&mut self, x: f64, transport: &mut dyn MediaTransport) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        self.seek_to_pointer(x, transport)
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    fn seek_to_pointer(&self, x: f64, transport: &mut dyn MediaTransport) -> Option<f64> {
        let duration = transport.duration();
        // No metadata yet (or a zero-length stream): seeking has no
        // meaningful target, so drags are inert.
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        let target = self.geometry.percent_at(x) * duration;
        transport.seek(target);
        Some(target)
    }

    /// Snapshot of the progress display, or `None` while the duration
    /// is unknown.
    pub fn display(transport: &dyn MediaTransport) -> Option<ScrubDisplay> {
        let duration = transport.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        let position = transport.position();
        Some(ScrubDisplay {
            percent: (position / duration).clamp(0.0, 1.0),
            position_label: format_time(position),
            duration_label: format_time(duration),
        })
    }
}

impl Default for ScrubController {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats seconds as `m:ss`. Non-finite and negative inputs render as
/// `0:00` so a metadata-less transport never shows garbage.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
