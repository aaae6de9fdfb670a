//! Track identity and the ordered catalog of playable tracks.

use std::fmt;

/// Opaque track identifier.
///
/// The identifier doubles as the server-side filename: it is the
/// catalog key, the favorites-set member, and the playlist-entry value
/// all at once. A rename on the server therefore invalidates
/// favorites/playlist membership; consumers must treat the value as
/// opaque and only compare it for equality.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct TrackId(String);

const AUDIO_EXTENSIONS: [&str; 4] = [".flac", ".mp3", ".wav", ".m4a"];

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Streaming URI understood by the media transport.
    pub fn stream_uri(&self) -> String {
        format!("/music/{}", urlencoding::encode(&self.0))
    }

    /// User-facing title: audio extension and leading `NN - ` track
    /// number stripped from the filename.
    pub fn display_title(&self) -> String {
        let mut title = self.0.as_str();
        for extension in AUDIO_EXTENSIONS {
            if title.len() >= extension.len()
                && title[title.len() - extension.len()..].eq_ignore_ascii_case(extension)
            {
                title = &title[..title.len() - extension.len()];
                break;
            }
        }
        strip_leading_track_number(title).trim().to_string()
    }

    /// Artist guess from `Artist - Title` filename patterns.
    pub fn display_artist(&self) -> String {
        let title = self.display_title();
        if let Some((artist, _)) = title.split_once(" - ") {
            let artist = strip_leading_number_dot(artist.trim()).trim();
            if !artist.is_empty() {
                return artist.to_string();
            }
        }
        "Unknown Artist".to_string()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Strips a `NN - ` prefix (digits, optional spaces, dash, spaces).
fn strip_leading_track_number(name: &str) -> &str {
    let digits_end = name
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    if digits_end == 0 {
        return name;
    }
    let rest = name[digits_end..].trim_start();
    match rest.strip_prefix('-') {
        Some(stripped) => stripped.trim_start(),
        None => name,
    }
}

/// Strips a `NN.` prefix used in track-numbered artist segments.
fn strip_leading_number_dot(name: &str) -> &str {
    let digits_end = name
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    if digits_end == 0 {
        return name;
    }
    match name[digits_end..].strip_prefix('.') {
        Some(stripped) => stripped.trim_start(),
        None => name,
    }
}

/// Ordered list of playable track identifiers fetched from the remote
/// library. Index position is play order; entries are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tracks: Vec<TrackId>,
}

impl Catalog {
    /// Builds a catalog, dropping duplicate identifiers while keeping
    /// first-occurrence order.
    pub fn new(tracks: Vec<TrackId>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let tracks = tracks
            .into_iter()
            .filter(|track| seen.insert(track.clone()))
            .collect();
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackId> {
        self.tracks.get(index)
    }

    pub fn index_of(&self, track: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|candidate| candidate == track)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.tracks.len().checked_sub(1)
    }

    pub fn tracks(&self) -> &[TrackId] {
        &self.tracks
    }
}
