//! Named playlists mirrored from the remote library.
//!
//! The server is the source of truth: every mutation uploads the
//! playlist's complete track list (or a delete) first and only updates
//! the local mirror once the server accepted it, so a failed request
//! leaves the mirror untouched.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

use crate::library_client::RemoteLibrary;
use crate::track::TrackId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistError {
    /// A playlist with this name already exists.
    DuplicateName(String),
    /// The server rejected or never received the mutation.
    Remote(String),
}

impl fmt::Display for PlaylistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistError::DuplicateName(name) => {
                write!(f, "a playlist named \"{name}\" already exists")
            }
            PlaylistError::Remote(detail) => write!(f, "remote library error: {detail}"),
        }
    }
}

impl std::error::Error for PlaylistError {}

pub struct PlaylistStore {
    playlists: BTreeMap<String, Vec<TrackId>>,
    open_playlist: Option<String>,
    remote: Box<dyn RemoteLibrary>,
}

impl PlaylistStore {
    pub fn new(remote: Box<dyn RemoteLibrary>) -> PlaylistStore {
        PlaylistStore {
            playlists: BTreeMap::new(),
            open_playlist: None,
            remote,
        }
    }

    pub fn playlists(&self) -> &BTreeMap<String, Vec<TrackId>> {
        &self.playlists
    }

    pub fn open_playlist_name(&self) -> Option<&str> {
        self.open_playlist.as_deref()
    }

    /// Replaces the local mirror with the server's playlist map. An
    /// open playlist that no longer exists closes.
    pub fn refresh(&mut self) -> Result<(), PlaylistError> {
        let playlists = self
            .remote
            .fetch_playlists()
            .map_err(PlaylistError::Remote)?;
        self.playlists = playlists;
        if let Some(open) = &self.open_playlist {
            if !self.playlists.contains_key(open) {
                self.open_playlist = None;
            }
        }
        Ok(())
    }

    /// Creates a playlist, optionally seeded with tracks. Name
    /// collisions are rejected before touching the server, leaving the
    /// existing playlist unchanged.
    pub fn create_playlist(
        &mut self,
        name: &str,
        seed_tracks: Vec<TrackId>,
    ) -> Result<(), PlaylistError> {
        if self.playlists.contains_key(name) {
            return Err(PlaylistError::DuplicateName(name.to_string()));
        }
        self.remote
            .save_playlist(name, &seed_tracks)
            .map_err(PlaylistError::Remote)?;
        self.playlists.insert(name.to_string(), seed_tracks);
        Ok(())
    }

    /// Appends a track to a playlist. Returns `Ok(false)` when the
    /// track is already present (no server round trip) or the playlist
    /// is unknown.
    pub fn add_track(&mut self, playlist: &str, track: &TrackId) -> Result<bool, PlaylistError> {
        let Some(tracks) = self.playlists.get(playlist) else {
            warn!("add to unknown playlist {}", playlist);
            return Ok(false);
        };
        if tracks.contains(track) {
            debug!("track {} already in playlist {}", track, playlist);
            return Ok(false);
        }
        let mut updated = tracks.clone();
        updated.push(track.clone());
        self.remote
            .save_playlist(playlist, &updated)
            .map_err(PlaylistError::Remote)?;
        self.playlists.insert(playlist.to_string(), updated);
        Ok(true)
    }

    /// Removes a track from a playlist. Absent tracks are an `Ok(false)`
    /// no-op without a server round trip.
    pub fn remove_track(&mut self, playlist: &str, track: &TrackId) -> Result<bool, PlaylistError> {
        let Some(tracks) = self.playlists.get(playlist) else {
            warn!("remove from unknown playlist {}", playlist);
            return Ok(false);
        };
        if !tracks.contains(track) {
            return Ok(false);
        }
        let updated: Vec<TrackId> = tracks
            .iter()
            .filter(|candidate| *candidate != track)
            .cloned()
            .collect();
        self.remote
            .save_playlist(playlist, &updated)
            .map_err(PlaylistError::Remote)?;
        self.playlists.insert(playlist.to_string(), updated);
        Ok(true)
    }

    /// Deletes a playlist on the server and locally. Deleting the open
    /// playlist closes the playlist view.
    pub fn delete_playlist(&mut self, name: &str) -> Result<(), PlaylistError> {
        self.remote
            .delete_playlist(name)
            .map_err(PlaylistError::Remote)?;
        self.playlists.remove(name);
        if self.open_playlist.as_deref() == Some(name) {
            self.open_playlist = None;
        }
        Ok(())
    }

    /// Opens a playlist for viewing. Unknown names are ignored.
    pub fn open_playlist(&mut self, name: &str) -> bool {
        if self.playlists.contains_key(name) {
            self.open_playlist = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn close_open_playlist(&mut self) {
        self.open_playlist = None;
    }
}
