//! Playlist/favorites bus manager.
//!
//! Bridges playlist commands on the bus to the server-backed playlist
//! store and the locally persisted favorites set, and publishes the
//! resulting state plus user-facing notifications.

use log::{error, warn};
use tokio::sync::broadcast::{Receiver, Sender};

use crate::favorites::FavoritesSet;
use crate::playlist_store::{PlaylistError, PlaylistStore};
use crate::protocol::{Message, Notification, PlaylistMessage};
use crate::state_store::StateStore;
use crate::track::TrackId;

pub struct PlaylistManager {
    store: PlaylistStore,
    favorites: FavoritesSet,
    state_store: StateStore,
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
}

impl PlaylistManager {
    pub fn new(
        store: PlaylistStore,
        state_store: StateStore,
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
    ) -> Self {
        let favorites = FavoritesSet::load(&state_store);
        Self {
            store,
            favorites,
            state_store,
            bus_consumer,
            bus_producer,
        }
    }

    pub fn run(&mut self) {
        self.refresh_playlists();
        self.broadcast_favorites();

        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(Message::Playlist(command)) => self.handle_command(command),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("PlaylistManager: bus lagged, skipped {} messages", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    error!("PlaylistManager: bus closed");
                    break;
                }
            }
        }
    }

    fn handle_command(&mut self, command: PlaylistMessage) {
        match command {
            PlaylistMessage::RefreshPlaylists => self.refresh_playlists(),
            PlaylistMessage::CreatePlaylist { name, seed_tracks } => {
                self.create_playlist(&name, seed_tracks)
            }
            PlaylistMessage::AddTrack { playlist, track } => self.add_track(&playlist, &track),
            PlaylistMessage::RemoveTrack { playlist, track } => {
                self.remove_track(&playlist, &track)
            }
            PlaylistMessage::DeletePlaylist { name } => self.delete_playlist(&name),
            PlaylistMessage::OpenPlaylist { name } => {
                if self.store.open_playlist(&name) {
                    self.broadcast_open_playlist();
                }
            }
            PlaylistMessage::CloseActivePlaylist => {
                self.store.close_open_playlist();
                self.broadcast_open_playlist();
            }
            PlaylistMessage::ToggleFavorite(track) => {
                self.favorites.toggle(&track, &self.state_store);
                self.broadcast_favorites();
            }
            // Our own state broadcasts echo back on the shared bus.
            PlaylistMessage::PlaylistsChanged(_)
            | PlaylistMessage::ActivePlaylistChanged(_)
            | PlaylistMessage::FavoritesChanged(_) => {}
        }
    }

    fn refresh_playlists(&mut self) {
        match self.store.refresh() {
            Ok(()) => {
                self.broadcast_playlists();
                self.broadcast_open_playlist();
            }
            Err(err) => {
                error!("Failed to load playlists: {}", err);
                self.notify(Notification::error("Failed to load playlists"));
            }
        }
    }

    fn create_playlist(&mut self, name: &str, seed_tracks: Vec<TrackId>) {
        let seeded = !seed_tracks.is_empty();
        match self.store.create_playlist(name, seed_tracks) {
            Ok(()) => {
                self.broadcast_playlists();
                let text = if seeded {
                    format!("Playlist \"{name}\" created and song added")
                } else {
                    format!("Playlist \"{name}\" created")
                };
                self.notify(Notification::success(text));
            }
            Err(PlaylistError::DuplicateName(_)) => {
                self.notify(Notification::warning(
                    "A playlist with this name already exists",
                ));
            }
            Err(PlaylistError::Remote(detail)) => {
                error!("Failed to save playlist {}: {}", name, detail);
                self.notify(Notification::error("Error: Failed to save playlist"));
            }
        }
    }

    fn add_track(&mut self, playlist: &str, track: &TrackId) {
        match self.store.add_track(playlist, track) {
            Ok(true) => {
                self.broadcast_playlists();
                self.notify(Notification::success(format!(
                    "Song added to playlist \"{playlist}\""
                )));
            }
            Ok(false) => {
                self.notify(Notification::warning(format!(
                    "Song is already in playlist \"{playlist}\""
                )));
            }
            Err(err) => {
                error!("Failed to save playlist {}: {}", playlist, err);
                self.notify(Notification::error("Error: Failed to save playlist"));
            }
        }
    }

    fn remove_track(&mut self, playlist: &str, track: &TrackId) {
        match self.store.remove_track(playlist, track) {
            Ok(true) => {
                self.broadcast_playlists();
                self.notify(Notification::success(format!(
                    "Song removed from playlist \"{playlist}\""
                )));
            }
            Ok(false) => {}
            Err(err) => {
                error!("Failed to save playlist {}: {}", playlist, err);
                self.notify(Notification::error("Error: Failed to save playlist"));
            }
        }
    }

    fn delete_playlist(&mut self, name: &str) {
        match self.store.delete_playlist(name) {
            Ok(()) => {
                self.broadcast_playlists();
                self.broadcast_open_playlist();
                self.notify(Notification::success(format!("Playlist \"{name}\" deleted")));
            }
            Err(err) => {
                error!("Failed to delete playlist {}: {}", name, err);
                self.notify(Notification::error("Error: Failed to delete playlist"));
            }
        }
    }

    fn broadcast_playlists(&self) {
        let _ = self
            .bus_producer
            .send(Message::Playlist(PlaylistMessage::PlaylistsChanged(
                self.store.playlists().clone(),
            )));
    }

    fn broadcast_open_playlist(&self) {
        let _ = self
            .bus_producer
            .send(Message::Playlist(PlaylistMessage::ActivePlaylistChanged(
                self.store.open_playlist_name().map(str::to_string),
            )));
    }

    fn broadcast_favorites(&self) {
        let _ = self
            .bus_producer
            .send(Message::Playlist(PlaylistMessage::FavoritesChanged(
                self.favorites.to_vec(),
            )));
    }

    fn notify(&self, notification: Notification) {
        let _ = self.bus_producer.send(Message::Notify(notification));
    }
}
