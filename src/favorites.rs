//! Favorites set with write-through persistence.

use std::collections::HashSet;

use log::warn;

use crate::state_store::StateStore;
use crate::track::TrackId;

/// In-memory favorites, persisted through the [`StateStore`] on every
/// toggle. Favorites are device-local and independent of playlists: a
/// track may be favorited without belonging to any playlist, and
/// removing it from a playlist leaves the favorite intact.
#[derive(Debug, Default)]
pub struct FavoritesSet {
    tracks: HashSet<TrackId>,
}

impl FavoritesSet {
    pub fn load(store: &StateStore) -> FavoritesSet {
        let tracks = match store.load_favorites() {
            Ok(ids) => ids.into_iter().map(TrackId::new).collect(),
            Err(err) => {
                warn!("Failed to load favorites: {}", err);
                HashSet::new()
            }
        };
        FavoritesSet { tracks }
    }

    /// Flips membership and persists the change. Returns the new
    /// membership state. A persistence failure is logged but does not
    /// roll the in-memory toggle back.
    pub fn toggle(&mut self, track: &TrackId, store: &StateStore) -> bool {
        if self.tracks.remove(track) {
            if let Err(err) = store.remove_favorite(track.as_str()) {
                warn!("Failed to persist favorite removal: {}", err);
            }
            false
        } else {
            self.tracks.insert(track.clone());
            if let Err(err) = store.add_favorite(track.as_str()) {
                warn!("Failed to persist favorite: {}", err);
            }
            true
        }
    }

    pub fn contains(&self, track: &TrackId) -> bool {
        self.tracks.contains(track)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Sorted list for deterministic broadcast payloads.
    pub fn to_vec(&self) -> Vec<TrackId> {
        let mut tracks: Vec<TrackId> = self.tracks.iter().cloned().collect();
        tracks.sort();
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_toggle_returns_to_original_state() {
        let store = StateStore::new_in_memory().unwrap();
        let mut favorites = FavoritesSet::load(&store);
        let track = TrackId::new("song.flac");

        assert!(favorites.toggle(&track, &store));
        assert!(favorites.contains(&track));
        assert!(!favorites.toggle(&track, &store));
        assert!(!favorites.contains(&track));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_toggles_survive_reload() {
        let store = StateStore::new_in_memory().unwrap();
        let mut favorites = FavoritesSet::load(&store);
        favorites.toggle(&TrackId::new("b.flac"), &store);
        favorites.toggle(&TrackId::new("a.flac"), &store);

        let reloaded = FavoritesSet::load(&store);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.to_vec(),
            vec![TrackId::new("a.flac"), TrackId::new("b.flac")]
        );
    }
}
