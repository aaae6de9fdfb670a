//! HTTP client for the remote music library server.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::json;

use crate::track::TrackId;

/// Remote library operations the engine depends on. Backed by HTTP in
/// production and by a scripted fake in tests.
pub trait RemoteLibrary: Send {
    /// Full ordered list of playable track identifiers.
    fn fetch_catalog(&self) -> Result<Vec<TrackId>, String>;

    fn fetch_playlists(&self) -> Result<BTreeMap<String, Vec<TrackId>>, String>;

    /// Uploads the complete track list of one playlist, replacing
    /// whatever the server held for that name.
    fn save_playlist(&self, name: &str, tracks: &[TrackId]) -> Result<(), String>;

    fn delete_playlist(&self, name: &str) -> Result<(), String>;
}

/// `RemoteLibrary` backed by `ureq` against the library's JSON API.
pub struct HttpLibraryClient {
    base_url: String,
    http_client: ureq::Agent,
}

#[derive(serde::Deserialize)]
struct PlaylistPayload {
    name: String,
    songs: Vec<TrackId>,
}

impl HttpLibraryClient {
    pub fn new(base_url: &str) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn playlist_url(&self, name: &str) -> String {
        format!(
            "{}/api/playlists/{}",
            self.base_url,
            urlencoding::encode(name)
        )
    }
}

impl RemoteLibrary for HttpLibraryClient {
    fn fetch_catalog(&self) -> Result<Vec<TrackId>, String> {
        let response = self
            .http_client
            .get(&self.api_url("/api/songs"))
            .call()
            .map_err(|err| format!("Song list request failed: {err}"))?;
        response
            .into_json::<Vec<TrackId>>()
            .map_err(|err| format!("Song list parse failed: {err}"))
    }

    fn fetch_playlists(&self) -> Result<BTreeMap<String, Vec<TrackId>>, String> {
        let response = self
            .http_client
            .get(&self.api_url("/api/playlists"))
            .call()
            .map_err(|err| format!("Playlist request failed: {err}"))?;
        let playlists: Vec<PlaylistPayload> = response
            .into_json()
            .map_err(|err| format!("Playlist parse failed: {err}"))?;
        Ok(playlists
            .into_iter()
            .map(|playlist| (playlist.name, playlist.songs))
            .collect())
    }

    fn save_playlist(&self, name: &str, tracks: &[TrackId]) -> Result<(), String> {
        self.http_client
            .post(&self.api_url("/api/playlists"))
            .send_json(json!({ "name": name, "songs": tracks }))
            .map_err(|err| format!("Playlist save failed: {err}"))?;
        Ok(())
    }

    fn delete_playlist(&self, name: &str) -> Result<(), String> {
        self.http_client
            .delete(&self.playlist_url(name))
            .call()
            .map_err(|err| format!("Playlist delete failed: {err}"))?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = HttpLibraryClient::new(" http://localhost:8080/ ");
        assert_eq!(client.api_url("/api/songs"), "http://localhost:8080/api/songs");
    }

    #[test]
    fn test_playlist_url_encodes_name() {
        let client = HttpLibraryClient::new("http://localhost:8080");
        assert_eq!(
            client.playlist_url("road trip & chill"),
            "http://localhost:8080/api/playlists/road%20trip%20%26%20chill"
        );
    }
}
