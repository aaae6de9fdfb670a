//! Remote catalog polling.
//!
//! Periodically fetches the track list from the library server and
//! broadcasts a refresh only when the list actually changed, so
//! downstream state is not churned by identical polls.

use std::time::Duration;

use log::{debug, error};
use tokio::sync::broadcast::Sender;

use crate::library_client::RemoteLibrary;
use crate::protocol::{CatalogMessage, Message, Notification};
use crate::track::TrackId;

pub struct CatalogManager {
    client: Box<dyn RemoteLibrary>,
    bus_producer: Sender<Message>,
    poll_interval: Duration,
    known_tracks: Option<Vec<TrackId>>,
}

impl CatalogManager {
    pub fn new(
        client: Box<dyn RemoteLibrary>,
        bus_producer: Sender<Message>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            bus_producer,
            poll_interval,
            known_tracks: None,
        }
    }

    pub fn run(&mut self) {
        loop {
            self.poll();
            std::thread::sleep(self.poll_interval);
        }
    }

    /// One fetch cycle. Split out of [`run`] so callers and tests can
    /// drive polls without the sleep.
    pub fn poll(&mut self) {
        match self.client.fetch_catalog() {
            Ok(tracks) => {
                if self.known_tracks.as_ref() == Some(&tracks) {
                    debug!("catalog unchanged ({} tracks)", tracks.len());
                    return;
                }
                let first_fetch = self.known_tracks.is_none();
                self.known_tracks = Some(tracks.clone());
                if !first_fetch && !tracks.is_empty() {
                    let _ = self.bus_producer.send(Message::Notify(Notification::success(
                        format!("Music library updated! Found {} songs", tracks.len()),
                    )));
                }
                let _ = self
                    .bus_producer
                    .send(Message::Catalog(CatalogMessage::Refreshed(tracks)));
            }
            Err(err) => {
                error!("Failed to fetch catalog: {}", err);
                let _ = self
                    .bus_producer
                    .send(Message::Notify(Notification::error(
                        "Failed to load music library",
                    )));
            }
        }
    }
}
