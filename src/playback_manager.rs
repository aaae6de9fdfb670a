//! Playback-side bus manager.
//!
//! Owns the media transport and the three state machines around it
//! (session, scrub, volume), translates bus commands and transport
//! events into state-machine calls, and publishes display snapshots
//! back onto the bus.

use log::{debug, error, warn};
use tokio::sync::broadcast::{Receiver, Sender};

use crate::protocol::{
    self, CatalogMessage, Message, Notification, PlaybackMessage, PointerMessage, ScrubDisplay,
};
use crate::scrub::ScrubController;
use crate::session::PlaybackSession;
use crate::state_store::StateStore;
use crate::track::Catalog;
use crate::transport::{MediaTransport, TransportEvent};
use crate::volume::VolumeController;

pub struct PlaybackManager {
    session: PlaybackSession,
    scrub: ScrubController,
    volume: VolumeController,
    transport: Box<dyn MediaTransport>,
    state_store: StateStore,
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
}

impl PlaybackManager {
    pub fn new(
        transport: Box<dyn MediaTransport>,
        state_store: StateStore,
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
    ) -> Self {
        Self {
            session: PlaybackSession::new(),
            scrub: ScrubController::new(),
            volume: VolumeController::new(),
            transport,
            state_store,
            bus_consumer,
            bus_producer,
        }
    }

    pub fn run(&mut self) {
        self.volume
            .restore(&self.state_store, self.transport.as_mut());
        self.broadcast_volume();
        self.broadcast_session();

        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => match message {
                    Message::Playback(command) => self.handle_playback_command(command),
                    Message::Pointer(pointer) => self.handle_pointer(pointer),
                    Message::Transport(event) => self.handle_transport_event(event),
                    Message::Catalog(CatalogMessage::Refreshed(tracks)) => {
                        let stopped = self
                            .session
                            .catalog_refreshed(Catalog::new(tracks), self.transport.as_mut());
                        if stopped {
                            self.notify(Notification::warning(
                                "The playing track was removed from the library",
                            ));
                        }
                        self.broadcast_session();
                    }
                    _ => {}
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("PlaybackManager: bus lagged, skipped {} messages", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    error!("PlaybackManager: bus closed");
                    break;
                }
            }
        }
    }

    fn handle_playback_command(&mut self, command: PlaybackMessage) {
        match command {
            PlaybackMessage::TogglePlayPause => {
                if let Err(text) = self.session.toggle_play_pause(self.transport.as_mut()) {
                    self.notify(Notification::error(text));
                }
                self.broadcast_session();
            }
            PlaybackMessage::PlayTrackByIndex(index) => {
                if let Err(text) = self.session.select_and_play(index, self.transport.as_mut()) {
                    self.notify(Notification::error(text));
                }
                self.broadcast_session();
            }
            PlaybackMessage::Next => self.advance(protocol::Direction::Next),
            PlaybackMessage::Previous => self.advance(protocol::Direction::Previous),
            PlaybackMessage::ToggleShuffle => {
                let shuffling = self.session.toggle_shuffle();
                debug!("shuffle {}", if shuffling { "on" } else { "off" });
                self.broadcast_session();
            }
            PlaybackMessage::CycleRepeatMode => {
                self.session.cycle_repeat_mode();
                self.broadcast_session();
            }
            PlaybackMessage::SetRepeatMode(mode) => {
                self.session.set_repeat_mode(mode);
                self.broadcast_session();
            }
            PlaybackMessage::ToggleMute => {
                self.volume
                    .toggle_mute(self.transport.as_mut(), &self.state_store);
                self.broadcast_volume();
            }
            // Our own display broadcasts echo back on the shared bus.
            PlaybackMessage::SessionChanged(_)
            | PlaybackMessage::ScrubDisplayChanged(_)
            | PlaybackMessage::VolumeChanged(_) => {}
        }
    }

    fn advance(&mut self, direction: protocol::Direction) {
        if let Err(text) = self.session.advance(direction, self.transport.as_mut()) {
            self.notify(Notification::error(text));
        }
        self.broadcast_session();
    }

    fn handle_pointer(&mut self, pointer: PointerMessage) {
        match pointer {
            PointerMessage::ScrubGeometryChanged(geometry) => self.scrub.set_geometry(geometry),
            PointerMessage::VolumeGeometryChanged(geometry) => self.volume.set_geometry(geometry),
            PointerMessage::ScrubPointerDown { x } => {
                if self
                    .scrub
                    .pointer_down(x, self.transport.as_mut())
                    .is_some()
                {
                    self.broadcast_scrub();
                }
            }
            PointerMessage::VolumePointerDown { x } => {
                self.volume
                    .pointer_down(x, self.transport.as_mut(), &self.state_store);
                self.broadcast_volume();
            }
            PointerMessage::PointerMoved { x } => {
                if self
                    .scrub
                    .pointer_moved(x, self.transport.as_mut())
                    .is_some()
                {
                    self.broadcast_scrub();
                }
                if self.volume.is_dragging() {
                    self.volume
                        .pointer_moved(x, self.transport.as_mut(), &self.state_store);
                    self.broadcast_volume();
                }
            }
            PointerMessage::PointerUp => {
                self.scrub.pointer_up();
                self.volume.pointer_up();
            }
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        if let Err(text) = self
            .session
            .handle_transport_event(&event, self.transport.as_mut())
        {
            self.notify(Notification::error(text));
            self.broadcast_session();
            return;
        }

        match event {
            TransportEvent::TimeUpdate
            | TransportEvent::DurationChange
            | TransportEvent::Seeked
            | TransportEvent::CanPlay => self.broadcast_scrub(),
            TransportEvent::LoadStart => {
                // New source: reset the progress display immediately
                // instead of showing the previous track's position.
                let _ = self.bus_producer.send(Message::Playback(
                    PlaybackMessage::ScrubDisplayChanged(ScrubDisplay {
                        percent: 0.0,
                        position_label: "0:00".to_string(),
                        duration_label: "0:00".to_string(),
                    }),
                ));
            }
            TransportEvent::Play
            | TransportEvent::Pause
            | TransportEvent::Ended
            | TransportEvent::Error(_) => self.broadcast_session(),
            TransportEvent::Seeking => {}
        }
    }

    fn broadcast_session(&self) {
        let _ = self.bus_producer.send(Message::Playback(
            PlaybackMessage::SessionChanged(self.session.snapshot()),
        ));
    }

    fn broadcast_scrub(&self) {
        if let Some(display) = ScrubController::display(self.transport.as_ref()) {
            let _ = self
                .bus_producer
                .send(Message::Playback(PlaybackMessage::ScrubDisplayChanged(
                    display,
                )));
        }
    }

    fn broadcast_volume(&self) {
        let _ = self.bus_producer.send(Message::Playback(
            PlaybackMessage::VolumeChanged(self.volume.display()),
        ));
    }

    fn notify(&self, notification: Notification) {
        let _ = self.bus_producer.send(Message::Notify(notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};
    use tokio::sync::broadcast::{self, error::TryRecvError, Receiver, Sender};

    use crate::protocol::SessionSnapshot;
    use crate::track::TrackId;
    use crate::transport::fake::SharedTransport;

    struct PlaybackManagerHarness {
        bus_sender: Sender<Message>,
        receiver: Receiver<Message>,
        transport: SharedTransport,
    }

    impl PlaybackManagerHarness {
        fn new() -> Self {
            let (bus_sender, _) = broadcast::channel(256);
            let manager_bus_sender = bus_sender.clone();
            let manager_receiver = bus_sender.subscribe();
            let transport = SharedTransport::new();
            let manager_transport = transport.clone();
            let state_store = StateStore::new_in_memory().expect("in-memory store");

            let mut receiver = bus_sender.subscribe();
            thread::spawn(move || {
                let mut manager = PlaybackManager::new(
                    Box::new(manager_transport),
                    state_store,
                    manager_receiver,
                    manager_bus_sender,
                );
                manager.run();
            });

            // Startup broadcasts: volume then the initial session.
            wait_for_message(&mut receiver, Duration::from_secs(1), |message| {
                matches!(
                    message,
                    Message::Playback(PlaybackMessage::SessionChanged(_))
                )
            });

            let mut harness = Self {
                bus_sender,
                receiver,
                transport,
            };
            harness.drain_messages();
            harness
        }

        fn send(&self, message: Message) {
            self.bus_sender
                .send(message)
                .expect("failed to send message to bus");
        }

        fn load_catalog(&mut self, names: &[&str]) {
            let tracks = names.iter().map(|name| TrackId::new(*name)).collect();
            self.send(Message::Catalog(CatalogMessage::Refreshed(tracks)));
            self.wait_for_session(|snapshot| snapshot.current_index == Some(0));
            self.drain_messages();
        }

        fn wait_for_session<F>(&mut self, mut predicate: F) -> SessionSnapshot
        where
            F: FnMut(&SessionSnapshot) -> bool,
        {
            let message =
                wait_for_message(&mut self.receiver, Duration::from_secs(1), |message| {
                    matches!(
                        message,
                        Message::Playback(PlaybackMessage::SessionChanged(snapshot))
                            if predicate(snapshot)
                    )
                });
            match message {
                Message::Playback(PlaybackMessage::SessionChanged(snapshot)) => snapshot,
                _ => unreachable!(),
            }
        }

        fn drain_messages(&mut self) {
            loop {
                match self.receiver.try_recv() {
                    Ok(_) => {}
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Closed) => break,
                }
            }
        }
    }

    fn wait_for_message<F>(
        receiver: &mut Receiver<Message>,
        timeout: Duration,
        mut predicate: F,
    ) -> Message
    where
        F: FnMut(&Message) -> bool,
    {
        let start = Instant::now();
        loop {
            if start.elapsed() > timeout {
                panic!("timed out waiting for expected message");
            }
            match receiver.try_recv() {
                Ok(message) => {
                    if predicate(&message) {
                        return message;
                    }
                }
                Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(5)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Closed) => panic!("bus closed while waiting for message"),
            }
        }
    }

    #[test]
    fn test_toggle_play_pause_loads_first_track() {
        let mut harness = PlaybackManagerHarness::new();
        harness.load_catalog(&["a.flac", "b.flac"]);

        harness.send(Message::Playback(PlaybackMessage::TogglePlayPause));
        let snapshot = harness.wait_for_session(|s| s.current_index == Some(0));
        assert_eq!(snapshot.current_track, Some(TrackId::new("a.flac")));
        // State mirrors the transport: not playing until its event.
        assert!(!snapshot.is_playing);
        assert_eq!(
            harness.transport.lock().source.as_deref(),
            Some("/music/a.flac")
        );

        harness.send(Message::Transport(TransportEvent::Play));
        let snapshot = harness.wait_for_session(|s| s.is_playing);
        assert!(snapshot.is_playing);
    }

    #[test]
    fn test_next_command_advances_to_second_track() {
        let mut harness = PlaybackManagerHarness::new();
        harness.load_catalog(&["a.flac", "b.flac", "c.flac"]);

        harness.send(Message::Playback(PlaybackMessage::PlayTrackByIndex(0)));
        harness.wait_for_session(|s| s.current_index == Some(0));
        harness.send(Message::Playback(PlaybackMessage::Next));
        let snapshot = harness.wait_for_session(|s| s.current_index == Some(1));
        assert_eq!(snapshot.current_track, Some(TrackId::new("b.flac")));
        assert_eq!(
            harness.transport.lock().source.as_deref(),
            Some("/music/b.flac")
        );
    }

    #[test]
    fn test_scrub_drag_seeks_and_publishes_display() {
        let mut harness = PlaybackManagerHarness::new();
        harness.load_catalog(&["a.flac"]);
        harness.transport.lock().duration = 100.0;
        harness.send(Message::Pointer(PointerMessage::ScrubGeometryChanged(
            protocol::SliderGeometry {
                left: 0.0,
                width: 200.0,
            },
        )));

        harness.send(Message::Pointer(PointerMessage::ScrubPointerDown {
            x: 100.0,
        }));
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(
                message,
                Message::Playback(PlaybackMessage::ScrubDisplayChanged(display))
                    if display.position_label == "0:50"
            )
        });
        assert_eq!(harness.transport.lock().seeks, vec![50.0]);
    }

    #[test]
    fn test_mute_toggle_publishes_volume_display() {
        let mut harness = PlaybackManagerHarness::new();

        harness.send(Message::Playback(PlaybackMessage::ToggleMute));
        let message = wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(
                message,
                Message::Playback(PlaybackMessage::VolumeChanged(display)) if display.is_muted
            )
        });
        match message {
            Message::Playback(PlaybackMessage::VolumeChanged(display)) => {
                assert_eq!(display.glyph, crate::volume::VolumeGlyph::Muted);
            }
            _ => unreachable!(),
        }
        assert_eq!(harness.transport.lock().volume, 0.0);
    }

    #[test]
    fn test_vanished_current_track_stops_playback_and_warns() {
        let mut harness = PlaybackManagerHarness::new();
        harness.load_catalog(&["a.flac", "b.flac"]);
        harness.send(Message::Playback(PlaybackMessage::PlayTrackByIndex(1)));
        harness.wait_for_session(|s| s.current_index == Some(1));
        harness.send(Message::Transport(TransportEvent::Play));
        harness.wait_for_session(|s| s.is_playing);

        harness.send(Message::Catalog(CatalogMessage::Refreshed(vec![
            TrackId::new("a.flac"),
        ])));
        // The warning is published before the session snapshot.
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(
                message,
                Message::Notify(notification)
                    if notification.severity == protocol::Severity::Warning
            )
        });
        let snapshot = harness.wait_for_session(|s| !s.is_playing);
        assert_eq!(snapshot.current_index, Some(0));
        assert_eq!(harness.transport.lock().pause_calls, 1);
    }
}
