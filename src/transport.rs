//! Media transport abstraction.
//!
//! The transport is the single streaming playback primitive that
//! actually decodes and plays audio. It is exclusively owned by the
//! playback side of the engine: source assignment is the playback
//! session's sole responsibility, while the scrub and volume
//! controllers only read/write its time and volume fields.

/// Commands understood by the underlying streaming media element.
pub trait MediaTransport: Send {
    /// Assigns a new source URI. Per the transport contract, assigning
    /// a new source aborts any in-flight load of the previous one.
    fn set_source(&mut self, uri: &str);

    fn load(&mut self);

    /// Starts playback. Returns `Err` when the transport rejects the
    /// request synchronously (e.g. an autoplay policy).
    fn play(&mut self) -> Result<(), String>;

    fn pause(&mut self);

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    fn seek(&mut self, seconds: f64);

    /// Track duration in seconds. `NaN` until metadata is known.
    fn duration(&self) -> f64;

    /// Output level in `[0, 1]`.
    fn set_volume(&mut self, level: f64);
}

/// Lifecycle events emitted by the media transport.
///
/// Events are assumed to arrive in a coherent per-track order
/// (`LoadStart` -> ... -> `CanPlay`/`Error` -> ... -> `Ended`); the
/// engine does not defend against out-of-order delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    LoadStart,
    CanPlay,
    Play,
    Pause,
    Ended,
    TimeUpdate,
    DurationChange,
    Seeking,
    Seeked,
    Error(String),
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::{Arc, Mutex, MutexGuard};

    use super::MediaTransport;

    /// Scriptable transport used by unit tests. Records every command
    /// and lets tests drive position/duration directly.
    #[derive(Debug)]
    pub struct FakeTransport {
        pub source: Option<String>,
        pub load_calls: u32,
        pub play_calls: u32,
        pub pause_calls: u32,
        pub seeks: Vec<f64>,
        pub position: f64,
        pub duration: f64,
        pub volume: f64,
        pub volume_history: Vec<f64>,
        pub reject_play: Option<String>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self {
                source: None,
                load_calls: 0,
                play_calls: 0,
                pause_calls: 0,
                seeks: Vec::new(),
                position: 0.0,
                duration: f64::NAN,
                volume: 1.0,
                volume_history: Vec::new(),
                reject_play: None,
            }
        }

        pub fn with_duration(duration: f64) -> Self {
            let mut transport = Self::new();
            transport.duration = duration;
            transport
        }
    }

    impl MediaTransport for FakeTransport {
        fn set_source(&mut self, uri: &str) {
            self.source = Some(uri.to_string());
            self.position = 0.0;
        }

        fn load(&mut self) {
            self.load_calls += 1;
        }

        fn play(&mut self) -> Result<(), String> {
            self.play_calls += 1;
            match &self.reject_play {
                Some(reason) => Err(reason.clone()),
                None => Ok(()),
            }
        }

        fn pause(&mut self) {
            self.pause_calls += 1;
        }

        fn position(&self) -> f64 {
            self.position
        }

        fn seek(&mut self, seconds: f64) {
            self.seeks.push(seconds);
            self.position = seconds;
        }

        fn duration(&self) -> f64 {
            self.duration
        }

        fn set_volume(&mut self, level: f64) {
            self.volume = level;
            self.volume_history.push(level);
        }
    }

    /// Cloneable handle around a [`FakeTransport`] so manager tests can
    /// inspect the transport a spawned manager thread owns.
    #[derive(Clone)]
    pub struct SharedTransport(Arc<Mutex<FakeTransport>>);

    impl SharedTransport {
        pub fn new() -> Self {
            Self(Arc::new(Mutex::new(FakeTransport::new())))
        }

        pub fn lock(&self) -> MutexGuard<'_, FakeTransport> {
            self.0.lock().expect("transport mutex poisoned")
        }
    }

    impl MediaTransport for SharedTransport {
        fn set_source(&mut self, uri: &str) {
            self.lock().set_source(uri);
        }

        fn load(&mut self) {
            self.lock().load();
        }

        fn play(&mut self) -> Result<(), String> {
            self.lock().play()
        }

        fn pause(&mut self) {
            self.lock().pause();
        }

        fn position(&self) -> f64 {
            self.lock().position
        }

        fn seek(&mut self, seconds: f64) {
            self.lock().seek(seconds);
        }

        fn duration(&self) -> f64 {
            self.lock().duration
        }

        fn set_volume(&mut self, level: f64) {
            self.lock().set_volume(level);
        }
    }
}
