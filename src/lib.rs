//! Playback control engine for a personal streaming music library.
//!
//! The engine drives a single media transport through a remote track
//! catalog and coordinates the scrub/volume sliders, playlists, and
//! favorites over a broadcast event bus. Rendering is left to the
//! embedding application, which feeds pointer input into the bus and
//! consumes the snapshots and notifications published back on it.

pub mod catalog_manager;
pub mod config;
pub mod favorites;
pub mod library_client;
pub mod playback_manager;
pub mod playlist_manager;
pub mod playlist_store;
pub mod protocol;
pub mod scrub;
pub mod session;
pub mod state_store;
pub mod track;
pub mod transport;
pub mod volume;
