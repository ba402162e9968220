//! FreeKeys - keyboard-to-MIDI performance engine
//!
//! Physical keys and MIDI input are mapped through a binding store into
//! action events, translated by per-channel performance state into MIDI,
//! and recorded with timestamps for playback.

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod keymap;
pub mod midi;
pub mod output;
pub mod paths;
pub mod song;
pub mod store;
pub mod transient;
pub mod translate;
pub mod version;

pub use action::{ActionEvent, ValueOp};
pub use engine::{EngineHandle, EngineHost, EngineOptions, EventEngine};
pub use error::{SongError, SongResult};
pub use midi::MidiMessage;
pub use store::BindingStore;
pub use version::Version;
