//! Song log and song files
//!
//! A song is an ordered list of timestamped action events plus metadata.
//! `.fpm` files are read and written by [`file`]; `.lyt` files from the
//! iDreamPiano player can be imported with [`lyt`].

pub mod file;
pub mod lyt;
pub mod migrate;

use std::path::Path;

use serde::Serialize;

use crate::action::ActionEvent;
use crate::error::SongResult;
use crate::version::Version;

pub use file::{decode, encode, load, save};
pub use lyt::{decode_lyt, load_lyt};
pub use migrate::migrate;

/// Capacity of the song log, in events
pub const DEFAULT_MAX_EVENTS: usize = 1 << 20;

/// One logged event; `time` is in milliseconds from the start of the song
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SongEvent {
    pub time: f64,
    pub event: ActionEvent,
}

impl SongEvent {
    pub fn new(time: f64, event: ActionEvent) -> Self {
        Self { time, event }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongInfo {
    #[serde(serialize_with = "serialize_version")]
    pub version: Version,
    pub title: String,
    pub author: String,
    pub comment: String,
    /// Instrument the song was recorded with, informational only
    pub instrument: String,
    pub write_protected: bool,
    /// False when the file used obsolete actions that could not be upgraded
    pub compatible: bool,
}

fn serialize_version<S: serde::Serializer>(version: &Version, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(version)
}

impl Default for SongInfo {
    fn default() -> Self {
        Self {
            version: Version::CURRENT,
            title: String::new(),
            author: String::new(),
            comment: String::new(),
            instrument: String::new(),
            write_protected: false,
            compatible: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Song {
    pub info: SongInfo,
    pub events: Vec<SongEvent>,
}

impl Song {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, event: ActionEvent) {
        self.events.push(SongEvent::new(time, event));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the last event, in milliseconds
    pub fn length_ms(&self) -> f64 {
        self.events.last().map(|e| e.time).unwrap_or(0.0)
    }
}

/// Read a song file, picking the format from the extension
///
/// `.lyt` is imported; everything else is read as `.fpm`.
pub fn open(path: &Path, max_events: usize) -> SongResult<Song> {
    let is_lyt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lyt"));

    if is_lyt {
        load_lyt(path, max_events)
    } else {
        load(path, max_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_length() {
        let mut song = Song::new();
        assert!(song.is_empty());
        assert_eq!(song.length_ms(), 0.0);
        song.push(0.0, ActionEvent::note_on(0, 60, 127));
        song.push(250.5, ActionEvent::note_off(0, 60));
        assert_eq!(song.len(), 2);
        assert_eq!(song.length_ms(), 250.5);
    }

    #[test]
    fn test_info_json() {
        let info = SongInfo { title: "Etude".into(), ..SongInfo::default() };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["version"], "1.8");
        assert_eq!(json["title"], "Etude");
        assert_eq!(json["compatible"], true);
    }
}
