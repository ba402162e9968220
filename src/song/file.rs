//! `.fpm` song files
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! "FreePianoSong\0"                 14 bytes
//! version                           u32
//! title, author, comment,
//! instrument                        u32 length + bytes each
//! compressed size                   u32
//! zlib stream of 16-byte records    f64 time, a, b, c, d, 4 zero bytes
//! ```

use std::io::{Read, Write};
use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::{debug, info};

use super::{migrate, Song, SongEvent, SongInfo};
use crate::action::ActionEvent;
use crate::error::{SongError, SongResult};
use crate::version::Version;

pub const MAGIC: &[u8; 14] = b"FreePianoSong\0";
pub const RECORD_SIZE: usize = 16;

const TITLE_LIMIT: usize = 256;
const AUTHOR_LIMIT: usize = 256;
const COMMENT_LIMIT: usize = 1024;
const INSTRUMENT_LIMIT: usize = 256;

fn read_string(buf: &mut &[u8], limit: usize) -> SongResult<String> {
    if buf.remaining() < 4 {
        return Err(SongError::Truncated);
    }
    let len = buf.get_u32_le() as usize;
    if len >= limit {
        return Err(SongError::StringTooLong { len, limit });
    }
    if buf.remaining() < len {
        return Err(SongError::Truncated);
    }
    let text = String::from_utf8_lossy(&buf[..len]).into_owned();
    buf.advance(len);
    Ok(text)
}

fn write_string(out: &mut BytesMut, text: &str, limit: usize) -> SongResult<()> {
    let len = text.len();
    if len >= limit {
        return Err(SongError::StringTooLong { len, limit });
    }
    out.put_u32_le(len as u32);
    out.put_slice(text.as_bytes());
    Ok(())
}

fn decode_records(mut data: &[u8]) -> SongResult<Vec<SongEvent>> {
    if data.len() % RECORD_SIZE != 0 {
        return Err(SongError::Corrupt(format!(
            "event block of {} bytes is not a whole number of records",
            data.len()
        )));
    }
    let mut events = Vec::with_capacity(data.len() / RECORD_SIZE);
    while data.has_remaining() {
        let time = data.get_f64_le();
        let mut raw = [0u8; 4];
        data.copy_to_slice(&mut raw);
        data.advance(4);
        events.push(SongEvent::new(time, ActionEvent::from_bytes(raw)));
    }
    Ok(events)
}

/// Decode a complete `.fpm` image
///
/// Songs from before 1.8 are migrated to the current action encoding.
/// Loaded songs are write protected.
pub fn decode(data: &[u8], max_events: usize) -> SongResult<Song> {
    let mut buf = data;

    if buf.remaining() < MAGIC.len() {
        return Err(SongError::BadMagic);
    }
    if &buf[..MAGIC.len()] != MAGIC {
        return Err(SongError::BadMagic);
    }
    buf.advance(MAGIC.len());

    if buf.remaining() < 4 {
        return Err(SongError::Truncated);
    }
    let version = Version(buf.get_u32_le());
    if version > Version::CURRENT {
        return Err(SongError::UnsupportedVersion { found: version, supported: Version::CURRENT });
    }

    let title = read_string(&mut buf, TITLE_LIMIT)?;
    let author = read_string(&mut buf, AUTHOR_LIMIT)?;
    let comment = read_string(&mut buf, COMMENT_LIMIT)?;
    let instrument = read_string(&mut buf, INSTRUMENT_LIMIT)?;

    if buf.remaining() < 4 {
        return Err(SongError::Truncated);
    }
    let compressed_len = buf.get_u32_le() as usize;
    if buf.remaining() < compressed_len {
        return Err(SongError::Truncated);
    }
    let compressed = &buf[..compressed_len];

    // one record past the limit is enough to detect an oversized song
    let limit = (max_events as u64 + 1) * RECORD_SIZE as u64;
    let mut raw = Vec::new();
    ZlibDecoder::new(compressed)
        .take(limit)
        .read_to_end(&mut raw)
        .map_err(|e| SongError::Corrupt(e.to_string()))?;

    let events = decode_records(&raw)?;
    if events.len() > max_events {
        return Err(SongError::TooManyEvents { count: events.len(), limit: max_events });
    }

    let mut song = Song {
        info: SongInfo {
            version,
            title,
            author,
            comment,
            instrument,
            write_protected: true,
            compatible: true,
        },
        events,
    };
    migrate(&mut song);
    debug!("decoded song v{} with {} events", version, song.len());
    Ok(song)
}

/// Encode a song as a current-version `.fpm` image
pub fn encode(song: &Song) -> SongResult<Vec<u8>> {
    let mut records = BytesMut::with_capacity(song.len() * RECORD_SIZE);
    for entry in &song.events {
        records.put_f64_le(entry.time);
        records.put_slice(&entry.event.to_bytes());
        records.put_bytes(0, 4);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&records)?;
    let compressed = encoder.finish()?;

    let mut out = BytesMut::new();
    out.put_slice(MAGIC);
    out.put_u32_le(Version::CURRENT.0);
    write_string(&mut out, &song.info.title, TITLE_LIMIT)?;
    write_string(&mut out, &song.info.author, AUTHOR_LIMIT)?;
    write_string(&mut out, &song.info.comment, COMMENT_LIMIT)?;
    write_string(&mut out, &song.info.instrument, INSTRUMENT_LIMIT)?;
    out.put_u32_le(compressed.len() as u32);
    out.put_slice(&compressed);
    Ok(out.to_vec())
}

/// Read and decode an `.fpm` file
pub fn load(path: &Path, max_events: usize) -> SongResult<Song> {
    let data = std::fs::read(path)?;
    let song = decode(&data, max_events)?;
    info!("Loaded song {:?} ({} events)", path, song.len());
    Ok(song)
}

/// Encode and write an `.fpm` file
pub fn save(path: &Path, song: &Song) -> SongResult<()> {
    if song.is_empty() {
        return Err(SongError::Empty);
    }
    let data = encode(song)?;
    std::fs::write(path, data)?;
    info!("Saved song {:?} ({} events)", path, song.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::code;
    use crate::song::DEFAULT_MAX_EVENTS;
    use tempfile::NamedTempFile;

    fn sample_song() -> Song {
        let mut song = Song::new();
        song.info.title = "Minuet".into();
        song.info.author = "Petzold".into();
        song.info.comment = "practice take".into();
        song.info.instrument = "Piano".into();
        song.push(0.0, ActionEvent::new(code::SETTING_GROUP_COUNT, 1, 0, 0));
        song.push(0.0, ActionEvent::system(crate::action::system::KEY_EVENT, 0x1E, 1));
        song.push(120.25, ActionEvent::system(crate::action::system::KEY_EVENT, 0x1E, 0));
        song.push(480.0, ActionEvent::new(code::STOP, 0, 0, 0));
        song
    }

    #[test]
    fn test_save_and_load() {
        let song = sample_song();
        let file = NamedTempFile::new().unwrap();
        save(file.path(), &song).unwrap();

        let loaded = load(file.path(), DEFAULT_MAX_EVENTS).unwrap();
        assert_eq!(loaded.events, song.events);
        assert_eq!(loaded.info.title, "Minuet");
        assert_eq!(loaded.info.instrument, "Piano");
        assert_eq!(loaded.info.version, Version::CURRENT);
        assert!(loaded.info.write_protected);
        assert!(loaded.info.compatible);
    }

    #[test]
    fn test_record_layout() {
        let mut song = Song::new();
        song.push(1.5, ActionEvent::new(1, 2, 3, 4));
        let data = encode(&song).unwrap();

        assert_eq!(&data[..14], MAGIC);
        assert_eq!(&data[14..18], &0x01080000u32.to_le_bytes());

        // skip four empty strings
        let mut buf = &data[18 + 16..];
        let len = buf.get_u32_le() as usize;
        let mut raw = Vec::new();
        ZlibDecoder::new(&buf[..len]).read_to_end(&mut raw).unwrap();
        let mut expected = 1.5f64.to_le_bytes().to_vec();
        expected.extend_from_slice(&[1, 2, 3, 4, 0, 0, 0, 0]);
        assert_eq!(raw, expected);
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(decode(b"NotASongFile!!\0\0\0\0", 16), Err(SongError::BadMagic)));
        assert!(matches!(decode(b"Free", 16), Err(SongError::BadMagic)));
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut data = encode(&sample_song()).unwrap();
        data[14..18].copy_from_slice(&0x01090000u32.to_le_bytes());
        assert!(matches!(
            decode(&data, DEFAULT_MAX_EVENTS),
            Err(SongError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_truncated() {
        let data = encode(&sample_song()).unwrap();
        let cut = &data[..data.len() - 3];
        assert!(matches!(decode(cut, DEFAULT_MAX_EVENTS), Err(SongError::Truncated)));
        assert!(matches!(decode(&data[..20], DEFAULT_MAX_EVENTS), Err(SongError::Truncated)));
    }

    #[test]
    fn test_corrupt_block() {
        let mut song = Song::new();
        song.push(0.0, ActionEvent::new(code::STOP, 0, 0, 0));
        let mut data = encode(&song).unwrap();
        // magic, version, four empty strings, block size
        let block = 14 + 4 + 16 + 4;
        data[block] = 0xFF;
        data[block + 1] = 0xFF;
        assert!(matches!(decode(&data, DEFAULT_MAX_EVENTS), Err(SongError::Corrupt(_))));
    }

    #[test]
    fn test_string_limits() {
        let mut song = sample_song();
        song.info.title = "x".repeat(256);
        assert!(matches!(encode(&song), Err(SongError::StringTooLong { len: 256, limit: 256 })));
        song.info.title = "x".repeat(255);
        assert!(encode(&song).is_ok());
    }

    #[test]
    fn test_too_many_events() {
        let data = encode(&sample_song()).unwrap();
        assert!(matches!(
            decode(&data, 3),
            Err(SongError::TooManyEvents { count: 4, limit: 3 })
        ));
        assert!(decode(&data, 4).is_ok());
    }

    #[test]
    fn test_legacy_song_is_migrated() {
        let mut song = Song::new();
        song.push(0.0, ActionEvent::new(0x91, 60, 100, 0));
        let mut data = encode(&song).unwrap();
        data[14..18].copy_from_slice(&0x01070000u32.to_le_bytes());

        let loaded = decode(&data, DEFAULT_MAX_EVENTS).unwrap();
        assert_eq!(loaded.info.version, Version::V1_7);
        assert_eq!(loaded.events[0].event, ActionEvent::note_on(1, 60, 100));
    }

    #[test]
    fn test_empty_song_not_saved() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(save(file.path(), &Song::new()), Err(SongError::Empty)));
    }
}
