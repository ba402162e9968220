//! Import of iDreamPiano `.lyt` songs
//!
//! The format is a packed dump of the player's structures: fixed-width
//! Pascal strings, a block of hand settings, optionally a 107-key keymap,
//! then 13-byte key events. Everything is converted to action events at
//! import time, so the resulting song is current-version.

use std::path::Path;

use bytes::Buf;
use tracing::{debug, info};

use super::{Song, SongInfo};
use crate::action::{code, system, ActionEvent, ValueOp};
use crate::error::{SongError, SongResult};
use crate::version::Version;

pub const MAGIC: &[u8; 16] = b"iDreamPianoSong\0";

const TITLE_WIDTH: usize = 39;
const AUTHOR_WIDTH: usize = 19;
const COMMENT_WIDTH: usize = 255;
const DESCRIPTION_WIDTH: usize = 239;

const KEY_RECORD_SIZE: usize = 76;
const EVENT_RECORD_SIZE: usize = 13;

/// Scan codes of the 107 key records, in file order
pub const KEY_ORDER: [u8; 107] = [
    0x01, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F, 0x40, 0x41, 0x42, 0x43, 0x44, 0x57, 0x58, // Esc, F1-F12
    0x29, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, // ` 1-0 - =
    0x2B, 0x0E, 0x0F, // \ Backspace Tab
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, // Q-P [ ] Enter
    0x3A, 0x1E, 0x1F, 0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // Caps A-L ; '
    0x2A, 0x2C, 0x2D, 0x2E, 0x2F, 0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, // Shift Z-M , . / RShift
    0x1D, 0xDB, 0x38, 0x39, 0xB8, 0xDC, 0xDD, 0x9D, // Ctrl Win Alt Space RAlt RWin Apps RCtrl
    0xE3, 0xDF, 0xDE, 0xB7, 0x46, 0xC5, // Wake Sleep Power SysRq Scroll Pause
    0xD2, 0xC7, 0xC9, 0xD3, 0xCF, 0xD1, // Insert Home PgUp Delete End PgDn
    0xC8, 0xCB, 0xD0, 0xCD, // Up Left Down Right
    0x45, 0xB5, 0x37, 0x4A, // NumLock / * -
    0x47, 0x48, 0x49, 0x4E, 0x4B, 0x4C, 0x4D, // 7 8 9 + 4 5 6
    0x4F, 0x50, 0x51, 0x9C, 0x52, 0x53, // 1 2 3 Enter 0 .
];

const SCALE: [i32; 8] = [0, 0, 2, 4, 5, 7, 9, 11];
const ACCIDENTAL: [i32; 3] = [0, 1, -1];

fn need(buf: &[u8], len: usize) -> SongResult<()> {
    if buf.remaining() < len {
        Err(SongError::Truncated)
    } else {
        Ok(())
    }
}

/// Length byte followed by a fixed `width`-byte buffer
fn read_pascal(buf: &mut &[u8], width: usize) -> SongResult<String> {
    need(buf, 1 + width)?;
    let len = buf.get_u8() as usize;
    if len >= width {
        return Err(SongError::StringTooLong { len, limit: width });
    }
    let text = String::from_utf8_lossy(&buf[..len]).into_owned();
    buf.advance(width);
    Ok(text)
}

struct HandSettings {
    key_signature: i32,
    velocity_right: i32,
    velocity_left: i32,
    octave_right: i32,
    octave_left: i32,
    voice1: i32,
    voice2: i32,
}

fn read_hands(buf: &mut &[u8]) -> SongResult<HandSettings> {
    need(buf, 11 * 4)?;
    let mut fields = [0i32; 11];
    for field in fields.iter_mut() {
        *field = buf.get_i32_le();
    }
    Ok(HandSettings {
        key_signature: fields[0],
        velocity_right: fields[1],
        velocity_left: fields[2],
        octave_right: fields[3],
        octave_left: fields[4],
        voice1: fields[7],
        voice2: fields[9],
    })
}

fn set(action: u8, channel: u8, value: i32) -> ActionEvent {
    ActionEvent::new(action, channel, ValueOp::SET.0, value as u8)
}

/// Decode a complete `.lyt` image
pub fn decode_lyt(data: &[u8], max_events: usize) -> SongResult<Song> {
    let mut buf = data;
    if buf.remaining() < MAGIC.len() || &buf[..MAGIC.len()] != MAGIC {
        return Err(SongError::BadMagic);
    }
    buf.advance(MAGIC.len());

    need(buf, 4)?;
    let version = buf.get_i32_le();
    let title = read_pascal(&mut buf, TITLE_WIDTH)?;
    let author = read_pascal(&mut buf, AUTHOR_WIDTH)?;
    let comment = read_pascal(&mut buf, COMMENT_WIDTH)?;

    let mut song = Song {
        info: SongInfo {
            version: Version::CURRENT,
            title,
            author,
            comment,
            instrument: String::new(),
            write_protected: true,
            compatible: true,
        },
        events: Vec::new(),
    };

    let hands = read_hands(&mut buf)?;
    song.push(0.0, ActionEvent::global_op(code::KEY_SIGNATURE, ValueOp::SET, hands.key_signature as u8));
    song.push(0.0, set(code::OCTAVE, 0, hands.octave_left));
    song.push(0.0, set(code::OCTAVE, 1, hands.octave_right));
    song.push(0.0, set(code::VELOCITY, 0, hands.velocity_left));
    song.push(0.0, set(code::VELOCITY, 1, hands.velocity_right));
    if hands.voice1 > 0 || hands.voice2 > 0 {
        // sustain pedal down
        song.push(0.0, ActionEvent::new(0xB0, 0x40, 127, 0));
    }

    if version > 1 {
        need(buf, KEY_ORDER.len() * KEY_RECORD_SIZE)?;
        for &key in KEY_ORDER.iter() {
            let enabled = buf.get_i32_le();
            let note = buf.get_u8();
            let accidental = buf.get_u8();
            let octave = buf.get_u8();
            let channel = buf.get_u8();
            buf.advance(KEY_RECORD_SIZE - 8);

            if enabled != 0 && note != 0 {
                let pitch = 12
                    + octave as i32 * 12
                    + SCALE[note as usize % SCALE.len()]
                    + ACCIDENTAL[accidental as usize % ACCIDENTAL.len()];
                song.push(0.0, ActionEvent::system(system::KEY_MAP, key, 0));
                song.push(0.0, ActionEvent::note_on(channel & 0x0F, pitch as u8, 127));
            }
        }
        read_pascal(&mut buf, DESCRIPTION_WIDTH)?;
    }

    need(buf, 8)?;
    let _unknown = buf.get_i32_le();
    let count = buf.get_i32_le().max(0) as usize;
    need(buf, count.saturating_mul(EVENT_RECORD_SIZE))?;

    for _ in 0..count {
        let time = buf.get_i32_le() as f64;
        let _unused = buf.get_i32_le();
        let kind = buf.get_u8();
        let key = buf.get_i32_le();

        let event = match kind {
            1 => ActionEvent::system(system::KEY_EVENT, key as u8, 1),
            2 => ActionEvent::system(system::KEY_EVENT, key as u8, 0),
            3 => set(code::OCTAVE, 1, key),
            4 => set(code::OCTAVE, 0, key),
            5 => ActionEvent::global_op(code::KEY_SIGNATURE, ValueOp::SET, key as u8),
            _ => {
                debug!("lyt event type {} at {}ms ignored", kind, time);
                continue;
            }
        };
        song.push(time, event);
    }

    if song.len() > max_events {
        return Err(SongError::TooManyEvents { count: song.len(), limit: max_events });
    }
    Ok(song)
}

/// Read and import a `.lyt` file
pub fn load_lyt(path: &Path, max_events: usize) -> SongResult<Song> {
    let data = std::fs::read(path)?;
    let song = decode_lyt(&data, max_events)?;
    info!("Imported {:?} ({} events)", path, song.len());
    Ok(song)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::DEFAULT_MAX_EVENTS;
    use bytes::BufMut;

    fn pascal(out: &mut Vec<u8>, text: &str, width: usize) {
        out.put_u8(text.len() as u8);
        let mut field = vec![0u8; width];
        field[..text.len()].copy_from_slice(text.as_bytes());
        out.put_slice(&field);
    }

    fn header(version: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_slice(MAGIC);
        out.put_i32_le(version);
        pascal(&mut out, "Canon", TITLE_WIDTH);
        pascal(&mut out, "Pachelbel", AUTHOR_WIDTH);
        pascal(&mut out, "", COMMENT_WIDTH);
        // key signature, velocity R/L, octave R/L, unknown x2, voice1, unknown, voice2, unknown
        for value in [2, 100, 90, 1, -1, 0, 0, 1, 0, 0, 0] {
            out.put_i32_le(value);
        }
        out
    }

    fn events(out: &mut Vec<u8>, events: &[(i32, u8, i32)]) {
        out.put_i32_le(0);
        out.put_i32_le(events.len() as i32);
        for &(time, kind, key) in events {
            out.put_i32_le(time);
            out.put_i32_le(0);
            out.put_u8(kind);
            out.put_i32_le(key);
        }
    }

    #[test]
    fn test_version_one_import() {
        let mut data = header(1);
        events(&mut data, &[(0, 1, 0x1E), (250, 2, 0x1E), (300, 5, 3), (310, 19, 0)]);

        let song = decode_lyt(&data, DEFAULT_MAX_EVENTS).unwrap();
        assert_eq!(song.info.title, "Canon");
        assert_eq!(song.info.author, "Pachelbel");
        assert!(song.info.write_protected);
        assert_eq!(song.info.version, Version::CURRENT);

        let got: Vec<(f64, ActionEvent)> = song.events.iter().map(|e| (e.time, e.event)).collect();
        assert_eq!(
            got,
            vec![
                (0.0, ActionEvent::global_op(code::KEY_SIGNATURE, ValueOp::SET, 2)),
                (0.0, set(code::OCTAVE, 0, -1)),
                (0.0, set(code::OCTAVE, 1, 1)),
                (0.0, set(code::VELOCITY, 0, 90)),
                (0.0, set(code::VELOCITY, 1, 100)),
                (0.0, ActionEvent::new(0xB0, 0x40, 127, 0)),
                (0.0, ActionEvent::system(system::KEY_EVENT, 0x1E, 1)),
                (250.0, ActionEvent::system(system::KEY_EVENT, 0x1E, 0)),
                (300.0, ActionEvent::global_op(code::KEY_SIGNATURE, ValueOp::SET, 3)),
            ]
        );
    }

    #[test]
    fn test_keymap_records() {
        let mut data = header(2);
        for index in 0..KEY_ORDER.len() {
            let mut record = vec![0u8; KEY_RECORD_SIZE];
            if index == 43 {
                // A: enabled, note E (3), sharp, octave 4, channel 1
                record[..4].copy_from_slice(&1i32.to_le_bytes());
                record[4..8].copy_from_slice(&[3, 1, 4, 1]);
            }
            data.extend_from_slice(&record);
        }
        pascal(&mut data, "layout", DESCRIPTION_WIDTH);
        events(&mut data, &[]);

        let song = decode_lyt(&data, DEFAULT_MAX_EVENTS).unwrap();
        let tail: Vec<ActionEvent> = song.events.iter().skip(6).map(|e| e.event).collect();
        assert_eq!(KEY_ORDER[43], 0x1E);
        assert_eq!(
            tail,
            vec![
                ActionEvent::system(system::KEY_MAP, 0x1E, 0),
                ActionEvent::note_on(1, 12 + 48 + 4 + 1, 127),
            ]
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(decode_lyt(b"FreePianoSong\0\0\0", 16), Err(SongError::BadMagic)));
        let data = header(1);
        assert!(matches!(decode_lyt(&data, DEFAULT_MAX_EVENTS), Err(SongError::Truncated)));
        let mut data = header(1);
        events(&mut data, &[(0, 1, 1)]);
        assert!(matches!(decode_lyt(&data, 3), Err(SongError::TooManyEvents { .. })));
    }
}
