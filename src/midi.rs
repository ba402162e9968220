//! MIDI wire messages
//!
//! Translation produces [`MidiMessage`] values; hosts encode them onto a
//! port. Raw action events (status byte `>= 0x80`) are parsed from their four
//! bytes with [`MidiMessage::from_event`].

use std::fmt;

use crate::action::ActionEvent;

/// One wire message, as produced by translation or carried by a raw action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Polyphonic key pressure
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// 14-bit bend, 8192 is centre
    PitchBend { channel: u8, value: u16 },
    /// System common or realtime message, forwarded verbatim; unused data
    /// bytes are zero
    System { status: u8, data: [u8; 2] },
}

/// Data bytes following a system status, None for SysEx and undefined codes
fn system_data_len(status: u8) -> Option<usize> {
    match status {
        0xF1 | 0xF3 => Some(1),
        0xF2 => Some(2),
        0xF6 | 0xF8 | 0xFA..=0xFC | 0xFE | 0xFF => Some(0),
        _ => None,
    }
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    ///
    /// Unlike a port parser, a Note On with velocity 0 is kept as Note On so
    /// bound raw events reach the instrument unchanged.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        // Running status needs per-port state; not carried here
        if status < 0x80 {
            return None;
        }

        let d1 = rest.first().map(|b| b & 0x7F);
        let d2 = rest.get(1).map(|b| b & 0x7F);

        if status < 0xF0 {
            let channel = status & 0x0F;
            return match status & 0xF0 {
                0x80 => Some(MidiMessage::NoteOff { channel, note: d1?, velocity: d2? }),
                0x90 => Some(MidiMessage::NoteOn { channel, note: d1?, velocity: d2? }),
                0xA0 => Some(MidiMessage::PolyPressure { channel, note: d1?, pressure: d2? }),
                0xB0 => Some(MidiMessage::ControlChange { channel, cc: d1?, value: d2? }),
                0xC0 => Some(MidiMessage::ProgramChange { channel, program: d1? }),
                0xD0 => Some(MidiMessage::ChannelPressure { channel, pressure: d1? }),
                0xE0 => {
                    let value = ((d2? as u16) << 7) | d1? as u16;
                    Some(MidiMessage::PitchBend { channel, value })
                }
                _ => None,
            };
        }

        let len = system_data_len(status)?;
        let mut data = [0u8; 2];
        for (i, slot) in data.iter_mut().enumerate().take(len) {
            *slot = rest.get(i)? & 0x7F;
        }
        Some(MidiMessage::System { status, data })
    }

    /// Parse the wire message carried by a raw action event
    pub fn from_event(event: &ActionEvent) -> Option<Self> {
        if !event.is_midi() {
            return None;
        }
        Self::parse(&event.to_bytes())
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::PolyPressure { channel, note, pressure } => {
                vec![0xA0 | (channel & 0x0F), note & 0x7F, pressure & 0x7F]
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            MidiMessage::ChannelPressure { channel, pressure } => {
                vec![0xD0 | (channel & 0x0F), pressure & 0x7F]
            }
            MidiMessage::PitchBend { channel, value } => {
                let lsb = (value & 0x7F) as u8;
                let msb = ((value >> 7) & 0x7F) as u8;
                vec![0xE0 | (channel & 0x0F), lsb, msb]
            }
            MidiMessage::System { status, data } => {
                let len = system_data_len(status).unwrap_or(0);
                let mut bytes = vec![status];
                bytes.extend_from_slice(&data[..len]);
                bytes
            }
        }
    }

    /// Raw action event carrying this message (padded with zeros)
    pub fn to_event(&self) -> ActionEvent {
        let bytes = self.encode();
        let byte = |i: usize| bytes.get(i).copied().unwrap_or(0);
        ActionEvent::new(byte(0), byte(1), byte(2), byte(3))
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "note-off  {:>2} {:>3} {:>3}", channel, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "note-on   {:>2} {:>3} {:>3}", channel, note, velocity)
            }
            MidiMessage::PolyPressure { channel, note, pressure } => {
                write!(f, "poly-at   {:>2} {:>3} {:>3}", channel, note, pressure)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "cc        {:>2} {:>3} {:>3}", channel, cc, value)
            }
            MidiMessage::ProgramChange { channel, program } => {
                write!(f, "program   {:>2} {:>3}", channel, program)
            }
            MidiMessage::ChannelPressure { channel, pressure } => {
                write!(f, "pressure  {:>2} {:>3}", channel, pressure)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "pitch     {:>2} {:>5}", channel, value)
            }
            MidiMessage::System { status, .. } => write!(f, "system    {:02X}", status),
        }
    }
}

pub mod convert {
    /// Pitch offset (-64..63) to a 14-bit bend value with zero at 8192
    pub fn pitch_to_14bit(offset: i8) -> u16 {
        let coarse = (offset.clamp(-64, 63) as i16 + 64) as u16;
        coarse << 7
    }

    /// 14-bit bend value back to the coarse -64..63 offset
    pub fn pitch_from_14bit(value: u16) -> i8 {
        (((value >> 7) & 0x7F) as i16 - 64) as i8
    }
}

/// Space separated upper-case hex, for logs
pub fn format_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        let msg = MidiMessage::parse(&[0x90, 60, 100]).unwrap();
        assert_eq!(msg, MidiMessage::NoteOn { channel: 0, note: 60, velocity: 100 });
    }

    #[test]
    fn test_note_on_velocity_zero_kept() {
        let msg = MidiMessage::parse(&[0x93, 60, 0]).unwrap();
        assert_eq!(msg, MidiMessage::NoteOn { channel: 3, note: 60, velocity: 0 });
    }

    #[test]
    fn test_parse_masks_data_bytes() {
        let msg = MidiMessage::parse(&[0xB2, 0x87, 0xE4]).unwrap();
        assert_eq!(msg, MidiMessage::ControlChange { channel: 2, cc: 7, value: 100 });
    }

    #[test]
    fn test_system_messages() {
        let msg = MidiMessage::parse(&[0xF8, 0, 0, 0]).unwrap();
        assert_eq!(msg, MidiMessage::System { status: 0xF8, data: [0, 0] });
        assert_eq!(msg.encode(), vec![0xF8]);

        let msg = MidiMessage::parse(&[0xF2, 0x10, 0x02]).unwrap();
        assert_eq!(msg.encode(), vec![0xF2, 0x10, 0x02]);
        assert_eq!(MidiMessage::parse(&[0xF3]), None);
        assert_eq!(MidiMessage::parse(&[0xF7, 0, 0]), None);
    }

    #[test]
    fn test_pitch_bend() {
        let msg = MidiMessage::parse(&[0xE0, 0x00, 0x40]).unwrap();
        assert_eq!(msg, MidiMessage::PitchBend { channel: 0, value: 8192 });
    }

    #[test]
    fn test_truncated_and_unknown() {
        assert_eq!(MidiMessage::parse(&[]), None);
        assert_eq!(MidiMessage::parse(&[0x40, 1, 2]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 60]), None);
        assert_eq!(MidiMessage::parse(&[0xF0, 1, 2, 3]), None);
    }

    #[test]
    fn test_from_event() {
        let event = ActionEvent::new(0xC1, 5, 0, 0);
        assert_eq!(
            MidiMessage::from_event(&event),
            Some(MidiMessage::ProgramChange { channel: 1, program: 5 })
        );
        assert_eq!(MidiMessage::from_event(&ActionEvent::note_on(0, 60, 127)), None);
    }

    #[test]
    fn test_to_event() {
        let msg = MidiMessage::ControlChange { channel: 0, cc: 64, value: 127 };
        assert_eq!(msg.to_event().to_bytes(), [0xB0, 64, 127, 0]);
        let msg = MidiMessage::ProgramChange { channel: 9, program: 3 };
        assert_eq!(msg.to_event().to_bytes(), [0xC9, 3, 0, 0]);
    }

    #[test]
    fn test_encode_channel_messages() {
        let msg = MidiMessage::NoteOff { channel: 15, note: 60, velocity: 0 };
        assert_eq!(msg.encode(), vec![0x8F, 60, 0]);
        let msg = MidiMessage::ChannelPressure { channel: 1, pressure: 99 };
        assert_eq!(msg.encode(), vec![0xD1, 99]);
        let msg = MidiMessage::PitchBend { channel: 0, value: 8192 };
        assert_eq!(msg.encode(), vec![0xE0, 0x00, 0x40]);
    }

    #[test]
    fn test_pitch_conversion() {
        assert_eq!(convert::pitch_to_14bit(0), 8192);
        assert_eq!(convert::pitch_to_14bit(-64), 0);
        assert_eq!(convert::pitch_to_14bit(63), 127 << 7);
        assert_eq!(convert::pitch_from_14bit(8192), 0);
        assert_eq!(convert::pitch_from_14bit(0), -64);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x90, 0x3c, 0x7f]), "90 3C 7F");
    }
}
