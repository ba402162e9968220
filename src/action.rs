//! Action events and the value-op vocabulary
//!
//! An [`ActionEvent`] is the 4-byte unit that is bound to keys, logged by the
//! recorder and replayed by the player. Codes below `0x80` are logical
//! actions interpreted by the engine; codes at or above `0x80` are raw MIDI
//! status bytes whose data bytes follow in `arg1..arg3`.

use std::fmt;

/// Logical action codes (`ActionEvent::action`)
pub mod code {
    pub const SYSTEM: u8 = 0x00;
    pub const KEY_SIGNATURE: u8 = 0x01;
    pub const OCTAVE: u8 = 0x02;
    pub const VELOCITY: u8 = 0x03;
    pub const CHANNEL: u8 = 0x04;
    pub const VOLUME: u8 = 0x05;
    pub const PLAY: u8 = 0x06;
    pub const RECORD: u8 = 0x07;
    pub const STOP: u8 = 0x08;
    pub const SETTING_GROUP: u8 = 0x09;
    pub const SETTING_GROUP_COUNT: u8 = 0x0a;
    /// Only found in songs recorded before 1.8
    pub const AUTO_PEDAL_OBSOLETE: u8 = 0x0b;
    /// Only found in songs recorded before 1.8
    pub const DELAY_KEYUP_OBSOLETE: u8 = 0x0c;
    pub const TRANSPOSE: u8 = 0x0d;
    pub const CONTROLLER_DEPRECATED: u8 = 0x0e;

    pub const NOTE_OFF: u8 = 0x10;
    pub const NOTE_ON: u8 = 0x11;
    pub const NOTE_PRESSURE: u8 = 0x12;
    pub const PRESSURE: u8 = 0x13;
    pub const PITCH: u8 = 0x14;
    pub const PROGRAM: u8 = 0x15;
    pub const BANK_MSB: u8 = 0x16;
    pub const BANK_LSB: u8 = 0x17;
    pub const SUSTAIN: u8 = 0x18;

    /// First raw MIDI status byte
    pub const MIDI_START: u8 = 0x80;
    /// Marker used by the keymap text for verbatim hex events
    pub const RAW_MIDI: u8 = 0xFF;
}

/// Sub-codes of [`code::SYSTEM`] events (`arg1`)
pub mod system {
    /// `(SYSTEM, KEY_EVENT, key, down)`
    pub const KEY_EVENT: u8 = 0;
    /// `(SYSTEM, KEY_MAP, key, 0 = keydown | 1 = keyup)`: next event becomes a binding
    pub const KEY_MAP: u8 = 1;
    /// `(SYSTEM, KEY_LABEL, key, length)`: next events carry label bytes, 4 per event
    pub const KEY_LABEL: u8 = 2;
}

/// MIDI controller numbers that have a dedicated logical action
pub mod controller {
    pub const BANK_MSB: u8 = 0;
    pub const BANK_LSB: u8 = 32;
    pub const SUSTAIN: u8 = 64;
}

/// Controller id addressed by a controller-valued logical action
pub fn controller_id(action: u8) -> Option<u8> {
    match action {
        code::BANK_MSB => Some(controller::BANK_MSB),
        code::BANK_LSB => Some(controller::BANK_LSB),
        code::SUSTAIN => Some(controller::SUSTAIN),
        _ => None,
    }
}

/// The universal 4-byte event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActionEvent {
    pub action: u8,
    pub arg1: u8,
    pub arg2: u8,
    pub arg3: u8,
}

impl ActionEvent {
    pub const fn new(action: u8, arg1: u8, arg2: u8, arg3: u8) -> Self {
        Self { action, arg1, arg2, arg3 }
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        [self.action, self.arg1, self.arg2, self.arg3]
    }

    /// Big-endian packing used by the `$aabbccdd` hex literal
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.to_bytes())
    }

    pub const fn from_u32(value: u32) -> Self {
        Self::from_bytes(value.to_be_bytes())
    }

    pub const fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(code::NOTE_ON, channel, note, velocity)
    }

    pub const fn note_off(channel: u8, note: u8) -> Self {
        Self::new(code::NOTE_OFF, channel, note, 0)
    }

    /// `(action, channel, op, value)` layout used by per-channel actions
    pub const fn channel_op(action: u8, channel: u8, op: ValueOp, value: i8) -> Self {
        Self::new(action, channel, op.0, value as u8)
    }

    /// `(action, op, value, 0)` layout used by KeySignature, Volume and SettingGroup
    pub const fn global_op(action: u8, op: ValueOp, value: u8) -> Self {
        Self::new(action, op.0, value, 0)
    }

    pub const fn system(sub: u8, key: u8, arg: u8) -> Self {
        Self::new(code::SYSTEM, sub, key, arg)
    }

    /// True when `action` is a raw MIDI status byte
    pub const fn is_midi(&self) -> bool {
        self.action >= code::MIDI_START
    }

    /// True for Play/Record/Stop, which are never recorded
    pub const fn is_transport(&self) -> bool {
        matches!(self.action, code::PLAY | code::RECORD | code::STOP)
    }
}

impl fmt::Display for ActionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X} {:02X}",
            self.action, self.arg1, self.arg2, self.arg3
        )
    }
}

/// How a new value is derived from the current one
///
/// The low nibble selects the operation; bit `0x10` defers the change until
/// the next sync trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueOp(pub u8);

impl ValueOp {
    pub const SET: ValueOp = ValueOp(0x00);
    pub const INC: ValueOp = ValueOp(0x01);
    pub const DEC: ValueOp = ValueOp(0x02);
    pub const FLIP: ValueOp = ValueOp(0x03);
    pub const PRESS: ValueOp = ValueOp(0x04);
    pub const SET10: ValueOp = ValueOp(0x0a);
    pub const SET1: ValueOp = ValueOp(0x0b);
    pub const SYNC_FLAG: u8 = 0x10;

    pub const fn kind(self) -> u8 {
        self.0 & 0x0f
    }

    pub const fn is_sync(self) -> bool {
        self.0 & Self::SYNC_FLAG != 0
    }

    pub const fn is_press(self) -> bool {
        self.kind() == Self::PRESS.0
    }

    pub const fn without_sync(self) -> ValueOp {
        ValueOp(self.0 & !Self::SYNC_FLAG)
    }

    pub const fn with_sync(self) -> ValueOp {
        ValueOp(self.0 | Self::SYNC_FLAG)
    }

    /// Apply the operation to `value`; unknown kinds leave it unchanged
    pub fn apply(self, value: i32, change: i32) -> i32 {
        match self.kind() {
            0x00 => change,
            0x01 => value + change,
            0x02 => value - change,
            0x03 => change - value,
            0x04 => change,
            0x0a => change / 10 * 10 + value % 10,
            0x0b => value / 10 * 10 + change % 10,
            _ => value,
        }
    }
}

/// Clamp `value` into `[min, max]`
pub fn clamp_value(value: i32, min: i32, max: i32) -> i32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Edge wrap: below `min` jumps to `max`, above `max` jumps to `min`
pub fn wrap_value(value: i32, min: i32, max: i32) -> i32 {
    if value < min {
        max
    } else if value > max {
        min
    } else {
        value
    }
}

/// Cached 7-bit values above 127 mean "unset" and count as 0
pub fn default_value(value: i32) -> i32 {
    if !(-127..=127).contains(&value) {
        0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bytes() {
        let event = ActionEvent::note_on(0, 60, 127);
        assert_eq!(event.to_bytes(), [0x11, 0, 60, 127]);
        assert_eq!(ActionEvent::from_bytes(event.to_bytes()), event);
        assert_eq!(ActionEvent::from_u32(0x903c7f00).to_bytes(), [0x90, 0x3c, 0x7f, 0x00]);
        assert!(ActionEvent::new(0x90, 0, 0, 0).is_midi());
        assert!(!event.is_midi());
    }

    #[test]
    fn test_channel_op_layout() {
        let event = ActionEvent::channel_op(code::OCTAVE, 1, ValueOp::DEC, 1);
        assert_eq!(event.to_bytes(), [0x02, 1, 0x02, 1]);

        let event = ActionEvent::global_op(code::KEY_SIGNATURE, ValueOp::SET, (-3i8) as u8);
        assert_eq!(event.to_bytes(), [0x01, 0x00, 0xfd, 0x00]);
    }

    #[test]
    fn test_value_ops() {
        assert_eq!(ValueOp::SET.apply(5, 3), 3);
        assert_eq!(ValueOp::INC.apply(5, 3), 8);
        assert_eq!(ValueOp::DEC.apply(5, 3), 2);
        assert_eq!(ValueOp::FLIP.apply(0, 127), 127);
        assert_eq!(ValueOp::FLIP.apply(127, 127), 0);
        assert_eq!(ValueOp::PRESS.apply(10, 127), 127);
        assert_eq!(ValueOp::SET10.apply(42, 70), 72);
        assert_eq!(ValueOp::SET1.apply(42, 7), 47);
        assert_eq!(ValueOp(0x07).apply(42, 7), 42);
    }

    #[test]
    fn test_sync_flag() {
        let op = ValueOp::INC.with_sync();
        assert_eq!(op.0, 0x11);
        assert!(op.is_sync());
        assert_eq!(op.kind(), 0x01);
        assert_eq!(op.without_sync(), ValueOp::INC);
        assert!(ValueOp::PRESS.with_sync().is_press());
    }

    #[test]
    fn test_range_helpers() {
        assert_eq!(clamp_value(130, 0, 127), 127);
        assert_eq!(clamp_value(-3, 0, 127), 0);
        assert_eq!(wrap_value(2, -1, 1), -1);
        assert_eq!(wrap_value(-2, -1, 1), 1);
        assert_eq!(wrap_value(8, -4, 7), -4);
        assert_eq!(default_value(0xff), 0);
        assert_eq!(default_value(-5), -5);
    }

    #[test]
    fn test_controller_mapping() {
        assert_eq!(controller_id(code::SUSTAIN), Some(64));
        assert_eq!(controller_id(code::BANK_LSB), Some(32));
        assert_eq!(controller_id(code::PROGRAM), None);
    }
}
