//! Name tables for keymap tokens
//!
//! Tables are ordered: lookups by name take the first case-insensitive match
//! and lookups by value return the first entry, so the canonical name of a
//! value is listed before its aliases.

use std::sync::OnceLock;

use crate::action::{code, ValueOp};

pub type NameTable = [(&'static str, u8)];

/// Value for `token` in `table`
pub fn lookup<S: AsRef<str>>(table: &[(S, u8)], token: &str) -> Option<u8> {
    table
        .iter()
        .find(|(name, _)| name.as_ref().eq_ignore_ascii_case(token))
        .map(|(_, value)| *value)
}

/// Canonical name of `value` in `table`
pub fn name_of<S: AsRef<str>>(table: &[(S, u8)], value: u8) -> Option<&str> {
    table
        .iter()
        .find(|(_, v)| *v == value)
        .map(|(name, _)| name.as_ref())
}

/// DirectInput scan codes
pub static KEYS: &NameTable = &[
    ("Esc", 0x01),
    ("1", 0x02),
    ("2", 0x03),
    ("3", 0x04),
    ("4", 0x05),
    ("5", 0x06),
    ("6", 0x07),
    ("7", 0x08),
    ("8", 0x09),
    ("9", 0x0A),
    ("0", 0x0B),
    ("Minus", 0x0C),
    ("Equals", 0x0D),
    ("Backspace", 0x0E),
    ("Tab", 0x0F),
    ("Q", 0x10),
    ("W", 0x11),
    ("E", 0x12),
    ("R", 0x13),
    ("T", 0x14),
    ("Y", 0x15),
    ("U", 0x16),
    ("I", 0x17),
    ("O", 0x18),
    ("P", 0x19),
    ("LeftBracket", 0x1A),
    ("RightBracket", 0x1B),
    ("Enter", 0x1C),
    ("Ctrl", 0x1D),
    ("A", 0x1E),
    ("S", 0x1F),
    ("D", 0x20),
    ("F", 0x21),
    ("G", 0x22),
    ("H", 0x23),
    ("J", 0x24),
    ("K", 0x25),
    ("L", 0x26),
    ("Semicolon", 0x27),
    ("Apostrophe", 0x28),
    ("Grave", 0x29),
    ("Shift", 0x2A),
    ("Backslash", 0x2B),
    ("Z", 0x2C),
    ("X", 0x2D),
    ("C", 0x2E),
    ("V", 0x2F),
    ("B", 0x30),
    ("N", 0x31),
    ("M", 0x32),
    ("Comma", 0x33),
    ("Period", 0x34),
    ("Slash", 0x35),
    ("RightShift", 0x36),
    ("NumMultiply", 0x37),
    ("Alt", 0x38),
    ("Space", 0x39),
    ("CapsLock", 0x3A),
    ("F1", 0x3B),
    ("F2", 0x3C),
    ("F3", 0x3D),
    ("F4", 0x3E),
    ("F5", 0x3F),
    ("F6", 0x40),
    ("F7", 0x41),
    ("F8", 0x42),
    ("F9", 0x43),
    ("F10", 0x44),
    ("NumLock", 0x45),
    ("ScrollLock", 0x46),
    ("Num7", 0x47),
    ("Num8", 0x48),
    ("Num9", 0x49),
    ("NumSubtract", 0x4A),
    ("Num4", 0x4B),
    ("Num5", 0x4C),
    ("Num6", 0x4D),
    ("NumAdd", 0x4E),
    ("Num1", 0x4F),
    ("Num2", 0x50),
    ("Num3", 0x51),
    ("Num0", 0x52),
    ("NumDecimal", 0x53),
    ("F11", 0x57),
    ("F12", 0x58),
    ("NumEnter", 0x9C),
    ("RightCtrl", 0x9D),
    ("NumDivide", 0xB5),
    ("PrintScreen", 0xB7),
    ("RightAlt", 0xB8),
    ("Pause", 0xC5),
    ("Home", 0xC7),
    ("Up", 0xC8),
    ("PageUp", 0xC9),
    ("Left", 0xCB),
    ("Right", 0xCD),
    ("End", 0xCF),
    ("Down", 0xD0),
    ("PageDown", 0xD1),
    ("Insert", 0xD2),
    ("Delete", 0xD3),
    ("Win", 0xDB),
    ("RightWin", 0xDC),
    ("Apps", 0xDD),
    ("Power", 0xDE),
    ("Sleep", 0xDF),
    ("Wake", 0xE3),
    // aliases
    ("Escape", 0x01),
    ("Back", 0x0E),
    ("Return", 0x1C),
    ("LeftCtrl", 0x1D),
    ("LeftShift", 0x2A),
    ("LeftAlt", 0x38),
    ("Caps", 0x3A),
    ("SysRq", 0xB7),
    ("PgUp", 0xC9),
    ("PgDn", 0xD1),
    ("Ins", 0xD2),
    ("Del", 0xD3),
    ("LeftWin", 0xDB),
    ("Menu", 0xDD),
];

/// General MIDI controller numbers
pub static CONTROLLERS: &NameTable = &[
    ("BankSelect", 0x00),
    ("Modulation", 0x01),
    ("BreathControl", 0x02),
    ("FootPedal", 0x04),
    ("Portamento", 0x05),
    ("DataEntry", 0x06),
    ("MainVolume", 0x07),
    ("Balance", 0x08),
    ("Pan", 0x0A),
    ("Expression", 0x0B),
    ("EffectSelector1", 0x0C),
    ("EffectSelector2", 0x0D),
    ("GeneralPurpose1", 0x10),
    ("GeneralPurpose2", 0x11),
    ("GeneralPurpose3", 0x12),
    ("GeneralPurpose4", 0x13),
    ("SustainPedal", 0x40),
    ("PortamentoPedal", 0x41),
    ("SostenutoPedal", 0x42),
    ("SoftPedal", 0x43),
    ("LegatoPedal", 0x44),
    ("Hold2", 0x45),
    ("SoundController1", 0x46),
    ("SoundController2", 0x47),
    ("SoundController3", 0x48),
    ("SoundController4", 0x49),
    ("SoundController5", 0x4A),
    ("SoundController6", 0x4B),
    ("SoundController7", 0x4C),
    ("SoundController8", 0x4D),
    ("SoundController9", 0x4E),
    ("SoundController10", 0x4F),
    ("DataIncrement", 0x60),
    ("DataDecrement", 0x61),
    ("NRPNLSB", 0x62),
    ("NRPNMSB", 0x63),
    ("RPNLSB", 0x64),
    ("RPNMSB", 0x65),
    ("AllSoundsOff", 0x78),
    ("ResetAllControllers", 0x79),
    ("LocalControlOnOff", 0x7A),
    ("AllNotesOff", 0x7B),
    ("OmniModeOff", 0x7C),
    ("OmniModeOn", 0x7D),
    ("MonoModeOn", 0x7E),
    ("PolyModeOn", 0x7F),
];

/// Channel names; `Left`/`Right` are the two hands of a split keyboard
pub static CHANNELS: &NameTable = &[
    ("Ch_0", 0),
    ("Ch_1", 1),
    ("Ch_2", 2),
    ("Ch_3", 3),
    ("Ch_4", 4),
    ("Ch_5", 5),
    ("Ch_6", 6),
    ("Ch_7", 7),
    ("Ch_8", 8),
    ("Ch_9", 9),
    ("Ch_10", 10),
    ("Ch_11", 11),
    ("Ch_12", 12),
    ("Ch_13", 13),
    ("Ch_14", 14),
    ("Ch_15", 15),
    ("Left", 0),
    ("Right", 1),
];

pub static OPS: &NameTable = &[
    ("Set", ValueOp::SET.0),
    ("Inc", ValueOp::INC.0),
    ("Dec", ValueOp::DEC.0),
    ("Flip", ValueOp::FLIP.0),
    ("Press", ValueOp::PRESS.0),
    ("Set10", ValueOp::SET10.0),
    ("Set1", ValueOp::SET1.0),
    ("SyncSet", ValueOp::SET.0 | ValueOp::SYNC_FLAG),
    ("SyncInc", ValueOp::INC.0 | ValueOp::SYNC_FLAG),
    ("SyncDec", ValueOp::DEC.0 | ValueOp::SYNC_FLAG),
    ("SyncFlip", ValueOp::FLIP.0 | ValueOp::SYNC_FLAG),
    ("SyncPress", ValueOp::PRESS.0 | ValueOp::SYNC_FLAG),
    ("SyncSet10", ValueOp::SET10.0 | ValueOp::SYNC_FLAG),
    ("SyncSet1", ValueOp::SET1.0 | ValueOp::SYNC_FLAG),
];

/// Event keywords that map directly onto an action code
pub static ACTIONS: &NameTable = &[
    ("Note", code::NOTE_ON),
    ("NoteOff", code::NOTE_OFF),
    ("NotePressure", code::NOTE_PRESSURE),
    ("Pressure", code::PRESSURE),
    ("Pitch", code::PITCH),
    ("Program", code::PROGRAM),
    ("BankMSB", code::BANK_MSB),
    ("BankLSB", code::BANK_LSB),
    ("Sustain", code::SUSTAIN),
    ("Octshift", code::OCTAVE),
    ("Transpose", code::TRANSPOSE),
    ("Velocity", code::VELOCITY),
    ("Channel", code::CHANNEL),
    ("KeySignature", code::KEY_SIGNATURE),
    ("Volume", code::VOLUME),
    ("Group", code::SETTING_GROUP),
    ("GroupCount", code::SETTING_GROUP_COUNT),
    ("Play", code::PLAY),
    ("Record", code::RECORD),
    ("Stop", code::STOP),
    ("NoteOn", code::NOTE_ON),
    ("Octave", code::OCTAVE),
];

const PITCH_CLASSES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Highest note number with a name (`G#10`)
pub const NOTE_MAX: u8 = 140;

/// Note names from `C-1` (0) to `G#10` (140); `C4` is 60
pub fn notes() -> &'static [(String, u8)] {
    static NOTES: OnceLock<Vec<(String, u8)>> = OnceLock::new();
    NOTES.get_or_init(|| {
        (0..=NOTE_MAX)
            .map(|n| {
                let octave = n as i32 / 12 - 1;
                (format!("{}{}", PITCH_CLASSES[n as usize % 12], octave), n)
            })
            .collect()
    })
}

pub fn key_code(name: &str) -> Option<u8> {
    lookup(KEYS, name)
}

pub fn key_name(code: u8) -> Option<&'static str> {
    name_of(KEYS, code)
}

pub fn note_code(name: &str) -> Option<u8> {
    lookup(notes(), name)
}

pub fn note_name(note: u8) -> Option<&'static str> {
    name_of(notes(), note)
}

pub fn controller_name(id: u8) -> Option<&'static str> {
    name_of(CONTROLLERS, id)
}

pub fn op_name(op: u8) -> Option<&'static str> {
    name_of(OPS, op)
}

pub fn action_name(action: u8) -> Option<&'static str> {
    name_of(ACTIONS, action)
}

pub fn channel_name(channel: u8) -> Option<&'static str> {
    name_of(CHANNELS, channel)
}
