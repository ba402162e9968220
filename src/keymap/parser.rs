//! Keymap text to binding-store mutations
//!
//! Lines that do not match a known form are skipped and reported; a bad line
//! never aborts the document.

use tracing::debug;

use super::cursor::Cursor;
use super::names::{self, ACTIONS, CHANNELS, CONTROLLERS, KEYS, OPS};
use crate::action::{code, controller, ActionEvent, ValueOp};
use crate::store::BindingStore;
use crate::version::Version;

/// Outcome of parsing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    /// Version declared by the last `FreePiano` line
    pub version: Version,
    /// Non-blank, non-comment lines seen
    pub lines: usize,
    pub applied: usize,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub text: String,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Parse a document into a fresh store
pub fn parse(text: &str) -> (BindingStore, ParseReport) {
    let mut store = BindingStore::new();
    let report = parse_into(&mut store, text);
    (store, report)
}

/// Apply every line of `text` to `store`
pub fn parse_into(store: &mut BindingStore, text: &str) -> ParseReport {
    let mut report = ParseReport {
        version: Version::OLDEST,
        lines: 0,
        applied: 0,
        skipped: Vec::new(),
    };

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        report.lines += 1;

        if apply_line(store, &mut report.version, line).is_some() {
            report.applied += 1;
        } else {
            debug!("keymap line {} skipped: {}", index + 1, line);
            report.skipped.push(SkippedLine { line: index + 1, text: line.to_string() });
        }
    }

    report
}

/// Parse a single event such as `Note Ch_0 C4 127` at `version`
pub fn parse_event(text: &str, version: Version) -> Option<ActionEvent> {
    event(&mut Cursor::new(text), version)
}

/// `-128..=255` fits an event byte
fn byte(value: i32) -> Option<u8> {
    (-128..=255).contains(&value).then_some(value as u8)
}

fn key_arg(c: &mut Cursor) -> Option<u8> {
    u8::try_from(c.value(KEYS)?).ok()
}

fn channel_arg(c: &mut Cursor) -> Option<u8> {
    let ch = c.value(CHANNELS)?;
    (0..16).contains(&ch).then_some(ch as u8)
}

/// Optional op token; absent means `Set`
fn op_arg(c: &mut Cursor) -> ValueOp {
    c.name(OPS).map(ValueOp).unwrap_or(ValueOp::SET)
}

fn note_arg(c: &mut Cursor, version: Version) -> Option<u8> {
    if let Some(note) = c.name(names::notes()) {
        // before 1.7 note names sat one octave lower
        return Some(if version < Version::V1_7 { note.saturating_sub(12) } else { note });
    }
    byte(c.number()?)
}

fn apply_line(store: &mut BindingStore, version: &mut Version, line: &str) -> Option<()> {
    let mut c = Cursor::new(line);
    let keyword = c.token()?.to_ascii_lowercase();

    match keyword.as_str() {
        "freepiano" => *version = c.token()?.parse().ok()?,
        "key" | "keydown" => {
            let key = key_arg(&mut c)?;
            let event = event(&mut c, *version)?;
            store.add_keydown(key, event);
        }
        "keyup" => {
            let key = key_arg(&mut c)?;
            let event = event(&mut c, *version)?;
            store.add_keyup(key, event);
        }
        "label" => {
            let key = key_arg(&mut c)?;
            store.set_label(key, c.rest_of_line());
        }
        "octshift" => {
            let ch = channel_arg(&mut c)?;
            store.set_octave(ch, c.number()?);
        }
        "transpose" => {
            let ch = channel_arg(&mut c)?;
            store.set_transpose(ch, c.number()?);
        }
        "velocity" => {
            let ch = channel_arg(&mut c)?;
            store.set_velocity(ch, c.number()?);
        }
        "channel" => {
            let ch = channel_arg(&mut c)?;
            store.set_output_channel(ch, c.value(CHANNELS)?);
        }
        "keysignature" => store.set_key_signature(c.number()?),
        "group" => store.set_current_group(c.number()?.max(0) as usize),
        "groupcount" => store.set_group_count(c.number()?.max(0) as usize),
        "program" => {
            let ch = channel_arg(&mut c)?;
            let value = c.number()?;
            store.set_program(ch, value.clamp(0, 255) as u8);
        }
        "controller" => {
            let ch = channel_arg(&mut c)?;
            let id = u8::try_from(c.value(CONTROLLERS)?).ok().filter(|id| *id < 128)?;
            let value = c.number()?;
            store.set_controller(ch, id, value.clamp(0, 255) as u8);
        }
        _ => return None,
    }
    Some(())
}

/// `$aabbccdd`
fn hex_literal(token: &str) -> Option<ActionEvent> {
    let digits = token.strip_prefix('$')?;
    if digits.len() != 8 {
        return None;
    }
    let bytes: [u8; 4] = hex::decode(digits).ok()?.try_into().ok()?;
    Some(ActionEvent::from_bytes(bytes))
}

/// `Midi $aabbccdd` or `Midi aa bb cc dd`
fn raw_event(c: &mut Cursor) -> Option<ActionEvent> {
    let first = c.token()?;
    if let Some(event) = hex_literal(first) {
        return Some(event);
    }
    let hex_byte = |token: &str| {
        (token.len() <= 2).then(|| u8::from_str_radix(token, 16).ok()).flatten()
    };
    let a = hex_byte(first)?;
    let b = hex_byte(c.token()?)?;
    let cc = hex_byte(c.token()?)?;
    let d = hex_byte(c.token()?)?;
    Some(ActionEvent::new(a, b, cc, d))
}

/// `Controller <ch> <controller> <value>`
///
/// From 1.8 on this is a raw control change. Older documents put an op
/// after the value; the sustain pedal becomes a `Sustain` action and any
/// other controller only supports `Set`.
fn controller_event(c: &mut Cursor, version: Version) -> Option<ActionEvent> {
    let ch = channel_arg(c)?;
    let id = u8::try_from(c.value(CONTROLLERS)?).ok().filter(|id| *id < 128)?;
    let value = byte(c.number()?)?;

    if version >= Version::V1_8 {
        return Some(ActionEvent::new(0xB0 | ch, id, value, 0));
    }

    let op = op_arg(c);
    if id == controller::SUSTAIN {
        let value = if op.kind() == ValueOp::FLIP.0 { 127 } else { value };
        return Some(ActionEvent::new(code::SUSTAIN, ch, op.0, value));
    }
    (op == ValueOp::SET).then_some(ActionEvent::new(0xB0 | ch, id, value, 0))
}

fn event(c: &mut Cursor, version: Version) -> Option<ActionEvent> {
    if c.word("Midi") {
        return raw_event(c);
    }
    if c.word("Controller") {
        return controller_event(c, version);
    }
    if let Some(event) = c.peek().and_then(hex_literal) {
        c.token();
        return Some(event);
    }

    let action = c.name(ACTIONS)?;
    match action {
        code::NOTE_ON | code::NOTE_OFF | code::NOTE_PRESSURE => {
            let ch = channel_arg(c)?;
            let note = note_arg(c, version)?;
            let default = if action == code::NOTE_OFF { 0 } else { 127 };
            let velocity = match c.number() {
                Some(v) => byte(v)?,
                None => default,
            };
            Some(ActionEvent::new(action, ch, note, velocity))
        }
        code::PROGRAM if version < Version::V1_8 => {
            let ch = channel_arg(c)?;
            let value = byte(c.number()?)?;
            let op = op_arg(c);
            Some(ActionEvent::new(action, ch, op.0, value))
        }
        code::PRESSURE
        | code::PITCH
        | code::PROGRAM
        | code::BANK_MSB
        | code::BANK_LSB
        | code::SUSTAIN
        | code::OCTAVE
        | code::TRANSPOSE
        | code::VELOCITY => {
            let ch = channel_arg(c)?;
            let op = op_arg(c);
            let value = byte(c.number()?)?;
            Some(ActionEvent::new(action, ch, op.0, value))
        }
        code::CHANNEL => {
            let ch = channel_arg(c)?;
            let op = op_arg(c);
            let value = byte(c.value(CHANNELS)?)?;
            Some(ActionEvent::new(action, ch, op.0, value))
        }
        code::KEY_SIGNATURE | code::VOLUME | code::SETTING_GROUP => {
            let op = op_arg(c);
            let value = byte(c.number()?)?;
            Some(ActionEvent::global_op(action, op, value))
        }
        code::SETTING_GROUP_COUNT => {
            let count = byte(c.number()?)?;
            Some(ActionEvent::new(action, count, 0, 0))
        }
        code::PLAY | code::RECORD | code::STOP => Some(ActionEvent::new(action, 0, 0, 0)),
        _ => None,
    }
}
