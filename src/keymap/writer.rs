//! Binding store to keymap text

use super::names::{action_name, channel_name, controller_name, key_name, note_name, op_name};
use super::parser::parse_event;
use crate::action::{code, ActionEvent};
use crate::store::{BindingStore, SettingsGroup, DEFAULT_VELOCITY};
use crate::version::Version;

const EOL: &str = "\r\n";

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str(EOL);
}

fn key_text(key: u8) -> String {
    key_name(key).map(str::to_string).unwrap_or_else(|| format!("${:02X}", key))
}

fn channel_text(ch: u8) -> String {
    channel_name(ch).map(str::to_string).unwrap_or_else(|| ch.to_string())
}

fn note_text(note: u8) -> String {
    note_name(note).map(str::to_string).unwrap_or_else(|| note.to_string())
}

/// Named form of an event; may not parse back to the same bytes
fn typed_event(event: &ActionEvent) -> Option<String> {
    let ActionEvent { action, arg1, arg2, arg3 } = *event;

    if action & 0xF0 == 0xB0 {
        let id = controller_name(arg1).map(str::to_string).unwrap_or_else(|| arg1.to_string());
        return Some(format!("Controller {} {} {}", channel_text(action & 0x0F), id, arg2));
    }

    let name = action_name(action)?;
    let text = match action {
        code::NOTE_ON | code::NOTE_OFF | code::NOTE_PRESSURE => {
            let default = if action == code::NOTE_OFF { 0 } else { DEFAULT_VELOCITY };
            let mut text = format!("{} {} {}", name, channel_text(arg1), note_text(arg2));
            if arg3 != default {
                text.push_str(&format!(" {}", arg3));
            }
            text
        }
        code::CHANNEL => {
            let value = if arg3 < 16 { channel_text(arg3) } else { arg3.to_string() };
            format!("{} {} {} {}", name, channel_text(arg1), op_name(arg2)?, value)
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
            format!("{} {} {} {}", name, channel_text(arg1), op_name(arg2)?, arg3 as i8)
        }
        code::KEY_SIGNATURE | code::SETTING_GROUP => {
            format!("{} {} {}", name, op_name(arg1)?, arg2 as i8)
        }
        code::VOLUME => format!("{} {} {}", name, op_name(arg1)?, arg2),
        code::SETTING_GROUP_COUNT => format!("{} {}", name, arg1),
        _ => name.to_string(),
    };
    Some(text)
}

/// Text for one event at the current version
///
/// The named form is used only when it parses back to identical bytes;
/// anything else is written as a `Midi $aabbccdd` literal.
pub fn format_event(event: &ActionEvent) -> String {
    typed_event(event)
        .filter(|text| parse_event(text, Version::CURRENT) == Some(*event))
        .unwrap_or_else(|| format!("Midi ${}", hex::encode(event.to_bytes())))
}

fn write_group(out: &mut String, group: &SettingsGroup) {
    if group.key_signature != 0 {
        push_line(out, &format!("KeySignature {}", group.key_signature));
    }

    for (ch, params) in group.channels.iter().enumerate() {
        let ch_text = channel_text(ch as u8);
        if params.octave != 0 {
            push_line(out, &format!("Octshift {} {}", ch_text, params.octave));
        }
        if params.transpose != 0 {
            push_line(out, &format!("Transpose {} {}", ch_text, params.transpose));
        }
        if params.velocity != DEFAULT_VELOCITY {
            push_line(out, &format!("Velocity {} {}", ch_text, params.velocity));
        }
        if params.channel != 0 {
            push_line(out, &format!("Channel {} {}", ch_text, channel_text(params.channel)));
        }
        if let Some(program) = params.program {
            push_line(out, &format!("Program {} {}", ch_text, program));
        }
        for (id, value) in params.controllers.iter().enumerate() {
            if let Some(value) = value {
                let id = id as u8;
                let name = controller_name(id).map(str::to_string).unwrap_or_else(|| id.to_string());
                push_line(out, &format!("Controller {} {} {}", ch_text, name, value));
            }
        }
    }

    for (key, binding) in group.keys.iter().enumerate() {
        let key = key_text(key as u8);
        for event in &binding.keydown {
            push_line(out, &format!("Keydown {:<12} {}", key, format_event(event)));
        }
        for event in &binding.keyup {
            push_line(out, &format!("Keyup   {:<12} {}", key, format_event(event)));
        }
        if let Some(label) = &binding.label {
            push_line(out, &format!("Label   {:<12} {}", key, label));
        }
    }
}

/// Serialize the whole store, every group included
pub fn serialize(store: &BindingStore) -> String {
    let mut out = String::new();
    push_line(&mut out, &format!("FreePiano {}", Version::CURRENT));
    push_line(&mut out, &format!("GroupCount {}", store.group_count()));

    for (index, group) in store.groups().iter().enumerate() {
        out.push_str(EOL);
        push_line(&mut out, &format!("Group {}", index));
        write_group(&mut out, group);
    }

    if store.current_group() + 1 != store.group_count() {
        out.push_str(EOL);
        push_line(&mut out, &format!("Group {}", store.current_group()));
    }
    out
}
