//! Binding store
//!
//! Holds every settings group: per-key keydown/keyup bindings and labels,
//! per-channel performance parameters and the program/controller cache.
//! Exactly one group is current; all getters and setters address it.

use crate::action::{clamp_value, wrap_value, ActionEvent};
use crate::midi::MidiMessage;

/// Upper bound on the number of settings groups
pub const MAX_GROUPS: usize = 256;
/// Physical key codes are bytes
pub const KEY_COUNT: usize = 256;
pub const CHANNEL_COUNT: usize = 16;
pub const CONTROLLER_COUNT: usize = 128;
/// Longest label kept, in UTF-8 bytes
pub const LABEL_MAX_BYTES: usize = 15;

pub const OCTAVE_RANGE: (i32, i32) = (-1, 1);
pub const TRANSPOSE_RANGE: (i32, i32) = (-64, 64);
pub const VELOCITY_RANGE: (i32, i32) = (0, 127);
pub const CHANNEL_RANGE: (i32, i32) = (0, 15);
pub const KEY_SIGNATURE_RANGE: (i32, i32) = (-4, 7);

pub const DEFAULT_VELOCITY: u8 = 127;

/// Performance parameters of one input channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelParams {
    pub octave: i8,
    pub transpose: i8,
    pub velocity: u8,
    /// Output channel remap
    pub channel: u8,
    pub program: Option<u8>,
    pub controllers: [Option<u8>; CONTROLLER_COUNT],
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            octave: 0,
            transpose: 0,
            velocity: DEFAULT_VELOCITY,
            channel: 0,
            program: None,
            controllers: [None; CONTROLLER_COUNT],
        }
    }
}

/// Bindings attached to one physical key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBinding {
    pub keydown: Vec<ActionEvent>,
    pub keyup: Vec<ActionEvent>,
    pub label: Option<String>,
}

impl KeyBinding {
    pub fn is_empty(&self) -> bool {
        self.keydown.is_empty() && self.keyup.is_empty() && self.label.is_none()
    }
}

/// One complete snapshot of channel parameters and key bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsGroup {
    pub key_signature: i8,
    pub channels: [ChannelParams; CHANNEL_COUNT],
    pub keys: Vec<KeyBinding>,
}

impl Default for SettingsGroup {
    fn default() -> Self {
        Self {
            key_signature: 0,
            channels: std::array::from_fn(|_| ChannelParams::default()),
            keys: vec![KeyBinding::default(); KEY_COUNT],
        }
    }
}

/// All settings groups plus the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingStore {
    groups: Vec<SettingsGroup>,
    current: usize,
}

impl Default for BindingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ch_index(ch: u8) -> usize {
    (ch & 0x0F) as usize
}

/// Trim, cut at the first line break and cap at [`LABEL_MAX_BYTES`]
fn normalize_label(text: &str) -> Option<String> {
    let line = text.split(['\r', '\n']).next().unwrap_or("").trim();
    let mut end = line.len().min(LABEL_MAX_BYTES);
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    let label = line[..end].trim_end();
    (!label.is_empty()).then(|| label.to_string())
}

impl BindingStore {
    /// A store with a single cleared group
    pub fn new() -> Self {
        Self { groups: vec![SettingsGroup::default()], current: 0 }
    }

    fn group(&self) -> &SettingsGroup {
        &self.groups[self.current]
    }

    fn group_mut(&mut self) -> &mut SettingsGroup {
        &mut self.groups[self.current]
    }

    fn channel(&self, ch: u8) -> &ChannelParams {
        &self.group().channels[ch_index(ch)]
    }

    fn channel_mut(&mut self, ch: u8) -> &mut ChannelParams {
        &mut self.group_mut().channels[ch_index(ch)]
    }

    pub fn groups(&self) -> &[SettingsGroup] {
        &self.groups
    }

    // ---------------------------------------------------------------------
    // Key bindings
    // ---------------------------------------------------------------------

    pub fn keydown(&self, key: u8) -> &[ActionEvent] {
        &self.group().keys[key as usize].keydown
    }

    pub fn keyup(&self, key: u8) -> &[ActionEvent] {
        &self.group().keys[key as usize].keyup
    }

    /// Append a keydown binding; action 0 is ignored
    pub fn add_keydown(&mut self, key: u8, event: ActionEvent) {
        if event.action != 0 {
            self.group_mut().keys[key as usize].keydown.push(event);
        }
    }

    /// Append a keyup binding; action 0 is ignored
    pub fn add_keyup(&mut self, key: u8, event: ActionEvent) {
        if event.action != 0 {
            self.group_mut().keys[key as usize].keyup.push(event);
        }
    }

    pub fn clear_keydown(&mut self, key: u8) {
        self.group_mut().keys[key as usize].keydown.clear();
    }

    pub fn clear_keyup(&mut self, key: u8) {
        self.group_mut().keys[key as usize].keyup.clear();
    }

    pub fn label(&self, key: u8) -> Option<&str> {
        self.group().keys[key as usize].label.as_deref()
    }

    /// Set a key label; text after a line break is dropped and an empty
    /// result removes the label
    pub fn set_label(&mut self, key: u8, text: &str) {
        self.group_mut().keys[key as usize].label = normalize_label(text);
    }

    pub fn binding(&self, key: u8) -> &KeyBinding {
        &self.group().keys[key as usize]
    }

    // ---------------------------------------------------------------------
    // Channel parameters
    // ---------------------------------------------------------------------

    pub fn octave(&self, ch: u8) -> i8 {
        self.channel(ch).octave
    }

    /// Wraps into -1..=1
    pub fn set_octave(&mut self, ch: u8, value: i32) {
        let (min, max) = OCTAVE_RANGE;
        self.channel_mut(ch).octave = wrap_value(value, min, max) as i8;
    }

    pub fn transpose(&self, ch: u8) -> i8 {
        self.channel(ch).transpose
    }

    /// Clamps into -64..=64
    pub fn set_transpose(&mut self, ch: u8, value: i32) {
        let (min, max) = TRANSPOSE_RANGE;
        self.channel_mut(ch).transpose = clamp_value(value, min, max) as i8;
    }

    pub fn velocity(&self, ch: u8) -> u8 {
        self.channel(ch).velocity
    }

    /// Clamps into 0..=127
    pub fn set_velocity(&mut self, ch: u8, value: i32) {
        let (min, max) = VELOCITY_RANGE;
        self.channel_mut(ch).velocity = clamp_value(value, min, max) as u8;
    }

    /// Output channel the input channel is remapped to
    pub fn output_channel(&self, ch: u8) -> u8 {
        self.channel(ch).channel
    }

    /// Clamps into 0..=15
    pub fn set_output_channel(&mut self, ch: u8, value: i32) {
        let (min, max) = CHANNEL_RANGE;
        self.channel_mut(ch).channel = clamp_value(value, min, max) as u8;
    }

    pub fn key_signature(&self) -> i8 {
        self.group().key_signature
    }

    /// Wraps into -4..=7
    pub fn set_key_signature(&mut self, value: i32) {
        let (min, max) = KEY_SIGNATURE_RANGE;
        self.group_mut().key_signature = wrap_value(value, min, max) as i8;
    }

    pub fn program(&self, ch: u8) -> Option<u8> {
        self.channel(ch).program
    }

    /// Values of 128 and above mark the program as unset
    pub fn set_program(&mut self, ch: u8, value: u8) {
        self.channel_mut(ch).program = (value < 128).then_some(value);
    }

    pub fn controller(&self, ch: u8, id: u8) -> Option<u8> {
        self.channel(ch).controllers[(id & 0x7F) as usize]
    }

    /// Values of 128 and above mark the controller as unset
    pub fn set_controller(&mut self, ch: u8, id: u8, value: u8) {
        self.channel_mut(ch).controllers[(id & 0x7F) as usize] = (value < 128).then_some(value);
    }

    // ---------------------------------------------------------------------
    // Settings groups
    // ---------------------------------------------------------------------

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn current_group(&self) -> usize {
        self.current
    }

    /// Change the current group without touching the instrument
    pub fn set_current_group(&mut self, id: usize) {
        self.current = id.min(self.groups.len() - 1);
    }

    /// Change the current group and return the messages that bring the
    /// instrument in line with its cached programs and controllers
    pub fn select_group(&mut self, id: usize) -> Vec<MidiMessage> {
        self.set_current_group(id);
        self.resync_messages()
    }

    /// Program and controller messages for every cached value of the
    /// current group
    ///
    /// The cache is indexed by output channel; no remap is applied here.
    pub fn resync_messages(&self) -> Vec<MidiMessage> {
        let mut messages = Vec::new();
        for (ch, params) in self.group().channels.iter().enumerate() {
            let channel = ch as u8;
            if let Some(program) = params.program {
                messages.push(MidiMessage::ProgramChange { channel, program });
            }
            for (cc, value) in params.controllers.iter().enumerate() {
                if let Some(value) = *value {
                    messages.push(MidiMessage::ControlChange { channel, cc: cc as u8, value });
                }
            }
        }
        messages
    }

    /// Resize to `count` groups, clamped to `1..=MAX_GROUPS`; new groups start cleared
    pub fn set_group_count(&mut self, count: usize) {
        let count = count.clamp(1, MAX_GROUPS);
        self.groups.resize_with(count, SettingsGroup::default);
        self.set_current_group(self.current);
    }

    /// Insert a cleared group before `position`; no-op when full
    pub fn insert_group(&mut self, position: usize) -> Vec<MidiMessage> {
        if self.groups.len() >= MAX_GROUPS {
            return Vec::new();
        }
        let position = position.min(self.groups.len());
        self.groups.insert(position, SettingsGroup::default());
        self.select_group(self.current)
    }

    /// Remove a group; the last remaining group is cleared instead
    pub fn delete_group(&mut self, id: usize) -> Vec<MidiMessage> {
        if id >= self.groups.len() {
            return Vec::new();
        }
        if self.groups.len() == 1 {
            self.groups[0] = SettingsGroup::default();
        } else {
            self.groups.remove(id);
        }
        self.select_group(self.current)
    }

    /// Duplicate a group directly after itself; no-op when full
    pub fn copy_group(&mut self, id: usize) -> Vec<MidiMessage> {
        if self.groups.len() >= MAX_GROUPS || id >= self.groups.len() {
            return Vec::new();
        }
        let copy = self.groups[id].clone();
        self.groups.insert(id + 1, copy);
        self.select_group(self.current)
    }

    /// Clear the current group
    pub fn clear(&mut self) {
        *self.group_mut() = SettingsGroup::default();
    }

    /// Back to a single cleared group
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{code, ValueOp};
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let store = BindingStore::new();
        assert_eq!(store.group_count(), 1);
        assert_eq!(store.current_group(), 0);
        assert_eq!(store.velocity(0), 127);
        assert_eq!(store.octave(3), 0);
        assert_eq!(store.program(0), None);
        assert_eq!(store.controller(0, 64), None);
        assert!(store.keydown(0x1e).is_empty());
    }

    #[test]
    fn test_bindings_allow_duplicates() {
        let mut store = BindingStore::new();
        let note = ActionEvent::note_on(0, 60, 127);
        store.add_keydown(0x1e, note);
        store.add_keydown(0x1e, note);
        store.add_keyup(0x1e, ActionEvent::note_off(0, 60));
        store.add_keydown(0x1e, ActionEvent::new(0, 1, 2, 3));

        assert_eq!(store.keydown(0x1e), &[note, note]);
        assert_eq!(store.keyup(0x1e).len(), 1);

        store.clear_keydown(0x1e);
        assert!(store.keydown(0x1e).is_empty());
        assert_eq!(store.keyup(0x1e).len(), 1);
        store.clear_keyup(0x1e);
        assert!(store.binding(0x1e).is_empty());
    }

    #[test]
    fn test_labels() {
        let mut store = BindingStore::new();
        store.set_label(1, "  Esc  ");
        assert_eq!(store.label(1), Some("Esc"));

        store.set_label(1, "first\r\nsecond");
        assert_eq!(store.label(1), Some("first"));

        store.set_label(1, "a label that is far too long");
        assert_eq!(store.label(1).map(str::len), Some(15));

        // multi-byte characters are never split
        store.set_label(1, "ééééééééé");
        assert_eq!(store.label(1), Some("ééééééé"));

        store.set_label(1, "   ");
        assert_eq!(store.label(1), None);
    }

    #[test]
    fn test_ranges() {
        let mut store = BindingStore::new();
        store.set_octave(0, 2);
        assert_eq!(store.octave(0), -1);
        store.set_octave(0, -2);
        assert_eq!(store.octave(0), 1);
        store.set_transpose(0, 100);
        assert_eq!(store.transpose(0), 64);
        store.set_velocity(0, -1);
        assert_eq!(store.velocity(0), 0);
        store.set_output_channel(0, 20);
        assert_eq!(store.output_channel(0), 15);
        store.set_key_signature(8);
        assert_eq!(store.key_signature(), -4);
        store.set_program(0, 200);
        assert_eq!(store.program(0), None);
        store.set_controller(0, 7, 100);
        assert_eq!(store.controller(0, 7), Some(100));
    }

    #[test]
    fn test_channel_index_masked() {
        let mut store = BindingStore::new();
        store.set_transpose(0x12, 5);
        assert_eq!(store.transpose(2), 5);
    }

    #[test]
    fn test_group_count_clamped() {
        let mut store = BindingStore::new();
        store.set_group_count(0);
        assert_eq!(store.group_count(), 1);
        store.set_group_count(1000);
        assert_eq!(store.group_count(), MAX_GROUPS);
        store.set_current_group(255);
        store.set_group_count(4);
        assert_eq!(store.current_group(), 3);
    }

    #[test]
    fn test_select_group_resyncs() {
        let mut store = BindingStore::new();
        store.set_group_count(2);
        store.set_current_group(1);
        store.set_output_channel(0, 2);
        store.set_output_channel(2, 7);
        store.set_program(2, 5);
        store.set_controller(2, 64, 127);
        store.set_current_group(0);

        // cached entries go out on their own channel, not remapped again
        let messages = store.select_group(9);
        assert_eq!(store.current_group(), 1);
        assert_eq!(
            messages,
            vec![
                MidiMessage::ProgramChange { channel: 2, program: 5 },
                MidiMessage::ControlChange { channel: 2, cc: 64, value: 127 },
            ]
        );
    }

    #[test]
    fn test_insert_and_delete_groups() {
        let mut store = BindingStore::new();
        store.set_transpose(0, 3);
        store.insert_group(0);
        assert_eq!(store.group_count(), 2);
        // current index is kept, so the new empty group is now current
        assert_eq!(store.transpose(0), 0);
        store.set_current_group(1);
        assert_eq!(store.transpose(0), 3);

        store.delete_group(1);
        assert_eq!(store.group_count(), 1);
        assert_eq!(store.current_group(), 0);

        store.set_transpose(0, 9);
        store.delete_group(0);
        assert_eq!(store.group_count(), 1);
        assert_eq!(store.transpose(0), 0);
    }

    #[test]
    fn test_copy_group() {
        let mut store = BindingStore::new();
        store.add_keydown(2, ActionEvent::note_on(0, 60, 127));
        store.copy_group(0);
        store.set_current_group(1);
        assert_eq!(store.keydown(2).len(), 1);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut store = BindingStore::new();
        store.set_group_count(3);
        store.set_current_group(2);
        store.set_velocity(0, 10);
        store.clear();
        assert_eq!(store.velocity(0), 127);
        assert_eq!(store.group_count(), 3);
        store.reset();
        assert_eq!(store, BindingStore::new());
    }

    fn apply_op(store: &mut BindingStore, field: u8, op: ValueOp, change: i8) {
        let ch = 0;
        match field {
            code::OCTAVE => {
                let v = op.apply(store.octave(ch) as i32, change as i32);
                store.set_octave(ch, v)
            }
            code::TRANSPOSE => {
                let v = op.apply(store.transpose(ch) as i32, change as i32);
                store.set_transpose(ch, v)
            }
            code::VELOCITY => {
                let v = op.apply(store.velocity(ch) as i32, change as i32);
                store.set_velocity(ch, v)
            }
            code::CHANNEL => {
                let v = op.apply(store.output_channel(ch) as i32, change as i32);
                store.set_output_channel(ch, v)
            }
            _ => {
                let v = op.apply(store.key_signature() as i32, change as i32);
                store.set_key_signature(v)
            }
        }
    }

    proptest! {
        #[test]
        fn prop_parameters_stay_in_range(
            ops in prop::collection::vec(
                (
                    prop::sample::select(vec![
                        code::OCTAVE, code::TRANSPOSE, code::VELOCITY,
                        code::CHANNEL, code::KEY_SIGNATURE,
                    ]),
                    prop::sample::select(vec![
                        ValueOp::SET, ValueOp::INC, ValueOp::DEC, ValueOp::FLIP,
                        ValueOp::SET10, ValueOp::SET1,
                    ]),
                    any::<i8>(),
                ),
                0..64,
            )
        ) {
            let mut store = BindingStore::new();
            for (field, op, change) in ops {
                apply_op(&mut store, field, op, change);
                prop_assert!((-1..=1).contains(&store.octave(0)));
                prop_assert!((-64..=64).contains(&store.transpose(0)));
                prop_assert!(store.velocity(0) <= 127);
                prop_assert!(store.output_channel(0) <= 15);
                prop_assert!((-4..=7).contains(&store.key_signature()));
            }
        }
    }
}
