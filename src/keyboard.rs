//! Held-key bookkeeping for `System KeyEvent` actions
//!
//! A key press resolves the key's bindings against the current settings
//! group, so a later change of transpose or group cannot leave a note
//! hanging: the release replays exactly what the press queued.

use crate::action::ActionEvent;
use crate::store::{BindingStore, KEY_COUNT};
use crate::translate::translate_event;

const MIDI_NOTE_ON: u8 = 0x90;
const MIDI_NOTE_OFF: u8 = 0x80;

/// Note-off matching a raw note-on, same note and velocity byte
fn note_off_for(event: &ActionEvent) -> Option<ActionEvent> {
    (event.action & 0xF0 == MIDI_NOTE_ON).then(|| {
        ActionEvent::new(MIDI_NOTE_OFF | (event.action & 0x0F), event.arg1, event.arg2, event.arg3)
    })
}

#[derive(Debug, Clone)]
pub struct KeyboardState {
    held: [bool; KEY_COUNT],
    /// Events to output on release, in queue order
    queued: Vec<(u8, ActionEvent)>,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardState {
    pub fn new() -> Self {
        Self { held: [false; KEY_COUNT], queued: Vec::new() }
    }

    pub fn is_down(&self, code: u8) -> bool {
        self.held[code as usize]
    }

    /// Number of events waiting for a release
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Press `code`: returns the events to output now and queues the
    /// release events. Auto-repeat presses of a held key are ignored.
    pub fn key_down(&mut self, store: &BindingStore, code: u8) -> Vec<ActionEvent> {
        if self.held[code as usize] {
            return Vec::new();
        }
        self.held[code as usize] = true;

        let mut output = Vec::with_capacity(store.keydown(code).len());
        for &event in store.keydown(code) {
            let down = translate_event(store, event);
            if let Some(off) = note_off_for(&down) {
                self.queued.push((code, off));
            }
            output.push(down);
        }

        for &event in store.keyup(code) {
            let up = translate_event(store, event);
            self.queued.push((code, up));
            if let Some(off) = note_off_for(&up) {
                self.queued.push((code, off));
            }
        }

        output
    }

    /// Release `code`: returns the queued events in order
    pub fn key_up(&mut self, code: u8) -> Vec<ActionEvent> {
        self.held[code as usize] = false;

        let mut output = Vec::new();
        self.queued.retain(|(key, event)| {
            if *key == code {
                output.push(*event);
                false
            } else {
                true
            }
        });
        output.retain(|event| event.action != 0);
        output
    }

    /// Release every held key; returns the events to output
    pub fn reset(&mut self) -> Vec<(u8, Vec<ActionEvent>)> {
        let mut released = Vec::new();
        for code in 0..KEY_COUNT {
            let code = code as u8;
            if self.held[code as usize] || self.queued.iter().any(|(key, _)| *key == code) {
                released.push((code, self.key_up(code)));
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{code, ValueOp};

    const DIK_A: u8 = 0x1e;

    #[test]
    fn test_note_binding_queues_note_off() {
        let mut store = BindingStore::new();
        store.set_transpose(0, 2);
        store.add_keydown(DIK_A, ActionEvent::note_on(0, 60, 127));
        let mut keyboard = KeyboardState::new();

        let down = keyboard.key_down(&store, DIK_A);
        assert_eq!(down, vec![ActionEvent::new(0x90, 62, 127, 0)]);
        assert!(keyboard.is_down(DIK_A));

        // a transpose change while held does not strand the note
        store.set_transpose(0, 5);
        let up = keyboard.key_up(DIK_A);
        assert_eq!(up, vec![ActionEvent::new(0x80, 62, 127, 0)]);
        assert!(!keyboard.is_down(DIK_A));
        assert_eq!(keyboard.queued_len(), 0);
    }

    #[test]
    fn test_keyup_bindings_resolved_at_press() {
        let mut store = BindingStore::new();
        let octave_up = ActionEvent::channel_op(code::OCTAVE, 0, ValueOp::INC, 1);
        let octave_down = ActionEvent::channel_op(code::OCTAVE, 0, ValueOp::DEC, 1);
        store.add_keydown(2, octave_up);
        store.add_keyup(2, octave_down);
        store.add_keyup(2, ActionEvent::note_on(0, 60, 100));
        let mut keyboard = KeyboardState::new();

        assert_eq!(keyboard.key_down(&store, 2), vec![octave_up]);
        assert_eq!(
            keyboard.key_up(2),
            vec![
                octave_down,
                ActionEvent::new(0x90, 60, 100, 0),
                ActionEvent::new(0x80, 60, 100, 0),
            ]
        );
    }

    #[test]
    fn test_auto_repeat_ignored() {
        let mut store = BindingStore::new();
        store.add_keydown(DIK_A, ActionEvent::note_on(0, 60, 127));
        let mut keyboard = KeyboardState::new();

        assert_eq!(keyboard.key_down(&store, DIK_A).len(), 1);
        assert!(keyboard.key_down(&store, DIK_A).is_empty());
        assert_eq!(keyboard.key_up(DIK_A).len(), 1);
    }

    #[test]
    fn test_reset_releases_held_keys() {
        let mut store = BindingStore::new();
        store.add_keydown(DIK_A, ActionEvent::note_on(0, 60, 127));
        store.add_keydown(0x1f, ActionEvent::note_on(0, 62, 127));
        let mut keyboard = KeyboardState::new();
        keyboard.key_down(&store, DIK_A);
        keyboard.key_down(&store, 0x1f);

        let released = keyboard.reset();
        assert_eq!(released.len(), 2);
        assert_eq!(released[0].0, DIK_A);
        assert_eq!(released[1].1, vec![ActionEvent::new(0x80, 62, 127, 0)]);
        assert!(!keyboard.is_down(DIK_A));
    }
}
