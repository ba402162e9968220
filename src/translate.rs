//! Translation of note-family actions into wire MIDI
//!
//! All functions here only read the binding store; they are deterministic in
//! the store state and the event.

use crate::action::{clamp_value, code, ActionEvent, ValueOp};
use crate::midi::MidiMessage;
use crate::store::BindingStore;

/// Derive a new value from `value` with `op` and a signed `change`
pub fn translate_value(op: ValueOp, value: i32, change: i32) -> i32 {
    op.apply(value, change)
}

/// Output channel for input channel `ch`
pub fn translate_channel(store: &BindingStore, ch: u8) -> u8 {
    store.output_channel(ch) & 0x0F
}

/// `note + octave*12 + transpose + key signature`, clamped to 0..=127
pub fn translate_note(store: &BindingStore, ch: u8, note: u8) -> u8 {
    let value = note as i32
        + store.octave(ch) as i32 * 12
        + store.transpose(ch) as i32
        + store.key_signature() as i32;
    clamp_value(value, 0, 127) as u8
}

/// Scale a velocity or pressure by the channel's velocity setting
pub fn translate_velocity(store: &BindingStore, ch: u8, velocity: u8) -> u8 {
    clamp_value(velocity as i32 * store.velocity(ch) as i32 / 127, 0, 127) as u8
}

/// Translate a note-family action into its wire message
///
/// Raw MIDI events pass through unchanged; every other logical action
/// yields `None` since it is stateful and handled by the engine.
pub fn translate(store: &BindingStore, event: &ActionEvent) -> Option<MidiMessage> {
    let ch = event.arg1;
    match event.action {
        code::NOTE_ON => Some(MidiMessage::NoteOn {
            channel: translate_channel(store, ch),
            note: translate_note(store, ch, event.arg2),
            velocity: translate_velocity(store, ch, event.arg3),
        }),
        code::NOTE_OFF => Some(MidiMessage::NoteOff {
            channel: translate_channel(store, ch),
            note: translate_note(store, ch, event.arg2),
            velocity: 0,
        }),
        code::NOTE_PRESSURE => Some(MidiMessage::PolyPressure {
            channel: translate_channel(store, ch),
            note: translate_note(store, ch, event.arg2),
            pressure: translate_velocity(store, ch, event.arg3),
        }),
        _ if event.is_midi() => MidiMessage::from_event(event),
        _ => None,
    }
}

/// Rewrite a note-family action into the raw event it produces
///
/// Other events are returned unchanged. Used by the keyboard layer, which
/// needs the final bytes to schedule matching note-offs.
pub fn translate_event(store: &BindingStore, event: ActionEvent) -> ActionEvent {
    match event.action {
        code::NOTE_ON | code::NOTE_OFF | code::NOTE_PRESSURE => translate(store, &event)
            .map(|msg| msg.to_event())
            .unwrap_or(event),
        _ => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_transposed_note() {
        let mut store = BindingStore::new();
        store.set_transpose(0, 2);

        let msg = translate(&store, &ActionEvent::note_on(0, 60, 127));
        assert_eq!(msg, Some(MidiMessage::NoteOn { channel: 0, note: 62, velocity: 127 }));
    }

    #[test]
    fn test_octave_key_signature_and_remap() {
        let mut store = BindingStore::new();
        store.set_octave(1, -1);
        store.set_key_signature(3);
        store.set_output_channel(1, 9);
        store.set_velocity(1, 64);

        let msg = translate(&store, &ActionEvent::note_on(1, 60, 127));
        assert_eq!(msg, Some(MidiMessage::NoteOn { channel: 9, note: 51, velocity: 64 }));
    }

    #[test]
    fn test_note_clamped() {
        let mut store = BindingStore::new();
        store.set_transpose(0, 64);
        store.set_octave(0, 1);
        let msg = translate(&store, &ActionEvent::note_on(0, 120, 100));
        assert_eq!(msg, Some(MidiMessage::NoteOn { channel: 0, note: 127, velocity: 100 }));
    }

    #[test]
    fn test_note_off_has_zero_velocity() {
        let store = BindingStore::new();
        let event = ActionEvent::new(code::NOTE_OFF, 0, 60, 90);
        assert_eq!(
            translate(&store, &event),
            Some(MidiMessage::NoteOff { channel: 0, note: 60, velocity: 0 })
        );
    }

    #[test]
    fn test_raw_and_control_events() {
        let store = BindingStore::new();
        let raw = ActionEvent::new(0xB0, 7, 100, 0);
        assert_eq!(
            translate(&store, &raw),
            Some(MidiMessage::ControlChange { channel: 0, cc: 7, value: 100 })
        );
        let octave = ActionEvent::channel_op(code::OCTAVE, 0, ValueOp::INC, 1);
        assert_eq!(translate(&store, &octave), None);
    }

    #[test]
    fn test_translate_event_rewrites_notes_only() {
        let mut store = BindingStore::new();
        store.set_transpose(0, 1);
        let event = translate_event(&store, ActionEvent::note_on(0, 60, 127));
        assert_eq!(event.to_bytes(), [0x90, 61, 127, 0]);

        let octave = ActionEvent::channel_op(code::OCTAVE, 0, ValueOp::INC, 1);
        assert_eq!(translate_event(&store, octave), octave);
    }

    proptest! {
        #[test]
        fn prop_translation_is_deterministic(
            note in 0u8..128,
            velocity in 0u8..128,
            octave in -1i32..=1,
            transpose in -64i32..=64,
            key_signature in -4i32..=7,
            scale in 0i32..=127,
            remap in 0i32..=15,
        ) {
            let mut store = BindingStore::new();
            store.set_octave(0, octave);
            store.set_transpose(0, transpose);
            store.set_key_signature(key_signature);
            store.set_velocity(0, scale);
            store.set_output_channel(0, remap);

            let event = ActionEvent::note_on(0, note, velocity);
            let first = translate(&store, &event);
            let second = translate(&store.clone(), &event);
            prop_assert_eq!(&first, &second);

            let expected_note = (note as i32 + octave * 12 + transpose + key_signature).clamp(0, 127) as u8;
            let expected_velocity = (velocity as i32 * scale / 127) as u8;
            prop_assert_eq!(
                first,
                Some(MidiMessage::NoteOn {
                    channel: remap as u8,
                    note: expected_note,
                    velocity: expected_velocity,
                })
            );
        }
    }
}
