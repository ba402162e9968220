//! Upgrade of songs recorded before 1.8
//!
//! Older recorders logged notes, program changes and the sustain pedal as
//! raw MIDI. These are rewritten into the logical actions so that playback
//! goes through the current translation.

use tracing::warn;

use super::Song;
use crate::action::{code, controller, system, ActionEvent, ValueOp};
use crate::version::Version;

/// Logical form of a pre-1.8 raw event, if it has one
pub fn upgrade_event(event: ActionEvent) -> Option<ActionEvent> {
    let ActionEvent { action, arg1, arg2, arg3 } = event;
    let ch = action & 0x0F;
    match action & 0xF0 {
        0x90 => Some(ActionEvent::new(code::NOTE_ON, ch, arg1, arg2)),
        0x80 => Some(ActionEvent::new(code::NOTE_OFF, ch, arg1, 0)),
        // value was stored before the op
        0xC0 => Some(ActionEvent::new(code::PROGRAM, ch, arg2, arg1)),
        0xB0 if arg1 == controller::SUSTAIN => {
            // Flip carries an explicit value since 1.8
            let value = if arg3 == ValueOp::FLIP.0 { 127 } else { arg2 };
            Some(ActionEvent::new(code::SUSTAIN, ch, arg3, value))
        }
        _ => None,
    }
}

/// Rewrite a song older than 1.8 in place
///
/// Label payload events are skipped. Obsolete actions that carried real
/// settings cannot be expressed any more and clear `info.compatible`.
pub fn migrate(song: &mut Song) {
    if song.info.version >= Version::V1_8 {
        return;
    }

    let mut index = 0;
    while index < song.events.len() {
        let event = song.events[index].event;
        match event.action {
            code::SYSTEM => {
                if event.arg1 == system::KEY_LABEL {
                    index += (event.arg3 as usize + 3) / 4;
                }
            }
            code::AUTO_PEDAL_OBSOLETE => {
                if event.arg1 != 0 || event.arg2 != 0 {
                    song.info.compatible = false;
                }
            }
            code::DELAY_KEYUP_OBSOLETE => {
                if event.arg2 != 0 || event.arg3 != 0 {
                    song.info.compatible = false;
                }
            }
            _ => {
                if let Some(upgraded) = upgrade_event(event) {
                    song.events[index].event = upgraded;
                }
            }
        }
        index += 1;
    }

    if !song.info.compatible {
        warn!("song v{} uses obsolete settings that cannot be upgraded", song.info.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(events: &[ActionEvent]) -> Song {
        let mut song = Song::new();
        song.info.version = Version::V1_7;
        for event in events {
            song.push(0.0, *event);
        }
        song
    }

    #[test]
    fn test_upgrade_notes_and_program() {
        let mut song = legacy(&[
            ActionEvent::new(0x92, 60, 100, 0),
            ActionEvent::new(0x82, 60, 64, 0),
            ActionEvent::new(0xC0, 5, ValueOp::INC.0, 0),
        ]);
        migrate(&mut song);
        assert_eq!(song.events[0].event, ActionEvent::note_on(2, 60, 100));
        assert_eq!(song.events[1].event, ActionEvent::note_off(2, 60));
        assert_eq!(
            song.events[2].event,
            ActionEvent::new(code::PROGRAM, 0, ValueOp::INC.0, 5)
        );
    }

    #[test]
    fn test_upgrade_sustain() {
        let mut song = legacy(&[
            ActionEvent::new(0xB0, 64, 100, ValueOp::SET.0),
            ActionEvent::new(0xB1, 64, 0, ValueOp::FLIP.0),
            ActionEvent::new(0xB0, 7, 100, 0),
        ]);
        migrate(&mut song);
        assert_eq!(song.events[0].event, ActionEvent::new(code::SUSTAIN, 0, 0, 100));
        assert_eq!(song.events[1].event, ActionEvent::new(code::SUSTAIN, 1, ValueOp::FLIP.0, 127));
        // other controllers stay raw
        assert_eq!(song.events[2].event, ActionEvent::new(0xB0, 7, 100, 0));
    }

    #[test]
    fn test_label_payload_skipped() {
        let payload = ActionEvent::new(0x90, 0x41, 0x42, 0x43);
        let mut song = legacy(&[
            ActionEvent::system(system::KEY_LABEL, 0x1E, 5),
            payload,
            payload,
            ActionEvent::new(0x90, 60, 1, 0),
        ]);
        migrate(&mut song);
        assert_eq!(song.events[1].event, payload);
        assert_eq!(song.events[2].event, payload);
        assert_eq!(song.events[3].event, ActionEvent::note_on(0, 60, 1));
    }

    #[test]
    fn test_obsolete_actions_flag_incompatible() {
        let mut song = legacy(&[ActionEvent::new(code::AUTO_PEDAL_OBSOLETE, 0, 0, 5)]);
        migrate(&mut song);
        assert!(song.info.compatible);

        let mut song = legacy(&[ActionEvent::new(code::DELAY_KEYUP_OBSOLETE, 0, 1, 0)]);
        migrate(&mut song);
        assert!(!song.info.compatible);
    }

    #[test]
    fn test_current_songs_untouched() {
        let mut song = legacy(&[ActionEvent::new(0x90, 60, 100, 0)]);
        song.info.version = Version::CURRENT;
        migrate(&mut song);
        assert_eq!(song.events[0].event, ActionEvent::new(0x90, 60, 100, 0));
    }
}
