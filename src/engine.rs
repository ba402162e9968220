//! Event engine
//!
//! [`EventEngine`] owns the binding store, transient controller state, held
//! keys and the song log. Every input source funnels into
//! [`EventEngine::send_event`]; translated MIDI leaves through the
//! [`EngineHost`] collaborator. The engine itself never blocks and has no
//! threads: the host calls [`EventEngine::update`] on a fixed cadence and
//! serializes its callbacks through an [`EngineHandle`].

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::action::{clamp_value, code, controller_id, system, wrap_value, ActionEvent, ValueOp};
use crate::error::{SongError, SongResult};
use crate::keyboard::KeyboardState;
use crate::keymap::{self, ParseReport};
use crate::midi::{convert, MidiMessage};
use crate::song::{self, Song, SongInfo, DEFAULT_MAX_EVENTS};
use crate::store::{
    BindingStore, CHANNEL_COUNT, CONTROLLER_COUNT, DEFAULT_VELOCITY, KEY_COUNT, MAX_GROUPS,
};
use crate::transient::{TransientKey, TransientState, DEFAULT_RESTORE_WINDOW_MS};
use crate::translate::{translate, translate_channel, translate_velocity};

pub const DEFAULT_VOLUME: u8 = 100;
pub const VOLUME_RANGE: (i32, i32) = (0, 200);
pub const PITCH_RANGE: (i32, i32) = (-64, 63);

/// Collaborators the engine calls out to
///
/// Only `midi_output` is required; the notifications default to no-ops.
pub trait EngineHost: Send {
    /// Send one translated message to the instrument
    fn midi_output(&mut self, message: &MidiMessage);

    /// Silence the instrument (all notes off, controllers reset)
    fn midi_reset(&mut self) {}

    /// Release every physical key the host considers held
    fn keyboard_reset(&mut self) {}

    /// A physical key changed state
    fn display_keyboard_event(&mut self, _key: u8, _down: bool) {}

    /// A message is about to be sent
    fn display_midi_event(&mut self, _message: &MidiMessage) {}
}

/// Tunables of the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Decay window of `Press` ops, in milliseconds
    pub restore_window_ms: f64,
    /// Song log capacity; recording stops when it is reached
    pub max_events: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            restore_window_ms: DEFAULT_RESTORE_WINDOW_MS,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Idle,
    Recording,
    Playing { cursor: usize },
}

/// Label text being received 4 bytes per event
#[derive(Debug, Clone)]
struct LabelCapture {
    key: u8,
    remaining: usize,
    bytes: Vec<u8>,
}

/// Shared engine, one lock for every host callback
pub type EngineHandle<H> = Arc<Mutex<EventEngine<H>>>;

pub struct EventEngine<H: EngineHost> {
    host: H,
    options: EngineOptions,
    store: BindingStore,
    transient: TransientState,
    keyboard: KeyboardState,
    song: Option<Song>,
    transport: Transport,
    /// Song position, ms
    timer: f64,
    /// Time since the last record/playback start, ms
    clock: f64,
    play_speed: f64,
    volume: u8,
    /// Pitch offset per output channel
    pitch: [i8; CHANNEL_COUNT],
    map_mode: Option<(u8, u8)>,
    label_mode: Option<LabelCapture>,
}

/// Global actions carry `(op, value)`; the others `(channel, op, value)`
fn is_global(action: u8) -> bool {
    matches!(action, code::KEY_SIGNATURE | code::VOLUME | code::SETTING_GROUP)
}

fn strip_sync(event: ActionEvent) -> ActionEvent {
    let mut event = event;
    if is_global(event.action) {
        event.arg1 = ValueOp(event.arg1).without_sync().0;
    } else {
        event.arg2 = ValueOp(event.arg2).without_sync().0;
    }
    event
}

fn set_event(action: u8, channel: u8, value: i32) -> ActionEvent {
    if is_global(action) {
        ActionEvent::global_op(action, ValueOp::SET, value as u8)
    } else {
        ActionEvent::new(action, channel, ValueOp::SET.0, value as u8)
    }
}

impl<H: EngineHost> EventEngine<H> {
    pub fn new(host: H, options: EngineOptions) -> Self {
        Self {
            host,
            options,
            store: BindingStore::new(),
            transient: TransientState::new(options.restore_window_ms),
            keyboard: KeyboardState::new(),
            song: None,
            transport: Transport::Idle,
            timer: 0.0,
            clock: 0.0,
            play_speed: 1.0,
            volume: DEFAULT_VOLUME,
            pitch: [0; CHANNEL_COUNT],
            map_mode: None,
            label_mode: None,
        }
    }

    pub fn into_handle(self) -> EngineHandle<H> {
        Arc::new(Mutex::new(self))
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn store(&self) -> &BindingStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BindingStore {
        &mut self.store
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    /// Single entry point for key hooks, MIDI input, UI and replay
    ///
    /// When `record` is set and a recording is running the event is logged
    /// first (transport commands excepted). Pending label or mapping modes
    /// consume the event; System events drive the keyboard protocol; the
    /// rest is dispatched by [`Self::output_event`].
    pub fn send_event(&mut self, event: ActionEvent, record: bool) {
        if record && !event.is_transport() {
            self.record_event(event);
        }

        if let Some(mut capture) = self.label_mode.take() {
            for byte in event.to_bytes() {
                capture.bytes.push(byte);
                capture.remaining -= 1;
                if capture.remaining == 0 {
                    break;
                }
            }
            if capture.remaining == 0 {
                let end = capture.bytes.iter().position(|&b| b == 0).unwrap_or(capture.bytes.len());
                let text = String::from_utf8_lossy(&capture.bytes[..end]);
                self.store.set_label(capture.key, &text);
            } else {
                self.label_mode = Some(capture);
            }
            return;
        }

        if let Some((key, kind)) = self.map_mode.take() {
            match kind {
                0 => self.store.add_keydown(key, event),
                1 => self.store.add_keyup(key, event),
                _ => debug!("unknown key map type {} for key {}", kind, key),
            }
            return;
        }

        if event.action == code::SYSTEM {
            self.system_event(event);
            return;
        }

        self.output_event(event);
    }

    fn system_event(&mut self, event: ActionEvent) {
        let key = event.arg2;
        match event.arg1 {
            system::KEY_EVENT => {
                let down = event.arg3 != 0;
                self.host.display_keyboard_event(key, down);
                let events = if down {
                    self.transient.trigger_sync();
                    self.keyboard.key_down(&self.store, key)
                } else {
                    self.keyboard.key_up(key)
                };
                for event in events {
                    self.output_event(event);
                }
            }
            system::KEY_MAP => self.map_mode = Some((key, event.arg3)),
            system::KEY_LABEL => {
                if event.arg3 > 0 {
                    self.label_mode = Some(LabelCapture {
                        key,
                        remaining: event.arg3 as usize,
                        bytes: Vec::with_capacity(event.arg3 as usize),
                    });
                }
            }
            sub => trace!("ignoring system event {} ({})", sub, event),
        }
    }

    /// Feed raw bytes from a MIDI input port
    pub fn midi_input(&mut self, data: &[u8]) {
        match data.first() {
            Some(&status) if status >= code::MIDI_START => {
                let byte = |i: usize| data.get(i).copied().unwrap_or(0);
                self.send_event(ActionEvent::new(status, byte(1), byte(2), byte(3)), true);
            }
            _ => debug!("dropping MIDI input without status byte: {:02X?}", data),
        }
    }

    /// Raise the sync trigger; deferred changes flush on a following update
    pub fn trigger_sync(&mut self) {
        self.transient.trigger_sync();
    }

    // ---------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------

    /// Apply one event to the store, transport or instrument
    pub fn output_event(&mut self, event: ActionEvent) {
        if event.is_midi() {
            match MidiMessage::from_event(&event) {
                Some(message) => self.send_midi(message),
                None => debug!("dropping unparsable MIDI event {}", event),
            }
            return;
        }

        let ActionEvent { action, arg1, arg2, arg3 } = event;
        match action {
            code::KEY_SIGNATURE => {
                let op = ValueOp(arg1);
                let value = self.store.key_signature() as i32;
                if self.stage(event, 0, op, value) {
                    self.store.set_key_signature(op.apply(value, arg2 as i8 as i32));
                }
            }

            code::OCTAVE | code::TRANSPOSE | code::VELOCITY | code::CHANNEL => {
                let ch = arg1 & 0x0F;
                let op = ValueOp(arg2);
                let value = self.channel_param(action, ch);
                if self.stage(event, ch, op, value) {
                    let value = op.apply(value, arg3 as i8 as i32);
                    match action {
                        code::OCTAVE => self.store.set_octave(ch, value),
                        code::TRANSPOSE => self.store.set_transpose(ch, value),
                        code::VELOCITY => self.store.set_velocity(ch, value),
                        _ => self.store.set_output_channel(ch, value),
                    }
                }
            }

            code::VOLUME => {
                let op = ValueOp(arg1);
                let value = self.volume as i32;
                if self.stage(event, 0, op, value) {
                    let (min, max) = VOLUME_RANGE;
                    self.volume = clamp_value(op.apply(value, arg2 as i32), min, max) as u8;
                }
            }

            code::PLAY => {
                if self.allow_input() {
                    self.start_playback();
                }
            }

            code::RECORD => {
                if self.allow_input() {
                    if self.is_recording() {
                        self.stop_record();
                    } else {
                        self.start_record();
                    }
                }
            }

            code::STOP => {
                if self.is_recording() {
                    self.stop_record();
                }
                if self.is_playing() {
                    self.stop_playback();
                }
            }

            code::SETTING_GROUP => {
                let op = ValueOp(arg1);
                let value = self.store.current_group() as i32;
                if self.stage(event, 0, op, value) {
                    // group indices reach 255: absolute ops take the byte unsigned
                    let change = match op.kind() {
                        0x00 | 0x04 => arg2 as i32,
                        _ => arg2 as i8 as i32,
                    };
                    let last = self.store.group_count() as i32 - 1;
                    let group = wrap_value(op.apply(value, change), 0, last);
                    self.select_group(group as usize);
                }
            }

            // a count of 0 stands for MAX_GROUPS, which does not fit the byte
            code::SETTING_GROUP_COUNT => match arg1 {
                0 => self.store.set_group_count(MAX_GROUPS),
                count => self.store.set_group_count(count as usize),
            },

            code::NOTE_ON | code::NOTE_OFF | code::NOTE_PRESSURE => {
                if let Some(message) = translate(&self.store, &event) {
                    self.send_midi(message);
                }
            }

            code::PRESSURE => {
                let ch = arg1 & 0x0F;
                let op = ValueOp(arg2);
                if self.stage(event, ch, op, 0) {
                    let value = clamp_value(op.apply(0, arg3 as i8 as i32), 0, 127) as u8;
                    self.send_midi(MidiMessage::ChannelPressure {
                        channel: translate_channel(&self.store, ch),
                        pressure: translate_velocity(&self.store, ch, value),
                    });
                }
            }

            code::PITCH => {
                let ch = arg1 & 0x0F;
                let op = ValueOp(arg2);
                let out = translate_channel(&self.store, ch);
                let value = self.pitch[out as usize] as i32;
                if self.stage(event, ch, op, value) {
                    let (min, max) = PITCH_RANGE;
                    let value = clamp_value(op.apply(value, arg3 as i8 as i32), min, max) as i8;
                    self.pitch[out as usize] = value;
                    self.send_midi(MidiMessage::PitchBend {
                        channel: out,
                        value: convert::pitch_to_14bit(value),
                    });
                }
            }

            code::PROGRAM => {
                let ch = arg1 & 0x0F;
                let op = ValueOp(arg2);
                let out = translate_channel(&self.store, ch);
                let value = self.store.program(out).unwrap_or(0) as i32;
                if self.stage(event, ch, op, value) {
                    let program = clamp_value(op.apply(value, arg3 as i8 as i32), 0, 127) as u8;
                    self.send_midi(MidiMessage::ProgramChange { channel: out, program });
                }
            }

            code::BANK_MSB | code::BANK_LSB | code::SUSTAIN => {
                if let Some(id) = controller_id(action) {
                    let ch = arg1 & 0x0F;
                    let op = ValueOp(arg2);
                    let out = translate_channel(&self.store, ch);
                    let value = self.store.controller(out, id).unwrap_or(0) as i32;
                    if self.stage(event, ch, op, value) {
                        let value = clamp_value(op.apply(value, arg3 as i8 as i32), 0, 127) as u8;
                        self.send_midi(MidiMessage::ControlChange { channel: out, cc: id, value });
                    }
                }
            }

            _ => trace!("ignoring action {}", event),
        }
    }

    /// Sync and Press handling shared by every op-carrying action
    ///
    /// Returns false when the change was deferred to a sync trigger. A press
    /// arms a restore of `current`.
    fn stage(&mut self, event: ActionEvent, channel: u8, op: ValueOp, current: i32) -> bool {
        let key = TransientKey::new(event.action, channel);
        if op.is_sync() {
            self.transient.defer(key, strip_sync(event));
            return false;
        }
        if op.is_press() {
            self.transient.press(key, set_event(event.action, event.arg1, current));
        }
        true
    }

    fn channel_param(&self, action: u8, ch: u8) -> i32 {
        match action {
            code::OCTAVE => self.store.octave(ch) as i32,
            code::TRANSPOSE => self.store.transpose(ch) as i32,
            code::VELOCITY => self.store.velocity(ch) as i32,
            _ => self.store.output_channel(ch) as i32,
        }
    }

    /// Emit a message and keep the program/controller cache in step
    ///
    /// The cache is indexed by the channel the message goes out on.
    fn send_midi(&mut self, message: MidiMessage) {
        match message {
            MidiMessage::ControlChange { channel, cc, value } => {
                self.store.set_controller(channel, cc, value)
            }
            MidiMessage::ProgramChange { channel, program } => {
                self.store.set_program(channel, program)
            }
            _ => {}
        }
        self.emit(&message);
    }

    fn emit(&mut self, message: &MidiMessage) {
        self.host.display_midi_event(message);
        self.host.midi_output(message);
    }

    // ---------------------------------------------------------------------
    // Settings groups
    // ---------------------------------------------------------------------

    /// Switch group and resend its cached programs and controllers
    pub fn select_group(&mut self, id: usize) {
        for message in self.store.select_group(id) {
            self.emit(&message);
        }
    }

    pub fn insert_group(&mut self, position: usize) {
        for message in self.store.insert_group(position) {
            self.emit(&message);
        }
    }

    pub fn delete_group(&mut self, id: usize) {
        for message in self.store.delete_group(id) {
            self.emit(&message);
        }
    }

    pub fn copy_group(&mut self, id: usize) {
        for message in self.store.copy_group(id) {
            self.emit(&message);
        }
    }

    /// Replace all bindings with a parsed keymap
    ///
    /// The text is parsed into a scratch store which is swapped in whole;
    /// skipped lines are reported, never fatal.
    pub fn load_keymap(&mut self, text: &str) -> ParseReport {
        let (store, report) = keymap::parse(text);
        self.reset_events();
        self.store = store;
        self.select_group(self.store.current_group());
        info!(
            "Keymap loaded: {} groups, {} lines applied, {} skipped",
            self.store.group_count(),
            report.applied,
            report.skipped.len()
        );
        report
    }

    // ---------------------------------------------------------------------
    // Tick
    // ---------------------------------------------------------------------

    /// Advance time by `dt` milliseconds
    ///
    /// Replays due song events, then flushes sync-deferred changes and
    /// expired press restores.
    pub fn update(&mut self, dt: f64) {
        let mut dt = dt;
        if self.is_playing() {
            dt *= self.play_speed;
        }
        if self.is_playing() || self.is_recording() {
            self.timer += dt;
        }

        while let Transport::Playing { cursor } = self.transport {
            let next = self.song.as_ref().and_then(|song| song.events.get(cursor)).copied();
            let Some(entry) = next else {
                self.stop_playback();
                break;
            };
            if entry.time > self.timer {
                break;
            }

            self.transport = Transport::Playing { cursor: cursor + 1 };
            self.send_event(entry.event, false);

            if let Transport::Playing { cursor } = self.transport {
                if cursor >= self.song.as_ref().map_or(0, Song::len) {
                    self.stop_playback();
                }
            }
        }

        self.clock += dt;

        for event in self.transient.take_synced() {
            self.output_event(event);
        }
        for event in self.transient.update(dt) {
            self.output_event(event);
        }
    }

    // ---------------------------------------------------------------------
    // Record and playback
    // ---------------------------------------------------------------------

    fn record_event(&mut self, event: ActionEvent) {
        if !self.is_recording() {
            return;
        }
        let Some(song) = self.song.as_mut() else {
            return;
        };
        song.push(self.timer, event);

        if song.len() >= self.options.max_events.saturating_sub(1) {
            warn!("Song log full ({} events), recording stopped", song.len());
            self.stop_record();
        }
    }

    fn push_snapshot(&mut self, event: ActionEvent) {
        self.record_event(event);
    }

    /// Start a new recording
    ///
    /// The log opens with a snapshot of every settings group so replay does
    /// not depend on whatever keymap is loaded at the time.
    pub fn start_record(&mut self) {
        self.stop_playback();
        self.stop_record();

        self.song = Some(Song::new());
        self.transport = Transport::Recording;
        self.timer = 0.0;
        self.clock = 0.0;
        self.play_speed = 1.0;
        info!("Recording started");

        let current = self.store.current_group();
        let count = self.store.group_count();
        // MAX_GROUPS wraps to 0, which replays as MAX_GROUPS
        self.push_snapshot(ActionEvent::new(code::SETTING_GROUP_COUNT, count as u8, 0, 0));

        for group in 0..count {
            self.store.set_current_group(group);
            self.push_snapshot(ActionEvent::global_op(code::SETTING_GROUP, ValueOp::SET, group as u8));
            let key_signature = self.store.key_signature();
            self.push_snapshot(ActionEvent::global_op(
                code::KEY_SIGNATURE,
                ValueOp::SET,
                key_signature as u8,
            ));

            for ch in 0..CHANNEL_COUNT as u8 {
                for (action, value, default) in [
                    (code::OCTAVE, self.store.octave(ch) as i32, 0),
                    (code::TRANSPOSE, self.store.transpose(ch) as i32, 0),
                    (code::VELOCITY, self.store.velocity(ch) as i32, DEFAULT_VELOCITY as i32),
                    (code::CHANNEL, self.store.output_channel(ch) as i32, 0),
                ] {
                    if value != default {
                        self.push_snapshot(set_event(action, ch, value));
                    }
                }
            }

            // raw messages land on the cache slot they came from, whatever
            // the channel remap
            for ch in 0..CHANNEL_COUNT as u8 {
                if let Some(program) = self.store.program(ch) {
                    self.push_snapshot(MidiMessage::ProgramChange { channel: ch, program }.to_event());
                }
                for id in 0..CONTROLLER_COUNT as u8 {
                    if let Some(value) = self.store.controller(ch, id) {
                        let message = MidiMessage::ControlChange { channel: ch, cc: id, value };
                        self.push_snapshot(message.to_event());
                    }
                }
            }

            for key in 0..KEY_COUNT {
                let key = key as u8;
                let binding = self.store.binding(key).clone();
                for event in binding.keydown {
                    self.push_snapshot(ActionEvent::system(system::KEY_MAP, key, 0));
                    self.push_snapshot(event);
                }
                for event in binding.keyup {
                    self.push_snapshot(ActionEvent::system(system::KEY_MAP, key, 1));
                    self.push_snapshot(event);
                }
                if let Some(label) = binding.label {
                    let bytes = label.as_bytes();
                    self.push_snapshot(ActionEvent::system(system::KEY_LABEL, key, bytes.len() as u8));
                    for chunk in bytes.chunks(4) {
                        let mut raw = [0u8; 4];
                        raw[..chunk.len()].copy_from_slice(chunk);
                        self.push_snapshot(ActionEvent::from_bytes(raw));
                    }
                }
            }
        }

        self.store.set_current_group(current);
        self.push_snapshot(ActionEvent::global_op(code::SETTING_GROUP, ValueOp::SET, current as u8));
    }

    /// Close the recording with a Stop event
    pub fn stop_record(&mut self) {
        if !self.is_recording() {
            return;
        }
        let timer = self.timer;
        if let Some(song) = self.song.as_mut() {
            song.push(timer, ActionEvent::new(code::STOP, 0, 0, 0));
            info!("Recording stopped: {} events, {:.0}ms", song.len(), timer);
        }
        self.transport = Transport::Idle;
        self.reset_events();
    }

    /// Replay the loaded song from the start against a cleared store
    pub fn start_playback(&mut self) {
        if self.song.is_none() {
            return;
        }
        self.stop_record();
        self.stop_playback();

        self.timer = 0.0;
        self.clock = 0.0;
        self.transport = Transport::Playing { cursor: 0 };
        self.store.reset();
        info!("Playback started");

        self.update(0.0);
    }

    pub fn stop_playback(&mut self) {
        if self.is_playing() {
            info!("Playback stopped at {:.0}ms", self.timer);
        }
        self.transport = Transport::Idle;
        self.reset_events();
    }

    /// Leave label/map modes, release held keys and drop transient state
    fn reset_events(&mut self) {
        self.map_mode = None;
        self.label_mode = None;

        for (_, events) in self.keyboard.reset() {
            for event in events.into_iter().filter(ActionEvent::is_midi) {
                self.output_event(event);
            }
        }
        self.host.keyboard_reset();

        self.transient.reset();
        self.host.midi_reset();
    }

    /// Back to a cleared store with nothing playing or recording
    pub fn reset(&mut self) {
        self.stop_record();
        self.stop_playback();
        self.store.reset();
        self.pitch = [0; CHANNEL_COUNT];
        self.volume = DEFAULT_VOLUME;
    }

    // ---------------------------------------------------------------------
    // Songs
    // ---------------------------------------------------------------------

    /// Load a `.fpm` song or import a `.lyt`; the current song is kept on error
    pub fn open_song(&mut self, path: &Path) -> SongResult<()> {
        let song = song::open(path, self.options.max_events)?;
        self.set_song(song);
        Ok(())
    }

    pub fn set_song(&mut self, song: Song) {
        self.stop_record();
        self.stop_playback();
        self.timer = 0.0;
        self.song = Some(song);
    }

    pub fn close_song(&mut self) {
        self.stop_record();
        self.stop_playback();
        self.timer = 0.0;
        self.song = None;
    }

    pub fn save_song(&self, path: &Path) -> SongResult<()> {
        let song = self.song.as_ref().ok_or(SongError::Empty)?;
        if song.info.write_protected {
            return Err(SongError::WriteProtected);
        }
        song::save(path, song)
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn song_info_mut(&mut self) -> Option<&mut SongInfo> {
        self.song.as_mut().map(|song| &mut song.info)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn is_recording(&self) -> bool {
        self.transport == Transport::Recording
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.transport, Transport::Playing { .. })
    }

    /// Live input is ignored while a song plays
    pub fn allow_input(&self) -> bool {
        !self.is_playing()
    }

    pub fn allow_save(&self) -> bool {
        self.song.as_ref().is_some_and(|song| !song.info.write_protected) && !self.is_recording()
    }

    pub fn is_empty(&self) -> bool {
        self.song.is_none()
    }

    pub fn length_ms(&self) -> f64 {
        self.song.as_ref().map_or(0.0, Song::length_ms)
    }

    /// Position in the song, ms
    pub fn time_ms(&self) -> f64 {
        self.timer
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock
    }

    pub fn play_speed(&self) -> f64 {
        self.play_speed
    }

    /// Negative speeds are treated as 0
    pub fn set_play_speed(&mut self, speed: f64) {
        self.play_speed = speed.max(0.0);
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Current pitch offset of output channel `ch`
    pub fn pitch(&self, ch: u8) -> i8 {
        self.pitch[(ch & 0x0F) as usize]
    }
}
