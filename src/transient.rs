//! Transient value state: press-and-restore and sync deferral
//!
//! A `Press` op applies a value now and schedules the previous value to be
//! re-applied once the restore window elapses. A `Sync`-flagged op defers the
//! whole change until the next sync trigger. Each target holds at most one
//! pending entry, so the two states exclude each other by construction.

use std::collections::BTreeMap;

use tracing::trace;

use crate::action::ActionEvent;

/// Restore window applied to `Press` ops, in milliseconds
pub const DEFAULT_RESTORE_WINDOW_MS: f64 = 20.0;

/// Value addressed by an op-carrying action
///
/// Controller actions (BankMSB, BankLSB, Sustain) map one-to-one onto their
/// controller ids, so `(action, channel)` identifies the (channel, controller)
/// pair. Global actions use channel 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransientKey {
    pub action: u8,
    pub channel: u8,
}

impl TransientKey {
    pub fn new(action: u8, channel: u8) -> Self {
        Self { action, channel }
    }
}

/// Pending work for one target; absence means idle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pending {
    /// `restore` is re-applied once `timer` reaches zero
    Restore { restore: ActionEvent, timer: f64 },
    /// `event` is applied on a sync trigger of a later round than `round`
    Sync { event: ActionEvent, round: u32 },
}

#[derive(Debug, Clone)]
pub struct TransientState {
    window_ms: f64,
    pending: BTreeMap<TransientKey, Pending>,
    sync_triggered: bool,
    /// Advanced on every flush; the trigger raised together with a deferral
    /// does not release it
    round: u32,
}

impl Default for TransientState {
    fn default() -> Self {
        Self::new(DEFAULT_RESTORE_WINDOW_MS)
    }
}

impl TransientState {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms: window_ms.max(0.0),
            pending: BTreeMap::new(),
            sync_triggered: false,
            round: 0,
        }
    }

    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    pub fn set_window_ms(&mut self, window_ms: f64) {
        self.window_ms = window_ms.max(0.0);
    }

    pub fn get(&self, key: TransientKey) -> Option<&Pending> {
        self.pending.get(&key)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Arm a restore of `restore` after the window
    ///
    /// A press on a target that is already waiting to restore keeps the
    /// first restore value and only restarts the timer.
    pub fn press(&mut self, key: TransientKey, restore: ActionEvent) {
        let restore = match self.pending.get(&key) {
            Some(Pending::Restore { restore: earlier, .. }) => *earlier,
            _ => restore,
        };
        trace!("transient press {:?} -> restore {}", key, restore);
        self.pending
            .insert(key, Pending::Restore { restore, timer: self.window_ms });
    }

    /// Hold `event` until the next sync trigger, replacing any pending entry
    pub fn defer(&mut self, key: TransientKey, event: ActionEvent) {
        trace!("transient defer {:?} -> {}", key, event);
        self.pending.insert(key, Pending::Sync { event, round: self.round });
    }

    /// Request a flush of every deferred entry on the next [`Self::take_synced`]
    pub fn trigger_sync(&mut self) {
        self.sync_triggered = true;
    }

    pub fn sync_triggered(&self) -> bool {
        self.sync_triggered
    }

    /// Drain deferred events if a trigger is pending
    ///
    /// Entries deferred since the previous flush stay queued, so a key that
    /// both defers a change and raises the trigger waits for the next one.
    pub fn take_synced(&mut self) -> Vec<ActionEvent> {
        if !std::mem::take(&mut self.sync_triggered) {
            return Vec::new();
        }
        let current = self.round;
        let mut events = Vec::new();
        self.pending.retain(|_, pending| match pending {
            Pending::Sync { event, round } if *round != current => {
                events.push(*event);
                false
            }
            _ => true,
        });
        self.round = self.round.wrapping_add(1);
        events
    }

    /// Advance restore timers by `dt` ms and drain the ones that expired
    pub fn update(&mut self, dt: f64) -> Vec<ActionEvent> {
        let mut expired = Vec::new();
        self.pending.retain(|_, pending| match pending {
            Pending::Restore { restore, timer } => {
                *timer -= dt;
                if *timer <= 0.0 {
                    expired.push(*restore);
                    false
                } else {
                    true
                }
            }
            Pending::Sync { .. } => true,
        });
        expired
    }

    /// Drop all pending entries and any trigger
    pub fn reset(&mut self) {
        self.pending.clear();
        self.sync_triggered = false;
        self.round = 0;
    }
}
