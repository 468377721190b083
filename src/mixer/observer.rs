//! Change notifications for whatever displays the mixer.

use std::sync::Mutex;
use std::time::Duration;

use crate::mixer::layer::LayerKind;

/// Receives fire-and-forget notifications from the mixer and the timer
///
/// Both methods default to doing nothing.
pub trait MixerObserver: Send + Sync {
    /// A layer started or stopped
    fn on_layer_state_changed(&self, _layer: LayerKind, _playing: bool) {}

    /// The countdown changed; `remaining` is None when no timer is running
    fn on_timer_tick(&self, _remaining: Option<Duration>, _expired: bool) {}
}

/// A notification as recorded by [`EventLog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerEvent {
    LayerStateChanged { layer: LayerKind, playing: bool },
    TimerTick { remaining: Option<Duration>, expired: bool },
}

/// Observer that keeps every notification in order
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<MixerEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<MixerEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<MixerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn push(&self, event: MixerEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl MixerObserver for EventLog {
    fn on_layer_state_changed(&self, layer: LayerKind, playing: bool) {
        self.push(MixerEvent::LayerStateChanged { layer, playing });
    }

    fn on_timer_tick(&self, remaining: Option<Duration>, expired: bool) {
        self.push(MixerEvent::TimerTick { remaining, expired });
    }
}
