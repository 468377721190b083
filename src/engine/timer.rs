//! Playback Timer
//!
//! Sleep-timer countdown. Once armed, the host calls [`PlaybackTimer::tick`]
//! about once per second; when the countdown runs out the timer stops every
//! layer exactly once and reports expiry.
//!
//! State machine:
//! ```text
//! Unset --set_timer(n>0)--> Armed --tick, remaining > 0--> Armed
//!   ^                         |
//!   +----set_timer(0)---------+--tick, remaining <= 0--> Expired
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::mixer::observer::MixerObserver;

/// How often the host is expected to call `tick`
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Clock
// ============================================================================

/// Source of "now" for the countdown
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// # Example
/// ```
/// use std::time::Duration;
/// use soundscapes::engine::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now() - start, Duration::from_secs(5));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

// ============================================================================
// Stop Target
// ============================================================================

/// Anything the timer can silence on expiry
pub trait StopAll {
    fn stop_all(&mut self);
}

// ============================================================================
// Timer State
// ============================================================================

/// Countdown states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    /// No countdown (default state)
    #[default]
    Unset,
    /// Counting down to `ends_at`
    Armed { ends_at: Instant },
    /// The countdown ran out and playback was stopped
    Expired,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerState::Unset => write!(f, "Unset"),
            TimerState::Armed { .. } => write!(f, "Armed"),
            TimerState::Expired => write!(f, "Expired"),
        }
    }
}

/// What a tick reports to the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Time left, or None when no timer is set or it has expired
    pub remaining: Option<Duration>,
    /// True exactly once, on the tick that stopped playback
    pub expired: bool,
}

impl fmt::Display for TimerTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.remaining, self.expired) {
            (_, true) => write!(f, "Timer ended - Stopped"),
            (None, false) => write!(f, "No timer set"),
            (Some(remaining), false) => write!(f, "{} remaining", format_remaining(remaining)),
        }
    }
}

/// Format a duration as `m:ss`, flooring to whole seconds
///
/// ```
/// use std::time::Duration;
/// use soundscapes::engine::format_remaining;
///
/// assert_eq!(format_remaining(Duration::from_millis(125_999)), "2:05");
/// ```
pub fn format_remaining(remaining: Duration) -> String {
    let millis = remaining.as_millis();
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    format!("{}:{:02}", minutes, seconds)
}

// ============================================================================
// Playback Timer
// ============================================================================

/// Countdown that stops playback when it expires
pub struct PlaybackTimer<C: Clock = SystemClock> {
    clock: C,
    state: TimerState,
    observer: Option<Arc<dyn MixerObserver>>,
}

impl PlaybackTimer<SystemClock> {
    /// Create a timer on the wall clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PlaybackTimer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PlaybackTimer<C> {
    /// Create a timer on a custom clock
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: TimerState::Unset,
            observer: None,
        }
    }

    /// Attach an observer for tick notifications
    pub fn set_observer(&mut self, observer: Arc<dyn MixerObserver>) {
        self.observer = Some(observer);
    }

    /// Arm, re-arm, or clear the countdown
    ///
    /// Any countdown already running is cancelled first. `minutes == 0`
    /// leaves the timer unset. Emits an immediate tick either way.
    pub fn set_timer(&mut self, minutes: u32) -> TimerTick {
        if let TimerState::Armed { .. } = self.state {
            debug!("[TIMER] Cancelled running countdown");
        }

        if minutes == 0 {
            self.state = TimerState::Unset;
            let tick = TimerTick {
                remaining: None,
                expired: false,
            };
            self.emit(tick);
            return tick;
        }

        let length = Duration::from_secs(u64::from(minutes) * 60);
        self.state = TimerState::Armed {
            ends_at: self.clock.now() + length,
        };
        info!("[TIMER] Armed for {} minute(s)", minutes);

        let tick = TimerTick {
            remaining: Some(length),
            expired: false,
        };
        self.emit(tick);
        tick
    }

    /// Recompute the remaining time, stopping `target` if it has run out
    ///
    /// Returns None when the timer is not armed (nothing to report).
    pub fn tick<S: StopAll + ?Sized>(&mut self, target: &mut S) -> Option<TimerTick> {
        let ends_at = match self.state {
            TimerState::Armed { ends_at } => ends_at,
            TimerState::Unset | TimerState::Expired => return None,
        };

        let now = self.clock.now();
        let tick = if now >= ends_at {
            self.state = TimerState::Expired;
            info!("[TIMER] Countdown finished, stopping all layers");
            target.stop_all();
            TimerTick {
                remaining: None,
                expired: true,
            }
        } else {
            TimerTick {
                remaining: Some(ends_at - now),
                expired: false,
            }
        };

        self.emit(tick);
        Some(tick)
    }

    /// Time left on an armed countdown
    pub fn remaining(&self) -> Option<Duration> {
        match self.state {
            TimerState::Armed { ends_at } => {
                Some(ends_at.saturating_duration_since(self.clock.now()))
            }
            _ => None,
        }
    }

    /// Current state
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Check if a countdown is running
    pub fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed { .. })
    }

    /// Check if the last countdown ran out
    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    fn emit(&self, tick: TimerTick) {
        if let Some(observer) = &self.observer {
            observer.on_timer_tick(tick.remaining, tick.expired);
        }
    }
}

impl<C: Clock + fmt::Debug> fmt::Debug for PlaybackTimer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackTimer")
            .field("clock", &self.clock)
            .field("state", &self.state)
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
