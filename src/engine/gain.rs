//! Gain Automation
//!
//! A per-voice volume multiplier whose value can change over time. Volume
//! changes are scheduled as linear ramps against the output clock; a new ramp
//! always replaces whatever was scheduled before it.

// ============================================================================
// Constants
// ============================================================================

/// Minimum linear gain
const MIN_GAIN: f32 = 0.0;

/// Maximum linear gain
const MAX_GAIN: f32 = 1.0;

// ============================================================================
// Automation Events
// ============================================================================

/// A scheduled change on a gain timeline
#[derive(Debug, Clone, Copy, PartialEq)]
enum GainEvent {
    /// Jump to `value` at `time`
    Set { time: f64, value: f32 },
    /// Move linearly from the previous event's value, reaching `value` at `end_time`
    LinearRamp { end_time: f64, value: f32 },
}

impl GainEvent {
    fn time(&self) -> f64 {
        match self {
            GainEvent::Set { time, .. } => *time,
            GainEvent::LinearRamp { end_time, .. } => *end_time,
        }
    }
}

// ============================================================================
// Gain Parameter
// ============================================================================

/// Time-varying linear gain, evaluated against an output clock in seconds
///
/// # Example
/// ```
/// use soundscapes::engine::GainParam;
///
/// let mut gain = GainParam::new(0.0);
/// gain.ramp_to(1.0, 0.0, 2.0);
/// assert_eq!(gain.value_at(1.0), 0.5);
/// assert_eq!(gain.value_at(5.0), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GainParam {
    /// Value before the first scheduled event
    base: f32,
    /// Scheduled events, ordered by time
    events: Vec<GainEvent>,
}

impl GainParam {
    /// Create a gain fixed at `value` (clamped to 0.0..=1.0)
    pub fn new(value: f32) -> Self {
        Self {
            base: value.clamp(MIN_GAIN, MAX_GAIN),
            events: Vec::new(),
        }
    }

    /// Evaluate the gain at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev_time = f64::NEG_INFINITY;
        let mut prev_value = self.base;

        for event in &self.events {
            match *event {
                GainEvent::Set { time: at, value } => {
                    if at > time {
                        break;
                    }
                    prev_time = at;
                    prev_value = value;
                }
                GainEvent::LinearRamp { end_time, value } => {
                    if end_time <= time {
                        prev_time = end_time;
                        prev_value = value;
                        continue;
                    }
                    if time <= prev_time || !prev_time.is_finite() {
                        return prev_value;
                    }
                    let progress = (time - prev_time) / (end_time - prev_time);
                    return prev_value + (value - prev_value) * progress as f32;
                }
            }
        }

        prev_value
    }

    /// Drop every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|event| event.time() < time);
    }

    /// Jump to `value` at `time`
    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.push(GainEvent::Set {
            time,
            value: value.clamp(MIN_GAIN, MAX_GAIN),
        });
    }

    /// Ramp linearly to `value`, arriving at `end_time`
    pub fn linear_ramp_to(&mut self, value: f32, end_time: f64) {
        self.push(GainEvent::LinearRamp {
            end_time,
            value: value.clamp(MIN_GAIN, MAX_GAIN),
        });
    }

    /// Replace any scheduled automation with a ramp from the current value
    ///
    /// Captures the value at `now`, cancels everything scheduled from `now`
    /// on, then ramps to `target` over `duration_secs`. A non-positive
    /// duration applies `target` immediately.
    pub fn ramp_to(&mut self, target: f32, now: f64, duration_secs: f64) {
        let current = self.value_at(now);
        self.cancel_scheduled_values(now);

        if duration_secs <= 0.0 {
            self.set_value_at(target, now);
            return;
        }

        self.set_value_at(current, now);
        self.linear_ramp_to(target, now + duration_secs);
    }

    fn push(&mut self, event: GainEvent) {
        let at = event.time();
        let index = self
            .events
            .iter()
            .position(|existing| existing.time() > at)
            .unwrap_or(self.events.len());
        self.events.insert(index, event);
    }
}

impl Default for GainParam {
    fn default() -> Self {
        Self::new(MAX_GAIN)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
