//! Timeline scheduling.
//!
//! A `Timeline` tracks elapsed time over a fixed duration and turns frame
//! clock ticks into lifecycle events:
//!
//! ```text
//! Idle --start()--> Delaying --timeout--> Playing --last completion--> Idle
//!   \________________start() with no delay_____^
//! ```
//!
//! While playing, every tick advances `elapsed_time` by the time since the
//! previous tick, in the current direction, and emits `NewFrame`. Reaching the
//! end of the duration emits `Completed`; the timeline then either loops
//! (wrapping the overflow of the last tick into the next run, and reversing
//! direction when `auto_reverse` is set) or stops with
//! `Stopped { is_finished: true }`.
//!
//! Events reach, in order, the observers registered with [`Timeline::connect`]
//! and then the optional [`TimelineDelegate`] passed to the `*_with` methods.
//! Observers receive the timeline mutably and may pause, stop or seek it from
//! inside a handler. A handler that moves `elapsed_time` during the final frame
//! of a run cancels the completion of that run.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use gtd_config::AnimationConfig;

use crate::clock::{ClockSignal, FrameClock, TimeoutId};
use crate::easing::{ease_with_params, EasingMode, EasingParams, StepMode};
use crate::events::{EventQueue, TimelineEvent};

/// Process-unique identifier of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimelineId(pub u64);

impl TimelineId {
    /// Generate a new unique timeline ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction in which elapsed time moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Handle returned by [`Timeline::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Rc<RefCell<Box<dyn FnMut(&mut Timeline, &TimelineEvent)>>>;

/// Custom progress function: `(elapsed, duration) -> progress`.
pub type ProgressCallback = Box<dyn Fn(f64, f64) -> f64>;

/// Receives the events of a timeline after its observers.
///
/// Transitions implement this to react to frames without registering
/// closures that would need access to their own state.
pub trait TimelineDelegate {
    fn timeline_event(&mut self, timeline: &mut Timeline, event: &TimelineEvent);
}

impl TimelineDelegate for () {
    fn timeline_event(&mut self, _timeline: &mut Timeline, _event: &TimelineEvent) {}
}

pub struct Timeline {
    id: TimelineId,
    clock: Option<Rc<dyn FrameClock>>,
    delay_source: Option<TimeoutId>,

    duration: u32,
    delay: u32,
    direction: Direction,
    elapsed_time: i64,
    msecs_delta: i64,
    last_frame_time: i64,

    repeat_count: i32,
    current_repeat: i32,
    auto_reverse: bool,

    is_playing: bool,
    waiting_first_tick: bool,
    in_frame: bool,

    progress_mode: EasingMode,
    progress_func: Option<ProgressCallback>,
    easing_params: EasingParams,
    slowdown_factor: f64,

    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    events: EventQueue,
}

impl Timeline {
    pub fn new(duration: u32) -> Self {
        Self {
            id: TimelineId::new(),
            clock: None,
            delay_source: None,
            duration,
            delay: 0,
            direction: Direction::Forward,
            elapsed_time: 0,
            msecs_delta: 0,
            last_frame_time: 0,
            repeat_count: 0,
            current_repeat: 0,
            auto_reverse: false,
            is_playing: false,
            waiting_first_tick: false,
            in_frame: false,
            progress_mode: EasingMode::Linear,
            progress_func: None,
            easing_params: EasingParams::default(),
            slowdown_factor: 1.0,
            observers: Vec::new(),
            next_observer: 0,
            events: EventQueue::new(),
        }
    }

    pub fn with_clock(duration: u32, clock: Rc<dyn FrameClock>) -> Self {
        let mut timeline = Self::new(duration);
        timeline.clock = Some(clock);
        timeline
    }

    /// Create a timeline using the configured duration, easing and slow-down.
    pub fn from_config(config: &AnimationConfig) -> Self {
        let mut timeline = Self::new(config.default_duration_ms);
        match EasingMode::from_name(&config.default_easing) {
            Some(EasingMode::Custom) | None => {
                warn!(easing = %config.default_easing, "unusable default easing, keeping linear");
            }
            Some(mode) => timeline.set_progress_mode(mode),
        }
        timeline.set_slowdown_factor(config.slowdown_factor);
        timeline
    }

    pub fn id(&self) -> TimelineId {
        self.id
    }

    // ---------------------------------------------------------------------
    // Frame clock
    // ---------------------------------------------------------------------

    pub fn frame_clock(&self) -> Option<&Rc<dyn FrameClock>> {
        self.clock.as_ref()
    }

    /// Attach or detach the frame clock.
    ///
    /// Changing the clock pauses the timeline and cancels a pending delayed
    /// start.
    pub fn set_frame_clock(&mut self, clock: Option<Rc<dyn FrameClock>>) {
        self.set_frame_clock_with(clock, &mut ());
    }

    pub fn set_frame_clock_with(
        &mut self,
        clock: Option<Rc<dyn FrameClock>>,
        delegate: &mut dyn TimelineDelegate,
    ) {
        let unchanged = match (&self.clock, &clock) {
            (Some(current), Some(new)) => std::ptr::addr_eq(Rc::as_ptr(current), Rc::as_ptr(new)),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        self.pause_with(delegate);
        self.clock = clock;
    }

    // ---------------------------------------------------------------------
    // Playback control
    // ---------------------------------------------------------------------

    pub fn start(&mut self) {
        self.start_with(&mut ());
    }

    /// Start playback, or schedule it after the delay.
    ///
    /// Does nothing while delaying or playing, for a zero duration, or without
    /// a frame clock.
    pub fn start_with(&mut self, delegate: &mut dyn TimelineDelegate) {
        if self.delay_source.is_some() || self.is_playing {
            return;
        }
        if self.duration == 0 {
            warn!(timeline = %self.id, "not starting a timeline with zero duration");
            return;
        }
        let Some(clock) = self.clock.clone() else {
            warn!(timeline = %self.id, "not starting a timeline without a frame clock");
            return;
        };

        if self.delay > 0 {
            debug!(timeline = %self.id, delay = self.delay, "delaying start");
            self.delay_source = Some(clock.add_timeout(self.id, self.delay));
        } else {
            self.msecs_delta = 0;
            self.set_is_playing(true);
            self.emit(TimelineEvent::Started, delegate);
        }
    }

    pub fn pause(&mut self) {
        self.pause_with(&mut ());
    }

    /// Pause playback, cancelling a pending delayed start.
    pub fn pause_with(&mut self, delegate: &mut dyn TimelineDelegate) {
        if self.delay_source.is_none() && !self.is_playing {
            return;
        }

        if let Some(timeout) = self.delay_source.take() {
            if let Some(clock) = &self.clock {
                clock.remove_timeout(timeout);
            }
        }

        if !self.is_playing {
            return;
        }

        self.msecs_delta = 0;
        self.set_is_playing(false);
        self.emit(TimelineEvent::Paused, delegate);
    }

    pub fn stop(&mut self) {
        self.stop_with(&mut ());
    }

    /// Pause and rewind. Emits `Stopped { is_finished: false }` only when the
    /// timeline was playing.
    pub fn stop_with(&mut self, delegate: &mut dyn TimelineDelegate) {
        let was_playing = self.is_playing;
        self.pause_with(delegate);
        self.rewind();
        if was_playing {
            self.emit(TimelineEvent::Stopped { is_finished: false }, delegate);
        }
    }

    /// Move to the start of the current direction.
    pub fn rewind(&mut self) {
        match self.direction {
            Direction::Forward => self.advance(0),
            Direction::Backward => self.advance(self.duration),
        }
    }

    /// Move `msecs` in the current direction without emitting events.
    ///
    /// Going past the end lands on 1 (forward) or `duration - 1` (backward)
    /// instead of wrapping by the overshoot.
    pub fn skip(&mut self, msecs: u32) {
        let duration = self.duration as i64;
        match self.direction {
            Direction::Forward => {
                self.elapsed_time += msecs as i64;
                if self.elapsed_time > duration {
                    self.elapsed_time = 1;
                }
            }
            Direction::Backward => {
                self.elapsed_time -= msecs as i64;
                if self.elapsed_time < 1 {
                    self.elapsed_time = duration - 1;
                }
            }
        }
        self.msecs_delta = 0;
    }

    /// Seek to `msecs`, clamped to the duration, without emitting events.
    pub fn advance(&mut self, msecs: u32) {
        self.elapsed_time = msecs.min(self.duration) as i64;
    }

    // ---------------------------------------------------------------------
    // Clock signals
    // ---------------------------------------------------------------------

    pub fn handle_signal(&mut self, signal: &ClockSignal) {
        self.handle_signal_with(signal, &mut ());
    }

    /// Process a signal from the frame clock.
    ///
    /// Signals for other timelines are ignored, as are signals delivered
    /// from inside one of this timeline's own handlers.
    pub fn handle_signal_with(&mut self, signal: &ClockSignal, delegate: &mut dyn TimelineDelegate) {
        if signal.timeline() != self.id {
            return;
        }
        if self.in_frame {
            warn!(timeline = %self.id, "ignoring clock signal delivered from a timeline handler");
            return;
        }

        self.in_frame = true;
        match *signal {
            ClockSignal::Tick { frame_time, .. } => self.on_tick(frame_time, delegate),
            ClockSignal::Timeout { timeout, .. } => self.on_delay_elapsed(timeout, delegate),
        }
        self.in_frame = false;
    }

    fn on_delay_elapsed(&mut self, timeout: TimeoutId, delegate: &mut dyn TimelineDelegate) {
        if self.delay_source != Some(timeout) {
            trace!(timeline = %self.id, ?timeout, "stale delay timeout");
            return;
        }
        self.delay_source = None;
        self.msecs_delta = 0;
        self.set_is_playing(true);
        self.emit(TimelineEvent::Started, delegate);
    }

    fn on_tick(&mut self, frame_time: i64, delegate: &mut dyn TimelineDelegate) {
        if !self.is_playing {
            return;
        }

        let frame_time = self.scaled_time(frame_time);

        if self.waiting_first_tick {
            self.last_frame_time = frame_time;
            self.msecs_delta = 0;
            self.waiting_first_tick = false;
            self.process_frame(delegate);
            return;
        }

        let msecs = frame_time - self.last_frame_time;
        if msecs < 0 {
            debug!(
                timeline = %self.id,
                frame_time,
                last_frame_time = self.last_frame_time,
                "frame clock rolled back, dropping frame"
            );
            self.last_frame_time = frame_time;
            return;
        }

        if msecs != 0 {
            self.last_frame_time += msecs;
            self.msecs_delta = msecs;
            self.process_frame(delegate);
        }
    }

    fn scaled_time(&self, frame_time: i64) -> i64 {
        if self.slowdown_factor == 1.0 {
            frame_time
        } else {
            (frame_time as f64 / self.slowdown_factor) as i64
        }
    }

    fn process_frame(&mut self, delegate: &mut dyn TimelineDelegate) {
        if !self.do_frame(delegate) {
            debug!(timeline = %self.id, "timeline finished");
        }
    }

    /// Advance by `msecs_delta` and emit the frame events.
    ///
    /// Returns `false` once the timeline has finished without repeating.
    fn do_frame(&mut self, delegate: &mut dyn TimelineDelegate) -> bool {
        match self.direction {
            Direction::Forward => self.elapsed_time += self.msecs_delta,
            Direction::Backward => self.elapsed_time -= self.msecs_delta,
        }

        if !self.is_complete() {
            trace!(timeline = %self.id, elapsed = self.elapsed_time, "new frame");
            self.emit(TimelineEvent::NewFrame { elapsed_ms: self.elapsed_time }, delegate);
            return true;
        }

        let duration = self.duration as i64;
        let saved_direction = self.direction;
        let overflow = self.elapsed_time;

        self.elapsed_time = match self.direction {
            Direction::Forward => duration,
            Direction::Backward => 0,
        };
        let end_msecs = self.elapsed_time;

        self.emit(TimelineEvent::NewFrame { elapsed_ms: end_msecs }, delegate);

        // A handler moved the playhead, so this run did not end here.
        if self.elapsed_time != end_msecs {
            return true;
        }

        let is_last_run = self.repeat_count == 0 || self.current_repeat == self.repeat_count;
        debug!(
            timeline = %self.id,
            repeat = self.current_repeat,
            repeat_count = self.repeat_count,
            is_last_run,
            "run completed"
        );
        if is_last_run {
            self.set_is_playing(false);
            self.emit(TimelineEvent::Completed, delegate);
            self.emit(TimelineEvent::Stopped { is_finished: true }, delegate);
        } else {
            self.emit(TimelineEvent::Completed, delegate);
        }

        self.current_repeat += 1;

        if self.auto_reverse {
            self.direction = self.direction.reversed();
        }

        // 0 and duration are the same position across a loop.
        let moved = self.elapsed_time != end_msecs
            && !((self.elapsed_time == 0 && end_msecs == duration)
                || (self.elapsed_time == duration && end_msecs == 0));
        if moved {
            return true;
        }

        if self.repeat_count != 0 {
            self.elapsed_time = match saved_direction {
                Direction::Forward => overflow - duration,
                Direction::Backward => duration + overflow,
            };
            if self.direction != saved_direction {
                self.elapsed_time = duration - self.elapsed_time;
            }
            true
        } else {
            self.rewind();
            false
        }
    }

    fn set_is_playing(&mut self, is_playing: bool) {
        if self.is_playing == is_playing {
            return;
        }
        self.is_playing = is_playing;

        if is_playing {
            self.waiting_first_tick = true;
            self.current_repeat = 0;
            if let Some(clock) = &self.clock {
                self.last_frame_time = self.scaled_time(clock.frame_time());
                clock.connect_tick(self.id);
            }
        } else if let Some(clock) = &self.clock {
            clock.disconnect_tick(self.id);
        }
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Register a handler called synchronously for every event.
    pub fn connect<F>(&mut self, handler: F) -> ObserverId
    where
        F: FnMut(&mut Timeline, &TimelineEvent) + 'static,
    {
        self.next_observer += 1;
        let id = ObserverId(self.next_observer);
        self.observers.push((id, Rc::new(RefCell::new(Box::new(handler)))));
        id
    }

    /// Remove a handler. Takes effect immediately, even mid-emission.
    pub fn disconnect(&mut self, id: ObserverId) {
        self.observers.retain(|(observer, _)| *observer != id);
    }

    /// Drain the events recorded since the last call.
    pub fn drain_events(&mut self) -> impl Iterator<Item = TimelineEvent> + '_ {
        self.events.drain()
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    fn emit(&mut self, event: TimelineEvent, delegate: &mut dyn TimelineDelegate) {
        trace!(timeline = %self.id, event = event.name(), elapsed = self.elapsed_time, "emit");
        self.events.push(event);

        let snapshot: Vec<(ObserverId, Observer)> = self
            .observers
            .iter()
            .map(|(id, observer)| (*id, Rc::clone(observer)))
            .collect();

        for (id, observer) in snapshot {
            if !self.observers.iter().any(|(current, _)| *current == id) {
                continue;
            }
            // A handler that is already running does not see the events it causes.
            let Ok(mut handler) = observer.try_borrow_mut() else {
                continue;
            };
            (*handler)(self, &event);
        }

        delegate.timeline_event(self, &event);
    }

    // ---------------------------------------------------------------------
    // Progress
    // ---------------------------------------------------------------------

    /// Progress of the current run.
    ///
    /// The linear mode returns `elapsed / duration`; other modes map it
    /// through their easing curve or the custom progress function.
    pub fn progress(&self) -> f64 {
        let elapsed = self.elapsed_time as f64;
        let duration = self.duration as f64;

        if let Some(func) = &self.progress_func {
            return func(elapsed, duration);
        }
        if self.duration == 0 {
            return 1.0;
        }
        if self.progress_mode == EasingMode::Linear {
            return elapsed / duration;
        }
        ease_with_params(self.progress_mode, elapsed, duration, &self.easing_params)
    }

    pub fn progress_mode(&self) -> EasingMode {
        self.progress_mode
    }

    /// Select a named easing curve. `Custom` is set through
    /// [`Timeline::set_progress_func`] instead.
    pub fn set_progress_mode(&mut self, mode: EasingMode) {
        if mode == EasingMode::Custom {
            warn!(timeline = %self.id, "use set_progress_func to install a custom progress function");
            return;
        }
        self.progress_func = None;
        self.progress_mode = mode;
    }

    /// Install a custom progress function, or go back to linear with `None`.
    pub fn set_progress_func(&mut self, func: Option<ProgressCallback>) {
        self.progress_mode = if func.is_some() {
            EasingMode::Custom
        } else {
            EasingMode::Linear
        };
        self.progress_func = func;
    }

    /// Use `n_steps` discrete steps as the progress mode.
    pub fn set_step_progress(&mut self, n_steps: u32, step_mode: StepMode) {
        if n_steps == 0 {
            warn!(timeline = %self.id, "step progress needs at least one step");
            return;
        }
        self.easing_params.n_steps = n_steps;
        self.easing_params.step_mode = step_mode;
        self.set_progress_mode(EasingMode::Steps);
    }

    pub fn step_progress(&self) -> (u32, StepMode) {
        (self.easing_params.n_steps, self.easing_params.step_mode)
    }

    /// Use a cubic bezier curve with control points `c1` and `c2` as the
    /// progress mode. The x coordinates are clamped to `[0, 1]`.
    pub fn set_cubic_bezier_progress(&mut self, c1: (f64, f64), c2: (f64, f64)) {
        self.easing_params.control_points =
            [c1.0.clamp(0.0, 1.0), c1.1, c2.0.clamp(0.0, 1.0), c2.1];
        self.set_progress_mode(EasingMode::CubicBezier);
    }

    pub fn cubic_bezier_progress(&self) -> ((f64, f64), (f64, f64)) {
        let [x1, y1, x2, y2] = self.easing_params.control_points;
        ((x1, y1), (x2, y2))
    }

    // ---------------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------------

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.duration = duration;
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn set_delay(&mut self, delay: u32) {
        self.delay = delay;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Change direction. At elapsed time 0 the playhead jumps to the
    /// duration.
    pub fn set_direction(&mut self, direction: Direction) {
        if self.direction == direction {
            return;
        }
        self.direction = direction;
        if self.elapsed_time == 0 {
            self.elapsed_time = self.duration as i64;
        }
    }

    pub fn elapsed_time(&self) -> i64 {
        self.elapsed_time
    }

    /// Milliseconds processed by the last frame, 0 when not playing.
    pub fn delta(&self) -> i64 {
        if self.is_playing { self.msecs_delta } else { 0 }
    }

    /// `-1` repeats forever, `0` plays once, `n` plays `n + 1` times.
    pub fn repeat_count(&self) -> i32 {
        self.repeat_count
    }

    pub fn set_repeat_count(&mut self, count: i32) {
        if count < -1 {
            warn!(timeline = %self.id, count, "invalid repeat count");
            return;
        }
        self.repeat_count = count;
    }

    pub fn current_repeat(&self) -> i32 {
        self.current_repeat
    }

    pub fn auto_reverse(&self) -> bool {
        self.auto_reverse
    }

    pub fn set_auto_reverse(&mut self, auto_reverse: bool) {
        self.auto_reverse = auto_reverse;
    }

    pub fn slowdown_factor(&self) -> f64 {
        self.slowdown_factor
    }

    /// Divide the time reported by the frame clock by `factor`.
    pub fn set_slowdown_factor(&mut self, factor: f64) {
        if factor.is_nan() || factor <= 0.0 {
            warn!(timeline = %self.id, factor, "slowdown factor must be positive");
            return;
        }
        self.slowdown_factor = factor;
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// A delayed start is pending.
    pub fn is_delaying(&self) -> bool {
        self.delay_source.is_some()
    }

    /// The playhead sits at the end of the current direction.
    pub fn is_complete(&self) -> bool {
        match self.direction {
            Direction::Forward => self.elapsed_time >= self.duration as i64,
            Direction::Backward => self.elapsed_time <= 0,
        }
    }

    /// Total playing time including repeats, `None` when repeating forever.
    pub fn duration_hint(&self) -> Option<i64> {
        if self.repeat_count < 0 {
            None
        } else {
            Some((self.repeat_count as i64 + 1) * self.duration as i64)
        }
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("id", &self.id)
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("direction", &self.direction)
            .field("elapsed_time", &self.elapsed_time)
            .field("repeat_count", &self.repeat_count)
            .field("current_repeat", &self.current_repeat)
            .field("auto_reverse", &self.auto_reverse)
            .field("is_playing", &self.is_playing)
            .field("progress_mode", &self.progress_mode)
            .finish_non_exhaustive()
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        if let Some(clock) = &self.clock {
            if let Some(timeout) = self.delay_source.take() {
                clock.remove_timeout(timeout);
            }
            if self.is_playing {
                clock.disconnect_tick(self.id);
            }
        }
    }
}
