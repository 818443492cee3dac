//! Transitions: timelines that drive a value on an animatable.
//!
//! A `Transition<B>` combines a `Timeline`, an `Interval` and a target
//! `AnimatableId`. On every new frame it hands the timeline progress to its
//! behavior `B`, which computes the value and writes it to the target.
//!
//! Targets live in an [`Animatables`] arena owned by the caller, so the
//! methods that may touch a target take the arena explicitly:
//!
//! ```
//! use gtd_animation::{Animatables, ManualFrameClock, PropertyTransition};
//! # use gtd_animation::{Animatable, PropertySpec, Value, ValueType};
//! # struct Row { opacity: f64 }
//! # impl Animatable for Row {
//! #     fn find_property(&self, name: &str) -> Option<PropertySpec> {
//! #         (name == "opacity").then(|| PropertySpec::new(name, ValueType::Double))
//! #     }
//! #     fn initial_state(&self, _: &str) -> Option<Value> { Some(Value::Double(self.opacity)) }
//! #     fn set_final_state(&mut self, _: &str, value: Value) {
//! #         self.opacity = value.as_f64().unwrap_or(self.opacity);
//! #     }
//! # }
//!
//! let clock = ManualFrameClock::new();
//! let mut targets = Animatables::new();
//! let row = targets.insert(Row { opacity: 1.0 });
//!
//! let mut fade = PropertyTransition::new("opacity", 200);
//! fade.set_frame_clock(Some(clock.clone()));
//! fade.set_to(0.0).unwrap();
//! fade.set_animatable(Some(row), &mut targets);
//! fade.start();
//!
//! while fade.is_playing() {
//!     for signal in clock.advance(16) {
//!         fade.handle_signal(&signal, &mut targets);
//!     }
//! }
//! ```

use std::rc::Rc;

use tracing::{trace, warn};

use crate::animatable::{Animatable, AnimatableId, Animatables};
use crate::clock::{ClockSignal, FrameClock};
use crate::easing::{EasingMode, StepMode};
use crate::error::Result;
use crate::events::TimelineEvent;
use crate::interval::Interval;
use crate::timeline::{Direction, ObserverId, ProgressCallback, Timeline, TimelineDelegate};
use crate::value::Value;

/// Per-kind hooks of a transition.
///
/// Every hook defaults to doing nothing.
pub trait TransitionBehavior {
    /// A target was bound to the transition.
    fn attached(&mut self, _target: &mut dyn Animatable, _interval: Option<&mut Interval>) {}

    /// The target was unbound, or was released after the last run.
    fn detached(&mut self) {}

    /// Compute the value at `progress` and write it to `target`.
    fn compute_value(
        &mut self,
        _timeline: &Timeline,
        _target: &mut dyn Animatable,
        _interval: &Interval,
        _progress: f64,
    ) {
    }

    fn started(&mut self, _timeline: &Timeline) {}

    fn completed(&mut self, _timeline: &Timeline) {}
}

impl TransitionBehavior for () {}

#[derive(Debug)]
pub struct Transition<B> {
    pub(crate) timeline: Timeline,
    pub(crate) interval: Option<Interval>,
    pub(crate) animatable: Option<AnimatableId>,
    pub(crate) remove_on_complete: bool,
    pub(crate) behavior: B,
}

/// Routes timeline events of one transition to its behavior.
struct TransitionHooks<'a, B> {
    behavior: &'a mut B,
    interval: &'a Option<Interval>,
    animatable: &'a mut Option<AnimatableId>,
    remove_on_complete: bool,
    animatables: Option<&'a mut Animatables>,
}

impl<B: TransitionBehavior> TimelineDelegate for TransitionHooks<'_, B> {
    fn timeline_event(&mut self, timeline: &mut Timeline, event: &TimelineEvent) {
        match event {
            TimelineEvent::Started => self.behavior.started(timeline),
            TimelineEvent::Completed => self.behavior.completed(timeline),
            TimelineEvent::NewFrame { .. } => {
                let (Some(interval), Some(id)) = (self.interval.as_ref(), *self.animatable) else {
                    return;
                };
                let Some(animatables) = self.animatables.as_deref_mut() else {
                    return;
                };
                let Some(target) = animatables.get_mut(id) else {
                    trace!(timeline = %timeline.id(), "animatable is gone, skipping frame");
                    return;
                };
                let progress = timeline.progress();
                self.behavior.compute_value(timeline, target, interval, progress);
            }
            TimelineEvent::Stopped { is_finished: true } if self.remove_on_complete => {
                if self.animatable.take().is_some() {
                    trace!(timeline = %timeline.id(), "releasing animatable after completion");
                    self.behavior.detached();
                }
            }
            TimelineEvent::Paused | TimelineEvent::Stopped { .. } => {}
        }
    }
}

impl<B: TransitionBehavior> Transition<B> {
    pub fn with_behavior(duration: u32, behavior: B) -> Self {
        Self::with_timeline(Timeline::new(duration), behavior)
    }

    /// Build a transition around an already configured timeline.
    pub fn with_timeline(timeline: Timeline, behavior: B) -> Self {
        Self {
            timeline,
            interval: None,
            animatable: None,
            remove_on_complete: false,
            behavior,
        }
    }

    fn split<'a>(
        &'a mut self,
        animatables: Option<&'a mut Animatables>,
    ) -> (&'a mut Timeline, TransitionHooks<'a, B>) {
        let Self {
            timeline,
            interval,
            animatable,
            remove_on_complete,
            behavior,
        } = self;
        let hooks = TransitionHooks {
            behavior,
            interval,
            animatable,
            remove_on_complete: *remove_on_complete,
            animatables,
        };
        (timeline, hooks)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    // ---------------------------------------------------------------------
    // Interval and target
    // ---------------------------------------------------------------------

    pub fn interval(&self) -> Option<&Interval> {
        self.interval.as_ref()
    }

    pub fn set_interval(&mut self, interval: Option<Interval>) {
        self.interval = interval;
    }

    /// Set the initial value, creating an interval of the value's type when
    /// there is none yet.
    pub fn set_from(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match &mut self.interval {
            Some(interval) => interval.set_initial(value),
            None => {
                let mut interval = Interval::new(value.value_type())?;
                interval.set_initial(value)?;
                self.interval = Some(interval);
                Ok(())
            }
        }
    }

    /// Set the final value, creating an interval of the value's type when
    /// there is none yet.
    pub fn set_to(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match &mut self.interval {
            Some(interval) => interval.set_final(value),
            None => {
                let mut interval = Interval::new(value.value_type())?;
                interval.set_final(value)?;
                self.interval = Some(interval);
                Ok(())
            }
        }
    }

    pub fn animatable(&self) -> Option<AnimatableId> {
        self.animatable
    }

    /// Bind the transition to a target, detaching the previous one.
    pub fn set_animatable(&mut self, animatable: Option<AnimatableId>, animatables: &mut Animatables) {
        if self.animatable == animatable {
            return;
        }

        if self.animatable.take().is_some() {
            self.behavior.detached();
        }

        let Some(id) = animatable else {
            return;
        };
        match animatables.get_mut(id) {
            Some(target) => {
                self.animatable = Some(id);
                self.behavior.attached(target, self.interval.as_mut());
            }
            None => warn!(timeline = %self.timeline.id(), "cannot attach to a removed animatable"),
        }
    }

    pub fn remove_on_complete(&self) -> bool {
        self.remove_on_complete
    }

    /// Release the target once the last run finishes.
    pub fn set_remove_on_complete(&mut self, remove_on_complete: bool) {
        self.remove_on_complete = remove_on_complete;
    }

    // ---------------------------------------------------------------------
    // Timeline lifecycle
    // ---------------------------------------------------------------------

    pub fn set_frame_clock(&mut self, clock: Option<Rc<dyn FrameClock>>) {
        let (timeline, mut hooks) = self.split(None);
        timeline.set_frame_clock_with(clock, &mut hooks);
    }

    pub fn start(&mut self) {
        let (timeline, mut hooks) = self.split(None);
        timeline.start_with(&mut hooks);
    }

    pub fn pause(&mut self) {
        let (timeline, mut hooks) = self.split(None);
        timeline.pause_with(&mut hooks);
    }

    pub fn stop(&mut self) {
        let (timeline, mut hooks) = self.split(None);
        timeline.stop_with(&mut hooks);
    }

    pub fn rewind(&mut self) {
        self.timeline.rewind();
    }

    pub fn skip(&mut self, msecs: u32) {
        self.timeline.skip(msecs);
    }

    pub fn advance(&mut self, msecs: u32) {
        self.timeline.advance(msecs);
    }

    /// Process a frame clock signal, writing to targets in `animatables`.
    pub fn handle_signal(&mut self, signal: &ClockSignal, animatables: &mut Animatables) {
        let (timeline, mut hooks) = self.split(Some(animatables));
        timeline.handle_signal_with(signal, &mut hooks);
    }

    pub fn is_playing(&self) -> bool {
        self.timeline.is_playing()
    }

    pub fn progress(&self) -> f64 {
        self.timeline.progress()
    }

    pub fn connect<F>(&mut self, handler: F) -> ObserverId
    where
        F: FnMut(&mut Timeline, &TimelineEvent) + 'static,
    {
        self.timeline.connect(handler)
    }

    pub fn disconnect(&mut self, id: ObserverId) {
        self.timeline.disconnect(id);
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = TimelineEvent> + '_ {
        self.timeline.drain_events()
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.timeline.set_duration(duration);
    }

    pub fn set_delay(&mut self, delay: u32) {
        self.timeline.set_delay(delay);
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.timeline.set_direction(direction);
    }

    pub fn set_repeat_count(&mut self, count: i32) {
        self.timeline.set_repeat_count(count);
    }

    pub fn set_auto_reverse(&mut self, auto_reverse: bool) {
        self.timeline.set_auto_reverse(auto_reverse);
    }

    pub fn set_progress_mode(&mut self, mode: EasingMode) {
        self.timeline.set_progress_mode(mode);
    }

    pub fn set_progress_func(&mut self, func: Option<ProgressCallback>) {
        self.timeline.set_progress_func(func);
    }

    pub fn set_step_progress(&mut self, n_steps: u32, step_mode: StepMode) {
        self.timeline.set_step_progress(n_steps, step_mode);
    }

    pub fn set_cubic_bezier_progress(&mut self, c1: (f64, f64), c2: (f64, f64)) {
        self.timeline.set_cubic_bezier_progress(c1, c2);
    }

    pub fn set_slowdown_factor(&mut self, factor: f64) {
        self.timeline.set_slowdown_factor(factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::PropertySpec;
    use crate::clock::ManualFrameClock;
    use crate::value::ValueType;
    use std::cell::RefCell;

    /// Records every hook call.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl TransitionBehavior for Recorder {
        fn attached(&mut self, _target: &mut dyn Animatable, _interval: Option<&mut Interval>) {
            self.calls.borrow_mut().push("attached".to_string());
        }

        fn detached(&mut self) {
            self.calls.borrow_mut().push("detached".to_string());
        }

        fn compute_value(
            &mut self,
            _timeline: &Timeline,
            target: &mut dyn Animatable,
            interval: &Interval,
            progress: f64,
        ) {
            self.calls.borrow_mut().push(format!("compute {:.2}", progress));
            if let Ok(value) = interval.compute(progress) {
                target.set_final_state("level", value);
            }
        }

        fn started(&mut self, _timeline: &Timeline) {
            self.calls.borrow_mut().push("started".to_string());
        }

        fn completed(&mut self, _timeline: &Timeline) {
            self.calls.borrow_mut().push("completed".to_string());
        }
    }

    struct Meter {
        level: Rc<RefCell<f64>>,
    }

    impl Animatable for Meter {
        fn find_property(&self, name: &str) -> Option<PropertySpec> {
            (name == "level").then(|| PropertySpec::new(name, ValueType::Double))
        }

        fn initial_state(&self, _name: &str) -> Option<Value> {
            Some(Value::Double(*self.level.borrow()))
        }

        fn set_final_state(&mut self, _name: &str, value: Value) {
            if let Some(level) = value.as_f64() {
                *self.level.borrow_mut() = level;
            }
        }
    }

    fn drive<B: TransitionBehavior>(
        clock: &ManualFrameClock,
        transition: &mut Transition<B>,
        targets: &mut Animatables,
        msecs: i64,
    ) {
        for signal in clock.advance(msecs) {
            transition.handle_signal(&signal, targets);
        }
    }

    #[test]
    fn test_set_from_creates_interval() {
        let mut transition = Transition::with_behavior(100, ());
        assert!(transition.interval().is_none());
        transition.set_from(2_i32).unwrap();
        assert_eq!(transition.interval().unwrap().value_type(), ValueType::Int);
        transition.set_to(8.9).unwrap();
        assert_eq!(transition.interval().unwrap().final_value(), Some(&Value::Int(8)));
    }

    #[test]
    fn test_hooks_follow_lifecycle() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let level = Rc::new(RefCell::new(0.0));
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let meter = targets.insert(Meter { level: Rc::clone(&level) });

        let mut transition = Transition::with_behavior(100, Recorder { calls: Rc::clone(&calls) });
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_interval(Some(Interval::with_values(ValueType::Double, 0.0, 10.0).unwrap()));
        transition.set_animatable(Some(meter), &mut targets);
        transition.start();

        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 50);
        drive(&clock, &mut transition, &mut targets, 50);

        assert_eq!(
            *calls.borrow(),
            vec![
                "attached",
                "started",
                "compute 0.00",
                "compute 0.50",
                "compute 1.00",
                "completed",
            ]
        );
        assert_eq!(*level.borrow(), 10.0);
        assert_eq!(transition.animatable(), Some(meter));
    }

    #[test]
    fn test_no_work_without_interval() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let meter = targets.insert(Meter { level: Rc::new(RefCell::new(0.0)) });

        let mut transition = Transition::with_behavior(100, Recorder { calls: Rc::clone(&calls) });
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_animatable(Some(meter), &mut targets);
        transition.start();
        drive(&clock, &mut transition, &mut targets, 0);

        assert!(!calls.borrow().iter().any(|call| call.starts_with("compute")));
    }

    #[test]
    fn test_remove_on_complete_releases_target() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let meter = targets.insert(Meter { level: Rc::new(RefCell::new(0.0)) });

        let mut transition = Transition::with_behavior(40, Recorder { calls: Rc::clone(&calls) });
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_to(1.0).unwrap();
        transition.set_from(0.0).unwrap();
        transition.set_remove_on_complete(true);
        transition.set_animatable(Some(meter), &mut targets);
        transition.start();

        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 40);

        assert_eq!(transition.animatable(), None);
        assert_eq!(calls.borrow().last().map(String::as_str), Some("detached"));
    }

    #[test]
    fn test_removed_target_is_skipped() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let meter = targets.insert(Meter { level: Rc::new(RefCell::new(0.0)) });

        let mut transition = Transition::with_behavior(100, Recorder { calls: Rc::clone(&calls) });
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_interval(Some(Interval::with_values(ValueType::Double, 0.0, 1.0).unwrap()));
        transition.set_animatable(Some(meter), &mut targets);
        targets.remove(meter);
        transition.start();
        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 10);

        assert!(transition.is_playing());
        assert!(!calls.borrow().iter().any(|call| call.starts_with("compute")));
    }

    #[test]
    fn test_rebinding_detaches_previous() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut targets = Animatables::new();
        let first = targets.insert(Meter { level: Rc::new(RefCell::new(0.0)) });
        let second = targets.insert(Meter { level: Rc::new(RefCell::new(0.0)) });

        let mut transition = Transition::with_behavior(100, Recorder { calls: Rc::clone(&calls) });
        transition.set_animatable(Some(first), &mut targets);
        transition.set_animatable(Some(first), &mut targets);
        transition.set_animatable(Some(second), &mut targets);
        transition.set_animatable(None, &mut targets);

        assert_eq!(
            *calls.borrow(),
            vec!["attached", "detached", "attached", "detached"]
        );
    }
}
