//! Frame clock abstraction.
//!
//! Timelines do not own a time source. They subscribe to a `FrameClock`,
//! which reports one `ClockSignal::Tick` per displayed frame and fires the
//! one-shot timeouts used for delayed starts. The signals are handed back to
//! the timeline through `Timeline::handle_signal`.
//!
//! `ManualFrameClock` is a headless clock driven explicitly with
//! [`ManualFrameClock::advance`], used by tests and by the demo binary.

use std::cell::RefCell;
use std::rc::Rc;

use crate::timeline::TimelineId;

/// Handle of a pending one-shot timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeoutId(pub u64);

/// A signal produced by a frame clock for one timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    /// A new frame is about to be drawn at `frame_time` (milliseconds).
    Tick { timeline: TimelineId, frame_time: i64 },
    /// A timeout registered with `add_timeout` elapsed.
    Timeout { timeline: TimelineId, timeout: TimeoutId },
}

impl ClockSignal {
    pub fn timeline(&self) -> TimelineId {
        match self {
            Self::Tick { timeline, .. } | Self::Timeout { timeline, .. } => *timeline,
        }
    }
}

/// Source of frame ticks and timeouts.
///
/// Clocks are shared between timelines through `Rc` and mutate their own
/// bookkeeping through interior mutability.
pub trait FrameClock {
    /// Current frame time in milliseconds.
    fn frame_time(&self) -> i64;

    /// Start delivering ticks to `timeline`.
    fn connect_tick(&self, timeline: TimelineId);

    /// Stop delivering ticks to `timeline`.
    fn disconnect_tick(&self, timeline: TimelineId);

    /// Fire a single `ClockSignal::Timeout` for `timeline` after `delay_ms`.
    fn add_timeout(&self, timeline: TimelineId, delay_ms: u32) -> TimeoutId;

    /// Cancel a pending timeout. Unknown ids are ignored.
    fn remove_timeout(&self, timeout: TimeoutId);
}

#[derive(Debug)]
struct PendingTimeout {
    id: TimeoutId,
    timeline: TimelineId,
    deadline: i64,
}

#[derive(Debug, Default)]
struct ManualClockState {
    now: i64,
    next_timeout: u64,
    subscribers: Vec<TimelineId>,
    timeouts: Vec<PendingTimeout>,
}

/// Frame clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualFrameClock {
    state: RefCell<ManualClockState>,
}

impl ManualFrameClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Create a clock whose current time is `now`.
    pub fn starting_at(now: i64) -> Rc<Self> {
        let clock = Self::default();
        clock.state.borrow_mut().now = now;
        Rc::new(clock)
    }

    pub fn now(&self) -> i64 {
        self.state.borrow().now
    }

    /// Move time forward by `msecs` and collect the resulting signals.
    ///
    /// Expired timeouts come first, ordered by deadline, followed by one tick
    /// per subscribed timeline in subscription order.
    pub fn advance(&self, msecs: i64) -> Vec<ClockSignal> {
        let now = self.state.borrow().now + msecs;
        self.set_time(now)
    }

    /// Jump to an absolute time and collect the resulting signals.
    ///
    /// Moving backwards is allowed and produces ticks with an earlier
    /// timestamp than the previous ones.
    pub fn set_time(&self, now: i64) -> Vec<ClockSignal> {
        let mut state = self.state.borrow_mut();
        state.now = now;

        let mut expired: Vec<PendingTimeout> = Vec::new();
        let mut index = 0;
        while index < state.timeouts.len() {
            if state.timeouts[index].deadline <= now {
                expired.push(state.timeouts.remove(index));
            } else {
                index += 1;
            }
        }
        expired.sort_by_key(|timeout| (timeout.deadline, timeout.id));

        let mut signals: Vec<ClockSignal> = expired
            .into_iter()
            .map(|timeout| ClockSignal::Timeout {
                timeline: timeout.timeline,
                timeout: timeout.id,
            })
            .collect();
        signals.extend(state.subscribers.iter().map(|&timeline| ClockSignal::Tick {
            timeline,
            frame_time: now,
        }));
        signals
    }

    pub fn is_connected(&self, timeline: TimelineId) -> bool {
        self.state.borrow().subscribers.contains(&timeline)
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    pub fn pending_timeouts(&self) -> usize {
        self.state.borrow().timeouts.len()
    }
}

impl FrameClock for ManualFrameClock {
    fn frame_time(&self) -> i64 {
        self.now()
    }

    fn connect_tick(&self, timeline: TimelineId) {
        let mut state = self.state.borrow_mut();
        if !state.subscribers.contains(&timeline) {
            state.subscribers.push(timeline);
        }
    }

    fn disconnect_tick(&self, timeline: TimelineId) {
        self.state
            .borrow_mut()
            .subscribers
            .retain(|&subscriber| subscriber != timeline);
    }

    fn add_timeout(&self, timeline: TimelineId, delay_ms: u32) -> TimeoutId {
        let mut state = self.state.borrow_mut();
        state.next_timeout += 1;
        let id = TimeoutId(state.next_timeout);
        let deadline = state.now + delay_ms as i64;
        state.timeouts.push(PendingTimeout {
            id,
            timeline,
            deadline,
        });
        id
    }

    fn remove_timeout(&self, timeout: TimeoutId) {
        self.state
            .borrow_mut()
            .timeouts
            .retain(|pending| pending.id != timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_follow_subscription_order() {
        let clock = ManualFrameClock::new();
        let a = TimelineId::new();
        let b = TimelineId::new();
        clock.connect_tick(b);
        clock.connect_tick(a);
        clock.connect_tick(b);

        let signals = clock.advance(16);
        assert_eq!(
            signals,
            vec![
                ClockSignal::Tick { timeline: b, frame_time: 16 },
                ClockSignal::Tick { timeline: a, frame_time: 16 },
            ]
        );

        clock.disconnect_tick(b);
        assert!(!clock.is_connected(b));
        assert_eq!(clock.advance(16).len(), 1);
    }

    #[test]
    fn test_timeouts_fire_once_before_ticks() {
        let clock = ManualFrameClock::new();
        let timeline = TimelineId::new();
        clock.connect_tick(timeline);
        let timeout = clock.add_timeout(timeline, 100);

        assert_eq!(clock.advance(50).len(), 1);
        let signals = clock.advance(50);
        assert_eq!(signals[0], ClockSignal::Timeout { timeline, timeout });
        assert_eq!(signals[1], ClockSignal::Tick { timeline, frame_time: 100 });
        assert_eq!(clock.pending_timeouts(), 0);
        assert_eq!(clock.advance(100).len(), 1);
    }

    #[test]
    fn test_removed_timeout_never_fires() {
        let clock = ManualFrameClock::new();
        let timeline = TimelineId::new();
        let timeout = clock.add_timeout(timeline, 10);
        clock.remove_timeout(timeout);
        assert!(clock.advance(20).is_empty());
    }

    #[test]
    fn test_set_time_can_roll_back() {
        let clock = ManualFrameClock::starting_at(1000);
        let timeline = TimelineId::new();
        clock.connect_tick(timeline);
        let signals = clock.set_time(900);
        assert_eq!(signals, vec![ClockSignal::Tick { timeline, frame_time: 900 }]);
        assert_eq!(clock.frame_time(), 900);
    }
}
