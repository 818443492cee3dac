//! Timeline lifecycle events.
//!
//! Timelines deliver events synchronously to their observers and to the
//! owning transition, and also record them in an `EventQueue` that can be
//! polled after driving the clock.
//!
//! # Usage
//!
//! ```
//! use gtd_animation::{ManualFrameClock, Timeline, TimelineEvent};
//!
//! let clock = ManualFrameClock::new();
//! let mut timeline = Timeline::new(100);
//! timeline.set_frame_clock(Some(clock.clone()));
//! timeline.start();
//!
//! for signal in clock.advance(16) {
//!     timeline.handle_signal(&signal);
//! }
//!
//! let events: Vec<_> = timeline.drain_events().collect();
//! assert_eq!(events[0], TimelineEvent::Started);
//! assert_eq!(events[1], TimelineEvent::NewFrame { elapsed_ms: 0 });
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Event emitted when a timeline changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    /// Playback began, either directly or after the delay elapsed.
    Started,
    /// A frame was processed.
    NewFrame {
        /// Elapsed time after the frame, in milliseconds.
        elapsed_ms: i64,
    },
    /// Playback was paused.
    Paused,
    /// One run through the duration finished.
    Completed,
    /// Playback ended.
    Stopped {
        /// `true` when the timeline ran out of repeats, `false` when stopped
        /// explicitly.
        is_finished: bool,
    },
}

impl TimelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::NewFrame { .. } => "new-frame",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Stopped { .. } => "stopped",
        }
    }

    pub fn is_new_frame(&self) -> bool {
        matches!(self, Self::NewFrame { .. })
    }

    /// Check if this event ends playback.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}

/// Queue for collecting timeline events between polls.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<TimelineEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<TimelineEvent> {
        self.events.pop_front()
    }

    /// Drain all events from the queue, returning an iterator.
    pub fn drain(&mut self) -> impl Iterator<Item = TimelineEvent> + '_ {
        self.events.drain(..)
    }

    pub fn peek(&self) -> Option<&TimelineEvent> {
        self.events.front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_predicates() {
        assert!(TimelineEvent::NewFrame { elapsed_ms: 10 }.is_new_frame());
        assert!(!TimelineEvent::Started.is_new_frame());
        assert!(TimelineEvent::Stopped { is_finished: false }.is_stopped());
        assert_eq!(TimelineEvent::Completed.name(), "completed");
    }

    #[test]
    fn test_event_queue_operations() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());

        queue.push(TimelineEvent::Started);
        queue.push(TimelineEvent::NewFrame { elapsed_ms: 16 });
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek(), Some(&TimelineEvent::Started));

        assert_eq!(queue.pop(), Some(TimelineEvent::Started));
        assert_eq!(queue.pop(), Some(TimelineEvent::NewFrame { elapsed_ms: 16 }));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_event_queue_drain() {
        let mut queue = EventQueue::new();
        queue.push(TimelineEvent::Paused);
        queue.push(TimelineEvent::Stopped { is_finished: false });

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&TimelineEvent::Stopped { is_finished: true }).unwrap();
        assert_eq!(json, r#"{"type":"stopped","is_finished":true}"#);

        let event: TimelineEvent = serde_json::from_str(r#"{"type":"new_frame","elapsed_ms":48}"#).unwrap();
        assert_eq!(event, TimelineEvent::NewFrame { elapsed_ms: 48 });
    }
}
