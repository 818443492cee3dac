use anyhow::Result;
use gtd_animation::{ClockSignal, Direction, ManualFrameClock, Timeline, TimelineEvent};
use std::rc::Rc;

fn attached(duration: u32) -> (Rc<ManualFrameClock>, Timeline) {
    let clock = ManualFrameClock::new();
    let mut timeline = Timeline::new(duration);
    timeline.set_frame_clock(Some(clock.clone()));
    (clock, timeline)
}

fn deliver(signals: Vec<ClockSignal>, timeline: &mut Timeline) {
    for signal in signals {
        timeline.handle_signal(&signal);
    }
}

fn count(events: &[TimelineEvent], wanted: TimelineEvent) -> usize {
    events.iter().filter(|event| **event == wanted).count()
}

#[test]
fn completes_once_after_full_duration() -> Result<()> {
    let (clock, mut timeline) = attached(1000);
    timeline.start();
    deliver(clock.advance(0), &mut timeline);
    for _ in 0..10 {
        deliver(clock.advance(100), &mut timeline);
    }

    let events: Vec<_> = timeline.drain_events().collect();
    assert_eq!(count(&events, TimelineEvent::Completed), 1);
    assert_eq!(count(&events, TimelineEvent::Stopped { is_finished: true }), 1);

    let last_frame = events
        .iter()
        .rev()
        .find_map(|event| match event {
            TimelineEvent::NewFrame { elapsed_ms } => Some(*elapsed_ms),
            _ => None,
        })
        .ok_or_else(|| anyhow::anyhow!("no frame emitted"))?;
    assert_eq!(last_frame, 1000);
    assert!(!timeline.is_playing());
    assert!(!clock.is_connected(timeline.id()));

    deliver(clock.advance(100), &mut timeline);
    assert!(timeline.events().is_empty());
    Ok(())
}

#[test]
fn repeats_with_auto_reverse() -> Result<()> {
    let (clock, mut timeline) = attached(100);
    timeline.set_repeat_count(2);
    timeline.set_auto_reverse(true);
    timeline.start();
    deliver(clock.advance(0), &mut timeline);

    deliver(clock.advance(50), &mut timeline);
    deliver(clock.advance(50), &mut timeline);
    assert_eq!(timeline.current_repeat(), 1);
    assert_eq!(timeline.direction(), Direction::Backward);
    assert_eq!(timeline.elapsed_time(), 100);

    deliver(clock.advance(50), &mut timeline);
    assert_eq!(timeline.elapsed_time(), 50);
    deliver(clock.advance(50), &mut timeline);
    assert_eq!(timeline.current_repeat(), 2);
    assert_eq!(timeline.direction(), Direction::Forward);
    assert!(timeline.is_playing());

    let events: Vec<_> = timeline.drain_events().collect();
    assert_eq!(count(&events, TimelineEvent::Completed), 2);
    assert_eq!(count(&events, TimelineEvent::Stopped { is_finished: true }), 0);

    deliver(clock.advance(50), &mut timeline);
    deliver(clock.advance(50), &mut timeline);
    let events: Vec<_> = timeline.drain_events().collect();
    assert_eq!(
        &events[events.len() - 2..],
        &[TimelineEvent::Completed, TimelineEvent::Stopped { is_finished: true }]
    );
    assert!(!timeline.is_playing());
    Ok(())
}

#[test]
fn infinite_repeat_wraps_overflow() -> Result<()> {
    let (clock, mut timeline) = attached(100);
    timeline.set_repeat_count(-1);
    timeline.start();
    deliver(clock.advance(0), &mut timeline);
    deliver(clock.advance(60), &mut timeline);
    deliver(clock.advance(60), &mut timeline);

    assert_eq!(timeline.elapsed_time(), 20);
    assert_eq!(timeline.current_repeat(), 1);
    assert!(timeline.is_playing());

    deliver(clock.advance(60), &mut timeline);
    assert_eq!(timeline.elapsed_time(), 80);
    Ok(())
}

#[test]
fn auto_reverse_mirrors_overflow() -> Result<()> {
    let (clock, mut timeline) = attached(100);
    timeline.set_repeat_count(-1);
    timeline.set_auto_reverse(true);
    timeline.start();
    deliver(clock.advance(0), &mut timeline);
    deliver(clock.advance(60), &mut timeline);
    deliver(clock.advance(60), &mut timeline);

    assert_eq!(timeline.direction(), Direction::Backward);
    assert_eq!(timeline.elapsed_time(), 80);

    deliver(clock.advance(30), &mut timeline);
    assert_eq!(timeline.elapsed_time(), 50);
    Ok(())
}

#[test]
fn delayed_start_is_cancelled_by_drop() -> Result<()> {
    let clock = ManualFrameClock::new();
    {
        let mut timeline = Timeline::new(100);
        timeline.set_frame_clock(Some(clock.clone()));
        timeline.set_delay(200);
        timeline.start();
        assert!(timeline.is_delaying());
        assert_eq!(clock.pending_timeouts(), 1);
    }
    assert_eq!(clock.pending_timeouts(), 0);
    assert!(clock.advance(500).is_empty());
    Ok(())
}

#[test]
fn timelines_share_a_clock() -> Result<()> {
    let clock = ManualFrameClock::new();
    let mut fast = Timeline::new(100);
    let mut slow = Timeline::new(400);
    fast.set_frame_clock(Some(clock.clone()));
    slow.set_frame_clock(Some(clock.clone()));
    fast.start();
    slow.start();

    for _ in 0..3 {
        let signals = clock.advance(50);
        for signal in &signals {
            fast.handle_signal(signal);
            slow.handle_signal(signal);
        }
    }

    assert!(!fast.is_playing());
    assert!(slow.is_playing());
    assert_eq!(slow.elapsed_time(), 100);
    assert_eq!(clock.subscriber_count(), 1);
    Ok(())
}

#[test]
fn handler_stops_timeline_midway() -> Result<()> {
    let (clock, mut timeline) = attached(1000);
    timeline.connect(|timeline, event| {
        if let TimelineEvent::NewFrame { elapsed_ms } = event {
            if *elapsed_ms >= 300 {
                timeline.stop();
            }
        }
    });
    timeline.start();
    deliver(clock.advance(0), &mut timeline);
    for _ in 0..5 {
        deliver(clock.advance(100), &mut timeline);
    }

    let events: Vec<_> = timeline.drain_events().collect();
    assert_eq!(count(&events, TimelineEvent::Stopped { is_finished: false }), 1);
    assert_eq!(count(&events, TimelineEvent::Completed), 0);
    assert_eq!(timeline.elapsed_time(), 0);
    assert!(!timeline.is_playing());
    Ok(())
}

#[test]
fn events_round_trip_through_json() -> Result<()> {
    let events = vec![
        TimelineEvent::Started,
        TimelineEvent::NewFrame { elapsed_ms: 16 },
        TimelineEvent::Paused,
        TimelineEvent::Completed,
        TimelineEvent::Stopped { is_finished: true },
    ];
    let json = serde_json::to_string(&events)?;
    let parsed: Vec<TimelineEvent> = serde_json::from_str(&json)?;
    assert_eq!(parsed, events);
    Ok(())
}
