//! Headless driver for the task row animations.
//!
//! Builds a transition from `gtd.toml` (or `GTD_*` environment overrides),
//! plays it on a manual frame clock and logs every frame.
//!
//! ```text
//! RUST_LOG=info cargo run --bin gtd-animate
//! ```

use anyhow::{Context, Result};
use gtd_animation::{
    Animatable, AnimatableId, Animatables, AnimationError, ClockSignal, KeyframeBehavior,
    ManualFrameClock, PropertyBehavior, PropertySpec, Timeline, TimelineEvent, Transition,
    TransitionBehavior, Value, ValueType,
};
use gtd_config::{DemoConfig, GtdConfig};
use std::rc::Rc;

/// Frames played before an endlessly repeating transition is stopped.
const MAX_FRAMES: usize = 600;

/// In-memory stand-in for a row of the task list.
struct TaskRow {
    opacity: f64,
    height: i32,
    visible: bool,
}

impl Default for TaskRow {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            height: 48,
            visible: true,
        }
    }
}

impl Animatable for TaskRow {
    fn find_property(&self, name: &str) -> Option<PropertySpec> {
        let value_type = match name {
            "opacity" => ValueType::Double,
            "height" => ValueType::Int,
            "visible" => ValueType::Bool,
            _ => return None,
        };
        Some(PropertySpec::new(name, value_type))
    }

    fn initial_state(&self, name: &str) -> Option<Value> {
        match name {
            "opacity" => Some(Value::Double(self.opacity)),
            "height" => Some(Value::Int(self.height)),
            "visible" => Some(Value::Bool(self.visible)),
            _ => None,
        }
    }

    fn set_final_state(&mut self, name: &str, value: Value) {
        match name {
            "opacity" => self.opacity = value.as_f64().unwrap_or(self.opacity),
            "height" => self.height = value.as_i32().unwrap_or(self.height),
            "visible" => self.visible = value.as_bool().unwrap_or(self.visible),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let config = GtdConfig::load();
    let demo = &config.demo;
    let clock = ManualFrameClock::new();
    let mut rows = Animatables::new();
    let row = rows.insert(TaskRow::default());

    let mut timeline = Timeline::from_config(&config.animation);
    timeline.set_repeat_count(demo.repeat_count);
    timeline.set_auto_reverse(demo.auto_reverse);

    log::info!(
        "animating {} to {} over {}ms ({} key frames)",
        demo.property,
        demo.to,
        timeline.duration(),
        demo.key_frames.len()
    );

    let step = config.animation.frame_interval_ms();
    let frames = if demo.key_frames.is_empty() {
        let mut transition =
            Transition::with_timeline(timeline, PropertyBehavior::new(demo.property.as_str()));
        configure(&mut transition, demo, row, &mut rows)?;
        play(&clock, step, &mut transition, row, &mut rows, &demo.property)
    } else {
        let mut transition =
            Transition::with_timeline(timeline, KeyframeBehavior::new(demo.property.as_str()));
        transition
            .set_key_frames(&demo.key_frames)
            .context("invalid key frames")?;
        let values: Vec<Value> = demo.key_values.iter().copied().map(Value::Double).collect();
        transition.set_values(&values).context("invalid key frame values")?;
        configure(&mut transition, demo, row, &mut rows)?;
        play(&clock, step, &mut transition, row, &mut rows, &demo.property)
    };

    log::info!("played {} frames", frames);
    Ok(())
}

/// Bind the row and the configured interval to `transition`.
fn configure<B: TransitionBehavior>(
    transition: &mut Transition<B>,
    demo: &DemoConfig,
    row: AnimatableId,
    rows: &mut Animatables,
) -> Result<()> {
    let spec = rows
        .get(row)
        .and_then(|row| row.find_property(&demo.property))
        .ok_or_else(|| AnimationError::UnknownProperty(demo.property.clone()))?;

    let to = Value::Double(demo.to)
        .transform(spec.value_type)
        .context("target value does not fit the property")?;
    if let Some(from) = demo.from {
        let from = Value::Double(from)
            .transform(spec.value_type)
            .context("start value does not fit the property")?;
        transition.set_from(from)?;
    }
    transition.set_to(to)?;
    transition.set_animatable(Some(row), rows);
    Ok(())
}

/// Tick the clock until the transition stops, logging each frame.
fn play<B: TransitionBehavior>(
    clock: &Rc<ManualFrameClock>,
    step: i64,
    transition: &mut Transition<B>,
    row: AnimatableId,
    rows: &mut Animatables,
    property: &str,
) -> usize {
    transition.set_frame_clock(Some(clock.clone()));
    transition.start();

    let mut frames = 0;
    while transition.is_playing() {
        if frames == MAX_FRAMES {
            log::warn!("stopping after {} frames", MAX_FRAMES);
            transition.stop();
            break;
        }

        let signals: Vec<ClockSignal> = clock.advance(step);
        for signal in &signals {
            transition.handle_signal(signal, rows);
        }

        for event in transition.drain_events() {
            match event {
                TimelineEvent::NewFrame { elapsed_ms } => {
                    frames += 1;
                    let value = rows.get(row).and_then(|row| row.initial_state(property));
                    log::info!("t={:>5}ms {} = {:?}", elapsed_ms, property, value);
                }
                other => log::debug!("timeline event: {}", other.name()),
            }
        }
    }
    frames
}
