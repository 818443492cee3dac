//! Key frame transitions.
//!
//! A `KeyframeTransition` splits the timeline into consecutive segments, each
//! ending at a key in `[0, 1]` with its own target value and easing mode. The
//! segments are expressed in linear timeline coordinates
//! (`elapsed / duration`), independently of the timeline's own easing.
//!
//! The frame list always ends with an implicit frame at key `1.0`, which
//! inherits the timeline's progress mode and the final value of the
//! transition's interval. The first frame starts from the initial value of
//! the transition's interval.
//!
//! ```text
//! keys:    0.0 ------ 0.25 ---------- 0.75 ----- 1.0
//! frames:  [ frame 0 ][     frame 1    ][ frame 2 ]
//! values:  from ----> v0 -----------> v1 -------> to
//! ```

use tracing::{trace, warn};

use crate::animatable::Animatable;
use crate::easing::{ease, EasingMode};
use crate::error::{AnimationError, Result};
use crate::interval::Interval;
use crate::property::PropertyBehavior;
use crate::timeline::{Direction, Timeline};
use crate::transition::{Transition, TransitionBehavior};
use crate::value::{Value, ValueType};

/// One segment of a key frame transition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame {
    /// End of the segment, in `[0, 1]`.
    pub key: f64,
    /// Start of the segment; the key of the previous frame.
    pub start: f64,
    /// End of the segment; equal to `key` once frames are updated.
    pub end: f64,
    pub mode: EasingMode,
    pub interval: Option<Interval>,
}

impl KeyFrame {
    fn new(key: f64) -> Self {
        Self {
            key,
            start: 0.0,
            end: key,
            mode: EasingMode::Linear,
            interval: None,
        }
    }

    /// Interval of the frame, created with `value_type` when missing.
    fn interval_or_new(&mut self, value_type: ValueType) -> Option<&mut Interval> {
        if self.interval.is_none() {
            self.interval = Interval::new(value_type).ok();
        }
        self.interval.as_mut()
    }

    fn set_value(&mut self, value: Value) -> Result<()> {
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
}

/// Drives a property through a list of key frames.
///
/// Without key frames it behaves like [`PropertyBehavior`].
#[derive(Debug, Clone)]
pub struct KeyframeBehavior {
    property: PropertyBehavior,
    frames: Vec<KeyFrame>,
    current_frame: Option<usize>,
}

impl KeyframeBehavior {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property: PropertyBehavior::new(property_name),
            frames: Vec::new(),
            current_frame: None,
        }
    }

    pub fn property(&self) -> &PropertyBehavior {
        &self.property
    }

    /// All frames, including the implicit terminal frame.
    pub fn frames(&self) -> &[KeyFrame] {
        &self.frames
    }

    /// Index of the frame used by the last computed value.
    pub fn current_frame(&self) -> Option<usize> {
        self.current_frame
    }

    /// Number of explicit key frames.
    pub fn n_key_frames(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    fn init_frames(&mut self, n_key_frames: usize) {
        self.frames = (0..n_key_frames).map(|_| KeyFrame::new(0.0)).collect();
        self.frames.push(KeyFrame::new(1.0));
        self.current_frame = None;
    }

    /// Prepare `n` explicit frames, or check that the existing ones match.
    /// At least one frame is required.
    fn ensure_frames(&mut self, n_key_frames: usize) -> Result<()> {
        if n_key_frames == 0 {
            return Err(AnimationError::NoKeyFrames);
        }
        if self.frames.is_empty() {
            self.init_frames(n_key_frames);
            Ok(())
        } else if self.n_key_frames() == n_key_frames {
            Ok(())
        } else {
            Err(AnimationError::KeyFrameCount {
                expected: self.n_key_frames(),
                got: n_key_frames,
            })
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.n_key_frames() {
            Ok(())
        } else {
            Err(AnimationError::KeyFrameIndex {
                index,
                len: self.n_key_frames(),
            })
        }
    }

    fn sort_frames(&mut self) {
        self.frames.sort_by(|a, b| a.key.total_cmp(&b.key));
    }

    /// Recompute segment bounds and chain each frame's initial value to the
    /// previous frame's final value.
    fn update_frames(&mut self) {
        for index in 0..self.frames.len() {
            let (before, rest) = self.frames.split_at_mut(index);
            let frame = &mut rest[0];
            frame.end = frame.key;

            let Some(previous) = before.last() else {
                frame.start = 0.0;
                continue;
            };
            frame.start = previous.key;

            let Some(value) = previous.interval.as_ref().and_then(Interval::final_value) else {
                continue;
            };
            if let Some(interval) = frame.interval_or_new(value.value_type()) {
                // Conversion failures are logged by the interval.
                let _ = interval.set_initial(value.clone());
            }
        }
    }
}

impl TransitionBehavior for KeyframeBehavior {
    fn attached(&mut self, target: &mut dyn Animatable, interval: Option<&mut Interval>) {
        self.property.attached(target, interval);
    }

    fn detached(&mut self) {
        self.property.detached();
    }

    fn started(&mut self, _timeline: &Timeline) {
        self.current_frame = None;
        self.sort_frames();
        self.update_frames();
    }

    fn completed(&mut self, _timeline: &Timeline) {
        self.current_frame = None;
    }

    fn compute_value(
        &mut self,
        timeline: &Timeline,
        target: &mut dyn Animatable,
        interval: &Interval,
        progress: f64,
    ) {
        if self.frames.is_empty() {
            self.property.compute_value(timeline, target, interval, progress);
            return;
        }

        let direction = timeline.direction();
        let p = if timeline.duration() == 0 {
            1.0
        } else {
            timeline.elapsed_time() as f64 / timeline.duration() as f64
        };
        let last = self.frames.len() - 1;

        let mut current = self.current_frame.unwrap_or(match direction {
            Direction::Forward => 0,
            Direction::Backward => last,
        });

        // At most one frame per call, even when `p` skipped several.
        let frame = &self.frames[current];
        match direction {
            Direction::Forward if p > frame.end => current = (current + 1).min(last),
            Direction::Backward if p < frame.start => current = current.saturating_sub(1),
            _ => {}
        }
        self.current_frame = Some(current);

        let frame = &mut self.frames[current];
        if current == 0 {
            if let Some(initial) = interval.initial() {
                if let Some(frame_interval) = frame.interval_or_new(interval.value_type()) {
                    let _ = frame_interval.set_initial(initial.clone());
                }
            }
        } else if current == last {
            frame.mode = timeline.progress_mode();
            if let Some(final_) = interval.final_value() {
                if let Some(frame_interval) = frame.interval_or_new(interval.value_type()) {
                    let _ = frame_interval.set_final(final_.clone());
                }
            }
        }

        let Some(frame_interval) = &frame.interval else {
            warn!(frame = current, "key frame has no value");
            return;
        };

        let local_progress = ease(frame.mode, p - frame.start, frame.end - frame.start);
        trace!(frame = current, p, local_progress, "key frame progress");
        self.property
            .compute_value(timeline, target, frame_interval, local_progress);
    }
}

/// A transition animating a property through key frames.
pub type KeyframeTransition = Transition<KeyframeBehavior>;

impl Transition<KeyframeBehavior> {
    pub fn new(property_name: impl Into<String>, duration: u32) -> Self {
        Self::with_behavior(duration, KeyframeBehavior::new(property_name))
    }

    pub fn property_name(&self) -> &str {
        self.behavior.property.property_name()
    }

    pub fn n_key_frames(&self) -> usize {
        self.behavior.n_key_frames()
    }

    /// Set the keys of the explicit frames.
    ///
    /// The first call decides how many frames there are; later calls must
    /// pass the same number of keys.
    pub fn set_key_frames(&mut self, keys: &[f64]) -> Result<()> {
        self.behavior.ensure_frames(keys.len())?;
        for (frame, key) in self.behavior.frames.iter_mut().zip(keys) {
            frame.key = *key;
        }
        Ok(())
    }

    /// Set the value each explicit frame ends on.
    pub fn set_values(&mut self, values: &[Value]) -> Result<()> {
        self.behavior.ensure_frames(values.len())?;
        for (frame, value) in self.behavior.frames.iter_mut().zip(values) {
            frame.set_value(value.clone())?;
        }
        Ok(())
    }

    /// Set the easing mode of each explicit frame.
    pub fn set_modes(&mut self, modes: &[EasingMode]) -> Result<()> {
        self.behavior.ensure_frames(modes.len())?;
        for (frame, mode) in self.behavior.frames.iter_mut().zip(modes) {
            frame.mode = *mode;
        }
        Ok(())
    }

    pub fn set_key_frame(
        &mut self,
        index: usize,
        key: f64,
        mode: EasingMode,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.behavior.check_index(index)?;
        let frame = &mut self.behavior.frames[index];
        frame.key = key;
        frame.mode = mode;
        frame.set_value(value.into())
    }

    /// Key, easing mode and final value of an explicit frame.
    pub fn key_frame(&self, index: usize) -> Result<(f64, EasingMode, Option<Value>)> {
        self.behavior.check_index(index)?;
        let frame = &self.behavior.frames[index];
        let value = frame.interval.as_ref().and_then(Interval::final_value).cloned();
        Ok((frame.key, frame.mode, value))
    }

    /// Remove every key frame.
    pub fn clear(&mut self) {
        self.behavior.frames.clear();
        self.behavior.current_frame = None;
    }
}
