//! Animation core for GNOME To Do.
//!
//! This crate provides:
//! - **Easing**: the catalog of named progress curves
//! - **Intervals**: typed (initial, final) pairs with interpolation
//! - **Timelines**: frame-clock driven scheduling with repeat, reverse and delay
//! - **Transitions**: timelines that write interpolated values to a property
//! - **Key frame transitions**: transitions split into eased segments
//!
//! # Architecture
//!
//! ```text
//! FrameClock ──ClockSignal──▶ Transition::handle_signal
//!                               └── Timeline (elapsed, direction, repeat)
//!                                     ├── observers (TimelineEvent)
//!                                     └── TransitionBehavior
//!                                           ├── PropertyBehavior ──▶ Interval::compute
//!                                           └── KeyframeBehavior ──▶ KeyFrame intervals
//!                                                 │
//!                                                 ▼
//!                                   Animatables[AnimatableId].set_final_state
//! ```
//!
//! Everything runs on the caller's thread. The only shared state is the
//! progress function registry in [`interpolate`].

pub mod animatable;
pub mod clock;
pub mod easing;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod interval;
pub mod keyframes;
pub mod property;
pub mod timeline;
pub mod transition;
pub mod value;

pub use animatable::{Animatable, AnimatableId, Animatables, PropertySpec};
pub use clock::{ClockSignal, FrameClock, ManualFrameClock, TimeoutId};
pub use easing::{ease, ease_with_params, EasingMode, EasingParams, StepMode};
pub use error::{AnimationError, Result};
pub use events::{EventQueue, TimelineEvent};
pub use interpolate::{progress_func_for, register_progress_func, Interpolate, ProgressFn};
pub use interval::Interval;
pub use keyframes::{KeyFrame, KeyframeBehavior, KeyframeTransition};
pub use property::{PropertyBehavior, PropertyTransition};
pub use timeline::{
    Direction, ObserverId, ProgressCallback, Timeline, TimelineDelegate, TimelineId,
};
pub use transition::{Transition, TransitionBehavior};
pub use value::{BoxedType, BoxedValue, Rgba, Value, ValueType};
