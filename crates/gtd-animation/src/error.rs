//! Error type shared by the animation engine.

use crate::value::ValueType;

/// Errors reported by intervals, values and transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    #[error("value type {0} has no interpolation strategy")]
    UnsupportedValueType(ValueType),
    #[error("unable to transform a value of type {from} into {to}")]
    Transform { from: ValueType, to: ValueType },
    #[error("interval of type {0} is missing its initial or final value")]
    IncompleteInterval(ValueType),
    #[error("no progress function registered for value type {0}")]
    NoProgressFunction(ValueType),
    #[error("progress function for value type {0} failed")]
    InterpolationFailed(ValueType),
    #[error("animatable has no property named '{0}'")]
    UnknownProperty(String),
    #[error("key frame index {index} out of range (transition has {len} key frames)")]
    KeyFrameIndex { index: usize, len: usize },
    #[error("a key frame transition needs at least one key frame")]
    NoKeyFrames,
    #[error("expected {expected} key frames, got {got}")]
    KeyFrameCount { expected: usize, got: usize },
    #[error("unknown easing mode '{0}'")]
    UnknownEasingMode(String),
}

pub type Result<T> = std::result::Result<T, AnimationError>;
