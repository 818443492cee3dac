//! Interpolation system for interval values.
//!
//! This module provides the `Interpolate` trait and implementations for all
//! fundamental value kinds, plus the process-wide registry of progress
//! functions used for boxed kinds.
//!
//! # Registry
//!
//! The registry maps a `ValueType` to a `ProgressFn`. It is seeded once with
//! the built-in functions (currently `Rgba`) and can be extended or
//! overridden at runtime with [`register_progress_func`]. A registered
//! function takes precedence over fundamental blending for its type.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::value::{Rgba, Value, ValueType};

/// Trait for types that can be interpolated between two values.
///
/// # Arguments
/// * `to` - Target value to interpolate towards
/// * `t` - Interpolation factor (0.0 = self, 1.0 = to)
///
/// Factors outside `[0, 1]` extrapolate.
pub trait Interpolate: Sized {
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

impl Interpolate for bool {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        if t > 0.5 { *to } else { *self }
    }
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl Interpolate for f32 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self as f64, *to as f64, t) as f32
    }
}

macro_rules! integer_interpolate {
    ($($ty:ty),*) => {
        $(
            impl Interpolate for $ty {
                /// Blends in `f64` and truncates toward zero.
                fn interpolate(&self, to: &Self, t: f64) -> Self {
                    lerp(*self as f64, *to as f64, t) as $ty
                }
            }
        )*
    };
}

integer_interpolate!(i32, i64, u32, u64);

impl Interpolate for Rgba {
    /// Per-channel interpolation.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self {
            red: self.red.interpolate(&to.red, t),
            green: self.green.interpolate(&to.green, t),
            blue: self.blue.interpolate(&to.blue, t),
            alpha: self.alpha.interpolate(&to.alpha, t),
        }
    }
}

/// Interpolates two values of the same fundamental kind.
///
/// Returns the endpoints unchanged at exactly 0 and 1. Returns `None` when the
/// kinds differ or are boxed.
pub fn interpolate_fundamental(from: &Value, to: &Value, t: f64) -> Option<Value> {
    if from.value_type() != to.value_type() || !from.value_type().is_fundamental() {
        return None;
    }
    if t == 0.0 {
        return Some(from.clone());
    }
    if t == 1.0 {
        return Some(to.clone());
    }

    let value = match (from, to) {
        (Value::Bool(a), Value::Bool(b)) => Value::Bool(a.interpolate(b, t)),
        (Value::Int(a), Value::Int(b)) => Value::Int(a.interpolate(b, t)),
        (Value::Int64(a), Value::Int64(b)) => Value::Int64(a.interpolate(b, t)),
        (Value::UInt(a), Value::UInt(b)) => Value::UInt(a.interpolate(b, t)),
        (Value::UInt64(a), Value::UInt64(b)) => Value::UInt64(a.interpolate(b, t)),
        (Value::Float(a), Value::Float(b)) => Value::Float(a.interpolate(b, t)),
        (Value::Double(a), Value::Double(b)) => Value::Double(a.interpolate(b, t)),
        _ => return None,
    };
    Some(value)
}

/// Interpolates between two values of a registered type.
///
/// Returns `None` when the values cannot be interpolated.
pub type ProgressFn = fn(&Value, &Value, f64) -> Option<Value>;

fn rgba_progress(from: &Value, to: &Value, t: f64) -> Option<Value> {
    let from = from.as_rgba()?;
    let to = to.as_rgba()?;
    Some(Value::from(from.interpolate(&to, t)))
}

static BUILTIN_PROGRESS_FUNCS: &[(ValueType, ProgressFn)] =
    &[(ValueType::Boxed(Rgba::BOXED_TYPE), rgba_progress as ProgressFn)];

fn registry() -> &'static Mutex<HashMap<ValueType, ProgressFn>> {
    static REGISTRY: OnceLock<Mutex<HashMap<ValueType, ProgressFn>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(BUILTIN_PROGRESS_FUNCS.iter().copied().collect()))
}

/// Registers (or with `None`, removes) the progress function for a type.
pub fn register_progress_func(value_type: ValueType, func: Option<ProgressFn>) {
    let mut funcs = registry().lock().unwrap_or_else(PoisonError::into_inner);
    match func {
        Some(func) => {
            tracing::debug!(value_type = %value_type, "registering progress function");
            funcs.insert(value_type, func);
        }
        None => {
            tracing::debug!(value_type = %value_type, "removing progress function");
            funcs.remove(&value_type);
        }
    }
}

/// Looks up the progress function registered for a type.
pub fn progress_func_for(value_type: ValueType) -> Option<ProgressFn> {
    registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&value_type)
        .copied()
}
