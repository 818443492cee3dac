//! Core value types for the animation engine.
//!
//! This module defines the closed set of values an interval can hold:
//! - `Value`: tagged union over the supported kinds
//! - `ValueType`: the kind tag of a `Value`
//! - `BoxedValue` / `BoxedType`: opaque payloads interpolated through the
//!   progress function registry
//! - `Rgba`: the built-in boxed color type

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};

/// Name of an opaque boxed kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxedType(&'static str);

impl BoxedType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for BoxedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Kind tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Int64,
    UInt,
    UInt64,
    Float,
    Double,
    Boxed(BoxedType),
}

impl ValueType {
    /// Integer and floating point kinds.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Boxed(_))
    }

    /// Kinds interpolated without a registered progress function.
    pub fn is_fundamental(self) -> bool {
        !matches!(self, Self::Boxed(_))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("i32"),
            Self::Int64 => f.write_str("i64"),
            Self::UInt => f.write_str("u32"),
            Self::UInt64 => f.write_str("u64"),
            Self::Float => f.write_str("f32"),
            Self::Double => f.write_str("f64"),
            Self::Boxed(ty) => write!(f, "{}", ty),
        }
    }
}

/// Opaque payload tagged with its [`BoxedType`].
///
/// Payloads are shared, so cloning a boxed value is cheap. Two boxed values
/// compare equal only when they share the same payload.
#[derive(Clone)]
pub struct BoxedValue {
    ty: BoxedType,
    data: Rc<dyn Any>,
}

impl BoxedValue {
    pub fn new<T: Any>(ty: BoxedType, data: T) -> Self {
        Self {
            ty,
            data: Rc::new(data),
        }
    }

    pub fn boxed_type(&self) -> BoxedType {
        self.ty
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

impl fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedValue")
            .field("type", &self.ty.name())
            .finish_non_exhaustive()
    }
}

impl PartialEq for BoxedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && std::ptr::addr_eq(Rc::as_ptr(&self.data), Rc::as_ptr(&other.data))
    }
}

/// RGBA color, the built-in boxed kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Rgba {
    pub const BOXED_TYPE: BoxedType = BoxedType::new("GdkRGBA");

    pub fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn value_type() -> ValueType {
        ValueType::Boxed(Self::BOXED_TYPE)
    }
}

/// A value an interval or an animatable property can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Int64(i64),
    UInt(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Boxed(BoxedValue),
}

/// Intermediate form used by numeric casts.
#[derive(Clone, Copy)]
enum Number {
    Integer(i128),
    Real(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Real(r) => r,
        }
    }

    /// Integer part of the number. `None` for NaN, infinities and reals
    /// beyond the `i128` range.
    fn to_integer(self) -> Option<i128> {
        match self {
            Self::Integer(i) => Some(i),
            Self::Real(r) if r.is_finite() => {
                let r = r.trunc();
                (r >= i128::MIN as f64 && r < i128::MAX as f64).then_some(r as i128)
            }
            Self::Real(_) => None,
        }
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Int64(_) => ValueType::Int64,
            Self::UInt(_) => ValueType::UInt,
            Self::UInt64(_) => ValueType::UInt64,
            Self::Float(_) => ValueType::Float,
            Self::Double(_) => ValueType::Double,
            Self::Boxed(boxed) => ValueType::Boxed(boxed.boxed_type()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt64(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Any numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        self.number().map(Number::as_f64)
    }

    pub fn as_boxed(&self) -> Option<&BoxedValue> {
        match self {
            Self::Boxed(boxed) => Some(boxed),
            _ => None,
        }
    }

    pub fn as_rgba(&self) -> Option<Rgba> {
        self.as_boxed()
            .filter(|boxed| boxed.boxed_type() == Rgba::BOXED_TYPE)
            .and_then(|boxed| boxed.downcast_ref::<Rgba>())
            .copied()
    }

    fn number(&self) -> Option<Number> {
        match self {
            Self::Int(i) => Some(Number::Integer(*i as i128)),
            Self::Int64(i) => Some(Number::Integer(*i as i128)),
            Self::UInt(u) => Some(Number::Integer(*u as i128)),
            Self::UInt64(u) => Some(Number::Integer(*u as i128)),
            Self::Float(f) => Some(Number::Real(*f as f64)),
            Self::Double(d) => Some(Number::Real(*d)),
            Self::Bool(_) | Self::Boxed(_) => None,
        }
    }

    fn from_number(number: Number, target: ValueType) -> Option<Self> {
        let value = match target {
            ValueType::Int => Self::Int(i32::try_from(number.to_integer()?).ok()?),
            ValueType::Int64 => Self::Int64(i64::try_from(number.to_integer()?).ok()?),
            ValueType::UInt => Self::UInt(u32::try_from(number.to_integer()?).ok()?),
            ValueType::UInt64 => Self::UInt64(u64::try_from(number.to_integer()?).ok()?),
            ValueType::Float => Self::Float(number.as_f64() as f32),
            ValueType::Double => Self::Double(number.as_f64()),
            ValueType::Bool => Self::Bool(number.as_f64() != 0.0),
            ValueType::Boxed(_) => return None,
        };
        Some(value)
    }

    /// Convert this value into `target`.
    ///
    /// - identical kinds are cloned
    /// - numeric kinds convert when the value fits the target; reals lose
    ///   their fractional part on the way to an integer kind
    /// - booleans become `0`/`1`, numbers become `true` when non-zero
    /// - boxed values only convert into their own kind
    pub fn transform(&self, target: ValueType) -> Result<Value> {
        let source = self.value_type();
        if source == target {
            return Ok(self.clone());
        }

        let converted = match self {
            Self::Bool(b) => Self::from_number(Number::Integer(*b as i128), target),
            Self::Boxed(_) => None,
            _ => self
                .number()
                .and_then(|number| Self::from_number(number, target)),
        };

        converted.ok_or(AnimationError::Transform {
            from: source,
            to: target,
        })
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::UInt(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<BoxedValue> for Value {
    fn from(value: BoxedValue) -> Self {
        Self::Boxed(value)
    }
}

impl From<Rgba> for Value {
    fn from(value: Rgba) -> Self {
        Self::Boxed(BoxedValue::new(Rgba::BOXED_TYPE, value))
    }
}
