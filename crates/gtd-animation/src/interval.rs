//! Typed (initial, final) value pairs.
//!
//! An `Interval` is fixed to one `ValueType` at construction. Values stored in
//! it are always converted into that type first, so `compute` only ever sees
//! two values of the same kind.

use crate::animatable::PropertySpec;
use crate::error::{AnimationError, Result};
use crate::interpolate::{interpolate_fundamental, progress_func_for};
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    value_type: ValueType,
    initial: Option<Value>,
    final_: Option<Value>,
}

impl Interval {
    /// Creates an empty interval of the given type.
    ///
    /// Boxed types need a registered progress function.
    pub fn new(value_type: ValueType) -> Result<Self> {
        if !value_type.is_fundamental() && progress_func_for(value_type).is_none() {
            return Err(AnimationError::UnsupportedValueType(value_type));
        }
        Ok(Self {
            value_type,
            initial: None,
            final_: None,
        })
    }

    pub fn with_values(
        value_type: ValueType,
        initial: impl Into<Value>,
        final_: impl Into<Value>,
    ) -> Result<Self> {
        let mut interval = Self::new(value_type)?;
        interval.set_initial(initial)?;
        interval.set_final(final_)?;
        Ok(interval)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn initial(&self) -> Option<&Value> {
        self.initial.as_ref()
    }

    pub fn final_value(&self) -> Option<&Value> {
        self.final_.as_ref()
    }

    pub fn set_initial(&mut self, value: impl Into<Value>) -> Result<()> {
        self.initial = Some(self.convert(value.into())?);
        Ok(())
    }

    pub fn set_final(&mut self, value: impl Into<Value>) -> Result<()> {
        self.final_ = Some(self.convert(value.into())?);
        Ok(())
    }

    fn convert(&self, value: Value) -> Result<Value> {
        value.transform(self.value_type).inspect_err(|_| {
            tracing::warn!(
                from = %value.value_type(),
                to = %self.value_type,
                "unable to store value in interval"
            );
        })
    }

    /// Both endpoints are set.
    pub fn is_valid(&self) -> bool {
        self.initial.is_some() && self.final_.is_some()
    }

    /// Exchanges the initial and final values.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.initial, &mut self.final_);
    }

    /// Checks that the interval's values can be written to `spec`.
    pub fn validate(&self, spec: &PropertySpec) -> Result<()> {
        let compatible = self.value_type == spec.value_type
            || (self.value_type.is_fundamental() && spec.value_type.is_fundamental());
        if compatible {
            Ok(())
        } else {
            Err(AnimationError::Transform {
                from: self.value_type,
                to: spec.value_type,
            })
        }
    }

    /// Computes the value at `progress`.
    ///
    /// A registered progress function for the interval's type wins over the
    /// built-in blending. Progress outside `[0, 1]` extrapolates.
    pub fn compute(&self, progress: f64) -> Result<Value> {
        let (Some(initial), Some(final_)) = (&self.initial, &self.final_) else {
            return Err(AnimationError::IncompleteInterval(self.value_type));
        };

        if let Some(func) = progress_func_for(self.value_type) {
            return func(initial, final_, progress)
                .ok_or(AnimationError::InterpolationFailed(self.value_type));
        }

        interpolate_fundamental(initial, final_, progress)
            .ok_or(AnimationError::NoProgressFunction(self.value_type))
    }
}
