//! Animatable targets.
//!
//! Anything a transition can drive implements `Animatable`: it describes its
//! properties, reports their current value and accepts new values. Targets
//! are stored in an `Animatables` arena and transitions refer to them by
//! `AnimatableId`, so a target can disappear while transitions still point at
//! it; lookups then simply return `None`.

use slotmap::{new_key_type, SlotMap};

use crate::error::Result;
use crate::interval::Interval;
use crate::value::{Value, ValueType};

new_key_type! {
    /// Handle of a target stored in [`Animatables`].
    pub struct AnimatableId;
}

/// Description of an animatable property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: String,
    pub value_type: ValueType,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Capability interface of an animation target.
pub trait Animatable {
    /// Describe the property called `name`, if the target has one.
    fn find_property(&self, name: &str) -> Option<PropertySpec>;

    /// Current value of the property, used to fill in missing interval ends.
    fn initial_state(&self, name: &str) -> Option<Value>;

    /// Write a new value for the property.
    fn set_final_state(&mut self, name: &str, value: Value);

    /// Interpolate the property in a target-specific way.
    ///
    /// Returning `None` falls back to [`Interval::compute`].
    fn interpolate_value(&self, _name: &str, _interval: &Interval, _progress: f64) -> Option<Result<Value>> {
        None
    }
}

/// Arena owning animation targets.
#[derive(Default)]
pub struct Animatables {
    targets: SlotMap<AnimatableId, Box<dyn Animatable>>,
}

impl Animatables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<A: Animatable + 'static>(&mut self, target: A) -> AnimatableId {
        self.targets.insert(Box::new(target))
    }

    pub fn remove(&mut self, id: AnimatableId) -> Option<Box<dyn Animatable>> {
        self.targets.remove(id)
    }

    pub fn contains(&self, id: AnimatableId) -> bool {
        self.targets.contains_key(id)
    }

    pub fn get(&self, id: AnimatableId) -> Option<&dyn Animatable> {
        self.targets.get(id).map(|target| target.as_ref())
    }

    pub fn get_mut(&mut self, id: AnimatableId) -> Option<&mut (dyn Animatable + 'static)> {
        self.targets.get_mut(id).map(|target| target.as_mut())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
