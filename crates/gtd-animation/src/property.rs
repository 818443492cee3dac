//! Transitions bound to a named property.

use tracing::{debug, warn};

use crate::animatable::{Animatable, Animatables, PropertySpec};
use crate::interval::Interval;
use crate::timeline::Timeline;
use crate::transition::{Transition, TransitionBehavior};

/// Drives one named property of the target.
///
/// Attaching resolves the property on the target. When the target has no
/// such property the transition stays inert.
#[derive(Debug, Clone)]
pub struct PropertyBehavior {
    property_name: String,
    spec: Option<PropertySpec>,
}

impl PropertyBehavior {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            spec: None,
        }
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The resolved property, while attached.
    pub fn spec(&self) -> Option<&PropertySpec> {
        self.spec.as_ref()
    }

    fn resolve(&mut self, target: &dyn Animatable) -> bool {
        self.spec = target.find_property(&self.property_name);
        if self.spec.is_none() {
            warn!(property = %self.property_name, "animatable has no such property");
        }
        self.spec.is_some()
    }
}

impl TransitionBehavior for PropertyBehavior {
    fn attached(&mut self, target: &mut dyn Animatable, interval: Option<&mut Interval>) {
        if !self.resolve(target) {
            return;
        }
        let Some(interval) = interval else {
            return;
        };

        if interval.initial().is_some() && interval.final_value().is_some() {
            return;
        }
        let Some(current) = target.initial_state(&self.property_name) else {
            return;
        };

        // Missing ends start from (or return to) the current value.
        if interval.initial().is_none() && interval.set_initial(current.clone()).is_err() {
            return;
        }
        if interval.final_value().is_none() {
            // The interval logs the failed conversion.
            let _ = interval.set_final(current);
        }
    }

    fn detached(&mut self) {
        self.spec = None;
    }

    fn compute_value(
        &mut self,
        _timeline: &Timeline,
        target: &mut dyn Animatable,
        interval: &Interval,
        progress: f64,
    ) {
        let Some(spec) = &self.spec else {
            return;
        };

        let computed = target
            .interpolate_value(&spec.name, interval, progress)
            .unwrap_or_else(|| interval.compute(progress));
        let value = match computed {
            Ok(value) => value,
            Err(err) => {
                warn!(property = %spec.name, %err, "unable to interpolate property");
                return;
            }
        };

        let value = if value.value_type() == spec.value_type {
            value
        } else {
            match value.transform(spec.value_type) {
                Ok(value) => value,
                Err(err) => {
                    warn!(property = %spec.name, %err, "unable to convert interpolated value");
                    return;
                }
            }
        };

        debug!(property = %spec.name, progress, ?value, "writing property");
        target.set_final_state(&spec.name, value);
    }
}

/// A transition animating a named property.
pub type PropertyTransition = Transition<PropertyBehavior>;

impl Transition<PropertyBehavior> {
    pub fn new(property_name: impl Into<String>, duration: u32) -> Self {
        Self::with_behavior(duration, PropertyBehavior::new(property_name))
    }

    pub fn property_name(&self) -> &str {
        self.behavior.property_name()
    }

    /// Switch to another property, resolving it on the current target.
    pub fn set_property_name(&mut self, property_name: impl Into<String>, animatables: &Animatables) {
        self.behavior.property_name = property_name.into();
        self.behavior.spec = None;
        if let Some(target) = self.animatable.and_then(|id| animatables.get(id)) {
            self.behavior.resolve(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualFrameClock;
    use crate::error::{AnimationError, Result};
    use crate::value::{Rgba, Value, ValueType};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Row {
        height: Rc<RefCell<i32>>,
        tint: Rc<RefCell<Option<Rgba>>>,
        writes: Rc<RefCell<usize>>,
    }

    impl Animatable for Row {
        fn find_property(&self, name: &str) -> Option<PropertySpec> {
            match name {
                "height" => Some(PropertySpec::new(name, ValueType::Int)),
                "tint" => Some(PropertySpec::new(name, Rgba::value_type())),
                _ => None,
            }
        }

        fn initial_state(&self, name: &str) -> Option<Value> {
            match name {
                "height" => Some(Value::Int(*self.height.borrow())),
                "tint" => self.tint.borrow().map(Value::from),
                _ => None,
            }
        }

        fn set_final_state(&mut self, name: &str, value: Value) {
            *self.writes.borrow_mut() += 1;
            match name {
                "height" => *self.height.borrow_mut() = value.as_i32().unwrap_or_default(),
                "tint" => *self.tint.borrow_mut() = value.as_rgba(),
                _ => {}
            }
        }
    }

    /// Row whose height snaps to multiples of ten.
    struct SnappingRow(Row);

    impl Animatable for SnappingRow {
        fn find_property(&self, name: &str) -> Option<PropertySpec> {
            self.0.find_property(name)
        }

        fn initial_state(&self, name: &str) -> Option<Value> {
            self.0.initial_state(name)
        }

        fn set_final_state(&mut self, name: &str, value: Value) {
            self.0.set_final_state(name, value);
        }

        fn interpolate_value(&self, _name: &str, interval: &Interval, progress: f64) -> Option<Result<Value>> {
            let value = interval.compute(progress).and_then(|value| {
                value
                    .as_i32()
                    .map(|height| Value::Int(height / 10 * 10))
                    .ok_or(AnimationError::InterpolationFailed(interval.value_type()))
            });
            Some(value)
        }
    }

    fn drive(clock: &ManualFrameClock, transition: &mut PropertyTransition, targets: &mut Animatables, msecs: i64) {
        for signal in clock.advance(msecs) {
            transition.handle_signal(&signal, targets);
        }
    }

    #[test]
    fn test_attach_fills_missing_initial() {
        let row = Row::default();
        *row.height.borrow_mut() = 30;
        let mut targets = Animatables::new();
        let id = targets.insert(row);

        let mut transition = PropertyTransition::new("height", 100);
        transition.set_to(50).unwrap();
        transition.set_animatable(Some(id), &mut targets);

        let interval = transition.interval().unwrap();
        assert_eq!(interval.initial(), Some(&Value::Int(30)));
        assert_eq!(interval.final_value(), Some(&Value::Int(50)));
        assert_eq!(transition.behavior().spec().map(|spec| spec.value_type), Some(ValueType::Int));
    }

    #[test]
    fn test_unknown_property_is_inert() {
        let row = Row::default();
        let writes = Rc::clone(&row.writes);
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let id = targets.insert(row);

        let mut transition = PropertyTransition::new("width", 100);
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_from(0).unwrap();
        transition.set_to(10).unwrap();
        transition.set_animatable(Some(id), &mut targets);
        transition.start();
        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 50);

        assert!(transition.behavior().spec().is_none());
        assert_eq!(*writes.borrow(), 0);
        assert!(transition.is_playing());
    }

    #[test]
    fn test_values_are_converted_to_property_type() {
        let row = Row::default();
        let height = Rc::clone(&row.height);
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let id = targets.insert(row);

        let mut transition = PropertyTransition::new("height", 100);
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_interval(Some(Interval::with_values(ValueType::Double, 0.0, 80.0).unwrap()));
        transition.set_animatable(Some(id), &mut targets);
        transition.start();
        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 25);

        assert_eq!(*height.borrow(), 20);
    }

    #[test]
    fn test_incompatible_value_is_dropped() {
        let row = Row::default();
        let writes = Rc::clone(&row.writes);
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let id = targets.insert(row);

        let mut transition = PropertyTransition::new("tint", 100);
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_interval(Some(Interval::with_values(ValueType::Double, 0.0, 1.0).unwrap()));
        transition.set_animatable(Some(id), &mut targets);
        transition.start();
        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 50);

        assert_eq!(*writes.borrow(), 0);
        assert!(transition.is_playing());
    }

    #[test]
    fn test_target_interpolation_override() {
        let row = Row::default();
        let height = Rc::clone(&row.height);
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let id = targets.insert(SnappingRow(row));

        let mut transition = PropertyTransition::new("height", 100);
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_from(0).unwrap();
        transition.set_to(100).unwrap();
        transition.set_animatable(Some(id), &mut targets);
        transition.start();
        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 37);

        assert_eq!(*height.borrow(), 30);
    }

    #[test]
    fn test_rgba_property() {
        let row = Row::default();
        let tint = Rc::clone(&row.tint);
        let clock = ManualFrameClock::new();
        let mut targets = Animatables::new();
        let id = targets.insert(row);

        let mut transition = PropertyTransition::new("tint", 100);
        transition.set_frame_clock(Some(clock.clone()));
        transition.set_from(Rgba::new(0.0, 0.0, 0.0, 1.0)).unwrap();
        transition.set_to(Rgba::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        transition.set_animatable(Some(id), &mut targets);
        transition.start();
        drive(&clock, &mut transition, &mut targets, 0);
        drive(&clock, &mut transition, &mut targets, 50);

        let color = tint.borrow().unwrap();
        assert!((color.red - 0.5).abs() < 1e-6);
        assert!((color.alpha - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_property_name_resolves_again() {
        let mut targets = Animatables::new();
        let id = targets.insert(Row::default());

        let mut transition = PropertyTransition::new("width", 100);
        transition.set_animatable(Some(id), &mut targets);
        assert!(transition.behavior().spec().is_none());

        transition.set_property_name("height", &targets);
        assert_eq!(transition.property_name(), "height");
        assert!(transition.behavior().spec().is_some());
    }

    #[test]
    fn test_detach_clears_spec() {
        let mut targets = Animatables::new();
        let id = targets.insert(Row::default());

        let mut transition = PropertyTransition::new("height", 100);
        transition.set_animatable(Some(id), &mut targets);
        assert!(transition.behavior().spec().is_some());
        transition.set_animatable(None, &mut targets);
        assert!(transition.behavior().spec().is_none());
    }
}
