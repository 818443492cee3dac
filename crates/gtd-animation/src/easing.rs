//! Easing functions for animation timing.
//!
//! This module implements the catalog of named progress curves used by
//! timelines and key frames:
//! - Linear
//! - Quad, Cubic, Quart, Quint, Sine, Expo, Circ (in, out, in-out)
//! - Elastic, Back, Bounce (in, out, in-out; these overshoot)
//! - Steps (stepped animations)
//! - CubicBezier and the standard `ease` curves
//!
//! Every curve takes the elapsed time `t` and the total duration `d` and
//! returns the progress at `t`. All curves return exactly `0.0` at `t = 0`
//! and `1.0` at `t = d`.
//!
//! # Usage
//!
//! ```
//! use gtd_animation::easing::{ease, EasingMode};
//!
//! let progress = ease(EasingMode::EaseOutCubic, 250.0, 500.0);
//! assert!(progress > 0.5);
//!
//! let mode: EasingMode = "easeInOutQuad".parse().unwrap();
//! assert_eq!(mode, EasingMode::EaseInOutQuad);
//! ```

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;

/// Signature shared by every non-parametric curve: `(elapsed, duration) -> progress`.
pub type EasingFn = fn(f64, f64) -> f64;

/// Position of the jump for stepped curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Jump at the start of each interval.
    Start,
    /// Jump at the end of each interval.
    #[default]
    End,
}

/// Named progress curves.
///
/// The discriminant indexes the static easing table, so lookups by mode are
/// constant time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(usize)]
pub enum EasingMode {
    /// Progress comes from a custom function installed on the timeline.
    Custom = 0,
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
    /// Stepped curve; the number of steps and the jump position come from
    /// [`EasingParams`].
    Steps,
    /// One step, jumping at the start.
    StepStart,
    /// One step, jumping at the end.
    StepEnd,
    /// Cubic bezier curve with control points from [`EasingParams`].
    CubicBezier,
    /// Equivalent to `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,
    /// Equivalent to `cubic-bezier(0.42, 0.0, 1.0, 1.0)`.
    EaseIn,
    /// Equivalent to `cubic-bezier(0.0, 0.0, 0.58, 1.0)`.
    EaseOut,
    /// Equivalent to `cubic-bezier(0.42, 0.0, 0.58, 1.0)`.
    EaseInOut,
}

/// One row of the easing table.
#[derive(Debug, Clone, Copy)]
pub struct EasingEntry {
    pub mode: EasingMode,
    pub name: &'static str,
    pub func: EasingFn,
}

macro_rules! entry {
    ($mode:ident, $name:literal, $func:expr) => {
        EasingEntry {
            mode: EasingMode::$mode,
            name: $name,
            func: $func,
        }
    };
}

/// Easing table, in discriminant order.
static EASING_TABLE: [EasingEntry; 40] = [
    entry!(Custom, "custom", linear),
    entry!(Linear, "linear", linear),
    entry!(EaseInQuad, "easeInQuad", ease_in_quad),
    entry!(EaseOutQuad, "easeOutQuad", ease_out_quad),
    entry!(EaseInOutQuad, "easeInOutQuad", ease_in_out_quad),
    entry!(EaseInCubic, "easeInCubic", ease_in_cubic),
    entry!(EaseOutCubic, "easeOutCubic", ease_out_cubic),
    entry!(EaseInOutCubic, "easeInOutCubic", ease_in_out_cubic),
    entry!(EaseInQuart, "easeInQuart", ease_in_quart),
    entry!(EaseOutQuart, "easeOutQuart", ease_out_quart),
    entry!(EaseInOutQuart, "easeInOutQuart", ease_in_out_quart),
    entry!(EaseInQuint, "easeInQuint", ease_in_quint),
    entry!(EaseOutQuint, "easeOutQuint", ease_out_quint),
    entry!(EaseInOutQuint, "easeInOutQuint", ease_in_out_quint),
    entry!(EaseInSine, "easeInSine", ease_in_sine),
    entry!(EaseOutSine, "easeOutSine", ease_out_sine),
    entry!(EaseInOutSine, "easeInOutSine", ease_in_out_sine),
    entry!(EaseInExpo, "easeInExpo", ease_in_expo),
    entry!(EaseOutExpo, "easeOutExpo", ease_out_expo),
    entry!(EaseInOutExpo, "easeInOutExpo", ease_in_out_expo),
    entry!(EaseInCirc, "easeInCirc", ease_in_circ),
    entry!(EaseOutCirc, "easeOutCirc", ease_out_circ),
    entry!(EaseInOutCirc, "easeInOutCirc", ease_in_out_circ),
    entry!(EaseInElastic, "easeInElastic", ease_in_elastic),
    entry!(EaseOutElastic, "easeOutElastic", ease_out_elastic),
    entry!(EaseInOutElastic, "easeInOutElastic", ease_in_out_elastic),
    entry!(EaseInBack, "easeInBack", ease_in_back),
    entry!(EaseOutBack, "easeOutBack", ease_out_back),
    entry!(EaseInOutBack, "easeInOutBack", ease_in_out_back),
    entry!(EaseInBounce, "easeInBounce", ease_in_bounce),
    entry!(EaseOutBounce, "easeOutBounce", ease_out_bounce),
    entry!(EaseInOutBounce, "easeInOutBounce", ease_in_out_bounce),
    entry!(Steps, "steps", ease_steps_default),
    entry!(StepStart, "stepStart", ease_step_start),
    entry!(StepEnd, "stepEnd", ease_step_end),
    entry!(CubicBezier, "cubicBezier", ease_cubic_bezier_default),
    entry!(Ease, "ease", ease_cubic_bezier_default),
    entry!(EaseIn, "easeIn", ease_in_bezier),
    entry!(EaseOut, "easeOut", ease_out_bezier),
    entry!(EaseInOut, "easeInOut", ease_in_out_bezier),
];

/// Control points of the `ease` curve, also the default for `CubicBezier`.
const EASE_POINTS: [f64; 4] = [0.25, 0.1, 0.25, 1.0];

impl EasingMode {
    /// Every mode, in table order.
    pub fn all() -> impl Iterator<Item = EasingMode> {
        EASING_TABLE.iter().map(|entry| entry.mode)
    }

    /// Table row for this mode.
    pub fn entry(self) -> &'static EasingEntry {
        &EASING_TABLE[self as usize]
    }

    /// Catalog name of this mode (e.g. `"easeOutBounce"`).
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Look a mode up by its catalog name.
    pub fn from_name(name: &str) -> Option<Self> {
        EASING_TABLE
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.mode)
    }

    /// Modes whose curve depends on extra parameters.
    pub fn is_parametric(self) -> bool {
        matches!(self, Self::Steps | Self::CubicBezier)
    }

    /// Modes whose curve leaves `[0, 1]` between the endpoints.
    pub fn overshoots(self) -> bool {
        matches!(
            self,
            Self::EaseInElastic
                | Self::EaseOutElastic
                | Self::EaseInOutElastic
                | Self::EaseInBack
                | Self::EaseOutBack
                | Self::EaseInOutBack
        )
    }

    /// Evaluate this mode at elapsed time `t` of duration `d`.
    pub fn ease(self, t: f64, d: f64) -> f64 {
        ease(self, t, d)
    }
}

impl fmt::Display for EasingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EasingMode {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| AnimationError::UnknownEasingMode(s.to_string()))
    }
}

/// Parameters for the parametric curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EasingParams {
    pub n_steps: u32,
    pub step_mode: StepMode,
    /// `(x1, y1, x2, y2)`
    pub control_points: [f64; 4],
}

impl Default for EasingParams {
    fn default() -> Self {
        Self {
            n_steps: 1,
            step_mode: StepMode::End,
            control_points: EASE_POINTS,
        }
    }
}

/// Evaluate `mode` at elapsed time `t` of duration `d`.
///
/// Parametric modes use their defaults (one step at the end, the `ease`
/// control points). A non-positive duration yields `1.0`.
pub fn ease(mode: EasingMode, t: f64, d: f64) -> f64 {
    if d <= 0.0 {
        return 1.0;
    }
    (mode.entry().func)(t, d)
}

/// Evaluate `mode` with explicit parameters for the parametric curves.
pub fn ease_with_params(mode: EasingMode, t: f64, d: f64, params: &EasingParams) -> f64 {
    if d <= 0.0 {
        return 1.0;
    }
    match mode {
        EasingMode::Steps => match params.step_mode {
            StepMode::Start => ease_steps_start(t, d, params.n_steps),
            StepMode::End => ease_steps_end(t, d, params.n_steps),
        },
        EasingMode::CubicBezier => {
            let [x1, y1, x2, y2] = params.control_points;
            ease_cubic_bezier(t, d, x1, y1, x2, y2)
        }
        _ => ease(mode, t, d),
    }
}

pub fn linear(t: f64, d: f64) -> f64 {
    t / d
}

pub fn ease_in_quad(t: f64, d: f64) -> f64 {
    let p = t / d;
    p * p
}

pub fn ease_out_quad(t: f64, d: f64) -> f64 {
    let p = t / d;
    -p * (p - 2.0)
}

pub fn ease_in_out_quad(t: f64, d: f64) -> f64 {
    let mut p = t / (d / 2.0);
    if p < 1.0 {
        return 0.5 * p * p;
    }
    p -= 1.0;
    -0.5 * (p * (p - 2.0) - 1.0)
}

pub fn ease_in_cubic(t: f64, d: f64) -> f64 {
    let p = t / d;
    p * p * p
}

pub fn ease_out_cubic(t: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    p * p * p + 1.0
}

pub fn ease_in_out_cubic(t: f64, d: f64) -> f64 {
    let mut p = t / (d / 2.0);
    if p < 1.0 {
        return 0.5 * p * p * p;
    }
    p -= 2.0;
    0.5 * (p * p * p + 2.0)
}

pub fn ease_in_quart(t: f64, d: f64) -> f64 {
    let p = t / d;
    p * p * p * p
}

pub fn ease_out_quart(t: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    -(p * p * p * p - 1.0)
}

pub fn ease_in_out_quart(t: f64, d: f64) -> f64 {
    let mut p = t / (d / 2.0);
    if p < 1.0 {
        return 0.5 * p * p * p * p;
    }
    p -= 2.0;
    -0.5 * (p * p * p * p - 2.0)
}

pub fn ease_in_quint(t: f64, d: f64) -> f64 {
    let p = t / d;
    p * p * p * p * p
}

pub fn ease_out_quint(t: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    p * p * p * p * p + 1.0
}

pub fn ease_in_out_quint(t: f64, d: f64) -> f64 {
    let mut p = t / (d / 2.0);
    if p < 1.0 {
        return 0.5 * p * p * p * p * p;
    }
    p -= 2.0;
    0.5 * (p * p * p * p * p + 2.0)
}

pub fn ease_in_sine(t: f64, d: f64) -> f64 {
    // cos(PI / 2) is not exactly zero
    if t >= d {
        return 1.0;
    }
    1.0 - (t / d * FRAC_PI_2).cos()
}

pub fn ease_out_sine(t: f64, d: f64) -> f64 {
    (t / d * FRAC_PI_2).sin()
}

pub fn ease_in_out_sine(t: f64, d: f64) -> f64 {
    -0.5 * ((PI * t / d).cos() - 1.0)
}

pub fn ease_in_expo(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    2f64.powf(10.0 * (t / d - 1.0))
}

pub fn ease_out_expo(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    1.0 - 2f64.powf(-10.0 * t / d)
}

pub fn ease_in_out_expo(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    let mut p = t / (d / 2.0);
    if p < 1.0 {
        return 0.5 * 2f64.powf(10.0 * (p - 1.0));
    }
    p -= 1.0;
    0.5 * (2.0 - 2f64.powf(-10.0 * p))
}

pub fn ease_in_circ(t: f64, d: f64) -> f64 {
    let p = t / d;
    -((1.0 - p * p).sqrt() - 1.0)
}

pub fn ease_out_circ(t: f64, d: f64) -> f64 {
    let p = t / d - 1.0;
    (1.0 - p * p).sqrt()
}

pub fn ease_in_out_circ(t: f64, d: f64) -> f64 {
    let mut p = t / (d / 2.0);
    if p < 1.0 {
        return -0.5 * ((1.0 - p * p).sqrt() - 1.0);
    }
    p -= 2.0;
    0.5 * ((1.0 - p * p).sqrt() + 1.0)
}

pub fn ease_in_elastic(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    let p = d * 0.3;
    let s = p / 4.0;
    let q = t / d - 1.0;
    -(2f64.powf(10.0 * q) * ((q * d - s) * (2.0 * PI) / p).sin())
}

pub fn ease_out_elastic(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    let p = d * 0.3;
    let s = p / 4.0;
    let q = t / d;
    2f64.powf(-10.0 * q) * ((q * d - s) * (2.0 * PI) / p).sin() + 1.0
}

pub fn ease_in_out_elastic(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    let p = d * (0.3 * 1.5);
    let s = p / 4.0;
    let q = t / (d / 2.0) - 1.0;
    if q < 0.0 {
        -0.5 * (2f64.powf(10.0 * q) * ((q * d - s) * (2.0 * PI) / p).sin())
    } else {
        2f64.powf(-10.0 * q) * ((q * d - s) * (2.0 * PI) / p).sin() * 0.5 + 1.0
    }
}

const BACK_OVERSHOOT: f64 = 1.70158;

pub fn ease_in_back(t: f64, d: f64) -> f64 {
    if t >= d {
        return 1.0;
    }
    let p = t / d;
    p * p * ((BACK_OVERSHOOT + 1.0) * p - BACK_OVERSHOOT)
}

pub fn ease_out_back(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    let p = t / d - 1.0;
    p * p * ((BACK_OVERSHOOT + 1.0) * p + BACK_OVERSHOOT) + 1.0
}

pub fn ease_in_out_back(t: f64, d: f64) -> f64 {
    let mut p = t / (d / 2.0);
    let s = BACK_OVERSHOOT * 1.525;
    if p < 1.0 {
        return 0.5 * (p * p * ((s + 1.0) * p - s));
    }
    p -= 2.0;
    0.5 * (p * p * ((s + 1.0) * p + s) + 2.0)
}

fn bounce_out_internal(t: f64, d: f64) -> f64 {
    let mut p = t / d;
    if p < 1.0 / 2.75 {
        7.5625 * p * p
    } else if p < 2.0 / 2.75 {
        p -= 1.5 / 2.75;
        7.5625 * p * p + 0.75
    } else if p < 2.5 / 2.75 {
        p -= 2.25 / 2.75;
        7.5625 * p * p + 0.9375
    } else {
        p -= 2.625 / 2.75;
        7.5625 * p * p + 0.984375
    }
}

pub fn ease_in_bounce(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    1.0 - bounce_out_internal(d - t, d)
}

pub fn ease_out_bounce(t: f64, d: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= d {
        return 1.0;
    }
    bounce_out_internal(t, d)
}

pub fn ease_in_out_bounce(t: f64, d: f64) -> f64 {
    if t < d / 2.0 {
        ease_in_bounce(t * 2.0, d) * 0.5
    } else {
        ease_out_bounce(t * 2.0 - d, d) * 0.5 + 0.5
    }
}

#[inline]
fn steps_end(p: f64, n_steps: u32) -> f64 {
    let n = n_steps.max(1) as f64;
    (p * n).floor() / n
}

/// Stepped curve that jumps at the start of each of its `n_steps` intervals.
pub fn ease_steps_start(t: f64, d: f64, n_steps: u32) -> f64 {
    1.0 - steps_end(1.0 - t / d, n_steps)
}

/// Stepped curve that jumps at the end of each of its `n_steps` intervals.
pub fn ease_steps_end(t: f64, d: f64, n_steps: u32) -> f64 {
    steps_end(t / d, n_steps)
}

fn ease_steps_default(t: f64, d: f64) -> f64 {
    ease_steps_end(t, d, 1)
}

fn ease_step_start(t: f64, d: f64) -> f64 {
    ease_steps_start(t, d, 1)
}

fn ease_step_end(t: f64, d: f64) -> f64 {
    ease_steps_end(t, d, 1)
}

/// Number of bisection rounds used to invert the bezier x polynomial.
///
/// Bounds the error on the solved parameter to 2^-30.
pub const BEZIER_BISECTION_STEPS: u32 = 30;

/// x (or y) coordinate of a unit cubic bezier at parameter `t`, with the
/// endpoints pinned at 0 and 1.
/// Formula: 3(1-t)²t·c1 + 3(1-t)t²·c2 + t³
#[inline]
pub fn bezier_coordinate(t: f64, c1: f64, c2: f64) -> f64 {
    let omt = 1.0 - t;
    3.0 * omt * omt * t * c1 + 3.0 * omt * t * t * c2 + t * t * t
}

/// Solve the curve parameter for a given `x` by bisection.
pub fn bezier_t_for_x(x: f64, x1: f64, x2: f64) -> f64 {
    let mut min_t = 0.0;
    let mut max_t = 1.0;

    for _ in 0..BEZIER_BISECTION_STEPS {
        let guess_t = (min_t + max_t) / 2.0;
        let guess_x = bezier_coordinate(guess_t, x1, x2);
        if x < guess_x {
            max_t = guess_t;
        } else {
            min_t = guess_t;
        }
    }

    (min_t + max_t) / 2.0
}

/// Cubic bezier easing with control points `(x1, y1)` and `(x2, y2)`.
pub fn ease_cubic_bezier(t: f64, d: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let p = t / d;
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }
    bezier_coordinate(bezier_t_for_x(p, x1, x2), y1, y2)
}

fn ease_cubic_bezier_default(t: f64, d: f64) -> f64 {
    let [x1, y1, x2, y2] = EASE_POINTS;
    ease_cubic_bezier(t, d, x1, y1, x2, y2)
}

fn ease_in_bezier(t: f64, d: f64) -> f64 {
    ease_cubic_bezier(t, d, 0.42, 0.0, 1.0, 1.0)
}

fn ease_out_bezier(t: f64, d: f64) -> f64 {
    ease_cubic_bezier(t, d, 0.0, 0.0, 0.58, 1.0)
}

fn ease_in_out_bezier(t: f64, d: f64) -> f64 {
    ease_cubic_bezier(t, d, 0.42, 0.0, 0.58, 1.0)
}
