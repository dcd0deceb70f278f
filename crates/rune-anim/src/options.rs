//! Animation options and defaults.
//!
//! - `AnimationDefaults`: Global defaults, snapshotted at construction
//! - `AnimationOptions`: Per-call overrides, every field optional
//! - `AnimationSpec`: Fully resolved options an animation runs with
//! - `StopOptions`: Whether `stop` completes or abandons an animation

use rune_config::AnimationConfig;
use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::error::{AnimationError, Result};

/// Process-wide defaults applied to new animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDefaults {
    pub duration_ms: f64,
    pub easing: EasingFunction,
    pub infinite: bool,
    pub debug: bool,
}

impl Default for AnimationDefaults {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
            easing: EasingFunction::EaseInOut,
            infinite: false,
            debug: false,
        }
    }
}

impl From<&AnimationConfig> for AnimationDefaults {
    fn from(config: &AnimationConfig) -> Self {
        Self {
            duration_ms: config.duration,
            easing: EasingFunction::from_name(&config.easing),
            infinite: config.infinite,
            debug: config.debug,
        }
    }
}

/// Per-animation overrides merged over [`AnimationDefaults`].
///
/// ```
/// use rune_anim::{AnimationOptions, EasingFunction};
///
/// let options = AnimationOptions::new()
///     .duration_ms(300.0)
///     .easing(EasingFunction::EaseOut);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationOptions {
    pub duration_ms: Option<f64>,
    pub easing: Option<EasingFunction>,
    pub infinite: Option<bool>,
    /// Absolute start time in milliseconds; the clock's current time if unset.
    pub start_ms: Option<f64>,
    pub debug: Option<bool>,
}

impl AnimationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn easing(mut self, easing: impl Into<EasingFunction>) -> Self {
        self.easing = Some(easing.into());
        self
    }

    pub fn infinite(mut self, infinite: bool) -> Self {
        self.infinite = Some(infinite);
        self
    }

    pub fn start_ms(mut self, start_ms: f64) -> Self {
        self.start_ms = Some(start_ms);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Merge over `defaults`, using `now` as the start time when unset.
    ///
    /// Fails if the resulting duration is not finite and strictly positive.
    pub fn resolve(&self, defaults: &AnimationDefaults, now: f64) -> Result<AnimationSpec> {
        let duration_ms = self.duration_ms.unwrap_or(defaults.duration_ms);
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return Err(AnimationError::InvalidDuration(duration_ms));
        }

        Ok(AnimationSpec {
            duration_ms,
            easing: self.easing.unwrap_or(defaults.easing),
            infinite: self.infinite.unwrap_or(defaults.infinite),
            start_ms: self.start_ms.unwrap_or(now),
            debug: self.debug.unwrap_or(defaults.debug),
        })
    }
}

/// Resolved options of a running animation, passed to every frame callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub duration_ms: f64,
    pub easing: EasingFunction,
    pub infinite: bool,
    pub start_ms: f64,
    pub debug: bool,
}

impl AnimationSpec {
    /// Eased progress at `time_ms`.
    ///
    /// Linear progress is wrapped modulo 1 for infinite animations and
    /// clamped to `[0, 1]` otherwise.
    pub fn progress_at(&self, time_ms: f64) -> f64 {
        let linear = (time_ms - self.start_ms) / self.duration_ms;
        let linear = if self.infinite {
            linear.rem_euclid(1.0)
        } else {
            linear.clamp(0.0, 1.0)
        };
        self.easing.evaluate(linear)
    }
}

/// Options for [`Animation::stop`](crate::Animation::stop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOptions {
    /// Render the final frame and fulfil (`true`), or abandon and reject.
    pub finish: bool,
}

impl StopOptions {
    /// Complete immediately.
    pub const FINISH: Self = Self { finish: true };
    /// Abandon without rendering a final frame.
    pub const CANCEL: Self = Self { finish: false };
}

impl Default for StopOptions {
    fn default() -> Self {
        Self::FINISH
    }
}
