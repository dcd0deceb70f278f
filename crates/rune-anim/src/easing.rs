//! Easing functions for animation timing.
//!
//! Four quadratic timing curves are supported:
//! - Linear
//! - EaseIn (`p²`)
//! - EaseOut (`√p`)
//! - EaseInOut (piecewise quadratic blend)
//!
//! # Usage
//!
//! ```
//! use rune_anim::EasingFunction;
//!
//! let ease = EasingFunction::EaseInOut;
//! assert_eq!(ease.evaluate(0.25), 0.125);
//!
//! // Unknown names are lenient and fall back to linear.
//! assert_eq!(EasingFunction::from_name("bounce"), EasingFunction::Linear);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Easing function for animation timing.
///
/// Maps a linear progress value (0.0 to 1.0) to an eased progress value in
/// the same range. Serialized by its kebab-case name; any name that is not
/// recognised deserializes to [`EasingFunction::Linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EasingFunction {
    /// No easing.
    Linear,
    /// Slow start, accelerating: `p²`.
    EaseIn,
    /// Fast start, decelerating: `√p`.
    EaseOut,
    /// Slow start and end: `2p²` up to the midpoint, `1 - 2(1-p)²` after.
    EaseInOut,
}

impl Default for EasingFunction {
    fn default() -> Self {
        Self::EaseInOut
    }
}

impl EasingFunction {
    /// Evaluate the easing function at the given progress.
    ///
    /// Input is clamped to `[0, 1]`.
    pub fn evaluate(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);

        match self {
            Self::Linear => p,
            Self::EaseIn => p * p,
            Self::EaseOut => p.sqrt(),
            Self::EaseInOut => {
                if p <= 0.5 {
                    2.0 * p * p
                } else {
                    let q = 1.0 - p;
                    1.0 - 2.0 * q * q
                }
            }
        }
    }

    /// Look up an easing function by name.
    ///
    /// Accepts the CSS spellings (`ease-in`) as well as snake and camel case
    /// variants. Unknown names fall back to [`EasingFunction::Linear`].
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "easein" => Self::EaseIn,
            "easeout" => Self::EaseOut,
            "easeinout" => Self::EaseInOut,
            _ => Self::Linear,
        }
    }

    /// The canonical kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for EasingFunction {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for EasingFunction {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<EasingFunction> for String {
    fn from(easing: EasingFunction) -> Self {
        easing.name().to_string()
    }
}
