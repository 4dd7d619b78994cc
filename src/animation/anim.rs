use crate::{
    animation::ease::Ease,
    foundation::core::Vec2,
    foundation::error::{CaptureError, CaptureResult},
};

/// Values that can be interpolated between keyframes.
pub trait Lerp: Sized {
    /// Interpolate from `a` (t=0) to `b` (t=1).
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// An animated property sampled in clip-local seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Anim<T> {
    /// The same value at every time.
    Constant(T),
    /// Piecewise interpolation between timed keys.
    Keyframes(Keyframes<T>),
}

impl<T> Anim<T>
where
    T: Lerp + Clone,
{
    /// Shorthand for [`Anim::Constant`].
    pub fn constant(value: T) -> Self {
        Self::Constant(value)
    }

    /// Sample the property at clip-local time `t` (seconds).
    pub fn sample(&self, t: f64) -> CaptureResult<T> {
        match self {
            Self::Constant(v) => Ok(v.clone()),
            Self::Keyframes(kf) => kf.sample(t),
        }
    }

    /// Check key ordering and finiteness.
    pub fn validate(&self) -> CaptureResult<()> {
        match self {
            Self::Constant(_) => Ok(()),
            Self::Keyframes(kf) => kf.validate(),
        }
    }
}

/// Keys sorted by time; values before the first key and after the last key are held.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframes<T> {
    /// Keys sorted by `time`.
    pub keys: Vec<Keyframe<T>>,
}

impl<T> Keyframes<T>
where
    T: Lerp + Clone,
{
    /// Check key ordering and finiteness.
    pub fn validate(&self) -> CaptureResult<()> {
        if self.keys.is_empty() {
            return Err(CaptureError::timeline("keyframes must have at least one key"));
        }
        if self.keys.iter().any(|k| !k.time.is_finite()) {
            return Err(CaptureError::timeline("keyframe times must be finite"));
        }
        if !self.keys.windows(2).all(|w| w[0].time <= w[1].time) {
            return Err(CaptureError::timeline("keyframes must be sorted by time"));
        }
        Ok(())
    }

    /// Sample at clip-local time `t` (seconds).
    pub fn sample(&self, t: f64) -> CaptureResult<T> {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return Err(CaptureError::timeline("keyframes have no keys"));
        };

        let idx = self.keys.partition_point(|k| k.time <= t);
        if idx == 0 {
            return Ok(first.value.clone());
        }
        if idx >= self.keys.len() {
            return Ok(last.value.clone());
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let te = a.ease.progress(t, a.time, b.time);
        Ok(T::lerp(&a.value, &b.value, te))
    }
}

/// One timed key.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe<T> {
    /// Clip-local time in seconds.
    pub time: f64,
    /// Value at `time`.
    pub value: T,
    /// Ease applied toward the next key.
    #[serde(default)]
    pub ease: Ease,
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
