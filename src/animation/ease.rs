/// Easing curve applied from one keyframe toward the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Constant speed.
    #[default]
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in-out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in-out.
    InOutCubic,
    /// Hold the segment's start value until its end time is reached.
    Step,
}

impl Ease {
    /// Eased progress in `[0, 1]` through the key segment `[start, end]` at time `t`.
    ///
    /// Times outside the segment clamp to its ends. An empty or inverted segment reports 0 so
    /// the earlier key wins.
    pub fn progress(self, t: f64, start: f64, end: f64) -> f64 {
        let span = end - start;
        if span.is_nan() || span <= 0.0 {
            return 0.0;
        }
        self.curve(((t - start) / span).clamp(0.0, 1.0))
    }

    fn curve(self, u: f64) -> f64 {
        match self {
            Self::Linear => u,
            Self::InQuad => ease_in(u, 2),
            Self::OutQuad => ease_out(u, 2),
            Self::InOutQuad => ease_in_out(u, 2),
            Self::InCubic => ease_in(u, 3),
            Self::OutCubic => ease_out(u, 3),
            Self::InOutCubic => ease_in_out(u, 3),
            Self::Step => {
                if u >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

fn ease_in(u: f64, power: i32) -> f64 {
    u.powi(power)
}

fn ease_out(u: f64, power: i32) -> f64 {
    1.0 - (1.0 - u).powi(power)
}

// First half is the ease-in curve compressed into [0, 0.5], second half mirrors it.
fn ease_in_out(u: f64, power: i32) -> f64 {
    if u < 0.5 {
        ease_in(2.0 * u, power) / 2.0
    } else {
        1.0 - ease_in(2.0 - 2.0 * u, power) / 2.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
