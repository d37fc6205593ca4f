/// Easing curve mapping linear progress in `[0, 1]` to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// No easing.
    Linear,
    /// `sin(t * π/2)`: fast start, gentle landing. Used for scrubbing.
    #[default]
    OutSine,
    /// `(1 - cos(t * π)) / 2`.
    InOutSine,
    /// Quadratic ease-out.
    OutQuad,
    /// Cubic ease-out.
    OutCubic,
}

impl Ease {
    /// Eased progress for `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutSine => (t * std::f64::consts::FRAC_PI_2).sin(),
            Self::InOutSine => (1.0 - (t * std::f64::consts::PI).cos()) / 2.0,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }

    /// Parse the snake_case name used in configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "out_sine" => Some(Self::OutSine),
            "in_out_sine" => Some(Self::InOutSine),
            "out_quad" => Some(Self::OutQuad),
            "out_cubic" => Some(Self::OutCubic),
            _ => None,
        }
    }
}
