use serde::{Deserialize, Serialize};

/// Value-to-linear transform of an axis.
///
/// Restricted to transforms that are pure functions of the data value;
/// categorical and time axes need lookup state and live with the caller.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Scale {
    Linear,
    Log10,
    Symlog { lin_thresh: f64 },
    Power { exponent: f64 },
}

impl Default for Scale {
    fn default() -> Self {
        Self::Linear
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Axis {
    pub scale: Scale,
}

impl Axis {
    pub const fn linear() -> Self {
        Self {
            scale: Scale::Linear,
        }
    }

    pub const fn log10() -> Self {
        Self {
            scale: Scale::Log10,
        }
    }

    /// Map a data value onto the axis's linear coordinate.
    ///
    /// NaN and out-of-domain inputs (log of a non-positive value) propagate
    /// as NaN; downstream reconstruction treats them as degenerate input.
    pub fn value_to_linear(&self, v: f64) -> f64 {
        match self.scale {
            Scale::Linear => v,
            Scale::Log10 => v.log10(),
            Scale::Symlog { lin_thresh } => v.signum() * (1.0 + (v / lin_thresh).abs()).log10(),
            Scale::Power { exponent } => v.powf(exponent),
        }
    }
}

/// Map every element of `values` through the axis and a scalar scale factor.
pub fn map_coords(axis: &Axis, values: &[f64], scale: f64) -> Vec<f64> {
    values
        .iter()
        .map(|&v| axis.value_to_linear(v) * scale)
        .collect()
}
