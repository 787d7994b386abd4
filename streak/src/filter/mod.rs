//! Temporal reconstruction filters.
//!
//! A temporal filter is a 1-D kernel over bin offsets. It is used in two places:
//!
//! - **Accumulation**: a sample's contribution is splatted over every bin whose center
//!   lies inside the kernel support, with kernel weights normalized over the touched
//!   bins so the deposited weight always equals the sample weight.
//! - **Development**: a slice is reconstructed from its neighbours by convolving the
//!   accumulated value and weight sums along the bin dimension before normalizing.
//!
//! All radii are expressed in bins, not OPL units.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::{Error, Result};

/// Midpoint sub-samples per bin when averaging a kernel for readout.
const READOUT_SUBSAMPLES: usize = 16;

/// Kernel shape of a temporal filter.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FilterKind {
    /// Unit-height box of half-width 0.5: every sample lands in exactly one bin.
    Box,
    /// Linear falloff to zero at the radius.
    Tent,
    /// Gaussian truncated at four standard deviations.
    Gaussian { stddev: f32 },
    /// Windowed sinc with `lobes` lobes.
    Lanczos { lobes: u32 },
}

/// Serialized temporal filter selection, e.g. `{ type: gaussian, stddev: 0.5 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemporalFilterConfig {
    Box,
    Tent {
        #[serde(default = "default_tent_radius")]
        radius: f32,
    },
    Gaussian {
        #[serde(default = "default_gaussian_stddev")]
        stddev: f32,
    },
    Lanczos {
        #[serde(default = "default_lanczos_lobes")]
        lobes: u32,
    },
}

fn default_tent_radius() -> f32 {
    1.0
}

fn default_gaussian_stddev() -> f32 {
    0.5
}

fn default_lanczos_lobes() -> u32 {
    3
}

impl Default for TemporalFilterConfig {
    fn default() -> Self {
        Self::Gaussian {
            stddev: default_gaussian_stddev(),
        }
    }
}

/// Immutable temporal reconstruction kernel, shared read-only by all workers.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalFilter {
    kind: FilterKind,
    radius: f32,
}

impl TemporalFilter {
    pub fn from_config(config: &TemporalFilterConfig) -> Result<Self> {
        match *config {
            TemporalFilterConfig::Box => Ok(Self::box_filter()),
            TemporalFilterConfig::Tent { radius } => Self::tent(radius),
            TemporalFilterConfig::Gaussian { stddev } => Self::gaussian(stddev),
            TemporalFilterConfig::Lanczos { lobes } => Self::lanczos(lobes),
        }
    }

    pub fn box_filter() -> Self {
        Self {
            kind: FilterKind::Box,
            radius: 0.5,
        }
    }

    pub fn tent(radius: f32) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "tent filter radius must be positive, got {radius}"
            )));
        }
        Ok(Self {
            kind: FilterKind::Tent,
            radius,
        })
    }

    pub fn gaussian(stddev: f32) -> Result<Self> {
        if !(stddev.is_finite() && stddev > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "gaussian filter stddev must be positive, got {stddev}"
            )));
        }
        Ok(Self {
            kind: FilterKind::Gaussian { stddev },
            radius: 4.0 * stddev,
        })
    }

    pub fn lanczos(lobes: u32) -> Result<Self> {
        if lobes == 0 {
            return Err(Error::InvalidConfiguration(
                "lanczos filter needs at least one lobe".to_string(),
            ));
        }
        Ok(Self {
            kind: FilterKind::Lanczos { lobes },
            radius: lobes as f32,
        })
    }

    #[inline]
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Support radius in bins.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Kernel value at `offset` bins from the center. Zero outside the support.
    pub fn eval(&self, offset: f32) -> f32 {
        let x = offset.abs();
        if x > self.radius {
            return 0.0;
        }

        match self.kind {
            FilterKind::Box => 1.0,
            FilterKind::Tent => 1.0 - x / self.radius,
            FilterKind::Gaussian { stddev } => {
                let alpha = -1.0 / (2.0 * stddev * stddev);
                // Shift down so the kernel reaches zero at the truncation radius
                ((alpha * x * x).exp() - (alpha * self.radius * self.radius).exp()).max(0.0)
            }
            FilterKind::Lanczos { lobes } => lanczos_kernel(x, lobes as f32),
        }
    }

    /// Largest bin offset whose extent `[k - 0.5, k + 0.5]` overlaps the support.
    #[inline]
    pub fn integer_support(&self) -> i32 {
        (self.radius - 0.5).ceil().max(0.0) as i32
    }

    /// Readout weights for offsets `-integer_support()..=integer_support()`.
    ///
    /// Each weight is the mean of the kernel over the neighbour bin's extent,
    /// so kernels that vanish at whole-bin offsets still mix adjacent slices.
    pub fn discrete_weights(&self) -> Vec<f32> {
        let r = self.integer_support();
        let step = 1.0 / READOUT_SUBSAMPLES as f32;
        (-r..=r)
            .map(|k| {
                let start = k as f32 - 0.5;
                let sum: f32 = (0..READOUT_SUBSAMPLES)
                    .map(|i| self.eval(start + (i as f32 + 0.5) * step))
                    .sum();
                sum * step
            })
            .collect()
    }
}

impl std::fmt::Display for TemporalFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(radius = {})", self.kind, self.radius)
    }
}

/// Lanczos kernel function.
#[inline]
fn lanczos_kernel(x: f32, a: f32) -> f32 {
    if x.abs() < 1e-6 {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }
    let pi_x = std::f32::consts::PI * x;
    let pi_x_a = pi_x / a;
    (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
}
