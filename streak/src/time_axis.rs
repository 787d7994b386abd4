//! Optical-path-length discretization of the measurement domain.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Uniform binning of optical path length (OPL).
///
/// Bin `i` covers `[start_opl + i * bin_width_opl, start_opl + (i + 1) * bin_width_opl)`.
/// Immutable once built; the calibrator replaces the whole axis instead of editing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    start_opl: f32,
    bin_width_opl: f32,
    num_bins: u32,
}

impl TimeAxis {
    pub fn new(start_opl: f32, bin_width_opl: f32, num_bins: u32) -> Result<Self> {
        if !start_opl.is_finite() {
            return Err(Error::InvalidConfiguration(format!(
                "start_opl must be finite, got {start_opl}"
            )));
        }
        if !(bin_width_opl.is_finite() && bin_width_opl > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "bin_width_opl must be positive, got {bin_width_opl}"
            )));
        }
        if num_bins == 0 {
            return Err(Error::InvalidConfiguration(
                "num_bins must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            start_opl,
            bin_width_opl,
            num_bins,
        })
    }

    #[inline]
    pub fn start_opl(&self) -> f32 {
        self.start_opl
    }

    #[inline]
    pub fn bin_width_opl(&self) -> f32 {
        self.bin_width_opl
    }

    #[inline]
    pub fn num_bins(&self) -> u32 {
        self.num_bins
    }

    #[inline]
    pub fn end_opl(&self) -> f32 {
        self.start_opl + self.num_bins as f32 * self.bin_width_opl
    }

    /// Length of the captured window in OPL units.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.num_bins as f32 * self.bin_width_opl
    }

    /// Continuous bin coordinate of `opl`. Bin `i` spans `[i, i + 1)`.
    #[inline]
    pub fn to_bin_coordinate(&self, opl: f32) -> f32 {
        (opl - self.start_opl) / self.bin_width_opl
    }

    #[inline]
    pub fn is_in_range(&self, opl: f32) -> bool {
        opl >= self.start_opl && opl < self.end_opl()
    }

    /// Index of the bin containing `opl`, or `None` when it lies outside the axis.
    pub fn bin_index(&self, opl: f32) -> Option<usize> {
        if !self.is_in_range(opl) {
            return None;
        }
        // end_opl - eps can round up to num_bins
        let bin = self.to_bin_coordinate(opl).floor() as usize;
        Some(bin.min(self.num_bins as usize - 1))
    }

    /// OPL at the center of `bin`.
    #[inline]
    pub fn bin_center(&self, bin: usize) -> f32 {
        self.start_opl + (bin as f32 + 0.5) * self.bin_width_opl
    }

    /// Bins whose centers lie within `radius` bins of `opl`, clamped to the axis.
    ///
    /// Returns `None` when no bin center falls inside the support.
    pub fn bin_index_range(&self, opl: f32, radius: f32) -> Option<RangeInclusive<usize>> {
        let center = self.to_bin_coordinate(opl) - 0.5;
        let lo = (center - radius).ceil().max(0.0);
        let hi = (center + radius).floor().min(self.num_bins as f32 - 1.0);

        if lo > hi {
            return None;
        }
        Some(lo as usize..=hi as usize)
    }
}

impl std::fmt::Display for TimeAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} bins of {} OPL over [{}, {})",
            self.num_bins,
            self.bin_width_opl,
            self.start_opl,
            self.end_opl()
        )
    }
}
