//! Per-worker streak block.
//!
//! To avoid lock contention when rendering with many threads, each worker first
//! accumulates its samples into a private [`StreakBlock`] covering its tile and
//! the full time axis. The finished block is then merged into the shared film
//! with [`StreakFilm::put`](crate::StreakFilm::put).

use std::sync::Arc;

use common::Buffer3;

use crate::cell::{Cell, PixelRect};
use crate::filter::TemporalFilter;
use crate::sample::RadianceSample;
use crate::time_axis::TimeAxis;

/// Private space-time accumulator for one tile.
#[derive(Debug, Clone)]
pub struct StreakBlock {
    rect: PixelRect,
    axis: TimeAxis,
    filter: Option<Arc<TemporalFilter>>,
    cells: Buffer3<Cell>,
    /// Accepted samples per local row.
    row_samples: Vec<u64>,
}

impl StreakBlock {
    pub fn new(rect: PixelRect, axis: TimeAxis, filter: Option<Arc<TemporalFilter>>) -> Self {
        Self {
            rect,
            axis,
            filter,
            cells: Buffer3::new_default(
                rect.size.x as usize,
                rect.size.y as usize,
                axis.num_bins() as usize,
            ),
            row_samples: vec![0; rect.size.y as usize],
        }
    }

    #[inline]
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    #[inline]
    pub fn time_axis(&self) -> &TimeAxis {
        &self.axis
    }

    #[inline]
    pub fn time_filter(&self) -> Option<&TemporalFilter> {
        self.filter.as_deref()
    }

    /// Deposit one contribution at film pixel `(x, y)`.
    ///
    /// With a temporal filter attached the contribution is spread over the bins
    /// inside the filter support, otherwise it lands in the bin containing `opl`.
    /// Returns `false` when the sample was dropped: pixel outside the block,
    /// `opl` outside `[start_opl, end_opl)`, or non-finite value/weight.
    pub fn accumulate(&mut self, x: i32, y: i32, opl: f32, value: f32, weight: f32) -> bool {
        let Some((lx, ly)) = self.accept(x, y, opl, value, weight) else {
            return false;
        };

        let column = self.cells.column_mut(lx, ly);
        match &self.filter {
            Some(filter) => splat(column, &self.axis, filter, opl, value, weight),
            None => deposit_nearest(column, &self.axis, opl, value, weight),
        }
        self.row_samples[ly] += 1;
        true
    }

    /// Like [`accumulate`](Self::accumulate) but always deposits into the single
    /// bin containing `opl`, ignoring any temporal filter.
    pub fn accumulate_raw(&mut self, x: i32, y: i32, opl: f32, value: f32, weight: f32) -> bool {
        let Some((lx, ly)) = self.accept(x, y, opl, value, weight) else {
            return false;
        };

        deposit_nearest(
            self.cells.column_mut(lx, ly),
            &self.axis,
            opl,
            value,
            weight,
        );
        self.row_samples[ly] += 1;
        true
    }

    /// Deposit every sample of one traced path. Returns how many landed.
    pub fn accumulate_samples(
        &mut self,
        x: i32,
        y: i32,
        samples: &[RadianceSample],
        weight: f32,
    ) -> usize {
        samples
            .iter()
            .filter(|s| self.accumulate(x, y, s.opl, s.value, weight))
            .count()
    }

    /// Reset all cells for reuse on the same rectangle.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
        self.row_samples.fill(0);
    }

    /// Retarget the block to `rect`, reallocating only when the size changes.
    pub fn reset(&mut self, rect: PixelRect) {
        if rect.size != self.rect.size {
            *self = Self::new(rect, self.axis, self.filter.take());
        } else {
            self.rect = rect;
            self.clear();
        }
    }

    /// Cell at film pixel `(x, y)` and `bin`, `None` outside the block.
    pub fn cell(&self, x: u32, y: u32, bin: u32) -> Option<Cell> {
        if !self.rect.contains(x as i32, y as i32) || bin >= self.axis.num_bins() {
            return None;
        }
        let lx = (x - self.rect.offset.x) as usize;
        let ly = (y - self.rect.offset.y) as usize;
        Some(*self.cells.get(lx, ly, bin as usize))
    }

    /// Number of accepted contributions.
    pub fn samples(&self) -> u64 {
        self.row_samples.iter().sum()
    }

    /// Sum of all accumulated cell weights.
    pub fn total_weight(&self) -> f64 {
        self.cells.values().iter().map(|c| c.weight as f64).sum()
    }

    /// Cells of local row `ly`, pixel-major with bins innermost.
    #[inline]
    pub(crate) fn row(&self, ly: usize) -> &[Cell] {
        self.cells.row(ly)
    }

    #[inline]
    pub(crate) fn row_samples(&self, ly: usize) -> u64 {
        self.row_samples[ly]
    }

    /// Local coordinates of an acceptable sample.
    #[inline]
    fn accept(&self, x: i32, y: i32, opl: f32, value: f32, weight: f32) -> Option<(usize, usize)> {
        if !self.rect.contains(x, y) {
            return None;
        }
        if !self.axis.is_in_range(opl) || !value.is_finite() || !weight.is_finite() {
            return None;
        }
        Some((
            (x - self.rect.offset.x as i32) as usize,
            (y - self.rect.offset.y as i32) as usize,
        ))
    }
}

/// Box reconstruction: the full contribution goes to the bin containing `opl`.
#[inline]
fn deposit_nearest(column: &mut [Cell], axis: &TimeAxis, opl: f32, value: f32, weight: f32) {
    if let Some(bin) = axis.bin_index(opl) {
        let cell = &mut column[bin];
        cell.value += value * weight;
        cell.weight += weight;
    }
}

/// Spread a contribution over the filter support with two-pass normalization,
/// so the weights written sum to `weight` even when the support is clipped.
fn splat(
    column: &mut [Cell],
    axis: &TimeAxis,
    filter: &TemporalFilter,
    opl: f32,
    value: f32,
    weight: f32,
) {
    let Some(bins) = axis.bin_index_range(opl, filter.radius()) else {
        deposit_nearest(column, axis, opl, value, weight);
        return;
    };

    let coord = axis.to_bin_coordinate(opl);
    let kernel = |bin: usize| filter.eval(bin as f32 + 0.5 - coord);

    let total_weight: f32 = bins.clone().map(kernel).sum();
    if total_weight.abs() < 1e-10 {
        deposit_nearest(column, axis, opl, value, weight);
        return;
    }

    let inv_total = weight / total_weight;
    for bin in bins {
        let w = kernel(bin) * inv_total;
        let cell = &mut column[bin];
        cell.value += value * w;
        cell.weight += w;
    }
}

#[cfg(test)]
mod tests;
