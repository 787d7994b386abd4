//! Shared space-time film.
//!
//! Workers fill private [`StreakBlock`]s and merge them with [`StreakFilm::put`].
//! Merging is a pointwise sum of `(Σ value·weight, Σ weight)` cells, so the
//! canonical buffer is independent of merge order. Once all merges for the data
//! of interest have completed, [`StreakFilm::bitmap`] develops one time slice.
//!
//! Pixel coordinates used by blocks and readout are relative to the crop window.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use common::Buffer2;
use common::parallel::fill_rows;
use glam::UVec2;
use rayon::prelude::*;

use crate::block::StreakBlock;
use crate::calibration::{BinCalibrator, Scene, Sensor};
use crate::cell::{Cell, PixelRect};
use crate::config::FilmConfig;
use crate::error::{Error, Result};
use crate::filter::TemporalFilter;
use crate::storage::{CellStorage, RowTotals, StorageKind, create_storage};
use crate::time_axis::TimeAxis;

/// Film-wide accumulation counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccumulationTotals {
    /// Accepted contributions merged into the film.
    pub samples: u64,
    /// Sum of all cell weights.
    pub weight: f64,
    /// Blocks merged with [`StreakFilm::put`].
    pub blocks_merged: u64,
}

/// Transient film accumulating a streak image over the crop window.
#[derive(Debug)]
pub struct StreakFilm {
    config: FilmConfig,
    axis: TimeAxis,
    filter: Option<Arc<TemporalFilter>>,
    storage: Box<dyn CellStorage>,
    blocks_merged: AtomicU64,
}

impl StreakFilm {
    pub fn new(config: FilmConfig) -> Result<Self> {
        config.validate()?;
        let axis = config.time_axis()?;
        let filter = config.build_time_filter()?.map(Arc::new);
        let crop = config.effective_crop_size();
        let storage = create_storage(config.storage, crop.x, crop.y, axis.num_bins());

        tracing::info!(
            width = crop.x,
            height = crop.y,
            num_bins = axis.num_bins(),
            bin_width_opl = axis.bin_width_opl(),
            start_opl = axis.start_opl(),
            storage = %config.storage,
            time_filter = filter.is_some(),
            "Created streak film"
        );

        Ok(Self {
            config,
            axis,
            filter,
            storage,
            blocks_merged: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &FilmConfig {
        &self.config
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.config.size
    }

    #[inline]
    pub fn crop_size(&self) -> UVec2 {
        self.config.effective_crop_size()
    }

    #[inline]
    pub fn crop_offset(&self) -> UVec2 {
        self.config.crop_offset
    }

    #[inline]
    pub fn time_axis(&self) -> &TimeAxis {
        &self.axis
    }

    #[inline]
    pub fn num_bins(&self) -> u32 {
        self.axis.num_bins()
    }

    #[inline]
    pub fn start_opl(&self) -> f32 {
        self.axis.start_opl()
    }

    #[inline]
    pub fn bin_width_opl(&self) -> f32 {
        self.axis.bin_width_opl()
    }

    #[inline]
    pub fn end_opl(&self) -> f32 {
        self.axis.end_opl()
    }

    #[inline]
    pub fn time_filter(&self) -> Option<&TemporalFilter> {
        self.filter.as_deref()
    }

    #[inline]
    pub fn should_auto_detect_bins(&self) -> bool {
        self.config.auto_detect_bins
    }

    #[inline]
    pub fn storage_kind(&self) -> StorageKind {
        self.storage.kind()
    }

    /// Pixel rectangle of the crop window in film coordinates.
    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(UVec2::ZERO, self.crop_size())
    }

    /// Create an empty block for the tile at `offset` with `size`.
    ///
    /// The rectangle is grown by the spatial filter border and clipped to the
    /// crop window. The block shares the film's time axis and temporal filter.
    pub fn create_block(&self, offset: UVec2, size: UVec2) -> StreakBlock {
        let rect = PixelRect::new(offset, size)
            .expand(self.config.block_border)
            .intersect(&self.bounds());
        StreakBlock::new(rect, self.axis, self.filter.clone())
    }

    /// Merge `block` into the canonical buffer.
    ///
    /// Safe to call from many workers at once. Rows are locked one at a time and
    /// each row's counters are updated under the same lock as its cells.
    pub fn put(&self, block: &StreakBlock) -> Result<()> {
        if *block.time_axis() != self.axis {
            return Err(Error::AxisMismatch {
                expected: self.axis,
                actual: *block.time_axis(),
            });
        }

        let rect = block.rect();
        if !self.bounds().contains_rect(&rect) {
            return Err(Error::BlockOutOfBounds {
                offset: rect.offset,
                size: rect.size,
                film_size: self.crop_size(),
            });
        }

        let mut merged_rows = 0u32;
        for ly in 0..rect.size.y as usize {
            let samples = block.row_samples(ly);
            // nothing landed in this row, so every cell is still empty
            if samples == 0 {
                continue;
            }

            let cells = block.row(ly);
            let totals = RowTotals {
                samples,
                weight: cells.iter().map(|c| c.weight as f64).sum(),
            };
            self.storage
                .merge_row(rect.offset.y + ly as u32, rect.offset.x, cells, totals);
            merged_rows += 1;
        }
        self.blocks_merged.fetch_add(1, Ordering::Relaxed);

        tracing::trace!(
            x = rect.offset.x,
            y = rect.offset.y,
            width = rect.size.x,
            height = rect.size.y,
            merged_rows,
            "Merged block"
        );

        Ok(())
    }

    /// Develop time slice `slice` into an image of the crop window size.
    ///
    /// With `raw` each pixel is the weighted mean of its cell. Otherwise the
    /// neighbouring bins are combined with the temporal filter before
    /// normalizing; without a filter this falls back to raw development.
    pub fn bitmap(&self, slice: u32, raw: bool) -> Result<Buffer2<f32>> {
        self.check_slice(slice)?;

        let kernel = self.readout_kernel(raw);
        let kernel = kernel.as_deref();
        let bins = self.num_bins() as usize;
        let crop = self.crop_size();
        let mut image = Buffer2::new_default(crop.x as usize, crop.y as usize);

        fill_rows(&mut image, |y, out_row| {
            let cells = self.snapshot_row(y as u32);
            for (x, out) in out_row.iter_mut().enumerate() {
                let column = &cells[x * bins..(x + 1) * bins];
                *out = develop(column, slice as usize, kernel);
            }
        });

        Ok(image)
    }

    /// Develop every time slice. Each row of the canonical buffer is read once.
    pub fn bitmaps(&self, raw: bool) -> Vec<Buffer2<f32>> {
        let kernel = self.readout_kernel(raw);
        let kernel = kernel.as_deref();
        let bins = self.num_bins() as usize;
        let crop = self.crop_size();
        let (width, height) = (crop.x as usize, crop.y as usize);

        // developed rows, pixel-major with bins innermost
        let rows: Vec<Vec<f32>> = (0..crop.y)
            .into_par_iter()
            .map(|y| {
                let cells = self.snapshot_row(y);
                cells
                    .chunks_exact(bins)
                    .flat_map(|column| {
                        (0..bins).map(move |slice| develop(column, slice, kernel))
                    })
                    .collect()
            })
            .collect();

        let mut slices: Vec<Buffer2<f32>> = (0..bins)
            .map(|_| Buffer2::new_default(width, height))
            .collect();
        for (y, row) in rows.iter().enumerate() {
            for (x, column) in row.chunks_exact(bins).enumerate() {
                for (slice, &value) in column.iter().enumerate() {
                    slices[slice][(x, y)] = value;
                }
            }
        }
        slices
    }

    /// x-t image of pixel row `row`: `crop width` wide and `num_bins` high.
    pub fn streak_image(&self, row: u32, raw: bool) -> Result<Buffer2<f32>> {
        let height = self.crop_size().y;
        if row >= height {
            return Err(Error::RowOutOfRange { row, height });
        }

        let kernel = self.readout_kernel(raw);
        let bins = self.num_bins() as usize;
        let width = self.crop_size().x as usize;
        let cells = self.snapshot_row(row);

        let mut image = Buffer2::new_default(width, bins);
        for (x, column) in cells.chunks_exact(bins).enumerate() {
            for slice in 0..bins {
                image[(x, slice)] = develop(column, slice, kernel.as_deref());
            }
        }
        Ok(image)
    }

    /// Film-wide counters, summed over all rows.
    pub fn totals(&self) -> AccumulationTotals {
        let mut row_totals = RowTotals::default();
        for y in 0..self.crop_size().y {
            row_totals.add(self.storage.row_totals(y));
        }
        AccumulationTotals {
            samples: row_totals.samples,
            weight: row_totals.weight,
            blocks_merged: self.blocks_merged.load(Ordering::Relaxed),
        }
    }

    /// Canonical cell at `(x, y, bin)`, `None` outside the film.
    pub fn cell(&self, x: u32, y: u32, bin: u32) -> Option<Cell> {
        let crop = self.crop_size();
        if x >= crop.x || y >= crop.y || bin >= self.num_bins() {
            return None;
        }
        Some(self.storage.cell(x, y, bin))
    }

    /// Discard everything merged so far.
    pub fn clear(&self) {
        self.storage.clear();
        self.blocks_merged.store(0, Ordering::Relaxed);
    }

    /// Replace the time axis before rendering. The bin count must not change.
    pub fn set_time_axis(&mut self, axis: TimeAxis) -> Result<()> {
        if axis.num_bins() != self.axis.num_bins() {
            return Err(Error::InvalidConfiguration(format!(
                "time axis must keep {} bins, got {}",
                self.axis.num_bins(),
                axis.num_bins()
            )));
        }
        self.ensure_untouched()?;

        self.axis = axis;
        self.config.start_opl = axis.start_opl();
        self.config.bin_width_opl = axis.bin_width_opl();
        Ok(())
    }

    /// Calibrate the time axis from scene geometry when `auto_detect_bins` is set.
    ///
    /// Returns the axis in effect afterwards. On error the previous axis is kept.
    pub fn auto_detect_bins(&mut self, scene: &dyn Scene, sensor: &dyn Sensor) -> Result<TimeAxis> {
        if !self.config.auto_detect_bins {
            return Ok(self.axis);
        }
        self.ensure_untouched()?;

        let calibrator = BinCalibrator::new(self.config.calibration.clone());
        let axis = calibrator.calibrate(scene, sensor, self.axis.num_bins())?;
        self.set_time_axis(axis)?;
        Ok(axis)
    }

    fn ensure_untouched(&self) -> Result<()> {
        if self.blocks_merged.load(Ordering::Relaxed) > 0 {
            return Err(Error::CalibrationAfterMerge);
        }
        Ok(())
    }

    fn check_slice(&self, slice: u32) -> Result<()> {
        if slice >= self.num_bins() {
            return Err(Error::SliceOutOfRange {
                slice,
                num_bins: self.num_bins(),
            });
        }
        Ok(())
    }

    fn snapshot_row(&self, y: u32) -> Vec<Cell> {
        let mut cells = vec![Cell::EMPTY; self.crop_size().x as usize * self.num_bins() as usize];
        self.storage.snapshot_row(y, &mut cells);
        cells
    }

    /// Bin-domain convolution weights, `None` for raw development.
    fn readout_kernel(&self, raw: bool) -> Option<Vec<f32>> {
        if raw {
            return None;
        }
        match &self.filter {
            Some(filter) => Some(filter.discrete_weights()),
            None => {
                tracing::debug!("No temporal filter configured, developing raw slices");
                None
            }
        }
    }
}

/// Develop bin `slice` of one pixel's cells.
#[inline]
fn develop(column: &[Cell], slice: usize, kernel: Option<&[f32]>) -> f32 {
    let Some(weights) = kernel else {
        return column[slice].mean();
    };

    let r = weights.len() / 2;
    let lo = slice.saturating_sub(r);
    let hi = (slice + r).min(column.len() - 1);

    let mut acc = Cell::EMPTY;
    for (bin, cell) in column.iter().enumerate().take(hi + 1).skip(lo) {
        let w = weights[bin + r - slice];
        acc.value += w * cell.value;
        acc.weight += w * cell.weight;
    }
    acc.mean()
}

impl std::fmt::Display for StreakFilm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "StreakFilm[")?;
        writeln!(f, "  size = {},", self.size())?;
        writeln!(f, "  crop_size = {},", self.crop_size())?;
        writeln!(f, "  crop_offset = {},", self.crop_offset())?;
        writeln!(f, "  num_bins = {},", self.num_bins())?;
        writeln!(f, "  bin_width_opl = {},", self.bin_width_opl())?;
        writeln!(f, "  start_opl = {},", self.start_opl())?;
        writeln!(f, "  end_opl = {},", self.end_opl())?;
        writeln!(f, "  storage = {},", self.storage_kind())?;
        match &self.filter {
            Some(filter) => writeln!(f, "  time_filter = {filter}")?,
            None => writeln!(f, "  time_filter = none")?,
        }
        write!(f, "]")
    }
}
