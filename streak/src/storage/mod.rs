//! Backing storage for the canonical space-time buffer.
//!
//! The film's merge and development code is written once against [`CellStorage`];
//! the storage strategy only decides how cells are laid out in memory. Both
//! strategies lock one pixel row at a time: a row lock guards the row's cells
//! together with its sample and weight counters, so a reader never observes a
//! half-applied merge of that row. Rows are the lock granularity because tiles
//! overlap only along their borders, and a row lock keeps unrelated tiles on
//! different rows from serializing.

mod dense;
mod sparse;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::cell::Cell;

pub use dense::DenseStorage;
pub use sparse::SparseStorage;

/// Storage strategy, selected once when the film is created.
///
/// Parses from and displays as its snake_case name, e.g. `"sparse"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StorageKind {
    /// Every `(pixel, bin)` cell is allocated up front.
    #[default]
    Dense,
    /// Only cells that received a contribution are stored.
    /// Suited to transient responses that are empty for most bins.
    Sparse,
}

/// Counters kept alongside the cells of one row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowTotals {
    /// Accepted contributions merged into the row.
    pub samples: u64,
    /// Sum of all cell weights in the row.
    pub weight: f64,
}

impl RowTotals {
    #[inline]
    pub fn add(&mut self, other: RowTotals) {
        self.samples += other.samples;
        self.weight += other.weight;
    }
}

/// Thread-safe canonical cell storage, `width * height * num_bins` cells.
pub trait CellStorage: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> StorageKind;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn num_bins(&self) -> u32;

    /// Add `cells` to row `y` starting at pixel `x0`.
    ///
    /// `cells` holds whole pixels, `num_bins` cells each, so the span covers
    /// `cells.len() / num_bins` pixels. `totals` is added to the row counters
    /// under the same lock.
    fn merge_row(&self, y: u32, x0: u32, cells: &[Cell], totals: RowTotals);

    /// Copy the full row `y` into `out`, which must be `width * num_bins` long.
    fn snapshot_row(&self, y: u32, out: &mut [Cell]);

    /// Single cell at pixel `(x, y)` and `bin`.
    fn cell(&self, x: u32, y: u32, bin: u32) -> Cell;

    fn row_totals(&self, y: u32) -> RowTotals;

    /// Reset every cell and counter to zero.
    fn clear(&self);
}

pub fn create_storage(
    kind: StorageKind,
    width: u32,
    height: u32,
    num_bins: u32,
) -> Box<dyn CellStorage> {
    match kind {
        StorageKind::Dense => Box::new(DenseStorage::new(width, height, num_bins)),
        StorageKind::Sparse => Box::new(SparseStorage::new(width, height, num_bins)),
    }
}
