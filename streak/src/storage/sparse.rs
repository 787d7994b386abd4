use hashbrown::HashMap;
use parking_lot::Mutex;

use super::{CellStorage, RowTotals, StorageKind};
use crate::cell::Cell;

#[derive(Debug, Default)]
struct SparseRow {
    /// Keyed by `x * num_bins + bin`.
    cells: HashMap<u32, Cell>,
    totals: RowTotals,
}

/// Storage that only keeps cells which received a contribution.
#[derive(Debug)]
pub struct SparseStorage {
    width: u32,
    height: u32,
    num_bins: u32,
    rows: Vec<Mutex<SparseRow>>,
}

impl SparseStorage {
    pub fn new(width: u32, height: u32, num_bins: u32) -> Self {
        Self {
            width,
            height,
            num_bins,
            rows: (0..height).map(|_| Mutex::default()).collect(),
        }
    }

    /// Number of stored (non-empty) cells.
    pub fn occupied_cells(&self) -> usize {
        self.rows.iter().map(|row| row.lock().cells.len()).sum()
    }
}

impl CellStorage for SparseStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Sparse
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn num_bins(&self) -> u32 {
        self.num_bins
    }

    fn merge_row(&self, y: u32, x0: u32, cells: &[Cell], totals: RowTotals) {
        let base = x0 * self.num_bins;
        let mut row = self.rows[y as usize].lock();
        for (i, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            row.cells.entry(base + i as u32).or_default().add(*cell);
        }
        row.totals.add(totals);
    }

    fn snapshot_row(&self, y: u32, out: &mut [Cell]) {
        out.fill(Cell::EMPTY);
        let row = self.rows[y as usize].lock();
        for (&key, cell) in &row.cells {
            out[key as usize] = *cell;
        }
    }

    fn cell(&self, x: u32, y: u32, bin: u32) -> Cell {
        let key = x * self.num_bins + bin;
        self.rows[y as usize]
            .lock()
            .cells
            .get(&key)
            .copied()
            .unwrap_or_default()
    }

    fn row_totals(&self, y: u32) -> RowTotals {
        self.rows[y as usize].lock().totals
    }

    fn clear(&self) {
        for row in &self.rows {
            *row.lock() = SparseRow::default();
        }
    }
}
