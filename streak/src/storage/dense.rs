use parking_lot::Mutex;

use super::{CellStorage, RowTotals, StorageKind};
use crate::cell::Cell;

#[derive(Debug)]
struct DenseRow {
    cells: Vec<Cell>,
    totals: RowTotals,
}

/// Fully allocated storage with one lock per pixel row.
#[derive(Debug)]
pub struct DenseStorage {
    width: u32,
    height: u32,
    num_bins: u32,
    rows: Vec<Mutex<DenseRow>>,
}

impl DenseStorage {
    pub fn new(width: u32, height: u32, num_bins: u32) -> Self {
        let row_len = width as usize * num_bins as usize;
        let rows = (0..height)
            .map(|_| {
                Mutex::new(DenseRow {
                    cells: vec![Cell::EMPTY; row_len],
                    totals: RowTotals::default(),
                })
            })
            .collect();

        Self {
            width,
            height,
            num_bins,
            rows,
        }
    }
}

impl CellStorage for DenseStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Dense
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
        let start = x0 as usize * self.num_bins as usize;
        let mut row = self.rows[y as usize].lock();
        for (dst, src) in row.cells[start..start + cells.len()].iter_mut().zip(cells) {
            dst.add(*src);
        }
        row.totals.add(totals);
    }

    fn snapshot_row(&self, y: u32, out: &mut [Cell]) {
        let row = self.rows[y as usize].lock();
        out.copy_from_slice(&row.cells);
    }

    fn cell(&self, x: u32, y: u32, bin: u32) -> Cell {
        let idx = x as usize * self.num_bins as usize + bin as usize;
        self.rows[y as usize].lock().cells[idx]
    }

    fn row_totals(&self, y: u32) -> RowTotals {
        self.rows[y as usize].lock().totals
    }

    fn clear(&self) {
        for row in &self.rows {
            let mut row = row.lock();
            row.cells.fill(Cell::EMPTY);
            row.totals = RowTotals::default();
        }
    }
}
