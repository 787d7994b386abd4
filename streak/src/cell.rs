//! Accumulation cell and pixel rectangles shared by blocks and film storage.

use glam::UVec2;

/// Running `(Σ value·weight, Σ weight)` pair of one `(pixel, bin)` cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    pub value: f32,
    pub weight: f32,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        value: 0.0,
        weight: 0.0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value == 0.0 && self.weight == 0.0
    }

    #[inline]
    pub fn add(&mut self, other: Cell) {
        self.value += other.value;
        self.weight += other.weight;
    }

    /// Weighted mean, zero when no weight was accumulated.
    #[inline]
    pub fn mean(&self) -> f32 {
        if self.weight != 0.0 {
            self.value / self.weight
        } else {
            0.0
        }
    }
}

/// Axis-aligned pixel rectangle `[offset, offset + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub offset: UVec2,
    pub size: UVec2,
}

impl PixelRect {
    pub fn new(offset: UVec2, size: UVec2) -> Self {
        Self { offset, size }
    }

    #[inline]
    pub fn end(&self) -> UVec2 {
        self.offset + self.size
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.size.x as usize * self.size.y as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.x == 0 || self.size.y == 0
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let end = self.end();
        x >= self.offset.x as i32
            && y >= self.offset.y as i32
            && x < end.x as i32
            && y < end.y as i32
    }

    /// Whether `other` lies completely inside `self`.
    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.offset.cmpge(self.offset).all() && other.end().cmple(self.end()).all()
    }

    /// Overlap of both rectangles; empty (zero size) when they are disjoint.
    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let offset = self.offset.max(other.offset);
        let end = self.end().min(other.end()).max(offset);
        PixelRect::new(offset, end - offset)
    }

    /// Grow by `border` pixels on every side, saturating at zero.
    pub fn expand(&self, border: u32) -> PixelRect {
        let offset = self.offset.saturating_sub(UVec2::splat(border));
        let end = self.end() + UVec2::splat(border);
        PixelRect::new(offset, end - offset)
    }
}
