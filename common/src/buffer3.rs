use std::ops::{Index, IndexMut};

/// Dense 3-D buffer indexed by `(x, y, z)`.
///
/// Layout is pixel-major with `z` innermost, so the `depth` values of one pixel
/// are contiguous and a full row (`width * depth` values) is one slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer3<T> {
    values: Vec<T>,
    width: usize,
    height: usize,
    depth: usize,
}

impl<T> Buffer3<T> {
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.width && y < self.height && z < self.depth);
        (y * self.width + x) * self.depth + z
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> &T {
        &self.values[self.index(x, y, z)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> &mut T {
        let idx = self.index(x, y, z);
        &mut self.values[idx]
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// All values of row `y`, `width * depth` long.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let len = self.width * self.depth;
        &self.values[y * len..(y + 1) * len]
    }

    /// The `depth` values stored at pixel `(x, y)`.
    #[inline]
    pub fn column(&self, x: usize, y: usize) -> &[T] {
        let start = self.index(x, y, 0);
        &self.values[start..start + self.depth]
    }

    #[inline]
    pub fn column_mut(&mut self, x: usize, y: usize) -> &mut [T] {
        let start = self.index(x, y, 0);
        let depth = self.depth;
        &mut self.values[start..start + depth]
    }
}

impl<T: Clone> Buffer3<T> {
    pub fn new_filled(width: usize, height: usize, depth: usize, value: T) -> Self {
        Self {
            values: vec![value; width * height * depth],
            width,
            height,
            depth,
        }
    }

    pub fn fill(&mut self, value: T) {
        self.values.fill(value);
    }
}

impl<T: Default + Clone> Buffer3<T> {
    pub fn new_default(width: usize, height: usize, depth: usize) -> Self {
        Self::new_filled(width, height, depth, T::default())
    }
}

impl<T> Index<(usize, usize, usize)> for Buffer3<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y, z): (usize, usize, usize)) -> &Self::Output {
        self.get(x, y, z)
    }
}

impl<T> IndexMut<(usize, usize, usize)> for Buffer3<T> {
    #[inline]
    fn index_mut(&mut self, (x, y, z): (usize, usize, usize)) -> &mut Self::Output {
        self.get_mut(x, y, z)
    }
}
