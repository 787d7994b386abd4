//! Row-parallel helpers for filling image buffers.

use rayon::prelude::*;

use crate::buffer2::Buffer2;

/// Multiplier for number of chunks relative to CPU threads.
/// Using 2x threads provides good load balancing when some chunks finish faster.
const CHUNKS_PER_THREAD: usize = 2;

/// Compute rows per chunk so the image splits into roughly `num_threads * 2` chunks.
/// Minimum of 1 row per chunk.
#[inline]
pub fn rows_per_chunk(height: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (height / num_chunks).max(1)
}

/// Fill every row of `buffer` in parallel. `f` receives the row index and the row's pixels.
pub fn fill_rows<T, F>(buffer: &mut Buffer2<T>, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    let width = buffer.width();
    if width == 0 || buffer.height() == 0 {
        return;
    }

    let chunk_rows = rows_per_chunk(buffer.height());
    buffer
        .pixels_mut()
        .par_chunks_mut(width * chunk_rows)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            for (i, row) in chunk.chunks_mut(width).enumerate() {
                f(chunk_idx * chunk_rows + i, row);
            }
        });
}
