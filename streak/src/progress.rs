//! Progress reporting for tiled rendering.

use common::SharedFn;

/// Progress information for a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    /// Tiles merged into the film so far.
    pub completed_tiles: usize,
    /// Total number of tiles.
    pub total_tiles: usize,
}

impl RenderProgress {
    pub fn fraction(&self) -> f32 {
        if self.total_tiles == 0 {
            return 1.0;
        }
        self.completed_tiles as f32 / self.total_tiles as f32
    }
}

/// Callback type for progress reporting.
pub type ProgressCallback = SharedFn<dyn Fn(RenderProgress) + Send + Sync>;

/// Report progress using the callback if set.
pub fn report_progress(callback: &ProgressCallback, completed_tiles: usize, total_tiles: usize) {
    if let Some(f) = callback.as_ref() {
        f(RenderProgress {
            completed_tiles,
            total_tiles,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_report_progress_calls_callback() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = Arc::clone(&seen);
        let callback: ProgressCallback = SharedFn::Some(Arc::new(move |p: RenderProgress| {
            assert_eq!(p.total_tiles, 4);
            seen_cb.store(p.completed_tiles, Ordering::SeqCst);
        }));

        report_progress(&callback, 3, 4);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_report_progress_without_callback() {
        report_progress(&ProgressCallback::default(), 1, 2);
    }

    #[test]
    fn test_fraction() {
        let progress = RenderProgress {
            completed_tiles: 1,
            total_tiles: 4,
        };
        assert_eq!(progress.fraction(), 0.25);
        let empty = RenderProgress {
            completed_tiles: 0,
            total_tiles: 0,
        };
        assert_eq!(empty.fraction(), 1.0);
    }
}
