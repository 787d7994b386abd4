//! Tiled parallel render driver.
//!
//! Splits the crop window into tiles and renders them on the rayon pool. Each
//! tile is traced into its own [`StreakBlock`](crate::StreakBlock), which is
//! merged into the film as soon as the tile is done. Cancellation is checked
//! between tiles, so every merged tile is complete.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use glam::UVec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::film::StreakFilm;
use crate::progress::{ProgressCallback, report_progress};
use crate::sample::RadianceSample;

/// Light transport algorithm producing timed radiance samples.
pub trait TransientIntegrator: Sync {
    /// Trace path `sample_index` through `pixel` and append its timed samples.
    ///
    /// `pixel` is in full image coordinates, so a cropped film only asks for
    /// pixels inside its crop window.
    ///
    /// Contributions with an optical path length beyond `max_opl` fall outside
    /// the film and may be skipped.
    fn sample(
        &self,
        pixel: UVec2,
        sample_index: u32,
        max_opl: f32,
        samples: &mut Vec<RadianceSample>,
    );
}

/// Configuration for tiled rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Paths traced per pixel.
    pub samples_per_pixel: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            samples_per_pixel: 16,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::InvalidConfiguration(
                "tile_size must be greater than zero".to_string(),
            ));
        }
        if self.samples_per_pixel == 0 {
            return Err(Error::InvalidConfiguration(
                "samples_per_pixel must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single tile region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    /// Tile width (may be smaller than the tile size at edges)
    pub width: u32,
    /// Tile height (may be smaller than the tile size at edges)
    pub height: u32,
}

impl Tile {
    #[inline]
    pub fn offset(&self) -> UVec2 {
        UVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn pixels(&self) -> impl Iterator<Item = UVec2> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| UVec2::new(x, y)))
    }
}

/// Iterator over tiles covering an image, row by row.
#[derive(Debug, Clone)]
pub struct TileIterator {
    image_size: UVec2,
    tile_size: u32,
    current: UVec2,
}

impl TileIterator {
    pub fn new(image_size: UVec2, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        // an empty image yields no tiles
        let current = if image_size.x == 0 {
            UVec2::new(0, image_size.y)
        } else {
            UVec2::ZERO
        };
        Self {
            image_size,
            tile_size,
            current,
        }
    }

    pub fn total_tiles(&self) -> usize {
        let nx = self.image_size.x.div_ceil(self.tile_size);
        let ny = self.image_size.y.div_ceil(self.tile_size);
        nx as usize * ny as usize
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.y >= self.image_size.y {
            return None;
        }

        let tile = Tile {
            x: self.current.x,
            y: self.current.y,
            width: self.tile_size.min(self.image_size.x - self.current.x),
            height: self.tile_size.min(self.image_size.y - self.current.y),
        };

        self.current.x += self.tile_size;
        if self.current.x >= self.image_size.x {
            self.current.x = 0;
            self.current.y += self.tile_size;
        }

        Some(tile)
    }
}

/// Outcome of [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub tiles_rendered: usize,
    pub total_tiles: usize,
    /// Contributions that landed inside the time axis.
    pub samples_recorded: u64,
    pub cancelled: bool,
}

/// Render the film's crop window with `integrator`.
///
/// Tiles run in parallel and report through `progress` once merged. Setting
/// `cancel` stops the render before the next tile starts.
pub fn render(
    film: &StreakFilm,
    integrator: &dyn TransientIntegrator,
    config: &RenderConfig,
    progress: &ProgressCallback,
    cancel: &AtomicBool,
) -> Result<RenderSummary> {
    config.validate()?;

    let tiles: Vec<Tile> = TileIterator::new(film.crop_size(), config.tile_size).collect();
    let total_tiles = tiles.len();
    let max_opl = film.end_opl();
    let crop_offset = film.crop_offset();

    tracing::info!(
        total_tiles,
        tile_size = config.tile_size,
        samples_per_pixel = config.samples_per_pixel,
        max_opl,
        "Rendering streak film"
    );

    let completed = AtomicUsize::new(0);
    let recorded = AtomicU64::new(0);

    tiles
        .par_iter()
        .try_for_each_init(
            Vec::new,
            |samples: &mut Vec<RadianceSample>, tile: &Tile| -> Result<()> {
                if cancel.load(Ordering::Relaxed) {
                    return Ok(());
                }

                let mut block = film.create_block(tile.offset(), tile.size());
                for pixel in tile.pixels() {
                    // blocks are crop-relative, the integrator sees image pixels
                    let image_pixel = crop_offset + pixel;
                    for sample_index in 0..config.samples_per_pixel {
                        samples.clear();
                        integrator.sample(image_pixel, sample_index, max_opl, samples);
                        block.accumulate_samples(pixel.x as i32, pixel.y as i32, samples, 1.0);
                    }
                }

                film.put(&block)?;
                recorded.fetch_add(block.samples(), Ordering::Relaxed);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                report_progress(progress, done, total_tiles);
                Ok(())
            },
        )?;

    let tiles_rendered = completed.into_inner();
    let cancelled = tiles_rendered < total_tiles;
    if cancelled {
        tracing::warn!(tiles_rendered, total_tiles, "Render cancelled");
    }

    Ok(RenderSummary {
        tiles_rendered,
        total_tiles,
        samples_recorded: recorded.into_inner(),
        cancelled,
    })
}
