//! Streak - transient accumulation film for time-of-flight rendering.
//!
//! Each pixel of a streak film stores a sequence of bins along optical path
//! length (OPL) instead of a single value. The crate provides:
//! - The OPL discretization ([`TimeAxis`]) and temporal reconstruction filters
//! - Per-worker [`StreakBlock`]s merged into a shared [`StreakFilm`]
//! - Slice and streak image development
//! - Automatic time bin calibration from scene geometry
//! - A tiled parallel render driver
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use streak::{FilmConfig, StreakFilm};
//!
//! let config = FilmConfig::new(256, 256).with_time_axis(0.0, 0.01, 1024);
//! let film = StreakFilm::new(config)?;
//!
//! let mut block = film.create_block(UVec2::ZERO, UVec2::splat(32));
//! block.accumulate(3, 4, 1.25, 0.8, 1.0);
//! film.put(&block)?;
//!
//! let slice = film.bitmap(125, true)?;
//! ```

pub mod block;
pub mod calibration;
pub mod cell;
pub mod config;
pub mod error;
pub mod film;
pub mod filter;
pub mod progress;
pub mod render;
pub mod sample;
pub mod storage;
pub mod time_axis;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Film
// ============================================================================

pub use block::StreakBlock;
pub use cell::{Cell, PixelRect};
pub use config::FilmConfig;
pub use error::{Error, Result};
pub use film::{AccumulationTotals, StreakFilm};
pub use sample::{RadianceSample, SPEED_OF_LIGHT};
pub use storage::{CellStorage, StorageKind};
pub use time_axis::TimeAxis;

// ============================================================================
// Temporal filtering
// ============================================================================

pub use filter::{FilterKind, TemporalFilter, TemporalFilterConfig};

// ============================================================================
// Calibration
// ============================================================================

pub use calibration::{Aabb, BinCalibrator, CalibrationConfig, OplExtent, Ray, Scene, Sensor};

// ============================================================================
// Rendering
// ============================================================================

pub use progress::{ProgressCallback, RenderProgress};
pub use render::{RenderConfig, RenderSummary, Tile, TileIterator, TransientIntegrator, render};
