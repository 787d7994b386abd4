//! Automatic time-bin calibration.
//!
//! Before rendering, the film can pick `start_opl` and `bin_width_opl` so that its
//! fixed number of bins brackets the transient response reaching the sensor.
//! The calibrator probes the scene along a deterministic grid of sensor rays and
//! optionally folds in the scene bounding box as a conservative bound:
//!
//! 1. Every probe ray hitting a surface at distance `d` contributes the round-trip
//!    path length `2d` (sensor and emitter are treated as co-located).
//! 2. The bounding box contributes `[2 * near, 2 * far]`, measured from the sensor
//!    position, which encloses every first-bounce path.
//! 3. The range is padded by `slack * (max - min)` on both sides (start never
//!    below zero), shifted by the sensor's OPL offset and divided into bins.

use glam::{Vec2, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time_axis::TimeAxis;

/// Ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Distance from `p` to the nearest point of the box (zero inside).
    pub fn near_distance(&self, p: Vec3) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        p.distance(clamped)
    }

    /// Distance from `p` to the farthest corner of the box.
    pub fn far_distance(&self, p: Vec3) -> f32 {
        let far = Vec3::select((p - self.min).cmpgt(self.max - p), self.min, self.max);
        p.distance(far)
    }
}

/// Geometry queries the calibrator needs from the scene.
pub trait Scene: Sync {
    /// World-space bounds of all geometry, `None` for an empty scene.
    fn bounds(&self) -> Option<Aabb>;

    /// Distance along `ray` to the first surface hit.
    fn intersect(&self, ray: &Ray) -> Option<f32>;
}

/// Sensor queries the calibrator needs.
pub trait Sensor: Sync {
    fn position(&self) -> Vec3;

    /// Primary ray through normalized film position `uv` in `[0, 1]^2`.
    fn sample_ray(&self, uv: Vec2) -> Ray;

    /// Optical path already travelled when a primary ray leaves the sensor.
    fn opl_offset(&self) -> f32 {
        0.0
    }
}

/// Parameters of automatic bin calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Probe rays per film axis; `probe_resolution^2` rays are traced.
    pub probe_resolution: u32,
    /// Fraction of the estimated range added as padding on each side.
    pub slack: f32,
    /// Include the scene bounding box in the estimate.
    pub use_scene_bounds: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            probe_resolution: 16,
            slack: 0.05,
            use_scene_bounds: true,
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.slack.is_finite() && self.slack >= 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "calibration slack must be non-negative, got {}",
                self.slack
            )));
        }
        if self.probe_resolution == 0 && !self.use_scene_bounds {
            return Err(Error::InvalidConfiguration(
                "calibration needs probe rays or scene bounds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Estimated optical path length range of the first-bounce response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OplExtent {
    pub min_opl: f32,
    pub max_opl: f32,
    /// Probe rays that hit geometry.
    pub probe_hits: usize,
}

/// One-shot pre-pass choosing a [`TimeAxis`] for a scene/sensor pair.
#[derive(Debug, Clone, Default)]
pub struct BinCalibrator {
    config: CalibrationConfig,
}

impl BinCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Estimate the round-trip OPL range reachable from the sensor.
    pub fn estimate_extent(&self, scene: &dyn Scene, sensor: &dyn Sensor) -> Result<OplExtent> {
        let n = self.config.probe_resolution;
        let inv_n = 1.0 / n.max(1) as f32;

        // min/max reduction is order independent, so the result is deterministic
        let (probe_min, probe_max, probe_hits) = (0..n * n)
            .into_par_iter()
            .filter_map(|i| {
                let uv = Vec2::new((i % n) as f32 + 0.5, (i / n) as f32 + 0.5) * inv_n;
                scene
                    .intersect(&sensor.sample_ray(uv))
                    .filter(|t| t.is_finite() && *t >= 0.0)
            })
            .fold(
                || (f32::INFINITY, f32::NEG_INFINITY, 0usize),
                |(lo, hi, count), t| (lo.min(2.0 * t), hi.max(2.0 * t), count + 1),
            )
            .reduce(
                || (f32::INFINITY, f32::NEG_INFINITY, 0usize),
                |a, b| (a.0.min(b.0), a.1.max(b.1), a.2 + b.2),
            );

        let (mut min_opl, mut max_opl) = (probe_min, probe_max);
        if self.config.use_scene_bounds {
            if let Some(bounds) = scene.bounds() {
                let origin = sensor.position();
                min_opl = min_opl.min(2.0 * bounds.near_distance(origin));
                max_opl = max_opl.max(2.0 * bounds.far_distance(origin));
            }
        }

        if !(min_opl.is_finite() && max_opl.is_finite()) || max_opl <= min_opl {
            return Err(Error::DegenerateSceneExtent { min_opl, max_opl });
        }

        Ok(OplExtent {
            min_opl,
            max_opl,
            probe_hits,
        })
    }

    /// Choose a time axis of `num_bins` bins covering the scene's transient response.
    pub fn calibrate(
        &self,
        scene: &dyn Scene,
        sensor: &dyn Sensor,
        num_bins: u32,
    ) -> Result<TimeAxis> {
        let extent = self.estimate_extent(scene, sensor)?;

        let padding = self.config.slack * (extent.max_opl - extent.min_opl);
        let start = (extent.min_opl - padding).max(0.0);
        let end = extent.max_opl + padding;
        let offset = sensor.opl_offset();

        let axis = TimeAxis::new(
            start + offset,
            (end - start) / num_bins.max(1) as f32,
            num_bins,
        )?;

        tracing::info!(
            min_opl = extent.min_opl,
            max_opl = extent.max_opl,
            probe_hits = extent.probe_hits,
            start_opl = axis.start_opl(),
            bin_width_opl = axis.bin_width_opl(),
            num_bins,
            "Calibrated time bins"
        );

        Ok(axis)
    }
}
