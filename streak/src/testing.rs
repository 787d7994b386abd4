//! Testing utilities for streak.

#![allow(dead_code)]

use glam::{Vec2, Vec3};

use crate::calibration::{Aabb, Ray, Scene, Sensor};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Scene made of spheres given as `(center, radius)`.
#[derive(Debug, Clone)]
pub struct SphereScene {
    pub spheres: Vec<(Vec3, f32)>,
}

impl SphereScene {
    pub fn new(spheres: Vec<(Vec3, f32)>) -> Self {
        Self { spheres }
    }

    /// Closest and farthest surface distance from `origin` over all spheres.
    pub fn surface_distance_range(&self, origin: Vec3) -> (f32, f32) {
        self.spheres.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(lo, hi), &(center, radius)| {
                let d = (center - origin).length();
                (lo.min(d - radius), hi.max(d + radius))
            },
        )
    }
}

impl Scene for SphereScene {
    fn bounds(&self) -> Option<Aabb> {
        self.spheres
            .iter()
            .map(|&(center, radius)| {
                Aabb::new(center - Vec3::splat(radius), center + Vec3::splat(radius))
            })
            .reduce(|a, b| a.union(&b))
    }

    fn intersect(&self, ray: &Ray) -> Option<f32> {
        self.spheres
            .iter()
            .filter_map(|&(center, radius)| {
                let oc = ray.origin - center;
                let b = oc.dot(ray.direction);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                [-b - sqrt_disc, -b + sqrt_disc]
                    .into_iter()
                    .find(|&t| t >= 0.0)
            })
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Infinite plane perpendicular to the z axis.
#[derive(Debug, Clone, Copy)]
pub struct PlaneScene {
    pub z: f32,
}

impl Scene for PlaneScene {
    fn bounds(&self) -> Option<Aabb> {
        None
    }

    fn intersect(&self, ray: &Ray) -> Option<f32> {
        if ray.direction.z.abs() < 1e-8 {
            return None;
        }
        let t = (self.z - ray.origin.z) / ray.direction.z;
        (t >= 0.0).then_some(t)
    }
}

/// Pinhole sensor looking along +z with a square field of view.
#[derive(Debug, Clone)]
pub struct PinholeSensor {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub opl_offset: f32,
}

impl PinholeSensor {
    pub fn new(position: Vec3, fov_degrees: f32) -> Self {
        Self {
            position,
            fov_degrees,
            opl_offset: 0.0,
        }
    }
}

impl Sensor for PinholeSensor {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn sample_ray(&self, uv: Vec2) -> Ray {
        let half = (self.fov_degrees.to_radians() * 0.5).tan();
        let ndc = uv * 2.0 - Vec2::ONE;
        Ray::new(self.position, Vec3::new(ndc.x * half, ndc.y * half, 1.0))
    }

    fn opl_offset(&self) -> f32 {
        self.opl_offset
    }
}
