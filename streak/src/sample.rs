//! Time-tagged radiance produced by a transient integrator.

/// Speed of light in vacuum, in meters per second.
pub const SPEED_OF_LIGHT: f32 = 299_792_458.0;

/// Radiance arriving at the sensor after travelling `opl` units of optical path.
///
/// Time is stored as optical path length (distance times index of refraction)
/// because the speed of light makes raw arrival times inconveniently small.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RadianceSample {
    pub opl: f32,
    pub value: f32,
}

impl RadianceSample {
    pub fn new(opl: f32, value: f32) -> Self {
        Self { opl, value }
    }

    /// Extend the path by `distance` through a medium with index of refraction `ior`.
    #[inline]
    pub fn add_opl(&mut self, distance: f32, ior: f32) {
        self.opl += distance * ior;
    }

    /// Arrival time in seconds, assuming OPL is measured in meters.
    #[inline]
    pub fn time(&self) -> f32 {
        self.opl / SPEED_OF_LIGHT
    }
}
