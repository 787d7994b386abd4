//! Film configuration.
//!
//! Loaded from YAML, e.g.
//!
//! ```yaml
//! size: [256, 256]
//! num_bins: 2048
//! bin_width_opl: 0.003
//! start_opl: 3.5
//! time_filter:
//!   type: gaussian
//!   stddev: 0.5
//! storage: sparse
//! ```
//!
//! The legacy option names `time`, `exposure_time` and `time_offset` are accepted
//! as aliases of `num_bins`, `bin_width_opl` and `start_opl`.

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;
use crate::cell::PixelRect;
use crate::error::{Error, Result};
use crate::filter::{TemporalFilter, TemporalFilterConfig};
use crate::storage::StorageKind;
use crate::time_axis::TimeAxis;

/// Configuration of a [`StreakFilm`](crate::StreakFilm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmConfig {
    /// Full image size in pixels.
    pub size: UVec2,
    /// Offset of the rendered crop window inside the image.
    pub crop_offset: UVec2,
    /// Size of the crop window. Defaults to the full image.
    pub crop_size: Option<UVec2>,
    #[serde(alias = "time")]
    pub num_bins: u32,
    #[serde(alias = "exposure_time")]
    pub bin_width_opl: f32,
    #[serde(alias = "time_offset")]
    pub start_opl: f32,
    /// Calibrate `start_opl` and `bin_width_opl` from the scene before rendering.
    pub auto_detect_bins: bool,
    /// Support of the external spatial reconstruction filter in pixels.
    /// Blocks created by the film are grown by this border.
    pub block_border: u32,
    /// Temporal reconstruction filter. `None` leaves only raw development.
    pub time_filter: Option<TemporalFilterConfig>,
    pub storage: StorageKind,
    pub calibration: CalibrationConfig,
}

impl Default for FilmConfig {
    fn default() -> Self {
        Self {
            size: UVec2::new(768, 576),
            crop_offset: UVec2::ZERO,
            crop_size: None,
            num_bins: 1000,
            bin_width_opl: 1.0,
            start_opl: 0.0,
            auto_detect_bins: false,
            block_border: 0,
            time_filter: None,
            storage: StorageKind::Dense,
            calibration: CalibrationConfig::default(),
        }
    }
}

impl FilmConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: UVec2::new(width, height),
            ..Default::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Set the time axis parameters.
    pub fn with_time_axis(mut self, start_opl: f32, bin_width_opl: f32, num_bins: u32) -> Self {
        self.start_opl = start_opl;
        self.bin_width_opl = bin_width_opl;
        self.num_bins = num_bins;
        self
    }

    pub fn with_crop(mut self, offset: UVec2, size: UVec2) -> Self {
        self.crop_offset = offset;
        self.crop_size = Some(size);
        self
    }

    pub fn with_time_filter(mut self, filter: TemporalFilterConfig) -> Self {
        self.time_filter = Some(filter);
        self
    }

    pub fn with_storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_auto_detect_bins(mut self, enabled: bool) -> Self {
        self.auto_detect_bins = enabled;
        self
    }

    pub fn with_block_border(mut self, border: u32) -> Self {
        self.block_border = border;
        self
    }

    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    /// Crop window size, resolving the full-image default.
    pub fn effective_crop_size(&self) -> UVec2 {
        self.crop_size.unwrap_or(self.size)
    }

    pub fn time_axis(&self) -> Result<TimeAxis> {
        TimeAxis::new(self.start_opl, self.bin_width_opl, self.num_bins)
    }

    pub fn build_time_filter(&self) -> Result<Option<TemporalFilter>> {
        self.time_filter
            .as_ref()
            .map(TemporalFilter::from_config)
            .transpose()
    }

    pub fn validate(&self) -> Result<()> {
        if self.size.x == 0 || self.size.y == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "film size must be non-zero, got {}",
                self.size
            )));
        }

        let crop = PixelRect::new(self.crop_offset, self.effective_crop_size());
        if crop.is_empty() {
            return Err(Error::InvalidConfiguration("crop window must be non-empty".to_string()));
        }
        if !PixelRect::new(UVec2::ZERO, self.size).contains_rect(&crop) {
            return Err(Error::InvalidConfiguration(format!(
                "crop window at {} with size {} exceeds film size {}",
                crop.offset, crop.size, self.size
            )));
        }

        self.time_axis()?;
        self.build_time_filter()?;
        self.calibration.validate()?;
        Ok(())
    }
}
