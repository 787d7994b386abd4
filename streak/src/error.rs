//! Error types for streak film operations.

use glam::UVec2;
use thiserror::Error;

use crate::time_axis::TimeAxis;

/// Errors that can occur while configuring, filling or developing a streak film.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Time axis mismatch: film uses {expected:?}, block was built against {actual:?}")]
    AxisMismatch {
        expected: TimeAxis,
        actual: TimeAxis,
    },

    #[error("Slice {slice} is out of range, film has {num_bins} bins")]
    SliceOutOfRange { slice: u32, num_bins: u32 },

    #[error("Row {row} is out of range, film is {height} pixels high")]
    RowOutOfRange { row: u32, height: u32 },

    #[error(
        "Scene extent is degenerate: estimated optical path length range [{min_opl}, {max_opl}]"
    )]
    DegenerateSceneExtent { min_opl: f32, max_opl: f32 },

    #[error("Block at {offset} with size {size} does not fit a film of size {film_size}")]
    BlockOutOfBounds {
        offset: UVec2,
        size: UVec2,
        film_size: UVec2,
    },

    #[error("Time bins cannot be calibrated after samples were merged into the film")]
    CalibrationAfterMerge,

    #[error("Failed to parse film configuration")]
    ConfigParse(#[from] serde_yml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_out_of_range_message() {
        let err = Error::SliceOutOfRange {
            slice: 12,
            num_bins: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("4 bins"));
    }

    #[test]
    fn test_axis_mismatch_message() {
        let expected = TimeAxis::new(0.0, 1.0, 4).unwrap();
        let actual = TimeAxis::new(0.0, 2.0, 4).unwrap();
        let msg = Error::AxisMismatch { expected, actual }.to_string();
        assert!(msg.contains("bin_width_opl: 1.0"));
        assert!(msg.contains("bin_width_opl: 2.0"));
    }

    #[test]
    fn test_degenerate_extent_message() {
        let err = Error::DegenerateSceneExtent {
            min_opl: 3.0,
            max_opl: 3.0,
        };
        assert!(err.to_string().contains("[3, 3]"));
    }

    #[test]
    fn test_config_parse_has_source() {
        use std::error::Error as StdError;

        let yaml_err = serde_yml::from_str::<u32>("not a number").unwrap_err();
        let err = Error::from(yaml_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_is_debug() {
        let debug_str = format!("{:?}", Error::CalibrationAfterMerge);
        assert!(debug_str.contains("CalibrationAfterMerge"));
    }
}
