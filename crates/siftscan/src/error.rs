use siftscan_image::{ImageError, ImageSize};

/// Errors that can occur while configuring or running the feature extraction.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// Error related to image.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// The requested number of octaves is not positive, or the octave indices overflow.
    #[error("'octaves' must be a positive integer with indices fitting in i32, got {0}")]
    InvalidOctaves(usize),

    /// The first octave would resample the image to a size that cannot be allocated.
    #[error("'first_octave' {0} is out of range for the image")]
    InvalidFirstOctave(i32),

    /// The requested number of levels per octave is not positive or too large.
    #[error("'levels' must be a positive integer not above i32::MAX - 2, got {0}")]
    InvalidLevels(usize),

    /// The peak threshold is negative or not finite.
    #[error("'peak_threshold' must be a non-negative real, got {0}")]
    InvalidPeakThreshold(f32),

    /// The edge threshold is smaller than one or not finite.
    #[error("'edge_threshold' must be not smaller than 1, got {0}")]
    InvalidEdgeThreshold(f32),

    /// The norm threshold is negative or not finite.
    #[error("'norm_threshold' must be a non-negative real, got {0}")]
    InvalidNormThreshold(f32),

    /// A supplied frame cannot be used as a keypoint.
    #[error("frame {index} is invalid: {reason}")]
    InvalidFrame {
        /// Position of the frame in the caller's list.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The image handed to the filter does not have the size the filter was built for.
    #[error("image size {0} does not match the filter size {1}")]
    ImageSizeMismatch(ImageSize, ImageSize),
}
