use crate::{
    error::SiftError,
    keypoint::Frame,
    scalespace::{last_octave_index, MAX_LEVELS},
};

/// Index of the first pixel in the coordinates exchanged with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// The first pixel is at `(0, 0)`.
    #[default]
    ZeroBased,
    /// The first pixel is at `(1, 1)`.
    OneBased,
}

impl Origin {
    /// Shift between filter coordinates and caller coordinates.
    pub fn offset(&self) -> f64 {
        match self {
            Origin::ZeroBased => 0.0,
            Origin::OneBased => 1.0,
        }
    }
}

/// Configuration of a feature extraction run.
///
/// Thresholds left to `None` keep the defaults of the scale-space filter.
#[derive(Debug, Clone, PartialEq)]
pub struct SiftConfig {
    /// Number of octaves; `None` lets the filter derive it from the image size.
    pub octaves: Option<usize>,
    /// Number of levels per octave.
    pub levels: usize,
    /// Index of the first octave; negative values upsample the image.
    pub first_octave: i32,
    /// Minimum absolute difference-of-Gaussians response of a keypoint.
    pub peak_threshold: Option<f32>,
    /// Maximum ratio of principal curvatures of a keypoint.
    pub edge_threshold: Option<f32>,
    /// Minimum norm of a descriptor before it is zeroed.
    pub norm_threshold: Option<f32>,
    /// Frames to describe instead of detecting keypoints.
    pub frames: Option<Vec<Frame>>,
    /// Recompute the orientation of supplied frames instead of using their angle.
    pub force_orientations: bool,
    /// Whether descriptors are computed alongside the frames.
    pub compute_descriptors: bool,
    /// Coordinate origin of the frames exchanged with the caller.
    pub origin: Origin,
    /// Verbosity of the run logs. It never changes the results.
    pub verbose: u8,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            octaves: None,
            levels: 3,
            first_octave: 0,
            peak_threshold: None,
            edge_threshold: None,
            norm_threshold: None,
            frames: None,
            force_orientations: false,
            compute_descriptors: true,
            origin: Origin::ZeroBased,
            verbose: 0,
        }
    }
}

impl SiftConfig {
    /// Create a configuration with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of octaves.
    pub fn with_octaves(mut self, octaves: usize) -> Self {
        self.octaves = Some(octaves);
        self
    }

    /// Set the number of levels per octave.
    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Set the index of the first octave.
    pub fn with_first_octave(mut self, first_octave: i32) -> Self {
        self.first_octave = first_octave;
        self
    }

    /// Set the peak threshold.
    pub fn with_peak_threshold(mut self, threshold: f32) -> Self {
        self.peak_threshold = Some(threshold);
        self
    }

    /// Set the edge threshold.
    pub fn with_edge_threshold(mut self, threshold: f32) -> Self {
        self.edge_threshold = Some(threshold);
        self
    }

    /// Set the descriptor norm threshold.
    pub fn with_norm_threshold(mut self, threshold: f32) -> Self {
        self.norm_threshold = Some(threshold);
        self
    }

    /// Describe the given frames instead of detecting keypoints.
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Recompute the orientations of supplied frames.
    pub fn with_force_orientations(mut self, force: bool) -> Self {
        self.force_orientations = force;
        self
    }

    /// Enable or disable descriptor computation.
    pub fn with_descriptors(mut self, compute: bool) -> Self {
        self.compute_descriptors = compute;
        self
    }

    /// Set the coordinate origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Set the log verbosity.
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the configuration before any image is processed.
    ///
    /// # Errors
    ///
    /// Returns the first offending parameter.
    pub fn validate(&self) -> Result<(), SiftError> {
        if let Some(octaves) = self.octaves {
            if last_octave_index(self.first_octave, octaves).is_none() {
                return Err(SiftError::InvalidOctaves(octaves));
            }
        }

        // upsampling any non-empty image this many times overflows its size
        if self.first_octave <= -(usize::BITS as i32) {
            return Err(SiftError::InvalidFirstOctave(self.first_octave));
        }

        if self.levels == 0 || self.levels > MAX_LEVELS {
            return Err(SiftError::InvalidLevels(self.levels));
        }

        if let Some(t) = self.peak_threshold {
            if !t.is_finite() || t < 0.0 {
                return Err(SiftError::InvalidPeakThreshold(t));
            }
        }

        if let Some(t) = self.edge_threshold {
            if !t.is_finite() || t < 1.0 {
                return Err(SiftError::InvalidEdgeThreshold(t));
            }
        }

        if let Some(t) = self.norm_threshold {
            if !t.is_finite() || t < 0.0 {
                return Err(SiftError::InvalidNormThreshold(t));
            }
        }

        if let Some(frames) = &self.frames {
            for (index, frame) in frames.iter().enumerate() {
                if !frame.is_finite() {
                    return Err(SiftError::InvalidFrame {
                        index,
                        reason: "values must be finite",
                    });
                }
                if frame.sigma <= 0.0 {
                    return Err(SiftError::InvalidFrame {
                        index,
                        reason: "sigma must be positive",
                    });
                }
            }
        }

        Ok(())
    }
}
