use siftscan_image::Image;

use crate::{
    error::SiftError,
    keypoint::{Keypoint, RawDescriptor},
};

/// Result of advancing a scale-space filter to an octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctaveStatus {
    /// The octave is built and can be queried.
    Ready,
    /// There are no more octaves to process.
    Exhausted,
}

impl OctaveStatus {
    /// Whether the filter holds a usable octave.
    pub fn is_ready(&self) -> bool {
        matches!(self, OctaveStatus::Ready)
    }
}

/// A Gaussian scale space processed one octave at a time.
///
/// The extraction loop only talks to the filter through this trait. Coordinates exchanged
/// here are the filter's own: `x` is the column and `y` the row of the image the filter
/// was given, angles are measured from `x` towards `y`.
///
/// All queries between two octave calls refer to the current octave.
pub trait ScaleSpaceFilter {
    /// Set the minimum absolute response of a detected keypoint.
    fn set_peak_threshold(&mut self, threshold: f32);

    /// Set the maximum principal curvature ratio of a detected keypoint.
    fn set_edge_threshold(&mut self, threshold: f32);

    /// Set the minimum descriptor norm below which descriptors are zeroed.
    fn set_norm_threshold(&mut self, threshold: f32);

    /// Build the first octave from the input image.
    fn process_first_octave(&mut self, image: &Image<f32, 1>) -> Result<OctaveStatus, SiftError>;

    /// Advance to the next octave.
    fn process_next_octave(&mut self) -> Result<OctaveStatus, SiftError>;

    /// Detect the keypoints of the current octave.
    fn detect_keypoints(&mut self) -> Result<Vec<Keypoint>, SiftError>;

    /// Build a keypoint from a position and scale in filter coordinates.
    fn init_keypoint(&self, x: f64, y: f64, sigma: f64) -> Keypoint;

    /// Dominant orientations of a keypoint of the current octave, at most
    /// [`MAX_ORIENTATIONS`](crate::keypoint::MAX_ORIENTATIONS) are meaningful.
    fn estimate_orientations(&mut self, keypoint: &Keypoint) -> Result<Vec<f64>, SiftError>;

    /// Descriptor of a keypoint of the current octave at the given angle.
    fn compute_descriptor(
        &mut self,
        keypoint: &Keypoint,
        angle: f64,
    ) -> Result<RawDescriptor, SiftError>;

    /// Index of the current octave.
    fn octave_index(&self) -> i32;
}

impl<F: ScaleSpaceFilter + ?Sized> ScaleSpaceFilter for Box<F> {
    fn set_peak_threshold(&mut self, threshold: f32) {
        (**self).set_peak_threshold(threshold)
    }

    fn set_edge_threshold(&mut self, threshold: f32) {
        (**self).set_edge_threshold(threshold)
    }

    fn set_norm_threshold(&mut self, threshold: f32) {
        (**self).set_norm_threshold(threshold)
    }

    fn process_first_octave(&mut self, image: &Image<f32, 1>) -> Result<OctaveStatus, SiftError> {
        (**self).process_first_octave(image)
    }

    fn process_next_octave(&mut self) -> Result<OctaveStatus, SiftError> {
        (**self).process_next_octave()
    }

    fn detect_keypoints(&mut self) -> Result<Vec<Keypoint>, SiftError> {
        (**self).detect_keypoints()
    }

    fn init_keypoint(&self, x: f64, y: f64, sigma: f64) -> Keypoint {
        (**self).init_keypoint(x, y, sigma)
    }

    fn estimate_orientations(&mut self, keypoint: &Keypoint) -> Result<Vec<f64>, SiftError> {
        (**self).estimate_orientations(keypoint)
    }

    fn compute_descriptor(
        &mut self,
        keypoint: &Keypoint,
        angle: f64,
    ) -> Result<RawDescriptor, SiftError> {
        (**self).compute_descriptor(keypoint, angle)
    }

    fn octave_index(&self) -> i32 {
        (**self).octave_index()
    }
}
