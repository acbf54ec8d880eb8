//! Difference-of-Gaussians scale space processed octave by octave.

mod descriptor;
mod detect;
mod octave;
mod orientation;

use log::{debug, trace};
use siftscan_image::{Image, ImageSize};

use crate::{
    error::SiftError,
    filter::{OctaveStatus, ScaleSpaceFilter},
    keypoint::{Keypoint, RawDescriptor},
};
use descriptor::DescriptorParams;
use octave::{Octave, ScaleGeometry};

/// Default peak threshold of [`SiftFilter`].
pub const DEFAULT_PEAK_THRESHOLD: f32 = 0.0;
/// Default edge threshold of [`SiftFilter`].
pub const DEFAULT_EDGE_THRESHOLD: f32 = 10.0;
/// Default norm threshold of [`SiftFilter`].
pub const DEFAULT_NORM_THRESHOLD: f32 = 0.0;
/// Default width of a descriptor bin in units of the keypoint scale.
pub const DEFAULT_MAGNIFICATION: f64 = 3.0;
/// Default standard deviation of the descriptor window in units of bins.
pub const DEFAULT_WINDOW_SIZE: f64 = 2.0;

/// Largest number of levels per octave whose level indices fit in `i32`.
pub(crate) const MAX_LEVELS: usize = (i32::MAX - 2) as usize;

/// Index of the last of `octaves` octaves starting at `first_octave`, if it fits in `i32`.
pub(crate) fn last_octave_index(first_octave: i32, octaves: usize) -> Option<i32> {
    let octaves = i32::try_from(octaves).ok().filter(|&n| n > 0)?;
    first_octave.checked_add(octaves - 1)
}

/// Number of octaves that fit an image of the given size.
fn default_octaves(size: ImageSize, first_octave: i32) -> usize {
    let min_side = size.width.min(size.height);
    if min_side == 0 {
        return 1;
    }
    (min_side.ilog2() as i64 - first_octave as i64 - 3).max(1) as usize
}

/// SIFT scale-space filter.
///
/// The filter is built for a fixed image size and keeps a single octave in memory.
///
/// # Example
///
/// ```
/// use siftscan::{OctaveStatus, ScaleSpaceFilter, SiftFilter};
/// use siftscan_image::Image;
///
/// let image = Image::<f32, 1>::from_size_val([64, 64].into(), 0.0).unwrap();
/// let mut filter = SiftFilter::new(image.size(), None, 3, 0).unwrap();
///
/// let mut octaves = 0;
/// let mut status = filter.process_first_octave(&image).unwrap();
/// while status == OctaveStatus::Ready {
///     octaves += 1;
///     status = filter.process_next_octave().unwrap();
/// }
/// assert_eq!(octaves, filter.octaves());
/// ```
pub struct SiftFilter {
    size: ImageSize,
    octaves: usize,
    first_octave: i32,
    last_octave: i32,
    geometry: ScaleGeometry,
    peak_threshold: f32,
    edge_threshold: f32,
    descriptor: DescriptorParams,
    current: Option<Octave>,
}

impl SiftFilter {
    /// Create a filter for images of the given size.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the images to process.
    /// * `octaves` - Number of octaves, `None` to fit as many as the image allows.
    /// * `levels` - Number of levels per octave.
    /// * `first_octave` - Index of the first octave.
    ///
    /// # Errors
    ///
    /// Fails when the octave indices overflow `i32`, or when upsampling to `first_octave`
    /// would produce an image too large to allocate.
    pub fn new(
        size: ImageSize,
        octaves: Option<usize>,
        levels: usize,
        first_octave: i32,
    ) -> Result<Self, SiftError> {
        if octaves == Some(0) {
            return Err(SiftError::InvalidOctaves(0));
        }
        if levels == 0 || levels > MAX_LEVELS {
            return Err(SiftError::InvalidLevels(levels));
        }

        if first_octave < 0 {
            let upsampled = size
                .upscaled(first_octave.unsigned_abs())
                .map_err(|_| SiftError::InvalidFirstOctave(first_octave))?;
            let bytes = upsampled.area().checked_mul(std::mem::size_of::<f32>());
            if bytes.map_or(true, |bytes| bytes > isize::MAX as usize) {
                return Err(SiftError::InvalidFirstOctave(first_octave));
            }
        }

        let octaves = octaves.unwrap_or_else(|| default_octaves(size, first_octave));
        let last_octave =
            last_octave_index(first_octave, octaves).ok_or(SiftError::InvalidOctaves(octaves))?;
        debug!("sift filter for {size}: {octaves} octaves, {levels} levels, first octave {first_octave}");

        Ok(Self {
            size,
            octaves,
            first_octave,
            last_octave,
            geometry: ScaleGeometry::new(levels),
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            descriptor: DescriptorParams {
                magnification: DEFAULT_MAGNIFICATION,
                window_size: DEFAULT_WINDOW_SIZE,
                norm_threshold: DEFAULT_NORM_THRESHOLD,
            },
            current: None,
        })
    }

    /// Size of the images the filter accepts.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Number of octaves.
    pub fn octaves(&self) -> usize {
        self.octaves
    }

    /// Number of levels per octave.
    pub fn levels(&self) -> usize {
        self.geometry.levels as usize
    }

    /// Index of the first octave.
    pub fn first_octave(&self) -> i32 {
        self.first_octave
    }

    /// Smoothing of level zero of every octave.
    pub fn sigma0(&self) -> f64 {
        self.geometry.sigma0
    }

    /// Current peak threshold.
    pub fn peak_threshold(&self) -> f32 {
        self.peak_threshold
    }

    /// Current edge threshold.
    pub fn edge_threshold(&self) -> f32 {
        self.edge_threshold
    }

    /// Current norm threshold.
    pub fn norm_threshold(&self) -> f32 {
        self.descriptor.norm_threshold
    }

    /// Width of a descriptor bin in units of the keypoint scale.
    pub fn magnification(&self) -> f64 {
        self.descriptor.magnification
    }

    /// Set the width of a descriptor bin in units of the keypoint scale.
    pub fn set_magnification(&mut self, magnification: f64) {
        self.descriptor.magnification = magnification;
    }

    /// Standard deviation of the descriptor window in units of bins.
    pub fn window_size(&self) -> f64 {
        self.descriptor.window_size
    }

    /// Set the standard deviation of the descriptor window in units of bins.
    pub fn set_window_size(&mut self, window_size: f64) {
        self.descriptor.window_size = window_size;
    }

    /// Index of the last octave.
    pub fn last_octave(&self) -> i32 {
        self.last_octave
    }
}

impl ScaleSpaceFilter for SiftFilter {
    fn set_peak_threshold(&mut self, threshold: f32) {
        self.peak_threshold = threshold;
    }

    fn set_edge_threshold(&mut self, threshold: f32) {
        self.edge_threshold = threshold;
    }

    fn set_norm_threshold(&mut self, threshold: f32) {
        self.descriptor.norm_threshold = threshold;
    }

    fn process_first_octave(&mut self, image: &Image<f32, 1>) -> Result<OctaveStatus, SiftError> {
        if image.size() != self.size {
            return Err(SiftError::ImageSizeMismatch(image.size(), self.size));
        }

        self.current = Octave::first(image, self.first_octave, &self.geometry)?;
        Ok(match self.current {
            Some(_) => OctaveStatus::Ready,
            None => OctaveStatus::Exhausted,
        })
    }

    fn process_next_octave(&mut self) -> Result<OctaveStatus, SiftError> {
        let current = match &self.current {
            Some(octave) if octave.index() < self.last_octave() => octave,
            _ => return Ok(OctaveStatus::Exhausted),
        };

        match current.next(&self.geometry)? {
            Some(next) => {
                self.current = Some(next);
                Ok(OctaveStatus::Ready)
            }
            None => Ok(OctaveStatus::Exhausted),
        }
    }

    fn detect_keypoints(&mut self) -> Result<Vec<Keypoint>, SiftError> {
        let Some(octave) = &self.current else {
            return Ok(Vec::new());
        };
        let keypoints = detect::detect_keypoints(
            octave,
            &self.geometry,
            self.peak_threshold,
            self.edge_threshold,
        );
        trace!("octave {}: {} keypoints detected", octave.index(), keypoints.len());
        Ok(keypoints)
    }

    fn init_keypoint(&self, x: f64, y: f64, sigma: f64) -> Keypoint {
        let geometry = &self.geometry;
        let levels = geometry.levels as f64;
        let phi = (sigma / geometry.sigma0).log2();

        let octave = (phi - (geometry.s_min as f64 + 0.5) / levels).floor() as i32;
        let octave = octave.clamp(self.first_octave, self.last_octave());
        let level = levels * (phi - octave as f64);
        let is = ((level + 0.5).floor() as i32).clamp(geometry.s_min + 1, geometry.s_max - 2);
        let step = 2f64.powi(octave);

        Keypoint {
            x,
            y,
            sigma,
            level,
            octave,
            ix: (x / step + 0.5).floor() as i32,
            iy: (y / step + 0.5).floor() as i32,
            is,
        }
    }

    fn estimate_orientations(&mut self, keypoint: &Keypoint) -> Result<Vec<f64>, SiftError> {
        match &mut self.current {
            Some(octave) => orientation::keypoint_orientations(octave, &self.geometry, keypoint),
            None => Ok(Vec::new()),
        }
    }

    fn compute_descriptor(
        &mut self,
        keypoint: &Keypoint,
        angle: f64,
    ) -> Result<RawDescriptor, SiftError> {
        match &mut self.current {
            Some(octave) => descriptor::keypoint_descriptor(
                octave,
                &self.geometry,
                &self.descriptor,
                keypoint,
                angle,
            ),
            None => Ok([0.0; crate::keypoint::DESCRIPTOR_SIZE]),
        }
    }

    fn octave_index(&self) -> i32 {
        self.current
            .as_ref()
            .map_or(self.first_octave, |octave| octave.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_octaves() {
        assert_eq!(default_octaves([256, 128].into(), 0), 4);
        assert_eq!(default_octaves([256, 128].into(), -1), 5);
        assert_eq!(default_octaves([8, 8].into(), 0), 1);
        assert_eq!(default_octaves([0, 8].into(), 0), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        let size = ImageSize::from([16, 16]);
        assert!(matches!(
            SiftFilter::new(size, Some(0), 3, 0),
            Err(SiftError::InvalidOctaves(0))
        ));
        assert!(matches!(
            SiftFilter::new(size, None, 0, 0),
            Err(SiftError::InvalidLevels(0))
        ));
    }

    #[test]
    fn test_octave_range_limits() -> Result<(), SiftError> {
        let size = ImageSize::from([64, 64]);

        // counts beyond i32 used to wrap into an empty octave range
        for octaves in [1usize << 31, 1 << 32, usize::MAX] {
            assert!(matches!(
                SiftFilter::new(size, Some(octaves), 3, 0),
                Err(SiftError::InvalidOctaves(n)) if n == octaves
            ));
        }
        assert!(matches!(
            SiftFilter::new(size, None, usize::MAX, 0),
            Err(SiftError::InvalidLevels(usize::MAX))
        ));
        assert!(matches!(
            SiftFilter::new(size, Some(2), 3, i32::MAX),
            Err(SiftError::InvalidOctaves(2))
        ));

        let filter = SiftFilter::new(size, Some(1), 3, i32::MAX)?;
        assert_eq!(filter.last_octave(), i32::MAX);
        let filter = SiftFilter::new(size, Some(i32::MAX as usize), 3, 0)?;
        assert_eq!(filter.last_octave(), i32::MAX - 1);
        Ok(())
    }

    #[test]
    fn test_first_octave_limits() -> Result<(), SiftError> {
        let size = ImageSize::from([64, 64]);
        for first_octave in [-40, -60, i32::MIN] {
            assert!(matches!(
                SiftFilter::new(size, None, 3, first_octave),
                Err(SiftError::InvalidFirstOctave(o)) if o == first_octave
            ));
        }

        // a far away positive octave leaves nothing to process
        let image = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let mut filter = SiftFilter::new(size, None, 3, i32::MAX)?;
        assert_eq!(filter.process_first_octave(&image)?, OctaveStatus::Exhausted);
        assert_eq!(filter.process_next_octave()?, OctaveStatus::Exhausted);
        Ok(())
    }

    #[test]
    fn test_init_keypoint_with_extreme_ranges() -> Result<(), SiftError> {
        let filter = SiftFilter::new([64, 64].into(), Some(1), 3, i32::MAX)?;
        let k = filter.init_keypoint(10.0, 20.0, 2.0);
        assert_eq!(k.octave, i32::MAX);

        let filter = SiftFilter::new([64, 64].into(), Some(i32::MAX as usize), 3, 0)?;
        let k = filter.init_keypoint(10.0, 20.0, 1e300);
        assert!((0..=filter.last_octave()).contains(&k.octave));
        assert!((0..=2).contains(&k.is));
        Ok(())
    }

    #[test]
    fn test_size_mismatch() -> Result<(), SiftError> {
        let mut filter = SiftFilter::new([16, 16].into(), None, 3, 0)?;
        let image = Image::<f32, 1>::from_size_val([8, 16].into(), 0.0)?;
        assert!(matches!(
            filter.process_first_octave(&image),
            Err(SiftError::ImageSizeMismatch(_, _))
        ));
        Ok(())
    }

    #[test]
    fn test_octave_sequence() -> Result<(), SiftError> {
        let image = Image::<f32, 1>::from_size_val([64, 32].into(), 0.0)?;
        let mut filter = SiftFilter::new(image.size(), Some(3), 3, -1)?;

        let mut indices = Vec::new();
        let mut status = filter.process_first_octave(&image)?;
        while status.is_ready() {
            indices.push(filter.octave_index());
            status = filter.process_next_octave()?;
        }
        assert_eq!(indices, vec![-1, 0, 1]);

        // exhaustion is sticky
        assert_eq!(filter.process_next_octave()?, OctaveStatus::Exhausted);
        Ok(())
    }

    #[test]
    fn test_octaves_stop_on_empty_image() -> Result<(), SiftError> {
        let image = Image::<f32, 1>::from_size_val([4, 4].into(), 0.0)?;
        let mut filter = SiftFilter::new(image.size(), Some(10), 3, 0)?;

        let mut count = 0;
        let mut status = filter.process_first_octave(&image)?;
        while status.is_ready() {
            count += 1;
            status = filter.process_next_octave()?;
        }
        // 4x4, 2x2, 1x1
        assert_eq!(count, 3);
        Ok(())
    }

    #[test]
    fn test_init_keypoint() -> Result<(), SiftError> {
        let filter = SiftFilter::new([128, 128].into(), None, 3, 0)?;
        let sigma0 = filter.sigma0();

        let k = filter.init_keypoint(10.0, 20.0, sigma0);
        assert_eq!(k.octave, 0);
        assert_eq!(k.is, 0);
        assert_eq!((k.ix, k.iy), (10, 20));

        let k = filter.init_keypoint(10.0, 20.0, 2.0 * sigma0);
        assert_eq!(k.octave, 1);
        assert_eq!(k.is, 0);
        assert_eq!((k.ix, k.iy), (5, 10));
        assert_relative_eq!(k.level, 0.0, epsilon = 1e-9);

        // scales below the first octave are clamped to it
        let k = filter.init_keypoint(10.0, 20.0, 0.1);
        assert_eq!(k.octave, 0);
        assert_eq!(k.is, 0);

        // scales above the last octave are clamped as well
        let k = filter.init_keypoint(10.0, 20.0, 1e6);
        assert_eq!(k.octave, filter.first_octave() + filter.octaves() as i32 - 1);
        assert_eq!(k.is, 2);
        Ok(())
    }

    #[test]
    fn test_thresholds() -> Result<(), SiftError> {
        let mut filter = SiftFilter::new([16, 16].into(), None, 3, 0)?;
        assert_eq!(filter.peak_threshold(), DEFAULT_PEAK_THRESHOLD);
        assert_eq!(filter.edge_threshold(), DEFAULT_EDGE_THRESHOLD);
        assert_eq!(filter.norm_threshold(), DEFAULT_NORM_THRESHOLD);

        filter.set_peak_threshold(0.02);
        filter.set_edge_threshold(5.0);
        filter.set_norm_threshold(0.1);
        filter.set_magnification(4.0);
        filter.set_window_size(1.5);
        assert_eq!(filter.peak_threshold(), 0.02);
        assert_eq!(filter.edge_threshold(), 5.0);
        assert_eq!(filter.norm_threshold(), 0.1);
        assert_eq!(filter.magnification(), 4.0);
        assert_eq!(filter.window_size(), 1.5);
        Ok(())
    }
}
