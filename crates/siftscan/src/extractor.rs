use log::{debug, info};
use siftscan_image::Image;
use siftscan_imgproc::transpose::transpose;

use crate::{
    accumulator::{FeatureAccumulator, SiftFeatures},
    config::SiftConfig,
    descriptor::normalized_descriptor,
    error::SiftError,
    filter::{OctaveStatus, ScaleSpaceFilter},
    keypoint::Frame,
    orientations::{expand_orientations, to_output_angle},
    resolver::KeypointSource,
    scalespace::SiftFilter,
};

fn or_default<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "default".to_string(), |v| v.to_string())
}

/// Extract SIFT features from grayscale images.
///
/// # Example
///
/// ```
/// use siftscan::{SiftConfig, SiftExtractor};
/// use siftscan_image::Image;
///
/// let image = Image::<f32, 1>::from_size_val([32, 32].into(), 0.0).unwrap();
/// let extractor = SiftExtractor::new(SiftConfig::default()).unwrap();
///
/// let features = extractor.extract(&image).unwrap();
/// assert!(features.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SiftExtractor {
    config: SiftConfig,
}

impl SiftExtractor {
    /// Create an extractor after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter of `config`.
    pub fn new(config: SiftConfig) -> Result<Self, SiftError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration of the extractor.
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Extract the features of an image with a [`SiftFilter`].
    ///
    /// The filter is built for the transposed image, the returned frames are expressed in
    /// the coordinates of `image`.
    pub fn extract(&self, image: &Image<f32, 1>) -> Result<SiftFeatures, SiftError> {
        let transposed = transpose(image)?;
        let filter = SiftFilter::new(
            transposed.size(),
            self.config.octaves,
            self.config.levels,
            self.config.first_octave,
        )?;

        self.scan(filter, &transposed)
    }

    /// Extract features with any scale-space filter.
    ///
    /// `image` is handed to the filter as is: it must already be transposed with respect to
    /// the image the frames refer to. The filter is consumed and dropped before returning.
    pub fn extract_with_filter<F>(
        &self,
        filter: F,
        image: &Image<f32, 1>,
    ) -> Result<SiftFeatures, SiftError>
    where
        F: ScaleSpaceFilter,
    {
        self.scan(filter, image)
    }

    fn scan<F>(&self, mut filter: F, image: &Image<f32, 1>) -> Result<SiftFeatures, SiftError>
    where
        F: ScaleSpaceFilter,
    {
        let config = &self.config;
        let offset = config.origin.offset();

        if let Some(t) = config.peak_threshold {
            filter.set_peak_threshold(t);
        }
        if let Some(t) = config.edge_threshold {
            filter.set_edge_threshold(t);
        }
        if let Some(t) = config.norm_threshold {
            filter.set_norm_threshold(t);
        }

        let mut source = KeypointSource::new(config.frames.as_deref(), config.origin);
        if config.verbose > 0 {
            info!(
                "sift: settings: octaves {}, levels {}, first octave {}, edge thresh {}, peak thresh {}, norm thresh {}",
                or_default(config.octaves),
                config.levels,
                config.first_octave,
                or_default(config.edge_threshold),
                or_default(config.peak_threshold),
                or_default(config.norm_threshold),
            );
            info!(
                "sift: will source frames? {}",
                match &source {
                    KeypointSource::Supplied(frames) => format!("yes ({} frames)", frames.len()),
                    KeypointSource::Detected => "no".to_string(),
                }
            );
            info!("sift: will force orientations? {}", config.force_orientations);
        }

        let mut accumulator = FeatureAccumulator::new(config.compute_descriptors);
        let mut status = filter.process_first_octave(image)?;

        while status == OctaveStatus::Ready {
            let octave = filter.octave_index();
            debug!("sift: processing octave {octave}");

            let (keypoints, grow_hint) = source.keypoints_for_octave(&mut filter)?;
            if config.verbose > 1 && !source.is_supplied() {
                debug!("sift: detected {} (unoriented) keypoints", keypoints.len());
            }

            for sourced in &keypoints {
                let keypoint = &sourced.keypoint;
                let angles = expand_orientations(&mut filter, sourced, config.force_orientations)?;

                for angle in angles {
                    let descriptor = if config.compute_descriptors {
                        Some(normalized_descriptor(&mut filter, keypoint, angle)?)
                    } else {
                        None
                    };

                    let frame = Frame::new(
                        keypoint.y + offset,
                        keypoint.x + offset,
                        keypoint.sigma,
                        to_output_angle(angle),
                    );
                    accumulator.push(frame, descriptor, grow_hint);
                }
            }

            status = filter.process_next_octave()?;
        }

        if config.verbose > 0 {
            info!("sift: found {} keypoints", accumulator.len());
        }

        Ok(accumulator.finish())
    }
}
