#![deny(missing_docs)]
//! Scale-invariant feature extraction, one octave at a time.
//!
//! The scan advances a [`ScaleSpaceFilter`] octave by octave. For every octave the keypoints
//! are either detected by the filter or taken from a list of frames supplied by the caller,
//! expanded into one or more orientations, and described by a 128 byte descriptor.
//!
//! ```
//! use siftscan::{SiftConfig, SiftExtractor};
//! use siftscan_image::Image;
//!
//! let (w, h) = (64, 48);
//! let data = (0..w * h)
//!     .map(|i| {
//!         let (x, y) = ((i % w) as f32 - 32.0, (i / w) as f32 - 24.0);
//!         (-(x * x + y * y) / 32.0).exp()
//!     })
//!     .collect();
//! let image = Image::<f32, 1>::new([w, h].into(), data).unwrap();
//!
//! let extractor = SiftExtractor::new(SiftConfig::default()).unwrap();
//! let features = extractor.extract(&image).unwrap();
//!
//! assert_eq!(features.descriptors.map(|d| d.len()), Some(features.frames.len()));
//! ```

/// Output buffers of a scan.
pub mod accumulator;

/// Configuration of a scan.
pub mod config;

/// Descriptor transposition and quantization.
pub mod descriptor;

/// Error types for the feature extraction.
pub mod error;

/// The octave loop.
pub mod extractor;

/// Scale-space filter interface.
pub mod filter;

/// Keypoint and frame types.
pub mod keypoint;

/// Orientation assignment of keypoints.
pub mod orientations;

/// Keypoint sourcing per octave.
pub mod resolver;

pub mod scalespace;

pub use accumulator::{FeatureAccumulator, SiftFeatures};
pub use config::{Origin, SiftConfig};
pub use error::SiftError;
pub use extractor::SiftExtractor;
pub use filter::{OctaveStatus, ScaleSpaceFilter};
pub use keypoint::{Descriptor, Frame, Keypoint, RawDescriptor, DESCRIPTOR_SIZE};
pub use scalespace::SiftFilter;
