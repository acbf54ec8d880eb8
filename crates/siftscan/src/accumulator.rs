use log::trace;

use crate::keypoint::{Descriptor, Frame};

/// Features extracted from an image.
///
/// `descriptors`, when present, has one entry per frame, in the same order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiftFeatures {
    /// Frames in image coordinates.
    pub frames: Vec<Frame>,
    /// Quantized descriptors, if they were requested.
    pub descriptors: Option<Vec<Descriptor>>,
}

impl SiftFeatures {
    /// Number of extracted features.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no feature was extracted.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frames as `[x, y, sigma, angle]` rows.
    pub fn frames_as_array(&self) -> Vec<[f64; 4]> {
        self.frames.iter().map(Frame::to_array).collect()
    }
}

/// Growable frame and descriptor buffers kept in lock-step.
///
/// Capacity grows by twice the keypoint count of the octave being processed whenever a
/// record would not fit, and is trimmed to the record count by [`finish`](Self::finish).
#[derive(Debug)]
pub struct FeatureAccumulator {
    frames: Vec<Frame>,
    descriptors: Option<Vec<Descriptor>>,
    reserved: usize,
}

impl FeatureAccumulator {
    /// Create an empty accumulator.
    pub fn new(with_descriptors: bool) -> Self {
        Self::with_capacity(with_descriptors, 0)
    }

    /// Create an accumulator with room for `capacity` records.
    pub fn with_capacity(with_descriptors: bool, capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
            descriptors: with_descriptors.then(|| Vec::with_capacity(capacity)),
            reserved: capacity,
        }
    }

    /// Number of records the buffers can hold before growing.
    pub fn capacity(&self) -> usize {
        self.reserved
    }

    /// Number of records stored.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no record is stored.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether descriptors are stored alongside the frames.
    pub fn has_descriptors(&self) -> bool {
        self.descriptors.is_some()
    }

    /// Append a record.
    ///
    /// `grow_hint` is the keypoint count of the current octave. A missing descriptor is
    /// stored as zeros when the accumulator keeps descriptors, and an extra one is dropped
    /// when it does not.
    pub fn push(&mut self, frame: Frame, descriptor: Option<Descriptor>, grow_hint: usize) {
        if self.frames.len() + 1 > self.reserved {
            self.reserved += 2 * grow_hint.max(1);
            let additional = self.reserved - self.frames.len();
            self.frames.reserve_exact(additional);
            if let Some(descriptors) = &mut self.descriptors {
                descriptors.reserve_exact(additional);
            }
            trace!("output buffers grown to {} records", self.reserved);
        }

        self.frames.push(frame);
        if let Some(descriptors) = &mut self.descriptors {
            descriptors.push(descriptor.unwrap_or([0; crate::keypoint::DESCRIPTOR_SIZE]));
        }
    }

    /// Trim the buffers to the stored records and hand them over.
    pub fn finish(mut self) -> SiftFeatures {
        self.frames.shrink_to_fit();
        if let Some(descriptors) = &mut self.descriptors {
            descriptors.shrink_to_fit();
        }
        SiftFeatures {
            frames: self.frames,
            descriptors: self.descriptors,
        }
    }
}
