use crate::{
    config::Origin,
    error::SiftError,
    filter::ScaleSpaceFilter,
    keypoint::{Frame, Keypoint},
};

/// A keypoint selected for the current octave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcedKeypoint {
    /// The keypoint in filter coordinates.
    pub keypoint: Keypoint,
    /// Angle of the frame the keypoint was built from, in image convention.
    pub supplied_angle: Option<f64>,
}

/// Caller supplied frames, sorted by scale and consumed octave by octave.
///
/// The cursor persists across octaves: a frame is handed out exactly once, during the pass
/// of the octave its scale belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppliedFrames {
    frames: Vec<Frame>,
    cursor: usize,
    offset: f64,
}

impl SuppliedFrames {
    /// Copy the frames and sort them by increasing scale.
    ///
    /// The sort is stable, frames with the same scale keep their relative order.
    pub fn new(frames: &[Frame], origin: Origin) -> Self {
        let mut frames = frames.to_vec();
        frames.sort_by(|a, b| a.sigma.total_cmp(&b.sigma));
        Self {
            frames,
            cursor: 0,
            offset: origin.offset(),
        }
    }

    /// The sorted frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Total number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether there are no frames at all.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Position of the next frame to consider.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of frames not handed out yet.
    pub fn remaining(&self) -> usize {
        self.frames.len() - self.cursor
    }

    /// Hand out the frames whose scale falls into the filter's current octave.
    ///
    /// Stops at the first frame that belongs to another octave, leaving it for a later pass.
    pub fn take_octave<F>(&mut self, filter: &F) -> Vec<SourcedKeypoint>
    where
        F: ScaleSpaceFilter + ?Sized,
    {
        let octave = filter.octave_index();
        let mut keypoints = Vec::new();

        while let Some(frame) = self.frames.get(self.cursor) {
            // the filter sees the transposed image
            let keypoint = filter.init_keypoint(
                frame.y - self.offset,
                frame.x - self.offset,
                frame.sigma,
            );
            if keypoint.octave != octave {
                break;
            }

            keypoints.push(SourcedKeypoint {
                keypoint,
                supplied_angle: Some(frame.angle),
            });
            self.cursor += 1;
        }

        keypoints
    }
}

/// Where the keypoints of each octave come from.
#[derive(Debug, Clone, PartialEq)]
pub enum KeypointSource {
    /// Run the filter's detector on every octave.
    Detected,
    /// Stream a caller supplied list of frames.
    Supplied(SuppliedFrames),
}

impl KeypointSource {
    /// Pick the mode for a whole run.
    pub fn new(frames: Option<&[Frame]>, origin: Origin) -> Self {
        match frames {
            Some(frames) => KeypointSource::Supplied(SuppliedFrames::new(frames, origin)),
            None => KeypointSource::Detected,
        }
    }

    /// Whether keypoints come from a supplied list.
    pub fn is_supplied(&self) -> bool {
        matches!(self, KeypointSource::Supplied(_))
    }

    /// Keypoints to process for the filter's current octave.
    ///
    /// Also returns the growth hint for the output buffers: the number of keypoints detected
    /// in this octave, or the number of supplied frames still pending when it started.
    pub fn keypoints_for_octave<F>(
        &mut self,
        filter: &mut F,
    ) -> Result<(Vec<SourcedKeypoint>, usize), SiftError>
    where
        F: ScaleSpaceFilter + ?Sized,
    {
        match self {
            KeypointSource::Detected => {
                let keypoints = filter
                    .detect_keypoints()?
                    .into_iter()
                    .map(|keypoint| SourcedKeypoint {
                        keypoint,
                        supplied_angle: None,
                    })
                    .collect::<Vec<_>>();
                let hint = keypoints.len();
                Ok((keypoints, hint))
            }
            KeypointSource::Supplied(frames) => {
                let hint = frames.remaining().max(1);
                Ok((frames.take_octave(&*filter), hint))
            }
        }
    }
}
