/// Number of values in a descriptor: 4x4 spatial bins with 8 orientation bins each.
pub const DESCRIPTOR_SIZE: usize = 128;

/// Maximum number of orientations assigned to a single keypoint.
pub const MAX_ORIENTATIONS: usize = 4;

/// Descriptor as produced by the scale-space filter.
pub type RawDescriptor = [f32; DESCRIPTOR_SIZE];

/// Descriptor quantized to bytes, as returned to the caller.
pub type Descriptor = [u8; DESCRIPTOR_SIZE];

/// A keypoint in the coordinates of the scale-space filter.
///
/// `x` and `y` are expressed in pixels of the image the filter was built for, `sigma` is the
/// absolute scale. The integer fields locate the sample in the octave that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Horizontal position in filter coordinates.
    pub x: f64,
    /// Vertical position in filter coordinates.
    pub y: f64,
    /// Scale of the keypoint.
    pub sigma: f64,
    /// Fractional level within the octave.
    pub level: f64,
    /// Octave index the scale falls into.
    pub octave: i32,
    /// Integer column within the octave.
    pub ix: i32,
    /// Integer row within the octave.
    pub iy: i32,
    /// Integer level within the octave.
    pub is: i32,
}

/// A feature frame in image coordinates: the output geometry record.
///
/// `x` is the column and `y` the row of the frame center, shifted by the configured
/// [`Origin`](crate::config::Origin). `angle` is measured from the `x` axis towards `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Column of the frame center.
    pub x: f64,
    /// Row of the frame center.
    pub y: f64,
    /// Scale of the frame.
    pub sigma: f64,
    /// Orientation of the frame in radians.
    pub angle: f64,
}

impl Frame {
    /// Create a new frame.
    pub fn new(x: f64, y: f64, sigma: f64, angle: f64) -> Self {
        Self {
            x,
            y,
            sigma,
            angle,
        }
    }

    /// The frame as `[x, y, sigma, angle]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.sigma, self.angle]
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 4]> for Frame {
    fn from(v: [f64; 4]) -> Self {
        Frame::new(v[0], v[1], v[2], v[3])
    }
}
