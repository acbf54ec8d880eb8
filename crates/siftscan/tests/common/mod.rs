#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use siftscan::{
    Keypoint, OctaveStatus, RawDescriptor, ScaleSpaceFilter, SiftError, DESCRIPTOR_SIZE,
};
use siftscan_image::{Image, ImageError};

/// Calls observed by a [`ScriptedFilter`].
#[derive(Debug, Default)]
pub struct CallLog {
    /// Octave index at every descriptor request.
    pub descriptor_octaves: Vec<i32>,
    /// Angle of every descriptor request.
    pub descriptor_angles: Vec<f64>,
    /// Octave index and keypoint sigma at every orientation request.
    pub orientation_requests: Vec<(i32, f64)>,
    /// Thresholds set by the caller.
    pub peak_threshold: Option<f32>,
    pub edge_threshold: Option<f32>,
    pub norm_threshold: Option<f32>,
    /// Number of times the filter was dropped.
    pub drops: usize,
}

/// A filter replaying canned keypoints.
///
/// Octave `o` holds `keypoints[o]`. The octave of a scale is `floor(log2(sigma))`, and a
/// keypoint gets `angles` as orientations. Raw descriptors encode the keypoint position.
pub struct ScriptedFilter {
    pub keypoints: Vec<Vec<Keypoint>>,
    pub angles: Vec<f64>,
    pub current: Option<usize>,
    pub fail_descriptors: bool,
    pub log: Rc<RefCell<CallLog>>,
}

impl ScriptedFilter {
    pub fn new(keypoints: Vec<Vec<Keypoint>>, angles: Vec<f64>) -> Self {
        Self {
            keypoints,
            angles,
            current: None,
            fail_descriptors: false,
            log: Rc::new(RefCell::new(CallLog::default())),
        }
    }

    /// A filter with `octaves` empty octaves.
    pub fn empty(octaves: usize) -> Self {
        Self::new(vec![Vec::new(); octaves], vec![0.0])
    }

    pub fn log(&self) -> Rc<RefCell<CallLog>> {
        Rc::clone(&self.log)
    }
}

pub fn keypoint(x: f64, y: f64, sigma: f64) -> Keypoint {
    Keypoint {
        x,
        y,
        sigma,
        level: 0.0,
        octave: sigma.log2().floor() as i32,
        ix: x.round() as i32,
        iy: y.round() as i32,
        is: 0,
    }
}

/// Raw descriptor whose first bin holds `x / 512` and second bin `y / 512`.
pub fn raw_descriptor(keypoint: &Keypoint) -> RawDescriptor {
    let mut d = [0.0; DESCRIPTOR_SIZE];
    d[0] = (keypoint.x / 512.0) as f32;
    d[1] = (keypoint.y / 512.0) as f32;
    d
}

impl ScaleSpaceFilter for ScriptedFilter {
    fn set_peak_threshold(&mut self, threshold: f32) {
        self.log.borrow_mut().peak_threshold = Some(threshold);
    }

    fn set_edge_threshold(&mut self, threshold: f32) {
        self.log.borrow_mut().edge_threshold = Some(threshold);
    }

    fn set_norm_threshold(&mut self, threshold: f32) {
        self.log.borrow_mut().norm_threshold = Some(threshold);
    }

    fn process_first_octave(&mut self, _image: &Image<f32, 1>) -> Result<OctaveStatus, SiftError> {
        if self.keypoints.is_empty() {
            return Ok(OctaveStatus::Exhausted);
        }
        self.current = Some(0);
        Ok(OctaveStatus::Ready)
    }

    fn process_next_octave(&mut self) -> Result<OctaveStatus, SiftError> {
        match self.current {
            Some(o) if o + 1 < self.keypoints.len() => {
                self.current = Some(o + 1);
                Ok(OctaveStatus::Ready)
            }
            _ => Ok(OctaveStatus::Exhausted),
        }
    }

    fn detect_keypoints(&mut self) -> Result<Vec<Keypoint>, SiftError> {
        Ok(self
            .current
            .map(|o| self.keypoints[o].clone())
            .unwrap_or_default())
    }

    fn init_keypoint(&self, x: f64, y: f64, sigma: f64) -> Keypoint {
        keypoint(x, y, sigma)
    }

    fn estimate_orientations(&mut self, keypoint: &Keypoint) -> Result<Vec<f64>, SiftError> {
        let octave = self.octave_index();
        self.log
            .borrow_mut()
            .orientation_requests
            .push((octave, keypoint.sigma));
        Ok(self.angles.clone())
    }

    fn compute_descriptor(
        &mut self,
        keypoint: &Keypoint,
        angle: f64,
    ) -> Result<RawDescriptor, SiftError> {
        if self.fail_descriptors {
            return Err(SiftError::ImageError(ImageError::InvalidImageSize(0, 0)));
        }
        let octave = self.octave_index();
        let mut log = self.log.borrow_mut();
        log.descriptor_octaves.push(octave);
        log.descriptor_angles.push(angle);
        Ok(raw_descriptor(keypoint))
    }

    fn octave_index(&self) -> i32 {
        self.current.unwrap_or(0) as i32
    }
}

impl Drop for ScriptedFilter {
    fn drop(&mut self) {
        self.log.borrow_mut().drops += 1;
    }
}

/// Image handed to scripted filters; its content is ignored.
pub fn dummy_image() -> Image<f32, 1> {
    Image::from_size_val([4, 4].into(), 0.0).expect("image")
}
