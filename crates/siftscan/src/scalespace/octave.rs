use log::trace;
use siftscan_image::{Image, ImageSize};
use siftscan_imgproc::{
    filter::gaussian_blur,
    gradient::polar_gradient,
    pyramid::{pyrdown_decimate, pyrup_bilinear},
};

use crate::error::SiftError;

/// Nominal smoothing of the input image.
pub(crate) const NOMINAL_SIGMA: f64 = 0.5;

/// Sampling of the scale space, shared by every octave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScaleGeometry {
    /// Levels per octave.
    pub levels: i32,
    /// First level stored in an octave.
    pub s_min: i32,
    /// Last level stored in an octave.
    pub s_max: i32,
    /// Smoothing of level zero.
    pub sigma0: f64,
    /// Ratio between the smoothing of two consecutive levels.
    pub sigmak: f64,
    /// Incremental smoothing of level zero.
    pub dsigma0: f64,
}

impl ScaleGeometry {
    pub fn new(levels: usize) -> Self {
        let levels = levels as i32;
        let sigmak = 2f64.powf(1.0 / levels as f64);
        let sigma0 = 1.6 * sigmak;
        Self {
            levels,
            s_min: -1,
            s_max: levels + 1,
            sigma0,
            sigmak,
            dsigma0: sigma0 * (1.0 - 1.0 / (sigmak * sigmak)).sqrt(),
        }
    }

    /// Number of Gaussian levels stored in an octave.
    pub fn num_levels(&self) -> usize {
        (self.s_max - self.s_min + 1) as usize
    }

    /// Smoothing of level `s` in units of the octave sampling step.
    pub fn level_sigma(&self, s: f64) -> f64 {
        self.sigma0 * 2f64.powf(s / self.levels as f64)
    }

    /// Whether `s` is a level whose gradients can be sampled.
    pub fn is_inner_level(&self, s: i32) -> bool {
        s >= self.s_min + 1 && s <= self.s_max - 2
    }
}

/// Gradient of a Gaussian level in polar form.
pub(crate) struct Gradient {
    pub magnitude: Image<f32, 1>,
    pub angle: Image<f32, 1>,
}

/// One octave of the Gaussian scale space and its difference of Gaussians.
pub(crate) struct Octave {
    index: i32,
    s_min: i32,
    levels: Vec<Image<f32, 1>>,
    dogs: Vec<Image<f32, 1>>,
    gradients: Vec<Option<Gradient>>,
}

fn decimate(src: &Image<f32, 1>) -> Result<Image<f32, 1>, SiftError> {
    let mut dst = Image::from_size_val([src.width() / 2, src.height() / 2].into(), 0.0)?;
    pyrdown_decimate(src, &mut dst)?;
    Ok(dst)
}

fn upsample(src: &Image<f32, 1>) -> Result<Image<f32, 1>, SiftError> {
    let mut dst = Image::from_size_val(src.size().upscaled(1)?, 0.0)?;
    pyrup_bilinear(src, &mut dst)?;
    Ok(dst)
}

fn difference(a: &Image<f32, 1>, b: &Image<f32, 1>) -> Result<Image<f32, 1>, SiftError> {
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&a, &b)| a - b)
        .collect();
    Ok(Image::new(a.size(), data)?)
}

impl Octave {
    /// Build the first octave, resampling the image to the sampling step of `first_octave`.
    ///
    /// Returns `None` when the resampled image is empty.
    pub fn first(
        image: &Image<f32, 1>,
        first_octave: i32,
        geometry: &ScaleGeometry,
    ) -> Result<Option<Self>, SiftError> {
        let mut base = image.clone();
        if first_octave < 0 {
            // fail before allocating anything when the final size is out of reach
            image.size().upscaled(first_octave.unsigned_abs())?;
            for _ in 0..first_octave.unsigned_abs() {
                base = upsample(&base)?;
            }
        } else {
            for _ in 0..first_octave {
                if base.size().area() == 0 {
                    break;
                }
                base = decimate(&base)?;
            }
        }

        if base.size().area() == 0 {
            return Ok(None);
        }

        let sa = geometry.sigma0 * geometry.sigmak.powi(geometry.s_min);
        let sb = NOMINAL_SIGMA / 2f64.powi(first_octave);
        Self::build(base, first_octave, sa, sb, geometry).map(Some)
    }

    /// Build the octave following this one from its level `s_min + levels`.
    ///
    /// Returns `None` when the decimated image is empty.
    pub fn next(&self, geometry: &ScaleGeometry) -> Result<Option<Self>, SiftError> {
        let s_best = (geometry.s_min + geometry.levels).min(geometry.s_max);
        let base = decimate(self.level(s_best))?;

        if base.size().area() == 0 {
            return Ok(None);
        }

        let sa = geometry.sigma0 * geometry.sigmak.powi(geometry.s_min);
        let sb = geometry.sigma0 * geometry.sigmak.powi(s_best - geometry.levels);
        Self::build(base, self.index + 1, sa, sb, geometry).map(Some)
    }

    fn build(
        base: Image<f32, 1>,
        index: i32,
        sa: f64,
        sb: f64,
        geometry: &ScaleGeometry,
    ) -> Result<Self, SiftError> {
        let size = base.size();
        let mut levels = Vec::with_capacity(geometry.num_levels());

        if sa > sb {
            let mut smoothed = Image::from_size_val(size, 0.0)?;
            gaussian_blur(&base, &mut smoothed, (sa * sa - sb * sb).sqrt() as f32)?;
            levels.push(smoothed);
        } else {
            levels.push(base);
        }

        for s in geometry.s_min + 1..=geometry.s_max {
            let sd = geometry.dsigma0 * geometry.sigmak.powi(s);
            let mut dst = Image::from_size_val(size, 0.0)?;
            if let Some(prev) = levels.last() {
                gaussian_blur(prev, &mut dst, sd as f32)?;
            }
            levels.push(dst);
        }

        let dogs = levels
            .windows(2)
            .map(|pair| difference(&pair[1], &pair[0]))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(
            "octave {index}: {}x{} with {} levels",
            size.width,
            size.height,
            levels.len()
        );

        Ok(Self {
            index,
            s_min: geometry.s_min,
            levels,
            dogs,
            gradients: (0..geometry.levels).map(|_| None).collect(),
        })
    }

    /// Index of the octave.
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Size of the images of this octave.
    pub fn size(&self) -> ImageSize {
        self.levels[0].size()
    }

    /// Sampling step of this octave with respect to the input image.
    pub fn step(&self) -> f64 {
        2f64.powi(self.index)
    }

    /// Gaussian level `s`, with `s_min <= s <= s_max`.
    pub fn level(&self, s: i32) -> &Image<f32, 1> {
        &self.levels[(s - self.s_min) as usize]
    }

    /// Difference of Gaussians stack, the first entry being level `s_min`.
    pub fn dogs(&self) -> &[Image<f32, 1>] {
        &self.dogs
    }

    /// Gradient of level `s`, with `s_min + 1 <= s <= s_max - 2`, computed on first use.
    pub fn gradient(&mut self, s: i32) -> Result<&Gradient, SiftError> {
        let slot = (s - self.s_min - 1) as usize;
        match &mut self.gradients[slot] {
            Some(gradient) => Ok(&*gradient),
            empty => {
                let level = &self.levels[(s - self.s_min) as usize];
                let mut magnitude = Image::from_size_val(level.size(), 0.0)?;
                let mut angle = Image::from_size_val(level.size(), 0.0)?;
                polar_gradient(level, &mut magnitude, &mut angle)?;
                trace!("octave {}: gradient of level {s}", self.index);
                Ok(&*empty.insert(Gradient { magnitude, angle }))
            }
        }
    }
}
