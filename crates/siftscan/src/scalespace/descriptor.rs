use std::f64::consts::TAU;

use super::octave::{Octave, ScaleGeometry};
use crate::{
    error::SiftError,
    keypoint::{Keypoint, RawDescriptor, DESCRIPTOR_SIZE},
};

/// Spatial bins along each side of the descriptor.
const NBP: i32 = 4;
/// Orientation bins of each spatial bin.
const NBO: i32 = 8;
/// Saturation applied to the normalized histogram before renormalizing.
const SATURATION: f32 = 0.2;

/// Sampling parameters of the descriptor window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DescriptorParams {
    /// Width of a spatial bin in units of the keypoint scale.
    pub magnification: f64,
    /// Standard deviation of the Gaussian window in units of spatial bins.
    pub window_size: f64,
    /// Descriptors with a smaller norm are zeroed; zero disables the check.
    pub norm_threshold: f32,
}

fn normalize(descriptor: &mut RawDescriptor) -> f32 {
    let norm = descriptor.iter().map(|v| v * v).sum::<f32>().sqrt() + f32::EPSILON;
    descriptor.iter_mut().for_each(|v| *v /= norm);
    norm
}

/// Compute the gradient histogram descriptor of a keypoint at orientation `angle`.
///
/// The 4x4 spatial grid is laid out with the `y` bin varying slowest, then `x`, then the
/// orientation bin. Keypoints from another octave or too close to the border get an all-zero
/// descriptor.
pub(crate) fn keypoint_descriptor(
    octave: &mut Octave,
    geometry: &ScaleGeometry,
    params: &DescriptorParams,
    keypoint: &Keypoint,
    angle: f64,
) -> Result<RawDescriptor, SiftError> {
    let mut descriptor = [0.0f32; DESCRIPTOR_SIZE];

    let step = octave.step();
    let size = octave.size();
    let (w, h) = (size.width as i32, size.height as i32);
    let x = keypoint.x / step;
    let y = keypoint.y / step;
    let sigma = keypoint.sigma / step;
    let xi = (x + 0.5).floor() as i32;
    let yi = (y + 0.5).floor() as i32;

    if keypoint.octave != octave.index()
        || !geometry.is_inner_level(keypoint.is)
        || xi < 0
        || xi >= w
        || yi < 0
        || yi >= h - 1
    {
        return Ok(descriptor);
    }

    let (st0, ct0) = angle.sin_cos();
    let sbp = params.magnification * sigma + f64::EPSILON;
    let radius = (std::f64::consts::SQRT_2 * sbp * (NBP + 1) as f64 / 2.0 + 0.5)
        .floor()
        .min((w + h) as f64) as i32;
    let wsigma = params.window_size;

    let gradient = octave.gradient(keypoint.is)?;
    let magnitude = gradient.magnitude.as_slice();
    let orientation = gradient.angle.as_slice();

    for dyi in (-radius).max(1 - yi)..=radius.min(h - yi - 2) {
        for dxi in (-radius).max(1 - xi)..=radius.min(w - xi - 2) {
            let offset = size.index((yi + dyi) as usize, (xi + dxi) as usize);
            let modulus = magnitude[offset] as f64;
            let theta = (orientation[offset] as f64 - angle).rem_euclid(TAU);

            // displacement in the frame of the keypoint, in spatial bins
            let dx = (xi + dxi) as f64 - x;
            let dy = (yi + dyi) as f64 - y;
            let nx = (ct0 * dx + st0 * dy) / sbp;
            let ny = (-st0 * dx + ct0 * dy) / sbp;
            let nt = NBO as f64 * theta / TAU;

            let win = (-(nx * nx + ny * ny) / (2.0 * wsigma * wsigma)).exp();

            let binx = (nx - 0.5).floor() as i32;
            let biny = (ny - 0.5).floor() as i32;
            let bint = nt.floor() as i32;
            let rbinx = nx - (binx as f64 + 0.5);
            let rbiny = ny - (biny as f64 + 0.5);
            let rbint = nt - bint as f64;

            for dbinx in 0..2 {
                let bx = binx + dbinx;
                if !(-NBP / 2..NBP / 2).contains(&bx) {
                    continue;
                }
                let wx = (1.0 - dbinx as f64 - rbinx).abs();
                for dbiny in 0..2 {
                    let by = biny + dbiny;
                    if !(-NBP / 2..NBP / 2).contains(&by) {
                        continue;
                    }
                    let wy = (1.0 - dbiny as f64 - rbiny).abs();
                    for dbint in 0..2 {
                        let bt = (bint + dbint).rem_euclid(NBO);
                        let wt = (1.0 - dbint as f64 - rbint).abs();
                        let index = (by + NBP / 2) * NBP * NBO + (bx + NBP / 2) * NBO + bt;
                        descriptor[index as usize] += (win * modulus * wx * wy * wt) as f32;
                    }
                }
            }
        }
    }

    let norm = normalize(&mut descriptor);
    if params.norm_threshold > 0.0 && norm < params.norm_threshold {
        descriptor = [0.0; DESCRIPTOR_SIZE];
    } else {
        descriptor.iter_mut().for_each(|v| *v = v.min(SATURATION));
        normalize(&mut descriptor);
    }

    Ok(descriptor)
}
