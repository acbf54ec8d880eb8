use std::f64::consts::TAU;

use super::octave::{Octave, ScaleGeometry};
use crate::{error::SiftError, keypoint::Keypoint, keypoint::MAX_ORIENTATIONS};

const NUM_BINS: usize = 36;
const WINDOW_FACTOR: f64 = 1.5;
const SMOOTHING_PASSES: usize = 6;
const PEAK_RATIO: f64 = 0.8;

/// Smooth a circular histogram with a three-tap box filter.
fn smooth_histogram(hist: &mut [f64; NUM_BINS]) {
    for _ in 0..SMOOTHING_PASSES {
        let mut prev = hist[NUM_BINS - 1];
        let first = hist[0];
        for i in 0..NUM_BINS {
            let next = if i + 1 < NUM_BINS { hist[i + 1] } else { first };
            let smoothed = (prev + hist[i] + next) / 3.0;
            prev = hist[i];
            hist[i] = smoothed;
        }
    }
}

/// Peaks of a circular histogram within [`PEAK_RATIO`] of the maximum, refined by fitting a
/// parabola through each peak and its neighbours.
fn histogram_peaks(hist: &[f64; NUM_BINS]) -> Vec<f64> {
    let max = hist.iter().copied().fold(0.0, f64::max);
    let mut angles = Vec::with_capacity(MAX_ORIENTATIONS);

    for i in 0..NUM_BINS {
        let h0 = hist[i];
        let hm = hist[(i + NUM_BINS - 1) % NUM_BINS];
        let hp = hist[(i + 1) % NUM_BINS];
        if h0 > PEAK_RATIO * max && h0 > hm && h0 > hp {
            let di = -0.5 * (hp - hm) / (hp + hm - 2.0 * h0);
            angles.push(TAU * (i as f64 + di + 0.5) / NUM_BINS as f64);
            if angles.len() == MAX_ORIENTATIONS {
                break;
            }
        }
    }

    angles
}

/// Dominant gradient orientations around a keypoint of the given octave.
///
/// Returns no angle when the keypoint belongs to another octave or falls outside of it.
pub(crate) fn keypoint_orientations(
    octave: &mut Octave,
    geometry: &ScaleGeometry,
    keypoint: &Keypoint,
) -> Result<Vec<f64>, SiftError> {
    if keypoint.octave != octave.index() || !geometry.is_inner_level(keypoint.is) {
        return Ok(Vec::new());
    }

    let step = octave.step();
    let size = octave.size();
    let (w, h) = (size.width as i32, size.height as i32);
    let x = keypoint.x / step;
    let y = keypoint.y / step;
    let sigma = keypoint.sigma / step;
    let xi = (x + 0.5).floor() as i32;
    let yi = (y + 0.5).floor() as i32;

    if xi < 0 || xi > w - 1 || yi < 0 || yi > h - 1 {
        return Ok(Vec::new());
    }

    let sigmaw = WINDOW_FACTOR * sigma;
    // no pixel of the octave is further away than w + h
    let radius = (3.0 * sigmaw).floor().clamp(1.0, (w + h) as f64) as i32;
    let radius_sq = (radius as f64).powi(2) + 0.6;

    let gradient = octave.gradient(keypoint.is)?;
    let magnitude = gradient.magnitude.as_slice();
    let angle = gradient.angle.as_slice();

    let mut hist = [0.0f64; NUM_BINS];
    for ys in (-radius).max(-yi)..=radius.min(h - 1 - yi) {
        for xs in (-radius).max(-xi)..=radius.min(w - 1 - xi) {
            let dx = (xi + xs) as f64 - x;
            let dy = (yi + ys) as f64 - y;
            let r2 = dx * dx + dy * dy;
            if r2 >= radius_sq {
                continue;
            }

            let offset = size.index((yi + ys) as usize, (xi + xs) as usize);
            let weight = (-r2 / (2.0 * sigmaw * sigmaw)).exp();
            let modulus = magnitude[offset] as f64;
            let fbin = NUM_BINS as f64 * angle[offset] as f64 / TAU;
            let bin = (fbin - 0.5).floor();
            let rbin = fbin - bin - 0.5;
            let bin = bin as i64;
            let lower = bin.rem_euclid(NUM_BINS as i64) as usize;
            let upper = (bin + 1).rem_euclid(NUM_BINS as i64) as usize;
            hist[lower] += (1.0 - rbin) * modulus * weight;
            hist[upper] += rbin * modulus * weight;
        }
    }

    smooth_histogram(&mut hist);
    Ok(histogram_peaks(&hist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use siftscan_image::Image;

    #[test]
    fn test_smooth_preserves_mass() {
        let mut hist = [0.0; NUM_BINS];
        hist[0] = 3.0;
        smooth_histogram(&mut hist);
        assert_relative_eq!(hist.iter().sum::<f64>(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(hist[1], hist[NUM_BINS - 1], epsilon = 1e-9);
    }

    #[test]
    fn test_single_peak() {
        let mut hist = [0.0; NUM_BINS];
        hist[9] = 1.0;
        hist[8] = 0.5;
        hist[10] = 0.5;
        let peaks = histogram_peaks(&hist);
        assert_eq!(peaks.len(), 1);
        assert_relative_eq!(peaks[0], TAU * 9.5 / NUM_BINS as f64);
    }

    #[test]
    fn test_peaks_are_capped() {
        let mut hist = [0.0; NUM_BINS];
        for i in (0..NUM_BINS).step_by(4) {
            hist[i] = 1.0;
        }
        assert_eq!(histogram_peaks(&hist).len(), MAX_ORIENTATIONS);
    }

    #[test]
    fn test_ramp_orientation() -> Result<(), SiftError> {
        let geometry = ScaleGeometry::new(3);
        let (w, h) = (64usize, 64usize);
        let data = (0..w * h)
            .map(|i| ((i % w) as f32 + 0.2 * (i / w) as f32) / w as f32)
            .collect();
        let image = Image::<f32, 1>::new([w, h].into(), data)?;
        let mut octave = Octave::first(&image, 0, &geometry)?.expect("octave");

        let keypoint = Keypoint {
            x: 32.0,
            y: 32.0,
            sigma: 2.0,
            level: 0.0,
            octave: 0,
            ix: 32,
            iy: 32,
            is: 0,
        };
        let angles = keypoint_orientations(&mut octave, &geometry, &keypoint)?;
        assert_eq!(angles.len(), 1);
        let expected = 0.2f64.atan2(1.0);
        assert!(
            (angles[0] - expected).abs() < TAU / NUM_BINS as f64,
            "angle {} expected {expected}",
            angles[0]
        );
        Ok(())
    }

    #[test]
    fn test_window_larger_than_octave() -> Result<(), SiftError> {
        let geometry = ScaleGeometry::new(3);
        let (w, h) = (32usize, 32usize);
        let data = (0..w * h)
            .map(|i| ((i % w) as f32 + 0.2 * (i / w) as f32) / w as f32)
            .collect();
        let image = Image::<f32, 1>::new([w, h].into(), data)?;
        let mut octave = Octave::first(&image, 0, &geometry)?.expect("octave");

        // the window covers the whole octave, every pixel gets the same weight
        let keypoint = Keypoint {
            x: 12.0,
            y: 20.0,
            sigma: 1.0e6,
            level: 0.0,
            octave: 0,
            ix: 12,
            iy: 20,
            is: 2,
        };
        let angles = keypoint_orientations(&mut octave, &geometry, &keypoint)?;
        let expected = 0.2f64.atan2(1.0);
        assert!(
            angles
                .iter()
                .any(|a| (a - expected).abs() < TAU / NUM_BINS as f64),
            "angles {angles:?} expected {expected}"
        );
        Ok(())
    }

    #[test]
    fn test_other_octave_is_skipped() -> Result<(), SiftError> {
        let geometry = ScaleGeometry::new(3);
        let image = Image::<f32, 1>::from_size_val([16, 16].into(), 0.0)?;
        let mut octave = Octave::first(&image, 0, &geometry)?.expect("octave");
        let keypoint = Keypoint {
            x: 4.0,
            y: 4.0,
            sigma: 4.0,
            level: 0.0,
            octave: 1,
            ix: 2,
            iy: 2,
            is: 0,
        };
        assert!(keypoint_orientations(&mut octave, &geometry, &keypoint)?.is_empty());
        Ok(())
    }
}
