use std::f32::consts::TAU;

use rayon::prelude::*;
use siftscan_image::{Image, ImageError};

/// Derivative along one axis of length `len` at position `i`.
fn finite_difference(len: usize, i: usize, at: impl Fn(usize) -> f32) -> f32 {
    if len < 2 {
        0.0
    } else if i == 0 {
        at(1) - at(0)
    } else if i == len - 1 {
        at(i) - at(i - 1)
    } else {
        0.5 * (at(i + 1) - at(i - 1))
    }
}

/// Gradient magnitude and orientation of a single-channel image.
///
/// Derivatives are central differences in the interior and one-sided differences on the
/// border. Angles are `atan2(dy, dx)` wrapped to `[0, 2π)`, with `y` growing downwards.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `magnitude` - The destination for the gradient norm, same size as `src`.
/// * `angle` - The destination for the gradient orientation, same size as `src`.
pub fn polar_gradient(
    src: &Image<f32, 1>,
    magnitude: &mut Image<f32, 1>,
    angle: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    for dst in [&*magnitude, &*angle] {
        if dst.size() != src.size() {
            return Err(ImageError::InvalidDestinationSize(
                src.cols(),
                src.rows(),
                dst.cols(),
                dst.rows(),
            ));
        }
    }

    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return Ok(());
    }
    let data = src.as_slice();

    magnitude
        .as_slice_mut()
        .par_chunks_mut(w)
        .zip(angle.as_slice_mut().par_chunks_mut(w))
        .enumerate()
        .for_each(|(y, (mag_row, ang_row))| {
            for x in 0..w {
                let gx = finite_difference(w, x, |i| data[y * w + i]);
                let gy = finite_difference(h, y, |j| data[j * w + x]);
                mag_row[x] = (gx * gx + gy * gy).sqrt();
                let theta = gy.atan2(gx);
                let theta = if theta < 0.0 { theta + TAU } else { theta };
                ang_row[x] = if theta >= TAU { 0.0 } else { theta };
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_polar_gradient_ramp_x() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::new([4, 3].into(), (0..12).map(|i| (i % 4) as f32).collect())?;
        let mut mag = Image::from_size_val(img.size(), 0.0)?;
        let mut ang = Image::from_size_val(img.size(), 0.0)?;
        polar_gradient(&img, &mut mag, &mut ang)?;

        for (&m, &a) in mag.as_slice().iter().zip(ang.as_slice()) {
            assert_relative_eq!(m, 1.0);
            assert_relative_eq!(a, 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_polar_gradient_ramp_y() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::new([3, 4].into(), (0..12).map(|i| (i / 3) as f32).collect())?;
        let mut mag = Image::from_size_val(img.size(), 0.0)?;
        let mut ang = Image::from_size_val(img.size(), 0.0)?;
        polar_gradient(&img, &mut mag, &mut ang)?;

        for (&m, &a) in mag.as_slice().iter().zip(ang.as_slice()) {
            assert_relative_eq!(m, 1.0);
            assert_relative_eq!(a, FRAC_PI_2);
        }
        Ok(())
    }

    #[test]
    fn test_polar_gradient_negative_angle_wraps() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::new([3, 1].into(), vec![2.0, 1.0, 0.0])?;
        let mut mag = Image::from_size_val(img.size(), 0.0)?;
        let mut ang = Image::from_size_val(img.size(), 0.0)?;
        polar_gradient(&img, &mut mag, &mut ang)?;
        assert_relative_eq!(ang.as_slice()[1], std::f32::consts::PI);
        assert!(ang.as_slice().iter().all(|&a| (0.0..TAU).contains(&a)));
        Ok(())
    }
}
