use rayon::prelude::*;
use siftscan_image::{Image, ImageError};

use crate::parallel::ExecutionStrategy;

use super::kernels::gaussian_kernel_for_sigma;

/// A separable 2D filter that applies horizontal and vertical 1D convolutions sequentially.
///
/// Samples falling outside the image replicate the nearest border pixel, so a normalized
/// kernel preserves constant images exactly.
struct SeparableFilter<'a> {
    kernel_x: &'a [f32],
    kernel_y: &'a [f32],
    half_x: isize,
    half_y: isize,
}

impl<'a> SeparableFilter<'a> {
    fn new(kernel_x: &'a [f32], kernel_y: &'a [f32]) -> Self {
        Self {
            kernel_x,
            kernel_y,
            half_x: (kernel_x.len() / 2) as isize,
            half_y: (kernel_y.len() / 2) as isize,
        }
    }

    fn horizontal_row(&self, src_row: &[f32], dst_row: &mut [f32]) {
        let last = src_row.len() as isize - 1;
        for (c, out) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (i, &k) in self.kernel_x.iter().enumerate() {
                let x = (c as isize + i as isize - self.half_x).clamp(0, last);
                acc += src_row[x as usize] * k;
            }
            *out = acc;
        }
    }

    fn vertical_row(&self, temp: &[f32], rows: usize, cols: usize, r: usize, dst_row: &mut [f32]) {
        let last = rows as isize - 1;
        dst_row.iter_mut().for_each(|v| *v = 0.0);
        for (i, &k) in self.kernel_y.iter().enumerate() {
            let y = (r as isize + i as isize - self.half_y).clamp(0, last) as usize;
            let src_row = &temp[y * cols..(y + 1) * cols];
            for (out, &v) in dst_row.iter_mut().zip(src_row) {
                *out += v * k;
            }
        }
    }

    fn apply(&self, src: &Image<f32, 1>, dst: &mut Image<f32, 1>, strategy: ExecutionStrategy) {
        let rows = src.rows();
        let cols = src.cols();
        let src_data = src.as_slice();
        let mut temp = vec![0.0f32; src_data.len()];

        if strategy.is_parallel(rows * cols) {
            temp.par_chunks_mut(cols)
                .zip(src_data.par_chunks(cols))
                .for_each(|(row_temp, row_src)| self.horizontal_row(row_src, row_temp));

            dst.as_slice_mut()
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(r, row_dst)| self.vertical_row(&temp, rows, cols, r, row_dst));
        } else {
            temp.chunks_mut(cols)
                .zip(src_data.chunks(cols))
                .for_each(|(row_temp, row_src)| self.horizontal_row(row_src, row_temp));

            dst.as_slice_mut()
                .chunks_mut(cols)
                .enumerate()
                .for_each(|(r, row_dst)| self.vertical_row(&temp, rows, cols, r, row_dst));
        }
    }
}

/// Apply a separable filter with execution strategy control.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, 1).
/// * `dst` - The destination image with shape (H, W, 1).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
/// * `strategy` - Execution strategy: `Serial`, `Parallel`, or `Auto`.
pub fn separable_filter_with_strategy(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidKernelLength(
            kernel_x.len(),
            kernel_y.len(),
        ));
    }

    if src.size() != dst.size() {
        return Err(ImageError::InvalidDestinationSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.size().area() == 0 {
        return Ok(());
    }

    SeparableFilter::new(kernel_x, kernel_y).apply(src, dst, strategy);
    Ok(())
}

/// Apply a separable filter to an image.
///
/// Uses [`ExecutionStrategy::Auto`]. For explicit control, use [`separable_filter_with_strategy`].
pub fn separable_filter(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    separable_filter_with_strategy(src, dst, kernel_x, kernel_y, ExecutionStrategy::Auto)
}

/// Blur an image with an isotropic gaussian of standard deviation `sigma`.
///
/// A non-positive `sigma` copies the source unchanged.
///
/// # Example
///
/// ```
/// use siftscan_image::Image;
/// use siftscan_imgproc::filter::gaussian_blur;
///
/// let src = Image::<f32, 1>::from_size_val([8, 8].into(), 1.0).unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val([8, 8].into(), 0.0).unwrap();
///
/// gaussian_blur(&src, &mut dst, 1.2).unwrap();
///
/// assert!(dst.as_slice().iter().all(|v| (v - 1.0).abs() < 1e-5));
/// ```
pub fn gaussian_blur(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    sigma: f32,
) -> Result<(), ImageError> {
    if sigma <= 0.0 {
        if src.size() != dst.size() {
            return Err(ImageError::InvalidDestinationSize(
                src.cols(),
                src.rows(),
                dst.cols(),
                dst.rows(),
            ));
        }
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    let kernel = gaussian_kernel_for_sigma(sigma);
    separable_filter(src, dst, &kernel, &kernel)
}
