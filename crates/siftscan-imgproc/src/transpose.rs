use rayon::prelude::*;
use siftscan_image::{Image, ImageError};

/// Transpose the input image, swapping rows and columns.
///
/// The pixel at `(row, col)` of `src` ends up at `(col, row)` of the result, whose size is
/// `height x width`.
///
/// # Example
///
/// ```
/// use siftscan_image::{Image, ImageSize};
/// use siftscan_imgproc::transpose::transpose;
///
/// let image = Image::<f32, 1>::new(
///     ImageSize {
///         width: 3,
///         height: 2,
///     },
///     vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
/// )
/// .unwrap();
///
/// let transposed = transpose(&image).unwrap();
///
/// assert_eq!(transposed.width(), 2);
/// assert_eq!(transposed.height(), 3);
/// assert_eq!(transposed.as_slice(), &[0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
/// ```
pub fn transpose<T, const C: usize>(src: &Image<T, C>) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default + Send + Sync,
{
    let size = src.size().transposed();
    let mut dst = Image::from_size_val(size, T::default())?;

    if size.area() == 0 {
        return Ok(dst);
    }

    let src_cols = src.cols();
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .par_chunks_exact_mut(size.width * C)
        .enumerate()
        .for_each(|(r, row)| {
            // destination row `r` is source column `r`
            for (c, pixel) in row.chunks_exact_mut(C).enumerate() {
                let idx = (c * src_cols + r) * C;
                pixel.copy_from_slice(&src_data[idx..idx + C]);
            }
        });

    Ok(dst)
}
