use rayon::prelude::*;
use siftscan_image::{Image, ImageError, ImageSize};

fn check_size(dst: &Image<f32, 1>, expected: ImageSize) -> Result<(), ImageError> {
    if dst.size() != expected {
        return Err(ImageError::InvalidDestinationSize(
            expected.width,
            expected.height,
            dst.width(),
            dst.height(),
        ));
    }
    Ok(())
}

/// Upsample an image by a factor of two with bilinear interpolation.
///
/// Even destination samples copy the source pixel, odd samples average their two
/// neighbours; the last row and column replicate the border.
///
/// # Arguments
///
/// * `src` - The source image to be upsampled.
/// * `dst` - The destination image, twice the size of `src`.
///
/// # Example
///
/// ```
/// use siftscan_image::{Image, ImageSize};
/// use siftscan_imgproc::pyramid::pyrup_bilinear;
///
/// let image = Image::<f32, 1>::new([2, 2].into(), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
/// let mut upsampled = Image::<f32, 1>::from_size_val([4, 4].into(), 0.0).unwrap();
///
/// pyrup_bilinear(&image, &mut upsampled).unwrap();
///
/// assert_eq!(upsampled.as_slice()[1], 0.5);
/// ```
pub fn pyrup_bilinear(src: &Image<f32, 1>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    let expected = src.size().upscaled(1)?;
    check_size(dst, expected)?;

    if src.size().area() == 0 {
        return Ok(());
    }

    let (w, h) = (src.width(), src.height());
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .par_chunks_mut(expected.width)
        .enumerate()
        .for_each(|(r, row)| {
            let y0 = r / 2;
            let y1 = (y0 + 1).min(h - 1);
            let wy = if r % 2 == 1 { 0.5 } else { 0.0 };
            let row0 = &src_data[y0 * w..(y0 + 1) * w];
            let row1 = &src_data[y1 * w..(y1 + 1) * w];

            for (c, out) in row.iter_mut().enumerate() {
                let x0 = c / 2;
                let x1 = (x0 + 1).min(w - 1);
                let wx = if c % 2 == 1 { 0.5 } else { 0.0 };
                let top = (1.0 - wx) * row0[x0] + wx * row0[x1];
                let bottom = (1.0 - wx) * row1[x0] + wx * row1[x1];
                *out = (1.0 - wy) * top + wy * bottom;
            }
        });

    Ok(())
}

/// Downsample an image by a factor of two keeping every second pixel.
///
/// The destination must be `floor(w / 2) x floor(h / 2)`. The source is expected to be
/// smoothed enough for the decimation not to alias.
pub fn pyrdown_decimate(src: &Image<f32, 1>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    let expected = ImageSize {
        width: src.width() / 2,
        height: src.height() / 2,
    };
    check_size(dst, expected)?;

    if expected.area() == 0 {
        return Ok(());
    }

    let w = src.width();
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .par_chunks_mut(expected.width)
        .enumerate()
        .for_each(|(r, row)| {
            let src_row = &src_data[2 * r * w..(2 * r + 1) * w];
            for (c, out) in row.iter_mut().enumerate() {
                *out = src_row[2 * c];
            }
        });

    Ok(())
}
