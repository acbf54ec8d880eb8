use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use siftscan_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Linear offset of the pixel at `(row, col)` in a single-channel buffer.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Number of pixels covered by this size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// The size scaled up by `2^times` along both axes.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidImageSize`] when a dimension or the area of the scaled
    /// size does not fit in `usize`.
    ///
    /// ```
    /// use siftscan_image::ImageSize;
    ///
    /// let size = ImageSize::from([3, 2]).upscaled(2).unwrap();
    /// assert_eq!(size, ImageSize::from([12, 8]));
    /// assert!(ImageSize::from([3, 2]).upscaled(usize::BITS).is_err());
    /// ```
    pub fn upscaled(&self, times: u32) -> Result<ImageSize, ImageError> {
        let scale = 1usize
            .checked_shl(times)
            .ok_or(ImageError::InvalidImageSize(self.width, self.height))?;
        let scaled = |len: usize| {
            len.checked_mul(scale)
                .ok_or(ImageError::InvalidImageSize(self.width, self.height))
        };
        let size = ImageSize {
            width: scaled(self.width)?,
            height: scaled(self.height)?,
        };
        size.width
            .checked_mul(size.height)
            .ok_or(ImageError::InvalidImageSize(self.width, self.height))?;
        Ok(size)
    }

    /// The size with width and height swapped.
    pub fn transposed(&self) -> ImageSize {
        ImageSize {
            width: self.height,
            height: self.width,
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Represents an image with pixel data.
///
/// The pixels are stored row-major and interleaved, i.e. with shape (H, W, C).
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use siftscan_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.width * size.height * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and a constant pixel value.
    ///
    /// # Examples
    ///
    /// ```
    /// use siftscan_image::{Image, ImageSize};
    ///
    /// let image = Image::<f32, 1>::from_size_val([4, 3].into(), 0.5).unwrap();
    ///
    /// assert_eq!(image.width(), 4);
    /// assert_eq!(image.height(), 3);
    /// assert!(image.as_slice().iter().all(|&v| v == 0.5));
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.width * size.height * CHANNELS])
    }

    /// Create a new image by copying the given slice.
    pub fn from_size_slice(size: ImageSize, data: &[T]) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, data.to_vec())
    }

    /// Cast the pixel data to a different type and scale it.
    ///
    /// # Errors
    ///
    /// If a pixel value cannot be represented in the new type, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use siftscan_image::{Image, ImageSize};
    ///
    /// let image_u8 = Image::<u8, 1>::new([2, 1].into(), vec![0, 4]).unwrap();
    /// let image_f32 = image_u8.cast_and_scale::<f32>(0.25).unwrap();
    ///
    /// assert_eq!(image_f32.get([0, 1, 0]), Some(&1.0f32));
    /// ```
    pub fn cast_and_scale<U>(&self, scale: U) -> Result<Image<U, CHANNELS>, ImageError>
    where
        T: num_traits::NumCast + Copy,
        U: num_traits::NumCast + std::ops::Mul<Output = U> + Copy,
    {
        let casted_data = self
            .data
            .iter()
            .map(|&x| {
                let xu = U::from(x).ok_or(ImageError::CastError)?;
                Ok(xu * scale)
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, casted_data)
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.width()
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.height()
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// The pixel data as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The pixel data as a flat mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its pixel buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get a reference to the value at `[row, col, channel]`, if in bounds.
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let [row, col, ch] = index;
        if row >= self.height() || col >= self.width() || ch >= CHANNELS {
            return None;
        }
        self.data.get((row * self.width() + col) * CHANNELS + ch)
    }

    /// Get a mutable reference to the value at `[row, col, channel]`, if in bounds.
    pub fn get_mut(&mut self, index: [usize; 3]) -> Option<&mut T> {
        let [row, col, ch] = index;
        if row >= self.height() || col >= self.width() || ch >= CHANNELS {
            return None;
        }
        let width = self.width();
        self.data.get_mut((row * width + col) * CHANNELS + ch)
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageError, ImageSize};

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.width, 10);
        assert_eq!(image_size.height, 20);
        assert_eq!(image_size.area(), 200);
        assert_eq!(image_size.index(2, 3), 43);
        assert_eq!(
            image_size.transposed(),
            ImageSize {
                width: 20,
                height: 10
            }
        );
    }

    #[test]
    fn image_size_upscaled() -> Result<(), ImageError> {
        let size = ImageSize::from([5, 3]);
        assert_eq!(size.upscaled(0)?, size);
        assert_eq!(size.upscaled(1)?, ImageSize::from([10, 6]));
        assert_eq!(ImageSize::from([0, 0]).upscaled(40)?, ImageSize::from([0, 0]));

        // the area no longer fits even though each side does
        let half = 1usize << (usize::BITS / 2);
        assert_eq!(
            ImageSize::from([half, half]).upscaled(1),
            Err(ImageError::InvalidImageSize(half, half))
        );
        assert!(size.upscaled(usize::BITS - 2).is_err());
        assert!(size.upscaled(u32::MAX).is_err());
        Ok(())
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0u8; 10 * 20 * 3],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 3);
        Ok(())
    }

    #[test]
    fn image_wrong_length() {
        let res = Image::<f32, 1>::new([3, 3].into(), vec![0.0; 8]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(8, 9)));
    }

    #[test]
    fn image_get() -> Result<(), ImageError> {
        let mut image = Image::<f32, 2>::new([2, 1].into(), vec![0.0, 1.0, 2.0, 3.0])?;
        assert_eq!(image.get([0, 1, 0]), Some(&2.0));
        assert_eq!(image.get([0, 1, 1]), Some(&3.0));
        assert_eq!(image.get([1, 0, 0]), None);
        assert_eq!(image.get([0, 0, 2]), None);

        if let Some(v) = image.get_mut([0, 0, 1]) {
            *v = 7.0;
        }
        assert_eq!(image.as_slice(), &[0.0, 7.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn image_cast_and_scale() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([3, 1].into(), vec![0, 2, 4])?;
        let image_f32 = image.cast_and_scale::<f32>(0.5)?;
        assert_eq!(image_f32.as_slice(), &[0.0, 1.0, 2.0]);
        Ok(())
    }
}
