/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when a derived image size cannot be represented.
    #[error("Invalid image size, {0}x{1} cannot be scaled without overflow")]
    InvalidImageSize(usize, usize),

    /// Error when the destination image does not have the expected size.
    #[error("Invalid destination size. Expected {0}x{1}, got {2}x{3}")]
    InvalidDestinationSize(usize, usize, usize, usize),

    /// Error when a filter kernel is empty.
    #[error("Invalid kernel length. kernel_x: {0}, kernel_y: {1}")]
    InvalidKernelLength(usize, usize),

    /// Error when a pixel value cannot be converted between types.
    #[error("Failed to cast pixel value")]
    CastError,
}
