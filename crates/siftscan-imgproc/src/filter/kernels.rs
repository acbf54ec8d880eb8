/// Number of standard deviations covered on each side by [`gaussian_kernel_for_sigma`].
pub const GAUSSIAN_TRUNCATION: f32 = 4.0;

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A normalized vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size - 1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Create a gaussian kernel whose support spans [`GAUSSIAN_TRUNCATION`] sigmas on each side.
///
/// The kernel always has an odd length of at least 1.
pub fn gaussian_kernel_for_sigma(sigma: f32) -> Vec<f32> {
    let radius = (GAUSSIAN_TRUNCATION * sigma).ceil().max(0.0) as usize;
    if radius == 0 {
        return vec![1.0];
    }
    gaussian_kernel_1d(2 * radius + 1, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_kernel_1d() {
        let kernel = gaussian_kernel_1d(5, 0.5);

        let expected = [
            0.00026386508,
            0.10645077,
            0.78657067,
            0.10645077,
            0.00026386508,
        ];

        for (k, e) in kernel.iter().zip(expected.iter()) {
            assert_relative_eq!(k, e, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_gaussian_kernel_for_sigma() {
        let kernel = gaussian_kernel_for_sigma(1.0);
        assert_eq!(kernel.len(), 9);
        assert_relative_eq!(kernel.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(kernel[0], kernel[8]);
        assert!(kernel[4] > kernel[3]);

        assert_eq!(gaussian_kernel_for_sigma(0.0), vec![1.0]);
    }
}
