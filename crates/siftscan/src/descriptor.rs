use crate::{
    error::SiftError,
    filter::ScaleSpaceFilter,
    keypoint::{Descriptor, Keypoint, RawDescriptor, DESCRIPTOR_SIZE},
};

const NBO: usize = 8;
const NBP: usize = 4;

/// Descriptor of the same patch seen in the transposed image.
///
/// Spatial rows are mirrored (`j -> 3 - j`) and every orientation histogram is reversed
/// around bin zero (`t -> (8 - t) mod 8`). The mapping is an involution.
pub fn transpose_descriptor(src: &RawDescriptor) -> RawDescriptor {
    let mut dst = [0.0; DESCRIPTOR_SIZE];
    for j in 0..NBP {
        let jp = NBP - 1 - j;
        for i in 0..NBP {
            let o = NBO * i + NBP * NBO * j;
            let op = NBO * i + NBP * NBO * jp;
            dst[op] = src[o];
            for t in 1..NBO {
                dst[op + NBO - t] = src[o + t];
            }
        }
    }
    dst
}

/// Quantize a normalized descriptor value to a byte.
#[inline]
pub fn quantize(value: f32) -> u8 {
    (512.0 * value).round().clamp(0.0, 255.0) as u8
}

/// Quantize every value of a descriptor.
pub fn quantize_descriptor(src: &RawDescriptor) -> Descriptor {
    src.map(quantize)
}

/// Compute, transpose and quantize the descriptor of an oriented keypoint.
pub fn normalized_descriptor<F>(
    filter: &mut F,
    keypoint: &Keypoint,
    angle: f64,
) -> Result<Descriptor, SiftError>
where
    F: ScaleSpaceFilter + ?Sized,
{
    let raw = filter.compute_descriptor(keypoint, angle)?;
    Ok(quantize_descriptor(&transpose_descriptor(&raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed() -> RawDescriptor {
        std::array::from_fn(|i| i as f32)
    }

    #[test]
    fn test_transpose_layout() {
        let d = transpose_descriptor(&indexed());
        // row 0, column 0 lands on row 3, column 0
        assert_eq!(d[96], 0.0);
        assert_eq!(&d[97..104], &[7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        // row 3, column 2 lands on row 0, column 2
        assert_eq!(d[16], 112.0);
        assert_eq!(d[17], 119.0);
    }

    #[test]
    fn test_transpose_involution() {
        let d = indexed();
        assert_eq!(transpose_descriptor(&transpose_descriptor(&d)), d);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(0.1), 51);
        assert_eq!(quantize(1.0 / 512.0), 1);
        assert_eq!(quantize(0.7 / 512.0), 1);
        assert_eq!(quantize(255.0 / 512.0), 255);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(f32::MAX), 255);
    }

    #[test]
    fn test_quantize_descriptor() {
        let mut raw = [0.0; DESCRIPTOR_SIZE];
        raw[3] = 0.25;
        raw[127] = 0.9;
        let q = quantize_descriptor(&raw);
        assert_eq!(q[3], 128);
        assert_eq!(q[127], 255);
        assert_eq!(q.iter().filter(|&&v| v > 0).count(), 2);
    }
}
