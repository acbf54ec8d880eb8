use std::f64::consts::FRAC_PI_2;

use crate::{
    error::SiftError, filter::ScaleSpaceFilter, keypoint::MAX_ORIENTATIONS,
    resolver::SourcedKeypoint,
};

/// Convert an angle from image convention to the filter's transposed convention.
#[inline]
pub fn to_internal_angle(angle: f64) -> f64 {
    FRAC_PI_2 - angle
}

/// Convert an angle from the filter's transposed convention to image convention.
#[inline]
pub fn to_output_angle(angle: f64) -> f64 {
    FRAC_PI_2 - angle
}

/// Expand a keypoint into the angles, in filter convention, it is described at.
///
/// Detected keypoints and supplied keypoints with `force_orientations` get the orientations
/// estimated by the filter, at most [`MAX_ORIENTATIONS`]. Otherwise the supplied angle is
/// used as is.
pub fn expand_orientations<F>(
    filter: &mut F,
    sourced: &SourcedKeypoint,
    force_orientations: bool,
) -> Result<Vec<f64>, SiftError>
where
    F: ScaleSpaceFilter + ?Sized,
{
    match sourced.supplied_angle {
        Some(angle) if !force_orientations => Ok(vec![to_internal_angle(angle)]),
        _ => {
            let mut angles = filter.estimate_orientations(&sourced.keypoint)?;
            angles.truncate(MAX_ORIENTATIONS);
            Ok(angles)
        }
    }
}
