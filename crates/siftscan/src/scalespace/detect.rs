use siftscan_image::Image;

use super::octave::{Octave, ScaleGeometry};
use crate::keypoint::Keypoint;

const MAX_REFINE_ITERATIONS: usize = 5;
const REFINE_SHIFT: f64 = 0.6;
const MAX_OFFSET: f64 = 1.5;
const SINGULAR_PIVOT: f64 = 1e-10;

/// Read-only view over the difference of Gaussians of an octave.
struct DogVolume<'a> {
    dogs: &'a [Image<f32, 1>],
    s_min: i32,
    width: i32,
    height: i32,
}

/// First and second order derivatives of the volume at a sample.
#[derive(Debug, Clone, Copy, Default)]
struct Derivatives {
    dx: f64,
    dy: f64,
    ds: f64,
    dxx: f64,
    dyy: f64,
    dss: f64,
    dxy: f64,
    dxs: f64,
    dys: f64,
}

impl<'a> DogVolume<'a> {
    fn new(dogs: &'a [Image<f32, 1>], s_min: i32) -> Self {
        let size = dogs[0].size();
        Self {
            dogs,
            s_min,
            width: size.width as i32,
            height: size.height as i32,
        }
    }

    #[inline]
    fn at(&self, x: i32, y: i32, s: i32) -> f64 {
        let level = self.dogs[(s - self.s_min) as usize].as_slice();
        level[(y * self.width + x) as usize] as f64
    }

    /// Values of the 26 samples surrounding `(x, y, s)`.
    fn neighbours(&self, x: i32, y: i32, s: i32) -> impl Iterator<Item = f64> + '_ {
        (-1..=1)
            .flat_map(|ds| (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy, ds))))
            .filter(|&offset| offset != (0, 0, 0))
            .map(move |(dx, dy, ds)| self.at(x + dx, y + dy, s + ds))
    }

    /// Strict local extremum whose magnitude reaches `threshold`.
    fn is_extremum(&self, x: i32, y: i32, s: i32, threshold: f64) -> bool {
        let v = self.at(x, y, s);
        (v >= threshold && self.neighbours(x, y, s).all(|n| v > n))
            || (v <= -threshold && self.neighbours(x, y, s).all(|n| v < n))
    }

    fn derivatives(&self, x: i32, y: i32, s: i32) -> Derivatives {
        let at = |dx: i32, dy: i32, ds: i32| self.at(x + dx, y + dy, s + ds);
        let v = at(0, 0, 0);
        Derivatives {
            dx: 0.5 * (at(1, 0, 0) - at(-1, 0, 0)),
            dy: 0.5 * (at(0, 1, 0) - at(0, -1, 0)),
            ds: 0.5 * (at(0, 0, 1) - at(0, 0, -1)),
            dxx: at(1, 0, 0) + at(-1, 0, 0) - 2.0 * v,
            dyy: at(0, 1, 0) + at(0, -1, 0) - 2.0 * v,
            dss: at(0, 0, 1) + at(0, 0, -1) - 2.0 * v,
            dxy: 0.25 * (at(1, 1, 0) + at(-1, -1, 0) - at(-1, 1, 0) - at(1, -1, 0)),
            dxs: 0.25 * (at(1, 0, 1) + at(-1, 0, -1) - at(-1, 0, 1) - at(1, 0, -1)),
            dys: 0.25 * (at(0, 1, 1) + at(0, -1, -1) - at(0, -1, 1) - at(0, 1, -1)),
        }
    }
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when a pivot vanishes.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for j in 0..3 {
        let pivot_row = (j..3)
            .max_by(|&p, &q| a[p][j].abs().total_cmp(&a[q][j].abs()))
            .unwrap_or(j);
        if a[pivot_row][j].abs() < SINGULAR_PIVOT {
            return None;
        }
        a.swap(j, pivot_row);
        b.swap(j, pivot_row);

        let pivot = a[j][j];
        for k in j..3 {
            a[j][k] /= pivot;
        }
        b[j] /= pivot;

        for i in j + 1..3 {
            let factor = a[i][j];
            for k in j..3 {
                a[i][k] -= factor * a[j][k];
            }
            b[i] -= factor * b[j];
        }
    }

    for i in (0..3).rev() {
        for k in 0..i {
            b[k] -= a[k][i] * b[i];
        }
    }
    Some(b)
}

/// Move by one sample towards the offset when it points past the neighbour.
fn shift(offset: f64, position: i32, len: i32) -> i32 {
    if offset > REFINE_SHIFT && position < len - 2 {
        1
    } else if offset < -REFINE_SHIFT && position > 1 {
        -1
    } else {
        0
    }
}

/// Detect the keypoints of an octave.
///
/// Local extrema of the difference of Gaussians are located to sub-sample accuracy and
/// filtered by contrast and by the ratio of principal curvatures.
pub(crate) fn detect_keypoints(
    octave: &Octave,
    geometry: &ScaleGeometry,
    peak_threshold: f32,
    edge_threshold: f32,
) -> Vec<Keypoint> {
    let volume = DogVolume::new(octave.dogs(), geometry.s_min);
    let mut keypoints = Vec::new();

    if volume.width < 3 || volume.height < 3 {
        return keypoints;
    }

    let candidate_threshold = 0.8 * peak_threshold as f64;
    for s in geometry.s_min + 1..=geometry.s_max - 2 {
        for y in 1..volume.height - 1 {
            for x in 1..volume.width - 1 {
                if !volume.is_extremum(x, y, s, candidate_threshold) {
                    continue;
                }
                if let Some(keypoint) = refine(
                    &volume,
                    octave,
                    geometry,
                    (x, y, s),
                    peak_threshold as f64,
                    edge_threshold as f64,
                ) {
                    keypoints.push(keypoint);
                }
            }
        }
    }

    keypoints
}

fn refine(
    volume: &DogVolume,
    octave: &Octave,
    geometry: &ScaleGeometry,
    (mut x, mut y, s): (i32, i32, i32),
    peak_threshold: f64,
    edge_threshold: f64,
) -> Option<Keypoint> {
    let (mut dx, mut dy) = (0, 0);
    let mut state = None;

    for _ in 0..MAX_REFINE_ITERATIONS {
        x += dx;
        y += dy;

        let d = volume.derivatives(x, y, s);
        let hessian = [
            [d.dxx, d.dxy, d.dxs],
            [d.dxy, d.dyy, d.dys],
            [d.dxs, d.dys, d.dss],
        ];
        let offset = solve3(hessian, [-d.dx, -d.dy, -d.ds]).unwrap_or([0.0; 3]);
        state = Some((d, offset));

        dx = shift(offset[0], x, volume.width);
        dy = shift(offset[1], y, volume.height);
        if dx == 0 && dy == 0 {
            break;
        }
    }

    let (d, b) = state?;
    let value = volume.at(x, y, s) + 0.5 * (d.dx * b[0] + d.dy * b[1] + d.ds * b[2]);
    let score = (d.dxx + d.dyy).powi(2) / (d.dxx * d.dyy - d.dxy * d.dxy);
    let max_score = (edge_threshold + 1.0).powi(2) / edge_threshold;

    let xn = x as f64 + b[0];
    let yn = y as f64 + b[1];
    let sn = s as f64 + b[2];

    let accepted = value.abs() > peak_threshold
        && (0.0..max_score).contains(&score)
        && b.iter().all(|o| o.abs() < MAX_OFFSET)
        && (0.0..=(volume.width - 1) as f64).contains(&xn)
        && (0.0..=(volume.height - 1) as f64).contains(&yn)
        && (geometry.s_min as f64..=geometry.s_max as f64).contains(&sn);

    if !accepted {
        return None;
    }

    let step = octave.step();
    Some(Keypoint {
        x: xn * step,
        y: yn * step,
        sigma: geometry.level_sigma(sn) * step,
        level: sn,
        octave: octave.index(),
        ix: (xn + 0.5).floor() as i32,
        iy: (yn + 0.5).floor() as i32,
        is: (sn + 0.5).floor() as i32,
    })
}
