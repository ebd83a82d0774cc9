use nalgebra::{Matrix3, Point2, SMatrix, Vector3};
use serde::{Deserialize, Serialize};

/// Smallest pairwise distance, in Hartley-normalised units, for two points to count as distinct.
const MIN_POINT_SEPARATION: f64 = 1e-6;
/// Smallest `|cross|` (twice the triangle area), in normalised units, for three
/// points to count as non-collinear.
const MIN_TRIANGLE_AREA2: f64 = 1e-6;
/// Smallest ratio of the second-smallest to the largest singular value of the
/// normalised DLT system that is still solved.
const MIN_SINGULAR_RATIO: f64 = 1e-10;
/// Relative magnitude below which `h33` counts as zero.
const MIN_H33_RELATIVE: f64 = 1e-12;

/// Four correspondences that cannot define a unique, finite projective transform.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DegenerateInputError {
    #[error("points {first} and {second} coincide")]
    CoincidentPoints { first: usize, second: usize },
    #[error("points {a}, {b} and {c} are collinear")]
    CollinearPoints { a: usize, b: usize, c: usize },
    #[error("linear system is near-singular (singular value ratio = {ratio:.3e})")]
    SingularSystem { ratio: f64 },
    #[error("homography sends the origin to infinity (h33 = 0)")]
    PointAtInfinity,
    #[error("non-finite value in input points or solution")]
    NonFinite,
}

/// 3×3 projective transform acting on homogeneous 2D points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Map a point. Points on the line at infinity come back as non-finite.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    /// Homogeneous scale of `p` after mapping; zero on the line at infinity.
    #[inline]
    pub fn w(&self, p: Point2<f64>) -> f64 {
        self.h[(2, 0)] * p.x + self.h[(2, 1)] * p.y + self.h[(2, 2)]
    }

    /// Map a point only when its `w` has the same sign as `side`.
    ///
    /// `side` is the `w` of a point known to lie on the wanted side of the line
    /// at infinity, so the test does not depend on the matrix scale. Returns
    /// `None` for points on the line, on the other side, or when `side` is 0.
    #[inline]
    pub fn apply_on_side(&self, p: Point2<f64>, side: f64) -> Option<Point2<f64>> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        if v[2] * side.signum() <= 0.0 || side == 0.0 {
            return None;
        }
        let q = Point2::new(v[0] / v[2], v[1] / v[2]);
        (q.x.is_finite() && q.y.is_finite()).then_some(q)
    }

    pub fn inverse(&self) -> Option<Self> {
        let inv = self.h.try_inverse()?;
        let s = inv[(2, 2)];
        // keep the same h33 = 1 normalisation when possible
        if s.abs() > MIN_H33_RELATIVE * inv.amax() {
            Some(Self::new(inv / s))
        } else {
            Some(Self::new(inv))
        }
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    // translate to centroid, scale so mean distance = sqrt(2)
    let n = 4.0_f64;
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

/// Reject coincident pairs and collinear triples of a normalised quad.
fn check_configuration(pts: &[Point2<f64>; 4]) -> Result<(), DegenerateInputError> {
    for i in 0..4 {
        for j in (i + 1)..4 {
            if (pts[i] - pts[j]).norm() < MIN_POINT_SEPARATION {
                return Err(DegenerateInputError::CoincidentPoints {
                    first: i,
                    second: j,
                });
            }
        }
    }
    for (a, b, c) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
        let ab = pts[b] - pts[a];
        let ac = pts[c] - pts[a];
        if (ab.x * ac.y - ab.y * ac.x).abs() < MIN_TRIANGLE_AREA2 {
            return Err(DegenerateInputError::CollinearPoints { a, b, c });
        }
    }
    Ok(())
}

/// Compute H such that `dst ~ H * src`, from exactly four correspondences.
///
/// The i-th source point maps to the i-th destination point, so both arrays
/// must list corners in the same winding order (top-left, top-right,
/// bottom-right, bottom-left). Listing them in different orders does not fail:
/// it silently yields a mirrored or folded transform.
///
/// The result is normalised so that `h33 == 1`.
pub fn homography_from_4pt(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, DegenerateInputError> {
    if src.iter().chain(dst.iter()).any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(DegenerateInputError::NonFinite);
    }

    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);
    check_configuration(&src_n)?;
    check_configuration(&dst_n)?;

    // Stack the 8 DLT rows for h = [h11 .. h33] into a 9x9 matrix; the ninth row
    // stays zero so the null vector shows up in V^T.
    // [ -x -y -1   0  0  0   u*x u*y u ]
    // [  0  0  0  -x -y -1   v*x v*y v ]
    let mut a = SMatrix::<f64, 9, 9>::zeros();
    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let sv = svd.singular_values;
    let null_idx = sv.imin();
    let largest = sv.max();
    // Rank 8 means exactly one (near) zero singular value; a second one
    // leaves the solution underdetermined.
    let second_smallest = sv
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != null_idx)
        .map(|(_, v)| *v)
        .fold(f64::INFINITY, f64::min);
    let ratio = if largest > 0.0 {
        second_smallest / largest
    } else {
        0.0
    };
    if !ratio.is_finite() || ratio < MIN_SINGULAR_RATIO {
        return Err(DegenerateInputError::SingularSystem { ratio });
    }
    let vt = svd
        .v_t
        .ok_or(DegenerateInputError::SingularSystem { ratio })?;
    let x = vt.row(null_idx);

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], x[8],
    );

    // H = T_dst^{-1} * Hn * T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(DegenerateInputError::SingularSystem { ratio })?;
    let h = t_dst_inv * hn * t_src;

    let s = h[(2, 2)];
    if s.abs() <= MIN_H33_RELATIVE * h.amax() {
        return Err(DegenerateInputError::PointAtInfinity);
    }
    let h = h / s;
    if h.iter().any(|v| !v.is_finite()) {
        return Err(DegenerateInputError::NonFinite);
    }

    Ok(Homography::new(h))
}
