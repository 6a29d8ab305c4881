use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, Unit, Vector3};

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Signed volume of the tetrahedron spanned by `b - a`, `c - a` and `d - a`.
pub fn signed_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    (b - a).dot(&(c - a).cross(&(d - a)))
}

/// Dihedral angle a-b-c-d in degrees, in (-180, 180].
pub fn dihedral(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    let m1 = n1.cross(&b2.normalize());
    let x = n1.dot(&n2);
    let y = m1.dot(&n2);
    y.atan2(x).to_degrees()
}

/// Weighted principal axes of a point cloud.
///
/// Returns the weighted centroid and a proper rotation whose rows are the
/// axes of largest to smallest spread. Applying the rotation to
/// `p - centroid` expresses `p` in the principal frame.
pub fn principal_frame(points: &[Point3<f64>], weights: &[f64]) -> Option<(Point3<f64>, Rotation3<f64>)> {
    let total: f64 = weights.iter().sum();
    if points.is_empty() || points.len() != weights.len() || total <= 0.0 {
        return None;
    }
    let center = points
        .iter()
        .zip(weights)
        .fold(Vector3::zeros(), |acc, (p, w)| acc + p.coords * *w)
        / total;

    let mut covariance = Matrix3::zeros();
    for (p, w) in points.iter().zip(weights) {
        let d = p.coords - center;
        covariance += d * d.transpose() * *w;
    }
    covariance /= total;

    let eigen = SymmetricEigen::new(covariance);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

    let x = eigen.eigenvectors.column(order[0]).into_owned();
    let y = eigen.eigenvectors.column(order[1]).into_owned();
    let z = x.cross(&y);
    let axes = Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);
    Some((
        Point3::from(center),
        Rotation3::from_matrix_unchecked(axes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn centroid_of_empty_slice_is_none() {
        assert!(centroid(&[]).is_none());
        let c = centroid(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)]).unwrap();
        assert!((c - Point3::new(1.0, 2.0, 3.0)).norm() < EPS);
    }

    #[test]
    fn signed_volume_changes_sign_on_swap() {
        let a = Point3::origin();
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let d = Point3::new(0.0, 0.0, 1.0);
        assert!((signed_volume(&a, &b, &c, &d) - 1.0).abs() < EPS);
        assert!((signed_volume(&a, &c, &b, &d) + 1.0).abs() < EPS);
    }

    #[test]
    fn dihedral_distinguishes_cis_and_trans() {
        let b = Point3::new(0.0, 0.0, 0.0);
        let c = Point3::new(1.5, 0.0, 0.0);
        let a = Point3::new(-0.5, 1.0, 0.0);
        let cis = Point3::new(2.0, 1.0, 0.0);
        let trans = Point3::new(2.0, -1.0, 0.0);
        assert!(dihedral(&a, &b, &c, &cis).abs() < 1e-6);
        assert!((dihedral(&a, &b, &c, &trans).abs() - 180.0).abs() < 1e-6);
    }

    #[test]
    fn principal_frame_aligns_longest_axis_with_x() {
        let points: Vec<Point3<f64>> = (0..5)
            .map(|i| Point3::new(1.0, 2.0 + i as f64 * 2.0, 3.0 + (i % 2) as f64 * 0.1))
            .collect();
        let weights = vec![1.0; points.len()];
        let (center, rotation) = principal_frame(&points, &weights).unwrap();

        assert!((center.y - 6.0).abs() < EPS);
        let first = rotation * (points[0] - center);
        assert!(first.x.abs() > 3.9);
        assert!(first.y.abs() < 0.1);
        assert!((rotation.matrix().determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_from_axis_angle_uses_degrees() {
        let rot = rotation_from_axis_angle(&Vector3::z(), 90.0);
        let v = rot * Vector3::x();
        assert!((v - Vector3::y()).norm() < EPS);
    }
}
