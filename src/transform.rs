use nalgebra::{Matrix3, Point3, Vector3};
use smallvec::SmallVec;

use crate::math::{self, PointExt};

/// A single spatial transformation, expressed as the mapping from a world point to the local
/// point it corresponds to.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Move the local origin to `offset`.
    Translate { offset: Vector3<f64> },

    /// Uniformly scale space by `factor`.
    Scale { factor: f64 },

    /// Apply a linear map, usually a rotation, to the point.
    Rotate { matrix: Matrix3<f64> },

    /// Fold everything on the positive side of the plane back onto the negative side. The normal
    /// is unit length, or zero for a fold that leaves every point in place.
    Mirror {
        origin: Point3<f64>,
        normal: Vector3<f64>,
    },

    /// Repeat space periodically with the given cell size on each axis, centered at zero.
    Grid { size: Vector3<f64> },
}

impl Transform {
    /// Map a world point into the local frame of this transform.
    pub fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        match self {
            Transform::Translate { offset } => p - offset,

            Transform::Scale { factor } => p / *factor,

            Transform::Rotate { matrix } => Point3::from(matrix * p.coords),

            Transform::Mirror { origin, normal } => {
                let d = (p - origin).dot(normal);
                p - normal * (d + d.abs())
            }

            Transform::Grid { size } => {
                let half = size / 2.;
                (p + half).floor_mod(size) - half
            }
        }
    }

    /// The factor this transform contributes to the distance-scaling of a geometry.
    pub fn distance_scale(&self) -> f64 {
        match self {
            Transform::Scale { factor } => *factor,
            _ => 1.0,
        }
    }
}

/// An ordered list of transforms and the distance-scaling factor they accumulate.
///
/// Transforms are applied in reverse registration order when mapping from world to local space,
/// so the transform added last is applied first.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStack {
    transforms: SmallVec<[Transform; 4]>,
    scale_factor: f64,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            transforms: SmallVec::new(),
            scale_factor: 1.0,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Register an arbitrary transform.
    pub fn push(mut self, transform: Transform) -> Self {
        self.scale_factor *= transform.distance_scale();
        self.transforms.push(transform);
        self
    }

    /// Append a translation to this stack.
    pub fn translate(self, offset: Vector3<f64>) -> Self {
        self.push(Transform::Translate { offset })
    }

    /// Append a uniform scaling to this stack.
    pub fn scale(self, factor: f64) -> Self {
        self.push(Transform::Scale { factor })
    }

    pub fn rotate_x(self, angle: f64) -> Self {
        self.push(Transform::Rotate {
            matrix: math::rotation_x(angle),
        })
    }

    pub fn rotate_y(self, angle: f64) -> Self {
        self.push(Transform::Rotate {
            matrix: math::rotation_y(angle),
        })
    }

    pub fn rotate_z(self, angle: f64) -> Self {
        self.push(Transform::Rotate {
            matrix: math::rotation_z(angle),
        })
    }

    /// Append a fold across the plane through `origin` with the given `normal`. The normal need
    /// not be unit length. A zero normal folds nothing.
    pub fn mirror_on_plane(self, origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        self.push(Transform::Mirror {
            origin,
            normal: normal.normalize_or_zero(),
        })
    }

    /// Append an infinite repetition of space with the given cell size.
    pub fn grid(self, size: Vector3<f64>) -> Self {
        self.push(Transform::Grid { size })
    }

    /// Map a world point into local space by applying every transform, newest first.
    pub fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        self.transforms
            .iter()
            .rev()
            .fold(*p, |acc, transform| transform.to_local(&acc))
    }

    /// Convert a distance measured in local space back into world space.
    #[inline]
    pub fn to_world_distance(&self, distance: f64) -> f64 {
        distance * self.scale_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_translate() {
        let t = TransformStack::new().translate(Vector3::new(1., 2., 3.));
        assert_eq!(t.to_local(&Point3::new(1., 2., 3.)), Point3::origin());
        assert_eq!(t.scale_factor(), 1.0);
    }

    #[test]
    fn test_scaling() {
        let t = TransformStack::new().scale(4.0);
        assert_eq!(t.to_local(&Point3::new(4., 8., -4.)), Point3::new(1., 2., -1.));
        assert_eq!(t.to_world_distance(0.5), 2.0);
    }

    #[test]
    fn test_scale_composition() {
        let p = Point3::new(3., -1.5, 12.);
        let twice = TransformStack::new().scale(2.0).scale(3.0);
        let once = TransformStack::new().scale(6.0);
        assert_abs_diff_eq!(twice.to_local(&p), once.to_local(&p), epsilon = 1e-12);
        assert_abs_diff_eq!(twice.scale_factor(), once.scale_factor(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation() {
        let t = TransformStack::new().rotate_z(FRAC_PI_2);
        assert_abs_diff_eq!(
            t.to_local(&Point3::new(1., 0., 0.)),
            Point3::new(0., 1., 0.),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_mirror_near_side_unchanged() {
        let t = TransformStack::new().mirror_on_plane(Point3::origin(), Vector3::new(0., 2., 0.));
        let p = Point3::new(0.3, -1.0, 2.0);
        assert_eq!(t.to_local(&p), p);

        let on_plane = Point3::new(5., 0., 5.);
        assert_eq!(t.to_local(&on_plane), on_plane);
    }

    #[test]
    fn test_mirror_far_side_reflected() {
        let origin = Point3::new(0., 1., 0.);
        let t = TransformStack::new().mirror_on_plane(origin, Vector3::new(0., 1., 0.));
        let local = t.to_local(&Point3::new(2., 3.5, -1.));
        assert_abs_diff_eq!(local, Point3::new(2., -1.5, -1.), epsilon = 1e-12);

        // The signed distance flips sign.
        assert_abs_diff_eq!((local - origin).y, -2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_grid() {
        let t = TransformStack::new().grid(Vector3::new(2., 2., 2.));
        assert_abs_diff_eq!(
            t.to_local(&Point3::new(4.5, -3.5, 0.25)),
            Point3::new(0.5, 0.5, 0.25),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            t.to_local(&Point3::new(-0.9, 0.9, 10.)),
            Point3::new(-0.9, 0.9, 0.),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_reverse_order() {
        // The scale was added last, so it applies before the translation.
        let t = TransformStack::new()
            .translate(Vector3::new(1., 0., 0.))
            .scale(2.0);
        assert_abs_diff_eq!(
            t.to_local(&Point3::new(4., 0., 0.)),
            Point3::new(1., 0., 0.),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_mirror_zero_normal_is_identity() {
        let t = TransformStack::new().mirror_on_plane(Point3::new(1., 2., 3.), Vector3::zeros());
        for p in [Point3::new(0., 0., -5.), Point3::new(4., -2., 7.5)] {
            let local = t.to_local(&p);
            assert!(!local.x.is_nan());
            assert_eq!(local, p);
        }
    }
}
