use anyhow::bail;
use nalgebra::{Point3, Vector3};

use crate::{
    material::Material,
    math::PointExt,
    shape::{Prim, Shape},
    transform::{Transform, TransformStack},
};

/// A node of the scene graph together with the transforms that position it.
///
/// Geometry is only constructed through [`GeometryBuilder`], and is immutable afterwards. This
/// makes it safe to query from any number of threads at once.
#[derive(Debug, Clone)]
pub struct Geometry {
    transform: TransformStack,
    node: Node,
}

#[derive(Debug, Clone)]
pub enum Node {
    /// A single shape.
    Shape(Shape),

    /// The union of several geometries, where the nearest surface wins.
    Scene(Children),
}

/// The children of a scene. There is always at least one.
#[derive(Debug, Clone)]
pub struct Children {
    head: Box<Geometry>,
    tail: Vec<Geometry>,
}

impl Children {
    pub fn iter(&self) -> impl Iterator<Item = &Geometry> {
        std::iter::once(self.head.as_ref()).chain(self.tail.iter())
    }
}

/// The distance to the nearest surface, and the shape that surface belongs to.
#[derive(Debug, Clone, Copy)]
pub struct EstimatedDistance<'a> {
    pub distance: f64,
    pub shape: &'a Shape,
}

/// A world point expressed in the local frame of a particular shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    /// The point in the shape's local space.
    pub point: Point3<f64>,

    /// The product of every scale applied between world space and the shape.
    pub scale: f64,
}

impl Geometry {
    pub fn shape(shape: Shape) -> GeometryBuilder {
        GeometryBuilder::new(Pending::Shape(shape))
    }

    /// A sphere of the given radius, centered at the origin.
    pub fn sphere(radius: f64, material: Material) -> GeometryBuilder {
        Self::shape(Shape::new(Prim::Sphere { radius }, material))
    }

    /// A plane through the origin, oriented by `normal`. A zero normal gives a plane at distance
    /// zero from everything.
    pub fn plane(normal: Vector3<f64>, material: Material) -> GeometryBuilder {
        Self::shape(Shape::new(
            Prim::Plane {
                normal: normal.normalize_or_zero(),
            },
            material,
        ))
    }

    /// An axis-aligned cube with the given side length, centered at the origin.
    pub fn cube(side: f64, material: Material) -> GeometryBuilder {
        Self::shape(Shape::new(Prim::Cube { side }, material))
    }

    /// The union of `children`.
    pub fn scene(children: Vec<Geometry>) -> GeometryBuilder {
        GeometryBuilder::new(Pending::Scene(children))
    }

    pub fn transform(&self) -> &TransformStack {
        &self.transform
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Estimate the distance from a world-space point to the nearest surface of this geometry.
    pub fn estimate_distance(&self, p: &Point3<f64>) -> EstimatedDistance<'_> {
        let local = self.transform.to_local(p);
        let mut res = self.estimate_local(&local);
        res.distance = self.transform.to_world_distance(res.distance);
        res
    }

    fn estimate_local(&self, p: &Point3<f64>) -> EstimatedDistance<'_> {
        match &self.node {
            Node::Shape(shape) => EstimatedDistance {
                distance: shape.prim.sdf(p),
                shape,
            },

            Node::Scene(children) => {
                let first = children.head.estimate_distance(p);
                children.tail.iter().fold(first, |acc, child| {
                    let res = child.estimate_distance(p);
                    if res.distance < acc.distance {
                        res
                    } else {
                        acc
                    }
                })
            }
        }
    }

    /// Find `shape` in this geometry and map the world point `p` into its local frame, applying
    /// every transform on the path from here down to the shape. Returns `None` when `shape` is
    /// not part of this geometry.
    pub fn locate(&self, shape: &Shape, p: &Point3<f64>) -> Option<Located> {
        let local = self.transform.to_local(p);
        let scale = self.transform.scale_factor();
        match &self.node {
            Node::Shape(own) => std::ptr::eq(own, shape).then_some(Located {
                point: local,
                scale,
            }),

            Node::Scene(children) => children
                .iter()
                .find_map(|child| child.locate(shape, &local))
                .map(|found| Located {
                    point: found.point,
                    scale: found.scale * scale,
                }),
        }
    }

    /// The world-space distance from `p` to `shape` alone, ignoring every other shape in the
    /// geometry.
    pub fn shape_distance(&self, shape: &Shape, p: &Point3<f64>) -> Option<f64> {
        self.locate(shape, p)
            .map(|found| shape.prim.sdf(&found.point) * found.scale)
    }

    /// The number of shapes in this geometry.
    pub fn shape_count(&self) -> usize {
        match &self.node {
            Node::Shape(_) => 1,
            Node::Scene(children) => children.iter().map(Geometry::shape_count).sum(),
        }
    }
}

enum Pending {
    Shape(Shape),
    Scene(Vec<Geometry>),
}

/// Accumulates transforms for a shape or scene, and produces the immutable [`Geometry`].
pub struct GeometryBuilder {
    transform: TransformStack,
    node: Pending,
}

impl GeometryBuilder {
    fn new(node: Pending) -> Self {
        Self {
            transform: TransformStack::new(),
            node,
        }
    }

    /// Register an arbitrary transform.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = self.transform.push(transform);
        self
    }

    pub fn translate(mut self, offset: Vector3<f64>) -> Self {
        self.transform = self.transform.translate(offset);
        self
    }

    pub fn scale(mut self, factor: f64) -> Self {
        self.transform = self.transform.scale(factor);
        self
    }

    pub fn rotate_x(mut self, angle: f64) -> Self {
        self.transform = self.transform.rotate_x(angle);
        self
    }

    pub fn rotate_y(mut self, angle: f64) -> Self {
        self.transform = self.transform.rotate_y(angle);
        self
    }

    pub fn rotate_z(mut self, angle: f64) -> Self {
        self.transform = self.transform.rotate_z(angle);
        self
    }

    pub fn mirror_on_plane(mut self, origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        self.transform = self.transform.mirror_on_plane(origin, normal);
        self
    }

    pub fn grid(mut self, size: Vector3<f64>) -> Self {
        self.transform = self.transform.grid(size);
        self
    }

    /// Finish construction. Fails if this is a scene without children.
    pub fn build(self) -> anyhow::Result<Geometry> {
        let node = match self.node {
            Pending::Shape(shape) => Node::Shape(shape),
            Pending::Scene(children) => {
                let mut children = children.into_iter();
                let Some(head) = children.next() else {
                    bail!("cannot estimate distance of empty scene");
                };
                let tail: Vec<_> = children.collect();
                log::debug!("built scene with {} children", tail.len() + 1);
                Node::Scene(Children {
                    head: Box::new(head),
                    tail,
                })
            }
        };

        Ok(Geometry {
            transform: self.transform,
            node,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Color;
    use approx::assert_abs_diff_eq;

    fn sphere_at(center: Vector3<f64>, radius: f64) -> Geometry {
        Geometry::sphere(radius, Material::default())
            .translate(center)
            .build()
            .unwrap()
    }

    #[test]
    fn test_geometry_is_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Geometry>();
    }

    #[test]
    fn test_empty_scene_fails() {
        assert!(Geometry::scene(vec![]).build().is_err());
    }

    #[test]
    fn test_translated_sphere() {
        let center = Vector3::new(1., -2., 0.5);
        let sphere = sphere_at(center, 0.75);
        for p in [
            Point3::new(0., 0., 0.),
            Point3::new(5., 5., 5.),
            Point3::new(1., -2., 0.5),
            Point3::new(1.75, -2., 0.5),
        ] {
            let expected = ((p.coords - center).norm() - 0.75).max(0.0);
            assert_abs_diff_eq!(sphere.estimate_distance(&p).distance, expected, epsilon = 1e-12);
        }
        assert_eq!(
            sphere
                .estimate_distance(&Point3::new(1.75, -2., 0.5))
                .distance,
            0.0
        );
    }

    #[test]
    fn test_plane_with_origin() {
        let plane = Geometry::plane(Vector3::new(1., 1., 0.), Material::default())
            .translate(Vector3::new(0., -1., 0.))
            .build()
            .unwrap();
        let n = Vector3::new(1., 1., 0.).normalize();
        let origin = Point3::new(0., -1., 0.);
        for p in [Point3::new(3., 2., 1.), Point3::new(-3., -4., 1.)] {
            assert_abs_diff_eq!(
                plane.estimate_distance(&p).distance,
                (p - origin).dot(&n).abs(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_plane_zero_normal() {
        let plane = Geometry::plane(Vector3::zeros(), Material::default())
            .build()
            .unwrap();
        let distance = plane.estimate_distance(&Point3::new(1., 2., 3.)).distance;
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_zero_normal_mirror_does_not_fold() {
        let folded = Geometry::sphere(1.0, Material::default())
            .mirror_on_plane(Point3::origin(), Vector3::zeros())
            .build()
            .unwrap();
        let scene = Geometry::scene(vec![folded, sphere_at(Vector3::new(0., 3., 0.), 1.0)])
            .build()
            .unwrap();

        let start = Point3::new(0., 0., -5.);
        assert_abs_diff_eq!(scene.estimate_distance(&start).distance, 4.0, epsilon = 1e-12);

        let res = crate::march::march(
            &crate::march::MarchConfig::default(),
            &scene,
            &start,
            &Vector3::z(),
        );
        let hit = res.hit().expect("intersection");
        assert_abs_diff_eq!(hit.point, Point3::new(0., 0., -1.), epsilon = 0.01);
    }

    #[test]
    fn test_scale_corrects_distance() {
        let sphere = Geometry::sphere(1.0, Material::default())
            .scale(3.0)
            .build()
            .unwrap();
        assert_abs_diff_eq!(
            sphere.estimate_distance(&Point3::new(0., 5., 0.)).distance,
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_scene_picks_nearest() {
        let scene = Geometry::scene(vec![
            sphere_at(Vector3::new(-2., 0., 0.), 1.0),
            sphere_at(Vector3::new(3., 0., 0.), 1.0),
        ])
        .build()
        .unwrap();

        let Node::Scene(children) = scene.node() else {
            panic!("expected a scene");
        };
        let shapes: Vec<&Shape> = children
            .iter()
            .map(|child| match child.node() {
                Node::Shape(shape) => shape,
                Node::Scene(_) => unreachable!(),
            })
            .collect();

        let left = scene.estimate_distance(&Point3::new(-0.5, 0., 0.));
        assert_abs_diff_eq!(left.distance, 0.5, epsilon = 1e-12);
        assert!(std::ptr::eq(left.shape, shapes[0]));

        let right = scene.estimate_distance(&Point3::new(1.5, 0., 0.));
        assert_abs_diff_eq!(right.distance, 0.5, epsilon = 1e-12);
        assert!(std::ptr::eq(right.shape, shapes[1]));
    }

    #[test]
    fn test_nested_scene_locate() {
        let red = Geometry::sphere(1.0, Material::solid(Color::red()))
            .translate(Vector3::new(1., 0., 0.))
            .build()
            .unwrap();
        let inner = Geometry::scene(vec![red]).scale(2.0).build().unwrap();
        let blue = sphere_at(Vector3::new(0., 10., 0.), 1.0);
        let root = Geometry::scene(vec![blue, inner])
            .translate(Vector3::new(0., 0., 5.))
            .build()
            .unwrap();

        assert_eq!(root.shape_count(), 2);

        // The red sphere is centered at (2, 0, 5) with radius 2 in world space.
        let p = Point3::new(2., 0., 1.);
        let res = root.estimate_distance(&p);
        assert_eq!(res.shape.material, Material::solid(Color::red()));
        assert_abs_diff_eq!(res.distance, 2.0, epsilon = 1e-12);

        let found = root.locate(res.shape, &p).unwrap();
        assert_abs_diff_eq!(found.point, Point3::new(0., 0., -2.), epsilon = 1e-12);
        assert_eq!(found.scale, 2.0);
        assert_abs_diff_eq!(root.shape_distance(res.shape, &p).unwrap(), 2.0, epsilon = 1e-12);

        let stranger = Shape::new(Prim::Sphere { radius: 1.0 }, Material::default());
        assert!(root.locate(&stranger, &p).is_none());
    }
}
