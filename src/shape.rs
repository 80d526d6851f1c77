use nalgebra::{Point3, Vector3};

use crate::material::Material;

/// Primitive shapes, centered at the origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Prim {
    /// A sphere with the given radius.
    Sphere { radius: f64 },

    /// A zero-thickness, double-sided plane through the origin. The normal is unit length, or
    /// zero for a degenerate plane that every point lies on.
    Plane { normal: Vector3<f64> },

    /// An axis-aligned cube with the given side length.
    Cube { side: f64 },
}

impl Prim {
    /// Compute the unscaled distance from a local-space point to the primitive. Distances are
    /// never negative: points inside a solid report zero.
    pub fn sdf(&self, p: &Point3<f64>) -> f64 {
        match self {
            Prim::Sphere { radius } => (p.coords.norm() - radius).max(0.0),

            Prim::Plane { normal } => p.coords.dot(normal).abs(),

            // The max of the per-axis slab distances. Exact outside the faces but it
            // underestimates near edges and corners, which the marcher tolerates.
            Prim::Cube { side } => {
                let half = side / 2.;
                let a = p.coords.abs();
                (a.x - half).max(a.y - half).max(a.z - half).max(0.0)
            }
        }
    }
}

/// A leaf of the scene: a primitive with a material.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub prim: Prim,
    pub material: Material,
}

impl Shape {
    pub fn new(prim: Prim, material: Material) -> Self {
        Self { prim, material }
    }
}
