use nalgebra::Point3;

use crate::canvas::Color;

/// Surface coloring. Materials are evaluated in the local space of the shape they're attached
/// to, so a pattern moves along with its shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Just a solid color.
    Solid { color: Color },

    /// Alternating cells of two colors. `scale` is the number of cells per unit length; cells are
    /// centered on the integer lattice of the scaled coordinates.
    Checkerboard {
        first: Color,
        second: Color,
        scale: f64,
    },
}

impl Material {
    pub fn solid(color: Color) -> Self {
        Material::Solid { color }
    }

    pub fn checkerboard(first: Color, second: Color, scale: f64) -> Self {
        Material::Checkerboard {
            first,
            second,
            scale,
        }
    }

    pub fn color_at(&self, point: &Point3<f64>) -> Color {
        match self {
            Material::Solid { color } => *color,

            Material::Checkerboard {
                first,
                second,
                scale,
            } => {
                // Round half up, so that cell boundaries fall at `n + 0.5` on every axis.
                let cell = |v: f64| (v * scale + 0.5).floor() as i64;
                let parity = (cell(point.x) + cell(point.y) + cell(point.z)).rem_euclid(2);
                if parity == 1 {
                    *first
                } else {
                    *second
                }
            }
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::solid(Color::white())
    }
}

#[test]
fn test_solid() {
    let mat = Material::solid(Color::red());
    assert_eq!(mat.color_at(&Point3::new(10., -3., 0.5)), Color::red());
}

#[test]
fn test_checkerboard() {
    let mat = Material::checkerboard(Color::black(), Color::white(), 1.0);
    assert_eq!(mat.color_at(&Point3::new(0., 0., 0.)), Color::white());
    assert_eq!(mat.color_at(&Point3::new(1., 0., 0.)), Color::black());
    assert_eq!(mat.color_at(&Point3::new(1., 1., 0.)), Color::white());
    assert_eq!(mat.color_at(&Point3::new(-1., 0., 0.)), Color::black());
    assert_eq!(mat.color_at(&Point3::new(-2., 1., 4.)), Color::black());
    assert_eq!(mat.color_at(&Point3::new(0.4, -0.4, 0.)), Color::white());
}

#[test]
fn test_checkerboard_scale() {
    let mat = Material::checkerboard(Color::black(), Color::white(), 2.0);
    assert_eq!(mat.color_at(&Point3::new(0.5, 0., 0.)), Color::black());
    assert_eq!(mat.color_at(&Point3::new(1.0, 0., 0.)), Color::white());
}
