use nalgebra::{Matrix3, Point3, Vector3};

pub trait Mix {
    type Output;

    fn mix(self, b: Self, t: f64) -> Self::Output;
}

impl Mix for f64 {
    type Output = f64;

    #[inline]
    fn mix(self, y: f64, t: f64) -> f64 {
        self * (1.0 - t) + y * t
    }
}

/// Operations on points and vectors that nalgebra doesn't provide directly.
pub trait PointExt: Sized {
    /// Normalize, mapping the zero vector to itself instead of dividing by zero.
    fn normalize_or_zero(&self) -> Self;

    /// Component-wise floor modulo. For positive moduli every component of the result lies in
    /// `[0, modulus)`, regardless of the sign of the input.
    fn floor_mod(&self, modulus: &Vector3<f64>) -> Self;
}

#[inline]
fn floor_mod(x: f64, m: f64) -> f64 {
    (x % m + m) % m
}

impl PointExt for Vector3<f64> {
    #[inline]
    fn normalize_or_zero(&self) -> Self {
        self.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
    }

    #[inline]
    fn floor_mod(&self, modulus: &Vector3<f64>) -> Self {
        Vector3::new(
            floor_mod(self.x, modulus.x),
            floor_mod(self.y, modulus.y),
            floor_mod(self.z, modulus.z),
        )
    }
}

impl PointExt for Point3<f64> {
    #[inline]
    fn normalize_or_zero(&self) -> Self {
        Point3::from(self.coords.normalize_or_zero())
    }

    #[inline]
    fn floor_mod(&self, modulus: &Vector3<f64>) -> Self {
        Point3::from(self.coords.floor_mod(modulus))
    }
}

/// Rotation about the x axis by `angle` radians.
pub fn rotation_x(angle: f64) -> Matrix3<f64> {
    let (sin, cos) = angle.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, cos, -sin, //
        0.0, sin, cos,
    )
}

/// Rotation about the y axis by `angle` radians.
pub fn rotation_y(angle: f64) -> Matrix3<f64> {
    let (sin, cos) = angle.sin_cos();
    Matrix3::new(
        cos, 0.0, sin, //
        0.0, 1.0, 0.0, //
        -sin, 0.0, cos,
    )
}

/// Rotation about the z axis by `angle` radians.
pub fn rotation_z(angle: f64) -> Matrix3<f64> {
    let (sin, cos) = angle.sin_cos();
    Matrix3::new(
        cos, -sin, 0.0, //
        sin, cos, 0.0, //
        0.0, 0.0, 1.0,
    )
}
