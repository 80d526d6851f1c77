use nalgebra::{Point3, Vector3};

use crate::{
    geometry::Geometry,
    march::{march, MarchConfig, MarchResult},
    math::PointExt,
};

/// How many scene hit distances a shadow ray skips on its first step, so that it doesn't hit the
/// surface it starts on.
const SHADOW_FIRST_STEP: f64 = 10.;

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// A light radiating from a single point, with linear falloff between `min_distance` and
    /// `max_distance`.
    Point {
        position: Point3<f64>,
        min_distance: f64,
        max_distance: f64,
        intensity: f64,
    },
}

impl Light {
    pub fn point(
        position: Point3<f64>,
        min_distance: f64,
        max_distance: f64,
        intensity: f64,
    ) -> Self {
        Light::Point {
            position,
            min_distance,
            max_distance,
            intensity,
        }
    }

    pub fn position(&self) -> &Point3<f64> {
        match self {
            Light::Point { position, .. } => position,
        }
    }

    /// The peak intensity of the light.
    pub fn intensity(&self) -> f64 {
        match self {
            Light::Point { intensity, .. } => *intensity,
        }
    }

    /// The (unnormalized) direction from `point` towards the light.
    pub fn direction_from(&self, point: &Point3<f64>) -> Vector3<f64> {
        match self {
            Light::Point { position, .. } => position - point,
        }
    }

    pub fn distance_from(&self, point: &Point3<f64>) -> f64 {
        match self {
            Light::Point { position, .. } => nalgebra::distance(position, point),
        }
    }

    /// The fraction of the light's intensity that remains after traveling `distance`: 1 up to the
    /// minimum distance, falling linearly to 0 at the maximum distance.
    pub fn attenuation(&self, distance: f64) -> f64 {
        match self {
            Light::Point {
                min_distance,
                max_distance,
                ..
            } => {
                let range = max_distance - min_distance;
                if range <= 0. {
                    if distance <= *min_distance {
                        1.
                    } else {
                        0.
                    }
                } else {
                    1. - ((distance - min_distance) / range).clamp(0., 1.)
                }
            }
        }
    }

    /// The intensity of this light arriving at `point` on a surface with the given `normal`. A
    /// shadow ray is marched towards the light using the scene's `config`; if it hits anything
    /// the point is fully in shadow.
    pub fn hard_shadowed_intensity_at(
        &self,
        config: &MarchConfig,
        geometry: &Geometry,
        point: &Point3<f64>,
        normal: &Vector3<f64>,
    ) -> f64 {
        let direction = self.direction_from(point);
        let distance = self.distance_from(point);

        let shadow = config
            .clone()
            .with_max_distance(distance)
            .with_min_first_step(config.hit_distance * SHADOW_FIRST_STEP);

        match march(&shadow, geometry, point, &direction) {
            MarchResult::Hit(_) => 0.,
            MarchResult::Miss(_) => {
                let lambert = normal.dot(&direction.normalize_or_zero());
                (self.intensity() * self.attenuation(distance) * lambert).max(0.)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use approx::assert_abs_diff_eq;

    fn floor() -> Geometry {
        Geometry::plane(Vector3::y(), Material::default())
            .build()
            .unwrap()
    }

    #[test]
    fn test_attenuation() {
        let light = Light::point(Point3::origin(), 2., 4., 1.);
        assert_eq!(light.attenuation(0.), 1.);
        assert_eq!(light.attenuation(2.), 1.);
        assert_eq!(light.attenuation(3.), 0.5);
        assert_eq!(light.attenuation(4.), 0.);
        assert_eq!(light.attenuation(10.), 0.);
    }

    #[test]
    fn test_degenerate_range() {
        let light = Light::point(Point3::origin(), 3., 3., 1.);
        assert_eq!(light.attenuation(3.), 1.);
        assert_eq!(light.attenuation(3.5), 0.);
    }

    #[test]
    fn test_unobstructed() {
        let light = Light::point(Point3::new(0., 2., 0.), 5., 10., 0.35);
        let intensity = light.hard_shadowed_intensity_at(
            &MarchConfig::default(),
            &floor(),
            &Point3::origin(),
            &Vector3::y(),
        );
        assert_abs_diff_eq!(intensity, 0.35, epsilon = 1e-12);
    }

    #[test]
    fn test_lambert_and_falloff() {
        let light = Light::point(Point3::new(2., 2., 0.), 0., 4., 1.);
        let intensity = light.hard_shadowed_intensity_at(
            &MarchConfig::default(),
            &floor(),
            &Point3::origin(),
            &Vector3::y(),
        );
        let distance = 8f64.sqrt();
        let expected = (1. - distance / 4.) * std::f64::consts::FRAC_1_SQRT_2;
        assert!(intensity > 0. && intensity < 1.);
        assert_abs_diff_eq!(intensity, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_facing_away_is_dark() {
        let light = Light::point(Point3::new(0., 2., 0.), 5., 10., 1.);
        let intensity = light.hard_shadowed_intensity_at(
            &MarchConfig::default(),
            &floor(),
            &Point3::origin(),
            &-Vector3::y(),
        );
        assert_eq!(intensity, 0.);
    }

    #[test]
    fn test_occluded() {
        let occluder = Geometry::sphere(3., Material::default())
            .translate(Vector3::new(0., 5., 0.))
            .build()
            .unwrap();
        let scene = Geometry::scene(vec![floor(), occluder]).build().unwrap();
        let light = Light::point(Point3::new(0., 10., 0.), 20., 30., 1.);
        let lit = Point3::origin();

        let shadowed =
            light.hard_shadowed_intensity_at(&MarchConfig::default(), &scene, &lit, &Vector3::y());
        assert_eq!(shadowed, 0.);

        let intensity = light.hard_shadowed_intensity_at(
            &MarchConfig::default(),
            &floor(),
            &lit,
            &Vector3::y(),
        );
        assert!(intensity > 0. && intensity <= light.intensity());
    }

    #[test]
    fn test_enclosed() {
        // A hollow shell around the light can't be modelled with solid spheres, so enclose the
        // lit point instead; the shadow ray starts inside and registers a hit at once.
        let shell = Geometry::sphere(4., Material::default()).build().unwrap();
        let light = Light::point(Point3::new(0., 10., 0.), 20., 30., 1.);
        let intensity = light.hard_shadowed_intensity_at(
            &MarchConfig::default(),
            &shell,
            &Point3::new(0., 1., 0.),
            &Vector3::y(),
        );
        assert_eq!(intensity, 0.);
    }
}
