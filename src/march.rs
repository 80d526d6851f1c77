use nalgebra::{Point3, Vector3};

use crate::{
    canvas::Color,
    geometry::Geometry,
    math::PointExt,
    shape::Shape,
};

#[derive(Debug, Clone)]
pub struct MarchConfig {
    /// A ray that travels this far from its start without hitting anything is a miss.
    pub max_distance: f64,

    /// A step whose distance estimate is at or below this value registers a hit.
    pub hit_distance: f64,

    /// When positive, the first step has exactly this length instead of the estimated distance.
    /// Used to leave the surface a ray starts on.
    pub min_first_step: f64,

    /// Marches that take more steps than this are reported as misses.
    pub max_steps: u32,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.,
            hit_distance: 0.01,
            min_first_step: 0.,
            max_steps: 1000,
        }
    }
}

impl MarchConfig {
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_hit_distance(mut self, hit_distance: f64) -> Self {
        self.hit_distance = hit_distance;
        self
    }

    pub fn with_min_first_step(mut self, min_first_step: f64) -> Self {
        self.min_first_step = min_first_step;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Information about a ray hit with scene geometry.
#[derive(Debug, Clone)]
pub struct Hit<'a> {
    /// The world-space point where the march stopped.
    pub point: Point3<f64>,

    /// The estimated surface normal at the hit, in world space.
    pub normal: Vector3<f64>,

    /// The shape that was hit.
    pub shape: &'a Shape,

    /// The hit point in the local space of `shape`.
    pub local_point: Point3<f64>,

    /// The number of steps taken.
    pub steps: u32,

    /// The smallest step taken.
    pub min_estimate: f64,

    /// The largest step taken.
    pub max_estimate: f64,
}

impl Hit<'_> {
    /// The color of the hit shape's material at the hit point.
    pub fn color(&self) -> Color {
        self.shape.material.color_at(&self.local_point)
    }
}

/// Statistics about a ray that didn't hit anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Miss {
    pub steps: u32,
    pub min_estimate: f64,
    pub max_estimate: f64,
}

#[derive(Debug, Clone)]
pub enum MarchResult<'a> {
    Hit(Hit<'a>),
    Miss(Miss),
}

impl<'a> MarchResult<'a> {
    pub fn hit(&self) -> Option<&Hit<'a>> {
        match self {
            MarchResult::Hit(hit) => Some(hit),
            MarchResult::Miss(_) => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, MarchResult::Hit(_))
    }

    /// The number of steps the march took, whether it hit or not.
    pub fn steps(&self) -> u32 {
        match self {
            MarchResult::Hit(hit) => hit.steps,
            MarchResult::Miss(miss) => miss.steps,
        }
    }
}

/// March a ray from `start` along `direction` until it comes within `config.hit_distance` of a
/// surface in `geometry`, travels `config.max_distance` away from `start`, or runs out of steps.
pub fn march<'a>(
    config: &MarchConfig,
    geometry: &'a Geometry,
    start: &Point3<f64>,
    direction: &Vector3<f64>,
) -> MarchResult<'a> {
    let direction = direction.normalize_or_zero();
    let mut position = *start;
    let mut min_estimate = f64::INFINITY;
    let mut max_estimate = 0.0f64;

    for step in 1..=config.max_steps {
        let estimate = geometry.estimate_distance(&position);
        let distance = if step == 1 && config.min_first_step > 0. {
            config.min_first_step
        } else {
            estimate.distance
        };

        min_estimate = min_estimate.min(distance);
        max_estimate = max_estimate.max(distance);
        position += direction * distance;

        if position.coords.metric_distance(&start.coords) >= config.max_distance {
            return MarchResult::Miss(Miss {
                steps: step,
                min_estimate,
                max_estimate,
            });
        }

        if distance <= config.hit_distance {
            let shape = estimate.shape;
            return MarchResult::Hit(Hit {
                point: position,
                normal: estimate_normal(config, geometry, shape, &position, &direction),
                shape,
                local_point: geometry
                    .locate(shape, &position)
                    .map_or(position, |found| found.point),
                steps: step,
                min_estimate,
                max_estimate,
            });
        }
    }

    log::trace!(
        "march from {:?} exhausted {} steps",
        start,
        config.max_steps
    );

    MarchResult::Miss(Miss {
        steps: config.max_steps,
        min_estimate,
        max_estimate,
    })
}

/// Compute the normal by central differences of the hit shape's distance field, probed around a
/// point pulled back from the surface along the ray.
fn estimate_normal(
    config: &MarchConfig,
    geometry: &Geometry,
    shape: &Shape,
    hit: &Point3<f64>,
    direction: &Vector3<f64>,
) -> Vector3<f64> {
    let probe = hit - direction * config.hit_distance;
    let offset = config.hit_distance / 2.;

    let sample = |delta: Vector3<f64>| {
        let p = probe + delta * offset;
        geometry
            .shape_distance(shape, &p)
            .unwrap_or_else(|| geometry.estimate_distance(&p).distance)
    };

    let dx = sample(Vector3::x()) - sample(-Vector3::x());
    let dy = sample(Vector3::y()) - sample(-Vector3::y());
    let dz = sample(Vector3::z()) - sample(-Vector3::z());

    Vector3::new(dx, dy, dz).normalize_or_zero()
}
