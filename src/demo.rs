//! Demo scenes rendered by the `sdmarch` binary.

use nalgebra::{Point3, Vector3};

use crate::{
    canvas::Color,
    geometry::Geometry,
    light::Light,
    material::Material,
    render::{Camera, Stage},
};

fn camera() -> Camera {
    Camera::new(
        Point3::new(0., 0., -5.),
        Point3::new(-4., 2.25, 5.),
        Point3::new(4., -2.25, 5.),
    )
}

fn light() -> Light {
    Light::point(Point3::new(-2., 2.7, -1.8), 7., 8., 0.35)
}

fn floor(height: f64) -> anyhow::Result<Geometry> {
    Geometry::plane(
        Vector3::y(),
        Material::checkerboard(Color::gray(0.8), Color::gray(0.4), 1.0),
    )
    .translate(Vector3::new(0., height, 0.))
    .build()
}

fn ball(center: Vector3<f64>, color: Color) -> anyhow::Result<Geometry> {
    Geometry::sphere(0.5, Material::solid(color))
        .translate(center)
        .build()
}

/// Three colored balls resting above a checkered floor.
pub fn spheres() -> anyhow::Result<Stage> {
    let geometry = Geometry::scene(vec![
        ball(Vector3::new(1.1, 0., 0.), Color::new(1., 0.2, 0.2))?,
        ball(Vector3::new(0., 0., -0.5), Color::new(0.2, 1., 0.2))?,
        ball(Vector3::new(-1.1, 0., 0.), Color::new(0.2, 0.2, 1.))?,
        floor(-0.3)?,
    ])
    .build()?;

    Ok(Stage {
        geometry,
        lights: vec![light()],
        camera: camera(),
    })
}

/// A cube folded into eight smaller copies of itself, `depth` times over.
pub fn fractal(depth: usize) -> anyhow::Result<Stage> {
    let mut cube = Geometry::cube(2., Material::solid(Color::new(0.9, 0.7, 0.3)));

    // Per level, a world point is folded into the positive octant, moved towards the copy at
    // (1, 1, 1), and doubled in size. Transforms run newest first, so register them backwards.
    for _ in 0..depth {
        cube = cube
            .scale(0.5)
            .translate(Vector3::new(1., 1., 1.))
            .mirror_on_plane(Point3::origin(), -Vector3::x())
            .mirror_on_plane(Point3::origin(), -Vector3::y())
            .mirror_on_plane(Point3::origin(), -Vector3::z());
    }

    let cube = cube
        .scale(0.6)
        .rotate_x(0.5)
        .rotate_y(0.7)
        .translate(Vector3::new(0., 0.3, 0.))
        .build()?;

    let geometry = Geometry::scene(vec![cube, floor(-1.2)?]).build()?;

    Ok(Stage {
        geometry,
        lights: vec![light()],
        camera: camera(),
    })
}

/// An endless field of small balls sitting on the floor.
pub fn grid() -> anyhow::Result<Stage> {
    let balls = Geometry::sphere(0.3, Material::solid(Color::new(0.3, 0.6, 1.)))
        .grid(Vector3::new(1.5, 1.0e6, 1.5))
        .build()?;

    let geometry = Geometry::scene(vec![balls, floor(-0.3)?]).build()?;

    Ok(Stage {
        geometry,
        lights: vec![Light::point(Point3::new(-2., 3., -3.), 4., 12., 0.6)],
        camera: camera(),
    })
}
