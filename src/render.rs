use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use anyhow::{anyhow, bail};
use crossbeam::{channel, thread};
use nalgebra::{Point3, Vector3};

use crate::{
    canvas::{Canvas, Color},
    geometry::Geometry,
    light::Light,
    march::{march, Hit, MarchConfig, MarchResult},
};

const TILE_SIZE: u32 = 16;

/// A pinhole camera looking through a rectangular window. The window is parallel to the xy plane,
/// and also acts as the far plane: rays stop once they pass through it.
#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Point3<f64>,
    pub upper_left: Point3<f64>,
    pub lower_right: Point3<f64>,
}

impl Camera {
    pub fn new(eye: Point3<f64>, upper_left: Point3<f64>, lower_right: Point3<f64>) -> Self {
        Self {
            eye,
            upper_left,
            lower_right,
        }
    }

    /// The point on the window for the film position `(fx, fy)`, where `(0, 0)` is the
    /// upper-left corner and `(width, height)` the lower-right.
    pub fn window_point(&self, fx: f64, fy: f64, width: u32, height: u32) -> Point3<f64> {
        let span = self.lower_right - self.upper_left;
        Point3::new(
            self.upper_left.x + span.x * fx / width as f64,
            self.upper_left.y + span.y * fy / height as f64,
            self.upper_left.z,
        )
    }

    /// The ray through the center of pixel `(x, y)`: its direction and how far it may travel.
    pub fn ray(&self, x: u32, y: u32, width: u32, height: u32) -> (Vector3<f64>, f64) {
        let target = self.window_point(x as f64 + 0.5, y as f64 + 0.5, width, height);
        let direction = target - self.eye;
        (direction, direction.norm())
    }
}

/// Everything needed to render one image.
#[derive(Debug, Clone)]
pub struct Stage {
    pub geometry: Geometry,
    pub lights: Vec<Light>,
    pub camera: Camera,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub threads: usize,

    /// Marching parameters for camera rays. The hit distance and step limit also apply to
    /// shadow rays.
    pub march: MarchConfig,

    /// Light added to every hit regardless of shadowing.
    pub ambient: f64,

    /// The color of rays that hit nothing.
    pub background: Color,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            threads: 1,
            march: MarchConfig::default(),
            ambient: 0.15,
            background: Color::black(),
        }
    }
}

/// A flag shared between a render and whoever may want to stop it early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Combine the lights' shadowed intensities with the ambient term and the surface color.
pub fn shade(settings: &RenderSettings, stage: &Stage, hit: &Hit) -> Color {
    let light: f64 = stage
        .lights
        .iter()
        .map(|light| {
            light.hard_shadowed_intensity_at(
                &settings.march,
                &stage.geometry,
                &hit.point,
                &hit.normal,
            )
        })
        .sum();
    (light + settings.ambient) * hit.color()
}

/// Compute the unclamped color of the pixel at `(x, y)`.
pub fn pixel_color(settings: &RenderSettings, stage: &Stage, x: u32, y: u32) -> Color {
    let (direction, max_distance) = stage.camera.ray(x, y, settings.width, settings.height);
    let config = settings.march.clone().with_max_distance(max_distance);
    match march(&config, &stage.geometry, &stage.camera.eye, &direction) {
        MarchResult::Hit(hit) => shade(settings, stage, &hit),
        MarchResult::Miss(_) => settings.background,
    }
}

/// A rectangle of the image rendered as one unit of work.
#[derive(Debug)]
struct Tile {
    offset_x: u32,
    offset_y: u32,
    width: u32,
    height: u32,
}

/// Cover a `width` by `height` image with tiles, row by row. Tiles on the right and bottom edges
/// are cut short to fit.
fn tiles(width: u32, height: u32) -> impl Iterator<Item = Tile> {
    (0..height)
        .step_by(TILE_SIZE as usize)
        .flat_map(move |offset_y| {
            (0..width)
                .step_by(TILE_SIZE as usize)
                .map(move |offset_x| Tile {
                    offset_x,
                    offset_y,
                    width: (width - offset_x).min(TILE_SIZE),
                    height: (height - offset_y).min(TILE_SIZE),
                })
        })
}

/// Render the stage on `settings.threads` worker threads. Fails if `cancel` is triggered before
/// every tile has been rendered.
pub fn render(
    settings: &RenderSettings,
    stage: &Stage,
    cancel: &CancelToken,
) -> anyhow::Result<Canvas> {
    let mut canvas = Canvas::new(settings.width, settings.height);
    let threads = settings.threads.max(1);
    let start = Instant::now();

    log::info!(
        "rendering {}x{} with {} threads",
        settings.width,
        settings.height,
        threads
    );

    let (input, queue) = channel::unbounded::<Tile>();
    let (results, chunks) = channel::unbounded();

    let expecting =
        (settings.width.div_ceil(TILE_SIZE) * settings.height.div_ceil(TILE_SIZE)) as usize;

    let received = thread::scope(|s| {
        for _ in 0..threads {
            let results = results.clone();
            let queue = queue.clone();
            s.spawn(move |_| {
                for tile in queue {
                    if cancel.is_cancelled() {
                        break;
                    }

                    let mut chunk = Canvas::new(tile.width, tile.height);
                    for ((x, y), pixel) in chunk.coords().zip(chunk.pixels_mut()) {
                        *pixel = pixel_color(settings, stage, x + tile.offset_x, y + tile.offset_y);
                    }

                    if results.send((tile.offset_x, tile.offset_y, chunk)).is_err() {
                        break;
                    }
                }
            });
        }

        // Only the workers hold result senders now, so the loop below ends when they all do.
        drop(results);

        s.spawn(move |_| {
            for tile in tiles(settings.width, settings.height) {
                if input.send(tile).is_err() {
                    break;
                }
            }
        });

        let mut received = 0;
        for (offset_x, offset_y, chunk) in chunks.iter().take(expecting) {
            canvas.blit(offset_x, offset_y, &chunk);
            received += 1;
        }
        received
    })
    .map_err(|_| anyhow!("a render worker panicked"))?;

    if received < expecting {
        log::warn!("render cancelled after {} of {} tiles", received, expecting);
        bail!("render cancelled");
    }

    log::info!("rendered in {:.2?}", start.elapsed());

    Ok(canvas)
}
