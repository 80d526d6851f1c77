use std::path::Path;

use anyhow::Context;

use crate::math::Mix;

/// An additive RGB color. Channels are nominally in `[0, 1]`, but intermediate sums may leave
/// that range until [`Color::clamp`] is applied.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// A buffer of color data, with the top-left being `(0,0)`.
pub struct Canvas {
    width: u32,
    height: u32,
    buffer: Vec<Color>,
}

impl Color {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// A gray with all three channels set to `value`.
    pub fn gray(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn black() -> Self {
        Self::gray(0.)
    }

    pub fn is_black(&self) -> bool {
        self.r == 0. && self.g == 0. && self.b == 0.
    }

    pub fn white() -> Self {
        Self::gray(1.)
    }

    pub fn red() -> Self {
        Self::new(1., 0., 0.)
    }

    pub fn green() -> Self {
        Self::new(0., 1., 0.)
    }

    pub fn blue() -> Self {
        Self::new(0., 0., 1.)
    }

    /// A display-safe copy with every channel clamped into `[0, 1]`.
    pub fn clamp(&self) -> Self {
        Self::new(
            self.r.clamp(0., 1.),
            self.g.clamp(0., 1.),
            self.b.clamp(0., 1.),
        )
    }

    pub fn to_u8(&self) -> [u8; 3] {
        let convert = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        [convert(self.r), convert(self.g), convert(self.b)]
    }
}

impl Mix for &Color {
    type Output = Color;

    #[inline]
    fn mix(self, other: Self, t: f64) -> Color {
        Color::new(
            self.r.mix(other.r, t),
            self.g.mix(other.g, t),
            self.b.mix(other.b, t),
        )
    }
}

impl std::ops::Mul<f64> for Color {
    type Output = Color;
    fn mul(self, rhs: f64) -> Self::Output {
        Color::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl std::ops::Mul<Color> for f64 {
    type Output = Color;
    fn mul(self, rhs: Color) -> Self::Output {
        rhs * self
    }
}

impl std::ops::Add for Color {
    type Output = Color;
    fn add(mut self, rhs: Color) -> Self::Output {
        self += rhs;
        self
    }
}

impl std::ops::AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl Canvas {
    /// Construct a new [`Canvas`].
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        let mut buffer = Vec::with_capacity(size);
        buffer.resize_with(size, Default::default);
        Self {
            width,
            height,
            buffer,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (self.width as usize) * (y as usize) + (x as usize)
    }

    /// Mutate a color in the [`Canvas`].
    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut Color {
        let ix = self.index(x, y);
        &mut self.buffer[ix]
    }

    /// Fetch a color in the [`Canvas`].
    pub fn get(&self, x: u32, y: u32) -> &Color {
        &self.buffer[self.index(x, y)]
    }

    /// Iterate over the `(x, y)` coordinates of the canvas in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = (u32, u32)> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    pub fn pixels(&self) -> impl Iterator<Item = &Color> {
        self.buffer.iter()
    }

    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut Color> {
        self.buffer.iter_mut()
    }

    /// Copy the contents of `other` into this canvas, with its top-left corner at
    /// `(offset_x, offset_y)`. Pixels falling outside this canvas are dropped.
    pub fn blit(&mut self, offset_x: u32, offset_y: u32, other: &Canvas) {
        for ((x, y), color) in other.coords().zip(other.pixels()) {
            let (x, y) = (x + offset_x, y + offset_y);
            if x < self.width && y < self.height {
                *self.get_mut(x, y) = *color;
            }
        }
    }

    /// Return raw image RGB8 data for the image, clamping every pixel into display range.
    pub fn data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.buffer.len() * 3);
        for color in &self.buffer {
            data.extend_from_slice(&color.to_u8())
        }
        data
    }

    /// Write the canvas out as a PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        image::save_buffer_with_format(
            path,
            &self.data(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("failed to write `{}`", path.display()))
    }
}
