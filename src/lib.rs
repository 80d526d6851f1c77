pub mod canvas;
pub mod demo;
pub mod geometry;
pub mod light;
pub mod march;
pub mod material;
pub mod math;
pub mod render;
pub mod shape;
pub mod transform;
