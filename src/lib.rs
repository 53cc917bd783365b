//! Heightmap-to-mesh terrain generation and a small wgpu viewer.
//!
//! [`terrain`] turns a decoded grayscale image into a triangle-strip mesh:
//! one vertex per pixel and one strip per pair of adjacent rows. The other
//! modules upload and draw that mesh.

pub mod input;
pub mod renderer;
pub mod terrain;
pub mod ui;
