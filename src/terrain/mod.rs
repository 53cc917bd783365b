//! Heightmap images and terrain mesh generation.
//!
//! This module provides:
//! - [`HeightmapImage`] - Decoded grayscale (or multi-channel) pixel data
//! - [`load_heightmap`] - Image file decoding
//! - [`TerrainMesh`] - Triangle-strip mesh generation

pub mod colors;
pub mod loader;
pub mod mesh;

pub use colors::ColorScheme;
pub use loader::{decode_heightmap, load_heightmap, LoadError};
pub use mesh::{
    build_indices, build_restart_indices, build_vertices, build_vertices_with, DrawMode,
    ElevationMapping, MeshError, MeshOptions, StripLayout, TerrainMesh, Vertex, VertexGrid,
    RESTART_INDEX,
};

/// A decoded heightmap image.
///
/// Pixels are stored row-major with `channels` interleaved bytes each.
/// Channel 0 of every pixel is the elevation sample; any further channels
/// (colour, alpha) are carried along but ignored by mesh generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightmapImage {
    /// Number of columns
    pub width: u32,
    /// Number of rows
    pub height: u32,
    /// Bytes per pixel
    pub channels: u32,
    /// Raw pixel bytes, `width * height * channels` long when well formed
    pub data: Vec<u8>,
}

impl HeightmapImage {
    /// Wrap raw pixel bytes.
    ///
    /// No validation happens here; mesh generation rejects malformed
    /// buffers with [`MeshError::InvalidImageData`].
    ///
    /// # Example
    ///
    /// ```
    /// use heightmesh::terrain::HeightmapImage;
    ///
    /// let image = HeightmapImage::new(2, 2, 1, vec![0, 128, 255, 64]);
    /// assert_eq!(image.expected_len(), Some(4));
    /// assert_eq!(image.elevation(1, 0), Some(255));
    /// ```
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Single-channel image, one byte per pixel.
    pub fn from_luma(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::new(width, height, 1, data)
    }

    /// Buffer length implied by the declared dimensions, `None` if it
    /// does not fit in `usize`.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.channels as usize)
    }

    /// Whether the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.channels >= 1 && self.expected_len() == Some(self.data.len())
    }

    /// Elevation byte (channel 0) of the pixel at `row`, `col`.
    pub fn elevation(&self, row: u32, col: u32) -> Option<u8> {
        if row >= self.height || col >= self.width || self.channels == 0 {
            return None;
        }
        let offset = (self.width as usize)
            .checked_mul(row as usize)?
            .checked_add(col as usize)?
            .checked_mul(self.channels as usize)?;
        self.data.get(offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_len() {
        let image = HeightmapImage::new(4, 3, 3, vec![0; 36]);
        assert_eq!(image.expected_len(), Some(36));
        assert!(image.is_well_formed());
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let image = HeightmapImage::new(4, 3, 1, vec![0; 11]);
        assert!(!image.is_well_formed());
    }

    #[test]
    fn test_oversized_dimensions_are_malformed() {
        let image = HeightmapImage::new(1 << 22, 1 << 22, 1 << 20, vec![]);
        assert_eq!(image.expected_len(), None);
        assert!(!image.is_well_formed());
        assert_eq!(image.elevation(5, 5), None);
    }

    #[test]
    fn test_zero_channels_is_malformed() {
        let image = HeightmapImage::new(2, 2, 0, vec![]);
        assert!(!image.is_well_formed());
        assert_eq!(image.elevation(0, 0), None);
    }

    #[test]
    fn test_elevation_reads_first_channel() {
        // 2x1 RGB image: red channel carries the elevation
        let image = HeightmapImage::new(2, 1, 3, vec![10, 99, 99, 20, 99, 99]);
        assert_eq!(image.elevation(0, 0), Some(10));
        assert_eq!(image.elevation(0, 1), Some(20));
    }

    #[test]
    fn test_elevation_out_of_bounds() {
        let image = HeightmapImage::from_luma(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(image.elevation(2, 0), None);
        assert_eq!(image.elevation(0, 2), None);
        assert_eq!(image.elevation(1, 1), Some(4));
    }
}
