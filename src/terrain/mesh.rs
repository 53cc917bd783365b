use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use super::colors::{height_to_color, ColorScheme};
use super::HeightmapImage;

/// Vertical scale applied to elevation bytes (64 units over the byte range).
pub const Y_SCALE: f32 = 64.0 / 256.0;
/// Vertical shift subtracted after scaling.
pub const Y_SHIFT: f32 = 16.0;
/// Primitive-restart sentinel for `u32` index buffers.
pub const RESTART_INDEX: u32 = u32::MAX;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error(
        "Image buffer holds {actual} bytes, expected {} ({channels} channel(s) per pixel)",
        .expected.map_or_else(|| "more than usize::MAX".to_string(), |n| n.to_string())
    )]
    InvalidImageData {
        /// `None` when the declared dimensions overflow `usize`
        expected: Option<usize>,
        actual: usize,
        channels: u32,
    },
    #[error("Cannot build triangle strips for a {width}x{height} grid")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Vertex data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }

    /// Layout of the separate per-vertex colour buffer bound at slot 1.
    pub fn color_desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Maps an elevation byte to a world-space height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationMapping {
    pub y_scale: f32,
    pub y_shift: f32,
}

impl ElevationMapping {
    pub fn apply(&self, sample: u8) -> f32 {
        sample as f32 * self.y_scale - self.y_shift
    }
}

impl Default for ElevationMapping {
    fn default() -> Self {
        Self {
            y_scale: Y_SCALE,
            y_shift: Y_SHIFT,
        }
    }
}

/// Strip count and strip length needed to drive per-strip draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StripLayout {
    /// One strip per pair of adjacent rows
    pub strip_count: u32,
    /// Indices per strip (two per column)
    pub verts_per_strip: u32,
}

impl StripLayout {
    pub fn for_grid(width: u32, height: u32) -> Self {
        Self {
            strip_count: height.saturating_sub(1),
            verts_per_strip: width.saturating_mul(2),
        }
    }

    /// Total number of strip indices, excluding restart sentinels.
    pub fn index_count(&self) -> u64 {
        self.strip_count as u64 * self.verts_per_strip as u64
    }

    /// Index range covered by `strip`.
    pub fn strip_range(&self, strip: u32) -> Range<u32> {
        let start = strip * self.verts_per_strip;
        start..start + self.verts_per_strip
    }

    /// Byte offset of `strip` inside a `u32` index buffer.
    pub fn byte_offset(&self, strip: u32) -> u64 {
        strip as u64 * self.verts_per_strip as u64 * std::mem::size_of::<u32>() as u64
    }
}

/// Vertex positions plus the strip layout derived from the same image.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGrid {
    pub vertices: Vec<Vertex>,
    pub layout: StripLayout,
}

/// Build the vertex grid with the default elevation mapping.
pub fn build_vertices(image: &HeightmapImage) -> Result<VertexGrid, MeshError> {
    build_vertices_with(image, ElevationMapping::default())
}

/// Build one vertex per pixel, row-major.
///
/// Row `i` maps to `x = -height/2 + i` and column `j` to `z = -width/2 + j`.
/// x is tied to the image height and z to the width; the grid is not
/// transposed or recentred on `(n - 1) / 2`.
pub fn build_vertices_with(
    image: &HeightmapImage,
    mapping: ElevationMapping,
) -> Result<VertexGrid, MeshError> {
    if !image.is_well_formed() {
        return Err(MeshError::InvalidImageData {
            expected: image.expected_len(),
            actual: image.data.len(),
            channels: image.channels,
        });
    }

    let width = image.width as usize;
    let height = image.height as usize;
    let channels = image.channels as usize;
    let half_width = image.width as f32 / 2.0;
    let half_height = image.height as f32 / 2.0;

    let mut vertices = Vec::with_capacity(width * height);
    for i in 0..height {
        let row = &image.data[i * width * channels..(i + 1) * width * channels];
        for (j, pixel) in row.chunks_exact(channels).enumerate() {
            vertices.push(Vertex::new(
                -half_height + i as f32,
                mapping.apply(pixel[0]),
                -half_width + j as f32,
            ));
        }
    }

    Ok(VertexGrid {
        vertices,
        layout: StripLayout::for_grid(image.width, image.height),
    })
}

fn check_strip_dimensions(width: u32, height: u32) -> Result<(), MeshError> {
    if width < 1 || height < 2 {
        return Err(MeshError::InvalidDimensions { width, height });
    }

    let (w, h) = (width as u64, height as u64);
    let vertex_count = w * h;
    // Longest layout: every strip plus a restart sentinel between strips
    let index_count = (h - 1) * w * 2 + (h - 2);
    // Restart builds reserve u32::MAX as the sentinel
    if vertex_count > RESTART_INDEX as u64 || index_count > RESTART_INDEX as u64 {
        return Err(MeshError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn push_strip(indices: &mut Vec<u32>, width: u32, row: u32) {
    for j in 0..width {
        for k in 0..2 {
            indices.push(j + width * (row + k));
        }
    }
}

/// Build a triangle-strip index buffer, one strip per row pair.
///
/// Strips are laid out back to back without separators; draw them with one
/// call per strip using [`StripLayout::strip_range`].
pub fn build_indices(width: u32, height: u32) -> Result<Vec<u32>, MeshError> {
    check_strip_dimensions(width, height)?;

    let mut indices = Vec::with_capacity((height as usize - 1) * width as usize * 2);
    for i in 0..height - 1 {
        push_strip(&mut indices, width, i);
    }
    Ok(indices)
}

/// Same strips as [`build_indices`], separated by [`RESTART_INDEX`] so the
/// whole mesh can be drawn with a single call.
pub fn build_restart_indices(width: u32, height: u32) -> Result<Vec<u32>, MeshError> {
    check_strip_dimensions(width, height)?;

    let strips = height as usize - 1;
    let mut indices = Vec::with_capacity(strips * width as usize * 2 + strips - 1);
    for i in 0..height - 1 {
        if i > 0 {
            indices.push(RESTART_INDEX);
        }
        push_strip(&mut indices, width, i);
    }
    Ok(indices)
}

/// How the index buffer is laid out and drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DrawMode {
    /// One draw call per row strip
    #[default]
    PerStrip,
    /// Single draw call, strips separated by restart indices
    #[value(name = "restart")]
    PrimitiveRestart,
}

/// Options for [`TerrainMesh::from_heightmap`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshOptions {
    pub mapping: ElevationMapping,
    pub color_scheme: ColorScheme,
    pub draw_mode: DrawMode,
}

/// Generated mesh ready for GPU upload
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    pub vertices: Vec<Vertex>,
    /// Per-vertex colours, parallel to `vertices`
    pub colors: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub layout: StripLayout,
    pub draw_mode: DrawMode,
}

impl TerrainMesh {
    /// Generate vertices, colours and strip indices from a heightmap.
    ///
    /// Fails without producing any buffers if the image is malformed or has
    /// fewer than two rows.
    pub fn from_heightmap(image: &HeightmapImage, options: &MeshOptions) -> Result<Self, MeshError> {
        let VertexGrid { vertices, layout } = build_vertices_with(image, options.mapping)?;
        let indices = match options.draw_mode {
            DrawMode::PerStrip => build_indices(image.width, image.height)?,
            DrawMode::PrimitiveRestart => build_restart_indices(image.width, image.height)?,
        };

        let channels = image.channels as usize;
        let colors = image
            .data
            .chunks_exact(channels)
            .map(|pixel| height_to_color(pixel[0] as f32 / 255.0, options.color_scheme))
            .collect();

        log::debug!(
            "Built {}x{} terrain: {} vertices, {} strips of {} indices",
            image.width,
            image.height,
            vertices.len(),
            layout.strip_count,
            layout.verts_per_strip
        );

        Ok(Self {
            vertices,
            colors,
            indices,
            layout,
            draw_mode: options.draw_mode,
        })
    }

    /// Index ranges to pass to consecutive indexed draw calls.
    pub fn draw_ranges(&self) -> Vec<Range<u32>> {
        match self.draw_mode {
            DrawMode::PerStrip => (0..self.layout.strip_count)
                .map(|strip| self.layout.strip_range(strip))
                .collect(),
            DrawMode::PrimitiveRestart => vec![0..self.indices.len() as u32],
        }
    }

    /// Returns the minimum and maximum vertex heights.
    ///
    /// Returns `(0.0, 0.0)` for an empty mesh.
    pub fn height_bounds(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        for v in &self.vertices {
            min = min.min(v.position[1]);
            max = max.max(v.position[1]);
        }

        if min > max {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luma(width: u32, height: u32, data: Vec<u8>) -> HeightmapImage {
        HeightmapImage::from_luma(width, height, data)
    }

    #[test]
    fn test_two_by_two_vertices() {
        let grid = build_vertices(&luma(2, 2, vec![0, 128, 255, 64])).unwrap();

        assert_eq!(
            grid.vertices,
            vec![
                Vertex::new(-1.0, -16.0, -1.0),
                Vertex::new(-1.0, 16.0, 0.0),
                Vertex::new(0.0, 47.75, -1.0),
                Vertex::new(0.0, 0.0, 0.0),
            ]
        );
        assert_eq!(grid.layout.strip_count, 1);
        assert_eq!(grid.layout.verts_per_strip, 4);
    }

    #[test]
    fn test_vertex_count_and_row_major_order() {
        let (w, h) = (5u32, 3u32);
        let data: Vec<u8> = (0..w * h).map(|v| v as u8).collect();
        let grid = build_vertices(&luma(w, h, data)).unwrap();

        assert_eq!(grid.vertices.len(), (w * h) as usize);
        for i in 0..h {
            for j in 0..w {
                let v = grid.vertices[(i * w + j) as usize].position;
                assert_eq!(v[0], -(h as f32) / 2.0 + i as f32);
                assert_eq!(v[2], -(w as f32) / 2.0 + j as f32);
                assert_eq!(v[1], (i * w + j) as f32 * 0.25 - 16.0);
            }
        }
    }

    #[test]
    fn test_x_follows_height_and_z_follows_width() {
        // 4 columns, 2 rows: x spans rows around -1, z spans columns around -2
        let grid = build_vertices(&luma(4, 2, vec![0; 8])).unwrap();
        let first = grid.vertices[0].position;
        let last = grid.vertices[7].position;

        assert_eq!(first, [-1.0, -16.0, -2.0]);
        assert_eq!(last, [0.0, -16.0, 1.0]);
    }

    #[test]
    fn test_elevation_mapping_exact_for_every_byte() {
        let mapping = ElevationMapping::default();
        for b in 0..=255u8 {
            assert_eq!(mapping.apply(b), b as f32 * (64.0 / 256.0) - 16.0);
        }
        assert_eq!(mapping.apply(0), -16.0);
        assert_eq!(mapping.apply(255), 47.75);
    }

    #[test]
    fn test_custom_mapping() {
        let mapping = ElevationMapping {
            y_scale: 1.0,
            y_shift: 0.0,
        };
        let grid = build_vertices_with(&luma(1, 2, vec![7, 200]), mapping).unwrap();
        assert_eq!(grid.vertices[0].position[1], 7.0);
        assert_eq!(grid.vertices[1].position[1], 200.0);
    }

    #[test]
    fn test_multichannel_uses_first_channel() {
        // 2x1 RGBA; only the first byte of each pixel matters
        let image = HeightmapImage::new(2, 1, 4, vec![64, 1, 2, 3, 128, 9, 9, 9]);
        let grid = build_vertices(&image).unwrap();

        assert_eq!(grid.vertices[0].position[1], 0.0);
        assert_eq!(grid.vertices[1].position[1], 16.0);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let result = build_vertices(&luma(3, 3, vec![0; 8]));
        assert_eq!(
            result,
            Err(MeshError::InvalidImageData {
                expected: Some(9),
                actual: 8,
                channels: 1
            })
        );
    }

    #[test]
    fn test_long_buffer_rejected() {
        let image = HeightmapImage::new(2, 2, 3, vec![0; 13]);
        assert!(matches!(
            build_vertices(&image),
            Err(MeshError::InvalidImageData { .. })
        ));
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let image = HeightmapImage::new(1 << 22, 1 << 22, 1 << 20, vec![]);
        let result = build_vertices(&image);
        assert_eq!(
            result,
            Err(MeshError::InvalidImageData {
                expected: None,
                actual: 0,
                channels: 1 << 20
            })
        );
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("more than usize::MAX"));
    }

    #[test]
    fn test_zero_channels_rejected() {
        let image = HeightmapImage::new(2, 2, 0, vec![]);
        assert!(matches!(
            build_vertices(&image),
            Err(MeshError::InvalidImageData { channels: 0, .. })
        ));
    }

    #[test]
    fn test_single_row_has_no_strips() {
        let grid = build_vertices(&luma(3, 1, vec![1, 2, 3])).unwrap();
        assert_eq!(grid.vertices.len(), 3);
        assert_eq!(grid.layout.strip_count, 0);
    }

    #[test]
    fn test_three_by_three_indices() {
        let indices = build_indices(3, 3).unwrap();
        assert_eq!(indices, vec![0, 3, 1, 4, 2, 5, 3, 6, 4, 7, 5, 8]);
    }

    #[test]
    fn test_index_count_and_bounds() {
        for (w, h) in [(1, 2), (2, 2), (7, 4), (16, 9), (3, 30)] {
            let indices = build_indices(w, h).unwrap();
            assert_eq!(indices.len(), ((h - 1) * w * 2) as usize);
            assert!(indices.iter().all(|&i| i < w * h));
        }
    }

    #[test]
    fn test_single_row_indices_rejected() {
        assert_eq!(
            build_indices(4, 1),
            Err(MeshError::InvalidDimensions {
                width: 4,
                height: 1
            })
        );
    }

    #[test]
    fn test_zero_width_indices_rejected() {
        assert!(matches!(
            build_indices(0, 5),
            Err(MeshError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_index_count_must_fit_u32() {
        // 2^31 vertices fit, but (H-1) * 2W reaches 2^32 indices
        assert_eq!(
            build_indices(65536, 32769),
            Err(MeshError::InvalidDimensions {
                width: 65536,
                height: 32769
            })
        );
        assert!(matches!(
            build_restart_indices(65536, 32769),
            Err(MeshError::InvalidDimensions { .. })
        ));
        // One row less keeps strips and sentinels below u32::MAX
        assert!(check_strip_dimensions(65536, 32768).is_ok());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let image = luma(4, 4, (0..16).map(|v| v * 13).collect());
        assert_eq!(build_vertices(&image), build_vertices(&image));
        assert_eq!(build_indices(4, 4), build_indices(4, 4));
    }

    #[test]
    fn test_restart_indices_match_strips() {
        let (w, h) = (3, 4);
        let plain = build_indices(w, h).unwrap();
        let restart = build_restart_indices(w, h).unwrap();

        assert_eq!(restart.len(), plain.len() + (h as usize - 2));
        let strips: Vec<&[u32]> = restart.split(|&i| i == RESTART_INDEX).collect();
        assert_eq!(strips.len(), (h - 1) as usize);
        for (strip, chunk) in strips.iter().zip(plain.chunks((w * 2) as usize)) {
            assert_eq!(*strip, chunk);
        }
    }

    #[test]
    fn test_restart_single_strip_has_no_sentinel() {
        let restart = build_restart_indices(2, 2).unwrap();
        assert_eq!(restart, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_strip_layout_offsets() {
        let layout = StripLayout::for_grid(3, 3);
        assert_eq!(layout.strip_count, 2);
        assert_eq!(layout.verts_per_strip, 6);
        assert_eq!(layout.index_count(), 12);
        assert_eq!(layout.strip_range(1), 6..12);
        assert_eq!(layout.byte_offset(0), 0);
        assert_eq!(layout.byte_offset(1), 24);
    }

    #[test]
    fn test_mesh_per_strip_draw_ranges() {
        let image = luma(3, 3, vec![0; 9]);
        let mesh = TerrainMesh::from_heightmap(&image, &MeshOptions::default()).unwrap();

        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.colors.len(), 9);
        assert_eq!(mesh.indices.len(), 12);
        assert_eq!(mesh.draw_ranges(), vec![0..6, 6..12]);
    }

    #[test]
    fn test_mesh_restart_draw_range() {
        let image = luma(3, 3, vec![0; 9]);
        let options = MeshOptions {
            draw_mode: DrawMode::PrimitiveRestart,
            ..Default::default()
        };
        let mesh = TerrainMesh::from_heightmap(&image, &options).unwrap();

        assert_eq!(mesh.indices.len(), 13);
        assert_eq!(mesh.draw_ranges(), vec![0..13]);
    }

    #[test]
    fn test_mesh_single_row_fails_atomically() {
        let image = luma(3, 1, vec![0; 3]);
        let result = TerrainMesh::from_heightmap(&image, &MeshOptions::default());
        assert!(matches!(result, Err(MeshError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_monochrome_uses_absolute_byte_not_image_range() {
        // A narrow 100..=130 band stays mid-grey; it is not stretched to black..white
        let image = luma(2, 2, vec![100, 110, 120, 130]);
        let mesh = TerrainMesh::from_heightmap(&image, &MeshOptions::default()).unwrap();
        assert_eq!(mesh.colors[0], [100.0 / 255.0; 3]);
        assert_eq!(mesh.colors[3], [130.0 / 255.0; 3]);
    }

    #[test]
    fn test_mesh_height_bounds() {
        let image = luma(2, 2, vec![0, 128, 255, 64]);
        let mesh = TerrainMesh::from_heightmap(&image, &MeshOptions::default()).unwrap();
        assert_eq!(mesh.height_bounds(), (-16.0, 47.75));
    }
}
