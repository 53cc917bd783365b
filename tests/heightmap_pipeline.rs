use heightmesh::terrain::{
    build_indices, build_vertices, load_heightmap, DrawMode, HeightmapImage, MeshError,
    MeshOptions, TerrainMesh, RESTART_INDEX,
};
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

#[test]
fn test_bmp_file_to_strip_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("height_map.bmp");
    let gray: GrayImage = ImageBuffer::from_fn(3, 3, |x, y| Luma([(x * 40 + y * 100) as u8]));
    gray.save(&path).unwrap();

    let heightmap = load_heightmap(&path).unwrap();
    let mesh = TerrainMesh::from_heightmap(&heightmap, &MeshOptions::default()).unwrap();

    assert_eq!(mesh.vertices.len(), 9);
    assert_eq!(mesh.indices, vec![0, 3, 1, 4, 2, 5, 3, 6, 4, 7, 5, 8]);
    assert_eq!(mesh.layout.strip_count, 2);
    assert_eq!(mesh.layout.verts_per_strip, 6);

    // Row 1, column 2 holds 2*40 + 1*100 = 180
    let v = mesh.vertices[5].position;
    assert_eq!(v, [-0.5, 180.0 * 0.25 - 16.0, 0.5]);
}

#[test]
fn test_rgb_png_uses_red_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colour.png");
    let rgb: RgbImage = ImageBuffer::from_fn(2, 2, |x, y| Rgb([(x + 2 * y) as u8 * 64, 255, 0]));
    rgb.save(&path).unwrap();

    let heightmap = load_heightmap(&path).unwrap();
    assert_eq!(heightmap.channels, 3);

    let grid = build_vertices(&heightmap).unwrap();
    let heights: Vec<f32> = grid.vertices.iter().map(|v| v.position[1]).collect();
    assert_eq!(heights, vec![-16.0, 0.0, 16.0, 32.0]);
}

#[test]
fn test_restart_mesh_covers_every_strip_in_one_call() {
    let image = HeightmapImage::from_luma(5, 4, vec![200; 20]);
    let options = MeshOptions {
        draw_mode: DrawMode::PrimitiveRestart,
        ..Default::default()
    };
    let mesh = TerrainMesh::from_heightmap(&image, &options).unwrap();

    let plain = build_indices(5, 4).unwrap();
    let stripped: Vec<u32> = mesh
        .indices
        .iter()
        .copied()
        .filter(|&i| i != RESTART_INDEX)
        .collect();
    assert_eq!(stripped, plain);
    assert_eq!(mesh.draw_ranges().len(), 1);
}

#[test]
fn test_malformed_image_fails_before_any_output() {
    let image = HeightmapImage::new(4, 4, 2, vec![0; 31]);
    let result = TerrainMesh::from_heightmap(&image, &MeshOptions::default());
    assert_eq!(
        result.unwrap_err(),
        MeshError::InvalidImageData {
            expected: Some(32),
            actual: 31,
            channels: 2
        }
    );
}
