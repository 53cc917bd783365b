use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;

use super::HeightmapImage;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has no pixels")]
    EmptyImage,
}

/// Load a heightmap from an image file (BMP, PNG, JPEG, TGA, ...).
pub fn load_heightmap<P: AsRef<Path>>(path: P) -> Result<HeightmapImage, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let image = decode_heightmap(&bytes)?;
    log::info!(
        "Loaded heightmap {}: {}x{}, {} channel(s)",
        path.display(),
        image.width,
        image.height,
        image.channels
    );
    Ok(image)
}

/// Decode an in-memory image, keeping its native channel count.
///
/// Images with more than 8 bits per channel are narrowed to 8 bits.
pub fn decode_heightmap(bytes: &[u8]) -> Result<HeightmapImage, LoadError> {
    let decoded = image::load_from_memory(bytes)?;
    from_dynamic(decoded)
}

fn from_dynamic(decoded: DynamicImage) -> Result<HeightmapImage, LoadError> {
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(LoadError::EmptyImage);
    }

    let channels = decoded.color().channel_count() as u32;
    let data = match decoded {
        DynamicImage::ImageLuma8(buf) => buf.into_raw(),
        DynamicImage::ImageLumaA8(buf) => buf.into_raw(),
        DynamicImage::ImageRgb8(buf) => buf.into_raw(),
        DynamicImage::ImageRgba8(buf) => buf.into_raw(),
        other => match channels {
            1 => other.to_luma8().into_raw(),
            2 => other.to_luma_alpha8().into_raw(),
            3 => other.to_rgb8().into_raw(),
            _ => other.to_rgba8().into_raw(),
        },
    };

    Ok(HeightmapImage::new(width, height, channels, data))
}
