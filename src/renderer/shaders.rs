//! WGSL shader loading with explicit compile-error reporting.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Built-in terrain shader, used when no override file is given.
pub const TERRAIN_SHADER: &str = include_str!("../../shaders/terrain.wgsl");

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("Cannot read shader {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Shader '{label}' failed to compile: {message}")]
    Compile { label: String, message: String },
    /// The module compiled but does not fit the terrain pipeline (missing
    /// `vs_main`/`fs_main`, vertex inputs not matching the buffers, ...).
    #[error("Shader '{label}' failed to link: {message}")]
    Link { label: String, message: String },
}

/// WGSL source plus the label used in GPU debug output.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub label: String,
    pub code: Cow<'static, str>,
}

impl ShaderSource {
    pub fn builtin() -> Self {
        Self {
            label: "Terrain Shader".to_string(),
            code: Cow::Borrowed(TERRAIN_SHADER),
        }
    }

    /// Read a WGSL file. Nothing is validated until [`ShaderSource::compile`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let code = fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            label: path.display().to_string(),
            code: Cow::Owned(code),
        })
    }

    /// Built-in shader, or the file at `path` when given.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ShaderError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Compile on `device`, turning validation failures into [`ShaderError::Compile`].
    pub fn compile(&self, device: &wgpu::Device) -> Result<wgpu::ShaderModule, ShaderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(self.code.clone()),
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(ShaderError::Compile {
                label: self.label.clone(),
                message: error.to_string(),
            }),
            None => Ok(module),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_label() {
        assert_eq!(ShaderSource::builtin().label, "Terrain Shader");
    }

    #[test]
    fn test_resolve_without_path_is_builtin() {
        let source = ShaderSource::resolve(None).unwrap();
        assert_eq!(source.code, TERRAIN_SHADER);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.wgsl");
        fs::write(&path, TERRAIN_SHADER.replace("1.0);\n}", "0.5);\n}")).unwrap();

        let source = ShaderSource::from_file(&path).unwrap();
        assert!(source.label.ends_with("custom.wgsl"));
        assert!(source.code.contains("0.5"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ShaderSource::from_file(dir.path().join("nope.wgsl"));
        assert!(matches!(result, Err(ShaderError::Io { .. })));
    }

    #[test]
    fn test_entry_points_checked_at_link_not_load() {
        // A commented-out `fn fs_main(` must not count; loading defers to the GPU
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vertex_only.wgsl");
        fs::write(
            &path,
            "// fn fs_main() is gone\n@vertex\nfn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(); }\n",
        )
        .unwrap();

        let source = ShaderSource::from_file(&path).unwrap();
        assert!(source.code.contains("vs_main"));
    }
}
