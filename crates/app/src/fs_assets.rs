//! Asset source backed by the local file system

use glam::Vec3;
use sculpting::{AssetError, AssetSource, ModelGeometry, TextureData};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads assets relative to a root directory
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetSource for FsAssets {
    async fn load_model(&self, path: &str) -> Result<ModelGeometry, AssetError> {
        let full = self.resolve(path);
        let label = full.display().to_string();
        debug!(path = %label, "Loading model");

        // tobj reads synchronously
        let worker_label = label.clone();
        let loaded = tokio::task::spawn_blocking(move || read_obj(&full, &worker_label))
            .await
            .map_err(|e| AssetError::Model {
                path: label.clone(),
                reason: e.to_string(),
            })??;
        Ok(loaded)
    }

    async fn load_texture(&self, path: &str) -> Result<TextureData, AssetError> {
        let full = self.resolve(path);
        let label = full.display().to_string();
        debug!(path = %label, "Loading texture");

        let bytes = tokio::fs::read(&full).await.map_err(|source| AssetError::Io {
            path: label.clone(),
            source,
        })?;
        TextureData::decode(&label, &bytes)
    }
}

/// Load an OBJ file and merge all of its meshes into one buffer set
fn read_obj(path: &Path, label: &str) -> Result<ModelGeometry, AssetError> {
    let (models, _materials) =
        tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|e| match e {
            tobj::LoadError::OpenFileFailed => AssetError::Io {
                path: label.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
            },
            other => AssetError::Model {
                path: label.to_string(),
                reason: other.to_string(),
            },
        })?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    let mut all_have_normals = true;

    for model in models {
        let mesh = model.mesh;
        let base = positions.len() as u32;
        let vertex_count = mesh.positions.len() / 3;

        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        if mesh.normals.len() == mesh.positions.len() {
            normals.extend(
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2])),
            );
        } else {
            all_have_normals = false;
            normals.extend(std::iter::repeat_n(Vec3::ZERO, vertex_count));
        }
        indices.extend(mesh.indices.iter().map(|&i| base + i));
    }

    if !all_have_normals {
        normals.clear();
    }
    ModelGeometry::new(label, positions, normals, indices)
}
