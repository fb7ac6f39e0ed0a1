//! Startup asset loading.
//!
//! The scene needs a decal texture and a vegetation model before the frame
//! loop may start. Loading goes through an [`AssetSource`] so the core stays
//! independent of file systems and model formats. Any failure is fatal and
//! surfaces as an [`AssetError`] before scene state exists.

use glam::Vec3;
use image::RgbaImage;
use tracing::info;

use crate::types::AssetError;

/// Default decal texture path, relative to the asset root.
pub const DEFAULT_DECAL_TEXTURE: &str = "textures/cursor_white.png";

/// Default vegetation model path, relative to the asset root.
pub const DEFAULT_GRASS_MODEL: &str = "models/grass_blade.obj";

/// Decoded RGBA texture.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub path: String,
    pub image: RgbaImage,
}

impl TextureData {
    /// Decode an encoded image (PNG, JPEG, ...) into RGBA8.
    pub fn decode(path: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AssetError::Texture {
                path: path.to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        Ok(Self {
            path: path.to_string(),
            image,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Triangle geometry of a loaded model, merged into one buffer set.
#[derive(Debug, Clone, Default)]
pub struct ModelGeometry {
    pub path: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ModelGeometry {
    /// Validate raw buffers. Missing normals are left empty for the renderer
    /// to derive.
    pub fn new(
        path: &str,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Result<Self, AssetError> {
        if positions.is_empty() || indices.len() < 3 {
            return Err(AssetError::EmptyModel(path.to_string()));
        }
        if indices.len() % 3 != 0 {
            return Err(AssetError::Model {
                path: path.to_string(),
                reason: format!("index count {} is not a multiple of 3", indices.len()),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(AssetError::Model {
                path: path.to_string(),
                reason: format!("index {index} out of range for {} vertices", positions.len()),
            });
        }
        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(AssetError::Model {
                path: path.to_string(),
                reason: format!(
                    "{} normals for {} vertices",
                    normals.len(),
                    positions.len()
                ),
            });
        }
        Ok(Self {
            path: path.to_string(),
            positions,
            normals,
            indices,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Height of the model along the instance reference axis.
    pub fn height(&self) -> f32 {
        let (min, max) = self
            .positions
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        (max - min).max(0.0)
    }
}

/// Asset collaborator.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    /// Load and merge all triangle meshes of a model file.
    async fn load_model(&self, path: &str) -> Result<ModelGeometry, AssetError>;

    /// Load and decode a texture.
    async fn load_texture(&self, path: &str) -> Result<TextureData, AssetError>;
}

/// Paths of the assets the scene depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub decal_texture: String,
    pub grass_model: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            decal_texture: DEFAULT_DECAL_TEXTURE.to_string(),
            grass_model: DEFAULT_GRASS_MODEL.to_string(),
        }
    }
}

/// Everything the scene needs from the asset collaborator.
#[derive(Debug, Clone)]
pub struct LoadedAssets {
    pub decal_texture: TextureData,
    pub grass_model: ModelGeometry,
}

/// Load every required asset. The first failure aborts.
pub async fn load_scene_assets<S: AssetSource>(
    source: &S,
    paths: &AssetPaths,
) -> Result<LoadedAssets, AssetError> {
    let decal_texture = source.load_texture(&paths.decal_texture).await?;
    let (width, height) = decal_texture.dimensions();
    info!(path = %paths.decal_texture, width, height, "Loaded decal texture");

    let grass_model = source.load_model(&paths.grass_model).await?;
    info!(
        path = %paths.grass_model,
        vertices = grass_model.positions.len(),
        triangles = grass_model.triangle_count(),
        "Loaded vegetation model"
    );

    Ok(LoadedAssets {
        decal_texture,
        grass_model,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory asset source for tests.
    #[derive(Default)]
    pub(crate) struct MemoryAssets {
        pub textures: HashMap<String, RgbaImage>,
        pub models: HashMap<String, ModelGeometry>,
    }

    impl MemoryAssets {
        pub(crate) fn with_defaults() -> Self {
            let mut assets = Self::default();
            assets
                .textures
                .insert(DEFAULT_DECAL_TEXTURE.to_string(), RgbaImage::new(4, 4));
            assets
                .models
                .insert(DEFAULT_GRASS_MODEL.to_string(), blade(DEFAULT_GRASS_MODEL));
            assets
        }
    }

    pub(crate) fn blade(path: &str) -> ModelGeometry {
        ModelGeometry::new(
            path,
            vec![
                Vec3::new(-0.01, 0.0, 0.0),
                Vec3::new(0.01, 0.0, 0.0),
                Vec3::new(0.0, 0.1, 0.0),
            ],
            Vec::new(),
            vec![0, 1, 2],
        )
        .unwrap()
    }

    impl AssetSource for MemoryAssets {
        async fn load_model(&self, path: &str) -> Result<ModelGeometry, AssetError> {
            self.models
                .get(path)
                .cloned()
                .ok_or_else(|| AssetError::Model {
                    path: path.to_string(),
                    reason: "not found".to_string(),
                })
        }

        async fn load_texture(&self, path: &str) -> Result<TextureData, AssetError> {
            self.textures
                .get(path)
                .map(|image| TextureData {
                    path: path.to_string(),
                    image: image.clone(),
                })
                .ok_or_else(|| AssetError::Texture {
                    path: path.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    #[tokio::test]
    async fn test_load_scene_assets() {
        let source = MemoryAssets::with_defaults();
        let assets = load_scene_assets(&source, &AssetPaths::default()).await.unwrap();
        assert_eq!(assets.decal_texture.dimensions(), (4, 4));
        assert_eq!(assets.grass_model.triangle_count(), 1);
        assert!((assets.grass_model.height() - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_missing_model_is_fatal() {
        let mut source = MemoryAssets::with_defaults();
        source.models.clear();
        let err = load_scene_assets(&source, &AssetPaths::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Model { .. }));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = TextureData::decode("bad.png", b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Texture { .. }));
    }

    #[test]
    fn test_decode_png() {
        let mut bytes = Vec::new();
        RgbaImage::new(3, 2)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let texture = TextureData::decode("cursor.png", &bytes).unwrap();
        assert_eq!(texture.dimensions(), (3, 2));
    }

    #[test]
    fn test_model_validation() {
        assert!(matches!(
            ModelGeometry::new("empty.obj", Vec::new(), Vec::new(), Vec::new()),
            Err(AssetError::EmptyModel(_))
        ));
        assert!(matches!(
            ModelGeometry::new("bad.obj", vec![Vec3::ZERO; 3], Vec::new(), vec![0, 1, 5]),
            Err(AssetError::Model { .. })
        ));
    }
}
