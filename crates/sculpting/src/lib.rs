//! Real-time planet sculpting core.
//!
//! A pointer is picked against a deformable sphere, drags push or pull the
//! surface with a radial falloff, a cursor decal is re-projected onto the
//! live surface every frame, and instanced vegetation is scattered over the
//! surface and mowed where the user sculpts in mow mode.
//!
//! # Architecture
//!
//! Rendering, windowing and asset retrieval are collaborators behind the
//! [`RenderBackend`] and [`AssetSource`] traits. Everything else runs inside
//! [`PlanetScene::frame`], once per display refresh, on one thread. Input can
//! arrive from any thread through an [`InputSender`].
//!
//! ## Key Components
//!
//! - **Mesh**: fixed-topology surface with mutable positions, normals and
//!   cumulative sculpt weights
//! - **Picker**: pointer ray against every pickable entity, tagged by
//!   [`PickTarget`]
//! - **Deformation**: radial sculpting around an anchor vertex
//! - **Decal**: box-clipped cursor patch, rebuilt every frame
//! - **Vegetation**: seeded instance placement, anchor following and mowing
//! - **Pipeline**: per-frame orchestration

pub mod assets;
pub mod brush;
pub mod camera;
pub mod decal;
pub mod deformation;
pub mod gpu;
pub mod input;
pub mod mesh;
pub mod picker;
pub mod pipeline;
pub mod raycast;
pub mod spatial;
pub mod types;
pub mod vegetation;

pub use assets::{
    load_scene_assets, AssetPaths, AssetSource, LoadedAssets, ModelGeometry, TextureData,
};
pub use brush::{FalloffCurve, SculptBrush};
pub use camera::{OrbitCamera, PerspectiveCamera};
pub use decal::{DecalPatch, DecalProjector, ProjectorFrame};
pub use deformation::{SculptStroke, Sculptor};
pub use gpu::{DecalVertex, DirtyAttributes, InstanceRaw, SurfaceVertex};
pub use input::{input_channel, InputEvent, InputQueue, InputSender, InputState, MouseButton};
pub use mesh::SurfaceMesh;
pub use picker::{first_surface_hit, pick, pick_from_ndc, PickHit, PickableMesh, SurfaceHit};
pub use pipeline::{FrameReport, FrameView, PlanetScene, RenderBackend, RenderUniforms, SceneConfig};
pub use types::{AnchorRule, AssetError, MeshError, NeighborSearch, PickTarget, Ray};
pub use vegetation::VegetationField;
