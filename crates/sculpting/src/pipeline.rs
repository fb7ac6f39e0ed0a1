//! Per-frame orchestration.
//!
//! One call to [`PlanetScene::frame`] runs the whole pipeline to completion:
//! 1. Drain input events into the input snapshot
//! 2. Apply parameter changes from the config store
//! 3. Viewport resize and orbit camera update
//! 4. Pick against the surface, decal and water
//! 5. Rebuild the decal for the nearest surface hit
//! 6. Sculpt (or mow) while dragging
//! 7. Refresh normals and vegetation
//! 8. Hand a [`FrameView`] to the render collaborator

use glam::{Affine3A, Vec3};
use planet_config::{DisplayConfig, ParamChange, ParamStore};
use tracing::{debug, info, trace};

use crate::assets::{LoadedAssets, ModelGeometry, TextureData};
use crate::brush::SculptBrush;
use crate::camera::{OrbitCamera, PerspectiveCamera};
use crate::decal::{DecalPatch, DecalProjector, DEFAULT_DECAL_SIZE, DEFAULT_OFFSET_EPSILON};
use crate::deformation::Sculptor;
use crate::gpu::{DirtyAttributes, InstanceRaw};
use crate::input::{input_channel, InputQueue, InputSender, InputState};
use crate::mesh::SurfaceMesh;
use crate::picker::{first_surface_hit, pick_from_ndc, PickableMesh, SurfaceHit};
use crate::types::{AnchorRule, NeighborSearch, PickTarget};
use crate::vegetation::VegetationField;

/// Scene construction settings.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub planet_radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Object-to-world transform shared by the planet and the water
    pub planet_transform: Affine3A,
    pub water_segments: u32,
    pub instance_count: usize,
    pub seed: u64,
    pub decal_size: Vec3,
    pub decal_offset: f32,
    pub anchor_rule: AnchorRule,
    pub neighbor_search: NeighborSearch,
    pub display: DisplayConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            planet_radius: 1.0,
            width_segments: 100,
            height_segments: 100,
            planet_transform: Affine3A::IDENTITY,
            water_segments: 64,
            instance_count: 22_000,
            seed: 0x5eed,
            decal_size: DEFAULT_DECAL_SIZE,
            decal_offset: DEFAULT_OFFSET_EPSILON,
            anchor_rule: AnchorRule::default(),
            neighbor_search: NeighborSearch::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Shader inputs that are not per-vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderUniforms {
    /// Seconds since the scene started
    pub time: f32,
    pub grass_scale: f32,
    pub water_height: f32,
    pub wireframe: bool,
}

/// Everything the render collaborator needs for one frame.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub camera: &'a PerspectiveCamera,
    pub surface: &'a SurfaceMesh,
    pub surface_transform: Affine3A,
    /// Surface buffers changed since the previous frame
    pub surface_dirty: DirtyAttributes,
    pub water: &'a SurfaceMesh,
    /// Water mesh was rebuilt since the previous frame
    pub water_rebuilt: bool,
    pub decal: Option<&'a DecalPatch>,
    pub decal_texture: &'a TextureData,
    pub instance_model: &'a ModelGeometry,
    pub instances: &'a [InstanceRaw],
    /// Anchor sculpt weight per instance, parallel to `instances`
    pub instance_weights: &'a [f32],
    /// Instance transforms or weights changed since the previous frame
    pub instances_dirty: bool,
    pub uniforms: RenderUniforms,
}

/// Render collaborator.
pub trait RenderBackend {
    /// Resize the output surface.
    fn set_size(&mut self, width: u32, height: u32);

    /// Draw one frame.
    fn render(&mut self, view: &FrameView<'_>);
}

/// Summary of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// A surface hit was found under the pointer
    pub hit: bool,
    pub anchor: Option<u32>,
    pub vertices_modified: usize,
    pub instances_hidden: usize,
    pub instances_moved: usize,
    pub decal_generation: u64,
    pub param_changes: usize,
}

/// The planet scene and its frame loop state.
#[derive(Debug)]
pub struct PlanetScene {
    config: SceneConfig,
    params: ParamStore,
    display: DisplayConfig,
    input_tx: InputSender,
    input_queue: InputQueue,
    input: InputState,
    camera: PerspectiveCamera,
    orbit: OrbitCamera,
    surface: SurfaceMesh,
    water: SurfaceMesh,
    water_rebuilt: bool,
    sculptor: Sculptor,
    decal: DecalProjector,
    vegetation: VegetationField,
    assets: LoadedAssets,
    elapsed: f32,
    frame: u64,
}

impl PlanetScene {
    /// Build the scene. Requires the startup assets, so the frame loop cannot
    /// start before they have loaded.
    pub fn new(config: SceneConfig, params: ParamStore, assets: LoadedAssets) -> Self {
        let surface = SurfaceMesh::sphere(
            config.planet_radius,
            config.width_segments,
            config.height_segments,
        );
        let water = SurfaceMesh::sphere(
            params.params().water_height,
            config.water_segments,
            config.water_segments,
        );
        let vegetation = VegetationField::place(&surface, config.instance_count, config.seed);

        let display = config.display.clone();
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(&display);
        let orbit = OrbitCamera::default();
        orbit.apply(&mut camera);

        let (input_tx, input_queue) = input_channel();

        info!(
            vertices = surface.vertex_count(),
            triangles = surface.triangle_count(),
            instances = vegetation.len(),
            search = ?config.neighbor_search,
            "Planet scene ready"
        );

        Self {
            sculptor: Sculptor::new(config.neighbor_search),
            decal: DecalProjector::new(config.decal_size, config.decal_offset),
            config,
            params,
            display,
            input_tx,
            input_queue,
            input: InputState::default(),
            camera,
            orbit,
            surface,
            water,
            water_rebuilt: true,
            vegetation,
            assets,
            elapsed: 0.0,
            frame: 0,
        }
    }

    /// A new handle for feeding input from any thread.
    pub fn input_sender(&self) -> InputSender {
        self.input_tx.clone()
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    /// Parameter store for the GUI collaborator.
    pub fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }

    pub fn input_state(&self) -> &InputState {
        &self.input
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn surface(&self) -> &SurfaceMesh {
        &self.surface
    }

    pub fn water(&self) -> &SurfaceMesh {
        &self.water
    }

    pub fn decal(&self) -> &DecalProjector {
        &self.decal
    }

    pub fn vegetation(&self) -> &VegetationField {
        &self.vegetation
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Re-scatter vegetation with a new instance count.
    pub fn set_instance_count(&mut self, count: usize) {
        if count != self.vegetation.len() {
            self.config.instance_count = count;
            self.vegetation.replace(&self.surface, count);
        }
    }

    /// Run one frame and hand the result to `renderer`.
    pub fn frame<R: RenderBackend>(&mut self, dt: f32, renderer: &mut R) -> FrameReport {
        self.frame += 1;
        self.elapsed += dt;
        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };

        self.input_queue.drain_into(&mut self.input);
        report.param_changes = self.apply_param_changes();

        if let Some((width, height)) = self.input.resize {
            self.display = DisplayConfig::new(width, height);
            self.camera.set_viewport(&self.display);
            renderer.set_size(width, height);
            debug!(width, height, "Viewport resized");
        }
        self.update_camera();

        if let Some(hit) = self.pick_surface() {
            report.hit = true;
            report.anchor = Some(hit.anchor);
            self.decal
                .update(&self.surface, &self.config.planet_transform, &hit);

            if self.input.sculpting() {
                self.sculpt(&hit, &mut report);
            }
        }
        report.decal_generation = self.decal.generation();

        let uniforms = self.uniforms();
        let surface_dirty = self.surface.take_dirty();
        let instances_dirty = self.vegetation.take_dirty();
        let water_rebuilt = std::mem::take(&mut self.water_rebuilt);
        let view = FrameView {
            camera: &self.camera,
            surface: &self.surface,
            surface_transform: self.config.planet_transform,
            surface_dirty,
            water: &self.water,
            water_rebuilt,
            decal: self.decal.patch(),
            decal_texture: &self.assets.decal_texture,
            instance_model: &self.assets.grass_model,
            instances: self.vegetation.transforms(),
            instance_weights: self.vegetation.anchor_weights(),
            instances_dirty,
            uniforms,
        };
        renderer.render(&view);

        trace!(?report, "Frame complete");
        report
    }

    fn apply_param_changes(&mut self) -> usize {
        let changes = self.params.drain_changes();
        for change in &changes {
            info!(?change, "Parameter changed");
            if let ParamChange::WaterHeight(height) = change {
                self.water =
                    SurfaceMesh::sphere(*height, self.config.water_segments, self.config.water_segments);
                self.water_rebuilt = true;
            }
        }
        changes.len()
    }

    fn update_camera(&mut self) {
        // Orbit controls are disabled while sculpting
        if self.input.orbit_mode && self.input.drag_active {
            self.orbit.orbit(self.input.drag_delta);
        }
        if !self.input.sculpting() && self.input.scroll != 0.0 {
            self.orbit.zoom(self.input.scroll);
        }
        self.orbit.apply(&mut self.camera);
    }

    fn pick_surface(&self) -> Option<SurfaceHit> {
        let pointer = self.input.pointer?;
        let transform = self.config.planet_transform;

        let mut objects = vec![
            PickableMesh::from_surface(PickTarget::Surface, transform, &self.surface),
            PickableMesh::from_surface(PickTarget::Other, transform, &self.water),
        ];
        if let Some(patch) = self.decal.patch() {
            objects.push(PickableMesh::new(
                PickTarget::Decal,
                Affine3A::IDENTITY,
                patch.positions(),
                patch.indices(),
            ));
        }

        let hits = pick_from_ndc(&self.camera, pointer, &objects);
        first_surface_hit(&hits, PickTarget::Surface, &transform, self.config.anchor_rule)
    }

    fn sculpt(&mut self, hit: &SurfaceHit, report: &mut FrameReport) {
        let brush = SculptBrush::from_params(self.params.params());
        let mowing = self.input.mow_mode;
        let stroke = self
            .sculptor
            .sculpt(&mut self.surface, hit.anchor, &brush, !mowing);

        if mowing {
            report.instances_hidden = self.vegetation.mow(&stroke.affected);
            return;
        }
        if stroke.modified.is_empty() {
            return;
        }
        self.surface.refresh_normals(stroke.modified.iter().copied());
        report.vertices_modified = stroke.modified.len();
        report.instances_moved = self.vegetation.follow_anchors(&self.surface, &stroke.modified);
        self.vegetation
            .sync_anchor_weights(&self.surface, &stroke.modified);
    }

    fn uniforms(&self) -> RenderUniforms {
        let params = self.params.params();
        RenderUniforms {
            time: self.elapsed,
            grass_scale: params.grass_scale,
            water_height: params.water_height,
            wireframe: params.wireframe,
        }
    }
}
