//! Headless render collaborator
//!
//! Packs every dirty buffer exactly as a GPU upload would and keeps running
//! totals, so the frame loop can be driven and measured without a window.

use sculpting::gpu::interleave_surface;
use sculpting::{FrameView, RenderBackend};
use tracing::{debug, info};

/// Upload statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub frames: u64,
    pub surface_uploads: u64,
    pub decal_uploads: u64,
    pub instance_uploads: u64,
    pub water_uploads: u64,
    pub bytes: u64,
}

/// Renderer that records uploads instead of drawing
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    size: (u32, u32),
    stats: UploadStats,
    last_decal_generation: u64,
}

impl HeadlessRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Default::default()
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn stats(&self) -> &UploadStats {
        &self.stats
    }
}

impl RenderBackend for HeadlessRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        info!(width, height, "Resizing headless target");
        self.size = (width, height);
    }

    fn render(&mut self, view: &FrameView<'_>) {
        self.stats.frames += 1;

        if view.surface_dirty.any() {
            let vertices = interleave_surface(view.surface);
            self.stats.bytes += bytemuck::cast_slice::<_, u8>(&vertices).len() as u64;
            self.stats.surface_uploads += 1;
        }

        if view.water_rebuilt {
            let vertices = interleave_surface(view.water);
            self.stats.bytes += bytemuck::cast_slice::<_, u8>(&vertices).len() as u64;
            self.stats.water_uploads += 1;
        }

        if let Some(patch) = view.decal.filter(|p| p.generation() != self.last_decal_generation) {
            let vertices = patch.vertices();
            self.stats.bytes += bytemuck::cast_slice::<_, u8>(&vertices).len() as u64;
            self.stats.decal_uploads += 1;
            self.last_decal_generation = patch.generation();
        }

        if view.instances_dirty {
            self.stats.bytes += bytemuck::cast_slice::<_, u8>(view.instances).len() as u64;
            self.stats.bytes += bytemuck::cast_slice::<_, u8>(view.instance_weights).len() as u64;
            self.stats.instance_uploads += 1;
        }

        debug!(
            frame = self.stats.frames,
            time = view.uniforms.time,
            wireframe = view.uniforms.wireframe,
            "Rendered headless frame"
        );
    }
}
