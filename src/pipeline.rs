/// Draw-call orchestration.
///
/// A `Pipeline` owns the explicit state every stage reads (vertex layout,
/// fragment uniform, transform, cached frustum, raster settings), a clipper
/// sized to the layout, and an optional borrowed render target. Per
/// triangle it runs: transform -> clip -> fan -> perspective divide ->
/// scanline rasterization.
use glam::{Mat4, Vec4};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::sync::Arc;

use crate::camera::{Camera, Frustum};
use crate::count_call;
use crate::perf::FUNCTION_COUNTERS;
use crate::perf_scope;
use crate::rendering::clipper::{ClipOutcome, Clipper};
use crate::rendering::framebuffer::RenderTarget;
use crate::rendering::rasterizer::rasterize_triangle;
use crate::rendering::shading::Uniform;
use crate::vertex::{RawVertex, VertexFormat};

/// Rasterizer settings.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Color every fragment starts from before shaders modulate it (ARGB).
    pub base_color: u32,
    /// Screen-space triangles with area at or below this (in pixels) are skipped.
    pub cull_degenerate_area: f32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            base_color: 0xFFFF_FFFF,
            cull_degenerate_area: 0.0,
        }
    }
}

/// Everything the clip and raster stages read.
#[derive(Clone, Debug)]
pub struct PipelineState {
    pub format: VertexFormat,
    pub uniform: Option<Uniform>,
    /// Object space -> view-volume space.
    pub transform: Mat4,
    pub frustum: Frustum,
    pub config: RasterConfig,
}

impl PipelineState {
    pub fn new(format: VertexFormat, config: RasterConfig) -> Self {
        Self {
            format,
            uniform: None,
            transform: Mat4::IDENTITY,
            frustum: Frustum::default(),
            config,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(VertexFormat::empty(), RasterConfig::default())
    }
}

/// What a draw call did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub triangles_submitted: usize,
    /// Dropped before clipping (no target, short vertex data, bad index).
    pub primitives_dropped: usize,
    pub triangles_rejected: usize,
    pub triangles_clipped: usize,
    /// Fan triangles handed to the rasterizer.
    pub triangles_rasterized: usize,
    pub pixels_written: usize,
}

impl AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.triangles_submitted += rhs.triangles_submitted;
        self.primitives_dropped += rhs.primitives_dropped;
        self.triangles_rejected += rhs.triangles_rejected;
        self.triangles_clipped += rhs.triangles_clipped;
        self.triangles_rasterized += rhs.triangles_rasterized;
        self.pixels_written += rhs.pixels_written;
    }
}

/// Divide `x, y` by view depth, keeping depth in `z`.
/// Vertices at `z == 0` are left as they are; the rasterizer skips them.
pub fn perspective_divide(format: &VertexFormat, vertex: &RawVertex) -> RawVertex {
    let mut out = *vertex;
    let p = format.get_position(vertex);
    if p.z != 0.0 {
        format.set_position(&mut out, Vec4::new(p.x / p.z, p.y / p.z, p.z, p.w));
    }
    out
}

pub struct Pipeline<'t> {
    state: PipelineState,
    clipper: Clipper,
    target: Option<RenderTarget<'t>>,
}

impl<'t> Default for Pipeline<'t> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t> Pipeline<'t> {
    pub fn new() -> Self {
        Self::with_config(RasterConfig::default())
    }

    pub fn with_config(config: RasterConfig) -> Self {
        Self {
            state: PipelineState::new(VertexFormat::empty(), config),
            clipper: Clipper::new(0),
            target: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    #[inline]
    pub fn config(&self) -> &RasterConfig {
        &self.state.config
    }

    pub fn set_config(&mut self, config: RasterConfig) {
        self.state.config = config;
    }

    /// Install a vertex layout. The clipper picks up the new stride.
    pub fn set_layout(&mut self, format: VertexFormat) {
        debug!(
            "vertex layout: {} attributes, stride {}",
            format.attributes().len(),
            format.stride()
        );
        if format.position_attribute().is_none() {
            warn!("vertex layout has no position attribute; nothing will be drawn");
        }
        self.clipper.set_stride(format.stride());
        self.state.format = format;
    }

    #[inline]
    pub fn layout(&self) -> &VertexFormat {
        &self.state.format
    }

    /// Value handed to every fragment shader (e.g. an `Arc<Texture>`).
    pub fn bind_fragment_uniform(&mut self, uniform: Uniform) {
        self.state.uniform = Some(uniform);
    }

    pub fn bind_fragment_uniform_value<T: std::any::Any + Send + Sync>(&mut self, value: T) {
        self.bind_fragment_uniform(Arc::new(value));
    }

    pub fn clear_fragment_uniform(&mut self) {
        self.state.uniform = None;
    }

    /// Take the camera's view-volume transform and clip range.
    pub fn set_camera(&mut self, camera: &Camera) {
        self.state.transform = camera.view_volume_matrix();
        self.set_clip_range(camera.near, camera.far);
    }

    /// Use a caller-provided transform. It must land in view-volume space.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.state.transform = transform;
    }

    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.state.transform
    }

    /// Rebuilds the cached frustum only if the range changed.
    pub fn set_clip_range(&mut self, near: f32, far: f32) {
        let frustum = &self.state.frustum;
        if frustum.near != near || frustum.far != far {
            debug!("rebuilding frustum: near {}, far {}", near, far);
            self.state.frustum = Frustum::new(near, far);
        }
    }

    #[inline]
    pub fn frustum(&self) -> &Frustum {
        &self.state.frustum
    }

    /// Bind a render target, returning the previous one.
    pub fn bind_target(&mut self, target: RenderTarget<'t>) -> Option<RenderTarget<'t>> {
        debug!("render target bound: {}x{}", target.width(), target.height());
        self.target.replace(target)
    }

    pub fn unbind_target(&mut self) -> Option<RenderTarget<'t>> {
        self.target.take()
    }

    #[inline]
    pub fn target(&self) -> Option<&RenderTarget<'t>> {
        self.target.as_ref()
    }

    #[inline]
    pub fn target_mut(&mut self) -> Option<&mut RenderTarget<'t>> {
        self.target.as_mut()
    }

    /// Draw one triangle from three raw vertices laid out per the current layout.
    pub fn draw_triangle(&mut self, vertices: [&[u8]; 3]) -> DrawStats {
        count_call!(FUNCTION_COUNTERS.draw_calls);
        let mut stats = DrawStats::default();
        self.submit(vertices, &mut stats);
        stats
    }

    /// Draw a mesh: every three indices form a triangle, vertex `i` starts at
    /// byte `i * stride` of `vertex_data`. Trailing indices are ignored.
    pub fn draw_indexed(&mut self, vertex_data: &[u8], indices: &[u32]) -> DrawStats {
        perf_scope!("draw_indexed");
        count_call!(FUNCTION_COUNTERS.draw_calls);
        let mut stats = DrawStats::default();
        let stride = self.clipper.stride();
        let vertex_count = if stride == 0 { 0 } else { vertex_data.len() / stride };

        let fetch = |index: u32| -> Option<&[u8]> {
            let start = (index as usize).checked_mul(stride)?;
            vertex_data.get(start..start.checked_add(stride)?)
        };

        for tri in indices.chunks_exact(3) {
            match (fetch(tri[0]), fetch(tri[1]), fetch(tri[2])) {
                (Some(a), Some(b), Some(c)) => self.submit([a, b, c], &mut stats),
                _ => {
                    warn!(
                        "triangle {:?} indexes past {} vertices; dropped",
                        tri, vertex_count
                    );
                    count_call!(FUNCTION_COUNTERS.primitives_dropped);
                    stats.triangles_submitted += 1;
                    stats.primitives_dropped += 1;
                }
            }
        }
        let trailing = indices.len() % 3;
        if trailing != 0 {
            debug!("ignoring {} trailing indices", trailing);
        }
        stats
    }

    fn submit(&mut self, vertices: [&[u8]; 3], stats: &mut DrawStats) {
        count_call!(FUNCTION_COUNTERS.triangles_submitted);
        stats.triangles_submitted += 1;

        let stride = self.clipper.stride();
        if stride == 0 {
            warn!("draw call without a vertex layout; triangle dropped");
            count_call!(FUNCTION_COUNTERS.primitives_dropped);
            stats.primitives_dropped += 1;
            return;
        }
        if let Some(i) = vertices.iter().position(|v| v.len() < stride) {
            warn!(
                "vertex {} has {} bytes, layout needs {}; triangle dropped",
                i,
                vertices[i].len(),
                stride
            );
            count_call!(FUNCTION_COUNTERS.primitives_dropped);
            stats.primitives_dropped += 1;
            return;
        }
        let Some(target) = self.target.as_mut() else {
            warn!("draw call with no render target bound; triangle dropped");
            count_call!(FUNCTION_COUNTERS.primitives_dropped);
            stats.primitives_dropped += 1;
            return;
        };

        let state = &self.state;
        let format = &state.format;
        let mut polygon = self.clipper.polygon(vertices[0], vertices[1], vertices[2]);
        for v in polygon.vertices_mut() {
            let p = format.get_position(v);
            format.set_position(v, state.transform * p);
        }

        match self.clipper.clip(format, &state.frustum, &mut polygon) {
            ClipOutcome::Rejected => {
                stats.triangles_rejected += 1;
                return;
            }
            ClipOutcome::Clipped => stats.triangles_clipped += 1,
            ClipOutcome::Inside => {}
        }

        for tri in polygon.fan() {
            let [a, b, c] = tri.map(|v| perspective_divide(format, &v));
            stats.triangles_rasterized += 1;
            stats.pixels_written += rasterize_triangle(state, target, &a, &b, &c);
        }
    }
}
