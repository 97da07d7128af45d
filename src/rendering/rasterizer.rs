/// Perspective-correct scanline rasterizer.
///
/// Triangles arrive with `x, y` already divided by depth and the view depth
/// in `z`. Attributes are pre-divided by depth, walked linearly down the
/// edges and across each span, then divided back per pixel.
/// Rows and pixels are sampled at their centres (`y + 0.5`, `x + 0.5`) with
/// half-open coverage, so triangles sharing an edge never overlap or leave gaps.
use glam::{Vec2, Vec4};

use super::framebuffer::RenderTarget;
use super::shading::Fragment;
use crate::perf::FUNCTION_COUNTERS;
use crate::{count_add, count_call};
use crate::pipeline::PipelineState;
use crate::vertex::{RawVertex, UsageMask, VertexFormat};

/// How the sorted triangle splits into spans.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriangleShape {
    /// Top two vertices share a row.
    FlatTop,
    /// Bottom two vertices share a row.
    FlatBottom,
    /// Needs two spans, split at the middle vertex.
    General,
}

/// One triangle edge, oriented top to bottom.
#[derive(Copy, Clone)]
struct Edge {
    top: RawVertex,
    bottom: RawVertex,
    y0: f32,
    y1: f32,
}

impl Edge {
    fn new(top: &ScreenVertex, bottom: &ScreenVertex) -> Self {
        Self {
            top: top.prepared,
            bottom: bottom.prepared,
            y0: top.screen.y,
            y1: bottom.screen.y,
        }
    }

    /// Edge vertex at scanline centre `yc`.
    #[inline]
    fn at(&self, format: &VertexFormat, yc: f32) -> RawVertex {
        let t = (yc - self.y0) / (self.y1 - self.y0);
        format.interpolate(&self.top, &self.bottom, t)
    }
}

/// A vertex after viewport mapping and perspective prep.
#[derive(Copy, Clone)]
struct ScreenVertex {
    screen: Vec2,
    depth: f32,
    prepared: RawVertex,
}

#[inline]
fn inverse_depth(z: f32) -> f32 {
    if z != 0.0 && z.is_finite() {
        1.0 / z
    } else {
        0.0
    }
}

/// NDC `[-1, 1]` to pixel coordinates. Y grows downwards.
#[inline]
pub fn ndc_to_screen(ndc: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new((ndc.x + 1.0) * width * 0.5, (ndc.y + 1.0) * height * 0.5)
}

/// Classify a triangle whose vertices are sorted by ascending `y`.
pub fn classify(y_top: f32, y_mid: f32, y_bottom: f32) -> TriangleShape {
    if y_top == y_mid {
        TriangleShape::FlatTop
    } else if y_mid == y_bottom {
        TriangleShape::FlatBottom
    } else {
        TriangleShape::General
    }
}

/// Rasterize one triangle into `target`. Returns the number of pixels written.
pub fn rasterize_triangle(
    state: &PipelineState,
    target: &mut RenderTarget<'_>,
    v0: &RawVertex,
    v1: &RawVertex,
    v2: &RawVertex,
) -> usize {
    count_call!(FUNCTION_COUNTERS.triangles_rasterized);
    let format = &state.format;
    let width = target.width() as f32;
    let height = target.height() as f32;

    let project = |v: &RawVertex| {
        let p = format.get_position(v);
        (ndc_to_screen(Vec2::new(p.x, p.y), width, height), p.z, *v)
    };
    let mut s = [project(v0), project(v1), project(v2)];

    // Sort by screen y, keeping depth and vertex in lock-step.
    if s[1].0.y < s[0].0.y {
        s.swap(0, 1);
    }
    if s[2].0.y < s[1].0.y {
        s.swap(1, 2);
    }
    if s[1].0.y < s[0].0.y {
        s.swap(0, 1);
    }

    let (top, mid, bottom) = (s[0].0, s[1].0, s[2].0);
    // Written so that NaN coordinates also bail out.
    if !(bottom.y > top.y) {
        count_call!(FUNCTION_COUNTERS.triangles_degenerate);
        return 0;
    }
    let area = (mid - top).perp_dot(bottom - top) * 0.5;
    if !(area.abs() > state.config.cull_degenerate_area) {
        count_call!(FUNCTION_COUNTERS.triangles_degenerate);
        return 0;
    }

    // Perspective prep: attributes / z, position becomes (px, py, 1/z).
    let prepare = |(screen, depth, vertex): (Vec2, f32, RawVertex)| {
        let inv_z = inverse_depth(depth);
        let mut prepared = format.scale(&vertex, inv_z, UsageMask::POSITION);
        format.set_position(&mut prepared, Vec4::new(screen.x, screen.y, inv_z, 1.0));
        ScreenVertex {
            screen,
            depth,
            prepared,
        }
    };
    let [a, b, c] = s.map(prepare);

    let long = Edge::new(&a, &c);
    let (top, bottom) = (a.screen.y, c.screen.y);
    let mut written = 0;
    match classify(a.screen.y, b.screen.y, c.screen.y) {
        TriangleShape::FlatTop => {
            let short = Edge::new(&b, &c);
            let short_left = b.screen.x < a.screen.x;
            written += scan_span(state, target, &long, &short, short_left, top, bottom);
        }
        TriangleShape::FlatBottom => {
            let short = Edge::new(&a, &b);
            let short_left = b.screen.x < c.screen.x;
            written += scan_span(state, target, &long, &short, short_left, top, bottom);
        }
        TriangleShape::General => {
            // Which side of the long edge the bend vertex falls on.
            let t = (b.screen.y - a.screen.y) / (c.screen.y - a.screen.y);
            let long_x = a.screen.x + (c.screen.x - a.screen.x) * t;
            let bend_left = b.screen.x < long_x;

            let upper = Edge::new(&a, &b);
            let lower = Edge::new(&b, &c);
            written += scan_span(state, target, &long, &upper, bend_left, a.screen.y, b.screen.y);
            written += scan_span(state, target, &long, &lower, bend_left, b.screen.y, c.screen.y);
        }
    }

    if written == 0 {
        log::trace!(
            "triangle produced no pixels (depths {}, {}, {})",
            a.depth,
            b.depth,
            c.depth
        );
    }
    written
}

/// Walk the rows whose centres lie in `[y_from, y_to)`.
fn scan_span(
    state: &PipelineState,
    target: &mut RenderTarget<'_>,
    long: &Edge,
    short: &Edge,
    short_on_left: bool,
    y_from: f32,
    y_to: f32,
) -> usize {
    let format = &state.format;
    let y_start = ((y_from - 0.5).ceil() as i32).max(0);
    let y_end = ((y_to - 0.5).ceil() as i32).min(target.height() as i32);

    let mut written = 0;
    for y in y_start..y_end {
        let yc = y as f32 + 0.5;
        let on_long = long.at(format, yc);
        let on_short = short.at(format, yc);
        let (left, right) = if short_on_left {
            (on_short, on_long)
        } else {
            (on_long, on_short)
        };
        let x1 = format.get_position(&left).x;
        let x2 = format.get_position(&right).x;
        written += draw_scanline(state, target, x1, x2, y, &left, &right);
    }
    written
}

/// Fill pixels whose centres lie in `[x1, x2)` on row `y`, interpolating
/// between the prepared edge vertices `a` (at `x1`) and `b` (at `x2`).
/// Returns the number of pixels written.
pub fn draw_scanline(
    state: &PipelineState,
    target: &mut RenderTarget<'_>,
    x1: f32,
    x2: f32,
    y: i32,
    a: &RawVertex,
    b: &RawVertex,
) -> usize {
    let format = &state.format;
    if y < 0 || y as usize >= target.height() {
        return 0;
    }

    let inv_z_a = format.get_position(a).z;
    let inv_z_b = format.get_position(b).z;
    if inv_z_a == 0.0 || inv_z_b == 0.0 {
        count_call!(FUNCTION_COUNTERS.scanlines_skipped);
        return 0;
    }

    let (x1, x2, a, b) = if x2 < x1 { (x2, x1, b, a) } else { (x1, x2, a, b) };
    let span = x2 - x1;
    if !(span > 0.0) {
        return 0;
    }

    let x_start = ((x1 - 0.5).ceil() as i32).max(0);
    let x_end = ((x2 - 0.5).ceil() as i32).min(target.width() as i32);
    if x_start >= x_end {
        return 0;
    }
    count_call!(FUNCTION_COUNTERS.scanlines_drawn);

    let mut written = 0;
    for x in x_start..x_end {
        let t = (x as f32 + 0.5 - x1) / span;
        let v = format.interpolate(a, b, t);
        let inv_z = format.get_position(&v).z;
        if inv_z == 0.0 || !inv_z.is_finite() {
            continue;
        }
        let corrected = format.scale(&v, 1.0 / inv_z, UsageMask::POSITION);

        let mut fragment = Fragment::new(x, y, state.config.base_color);
        format.apply_fragment(&corrected, state.uniform.as_ref(), &mut fragment);
        if target.set_pixel(x as usize, y as usize, fragment.color) {
            written += 1;
        }
    }
    count_add!(FUNCTION_COUNTERS.pixels_written, written as u64);
    written
}
