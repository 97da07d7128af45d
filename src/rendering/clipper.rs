/// Frustum clipping of format-agnostic polygons.
///
/// A triangle enters as a `ClipPolygon` and is clipped in place against
/// each frustum plane in turn. New vertices are synthesized with
/// `VertexFormat::interpolate`, so every attribute survives clipping.
use log::trace;

use crate::camera::{Frustum, Plane};
use crate::count_call;
use crate::perf::FUNCTION_COUNTERS;
use crate::vertex::{RawVertex, VertexFormat};

/// A triangle clipped by the frustum planes stays within 8 vertices in
/// every case the pipeline draws; going past it is an invariant violation.
pub const MAX_CLIP_VERTICES: usize = 8;

/// Fixed-capacity polygon with index-based insert/remove.
#[derive(Clone, Debug)]
pub struct ClipPolygon {
    vertices: [RawVertex; MAX_CLIP_VERTICES],
    len: usize,
}

impl ClipPolygon {
    pub fn empty() -> Self {
        Self {
            vertices: [RawVertex::zeroed(0); MAX_CLIP_VERTICES],
            len: 0,
        }
    }

    pub fn from_triangle(a: RawVertex, b: RawVertex, c: RawVertex) -> Self {
        let mut polygon = Self::empty();
        polygon.push(a);
        polygon.push(b);
        polygon.push(c);
        polygon
    }

    /// Copy a triangle out of caller memory, `stride` bytes per vertex.
    pub fn from_bytes(stride: usize, a: &[u8], b: &[u8], c: &[u8]) -> Self {
        let take = |bytes: &[u8]| RawVertex::from_bytes(&bytes[..stride.min(bytes.len())]);
        Self::from_triangle(take(a), take(b), take(c))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn vertices(&self) -> &[RawVertex] {
        &self.vertices[..self.len]
    }

    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [RawVertex] {
        &mut self.vertices[..self.len]
    }

    /// Insert at `index`, shifting the tail right.
    ///
    /// # Panics
    /// When the polygon already holds `MAX_CLIP_VERTICES` vertices.
    pub fn insert(&mut self, index: usize, vertex: RawVertex) {
        assert!(
            self.len < MAX_CLIP_VERTICES,
            "clip polygon overflow: inserting vertex {} into a full {}-vertex polygon",
            index,
            MAX_CLIP_VERTICES
        );
        debug_assert!(index <= self.len);
        self.vertices.copy_within(index..self.len, index + 1);
        self.vertices[index] = vertex;
        self.len += 1;
    }

    /// Append after the last vertex.
    ///
    /// # Panics
    /// Same as [`ClipPolygon::insert`].
    #[inline]
    pub fn push(&mut self, vertex: RawVertex) {
        self.insert(self.len, vertex);
    }

    /// Remove at `index`, shifting the tail left.
    pub fn remove(&mut self, index: usize) -> RawVertex {
        debug_assert!(index < self.len);
        let removed = self.vertices[index];
        self.vertices.copy_within(index + 1..self.len, index);
        self.len -= 1;
        removed
    }

    /// Fan triangulation `(v0, v[i+1], v[i+2])`.
    pub fn fan(&self) -> impl Iterator<Item = [RawVertex; 3]> + '_ {
        let first = self.vertices[0];
        (0..self.len.saturating_sub(2))
            .map(move |i| [first, self.vertices[i + 1], self.vertices[i + 2]])
    }

    /// Number of fan triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.len.saturating_sub(2)
    }
}

impl std::ops::Index<usize> for ClipPolygon {
    type Output = RawVertex;

    fn index(&self, index: usize) -> &RawVertex {
        &self.vertices()[index]
    }
}

/// What to do with the first endpoint of an edge.
#[derive(Copy, Clone, Debug)]
pub enum EdgeAction {
    /// Inside, and so is the next vertex.
    Keep,
    /// Outside, next inside: the entry point takes its place.
    Replace(RawVertex),
    /// Inside, next outside: the exit point follows it.
    InsertAfter(RawVertex),
    /// Outside, and so is the next vertex.
    Remove,
    /// First vertex of the polygon is outside. It must stay readable until
    /// the closing edge has been tested, so it is dropped only when the
    /// pass ends; the entry point (if any) takes its place in the result.
    RemoveDeferred(Option<RawVertex>),
}

/// Classify edge `a -> b` against `plane`.
///
/// Distances of exactly zero count as inside. When the inside endpoint sits
/// on the plane the crossing point would duplicate it, so none is emitted.
pub fn classify_edge(
    format: &VertexFormat,
    plane: &Plane,
    a: &RawVertex,
    b: &RawVertex,
    first: bool,
) -> EdgeAction {
    let d0 = plane.signed_distance4(format.get_position(a));
    let d1 = plane.signed_distance4(format.get_position(b));
    let a_in = d0 >= 0.0;
    let b_in = d1 >= 0.0;

    let crossing = || {
        let t = d0 / (d0 - d1);
        format.interpolate(a, b, t)
    };

    match (a_in, b_in) {
        (true, true) => EdgeAction::Keep,
        (true, false) if d0 == 0.0 => EdgeAction::Keep,
        (true, false) => EdgeAction::InsertAfter(crossing()),
        (false, true) => {
            let entry = if d1 == 0.0 { None } else { Some(crossing()) };
            match (first, entry) {
                (true, entry) => EdgeAction::RemoveDeferred(entry),
                (false, Some(v)) => EdgeAction::Replace(v),
                (false, None) => EdgeAction::Remove,
            }
        }
        (false, false) if first => EdgeAction::RemoveDeferred(None),
        (false, false) => EdgeAction::Remove,
    }
}

/// Clip `polygon` against one plane. Returns true if it changed.
///
/// The edge walk reads the polygon as it was when the pass started and
/// writes survivors into a second buffer, which replaces the polygon once
/// the wrap-around edge has been tested. The buffer only ever holds
/// vertices of the result, so it overflows only when the result does.
pub fn clip_against_plane(
    format: &VertexFormat,
    plane: &Plane,
    polygon: &mut ClipPolygon,
) -> bool {
    let count = polygon.len();
    let mut clipped = ClipPolygon::empty();
    let mut changed = false;

    for i in 0..count {
        let first = polygon[i];
        let action = classify_edge(format, plane, &first, &polygon[(i + 1) % count], i == 0);
        changed |= !matches!(action, EdgeAction::Keep);

        match action {
            EdgeAction::Keep => clipped.push(first),
            EdgeAction::Replace(v) | EdgeAction::RemoveDeferred(Some(v)) => clipped.push(v),
            EdgeAction::InsertAfter(v) => {
                clipped.push(first);
                clipped.push(v);
            }
            EdgeAction::Remove | EdgeAction::RemoveDeferred(None) => {}
        }
    }

    *polygon = clipped;
    changed
}

/// How a triangle related to the view volume.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClipOutcome {
    /// Untouched by every plane.
    Inside,
    /// Reshaped by at least one plane.
    Clipped,
    /// Nothing left to draw.
    Rejected,
}

/// Per-pipeline clipping stage. Knows how many bytes make up a vertex.
#[derive(Clone, Debug, Default)]
pub struct Clipper {
    stride: usize,
}

impl Clipper {
    pub fn new(stride: usize) -> Self {
        Self { stride }
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn set_stride(&mut self, stride: usize) {
        self.stride = stride;
    }

    /// Build a polygon from three raw vertices, copying `stride` bytes each.
    pub fn polygon(&self, a: &[u8], b: &[u8], c: &[u8]) -> ClipPolygon {
        ClipPolygon::from_bytes(self.stride, a, b, c)
    }

    /// Clip against every frustum plane, Near -> Left -> Right -> Top -> Bottom -> Far.
    pub fn clip(
        &self,
        format: &VertexFormat,
        frustum: &Frustum,
        polygon: &mut ClipPolygon,
    ) -> ClipOutcome {
        let mut touched = false;
        for plane in &frustum.planes {
            if polygon.is_empty() {
                break;
            }
            touched |= clip_against_plane(format, plane, polygon);
        }

        let outcome = if polygon.len() < 3 {
            count_call!(FUNCTION_COUNTERS.triangles_rejected);
            ClipOutcome::Rejected
        } else if touched {
            count_call!(FUNCTION_COUNTERS.triangles_clipped);
            ClipOutcome::Clipped
        } else {
            ClipOutcome::Inside
        };
        trace!("clip: {:?}, {} vertices", outcome, polygon.len());
        outcome
    }
}
