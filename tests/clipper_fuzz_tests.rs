//! Differential fuzzing of the frustum clipper against a textbook
//! Sutherland-Hodgman clipper working on plain `Vec3` polygons.
use glam::{Vec3, Vec4};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use softraster::rendering::clipper::{clip_against_plane, MAX_CLIP_VERTICES};
use softraster::{
    AttributeUsage, ClipOutcome, ClipPolygon, Clipper, Frustum, NumericKind, Plane, RawVertex,
    VertexFormat,
};

const NEAR: f32 = 0.5;
const EPS: f32 = 1e-3;

fn layout() -> VertexFormat {
    VertexFormat::builder()
        .attribute(AttributeUsage::Position, NumericKind::Vec3)
        .attribute(AttributeUsage::Custom(0), NumericKind::Scalar)
        .build()
        .unwrap()
}

/// A linear function of position, stored as the custom attribute.
/// Interpolation along any edge must keep it exact.
fn linear_channel(p: Vec3) -> f32 {
    p.x + 2.0 * p.y - 0.5 * p.z + 1.0
}

fn make_vertex(p: Vec3) -> RawVertex {
    RawVertex::from_floats(&[p.x, p.y, p.z, linear_channel(p)])
}

// --- Reference clipper ---

fn reference_clip(plane: &Plane, input: &[Vec3]) -> Vec<Vec3> {
    let mut output = Vec::with_capacity(input.len() + 1);
    for i in 0..input.len() {
        let s = input[i];
        let e = input[(i + 1) % input.len()];
        let ds = plane.signed_distance(s);
        let de = plane.signed_distance(e);
        // Intersections are emitted only for strict crossings.
        let crossing = || {
            let t = ds / (ds - de);
            s * (1.0 - t) + e * t
        };
        if de >= 0.0 {
            if ds < 0.0 && de > 0.0 {
                output.push(crossing());
            }
            output.push(e);
        } else if ds > 0.0 {
            output.push(crossing());
        }
    }
    output
}

fn reference_clip_all(frustum: &Frustum, triangle: [Vec3; 3]) -> Vec<Vec3> {
    let mut polygon = triangle.to_vec();
    for plane in &frustum.planes {
        if polygon.is_empty() {
            break;
        }
        polygon = reference_clip(plane, &polygon);
    }
    polygon
}

fn close(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPS * (1.0 + a.length())
}

/// True if `b` is a cyclic rotation of `a`.
fn same_cycle(a: &[Vec3], b: &[Vec3]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }
    (0..b.len()).any(|shift| {
        a.iter()
            .enumerate()
            .all(|(i, p)| close(*p, b[(i + shift) % b.len()]))
    })
}

fn random_point(rng: &mut ChaCha8Rng, spread: f32, depth: (f32, f32)) -> Vec3 {
    Vec3::new(
        rng.gen_range(-spread..spread),
        rng.gen_range(-spread..spread),
        rng.gen_range(depth.0..depth.1),
    )
}

#[derive(Default, Debug)]
struct Tally {
    inside: usize,
    clipped: usize,
    rejected: usize,
    /// Results too large for the clip polygon; not clipped.
    oversized: usize,
    largest: usize,
}

/// Clip `triangle` with the crate clipper and check it against the reference.
fn check_triangle(
    format: &VertexFormat,
    frustum: &Frustum,
    triangle: [Vec3; 3],
    tally: &mut Tally,
) {
    let expected = reference_clip_all(frustum, triangle);
    if expected.len() > MAX_CLIP_VERTICES {
        tally.oversized += 1;
        return;
    }

    let clipper = Clipper::new(format.stride());
    let mut polygon = ClipPolygon::from_triangle(
        make_vertex(triangle[0]),
        make_vertex(triangle[1]),
        make_vertex(triangle[2]),
    );
    let outcome = clipper.clip(format, frustum, &mut polygon);

    if expected.len() < 3 {
        assert_eq!(outcome, ClipOutcome::Rejected, "{:?}", triangle);
        tally.rejected += 1;
        return;
    }
    assert_ne!(outcome, ClipOutcome::Rejected, "{:?}", triangle);
    match outcome {
        ClipOutcome::Inside => tally.inside += 1,
        _ => tally.clipped += 1,
    }
    tally.largest = tally.largest.max(polygon.len());

    let got: Vec<Vec3> = polygon
        .vertices()
        .iter()
        .map(|v| format.get_position(v).truncate())
        .collect();
    assert!(
        same_cycle(&got, &expected),
        "{:?}\n got      {:?}\n expected {:?}",
        triangle,
        got,
        expected
    );

    for v in polygon.vertices() {
        let p = format.get_position(v).truncate();
        let attr = format.get_attribute(v, AttributeUsage::Custom(0)).x;
        let want = linear_channel(p);
        assert!(
            (attr - want).abs() < 1e-2 * (1.0 + want.abs()),
            "attribute drifted at {:?}",
            p
        );
        for plane in &frustum.planes {
            assert!(
                plane.signed_distance(p) > -EPS * (1.0 + p.length()),
                "{:?} outside {:?}",
                p,
                plane
            );
        }
    }
    assert_eq!(polygon.triangle_count(), polygon.len() - 2);
}

// --- Tests ---

#[test]
fn clipper_matches_reference() {
    let format = layout();
    let frustum = Frustum::new(NEAR, 1.0e6);
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_c11b);

    let mut tally = Tally::default();
    for _ in 0..5000 {
        let triangle = [(); 3].map(|_| random_point(&mut rng, 4.0, (-1.5, 5.0)));
        check_triangle(&format, &frustum, triangle, &mut tally);
    }

    // The generator should exercise every outcome.
    assert!(tally.inside > 0 && tally.clipped > 0 && tally.rejected > 0, "{:?}", tally);
}

#[test]
fn large_triangles_cut_by_every_plane_match_reference() {
    let format = layout();
    let frustum = Frustum::new(NEAR, 8.0);
    let mut rng = ChaCha8Rng::seed_from_u64(0xc11b_f4a5);

    let mut tally = Tally::default();
    for _ in 0..5000 {
        let triangle = [(); 3].map(|_| random_point(&mut rng, 20.0, (-5.0, 12.0)));
        check_triangle(&format, &frustum, triangle, &mut tally);
    }

    assert!(tally.clipped > 0 && tally.rejected > 0, "{:?}", tally);
    // Polygons near capacity are where the walk is most likely to overflow.
    assert!(tally.largest >= 7, "{:?}", tally);
}

#[test]
fn coplanar_vertices_are_never_duplicated() {
    let format = layout();
    let plane = Plane::new(Vec3::Z, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..2000 {
        // One vertex exactly on the plane, the others on random sides.
        let on = Vec3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), 1.0);
        let a = random_point(&mut rng, 2.0, (-1.0, 3.0));
        let b = random_point(&mut rng, 2.0, (-1.0, 3.0));
        let rotation = rng.gen_range(0..3);
        let mut tri = [on, a, b];
        tri.rotate_left(rotation);

        let [p0, p1, p2] = tri.map(make_vertex);
        let mut polygon = ClipPolygon::from_triangle(p0, p1, p2);
        clip_against_plane(&format, &plane, &mut polygon);

        let points: Vec<Vec4> =
            polygon.vertices().iter().map(|v| format.get_position(v)).collect();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                assert_ne!(points[i], points[j], "duplicate vertex clipping {:?}", tri);
            }
        }
        assert!(points.len() <= 4);
    }
}
