/// Camera contract for the pipeline.
///
/// The camera produces one pure 4x4 transform into *view-volume space*:
/// `x' = x * f / aspect`, `y' = -y * f`, `z' = depth in front of the eye`,
/// with `f = 1 / tan(fov / 2)`. In that space the visible region is the
/// pyramid `|x'| <= z'`, `|y'| <= z'`, truncated by `near <= z' <= far`,
/// so the six clip planes depend only on near and far.
use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // Rotation around Y axis (radians)
    pub pitch: f32, // Rotation around X axis (radians)
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 1.0)
    }
}

impl Camera {
    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: 90.0,
            near: 0.1,
            far: 1000.0,
            aspect_ratio,
        }
    }

    /// Update camera orientation to look at a specific target point.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let view_matrix = Mat4::look_at_rh(self.position, target, up);
        let rotation_quat = Quat::from_mat4(&view_matrix.inverse());
        let (yaw, pitch, _roll) = rotation_quat.to_euler(glam::EulerRot::YXZ);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Right-handed view matrix; the camera looks down its local -Z.
    pub fn view_matrix(&self) -> Mat4 {
        let rotation = self.rotation_quat();
        let forward = rotation * Vec3::NEG_Z;
        let up = rotation * Vec3::Y;
        Mat4::look_at_rh(self.position, self.position + forward, up)
    }

    /// Focal scale `1 / tan(fov / 2)`.
    #[inline]
    pub fn focal_length(&self) -> f32 {
        1.0 / (self.fov.to_radians() * 0.5).tan()
    }

    /// View space -> view-volume space. Depth is not remapped.
    pub fn projection_matrix(&self) -> Mat4 {
        let f = self.focal_length();
        let aspect = if self.aspect_ratio > 0.0 { self.aspect_ratio } else { 1.0 };
        Mat4::from_scale(Vec3::new(f / aspect, -f, -1.0))
    }

    /// World space -> view-volume space.
    pub fn view_volume_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation_quat() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation_quat() * Vec3::Y
    }

    fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.near, self.far)
    }
}

/// Clip plane; points with `signed_distance >= 0` are inside.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    /// Signed distance of a homogeneous position (w is ignored).
    #[inline]
    pub fn signed_distance4(&self, point: Vec4) -> f32 {
        self.signed_distance(point.truncate())
    }
}

/// Plane identities, in clipping order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrustumPlane {
    Near,
    Left,
    Right,
    Top,
    Bottom,
    Far,
}

impl FrustumPlane {
    pub const ORDER: [FrustumPlane; 6] = [
        FrustumPlane::Near,
        FrustumPlane::Left,
        FrustumPlane::Right,
        FrustumPlane::Top,
        FrustumPlane::Bottom,
        FrustumPlane::Far,
    ];
}

/// The six view-volume planes, stored in `FrustumPlane::ORDER`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    pub near: f32,
    pub far: f32,
    pub planes: [Plane; 6],
}

impl Frustum {
    pub fn new(near: f32, far: f32) -> Self {
        let s = std::f32::consts::FRAC_1_SQRT_2;
        let planes = [
            Plane::new(Vec3::Z, near),                // z >= near
            Plane::new(Vec3::new(s, 0.0, s), 0.0),    // x >= -z
            Plane::new(Vec3::new(-s, 0.0, s), 0.0),   // x <= z
            Plane::new(Vec3::new(0.0, s, s), 0.0),    // y >= -z (screen top)
            Plane::new(Vec3::new(0.0, -s, s), 0.0),   // y <= z
            Plane::new(Vec3::NEG_Z, -far),            // z <= far
        ];
        Self { near, far, planes }
    }

    #[inline]
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// True if the view-volume point lies inside (or on) every plane.
    pub fn contains(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new(0.1, 1000.0)
    }
}
