// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the camera description the scheduler renders frames for.

use crate::math::{Mat4, Vec3};

/// The role a camera plays, which changes how its frame is scheduled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CameraKind {
    /// A gameplay camera. Participates in temporal parity and UI overlay.
    Game,
    /// An editor scene-view camera. Rendered as a parity-free single shot
    /// with gizmos, never toggling the checker bit.
    SceneView,
    /// An editor preview camera (inspector thumbnails). Parity-free, no UI.
    Preview,
}

/// A camera the pipeline renders one frame for.
///
/// Orientation is described by a `forward`/`up` pair rather than a full
/// transform; the scheduler derives view and projection matrices from it.
#[derive(Debug, Clone)]
pub struct Camera {
    /// The camera's name, used for recorder labels and parity matching.
    pub name: String,
    /// The camera's scheduling role.
    pub kind: CameraKind,
    /// Output width in pixels.
    pub pixel_width: u32,
    /// Output height in pixels.
    pub pixel_height: u32,
    /// Near clipping distance.
    pub near: f32,
    /// Far clipping distance.
    pub far: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Position in world space.
    pub position: Vec3,
    /// Normalized view direction.
    pub forward: Vec3,
    /// Normalized up direction.
    pub up: Vec3,
}

impl Camera {
    /// Creates a game camera with sensible projection defaults, looking down
    /// the negative Z axis from the origin.
    pub fn new(name: impl Into<String>, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            name: name.into(),
            kind: CameraKind::Game,
            pixel_width,
            pixel_height,
            near: 0.1,
            far: 1000.0,
            fov_y: crate::math::degrees_to_radians(60.0),
            position: Vec3::ZERO,
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
        }
    }

    /// Returns a copy with the scheduling role replaced.
    pub fn with_kind(mut self, kind: CameraKind) -> Self {
        self.kind = kind;
        self
    }

    /// The output aspect ratio (width over height).
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.pixel_width as f32 / self.pixel_height as f32
    }

    /// The camera's right vector, completing the orientation basis.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize()
    }

    /// Whether the camera can produce a valid perspective frustum.
    ///
    /// A zero-sized viewport, a non-positive near plane, a far plane at or
    /// behind the near plane, or a degenerate field of view all make
    /// projection impossible; callers treat such a camera as uncullable
    /// this tick rather than rendering it.
    pub fn has_valid_frustum(&self) -> bool {
        self.pixel_width > 0
            && self.pixel_height > 0
            && self.near > 0.0
            && self.far > self.near
            && self.fov_y > 0.0
            && self.fov_y < std::f32::consts::PI
    }

    /// The world-to-view matrix.
    ///
    /// Falls back to identity when the orientation basis is degenerate,
    /// which only happens for malformed camera data.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
            .unwrap_or(Mat4::IDENTITY)
    }

    /// The view-to-clip matrix ([0, 1] depth range).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_zo(self.fov_y, self.aspect(), self.near, self.far)
    }

    /// The combined world-to-clip matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The rotation part of the camera's world transform, as a matrix.
    pub fn orientation(&self) -> Mat4 {
        Mat4::from_basis(self.right(), self.up, -self.forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn view_matrix_moves_camera_to_origin() {
        let mut cam = Camera::new("test", 800, 450);
        cam.position = Vec3::new(3.0, 4.0, 5.0);
        let view = cam.view_matrix();
        let p = view.transform_point(cam.position);
        assert_relative_eq!(p.length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn frustum_validity_rejects_degenerate_planes() {
        let mut cam = Camera::new("test", 800, 450);
        assert!(cam.has_valid_frustum());

        cam.near = 0.0;
        assert!(!cam.has_valid_frustum());

        cam.near = 10.0;
        cam.far = 5.0;
        assert!(!cam.has_valid_frustum());

        cam.far = 1000.0;
        cam.pixel_height = 0;
        assert!(!cam.has_valid_frustum());
    }

    #[test]
    fn aspect_matches_pixel_dimensions() {
        let cam = Camera::new("test", 1920, 1080);
        assert_relative_eq!(cam.aspect(), 16.0 / 9.0, epsilon = 1e-6);
    }
}
