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

//! Provides bounding volumes and the frustum-plane test used for culling.

use serde::{Deserialize, Serialize};

use super::matrix::Mat4;
use super::vector::Vec3;

/// An axis-aligned bounding box defined by its minimum and maximum corners.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// The corner with the smallest coordinates.
    pub min: Vec3,
    /// The corner with the largest coordinates.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a bounding box from its minimum and maximum corners.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from a center point and half-extents.
    #[inline]
    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns the center of the bounding box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Tests this box against a set of frustum planes.
    ///
    /// Uses the positive-vertex test: for each plane, only the box corner
    /// furthest along the plane normal is checked. Returns `false` when the
    /// box lies entirely outside any plane.
    pub fn intersects_frustum(&self, planes: &[Plane; 6]) -> bool {
        for plane in planes {
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { self.max.x } else { self.min.x },
                if plane.normal.y >= 0.0 { self.max.y } else { self.min.y },
                if plane.normal.z >= 0.0 { self.max.z } else { self.min.z },
            );
            if plane.signed_distance(p) < 0.0 {
                return false;
            }
        }
        true
    }
}

/// A plane in the form `normal · p + d = 0`, with the normal pointing inward.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    /// The plane normal. Not necessarily unit length.
    pub normal: Vec3,
    /// The plane's distance term.
    pub d: f32,
}

impl Plane {
    /// Returns the signed distance from the plane to a point.
    ///
    /// Positive values lie on the side the normal points towards.
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    /// Returns the plane with its normal scaled to unit length.
    #[inline]
    pub fn normalized(&self) -> Self {
        let len = self.normal.length();
        if len > super::EPSILON {
            Self {
                normal: self.normal / len,
                d: self.d / len,
            }
        } else {
            *self
        }
    }
}

/// Extracts the six frustum planes from a view-projection matrix.
///
/// Planes are returned in left, right, bottom, top, near, far order, with
/// inward-pointing normals, for a [0, 1] depth-range projection.
pub fn frustum_planes(view_projection: &Mat4) -> [Plane; 6] {
    let r0 = view_projection.get_row(0);
    let r1 = view_projection.get_row(1);
    let r2 = view_projection.get_row(2);
    let r3 = view_projection.get_row(3);

    let plane = |v: super::vector::Vec4| {
        Plane {
            normal: v.truncate(),
            d: v.w,
        }
        .normalized()
    };

    [
        plane(r3 + r0), // left
        plane(r3 - r0), // right
        plane(r3 + r1), // bottom
        plane(r3 - r1), // top
        plane(r2),      // near (depth >= 0)
        plane(r3 - r2), // far
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frustum() -> [Plane; 6] {
        // Camera at origin looking down -Z.
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .unwrap();
        let proj = Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        frustum_planes(&(proj * view))
    }

    #[test]
    fn box_in_front_of_camera_intersects() {
        let planes = test_frustum();
        let b = Aabb::from_center_extents(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE);
        assert!(b.intersects_frustum(&planes));
    }

    #[test]
    fn box_behind_camera_is_rejected() {
        let planes = test_frustum();
        let b = Aabb::from_center_extents(Vec3::new(0.0, 0.0, 10.0), Vec3::ONE);
        assert!(!b.intersects_frustum(&planes));
    }

    #[test]
    fn box_beyond_far_plane_is_rejected() {
        let planes = test_frustum();
        let b = Aabb::from_center_extents(Vec3::new(0.0, 0.0, -500.0), Vec3::ONE);
        assert!(!b.intersects_frustum(&planes));
    }

    #[test]
    fn box_straddling_a_plane_intersects() {
        let planes = test_frustum();
        // Crosses the near plane.
        let b = Aabb::from_center_extents(Vec3::new(0.0, 0.0, -0.1), Vec3::ONE);
        assert!(b.intersects_frustum(&planes));
    }
}
