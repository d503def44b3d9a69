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

//! Provides the 4x4 column-major matrix type used for transforms and projections.

use super::vector::{Vec3, Vec4};
use std::ops::Mul;

/// A 4x4 column-major matrix, used for 3D affine transformations.
///
/// This is the primary type for representing transformations (translation,
/// rotation, scale) in 3D space, as well as camera view and projection
/// matrices. The memory layout is column-major, which is compatible with
/// modern graphics APIs using a [0, 1] depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a new matrix from four row vectors.
    #[inline]
    pub fn from_rows(rows: [Vec4; 4]) -> Self {
        Self::from_cols(
            Vec4::new(rows[0].x, rows[1].x, rows[2].x, rows[3].x),
            Vec4::new(rows[0].y, rows[1].y, rows[2].y, rows[3].y),
            Vec4::new(rows[0].z, rows[1].z, rows[2].z, rows[3].z),
            Vec4::new(rows[0].w, rows[1].w, rows[2].w, rows[3].w),
        )
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn get_row(&self, index: usize) -> Vec4 {
        Vec4 {
            x: self.cols[0].get(index),
            y: self.cols[1].get(index),
            z: self.cols[2].get(index),
            w: self.cols[3].get(index),
        }
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self {
            cols: [
                Vec4::new(1.0, 0.0, 0.0, 0.0),
                Vec4::new(0.0, 1.0, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 1.0, 0.0),
                Vec4::new(v.x, v.y, v.z, 1.0),
            ],
        }
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            cols: [
                Vec4::new(scale.x, 0.0, 0.0, 0.0),
                Vec4::new(0.0, scale.y, 0.0, 0.0),
                Vec4::new(0.0, 0.0, scale.z, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
        }
    }

    /// Creates a rotation matrix from an orthonormal basis.
    ///
    /// The basis vectors become the matrix columns, so the result maps local
    /// X/Y/Z onto `right`/`up`/`forward` respectively.
    #[inline]
    pub fn from_basis(right: Vec3, up: Vec3, forward: Vec3) -> Self {
        Self::from_cols(right.extend(0.0), up.extend(0.0), forward.extend(0.0), Vec4::W)
    }

    /// Creates a right-handed perspective projection matrix with a [0, 1] depth range (ZO).
    ///
    /// # Arguments
    ///
    /// * `fov_y_radians`: Vertical field of view in radians.
    /// * `aspect_ratio`: Width divided by height of the viewport.
    /// * `z_near`: Distance to the near clipping plane (must be positive).
    /// * `z_far`: Distance to the far clipping plane (must be positive and > `z_near`).
    #[inline]
    pub fn perspective_rh_zo(
        fov_y_radians: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        debug_assert!(z_near > 0.0 && z_far > z_near);
        let f = 1.0 / (fov_y_radians / 2.0).tan();
        let aa = f / aspect_ratio;
        let cc = z_far / (z_near - z_far);
        let dd = (z_near * z_far) / (z_near - z_far);

        Self::from_cols(
            Vec4::new(aa, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, cc, -1.0),
            Vec4::new(0.0, 0.0, dd, 0.0),
        )
    }

    /// Creates a right-handed orthographic projection matrix with a [0, 1] depth range (ZO).
    #[inline]
    pub fn orthographic_rh_zo(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let rml = right - left;
        let tmb = top - bottom;
        let fmn = z_far - z_near;

        Self::from_cols(
            Vec4::new(2.0 / rml, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / tmb, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0 / fmn, 0.0),
            Vec4::new(
                -(right + left) / rml,
                -(top + bottom) / tmb,
                -z_near / fmn,
                1.0,
            ),
        )
    }

    /// Creates a right-handed view matrix for a camera looking from `eye` towards `target`.
    ///
    /// Returns `None` if `eye` and `target` are too close, or if `up` is
    /// parallel to the view direction.
    #[inline]
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let forward = target - eye;
        if forward.length_squared() < super::EPSILON * super::EPSILON {
            return None;
        }
        let f = forward.normalize();
        let s = f.cross(up);
        if s.length_squared() < super::EPSILON * super::EPSILON {
            return None;
        }
        let s = s.normalize();
        let u = s.cross(f);

        Some(Self::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::new(-eye.dot(s), -eye.dot(u), eye.dot(f), 1.0),
        ))
    }

    /// Returns the transpose of the matrix, where rows and columns are swapped.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_rows(self.cols)
    }

    /// Transforms a point, applying the perspective divide.
    ///
    /// Points whose transformed `w` is near zero are returned unchanged in
    /// homogeneous terms (divided by 1), which keeps the function total.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = *self * p.extend(1.0);
        let w = if v.w.abs() > super::EPSILON { v.w } else { 1.0 };
        Vec3::new(v.x / w, v.y / w, v.z / w)
    }
}

impl Mul for Mat4 {
    type Output = Self;
    /// Multiplies two matrices (`self * rhs`).
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    /// Transforms a column vector by the matrix.
    #[inline]
    fn mul(self, v: Vec4) -> Vec4 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z + self.cols[3] * v.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_is_multiplicative_neutral() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mat4::IDENTITY * m, m);
        assert_eq!(m * Mat4::IDENTITY, m);
    }

    #[test]
    fn from_rows_round_trips_through_get_row() {
        let rows = [
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        ];
        let m = Mat4::from_rows(rows);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(m.get_row(i), *row);
        }
    }

    #[test]
    fn translation_moves_points() {
        let m = Mat4::from_translation(Vec3::new(10.0, 0.0, -5.0));
        let p = m.transform_point(Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p.x, 11.0);
        assert_relative_eq!(p.y, 2.0);
        assert_relative_eq!(p.z, -2.0);
    }

    #[test]
    fn perspective_maps_near_plane_to_zero_depth() {
        let proj = Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let on_near = proj.transform_point(Vec3::new(0.0, 0.0, -0.1));
        let on_far = proj.transform_point(Vec3::new(0.0, 0.0, -100.0));
        assert_relative_eq!(on_near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(on_far.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn orthographic_maps_extents_to_unit_range() {
        let proj = Mat4::orthographic_rh_zo(-2.0, 2.0, -1.0, 1.0, 0.0, 10.0);
        let p = proj.transform_point(Vec3::new(2.0, 1.0, -10.0));
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 1.0);
        assert_relative_eq!(p.z, 1.0);
    }

    #[test]
    fn look_at_rejects_degenerate_configurations() {
        assert!(Mat4::look_at_rh(Vec3::ZERO, Vec3::ZERO, Vec3::Y).is_none());
        assert!(Mat4::look_at_rh(Vec3::ZERO, Vec3::Y * 5.0, Vec3::Y).is_none());
    }

    #[test]
    fn look_at_places_eye_at_origin() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .unwrap();
        let p = view.transform_point(Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(p.length(), 0.0, epsilon = 1e-5);
        // The target lies along -Z in view space.
        let t = view.transform_point(Vec3::ZERO);
        assert_relative_eq!(t.z, -5.0, epsilon = 1e-5);
    }
}
