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

//! Defines visible-light data and the GPU light-record layout.

use crate::math::{LinearRgba, Mat4, Vec3};

use super::handle::TextureId;

/// The kind of a light source.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LightKind {
    /// A light infinitely far away with parallel rays (sun).
    Directional,
    /// A light radiating in all directions from a point.
    Point,
    /// A cone-shaped light.
    Spot,
    /// A baked-only area light.
    Area,
}

impl LightKind {
    /// The integer tag shaders use to branch on the light kind.
    #[inline]
    pub const fn shader_tag(self) -> i32 {
        match self {
            LightKind::Directional => 0,
            LightKind::Point => 1,
            LightKind::Spot => 2,
            LightKind::Area => 3,
        }
    }
}

/// How a light casts runtime shadows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShadowMode {
    /// The light casts no runtime shadows.
    None,
    /// Hard-edged shadow sampling.
    Hard,
    /// Filtered shadow sampling.
    Soft,
}

impl ShadowMode {
    /// Returns `true` if the light should receive a shadow-atlas slot.
    #[inline]
    pub const fn casts_shadows(self) -> bool {
        !matches!(self, ShadowMode::None)
    }
}

/// One light that survived culling for the current camera.
///
/// This is the pipeline's view of a scene light: enough to build its GPU
/// record, decide shadow participation, and draw its screen volume.
#[derive(Debug, Clone)]
pub struct VisibleLight {
    /// The light kind.
    pub kind: LightKind,
    /// Spot cone's full outer angle in radians. Zero for other kinds.
    pub outer_angle: f32,
    /// The light's local-to-world transform.
    pub local_to_world: Mat4,
    /// World-space position. Meaningless for directional lights.
    pub position: Vec3,
    /// Normalized world-space direction the light shines towards.
    pub direction: Vec3,
    /// Linear-space color.
    pub color: LinearRgba,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Influence range in world units. Ignored for directional lights.
    pub range: f32,
    /// `true` when the light's contribution is fully baked and must be
    /// skipped at runtime.
    pub baked: bool,
    /// Runtime shadow participation.
    pub shadow_mode: ShadowMode,
    /// Depth bias applied when rendering this light's shadow map.
    pub shadow_bias: f32,
    /// Optional projection texture (cookie) for point and spot lights.
    pub cookie: Option<TextureId>,
}

impl VisibleLight {
    /// Creates a white directional light shining along `direction`.
    pub fn directional(direction: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            outer_angle: 0.0,
            local_to_world: Mat4::IDENTITY,
            position: Vec3::ZERO,
            direction: direction.normalize(),
            color: LinearRgba::WHITE,
            intensity: 1.0,
            range: 0.0,
            baked: false,
            shadow_mode: ShadowMode::None,
            shadow_bias: 0.05,
            cookie: None,
        }
    }

    /// Creates a white point light at `position` with the given range.
    pub fn point(position: Vec3, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            outer_angle: 0.0,
            local_to_world: Mat4::from_translation(position),
            position,
            direction: Vec3::new(0.0, 0.0, -1.0),
            color: LinearRgba::WHITE,
            intensity: 1.0,
            range,
            baked: false,
            shadow_mode: ShadowMode::None,
            shadow_bias: 0.05,
            cookie: None,
        }
    }

    /// Creates a white spot light at `position` shining along `direction`.
    pub fn spot(position: Vec3, direction: Vec3, range: f32, outer_angle: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            outer_angle,
            local_to_world: Mat4::from_translation(position),
            position,
            direction: direction.normalize(),
            color: LinearRgba::WHITE,
            intensity: 1.0,
            range,
            baked: false,
            shadow_mode: ShadowMode::None,
            shadow_bias: 0.05,
            cookie: None,
        }
    }

    /// Returns a copy with runtime shadows enabled in the given mode.
    pub fn with_shadows(mut self, mode: ShadowMode) -> Self {
        self.shadow_mode = mode;
        self
    }
}

/// A reflection probe that survived culling for the current camera.
#[derive(Debug, Clone)]
pub struct VisibleReflectionProbe {
    /// The probe's local-to-world transform (its influence box frame).
    pub local_to_world: Mat4,
    /// The influence box size in local units.
    pub size: Vec3,
    /// Intensity multiplier for the captured environment.
    pub intensity: f32,
    /// The captured environment cubemap.
    pub texture: TextureId,
}

/// The GPU-side layout of one light, uploaded into the frame's light buffer.
///
/// The field order is the shader's struct layout; the stride is
/// `size_of::<LightRecord>()` (52 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRecord {
    /// The kind tag (see [`LightKind::shader_tag`]).
    pub kind: i32,
    /// World-space position.
    pub position: [f32; 3],
    /// Normalized world-space direction.
    pub direction: [f32; 3],
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Squared influence range, for attenuation without a sqrt.
    pub sqr_range: f32,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Shadow-atlas slot, or `-1` when the light casts no shadows.
    pub shadow_slot: i32,
}

impl LightRecord {
    /// The buffer stride in bytes.
    pub const STRIDE: u32 = std::mem::size_of::<LightRecord>() as u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_record_stride_matches_shader_layout() {
        assert_eq!(LightRecord::STRIDE, 52);
    }

    #[test]
    fn shader_tags_are_stable() {
        assert_eq!(LightKind::Directional.shader_tag(), 0);
        assert_eq!(LightKind::Point.shader_tag(), 1);
        assert_eq!(LightKind::Spot.shader_tag(), 2);
        assert_eq!(LightKind::Area.shader_tag(), 3);
    }

    #[test]
    fn shadow_mode_gates_slot_assignment() {
        assert!(!ShadowMode::None.casts_shadows());
        assert!(ShadowMode::Hard.casts_shadows());
        assert!(ShadowMode::Soft.casts_shadows());
    }
}
