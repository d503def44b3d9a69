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

//! Shadow-atlas rendering and slot management.
//!
//! Shadowed lights claim atlas slots first-come within a frame, capped at
//! [`SHADOW_COUNT_LIMIT`]. Each slot is one slice of a depth-array target;
//! slot matrices are remapped into [0, 1] texture space and uploaded as a
//! structured buffer alongside the atlas.

use damier_core::math::{Mat4, Vec3};
use damier_core::renderer::{
    ComputeBufferId, LightKind, RenderOp, RenderTargetDescriptor, TextureFormat, TextureRef,
    VisibleLight,
};
use damier_core::settings::ShadowSettings;
use log::warn;

use crate::context::{FrameContext, PipelineContext};
use crate::error::FrameError;
use crate::resources::FrameResources;
use crate::scheduler::{targets, uniforms};

/// Maximum number of shadowed lights per frame. Lights beyond this render
/// unshadowed.
pub const SHADOW_COUNT_LIMIT: usize = 7;

/// The GPU-side layout of one shadow caster, uploaded per atlas slot.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowCasterRecord {
    /// The light-kind tag of the caster.
    pub kind: i32,
    /// World-to-atlas matrix, columns stored in order.
    pub matrix: [[f32; 4]; 4],
    /// Depth bias applied when sampling.
    pub bias: f32,
    /// Index of the light in the frame's visible-light list.
    pub visible_index: i32,
}

impl ShadowCasterRecord {
    /// The buffer stride in bytes.
    pub const STRIDE: u32 = std::mem::size_of::<ShadowCasterRecord>() as u32;
}

/// Remaps a shadow view-projection into [0, 1] atlas texture space.
///
/// On reversed-depth hosts the depth row is negated first so the stored
/// depth always grows away from the light.
pub fn shadow_atlas_matrix(projection: Mat4, view: Mat4, reversed_depth: bool) -> Mat4 {
    let m = projection * view;
    let mut rows = [m.get_row(0), m.get_row(1), m.get_row(2), m.get_row(3)];
    if reversed_depth {
        rows[2] = -rows[2];
    }
    // Half scale and bias: clip [-1, 1] (and depth [0, 1]) into [0, 1].
    let w = rows[3];
    for row in rows.iter_mut().take(3) {
        *row = (*row + w) * 0.5;
    }
    Mat4::from_rows(rows)
}

/// Builds the light-space view and orthographic projection for a
/// directional caster covering the camera's shadow range.
///
/// Returns `None` when the light direction is degenerate.
pub fn directional_shadow_view(
    camera_position: Vec3,
    light_direction: Vec3,
    shadow_distance: f32,
) -> Option<(Mat4, Mat4)> {
    let dir = light_direction.normalize();
    if dir == Vec3::ZERO {
        return None;
    }
    let eye = camera_position - dir * shadow_distance;
    let up = if dir.cross(Vec3::Y).length_squared() > 1e-6 {
        Vec3::Y
    } else {
        Vec3::X
    };
    let view = Mat4::look_at_rh(eye, camera_position, up)?;
    let proj = Mat4::orthographic_rh_zo(
        -shadow_distance,
        shadow_distance,
        -shadow_distance,
        shadow_distance,
        0.0,
        2.0 * shadow_distance,
    );
    Some((view, proj))
}

#[derive(Debug, Clone)]
struct CasterSlot {
    kind: LightKind,
    bias: f32,
    visible_index: i32,
    direction: Vec3,
}

/// Per-frame shadow state: claimed slots, the atlas, and the caster buffer.
#[derive(Debug)]
pub struct ShadowMaps {
    settings: ShadowSettings,
    casters: Vec<CasterSlot>,
    buffer: Option<ComputeBufferId>,
}

impl ShadowMaps {
    /// Creates shadow state with the given configuration.
    pub fn new(settings: ShadowSettings) -> Self {
        Self {
            settings,
            casters: Vec::new(),
            buffer: None,
        }
    }

    /// Clears slot assignments for a new frame.
    pub fn setup(&mut self) {
        self.casters.clear();
        self.buffer = None;
    }

    /// Number of slots claimed this frame.
    pub fn count(&self) -> usize {
        self.casters.len()
    }

    /// Claims an atlas slot for a light, returning the slot index or `-1`.
    ///
    /// Baked lights and lights with shadows disabled never claim a slot.
    /// Once [`SHADOW_COUNT_LIMIT`] slots are claimed, further requests are
    /// declined with a warning.
    pub fn assign_slot(&mut self, light: &VisibleLight, visible_index: usize) -> i32 {
        if light.baked || !light.shadow_mode.casts_shadows() {
            return -1;
        }
        if self.casters.len() >= SHADOW_COUNT_LIMIT {
            warn!(
                "Shadow slot limit ({SHADOW_COUNT_LIMIT}) reached; light {visible_index} renders unshadowed"
            );
            return -1;
        }
        let slot = self.casters.len() as i32;
        self.casters.push(CasterSlot {
            kind: light.kind,
            bias: light.shadow_bias,
            visible_index: visible_index as i32,
            direction: light.direction,
        });
        slot
    }

    /// The camera distance shadows extend to, clamped to the far plane.
    pub fn shadow_distance(&self, camera_far: f32) -> f32 {
        self.settings.max_distance.min(camera_far)
    }

    /// Renders every claimed slot into the atlas and uploads caster data.
    ///
    /// Creates the atlas array and the structured caster buffer (both sized
    /// for at least one entry so shader bindings stay valid on lightless
    /// frames), then renders each slot: bind slice, clear depth, set the
    /// light's view-projection, draw its casters.
    pub fn begin_render(
        &mut self,
        ctx: &mut PipelineContext,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
        reversed_depth: bool,
    ) -> Result<(), FrameError> {
        frame.recorder.begin_sample("Shadows");

        let slices = self.casters.len().max(1) as u32;
        let atlas_desc = RenderTargetDescriptor::depth(
            targets::SHADOW_ATLAS,
            self.settings.atlas_size,
            self.settings.atlas_size,
            32,
        )
        .with_format(TextureFormat::Shadowmap);
        resources.create_target_array(&mut frame.recorder, atlas_desc, slices)?;

        let buffer = ctx.alloc_buffer_id();
        resources.create_buffer(
            &mut frame.recorder,
            buffer,
            self.casters.len().max(1) as u32,
            ShadowCasterRecord::STRIDE,
        )?;
        self.buffer = Some(buffer);

        let distance = self.shadow_distance(frame.camera.far);
        let mut records = Vec::with_capacity(self.casters.len());
        for (slot, caster) in self.casters.iter().enumerate() {
            frame.recorder.push(RenderOp::SetRenderTargetSlice {
                target: targets::SHADOW_ATLAS,
                slice: slot as u32,
            });
            frame.recorder.push(RenderOp::Clear {
                color: false,
                depth: true,
                stencil: false,
            });

            // Point and spot casters are an extension point; only
            // directional views are built today.
            let matrices =
                directional_shadow_view(frame.camera.position, caster.direction, distance);
            let (view, projection) = match matrices {
                Some(m) => m,
                None => {
                    warn!(
                        "Degenerate shadow view for visible light {}; slot {slot} left empty",
                        caster.visible_index
                    );
                    (Mat4::IDENTITY, Mat4::IDENTITY)
                }
            };

            frame.recorder.push(RenderOp::SetViewProjection { view, projection });
            frame.recorder.push(RenderOp::DrawShadowCasters {
                culling: frame.culling.id,
                visible_light_index: caster.visible_index as usize,
            });

            records.push(ShadowCasterRecord {
                kind: caster.kind.shader_tag(),
                matrix: mat_to_columns(shadow_atlas_matrix(projection, view, reversed_depth)),
                bias: caster.bias,
                visible_index: caster.visible_index,
            });
        }

        if !records.is_empty() {
            frame.recorder.push(RenderOp::WriteBuffer {
                buffer,
                data: bytemuck::cast_slice(&records).to_vec(),
            });
        }
        frame.recorder.push(RenderOp::SetGlobalBuffer {
            name: uniforms::SHADOW_CASTERS,
            buffer,
        });
        frame.recorder.push(RenderOp::SetGlobalInt {
            name: uniforms::SHADOW_CASTER_COUNT,
            value: self.casters.len() as i32,
        });
        frame.recorder.push(RenderOp::SetGlobalTexture {
            name: uniforms::SHADOW_ATLAS,
            texture: TextureRef::Target(targets::SHADOW_ATLAS),
        });

        frame.recorder.end_sample();
        Ok(())
    }

    /// Releases the atlas and the caster buffer.
    pub fn end_render(
        &mut self,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
    ) -> Result<(), FrameError> {
        resources.release_target(&mut frame.recorder, targets::SHADOW_ATLAS)?;
        if let Some(buffer) = self.buffer.take() {
            resources.release_buffer(&mut frame.recorder, buffer)?;
        }
        Ok(())
    }
}

fn mat_to_columns(m: Mat4) -> [[f32; 4]; 4] {
    let c = |i: usize| {
        let v = m.cols[i];
        [v.x, v.y, v.z, v.w]
    };
    [c(0), c(1), c(2), c(3)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use damier_core::renderer::ShadowMode;

    #[test]
    fn caster_record_stride_matches_shader_layout() {
        assert_eq!(ShadowCasterRecord::STRIDE, 76);
    }

    #[test]
    fn atlas_matrix_maps_clip_cube_into_unit_range() {
        let m = shadow_atlas_matrix(Mat4::IDENTITY, Mat4::IDENTITY, false);
        // All eight corners of the clip cube (x, y in [-1, 1], z in [0, 1]).
        for x in [-1.0f32, 1.0] {
            for y in [-1.0f32, 1.0] {
                for z in [0.0f32, 1.0] {
                    let p = m.transform_point(Vec3::new(x, y, z));
                    for c in [p.x, p.y, p.z] {
                        assert!(
                            (0.0..=1.0).contains(&c),
                            "corner ({x}, {y}, {z}) maps component {c} outside [0, 1]"
                        );
                    }
                }
            }
        }
        // Clip-space center lands in the middle of the atlas slot.
        let center = m.transform_point(Vec3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(center.x, 0.5);
        assert_relative_eq!(center.y, 0.5);
    }

    #[test]
    fn reversed_depth_flips_the_depth_row() {
        let normal = shadow_atlas_matrix(Mat4::IDENTITY, Mat4::IDENTITY, false);
        let reversed = shadow_atlas_matrix(Mat4::IDENTITY, Mat4::IDENTITY, true);
        let p = Vec3::new(0.0, 0.0, 1.0);
        let a = normal.transform_point(p).z;
        let b = reversed.transform_point(p).z;
        assert_relative_eq!(a + b, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn slot_assignment_saturates_at_the_limit() {
        let mut maps = ShadowMaps::new(ShadowSettings::default());
        maps.setup();
        let light =
            VisibleLight::directional(Vec3::new(0.0, -1.0, 0.0)).with_shadows(ShadowMode::Soft);
        for i in 0..SHADOW_COUNT_LIMIT {
            assert_eq!(maps.assign_slot(&light, i), i as i32);
        }
        assert_eq!(maps.assign_slot(&light, SHADOW_COUNT_LIMIT), -1);
        assert_eq!(maps.count(), SHADOW_COUNT_LIMIT);
    }

    #[test]
    fn baked_and_shadowless_lights_never_claim_slots() {
        let mut maps = ShadowMaps::new(ShadowSettings::default());
        maps.setup();
        let shadowless = VisibleLight::directional(Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(maps.assign_slot(&shadowless, 0), -1);

        let mut baked = shadowless.with_shadows(ShadowMode::Hard);
        baked.baked = true;
        assert_eq!(maps.assign_slot(&baked, 1), -1);
        assert_eq!(maps.count(), 0);
    }

    #[test]
    fn directional_view_centers_on_the_camera() {
        let (view, _) =
            directional_shadow_view(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 100.0)
                .unwrap();
        // The camera position sits shadow_distance in front of the light eye.
        let p = view.transform_point(Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(p.z, -100.0, epsilon = 1e-3);
    }
}
