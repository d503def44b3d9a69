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

//! Deferred lighting: light records, shadow-map scheduling, and the
//! screen-volume draws that accumulate into the deferred output.
//!
//! Per-kind behavior is routed through a static capability table rather
//! than per-light branching: each [`LightKind`] maps to a record builder, a
//! volume transform, and a shadow-participation flag. Adding a light kind
//! means adding a table row.

use damier_core::math::{Mat4, Vec3, Vec4};
use damier_core::renderer::{
    ComputeBufferId, CullingResult, LightKind, LightRecord, MaterialId, MeshId, RenderOp,
    TextureRef, VisibleLight,
};
use damier_core::settings::ShadowSettings;

use crate::context::{FrameContext, PipelineContext, SkySource};
use crate::error::FrameError;
use crate::resources::FrameResources;
use crate::scheduler::uniforms;
use crate::shadow::ShadowMaps;

/// A proxy mesh/material pair drawn for one lighting contribution.
#[derive(Debug, Copy, Clone)]
pub struct Proxy {
    /// The proxy mesh (a fullscreen triangle, sphere, or cone).
    pub mesh: MeshId,
    /// The accumulation material.
    pub material: MaterialId,
}

/// The host-owned proxies the lighting stage draws with.
#[derive(Debug, Copy, Clone)]
pub struct LightVolumeAssets {
    /// Fullscreen proxy for directional lights (and the debug sun).
    pub directional: Proxy,
    /// Sphere proxy for point lights.
    pub point: Proxy,
    /// Cone proxy for spot lights.
    pub spot: Proxy,
    /// Box proxy for reflection probes.
    pub reflection: Proxy,
    /// Camera-hugging proxy for the global-illumination gather.
    pub indirect: Proxy,
}

/// One row of the light-kind capability table.
struct LightCapability {
    /// Whether this kind can claim a shadow-atlas slot.
    supports_shadows: bool,
    /// Builds the GPU record for a light of this kind.
    build_record: fn(&VisibleLight, i32) -> LightRecord,
    /// Builds the volume transform, or `None` when the kind draws no
    /// runtime volume (baked-only kinds).
    volume_transform: Option<fn(&VisibleLight) -> Mat4>,
    /// Picks this kind's proxy out of the asset set.
    proxy: fn(&LightVolumeAssets) -> Proxy,
}

fn record_common(light: &VisibleLight, shadow_slot: i32, sqr_range: f32) -> LightRecord {
    LightRecord {
        kind: light.kind.shader_tag(),
        position: [light.position.x, light.position.y, light.position.z],
        direction: [light.direction.x, light.direction.y, light.direction.z],
        color: light.color.to_rgb_array(),
        sqr_range,
        intensity: light.intensity,
        shadow_slot,
    }
}

fn spot_volume(light: &VisibleLight) -> Mat4 {
    // Cone footprint: the far disc radius follows the outer angle.
    let flare = (light.outer_angle * 0.5).sin() * light.range;
    light.local_to_world * Mat4::from_scale(Vec3::new(2.0 * flare, 2.0 * flare, light.range))
}

static CAPABILITIES: [LightCapability; 4] = [
    // Directional
    LightCapability {
        supports_shadows: true,
        build_record: |light, slot| record_common(light, slot, 0.0),
        volume_transform: Some(|_| Mat4::IDENTITY),
        proxy: |assets| assets.directional,
    },
    // Point
    LightCapability {
        supports_shadows: false,
        build_record: |light, slot| record_common(light, slot, light.range * light.range),
        volume_transform: Some(|light| {
            light.local_to_world * Mat4::from_scale(Vec3::splat(light.range))
        }),
        proxy: |assets| assets.point,
    },
    // Spot
    LightCapability {
        supports_shadows: false,
        build_record: |light, slot| record_common(light, slot, light.range * light.range),
        volume_transform: Some(spot_volume),
        proxy: |assets| assets.spot,
    },
    // Area (baked only)
    LightCapability {
        supports_shadows: false,
        build_record: |light, slot| record_common(light, slot, light.range * light.range),
        volume_transform: None,
        proxy: |assets| assets.directional,
    },
];

fn capability_of(kind: LightKind) -> &'static LightCapability {
    &CAPABILITIES[kind.shader_tag() as usize]
}

/// The deferred lighting stage for one pipeline instance.
#[derive(Debug)]
pub struct Lighting {
    assets: LightVolumeAssets,
    shadows: ShadowMaps,
    light_buffer: Option<ComputeBufferId>,
    records: Vec<LightRecord>,
}

impl Lighting {
    /// Creates the lighting stage around its proxies and shadow settings.
    pub fn new(assets: LightVolumeAssets, shadow_settings: ShadowSettings) -> Self {
        Self {
            assets,
            shadows: ShadowMaps::new(shadow_settings),
            light_buffer: None,
            records: Vec::new(),
        }
    }

    /// Clears per-frame state.
    pub fn setup(&mut self) {
        self.shadows.setup();
        self.records.clear();
        self.light_buffer = None;
    }

    /// The shadow collection distance for a camera, clamped to its far plane.
    pub fn shadow_distance(&self, camera_far: f32) -> f32 {
        self.shadows.shadow_distance(camera_far)
    }

    /// Number of shadow slots claimed this frame.
    pub fn shadow_count(&self) -> usize {
        self.shadows.count()
    }

    /// Toggles the global lighting keywords for this frame.
    pub fn set_keywords(&self, frame: &mut FrameContext<'_>, lighting_enabled: bool) {
        frame.recorder.push(RenderOp::SetShaderKeyword {
            name: "LIGHTING_ON",
            enabled: lighting_enabled,
        });
        frame.recorder.push(RenderOp::SetShaderKeyword {
            name: "SHADOWS_ON",
            enabled: lighting_enabled,
        });
    }

    /// Builds GPU records for every visible light, claiming shadow slots
    /// first-come for kinds that support them.
    pub fn build_records(&mut self, culling: &CullingResult) -> &[LightRecord] {
        self.records.clear();
        for (index, light) in culling.lights.iter().enumerate() {
            let cap = capability_of(light.kind);
            let slot = if cap.supports_shadows {
                self.shadows.assign_slot(light, index)
            } else {
                -1
            };
            self.records.push((cap.build_record)(light, slot));
        }
        &self.records
    }

    /// Renders the shadow atlas for every claimed slot.
    pub fn render_shadow_maps(
        &mut self,
        ctx: &mut PipelineContext,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
        reversed_depth: bool,
    ) -> Result<(), FrameError> {
        self.shadows.begin_render(ctx, frame, resources, reversed_depth)
    }

    /// Uploads the frame's light records as a structured buffer.
    ///
    /// The buffer always holds at least one element so the global binding
    /// stays valid on lightless frames.
    pub fn upload_light_buffer(
        &mut self,
        ctx: &mut PipelineContext,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
    ) -> Result<(), FrameError> {
        let buffer = ctx.alloc_buffer_id();
        resources.create_buffer(
            &mut frame.recorder,
            buffer,
            self.records.len().max(1) as u32,
            LightRecord::STRIDE,
        )?;
        if !self.records.is_empty() {
            frame.recorder.push(RenderOp::WriteBuffer {
                buffer,
                data: bytemuck::cast_slice(&self.records).to_vec(),
            });
        }
        frame.recorder.push(RenderOp::SetGlobalBuffer {
            name: uniforms::LIGHTS,
            buffer,
        });
        frame.recorder.push(RenderOp::SetGlobalInt {
            name: uniforms::LIGHT_COUNT,
            value: self.records.len() as i32,
        });
        self.light_buffer = Some(buffer);
        Ok(())
    }

    /// Draws every runtime light's screen volume into the bound target.
    ///
    /// Must run after [`render_shadow_maps`](Self::render_shadow_maps) so
    /// volume shaders can sample the atlas.
    pub fn render_volumes(&self, frame: &mut FrameContext<'_>) {
        frame.recorder.begin_sample("Light Volumes");
        for (index, light) in frame.culling.lights.iter().enumerate() {
            if light.baked {
                continue;
            }
            let cap = capability_of(light.kind);
            let Some(volume_transform) = cap.volume_transform else {
                continue;
            };
            frame.recorder.push(RenderOp::SetGlobalInt {
                name: uniforms::LIGHT_INDEX,
                value: index as i32,
            });
            if let Some(cookie) = light.cookie {
                frame.recorder.push(RenderOp::SetGlobalTexture {
                    name: uniforms::LIGHT_COOKIE,
                    texture: TextureRef::Asset(cookie),
                });
            }
            let proxy = (cap.proxy)(&self.assets);
            frame.recorder.push(RenderOp::DrawMesh {
                mesh: proxy.mesh,
                transform: volume_transform(light),
                material: proxy.material,
                pass: 0,
            });
        }
        frame.recorder.end_sample();
    }

    /// Draws every visible reflection probe's influence box.
    pub fn render_reflections(&self, frame: &mut FrameContext<'_>) {
        for probe in &frame.culling.probes {
            frame.recorder.push(RenderOp::SetGlobalTexture {
                name: uniforms::PROBE_CUBEMAP,
                texture: TextureRef::Asset(probe.texture),
            });
            frame.recorder.push(RenderOp::SetGlobalFloat {
                name: uniforms::PROBE_INTENSITY,
                value: probe.intensity,
            });
            frame.recorder.push(RenderOp::DrawMesh {
                mesh: self.assets.reflection.mesh,
                transform: probe.local_to_world * Mat4::from_scale(probe.size),
                material: self.assets.reflection.material,
                pass: 0,
            });
        }
    }

    /// Draws the global-illumination gather over the whole screen.
    ///
    /// The proxy hugs the camera's near plane so every pixel is covered.
    pub fn render_global_illumination(&self, frame: &mut FrameContext<'_>) {
        let transform = Mat4::from_translation(frame.camera.position)
            * Mat4::from_scale(Vec3::splat(frame.camera.near * 2.0));
        frame.recorder.push(RenderOp::DrawMesh {
            mesh: self.assets.indirect.mesh,
            transform,
            material: self.assets.indirect.material,
            pass: 0,
        });
    }

    /// Draws the active sky behind all lit geometry.
    pub fn render_sky(&self, frame: &mut FrameContext<'_>, sky: Option<&SkySource>) {
        match sky {
            Some(SkySource::Material { mesh, material }) => {
                // Dome follows the camera, scaled just inside the far plane.
                let transform = Mat4::from_translation(frame.camera.position)
                    * frame.camera.orientation()
                    * Mat4::from_scale(Vec3::splat(frame.camera.far * 0.9));
                frame.recorder.push(RenderOp::DrawMesh {
                    mesh: *mesh,
                    transform,
                    material: *material,
                    pass: 0,
                });
            }
            Some(SkySource::Cubemap { texture, strength }) => {
                frame.recorder.push(RenderOp::SetGlobalTexture {
                    name: uniforms::SKY_CUBEMAP,
                    texture: TextureRef::Asset(*texture),
                });
                frame.recorder.push(RenderOp::SetGlobalFloat {
                    name: uniforms::SKY_STRENGTH,
                    value: *strength,
                });
                frame.recorder.push(RenderOp::DrawSkybox);
            }
            None => {}
        }
    }

    /// Draws a fixed overhead sun so unlit editor scenes stay readable.
    pub fn render_virtual_sun(&self, frame: &mut FrameContext<'_>) {
        let dir = Vec3::new(0.25, -0.9, 0.35).normalize();
        frame.recorder.push(RenderOp::SetGlobalVector {
            name: uniforms::VIRTUAL_SUN_DIRECTION,
            value: Vec4::new(dir.x, dir.y, dir.z, 0.0),
        });
        frame.recorder.push(RenderOp::DrawMesh {
            mesh: self.assets.directional.mesh,
            transform: Mat4::IDENTITY,
            material: self.assets.directional.material,
            pass: 1,
        });
    }

    /// Releases the atlas and the light buffer.
    pub fn end_render(
        &mut self,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
    ) -> Result<(), FrameError> {
        self.shadows.end_render(frame, resources)?;
        if let Some(buffer) = self.light_buffer.take() {
            resources.release_buffer(&mut frame.recorder, buffer)?;
        }
        Ok(())
    }
}
