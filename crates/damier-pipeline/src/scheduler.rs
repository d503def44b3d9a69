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

//! The checkerboard frame scheduler.
//!
//! [`CheckerboardScheduler::render`] records one camera's frame as a strict
//! sequence: depth prepasses, half-resolution G-Buffer, deferred lighting
//! (shadow atlas first), transparency, gizmos, the low-resolution
//! post-process stage, checkerboard reconstruction, the depth-masked
//! composite onto the camera target, the full-resolution post-process
//! stage, UI, cleanup, and a single submit. A culling failure aborts the
//! camera with no submission and no leaked resources.

use damier_core::math::{Mat4, Vec4};
use damier_core::renderer::{
    AttachmentRef, Camera, CameraKind, CommandRecorder, ComputeShaderId, CullingResult,
    GraphicsHost, MaterialId, MeshId, PassTag, QueueRange, RenderOp, RenderTargetDescriptor,
    RenderTargetId, SortCriteria, TextureFormat, TextureRef,
};
use damier_core::settings::ShadowSettings;
use log::debug;

use crate::context::{FrameContext, PipelineContext};
use crate::dispatch::draw_filtered;
use crate::error::FrameError;
use crate::lighting::{LightVolumeAssets, Lighting};
use crate::procedural::ProceduralLayer;
use crate::reconstruct::FrameReconstruction;
use crate::resources::FrameResources;

/// Stable target keys for the frame's transient render targets.
pub mod targets {
    use damier_core::renderer::RenderTargetId;

    /// G-Buffer: surface albedo.
    pub const ALBEDO: RenderTargetId = RenderTargetId(1);
    /// G-Buffer: world-space position.
    pub const POSITION: RenderTargetId = RenderTargetId(2);
    /// G-Buffer: world-space normal.
    pub const NORMAL: RenderTargetId = RenderTargetId(3);
    /// G-Buffer: reflection color and roughness.
    pub const REFLECTION: RenderTargetId = RenderTargetId(4);
    /// G-Buffer: translucency term.
    pub const TRANSLUCENCY: RenderTargetId = RenderTargetId(5);
    /// G-Buffer: baked indirect term.
    pub const GLOBAL_ILLUMINATION: RenderTargetId = RenderTargetId(6);
    /// Front-face scene depth.
    pub const DEPTH: RenderTargetId = RenderTargetId(7);
    /// Back-face scene depth.
    pub const BACK_DEPTH: RenderTargetId = RenderTargetId(8);
    /// Accumulated deferred lighting output (checkered resolution).
    pub const DEFERRED_OUTPUT: RenderTargetId = RenderTargetId(9);
    /// Transparent geometry output (checkered resolution).
    pub const TRANSPARENT: RenderTargetId = RenderTargetId(10);
    /// Scratch for the low-resolution post-process stage.
    pub const POST_SCRATCH_LOW: RenderTargetId = RenderTargetId(11);
    /// Scratch for the full-resolution post-process stage.
    pub const POST_SCRATCH_FULL: RenderTargetId = RenderTargetId(12);
    /// Full-resolution reconstructed image.
    pub const RECONSTRUCTED: RenderTargetId = RenderTargetId(13);
    /// The shadow-atlas depth array.
    pub const SHADOW_ATLAS: RenderTargetId = RenderTargetId(14);
}

/// Shader pass tags the scheduler draws with.
pub mod tags {
    use damier_core::renderer::PassTag;

    /// Front-face depth prepass.
    pub const DEPTH_ONLY: PassTag = PassTag("DepthOnly");
    /// Back-face depth prepass.
    pub const BACK_DEPTH: PassTag = PassTag("BackDepth");
    /// Primary G-Buffer fill.
    pub const DEFERRED_BASE: PassTag = PassTag("DeferredBase");
    /// Secondary G-Buffer contribution.
    pub const DEFERRED_ADD: PassTag = PassTag("DeferredAdd");
    /// Blended geometry.
    pub const TRANSPARENT: PassTag = PassTag("Transparent");
    /// Geometry rendered into shadow maps.
    pub const SHADOW_CASTER: PassTag = PassTag("ShadowCaster");
    /// Screen-space UI geometry.
    pub const UI: PassTag = PassTag("Ui");
}

/// Global shader uniform names.
pub mod uniforms {
    /// The checker parity bit for this frame.
    pub const FRAME_PARITY: &str = "_FrameParity";
    /// Scene time in seconds.
    pub const TIME: &str = "_Time";
    /// Camera target size in pixels: `(w, h, 0, 0)`.
    pub const SCREEN_SIZE: &str = "_ScreenSize";
    /// Reciprocal camera target size: `(1/w, 1/h, 0, 0)`.
    pub const INVERSE_SCREEN_SIZE: &str = "_InverseScreenSize";
    /// World-space camera position.
    pub const CAMERA_POSITION: &str = "_CameraPosition";
    /// World-space camera forward direction.
    pub const CAMERA_DIRECTION: &str = "_CameraDirection";
    /// `(near, far, fov_y, aspect)`.
    pub const PROJECTION_PARAMS: &str = "_ProjectionParams";

    /// G-Buffer albedo binding.
    pub const GBUFFER_ALBEDO: &str = "_GBufferAlbedo";
    /// G-Buffer position binding.
    pub const GBUFFER_POSITION: &str = "_GBufferPosition";
    /// G-Buffer normal binding.
    pub const GBUFFER_NORMAL: &str = "_GBufferNormal";
    /// G-Buffer reflection binding.
    pub const GBUFFER_REFLECTION: &str = "_GBufferReflection";
    /// G-Buffer translucency binding.
    pub const GBUFFER_TRANSLUCENCY: &str = "_GBufferTranslucency";
    /// G-Buffer indirect binding.
    pub const GBUFFER_INDIRECT: &str = "_GBufferIndirect";
    /// Front scene depth binding.
    pub const SCENE_DEPTH: &str = "_SceneDepth";
    /// Back scene depth binding.
    pub const SCENE_BACK_DEPTH: &str = "_SceneBackDepth";
    /// The transparency layer sampled during compositing.
    pub const TRANSPARENT_LAYER: &str = "_TransparentLayer";
    /// The image the composite pass stretches onto the camera target.
    pub const COMPOSITE_SOURCE: &str = "_CompositeSource";

    /// The structured light buffer.
    pub const LIGHTS: &str = "_Lights";
    /// Number of valid entries in the light buffer.
    pub const LIGHT_COUNT: &str = "_LightCount";
    /// Index of the light a volume draw shades.
    pub const LIGHT_INDEX: &str = "_LightIndex";
    /// The active light's projection cookie.
    pub const LIGHT_COOKIE: &str = "_LightCookie";
    /// The active reflection probe's cubemap.
    pub const PROBE_CUBEMAP: &str = "_ProbeCubemap";
    /// The active reflection probe's intensity.
    pub const PROBE_INTENSITY: &str = "_ProbeIntensity";
    /// The sky cubemap.
    pub const SKY_CUBEMAP: &str = "_SkyCubemap";
    /// The sky exposure multiplier.
    pub const SKY_STRENGTH: &str = "_SkyStrength";
    /// The debug sun direction used when lighting is disabled.
    pub const VIRTUAL_SUN_DIRECTION: &str = "_VirtualSunDirection";

    /// The structured shadow-caster buffer.
    pub const SHADOW_CASTERS: &str = "_ShadowCasters";
    /// Number of valid entries in the caster buffer.
    pub const SHADOW_CASTER_COUNT: &str = "_ShadowCasterCount";
    /// The shadow-atlas array texture.
    pub const SHADOW_ATLAS: &str = "_ShadowAtlas";
}

/// Depth-mask material pass indices.
mod mask_passes {
    /// Writes the checker pattern into depth/stencil during the prepass.
    pub const CHECKER_PREPASS: u32 = 0;
    /// Composite with checker-complementary masking (game/preview).
    pub const COMPOSITE_MASKED: u32 = 1;
    /// Composite without masking (scene view, no partner frame).
    pub const COMPOSITE_UNMASKED: u32 = 2;
}

/// Places the fullscreen triangle a hair in front of the near plane, facing
/// the camera, so the depth-mask passes rasterize over every pixel.
fn depth_mask_transform(camera: &Camera) -> Mat4 {
    let offset = camera.near + 1e-4;
    Mat4::from_translation(camera.position + camera.forward * offset) * camera.orientation()
}

/// Host-owned assets the scheduler itself draws with.
#[derive(Debug, Copy, Clone)]
pub struct PipelineAssets {
    /// The fullscreen triangle used for masked composites.
    pub fullscreen_triangle: MeshId,
    /// The depth-mask material (checker prepass + composite passes).
    pub depth_mask: MaterialId,
    /// The checkerboard-reconstruction compute shader.
    pub reconstruct_shader: ComputeShaderId,
}

/// The outcome of scheduling one camera.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CameraFrame {
    /// The frame was recorded and submitted.
    Rendered,
    /// Culling was unavailable; nothing was submitted.
    Skipped,
}

/// Records checkerboard frames against a [`GraphicsHost`].
#[derive(Debug)]
pub struct CheckerboardScheduler {
    assets: PipelineAssets,
    lighting: Lighting,
    reconstruction: FrameReconstruction,
    shadow_capture: bool,
}

impl CheckerboardScheduler {
    /// Creates a scheduler around the host-owned assets.
    pub fn new(
        assets: PipelineAssets,
        light_assets: LightVolumeAssets,
        shadow_settings: ShadowSettings,
    ) -> Self {
        Self {
            assets,
            lighting: Lighting::new(light_assets, shadow_settings),
            reconstruction: FrameReconstruction::new(assets.reconstruct_shader),
            shadow_capture: false,
        }
    }

    /// Resolves host-dependent handles (the reconstruction kernel). Call
    /// once after the host is ready.
    pub fn prepare(&mut self, host: &dyn GraphicsHost) {
        self.reconstruction.prepare(host);
    }

    /// Re-resolves handles invalidated by a host rebuild.
    pub fn ensure_valid(&mut self, host: &dyn GraphicsHost) {
        self.reconstruction.ensure_valid(host);
    }

    /// Switches the scheduler into or out of shadow-capture mode.
    ///
    /// While enabled, [`render`](Self::render) runs a minimal depth-only
    /// pass for light-view cameras instead of the checkerboard path, and
    /// never touches parity.
    pub fn set_shadow_capture(&mut self, enabled: bool) {
        self.shadow_capture = enabled;
    }

    /// Number of shadow slots claimed by the most recent frame.
    pub fn shadow_count(&self) -> usize {
        self.lighting.shadow_count()
    }

    /// Records a custom filtered pass into an in-flight frame, wrapped in
    /// its own profiling sample. Hook for host extensions that add passes
    /// between the standard stages.
    pub fn record_custom_pass(
        &self,
        frame: &mut FrameContext<'_>,
        label: &str,
        sort: SortCriteria,
        range: QueueRange,
        pass_tags: &[PassTag],
    ) {
        frame.recorder.begin_sample(label);
        draw_filtered(&mut frame.recorder, frame.culling.id, sort, range, pass_tags);
        frame.recorder.end_sample();
    }

    /// Runs culling for a camera without recording a frame. Used by
    /// auxiliary renderers that need the visibility snapshot.
    pub fn camera_culling_results(
        &self,
        host: &mut dyn GraphicsHost,
        camera: &Camera,
    ) -> Option<CullingResult> {
        if !camera.has_valid_frustum() {
            return None;
        }
        let distance = self.lighting.shadow_distance(camera.far);
        let params = host.try_compute_culling_params(camera, distance)?;
        Some(host.cull(&params))
    }

    /// Renders one camera: culls, records the full frame, and submits.
    ///
    /// Returns [`CameraFrame::Skipped`] without submitting when the camera
    /// has no valid frustum or the host cannot produce culling parameters
    /// for it.
    pub fn render(
        &mut self,
        ctx: &mut PipelineContext,
        host: &mut dyn GraphicsHost,
        camera: &Camera,
    ) -> Result<CameraFrame, FrameError> {
        // Projection is undefined for a degenerate frustum; treat it as a
        // culling failure before any matrix is built.
        if !camera.has_valid_frustum() {
            debug!("Camera '{}' has no valid frustum; frame skipped", camera.name);
            return Ok(CameraFrame::Skipped);
        }
        let shadow_distance = self.lighting.shadow_distance(camera.far);
        let Some(params) = host.try_compute_culling_params(camera, shadow_distance) else {
            debug!("Culling unavailable for camera '{}'; frame skipped", camera.name);
            return Ok(CameraFrame::Skipped);
        };
        let culling = host.cull(&params);

        // Shadow sub-renders never participate in parity.
        let (parity, single_shot) = if self.shadow_capture {
            (0, true)
        } else {
            ctx.advance_parity(camera)
        };

        let mut frame = FrameContext {
            camera,
            recorder: CommandRecorder::new(camera.name.clone()),
            culling,
            parity,
            single_shot,
        };
        let mut resources = FrameResources::new();

        if self.shadow_capture {
            self.record_shadow_capture(ctx, &mut frame);
            host.submit(&mut frame.recorder);
            return Ok(CameraFrame::Rendered);
        }

        let outcome = self.record_frame(ctx, host, &mut frame, &mut resources);

        // Cleanup runs on every exit path so aborted frames leak nothing.
        resources.release_all(&mut frame.recorder);
        match outcome {
            Ok(()) => {
                host.submit(&mut frame.recorder);
                Ok(CameraFrame::Rendered)
            }
            Err(e) => {
                // Flush the releases without submitting the frame.
                host.execute(&mut frame.recorder);
                Err(e)
            }
        }
    }

    fn record_shadow_capture(&self, ctx: &PipelineContext, frame: &mut FrameContext<'_>) {
        self.record_camera_globals(ctx, frame);
        frame.recorder.begin_sample("Shadow Sub-render");
        frame.recorder.push(RenderOp::Clear {
            color: false,
            depth: true,
            stencil: true,
        });
        draw_filtered(
            &mut frame.recorder,
            frame.culling.id,
            SortCriteria::FrontToBack,
            QueueRange::OPAQUE,
            &[tags::SHADOW_CASTER],
        );
        frame.recorder.end_sample();
    }

    fn record_frame(
        &mut self,
        ctx: &mut PipelineContext,
        host: &mut dyn GraphicsHost,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
    ) -> Result<(), FrameError> {
        let lighting_enabled = ctx.settings.interactive;

        self.record_camera_globals(ctx, frame);

        // Shadows render before anything samples the atlas.
        self.lighting.setup();
        self.lighting.set_keywords(frame, lighting_enabled);
        self.lighting.build_records(&frame.culling);
        self.lighting
            .render_shadow_maps(ctx, frame, resources, host.uses_reversed_depth())?;
        self.lighting.upload_light_buffer(ctx, frame, resources)?;

        // Back on the camera's view after the light-space passes.
        frame.recorder.push(RenderOp::SetViewProjection {
            view: frame.camera.view_matrix(),
            projection: frame.camera.projection_matrix(),
        });

        ctx.procedural.cull(frame.camera);

        self.create_frame_targets(frame, resources)?;

        // Created resources must exist host-side before geometry draws
        // reference them.
        host.execute(&mut frame.recorder);

        self.record_depth_prepasses(frame);
        self.record_gbuffer(ctx, frame);
        self.record_lighting(ctx, frame, lighting_enabled);
        self.record_transparency(ctx, frame);

        if ctx.settings.draw_gizmos && frame.camera.kind == CameraKind::SceneView {
            frame.recorder.push(RenderOp::DrawGizmos);
        }

        self.record_low_res_post(ctx, frame);
        self.record_reconstruction(frame);
        self.record_composite(frame);
        self.record_full_res_post(ctx, frame);
        self.record_ui(frame);

        self.lighting.end_render(frame, resources)?;
        self.release_frame_targets(frame, resources)?;
        frame.recorder.end_sample();
        Ok(())
    }

    fn record_camera_globals(&self, ctx: &PipelineContext, frame: &mut FrameContext<'_>) {
        let camera = frame.camera;
        let rec = &mut frame.recorder;
        rec.begin_sample("Setup");
        rec.push(RenderOp::SetGlobalInt {
            name: uniforms::FRAME_PARITY,
            value: frame.parity as i32,
        });
        rec.push(RenderOp::SetGlobalFloat {
            name: uniforms::TIME,
            value: ctx.time,
        });
        let (w, h) = (camera.pixel_width as f32, camera.pixel_height as f32);
        rec.push(RenderOp::SetGlobalVector {
            name: uniforms::SCREEN_SIZE,
            value: Vec4::new(w, h, 0.0, 0.0),
        });
        rec.push(RenderOp::SetGlobalVector {
            name: uniforms::INVERSE_SCREEN_SIZE,
            value: Vec4::new(1.0 / w, 1.0 / h, 0.0, 0.0),
        });
        rec.push(RenderOp::SetGlobalVector {
            name: uniforms::CAMERA_POSITION,
            value: camera.position.extend(1.0),
        });
        rec.push(RenderOp::SetGlobalVector {
            name: uniforms::CAMERA_DIRECTION,
            value: camera.forward.extend(0.0),
        });
        rec.push(RenderOp::SetGlobalVector {
            name: uniforms::PROJECTION_PARAMS,
            value: Vec4::new(camera.near, camera.far, camera.fov_y, camera.aspect()),
        });
        rec.push(RenderOp::SetViewProjection {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
        });
    }

    fn create_frame_targets(
        &self,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
    ) -> Result<(), FrameError> {
        let (cw, ch) = (frame.checker_width(), frame.checker_height());
        let (fw, fh) = (frame.camera.pixel_width, frame.camera.pixel_height);
        let rec = &mut frame.recorder;

        let color = |id: RenderTargetId, format: TextureFormat| {
            RenderTargetDescriptor::color(id, cw, ch, format)
        };
        resources.create_target(
            rec,
            color(targets::ALBEDO, TextureFormat::ArgbHalf).with_linear(false),
        )?;
        resources.create_target(rec, color(targets::POSITION, TextureFormat::ArgbFloat))?;
        resources.create_target(rec, color(targets::NORMAL, TextureFormat::ArgbFloat))?;
        resources.create_target(rec, color(targets::REFLECTION, TextureFormat::ArgbFloat))?;
        resources.create_target(rec, color(targets::TRANSLUCENCY, TextureFormat::ArgbHalf))?;
        resources.create_target(
            rec,
            color(targets::GLOBAL_ILLUMINATION, TextureFormat::ArgbFloat),
        )?;
        resources.create_target(rec, RenderTargetDescriptor::depth(targets::DEPTH, cw, ch, 16))?;
        resources.create_target(
            rec,
            color(targets::BACK_DEPTH, TextureFormat::RFloat).with_depth_bits(16),
        )?;
        resources.create_target(rec, color(targets::DEFERRED_OUTPUT, TextureFormat::Argb32))?;
        resources.create_target(rec, color(targets::TRANSPARENT, TextureFormat::Argb32))?;
        resources.create_target(
            rec,
            color(targets::POST_SCRATCH_LOW, TextureFormat::Argb32),
        )?;
        resources.create_target(
            rec,
            RenderTargetDescriptor::color(targets::RECONSTRUCTED, fw, fh, TextureFormat::Argb32),
        )?;
        resources.create_target(
            rec,
            RenderTargetDescriptor::color(
                targets::POST_SCRATCH_FULL,
                fw,
                fh,
                TextureFormat::Argb32,
            ),
        )?;
        Ok(())
    }

    fn release_frame_targets(
        &self,
        frame: &mut FrameContext<'_>,
        resources: &mut FrameResources,
    ) -> Result<(), FrameError> {
        // Reverse dependency order: consumers before the buffers they read.
        for id in [
            targets::POST_SCRATCH_FULL,
            targets::RECONSTRUCTED,
            targets::POST_SCRATCH_LOW,
            targets::TRANSPARENT,
            targets::DEFERRED_OUTPUT,
            targets::BACK_DEPTH,
            targets::DEPTH,
            targets::GLOBAL_ILLUMINATION,
            targets::TRANSLUCENCY,
            targets::REFLECTION,
            targets::NORMAL,
            targets::POSITION,
            targets::ALBEDO,
        ] {
            resources.release_target(&mut frame.recorder, id)?;
        }
        Ok(())
    }

    fn record_depth_prepasses(&self, frame: &mut FrameContext<'_>) {
        let culling = frame.culling.id;
        let single_shot = frame.single_shot;
        let mask_transform = depth_mask_transform(frame.camera);
        let rec = &mut frame.recorder;
        rec.begin_sample("Depth");

        rec.push(RenderOp::SetRenderTarget {
            colors: vec![],
            depth: Some(targets::DEPTH),
        });
        rec.push(RenderOp::Clear {
            color: false,
            depth: true,
            stencil: true,
        });
        if !single_shot {
            // Stamp the checker field into depth/stencil so the opaque
            // passes only shade this frame's parity.
            rec.push(RenderOp::DrawMesh {
                mesh: self.assets.fullscreen_triangle,
                transform: mask_transform,
                material: self.assets.depth_mask,
                pass: mask_passes::CHECKER_PREPASS,
            });
        }
        draw_filtered(
            rec,
            culling,
            SortCriteria::FrontToBack,
            QueueRange::OPAQUE,
            &[tags::DEPTH_ONLY],
        );

        // Back-face depth lands in an R-float color channel with its own
        // depth buffer.
        rec.push(RenderOp::SetRenderTarget {
            colors: vec![AttachmentRef::Target(targets::BACK_DEPTH)],
            depth: Some(targets::BACK_DEPTH),
        });
        rec.push(RenderOp::Clear {
            color: true,
            depth: true,
            stencil: true,
        });
        draw_filtered(
            rec,
            culling,
            SortCriteria::FrontToBack,
            QueueRange::OPAQUE,
            &[tags::BACK_DEPTH],
        );
    }

    fn record_gbuffer(&self, ctx: &PipelineContext, frame: &mut FrameContext<'_>) {
        let culling = frame.culling.id;
        let rec = &mut frame.recorder;
        rec.begin_sample("G-Buffer");
        rec.push(RenderOp::SetRenderTarget {
            colors: vec![
                AttachmentRef::Target(targets::ALBEDO),
                AttachmentRef::Target(targets::POSITION),
                AttachmentRef::Target(targets::NORMAL),
                AttachmentRef::Target(targets::REFLECTION),
                AttachmentRef::Target(targets::TRANSLUCENCY),
                AttachmentRef::Target(targets::GLOBAL_ILLUMINATION),
            ],
            depth: Some(targets::DEPTH),
        });
        // Depth already holds the prepass result; clear color only.
        rec.push(RenderOp::Clear {
            color: true,
            depth: false,
            stencil: false,
        });
        draw_filtered(
            rec,
            culling,
            SortCriteria::FrontToBack,
            QueueRange::OPAQUE,
            &[tags::DEFERRED_BASE, tags::DEFERRED_ADD],
        );
        ctx.procedural.draw_layer(rec, ProceduralLayer::Opaque);

        for (name, id) in [
            (uniforms::GBUFFER_ALBEDO, targets::ALBEDO),
            (uniforms::GBUFFER_POSITION, targets::POSITION),
            (uniforms::GBUFFER_NORMAL, targets::NORMAL),
            (uniforms::GBUFFER_REFLECTION, targets::REFLECTION),
            (uniforms::GBUFFER_TRANSLUCENCY, targets::TRANSLUCENCY),
            (uniforms::GBUFFER_INDIRECT, targets::GLOBAL_ILLUMINATION),
            (uniforms::SCENE_DEPTH, targets::DEPTH),
            (uniforms::SCENE_BACK_DEPTH, targets::BACK_DEPTH),
        ] {
            rec.push(RenderOp::SetGlobalTexture {
                name,
                texture: TextureRef::Target(id),
            });
        }
    }

    fn record_lighting(
        &mut self,
        ctx: &PipelineContext,
        frame: &mut FrameContext<'_>,
        lighting_enabled: bool,
    ) {
        frame.recorder.begin_sample("Lighting");
        // Loaded, not cleared: volume draws accumulate additively.
        frame.recorder.push(RenderOp::SetRenderTarget {
            colors: vec![AttachmentRef::Target(targets::DEFERRED_OUTPUT)],
            depth: Some(targets::DEPTH),
        });
        self.lighting.render_global_illumination(frame);
        if lighting_enabled {
            self.lighting.render_volumes(frame);
            self.lighting.render_reflections(frame);
        } else {
            self.lighting.render_virtual_sun(frame);
        }
        self.lighting.render_sky(frame, ctx.sky.as_ref());
    }

    fn record_transparency(&self, ctx: &PipelineContext, frame: &mut FrameContext<'_>) {
        let culling = frame.culling.id;
        let rec = &mut frame.recorder;
        rec.begin_sample("Transparent");
        rec.push(RenderOp::SetRenderTarget {
            colors: vec![AttachmentRef::Target(targets::TRANSPARENT)],
            depth: Some(targets::DEPTH),
        });
        rec.push(RenderOp::Clear {
            color: true,
            depth: false,
            stencil: false,
        });
        draw_filtered(
            rec,
            culling,
            SortCriteria::BackToFront,
            QueueRange::TRANSPARENT,
            &[tags::TRANSPARENT],
        );
        ctx.procedural.draw_layer(rec, ProceduralLayer::Transparent);
        rec.push(RenderOp::SetGlobalTexture {
            name: uniforms::TRANSPARENT_LAYER,
            texture: TextureRef::Target(targets::TRANSPARENT),
        });
    }

    fn record_low_res_post(&self, ctx: &PipelineContext, frame: &mut FrameContext<'_>) {
        frame.recorder.begin_sample("Post Low-Res");
        ctx.post.run_low_res(
            &mut frame.recorder,
            AttachmentRef::Target(targets::DEFERRED_OUTPUT),
            AttachmentRef::Target(targets::POST_SCRATCH_LOW),
        );
    }

    fn record_reconstruction(&self, frame: &mut FrameContext<'_>) {
        frame.recorder.begin_sample("Reconstruct");
        let (cw, ch) = (frame.checker_width(), frame.checker_height());
        let dispatched = if frame.single_shot {
            // No partner field to merge; the composite reads the deferred
            // output as-is.
            false
        } else {
            self.reconstruction.reconstruct(
                &mut frame.recorder,
                targets::DEFERRED_OUTPUT,
                targets::RECONSTRUCTED,
                cw,
                ch,
                frame.parity,
            )
        };
        if !dispatched {
            frame.recorder.push(RenderOp::Blit {
                src: AttachmentRef::Target(targets::DEFERRED_OUTPUT),
                dst: AttachmentRef::Target(targets::RECONSTRUCTED),
            });
        }
    }

    fn record_composite(&self, frame: &mut FrameContext<'_>) {
        let pass = match frame.camera.kind {
            CameraKind::SceneView => mask_passes::COMPOSITE_UNMASKED,
            CameraKind::Game | CameraKind::Preview => mask_passes::COMPOSITE_MASKED,
        };
        let mask_transform = depth_mask_transform(frame.camera);
        let rec = &mut frame.recorder;
        rec.begin_sample("Composite");
        rec.push(RenderOp::SetGlobalTexture {
            name: uniforms::COMPOSITE_SOURCE,
            texture: TextureRef::Target(targets::RECONSTRUCTED),
        });
        rec.push(RenderOp::SetRenderTarget {
            colors: vec![AttachmentRef::CameraTarget],
            depth: None,
        });
        rec.push(RenderOp::DrawMesh {
            mesh: self.assets.fullscreen_triangle,
            transform: mask_transform,
            material: self.assets.depth_mask,
            pass,
        });
    }

    fn record_full_res_post(&self, ctx: &PipelineContext, frame: &mut FrameContext<'_>) {
        frame.recorder.begin_sample("Post Full-Res");
        ctx.post.run_full_res(
            &mut frame.recorder,
            AttachmentRef::CameraTarget,
            AttachmentRef::Target(targets::POST_SCRATCH_FULL),
        );
    }

    fn record_ui(&self, frame: &mut FrameContext<'_>) {
        // Preview cameras render no UI at all.
        if frame.camera.kind == CameraKind::Preview {
            return;
        }
        let culling = frame.culling.id;
        let is_game = frame.camera.kind == CameraKind::Game;
        let rec = &mut frame.recorder;
        rec.begin_sample("UI");
        draw_filtered(
            rec,
            culling,
            SortCriteria::CanvasOrder,
            QueueRange::ALL,
            &[tags::UI],
        );
        if is_game {
            rec.push(RenderOp::DrawUiOverlay);
        }
    }
}
