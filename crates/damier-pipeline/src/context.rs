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

//! Defines the long-lived pipeline context and the per-camera frame context.
//!
//! All mutable pipeline state lives on [`PipelineContext`] instances; two
//! contexts never share parity bits, registries, or buffer-key allocation.

use damier_core::renderer::{
    Camera, CameraKind, CommandRecorder, ComputeBufferId, CullingResult, MaterialId, MeshId,
    TextureId,
};
use damier_core::settings::PipelineSettings;

use crate::post::PostProcessChain;
use crate::procedural::ProceduralRegistry;

/// Where the sky comes from when the scheduler reaches the sky stage.
#[derive(Debug, Clone)]
pub enum SkySource {
    /// A dome mesh drawn with a sky material, centered on the camera.
    Material {
        /// The dome mesh.
        mesh: MeshId,
        /// The sky material.
        material: MaterialId,
    },
    /// A static environment cubemap sampled by the host's sky pass.
    Cubemap {
        /// The cubemap asset.
        texture: TextureId,
        /// Exposure multiplier applied when sampling.
        strength: f32,
    },
}

/// Long-lived state shared by every frame the pipeline records.
#[derive(Debug)]
pub struct PipelineContext {
    /// The loaded configuration.
    pub settings: PipelineSettings,
    /// Instanced draws registered by gameplay code.
    pub procedural: ProceduralRegistry,
    /// The ordered post-process chain.
    pub post: PostProcessChain,
    /// The active sky, if any.
    pub sky: Option<SkySource>,
    /// Scene time in seconds, fed to shaders as a global.
    pub time: f32,
    checker_parity: u32,
    next_buffer_id: u32,
}

impl PipelineContext {
    /// Creates a context with the given configuration.
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            procedural: ProceduralRegistry::new(),
            post: PostProcessChain::new(),
            sky: None,
            time: 0.0,
            checker_parity: 0,
            next_buffer_id: 1,
        }
    }

    /// The current checker parity bit (0 or 1) without advancing it.
    pub fn parity(&self) -> u32 {
        self.checker_parity
    }

    /// Returns `true` when frames for this camera advance the parity bit.
    ///
    /// Only game cameras qualify; scene-view and preview frames leave the
    /// bit untouched so editor rendering never perturbs reconstruction.
    pub fn drives_parity(&self, camera: &Camera) -> bool {
        if camera.kind != CameraKind::Game {
            return false;
        }
        match &self.settings.primary_camera {
            Some(name) => camera.name == *name,
            None => true,
        }
    }

    /// Advances parity for a camera and returns `(parity, single_shot)`.
    ///
    /// Game cameras alternate the checker field; scene-view and preview
    /// cameras always render parity 0 as a full-resolution single shot so
    /// editor imagery never depends on a previous field.
    pub fn advance_parity(&mut self, camera: &Camera) -> (u32, bool) {
        if self.drives_parity(camera) {
            self.checker_parity ^= 1;
        }
        match camera.kind {
            CameraKind::Game => (self.checker_parity, false),
            CameraKind::SceneView | CameraKind::Preview => (0, true),
        }
    }

    /// Allocates a compute-buffer key unique within this context.
    pub fn alloc_buffer_id(&mut self) -> ComputeBufferId {
        let id = ComputeBufferId(self.next_buffer_id);
        self.next_buffer_id += 1;
        id
    }
}

/// Everything scoped to recording a single camera's frame.
#[derive(Debug)]
pub struct FrameContext<'a> {
    /// The camera being rendered.
    pub camera: &'a Camera,
    /// The frame's command recorder.
    pub recorder: CommandRecorder,
    /// The host's visibility snapshot for this camera.
    pub culling: CullingResult,
    /// The checker parity this frame renders (0 or 1).
    pub parity: u32,
    /// `true` when the frame renders at full resolution with no temporal
    /// reconstruction.
    pub single_shot: bool,
}

impl<'a> FrameContext<'a> {
    /// Width of the checkered working targets for this frame.
    ///
    /// Odd camera widths round up so the field covers the last column.
    pub fn checker_width(&self) -> u32 {
        if self.single_shot {
            self.camera.pixel_width
        } else {
            self.camera.pixel_width.div_ceil(2)
        }
    }

    /// Height of the checkered working targets for this frame.
    pub fn checker_height(&self) -> u32 {
        if self.single_shot {
            self.camera.pixel_height
        } else {
            self.camera.pixel_height.div_ceil(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damier_core::renderer::Camera;

    #[test]
    fn game_camera_alternates_parity() {
        let mut ctx = PipelineContext::new(PipelineSettings::default());
        let cam = Camera::new("Main Camera", 800, 450);
        assert_eq!(ctx.advance_parity(&cam), (1, false));
        assert_eq!(ctx.advance_parity(&cam), (0, false));
        assert_eq!(ctx.advance_parity(&cam), (1, false));
    }

    #[test]
    fn non_primary_camera_does_not_advance_parity() {
        let mut ctx = PipelineContext::new(PipelineSettings {
            primary_camera: Some("Main Camera".into()),
            ..Default::default()
        });
        let other = Camera::new("Security Feed", 320, 240);
        assert_eq!(ctx.advance_parity(&other), (0, false));
        assert_eq!(ctx.parity(), 0);
    }

    #[test]
    fn scene_view_renders_parity_zero_single_shot() {
        let mut ctx = PipelineContext::new(PipelineSettings::default());
        let cam = Camera::new("Scene", 800, 450).with_kind(CameraKind::SceneView);
        assert_eq!(ctx.advance_parity(&cam), (0, true));
    }

    #[test]
    fn editor_cameras_never_advance_parity() {
        let mut ctx = PipelineContext::new(PipelineSettings {
            interactive: false,
            ..Default::default()
        });
        let scene = Camera::new("Scene", 800, 450).with_kind(CameraKind::SceneView);
        let preview = Camera::new("Inspector", 256, 256).with_kind(CameraKind::Preview);
        assert_eq!(ctx.advance_parity(&scene), (0, true));
        assert_eq!(ctx.advance_parity(&preview), (0, true));
        // The bit stays put regardless of the interactive setting.
        assert_eq!(ctx.parity(), 0);
    }

    #[test]
    fn checker_dimensions_halve_for_game_frames() {
        let cam = Camera::new("Main Camera", 800, 450);
        let frame = FrameContext {
            camera: &cam,
            recorder: CommandRecorder::new("test"),
            culling: CullingResult::default(),
            parity: 1,
            single_shot: false,
        };
        assert_eq!(frame.checker_width(), 400);
        assert_eq!(frame.checker_height(), 225);
    }

    #[test]
    fn odd_checker_dimensions_round_up() {
        let cam = Camera::new("Main Camera", 801, 451);
        let frame = FrameContext {
            camera: &cam,
            recorder: CommandRecorder::new("test"),
            culling: CullingResult::default(),
            parity: 0,
            single_shot: false,
        };
        assert_eq!(frame.checker_width(), 401);
        assert_eq!(frame.checker_height(), 226);
    }
}
