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

//! Defines the [`GraphicsHost`] trait the pipeline records frames against.

use crate::renderer::camera::Camera;
use crate::renderer::command::CommandRecorder;
use crate::renderer::culling::{CullingParams, CullingResult};
use crate::renderer::handle::{ComputeShaderId, KernelId};

/// The boundary between the frame scheduler and a graphics runtime.
///
/// The scheduler never talks to a GPU directly: it asks the host for culling
/// data, records an ordered command list, and hands the list over through
/// [`execute`](GraphicsHost::execute) and [`submit`](GraphicsHost::submit).
/// Implementations range from a real GPU backend to the headless recording
/// host used for frame capture and tests.
pub trait GraphicsHost {
    /// Builds culling inputs for a camera.
    ///
    /// Returns `None` when no valid frustum can be derived (degenerate
    /// projection, zero-sized viewport). The scheduler skips the camera
    /// entirely in that case.
    fn try_compute_culling_params(
        &self,
        camera: &Camera,
        shadow_distance: f32,
    ) -> Option<CullingParams>;

    /// Runs visibility culling and returns the frame's snapshot.
    fn cull(&mut self, params: &CullingParams) -> CullingResult;

    /// Interprets every op recorded so far, draining the recorder.
    ///
    /// Called mid-frame when recorded state (created targets, uploaded
    /// buffers) must exist before later ops are recorded against it.
    fn execute(&mut self, recorder: &mut CommandRecorder);

    /// Interprets any remaining ops and finalizes the camera's frame.
    ///
    /// Exactly one submit ends each successfully scheduled camera frame.
    fn submit(&mut self, recorder: &mut CommandRecorder);

    /// Resolves a kernel entry point within a compute shader.
    ///
    /// Returns `None` when the shader failed to compile on this host or has
    /// no such entry point.
    fn find_kernel(&self, shader: ComputeShaderId, name: &str) -> Option<KernelId>;

    /// Returns `true` when the host's clip space uses reversed depth
    /// (1.0 at the near plane). Affects the shadow-matrix remap.
    fn uses_reversed_depth(&self) -> bool;
}
