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

//! Checkerboard reconstruction: the compute pass that rebuilds the
//! full-resolution image from the current half-resolution checker field
//! and the previous frame's field.

use damier_core::math::Vec4;
use damier_core::renderer::{
    CommandRecorder, ComputeShaderId, GraphicsHost, KernelId, RenderOp, RenderTargetId, TextureRef,
};
use log::warn;

/// Thread-group edge length the reconstruction kernel is compiled for.
pub const GROUP_SIZE: u32 = 8;

/// The kernel entry point resolved at prepare time.
pub const KERNEL_NAME: &str = "Reconstruct";

/// Thread-group counts covering a dispatch of `width` x `height` threads.
///
/// Rounds up so edge tiles are always dispatched, even when the dimensions
/// are not multiples of [`GROUP_SIZE`].
#[inline]
pub fn thread_groups(width: u32, height: u32) -> (u32, u32, u32) {
    (width.div_ceil(GROUP_SIZE), height.div_ceil(GROUP_SIZE), 1)
}

/// The reconstruction pass with its cached kernel handle.
#[derive(Debug)]
pub struct FrameReconstruction {
    shader: ComputeShaderId,
    kernel: Option<KernelId>,
}

impl FrameReconstruction {
    /// Creates the pass around the host's reconstruction shader.
    pub fn new(shader: ComputeShaderId) -> Self {
        Self {
            shader,
            kernel: None,
        }
    }

    /// Resolves and caches the kernel handle. Called once at pipeline
    /// preparation.
    pub fn prepare(&mut self, host: &dyn GraphicsHost) {
        self.kernel = host.find_kernel(self.shader, KERNEL_NAME);
        if self.kernel.is_none() {
            warn!(
                "Reconstruction kernel '{KERNEL_NAME}' unavailable; frames will pass through unreconstructed"
            );
        }
    }

    /// Re-resolves the kernel if a host rebuild (shader hot-reload, device
    /// loss) invalidated the cached handle.
    pub fn ensure_valid(&mut self, host: &dyn GraphicsHost) {
        if self.kernel.is_none() {
            self.kernel = host.find_kernel(self.shader, KERNEL_NAME);
        }
    }

    /// Records the reconstruction dispatch.
    ///
    /// Reads the checkered `frame` target and writes the full-resolution
    /// `result` target. One thread runs per checker-field texel
    /// (`width` x `height`); each thread resolves both of its output
    /// pixels, so the dispatch is sized to the field, not the output.
    /// Returns `false` without recording anything when no kernel is
    /// available (the caller falls back to a stretch blit).
    pub fn reconstruct(
        &self,
        recorder: &mut CommandRecorder,
        frame: RenderTargetId,
        result: RenderTargetId,
        width: u32,
        height: u32,
        parity: u32,
    ) -> bool {
        let Some(kernel) = self.kernel else {
            warn!("Skipping reconstruction dispatch: kernel not resolved");
            return false;
        };

        recorder.push(RenderOp::SetComputeTexture {
            shader: self.shader,
            kernel,
            name: "Frame",
            texture: TextureRef::Target(frame),
        });
        recorder.push(RenderOp::SetComputeTexture {
            shader: self.shader,
            kernel,
            name: "Result",
            texture: TextureRef::Target(result),
        });
        recorder.push(RenderOp::SetComputeVector {
            shader: self.shader,
            name: "ResultSize",
            value: Vec4::new(width as f32, height as f32, 0.0, 0.0),
        });
        recorder.push(RenderOp::SetComputeInt {
            shader: self.shader,
            name: "FrameParity",
            value: parity as i32,
        });
        recorder.push(RenderOp::Dispatch {
            shader: self.shader,
            kernel,
            groups: thread_groups(width, height),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damier_core::renderer::CommandRecorder;

    #[test]
    fn group_counts_cover_common_resolutions() {
        assert_eq!(thread_groups(1920, 1080), (240, 135, 1));
        assert_eq!(thread_groups(800, 450), (100, 57, 1));
    }

    #[test]
    fn group_counts_round_up_partial_tiles() {
        assert_eq!(thread_groups(400, 225), (50, 29, 1));
        assert_eq!(thread_groups(1, 1), (1, 1, 1));
        assert_eq!(thread_groups(8, 8), (1, 1, 1));
        assert_eq!(thread_groups(9, 8), (2, 1, 1));
    }

    #[test]
    fn unresolved_kernel_records_nothing() {
        let pass = FrameReconstruction::new(ComputeShaderId(1));
        let mut rec = CommandRecorder::new("test");
        assert!(!pass.reconstruct(&mut rec, RenderTargetId(1), RenderTargetId(2), 64, 64, 0));
        assert!(rec.is_empty());
    }
}
