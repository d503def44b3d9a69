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

//! A headless [`GraphicsHost`] that records rather than renders.
//!
//! [`RecordingHost`] keeps every op the scheduler hands it, grouped per
//! submission, so tests and offline frame captures can assert on the exact
//! command stream a camera produces.

use ahash::{AHashMap, AHashSet};
use damier_core::renderer::{
    Camera, CommandRecorder, ComputeShaderId, CullingId, CullingParams, CullingResult,
    GraphicsHost, KernelId, RenderOp, VisibleLight, VisibleReflectionProbe,
};

/// A [`GraphicsHost`] that captures the recorded command stream.
#[derive(Debug, Default)]
pub struct RecordingHost {
    lights: Vec<VisibleLight>,
    probes: Vec<VisibleReflectionProbe>,
    unculled_cameras: AHashSet<String>,
    kernels: AHashMap<(ComputeShaderId, String), KernelId>,
    reversed_depth: bool,
    next_culling_id: u64,
    pending: Vec<RenderOp>,
    submissions: Vec<Vec<RenderOp>>,
}

impl RecordingHost {
    /// Creates an empty host with forward depth and no scene content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kernel the host will resolve by `(shader, name)`.
    pub fn with_kernel(mut self, shader: ComputeShaderId, name: &str, kernel: KernelId) -> Self {
        self.kernels.insert((shader, name.to_owned()), kernel);
        self
    }

    /// Switches the host's clip space to reversed depth.
    pub fn with_reversed_depth(mut self) -> Self {
        self.reversed_depth = true;
        self
    }

    /// Adds a light every subsequent cull will report visible.
    pub fn add_light(&mut self, light: VisibleLight) {
        self.lights.push(light);
    }

    /// Adds a reflection probe every subsequent cull will report visible.
    pub fn add_probe(&mut self, probe: VisibleReflectionProbe) {
        self.probes.push(probe);
    }

    /// Makes culling fail for the named camera.
    pub fn fail_culling_for(&mut self, camera_name: &str) {
        self.unculled_cameras.insert(camera_name.to_owned());
    }

    /// Ops interpreted so far within the frame currently being recorded.
    pub fn pending(&self) -> &[RenderOp] {
        &self.pending
    }

    /// All finalized submissions, oldest first.
    pub fn submissions(&self) -> &[Vec<RenderOp>] {
        &self.submissions
    }

    /// The most recent submission's full op list.
    pub fn last_submission(&self) -> Option<&[RenderOp]> {
        self.submissions.last().map(Vec::as_slice)
    }

    /// Counts ops in the latest submission matching a predicate.
    pub fn count_in_last(&self, pred: impl Fn(&RenderOp) -> bool) -> usize {
        self.last_submission()
            .map(|ops| ops.iter().filter(|op| pred(op)).count())
            .unwrap_or(0)
    }
}

impl GraphicsHost for RecordingHost {
    fn try_compute_culling_params(
        &self,
        camera: &Camera,
        shadow_distance: f32,
    ) -> Option<CullingParams> {
        if self.unculled_cameras.contains(&camera.name) {
            return None;
        }
        if !camera.has_valid_frustum() {
            return None;
        }
        Some(CullingParams {
            camera: camera.name.clone(),
            view_projection: camera.view_projection(),
            shadow_distance,
        })
    }

    fn cull(&mut self, params: &CullingParams) -> CullingResult {
        let _ = params;
        self.next_culling_id += 1;
        CullingResult {
            id: CullingId(self.next_culling_id),
            lights: self.lights.clone(),
            probes: self.probes.clone(),
        }
    }

    fn execute(&mut self, recorder: &mut CommandRecorder) {
        self.pending.extend(recorder.drain());
    }

    fn submit(&mut self, recorder: &mut CommandRecorder) {
        let mut ops = std::mem::take(&mut self.pending);
        ops.extend(recorder.drain());
        self.submissions.push(ops);
    }

    fn find_kernel(&self, shader: ComputeShaderId, name: &str) -> Option<KernelId> {
        self.kernels.get(&(shader, name.to_owned())).copied()
    }

    fn uses_reversed_depth(&self) -> bool {
        self.reversed_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damier_core::renderer::KernelId;

    #[test]
    fn submit_folds_pending_ops_into_one_submission() {
        let mut host = RecordingHost::new();
        let mut rec = CommandRecorder::new("frame");
        rec.push(RenderOp::DrawGizmos);
        host.execute(&mut rec);
        assert_eq!(host.pending().len(), 1);

        rec.push(RenderOp::DrawUiOverlay);
        host.submit(&mut rec);
        assert!(host.pending().is_empty());
        assert_eq!(host.submissions().len(), 1);
        assert_eq!(host.last_submission().map(<[_]>::len), Some(2));
    }

    #[test]
    fn culling_fails_only_for_registered_cameras() {
        let mut host = RecordingHost::new();
        host.fail_culling_for("Broken");
        let ok = Camera::new("Main", 800, 450);
        let broken = Camera::new("Broken", 800, 450);
        assert!(host.try_compute_culling_params(&ok, 50.0).is_some());
        assert!(host.try_compute_culling_params(&broken, 50.0).is_none());
    }

    #[test]
    fn zero_sized_viewport_cannot_be_culled() {
        let host = RecordingHost::new();
        let degenerate = Camera::new("Empty", 0, 450);
        assert!(host.try_compute_culling_params(&degenerate, 50.0).is_none());
    }

    #[test]
    fn degenerate_clip_planes_cannot_be_culled() {
        let host = RecordingHost::new();
        let mut cam = Camera::new("Main", 800, 450);
        cam.near = 0.0;
        assert!(host.try_compute_culling_params(&cam, 50.0).is_none());
    }

    #[test]
    fn kernels_resolve_by_shader_and_name() {
        let host = RecordingHost::new().with_kernel(ComputeShaderId(3), "Reconstruct", KernelId(9));
        assert_eq!(
            host.find_kernel(ComputeShaderId(3), "Reconstruct"),
            Some(KernelId(9))
        );
        assert_eq!(host.find_kernel(ComputeShaderId(3), "Other"), None);
        assert_eq!(host.find_kernel(ComputeShaderId(4), "Reconstruct"), None);
    }

    #[test]
    fn successive_culls_get_distinct_ids() {
        let mut host = RecordingHost::new();
        let cam = Camera::new("Main", 800, 450);
        let params = host.try_compute_culling_params(&cam, 50.0).unwrap();
        let a = host.cull(&params);
        let b = host.cull(&params);
        assert_ne!(a.id, b.id);
    }
}
