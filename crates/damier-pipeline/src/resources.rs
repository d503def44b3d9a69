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

//! Tracks transient frame resources so every create has a matching release.
//!
//! Targets and buffers are created through this tracker rather than by
//! pushing ops directly; [`FrameResources::release_all`] then releases
//! whatever is still live in reverse creation order, which keeps aborted
//! frames leak-free.

use damier_core::renderer::{
    CommandRecorder, ComputeBufferId, RenderOp, RenderTargetDescriptor, RenderTargetId,
    ResourceError,
};

/// Create/release bookkeeping for one frame's transient resources.
#[derive(Debug, Default)]
pub struct FrameResources {
    live_targets: Vec<RenderTargetId>,
    live_buffers: Vec<ComputeBufferId>,
}

impl FrameResources {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a `CreateTarget` op and marks the key live.
    pub fn create_target(
        &mut self,
        recorder: &mut CommandRecorder,
        desc: RenderTargetDescriptor,
    ) -> Result<(), ResourceError> {
        self.mark_target_live(desc.id)?;
        recorder.push(RenderOp::CreateTarget(desc));
        Ok(())
    }

    /// Records a `CreateTargetArray` op and marks the key live.
    pub fn create_target_array(
        &mut self,
        recorder: &mut CommandRecorder,
        desc: RenderTargetDescriptor,
        slices: u32,
    ) -> Result<(), ResourceError> {
        self.mark_target_live(desc.id)?;
        recorder.push(RenderOp::CreateTargetArray { desc, slices });
        Ok(())
    }

    /// Records a `ReleaseTarget` op and marks the key dead.
    pub fn release_target(
        &mut self,
        recorder: &mut CommandRecorder,
        id: RenderTargetId,
    ) -> Result<(), ResourceError> {
        let pos = self
            .live_targets
            .iter()
            .position(|t| *t == id)
            .ok_or(ResourceError::TargetNotLive { id })?;
        self.live_targets.remove(pos);
        recorder.push(RenderOp::ReleaseTarget(id));
        Ok(())
    }

    /// Records a `CreateBuffer` op and marks the key live.
    pub fn create_buffer(
        &mut self,
        recorder: &mut CommandRecorder,
        buffer: ComputeBufferId,
        count: u32,
        stride: u32,
    ) -> Result<(), ResourceError> {
        if self.live_buffers.contains(&buffer) {
            return Err(ResourceError::BufferAlreadyLive { id: buffer });
        }
        self.live_buffers.push(buffer);
        recorder.push(RenderOp::CreateBuffer {
            buffer,
            count,
            stride,
        });
        Ok(())
    }

    /// Records a `ReleaseBuffer` op and marks the key dead.
    pub fn release_buffer(
        &mut self,
        recorder: &mut CommandRecorder,
        buffer: ComputeBufferId,
    ) -> Result<(), ResourceError> {
        let pos = self
            .live_buffers
            .iter()
            .position(|b| *b == buffer)
            .ok_or(ResourceError::BufferNotLive { id: buffer })?;
        self.live_buffers.remove(pos);
        recorder.push(RenderOp::ReleaseBuffer(buffer));
        Ok(())
    }

    /// Returns `true` if the target key is currently live.
    #[cfg(test)]
    fn is_target_live(&self, id: RenderTargetId) -> bool {
        self.live_targets.contains(&id)
    }

    /// Number of live targets plus live buffers.
    pub fn live_count(&self) -> usize {
        self.live_targets.len() + self.live_buffers.len()
    }

    /// Releases everything still live, in reverse creation order.
    pub fn release_all(&mut self, recorder: &mut CommandRecorder) {
        while let Some(id) = self.live_targets.pop() {
            recorder.push(RenderOp::ReleaseTarget(id));
        }
        while let Some(buffer) = self.live_buffers.pop() {
            recorder.push(RenderOp::ReleaseBuffer(buffer));
        }
    }

    fn mark_target_live(&mut self, id: RenderTargetId) -> Result<(), ResourceError> {
        if self.live_targets.contains(&id) {
            return Err(ResourceError::TargetAlreadyLive { id });
        }
        self.live_targets.push(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damier_core::renderer::TextureFormat;

    fn desc(id: u32) -> RenderTargetDescriptor {
        RenderTargetDescriptor::color(RenderTargetId(id), 64, 64, TextureFormat::ArgbHalf)
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let mut res = FrameResources::new();
        let mut rec = CommandRecorder::new("test");
        res.create_target(&mut rec, desc(1)).unwrap();
        assert_eq!(
            res.create_target(&mut rec, desc(1)),
            Err(ResourceError::TargetAlreadyLive {
                id: RenderTargetId(1)
            })
        );
    }

    #[test]
    fn double_release_is_rejected() {
        let mut res = FrameResources::new();
        let mut rec = CommandRecorder::new("test");
        res.create_target(&mut rec, desc(1)).unwrap();
        assert!(res.is_target_live(RenderTargetId(1)));
        res.release_target(&mut rec, RenderTargetId(1)).unwrap();
        assert!(!res.is_target_live(RenderTargetId(1)));
        assert_eq!(
            res.release_target(&mut rec, RenderTargetId(1)),
            Err(ResourceError::TargetNotLive {
                id: RenderTargetId(1)
            })
        );
    }

    #[test]
    fn release_all_runs_in_reverse_creation_order() {
        let mut res = FrameResources::new();
        let mut rec = CommandRecorder::new("test");
        res.create_target(&mut rec, desc(1)).unwrap();
        res.create_target(&mut rec, desc(2)).unwrap();
        res.create_buffer(&mut rec, ComputeBufferId(9), 4, 16).unwrap();
        res.release_all(&mut rec);
        assert_eq!(res.live_count(), 0);

        let releases: Vec<_> = rec
            .ops()
            .iter()
            .filter(|op| {
                matches!(op, RenderOp::ReleaseTarget(_) | RenderOp::ReleaseBuffer(_))
            })
            .cloned()
            .collect();
        assert_eq!(
            releases,
            vec![
                RenderOp::ReleaseTarget(RenderTargetId(2)),
                RenderOp::ReleaseTarget(RenderTargetId(1)),
                RenderOp::ReleaseBuffer(ComputeBufferId(9)),
            ]
        );
    }
}
