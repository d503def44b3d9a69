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

//! Filtered scene-geometry draws.
//!
//! Every host-culled geometry pass in the pipeline goes through
//! [`draw_filtered`], which fixes the batching, instancing, and per-object
//! data policy in one place.

use damier_core::renderer::{
    CommandRecorder, CullingId, PassTag, PerObjectData, QueueRange, RenderOp, SortCriteria,
};

/// Records a filtered draw of the culled scene geometry.
///
/// Batching and instancing are always enabled; objects receive lightmap and
/// light-probe data so baked lighting survives the deferred path.
pub fn draw_filtered(
    recorder: &mut CommandRecorder,
    culling: CullingId,
    sort: SortCriteria,
    range: QueueRange,
    tags: &[PassTag],
) {
    recorder.push(RenderOp::DrawGeometry {
        culling,
        sort,
        range,
        tags: tags.to_vec(),
        batching: true,
        instancing: true,
        per_object: PerObjectData::LIGHTMAPS | PerObjectData::LIGHT_PROBES,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::tags;

    #[test]
    fn filtered_draws_carry_the_batching_policy() {
        let mut rec = CommandRecorder::new("test");
        draw_filtered(
            &mut rec,
            CullingId(1),
            SortCriteria::FrontToBack,
            QueueRange::OPAQUE,
            &[tags::DEFERRED_BASE, tags::DEFERRED_ADD],
        );

        match &rec.ops()[0] {
            RenderOp::DrawGeometry {
                batching,
                instancing,
                per_object,
                tags: recorded,
                ..
            } => {
                assert!(*batching && *instancing);
                assert!(per_object.contains(PerObjectData::LIGHTMAPS));
                assert_eq!(recorded.len(), 2);
            }
            other => panic!("expected DrawGeometry, got {other:?}"),
        }
    }
}
