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

//! Defines the culling request and its visibility snapshot.

use crate::math::Mat4;

use super::light::{VisibleLight, VisibleReflectionProbe};

/// A host-issued token identifying one culling snapshot within a frame.
///
/// Draw ops reference the snapshot by this id so the host can resolve the
/// visible geometry set when interpreting the command list.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CullingId(pub u64);

/// The inputs the host needs to run visibility culling for a camera.
#[derive(Debug, Clone)]
pub struct CullingParams {
    /// The camera name, for host-side diagnostics.
    pub camera: String,
    /// The camera's world-to-clip matrix.
    pub view_projection: Mat4,
    /// Maximum distance at which shadow casters are collected.
    pub shadow_distance: f32,
}

/// Everything culling found visible for one camera.
#[derive(Debug, Clone, Default)]
pub struct CullingResult {
    /// The snapshot id draw ops reference.
    pub id: CullingId,
    /// Visible lights, in host order. Indices into this list are stable for
    /// the duration of the frame.
    pub lights: Vec<VisibleLight>,
    /// Visible reflection probes.
    pub probes: Vec<VisibleReflectionProbe>,
}
