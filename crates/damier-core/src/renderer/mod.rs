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

//! Defines the renderer contracts: handles, targets, the recorded command
//! list, light and camera data, culling snapshots, and the host trait.

pub mod camera;
pub mod command;
pub mod culling;
pub mod error;
pub mod handle;
pub mod light;
pub mod target;
pub mod traits;

pub use camera::{Camera, CameraKind};
pub use command::{
    AttachmentRef, CommandRecorder, PassTag, PerObjectData, QueueRange, RenderOp, SortCriteria,
    TextureRef,
};
pub use culling::{CullingId, CullingParams, CullingResult};
pub use error::ResourceError;
pub use handle::{ComputeBufferId, ComputeShaderId, KernelId, MaterialId, MeshId, TextureId};
pub use light::{LightKind, LightRecord, ShadowMode, VisibleLight, VisibleReflectionProbe};
pub use target::{ReadWrite, RenderTargetDescriptor, RenderTargetId, TextureFormat};
pub use traits::GraphicsHost;
