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

//! Defines the recorded command vocabulary and the per-frame recorder.
//!
//! A frame is an ordered list of [`RenderOp`] values built through a
//! [`CommandRecorder`] and handed to the host for interpretation. Ops carry
//! plain data only; nothing here touches a GPU.

use std::ops::BitOr;

use crate::math::{Mat4, Vec4};

use super::culling::CullingId;
use super::handle::{ComputeBufferId, ComputeShaderId, KernelId, MaterialId, MeshId, TextureId};
use super::target::{RenderTargetDescriptor, RenderTargetId};

/// Ordering applied to a filtered geometry draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortCriteria {
    /// Near-to-far, for opaque geometry.
    FrontToBack,
    /// Far-to-near, for blended geometry.
    BackToFront,
    /// Canvas/submission order, for UI.
    CanvasOrder,
}

/// An inclusive material-queue interval for filtered draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueueRange {
    /// Lowest queue value included.
    pub min: u32,
    /// Highest queue value included.
    pub max: u32,
}

impl QueueRange {
    /// Every queue value.
    pub const ALL: Self = Self {
        min: 0,
        max: 5000,
    };
    /// The opaque geometry interval.
    pub const OPAQUE: Self = Self {
        min: 0,
        max: 2500,
    };
    /// The transparent geometry interval.
    pub const TRANSPARENT: Self = Self {
        min: 2501,
        max: 5000,
    };
}

/// A shader pass tag used to select which material passes a draw includes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassTag(pub &'static str);

/// Per-object GPU data a filtered draw asks the host to bind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PerObjectData(pub u32);

impl PerObjectData {
    /// No per-object data.
    pub const NONE: Self = Self(0);
    /// Baked lightmap UVs and atlases.
    pub const LIGHTMAPS: Self = Self(1);
    /// Interpolated light-probe coefficients.
    pub const LIGHT_PROBES: Self = Self(1 << 1);

    /// Returns `true` if all bits of `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PerObjectData {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A color-attachment or blit destination: either a transient target or the
/// camera's final backbuffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttachmentRef {
    /// A transient target created this frame.
    Target(RenderTargetId),
    /// The camera's output surface, owned by the host.
    CameraTarget,
}

/// A texture source for global or compute bindings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureRef {
    /// A transient render target.
    Target(RenderTargetId),
    /// A host-owned texture asset.
    Asset(TextureId),
}

/// One recorded command. The host interprets these in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    /// Opens a named profiling scope.
    BeginSample(String),
    /// Closes a named profiling scope.
    EndSample(String),

    /// Allocates a transient render target.
    CreateTarget(RenderTargetDescriptor),
    /// Allocates a transient render-target array (e.g. a shadow atlas).
    CreateTargetArray {
        /// The per-slice descriptor.
        desc: RenderTargetDescriptor,
        /// Number of array slices.
        slices: u32,
    },
    /// Releases a transient target created earlier this frame.
    ReleaseTarget(RenderTargetId),
    /// Creates a structured compute buffer.
    CreateBuffer {
        /// The key the pipeline will use to reference the buffer.
        buffer: ComputeBufferId,
        /// Element count.
        count: u32,
        /// Element stride in bytes.
        stride: u32,
    },
    /// Uploads raw bytes into a compute buffer.
    WriteBuffer {
        /// The destination buffer.
        buffer: ComputeBufferId,
        /// The bytes to upload.
        data: Vec<u8>,
    },
    /// Releases a compute buffer created earlier this frame.
    ReleaseBuffer(ComputeBufferId),

    /// Binds color attachments and an optional depth attachment.
    SetRenderTarget {
        /// Color attachments, bound in order.
        colors: Vec<AttachmentRef>,
        /// Optional depth attachment.
        depth: Option<RenderTargetId>,
    },
    /// Binds one slice of a target array as the sole depth attachment.
    SetRenderTargetSlice {
        /// The target array.
        target: RenderTargetId,
        /// The slice index.
        slice: u32,
    },
    /// Clears the currently bound attachments.
    Clear {
        /// Clear the color attachments.
        color: bool,
        /// Clear the depth attachment.
        depth: bool,
        /// Clear the stencil attachment.
        stencil: bool,
    },
    /// Copies one attachment into another, stretching to fit.
    Blit {
        /// Source attachment.
        src: AttachmentRef,
        /// Destination attachment.
        dst: AttachmentRef,
    },

    /// Sets the view and projection matrices for subsequent draws.
    SetViewProjection {
        /// World-to-view matrix.
        view: Mat4,
        /// View-to-clip matrix.
        projection: Mat4,
    },
    /// Draws the culled scene geometry matching a filter.
    DrawGeometry {
        /// The culling snapshot the draw pulls visibility from.
        culling: CullingId,
        /// Draw ordering.
        sort: SortCriteria,
        /// Material-queue interval.
        range: QueueRange,
        /// Shader pass tags included, in priority order.
        tags: Vec<PassTag>,
        /// Whether the host may batch compatible draws.
        batching: bool,
        /// Whether the host may GPU-instance compatible draws.
        instancing: bool,
        /// Per-object data to bind.
        per_object: PerObjectData,
    },
    /// Draws a single mesh with an explicit transform.
    DrawMesh {
        /// The mesh asset.
        mesh: MeshId,
        /// Object-to-world transform.
        transform: Mat4,
        /// The material asset.
        material: MaterialId,
        /// Material pass index.
        pass: u32,
    },
    /// Draws an instanced mesh without per-instance CPU data.
    DrawProcedural {
        /// The mesh asset.
        mesh: MeshId,
        /// The material asset.
        material: MaterialId,
        /// Number of instances.
        instances: u32,
    },
    /// Draws the shadow casters for one visible light into the bound slice.
    DrawShadowCasters {
        /// The culling snapshot.
        culling: CullingId,
        /// Index of the light in the snapshot's visible-light list.
        visible_light_index: usize,
    },
    /// Draws the host's procedural sky dome.
    DrawSkybox,
    /// Draws editor gizmos over the scene.
    DrawGizmos,
    /// Draws the host's overlay UI into the camera target.
    DrawUiOverlay,

    /// Enables or disables a global shader keyword.
    SetShaderKeyword {
        /// The keyword name.
        name: &'static str,
        /// Whether the keyword is enabled.
        enabled: bool,
    },
    /// Sets a global integer shader uniform.
    SetGlobalInt {
        /// Uniform name.
        name: &'static str,
        /// Value.
        value: i32,
    },
    /// Sets a global float shader uniform.
    SetGlobalFloat {
        /// Uniform name.
        name: &'static str,
        /// Value.
        value: f32,
    },
    /// Sets a global vector shader uniform.
    SetGlobalVector {
        /// Uniform name.
        name: &'static str,
        /// Value.
        value: Vec4,
    },
    /// Sets a global matrix shader uniform.
    SetGlobalMatrix {
        /// Uniform name.
        name: &'static str,
        /// Value.
        value: Mat4,
    },
    /// Binds a texture to a global shader slot.
    SetGlobalTexture {
        /// Uniform name.
        name: &'static str,
        /// The texture source.
        texture: TextureRef,
    },
    /// Binds a compute buffer to a global shader slot.
    SetGlobalBuffer {
        /// Uniform name.
        name: &'static str,
        /// The buffer.
        buffer: ComputeBufferId,
    },

    /// Binds a texture to a compute kernel slot.
    SetComputeTexture {
        /// The compute shader.
        shader: ComputeShaderId,
        /// The kernel within the shader.
        kernel: KernelId,
        /// Binding name.
        name: &'static str,
        /// The texture source.
        texture: TextureRef,
    },
    /// Sets a vector uniform on a compute shader.
    SetComputeVector {
        /// The compute shader.
        shader: ComputeShaderId,
        /// Uniform name.
        name: &'static str,
        /// Value.
        value: Vec4,
    },
    /// Sets an integer uniform on a compute shader.
    SetComputeInt {
        /// The compute shader.
        shader: ComputeShaderId,
        /// Uniform name.
        name: &'static str,
        /// Value.
        value: i32,
    },
    /// Dispatches a compute kernel.
    Dispatch {
        /// The compute shader.
        shader: ComputeShaderId,
        /// The kernel within the shader.
        kernel: KernelId,
        /// Thread-group counts in x, y, z.
        groups: (u32, u32, u32),
    },
}

/// Records the ordered op list for one camera's frame.
///
/// The recorder owns the frame's profiling-scope discipline: opening a sample
/// while another is open closes the previous one first, so recorded frames
/// always carry balanced `BeginSample`/`EndSample` pairs.
#[derive(Debug)]
pub struct CommandRecorder {
    label: String,
    ops: Vec<RenderOp>,
    open_sample: Option<String>,
}

impl CommandRecorder {
    /// Creates a recorder labeled with the camera's name.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ops: Vec::new(),
            open_sample: None,
        }
    }

    /// The recorder's label, shown in host profilers.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Opens a named profiling sample, closing any sample already open.
    pub fn begin_sample(&mut self, name: impl Into<String>) {
        self.end_sample();
        let name = name.into();
        self.ops.push(RenderOp::BeginSample(name.clone()));
        self.open_sample = Some(name);
    }

    /// Closes the currently open profiling sample, if any.
    pub fn end_sample(&mut self) {
        if let Some(name) = self.open_sample.take() {
            self.ops.push(RenderOp::EndSample(name));
        }
    }

    /// Appends an op to the frame.
    pub fn push(&mut self, op: RenderOp) {
        self.ops.push(op);
    }

    /// Returns the recorded ops without consuming them.
    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    /// Returns `true` if nothing has been recorded since the last drain.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Takes every recorded op, closing any open sample first.
    ///
    /// Hosts call this from `execute`/`submit`; the recorder can keep
    /// recording afterwards.
    pub fn drain(&mut self) -> Vec<RenderOp> {
        self.end_sample();
        std::mem::take(&mut self.ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_sample_closes_previous_sample() {
        let mut rec = CommandRecorder::new("test");
        rec.begin_sample("first");
        rec.begin_sample("second");
        rec.end_sample();

        let ops = rec.drain();
        assert_eq!(
            ops,
            vec![
                RenderOp::BeginSample("first".into()),
                RenderOp::EndSample("first".into()),
                RenderOp::BeginSample("second".into()),
                RenderOp::EndSample("second".into()),
            ]
        );
    }

    #[test]
    fn drain_closes_dangling_sample() {
        let mut rec = CommandRecorder::new("test");
        rec.begin_sample("dangling");
        let ops = rec.drain();
        assert_eq!(ops.last(), Some(&RenderOp::EndSample("dangling".into())));
        assert!(rec.is_empty());
    }

    #[test]
    fn per_object_data_bits_compose() {
        let both = PerObjectData::LIGHTMAPS | PerObjectData::LIGHT_PROBES;
        assert!(both.contains(PerObjectData::LIGHTMAPS));
        assert!(both.contains(PerObjectData::LIGHT_PROBES));
        assert!(!PerObjectData::LIGHTMAPS.contains(both));
    }
}
