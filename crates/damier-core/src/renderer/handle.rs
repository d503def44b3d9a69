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

//! Opaque handles for host-owned assets referenced from recorded commands.
//!
//! The scheduler never inspects asset contents; it only threads these keys
//! through the command list for the host to resolve.

/// An opaque handle to a host-owned mesh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// An opaque handle to a host-owned material.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// An opaque handle to a host-owned texture asset (cookies, sky cubemaps).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// An opaque handle to a host-owned compute shader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ComputeShaderId(pub u32);

/// An opaque handle to a kernel (entry point) within a compute shader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct KernelId(pub u32);

/// An opaque handle to a structured compute buffer created by the pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ComputeBufferId(pub u32);
