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

//! Defines transient render-target keys and their creation descriptors.

use serde::{Deserialize, Serialize};

/// A stable integer key identifying a transient render target within a frame.
///
/// Keys are chosen by the pipeline (see the scheduler's target table) and are
/// only meaningful between the `CreateTarget` and `ReleaseTarget` commands
/// that bracket them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u32);

/// The texel format of a render target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit-per-channel RGBA, for LDR color.
    Argb32,
    /// 16-bit-float-per-channel RGBA, for HDR color.
    ArgbHalf,
    /// 32-bit-float-per-channel RGBA, for precise world-space data.
    ArgbFloat,
    /// Single 32-bit-float channel.
    RFloat,
    /// Two 32-bit-float channels.
    RgFloat,
    /// A depth-only format.
    Depth,
    /// A depth format sampleable with comparison, for shadow maps.
    Shadowmap,
}

/// Whether the host may need to read the target back as a texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadWrite {
    /// The target is only ever rendered into.
    WriteOnly,
    /// The target is rendered into and later sampled.
    ReadWrite,
}

/// Everything the host needs to allocate a transient render target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    /// The key the pipeline will use to reference the target.
    pub id: RenderTargetId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth-buffer precision in bits (0 for color-only targets).
    pub depth_bits: u8,
    /// The texel format.
    pub format: TextureFormat,
    /// `true` for linear-space sampling, `false` for sRGB.
    pub linear: bool,
    /// MSAA sample count (1 for no multisampling).
    pub samples: u32,
    /// Read-back intent.
    pub read_write: ReadWrite,
}

impl RenderTargetDescriptor {
    /// Creates a color descriptor with no depth and single sampling.
    pub fn color(id: RenderTargetId, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            id,
            width,
            height,
            depth_bits: 0,
            format,
            linear: true,
            samples: 1,
            read_write: ReadWrite::ReadWrite,
        }
    }

    /// Creates a depth descriptor with the given precision.
    pub fn depth(id: RenderTargetId, width: u32, height: u32, depth_bits: u8) -> Self {
        Self {
            id,
            width,
            height,
            depth_bits,
            format: TextureFormat::Depth,
            linear: true,
            samples: 1,
            read_write: ReadWrite::ReadWrite,
        }
    }

    /// Returns a copy with the depth precision replaced.
    pub fn with_depth_bits(mut self, depth_bits: u8) -> Self {
        self.depth_bits = depth_bits;
        self
    }

    /// Returns a copy with the format replaced.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Returns a copy with the sampling space replaced (`false` for sRGB).
    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }
}
