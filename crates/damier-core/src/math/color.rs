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

//! Provides a linear-space RGBA color type for lighting calculations.

use serde::{Deserialize, Serialize};

use super::vector::Vec4;

/// An RGBA color in linear color space with `f32` components.
///
/// Lighting math happens in linear space; conversion to and from sRGB is the
/// host's concern when presenting.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct LinearRgba {
    /// The red component.
    pub r: f32,
    /// The green component.
    pub g: f32,
    /// The blue component.
    pub b: f32,
    /// The alpha component.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new color from linear components.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the color scaled by an intensity, leaving alpha untouched.
    #[inline]
    pub fn scaled(&self, intensity: f32) -> Self {
        Self::new(self.r * intensity, self.g * intensity, self.b * intensity, self.a)
    }

    /// Returns the color as a `Vec4` in `(r, g, b, a)` order.
    #[inline]
    pub const fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    /// Returns the RGB part as a 3-element array, discarding alpha.
    #[inline]
    pub const fn to_rgb_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_leaves_alpha_untouched() {
        let c = LinearRgba::new(0.5, 0.25, 1.0, 0.8).scaled(2.0);
        assert_eq!(c, LinearRgba::new(1.0, 0.5, 2.0, 0.8));
    }

    #[test]
    fn to_vec4_preserves_channel_order() {
        let v = LinearRgba::new(0.1, 0.2, 0.3, 0.4).to_vec4();
        assert_eq!(v, Vec4::new(0.1, 0.2, 0.3, 0.4));
    }
}
