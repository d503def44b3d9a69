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

//! Defines the pipeline configuration loaded at startup.

use serde::{Deserialize, Serialize};

/// Shadow-rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Edge length in pixels of each shadow-atlas slice.
    pub atlas_size: u32,
    /// Maximum camera distance at which shadows are rendered. Clamped to the
    /// camera's far plane at cull time.
    pub max_distance: f32,
    /// Directional cascade count the host is configured for. The baseline
    /// scheduler renders one cascade per atlas slot.
    pub cascade_count: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: 1024,
            max_distance: 1000.0,
            cascade_count: 2,
        }
    }
}

/// Top-level pipeline configuration.
///
/// Plain data with serde support; load it from JSON with
/// [`PipelineSettings::from_json`] or build it in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// The camera whose frames advance the checkerboard parity bit. When
    /// `None`, any game camera advances it.
    pub primary_camera: Option<String>,
    /// `true` when the application is running interactively (as opposed to
    /// being edited). Non-interactive mode also advances parity and swaps
    /// real lighting for the debug sun.
    pub interactive: bool,
    /// Whether editor gizmos are drawn for scene-view cameras.
    pub draw_gizmos: bool,
    /// The frame rate the host paces presentation to.
    pub target_frame_rate: u32,
    /// Shadow configuration.
    pub shadows: ShadowSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            primary_camera: None,
            interactive: true,
            draw_gizmos: false,
            target_frame_rate: 70,
            shadows: ShadowSettings::default(),
        }
    }
}

impl PipelineSettings {
    /// Parses settings from a JSON document. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_configuration() {
        let s = PipelineSettings::default();
        assert_eq!(s.shadows.atlas_size, 1024);
        assert_eq!(s.shadows.max_distance, 1000.0);
        assert_eq!(s.target_frame_rate, 70);
        assert!(s.interactive);
        assert!(s.primary_camera.is_none());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let s = PipelineSettings::from_json(
            r#"{ "primary_camera": "Main Camera", "shadows": { "atlas_size": 2048 } }"#,
        )
        .unwrap();
        assert_eq!(s.primary_camera.as_deref(), Some("Main Camera"));
        assert_eq!(s.shadows.atlas_size, 2048);
        assert_eq!(s.shadows.max_distance, 1000.0);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(PipelineSettings::from_json("{ not json").is_err());
    }
}
