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

//! Registered instanced draws with per-camera frustum culling.
//!
//! Gameplay code registers a mesh/material/count with world bounds and a
//! scheduling layer; the scheduler culls the whole registry once per camera
//! and draws each surviving entry's layer at the right point in the frame.

use damier_core::math::geometry::{frustum_planes, Aabb};
use damier_core::renderer::{Camera, CommandRecorder, MaterialId, MeshId, RenderOp};

/// A stable handle to a registered procedural draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProceduralHandle(u64);

/// The scheduling layer a procedural draw renders in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProceduralLayer {
    /// Drawn into the G-Buffer with the opaques.
    Opaque,
    /// Drawn in the transparency pass.
    Transparent,
}

/// One registered instanced draw.
#[derive(Debug, Clone)]
pub struct ProceduralDraw {
    /// The instanced mesh.
    pub mesh: MeshId,
    /// The material every instance shares.
    pub material: MaterialId,
    /// Number of instances.
    pub instances: u32,
    /// The pass the draw renders in.
    pub layer: ProceduralLayer,
    /// World-space bounds of all instances, used for culling.
    pub bounds: Aabb,
}

#[derive(Debug)]
struct Entry {
    handle: ProceduralHandle,
    draw: ProceduralDraw,
    visible: bool,
}

/// The per-context registry of procedural draws.
#[derive(Debug, Default)]
pub struct ProceduralRegistry {
    entries: Vec<Entry>,
    next_handle: u64,
}

impl ProceduralRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a draw and returns its handle.
    pub fn register(&mut self, draw: ProceduralDraw) -> ProceduralHandle {
        self.next_handle += 1;
        let handle = ProceduralHandle(self.next_handle);
        self.entries.push(Entry {
            handle,
            draw,
            visible: false,
        });
        handle
    }

    /// Removes a draw. Returns `false` when the handle is unknown.
    pub fn unregister(&mut self, handle: ProceduralHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Number of registered draws.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tests every entry against the camera's frustum. Runs once per
    /// camera, before any layer is drawn.
    pub fn cull(&mut self, camera: &Camera) {
        let planes = frustum_planes(&camera.view_projection());
        for entry in &mut self.entries {
            entry.visible =
                entry.draw.instances > 0 && entry.draw.bounds.intersects_frustum(&planes);
        }
    }

    /// Number of entries that survived the last cull.
    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|e| e.visible).count()
    }

    /// Records the surviving draws of one layer.
    pub fn draw_layer(&self, recorder: &mut CommandRecorder, layer: ProceduralLayer) {
        for entry in &self.entries {
            if entry.visible && entry.draw.layer == layer {
                recorder.push(RenderOp::DrawProcedural {
                    mesh: entry.draw.mesh,
                    material: entry.draw.material,
                    instances: entry.draw.instances,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damier_core::math::Vec3;

    fn grass(center: Vec3, layer: ProceduralLayer) -> ProceduralDraw {
        ProceduralDraw {
            mesh: MeshId(10),
            material: MaterialId(10),
            instances: 500,
            layer,
            bounds: Aabb::from_center_extents(center, Vec3::splat(2.0)),
        }
    }

    #[test]
    fn entries_behind_the_camera_are_culled() {
        let mut registry = ProceduralRegistry::new();
        registry.register(grass(Vec3::new(0.0, 0.0, -20.0), ProceduralLayer::Opaque));
        registry.register(grass(Vec3::new(0.0, 0.0, 50.0), ProceduralLayer::Opaque));

        let camera = Camera::new("test", 800, 450);
        registry.cull(&camera);
        assert_eq!(registry.visible_count(), 1);

        let mut rec = CommandRecorder::new("test");
        registry.draw_layer(&mut rec, ProceduralLayer::Opaque);
        assert_eq!(rec.ops().len(), 1);
    }

    #[test]
    fn layers_draw_independently() {
        let mut registry = ProceduralRegistry::new();
        registry.register(grass(Vec3::new(0.0, 0.0, -20.0), ProceduralLayer::Opaque));
        registry.register(grass(Vec3::new(0.0, 0.0, -30.0), ProceduralLayer::Transparent));

        let camera = Camera::new("test", 800, 450);
        registry.cull(&camera);

        let mut rec = CommandRecorder::new("test");
        registry.draw_layer(&mut rec, ProceduralLayer::Transparent);
        assert_eq!(rec.ops().len(), 1);
    }

    #[test]
    fn unregister_removes_the_entry() {
        let mut registry = ProceduralRegistry::new();
        let handle = registry.register(grass(Vec3::ZERO, ProceduralLayer::Opaque));
        assert!(registry.unregister(handle));
        assert!(!registry.unregister(handle));
        assert!(registry.is_empty());
    }

    #[test]
    fn zero_instance_entries_never_draw() {
        let mut registry = ProceduralRegistry::new();
        let mut draw = grass(Vec3::new(0.0, 0.0, -20.0), ProceduralLayer::Opaque);
        draw.instances = 0;
        registry.register(draw);

        let camera = Camera::new("test", 800, 450);
        registry.cull(&camera);
        assert_eq!(registry.visible_count(), 0);
    }
}
