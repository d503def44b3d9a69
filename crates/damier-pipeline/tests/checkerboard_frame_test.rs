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

//! End-to-end frame recording through the headless host.

use std::collections::HashMap;

use damier_core::renderer::{
    AttachmentRef, Camera, CameraKind, ComputeShaderId, KernelId, MaterialId, MeshId, RenderOp,
    ShadowMode, VisibleLight,
};
use damier_core::math::Vec3;
use damier_core::settings::{PipelineSettings, ShadowSettings};
use damier_pipeline::headless::RecordingHost;
use damier_pipeline::lighting::{LightVolumeAssets, Proxy};
use damier_pipeline::scheduler::{tags, targets, uniforms};
use damier_pipeline::{CameraFrame, CheckerboardScheduler, PipelineAssets, PipelineContext};

const RECONSTRUCT_SHADER: ComputeShaderId = ComputeShaderId(7);

fn pipeline_assets() -> PipelineAssets {
    PipelineAssets {
        fullscreen_triangle: MeshId(100),
        depth_mask: MaterialId(100),
        reconstruct_shader: RECONSTRUCT_SHADER,
    }
}

fn light_assets() -> LightVolumeAssets {
    let proxy = |n: u32| Proxy {
        mesh: MeshId(n),
        material: MaterialId(n),
    };
    LightVolumeAssets {
        directional: proxy(1),
        point: proxy(2),
        spot: proxy(3),
        reflection: proxy(4),
        indirect: proxy(5),
    }
}

fn scheduler() -> CheckerboardScheduler {
    CheckerboardScheduler::new(pipeline_assets(), light_assets(), ShadowSettings::default())
}

fn host_with_kernel() -> RecordingHost {
    RecordingHost::new().with_kernel(RECONSTRUCT_SHADER, "Reconstruct", KernelId(1))
}

fn three_light_scene(host: &mut RecordingHost) {
    host.add_light(
        VisibleLight::directional(Vec3::new(0.3, -0.8, 0.2)).with_shadows(ShadowMode::Hard),
    );
    host.add_light(VisibleLight::point(Vec3::new(1.0, 2.0, 3.0), 10.0));
    host.add_light(VisibleLight::spot(
        Vec3::new(-2.0, 4.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        15.0,
        1.0,
    ));
}

fn draw_geometry_count(ops: &[RenderOp], tag: &str) -> usize {
    ops.iter()
        .filter(|op| match op {
            RenderOp::DrawGeometry { tags, .. } => tags.iter().any(|t| t.0 == tag),
            _ => false,
        })
        .count()
}

#[test]
fn game_frame_records_the_full_checkerboard_sequence() {
    let mut host = host_with_kernel();
    three_light_scene(&mut host);
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Main Camera", 800, 450);

    let outcome = scheduler.render(&mut ctx, &mut host, &camera);
    assert_eq!(outcome.ok(), Some(CameraFrame::Rendered));
    assert_eq!(host.submissions().len(), 1);
    let ops = host.last_submission().unwrap();

    // One opaque prepass per depth buffer, one opaque G-Buffer pass.
    assert_eq!(draw_geometry_count(ops, tags::DEPTH_ONLY.0), 1);
    assert_eq!(draw_geometry_count(ops, tags::BACK_DEPTH.0), 1);
    assert_eq!(draw_geometry_count(ops, tags::DEFERRED_BASE.0), 1);
    assert_eq!(draw_geometry_count(ops, tags::TRANSPARENT.0), 1);

    // Only the directional light casts shadows, so the atlas has one slice
    // and one caster draw.
    let atlas_slices: Vec<u32> = ops
        .iter()
        .filter_map(|op| match op {
            RenderOp::CreateTargetArray { slices, .. } => Some(*slices),
            _ => None,
        })
        .collect();
    assert_eq!(atlas_slices, vec![1]);
    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::DrawShadowCasters { .. })),
        1
    );

    // Each runtime light gets a volume draw (its light index set first).
    let volume_indices: Vec<i32> = ops
        .iter()
        .filter_map(|op| match op {
            RenderOp::SetGlobalInt { name, value } if *name == uniforms::LIGHT_INDEX => {
                Some(*value)
            }
            _ => None,
        })
        .collect();
    assert_eq!(volume_indices, vec![0, 1, 2]);

    // The reconstruction dispatch covers the 400x225 checker field.
    let dispatches: Vec<(u32, u32, u32)> = ops
        .iter()
        .filter_map(|op| match op {
            RenderOp::Dispatch { groups, .. } => Some(*groups),
            _ => None,
        })
        .collect();
    assert_eq!(dispatches, vec![(50, 29, 1)]);
}

#[test]
fn culling_failure_skips_the_camera_entirely() {
    let mut host = host_with_kernel();
    host.fail_culling_for("Broken Camera");
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Broken Camera", 800, 450);

    let outcome = scheduler.render(&mut ctx, &mut host, &camera);
    assert_eq!(outcome.ok(), Some(CameraFrame::Skipped));
    assert!(host.submissions().is_empty());
    assert!(host.pending().is_empty());
    // Parity is untouched by a skipped camera's frame.
    assert_eq!(ctx.parity(), 0);
}

#[test]
fn degenerate_frustum_skips_the_camera_without_panicking() {
    let mut host = host_with_kernel();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());

    let mut camera = Camera::new("Main Camera", 800, 450);
    camera.near = 0.0;
    let outcome = scheduler.render(&mut ctx, &mut host, &camera);
    assert_eq!(outcome.ok(), Some(CameraFrame::Skipped));

    // An inverted depth range is just as unrenderable.
    camera.near = 10.0;
    camera.far = 5.0;
    let outcome = scheduler.render(&mut ctx, &mut host, &camera);
    assert_eq!(outcome.ok(), Some(CameraFrame::Skipped));

    assert!(host.submissions().is_empty());
    assert!(host.pending().is_empty());
    assert_eq!(ctx.parity(), 0);
}

#[test]
fn parity_alternates_across_primary_frames() {
    let mut host = host_with_kernel();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Main Camera", 800, 450);

    scheduler.render(&mut ctx, &mut host, &camera).ok();
    scheduler.render(&mut ctx, &mut host, &camera).ok();

    let parities: Vec<i32> = host
        .submissions()
        .iter()
        .map(|ops| {
            ops.iter()
                .find_map(|op| match op {
                    RenderOp::SetGlobalInt { name, value }
                        if *name == uniforms::FRAME_PARITY =>
                    {
                        Some(*value)
                    }
                    _ => None,
                })
                .unwrap()
        })
        .collect();
    assert_eq!(parities, vec![1, 0]);
}

#[test]
fn scene_view_renders_full_resolution_without_reconstruction() {
    let mut host = host_with_kernel();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Scene View", 800, 450).with_kind(CameraKind::SceneView);

    scheduler.render(&mut ctx, &mut host, &camera).ok();
    let ops = host.last_submission().unwrap();

    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::Dispatch { .. })),
        0
    );
    // The composite still reads the reconstructed target, filled by a blit.
    assert!(ops.iter().any(|op| matches!(
        op,
        RenderOp::Blit {
            src: AttachmentRef::Target(targets::DEFERRED_OUTPUT),
            dst: AttachmentRef::Target(targets::RECONSTRUCTED),
        }
    )));
    let parity = ops.iter().find_map(|op| match op {
        RenderOp::SetGlobalInt { name, value } if *name == uniforms::FRAME_PARITY => Some(*value),
        _ => None,
    });
    assert_eq!(parity, Some(0));
}

#[test]
fn missing_kernel_falls_back_to_a_passthrough_blit() {
    // No kernel registered on the host at all.
    let mut host = RecordingHost::new();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Main Camera", 800, 450);

    let outcome = scheduler.render(&mut ctx, &mut host, &camera);
    assert_eq!(outcome.ok(), Some(CameraFrame::Rendered));
    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::Dispatch { .. })),
        0
    );
    assert!(host.last_submission().unwrap().iter().any(|op| matches!(
        op,
        RenderOp::Blit {
            src: AttachmentRef::Target(targets::DEFERRED_OUTPUT),
            dst: AttachmentRef::Target(targets::RECONSTRUCTED),
        }
    )));
}

#[test]
fn every_created_resource_is_released_within_the_submission() {
    let mut host = host_with_kernel();
    three_light_scene(&mut host);
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Main Camera", 800, 450);

    scheduler.render(&mut ctx, &mut host, &camera).ok();
    let ops = host.last_submission().unwrap();

    let mut targets: HashMap<u32, i32> = HashMap::new();
    let mut buffers: HashMap<u32, i32> = HashMap::new();
    for op in ops {
        match op {
            RenderOp::CreateTarget(desc) => *targets.entry(desc.id.0).or_default() += 1,
            RenderOp::CreateTargetArray { desc, .. } => *targets.entry(desc.id.0).or_default() += 1,
            RenderOp::ReleaseTarget(id) => *targets.entry(id.0).or_default() -= 1,
            RenderOp::CreateBuffer { buffer, .. } => *buffers.entry(buffer.0).or_default() += 1,
            RenderOp::ReleaseBuffer(id) => *buffers.entry(id.0).or_default() -= 1,
            _ => {}
        }
    }
    assert!(!targets.is_empty());
    assert!(!buffers.is_empty());
    assert!(targets.values().all(|&n| n == 0), "leaked targets: {targets:?}");
    assert!(buffers.values().all(|&n| n == 0), "leaked buffers: {buffers:?}");
}

#[test]
fn shadow_slots_saturate_at_the_atlas_limit() {
    let mut host = host_with_kernel();
    for i in 0..8 {
        host.add_light(
            VisibleLight::directional(Vec3::new(0.1 * i as f32, -1.0, 0.2))
                .with_shadows(ShadowMode::Soft),
        );
    }
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Main Camera", 800, 450);

    scheduler.render(&mut ctx, &mut host, &camera).ok();
    assert_eq!(scheduler.shadow_count(), 7);
    let ops = host.last_submission().unwrap();

    let atlas_slices: Vec<u32> = ops
        .iter()
        .filter_map(|op| match op {
            RenderOp::CreateTargetArray { slices, .. } => Some(*slices),
            _ => None,
        })
        .collect();
    assert_eq!(atlas_slices, vec![7]);
    let caster_count = ops.iter().find_map(|op| match op {
        RenderOp::SetGlobalInt { name, value } if *name == uniforms::SHADOW_CASTER_COUNT => {
            Some(*value)
        }
        _ => None,
    });
    assert_eq!(caster_count, Some(7));
}

#[test]
fn preview_camera_skips_ui() {
    let mut host = host_with_kernel();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Asset Preview", 256, 256).with_kind(CameraKind::Preview);

    scheduler.render(&mut ctx, &mut host, &camera).ok();
    let ops = host.last_submission().unwrap();
    assert_eq!(draw_geometry_count(ops, tags::UI.0), 0);
    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::DrawUiOverlay)),
        0
    );
}

#[test]
fn game_camera_draws_ui_and_overlay() {
    let mut host = host_with_kernel();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Main Camera", 800, 450);

    scheduler.render(&mut ctx, &mut host, &camera).ok();
    let ops = host.last_submission().unwrap();
    assert_eq!(draw_geometry_count(ops, tags::UI.0), 1);
    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::DrawUiOverlay)),
        1
    );
}

#[test]
fn gizmos_draw_only_for_scene_views_when_enabled() {
    let mut host = host_with_kernel();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings {
        draw_gizmos: true,
        ..Default::default()
    });

    let game = Camera::new("Main Camera", 800, 450);
    scheduler.render(&mut ctx, &mut host, &game).ok();
    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::DrawGizmos)),
        0
    );

    let scene = Camera::new("Scene View", 800, 450).with_kind(CameraKind::SceneView);
    scheduler.render(&mut ctx, &mut host, &scene).ok();
    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::DrawGizmos)),
        1
    );
}

#[test]
fn shadow_capture_mode_records_a_minimal_depth_pass() {
    let mut host = host_with_kernel();
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    scheduler.set_shadow_capture(true);
    let mut ctx = PipelineContext::new(PipelineSettings::default());
    let camera = Camera::new("Light View", 1024, 1024);

    let outcome = scheduler.render(&mut ctx, &mut host, &camera);
    assert_eq!(outcome.ok(), Some(CameraFrame::Rendered));
    // Parity never moves for sub-renders.
    assert_eq!(ctx.parity(), 0);
    let ops = host.last_submission().unwrap();
    assert_eq!(draw_geometry_count(ops, tags::SHADOW_CASTER.0), 1);
    assert_eq!(draw_geometry_count(ops, tags::DEFERRED_BASE.0), 0);
    assert_eq!(
        host.count_in_last(|op| matches!(op, RenderOp::CreateTarget(_))),
        0
    );
}

#[test]
fn non_interactive_frames_use_the_virtual_sun() {
    let mut host = host_with_kernel();
    three_light_scene(&mut host);
    let mut scheduler = scheduler();
    scheduler.prepare(&host);
    let mut ctx = PipelineContext::new(PipelineSettings {
        interactive: false,
        ..Default::default()
    });
    let camera = Camera::new("Main Camera", 800, 450);

    scheduler.render(&mut ctx, &mut host, &camera).ok();
    let ops = host.last_submission().unwrap();

    // No per-light volume draws; the debug sun direction is set instead.
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(
                op,
                RenderOp::SetGlobalInt { name, .. } if *name == uniforms::LIGHT_INDEX
            ))
            .count(),
        0
    );
    assert!(ops.iter().any(|op| matches!(
        op,
        RenderOp::SetGlobalVector { name, .. } if *name == uniforms::VIRTUAL_SUN_DIRECTION
    )));
}
