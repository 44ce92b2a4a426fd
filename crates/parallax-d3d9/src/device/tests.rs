use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use parallax_view::{Eye, HeadPose, HeadTracker, StereoConfig};
use pretty_assertions::assert_eq;

use super::StereoDevice;
use crate::error::D3dError;
use crate::heuristics::{DefaultHeuristics, StereoHeuristics};
use crate::presenter::NullPresenter;
use crate::registers::{MatrixSimpleTranslate, ShaderRules};
use crate::state::{
    ClearFlags, Color, Format, IndexFormat, PresentParameters, PrimitiveType, ShaderStage,
    SurfaceDesc, TextureDesc, TextureKind, TransformState, Usage, Viewport,
};
use crate::test_utils::{Call, CopyKind, DrawKind, RecordingDevice, SurfaceId, TextureId};

const LEFT_BACK_BUFFER: SurfaceId = SurfaceId(2);
const RIGHT_BACK_BUFFER: SurfaceId = SurfaceId(3);

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mirror_on(device: RecordingDevice) -> StereoDevice<RecordingDevice> {
    init_logging();
    let mut mirror = StereoDevice::new(device, DefaultHeuristics, StereoConfig::default())
        .expect("mirror setup");
    mirror.device_mut().clear_calls();
    mirror
}

fn mirror() -> StereoDevice<RecordingDevice> {
    mirror_on(RecordingDevice::new())
}

fn surface(width: u32, height: u32) -> SurfaceDesc {
    SurfaceDesc {
        width,
        height,
        format: Format::A8R8G8B8,
        usage: Usage::RENDER_TARGET,
        ..SurfaceDesc::default()
    }
}

fn texture(width: u32, height: u32, usage: Usage) -> TextureDesc {
    TextureDesc {
        kind: TextureKind::Texture2D,
        width,
        height,
        levels: 1,
        usage,
        format: Format::A8R8G8B8,
        pool: Default::default(),
    }
}

#[test]
fn setup_binds_the_left_back_buffer() {
    let mirror = mirror();
    let back_buffer = mirror.get_back_buffer().unwrap();
    assert!(back_buffer.is_stereo());
    assert_eq!(*back_buffer.left(), LEFT_BACK_BUFFER);
    assert_eq!(mirror.device().render_target(0), Some(LEFT_BACK_BUFFER));
    assert_eq!(mirror.active_eye(), Eye::Left);
    assert!(mirror.bindings().viewport_is_default());
}

#[test]
fn missing_swap_chain_is_fatal() {
    let err = StereoDevice::new(
        RecordingDevice::new().without_back_buffer(),
        DefaultHeuristics,
        StereoConfig::default(),
    )
    .err()
    .expect("setup must fail");
    assert!(matches!(err, D3dError::PrimarySwapChainUnavailable(_)));
    assert!(err.is_fatal());
}

#[test]
fn right_eye_is_refused_on_a_mono_primary_target() {
    let mut mirror = mirror();
    let shadow_map = mirror.create_render_target(&surface(512, 512), false).unwrap();
    assert!(!shadow_map.is_stereo());
    mirror.set_render_target(0, Some(&shadow_map)).unwrap();
    mirror.device_mut().clear_calls();

    assert!(!mirror.try_set_active_eye(Eye::Right));
    assert_eq!(mirror.active_eye(), Eye::Left);
    assert!(mirror.device().calls().is_empty());
    assert_eq!(mirror.stats().snapshot().rejected_eye_switches, 1);
}

#[test]
fn switching_to_the_active_eye_is_a_no_op() {
    let mut mirror = mirror();
    assert!(mirror.try_set_active_eye(Eye::Left));
    assert!(mirror.device().calls().is_empty());
    assert_eq!(mirror.stats().snapshot().eye_switches, 0);
}

#[test]
fn eye_switch_rebinds_stereo_slots_only() {
    let mut mirror = mirror();
    let stereo = mirror
        .create_texture(&texture(256, 128, Usage::RENDER_TARGET))
        .unwrap();
    let mono = mirror.create_texture(&texture(256, 128, Usage::empty())).unwrap();
    mirror.set_texture(0, Some(&stereo)).unwrap();
    mirror.set_texture(1, Some(&mono)).unwrap();
    mirror.device_mut().clear_calls();

    assert!(mirror.try_set_active_eye(Eye::Right));
    assert_eq!(
        mirror.device().calls(),
        &[
            Call::SetRenderTarget {
                index: 0,
                surface: Some(RIGHT_BACK_BUFFER),
            },
            Call::SetTexture {
                stage: 0,
                texture: Some(*stereo.right().unwrap()),
            },
        ]
    );
}

#[test]
fn eye_switch_restores_a_custom_viewport() {
    let mut mirror = mirror();
    let viewport = Viewport {
        x: 0,
        y: 0,
        width: 640,
        height: 360,
        min_z: 0.0,
        max_z: 1.0,
    };
    mirror.set_viewport(&viewport).unwrap();
    assert!(!mirror.bindings().viewport_is_default());
    mirror.device_mut().clear_calls();

    assert!(mirror.try_set_active_eye(Eye::Right));
    assert_eq!(
        mirror.device().calls(),
        &[
            Call::SetRenderTarget {
                index: 0,
                surface: Some(RIGHT_BACK_BUFFER),
            },
            Call::SetViewport(viewport),
        ]
    );
}

#[test]
fn auto_depth_stencil_follows_the_eye() {
    let mut mirror = mirror_on(RecordingDevice::new().with_auto_depth_stencil());
    let depth_stencil = mirror.get_depth_stencil_surface().unwrap();
    assert!(depth_stencil.is_stereo());

    assert!(mirror.try_set_active_eye(Eye::Right));
    assert!(mirror
        .device()
        .calls()
        .contains(&Call::SetDepthStencil(depth_stencil.right().copied())));
}

#[test]
fn view_transform_is_split_per_eye() {
    let mut mirror = mirror();
    let view = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
    mirror
        .set_transform(TransformState::View, Some(&view))
        .unwrap();
    let left = mirror.view().view_transform(Eye::Left) * view;
    let right = mirror.view().view_transform(Eye::Right) * view;
    assert_eq!(
        mirror.device().calls(),
        &[Call::SetTransform {
            state: TransformState::View,
            matrix: left,
        }]
    );

    mirror.device_mut().clear_calls();
    assert!(mirror.try_set_active_eye(Eye::Right));
    assert!(mirror.device().calls().contains(&Call::SetTransform {
        state: TransformState::View,
        matrix: right,
    }));
}

#[test]
fn identity_view_is_not_reapplied_on_switch() {
    let mut mirror = mirror();
    mirror
        .set_transform(TransformState::View, Some(&Mat4::IDENTITY))
        .unwrap();
    assert!(!mirror.bindings().view_transform().is_set);

    mirror.device_mut().clear_calls();
    assert!(mirror.try_set_active_eye(Eye::Right));
    assert!(!mirror
        .device()
        .calls()
        .iter()
        .any(|call| matches!(call, Call::SetTransform { .. })));
}

#[test]
fn draws_go_left_then_right() {
    let mut mirror = mirror();
    mirror
        .draw_primitive(PrimitiveType::TriangleList, 0, 1)
        .unwrap();
    assert_eq!(
        mirror.device().draw_targets(),
        vec![Some(LEFT_BACK_BUFFER), Some(RIGHT_BACK_BUFFER)]
    );
    assert_eq!(mirror.active_eye(), Eye::Right);

    // The next draw starts over on the left eye.
    mirror.device_mut().clear_calls();
    mirror
        .draw_primitive(PrimitiveType::TriangleList, 0, 1)
        .unwrap();
    assert_eq!(
        mirror.device().draw_targets(),
        vec![Some(LEFT_BACK_BUFFER), Some(RIGHT_BACK_BUFFER)]
    );
}

#[test]
fn mono_target_draws_once() {
    let mut mirror = mirror();
    let shadow_map = mirror.create_render_target(&surface(512, 512), false).unwrap();
    mirror.set_render_target(0, Some(&shadow_map)).unwrap();
    mirror.device_mut().clear_calls();

    mirror
        .clear(&[], ClearFlags::TARGET, Color::default(), 1.0, 0)
        .unwrap();
    assert_eq!(
        mirror.device().draw_targets(),
        vec![Some(*shadow_map.left())]
    );
}

#[test]
fn color_fill_reaches_the_right_instance_only_when_the_eye_can_switch() {
    let mut mirror = mirror();
    let target = mirror.create_render_target(&surface(800, 600), false).unwrap();
    let right = *target.right().unwrap();
    mirror.device_mut().clear_calls();

    mirror.color_fill(Some(&target), None, Color(7)).unwrap();
    assert_eq!(
        mirror.device().draw_targets(),
        vec![Some(*target.left()), Some(right)]
    );

    let shadow_map = mirror.create_render_target(&surface(512, 512), false).unwrap();
    mirror.set_render_target(0, Some(&shadow_map)).unwrap();
    mirror.device_mut().clear_calls();

    mirror.color_fill(Some(&target), None, Color(7)).unwrap();
    assert_eq!(mirror.device().draw_targets(), vec![Some(*target.left())]);
    assert!(matches!(
        mirror.color_fill(None, None, Color(7)),
        Err(D3dError::InvalidCall(_))
    ));
}

#[test]
fn failing_right_eye_draw_still_succeeds() {
    let mut mirror = mirror();
    mirror.device_mut().fail_draws_on(RIGHT_BACK_BUFFER);

    mirror
        .draw_primitive(PrimitiveType::TriangleStrip, 0, 2)
        .unwrap();
    assert_eq!(mirror.device().draw_targets().len(), 2);
    let stats = mirror.stats().snapshot();
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.second_eye_failures, 1);
}

#[test]
fn failing_left_eye_draw_skips_the_right_eye() {
    let mut mirror = mirror();
    mirror.device_mut().fail_draws_on(LEFT_BACK_BUFFER);

    assert!(mirror
        .draw_primitive(PrimitiveType::TriangleList, 0, 1)
        .is_err());
    assert_eq!(mirror.device().draw_targets(), vec![Some(LEFT_BACK_BUFFER)]);
    assert_eq!(mirror.active_eye(), Eye::Left);
}

#[test]
fn short_immediate_data_is_rejected() {
    let mut mirror = mirror();
    let err = mirror
        .draw_primitive_up(PrimitiveType::TriangleList, 2, &[0; 48], 16)
        .unwrap_err();
    assert!(matches!(err, D3dError::InvalidCall(_)));
    assert!(mirror.device().draw_targets().is_empty());

    mirror
        .draw_primitive_up(PrimitiveType::TriangleList, 2, &[0; 96], 16)
        .unwrap();
}

#[test]
fn overflowing_primitive_counts_are_rejected() {
    let mut mirror = mirror();
    let err = mirror
        .draw_primitive_up(PrimitiveType::TriangleList, u32::MAX, &[0; 12], 4)
        .unwrap_err();
    assert!(matches!(err, D3dError::InvalidCall(_)));

    let err = mirror
        .draw_indexed_primitive_up(
            PrimitiveType::TriangleList,
            u32::MAX,
            2,
            1,
            &[0; 6],
            IndexFormat::U16,
            &[0; 12],
            4,
        )
        .unwrap_err();
    assert!(matches!(err, D3dError::InvalidCall(_)));

    let err = mirror
        .draw_indexed_primitive_up(
            PrimitiveType::LineList,
            0,
            2,
            u32::MAX,
            &[0; 4],
            IndexFormat::U32,
            &[0; 12],
            4,
        )
        .unwrap_err();
    assert!(matches!(err, D3dError::InvalidCall(_)));
    assert!(mirror.device().draw_targets().is_empty());
}

struct TranslateFirstMatrix;

impl StereoHeuristics for TranslateFirstMatrix {
    fn shader_rules(&self, stage: ShaderStage, _function: &[u32]) -> ShaderRules {
        match stage {
            ShaderStage::Vertex => ShaderRules::new().with_rule(0, MatrixSimpleTranslate::default()),
            ShaderStage::Pixel => ShaderRules::new(),
        }
    }
}

#[test]
fn ruled_constants_are_uploaded_per_eye() {
    let mut mirror = StereoDevice::new(
        RecordingDevice::new(),
        TranslateFirstMatrix,
        StereoConfig::default(),
    )
    .expect("mirror setup");
    let shader = mirror.create_vertex_shader(&[0xfffe_0300]).unwrap();
    mirror.set_vertex_shader(Some(&shader)).unwrap();
    mirror
        .set_vertex_shader_constant_f(0, &Mat4::IDENTITY.to_cols_array())
        .unwrap();
    mirror.device_mut().clear_calls();

    mirror
        .draw_primitive(PrimitiveType::TriangleList, 0, 1)
        .unwrap();

    let left = mirror.view().adjustment_matrix(Eye::Left).to_cols_array().to_vec();
    let right = mirror.view().adjustment_matrix(Eye::Right).to_cols_array().to_vec();
    assert_eq!(
        mirror.device().calls(),
        &[
            Call::SetVertexShaderConstantF { start: 0, data: left },
            Call::Draw {
                kind: DrawKind::Primitive,
                target: Some(LEFT_BACK_BUFFER),
            },
            Call::SetRenderTarget {
                index: 0,
                surface: Some(RIGHT_BACK_BUFFER),
            },
            Call::SetVertexShaderConstantF { start: 0, data: right },
            Call::Draw {
                kind: DrawKind::Primitive,
                target: Some(RIGHT_BACK_BUFFER),
            },
        ]
    );
}

#[test]
fn copies_follow_the_eye_pair() {
    let mut mirror = mirror();
    let mono = mirror.create_texture(&texture(64, 32, Usage::empty())).unwrap();
    let stereo_a = mirror
        .create_texture(&texture(64, 32, Usage::RENDER_TARGET))
        .unwrap();
    let stereo_b = mirror
        .create_texture(&texture(64, 32, Usage::RENDER_TARGET))
        .unwrap();
    let id = |t: &TextureId| t.0;
    let copies = |mirror: &mut StereoDevice<RecordingDevice>| -> Vec<(u32, u32)> {
        mirror
            .device_mut()
            .take_calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Copy {
                    kind: CopyKind::UpdateTexture,
                    source,
                    destination,
                } => Some((source, destination)),
                _ => None,
            })
            .collect()
    };
    mirror.device_mut().clear_calls();

    mirror.update_texture(Some(&mono), Some(&stereo_a)).unwrap();
    assert_eq!(
        copies(&mut mirror),
        vec![
            (id(mono.left()), id(stereo_a.left())),
            (id(mono.left()), id(stereo_a.right().unwrap())),
        ]
    );

    mirror.update_texture(Some(&stereo_a), Some(&mono)).unwrap();
    assert_eq!(copies(&mut mirror), vec![(id(stereo_a.left()), id(mono.left()))]);

    mirror.update_texture(Some(&stereo_a), Some(&stereo_b)).unwrap();
    assert_eq!(
        copies(&mut mirror),
        vec![
            (id(stereo_a.left()), id(stereo_b.left())),
            (id(stereo_a.right().unwrap()), id(stereo_b.right().unwrap())),
        ]
    );

    mirror
        .device_mut()
        .fail_copies_to(id(stereo_b.right().unwrap()));
    mirror.update_texture(Some(&stereo_a), Some(&stereo_b)).unwrap();
    assert_eq!(mirror.stats().snapshot().second_eye_failures, 1);

    assert!(matches!(
        mirror.update_texture(None, Some(&stereo_b)),
        Err(D3dError::InvalidCall(_))
    ));
}

#[test]
fn right_eye_creation_failure_degrades_to_mono() {
    let mut mirror = mirror();
    mirror.device_mut().fail_creation_after(1);
    let target = mirror.create_render_target(&surface(640, 480), false).unwrap();
    assert!(!target.is_stereo());
    assert_eq!(mirror.stats().snapshot().mono_fallbacks, 1);

    mirror.device_mut().fail_creation_after(0);
    assert!(mirror.create_render_target(&surface(640, 480), false).is_err());
}

#[test]
fn volume_textures_stay_mono() {
    let mut mirror = mirror();
    let desc = TextureDesc {
        kind: TextureKind::Volume { depth: 4 },
        ..texture(64, 32, Usage::RENDER_TARGET)
    };
    assert!(!mirror.create_texture(&desc).unwrap().is_stereo());
    assert!(mirror.create_cube_texture(&desc).is_err());
}

#[test]
fn render_target_slot_rules() {
    let mut mirror = mirror();
    assert!(matches!(
        mirror.set_render_target(0, None),
        Err(D3dError::InvalidCall(_))
    ));
    assert!(matches!(
        mirror.set_render_target(4, None),
        Err(D3dError::InvalidSlot { limit: 4, .. })
    ));
    mirror.set_render_target(1, None).unwrap();
    assert!(matches!(
        mirror.get_render_target(1),
        Err(D3dError::NotFound(_))
    ));
}

#[test]
fn rebinding_the_same_texture_is_silent() {
    let mut mirror = mirror();
    let tex = mirror.create_texture(&texture(64, 32, Usage::empty())).unwrap();
    mirror.device_mut().clear_calls();

    mirror.set_texture(3, Some(&tex)).unwrap();
    mirror.set_texture(3, Some(&tex)).unwrap();
    assert_eq!(mirror.device().calls().len(), 1);
    assert_eq!(tex.ref_count(), 2);

    mirror.set_texture(3, None).unwrap();
    assert_eq!(tex.ref_count(), 1);
    assert_eq!(mirror.get_texture(3).unwrap(), None);
    assert!(mirror.get_texture(4).is_err());
}

#[test]
fn recording_reaches_the_device_but_not_the_bindings() {
    let mut mirror = mirror();
    let tex = mirror.create_texture(&texture(64, 32, Usage::empty())).unwrap();
    mirror.device_mut().clear_calls();

    mirror.begin_state_block().unwrap();
    assert!(mirror.begin_state_block().is_err());
    mirror.set_texture(0, Some(&tex)).unwrap();
    mirror.set_vertex_shader_constant_f(8, &[1.0; 4]).unwrap();
    let block = mirror.end_state_block().unwrap();

    assert!(mirror
        .device()
        .calls()
        .contains(&Call::SetTexture {
            stage: 0,
            texture: Some(*tex.left()),
        }));
    assert_eq!(mirror.bindings().texture(0), None);
    assert_eq!(mirror.get_vertex_shader_constant_f(8, 1).unwrap(), vec![0.0; 4]);
    assert_eq!(block.entries().len(), 2);

    mirror.apply_state_block(&block).unwrap();
    assert_eq!(mirror.bindings().texture(0), Some(Some(&tex)));
    assert_eq!(mirror.get_vertex_shader_constant_f(8, 1).unwrap(), vec![1.0; 4]);
}

#[test]
fn failed_reset_leaves_empty_bindings() {
    let params = PresentParameters {
        back_buffer_width: 1280,
        back_buffer_height: 720,
        back_buffer_format: Format::X8R8G8B8,
        back_buffer_count: 1,
        windowed: true,
        auto_depth_stencil_format: None,
    };
    let mut mirror = mirror();
    let back_buffer = mirror.get_back_buffer().unwrap();
    assert_eq!(back_buffer.ref_count(), 3);

    mirror.device_mut().fail_resets(true);
    assert!(mirror.reset(&params).is_err());
    assert!(mirror.get_render_target(0).is_err());
    assert!(mirror.get_back_buffer().is_err());
    assert_eq!(back_buffer.ref_count(), 1);

    mirror.device_mut().fail_resets(false);
    mirror.reset(&params).unwrap();
    assert!(mirror.get_render_target(0).unwrap().is_stereo());
    assert_eq!(mirror.active_eye(), Eye::Left);
}

#[derive(Default)]
struct CountingTracker {
    polls: Rc<Cell<u32>>,
}

impl HeadTracker for CountingTracker {
    fn is_available(&self) -> bool {
        true
    }

    fn update_orientation(&mut self) {
        self.polls.set(self.polls.get() + 1);
    }

    fn pose(&self) -> HeadPose {
        HeadPose {
            pitch: 0.25,
            yaw: 0.5,
            roll: 0.0,
        }
    }
}

#[test]
fn head_tracking_runs_once_per_frame() {
    let tracker = CountingTracker::default();
    let polls = Rc::clone(&tracker.polls);
    let mut mirror = StereoDevice::with_collaborators(
        RecordingDevice::new(),
        DefaultHeuristics,
        StereoConfig::default(),
        Box::new(NullPresenter),
        Box::new(tracker),
    )
    .expect("mirror setup");

    mirror.begin_scene().unwrap();
    mirror.end_scene().unwrap();
    mirror.begin_scene().unwrap();
    assert_eq!(polls.get(), 1);
    assert_eq!(
        mirror.view().bullet_labyrinth_matrix(),
        Mat4::from_translation(Vec3::new(-0.5, 0.25, 0.0))
    );

    mirror.present().unwrap();
    mirror.begin_scene().unwrap();
    assert_eq!(polls.get(), 2);

    mirror.set_tracking_enabled(false);
    mirror.present().unwrap();
    mirror.begin_scene().unwrap();
    assert_eq!(polls.get(), 2);
}
