//! End-to-end scenarios for the stereo mirror over a recording device.

use glam::{Mat4, Vec3};
use parallax::d3d9::state::{
    ClearFlags, Color, Format, IndexFormat, PresentParameters, PrimitiveType, SurfaceDesc,
    TextureFilter, TransformState, Usage,
};
use parallax::d3d9::test_utils::{Call, CopyKind, RecordingDevice, SurfaceId};
use parallax::d3d9::StereoSurface;
use parallax::{DefaultHeuristics, Eye, StereoConfig, StereoDevice};
use pretty_assertions::assert_eq;

type Mirror = StereoDevice<RecordingDevice>;

fn mirror_with(device: RecordingDevice, config: StereoConfig) -> anyhow::Result<Mirror> {
    parallax::logging::init("parallax_d3d9=debug");
    let mut mirror = StereoDevice::new(device, DefaultHeuristics, config)?;
    mirror.device_mut().clear_calls();
    Ok(mirror)
}

fn mirror() -> anyhow::Result<Mirror> {
    mirror_with(RecordingDevice::new(), StereoConfig::default())
}

fn render_target(
    mirror: &mut Mirror,
    width: u32,
    height: u32,
) -> anyhow::Result<StereoSurface<RecordingDevice>> {
    let desc = SurfaceDesc {
        width,
        height,
        format: Format::A8R8G8B8,
        usage: Usage::RENDER_TARGET,
        ..SurfaceDesc::default()
    };
    Ok(mirror.create_render_target(&desc, false)?)
}

fn params() -> PresentParameters {
    PresentParameters {
        back_buffer_width: 1280,
        back_buffer_height: 720,
        back_buffer_format: Format::X8R8G8B8,
        back_buffer_count: 1,
        windowed: true,
        auto_depth_stencil_format: Some(Format::D24S8),
    }
}

#[test]
fn separation_scenario() -> anyhow::Result<()> {
    let config: StereoConfig =
        serde_json::from_str(r#"{"ipd":0.064,"world_scale":1.0,"convergence":2.0}"#)?;
    config.validate()?;
    let mirror = mirror_with(RecordingDevice::new(), config)?;

    assert_eq!(mirror.view().separation_in_world_units(), 0.032);
    assert_eq!(mirror.view().separation_ipd_adjustment(), 0.0);
    Ok(())
}

#[test]
fn mono_primary_target_keeps_the_left_eye() -> anyhow::Result<()> {
    let mut mirror = mirror()?;
    let mono = render_target(&mut mirror, 1024, 1024)?;
    mirror.set_render_target(0, Some(&mono))?;

    assert!(!mirror.try_set_active_eye(Eye::Right));
    assert_eq!(mirror.active_eye(), Eye::Left);

    mirror.draw_indexed_primitive(PrimitiveType::TriangleList, 0, 0, 3, 0, 1)?;
    assert_eq!(mirror.device().draw_targets(), vec![Some(*mono.left())]);
    Ok(())
}

#[test]
fn every_draw_kind_is_issued_left_then_right() -> anyhow::Result<()> {
    let mut mirror = mirror()?;
    let back_buffer = mirror.get_back_buffer()?;
    let left = Some(*back_buffer.left());
    let right = back_buffer.right().copied();
    let vertices = [0u8; 3 * 12];
    let indices = [0u8, 0, 1, 0, 2, 0];

    mirror.draw_primitive(PrimitiveType::TriangleList, 0, 1)?;
    mirror.draw_indexed_primitive(PrimitiveType::TriangleList, 0, 0, 3, 0, 1)?;
    mirror.draw_primitive_up(PrimitiveType::TriangleList, 1, &vertices, 12)?;
    mirror.draw_indexed_primitive_up(
        PrimitiveType::TriangleList,
        0,
        3,
        1,
        &indices,
        IndexFormat::U16,
        &vertices,
        12,
    )?;
    mirror.draw_rect_patch(1, Some(&[4.0; 4]), None)?;
    mirror.draw_tri_patch(2, Some(&[4.0; 3]), None)?;
    mirror.clear(&[], ClearFlags::TARGET, Color(0), 1.0, 0)?;

    assert_eq!(mirror.device().draw_targets(), [left, right].repeat(7));
    let stats = mirror.stats().snapshot();
    assert_eq!(stats.draws, 7);
    assert_eq!(stats.second_eye_draws, 7);
    Ok(())
}

#[test]
fn forced_right_eye_failure_reports_the_left_result() -> anyhow::Result<()> {
    let mut mirror = mirror()?;
    let back_buffer = mirror.get_back_buffer()?;
    let right = *back_buffer.right().expect("stereo back buffer");
    mirror.device_mut().fail_draws_on(right);

    mirror.draw_primitive(PrimitiveType::TriangleList, 0, 1)?;
    mirror.clear(&[], ClearFlags::TARGET, Color(0), 1.0, 0)?;

    let stats = mirror.stats().snapshot();
    assert_eq!(stats.second_eye_failures, 2);
    assert_eq!(stats.second_eye_draws, 0);
    Ok(())
}

#[test]
fn stretch_rect_copies_per_eye_pair() -> anyhow::Result<()> {
    let mut mirror = mirror()?;
    let back_buffer = mirror.get_back_buffer()?;
    let scene = render_target(&mut mirror, 800, 600)?;
    let mono = render_target(&mut mirror, 256, 256)?;
    mirror.device_mut().clear_calls();

    mirror.stretch_rect(Some(&mono), None, Some(&scene), None, TextureFilter::Linear)?;
    mirror.stretch_rect(Some(&scene), None, Some(&back_buffer), None, TextureFilter::Linear)?;
    mirror.stretch_rect(Some(&back_buffer), None, Some(&mono), None, TextureFilter::None)?;

    let copies: Vec<(u32, u32)> = mirror
        .device()
        .calls()
        .iter()
        .filter_map(|call| match call {
            Call::Copy {
                kind: CopyKind::StretchRect,
                source,
                destination,
            } => Some((*source, *destination)),
            _ => None,
        })
        .collect();
    let id = |surface: &SurfaceId| surface.0;
    let right = |surface: &StereoSurface<RecordingDevice>| id(surface.right().expect("stereo"));
    assert_eq!(
        copies,
        vec![
            (id(mono.left()), id(scene.left())),
            (id(mono.left()), right(&scene)),
            (id(scene.left()), id(back_buffer.left())),
            (right(&scene), right(&back_buffer)),
            (id(back_buffer.left()), id(mono.left())),
        ]
    );
    Ok(())
}

#[test]
fn binding_slots_own_one_reference() -> anyhow::Result<()> {
    let mut mirror = mirror()?;
    let first = render_target(&mut mirror, 640, 480)?;
    let second = render_target(&mut mirror, 640, 480)?;

    mirror.set_render_target(1, Some(&first))?;
    assert_eq!(first.ref_count(), 2);
    mirror.set_render_target(1, Some(&second))?;
    assert_eq!(first.ref_count(), 1);
    assert_eq!(second.ref_count(), 2);
    mirror.set_render_target(1, None)?;
    assert_eq!(second.ref_count(), 1);
    Ok(())
}

#[test]
fn reset_rebuilds_swap_chain_and_depth_stencil() -> anyhow::Result<()> {
    let mut mirror = mirror_with(
        RecordingDevice::new().with_auto_depth_stencil(),
        StereoConfig::default(),
    )?;
    let old_back_buffer = mirror.get_back_buffer()?;
    mirror.draw_primitive(PrimitiveType::PointList, 0, 1)?;
    assert_eq!(mirror.active_eye(), Eye::Right);

    mirror.reset(&params())?;

    assert_eq!(mirror.active_eye(), Eye::Left);
    let back_buffer = mirror.get_back_buffer()?;
    assert!(back_buffer.is_stereo());
    assert_ne!(back_buffer, old_back_buffer);
    assert_eq!(old_back_buffer.ref_count(), 1);
    assert!(mirror.get_depth_stencil_surface()?.is_stereo());
    assert_eq!(mirror.view().aspect_ratio(), 1280.0 / 720.0);
    assert_eq!(mirror.device().render_target(0), Some(*back_buffer.left()));
    Ok(())
}

#[test]
fn calibration_changes_wait_for_recompute() -> anyhow::Result<()> {
    let mut mirror = mirror()?;
    let before = mirror.view().view_transform(Eye::Left);

    mirror.view_mut().change_world_scale(2.0);
    assert_eq!(mirror.view().view_transform(Eye::Left), before);

    mirror.view_mut().compute_view_transforms();
    let after = mirror.view().view_transform(Eye::Left);
    assert_ne!(after, before);

    // Transforms set from now on use the new separation.
    let world_view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    mirror.set_transform(TransformState::View, Some(&world_view))?;
    assert_eq!(mirror.bindings().view_transform().left, after * world_view);
    Ok(())
}

#[test]
fn inverted_convergence_bounds_clamp_instead_of_failing() -> anyhow::Result<()> {
    let config = StereoConfig {
        min_convergence: 5.0,
        max_convergence: 1.0,
        ..StereoConfig::default()
    };
    assert!(config.validate().is_err());
    let mut mirror = mirror_with(RecordingDevice::new(), config)?;

    assert_eq!(mirror.view_mut().change_convergence(0.0), 1.0);
    assert_eq!(mirror.view().convergence(), 1.0);
    Ok(())
}
