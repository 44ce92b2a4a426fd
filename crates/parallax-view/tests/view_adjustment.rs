use glam::Mat4;
use parallax_view::{
    Eye, StereoConfig, ViewAdjustment, IPD_DEFAULT, MAX_WORLD_SCALE, MIN_WORLD_SCALE,
};
use pretty_assertions::assert_eq;

const ASPECT: f32 = 4.0 / 3.0;

fn config(ipd: f32, world_scale: f32, convergence: f32) -> StereoConfig {
    StereoConfig {
        ipd,
        world_scale,
        convergence,
        ..StereoConfig::default()
    }
}

fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-5, "{a} != {b}");
}

#[test]
fn separation_scenario_at_default_ipd() {
    let view = ViewAdjustment::new(config(IPD_DEFAULT, 1.0, 2.0), ASPECT);
    assert_close(view.separation_in_world_units(), 0.032);
    assert_eq!(view.separation_ipd_adjustment(), 0.0);
}

#[test]
fn separation_scales_linearly_with_ipd_and_world_scale() {
    let base = ViewAdjustment::new(config(0.06, 1.5, 2.0), ASPECT).separation_in_world_units();
    let double_ipd =
        ViewAdjustment::new(config(0.12, 1.5, 2.0), ASPECT).separation_in_world_units();
    let double_scale =
        ViewAdjustment::new(config(0.06, 3.0, 2.0), ASPECT).separation_in_world_units();
    assert_close(double_ipd, 2.0 * base);
    assert_close(double_scale, 2.0 * base);
}

#[test]
fn eye_projections_differ_only_by_opposite_horizontal_shift() {
    for convergence in [1.5, 2.0, 5.0, 9.5] {
        let view = ViewAdjustment::new(config(IPD_DEFAULT, 1.0, convergence), ASPECT);
        let left = view.eye_projection(Eye::Left).to_cols_array();
        let right = view.eye_projection(Eye::Right).to_cols_array();

        // Column 2 row 0 carries the off-center term.
        const SHIFT: usize = 8;
        assert!(left[SHIFT] != 0.0);
        assert_close(left[SHIFT], -right[SHIFT]);
        for i in (0..16).filter(|&i| i != SHIFT) {
            assert_close(left[i], right[i]);
        }
    }
}

#[test]
fn convergence_at_near_clip_is_bumped_and_finite() {
    let mut view = ViewAdjustment::new(config(IPD_DEFAULT, 1.0, 1.0), ASPECT);
    assert!(view.convergence() > 1.0);
    for eye in Eye::BOTH {
        assert!(view.eye_projection(eye).is_finite());
        assert!(view.adjustment_matrix(eye).is_finite());
    }

    view.change_convergence(-view.convergence());
    view.update_projection_matrices(ASPECT);
    assert!(view.convergence() > 1.0);
    assert!(view.eye_projection(Eye::Right).is_finite());
}

#[test]
fn world_scale_clamps_and_zero_delta_is_idempotent() {
    let mut view = ViewAdjustment::new(StereoConfig::default(), ASPECT);
    assert_eq!(view.change_world_scale(-1e9), MIN_WORLD_SCALE);
    assert_eq!(view.change_world_scale(0.0), MIN_WORLD_SCALE);
    assert_eq!(view.change_world_scale(1e12), MAX_WORLD_SCALE);
    assert_eq!(view.change_world_scale(1e12), MAX_WORLD_SCALE);

    view.reset_world_scale();
    let scale = view.world_scale();
    for _ in 0..5 {
        assert_eq!(view.change_world_scale(0.0), scale);
    }
}

#[test]
fn convergence_clamps_to_configured_bounds() {
    let mut view = ViewAdjustment::new(StereoConfig::default(), ASPECT);
    assert_eq!(view.change_convergence(100.0), 10.0);
    assert_eq!(view.change_convergence(0.0), 10.0);
    assert_eq!(view.change_convergence(-100.0), -10.0);
}

#[test]
fn adjustment_matrix_composes_unproject_shift_reproject() {
    let view = ViewAdjustment::new(config(IPD_DEFAULT, 2.0, 3.0), ASPECT);
    for eye in Eye::BOTH {
        let expected =
            view.eye_projection(eye) * view.view_transform(eye) * view.projection_inverse();
        assert!(view.adjustment_matrix(eye).abs_diff_eq(expected, 1e-6));
    }
}

fn x(matrix: Mat4) -> f32 {
    matrix.w_axis.x
}

#[test]
fn hud_depth_moves_left_eye_right_and_right_eye_left() {
    let mut view = ViewAdjustment::new(StereoConfig::default(), ASPECT);
    view.change_hud_3d_depth(0.2);
    assert_close(x(view.hud_3d_depth_matrix(Eye::Left)), 0.2);
    assert_close(x(view.hud_3d_depth_matrix(Eye::Right)), -0.2);
}

#[test]
fn shifted_hud_depth_adds_lens_correction_with_same_signs() {
    let mut view = ViewAdjustment::new(StereoConfig::default(), ASPECT);
    view.change_hud_distance(0.5);
    view.change_hud_3d_depth(0.2);
    let correction = (1.5 - 0.5) * view.config().hmd.lens_x_center_offset();
    assert_close(x(view.hud_3d_depth_shifted_matrix(Eye::Left)), 0.2 + correction);
    assert_close(
        x(view.hud_3d_depth_shifted_matrix(Eye::Right)),
        -(0.2 + correction),
    );
}

#[test]
fn gui_depth_includes_ipd_adjustment() {
    let mut view = ViewAdjustment::new(config(0.07, 2.0, 3.0), ASPECT);
    view.change_gui_3d_depth(0.1);
    let depth = 0.1 + view.separation_ipd_adjustment();
    assert_close(x(view.gui_3d_depth_matrix(Eye::Left)), depth);
    assert_close(x(view.gui_3d_depth_matrix(Eye::Right)), -depth);
}

#[test]
fn recompute_keeps_hud_sign_convention() {
    let mut view = ViewAdjustment::new(StereoConfig::default(), ASPECT);
    view.change_hud_3d_depth(0.3);
    let left = x(view.hud_3d_depth_matrix(Eye::Left));
    let right = x(view.hud_3d_depth_matrix(Eye::Right));

    view.compute_view_transforms();
    assert_eq!(x(view.hud_3d_depth_matrix(Eye::Left)), left);
    assert_eq!(x(view.hud_3d_depth_matrix(Eye::Right)), right);
}
