use std::collections::HashSet;

use cgmath::{Point3, Vector2, Vector3};
use seascape::{
    composer::{build_scene, compose},
    config::{CANVAS_ID, EngineOptions, SceneConfig},
    data_structures::{color::Color3, material::Material, mesh::Mesh},
    error::SceneError,
    headless::HeadlessHost,
};

use crate::common::test_utils::{CountingEngine, composed, engines_created};

mod common;

#[test]
fn composes_one_camera_one_light_four_meshes_three_materials() {
    let composition = composed();
    let scene = &composition.context.scene;
    assert_eq!(scene.cameras().len(), 1);
    assert_eq!(scene.lights().len(), 1);
    assert_eq!(scene.mesh_count(), 4);
    assert_eq!(scene.material_count(), 3);
    assert!(composition.render_loop.is_running());
}

#[test]
fn literal_parameters_reach_the_scene() {
    let ctx = build_scene(&SceneConfig::default()).unwrap();
    let scene = &ctx.scene;

    let camera = scene.camera(ctx.camera).unwrap();
    assert_eq!(camera.name, "camera1");
    assert_eq!(camera.position, Point3::new(0.0, 5.0, -10.0));

    let light = scene.light(ctx.light).unwrap();
    assert_eq!(light.direction, Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(light.intensity(), 0.7);

    let sky = scene.material(ctx.sky_material).unwrap().as_sky().unwrap();
    assert_eq!(sky.name, "skyMaterial");
    assert!(!sky.back_face_culling);
    assert_eq!(sky.inclination, 0.55);
    assert_eq!(sky.azimuth, 0.75);
    assert_eq!(sky.luminance, 0.45);
    assert_eq!(sky.turbidity, 1.0);
    assert_eq!(scene.mesh(ctx.skybox).unwrap().name, "skyBox");

    let water = scene
        .material(ctx.water_material)
        .unwrap()
        .as_water()
        .unwrap();
    assert_eq!(water.name, "water_material");
    assert_eq!(
        water.bump_texture.as_ref().map(|t| t.path.as_str()),
        Some("images/waterbump.png")
    );
    assert_eq!(water.wind_force, 5.0);
    assert_eq!(water.wind_direction, Vector2::new(0.3, 0.3));
    assert_eq!(water.wave_height, 1.0);
    assert_eq!(water.bump_height, 1.3);
    assert_eq!(water.water_color, Color3::new(0.1, 0.1, 0.6));
    assert_eq!(water.color_blend_factor, 0.3);
    assert_eq!(water.wave_length, 0.35);
}

#[test]
fn water_render_list_is_sphere_skybox_and_ground() {
    let ctx = build_scene(&SceneConfig::default()).unwrap();
    let water = ctx
        .scene
        .material(ctx.water_material)
        .unwrap()
        .as_water()
        .unwrap();
    let list: HashSet<_> = water.render_list().iter().copied().collect();
    let expected: HashSet<_> = [ctx.skybox, ctx.sphere, ctx.ground].into_iter().collect();
    assert_eq!(list, expected);
    assert_eq!(water.render_list().len(), 3);
    assert!(!list.contains(&ctx.water));
}

#[test]
fn meshes_added_later_are_not_reflected() {
    let mut ctx = build_scene(&SceneConfig::default()).unwrap();
    let extra = ctx.scene.add_mesh(Mesh::create_box("extra", 1.0));
    let water = ctx
        .scene
        .material(ctx.water_material)
        .unwrap()
        .as_water()
        .unwrap();
    assert!(!water.render_list().contains(&extra));
}

#[test]
fn grid_material_is_shared_between_sphere_and_ground() {
    let mut ctx = build_scene(&SceneConfig::default()).unwrap();
    let sphere_material = ctx.scene.mesh(ctx.sphere).unwrap().material;
    let ground_material = ctx.scene.mesh(ctx.ground).unwrap().material;
    assert_eq!(sphere_material, Some(ctx.grid_material));
    assert_eq!(sphere_material, ground_material);

    if let Some(Material::Grid(grid)) = ctx.scene.material_mut(ctx.grid_material) {
        grid.line_color = Color3::WHITE;
    }
    for mesh in [ctx.sphere, ctx.ground] {
        let grid = ctx.scene.material_of(mesh).unwrap().as_grid().unwrap();
        assert_eq!(grid.line_color, Color3::WHITE);
    }
}

#[test]
fn sphere_sits_above_and_ground_below_the_origin() {
    let ctx = build_scene(&SceneConfig::default()).unwrap();
    assert_eq!(ctx.scene.mesh(ctx.sphere).unwrap().position.y, 3.0);
    assert_eq!(ctx.scene.mesh(ctx.ground).unwrap().position.y, -1.0);
    assert_eq!(ctx.scene.mesh(ctx.water).unwrap().position.y, 0.0);
}

#[test]
fn camera_control_is_attached_to_the_canvas() {
    let composition = composed();
    let camera = composition.context.scene.active_camera().unwrap();
    let control = camera.control().expect("camera accepts input");
    assert_eq!(control.surface_id, CANVAS_ID);
    assert!(control.no_prevent_default);
}

#[test]
fn missing_surface_fails_before_anything_is_created() {
    let host = HeadlessHost::new(["someOtherCanvas"]);
    let result =
        compose::<CountingEngine>(&host, &SceneConfig::default(), &EngineOptions::default());
    match result {
        Err(SceneError::MissingSurface { id }) => assert_eq!(id, CANVAS_ID),
        Err(e) => panic!("unexpected error {e}"),
        Ok(_) => panic!("composed without a surface"),
    }
    assert_eq!(engines_created(), 0);
}

#[test]
fn existing_surface_creates_exactly_one_engine() {
    let host = HeadlessHost::new([CANVAS_ID]);
    let before = engines_created();
    compose::<CountingEngine>(&host, &SceneConfig::default(), &EngineOptions::default()).unwrap();
    assert_eq!(engines_created(), before + 1);
}
