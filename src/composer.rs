//! Builds the showcase scene and hands it to an engine.
//!
//! [`build_scene`] is pure: it only creates scene data from a [`SceneConfig`].
//! [`compose`] looks up the display surface first, so a missing surface fails
//! before an engine or a scene exists, then binds an engine to the surface,
//! builds the scene and registers a render loop that draws it every frame.

use std::rc::Rc;

use cgmath::Vector3;

use crate::{
    camera::FreeCamera,
    config::{EngineOptions, SceneConfig},
    data_structures::{
        light::HemisphericLight,
        material::{GridMaterial, SkyMaterial, TextureRef, WaterMaterial},
        mesh::Mesh,
        scene::{CameraId, LightId, MaterialId, MeshId, Scene},
    },
    engine::{Engine, RenderLoop, Renderer},
    error::SceneError,
    host::{DisplaySurface, Host},
};

/// The composed scene and the handles of everything in it.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneContext {
    pub scene: Scene,
    pub camera: CameraId,
    pub light: LightId,
    pub skybox: MeshId,
    pub sphere: MeshId,
    pub ground: MeshId,
    pub water: MeshId,
    pub sky_material: MaterialId,
    pub grid_material: MaterialId,
    pub water_material: MaterialId,
}

/// Everything [`compose`] produced. Dropping it does not stop the render loop;
/// use [`RenderLoop::stop`].
pub struct Composition<E: Engine> {
    pub engine: E,
    pub context: Rc<SceneContext>,
    pub render_loop: RenderLoop,
}

/// Creates the camera, light, sky box, grid sphere and ground and the water
/// surface reflecting them.
pub fn build_scene(config: &SceneConfig) -> Result<SceneContext, SceneError> {
    let mut scene = Scene::new();

    let mut camera = FreeCamera::new(config.camera.name.clone(), config.camera.position);
    camera.set_target(config.camera.target);
    let camera = scene.add_camera(camera);

    let mut light = HemisphericLight::new(config.light.name.clone(), config.light.direction);
    light.set_intensity(config.light.intensity);
    let light = scene.add_light(light);

    let sky = &config.sky;
    let mut sky_material = SkyMaterial::new(sky.material_name.clone());
    sky_material.back_face_culling = sky.back_face_culling;
    sky_material.inclination = sky.inclination;
    sky_material.azimuth = sky.azimuth;
    sky_material.luminance = sky.luminance;
    sky_material.turbidity = sky.turbidity;
    let sky_material = scene.add_material(sky_material);
    let skybox = scene.add_mesh(Mesh::create_box(sky.mesh_name.clone(), sky.box_size));

    let grid = &config.grid;
    let grid_material = scene.add_material(GridMaterial::new(grid.material_name.clone()));
    let sphere = scene.add_mesh(
        Mesh::create_sphere(grid.sphere_name.clone(), grid.sphere_segments, grid.sphere_diameter)
            .with_position(Vector3::new(0.0, grid.sphere_offset, 0.0)),
    );
    let ground = scene.add_mesh(
        Mesh::create_ground(
            grid.ground_name.clone(),
            grid.ground_width,
            grid.ground_depth,
            grid.ground_subdivisions,
        )
        .with_position(Vector3::new(0.0, grid.ground_offset, 0.0)),
    );

    let water = &config.water;
    let water_mesh = scene.add_mesh(Mesh::create_ground(
        water.mesh_name.clone(),
        water.width,
        water.depth,
        water.subdivisions,
    ));
    let mut water_material = WaterMaterial::new(water.material_name.clone());
    water_material.bump_texture = Some(TextureRef::new(water.bump_texture.clone()));
    water_material.wind_force = water.wind_force;
    water_material.wind_direction = water.wind_direction;
    water_material.wave_height = water.wave_height;
    water_material.bump_height = water.bump_height;
    water_material.water_color = water.water_color;
    water_material.color_blend_factor = water.color_blend_factor;
    water_material.wave_length = water.wave_length;
    for reflected in [sphere, skybox, ground] {
        water_material.add_to_render_list(reflected);
    }
    let water_material = scene.add_material(water_material);

    scene.set_material(skybox, sky_material)?;
    scene.set_material(sphere, grid_material)?;
    scene.set_material(ground, grid_material)?;
    scene.set_material(water_mesh, water_material)?;

    Ok(SceneContext {
        scene,
        camera,
        light,
        skybox,
        sphere,
        ground,
        water: water_mesh,
        sky_material,
        grid_material,
        water_material,
    })
}

/// Looks up the display surface, binds an engine of type `E` to it, builds the
/// scene and registers a render loop that renders it once per frame.
pub fn compose<E: Engine>(
    host: &dyn Host,
    config: &SceneConfig,
    options: &EngineOptions,
) -> Result<Composition<E>, SceneError> {
    let surface: DisplaySurface = host.find_surface(&options.canvas_id).ok_or_else(|| {
        SceneError::MissingSurface {
            id: options.canvas_id.clone(),
        }
    })?;

    let mut engine = E::create(surface, options)?;

    let mut context = build_scene(config)?;
    if let Some(camera) = context.scene.camera_mut(context.camera) {
        camera.attach_control(engine.surface(), config.camera.no_prevent_default);
    }
    log::info!(
        "composed scene with {} meshes and {} materials on `{}`",
        context.scene.mesh_count(),
        context.scene.material_count(),
        engine.surface().id()
    );

    let context = Rc::new(context);
    let render_loop = {
        let context = context.clone();
        engine.run_render_loop(Box::new(move |renderer: &mut dyn Renderer| {
            renderer.render_scene(&context.scene)
        }))
    };

    Ok(Composition {
        engine,
        context,
        render_loop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::material::MaterialKind;
    use cgmath::InnerSpace;

    #[test]
    fn every_mesh_has_the_expected_material() {
        let ctx = build_scene(&SceneConfig::default()).unwrap();
        let kind = |mesh| ctx.scene.material_of(mesh).map(|m| m.kind());
        assert_eq!(kind(ctx.skybox), Some(MaterialKind::Sky));
        assert_eq!(kind(ctx.sphere), Some(MaterialKind::Grid));
        assert_eq!(kind(ctx.ground), Some(MaterialKind::Grid));
        assert_eq!(kind(ctx.water), Some(MaterialKind::Water));
    }

    #[test]
    fn every_mesh_is_assigned_before_the_scene_is_returned() {
        let ctx = build_scene(&SceneConfig::default()).unwrap();
        for mesh in [ctx.skybox, ctx.sphere, ctx.ground, ctx.water] {
            assert!(ctx.scene.mesh(mesh).unwrap().material.is_some());
        }
    }

    #[test]
    fn sky_renders_inside_out() {
        let ctx = build_scene(&SceneConfig::default()).unwrap();
        let sky = ctx.scene.material(ctx.sky_material).unwrap();
        assert!(!sky.back_face_culling());
    }

    #[test]
    fn camera_looks_at_origin() {
        let ctx = build_scene(&SceneConfig::default()).unwrap();
        let camera = ctx.scene.camera(ctx.camera).unwrap();
        let to_origin = (cgmath::Point3::new(0.0, 0.0, 0.0) - camera.position).normalize();
        let cos = camera.forward().dot(to_origin);
        assert!(cos > 0.999);
        assert!(camera.control().is_none());
    }
}
