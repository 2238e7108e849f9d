//! Literal parameters of the showcase scene and the engine options.
//!
//! The defaults are the values the scene is designed around; tests and
//! embedders can tweak single fields with struct update syntax.

use cgmath::{Point3, Vector2, Vector3};

use crate::data_structures::color::Color3;

/// Id of the canvas element the browser build renders into.
pub const CANVAS_ID: &str = "renderCanvas";

#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub canvas_id: String,
    /// Window title on native targets.
    pub title: String,
    /// Initial native window size in logical pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            canvas_id: CANVAS_ID.to_string(),
            title: "seascape".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub sky: SkyConfig,
    pub grid: GridConfig,
    pub water: WaterConfig,
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub name: String,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub no_prevent_default: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: "camera1".to_string(),
            position: Point3::new(0.0, 5.0, -10.0),
            target: Point3::new(0.0, 0.0, 0.0),
            no_prevent_default: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LightConfig {
    pub name: String,
    pub direction: Vector3<f32>,
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            name: "light1".to_string(),
            direction: Vector3::new(0.0, 1.0, 0.0),
            intensity: 0.7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SkyConfig {
    pub material_name: String,
    pub mesh_name: String,
    pub box_size: f32,
    pub back_face_culling: bool,
    pub inclination: f32,
    pub azimuth: f32,
    pub luminance: f32,
    pub turbidity: f32,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            material_name: "skyMaterial".to_string(),
            mesh_name: "skyBox".to_string(),
            box_size: 100.0,
            back_face_culling: false,
            inclination: 0.55,
            azimuth: 0.75,
            luminance: 0.45,
            turbidity: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GridConfig {
    pub material_name: String,
    pub sphere_name: String,
    pub sphere_segments: u32,
    pub sphere_diameter: f32,
    /// Vertical offset of the sphere, above the origin.
    pub sphere_offset: f32,
    pub ground_name: String,
    pub ground_width: f32,
    pub ground_depth: f32,
    pub ground_subdivisions: u32,
    /// Vertical offset of the ground, below the origin.
    pub ground_offset: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            material_name: "grid".to_string(),
            sphere_name: "sphere1".to_string(),
            sphere_segments: 16,
            sphere_diameter: 2.0,
            sphere_offset: 3.0,
            ground_name: "ground1".to_string(),
            ground_width: 6.0,
            ground_depth: 6.0,
            ground_subdivisions: 2,
            ground_offset: -1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WaterConfig {
    pub material_name: String,
    pub mesh_name: String,
    pub width: f32,
    pub depth: f32,
    pub subdivisions: u32,
    pub bump_texture: String,
    pub wind_force: f32,
    pub wind_direction: Vector2<f32>,
    pub wave_height: f32,
    pub bump_height: f32,
    pub water_color: Color3,
    pub color_blend_factor: f32,
    pub wave_length: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            material_name: "water_material".to_string(),
            mesh_name: "ground".to_string(),
            width: 512.0,
            depth: 512.0,
            subdivisions: 32,
            bump_texture: "images/waterbump.png".to_string(),
            wind_force: 5.0,
            wind_direction: Vector2::new(0.3, 0.3),
            wave_height: 1.0,
            bump_height: 1.3,
            water_color: Color3::new(0.1, 0.1, 0.6),
            color_blend_factor: 0.3,
            wave_length: 0.35,
        }
    }
}
