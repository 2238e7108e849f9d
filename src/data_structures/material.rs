//! Material parameter bundles.
//!
//! A material only describes *what* a surface should look like; the matching
//! shaders live in [`crate::pipelines`]. Materials are stored in the scene's
//! material arena and meshes reference them by [`MaterialId`](super::scene::MaterialId),
//! so one material can be shared by many meshes and a change to it shows up on
//! all of them.

use cgmath::{Vector2, Vector3};

use crate::data_structures::{color::Color3, scene::MeshId};

/// Path of an image asset, resolved by the engine relative to its asset root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub path: String,
}

impl TextureRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Discriminant used by the engine to pick a pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Sky,
    Grid,
    Water,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    Sky(SkyMaterial),
    Grid(GridMaterial),
    Water(WaterMaterial),
}

impl Material {
    pub fn name(&self) -> &str {
        match self {
            Material::Sky(sky) => &sky.name,
            Material::Grid(grid) => &grid.name,
            Material::Water(water) => &water.name,
        }
    }

    pub fn kind(&self) -> MaterialKind {
        match self {
            Material::Sky(_) => MaterialKind::Sky,
            Material::Grid(_) => MaterialKind::Grid,
            Material::Water(_) => MaterialKind::Water,
        }
    }

    pub fn back_face_culling(&self) -> bool {
        match self {
            Material::Sky(sky) => sky.back_face_culling,
            Material::Grid(grid) => grid.back_face_culling,
            Material::Water(water) => water.back_face_culling,
        }
    }

    pub fn as_water(&self) -> Option<&WaterMaterial> {
        match self {
            Material::Water(water) => Some(water),
            _ => None,
        }
    }

    pub fn as_water_mut(&mut self) -> Option<&mut WaterMaterial> {
        match self {
            Material::Water(water) => Some(water),
            _ => None,
        }
    }

    pub fn as_grid(&self) -> Option<&GridMaterial> {
        match self {
            Material::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_grid_mut(&mut self) -> Option<&mut GridMaterial> {
        match self {
            Material::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_sky(&self) -> Option<&SkyMaterial> {
        match self {
            Material::Sky(sky) => Some(sky),
            _ => None,
        }
    }
}

impl From<SkyMaterial> for Material {
    fn from(sky: SkyMaterial) -> Self {
        Material::Sky(sky)
    }
}

impl From<GridMaterial> for Material {
    fn from(grid: GridMaterial) -> Self {
        Material::Grid(grid)
    }
}

impl From<WaterMaterial> for Material {
    fn from(water: WaterMaterial) -> Self {
        Material::Water(water)
    }
}

/// Preetham style atmospheric scattering.
///
/// The sun is placed on a sphere of radius `distance` from `inclination`
/// (0.5 is the horizon) and `azimuth` (both in turns). `luminance` drives the
/// tone mapping exposure and `turbidity` the amount of haze.
#[derive(Clone, Debug, PartialEq)]
pub struct SkyMaterial {
    pub name: String,
    pub back_face_culling: bool,
    pub inclination: f32,
    pub azimuth: f32,
    pub luminance: f32,
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub distance: f32,
}

impl SkyMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            back_face_culling: true,
            inclination: 0.49,
            azimuth: 0.25,
            luminance: 1.0,
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            distance: 500.0,
        }
    }

    pub fn sun_position(&self) -> Vector3<f32> {
        let theta = std::f32::consts::PI * (self.inclination - 0.5);
        let phi = 2.0 * std::f32::consts::PI * (self.azimuth - 0.5);
        Vector3::new(
            self.distance * phi.cos(),
            self.distance * phi.sin() * theta.sin(),
            self.distance * phi.sin() * theta.cos(),
        )
    }
}

/// Procedural, unlit grid lines drawn on top of `main_color`.
#[derive(Clone, Debug, PartialEq)]
pub struct GridMaterial {
    pub name: String,
    pub back_face_culling: bool,
    pub main_color: Color3,
    pub line_color: Color3,
    /// World units between two minor lines.
    pub grid_ratio: f32,
    pub grid_offset: Vector3<f32>,
    /// Every n-th line is a major line.
    pub major_unit_frequency: f32,
    pub minor_unit_visibility: f32,
    pub opacity: f32,
}

impl GridMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            back_face_culling: true,
            main_color: Color3::BLACK,
            line_color: Color3::TEAL,
            grid_ratio: 1.0,
            grid_offset: Vector3::new(0.0, 0.0, 0.0),
            major_unit_frequency: 10.0,
            minor_unit_visibility: 0.33,
            opacity: 1.0,
        }
    }
}

/// Animated water that reflects and refracts the meshes of its render list.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterMaterial {
    pub name: String,
    pub back_face_culling: bool,
    pub bump_texture: Option<TextureRef>,
    pub wind_force: f32,
    pub wind_direction: Vector2<f32>,
    pub wave_height: f32,
    /// Strength of the bump map perturbation on reflection and refraction.
    pub bump_height: f32,
    /// Smaller values produce more waves.
    pub wave_length: f32,
    pub water_color: Color3,
    pub color_blend_factor: f32,
    pub water_color2: Color3,
    pub color_blend_factor2: f32,
    pub render_target_size: (u32, u32),
    render_list: Vec<MeshId>,
}

impl WaterMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            back_face_culling: true,
            bump_texture: None,
            wind_force: 6.0,
            wind_direction: Vector2::new(0.0, 1.0),
            wave_height: 0.4,
            bump_height: 0.4,
            wave_length: 0.1,
            water_color: Color3::new(0.1, 0.1, 0.6),
            color_blend_factor: 0.2,
            water_color2: Color3::new(0.1, 0.1, 0.6),
            color_blend_factor2: 0.2,
            render_target_size: (512, 512),
            render_list: Vec::new(),
        }
    }

    /// Adds `mesh` to the reflected/refracted set. Returns `false` if it was already there.
    ///
    /// Prefer [`Scene::add_to_render_list`](super::scene::Scene::add_to_render_list),
    /// which also validates the handle.
    pub fn add_to_render_list(&mut self, mesh: MeshId) -> bool {
        if self.render_list.contains(&mesh) {
            return false;
        }
        self.render_list.push(mesh);
        true
    }

    pub fn remove_from_render_list(&mut self, mesh: MeshId) -> bool {
        let len = self.render_list.len();
        self.render_list.retain(|m| *m != mesh);
        len != self.render_list.len()
    }

    pub fn render_list(&self) -> &[MeshId] {
        &self.render_list
    }
}
