//! The scene graph: cameras, lights, meshes and the material arena.
//!
//! Everything is owned by [`Scene`] and addressed through small copyable
//! handles. Handles are only meaningful for the scene that issued them; the
//! scene's [`SceneId`] tells scenes apart.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    camera::FreeCamera,
    data_structures::{light::HemisphericLight, material::Material, mesh::Mesh},
    error::SceneError,
};

/// Identity of a [`Scene`], unique per process. Clones keep the id of the
/// scene they were cloned from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        SceneId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub(crate) usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub(crate) usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    id: SceneId,
    pub clear_color: wgpu::Color,
    cameras: Vec<FreeCamera>,
    active_camera: Option<CameraId>,
    lights: Vec<HemisphericLight>,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: SceneId::next(),
            clear_color: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
            cameras: Vec::new(),
            active_camera: None,
            lights: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Adds a camera. The first camera added becomes the active one.
    pub fn add_camera(&mut self, camera: FreeCamera) -> CameraId {
        let id = CameraId(self.cameras.len());
        self.cameras.push(camera);
        if self.active_camera.is_none() {
            self.active_camera = Some(id);
        }
        id
    }

    pub fn camera(&self, id: CameraId) -> Option<&FreeCamera> {
        self.cameras.get(id.0)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut FreeCamera> {
        self.cameras.get_mut(id.0)
    }

    pub fn cameras(&self) -> &[FreeCamera] {
        &self.cameras
    }

    pub fn active_camera(&self) -> Option<&FreeCamera> {
        self.active_camera.and_then(|id| self.camera(id))
    }

    pub fn active_camera_id(&self) -> Option<CameraId> {
        self.active_camera
    }

    pub fn add_light(&mut self, light: HemisphericLight) -> LightId {
        let id = LightId(self.lights.len());
        self.lights.push(light);
        id
    }

    pub fn light(&self, id: LightId) -> Option<&HemisphericLight> {
        self.lights.get(id.0)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut HemisphericLight> {
        self.lights.get_mut(id.0)
    }

    pub fn lights(&self) -> &[HemisphericLight] {
        &self.lights
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.meshes.len());
        self.meshes.push(mesh);
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter().enumerate().map(|(i, m)| (MeshId(i), m))
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn add_material(&mut self, material: impl Into<Material>) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material.into());
        id
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i), m))
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// The material a mesh currently points at, if any.
    pub fn material_of(&self, mesh: MeshId) -> Option<&Material> {
        self.mesh(mesh)?.material.and_then(|id| self.material(id))
    }

    pub fn meshes_using(&self, material: MaterialId) -> Vec<MeshId> {
        self.meshes()
            .filter(|(_, mesh)| mesh.material == Some(material))
            .map(|(id, _)| id)
            .collect()
    }

    /// Points `mesh` at `material`. The material is shared, not copied.
    pub fn set_material(&mut self, mesh: MeshId, material: MaterialId) -> Result<(), SceneError> {
        let target = self
            .materials
            .get(material.0)
            .ok_or(SceneError::UnknownMaterial(material))?;
        if let Some(water) = target.as_water() {
            if water.render_list().contains(&mesh) {
                return Err(SceneError::SelfReflection { mesh, material });
            }
        }
        let mesh_ref = self
            .meshes
            .get_mut(mesh.0)
            .ok_or(SceneError::UnknownMesh(mesh))?;
        mesh_ref.material = Some(material);
        Ok(())
    }

    /// Adds `mesh` to the render list of the water material `material`.
    ///
    /// Returns `Ok(false)` when the mesh was already in the list.
    pub fn add_to_render_list(
        &mut self,
        material: MaterialId,
        mesh: MeshId,
    ) -> Result<bool, SceneError> {
        let mesh_ref = self.mesh(mesh).ok_or(SceneError::UnknownMesh(mesh))?;
        if mesh_ref.material == Some(material) {
            return Err(SceneError::SelfReflection { mesh, material });
        }
        let water = self
            .materials
            .get_mut(material.0)
            .ok_or(SceneError::UnknownMaterial(material))?
            .as_water_mut()
            .ok_or(SceneError::NoRenderList(material))?;
        Ok(water.add_to_render_list(mesh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::material::{GridMaterial, SkyMaterial, WaterMaterial};
    use cgmath::{Point3, Vector3};

    #[test]
    fn first_camera_is_active() {
        let mut scene = Scene::new();
        assert!(scene.active_camera().is_none());
        let first = scene.add_camera(FreeCamera::new("a", Point3::new(0.0, 1.0, 0.0)));
        scene.add_camera(FreeCamera::new("b", Point3::new(0.0, 2.0, 0.0)));
        assert_eq!(scene.active_camera_id(), Some(first));
        assert_eq!(scene.active_camera().map(|c| c.name.as_str()), Some("a"));
    }

    #[test]
    fn set_material_rejects_unknown_handles() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(Mesh::create_box("box", 1.0));
        assert!(matches!(
            scene.set_material(mesh, MaterialId(3)),
            Err(SceneError::UnknownMaterial(MaterialId(3)))
        ));
        let grid = scene.add_material(GridMaterial::new("grid"));
        assert!(matches!(
            scene.set_material(MeshId(9), grid),
            Err(SceneError::UnknownMesh(MeshId(9)))
        ));
        scene.set_material(mesh, grid).unwrap();
        assert_eq!(scene.material_of(mesh).map(|m| m.name()), Some("grid"));
    }

    #[test]
    fn render_list_only_exists_on_water() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(Mesh::create_box("box", 1.0));
        let sky = scene.add_material(SkyMaterial::new("sky"));
        assert!(matches!(
            scene.add_to_render_list(sky, mesh),
            Err(SceneError::NoRenderList(_))
        ));
        let water = scene.add_material(WaterMaterial::new("water"));
        assert_eq!(scene.add_to_render_list(water, mesh).unwrap(), true);
        assert_eq!(scene.add_to_render_list(water, mesh).unwrap(), false);
    }

    #[test]
    fn water_cannot_reflect_its_own_mesh() {
        let mut scene = Scene::new();
        let surface = scene.add_mesh(Mesh::create_ground("water", 10.0, 10.0, 1));
        let water = scene.add_material(WaterMaterial::new("water"));
        scene.set_material(surface, water).unwrap();
        assert!(matches!(
            scene.add_to_render_list(water, surface),
            Err(SceneError::SelfReflection { .. })
        ));

        let other = scene.add_mesh(Mesh::create_box("box", 1.0));
        scene.add_to_render_list(water, other).unwrap();
        assert!(matches!(
            scene.set_material(other, water),
            Err(SceneError::SelfReflection { .. })
        ));
    }

    #[test]
    fn meshes_using_follows_shared_material() {
        let mut scene = Scene::new();
        let grid = scene.add_material(GridMaterial::new("grid"));
        let a = scene.add_mesh(Mesh::create_sphere("a", 8, 1.0).with_position(Vector3::unit_y()));
        let b = scene.add_mesh(Mesh::create_box("b", 1.0));
        scene.add_mesh(Mesh::create_box("c", 1.0));
        scene.set_material(a, grid).unwrap();
        scene.set_material(b, grid).unwrap();
        assert_eq!(scene.meshes_using(grid), vec![a, b]);
    }

    #[test]
    fn every_scene_has_its_own_id() {
        let a = Scene::new();
        let b = Scene::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_ne!(Scene::default().id(), a.id());
    }
}
