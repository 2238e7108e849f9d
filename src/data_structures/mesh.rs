use cgmath::Vector3;

use crate::data_structures::{
    geometry::Shape,
    scene::MaterialId,
};

/// A shape placed in the scene with an optional material handle.
///
/// Meshes without a material are drawn by the engine with its default lit
/// material.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub shape: Shape,
    pub position: Vector3<f32>,
    pub material: Option<MaterialId>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            position: Vector3::new(0.0, 0.0, 0.0),
            material: None,
        }
    }

    pub fn create_box(name: impl Into<String>, size: f32) -> Self {
        Self::new(name, Shape::Box { size })
    }

    pub fn create_sphere(name: impl Into<String>, segments: u32, diameter: f32) -> Self {
        Self::new(name, Shape::Sphere { segments, diameter })
    }

    pub fn create_ground(name: impl Into<String>, width: f32, depth: f32, subdivisions: u32) -> Self {
        Self::new(
            name,
            Shape::Ground {
                width,
                depth,
                subdivisions,
            },
        )
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn model_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
    }
}

/// GPU layout of a mesh transform.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
}

impl From<&Mesh> for MeshUniform {
    fn from(mesh: &Mesh) -> Self {
        Self {
            model: mesh.model_matrix().into(),
        }
    }
}
