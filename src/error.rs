//! Error types shared by the composer and the engines.

use crate::data_structures::scene::{MaterialId, MeshId};

/// Failures while composing or editing a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The host has no element with the requested id. Nothing can be rendered.
    #[error("display surface `{id}` not found")]
    MissingSurface { id: String },
    #[error("unknown mesh {0:?}")]
    UnknownMesh(MeshId),
    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialId),
    #[error("material {0:?} has no render list (only water materials do)")]
    NoRenderList(MaterialId),
    #[error("mesh {mesh:?} already uses material {material:?} and cannot reflect itself")]
    SelfReflection { mesh: MeshId, material: MaterialId },
    #[error("engine initialization failed: {0}")]
    Engine(String),
}

/// Failures while rendering a single frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("the scene has no active camera")]
    NoActiveCamera,
    #[error(transparent)]
    Scene(#[from] SceneError),
}
