//! Scene data structures, independent of any GPU state except [`texture`].
//!
//! - `scene` owns cameras, lights, meshes and the material arena
//! - `mesh` places a `geometry::Shape` in the world and points at a material
//! - `geometry` builds vertex and index data for boxes, spheres and grounds
//! - `material` holds the sky, grid and water parameter bundles
//! - `light` is the hemispheric light
//! - `color` is a small RGB helper
//! - `texture` wraps GPU textures

pub mod color;
pub mod geometry;
pub mod light;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod texture;
