//! Loading assets and keeping the GPU side copy of a scene.
//!
//! - `texture` fetches asset files and decodes images
//! - `scene` mirrors scene meshes and materials as GPU buffers, bind groups
//!   and render targets

pub mod scene;
pub mod texture;
