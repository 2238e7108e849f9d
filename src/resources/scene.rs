use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    context::{Context, FrameBindings},
    data_structures::{
        geometry::Shape,
        material::{Material, WaterMaterial},
        mesh::{Mesh, MeshUniform},
        scene::{MaterialId, MeshId, Scene, SceneId},
        texture::{Texture, create_repeat_sampler},
    },
    pipelines::{Layouts, grid::GridUniform, sky::SkyUniform, water::WaterUniform},
    render::FramePlan,
    resources::texture::{TextureCache, decode_normal_map},
};

#[derive(Debug)]
pub struct GpuMesh {
    shape: Shape,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, layouts: &Layouts, mesh: &Mesh) -> Self {
        let geometry = mesh.shape.build();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Mesh Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[MeshUniform::from(mesh)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.mesh,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
            label: Some(&mesh.name),
        });
        Self {
            shape: mesh.shape.clone(),
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len() as u32,
            uniform,
            bind_group,
        }
    }
}

/// Offscreen targets and views of one water material.
#[derive(Debug)]
pub struct WaterTargets {
    pub reflection: Texture,
    pub refraction: Texture,
    pub depth: Texture,
    pub reflection_view: FrameBindings,
    pub refraction_view: FrameBindings,
}

#[derive(Debug)]
pub enum GpuMaterial {
    Sky {
        buffer: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
    },
    Grid {
        buffer: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
    },
    Water {
        buffer: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
        targets: WaterTargets,
        /// Whether `bind_group` already samples the loaded bump texture.
        bump_bound: bool,
    },
}

impl GpuMaterial {
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        match self {
            GpuMaterial::Sky { bind_group, .. }
            | GpuMaterial::Grid { bind_group, .. }
            | GpuMaterial::Water { bind_group, .. } => bind_group,
        }
    }

    pub fn water_targets(&self) -> Option<&WaterTargets> {
        match self {
            GpuMaterial::Water { targets, .. } => Some(targets),
            _ => None,
        }
    }
}

/// GPU copies of the meshes and materials of the scenes rendered so far,
/// kept apart per scene.
#[derive(Debug)]
pub struct SceneResources {
    meshes: HashMap<(SceneId, MeshId), GpuMesh>,
    materials: HashMap<(SceneId, MaterialId), GpuMaterial>,
    textures: TextureCache<Texture>,
    flat_normal: Texture,
    sampler: wgpu::Sampler,
}

impl SceneResources {
    pub fn new(ctx: &Context) -> Self {
        Self {
            meshes: HashMap::new(),
            materials: HashMap::new(),
            textures: TextureCache::default(),
            flat_normal: Texture::flat_normal_map(&ctx.device, &ctx.queue),
            sampler: create_repeat_sampler(&ctx.device),
        }
    }

    pub fn mesh(&self, scene: SceneId, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(&(scene, id))
    }

    pub fn material(&self, scene: SceneId, id: MaterialId) -> Option<&GpuMaterial> {
        self.materials.get(&(scene, id))
    }

    /// Brings buffers, bind groups and pipelines up to date with `scene` and
    /// writes this frame's mesh and material uniforms.
    pub fn sync(&mut self, ctx: &mut Context, scene: &Scene, plan: &FramePlan) {
        for key in plan.pipeline_keys() {
            ctx.pipelines.prepare(&ctx.device, &ctx.layouts, key);
        }

        let scene_id = scene.id();
        for (id, mesh) in scene.meshes() {
            match self.meshes.get(&(scene_id, id)) {
                Some(gpu) if gpu.shape == mesh.shape => {
                    ctx.queue.write_buffer(
                        &gpu.uniform,
                        0,
                        bytemuck::cast_slice(&[MeshUniform::from(mesh)]),
                    );
                }
                _ => {
                    log::debug!("uploading mesh {}", mesh.name);
                    self.meshes.insert(
                        (scene_id, id),
                        GpuMesh::new(&ctx.device, &ctx.layouts, mesh),
                    );
                }
            }
        }

        for (id, material) in scene.materials() {
            if let Some(texture) = material.as_water().and_then(|w| w.bump_texture.as_ref()) {
                self.textures.request(&texture.path);
            }
            self.sync_material(ctx, (scene_id, id), material);
        }
    }

    fn sync_material(&mut self, ctx: &Context, id: (SceneId, MaterialId), material: &Material) {
        let stale = match (self.materials.get(&id), material) {
            (Some(GpuMaterial::Sky { .. }), Material::Sky(_)) => false,
            (Some(GpuMaterial::Grid { .. }), Material::Grid(_)) => false,
            (Some(GpuMaterial::Water { bump_bound, .. }), Material::Water(water)) => self
                .textures
                .needs_rebind(water.bump_texture.as_ref().map(|t| t.path.as_str()), *bump_bound),
            _ => true,
        };
        if stale {
            let gpu = self.create_material(ctx, material);
            self.materials.insert(id, gpu);
        }

        match (self.materials.get(&id), material) {
            (Some(GpuMaterial::Sky { buffer, .. }), Material::Sky(sky)) => {
                ctx.queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(&[SkyUniform::from(sky)]));
            }
            (Some(GpuMaterial::Grid { buffer, .. }), Material::Grid(grid)) => {
                ctx.queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(&[GridUniform::from(grid)]));
            }
            // Water uniforms depend on the camera and are written by the renderer.
            _ => {}
        }
    }

    fn create_material(&self, ctx: &Context, material: &Material) -> GpuMaterial {
        let device = &ctx.device;
        match material {
            Material::Sky(sky) => {
                let (buffer, bind_group) = uniform_bind_group(
                    device,
                    &ctx.layouts.sky,
                    &sky.name,
                    bytemuck::cast_slice(&[SkyUniform::from(sky)]),
                );
                GpuMaterial::Sky { buffer, bind_group }
            }
            Material::Grid(grid) => {
                let (buffer, bind_group) = uniform_bind_group(
                    device,
                    &ctx.layouts.grid,
                    &grid.name,
                    bytemuck::cast_slice(&[GridUniform::from(grid)]),
                );
                GpuMaterial::Grid { buffer, bind_group }
            }
            Material::Water(water) => self.create_water(ctx, water),
        }
    }

    fn create_water(&self, ctx: &Context, water: &WaterMaterial) -> GpuMaterial {
        let device = &ctx.device;
        let size = water.render_target_size;
        let format = ctx.config.format;
        let targets = WaterTargets {
            reflection: Texture::create_render_target(device, size, format, "water reflection"),
            refraction: Texture::create_render_target(device, size, format, "water refraction"),
            depth: Texture::create_depth_texture(device, [size.0, size.1], "water depth"),
            reflection_view: FrameBindings::new(
                device,
                &ctx.layouts,
                &ctx.light_buffer,
                "water reflection view",
            ),
            refraction_view: FrameBindings::new(
                device,
                &ctx.layouts,
                &ctx.light_buffer,
                "water refraction view",
            ),
        };

        let loaded = self.bump_texture(water);
        let bump = loaded.unwrap_or(&self.flat_normal);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Water Buffer", water.name)),
            contents: bytemuck::cast_slice(&[WaterUniform::new(
                water,
                cgmath::SquareMatrix::identity(),
                0.0,
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &ctx.layouts.water,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&bump.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&targets.reflection.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&targets.refraction.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
            label: Some(&water.name),
        });

        GpuMaterial::Water {
            buffer,
            bind_group,
            targets,
            bump_bound: loaded.is_some(),
        }
    }

    fn bump_texture(&self, water: &WaterMaterial) -> Option<&Texture> {
        self.textures.get(&water.bump_texture.as_ref()?.path)
    }

    pub fn write_water(
        &self,
        ctx: &Context,
        scene: SceneId,
        id: MaterialId,
        uniform: &WaterUniform,
    ) {
        if let Some(GpuMaterial::Water { buffer, .. }) = self.materials.get(&(scene, id)) {
            ctx.queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(&[*uniform]));
        }
    }

    /// Texture paths the scene needs that nobody has started loading yet.
    pub fn take_texture_requests(&mut self) -> Vec<String> {
        self.textures.take_requests()
    }

    /// Stores the outcome of a texture load. Materials pick it up on the next sync.
    /// A failed load keeps the flat normal map in place.
    pub fn texture_loaded(&mut self, ctx: &Context, path: &str, bytes: Result<Vec<u8>, String>) {
        let texture = bytes
            .map_err(anyhow::Error::msg)
            .and_then(|bytes| decode_normal_map(&ctx.device, &ctx.queue, &bytes, path));
        self.textures.complete(path, texture);
    }
}

fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    contents: &[u8],
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some(label),
    });
    (buffer, bind_group)
}
