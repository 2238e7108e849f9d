//! Render pipelines, one per material kind, plus the shared bind group layouts.
//!
//! Bind group slots are the same for every pipeline:
//!
//! - group 0: per-pass view uniform and the scene light
//! - group 1: per-mesh transform
//! - group 2: material parameters (absent for the default lit material)
//!
//! Pipelines are created lazily per [`PipelineKey`] since back-face culling
//! is a material property and changes the pipeline state.

use std::collections::HashMap;

use crate::data_structures::{geometry::Vertex, material::MaterialKind, texture::Texture};

pub mod grid;
pub mod lit;
pub mod sky;
pub mod water;

/// Selects a pipeline. `kind == None` is the engine's default lit material.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub kind: Option<MaterialKind>,
    pub cull_back: bool,
}

impl PipelineKey {
    pub const DEFAULT: PipelineKey = PipelineKey {
        kind: None,
        cull_back: true,
    };
}

#[derive(Debug)]
pub struct Layouts {
    pub frame: wgpu::BindGroupLayout,
    pub mesh: wgpu::BindGroupLayout,
    pub sky: wgpu::BindGroupLayout,
    pub grid: wgpu::BindGroupLayout,
    pub water: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[uniform_entry(0, both), uniform_entry(1, both)],
        });
        let mesh = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let sky = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky_bind_group_layout"),
            entries: &[uniform_entry(0, both)],
        });
        let grid = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grid_bind_group_layout"),
            entries: &[uniform_entry(0, both)],
        });
        let water = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("water_bind_group_layout"),
            entries: &[
                uniform_entry(0, both),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        Self {
            frame,
            mesh,
            sky,
            grid,
            water,
        }
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

/// Lazily built pipelines for one colour format.
#[derive(Debug)]
pub struct Pipelines {
    format: wgpu::TextureFormat,
    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Pipelines {
    pub fn new(format: wgpu::TextureFormat) -> Self {
        Self {
            format,
            cache: HashMap::new(),
        }
    }

    /// Builds the pipeline for `key` unless it already exists.
    pub fn prepare(&mut self, device: &wgpu::Device, layouts: &Layouts, key: PipelineKey) {
        if self.cache.contains_key(&key) {
            return;
        }
        let cull_mode = key.cull_back.then_some(wgpu::Face::Back);
        let pipeline = match key.kind {
            None => lit::mk_lit_pipeline(device, layouts, self.format, cull_mode),
            Some(MaterialKind::Sky) => sky::mk_sky_pipeline(device, layouts, self.format, cull_mode),
            Some(MaterialKind::Grid) => {
                grid::mk_grid_pipeline(device, layouts, self.format, cull_mode)
            }
            Some(MaterialKind::Water) => {
                water::mk_water_pipeline(device, layouts, self.format, cull_mode)
            }
        };
        log::debug!("created pipeline {:?}", key);
        self.cache.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(key)
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

pub(crate) fn mk_pipeline_layout(
    device: &wgpu::Device,
    label: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        push_constant_ranges: &[],
    })
}
