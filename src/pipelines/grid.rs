use crate::{
    data_structures::material::GridMaterial,
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
};

/// GPU layout of [`GridMaterial`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridUniform {
    /// rgb: main colour, a: opacity
    pub main_color: [f32; 4],
    pub line_color: [f32; 4],
    /// grid ratio, major unit frequency, minor unit visibility
    pub control: [f32; 4],
    pub offset: [f32; 4],
}

impl From<&GridMaterial> for GridUniform {
    fn from(grid: &GridMaterial) -> Self {
        Self {
            main_color: grid.main_color.to_vec4(grid.opacity),
            line_color: grid.line_color.to_vec4(1.0),
            control: [
                grid.grid_ratio,
                grid.major_unit_frequency,
                grid.minor_unit_visibility,
                0.0,
            ],
            offset: [grid.grid_offset.x, grid.grid_offset.y, grid.grid_offset.z, 0.0],
        }
    }
}

pub fn mk_grid_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Grid Pipeline Layout",
        &[&layouts.frame, &layouts.mesh, &layouts.grid],
    );

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Grid Shader"),
        source: wgpu::ShaderSource::Wgsl(
            concat!(include_str!("common.wgsl"), include_str!("grid.wgsl")).into(),
        ),
    };

    mk_render_pipeline(device, "Grid Pipeline", &layout, format, cull_mode, shader)
}
