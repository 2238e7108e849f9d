//! Default material for meshes that were never assigned one: flat grey with
//! hemispheric lighting.

use crate::pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline};

pub fn mk_lit_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Lit Pipeline Layout",
        &[&layouts.frame, &layouts.mesh],
    );

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Lit Shader"),
        source: wgpu::ShaderSource::Wgsl(
            concat!(include_str!("common.wgsl"), include_str!("lit.wgsl")).into(),
        ),
    };

    mk_render_pipeline(device, "Lit Pipeline", &layout, format, cull_mode, shader)
}
