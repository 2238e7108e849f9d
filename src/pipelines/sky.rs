use crate::{
    data_structures::material::SkyMaterial,
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
};

/// GPU layout of [`SkyMaterial`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    /// xyz: sun position, w: luminance
    pub sun_position: [f32; 4],
    /// rayleigh, turbidity, mie coefficient, mie directional g
    pub params: [f32; 4],
    pub up: [f32; 4],
}

impl From<&SkyMaterial> for SkyUniform {
    fn from(sky: &SkyMaterial) -> Self {
        let sun = sky.sun_position();
        Self {
            sun_position: [sun.x, sun.y, sun.z, sky.luminance],
            params: [
                sky.rayleigh,
                sky.turbidity,
                sky.mie_coefficient,
                sky.mie_directional_g,
            ],
            up: [0.0, 1.0, 0.0, 0.0],
        }
    }
}

pub fn mk_sky_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Sky Pipeline Layout",
        &[&layouts.frame, &layouts.mesh, &layouts.sky],
    );

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(
            concat!(include_str!("common.wgsl"), include_str!("sky.wgsl")).into(),
        ),
    };

    mk_render_pipeline(device, "Sky Pipeline", &layout, format, cull_mode, shader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_packs_luminance_with_sun() {
        let mut sky = SkyMaterial::new("sky");
        sky.luminance = 0.45;
        sky.turbidity = 1.0;
        let uniform = SkyUniform::from(&sky);
        assert_eq!(uniform.sun_position[3], 0.45);
        assert_eq!(uniform.params, [2.0, 1.0, 0.005, 0.8]);
    }
}
