use cgmath::Matrix4;

use crate::{
    data_structures::material::WaterMaterial,
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
};

/// GPU layout of [`WaterMaterial`] plus the reflection camera of the current frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniform {
    pub reflection_view_proj: [[f32; 4]; 4],
    /// rgb: water colour, a: colour blend factor
    pub water_color: [f32; 4],
    pub water_color2: [f32; 4],
    /// xy: wind direction, z: wind force, w: wave height
    pub wind: [f32; 4],
    /// bump height, wave length, water plane height
    pub wave: [f32; 4],
}

impl WaterUniform {
    pub fn new(water: &WaterMaterial, reflection_view_proj: Matrix4<f32>, height: f32) -> Self {
        Self {
            reflection_view_proj: reflection_view_proj.into(),
            water_color: water.water_color.to_vec4(water.color_blend_factor),
            water_color2: water.water_color2.to_vec4(water.color_blend_factor2),
            wind: [
                water.wind_direction.x,
                water.wind_direction.y,
                water.wind_force,
                water.wave_height,
            ],
            wave: [water.bump_height, water.wave_length, height, 0.0],
        }
    }
}

pub fn mk_water_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Water Pipeline Layout",
        &[&layouts.frame, &layouts.mesh, &layouts.water],
    );

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Water Shader"),
        source: wgpu::ShaderSource::Wgsl(
            concat!(include_str!("common.wgsl"), include_str!("water.wgsl")).into(),
        ),
    };

    mk_render_pipeline(device, "Water Pipeline", &layout, format, cull_mode, shader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector2};

    #[test]
    fn uniform_carries_wind_and_waves() {
        let mut water = WaterMaterial::new("water");
        water.wind_force = 5.0;
        water.wind_direction = Vector2::new(0.3, 0.3);
        water.wave_height = 1.0;
        water.bump_height = 1.3;
        water.wave_length = 0.35;
        water.color_blend_factor = 0.3;
        let uniform = WaterUniform::new(&water, Matrix4::identity(), -0.5);
        assert_eq!(uniform.wind, [0.3, 0.3, 5.0, 1.0]);
        assert_eq!(uniform.wave, [1.3, 0.35, -0.5, 0.0]);
        assert_eq!(uniform.water_color[3], 0.3);
        assert_eq!(uniform.water_color2[3], 0.2);
    }
}
