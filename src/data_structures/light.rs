use cgmath::{InnerSpace, Vector3};

use crate::data_structures::color::Color3;

/// Ambient-like light that blends `diffuse` (surfaces facing `direction`)
/// with `ground_color` (surfaces facing away).
#[derive(Clone, Debug, PartialEq)]
pub struct HemisphericLight {
    pub name: String,
    pub direction: Vector3<f32>,
    intensity: f32,
    pub diffuse: Color3,
    pub specular: Color3,
    pub ground_color: Color3,
}

impl HemisphericLight {
    pub fn new(name: impl Into<String>, direction: Vector3<f32>) -> Self {
        Self {
            name: name.into(),
            direction,
            intensity: 1.0,
            diffuse: Color3::WHITE,
            specular: Color3::WHITE,
            ground_color: Color3::BLACK,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Sets the intensity, clamped to `[0, 1]`.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    pub fn to_uniform(&self) -> LightUniform {
        let direction = if self.direction.magnitude2() > 0.0 {
            self.direction.normalize()
        } else {
            Vector3::unit_y()
        };
        LightUniform {
            direction: [direction.x, direction.y, direction.z, self.intensity],
            diffuse: self.diffuse.to_vec4(1.0),
            ground: self.ground_color.to_vec4(1.0),
        }
    }
}

/// GPU layout of the scene light; `direction.w` carries the intensity.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub direction: [f32; 4],
    pub diffuse: [f32; 4],
    pub ground: [f32; 4],
}

impl LightUniform {
    /// What the shaders see when the scene has no light at all.
    pub fn unlit() -> Self {
        Self {
            direction: [0.0, 1.0, 0.0, 0.0],
            diffuse: [1.0; 4],
            ground: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_is_clamped() {
        let mut light = HemisphericLight::new("light", Vector3::unit_y());
        light.set_intensity(0.7);
        assert_eq!(light.intensity(), 0.7);
        light.set_intensity(3.0);
        assert_eq!(light.intensity(), 1.0);
        light.set_intensity(-1.0);
        assert_eq!(light.intensity(), 0.0);
    }

    #[test]
    fn uniform_normalizes_direction() {
        let mut light = HemisphericLight::new("light", Vector3::new(0.0, 4.0, 0.0));
        light.set_intensity(0.5);
        let uniform = light.to_uniform();
        assert_eq!(uniform.direction, [0.0, 1.0, 0.0, 0.5]);
    }
}
