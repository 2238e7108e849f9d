/// Linear RGB colour used by lights and materials.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color3 {
    pub const BLACK: Color3 = Color3::new(0.0, 0.0, 0.0);
    pub const WHITE: Color3 = Color3::new(1.0, 1.0, 1.0);
    pub const TEAL: Color3 = Color3::new(0.0, 1.0, 1.0);
    pub const GREY: Color3 = Color3::new(0.5, 0.5, 0.5);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Pads to a `vec4` for uniform buffers.
    pub fn to_vec4(self, w: f32) -> [f32; 4] {
        [self.r, self.g, self.b, w]
    }
}

impl From<[f32; 3]> for Color3 {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}
