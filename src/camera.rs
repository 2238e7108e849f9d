//! Cameras, input driven camera control and the per-pass view uniform.
//!
//! [`FreeCamera`] is the scene side description (where the camera starts,
//! what it looks at, whether user input may drive it). The engine keeps its
//! own copy of the active camera and moves that copy with a
//! [`CameraController`], so the scene graph itself is never written while the
//! render loop runs.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, Vector4};
use instant::Duration;
use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::host::DisplaySurface;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2 - 0.0001;

/// Which surface feeds input to a camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlBinding {
    pub surface_id: String,
    pub no_prevent_default: bool,
}

/// A first person camera: a position plus yaw/pitch.
#[derive(Clone, Debug, PartialEq)]
pub struct FreeCamera {
    pub name: String,
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub fov: Rad<f32>,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub angular_sensibility: f32,
    control: Option<ControlBinding>,
}

impl FreeCamera {
    /// A camera at `position` looking down +Z.
    pub fn new(name: impl Into<String>, position: Point3<f32>) -> Self {
        Self {
            name: name.into(),
            position,
            yaw: Rad(std::f32::consts::FRAC_PI_2),
            pitch: Rad(0.0),
            fov: Rad(0.8),
            near: 1.0,
            far: 10000.0,
            speed: 2.0,
            angular_sensibility: 2000.0,
            control: None,
        }
    }

    /// Turns the camera towards `target`. A target equal to the position is ignored.
    pub fn set_target(&mut self, target: Point3<f32>) {
        let dir = target - self.position;
        if dir.magnitude2() == 0.0 {
            return;
        }
        let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
        self.yaw = Rad(dir.z.atan2(dir.x));
        self.pitch = Rad(dir.y.atan2(horizontal).clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    /// A point one unit in front of the camera.
    pub fn target(&self) -> Point3<f32> {
        self.position + self.forward()
    }

    /// Right-handed world to view transform: +Y up, the camera looks down its
    /// view space -Z. Seen from a camera at -Z looking at the origin, world +X
    /// is on the left of the screen.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// Lets user input on `surface` drive this camera.
    pub fn attach_control(&mut self, surface: &DisplaySurface, no_prevent_default: bool) {
        self.control = Some(ControlBinding {
            surface_id: surface.id().to_string(),
            no_prevent_default,
        });
    }

    pub fn detach_control(&mut self) {
        self.control = None;
    }

    pub fn control(&self) -> Option<&ControlBinding> {
        self.control.as_ref()
    }

    /// The camera mirrored on the horizontal plane at `height`, as used for reflections.
    pub fn mirrored(&self, height: f32) -> FreeCamera {
        let mut mirrored = self.clone();
        mirrored.position.y = 2.0 * height - self.position.y;
        mirrored.pitch = -self.pitch;
        mirrored
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn for_camera(camera: &FreeCamera, width: u32, height: u32) -> Self {
        Self::new(width, height, camera.fov, camera.near, camera.far)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Per-pass view data. `clip_plane` is `(a, b, c, d)`; fragments with
/// `a*x + b*y + c*z + d < 0` are discarded. All zeros disables clipping.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub clip_plane: [f32; 4],
    /// x: seconds since the engine started
    pub time: [f32; 4],
}

impl ViewUniform {
    pub fn new(
        camera: &FreeCamera,
        projection: &Projection,
        clip_plane: Vector4<f32>,
        time: f32,
    ) -> Self {
        Self {
            view_proj: (projection.calc_matrix() * camera.view_matrix()).into(),
            eye: camera.position.to_homogeneous().into(),
            clip_plane: clip_plane.into(),
            time: [time, 0.0, 0.0, 0.0],
        }
    }
}

/// Keyboard and mouse-drag control of a [`FreeCamera`].
///
/// Arrow keys or WASD move, Q/E move down/up, dragging with the left mouse
/// button turns the camera.
#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            dragging: false,
            last_cursor: None,
            speed,
            sensitivity,
        }
    }

    pub fn for_camera(camera: &FreeCamera) -> Self {
        Self::new(camera.speed * 10.0, 5.0 / camera.angular_sensibility)
    }

    /// Returns true if the event was consumed.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(code) => {
                    self.process_key(code, event.state == ElementState::Pressed)
                }
                PhysicalKey::Unidentified(_) => false,
            },
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state.is_pressed();
                if !self.dragging {
                    self.last_cursor = None;
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let current = (position.x, position.y);
                if self.dragging {
                    if let Some((x, y)) = self.last_cursor {
                        self.process_drag(current.0 - x, current.1 - y);
                    }
                }
                self.last_cursor = Some(current);
                self.dragging
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    pub fn process_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        let amount = if pressed { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => self.amount_forward = amount,
            KeyCode::KeyS | KeyCode::ArrowDown => self.amount_backward = amount,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.amount_left = amount,
            KeyCode::KeyD | KeyCode::ArrowRight => self.amount_right = amount,
            KeyCode::KeyE => self.amount_up = amount,
            KeyCode::KeyQ => self.amount_down = amount,
            _ => return false,
        }
        true
    }

    pub fn process_drag(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    fn release_all(&mut self) {
        self.amount_left = 0.0;
        self.amount_right = 0.0;
        self.amount_forward = 0.0;
        self.amount_backward = 0.0;
        self.amount_up = 0.0;
        self.amount_down = 0.0;
        self.dragging = false;
        self.last_cursor = None;
    }

    pub fn update(&mut self, camera: &mut FreeCamera, dt: Duration) {
        let dt = dt.as_secs_f32();

        let forward = camera.forward();
        let right = forward.cross(Vector3::unit_y());
        let right = if right.magnitude2() > 0.0 {
            right.normalize()
        } else {
            Vector3::unit_x()
        };
        camera.position += forward * (self.amount_forward - self.amount_backward) * self.speed * dt;
        camera.position += right * (self.amount_right - self.amount_left) * self.speed * dt;
        camera.position.y += (self.amount_up - self.amount_down) * self.speed * dt;

        camera.yaw += Rad(self.rotate_horizontal * self.sensitivity);
        camera.pitch += Rad(-self.rotate_vertical * self.sensitivity);
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        camera.pitch = Rad(camera.pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn set_target_points_camera_at_origin() {
        let mut camera = FreeCamera::new("camera1", Point3::new(0.0, 5.0, -10.0));
        camera.set_target(Point3::new(0.0, 0.0, 0.0));
        let expected = Vector3::new(0.0, -5.0, 10.0).normalize();
        let forward = camera.forward();
        assert_relative_eq!(forward.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(forward.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(forward.z, expected.z, epsilon = 1e-5);
    }

    #[test]
    fn targeting_own_position_keeps_orientation() {
        let mut camera = FreeCamera::new("camera1", Point3::new(1.0, 2.0, 3.0));
        let before = camera.forward();
        camera.set_target(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.forward(), before);
    }

    #[test]
    fn mirrored_camera_sits_below_the_plane() {
        let mut camera = FreeCamera::new("camera1", Point3::new(0.0, 5.0, -10.0));
        camera.set_target(Point3::new(0.0, 0.0, 0.0));
        let mirrored = camera.mirrored(0.0);
        assert_relative_eq!(mirrored.position.y, -5.0);
        assert_relative_eq!(mirrored.forward().y, -camera.forward().y, epsilon = 1e-6);
        assert_relative_eq!(mirrored.forward().z, camera.forward().z, epsilon = 1e-6);
    }

    #[test]
    fn controller_moves_forward_while_key_held() {
        let mut camera = FreeCamera::new("camera1", Point3::new(0.0, 0.0, 0.0));
        let mut controller = CameraController::new(4.0, 0.01);
        assert!(controller.process_key(KeyCode::KeyW, true));
        controller.update(&mut camera, Duration::from_secs(1));
        assert_relative_eq!(camera.position.z, 4.0, epsilon = 1e-4);

        controller.process_key(KeyCode::KeyW, false);
        controller.update(&mut camera, Duration::from_secs(1));
        assert_relative_eq!(camera.position.z, 4.0, epsilon = 1e-4);
        assert!(!controller.process_key(KeyCode::KeyZ, true));
    }

    #[test]
    fn drag_rotation_is_consumed_once() {
        let mut camera = FreeCamera::new("camera1", Point3::new(0.0, 0.0, 0.0));
        let mut controller = CameraController::new(1.0, 0.01);
        let yaw = camera.yaw;
        controller.process_drag(100.0, 0.0);
        controller.update(&mut camera, Duration::from_millis(16));
        assert_relative_eq!(camera.yaw.0, yaw.0 + 1.0, epsilon = 1e-5);
        controller.update(&mut camera, Duration::from_millis(16));
        assert_relative_eq!(camera.yaw.0, yaw.0 + 1.0, epsilon = 1e-5);
    }

    #[test]
    fn view_uniform_carries_eye_and_clip_plane() {
        let camera = FreeCamera::new("camera1", Point3::new(1.0, 2.0, 3.0));
        let projection = Projection::for_camera(&camera, 800, 600);
        let uniform = ViewUniform::new(&camera, &projection, Vector4::new(0.0, 1.0, 0.0, 0.0), 2.5);
        assert_eq!(uniform.eye, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.clip_plane, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniform.time[0], 2.5);
    }

    #[test]
    fn world_x_is_on_screen_left_when_looking_down_z() {
        let mut camera = FreeCamera::new("camera1", Point3::new(0.0, 5.0, -10.0));
        camera.set_target(Point3::new(0.0, 0.0, 0.0));
        let projection = Projection::for_camera(&camera, 800, 800);
        let clip = projection.calc_matrix() * camera.view_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        let ndc_x = clip.x / clip.w;
        assert!(ndc_x < 0.0);
        assert!(clip.w > 0.0);
    }
}
