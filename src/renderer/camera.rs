//! Fly camera
//!
//! The camera owns a `TransformNode` like any entity. WASD moves along the
//! local basis, Space and X move along world Y, and dragging with the left
//! mouse button turns it. Projection is left-handed perspective.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::core::CameraConfig;
use crate::input::Input;
use crate::scene::TransformNode;

/// Pitch limit; kept just short of vertical so the view basis stays defined
const MAX_PITCH: f32 = FRAC_PI_2 - 1.0e-3;

/// Perspective fly camera
#[derive(Debug, Clone)]
pub struct Camera {
    transform: TransformNode,
    /// Field of view in radians
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Units per second
    pub movement_speed: f32,
    /// Radians per pixel of mouse drag
    pub mouse_look_speed: f32,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    /// Create a camera from configuration
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut transform = TransformNode::new();
        transform.set_position(config.position);

        let mut camera = Self {
            transform,
            fov: config.fov,
            near: config.near,
            far: config.far,
            aspect,
            movement_speed: config.movement_speed,
            mouse_look_speed: config.mouse_look_speed,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera.update_view();
        camera
    }

    /// Apply one frame of keyboard and mouse input
    pub fn update(&mut self, dt: f32, input: &Input) {
        let step = self.movement_speed * dt;

        if input.is_key_down(KeyCode::KeyW) {
            self.transform.move_relative(step, 0.0, 0.0);
        }
        if input.is_key_down(KeyCode::KeyS) {
            self.transform.move_relative(-step, 0.0, 0.0);
        }
        if input.is_key_down(KeyCode::KeyA) {
            self.transform.move_relative(0.0, -step, 0.0);
        }
        if input.is_key_down(KeyCode::KeyD) {
            self.transform.move_relative(0.0, step, 0.0);
        }
        if input.is_key_down(KeyCode::KeyX) {
            self.transform.move_absolute(Vec3::new(0.0, -step, 0.0));
        }
        if input.is_key_down(KeyCode::Space) {
            self.transform.move_absolute(Vec3::new(0.0, step, 0.0));
        }

        if input.is_mouse_button_down(MouseButton::Left) {
            let delta = input.mouse_delta() * self.mouse_look_speed;
            self.look(delta.y, delta.x);
        }

        self.update_view();
    }

    /// Turn by pitch and yaw deltas, clamping the accumulated pitch
    pub fn look(&mut self, pitch: f32, yaw: f32) {
        let current = self.transform.rotation().x;
        let target = (current + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.transform.rotate(target - current, yaw, 0.0);
        self.update_view();
    }

    /// Update aspect ratio after a resize
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
        self.update_projection();
    }

    fn update_view(&mut self) {
        self.view = Mat4::look_to_lh(self.transform.position(), self.transform.forward(), Vec3::Y);
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective_lh(self.fov, self.aspect, self.near, self.far);
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn transform(&self) -> &TransformNode {
        &self.transform
    }
}
