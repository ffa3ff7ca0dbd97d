//! Keyboard and mouse state
//!
//! Fed from winit window events by the engine; queried by the camera and
//! game code. Per-frame state is cleared by `end_frame`.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Input state manager
#[derive(Debug, Default)]
pub struct Input {
    /// Currently held keys
    keys_down: HashSet<KeyCode>,
    /// Keys pressed this frame
    keys_pressed: HashSet<KeyCode>,
    /// Currently held mouse buttons
    buttons_down: HashSet<MouseButton>,
    /// Last known cursor position, `None` until the first motion event
    cursor: Option<Vec2>,
    /// Cursor movement accumulated this frame
    mouse_delta: Vec2,
}

impl Input {
    /// Create a new input manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a keyboard event
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
            }
        }
    }

    /// Process a mouse button event
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.buttons_down.insert(button);
            }
            ElementState::Released => {
                self.buttons_down.remove(&button);
            }
        }
    }

    /// Process an absolute cursor position
    pub fn process_cursor(&mut self, position: Vec2) {
        if let Some(last) = self.cursor {
            self.mouse_delta += position - last;
        }
        self.cursor = Some(position);
    }

    /// Forget the cursor, e.g. when it leaves the window
    pub fn cursor_left(&mut self) {
        self.cursor = None;
    }

    /// Clear per-frame state. Call after the frame has been updated.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Check if a key is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Check if a key went down this frame
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a mouse button is held
    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Cursor movement in pixels since the last `end_frame`
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_and_just_pressed() {
        let mut input = Input::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);

        assert!(input.is_key_down(KeyCode::KeyW));
        assert!(input.is_key_just_pressed(KeyCode::KeyW));

        input.end_frame();
        // Key repeat does not count as a new press
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.is_key_down(KeyCode::KeyW));
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));

        input.process_keyboard(KeyCode::KeyW, ElementState::Released);
        assert!(!input.is_key_down(KeyCode::KeyW));
    }

    #[test]
    fn test_mouse_buttons() {
        let mut input = Input::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.is_mouse_button_down(MouseButton::Left));
        assert!(!input.is_mouse_button_down(MouseButton::Right));

        input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!input.is_mouse_button_down(MouseButton::Left));
    }

    #[test]
    fn test_first_motion_has_no_delta() {
        let mut input = Input::new();
        input.process_cursor(Vec2::new(100.0, 100.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);

        input.process_cursor(Vec2::new(110.0, 95.0));
        input.process_cursor(Vec2::new(115.0, 95.0));
        assert_eq!(input.mouse_delta(), Vec2::new(15.0, -5.0));

        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_cursor_left_resets_tracking() {
        let mut input = Input::new();
        input.process_cursor(Vec2::new(10.0, 10.0));
        input.cursor_left();
        input.process_cursor(Vec2::new(300.0, 300.0));

        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
