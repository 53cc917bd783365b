//! Input handling for the fly camera.
//!
//! Translates keyboard, mouse-motion and scroll events into camera updates
//! and viewer actions.

use winit::event::{ElementState, MouseScrollDelta};
use winit::keyboard::KeyCode;

use crate::renderer::camera::Camera;

/// Sensitivity and limit constants for input handling.
#[derive(Debug, Clone, Copy)]
pub struct InputConfig {
    /// Mouse-look sensitivity (degrees per pixel)
    pub look_sensitivity: f32,
    /// Movement speed (units per second)
    pub move_speed: f32,
    /// Narrowest field of view (degrees)
    pub min_fov: f32,
    /// Widest field of view (degrees)
    pub max_fov: f32,
    /// Pitch is clamped to `[-pitch_limit, pitch_limit]` degrees
    pub pitch_limit: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.1,
            move_speed: 75.0,
            min_fov: 1.0,
            max_fov: 45.0,
            pitch_limit: 89.0,
        }
    }
}

/// Viewer-level effect of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Quit,
    /// Mouse look switched on (`true`) or off; the cursor should follow
    SetMouseLook(bool),
    CyclePolygonMode,
    ResetCamera,
}

/// Held keys and mouse-look state.
#[derive(Debug)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Mouse motion steers the camera; off while interacting with the UI
    pub mouse_look: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            mouse_look: true,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Input controller that processes events and updates camera.
pub struct InputController {
    pub config: InputConfig,
    pub state: InputState,
}

impl InputController {
    pub fn new() -> Self {
        Self::with_config(InputConfig::default())
    }

    pub fn with_config(config: InputConfig) -> Self {
        Self {
            config,
            state: InputState::new(),
        }
    }

    /// Handle keyboard key press/release.
    pub fn handle_keyboard(&mut self, key: KeyCode, state: ElementState) -> InputAction {
        let pressed = state == ElementState::Pressed;

        match key {
            KeyCode::KeyW => self.state.forward = pressed,
            KeyCode::KeyS => self.state.backward = pressed,
            KeyCode::KeyA => self.state.left = pressed,
            KeyCode::KeyD => self.state.right = pressed,
            KeyCode::Escape if pressed => return InputAction::Quit,
            KeyCode::KeyF if pressed => {
                self.state.mouse_look = !self.state.mouse_look;
                return InputAction::SetMouseLook(self.state.mouse_look);
            }
            KeyCode::KeyL if pressed => return InputAction::CyclePolygonMode,
            KeyCode::KeyR if pressed => return InputAction::ResetCamera,
            _ => {}
        }
        InputAction::None
    }

    /// Handle raw mouse motion. Returns true if camera was updated.
    pub fn handle_mouse_motion(&mut self, dx: f32, dy: f32, camera: &mut Camera) -> bool {
        if !self.state.mouse_look {
            return false;
        }

        let limit = self.config.pitch_limit;
        camera.yaw += dx * self.config.look_sensitivity;
        // Screen y grows downward
        camera.pitch = (camera.pitch - dy * self.config.look_sensitivity).clamp(-limit, limit);
        camera.update_front();
        true
    }

    /// Handle mouse scroll: scrolling up narrows the field of view.
    pub fn handle_scroll(&mut self, delta: MouseScrollDelta, camera: &mut Camera) {
        let scroll_amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
        };

        camera.fov = (camera.fov - scroll_amount).clamp(self.config.min_fov, self.config.max_fov);
    }

    /// Apply held movement keys for a frame lasting `dt` seconds.
    pub fn update(&self, dt: f32, camera: &mut Camera) {
        if !self.state.is_moving() {
            return;
        }

        let step = self.config.move_speed * dt;
        let right = camera.right();
        if self.state.forward {
            camera.position += camera.front * step;
        }
        if self.state.backward {
            camera.position -= camera.front * step;
        }
        if self.state.left {
            camera.position -= right * step;
        }
        if self.state.right {
            camera.position += right * step;
        }
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}
