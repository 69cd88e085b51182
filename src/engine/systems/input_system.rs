use std::collections::HashSet;
use winit::event::{ DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent };
use winit::keyboard::{ KeyCode, PhysicalKey };

use crate::engine::components::camera::MovementKeys;

// Touchpads report pixels; scale them to roughly one wheel notch.
const PIXELS_PER_LINE: f32 = 20.0;

/// Per-window input state polled once per frame by the active demo.
#[derive(Debug, Default)]
pub struct InputSystem {
    pressed_keys: HashSet<KeyCode>,
    pressed_buttons: HashSet<MouseButton>,
    cursor: Option<(f64, f64)>,
    // sum of raw mouse motion; not clamped to the window
    pointer: (f64, f64),
    scroll: f32,
}

impl InputSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one window event. Returns true when the event was input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { physical_key, state, .. }, .. } => {
                if let PhysicalKey::Code(code) = physical_key {
                    self.receive_key(*code, *state);
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.receive_button(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.receive_cursor(position.x, position.y);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => (position.y as f32) / PIXELS_PER_LINE,
                };
                self.receive_scroll(lines);
                true
            }
            _ => false,
        }
    }

    /// Feeds one raw device event. Returns true for mouse motion.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> bool {
        match event {
            DeviceEvent::MouseMotion { delta } => {
                self.receive_mouse_motion(delta.0, delta.1);
                true
            }
            _ => false,
        }
    }

    pub fn receive_key(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.pressed_keys.insert(code) {
                    log::trace!("Key pressed: {:?}", code);
                }
            }
            ElementState::Released => {
                self.pressed_keys.remove(&code);
            }
        }
    }

    pub fn receive_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.pressed_buttons.insert(button);
            }
            ElementState::Released => {
                self.pressed_buttons.remove(&button);
            }
        }
    }

    pub fn receive_cursor(&mut self, x: f64, y: f64) {
        self.cursor = Some((x, y));
    }

    pub fn receive_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.pointer.0 += dx;
        self.pointer.1 += dy;
    }

    pub fn receive_scroll(&mut self, lines: f32) {
        self.scroll += lines;
    }

    pub fn is_key_held(&self, code: KeyCode) -> bool {
        self.pressed_keys.contains(&code)
    }

    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Last cursor position in physical pixels, if the cursor has moved yet.
    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    /// Virtual pointer built from raw motion. Keeps moving when a grabbed
    /// cursor is pinned at the window edge.
    pub fn pointer(&self) -> (f64, f64) {
        self.pointer
    }

    pub fn movement_keys(&self) -> MovementKeys {
        MovementKeys {
            forward: self.is_key_held(KeyCode::KeyW),
            backward: self.is_key_held(KeyCode::KeyS),
            left: self.is_key_held(KeyCode::KeyA),
            right: self.is_key_held(KeyCode::KeyD),
        }
    }

    /// Returns the scroll accumulated since the previous call.
    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }

    /// Forgets held keys and buttons, e.g. after the window loses focus.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.pressed_buttons.clear();
    }
}
