use glam::{ Mat4, Vec2, Vec3 };

const MOVE_SPEED: f32 = 5.0;
const MOUSE_SENSITIVITY: f32 = 0.1;
const PITCH_LIMIT: f32 = 89.0;
const MIN_FOV: f32 = 1.0;
const MAX_FOV: f32 = 45.0;

/// Movement keys held during a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementKeys {
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

/// Free-fly camera driven by yaw/pitch in degrees (right-handed, Y up).
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    up: Vec3,
    last_cursor: Option<Vec2>,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32, fov: f32, up: Vec3) -> Self {
        Self {
            position,
            yaw,
            pitch,
            fov,
            up,
            last_cursor: None,
        }
    }

    /// Moves along the view direction and its right vector for every held key.
    /// Held keys add up, so diagonal movement is faster than straight movement.
    pub fn update_position(&mut self, keys: MovementKeys, delta_time: f32) {
        if !keys.any() {
            return;
        }

        let step = delta_time * MOVE_SPEED;
        let direction = self.direction();
        let right = direction.cross(self.up).normalize();

        let mut offset = Vec3::ZERO;
        if keys.forward {
            offset += step * direction;
        }
        if keys.backward {
            offset -= step * direction;
        }
        if keys.left {
            offset -= step * right;
        }
        if keys.right {
            offset += step * right;
        }
        self.position += offset;
    }

    /// Mouse-look. The first sample only sets the baseline.
    pub fn update_yaw_pitch(&mut self, cursor_x: f32, cursor_y: f32) {
        let cursor = Vec2::new(cursor_x, cursor_y);
        let last = self.last_cursor.replace(cursor).unwrap_or(cursor);

        // screen Y grows downwards
        let offset = Vec2::new(cursor.x - last.x, last.y - cursor.y) * MOUSE_SENSITIVITY;

        self.yaw += offset.x;
        self.pitch = (self.pitch + offset.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn update_fov(&mut self, scroll_delta: f32) {
        self.fov = (self.fov - scroll_delta).clamp(MIN_FOV, MAX_FOV);
    }

    /// Forgets the last cursor sample so the next one becomes a new baseline.
    pub fn reset_cursor_baseline(&mut self) {
        self.last_cursor = None;
    }

    pub fn direction(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction(), self.up)
    }

    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect.max(1e-6), near, far)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn position_mut(&mut self) -> &mut Vec3 {
        &mut self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }
}
