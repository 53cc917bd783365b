use glam::{Mat4, Vec3};

/// First-person fly camera driven by yaw/pitch angles.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position
    pub position: Vec3,
    /// Unit view direction, derived from yaw and pitch
    pub front: Vec3,
    /// World up
    pub up: Vec3,
    /// Horizontal angle in degrees; -90 looks down -Z
    pub yaw: f32,
    /// Vertical angle in degrees
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Translation applied after the look-at transform
    pub view_offset: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 1.0, 2.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            near: 0.1,
            far: 10000.0,
            view_offset: Vec3::new(0.0, 0.0, -8.0),
        };
        camera.update_front();
        camera
    }

    /// Recompute `front` from `yaw` and `pitch`.
    pub fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let direction = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = direction.normalize();
    }

    /// Unit vector pointing to the camera's right.
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    /// Build view matrix (camera transform)
    pub fn build_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
            * Mat4::from_translation(self.view_offset)
    }

    /// Build perspective projection matrix
    pub fn build_projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn build_view_projection_matrix(&self, aspect: f32) -> Mat4 {
        self.build_projection_matrix(aspect) * self.build_view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_default() {
        let camera = Camera::new();
        assert_eq!(camera.position, Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(camera.fov, 45.0);
        assert!((camera.front - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_right_is_positive_x_by_default() {
        let camera = Camera::new();
        assert!((camera.right() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_pitch_up_looks_up() {
        let mut camera = Camera::new();
        camera.pitch = 45.0;
        camera.update_front();
        assert!(camera.front.y > 0.7);
        assert!((camera.front.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_view_offset_pushes_scene_back() {
        let mut camera = Camera::new();
        camera.position = Vec3::ZERO;
        let origin = camera.build_view_matrix().transform_point3(Vec3::ZERO);
        // Looking down -Z, the world origin lands 8 units in front of the eye
        assert!((origin - Vec3::new(0.0, 0.0, -8.0)).length() < 1e-4);
    }

    #[test]
    fn test_view_projection_matrix() {
        let camera = Camera::new();
        let vp = camera.build_view_projection_matrix(16.0 / 9.0);
        assert!(vp.determinant().abs() > 0.0001);
    }
}
