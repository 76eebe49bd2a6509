use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Perspective camera looking down -Z from `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f32,
    aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    projection: Mat4,
}

impl Camera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32, position: Vec3) -> Self {
        let mut camera = Self {
            fov_y_degrees,
            aspect,
            near,
            far,
            position,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(
            config.fov,
            config.aspect,
            config.near,
            config.far,
            config.position,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Sets the aspect and recomputes the projection.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    /// Rebuilds the cached projection after a field was changed directly.
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn set_aspect_updates_projection() {
        let mut camera = Camera::default();
        let before = camera.projection();
        camera.set_aspect(1.0);
        assert_ne!(before, camera.projection());
        // x scale equals y scale over aspect.
        let m = camera.projection();
        assert_abs_diff_eq!(m.x_axis.x, m.y_axis.y, epsilon = 1e-6);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::default();
        let clip = camera.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(clip.x / clip.w, 0.0);
        assert_abs_diff_eq!(clip.y / clip.w, 0.0);
        let depth = clip.z / clip.w;
        assert!((-1.0..=1.0).contains(&depth));
    }
}
