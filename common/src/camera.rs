//! Screen-space camera for the 2D scenes
//!
//! Scenes are authored in canvas pixels with the origin at the top-left and y growing
//! downward. The camera fits that scene rectangle into the window, letterboxing to keep the
//! aspect ratio intact.

use glam::{Mat4, Vec2, Vec3};

/// 2D orthographic camera over a fixed-size scene
#[derive(Debug, Clone)]
pub struct Camera2D {
    /// Scene size in scene pixels
    pub scene_size: Vec2,
    /// Pan offset in scene pixels
    pub position: Vec3,
    pub zoom: f32,
    pub aspect_ratio: f32,
}

impl Camera2D {
    pub fn new(scene_size: Vec2, aspect_ratio: f32) -> Self {
        Self {
            scene_size,
            position: Vec3::ZERO,
            zoom: 1.0,
            aspect_ratio,
        }
    }

    /// Visible region `(min, max)` in scene pixels, centred on the scene.
    pub fn visible_region(&self) -> (Vec2, Vec2) {
        let scene_aspect = self.scene_size.x / self.scene_size.y.max(1.0);
        let mut half = self.scene_size * 0.5;
        if self.aspect_ratio > scene_aspect {
            half.x = half.y * self.aspect_ratio;
        } else {
            half.y = half.x / self.aspect_ratio.max(f32::EPSILON);
        }
        half /= self.zoom.max(0.01);

        let center = self.scene_size * 0.5 + Vec2::new(self.position.x, self.position.y);
        (center - half, center + half)
    }

    /// Get the view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        let (min, max) = self.visible_region();
        // bottom = max.y and top = min.y flip the axis so y grows downward
        Mat4::orthographic_rh(min.x, max.x, max.y, min.y, -1.0, 1.0)
    }

    pub fn update_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn set_scene_size(&mut self, scene_size: Vec2) {
        self.scene_size = scene_size;
        self.position = Vec3::ZERO;
    }

    /// Map a point in scene pixels to a fraction of the window (0..1 on both axes).
    pub fn scene_to_viewport(&self, point: Vec2) -> Vec2 {
        let (min, max) = self.visible_region();
        (point - min) / (max - min)
    }
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera_2d(camera: &Camera2D) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_aspect_shows_whole_scene() {
        let camera = Camera2D::new(Vec2::new(800.0, 400.0), 2.0);
        let (min, max) = camera.visible_region();
        assert!(min.abs_diff_eq(Vec2::ZERO, 1e-3));
        assert!(max.abs_diff_eq(Vec2::new(800.0, 400.0), 1e-3));
    }

    #[test]
    fn test_wider_window_letterboxes_horizontally() {
        let camera = Camera2D::new(Vec2::new(400.0, 400.0), 2.0);
        let (min, max) = camera.visible_region();
        assert!((max.x - min.x - 800.0).abs() < 1e-3);
        assert!((max.y - min.y - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_y_axis_points_down() {
        let camera = Camera2D::new(Vec2::new(100.0, 100.0), 1.0);
        let top = camera.view_projection().project_point3(Vec3::new(50.0, 0.0, 0.0));
        let bottom = camera.view_projection().project_point3(Vec3::new(50.0, 100.0, 0.0));
        assert!(top.y > bottom.y);
        assert!((top.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_scene_to_viewport_corners() {
        let camera = Camera2D::new(Vec2::new(560.0, 500.0), 560.0 / 500.0);
        let p = camera.scene_to_viewport(Vec2::new(560.0, 500.0));
        assert!(p.abs_diff_eq(Vec2::ONE, 1e-4));
    }
}
