//! Camera abstraction consumed by the orbit controller, plus a plain
//! perspective camera used by the viewer and in tests.

use glam::{DMat4, DVec2, DVec3, DVec4};

/// The scene camera as seen by [`crate::orbit::OrbitController`].
///
/// Mirrors what a scene-graph camera object exposes: a position, an up
/// vector, a way to orient toward a point, and the basis columns of its
/// world transform (used to turn screen-space pan deltas into world offsets).
pub trait CameraRig {
    fn position(&self) -> DVec3;
    fn set_position(&mut self, position: DVec3);
    fn up(&self) -> DVec3;
    /// Orient the camera so its view axis points at `target`.
    fn look_at(&mut self, target: DVec3);
    /// World-space right vector (column 0 of the world transform).
    fn right_basis(&self) -> DVec3;
    /// World-space up vector of the oriented camera (column 1 of the world transform).
    fn up_basis(&self) -> DVec3;
    /// Vertical field of view in degrees.
    fn fov_degrees(&self) -> f64;
}

/// Point projected onto the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Pixel coordinates, origin top-left.
    pub screen: DVec2,
    /// View-space distance along the view axis (clip `w`).
    pub depth: f64,
}

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    position: DVec3,
    up: DVec3,
    fov_degrees: f64,
    aspect: f64,
    near: f64,
    far: f64,
    world: DMat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 1.0, 1.0, 10_000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            position: DVec3::ZERO,
            up: DVec3::Y,
            fov_degrees,
            aspect,
            near,
            far,
            world: DMat4::IDENTITY,
        }
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.set_position(position);
        self
    }

    pub fn set_aspect(&mut self, aspect: f64) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn view_matrix(&self) -> DMat4 {
        self.world.inverse()
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Project a world point to viewport pixels. Points behind the camera yield `None`.
    pub fn project(&self, point: DVec3, width: f64, height: f64) -> Option<Projected> {
        let clip: DVec4 = self.projection_matrix() * self.view_matrix() * point.extend(1.0);
        if clip.w <= self.near * 0.5 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Projected {
            screen: DVec2::new((ndc.x + 1.0) * 0.5 * width, (1.0 - ndc.y) * 0.5 * height),
            depth: clip.w,
        })
    }
}

impl CameraRig for PerspectiveCamera {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn set_position(&mut self, position: DVec3) {
        self.position = position;
        self.world.w_axis = position.extend(1.0);
    }

    fn up(&self) -> DVec3 {
        self.up
    }

    fn look_at(&mut self, target: DVec3) {
        if (target - self.position).length_squared() <= f64::EPSILON {
            return;
        }
        self.world = DMat4::look_at_rh(self.position, target, self.up).inverse();
    }

    fn right_basis(&self) -> DVec3 {
        self.world.x_axis.truncate()
    }

    fn up_basis(&self) -> DVec3 {
        self.world.y_axis.truncate()
    }

    fn fov_degrees(&self) -> f64 {
        self.fov_degrees
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraRig, PerspectiveCamera};
    use glam::DVec3;

    fn assert_vec_close(actual: DVec3, expected: DVec3) {
        assert!(
            (actual - expected).length() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn look_at_builds_orthonormal_basis() {
        let mut camera = PerspectiveCamera::default().with_position(DVec3::new(0.0, 0.0, 10.0));
        camera.look_at(DVec3::ZERO);

        assert_vec_close(camera.right_basis(), DVec3::X);
        assert_vec_close(camera.up_basis(), DVec3::Y);
        assert_vec_close(camera.position(), DVec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let mut camera = PerspectiveCamera::default().with_position(DVec3::new(0.0, 800.0, 1200.0));
        camera.look_at(DVec3::ZERO);

        let projected = camera
            .project(DVec3::ZERO, 800.0, 600.0)
            .expect("target is in front of the camera");
        assert!((projected.screen.x - 400.0).abs() < 1e-6);
        assert!((projected.screen.y - 300.0).abs() < 1e-6);
        assert!((projected.depth - DVec3::new(0.0, 800.0, 1200.0).length()).abs() < 1e-6);
    }

    #[test]
    fn points_behind_camera_are_not_projected() {
        let mut camera = PerspectiveCamera::default().with_position(DVec3::new(0.0, 0.0, 10.0));
        camera.look_at(DVec3::ZERO);
        assert!(camera.project(DVec3::new(0.0, 0.0, 20.0), 100.0, 100.0).is_none());
    }
}
