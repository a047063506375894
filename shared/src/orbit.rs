//! Orbit camera controller.
//!
//! The camera sits on a sphere around a look-at `target`. Pointer input only
//! accumulates deltas (angles and a pan offset); [`OrbitController::apply`]
//! folds them into the spherical position once, clamps it, and rebuilds the
//! camera's Cartesian position from `target + spherical`. The spherical
//! coordinates are the single source of truth, so repeated input never drifts.

use std::f64::consts::{PI, TAU};

use glam::{DQuat, DVec2, DVec3};
use serde::Deserialize;
use tracing::debug;

use crate::camera::CameraRig;

/// Polar angle margin keeping the camera off the poles (no gimbal flip).
pub const POLAR_EPSILON: f64 = 1e-6;

/// Multiplicative radius step for one dolly notch.
pub const DOLLY_STEP: f64 = 1.1;

/// Radius, polar angle from +Y (`phi`) and azimuth around +Y from +Z (`theta`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f64,
    pub phi: f64,
    pub theta: f64,
}

impl Spherical {
    pub fn new(radius: f64, phi: f64, theta: f64) -> Self {
        Self { radius, phi, theta }
    }

    pub fn from_offset(offset: DVec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::new(0.0, 0.0, 0.0);
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> DVec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        DVec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Clamp polar angle to `[POLAR_EPSILON, PI - POLAR_EPSILON]` and radius to
    /// `[min_distance, max_distance]`. Never panics on inverted bounds.
    pub fn clamped(self, min_distance: f64, max_distance: f64) -> Self {
        Self {
            radius: self.radius.max(min_distance).min(max_distance),
            phi: self.phi.max(POLAR_EPSILON).min(PI - POLAR_EPSILON),
            theta: self.theta,
        }
    }
}

/// Mouse button that started a drag, in DOM `MouseEvent.button` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
}

impl PointerButton {
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            1 => Some(Self::Auxiliary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Dolly,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    mode: DragMode,
    last: DVec2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SphericalDelta {
    theta: f64,
    phi: f64,
}

#[derive(Debug, Clone, Copy)]
struct SavedState {
    target: DVec3,
    spherical: Spherical,
}

/// Tuning for [`OrbitController`]. Every field has a default, so partial JSON works.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f64,
    pub pan_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub auto_rotate: bool,
    /// 2.0 is one revolution per 30 seconds at 60 fps.
    pub auto_rotate_speed: f64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f64::INFINITY,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
        }
    }
}

pub struct OrbitController<C: CameraRig> {
    camera: C,
    config: OrbitConfig,
    target: DVec3,
    spherical: Spherical,
    spherical_delta: SphericalDelta,
    pan_offset: DVec3,
    drag: Option<DragState>,
    viewport: DVec2,
    /// Rotates camera-up onto +Y so spherical math can assume a Y-up world.
    up_to_y: DQuat,
    saved: SavedState,
}

impl<C: CameraRig> OrbitController<C> {
    /// Take ownership of `camera` and orbit it around the origin.
    pub fn new(camera: C, config: OrbitConfig) -> Self {
        Self::with_target(camera, config, DVec3::ZERO)
    }

    pub fn with_target(camera: C, config: OrbitConfig, target: DVec3) -> Self {
        let up_to_y = camera
            .up()
            .try_normalize()
            .map(|up| DQuat::from_rotation_arc(up, DVec3::Y))
            .unwrap_or(DQuat::IDENTITY);
        let spherical = Spherical::from_offset(up_to_y * (camera.position() - target))
            .clamped(config.min_distance, config.max_distance);

        let mut controller = Self {
            camera,
            config,
            target,
            spherical,
            spherical_delta: SphericalDelta::default(),
            pan_offset: DVec3::ZERO,
            drag: None,
            viewport: DVec2::ZERO,
            up_to_y,
            saved: SavedState { target, spherical },
        };
        controller.sync_camera();
        controller
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut OrbitConfig {
        &mut self.config
    }

    pub fn target(&self) -> DVec3 {
        self.target
    }

    pub fn spherical(&self) -> Spherical {
        self.spherical
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|drag| drag.mode)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Viewport size in CSS pixels. Rotation and pan scale by the height.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport = DVec2::new(width, height);
    }

    /// Start a drag. Returns `false` (and changes nothing) when the controller or
    /// the capability bound to `button` is disabled.
    pub fn begin_drag(&mut self, button: PointerButton, point: DVec2) -> bool {
        if !self.config.enabled {
            return false;
        }
        let mode = match button {
            PointerButton::Primary if self.config.enable_rotate => DragMode::Rotate,
            PointerButton::Auxiliary if self.config.enable_zoom => DragMode::Dolly,
            PointerButton::Secondary if self.config.enable_pan => DragMode::Pan,
            _ => return false,
        };
        debug!(?mode, x = point.x, y = point.y, "orbit drag started");
        self.drag = Some(DragState { mode, last: point });
        true
    }

    /// Feed the current pointer position of an active drag. Deltas are taken
    /// against the previous call, not the drag origin.
    pub fn drag_move(&mut self, point: DVec2) {
        if !self.config.enabled {
            return;
        }
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let delta = point - drag.last;
        drag.last = point;
        let mode = drag.mode;

        match mode {
            DragMode::Rotate => self.rotate_by(delta),
            DragMode::Pan => self.pan_by(delta),
            DragMode::Dolly => {
                if delta.y > 0.0 {
                    self.dolly_out();
                } else if delta.y < 0.0 {
                    self.dolly_in();
                }
            }
        }
        self.apply();
    }

    /// Always clears the drag, even when disabled, so a release can never leave
    /// the controller stuck mid-drag.
    pub fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!(mode = ?drag.mode, "orbit drag ended");
        }
    }

    pub fn wheel(&mut self, delta_y: f64) {
        if !self.config.enabled || !self.config.enable_zoom {
            return;
        }
        if delta_y < 0.0 {
            self.dolly_in();
        } else if delta_y > 0.0 {
            self.dolly_out();
        }
        self.apply();
    }

    /// Accumulate a screen-space rotation. Applied on the next [`Self::apply`].
    pub fn rotate_by(&mut self, delta: DVec2) {
        let height = self.viewport.y;
        if height <= 0.0 {
            return;
        }
        let delta = delta * self.config.rotate_speed;
        self.spherical_delta.theta -= TAU * delta.x / height;
        self.spherical_delta.phi -= TAU * delta.y / height;
    }

    /// Accumulate a screen-space pan. The world offset scales with the visible
    /// height at the target distance, so content tracks the pointer at any zoom.
    pub fn pan_by(&mut self, delta: DVec2) {
        let height = self.viewport.y;
        if height <= 0.0 {
            return;
        }
        let delta = delta * self.config.pan_speed;
        let half_fov = (self.camera.fov_degrees() / 2.0).to_radians();
        let target_distance = (self.camera.position() - self.target).length() * half_fov.tan();

        let pan_left = self.camera.right_basis() * (-2.0 * delta.x * target_distance / height);
        let pan_up = self.camera.up_basis() * (2.0 * delta.y * target_distance / height);
        self.pan_offset += pan_left + pan_up;
    }

    /// Move away from the target by one step.
    pub fn dolly_out(&mut self) {
        self.spherical.radius *= DOLLY_STEP;
    }

    /// Move toward the target by one step.
    pub fn dolly_in(&mut self) {
        self.spherical.radius /= DOLLY_STEP;
    }

    /// Fold pending input into the rig and reposition the camera. Called once per
    /// rendered frame and after every drag move.
    pub fn apply(&mut self) {
        if self.config.enabled && self.config.auto_rotate && self.drag.is_none() {
            self.spherical_delta.theta -= self.auto_rotation_angle();
        }

        self.spherical.theta += self.spherical_delta.theta;
        self.spherical.phi += self.spherical_delta.phi;
        self.spherical = self
            .spherical
            .clamped(self.config.min_distance, self.config.max_distance);

        self.target += self.pan_offset;
        self.sync_camera();

        self.spherical_delta = SphericalDelta::default();
        self.pan_offset = DVec3::ZERO;
    }

    fn sync_camera(&mut self) {
        let offset = self.up_to_y.inverse() * self.spherical.to_offset();
        self.camera.set_position(self.target + offset);
        self.camera.look_at(self.target);
    }

    /// Remember the current target and spherical position for [`Self::reset`].
    pub fn save_state(&mut self) {
        self.saved = SavedState {
            target: self.target,
            spherical: self.spherical,
        };
    }

    /// Return to the last saved view, dropping pending input and any drag.
    pub fn reset(&mut self) {
        self.target = self.saved.target;
        self.spherical = self.saved.spherical;
        self.spherical_delta = SphericalDelta::default();
        self.pan_offset = DVec3::ZERO;
        self.drag = None;
        self.apply();
        debug!("orbit view reset");
    }

    fn auto_rotation_angle(&self) -> f64 {
        TAU / 60.0 / 60.0 * self.config.auto_rotate_speed
    }
}
