use glam::{DVec2, DVec3};
use serde::Deserialize;
use smartcenter_shared::animation::AnimatorConfig;
use smartcenter_shared::orbit::PointerButton;
use smartcenter_shared::{
    ColorAnimator, HighlightState, OrbitConfig, OrbitController, PerspectiveCamera, Rgb,
    StatusMap, StatusUpdate, TransitionOutcome,
};

use crate::scene::{self, DistrictTile, ProjectedTile};
use crate::surface::FillBuffer;

const CAMERA_FOV_DEGREES: f64 = 75.0;
const CAMERA_NEAR: f64 = 0.1;
const CAMERA_FAR: f64 = 10_000.0;
const CAMERA_HOME: DVec3 = DVec3::new(0.0, 800.0, 1200.0);

/// Pointer travel (CSS px) below which a primary press counts as a click.
const CLICK_SLOP_PX: f64 = 4.0;

/// Tuning read from the canvas `data-config` attribute. Missing fields keep
/// their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub orbit: OrbitConfig,
    pub animation: AnimatorConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            orbit: OrbitConfig {
                min_distance: 100.0,
                max_distance: 2000.0,
                ..OrbitConfig::default()
            },
            animation: AnimatorConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Everything the district map mutates, owned in one place and handed to the
/// DOM callbacks behind a single `Rc<RefCell<_>>`.
pub struct Viewer {
    controller: OrbitController<PerspectiveCamera>,
    animator: ColorAnimator,
    highlight: HighlightState,
    fills: FillBuffer,
    tiles: Vec<DistrictTile>,
    projected: Vec<ProjectedTile>,
    viewport: DVec2,
    press_origin: Option<DVec2>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let camera = PerspectiveCamera::new(CAMERA_FOV_DEGREES, 1.0, CAMERA_NEAR, CAMERA_FAR)
            .with_position(CAMERA_HOME);
        Self {
            controller: OrbitController::new(camera, config.orbit),
            animator: ColorAnimator::new(config.animation),
            highlight: HighlightState::default(),
            fills: FillBuffer::default(),
            tiles: Vec::new(),
            projected: Vec::new(),
            viewport: DVec2::ZERO,
            press_origin: None,
        }
    }

    pub fn controller(&self) -> &OrbitController<PerspectiveCamera> {
        &self.controller
    }

    pub fn animator(&self) -> &ColorAnimator {
        &self.animator
    }

    pub fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    pub fn projected(&self) -> &[ProjectedTile] {
        &self.projected
    }

    pub fn viewport(&self) -> DVec2 {
        self.viewport
    }

    pub fn district_count(&self) -> usize {
        self.tiles.len()
    }

    /// Color to paint `district` with this frame, highlight included.
    pub fn fill_for(&self, district: &str) -> Option<Rgb> {
        let displayed = self
            .fills
            .fill(district)
            .or_else(|| self.animator.displayed(district))?;
        Some(
            self.highlight
                .fill(district, displayed, self.animator.logical(district)),
        )
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = DVec2::new(width, height);
        self.controller.set_viewport_size(width, height);
        if height > 0.0 {
            self.controller.camera_mut().set_aspect(width / height);
        }
    }

    /// Replace every district color with the server's full map. Districts not
    /// in the map are dropped from the scene.
    pub fn seed(&mut self, statuses: &StatusMap) {
        let ids: Vec<&str> = statuses.keys().map(String::as_str).collect();
        self.tiles = scene::layout_grid(&ids);
        for (district, state) in statuses {
            if let Err(e) = self
                .animator
                .set_color_hex(district, &state.color, &mut self.fills)
            {
                log_warn(&format!("district {district}: {e}"));
            }
        }
    }

    /// Start easing `update.district` toward its new color. Unknown districts
    /// join the scene first. Returns `true` if a transition is now running.
    pub fn apply_update(&mut self, update: &StatusUpdate) -> bool {
        if !self.tiles.iter().any(|tile| tile.id == update.district) {
            let mut ids: Vec<String> = self.tiles.iter().map(|tile| tile.id.clone()).collect();
            ids.push(update.district.clone());
            self.tiles = scene::layout_grid(&ids);
        }

        match self
            .animator
            .start_transition_hex(&update.district, &update.color, &mut self.fills)
        {
            Ok(TransitionOutcome::Started { .. }) => true,
            Ok(_) => false,
            Err(e) => {
                log_warn(&format!("district {}: {e}", update.district));
                false
            }
        }
    }

    /// One animation step. Returns whether transitions are still running.
    pub fn tick(&mut self) -> bool {
        self.animator.tick(&mut self.fills);
        self.animator.is_animating()
    }

    /// Whether any district fill changed since the last call.
    pub fn take_repaint(&mut self) -> bool {
        self.fills.take_changed()
    }

    /// Fold pending camera input and reproject. Returns `true` when the next
    /// frame must be drawn even without new input.
    pub fn frame(&mut self) -> bool {
        self.controller.apply();
        self.projected = scene::project_tiles(
            self.controller.camera(),
            &self.tiles,
            self.viewport.x,
            self.viewport.y,
        );
        self.controller.config().auto_rotate
    }

    /// Returns `true` if the press started a drag and document listeners are
    /// needed until release.
    pub fn pointer_down(&mut self, button: i16, point: DVec2) -> bool {
        let Some(button) = PointerButton::from_dom(button) else {
            return false;
        };
        let started = self.controller.begin_drag(button, point);
        self.press_origin = (started && button == PointerButton::Primary).then_some(point);
        started
    }

    pub fn pointer_drag(&mut self, point: DVec2) {
        self.controller.drag_move(point);
    }

    /// Ends the drag. A primary press that barely moved selects the district
    /// under the pointer, or clears the selection over empty ground.
    pub fn pointer_up(&mut self, point: DVec2) {
        self.controller.end_drag();
        let Some(origin) = self.press_origin.take() else {
            return;
        };
        if origin.distance(point) > CLICK_SLOP_PX {
            return;
        }
        let hit = scene::hit_test(&self.projected, point).map(str::to_string);
        self.highlight.select(hit.as_deref());
    }

    /// Hover tracking while no drag is active. Returns `true` if the hovered
    /// district changed.
    pub fn pointer_hover(&mut self, point: Option<DVec2>) -> bool {
        if self.controller.is_dragging() {
            return false;
        }
        let hit = point
            .and_then(|point| scene::hit_test(&self.projected, point))
            .map(str::to_string);
        self.highlight.hover(hit.as_deref())
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.controller.wheel(delta_y);
    }

    pub fn reset_view(&mut self) {
        self.controller.reset();
    }
}

fn log_warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

#[cfg(test)]
mod tests {
    use glam::DVec2;
    use smartcenter_shared::{
        DistrictState, DistrictStatus, Rgb, StatusMap, StatusUpdate, WARNING_COLOR,
    };

    use super::{Viewer, ViewerConfig};

    fn statuses(ids: &[&str]) -> StatusMap {
        ids.iter()
            .map(|id| (id.to_string(), DistrictState::new(DistrictStatus::Normal)))
            .collect()
    }

    fn warning(district: &str) -> StatusUpdate {
        StatusUpdate {
            district: district.to_string(),
            status: DistrictStatus::Warning,
            color: WARNING_COLOR.to_hex(),
        }
    }

    fn viewer() -> Viewer {
        let mut viewer = Viewer::new(ViewerConfig::default());
        viewer.resize(800.0, 600.0);
        viewer.seed(&statuses(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]));
        viewer.frame();
        viewer
    }

    #[test]
    fn seed_lays_out_and_colors_every_district() {
        let viewer = viewer();
        assert_eq!(viewer.district_count(), 9);
        assert_eq!(viewer.fill_for("E"), Some(Rgb::new(0x56, 0x98, 0xc3)));
        assert_eq!(viewer.projected().len(), 9);
    }

    #[test]
    fn status_update_animates_until_settled() {
        let mut viewer = viewer();
        assert!(viewer.apply_update(&warning("B")));
        assert!(viewer.animator().is_animating());

        let mut running = true;
        for _ in 0..120 {
            running = viewer.tick();
        }
        assert!(!running);
        assert_eq!(viewer.fill_for("B"), Some(WARNING_COLOR));
    }

    #[test]
    fn repeated_update_does_not_restart() {
        let mut viewer = viewer();
        assert!(viewer.apply_update(&warning("B")));
        assert!(!viewer.apply_update(&warning("B")));
    }

    #[test]
    fn malformed_update_color_is_ignored() {
        let mut viewer = viewer();
        let mut update = warning("C");
        update.color = "#ffc1".to_string();
        assert!(!viewer.apply_update(&update));
        assert_eq!(viewer.fill_for("C"), Some(Rgb::new(0x56, 0x98, 0xc3)));
    }

    #[test]
    fn update_for_new_district_extends_scene() {
        let mut viewer = viewer();
        viewer.apply_update(&warning("J"));
        assert_eq!(viewer.district_count(), 10);
        // New districts start from the initial color, so they animate too.
        assert!(viewer.animator().transition("J").is_some());
    }

    #[test]
    fn click_selects_and_drag_does_not() {
        let mut viewer = viewer();
        let center = DVec2::new(400.0, 300.0);
        let hit = crate::scene::hit_test(viewer.projected(), center).map(str::to_string);
        assert!(hit.is_some());

        assert!(viewer.pointer_down(0, center));
        viewer.pointer_up(center + DVec2::new(1.0, 1.0));
        assert_eq!(viewer.highlight().selected(), hit.as_deref());

        assert!(viewer.pointer_down(0, center));
        viewer.pointer_drag(center + DVec2::new(80.0, 0.0));
        viewer.pointer_up(center + DVec2::new(80.0, 0.0));
        assert_eq!(viewer.highlight().selected(), hit.as_deref());
    }

    #[test]
    fn click_on_empty_ground_clears_selection() {
        let mut viewer = viewer();
        let center = DVec2::new(400.0, 300.0);
        viewer.pointer_down(0, center);
        viewer.pointer_up(center);
        assert!(viewer.highlight().selected().is_some());

        let corner = DVec2::new(1.0, 1.0);
        viewer.pointer_down(0, corner);
        viewer.pointer_up(corner);
        assert_eq!(viewer.highlight().selected(), None);
    }

    #[test]
    fn hover_is_suspended_while_dragging() {
        let mut viewer = viewer();
        let center = DVec2::new(400.0, 300.0);
        assert!(viewer.pointer_hover(Some(center)));
        assert!(!viewer.pointer_hover(Some(center)));

        viewer.pointer_down(2, center);
        assert!(!viewer.pointer_hover(None));
        viewer.pointer_up(center);
        assert!(viewer.pointer_hover(None));
    }

    #[test]
    fn unknown_button_is_ignored() {
        let mut viewer = viewer();
        assert!(!viewer.pointer_down(7, DVec2::ZERO));
        assert!(!viewer.controller().is_dragging());
    }

    #[test]
    fn config_reads_partial_json() {
        let config = ViewerConfig::from_json(r#"{"orbit": {"auto_rotate": true}}"#)
            .expect("valid config");
        assert!(config.orbit.auto_rotate);
        assert_eq!(config.animation.duration_ticks, 120);
        assert!(ViewerConfig::from_json("{").is_err());
    }
}
