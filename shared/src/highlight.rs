use crate::colors::Rgb;

/// Fill of the selected region, regardless of its status color.
pub const SELECTED_COLOR: Rgb = Rgb::new(0xff, 0x98, 0x00);
pub const HOVER_BRIGHTEN: f64 = 1.25;

/// Hover fill derived from the region's logical (target) color.
pub fn hover_color(logical: Rgb) -> Rgb {
    logical.brighten(HOVER_BRIGHTEN)
}

/// Which region is under the pointer and which one was clicked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
    hovered: Option<String>,
    selected: Option<String>,
}

impl HighlightState {
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Returns `true` if the hovered region changed.
    pub fn hover(&mut self, region: Option<&str>) -> bool {
        if self.hovered.as_deref() == region {
            return false;
        }
        self.hovered = region.map(str::to_string);
        true
    }

    /// Returns `true` if the selection changed.
    pub fn select(&mut self, region: Option<&str>) -> bool {
        if self.selected.as_deref() == region {
            return false;
        }
        self.selected = region.map(str::to_string);
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        self.select(None)
    }

    /// Color to draw `region` with. Selection wins over hover; hover is
    /// computed from the logical color so it doesn't flicker mid-transition.
    pub fn fill(&self, region: &str, displayed: Rgb, logical: Option<Rgb>) -> Rgb {
        if self.selected.as_deref() == Some(region) {
            return SELECTED_COLOR;
        }
        if self.hovered.as_deref() == Some(region) {
            return hover_color(logical.unwrap_or(displayed));
        }
        displayed
    }
}

#[cfg(test)]
mod tests {
    use super::{HighlightState, SELECTED_COLOR, hover_color};
    use crate::colors::Rgb;

    const BLUE: Rgb = Rgb::new(0x56, 0x98, 0xc3);
    const AMBER: Rgb = Rgb::new(0xff, 0xc1, 0x07);

    #[test]
    fn hover_and_select_report_changes() {
        let mut state = HighlightState::default();
        assert!(state.hover(Some("A")));
        assert!(!state.hover(Some("A")));
        assert!(state.select(Some("B")));
        assert!(!state.select(Some("B")));
        assert!(state.clear_selection());
        assert_eq!(state.selected(), None);
        assert_eq!(state.hovered(), Some("A"));
    }

    #[test]
    fn fill_prefers_selection_over_hover() {
        let mut state = HighlightState::default();
        state.hover(Some("A"));
        state.select(Some("A"));
        assert_eq!(state.fill("A", BLUE, Some(BLUE)), SELECTED_COLOR);
    }

    #[test]
    fn hover_fill_follows_logical_color() {
        let mut state = HighlightState::default();
        state.hover(Some("A"));
        // Mid-transition: displayed is still blue but the region is heading to amber.
        assert_eq!(state.fill("A", BLUE, Some(AMBER)), hover_color(AMBER));
        assert_eq!(state.fill("B", BLUE, Some(AMBER)), BLUE);
    }
}
