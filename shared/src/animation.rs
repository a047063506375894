use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::colors::{ColorParseError, Rgb, ease_in_out_cubic};
use crate::events::NORMAL_COLOR;

pub const TICKS_PER_SECOND: u32 = 60;
/// 2.0 seconds at [`TICKS_PER_SECOND`].
pub const DEFAULT_TRANSITION_TICKS: u32 = 120;

/// Cancellation token of one running transition. Replacing a region's
/// transition retires its id; a retired id never comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(u64);

/// Where animated colors end up. Implemented by the renderer.
pub trait RegionSurface {
    fn set_region_color(&mut self, region: &str, color: Rgb);

    /// Called once when a transition lands on its exact target. Dependent
    /// state (hover fill and the like) should be recomputed here.
    fn transition_settled(&mut self, region: &str, color: Rgb) {
        self.set_region_color(region, color);
    }
}

/// A color transition for one region, timed in animator ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransition {
    pub id: TransitionId,
    pub from: Rgb,
    pub to: Rgb,
    pub started_at: u64,
    pub duration_ticks: u32,
}

impl ColorTransition {
    /// Linear progress in `0.0..=1.0`.
    pub fn progress(&self, now: u64) -> f64 {
        if self.duration_ticks == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed as f64 / self.duration_ticks as f64).min(1.0)
    }

    pub fn color_at(&self, now: u64) -> Rgb {
        self.from.lerp(self.to, ease_in_out_cubic(self.progress(now)))
    }

    pub fn is_complete(&self, now: u64) -> bool {
        now.saturating_sub(self.started_at) >= self.duration_ticks as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Target already is the region's logical color.
    Unchanged,
    /// No valid color to animate from (or nothing to animate); target shown directly.
    Snapped,
    Started {
        id: TransitionId,
        superseded: Option<TransitionId>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub duration_ticks: u32,
    /// Displayed color of a region before anything was reported for it.
    pub initial_color: Rgb,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            duration_ticks: DEFAULT_TRANSITION_TICKS,
            initial_color: NORMAL_COLOR,
        }
    }
}

#[derive(Debug, Clone)]
struct RegionColor {
    /// The color the region is heading to. `None` means no valid color.
    logical: Option<Rgb>,
    displayed: Option<Rgb>,
    transition: Option<ColorTransition>,
}

/// Per-region color state with at most one running transition per region.
#[derive(Debug, Clone, Default)]
pub struct ColorAnimator {
    config: AnimatorConfig,
    regions: HashMap<String, RegionColor>,
    clock: u64,
    next_id: u64,
}

impl ColorAnimator {
    pub fn new(config: AnimatorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    /// Show `color` immediately, cancelling any running transition.
    /// `None` records that the region currently has no valid color.
    pub fn set_color(
        &mut self,
        region: &str,
        color: Option<Rgb>,
        surface: &mut impl RegionSurface,
    ) {
        let entry = self.entry(region);
        entry.transition = None;
        entry.logical = color;
        entry.displayed = color;
        if let Some(color) = color {
            surface.transition_settled(region, color);
        }
    }

    /// [`Self::set_color`] from a `#rrggbb` string. A malformed string leaves
    /// the region without a valid color and reports the parse error.
    pub fn set_color_hex(
        &mut self,
        region: &str,
        hex: &str,
        surface: &mut impl RegionSurface,
    ) -> Result<(), ColorParseError> {
        match Rgb::from_hex(hex) {
            Ok(color) => {
                self.set_color(region, Some(color), surface);
                Ok(())
            }
            Err(e) => {
                self.set_color(region, None, surface);
                Err(e)
            }
        }
    }

    /// Start animating `region` toward `target` from whatever is displayed now.
    ///
    /// The logical color switches to `target` right away. A transition already
    /// running for the region is replaced, so timing restarts from the current
    /// interpolated color.
    pub fn start_transition(
        &mut self,
        region: &str,
        target: Rgb,
        surface: &mut impl RegionSurface,
    ) -> TransitionOutcome {
        let now = self.clock;
        let duration_ticks = self.config.duration_ticks;
        let id = TransitionId(self.next_id);
        let entry = self.entry(region);

        if entry.logical == Some(target) {
            return TransitionOutcome::Unchanged;
        }
        entry.logical = Some(target);

        let from = match entry.displayed {
            Some(from) if from != target && duration_ticks > 0 => from,
            _ => {
                entry.transition = None;
                entry.displayed = Some(target);
                surface.transition_settled(region, target);
                debug!(region, color = %target, "region color snapped");
                return TransitionOutcome::Snapped;
            }
        };

        let superseded = entry
            .transition
            .replace(ColorTransition {
                id,
                from,
                to: target,
                started_at: now,
                duration_ticks,
            })
            .map(|previous| previous.id);
        self.next_id += 1;

        debug!(
            region,
            from = %from,
            to = %target,
            ?superseded,
            "region color transition started"
        );
        TransitionOutcome::Started { id, superseded }
    }

    /// Parse `hex` and start a transition. Malformed targets are rejected
    /// without touching the region.
    pub fn start_transition_hex(
        &mut self,
        region: &str,
        hex: &str,
        surface: &mut impl RegionSurface,
    ) -> Result<TransitionOutcome, ColorParseError> {
        let target = Rgb::from_hex(hex)?;
        Ok(self.start_transition(region, target, surface))
    }

    /// Advance every running transition by one tick and push the new colors.
    /// Returns how many transitions are still running.
    pub fn tick(&mut self, surface: &mut impl RegionSurface) -> usize {
        self.clock += 1;
        let now = self.clock;
        let mut running = 0;

        for (region, entry) in self.regions.iter_mut() {
            let Some(transition) = entry.transition else {
                continue;
            };
            if transition.is_complete(now) {
                // Land on the exact target rather than the last interpolated value.
                entry.transition = None;
                entry.displayed = Some(transition.to);
                surface.transition_settled(region, transition.to);
                trace!(region = region.as_str(), color = %transition.to, "region color settled");
            } else {
                let color = transition.color_at(now);
                entry.displayed = Some(color);
                surface.set_region_color(region, color);
                running += 1;
            }
        }
        running
    }

    pub fn is_animating(&self) -> bool {
        self.regions.values().any(|entry| entry.transition.is_some())
    }

    pub fn active_transitions(&self) -> usize {
        self.regions
            .values()
            .filter(|entry| entry.transition.is_some())
            .count()
    }

    pub fn transition(&self, region: &str) -> Option<&ColorTransition> {
        self.regions.get(region)?.transition.as_ref()
    }

    pub fn displayed(&self, region: &str) -> Option<Rgb> {
        self.regions.get(region)?.displayed
    }

    pub fn logical(&self, region: &str) -> Option<Rgb> {
        self.regions.get(region)?.logical
    }

    /// Every known region with its displayed color.
    pub fn regions(&self) -> impl Iterator<Item = (&str, Option<Rgb>)> {
        self.regions
            .iter()
            .map(|(region, entry)| (region.as_str(), entry.displayed))
    }

    fn entry(&mut self, region: &str) -> &mut RegionColor {
        let initial = self.config.initial_color;
        self.regions
            .entry(region.to_string())
            .or_insert_with(|| RegionColor {
                logical: Some(initial),
                displayed: Some(initial),
                transition: None,
            })
    }
}
