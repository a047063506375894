use std::collections::HashMap;

use smartcenter_shared::{RegionSurface, Rgb};

/// Per-district fill colors as last pushed by the animator. The canvas
/// renderer reads from here; nothing else writes to it.
#[derive(Debug, Default)]
pub struct FillBuffer {
    fills: HashMap<String, Rgb>,
    changed: bool,
}

impl FillBuffer {
    pub fn fill(&self, region: &str) -> Option<Rgb> {
        self.fills.get(region).copied()
    }

    /// Whether any color changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

impl RegionSurface for FillBuffer {
    fn set_region_color(&mut self, region: &str, color: Rgb) {
        match self.fills.get_mut(region) {
            Some(existing) if *existing == color => {}
            Some(existing) => {
                *existing = color;
                self.changed = true;
            }
            None => {
                self.fills.insert(region.to_string(), color);
                self.changed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use smartcenter_shared::{ColorAnimator, RegionSurface, Rgb};

    use super::FillBuffer;

    #[test]
    fn repeated_color_does_not_mark_changed() {
        let mut buffer = FillBuffer::default();
        buffer.set_region_color("A", Rgb::new(1, 2, 3));
        assert!(buffer.take_changed());
        assert!(!buffer.take_changed());

        buffer.set_region_color("A", Rgb::new(1, 2, 3));
        assert!(!buffer.take_changed());
        buffer.set_region_color("A", Rgb::new(9, 2, 3));
        assert!(buffer.take_changed());
        assert_eq!(buffer.fill("A"), Some(Rgb::new(9, 2, 3)));
    }

    #[test]
    fn animator_settles_into_buffer() {
        let mut buffer = FillBuffer::default();
        let mut animator = ColorAnimator::default();
        animator
            .set_color_hex("A", "#5698c3", &mut buffer)
            .expect("valid color");
        animator
            .start_transition_hex("A", "#ffc107", &mut buffer)
            .expect("valid color");
        for _ in 0..120 {
            animator.tick(&mut buffer);
        }
        assert_eq!(buffer.fill("A"), Some(Rgb::new(0xff, 0xc1, 0x07)));
        assert!(!animator.is_animating());
    }
}
