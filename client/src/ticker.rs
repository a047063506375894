use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::{Interval, Timeout};
use smartcenter_shared::animation::TICKS_PER_SECOND;

/// Drives the color animator at a fixed 60 Hz while any district is
/// transitioning. The interval is torn down once everything has settled and
/// rebuilt by the next [`AnimationTicker::ensure_running`].
pub struct AnimationTicker {
    state: Rc<RefCell<TickerState>>,
    on_tick: Rc<dyn Fn() -> bool>,
}

#[derive(Default)]
struct TickerState {
    interval: Option<Interval>,
    stop_requested: bool,
}

impl AnimationTicker {
    /// `on_tick` advances the animation by one step and returns whether any
    /// transition is still running.
    pub fn new(on_tick: impl Fn() -> bool + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(TickerState::default())),
            on_tick: Rc::new(on_tick),
        }
    }

    pub fn ensure_running(&self) {
        let mut state = self.state.borrow_mut();
        // A new transition arriving between the last tick and the deferred
        // stop keeps the current interval alive.
        state.stop_requested = false;
        if state.interval.is_some() {
            return;
        }

        let weak = Rc::downgrade(&self.state);
        let on_tick = Rc::clone(&self.on_tick);
        state.interval = Some(Interval::new(tick_interval_ms(), move || {
            if !on_tick() {
                request_stop(&weak);
            }
        }));
    }
}

/// Nearest whole millisecond to one tick, so a transition's wall time stays
/// close to `ticks / TICKS_PER_SECOND` seconds.
fn tick_interval_ms() -> u32 {
    (1000.0 / f64::from(TICKS_PER_SECOND)).round() as u32
}

/// Dropping an `Interval` cancels it, which can't happen inside its own
/// callback, so the drop runs from a zero-delay timeout instead.
fn request_stop(state: &Weak<RefCell<TickerState>>) {
    let Some(shared) = state.upgrade() else {
        return;
    };
    {
        let mut shared = shared.borrow_mut();
        if shared.stop_requested {
            return;
        }
        shared.stop_requested = true;
    }

    let state = state.clone();
    Timeout::new(0, move || {
        let Some(shared) = state.upgrade() else {
            return;
        };
        let mut shared = shared.borrow_mut();
        if shared.stop_requested {
            shared.stop_requested = false;
            shared.interval = None;
        }
    })
    .forget();
}

#[cfg(test)]
mod tests {
    use super::tick_interval_ms;

    #[test]
    fn interval_rounds_to_nearest_millisecond() {
        assert_eq!(tick_interval_ms(), 17);
    }
}
