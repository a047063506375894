use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces redraw requests into at most one `requestAnimationFrame` per
/// vsync. The frame callback returns `true` to keep the loop running on its
/// own (auto-rotate), `false` to go idle until the next [`Self::request`].
pub struct FrameScheduler {
    shared: Rc<FrameState>,
}

struct FrameState {
    window: Option<web_sys::Window>,
    pending: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameState {
    fn schedule(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return;
        };
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(id) => self.pending.set(Some(id)),
            Err(e) => web_sys::console::warn_2(&"requestAnimationFrame failed".into(), &e),
        }
    }
}

impl FrameScheduler {
    pub fn new(mut draw: impl FnMut() -> bool + 'static) -> Self {
        let shared = Rc::new(FrameState {
            window: web_sys::window(),
            pending: Cell::new(None),
            callback: RefCell::new(None),
        });

        let frame_state = Rc::downgrade(&shared);
        let callback = Closure::<dyn FnMut()>::new(move || {
            let Some(state) = frame_state.upgrade() else {
                return;
            };
            state.pending.set(None);
            if draw() {
                state.schedule();
            }
        });
        *shared.callback.borrow_mut() = Some(callback);

        Self { shared }
    }

    /// Ask for a redraw on the next frame. Repeated calls before that frame
    /// are free.
    pub fn request(&self) {
        self.shared.schedule();
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.shared.pending.take()
            && let Some(window) = self.shared.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.shared.callback.borrow_mut().take();
    }
}
