use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::DVec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Event, EventTarget, HtmlCanvasElement, MouseEvent,
    WheelEvent,
};

use crate::render_loop::FrameScheduler;
use crate::viewer::Viewer;

/// One registered DOM listener, removed again on drop.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(
        target: &EventTarget,
        event: &'static str,
        passive: Option<bool>,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(callback);
        match passive {
            Some(passive) => {
                let options = AddEventListenerOptions::new();
                options.set_passive(passive);
                target.add_event_listener_with_callback_and_add_event_listener_options(
                    event,
                    callback.as_ref().unchecked_ref(),
                    &options,
                )?;
            }
            None => {
                target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?
            }
        }
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Pointer position relative to the canvas, in CSS pixels.
fn canvas_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> DVec2 {
    let rect = canvas.get_bounding_client_rect();
    DVec2::new(
        event.client_x() as f64 - rect.left(),
        event.client_y() as f64 - rect.top(),
    )
}

/// `mousemove`/`mouseup` on the document, present only while a drag is in
/// progress so a release outside the canvas still ends it.
struct DocumentDrag {
    document: Document,
    attached: Cell<bool>,
    on_move: Closure<dyn FnMut(Event)>,
    on_up: Closure<dyn FnMut(Event)>,
}

impl DocumentDrag {
    fn new(
        document: Document,
        canvas: HtmlCanvasElement,
        viewer: Rc<RefCell<Viewer>>,
        frames: Rc<FrameScheduler>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let move_canvas = canvas.clone();
            let move_viewer = Rc::clone(&viewer);
            let move_frames = Rc::clone(&frames);
            let on_move = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                move_viewer
                    .borrow_mut()
                    .pointer_drag(canvas_point(&move_canvas, event));
                move_frames.request();
            });

            let this = this.clone();
            let on_up = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    viewer.borrow_mut().pointer_up(canvas_point(&canvas, event));
                }
                if let Some(drag) = this.upgrade() {
                    drag.detach();
                }
                frames.request();
            });

            Self {
                document,
                attached: Cell::new(false),
                on_move,
                on_up,
            }
        })
    }

    fn attach(&self) {
        if self.attached.replace(true) {
            return;
        }
        for (event, callback) in [("mousemove", &self.on_move), ("mouseup", &self.on_up)] {
            if let Err(e) = self
                .document
                .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            {
                web_sys::console::warn_2(&format!("failed to listen for {event}").into(), &e);
            }
        }
    }

    fn detach(&self) {
        if !self.attached.replace(false) {
            return;
        }
        for (event, callback) in [("mousemove", &self.on_move), ("mouseup", &self.on_up)] {
            let _ = self
                .document
                .remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
        }
    }
}

impl Drop for DocumentDrag {
    fn drop(&mut self) {
        self.detach();
    }
}

/// All pointer and window input for the district map.
pub struct MapInput {
    _listeners: Vec<Listener>,
    drag: Rc<DocumentDrag>,
}

impl MapInput {
    pub fn install(
        document: Document,
        canvas: HtmlCanvasElement,
        viewer: Rc<RefCell<Viewer>>,
        frames: Rc<FrameScheduler>,
    ) -> Result<Self, JsValue> {
        let drag = DocumentDrag::new(
            document.clone(),
            canvas.clone(),
            Rc::clone(&viewer),
            Rc::clone(&frames),
        );
        let target: &EventTarget = canvas.as_ref();
        let mut listeners = Vec::new();

        listeners.push({
            let (canvas, viewer, frames, drag) = (
                canvas.clone(),
                Rc::clone(&viewer),
                Rc::clone(&frames),
                Rc::clone(&drag),
            );
            Listener::new(target, "mousedown", None, move |event: Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let point = canvas_point(&canvas, event);
                let started = viewer.borrow_mut().pointer_down(event.button(), point);
                if started {
                    event.prevent_default();
                    drag.attach();
                    frames.request();
                }
            })?
        });

        listeners.push({
            let (canvas, viewer, frames) = (canvas.clone(), Rc::clone(&viewer), Rc::clone(&frames));
            Listener::new(target, "mousemove", None, move |event: Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let point = canvas_point(&canvas, event);
                let (changed, over_district) = {
                    let mut viewer = viewer.borrow_mut();
                    let changed = viewer.pointer_hover(Some(point));
                    (changed, viewer.highlight().hovered().is_some())
                };
                if changed {
                    let cursor = if over_district { "pointer" } else { "grab" };
                    let _ = canvas.style().set_property("cursor", cursor);
                    frames.request();
                }
            })?
        });

        listeners.push({
            let (viewer, frames) = (Rc::clone(&viewer), Rc::clone(&frames));
            Listener::new(target, "mouseleave", None, move |_event: Event| {
                if viewer.borrow_mut().pointer_hover(None) {
                    frames.request();
                }
            })?
        });

        listeners.push({
            let (viewer, frames) = (Rc::clone(&viewer), Rc::clone(&frames));
            // Non-passive so the page doesn't scroll while zooming.
            Listener::new(target, "wheel", Some(false), move |event: Event| {
                let Some(event) = event.dyn_ref::<WheelEvent>() else {
                    return;
                };
                event.prevent_default();
                viewer.borrow_mut().wheel(event.delta_y());
                frames.request();
            })?
        });

        listeners.push(Listener::new(
            target,
            "contextmenu",
            None,
            |event: Event| event.prevent_default(),
        )?);

        if let Some(window) = web_sys::window() {
            let frames = Rc::clone(&frames);
            listeners.push(Listener::new(
                window.as_ref(),
                "resize",
                None,
                move |_event: Event| frames.request(),
            )?);
        }

        if let Some(button) = document.get_element_by_id("reset-view") {
            let (viewer, frames) = (Rc::clone(&viewer), Rc::clone(&frames));
            listeners.push(Listener::new(
                button.as_ref(),
                "click",
                None,
                move |_event: Event| {
                    viewer.borrow_mut().reset_view();
                    frames.request();
                },
            )?);
        }

        Ok(Self {
            _listeners: listeners,
            drag,
        })
    }
}

impl Drop for MapInput {
    fn drop(&mut self) {
        self.drag.detach();
    }
}
