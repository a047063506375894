mod input;
mod render;
mod render_loop;
mod scene;
mod sse;
mod surface;
mod ticker;
mod viewer;

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::input::MapInput;
use crate::render_loop::FrameScheduler;
use crate::sse::{FeedMessage, StatusFeed};
use crate::ticker::AnimationTicker;
use crate::viewer::{Viewer, ViewerConfig};

const CANVAS_ID: &str = "map-canvas";

thread_local! {
    static APP_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

/// Keeps every long-lived browser resource alive. Dropping it closes the feed
/// and removes all listeners.
struct App {
    _feed: StatusFeed,
    _input: MapInput,
    _ticker: Rc<AnimationTicker>,
    _frames: Rc<FrameScheduler>,
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };

    match start(&document) {
        Ok(app) => APP_HANDLE.with(move |slot| {
            // Re-entering main() (dev reloads) must not leave the old app running.
            let _old = slot.borrow_mut().take();
            *slot.borrow_mut() = Some(Box::new(app));
        }),
        Err(e) => web_sys::console::error_2(&"district map failed to start".into(), &e),
    }
}

fn start(document: &Document) -> Result<App, JsValue> {
    let canvas = find_or_create_canvas(document)?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d canvas context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let viewer = Rc::new(RefCell::new(Viewer::new(read_config(&canvas))));

    let frames = {
        let viewer = Rc::clone(&viewer);
        let canvas = canvas.clone();
        Rc::new(FrameScheduler::new(move || {
            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0);
            let Some((width, height)) = render::sync_canvas_size(&canvas, dpr) else {
                return false;
            };
            let mut viewer = viewer.borrow_mut();
            if viewer.viewport().x != width || viewer.viewport().y != height {
                viewer.resize(width, height);
            }
            let keep_running = viewer.frame();
            render::draw_frame(&ctx, &viewer, dpr);
            keep_running
        }))
    };

    let ticker = {
        let viewer = Rc::clone(&viewer);
        let frames = Rc::clone(&frames);
        Rc::new(AnimationTicker::new(move || {
            let (running, repaint) = {
                let mut viewer = viewer.borrow_mut();
                let running = viewer.tick();
                (running, viewer.take_repaint())
            };
            if repaint {
                frames.request();
            }
            running
        }))
    };

    let feed = {
        let viewer = Rc::clone(&viewer);
        let frames = Rc::clone(&frames);
        let ticker = Rc::clone(&ticker);
        StatusFeed::connect(move |message| {
            let animating = {
                let mut viewer = viewer.borrow_mut();
                match message {
                    FeedMessage::Initial(statuses) => {
                        viewer.seed(&statuses);
                        web_sys::console::info_1(
                            &format!("status feed synced {} districts", viewer.district_count())
                                .into(),
                        );
                        viewer.animator().is_animating()
                    }
                    FeedMessage::Update(update) => viewer.apply_update(&update),
                }
            };
            if animating {
                ticker.ensure_running();
            }
            frames.request();
        })?
    };

    let input = MapInput::install(
        document.clone(),
        canvas,
        Rc::clone(&viewer),
        Rc::clone(&frames),
    )?;

    frames.request();
    Ok(App {
        _feed: feed,
        _input: input,
        _ticker: ticker,
        _frames: frames,
    })
}

fn find_or_create_canvas(document: &Document) -> Result<HtmlCanvasElement, JsValue> {
    if let Some(existing) = document.get_element_by_id(CANVAS_ID) {
        return existing.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from);
    }
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_id(CANVAS_ID);
    let style = canvas.style();
    style.set_property("display", "block")?;
    style.set_property("width", "100vw")?;
    style.set_property("height", "100vh")?;
    body.append_child(&canvas)?;
    Ok(canvas)
}

fn read_config(canvas: &HtmlCanvasElement) -> ViewerConfig {
    let Some(raw) = canvas.get_attribute("data-config") else {
        return ViewerConfig::default();
    };
    ViewerConfig::from_json(&raw).unwrap_or_else(|e| {
        web_sys::console::warn_1(&format!("ignoring invalid data-config: {e}").into());
        ViewerConfig::default()
    })
}
