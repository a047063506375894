use glam::DVec3;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use smartcenter_shared::Rgb;

use crate::viewer::Viewer;

const BACKGROUND: &str = "#062e8b";
const GRID_LINE: &str = "rgba(132, 161, 227, 0.45)";
const TILE_EDGE: &str = "#66ccff";
const LABEL: &str = "rgba(255, 255, 255, 0.92)";
const TILE_ALPHA: f64 = 0.9;

const GROUND_HALF_EXTENT: f64 = 1000.0;
const GROUND_DIVISIONS: u32 = 20;
/// Ground grid sits slightly below the tiles.
const GROUND_Y: f64 = -5.0;

/// Match the canvas backing store to its CSS size at device pixel ratio.
/// Returns the CSS size, or `None` while the canvas is not laid out.
pub fn sync_canvas_size(canvas: &HtmlCanvasElement, dpr: f64) -> Option<(f64, f64)> {
    let css_w = canvas.client_width();
    let css_h = canvas.client_height();
    if css_w <= 0 || css_h <= 0 {
        return None;
    }
    let backing_w = (css_w as f64 * dpr).round().max(1.0) as u32;
    let backing_h = (css_h as f64 * dpr).round().max(1.0) as u32;
    if canvas.width() != backing_w || canvas.height() != backing_h {
        canvas.set_width(backing_w);
        canvas.set_height(backing_h);
    }
    Some((css_w as f64, css_h as f64))
}

pub fn draw_frame(ctx: &CanvasRenderingContext2d, viewer: &Viewer, dpr: f64) {
    let size = viewer.viewport();
    let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);

    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, size.x, size.y);

    draw_ground_grid(ctx, viewer);

    ctx.set_line_width(1.5);
    ctx.set_stroke_style_str(TILE_EDGE);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_font("600 16px sans-serif");

    for tile in viewer.projected() {
        let Some(fill) = viewer.fill_for(&tile.id) else {
            continue;
        };
        let [first, rest @ ..] = &tile.corners;
        ctx.begin_path();
        ctx.move_to(first.x, first.y);
        for corner in rest {
            ctx.line_to(corner.x, corner.y);
        }
        ctx.close_path();

        ctx.set_fill_style_str(&fill.rgba_css(TILE_ALPHA));
        ctx.fill();
        ctx.stroke();

        ctx.set_fill_style_str(label_color(fill));
        let _ = ctx.fill_text(&tile.id, tile.label_at.x, tile.label_at.y);
    }
}

fn draw_ground_grid(ctx: &CanvasRenderingContext2d, viewer: &Viewer) {
    let camera = viewer.controller().camera();
    let size = viewer.viewport();
    let step = GROUND_HALF_EXTENT * 2.0 / GROUND_DIVISIONS as f64;

    ctx.set_line_width(1.0);
    ctx.set_stroke_style_str(GRID_LINE);
    ctx.begin_path();
    for i in 0..=GROUND_DIVISIONS {
        let offset = -GROUND_HALF_EXTENT + step * i as f64;
        let lines = [
            (
                DVec3::new(offset, GROUND_Y, -GROUND_HALF_EXTENT),
                DVec3::new(offset, GROUND_Y, GROUND_HALF_EXTENT),
            ),
            (
                DVec3::new(-GROUND_HALF_EXTENT, GROUND_Y, offset),
                DVec3::new(GROUND_HALF_EXTENT, GROUND_Y, offset),
            ),
        ];
        for (from, to) in lines {
            // Lines crossing behind the camera are skipped rather than clipped.
            let (Some(a), Some(b)) = (
                camera.project(from, size.x, size.y),
                camera.project(to, size.x, size.y),
            ) else {
                continue;
            };
            ctx.move_to(a.screen.x, a.screen.y);
            ctx.line_to(b.screen.x, b.screen.y);
        }
    }
    ctx.stroke();
}

/// Dark text on light fills, light text otherwise.
fn label_color(fill: Rgb) -> &'static str {
    let luma = 0.299 * fill.r as f64 + 0.587 * fill.g as f64 + 0.114 * fill.b as f64;
    if luma > 160.0 { "rgba(12, 14, 23, 0.9)" } else { LABEL }
}

#[cfg(test)]
mod tests {
    use smartcenter_shared::{NORMAL_COLOR, Rgb, WARNING_COLOR};

    use super::{LABEL, label_color};

    #[test]
    fn labels_contrast_with_fill() {
        assert_eq!(label_color(NORMAL_COLOR), LABEL);
        assert_ne!(label_color(WARNING_COLOR), LABEL);
        assert_ne!(label_color(Rgb::new(255, 255, 255)), LABEL);
    }
}
