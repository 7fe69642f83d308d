// SPDX-License-Identifier: MIT
//! Violation annotation: re-resolve each reported node against the live
//! page, prefer its current markup, and draw its bounding box onto the
//! full-page screenshot.
//!
//! Resolution is best-effort. The page may have mutated since the engine
//! ran, so a selector that no longer matches is dropped (debug-logged),
//! never an error.

use std::path::Path;

use chromiumoxide::Page;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;
use crate::group::Grouper;
use crate::model::{AnnotatedNode, AxeResults, BoundingBox};

const OUTLINE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const OUTLINE_WIDTH: u32 = 3;

const OUTER_HTML_FN: &str = "function() { return this.outerHTML; }";
// Absolute page coordinates, matching the full-page screenshot.
const BOUNDS_FN: &str = "function() { \
     const r = this.getBoundingClientRect(); \
     return JSON.stringify({ x: r.x + window.scrollX, y: r.y + window.scrollY, \
                             width: r.width, height: r.height }); }";

/// Walk every violation node, bucket the resolvable ones into `grouper`,
/// and overwrite `screenshot_path` with the rectangle overlay.
///
/// Returns `(annotated, dropped)` node counts.
pub async fn annotate_violations(
    page: &Page,
    results: &AxeResults,
    screenshot_png: &[u8],
    screenshot_path: &Path,
    grouper: &mut Grouper,
) -> Result<(usize, usize)> {
    let mut image = image::load_from_memory(screenshot_png)?.to_rgba8();
    let mut annotated = 0usize;
    let mut dropped = 0usize;

    for violation in &results.violations {
        for node in &violation.nodes {
            match resolve_node(page, node).await {
                Some(resolved) => {
                    draw_outline(&mut image, &resolved.bounds);
                    grouper.add(violation, resolved);
                    annotated += 1;
                }
                None => {
                    dropped += 1;
                    debug!(
                        rule = %violation.id,
                        selector = node.primary_target().unwrap_or("<none>"),
                        "node no longer resolves on the live page, dropped"
                    );
                }
            }
        }
    }

    image.save(screenshot_path)?;
    info!(annotated, dropped, path = %screenshot_path.display(), "screenshot annotated");
    Ok((annotated, dropped))
}

/// Map one engine node back to a live element. `None` when the selector is
/// stale or the element's geometry cannot be read.
async fn resolve_node(page: &Page, node: &crate::model::ViolationNode) -> Option<AnnotatedNode> {
    let selector = node.primary_target()?;
    let element = page.find_element(selector).await.ok()?;

    // Live outerHTML preferred over the engine's snippet; fall back to the
    // snippet when the call itself fails but the element exists.
    let html = call_string(&element, OUTER_HTML_FN)
        .await
        .unwrap_or_else(|| node.html.clone());

    let bounds: BoundingBox = serde_json::from_str(&call_string(&element, BOUNDS_FN).await?).ok()?;

    Some(AnnotatedNode {
        html,
        failure_summary: node.failure_summary.clone(),
        bounds,
    })
}

async fn call_string(element: &chromiumoxide::element::Element, js_fn: &str) -> Option<String> {
    let returned = element.call_js_fn(js_fn, false).await.ok()?;
    match returned.result.value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Draw a hollow rectangle of [`OUTLINE_WIDTH`] pixels at `bounds`, clamped
/// to the image. Degenerate boxes (zero-sized, fully outside) are skipped.
pub fn draw_outline(image: &mut RgbaImage, bounds: &BoundingBox) {
    let (img_w, img_h) = (image.width() as i64, image.height() as i64);
    let x0 = (bounds.x.floor() as i64).clamp(0, img_w);
    let y0 = (bounds.y.floor() as i64).clamp(0, img_h);
    let x1 = ((bounds.x + bounds.width).ceil() as i64).clamp(0, img_w);
    let y1 = ((bounds.y + bounds.height).ceil() as i64).clamp(0, img_h);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let (w, h) = ((x1 - x0) as u32, (y1 - y0) as u32);
    for inset in 0..OUTLINE_WIDTH {
        if w <= inset * 2 || h <= inset * 2 {
            break;
        }
        let rect = Rect::at(x0 as i32 + inset as i32, y0 as i32 + inset as i32)
            .of_size(w - inset * 2, h - inset * 2);
        draw_hollow_rect_mut(image, rect, OUTLINE_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn outline_is_three_pixels_wide() {
        let mut img = blank(100, 100);
        draw_outline(
            &mut img,
            &BoundingBox {
                x: 10.0,
                y: 10.0,
                width: 40.0,
                height: 30.0,
            },
        );
        // Three layers along the top edge; interior untouched.
        assert_eq!(*img.get_pixel(20, 10), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(20, 11), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(20, 12), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(20, 13), Rgba([255, 255, 255, 255]));
        // Left edge too.
        assert_eq!(*img.get_pixel(10, 20), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(12, 20), OUTLINE_COLOR);
    }

    #[test]
    fn out_of_frame_box_is_clamped_not_panicking() {
        let mut img = blank(50, 50);
        draw_outline(
            &mut img,
            &BoundingBox {
                x: 40.0,
                y: 40.0,
                width: 100.0,
                height: 100.0,
            },
        );
        assert_eq!(*img.get_pixel(45, 40), OUTLINE_COLOR);
    }

    #[test]
    fn degenerate_box_draws_nothing() {
        let mut img = blank(50, 50);
        let before = img.clone();
        draw_outline(
            &mut img,
            &BoundingBox {
                x: 10.0,
                y: 10.0,
                width: 0.0,
                height: 0.0,
            },
        );
        draw_outline(
            &mut img,
            &BoundingBox {
                x: -100.0,
                y: -100.0,
                width: 20.0,
                height: 20.0,
            },
        );
        assert_eq!(img, before);
    }
}
