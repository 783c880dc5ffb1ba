//! # Rendering
//!
//! Draws a [`Document`] onto a CPU [`tiny_skia::Pixmap`]. Strokes come from the [`RenderCache`] and
//! are blitted at `origin - offset`, images are drawn directly. A failure for one element is
//! logged and skipped, it never blanks the rest of the scene.

pub mod cache;

pub use cache::{CacheEntry, PathCache, RenderCache};

use crate::bounds::{absolute_bounds, hittable_bounds, Rect};
use crate::config::RenderConfig;
use crate::state::{Document, Element, ElementKind};
use crate::style::Color;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("stroke has no points")]
    NoPoints,
    #[error("outline too degenerate to fill")]
    EmptyPath,
    #[error("can't render elements of kind {0:?}")]
    Unsupported(String),
    #[error("could not allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },
}

const GRID_COLOR: Color = Color::rgba(0, 0, 0, 26);
const SELECTION_COLOR: Color = Color::rgba(0x1e, 0x6f, 0xd9, 255);
const MARQUEE_FILL: Color = Color::rgba(0x1e, 0x6f, 0xd9, 32);
const PLACEHOLDER_COLOR: Color = Color::rgba(0xc8, 0xc8, 0xc8, 255);
const DEBUG_BOUNDS: Color = Color::rgba(0xff, 0x00, 0x00, 40);
const DEBUG_FIRST: Color = Color::rgba(0x00, 0xa0, 0x00, 255);
const DEBUG_LAST: Color = Color::rgba(0xd0, 0x00, 0x00, 255);

fn paint(color: Color) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

/// Draw the whole scene. `marquee` is an in-progress area selection, if any.
///
/// Cache entries for elements no longer in `document` are evicted afterwards.
pub fn render(
    document: &Document,
    cache: &mut RenderCache,
    marquee: Option<Rect>,
    settings: &RenderConfig,
    target: &mut tiny_skia::Pixmap,
) {
    target.fill(settings.background.to_skia());
    if settings.grid_display {
        draw_grid(settings.grid_size, target);
    }
    for element in document.iter() {
        if let Err(err) = draw_element(element, cache, target) {
            log::warn!("skipping {} while rendering: {err}", element.id());
        }
    }
    // Kinds without bounds have nowhere to put a highlight.
    for bounds in document
        .iter()
        .filter(|element| element.is_selected())
        .filter_map(hittable_bounds)
    {
        stroke_rect(&bounds.expand(settings.selection_padding), SELECTION_COLOR, target);
    }
    if settings.debug {
        for element in document.iter() {
            draw_debug(element, target);
        }
    }
    if let Some(marquee) = marquee {
        if let Some(rect) = marquee.to_skia() {
            target.fill_rect(rect, &paint(MARQUEE_FILL), tiny_skia::Transform::identity(), None);
        }
        stroke_rect(&marquee, SELECTION_COLOR, target);
    }
    cache.retain(|id| document.contains(id));
}

fn draw_grid(grid_size: f32, target: &mut tiny_skia::Pixmap) {
    if !(grid_size.is_finite() && grid_size >= 1.0) {
        return;
    }
    let (width, height) = (target.width() as f32, target.height() as f32);
    let paint = tiny_skia::Paint {
        anti_alias: false,
        ..paint(GRID_COLOR)
    };
    let identity = tiny_skia::Transform::identity();
    let lines = |along: f32| {
        std::iter::successors(Some(0.0_f32), move |pos| Some(pos + grid_size))
            .take_while(move |pos| *pos < along)
    };
    for x in lines(width) {
        if let Some(line) = tiny_skia::Rect::from_xywh(x, 0.0, 1.0, height) {
            target.fill_rect(line, &paint, identity, None);
        }
    }
    for y in lines(height) {
        if let Some(line) = tiny_skia::Rect::from_xywh(0.0, y, width, 1.0) {
            target.fill_rect(line, &paint, identity, None);
        }
    }
}

fn draw_element(
    element: &Element,
    cache: &mut RenderCache,
    target: &mut tiny_skia::Pixmap,
) -> Result<(), RenderError> {
    let opacity = element.style().sanitized_opacity();
    match element.kind() {
        ElementKind::Stroke(_) => {
            let entry = cache.get_or_build(element)?;
            let at = entry.placement(element.origin());
            target.draw_pixmap(
                0,
                0,
                entry.surface.as_ref(),
                &tiny_skia::PixmapPaint {
                    opacity,
                    ..Default::default()
                },
                tiny_skia::Transform::from_translate(at.x, at.y),
                None,
            );
            Ok(())
        }
        ElementKind::Image(image) => {
            let origin = element.origin();
            if let Some(bitmap) = &image.bitmap {
                let (sx, sy) = (
                    image.width / bitmap.width() as f32,
                    image.height / bitmap.height() as f32,
                );
                target.draw_pixmap(
                    0,
                    0,
                    tiny_skia::Pixmap::as_ref(bitmap),
                    &tiny_skia::PixmapPaint {
                        opacity,
                        quality: tiny_skia::FilterQuality::Bilinear,
                        ..Default::default()
                    },
                    tiny_skia::Transform::from_row(sx, 0.0, 0.0, sy, origin.x, origin.y),
                    None,
                );
            } else if let Some(rect) =
                tiny_skia::Rect::from_xywh(origin.x, origin.y, image.width, image.height)
            {
                let color = PLACEHOLDER_COLOR.with_alpha((opacity * 255.0).round() as u8);
                target.fill_rect(rect, &paint(color), tiny_skia::Transform::identity(), None);
            }
            Ok(())
        }
        ElementKind::Opaque(opaque) => Err(RenderError::Unsupported(opaque.kind.clone())),
    }
}

fn stroke_rect(rect: &Rect, color: Color, target: &mut tiny_skia::Pixmap) {
    let Some(rect) = rect.to_skia() else { return };
    let mut builder = tiny_skia::PathBuilder::new();
    builder.push_rect(rect);
    let Some(path) = builder.finish() else { return };
    target.stroke_path(
        &path,
        &paint(color),
        &tiny_skia::Stroke {
            width: 1.0,
            ..Default::default()
        },
        tiny_skia::Transform::identity(),
        None,
    );
}

/// Bounds box, a dot on the first point and a square on the last.
fn draw_debug(element: &Element, target: &mut tiny_skia::Pixmap) {
    let identity = tiny_skia::Transform::identity();
    if let Some(bounds) = absolute_bounds(element).to_skia() {
        target.fill_rect(bounds, &paint(DEBUG_BOUNDS), identity, None);
    }
    let Some(stroke) = element.as_stroke() else {
        return;
    };
    let first = element.origin().add(stroke.first_point());
    let last = element.origin().add(stroke.last_point());
    if let Some(dot) = tiny_skia::PathBuilder::from_circle(first.x, first.y, 2.0) {
        target.fill_path(
            &dot,
            &paint(DEBUG_FIRST),
            tiny_skia::FillRule::Winding,
            identity,
            None,
        );
    }
    if let Some(square) = tiny_skia::Rect::from_xywh(last.x - 2.0, last.y - 2.0, 4.0, 4.0) {
        target.fill_rect(square, &paint(DEBUG_LAST), identity, None);
    }
}
