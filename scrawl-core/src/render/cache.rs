//! # Render cache
//!
//! Rasterising a stroke is expensive compared to blitting it, so every stroke is drawn once to its
//! own surface and reused until it changes. Entries are keyed by element id and remember the
//! element version they were built from, a version mismatch is a miss.
//!
//! The cache never owns elements. Entries for elements that left the document must be dropped
//! with [`RenderCache::retain`] or [`RenderCache::evict`].

use super::RenderError;
use crate::bounds::{relative_bounds, Rect};
use crate::geometry::Point;
use crate::state::{Element, ElementId};

/// Margin around the geometric bounds, per unit of stroke width, so the outline never clips.
pub const PADDING_PER_STROKE_WIDTH: f32 = 12.0;
/// Largest surface edge allocated, in pixels.
const MAX_SURFACE_EDGE: u32 = 16 * 1024;
/// Largest surface allocated, in pixels. 64MiB of RGBA8.
const MAX_SURFACE_AREA: u64 = 4096 * 4096;

/// A stroke drawn to its own surface.
pub struct CacheEntry {
    pub surface: tiny_skia::Pixmap,
    /// Translation from the element's origin to the surface's origin. The surface belongs at
    /// `origin - offset` in the scene.
    pub offset: Point,
    pub padding: f32,
    version: u64,
}
impl CacheEntry {
    /// Version of the element this was built from.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
    /// Scene position of the surface's top-left corner for an element at `origin`.
    #[must_use]
    pub fn placement(&self, origin: Point) -> Point {
        origin.sub(self.offset)
    }
}
impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("size", &(self.surface.width(), self.surface.height()))
            .field("offset", &self.offset)
            .field("padding", &self.padding)
            .field("version", &self.version)
            .finish()
    }
}

/// Fill paths, keyed like [`RenderCache`].
#[derive(Default)]
pub struct PathCache {
    paths: hashbrown::HashMap<ElementId, (u64, tiny_skia::Path)>,
}
impl PathCache {
    /// Fetch the stroke's fill path in element-relative coordinates, building it if missing or
    /// out of date.
    pub fn get_or_build(&mut self, element: &Element) -> Result<&tiny_skia::Path, RenderError> {
        let fresh = self
            .paths
            .get(&element.id())
            .is_some_and(|(version, _)| *version == element.version());
        if !fresh {
            return self.rebuild(element);
        }
        self.paths
            .get(&element.id())
            .map(|(_, path)| path)
            .ok_or(RenderError::EmptyPath)
    }
    /// Build the path unconditionally, replacing any entry.
    pub fn rebuild(&mut self, element: &Element) -> Result<&tiny_skia::Path, RenderError> {
        let path = build_path(element)?;
        let slot = match self.paths.entry(element.id()) {
            hashbrown::hash_map::Entry::Occupied(mut occupied) => {
                occupied.insert((element.version(), path));
                occupied.into_mut()
            }
            hashbrown::hash_map::Entry::Vacant(vacant) => {
                vacant.insert((element.version(), path))
            }
        };
        Ok(&slot.1)
    }
    pub fn evict(&mut self, id: ElementId) {
        self.paths.remove(&id);
    }
    pub fn retain(&mut self, mut keep: impl FnMut(ElementId) -> bool) {
        self.paths.retain(|id, _| keep(*id));
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn build_path(element: &Element) -> Result<tiny_skia::Path, RenderError> {
    let stroke = element
        .as_stroke()
        .ok_or_else(|| RenderError::Unsupported(element.kind_name().to_owned()))?;
    if stroke.points().is_empty() {
        return Err(RenderError::NoPoints);
    }
    if let Some(pressures) = stroke.pressures() {
        debug_assert_eq!(pressures.len(), stroke.points().len());
    }
    let outline = stroke.outline(element.style().sanitized_width());
    crate::geometry::outline_to_path(&outline).ok_or(RenderError::EmptyPath)
}

/// Rasterised strokes, keyed by element id.
#[derive(Default)]
pub struct RenderCache {
    surfaces: hashbrown::HashMap<ElementId, CacheEntry>,
    paths: PathCache,
}
impl RenderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Fetch the element's surface, building it on a miss. A hit is returned unchanged.
    pub fn get_or_build(&mut self, element: &Element) -> Result<&CacheEntry, RenderError> {
        let fresh = self
            .surfaces
            .get(&element.id())
            .is_some_and(|entry| entry.version == element.version());
        if !fresh {
            log::trace!("render cache miss for {}", element.id());
            return self.rebuild(element);
        }
        self.surfaces
            .get(&element.id())
            .ok_or(RenderError::NoPoints)
    }
    /// Rasterise the element unconditionally and replace its entry. Every mutation of an element
    /// should be followed by this before the next redraw.
    pub fn rebuild(&mut self, element: &Element) -> Result<&CacheEntry, RenderError> {
        let entry = match self.rasterize(element) {
            Ok(entry) => entry,
            Err(err) => {
                // Don't leave the previous pixels around for a broken element.
                self.evict(element.id());
                return Err(err);
            }
        };
        Ok(match self.surfaces.entry(element.id()) {
            hashbrown::hash_map::Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
                occupied.into_mut()
            }
            hashbrown::hash_map::Entry::Vacant(vacant) => vacant.insert(entry),
        })
    }
    fn rasterize(&mut self, element: &Element) -> Result<CacheEntry, RenderError> {
        let stroke = element
            .as_stroke()
            .ok_or_else(|| RenderError::Unsupported(element.kind_name().to_owned()))?;
        let style = element.style();
        let bounds = relative_bounds(stroke.points());
        let padding = style.sanitized_width() * PADDING_PER_STROKE_WIDTH;
        let offset = Point::new(padding - bounds.x_min, padding - bounds.y_min);
        let mut surface = allocate_surface(&bounds, padding)?;

        let path = self.paths.get_or_build(element)?;
        let mut paint = tiny_skia::Paint::default();
        // Opacity is applied when compositing, the surface is drawn opaque.
        paint.set_color(style.stroke_color.with_alpha(255).to_skia());
        paint.anti_alias = true;
        surface.fill_path(
            path,
            &paint,
            tiny_skia::FillRule::Winding,
            tiny_skia::Transform::from_translate(offset.x, offset.y),
            None,
        );
        log::trace!(
            "rasterised {} at {}x{}",
            element.id(),
            surface.width(),
            surface.height()
        );

        Ok(CacheEntry {
            surface,
            offset,
            padding,
            version: element.version(),
        })
    }
    #[must_use]
    pub fn peek(&self, id: ElementId) -> Option<&CacheEntry> {
        self.surfaces.get(&id)
    }
    pub fn evict(&mut self, id: ElementId) {
        self.surfaces.remove(&id);
        self.paths.evict(id);
    }
    /// Drop every entry for which `keep` is false.
    pub fn retain(&mut self, mut keep: impl FnMut(ElementId) -> bool) {
        let before = self.surfaces.len();
        self.surfaces.retain(|id, _| keep(*id));
        self.paths.retain(&mut keep);
        let evicted = before - self.surfaces.len();
        if evicted != 0 {
            log::trace!("evicted {evicted} render cache entries");
        }
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Surface sized to the bounds plus padding on every side. Degenerate or unallocatable sizes are
/// clamped, down to 1x1 if need be, so that a redraw always has something to draw.
fn allocate_surface(bounds: &Rect, padding: f32) -> Result<tiny_skia::Pixmap, RenderError> {
    let edge = |span: f32| -> u32 {
        let edge = (span + 2.0 * padding).ceil();
        if edge.is_finite() && edge >= 1.0 {
            // Saturating float cast.
            (edge as u32).min(MAX_SURFACE_EDGE)
        } else {
            1
        }
    };
    let (mut width, mut height) = (edge(bounds.width()), edge(bounds.height()));
    let area = u64::from(width) * u64::from(height);
    if area > MAX_SURFACE_AREA {
        // Keep the aspect ratio, the stroke is clipped rather than scaled.
        let scale = (MAX_SURFACE_AREA as f64 / area as f64).sqrt();
        let shrink = |edge: u32| ((f64::from(edge) * scale).floor() as u32).max(1);
        log::warn!("stroke surface {width}x{height} too large, clamping");
        (width, height) = (shrink(width), shrink(height));
    }
    if let Some(surface) = tiny_skia::Pixmap::new(width, height) {
        return Ok(surface);
    }
    log::warn!("could not allocate {width}x{height} stroke surface, clamping to 1x1");
    tiny_skia::Pixmap::new(1, 1).ok_or(RenderError::Allocation { width, height })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::{CommandConsumer, DoUndo};
    use crate::state::{commands::Command, Document, ElementKind};
    use crate::style::Style;

    fn document_with_stroke() -> (Document, ElementId) {
        let element = Element::new(
            Point::new(100.0, 100.0),
            Style::default(),
            ElementKind::Stroke(
                crate::state::element::StrokeData::new(
                    vec![Point::ZERO, Point::new(10.0, 0.0), Point::new(20.0, 5.0)],
                    None,
                    false,
                )
                .unwrap(),
            ),
        );
        let id = element.id();
        (Document::from_elements([element]), id)
    }

    #[test]
    fn hit_returns_same_entry() {
        let (doc, id) = document_with_stroke();
        let element = doc.get(id).unwrap();
        let mut cache = RenderCache::new();
        let first = cache.get_or_build(element).unwrap().surface.data().as_ptr();
        let second = cache.get_or_build(element).unwrap().surface.data().as_ptr();
        assert_eq!(first, second);
    }
    #[test]
    fn entry_geometry() {
        let (doc, id) = document_with_stroke();
        let element = doc.get(id).unwrap();
        let mut cache = RenderCache::new();
        let entry = cache.get_or_build(element).unwrap();
        assert_eq!(entry.padding, 12.0);
        assert_eq!(entry.offset, Point::new(12.0, 12.0));
        // Span plus padding on both sides.
        assert_eq!(entry.surface.width(), 20 + 24);
        assert_eq!(entry.surface.height(), 5 + 24);
        assert_eq!(entry.placement(element.origin()), Point::new(88.0, 88.0));
        // Something was drawn.
        assert!(entry.surface.pixels().iter().any(|p| p.alpha() != 0));
    }
    #[test]
    fn rebuild_after_mutation_differs() {
        let (mut doc, id) = document_with_stroke();
        let mut cache = RenderCache::new();
        let before = cache.get_or_build(doc.get(id).unwrap()).unwrap().surface.clone();

        doc.apply(DoUndo::Do(&Command::AppendPoint {
            target: id,
            point: Point::new(40.0, 30.0),
            pressure: None,
        }))
        .unwrap();
        let element = doc.get(id).unwrap();
        cache.rebuild(element).unwrap();
        let after = &cache.get_or_build(element).unwrap().surface;
        assert_ne!(&before, after);
        assert_eq!(cache.peek(id).unwrap().version(), element.version());
    }
    #[test]
    fn version_change_is_miss() {
        let (mut doc, id) = document_with_stroke();
        let mut cache = RenderCache::new();
        let before = cache.get_or_build(doc.get(id).unwrap()).unwrap().version();
        doc.apply(DoUndo::Do(&Command::Finalized { target: id }))
            .unwrap();
        // No explicit rebuild, the version alone forces one.
        let after = cache.get_or_build(doc.get(id).unwrap()).unwrap().version();
        assert_ne!(before, after);
    }
    #[test]
    fn degenerate_surface_clamped() {
        let surface = allocate_surface(&Rect::EMPTY, 0.0).unwrap();
        assert_eq!((surface.width(), surface.height()), (1, 1));
        let surface = allocate_surface(&Rect::new(0.0, 0.0, f32::NAN, 2.0), 0.0).unwrap();
        assert_eq!((surface.width(), surface.height()), (1, 2));
    }
    #[test]
    fn huge_surface_clamped_by_area() {
        let surface = allocate_surface(&Rect::new(0.0, 0.0, 20_000.0, 2_000.0), 0.0).unwrap();
        let area = u64::from(surface.width()) * u64::from(surface.height());
        assert!(area <= MAX_SURFACE_AREA);
        // Still wider than tall.
        assert!(surface.width() > surface.height() * 5);
        // A stroke restyled to an absurd width stays bounded too.
        let allocated = allocate_surface(&Rect::new(0.0, 0.0, 10.0, 10.0), 1.0e6).unwrap();
        assert!(u64::from(allocated.width()) * u64::from(allocated.height()) <= MAX_SURFACE_AREA);
    }
    #[test]
    fn path_reused_for_same_version() {
        let (doc, id) = document_with_stroke();
        let element = doc.get(id).unwrap();
        let mut cache = RenderCache::new();
        cache.rebuild(element).unwrap();
        let first = cache.paths.get_or_build(element).unwrap().points().as_ptr();
        // Rebuilding the surface doesn't redo the outline of an unchanged element.
        cache.rebuild(element).unwrap();
        let again = cache.paths.get_or_build(element).unwrap().points().as_ptr();
        assert_eq!(first, again);
        assert_eq!(cache.paths.len(), 1);
    }
    #[test]
    fn non_strokes_unsupported() {
        let element = Element::new(
            Point::ZERO,
            Style::default(),
            ElementKind::Opaque(crate::state::element::OpaqueData {
                kind: "text".into(),
                data: toml::Table::new(),
            }),
        );
        let mut cache = RenderCache::new();
        assert!(matches!(
            cache.get_or_build(&element),
            Err(RenderError::Unsupported(kind)) if kind == "text"
        ));
        assert!(cache.is_empty());
    }
    #[test]
    fn retain_evicts() {
        let (doc, id) = document_with_stroke();
        let mut cache = RenderCache::new();
        cache.get_or_build(doc.get(id).unwrap()).unwrap();
        cache.retain(|id| doc.contains(id));
        assert_eq!(cache.len(), 1);
        cache.retain(|_| false);
        assert!(cache.is_empty());
        assert!(cache.paths.is_empty());
    }
}
