//! # Elements
//!
//! Everything drawn on the board is an [`Element`]: a shared header (identity, origin, style,
//! selection) plus a closed set of [`ElementKind`]s. Elements are only ever mutated by applying
//! [commands](super::commands), and every applied command stamps a fresh version so caches keyed on
//! `(id, version)` can never serve stale pixels.

use crate::geometry::Point;
use crate::style::Style;

pub type ElementId = crate::Id<Element>;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ElementError {
    #[error("stroke has {points} points but {pressures} pressures")]
    PressureLengthMismatch { points: usize, pressures: usize },
    #[error("stroke has no points")]
    Empty,
}

/// Fetch a version number never handed out before in this process.
pub(crate) fn next_version() -> u64 {
    static NEXT: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
    NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

/// Freehand stroke geometry. Points are relative to the owning element's origin.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeData {
    points: Vec<Point>,
    /// When present, always parallel to `points`.
    pressures: Option<Vec<f32>>,
    is_final: bool,
}
impl StrokeData {
    /// A stroke that has not been dragged yet: a single point at the element origin.
    #[must_use]
    pub fn start(track_pressure: Option<f32>) -> Self {
        Self {
            points: vec![Point::ZERO],
            pressures: track_pressure.map(|p| vec![p]),
            is_final: false,
        }
    }
    pub fn new(
        points: Vec<Point>,
        pressures: Option<Vec<f32>>,
        is_final: bool,
    ) -> Result<Self, ElementError> {
        if points.is_empty() {
            return Err(ElementError::Empty);
        }
        if let Some(pressures) = &pressures {
            if pressures.len() != points.len() {
                return Err(ElementError::PressureLengthMismatch {
                    points: points.len(),
                    pressures: pressures.len(),
                });
            }
        }
        Ok(Self {
            points,
            pressures,
            is_final,
        })
    }
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    #[must_use]
    pub fn pressures(&self) -> Option<&[f32]> {
        self.pressures.as_deref()
    }
    #[must_use]
    pub fn tracks_pressure(&self) -> bool {
        self.pressures.is_some()
    }
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.is_final
    }
    #[must_use]
    pub fn first_point(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }
    #[must_use]
    pub fn last_point(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }
    /// Outline polygon for this stroke, see [`crate::geometry::build_outline`].
    #[must_use]
    pub fn outline(&self, stroke_width: f32) -> Vec<Point> {
        crate::geometry::build_outline(
            &self.points,
            self.pressures.as_deref(),
            stroke_width,
            self.is_final,
        )
    }
    /// Push a point. `pressure` must be `Some` exactly when this stroke tracks pressure.
    pub(super) fn push(&mut self, point: Point, pressure: Option<f32>) -> bool {
        match (&mut self.pressures, pressure) {
            (Some(pressures), Some(pressure)) => pressures.push(pressure),
            (None, None) => (),
            _ => return false,
        }
        self.points.push(point);
        true
    }
    /// Remove the last point, if it matches and is not the only one.
    pub(super) fn pop_matching(&mut self, point: Point, pressure: Option<f32>) -> bool {
        let last_pressure = self.pressures.as_ref().and_then(|p| p.last().copied());
        if self.points.len() < 2 || self.points.last() != Some(&point) || last_pressure != pressure
        {
            return false;
        }
        self.points.pop();
        if let Some(pressures) = &mut self.pressures {
            pressures.pop();
        }
        true
    }
    pub(super) fn set_final(&mut self, is_final: bool) {
        self.is_final = is_final;
    }
}

/// A placed bitmap. Decoding happens elsewhere, an image without a bitmap renders as a
/// placeholder.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: f32,
    pub height: f32,
    pub bitmap: Option<std::sync::Arc<tiny_skia::Pixmap>>,
}
impl PartialEq for ImageData {
    fn eq(&self, other: &Self) -> bool {
        let same_bitmap = match (&self.bitmap, &other.bitmap) {
            (Some(a), Some(b)) => std::sync::Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.width == other.width && self.height == other.height && same_bitmap
    }
}

/// An element of a kind this crate carries but does not interpret, like text or shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct OpaqueData {
    /// The foreign type tag, kept for round-tripping.
    pub kind: String,
    /// The foreign payload.
    pub data: toml::Table,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Stroke(StrokeData),
    Image(ImageData),
    Opaque(OpaqueData),
}

#[derive(Clone, Debug)]
pub struct Element {
    id: ElementId,
    origin: Point,
    style: Style,
    selected: bool,
    version: u64,
    kind: ElementKind,
}
impl Element {
    #[must_use]
    pub fn new(origin: Point, style: Style, kind: ElementKind) -> Self {
        Self::with_id(ElementId::default(), origin, style, kind)
    }
    #[must_use]
    pub fn with_id(id: ElementId, origin: Point, style: Style, kind: ElementKind) -> Self {
        Self {
            id,
            origin,
            style,
            selected: false,
            version: next_version(),
            kind,
        }
    }
    /// A fresh single-point stroke at `origin`.
    #[must_use]
    pub fn stroke(origin: Point, style: Style, track_pressure: Option<f32>) -> Self {
        Self::new(
            origin,
            style,
            ElementKind::Stroke(StrokeData::start(track_pressure)),
        )
    }
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }
    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }
    #[must_use]
    pub fn style(&self) -> &Style {
        &self.style
    }
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }
    /// Changes every time this element is modified.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
    #[must_use]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }
    #[must_use]
    pub fn as_stroke(&self) -> Option<&StrokeData> {
        match &self.kind {
            ElementKind::Stroke(stroke) => Some(stroke),
            _ => None,
        }
    }
    #[must_use]
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            ElementKind::Stroke(_) => "stroke",
            ElementKind::Image(_) => "image",
            ElementKind::Opaque(opaque) => &opaque.kind,
        }
    }
    /// Compares everything except the version.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.origin == other.origin
            && self.style == other.style
            && self.selected == other.selected
            && self.kind == other.kind
    }
}
// Mutators for the command applier.
impl Element {
    pub(super) fn touch(&mut self) {
        self.version = next_version();
    }
    pub(super) fn stroke_mut(&mut self) -> Option<&mut StrokeData> {
        match &mut self.kind {
            ElementKind::Stroke(stroke) => Some(stroke),
            _ => None,
        }
    }
    pub(super) fn set_style(&mut self, style: Style) {
        self.style = style;
    }
    pub(super) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// Plain element record, as produced and consumed by persistence or import.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementRecord {
    Stroke {
        #[serde(default)]
        id: Option<ElementId>,
        origin: Point,
        #[serde(default)]
        style: Style,
        points: Vec<Point>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pressures: Option<Vec<f32>>,
        #[serde(default)]
        is_final: bool,
        #[serde(default)]
        selected: bool,
    },
    Image {
        #[serde(default)]
        id: Option<ElementId>,
        origin: Point,
        #[serde(default)]
        style: Style,
        width: f32,
        height: f32,
        #[serde(default)]
        selected: bool,
    },
    Opaque {
        #[serde(default)]
        id: Option<ElementId>,
        origin: Point,
        #[serde(default)]
        style: Style,
        kind: String,
        #[serde(default)]
        data: toml::Table,
        #[serde(default)]
        selected: bool,
    },
}
impl TryFrom<ElementRecord> for Element {
    type Error = ElementError;
    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        let (id, origin, style, selected, kind) = match record {
            ElementRecord::Stroke {
                id,
                origin,
                style,
                points,
                pressures,
                is_final,
                selected,
            } => (
                id,
                origin,
                style,
                selected,
                ElementKind::Stroke(StrokeData::new(points, pressures, is_final)?),
            ),
            ElementRecord::Image {
                id,
                origin,
                style,
                width,
                height,
                selected,
            } => (
                id,
                origin,
                style,
                selected,
                ElementKind::Image(ImageData {
                    width,
                    height,
                    bitmap: None,
                }),
            ),
            ElementRecord::Opaque {
                id,
                origin,
                style,
                kind,
                data,
                selected,
            } => (
                id,
                origin,
                style,
                selected,
                ElementKind::Opaque(OpaqueData { kind, data }),
            ),
        };
        let mut element = Element::with_id(id.unwrap_or_default(), origin, style, kind);
        element.selected = selected;
        Ok(element)
    }
}
impl From<&Element> for ElementRecord {
    fn from(element: &Element) -> Self {
        let (id, origin, style, selected) = (
            Some(element.id),
            element.origin,
            element.style,
            element.selected,
        );
        match &element.kind {
            ElementKind::Stroke(stroke) => Self::Stroke {
                id,
                origin,
                style,
                points: stroke.points.clone(),
                pressures: stroke.pressures.clone(),
                is_final: stroke.is_final,
                selected,
            },
            ElementKind::Image(image) => Self::Image {
                id,
                origin,
                style,
                width: image.width,
                height: image.height,
                selected,
            },
            ElementKind::Opaque(opaque) => Self::Opaque {
                id,
                origin,
                style,
                kind: opaque.kind.clone(),
                data: opaque.data.clone(),
                selected,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pressure_length_mismatch_rejected() {
        let points = vec![Point::ZERO; 5];
        assert_eq!(
            StrokeData::new(points.clone(), Some(vec![0.5; 4]), false),
            Err(ElementError::PressureLengthMismatch {
                points: 5,
                pressures: 4
            })
        );
        assert!(StrokeData::new(points, Some(vec![0.5; 5]), false).is_ok());
        assert_eq!(
            StrokeData::new(Vec::new(), None, false),
            Err(ElementError::Empty)
        );
    }
    #[test]
    fn push_keeps_pressures_parallel() {
        let mut tracked = StrokeData::start(Some(0.3));
        assert!(!tracked.push(Point::new(1.0, 1.0), None));
        assert!(tracked.push(Point::new(1.0, 1.0), Some(0.4)));
        assert_eq!(tracked.points().len(), tracked.pressures().unwrap().len());

        let mut untracked = StrokeData::start(None);
        assert!(!untracked.push(Point::new(1.0, 1.0), Some(0.4)));
        assert!(untracked.push(Point::new(1.0, 1.0), None));
        assert_eq!(untracked.points().len(), 2);
    }
    #[test]
    fn pop_never_empties() {
        let mut stroke = StrokeData::start(None);
        assert!(!stroke.pop_matching(Point::ZERO, None));
        stroke.push(Point::new(2.0, 0.0), None);
        assert!(!stroke.pop_matching(Point::new(3.0, 0.0), None));
        assert!(stroke.pop_matching(Point::new(2.0, 0.0), None));
        assert_eq!(stroke.points(), &[Point::ZERO]);
    }
    #[test]
    fn record_rejects_bad_pressures() {
        let source = r#"
            type = "stroke"
            origin = [10.0, 10.0]
            points = [[0.0, 0.0], [1.0, 1.0]]
            pressures = [0.5]
        "#;
        let record: ElementRecord = toml::from_str(source).unwrap();
        assert!(matches!(
            Element::try_from(record),
            Err(ElementError::PressureLengthMismatch { .. })
        ));
    }
    #[test]
    fn record_roundtrip_keeps_content() {
        let element = Element::new(
            Point::new(4.0, 2.0),
            Style::default(),
            ElementKind::Stroke(
                StrokeData::new(vec![Point::ZERO, Point::new(3.0, 3.0)], None, true).unwrap(),
            ),
        );
        let record = ElementRecord::from(&element);
        let back = Element::try_from(record).unwrap();
        assert!(element.same_content(&back));
        // Rebuilt elements are new versions, even with equal content.
        assert_ne!(element.version(), back.version());
    }
}
