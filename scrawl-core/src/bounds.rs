//! Axis-aligned bounds of elements, in element-relative and scene coordinates.

use crate::geometry::Point;
use crate::state::{Element, ElementId, ElementKind};

/// Axis-aligned rectangle, `min <= max` on both axes when built through the constructors here.
#[derive(Copy, Clone, PartialEq, Default, Debug, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}
impl Rect {
    pub const EMPTY: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    #[must_use]
    pub const fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
    /// The rectangle spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }
    #[must_use]
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }
    #[must_use]
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
    /// Has no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }
    #[must_use]
    pub fn min(&self) -> Point {
        Point::new(self.x_min, self.y_min)
    }
    #[must_use]
    pub fn translate(&self, by: Point) -> Self {
        Self::new(
            self.x_min + by.x,
            self.y_min + by.y,
            self.x_max + by.x,
            self.y_max + by.y,
        )
    }
    /// Grow outward by `padding` on every side.
    #[must_use]
    pub fn expand(&self, padding: f32) -> Self {
        Self::new(
            self.x_min - padding,
            self.y_min - padding,
            self.x_max + padding,
            self.y_max + padding,
        )
    }
    /// `other` lies strictly inside `self`, touching edges do not count.
    #[must_use]
    pub fn contains_strict(&self, other: &Self) -> bool {
        self.x_min < other.x_min
            && other.x_max < self.x_max
            && self.y_min < other.y_min
            && other.y_max < self.y_max
    }
    /// Inclusive point containment.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        (self.x_min..=self.x_max).contains(&point.x) && (self.y_min..=self.y_max).contains(&point.y)
    }
    #[must_use]
    pub fn to_skia(&self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_ltrb(self.x_min, self.y_min, self.x_max, self.y_max)
    }
}

/// Min/max over the points, relative to the owning element. Empty input gives [`Rect::EMPTY`].
#[must_use]
pub fn relative_bounds(points: &[Point]) -> Rect {
    let Some((first, rest)) = points.split_first() else {
        return Rect::EMPTY;
    };
    rest.iter().fold(
        Rect::new(first.x, first.y, first.x, first.y),
        |rect, p| {
            Rect::new(
                rect.x_min.min(p.x),
                rect.y_min.min(p.y),
                rect.x_max.max(p.x),
                rect.y_max.max(p.y),
            )
        },
    )
}

/// Bounds in scene coordinates. Kinds without geometry of their own give [`Rect::EMPTY`].
#[must_use]
pub fn absolute_bounds(element: &Element) -> Rect {
    hittable_bounds(element).unwrap_or(Rect::EMPTY)
}

/// Bounds in scene coordinates, or `None` for kinds without geometry of their own.
#[must_use]
pub fn hittable_bounds(element: &Element) -> Option<Rect> {
    let origin = element.origin();
    match element.kind() {
        ElementKind::Stroke(stroke) => Some(relative_bounds(stroke.points()).translate(origin)),
        ElementKind::Image(image) => Some(Rect::new(
            origin.x,
            origin.y,
            origin.x + image.width,
            origin.y + image.height,
        )),
        ElementKind::Opaque(_) => None,
    }
}

/// Every element whose absolute bounds are strictly contained in `rect`.
/// Elements without bounds are never hit.
pub fn hit_test<'e>(
    rect: &Rect,
    elements: impl IntoIterator<Item = &'e Element>,
) -> hashbrown::HashSet<ElementId> {
    elements
        .into_iter()
        .filter(|element| hittable_bounds(element).is_some_and(|bounds| rect.contains_strict(&bounds)))
        .map(Element::id)
        .collect()
}

/// Topmost element under `point`, if any.
pub fn element_at<'e>(
    point: Point,
    elements: impl DoubleEndedIterator<Item = &'e Element>,
) -> Option<ElementId> {
    elements
        .rev()
        .find(|element| hittable_bounds(element).is_some_and(|bounds| bounds.contains_point(point)))
        .map(Element::id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::element::{ImageData, OpaqueData, StrokeData};
    use crate::style::Style;

    fn square_stroke() -> Element {
        let points = vec![Point::ZERO, Point::new(40.0, 15.0), Point::new(20.0, 40.0)];
        Element::new(
            Point::new(10.0, 10.0),
            Style::default(),
            ElementKind::Stroke(StrokeData::new(points, None, true).unwrap()),
        )
    }
    fn opaque() -> Element {
        Element::new(
            Point::new(5.0, 5.0),
            Style::default(),
            ElementKind::Opaque(OpaqueData {
                kind: "text".into(),
                data: toml::Table::new(),
            }),
        )
    }

    #[test]
    fn relative_and_absolute() {
        let element = square_stroke();
        let points = element.as_stroke().unwrap().points();
        assert_eq!(relative_bounds(points), Rect::new(0.0, 0.0, 40.0, 40.0));
        assert_eq!(absolute_bounds(&element), Rect::new(10.0, 10.0, 50.0, 50.0));
        assert_eq!(relative_bounds(&[]), Rect::EMPTY);
    }
    #[test]
    fn image_bounds() {
        let image = Element::new(
            Point::new(3.0, 4.0),
            Style::default(),
            ElementKind::Image(ImageData {
                width: 10.0,
                height: 20.0,
                bitmap: None,
            }),
        );
        assert_eq!(absolute_bounds(&image), Rect::new(3.0, 4.0, 13.0, 24.0));
        assert_eq!(absolute_bounds(&opaque()), Rect::EMPTY);
    }
    #[test]
    fn strict_containment() {
        let element = square_stroke();
        let id = element.id();
        let elements = [element, opaque()];

        let hits = hit_test(&Rect::new(0.0, 0.0, 100.0, 100.0), &elements);
        assert!(hits.contains(&id));
        // Opaque elements are never hit, even inside the rectangle.
        assert_eq!(hits.len(), 1);

        assert!(hit_test(&Rect::new(0.0, 0.0, 30.0, 30.0), &elements).is_empty());
        // Touching edges is not containment.
        assert!(hit_test(&Rect::new(10.0, 10.0, 50.0, 50.0), &elements).is_empty());
    }
    #[test]
    fn corners_normalize() {
        let rect = Rect::from_corners(Point::new(30.0, 5.0), Point::new(10.0, 25.0));
        assert_eq!(rect, Rect::new(10.0, 5.0, 30.0, 25.0));
        assert!(Rect::from_corners(Point::ZERO, Point::ZERO).is_empty());
    }
    #[test]
    fn topmost_wins() {
        let below = square_stroke();
        let above = square_stroke();
        let above_id = above.id();
        let elements = [below, above];
        assert_eq!(
            element_at(Point::new(20.0, 20.0), elements.iter()),
            Some(above_id)
        );
        assert_eq!(element_at(Point::new(0.0, 0.0), elements.iter()), None);
    }
}
