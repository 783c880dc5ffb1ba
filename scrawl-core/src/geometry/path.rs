use super::Point;

/// Closed fill path through an outline polygon, smoothed by using every vertex as the control point
/// of a quadratic curve ending at the midpoint to the next vertex (wrapping around).
///
/// Returns `None` for an empty outline, or one too degenerate for `tiny_skia` to accept.
#[must_use]
pub fn outline_to_path(outline: &[Point]) -> Option<tiny_skia::Path> {
    let &first = outline.first()?;
    let mut builder = tiny_skia::PathBuilder::with_capacity(outline.len() + 3, outline.len() * 2 + 2);
    builder.move_to(first.x, first.y);
    for (idx, &control) in outline.iter().enumerate() {
        let next = outline.get(idx + 1).copied().unwrap_or(first);
        let end = control.midpoint(next);
        builder.quad_to(control.x, control.y, end.x, end.y);
    }
    builder.line_to(first.x, first.y);
    builder.close();
    builder.finish()
}

#[cfg(test)]
mod test {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn empty_outline_has_no_path() {
        assert!(outline_to_path(&[]).is_none());
    }
    #[test]
    fn smoothed_path_stays_within_hull() {
        let path = outline_to_path(&square()).unwrap();
        let bounds = path.bounds();
        assert!(bounds.left() >= 0.0 && bounds.top() >= 0.0);
        assert!(bounds.right() <= 10.0 && bounds.bottom() <= 10.0);
        // Quadratics through midpoints cut the corners, but not by much.
        assert!(bounds.width() > 4.0 && bounds.height() > 4.0);
    }
}
