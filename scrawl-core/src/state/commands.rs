use super::element::{Element, ElementId};
use crate::geometry::Point;
use crate::style::Style;

/// An undoable patch to the [`Document`](super::Document).
#[derive(Clone, Debug)]
pub enum Command {
    /// The element was appended to the end of the draw order.
    Created(Box<Element>),
    /// The element was removed from `index` of the draw order.
    Removed { element: Box<Element>, index: usize },
    /// A point (and pressure, if tracked) was appended to a stroke.
    AppendPoint {
        target: ElementId,
        point: Point,
        pressure: Option<f32>,
    },
    /// A stroke's terminal point was committed.
    Finalized { target: ElementId },
    Restyle {
        target: ElementId,
        from: Style,
        to: Style,
    },
    Selected {
        target: ElementId,
        from: bool,
        to: bool,
    },
}
impl Command {
    /// The element this command changes.
    #[must_use]
    pub fn target(&self) -> ElementId {
        match self {
            Self::Created(element) | Self::Removed { element, .. } => element.id(),
            Self::AppendPoint { target, .. }
            | Self::Finalized { target }
            | Self::Restyle { target, .. }
            | Self::Selected { target, .. } => *target,
        }
    }
}
