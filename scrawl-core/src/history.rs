//! # History grouping
//!
//! A continuous interaction, like dragging out a freehand stroke, produces many small writes.
//! The [`HistoryGrouper`] hands out a [`GroupId`] for the span of the interaction, and every write
//! tagged with it is merged by the [queue](crate::queue) into a single undoable transaction.

pub struct HistoryGroup;
pub type GroupId = crate::Id<HistoryGroup>;

/// What kind of action a write belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ActionKind {
    /// Part of the open continuous interaction, if any.
    Continuous,
    /// A discrete action such as a tool switch or a selection change. Never grouped.
    OneShot,
}

#[derive(Default, Debug)]
pub struct HistoryGrouper {
    active: Option<GroupId>,
}
impl HistoryGrouper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Open a new group. A group left open by an interrupted interaction is closed implicitly.
    pub fn begin_group(&mut self) -> GroupId {
        if let Some(dangling) = self.active.take() {
            log::debug!("closing dangling history group {dangling}");
        }
        let group = GroupId::default();
        self.active = Some(group);
        group
    }
    /// Close the open group, so the next write starts its own transaction.
    pub fn end_group(&mut self) -> Option<GroupId> {
        self.active.take()
    }
    #[must_use]
    pub fn active(&self) -> Option<GroupId> {
        self.active
    }
    /// The group a write of this kind should be tagged with.
    #[must_use]
    pub fn tag(&self, kind: ActionKind) -> Option<GroupId> {
        match kind {
            ActionKind::Continuous => self.active,
            ActionKind::OneShot => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::Point;
    use crate::queue::DocumentCommandQueue;
    use crate::state::Element;
    use crate::style::Style;

    #[test]
    fn one_shot_never_grouped() {
        let mut history = HistoryGrouper::new();
        assert_eq!(history.tag(ActionKind::Continuous), None);
        let group = history.begin_group();
        assert_eq!(history.tag(ActionKind::Continuous), Some(group));
        assert_eq!(history.tag(ActionKind::OneShot), None);
        assert_eq!(history.end_group(), Some(group));
        assert_eq!(history.tag(ActionKind::Continuous), None);
    }
    #[test]
    fn begin_replaces_dangling() {
        let mut history = HistoryGrouper::new();
        let first = history.begin_group();
        let second = history.begin_group();
        assert_ne!(first, second);
        assert_eq!(history.active(), Some(second));
    }
    #[test]
    fn stroke_is_one_transaction() {
        let queue = DocumentCommandQueue::new();
        let mut history = HistoryGrouper::new();
        let before = queue.read().records();

        history.begin_group();
        let id = queue
            .write_with(history.tag(ActionKind::Continuous), |writer| {
                writer
                    .document()
                    .create(Element::stroke(Point::ZERO, Style::default(), None))
            })
            .unwrap();
        for i in 1..=5 {
            queue
                .write_with(history.tag(ActionKind::Continuous), |writer| {
                    writer
                        .document()
                        .append_point(id, Point::new(i as f32, i as f32), None)
                })
                .unwrap();
        }
        history.end_group();
        assert_eq!(queue.depth(), 1);
        assert_eq!(
            queue.read().get(id).unwrap().as_stroke().unwrap().points().len(),
            6
        );

        assert_eq!(queue.undo_n(1), Ok(true));
        assert_eq!(queue.read().records(), before);
        assert!(!queue.can_undo());
    }
}
