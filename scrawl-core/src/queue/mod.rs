//! Command Queue
//!
//! The queue manages all the actions performed by the user, keeping track of commands, undo/redo state, etc.
//! The queue is the ground truth for the current state of its document: the document can only be
//! changed by writing commands through [`DocumentCommandQueue::write_with`], or by moving through
//! history with [`DocumentCommandQueue::undo_n`] and [`DocumentCommandQueue::redo_n`].
//!
//! History is a tree of [`Transaction`]s rather than a list. Undoing and then writing something new
//! starts a new branch, leaving the old one intact.

use crate::{
    commands::{self, CommandConsumer, CommandError, Transaction},
    history::GroupId,
    state::Document,
};

pub mod writer;

struct DocumentCommandQueueInner {
    /// Tree structure of commands, where undos create branches.
    /// "First child" represents earlier series of commands that were undone, "last" is the most recent.
    /// More than two branches are allowed, of course!
    command_tree: slab_tree::Tree<Transaction>,
    document: Document,
    // "Pointer" into the tree where the most recent command took place.
    present: slab_tree::NodeId,
    root: slab_tree::NodeId,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    // Hints that something has gone horribly wrong internally!
    #[error("tree malformed: {0}")]
    TreeMalformed(#[from] TraverseError),
    #[error("history does not match the document: {0}")]
    Command(#[from] CommandError),
}

pub struct DocumentCommandQueue {
    /// Mutable inner bits.
    inner: parking_lot::RwLock<DocumentCommandQueueInner>,
}
impl Default for DocumentCommandQueue {
    fn default() -> Self {
        Self::from_state(Document::default())
    }
}
impl DocumentCommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    // Create a queue from data, without a history.
    #[must_use]
    pub fn from_state(document: Document) -> Self {
        // Dummy root transaction, never applied.
        let mut command_tree = slab_tree::Tree::new();
        let root = command_tree.set_root(Transaction::default());
        Self {
            inner: DocumentCommandQueueInner {
                command_tree,
                document,
                present: root,
                root,
            }
            .into(),
        }
    }
    /// Locks the queue for writing commands during the span of the closure, where each modification of the state is tracked
    /// by the command queue. The commands are written in order as a single transaction.
    ///
    /// If `group` is `Some` and the most recent transaction carries the same group, the commands are
    /// merged into it instead.
    pub fn write_with<F, T>(&self, group: Option<GroupId>, write: F) -> T
    where
        F: FnOnce(&mut writer::CommandQueueWriter<'_>) -> T,
    {
        let lock = self.inner.write();
        let mut writer = writer::CommandQueueWriter {
            lock,
            group,
            commands: smallvec::SmallVec::new(),
        };
        // Panic safe - `writer::CommandQueueWriter`'s Drop impl will do the cleanup ensuring the
        // queue's commands and state are synchronized.
        write(&mut writer)
    }
    /// View the document as it is at this moment.
    #[must_use]
    pub fn read(&self) -> parking_lot::MappedRwLockReadGuard<'_, Document> {
        parking_lot::RwLockReadGuard::map(self.inner.read(), |inner| &inner.document)
    }
    /// Group of the most recent transaction, if any.
    #[must_use]
    pub fn present_group(&self) -> Option<GroupId> {
        let lock = self.inner.read();
        lock.command_tree
            .get(lock.present)
            .and_then(|node| node.data().group)
    }
    /// Number of transactions between the root and the present.
    #[must_use]
    pub fn depth(&self) -> usize {
        let lock = self.inner.read();
        lock.command_tree
            .get(lock.present)
            .map_or(0, |node| node.ancestors().count())
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        let lock = self.inner.read();
        lock.present != lock.root
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        let lock = self.inner.read();
        lock.command_tree
            .get(lock.present)
            .is_some_and(|node| node.last_child().is_some())
    }
    /// Step back up to `num` transactions. Returns whether anything changed.
    pub fn undo_n(&self, num: usize) -> Result<bool, QueueError> {
        // Linearly walk up the tree num steps.
        let mut lock = self.inner.write();
        let start = lock.present;
        let ancestors = lock
            .command_tree
            .get(start)
            .ok_or(TraverseError::NotFound)?
            .ancestors();
        let end = ancestors.take(num).last().map_or(lock.root, |node| node.node_id());
        Self::move_to(&mut lock, end)
    }
    /// Step forward up to `num` transactions along the most recent branch.
    /// Returns whether anything changed.
    pub fn redo_n(&self, num: usize) -> Result<bool, QueueError> {
        // Step down the tree, taking the last (most recent) child every time.
        let mut lock = self.inner.write();
        let mut end = lock.present;
        for _ in 0..num {
            let this = lock.command_tree.get(end).ok_or(TraverseError::NotFound)?;
            let Some(last_child) = this.last_child() else {
                // We've gone as deep as we can go!
                break;
            };
            end = last_child.node_id();
        }
        Self::move_to(&mut lock, end)
    }
    /// Replay the path from the present to `end`. The document is only replaced once the whole
    /// path applied cleanly.
    fn move_to(inner: &mut DocumentCommandQueueInner, end: slab_tree::NodeId) -> Result<bool, QueueError> {
        let start = inner.present;
        if start == end {
            return Ok(false);
        }
        let mut document = inner.document.clone();
        for command in traverse(&inner.command_tree, start, end)? {
            document.apply(command)?;
        }
        inner.document = document;
        inner.present = end;
        // Changed if we ended up in a different spot!
        Ok(true)
    }
}

// Traverses the shortest path from one tree node to another.
// A traversal is an optional walk up to the closest ancestor, followed by walking down.
struct TreeTraverser<'t, T> {
    // current point of the traversal
    cur: slab_tree::NodeRef<'t, T>,
    tree: &'t slab_tree::Tree<T>,

    // Common ancestor. May be equal to end, but never equal to start (we'd be walking down then).
    // Or None if we're walking down (i.e. start *is* the common ancestor)
    ancestor: Option<slab_tree::NodeId>,
    // Path from the end up to the ancestor. Includes the ID of the branch point and the child idx.
    path_down: Vec<(slab_tree::NodeId, usize)>,
    // destination of the traversal.
    end: slab_tree::NodeId,
}

impl<'t, T> Iterator for TreeTraverser<'t, T> {
    type Item = commands::DoUndo<'t, T>;
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ancestor) = self.ancestor {
            // Ancestor is Some, we're going up!
            // Undo, then move cur
            let result = commands::DoUndo::Undo(self.cur.data());
            // Move up. Parent will be some, as we know there's a common ancestor.
            // Kinda silly code, as NodeRef.parent borrows the ref, not the tree.
            self.cur = self.tree.get(self.cur.parent()?.node_id())?;

            // We've reached the top of traversal! Go down now.
            if self.cur.node_id() == ancestor {
                self.ancestor = None;
            }

            Some(result)
        } else {
            // We made it!
            if self.cur.node_id() == self.end {
                return None;
            }

            // Ancestor is None, going down.
            // Move cur, then "Do" (opposite order)

            // Last item will be next path to go down. Only consume it if the node id matches,
            // Otherwise default to first child.
            let child_idx = match self.path_down.last().copied() {
                Some((node_id, child_idx)) if node_id == self.cur.node_id() => {
                    self.path_down.pop();
                    child_idx
                }
                _ => 0,
            };
            self.cur = self
                .tree
                .get(self.cur.children().nth(child_idx)?.node_id())?;

            Some(commands::DoUndo::Do(self.cur.data()))
        }
    }
}

/// Find the ID of the nearest ancestor of A and B, or None if the IDs do not come from the same tree.
/// The endpoints themselves could be the ancestor, if one is a parent of another!
fn nearest_ancestor<T>(
    tree: &slab_tree::Tree<T>,
    a: slab_tree::NodeId,
    b: slab_tree::NodeId,
) -> Result<slab_tree::NodeId, TraverseError> {
    let a_node = tree.get(a).ok_or(TraverseError::NotFound)?;
    let b_node = tree.get(b).ok_or(TraverseError::NotFound)?;

    // Collect the ID of A, followed by the ancestors of A.
    let parents_of_a: Vec<_> = std::iter::once(a)
        .chain(a_node.ancestors().map(|node| node.node_id()))
        .collect();
    // Iterate over the ID of B, followed by the ancestors of B, and find the first one
    // that is shared. Because of traversal order this will be the nearest ancestor!
    // Won't be found if they come from different trees within the same structure.
    std::iter::once(b)
        .chain(b_node.ancestors().map(|node| node.node_id()))
        .find(|b_ancestor| parents_of_a.contains(b_ancestor))
        .ok_or(TraverseError::Disconnected)
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TraverseError {
    #[error("can't traverse disconnected subtrees")]
    Disconnected,
    #[error("ID not present in tree")]
    NotFound,
}
/// Create an iterator that traverses the shortest path between start and end nodes, or an error if
/// the start and end nodes are not from the same tree.
fn traverse<T>(
    tree: &slab_tree::Tree<T>,
    start: slab_tree::NodeId,
    end: slab_tree::NodeId,
) -> Result<TreeTraverser<'_, T>, TraverseError> {
    let ancestor = nearest_ancestor(tree, start, end)?;

    // Find the path from the ancestor to the end.
    // This is expensive!
    let mut path_down = Vec::<(slab_tree::NodeId, usize)>::new();
    // Early escape if end is the nearest ancestor -
    // There will be no drilling down phase of the traversal.
    if ancestor != end {
        let mut cur_ref = tree.get(end).ok_or(TraverseError::NotFound)?;
        loop {
            // Some, as we know there's a common ancestor. Will break before this becomes None.
            let parent = cur_ref.parent().ok_or(TraverseError::Disconnected)?;
            let child_idx = parent
                .children()
                .position(|node| node.node_id() == cur_ref.node_id())
                .ok_or(TraverseError::NotFound)?;
            // Default to the zero'th child. That way, nodes with only one child won't
            // be collected, otherwise we're just storing the whole tree! :P
            if child_idx != 0 {
                path_down.push((parent.node_id(), child_idx));
            }

            if parent.node_id() == ancestor {
                break;
            }
            cur_ref = tree.get(parent.node_id()).ok_or(TraverseError::NotFound)?;
        }
    }

    Ok(TreeTraverser {
        cur: tree.get(start).ok_or(TraverseError::NotFound)?,
        tree,
        ancestor: (ancestor != start).then_some(ancestor),
        path_down,
        end,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::Point;
    use crate::state::Element;
    use crate::style::Style;

    fn add_stroke(queue: &DocumentCommandQueue, group: Option<GroupId>) -> crate::state::ElementId {
        queue
            .write_with(group, |writer| {
                writer
                    .document()
                    .create(Element::stroke(Point::ZERO, Style::default(), None))
            })
            .unwrap()
    }

    #[test]
    fn undo_redo_linear() {
        let queue = DocumentCommandQueue::new();
        let a = add_stroke(&queue, None);
        let b = add_stroke(&queue, None);
        assert_eq!(queue.depth(), 2);

        assert_eq!(queue.undo_n(1), Ok(true));
        assert!(queue.read().contains(a));
        assert!(!queue.read().contains(b));
        assert!(queue.can_redo());

        assert_eq!(queue.redo_n(5), Ok(true));
        assert!(queue.read().contains(b));
        assert_eq!(queue.redo_n(1), Ok(false));

        assert_eq!(queue.undo_n(10), Ok(true));
        assert!(queue.read().is_empty());
        assert!(!queue.can_undo());
        assert_eq!(queue.undo_n(1), Ok(false));
    }
    #[test]
    fn new_writes_branch() {
        let queue = DocumentCommandQueue::new();
        let a = add_stroke(&queue, None);
        queue.undo_n(1).unwrap();
        let b = add_stroke(&queue, None);
        // The most recent branch wins on redo.
        queue.undo_n(1).unwrap();
        queue.redo_n(1).unwrap();
        assert!(queue.read().contains(b));
        assert!(!queue.read().contains(a));
    }
    #[test]
    fn grouped_writes_merge() {
        let queue = DocumentCommandQueue::new();
        let group = GroupId::default();
        let id = add_stroke(&queue, Some(group));
        for i in 1..=5 {
            queue
                .write_with(Some(group), |writer| {
                    writer
                        .document()
                        .append_point(id, Point::new(i as f32, 0.0), None)
                })
                .unwrap();
        }
        assert_eq!(queue.depth(), 1);
        assert_eq!(queue.present_group(), Some(group));

        // A different group, or none, never merges.
        add_stroke(&queue, None);
        add_stroke(&queue, Some(GroupId::default()));
        assert_eq!(queue.depth(), 3);
    }
    #[test]
    fn empty_writes_leave_no_history() {
        let queue = DocumentCommandQueue::new();
        let changed = queue.write_with(None, |writer| writer.changed());
        assert!(!changed);
        assert_eq!(queue.depth(), 0);
    }
}
