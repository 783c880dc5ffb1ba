//! # Commands
//!
//! Commands are the way the shared state of the document is modified. Every change is recorded as a
//! [`Command`] by a [`queue::writer`](crate::queue::writer), and related commands are bundled into
//! one [`Transaction`] which undoes and redoes as a single step.

pub use crate::state::commands::Command;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("command constructed for a state that does not match the current state")]
    MismatchedState,
    #[error("resource referenced by the command is not found")]
    UnknownResource,
    #[error("command makes no changes")]
    NoOp,
}
pub trait CommandConsumer<C> {
    /// Apply a single command. If this generates an error,
    /// the state of `self` should *not* be observably changed.
    fn apply(&mut self, command: DoUndo<'_, C>) -> Result<(), CommandError>;
}

/// Many commands that the user sees as one action.
#[derive(Clone, Debug, Default)]
pub struct Transaction {
    /// Continuous interactions tag every write with the same group, so they merge into one
    /// transaction. `None` for discrete actions, which are never merged.
    pub group: Option<crate::history::GroupId>,
    pub commands: Vec<Command>,
}

#[derive(PartialEq, Eq, Debug)]
pub enum DoUndo<'c, T> {
    Do(&'c T),
    Undo(&'c T),
}
// Derive would require `T: Copy`, but only the reference is copied.
impl<T> Clone for DoUndo<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for DoUndo<'_, T> {}
impl<'c, T> DoUndo<'c, T> {
    /// The same direction, for a different command.
    #[must_use]
    pub fn with<U>(&self, command: &'c U) -> DoUndo<'c, U> {
        match self {
            Self::Do(_) => DoUndo::Do(command),
            Self::Undo(_) => DoUndo::Undo(command),
        }
    }
    /// The opposite direction, for the same command.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match *self {
            Self::Do(c) => Self::Undo(c),
            Self::Undo(c) => Self::Do(c),
        }
    }
}
