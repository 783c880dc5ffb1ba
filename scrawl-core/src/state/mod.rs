//! # State
//!
//! The document: an ordered collection of [`Element`]s, modified only through [`commands`].

pub mod commands;
pub mod element;
pub mod writer;

pub use element::{Element, ElementError, ElementId, ElementKind, ElementRecord};

use crate::commands::{CommandConsumer, CommandError, DoUndo, Transaction};

/// Active tool, deciding what a pointer-down does. Switching tools is never recorded in history.
#[derive(Copy, Clone, Default, strum::EnumIter, Hash, PartialEq, Eq, Debug)]
pub enum Tool {
    /// Area selection.
    Selector,
    Shape,
    #[default]
    Freedraw,
    Text,
    Image,
}
impl Tool {
    #[must_use]
    pub fn shortcut(self) -> Option<char> {
        match self {
            Self::Selector => Some('v'),
            Self::Shape => Some('r'),
            Self::Freedraw => Some('x'),
            Self::Text => Some('t'),
            Self::Image => None,
        }
    }
    #[must_use]
    pub fn from_shortcut(key: char) -> Option<Self> {
        use strum::IntoEnumIterator;
        let key = key.to_ascii_lowercase();
        Self::iter().find(|tool| tool.shortcut() == Some(key))
    }
}

/// Elements, in draw order.
#[derive(Clone, Default, Debug)]
pub struct Document {
    order: Vec<ElementId>,
    elements: hashbrown::HashMap<ElementId, Element>,
}
// Public methods for access by the client
impl Document {
    /// Build a document from existing elements, without history.
    /// Later duplicates of an id are dropped.
    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut this = Self::default();
        for element in elements {
            if this.elements.contains_key(&element.id()) {
                log::warn!("dropping duplicate element {}", element.id());
                continue;
            }
            this.insert(this.order.len(), element);
        }
        this
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }
    /// Position in the draw order.
    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }
    /// Iterate in draw order, bottom-most first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Element> + '_ {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }
    #[must_use]
    pub fn records(&self) -> Vec<ElementRecord> {
        self.iter().map(ElementRecord::from).collect()
    }
}
// Private methods for modification by the writer/command applier
impl Document {
    fn insert(&mut self, index: usize, element: Element) {
        self.order.insert(index, element.id());
        self.elements.insert(element.id(), element);
    }
    fn remove(&mut self, id: ElementId) -> Option<(usize, Element)> {
        let index = self.index_of(id)?;
        self.order.remove(index);
        let element = self.elements.remove(&id)?;
        Some((index, element))
    }
    fn get_mut(&mut self, id: ElementId) -> Result<&mut Element, CommandError> {
        self.elements
            .get_mut(&id)
            .ok_or(CommandError::UnknownResource)
    }
}

impl CommandConsumer<commands::Command> for Document {
    fn apply(&mut self, command: DoUndo<'_, commands::Command>) -> Result<(), CommandError> {
        use commands::Command;
        match command {
            DoUndo::Do(Command::Created(element)) => {
                if self.contains(element.id()) {
                    return Err(CommandError::MismatchedState);
                }
                let mut element = Element::clone(element);
                element.touch();
                self.insert(self.order.len(), element);
                Ok(())
            }
            DoUndo::Undo(Command::Created(element)) => self
                .remove(element.id())
                .map(|_| ())
                .ok_or(CommandError::UnknownResource),
            DoUndo::Do(Command::Removed { element, index }) => {
                if self.index_of(element.id()) != Some(*index) {
                    return Err(CommandError::MismatchedState);
                }
                self.remove(element.id());
                Ok(())
            }
            DoUndo::Undo(Command::Removed { element, index }) => {
                if self.contains(element.id()) || *index > self.order.len() {
                    return Err(CommandError::MismatchedState);
                }
                let mut element = Element::clone(element);
                element.touch();
                self.insert(*index, element);
                Ok(())
            }
            DoUndo::Do(Command::AppendPoint {
                target,
                point,
                pressure,
            }) => {
                let element = self.get_mut(*target)?;
                let stroke = element.stroke_mut().ok_or(CommandError::MismatchedState)?;
                if stroke.is_final() || !stroke.push(*point, *pressure) {
                    return Err(CommandError::MismatchedState);
                }
                element.touch();
                Ok(())
            }
            DoUndo::Undo(Command::AppendPoint {
                target,
                point,
                pressure,
            }) => {
                let element = self.get_mut(*target)?;
                let stroke = element.stroke_mut().ok_or(CommandError::MismatchedState)?;
                if stroke.is_final() || !stroke.pop_matching(*point, *pressure) {
                    return Err(CommandError::MismatchedState);
                }
                element.touch();
                Ok(())
            }
            DoUndo::Do(Command::Finalized { target })
            | DoUndo::Undo(Command::Finalized { target }) => {
                let new_final = matches!(command, DoUndo::Do(_));
                let element = self.get_mut(*target)?;
                let stroke = element.stroke_mut().ok_or(CommandError::MismatchedState)?;
                if stroke.is_final() == new_final {
                    return Err(CommandError::MismatchedState);
                }
                stroke.set_final(new_final);
                element.touch();
                Ok(())
            }
            DoUndo::Do(Command::Restyle { target, from, to })
            | DoUndo::Undo(Command::Restyle {
                target,
                to: from,
                from: to,
            }) => {
                let element = self.get_mut(*target)?;
                if element.style() != from {
                    return Err(CommandError::MismatchedState);
                }
                element.set_style(*to);
                element.touch();
                Ok(())
            }
            DoUndo::Do(Command::Selected { target, from, to })
            | DoUndo::Undo(Command::Selected {
                target,
                to: from,
                from: to,
            }) => {
                let element = self.get_mut(*target)?;
                if element.is_selected() != *from {
                    return Err(CommandError::MismatchedState);
                }
                element.set_selected(*to);
                element.touch();
                Ok(())
            }
        }
    }
}

impl CommandConsumer<Transaction> for Document {
    /// Applies every command of the transaction, in reverse order when undoing. If any fails, the
    /// ones already applied are rolled back.
    fn apply(&mut self, command: DoUndo<'_, Transaction>) -> Result<(), CommandError> {
        let (DoUndo::Do(transaction) | DoUndo::Undo(transaction)) = command;
        let ordered: Vec<_> = match command {
            DoUndo::Do(_) => transaction.commands.iter().collect(),
            DoUndo::Undo(_) => transaction.commands.iter().rev().collect(),
        };
        for (applied, inner) in ordered.iter().enumerate() {
            if let Err(err) = self.apply(command.with(*inner)) {
                for done in ordered[..applied].iter().rev() {
                    // Reversing what just succeeded can't mismatch.
                    let _ = self.apply(command.with(*done).inverse());
                }
                return Err(err);
            }
        }
        Ok(())
    }
}
