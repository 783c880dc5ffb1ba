use super::commands::Command;
use super::element::{Element, ElementId};
use super::Document;
use crate::commands::{CommandConsumer, CommandError, DoUndo};
use crate::geometry::Point;
use crate::queue::writer::CommandWrite;
use crate::style::Style;

/// Modifies a [`Document`], recording each change into `Writer`.
pub struct DocumentWriter<'s, Writer: CommandWrite<Command>> {
    document: &'s mut Document,
    writer: Writer,
}
impl<'s, Writer: CommandWrite<Command>> std::ops::Deref for DocumentWriter<'s, Writer> {
    type Target = Document;
    fn deref(&self) -> &Self::Target {
        &*self.document
    }
}
impl<'s, Writer: CommandWrite<Command>> DocumentWriter<'s, Writer> {
    pub fn new(writer: Writer, document: &'s mut Document) -> Self {
        Self { document, writer }
    }
    /// Apply, and record only if that succeeded.
    fn submit(&mut self, command: Command) -> Result<(), CommandError> {
        self.document.apply(DoUndo::Do(&command))?;
        self.writer.write(command);
        Ok(())
    }
    /// Append an element to the top of the draw order.
    pub fn create(&mut self, element: Element) -> Result<ElementId, CommandError> {
        let id = element.id();
        self.submit(Command::Created(Box::new(element)))?;
        Ok(id)
    }
    pub fn remove(&mut self, id: ElementId) -> Result<(), CommandError> {
        let index = self
            .document
            .index_of(id)
            .ok_or(CommandError::UnknownResource)?;
        let element = self
            .document
            .get(id)
            .cloned()
            .ok_or(CommandError::UnknownResource)?;
        self.submit(Command::Removed {
            element: Box::new(element),
            index,
        })
    }
    /// Append a point to a stroke. The pressure is dropped if the stroke doesn't track pressure,
    /// and defaulted if it does but none was given.
    pub fn append_point(
        &mut self,
        target: ElementId,
        point: Point,
        pressure: Option<f32>,
    ) -> Result<(), CommandError> {
        let tracks_pressure = self
            .document
            .get(target)
            .ok_or(CommandError::UnknownResource)?
            .as_stroke()
            .ok_or(CommandError::MismatchedState)?
            .tracks_pressure();
        let pressure = tracks_pressure.then(|| pressure.unwrap_or(0.5));
        self.submit(Command::AppendPoint {
            target,
            point,
            pressure,
        })
    }
    pub fn finalize(&mut self, target: ElementId) -> Result<(), CommandError> {
        self.submit(Command::Finalized { target })
    }
    pub fn restyle(&mut self, target: ElementId, style: Style) -> Result<(), CommandError> {
        let from = *self
            .document
            .get(target)
            .ok_or(CommandError::UnknownResource)?
            .style();
        if from == style {
            return Err(CommandError::NoOp);
        }
        self.submit(Command::Restyle {
            target,
            from,
            to: style,
        })
    }
    pub fn set_selected(&mut self, target: ElementId, selected: bool) -> Result<(), CommandError> {
        let from = self
            .document
            .get(target)
            .ok_or(CommandError::UnknownResource)?
            .is_selected();
        if from == selected {
            return Err(CommandError::NoOp);
        }
        self.submit(Command::Selected {
            target,
            from,
            to: selected,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_successful_writes_are_recorded() {
        let mut document = Document::default();
        let mut log = Vec::<Command>::new();
        let mut writer = DocumentWriter::new(&mut log, &mut document);

        let id = writer
            .create(Element::stroke(Point::ZERO, Style::default(), None))
            .unwrap();
        writer.append_point(id, Point::new(1.0, 2.0), Some(0.9)).unwrap();
        assert_eq!(writer.set_selected(id, false), Err(CommandError::NoOp));
        assert_eq!(
            writer.finalize(ElementId::default()),
            Err(CommandError::UnknownResource)
        );
        drop(writer);

        assert_eq!(log.len(), 2);
        // Untracked pressure is dropped rather than rejected.
        assert!(matches!(
            log[1],
            Command::AppendPoint { pressure: None, .. }
        ));
    }
}
