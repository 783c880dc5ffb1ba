//! Recorded input traces, replayed against a [`Whiteboard`].
//!
//! ```toml
//! [[elements]]
//! type = "image"
//! origin = [10.0, 10.0]
//! width = 40.0
//! height = 30.0
//!
//! [[events]]
//! kind = "down"
//! x = 100.0
//! y = 100.0
//! pressure = 0.4
//!
//! [[events]]
//! kind = "frame"
//! ```

use scrawl_core::input::{Modifiers, PointerEvent, PointerSample};
use scrawl_core::state::{Document, Element, ElementRecord};
use scrawl_core::Whiteboard;

#[derive(serde::Deserialize, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    Down {
        x: f32,
        y: f32,
        #[serde(default)]
        pressure: Option<f32>,
        /// Extend the selection.
        #[serde(default)]
        shift: bool,
    },
    Move {
        x: f32,
        y: f32,
        #[serde(default)]
        pressure: Option<f32>,
    },
    Up {
        x: f32,
        y: f32,
        #[serde(default)]
        pressure: Option<f32>,
    },
    /// A display refresh.
    Frame,
    /// A tool shortcut key.
    Tool {
        key: char,
    },
    Undo,
    Redo,
    Cancel,
}

fn sample(x: f32, y: f32, pressure: Option<f32>) -> PointerSample {
    PointerSample {
        pressure,
        ..PointerSample::at(x, y)
    }
}

#[derive(serde::Deserialize, Debug, Default)]
#[serde(default)]
pub struct Trace {
    pub elements: Vec<ElementRecord>,
    pub events: Vec<Event>,
}
impl Trace {
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(source)?)
    }
    /// The starting document.
    pub fn document(&self) -> anyhow::Result<Document> {
        let elements = self
            .elements
            .iter()
            .cloned()
            .map(Element::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Document::from_elements(elements))
    }
    /// Feed every event to `board`. An interaction still open at the end is abandoned.
    pub fn replay(&self, board: &mut Whiteboard) {
        for event in &self.events {
            match *event {
                Event::Down {
                    x,
                    y,
                    pressure,
                    shift,
                } => {
                    let modifiers = if shift {
                        Modifiers::SHIFT
                    } else {
                        Modifiers::empty()
                    };
                    board.dispatch(PointerEvent::Down(sample(x, y, pressure), modifiers));
                }
                Event::Move { x, y, pressure } => {
                    board.dispatch(PointerEvent::Move(sample(x, y, pressure)));
                }
                Event::Up { x, y, pressure } => {
                    board.dispatch(PointerEvent::Up(sample(x, y, pressure)));
                }
                Event::Frame => board.on_frame(),
                Event::Tool { key } => {
                    if !board.shortcut(key) {
                        log::warn!("{key:?} is not a tool shortcut");
                    }
                }
                Event::Undo => {
                    if let Err(err) = board.undo() {
                        log::error!("undo failed: {err}");
                    }
                }
                Event::Redo => {
                    if let Err(err) = board.redo() {
                        log::error!("redo failed: {err}");
                    }
                }
                Event::Cancel => board.cancel_interaction(),
            }
        }
        if board.is_dragging() {
            log::info!("trace ended mid-interaction, abandoning it");
            board.cancel_interaction();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use scrawl_core::config::Config;

    const TRACE: &str = r#"
        [[elements]]
        type = "image"
        origin = [10.0, 10.0]
        width = 40.0
        height = 30.0

        [[events]]
        kind = "down"
        x = 100.0
        y = 100.0
        pressure = 0.4
        [[events]]
        kind = "move"
        x = 140.0
        y = 120.0
        [[events]]
        kind = "frame"
        [[events]]
        kind = "up"
        x = 150.0
        y = 130.0

        [[events]]
        kind = "tool"
        key = "v"
        [[events]]
        kind = "down"
        x = 0.0
        y = 0.0
        [[events]]
        kind = "up"
        x = 199.0
        y = 199.0
    "#;

    #[test]
    fn parses() {
        let trace = Trace::from_toml_str(TRACE).unwrap();
        assert_eq!(trace.elements.len(), 1);
        assert_eq!(trace.events.len(), 7);
        assert_eq!(
            trace.events[0],
            Event::Down {
                x: 100.0,
                y: 100.0,
                pressure: Some(0.4),
                shift: false
            }
        );
        assert_eq!(trace.events[4], Event::Tool { key: 'v' });
    }
    #[test]
    fn replays() {
        let trace = Trace::from_toml_str(TRACE).unwrap();
        let mut board = Whiteboard::with_document(Config::default(), trace.document().unwrap());
        trace.replay(&mut board);

        let document = board.document();
        assert_eq!(document.len(), 2);
        // The marquee covered both.
        assert!(document.iter().all(Element::is_selected));
        let stroke = document.iter().nth(1).unwrap().as_stroke().unwrap();
        assert_eq!(stroke.points().len(), 3);
        assert!(stroke.is_final());
    }
    #[test]
    fn empty_trace() {
        let trace = Trace::from_toml_str("").unwrap();
        assert!(trace.events.is_empty());
        assert!(trace.document().unwrap().is_empty());
    }
}
