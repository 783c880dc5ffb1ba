//! # Whiteboard
//!
//! The surface the host talks to: feed it pointer events and frame ticks, ask it to render.
//! Internally it is split into the [`Canvas`] (document, history, caches) that interactions
//! mutate, and the [`StrokeController`] driving the interaction in progress.

use crate::bounds::{self, Rect};
use crate::commands::CommandError;
use crate::config::Config;
use crate::history::{ActionKind, HistoryGrouper};
use crate::input::{Modifiers, PointerEvent, PointerSample};
use crate::queue::{writer::QueuedDocumentWriter, DocumentCommandQueue, QueueError};
use crate::render::RenderCache;
use crate::session::StrokeController;
use crate::state::{Document, Element, ElementId, Tool};
use crate::style::Style;

/// Everything an interaction may change.
pub struct Canvas {
    pub document: DocumentCommandQueue,
    pub history: HistoryGrouper,
    pub cache: RenderCache,
    /// Area selection being dragged out, if any.
    pub marquee: Option<Rect>,
}
impl Canvas {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document: DocumentCommandQueue::from_state(document),
            history: HistoryGrouper::new(),
            cache: RenderCache::new(),
            marquee: None,
        }
    }
    /// Write to the document, tagged with the open history group when `kind` is continuous.
    pub fn write<T>(
        &self,
        kind: ActionKind,
        write: impl FnOnce(&mut QueuedDocumentWriter<'_>) -> T,
    ) -> T {
        self.document
            .write_with(self.history.tag(kind), |writer| write(&mut writer.document()))
    }
    /// Rebuild the cache entry of an element that just changed, or drop it if the element is gone.
    pub fn refresh(&mut self, id: ElementId) {
        let document = self.document.read();
        match document.get(id) {
            Some(element) if element.as_stroke().is_some() => {
                if let Err(err) = self.cache.rebuild(element) {
                    log::warn!("failed to rebuild {id}: {err}");
                }
            }
            Some(_) => (),
            None => self.cache.evict(id),
        }
    }
    /// Rebuild every entry not matching its element, after history moved arbitrarily.
    pub fn refresh_stale(&mut self) {
        let document = self.document.read();
        self.cache.retain(|id| document.contains(id));
        for element in document.iter().filter(|element| element.as_stroke().is_some()) {
            let cached = self.cache.peek(element.id()).map(crate::render::CacheEntry::version);
            if cached != Some(element.version()) {
                if let Err(err) = self.cache.rebuild(element) {
                    log::warn!("failed to rebuild {}: {err}", element.id());
                }
            }
        }
    }
}

pub struct Whiteboard {
    canvas: Canvas,
    strokes: StrokeController,
    config: Config,
    tool: Tool,
}
impl Whiteboard {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_document(config, Document::default())
    }
    /// Start from existing elements, with an empty history.
    #[must_use]
    pub fn with_document(config: Config, document: Document) -> Self {
        let mut canvas = Canvas::new(document);
        canvas.refresh_stale();
        Self {
            canvas,
            strokes: StrokeController::default(),
            config,
            tool: Tool::default(),
        }
    }
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }
    /// Switch tools. Not an undoable action, and never part of a history group.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            log::debug!("tool {:?} -> {tool:?}", self.tool);
            self.tool = tool;
        }
    }
    /// Switch tools by keyboard shortcut. Returns whether the key was a shortcut.
    pub fn shortcut(&mut self, key: char) -> bool {
        let Some(tool) = Tool::from_shortcut(key) else {
            return false;
        };
        self.set_tool(tool);
        true
    }
    /// View the document as it is at this moment.
    #[must_use]
    pub fn document(&self) -> parking_lot::MappedRwLockReadGuard<'_, Document> {
        self.canvas.document.read()
    }
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.strokes.is_dragging()
    }
    /// Start an interaction with the active tool. An interaction whose pointer-up never arrived
    /// is finished first.
    pub fn on_pointer_down(&mut self, sample: PointerSample, modifiers: Modifiers) {
        self.strokes
            .pointer_down(&mut self.canvas, self.tool, sample, modifiers, &self.config);
    }
    /// Route a pointer event. Moves and ups without an interaction in progress are ignored.
    pub fn dispatch(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(sample, modifiers) => self.on_pointer_down(sample, modifiers),
            PointerEvent::Move(sample) => self.strokes.pointer_move(sample),
            PointerEvent::Up(sample) => self.strokes.pointer_up(&mut self.canvas, sample),
        }
    }
    /// A display frame boundary. Runs at most one batched move.
    pub fn on_frame(&mut self) {
        self.strokes.on_frame(&mut self.canvas);
    }
    /// Abandon the interaction in progress without running queued moves.
    pub fn cancel_interaction(&mut self) {
        self.strokes.abort(&mut self.canvas);
    }
    pub fn render(&mut self, target: &mut tiny_skia::Pixmap) {
        let Canvas {
            document,
            cache,
            marquee,
            ..
        } = &mut self.canvas;
        crate::render::render(
            &document.read(),
            cache,
            *marquee,
            &self.config.render,
            target,
        );
    }
    /// Render to a new surface of the configured canvas size.
    #[must_use]
    pub fn render_to_pixmap(&mut self) -> Option<tiny_skia::Pixmap> {
        let mut target =
            tiny_skia::Pixmap::new(self.config.canvas.width, self.config.canvas.height)?;
        self.render(&mut target);
        Some(target)
    }
    /// Ids of every element strictly inside `rect`.
    #[must_use]
    pub fn hit_test(&self, rect: &Rect) -> hashbrown::HashSet<ElementId> {
        bounds::hit_test(rect, self.canvas.document.read().iter())
    }
    /// Select exactly the elements strictly inside `rect`, or add them to the selection.
    /// Recorded as one undoable step.
    pub fn select_area(&mut self, rect: &Rect, additive: bool) -> Result<(), CommandError> {
        self.settle("select_area");
        let wanted = self.hit_test(rect);
        crate::session::apply_selection(&mut self.canvas, wanted, additive)
    }
    /// Add a finished element, such as an imported image, on top.
    pub fn add_element(&mut self, element: Element) -> Result<ElementId, CommandError> {
        self.settle("add_element");
        let id = self
            .canvas
            .write(ActionKind::OneShot, |document| document.create(element))?;
        self.canvas.refresh(id);
        Ok(id)
    }
    pub fn remove(&mut self, id: ElementId) -> Result<(), CommandError> {
        self.settle("remove");
        self.canvas
            .write(ActionKind::OneShot, |document| document.remove(id))?;
        self.canvas.cache.evict(id);
        Ok(())
    }
    pub fn restyle(&mut self, id: ElementId, style: Style) -> Result<(), CommandError> {
        self.settle("restyle");
        self.canvas
            .write(ActionKind::OneShot, |document| document.restyle(id, style))?;
        self.canvas.refresh(id);
        Ok(())
    }
    /// Step back one transaction. An interaction in progress is finished first.
    pub fn undo(&mut self) -> Result<bool, QueueError> {
        self.settle("undo");
        let changed = self.canvas.document.undo_n(1)?;
        if changed {
            self.canvas.refresh_stale();
        }
        Ok(changed)
    }
    pub fn redo(&mut self) -> Result<bool, QueueError> {
        self.settle("redo");
        let changed = self.canvas.document.redo_n(1)?;
        if changed {
            self.canvas.refresh_stale();
        }
        Ok(changed)
    }
    /// Finish the interaction in progress, if any, so a discrete change never lands inside its
    /// history group.
    fn settle(&mut self, action: &str) {
        if self.strokes.is_dragging() {
            log::debug!("{action} during an interaction, finishing it first");
            self.strokes.recover(&mut self.canvas);
        }
    }
}
