//! # Stroke sessions
//!
//! Turns raw pointer events into document writes. One pointer-down to pointer-up span is a
//! session: a freehand stroke grown point by point inside one history group, or an area selection
//! dragged out as a marquee.
//!
//! Moves are throttled to one write per frame. Pointer-up flushes whatever is still queued, so the
//! stroke always ends where the pointer was released.

use crate::board::Canvas;
use crate::bounds::{self, Rect};
use crate::commands::CommandError;
use crate::config::Config;
use crate::geometry::{outline::nudge_terminal, Point};
use crate::history::{ActionKind, GroupId};
use crate::input::{Modifiers, PointerSample};
use crate::scheduler::FrameThrottle;
use crate::state::{Element, ElementId, Tool};

enum Kind {
    Stroke {
        element: ElementId,
        origin: Point,
    },
    Selection {
        anchor: Point,
        /// Topmost element under the pointer-down, picked if the pointer never moved.
        hit: Option<ElementId>,
        modifiers: Modifiers,
    },
}

struct Session {
    kind: Kind,
    last_sample: PointerSample,
    group: Option<GroupId>,
    on_move: FrameThrottle<PointerSample, Canvas>,
}

#[derive(Default)]
pub struct StrokeController {
    session: Option<Session>,
}
impl StrokeController {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }
    /// The stroke being drawn, if any.
    #[must_use]
    pub fn active_stroke(&self) -> Option<ElementId> {
        match self.session.as_ref()?.kind {
            Kind::Stroke { element, .. } => Some(element),
            Kind::Selection { .. } => None,
        }
    }
    pub fn pointer_down(
        &mut self,
        canvas: &mut Canvas,
        tool: Tool,
        sample: PointerSample,
        modifiers: Modifiers,
        config: &Config,
    ) {
        if self.session.is_some() {
            log::debug!("pointer-down with a session still open, finishing it");
            self.recover(canvas);
        }
        let position = sample.position;
        if !position.is_finite() {
            log::debug!("ignoring pointer-down at non-finite {position:?}");
            return;
        }
        let mode = config.throttle_mode();
        self.session = match tool {
            Tool::Freedraw => {
                let group = canvas.history.begin_group();
                let pressure = config
                    .stroke
                    .use_pressure
                    .then(|| sample.usable_pressure())
                    .flatten();
                let created = canvas.write(ActionKind::Continuous, |document| {
                    document.create(Element::stroke(position, config.stroke.style(), pressure))
                });
                match created {
                    Ok(element) => {
                        canvas.refresh(element);
                        Some(Session {
                            kind: Kind::Stroke {
                                element,
                                origin: position,
                            },
                            last_sample: sample,
                            group: Some(group),
                            on_move: FrameThrottle::wrap(
                                mode,
                                move |canvas: &mut Canvas, sample: PointerSample| {
                                    append_sample(canvas, element, position, sample);
                                },
                            ),
                        })
                    }
                    Err(err) => {
                        log::error!("could not start stroke: {err}");
                        canvas.history.end_group();
                        None
                    }
                }
            }
            Tool::Selector => {
                let hit = bounds::element_at(position, canvas.document.read().iter());
                canvas.marquee = Some(Rect::from_corners(position, position));
                Some(Session {
                    kind: Kind::Selection {
                        anchor: position,
                        hit,
                        modifiers,
                    },
                    last_sample: sample,
                    group: None,
                    on_move: FrameThrottle::wrap(
                        mode,
                        move |canvas: &mut Canvas, sample: PointerSample| {
                            canvas.marquee = Some(Rect::from_corners(position, sample.position));
                        },
                    ),
                })
            }
            Tool::Shape | Tool::Text | Tool::Image => {
                log::trace!("{tool:?} has no pointer interaction");
                None
            }
        };
    }
    /// Queue a move for the next frame. Ignored outside of a session.
    pub fn pointer_move(&mut self, sample: PointerSample) {
        if let Some(session) = &mut self.session {
            session.last_sample = sample;
            session.on_move.call(sample);
        }
    }
    pub fn on_frame(&mut self, canvas: &mut Canvas) {
        if let Some(session) = &mut self.session {
            session.on_move.on_frame(canvas);
        }
    }
    /// End the session at `sample`. Queued moves run first.
    pub fn pointer_up(&mut self, canvas: &mut Canvas, sample: PointerSample) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.on_move.flush(canvas);
        match session.kind {
            Kind::Stroke { element, origin } => {
                let terminal = sample.position.sub(origin);
                finish_stroke(canvas, element, session.group, terminal, sample);
            }
            Kind::Selection {
                anchor,
                hit,
                modifiers,
            } => {
                canvas.marquee = None;
                let rect = Rect::from_corners(anchor, sample.position);
                let wanted = if rect.is_empty() {
                    hit.into_iter().collect()
                } else {
                    bounds::hit_test(&rect, canvas.document.read().iter())
                };
                let additive = modifiers.contains(Modifiers::SHIFT);
                if let Err(err) = apply_selection(canvas, wanted, additive) {
                    log::warn!("selection failed: {err}");
                }
            }
        }
    }
    /// Finish a session whose pointer-up never arrived, as if it arrived at the last known sample.
    pub fn recover(&mut self, canvas: &mut Canvas) {
        if let Some(last) = self.session.as_ref().map(|session| session.last_sample) {
            self.pointer_up(canvas, last);
        }
    }
    /// Tear down without running queued moves. The stroke keeps what was already committed.
    pub fn abort(&mut self, canvas: &mut Canvas) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.on_move.cancel();
        canvas.marquee = None;
        if let Kind::Stroke { element, .. } = session.kind {
            let finalized = canvas
                .document
                .write_with(session.group, |writer| writer.document().finalize(element));
            if let Err(err) = finalized {
                log::warn!("could not finalize aborted stroke {element}: {err}");
            }
            close_group(canvas, session.group);
            canvas.refresh(element);
        }
    }
}

fn append_sample(canvas: &mut Canvas, element: ElementId, origin: Point, sample: PointerSample) {
    if !sample.position.is_finite() {
        log::debug!("dropped non-finite sample for {element}");
        return;
    }
    let point = sample.position.sub(origin);
    let last = canvas
        .document
        .read()
        .get(element)
        .and_then(Element::as_stroke)
        .map(crate::state::element::StrokeData::last_point);
    if last == Some(point) {
        return;
    }
    let appended = canvas.write(ActionKind::Continuous, |document| {
        document.append_point(element, point, sample.usable_pressure())
    });
    match appended {
        Ok(()) => canvas.refresh(element),
        Err(err) => log::warn!("dropped sample for {element}: {err}"),
    }
}

/// The point to commit on pointer-up, relative to the stroke origin, if any.
///
/// A duplicate of the last point is skipped, except on a click where every point coincides: then
/// the terminal is nudged so the dot has an area. A non-finite terminal is never committed.
fn final_point(points: &[Point], terminal: Point) -> Option<Point> {
    if !terminal.is_finite() {
        None
    } else if points.iter().all(|point| *point == terminal) {
        Some(nudge_terminal(terminal, terminal))
    } else if points.last() == Some(&terminal) {
        None
    } else {
        Some(terminal)
    }
}

fn finish_stroke(
    canvas: &mut Canvas,
    element: ElementId,
    group: Option<GroupId>,
    terminal: Point,
    sample: PointerSample,
) {
    let last = canvas
        .document
        .read()
        .get(element)
        .and_then(Element::as_stroke)
        .and_then(|stroke| final_point(stroke.points(), terminal));
    let finished = canvas.document.write_with(group, |writer| {
        let mut document = writer.document();
        if let Some(point) = last {
            document.append_point(element, point, sample.usable_pressure())?;
        }
        document.finalize(element)
    });
    if let Err(err) = finished {
        log::warn!("could not finish stroke {element}: {err}");
    }
    close_group(canvas, group);
    canvas.refresh(element);
}

/// Close the history group, unless something else already replaced it.
fn close_group(canvas: &mut Canvas, group: Option<GroupId>) {
    if group.is_some() && canvas.history.active() == group {
        canvas.history.end_group();
    }
}

/// Set the selection to `wanted`, or to its union with the current selection if `additive`.
/// All changes form one discrete history entry.
pub fn apply_selection(
    canvas: &mut Canvas,
    wanted: hashbrown::HashSet<ElementId>,
    additive: bool,
) -> Result<(), CommandError> {
    let changes: Vec<(ElementId, bool)> = canvas
        .document
        .read()
        .iter()
        .filter_map(|element| {
            let selected = element.is_selected();
            let want = wanted.contains(&element.id()) || (additive && selected);
            (want != selected).then_some((element.id(), want))
        })
        .collect();
    if changes.is_empty() {
        return Ok(());
    }
    canvas.write(ActionKind::OneShot, |document| {
        changes
            .iter()
            .try_for_each(|&(id, selected)| document.set_selected(id, selected))
    })?;
    for (id, _) in changes {
        canvas.refresh(id);
    }
    Ok(())
}
