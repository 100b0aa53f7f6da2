//! Pointer and touch gestures over the work area.
//!
//! A press on a target starts a [`DragGesture`] that lives until the matching
//! release. Moves are tracked globally, so a drag continues when the pointer
//! leaves the target. Presses never fall through to the surface below a target.

use crate::{session::{Action, Session}, targets::TargetId};
use eframe::egui::{Pos2, Vec2};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerSource { Mouse, Touch }

/// Mouse down/move/up and touch start/move/end, in layout-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press { source: PointerSource, pos: Pos2 },
    Move { source: PointerSource, pos: Pos2 },
    Release { source: PointerSource },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerOutcome {
    /// Press landed on a target; it is now selected and being dragged.
    Grabbed(TargetId),
    /// Press landed on the selected target's delete handle.
    Deleted(TargetId),
    /// Press on empty area placed a new target.
    Placed(TargetId),
    Dragged { target: TargetId, to: Pos2 },
    Released(TargetId),
    Ignored,
}

/// Transient state of one drag: which target and where it was grabbed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragGesture {
    pub target: TargetId,
    pub source: PointerSource,
    /// `pointer - target` at press time.
    pub offset: Vec2,
}

impl DragGesture {
    pub fn position_for(&self, pointer: Pos2) -> Pos2 { pointer - self.offset }
}

/// Single active pointer: at most one gesture at a time.
#[derive(Debug, Default)]
pub struct DragController {
    gesture: Option<DragGesture>,
}

impl DragController {
    pub fn new() -> Self { Self::default() }

    pub fn gesture(&self) -> Option<&DragGesture> { self.gesture.as_ref() }

    pub fn is_dragging(&self) -> bool { self.gesture.is_some() }

    pub fn dragging(&self) -> Option<TargetId> { self.gesture.map(|g| g.target) }

    pub fn handle(&mut self, session: &mut Session, event: PointerEvent) -> PointerOutcome {
        match event {
            PointerEvent::Press { source, pos } => self.press(session, source, pos),
            PointerEvent::Move { source, pos } => self.pointer_moved(session, source, pos),
            PointerEvent::Release { source } => self.release(source),
        }
    }

    fn press(&mut self, session: &mut Session, source: PointerSource, pos: Pos2) -> PointerOutcome {
        // a second pointer while one is dragging is not supported
        if self.gesture.is_some() { return PointerOutcome::Ignored; }

        if let Some(id) = session.delete_handle_at(pos) {
            session.apply(Action::DeleteTarget(id));
            return PointerOutcome::Deleted(id);
        }

        if let Some(id) = session.target_at(pos) {
            let Some(origin) = session.targets().get(id).map(|t| t.position) else {
                return PointerOutcome::Ignored;
            };
            session.apply(Action::Select(Some(id)));
            self.gesture = Some(DragGesture { target: id, source, offset: pos - origin });
            debug!(%id, ?source, "drag started");
            return PointerOutcome::Grabbed(id);
        }

        PointerOutcome::Placed(session.place_target(pos))
    }

    fn pointer_moved(&mut self, session: &mut Session, source: PointerSource, pos: Pos2) -> PointerOutcome {
        let Some(gesture) = self.gesture.filter(|g| g.source == source) else {
            return PointerOutcome::Ignored;
        };
        let to = gesture.position_for(pos);
        session.apply(Action::MoveTarget(gesture.target, to));
        PointerOutcome::Dragged { target: gesture.target, to }
    }

    fn release(&mut self, source: PointerSource) -> PointerOutcome {
        match self.gesture {
            Some(g) if g.source == source => {
                self.gesture = None;
                debug!(id = %g.target, "drag ended");
                PointerOutcome::Released(g.target)
            }
            _ => PointerOutcome::Ignored,
        }
    }

    /// Drops any in-flight gesture, e.g. when the session is reset.
    pub fn cancel(&mut self) { self.gesture = None; }
}
