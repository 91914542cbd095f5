//! Reversible edit operations and the undo/redo stack.
//!
//! Every mutation the editor performs is recorded as an `Operation`.
//! Operations own the thing they removed: a deleted module lives in
//! its operation's stash until redo puts it back or the history is
//! dropped. Compound frames group the primitives of one user action
//! (replacing a link deletes the old one and creates the new one) into
//! a single undo unit, and an open frame can be cancelled, which
//! unwinds its primitives in reverse.

use log::debug;

use crate::core::direction::set_port_mode;
use crate::core::error::OpError;
use crate::core::geom::Vec2;
use crate::core::link::Link;
use crate::core::modules::Module;
use crate::core::port::PortMode;
use crate::core::sim::Sim;
use crate::core::types::{EntityId, LinkId, ModuleId, RotationDir};
use crate::core::value::BinData;

/// Unhooks a link from the registry and both its ports, returning the
/// owned link. The freed target forgets its value and both ends fall
/// back to undecided direction.
pub(crate) fn detach_link(sim: &mut Sim, id: LinkId) -> Option<Link> {
    let link = sim.take_link(id)?;
    if let Some(p) = sim.port_mut(link.src) {
        p.link = None;
    }
    if let Some(p) = sim.port_mut(link.targ) {
        p.link = None;
        p.value = BinData::disconnected();
    }
    sim.propagate(link.targ.module);
    set_port_mode(sim, link.src, PortMode::Bidir);
    set_port_mode(sim, link.targ, PortMode::Bidir);
    Some(link)
}

/// Puts a link back: registry entry, port back-references, committed
/// directions, and the source's value carried across.
pub(crate) fn attach_link(sim: &mut Sim, id: LinkId, link: Link) {
    let (src, targ) = (link.src, link.targ);
    sim.insert_link(id, link);
    if let Some(p) = sim.port_mut(src) {
        p.link = Some(id);
    }
    if let Some(p) = sim.port_mut(targ) {
        p.link = Some(id);
    }
    set_port_mode(sim, src, PortMode::Output);
    set_port_mode(sim, targ, PortMode::Input);
    if let Some(val) = sim.port(src).map(|p| p.value) {
        if let Some(p) = sim.port_mut(targ) {
            p.value = val;
        }
    }
    sim.propagate(targ.module);
}

pub(crate) fn entity_pos(sim: &Sim, e: EntityId) -> Option<Vec2> {
    match e {
        EntityId::Module(id) => sim.module(id).map(|m| m.pos),
        EntityId::CtrlPt { link, index } => {
            sim.link(link).and_then(|l| l.path.points.get(index)).copied()
        }
    }
}

pub(crate) fn set_entity_pos(sim: &mut Sim, e: EntityId, pos: Vec2) {
    match e {
        EntityId::Module(id) => {
            if let Some(m) = sim.module_mut(id) {
                m.pos = pos;
            }
        }
        EntityId::CtrlPt { link, index } => {
            if let Some(p) = sim.link_mut(link).and_then(|l| l.path.points.get_mut(index)) {
                *p = pos;
            }
        }
    }
}

/// One reversible primitive. The `stash` fields hold ownership of
/// whatever the registry currently lacks.
#[derive(Debug)]
pub enum Operation {
    CreateModule {
        id: ModuleId,
        stash: Option<Module>,
    },
    DeleteModule {
        id: ModuleId,
        stash: Option<Module>,
    },
    CreateLink {
        id: LinkId,
        stash: Option<Link>,
    },
    DeleteLink {
        id: LinkId,
        stash: Option<Link>,
    },
    CreateCtrlPt {
        link: LinkId,
        index: usize,
        stash: Option<Vec2>,
    },
    DeleteCtrlPt {
        link: LinkId,
        index: usize,
        stash: Option<Vec2>,
    },
    Move {
        entity: EntityId,
        from: Vec2,
        to: Vec2,
    },
    Rotate {
        module: ModuleId,
        dir: RotationDir,
    },
}

impl Operation {
    pub fn undo(&mut self, sim: &mut Sim) {
        match self {
            Operation::CreateModule { id, stash } => {
                *stash = sim.take_module(*id);
            }
            Operation::DeleteModule { id, stash } => {
                if let Some(module) = stash.take() {
                    debug_assert_eq!(module.id, *id);
                    sim.insert_module(module);
                }
            }
            Operation::CreateLink { id, stash } => {
                *stash = detach_link(sim, *id);
            }
            Operation::DeleteLink { id, stash } => {
                if let Some(link) = stash.take() {
                    attach_link(sim, *id, link);
                }
            }
            Operation::CreateCtrlPt { link, index, stash } => {
                if let Some(l) = sim.link_mut(*link) {
                    if *index < l.path.points.len() {
                        *stash = Some(l.path.points.remove(*index));
                    }
                }
            }
            Operation::DeleteCtrlPt { link, index, stash } => {
                if let (Some(l), Some(pos)) = (sim.link_mut(*link), stash.take()) {
                    let at = (*index).min(l.path.points.len());
                    l.path.points.insert(at, pos);
                }
            }
            Operation::Move { entity, from, .. } => {
                set_entity_pos(sim, *entity, *from);
            }
            Operation::Rotate { module, dir } => {
                if let Some(m) = sim.module_mut(*module) {
                    m.rotate(dir.opposite());
                }
            }
        }
    }

    pub fn redo(&mut self, sim: &mut Sim) {
        match self {
            Operation::CreateModule { id, stash } => {
                if let Some(module) = stash.take() {
                    debug_assert_eq!(module.id, *id);
                    sim.insert_module(module);
                }
            }
            Operation::DeleteModule { id, stash } => {
                *stash = sim.take_module(*id);
            }
            Operation::CreateLink { id, stash } => {
                if let Some(link) = stash.take() {
                    attach_link(sim, *id, link);
                }
            }
            Operation::DeleteLink { id, stash } => {
                *stash = detach_link(sim, *id);
            }
            Operation::CreateCtrlPt { link, index, stash } => {
                if let (Some(l), Some(pos)) = (sim.link_mut(*link), stash.take()) {
                    let at = (*index).min(l.path.points.len());
                    l.path.points.insert(at, pos);
                }
            }
            Operation::DeleteCtrlPt { link, index, stash } => {
                if let Some(l) = sim.link_mut(*link) {
                    if *index < l.path.points.len() {
                        *stash = Some(l.path.points.remove(*index));
                    }
                }
            }
            Operation::Move { entity, to, .. } => {
                set_entity_pos(sim, *entity, *to);
            }
            Operation::Rotate { module, dir } => {
                if let Some(m) = sim.module_mut(*module) {
                    m.rotate(*dir);
                }
            }
        }
    }
}

/// Linear undo/redo history of operation frames. A frame is one user
/// action; most hold a single primitive.
#[derive(Debug, Default)]
pub struct OpStack {
    undo: Vec<Vec<Operation>>,
    redo: Vec<Vec<Operation>>,
    open: Vec<Operation>,
    depth: usize,
}

impl OpStack {
    pub fn new() -> Self {
        OpStack::default()
    }

    /// Records a completed operation. Anything that was redoable is
    /// invalidated by new history.
    pub fn push(&mut self, op: Operation) {
        if self.depth > 0 {
            self.open.push(op);
        } else {
            self.undo.push(vec![op]);
            self.redo.clear();
        }
    }

    /// Opens a compound frame; nested calls deepen the same frame.
    pub fn begin_compound(&mut self) {
        self.depth += 1;
    }

    /// Closes one nesting level. Closing the outermost level commits
    /// the frame as a single undo unit.
    pub fn end_compound(&mut self) -> Result<(), OpError> {
        if self.depth == 0 {
            return Err(OpError::MismatchedCompound);
        }
        self.depth -= 1;
        if self.depth == 0 && !self.open.is_empty() {
            let frame = std::mem::take(&mut self.open);
            self.undo.push(frame);
            self.redo.clear();
        }
        Ok(())
    }

    /// Abandons the open frame wholesale, undoing its primitives in
    /// reverse. Cancellation applies to the whole frame no matter how
    /// deeply nested the caller is.
    pub fn cancel_compound(&mut self, sim: &mut Sim) -> Result<(), OpError> {
        if self.depth == 0 {
            return Err(OpError::MismatchedCompound);
        }
        let mut frame = std::mem::take(&mut self.open);
        for op in frame.iter_mut().rev() {
            op.undo(sim);
        }
        self.depth = 0;
        debug!("cancelled a compound frame of {} operations", frame.len());
        Ok(())
    }

    pub fn undo(&mut self, sim: &mut Sim) -> Result<(), OpError> {
        if self.depth > 0 {
            return Err(OpError::MismatchedCompound);
        }
        let mut frame = self.undo.pop().ok_or(OpError::UndoEmpty)?;
        for op in frame.iter_mut().rev() {
            op.undo(sim);
        }
        self.redo.push(frame);
        Ok(())
    }

    pub fn redo(&mut self, sim: &mut Sim) -> Result<(), OpError> {
        if self.depth > 0 {
            return Err(OpError::MismatchedCompound);
        }
        let mut frame = self.redo.pop().ok_or(OpError::RedoEmpty)?;
        for op in frame.iter_mut() {
            op.redo(sim);
        }
        self.undo.push(frame);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn in_compound(&self) -> bool {
        self.depth > 0
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open.clear();
        self.depth = 0;
    }
}
