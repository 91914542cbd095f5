//! The simulation context: registry, history, and the guarded edit
//! surface the editor drives.
//!
//! Every mutation goes through a `SimContext` method so that each edit
//! is recorded for undo, seeds a propagation pass, and clears stale
//! error highlights. Link creation is the one edit that can fail after
//! partially running; it brackets itself in a compound frame and
//! cancels the frame to back out, leaving the model untouched apart
//! from the error flags on the offending modules.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::core::direction::set_port_mode;
use crate::core::error::{LinkError, OpError};
use crate::core::geom::{Vec2, WirePath};
use crate::core::link::Link;
use crate::core::loops::find_loop;
use crate::core::modules::ModuleKind;
use crate::core::ops::{self, OpStack, Operation};
use crate::core::port::PortMode;
use crate::core::sim::Sim;
use crate::core::types::{EntityId, LinkId, ModuleId, PortRef, RotationDir};

/// Camera placement remembered per document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub cam: Vec2,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            cam: Vec2::default(),
            zoom: 1.0,
        }
    }
}

/// A context shared between the editor and the ticker thread. All
/// access goes through the one lock; propagation runs to completion
/// while holding it.
pub type SharedContext = Arc<Mutex<SimContext>>;

#[derive(Debug, Default)]
pub struct SimContext {
    pub sim: Sim,
    pub ops: OpStack,
    pub view: ViewState,
}

impl SimContext {
    pub fn new() -> Self {
        SimContext::default()
    }

    pub fn shared() -> SharedContext {
        Arc::new(Mutex::new(SimContext::new()))
    }

    /// Places a module at the nearest grid intersection and brings its
    /// outputs live.
    pub fn add_module(&mut self, kind: ModuleKind, pos: Vec2) -> ModuleId {
        let pos = pos.snapped(self.sim.grid);
        let id = self.sim.add_module(kind, pos);
        self.ops.push(Operation::CreateModule { id, stash: None });
        self.sim.clear_errors();
        self.sim.propagate(id);
        id
    }

    /// Removes a module and every link attached to it as one undo
    /// unit. Links go first so that undo restores the module before
    /// re-attaching them.
    pub fn remove_module(&mut self, id: ModuleId) -> bool {
        let Some(module) = self.sim.module(id) else {
            return false;
        };
        let linked: Vec<LinkId> = module.ports.iter().filter_map(|p| p.link).collect();
        self.ops.begin_compound();
        for l in linked {
            self.delete_link(l);
        }
        if let Some(taken) = self.sim.take_module(id) {
            self.ops.push(Operation::DeleteModule {
                id,
                stash: Some(taken),
            });
        }
        let _ = self.ops.end_compound();
        self.sim.clear_errors();
        true
    }

    /// Deletes one link, releasing both endpoints back to undecided
    /// direction.
    pub fn delete_link(&mut self, id: LinkId) -> bool {
        if self.sim.link(id).is_none() {
            return false;
        }
        self.sim.clear_errors();
        match ops::detach_link(&mut self.sim, id) {
            Some(link) => {
                self.ops.push(Operation::DeleteLink {
                    id,
                    stash: Some(link),
                });
                true
            }
            None => false,
        }
    }

    /// Wires two ports together. `source` and `target` are in click
    /// order; when both ends are undecided bidirs the click order is
    /// what decides who drives. Ports already linked get their old
    /// link replaced, atomically with the creation.
    pub fn create_link(
        &mut self,
        source: PortRef,
        target: PortRef,
        path: WirePath,
    ) -> Result<LinkId, LinkError> {
        {
            let (s, t) = match (self.sim.port(source), self.sim.port(target)) {
                (Some(s), Some(t)) => (s, t),
                _ => return Err(LinkError::MissingPort),
            };
            if source == target {
                return Err(LinkError::SelfLink);
            }
            if source.module == target.module {
                return Err(LinkError::SelfModule);
            }
            if s.can_output() == t.can_output() && s.has_direction() && t.has_direction() {
                return Err(LinkError::SameDirection);
            }
        }

        self.ops.begin_compound();
        if let Some(old) = self.sim.port(source).and_then(|p| p.link) {
            self.delete_link(old);
        }
        if let Some(old) = self.sim.port(target).and_then(|p| p.link) {
            self.delete_link(old);
        }

        // Deleting an old link resets bidir commitments, so direction
        // capability has to be read again before orienting.
        let caps = match (self.sim.port(source), self.sim.port(target)) {
            (Some(s), Some(t)) => (s.can_output(), s.can_input(), t.can_output(), t.can_input()),
            _ => {
                let _ = self.ops.cancel_compound(&mut self.sim);
                return Err(LinkError::MissingPort);
            }
        };
        let (src, targ, path) = match caps {
            (true, _, _, true) => (source, target, path),
            (_, true, true, _) => (target, source, path.reversed()),
            _ => {
                let _ = self.ops.cancel_compound(&mut self.sim);
                return Err(LinkError::Unresolvable);
            }
        };

        let id = self.sim.mint_link_id();
        self.sim.insert_link(id, Link::new(src, targ, path));
        if let Some(p) = self.sim.port_mut(src) {
            p.link = Some(id);
        }
        if let Some(p) = self.sim.port_mut(targ) {
            p.link = Some(id);
        }
        set_port_mode(&mut self.sim, src, PortMode::Output);
        set_port_mode(&mut self.sim, targ, PortMode::Input);
        self.ops.push(Operation::CreateLink { id, stash: None });

        if let Some(cycle) = find_loop(&self.sim, id) {
            // Cancel first: the rollback re-propagates, which would
            // wipe freshly set flags.
            let _ = self.ops.cancel_compound(&mut self.sim);
            for m in &cycle {
                if let Some(module) = self.sim.module_mut(*m) {
                    module.error = true;
                }
            }
            warn!(
                "refused link {} -> {}: combinational loop through {} modules",
                src,
                targ,
                cycle.len()
            );
            return Err(LinkError::WouldLoop { modules: cycle });
        }

        let _ = self.ops.end_compound();
        self.sim.clear_errors();
        if let Some(val) = self.sim.port(src).map(|p| p.value) {
            if let Some(p) = self.sim.port_mut(targ) {
                p.value = val;
            }
        }
        self.sim.propagate(targ.module);
        debug!("linked {} -> {} as {}", src, targ, id);
        Ok(id)
    }

    /// Moves one entity, recording the hop. Modules snap to the grid;
    /// control points move freely.
    pub fn move_entity(&mut self, entity: EntityId, to: Vec2) -> bool {
        let Some(from) = ops::entity_pos(&self.sim, entity) else {
            return false;
        };
        let to = match entity {
            EntityId::Module(_) => to.snapped(self.sim.grid),
            EntityId::CtrlPt { .. } => to,
        };
        if to == from {
            return false;
        }
        ops::set_entity_pos(&mut self.sim, entity, to);
        self.ops.push(Operation::Move { entity, from, to });
        self.sim.clear_errors();
        true
    }

    /// Drags a whole selection by one delta as a single undo unit.
    pub fn move_entities(&mut self, entities: &[EntityId], delta: Vec2) {
        self.ops.begin_compound();
        for &entity in entities {
            if let Some(from) = ops::entity_pos(&self.sim, entity) {
                let to = Vec2::new(from.x + delta.x, from.y + delta.y);
                ops::set_entity_pos(&mut self.sim, entity, to);
                self.ops.push(Operation::Move { entity, from, to });
            }
        }
        let _ = self.ops.end_compound();
        self.sim.clear_errors();
    }

    pub fn rotate_module(&mut self, id: ModuleId, dir: RotationDir) -> bool {
        match self.sim.module_mut(id) {
            Some(m) => {
                m.rotate(dir);
                self.ops.push(Operation::Rotate { module: id, dir });
                self.sim.clear_errors();
                true
            }
            None => false,
        }
    }

    /// Inserts a wire control point at `index` along the link's path.
    pub fn add_ctrl_pt(&mut self, link: LinkId, index: usize, pos: Vec2) -> bool {
        let Some(l) = self.sim.link_mut(link) else {
            return false;
        };
        if index > l.path.points.len() {
            return false;
        }
        l.path.points.insert(index, pos);
        self.ops.push(Operation::CreateCtrlPt {
            link,
            index,
            stash: None,
        });
        self.sim.clear_errors();
        true
    }

    pub fn remove_ctrl_pt(&mut self, link: LinkId, index: usize) -> bool {
        let Some(l) = self.sim.link_mut(link) else {
            return false;
        };
        if index >= l.path.points.len() {
            return false;
        }
        let pos = l.path.points.remove(index);
        self.ops.push(Operation::DeleteCtrlPt {
            link,
            index,
            stash: Some(pos),
        });
        self.sim.clear_errors();
        true
    }

    /// Pointer press on an interactive part. Propagates when the kind
    /// reports a state change.
    pub fn press_part(&mut self, module: ModuleId, part: usize) -> bool {
        let changed = self
            .sim
            .module_mut(module)
            .map(|m| m.press_part(part))
            .unwrap_or(false);
        if changed {
            self.sim.propagate(module);
        }
        changed
    }

    pub fn release_part(&mut self, module: ModuleId, part: usize) -> bool {
        let changed = self
            .sim
            .module_mut(module)
            .map(|m| m.release_part(part))
            .unwrap_or(false);
        if changed {
            self.sim.propagate(module);
        }
        changed
    }

    /// Sets one switch bit directly, as scripted harnesses do.
    pub fn set_switch(&mut self, module: ModuleId, bit: usize, on: bool) -> bool {
        let changed = self
            .sim
            .module_mut(module)
            .map(|m| m.set_switch(bit, on))
            .unwrap_or(false);
        if changed {
            self.sim.propagate(module);
        }
        changed
    }

    pub fn undo(&mut self) -> Result<(), OpError> {
        self.ops.undo(&mut self.sim)
    }

    pub fn redo(&mut self) -> Result<(), OpError> {
        self.ops.redo(&mut self.sim)
    }

    /// Advances every clock one phase.
    pub fn tick(&mut self) {
        self.sim.tick();
    }

    /// Empties the document: registry, history, and camera.
    pub fn clear(&mut self) {
        self.sim.clear();
        self.ops.clear();
        self.view = ViewState::default();
    }
}
