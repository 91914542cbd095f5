//! The registry and the event-driven propagation engine.
//!
//! `Sim` owns every module and link. Ids are minted monotonically and
//! never reused, so `BTreeMap` iteration is creation order and an id
//! held by an undo record stays meaningful for the whole session.
//!
//! Propagation is breadth-first with coalescing: a value change walks
//! outward link by link, each module runs once per wave, and a module
//! already sitting in the queue is not enqueued again. A dequeue
//! budget guards against kinds that never stabilize; tripping it flags
//! the pass as runaway instead of hanging the editor.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;

use log::{debug, error};

use crate::core::geom::{Vec2, GRID};
use crate::core::link::{Link, LinkTint};
use crate::core::modules::{Module, ModuleKind};
use crate::core::port::Port;
use crate::core::types::{EntityId, LinkId, ModuleId, PortRef};
use crate::core::value::BinData;

/// Dequeues allowed per propagation pass, per registered module.
pub const RUNAWAY_FACTOR: usize = 64;

#[derive(Debug)]
pub struct Sim {
    modules: BTreeMap<ModuleId, Module>,
    links: BTreeMap<LinkId, Link>,
    next_module: u32,
    next_link: u32,
    pub file_path: Option<PathBuf>,
    pub grid: f64,
    runaway: bool,
    queue: VecDeque<ModuleId>,
    queued: BTreeSet<ModuleId>,
}

impl Sim {
    pub fn new() -> Self {
        Sim {
            modules: BTreeMap::new(),
            links: BTreeMap::new(),
            next_module: 0,
            next_link: 0,
            file_path: None,
            grid: GRID,
            runaway: false,
            queue: VecDeque::new(),
            queued: BTreeSet::new(),
        }
    }

    // --- modules -----------------------------------------------------

    pub fn add_module(&mut self, kind: ModuleKind, pos: Vec2) -> ModuleId {
        let id = ModuleId(self.next_module);
        self.next_module += 1;
        self.modules.insert(id, Module::new(id, kind, pos));
        debug!("added {} ({:?})", id, kind);
        id
    }

    /// Re-inserts a module an operation took out earlier. The id keeps
    /// its original slot in creation order.
    pub(crate) fn insert_module(&mut self, module: Module) {
        debug_assert!(!self.modules.contains_key(&module.id));
        self.next_module = self.next_module.max(module.id.0 + 1);
        self.modules.insert(module.id, module);
    }

    pub(crate) fn take_module(&mut self, id: ModuleId) -> Option<Module> {
        self.modules.remove(&id)
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(&id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.modules.keys().copied().collect()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    // --- links -------------------------------------------------------

    pub(crate) fn mint_link_id(&mut self) -> LinkId {
        let id = LinkId(self.next_link);
        self.next_link += 1;
        id
    }

    pub(crate) fn insert_link(&mut self, id: LinkId, link: Link) {
        debug_assert!(!self.links.contains_key(&id));
        self.next_link = self.next_link.max(id.0 + 1);
        self.links.insert(id, link);
    }

    pub(crate) fn take_link(&mut self, id: LinkId) -> Option<Link> {
        self.links.remove(&id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter().map(|(id, l)| (*id, l))
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn link_tint(&self, id: LinkId) -> Option<LinkTint> {
        let l = self.links.get(&id)?;
        let a = self.port(l.src)?.tag;
        let b = self.port(l.targ)?.tag;
        Some(LinkTint::pick(a, b))
    }

    // --- ports and entities ------------------------------------------

    pub fn port(&self, r: PortRef) -> Option<&Port> {
        self.modules.get(&r.module)?.ports.get(r.port)
    }

    pub fn port_mut(&mut self, r: PortRef) -> Option<&mut Port> {
        self.modules.get_mut(&r.module)?.ports.get_mut(r.port)
    }

    /// Everything pickable, modules first, then the control points of
    /// each link, all in creation order.
    pub fn entities(&self) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self.modules.keys().map(|id| EntityId::Module(*id)).collect();
        for (id, link) in &self.links {
            for index in 0..link.path.len() {
                out.push(EntityId::CtrlPt { link: *id, index });
            }
        }
        out
    }

    // --- lifecycle ---------------------------------------------------

    pub fn clear(&mut self) {
        self.modules.clear();
        self.links.clear();
        self.next_module = 0;
        self.next_link = 0;
        self.file_path = None;
        self.runaway = false;
        self.queue.clear();
        self.queued.clear();
    }

    /// Whether the last propagation pass blew its dequeue budget.
    pub fn runaway(&self) -> bool {
        self.runaway
    }

    /// Drops every module's error highlight. Edits call this on
    /// success so stale loop markers do not linger.
    pub fn clear_errors(&mut self) {
        for module in self.modules.values_mut() {
            module.error = false;
        }
    }

    /// Advances every clock one phase and propagates the change.
    pub fn tick(&mut self) {
        let clocks: Vec<ModuleId> = self
            .modules
            .values()
            .filter(|m| m.kind() == ModuleKind::Clock)
            .map(|m| m.id)
            .collect();
        for id in clocks {
            let ticked = self.modules.get_mut(&id).map(|m| m.tick()).unwrap_or(false);
            if ticked {
                self.propagate(id);
            }
        }
    }

    /// One pass from every module; brings derived values in line with
    /// stored state after a restore.
    pub fn settle(&mut self) {
        for id in self.module_ids() {
            self.propagate(id);
        }
    }

    // --- propagation -------------------------------------------------

    /// Runs `seed` and pushes value changes breadth-first until the
    /// graph is quiet or the budget is spent.
    pub fn propagate(&mut self, seed: ModuleId) {
        if !self.modules.contains_key(&seed) {
            return;
        }
        self.runaway = false;
        self.queue.clear();
        self.queued.clear();
        self.queue.push_back(seed);
        self.queued.insert(seed);

        let budget = RUNAWAY_FACTOR * self.modules.len().max(1);
        let mut dequeues = 0usize;
        while let Some(id) = self.queue.pop_front() {
            self.queued.remove(&id);
            dequeues += 1;
            if dequeues > budget {
                self.runaway = true;
                error!(
                    "propagation from {} exceeded {} dequeues, abandoning pass",
                    seed, budget
                );
                self.queue.clear();
                self.queued.clear();
                return;
            }
            if !self.step_module(id) {
                self.queue.clear();
                self.queued.clear();
                return;
            }
        }
    }

    /// Runs one module and pushes its changed outputs across links.
    /// False aborts the pass (the kind wrote a port it may not drive).
    fn step_module(&mut self, id: ModuleId) -> bool {
        let Some(module) = self.modules.get_mut(&id) else {
            return true;
        };
        let before: Vec<(usize, BinData)> = module
            .ports
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.can_output())
            .map(|(ix, p)| (ix, p.value))
            .collect();
        module.propagate();
        if before.iter().any(|(ix, v)| module.ports[*ix].value != *v) {
            module.error = true;
            error!("{} ({:?}) wrote a non-output port during propagate", id, module.kind());
            return false;
        }
        module.error = false;

        let pushes: Vec<(LinkId, usize)> = module
            .ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.can_output())
            .filter_map(|(ix, p)| p.link.map(|l| (l, ix)))
            .collect();

        for (link_id, port_ix) in pushes {
            let here = PortRef::new(id, port_ix);
            let (src, targ) = match self.links.get(&link_id) {
                Some(l) => (l.src, l.targ),
                None => continue,
            };
            // Only the driving end moves values.
            if src != here {
                continue;
            }
            let val = match self.port(here) {
                Some(p) => p.value,
                None => continue,
            };
            let Some(far) = self.port_mut(targ) else { continue };
            if far.value != val {
                far.value = val;
                debug!("{} -> {}: {}", here, targ, val);
                if self.modules.contains_key(&targ.module) && !self.queued.contains(&targ.module) {
                    self.queue.push_back(targ.module);
                    self.queued.insert(targ.module);
                }
            }
        }
        true
    }
}

impl Default for Sim {
    fn default() -> Self {
        Sim::new()
    }
}
