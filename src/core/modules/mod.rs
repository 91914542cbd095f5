//! The module catalogue: every kind of schematic block the editor can
//! place, with its ports, parts, state and propagation behaviour.
//!
//! The set is closed. Dispatch goes through [`ModuleCore`], a tagged
//! union over the kind types, so adding a kind means adding a variant
//! here and an entry in the catalogue tables.

mod arith;
mod io;
mod memory;
mod parts;
mod routing;

pub use arith::{AddSub, Logic, OrGate, Shift, ShiftDir};
pub use io::{Clock, SwitchInput};
pub use memory::{Nram, Register, NRAM_CELLS};
pub use parts::Part;
pub use routing::{Demux, Fanout, Mux, SplitMerge};

use std::collections::BTreeMap;

use crate::core::geom::Vec2;
use crate::core::port::Port;
use crate::core::types::{ModuleId, PortIx, RotationDir};

/// Behaviour every kind implements. `propagate` is pure over the
/// module's own ports, parts and state; it must only write ports that
/// can currently output (the engine checks).
pub trait ModuleBehavior {
    fn ports(&self) -> Vec<Port>;

    fn parts(&self) -> Vec<Part> {
        Vec::new()
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]);

    /// Output-capable ports combinationally influenced by `input`.
    fn affected(&self, ports: &[Port], input: PortIx) -> Vec<PortIx> {
        affected_default(ports, input)
    }

    /// Persistent kind state as string key/values, `None` when there
    /// is nothing worth saving.
    fn data_out(&self) -> Option<BTreeMap<String, String>> {
        None
    }

    fn data_in(&mut self, _data: &BTreeMap<String, String>) -> Result<(), String> {
        Ok(())
    }

    fn part_pressed(&mut self, _part: &Part) -> bool {
        false
    }

    fn part_released(&mut self, _part: &Part) -> bool {
        false
    }
}

/// Default influence set: an input-capable port affects every
/// output-capable port except itself.
pub fn affected_default(ports: &[Port], input: PortIx) -> Vec<PortIx> {
    match ports.get(input) {
        Some(p) if p.can_input() => ports
            .iter()
            .enumerate()
            .filter(|(ix, q)| *ix != input && q.can_output())
            .map(|(ix, _)| ix)
            .collect(),
        _ => Vec::new(),
    }
}

/// Catalogue tag. `file_name` strings are the save-format contract and
/// never change.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ModuleKind {
    AddSub,
    Clock,
    Demux,
    Fanout,
    Logic,
    Mux,
    Or,
    Nram,
    Register,
    ShiftLeft,
    ShiftRight,
    SplitMerge,
    SwitchInput,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 13] = [
        ModuleKind::AddSub,
        ModuleKind::Clock,
        ModuleKind::Demux,
        ModuleKind::Fanout,
        ModuleKind::Logic,
        ModuleKind::Mux,
        ModuleKind::Or,
        ModuleKind::Nram,
        ModuleKind::Register,
        ModuleKind::ShiftLeft,
        ModuleKind::ShiftRight,
        ModuleKind::SplitMerge,
        ModuleKind::SwitchInput,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ModuleKind::AddSub => "ADDSUB",
            ModuleKind::Clock => "CLOCK",
            ModuleKind::Demux => "DEMUX",
            ModuleKind::Fanout => "FANOUT",
            ModuleKind::Logic => "LOGIC",
            ModuleKind::Mux => "MUX",
            ModuleKind::Or => "OR",
            ModuleKind::Nram => "RAM",
            ModuleKind::Register => "REGISTER",
            ModuleKind::ShiftLeft => "LEFT_SHIFT",
            ModuleKind::ShiftRight => "RIGHT_SHIFT",
            ModuleKind::SplitMerge => "SPLIT_MERGE",
            ModuleKind::SwitchInput => "SWITCH",
        }
    }

    pub fn from_file_name(name: &str) -> Option<ModuleKind> {
        ModuleKind::ALL.into_iter().find(|k| k.file_name() == name)
    }

    /// Sequential elements legally close feedback paths; the loop
    /// search stops at them.
    pub fn terminates_loops(self) -> bool {
        matches!(self, ModuleKind::Register | ModuleKind::Nram)
    }

    pub fn build(self) -> ModuleCore {
        match self {
            ModuleKind::AddSub => ModuleCore::AddSub(AddSub),
            ModuleKind::Clock => ModuleCore::Clock(Clock::new()),
            ModuleKind::Demux => ModuleCore::Demux(Demux),
            ModuleKind::Fanout => ModuleCore::Fanout(Fanout),
            ModuleKind::Logic => ModuleCore::Logic(Logic),
            ModuleKind::Mux => ModuleCore::Mux(Mux),
            ModuleKind::Or => ModuleCore::Or(OrGate),
            ModuleKind::Nram => ModuleCore::Nram(Nram::new()),
            ModuleKind::Register => ModuleCore::Register(Register::new()),
            ModuleKind::ShiftLeft => ModuleCore::Shift(Shift::new(ShiftDir::Left)),
            ModuleKind::ShiftRight => ModuleCore::Shift(Shift::new(ShiftDir::Right)),
            ModuleKind::SplitMerge => ModuleCore::SplitMerge(SplitMerge),
            ModuleKind::SwitchInput => ModuleCore::SwitchInput(SwitchInput::new()),
        }
    }
}

/// Per-kind state and behaviour, one variant per kind type.
#[derive(Debug)]
pub enum ModuleCore {
    AddSub(AddSub),
    Clock(Clock),
    Demux(Demux),
    Fanout(Fanout),
    Logic(Logic),
    Mux(Mux),
    Or(OrGate),
    Nram(Nram),
    Register(Register),
    Shift(Shift),
    SplitMerge(SplitMerge),
    SwitchInput(SwitchInput),
}

macro_rules! with_core {
    ($core:expr, $inner:ident => $body:expr) => {
        match $core {
            ModuleCore::AddSub($inner) => $body,
            ModuleCore::Clock($inner) => $body,
            ModuleCore::Demux($inner) => $body,
            ModuleCore::Fanout($inner) => $body,
            ModuleCore::Logic($inner) => $body,
            ModuleCore::Mux($inner) => $body,
            ModuleCore::Or($inner) => $body,
            ModuleCore::Nram($inner) => $body,
            ModuleCore::Register($inner) => $body,
            ModuleCore::Shift($inner) => $body,
            ModuleCore::SplitMerge($inner) => $body,
            ModuleCore::SwitchInput($inner) => $body,
        }
    };
}

impl ModuleCore {
    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleCore::AddSub(_) => ModuleKind::AddSub,
            ModuleCore::Clock(_) => ModuleKind::Clock,
            ModuleCore::Demux(_) => ModuleKind::Demux,
            ModuleCore::Fanout(_) => ModuleKind::Fanout,
            ModuleCore::Logic(_) => ModuleKind::Logic,
            ModuleCore::Mux(_) => ModuleKind::Mux,
            ModuleCore::Or(_) => ModuleKind::Or,
            ModuleCore::Nram(_) => ModuleKind::Nram,
            ModuleCore::Register(_) => ModuleKind::Register,
            ModuleCore::Shift(s) => s.kind(),
            ModuleCore::SplitMerge(_) => ModuleKind::SplitMerge,
            ModuleCore::SwitchInput(_) => ModuleKind::SwitchInput,
        }
    }

    pub fn ports(&self) -> Vec<Port> {
        with_core!(self, c => c.ports())
    }

    pub fn parts(&self) -> Vec<Part> {
        with_core!(self, c => c.parts())
    }

    pub fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        with_core!(self, c => c.propagate(ports, parts))
    }

    pub fn affected(&self, ports: &[Port], input: PortIx) -> Vec<PortIx> {
        with_core!(self, c => c.affected(ports, input))
    }

    pub fn data_out(&self) -> Option<BTreeMap<String, String>> {
        with_core!(self, c => c.data_out())
    }

    pub fn data_in(&mut self, data: &BTreeMap<String, String>) -> Result<(), String> {
        with_core!(self, c => c.data_in(data))
    }

    pub fn part_pressed(&mut self, part: &Part) -> bool {
        with_core!(self, c => c.part_pressed(part))
    }

    pub fn part_released(&mut self, part: &Part) -> bool {
        with_core!(self, c => c.part_released(part))
    }

    /// Advances the clock phase; true only for clock modules.
    pub fn tick(&mut self) -> bool {
        if let ModuleCore::Clock(c) = self {
            c.tick();
            true
        } else {
            false
        }
    }
}

/// A placed module: identity, geometry, ports, parts, kind state.
#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    pub pos: Vec2,
    /// Quarter turns, 0..4.
    pub orient: u8,
    /// Raised when the module sat on a rejected loop or misbehaved
    /// during propagation; cleared by its next clean propagate.
    pub error: bool,
    pub ports: Vec<Port>,
    pub parts: Vec<Part>,
    pub core: ModuleCore,
}

impl Module {
    pub fn new(id: ModuleId, kind: ModuleKind, pos: Vec2) -> Self {
        let core = kind.build();
        let ports = core.ports();
        let parts = core.parts();
        Module {
            id,
            pos,
            orient: 0,
            error: false,
            ports,
            parts,
            core,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        self.core.kind()
    }

    pub fn propagate(&mut self) {
        self.core.propagate(&mut self.ports, &mut self.parts);
    }

    pub fn affected(&self, input: PortIx) -> Vec<PortIx> {
        self.core.affected(&self.ports, input)
    }

    pub fn tick(&mut self) -> bool {
        self.core.tick()
    }

    /// Kind-private state worth saving, or `None` when the module is
    /// still in its pristine state.
    pub fn data_out(&self) -> Option<BTreeMap<String, String>> {
        self.core.data_out()
    }

    pub fn data_in(&mut self, data: &BTreeMap<String, String>) -> Result<(), String> {
        self.core.data_in(data)
    }

    pub fn rotate(&mut self, dir: RotationDir) {
        self.orient = match dir {
            RotationDir::Clockwise => (self.orient + 1) % 4,
            RotationDir::CounterClockwise => (self.orient + 3) % 4,
        };
    }

    pub fn port(&self, ix: PortIx) -> Option<&Port> {
        self.ports.get(ix)
    }

    pub fn port_mut(&mut self, ix: PortIx) -> Option<&mut Port> {
        self.ports.get_mut(ix)
    }

    pub fn find_port(&self, label: &str) -> Option<PortIx> {
        self.ports.iter().position(|p| p.label == label)
    }

    /// Routes a pointer press on part `ix` to the kind. True when the
    /// module state changed and needs a propagate.
    pub fn press_part(&mut self, ix: usize) -> bool {
        match self.parts.get(ix).copied() {
            Some(part) => self.core.part_pressed(&part),
            None => false,
        }
    }

    pub fn release_part(&mut self, ix: usize) -> bool {
        match self.parts.get(ix).copied() {
            Some(part) => self.core.part_released(&part),
            None => false,
        }
    }

    /// Sets one switch position on a switch-input module. True when
    /// this module has such a switch.
    pub fn set_switch(&mut self, bit: usize, on: bool) -> bool {
        if let ModuleCore::SwitchInput(s) = &mut self.core {
            s.set(bit, on)
        } else {
            false
        }
    }
}
