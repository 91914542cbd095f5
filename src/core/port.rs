//! Ports: the connection points modules expose.

use serde::{Deserialize, Serialize};

use crate::core::types::LinkId;
use crate::core::value::BinData;

/// Signal class of a port. Cosmetic except that `Generic` acts as a
/// wildcard when picking a link tint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SignalTag {
    Generic,
    Data,
    Control,
    Clock,
}

/// Current direction of a port. Unidirectional ports never leave the
/// mode matching their kind; bidirectional ports start undecided
/// (`Bidir`) and get committed by direction resolution.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortMode {
    Input,
    Output,
    Bidir,
}

impl PortMode {
    pub fn opposite(self) -> Self {
        match self {
            PortMode::Input => PortMode::Output,
            PortMode::Output => PortMode::Input,
            PortMode::Bidir => PortMode::Bidir,
        }
    }
}

/// Which face of the module the port sits on. `Face` is the input
/// face, `Back` the output face. Bidirectional resolution and save
/// bucketing both key off this.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Side {
    Face,
    Back,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortKind {
    Input { pull: BinData },
    Output,
    Bidir,
}

/// A single port. Catalogue entries build these in a fixed order, so a
/// port's index within its module is part of its identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub label: &'static str,
    pub kind: PortKind,
    pub tag: SignalTag,
    pub side: Side,
    /// Offset along the face, grid units. Renderer-facing only.
    pub offset: f64,
    pub mode: PortMode,
    pub value: BinData,
    pub link: Option<LinkId>,
    /// Declared terminator of addressing chains; skipped by the loop
    /// search. Always an output.
    pub chain_out: bool,
}

impl Port {
    /// Input port on the input face, pulling disconnected when unlinked.
    pub fn input(label: &'static str, offset: f64, tag: SignalTag) -> Self {
        Port {
            label,
            kind: PortKind::Input {
                pull: BinData::disconnected(),
            },
            tag,
            side: Side::Face,
            offset,
            mode: PortMode::Input,
            value: BinData::disconnected(),
            link: None,
            chain_out: false,
        }
    }

    /// Input port with an explicit pull value. Control and clock
    /// inputs pull zero so modules behave before they are fully wired.
    pub fn input_pulled(label: &'static str, offset: f64, tag: SignalTag, pull: BinData) -> Self {
        let mut p = Port::input(label, offset, tag);
        p.kind = PortKind::Input { pull };
        p
    }

    /// Output port on the output face.
    pub fn output(label: &'static str, offset: f64, tag: SignalTag) -> Self {
        Port {
            label,
            kind: PortKind::Output,
            tag,
            side: Side::Back,
            offset,
            mode: PortMode::Output,
            value: BinData::disconnected(),
            link: None,
            chain_out: false,
        }
    }

    /// Bidirectional port on the given face, direction undecided.
    pub fn bidir(label: &'static str, offset: f64, tag: SignalTag, side: Side) -> Self {
        Port {
            label,
            kind: PortKind::Bidir,
            tag,
            side,
            offset,
            mode: PortMode::Bidir,
            value: BinData::disconnected(),
            link: None,
            chain_out: false,
        }
    }

    /// Marks this output as an addressing-chain terminator.
    pub fn chained(mut self) -> Self {
        debug_assert!(matches!(self.kind, PortKind::Output));
        self.chain_out = true;
        self
    }

    pub fn is_bidir(&self) -> bool {
        matches!(self.kind, PortKind::Bidir)
    }

    pub fn can_output(&self) -> bool {
        matches!(self.mode, PortMode::Output | PortMode::Bidir)
    }

    pub fn can_input(&self) -> bool {
        matches!(self.mode, PortMode::Input | PortMode::Bidir)
    }

    /// Whether the port is committed to one direction: always true for
    /// unidirectional kinds, true for bidir once resolution decided.
    pub fn has_direction(&self) -> bool {
        !self.is_bidir() || self.mode != PortMode::Bidir
    }

    /// The value the owning module sees: the pull value on an unlinked
    /// input, the stored value otherwise.
    pub fn read(&self) -> BinData {
        if self.link.is_none() {
            if let PortKind::Input { pull } = self.kind {
                return pull;
            }
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unidirectional_modes_match_kinds() {
        let i = Port::input("Input", 0.0, SignalTag::Data);
        assert!(i.can_input() && !i.can_output() && i.has_direction());
        let o = Port::output("Output", 0.0, SignalTag::Data);
        assert!(o.can_output() && !o.can_input() && o.has_direction());
    }

    #[test]
    fn bidir_starts_undecided_and_can_do_both() {
        let b = Port::bidir("Data", 0.0, SignalTag::Data, Side::Face);
        assert!(b.can_input() && b.can_output());
        assert!(!b.has_direction());
    }

    #[test]
    fn unlinked_inputs_read_their_pull() {
        let p = Port::input_pulled("Control in", 0.0, SignalTag::Control, BinData::new(0));
        assert_eq!(p.read(), BinData::new(0));
        let q = Port::input("Input", 0.0, SignalTag::Data);
        assert!(q.read().is_disconnected());
    }

    #[test]
    fn linked_inputs_read_the_stored_value() {
        let mut p = Port::input_pulled("Control in", 0.0, SignalTag::Control, BinData::new(0));
        p.link = Some(crate::core::types::LinkId(0));
        p.value = BinData::new(7);
        assert_eq!(p.read(), BinData::new(7));
    }

    #[test]
    fn chained_marks_outputs() {
        let p = Port::output("Chain out", 0.0, SignalTag::Control).chained();
        assert!(p.chain_out);
    }
}
