//! Arithmetic and logic kinds: adder/subtractor, logic unit, OR gate,
//! shifters.

use crate::core::geom::Vec2;
use crate::core::port::{Port, SignalTag};
use crate::core::types::PortIx;
use crate::core::value::BinData;

use super::{ModuleBehavior, ModuleKind, Part};

/// Four-bit adder/subtractor. Control bit 0 selects the operation:
/// 0 adds, 1 subtracts (two's complement, so carry-out high means no
/// borrow).
#[derive(Debug, Default, PartialEq)]
pub struct AddSub;

impl AddSub {
    pub const IN_A: PortIx = 0;
    pub const IN_B: PortIx = 1;
    pub const CTRL_IN: PortIx = 2;
    pub const OUT: PortIx = 3;
    pub const CARRY: PortIx = 4;
    pub const CTRL_OUT: PortIx = 5;
}

impl ModuleBehavior for AddSub {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input A", -1.0, SignalTag::Data),
            Port::input("Input B", 1.0, SignalTag::Data),
            Port::input_pulled("Control in", 0.0, SignalTag::Control, BinData::new(0)),
            Port::output("Output", 0.0, SignalTag::Data),
            Port::output("Carry out", -1.0, SignalTag::Control),
            Port::output("Control out", 1.0, SignalTag::Control),
        ]
    }

    fn parts(&self) -> Vec<Part> {
        vec![Part::led_row(Vec2::new(0.0, -0.5))]
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        let a = ports[Self::IN_A].read().get_uint();
        let b = ports[Self::IN_B].read().get_uint();
        let ctrl = ports[Self::CTRL_IN].read();
        let subtract = ctrl.get_uint() & 1 == 1;
        let operand = if subtract { !b & 0xF } else { b };
        let total = a as u16 + operand as u16 + subtract as u16;
        let result = BinData::new((total & 0xF) as u8);
        ports[Self::OUT].value = result;
        ports[Self::CARRY].value = BinData::new(((total >> 4) & 1) as u8);
        ports[Self::CTRL_OUT].value = ctrl;
        if let Some(Part::LedRow { value, .. }) = parts.get_mut(0) {
            *value = result;
        }
    }

    fn affected(&self, _ports: &[Port], input: PortIx) -> Vec<PortIx> {
        match input {
            Self::IN_A | Self::IN_B => vec![Self::OUT, Self::CARRY],
            Self::CTRL_IN => vec![Self::OUT, Self::CARRY, Self::CTRL_OUT],
            _ => Vec::new(),
        }
    }
}

/// Four-bit logic unit. Control bits 0..1 select AND, OR, XOR or NOT A.
#[derive(Debug, Default, PartialEq)]
pub struct Logic;

impl Logic {
    pub const IN_A: PortIx = 0;
    pub const IN_B: PortIx = 1;
    pub const CTRL_IN: PortIx = 2;
    pub const OUT: PortIx = 3;
    pub const CTRL_OUT: PortIx = 4;
}

impl ModuleBehavior for Logic {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input A", -1.0, SignalTag::Data),
            Port::input("Input B", 1.0, SignalTag::Data),
            Port::input_pulled("Control in", 0.0, SignalTag::Control, BinData::new(0)),
            Port::output("Output", 0.0, SignalTag::Data),
            Port::output("Control out", 1.0, SignalTag::Control),
        ]
    }

    fn parts(&self) -> Vec<Part> {
        vec![Part::led_row(Vec2::new(0.0, -0.5))]
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        let a = ports[Self::IN_A].read().get_uint();
        let b = ports[Self::IN_B].read().get_uint();
        let ctrl = ports[Self::CTRL_IN].read();
        let out = match ctrl.get_uint() & 3 {
            0 => a & b,
            1 => a | b,
            2 => a ^ b,
            _ => !a & 0xF,
        };
        let result = BinData::new(out);
        ports[Self::OUT].value = result;
        ports[Self::CTRL_OUT].value = ctrl;
        if let Some(Part::LedRow { value, .. }) = parts.get_mut(0) {
            *value = result;
        }
    }

    fn affected(&self, _ports: &[Port], input: PortIx) -> Vec<PortIx> {
        match input {
            Self::IN_A | Self::IN_B => vec![Self::OUT],
            Self::CTRL_IN => vec![Self::OUT, Self::CTRL_OUT],
            _ => Vec::new(),
        }
    }
}

/// Two-input bitwise OR. Disconnected operands read as zero, so the
/// output is always defined.
#[derive(Debug, Default, PartialEq)]
pub struct OrGate;

impl OrGate {
    pub const IN_A: PortIx = 0;
    pub const IN_B: PortIx = 1;
    pub const OUT: PortIx = 2;
}

impl ModuleBehavior for OrGate {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input A", -1.0, SignalTag::Generic),
            Port::input("Input B", 1.0, SignalTag::Generic),
            Port::output("Output", 0.0, SignalTag::Generic),
        ]
    }

    fn propagate(&mut self, ports: &mut [Port], _parts: &mut [Part]) {
        let a = ports[Self::IN_A].read().get_uint();
        let b = ports[Self::IN_B].read().get_uint();
        ports[Self::OUT].value = BinData::new(a | b);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShiftDir {
    Left,
    Right,
}

/// Logical shifter. Control bits 0..1 give the shift amount; the
/// direction is fixed per catalogue entry.
#[derive(Debug, PartialEq)]
pub struct Shift {
    dir: ShiftDir,
}

impl Shift {
    pub const IN: PortIx = 0;
    pub const CTRL_IN: PortIx = 1;
    pub const OUT: PortIx = 2;
    pub const CTRL_OUT: PortIx = 3;

    pub fn new(dir: ShiftDir) -> Self {
        Shift { dir }
    }

    pub fn kind(&self) -> ModuleKind {
        match self.dir {
            ShiftDir::Left => ModuleKind::ShiftLeft,
            ShiftDir::Right => ModuleKind::ShiftRight,
        }
    }
}

impl ModuleBehavior for Shift {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input", 0.0, SignalTag::Data),
            Port::input_pulled("Control in", 1.0, SignalTag::Control, BinData::new(0)),
            Port::output("Output", 0.0, SignalTag::Data),
            Port::output("Control out", 1.0, SignalTag::Control),
        ]
    }

    fn propagate(&mut self, ports: &mut [Port], _parts: &mut [Part]) {
        let v = ports[Self::IN].read().get_uint();
        let ctrl = ports[Self::CTRL_IN].read();
        let amount = (ctrl.get_uint() & 3) as u32;
        let out = match self.dir {
            ShiftDir::Left => (v << amount) & 0xF,
            ShiftDir::Right => v >> amount,
        };
        ports[Self::OUT].value = BinData::new(out);
        ports[Self::CTRL_OUT].value = ctrl;
    }

    fn affected(&self, _ports: &[Port], input: PortIx) -> Vec<PortIx> {
        match input {
            Self::IN => vec![Self::OUT],
            Self::CTRL_IN => vec![Self::OUT, Self::CTRL_OUT],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::Vec2;
    use crate::core::modules::Module;
    use crate::core::types::{LinkId, ModuleId, PortIx};

    fn module(kind: ModuleKind) -> Module {
        Module::new(ModuleId(0), kind, Vec2::default())
    }

    /// Makes an input read an injected value instead of its pull.
    fn drive(m: &mut Module, ix: PortIx, v: BinData) {
        let p = &mut m.ports[ix];
        p.link = Some(LinkId(99));
        p.value = v;
    }

    #[test]
    fn addsub_adds_with_carry() {
        let mut m = module(ModuleKind::AddSub);
        drive(&mut m, AddSub::IN_A, BinData::new(3));
        drive(&mut m, AddSub::IN_B, BinData::new(5));
        m.propagate();
        assert_eq!(m.ports[AddSub::OUT].value, BinData::new(8));
        assert_eq!(m.ports[AddSub::CARRY].value, BinData::new(0));

        drive(&mut m, AddSub::IN_A, BinData::new(9));
        drive(&mut m, AddSub::IN_B, BinData::new(9));
        m.propagate();
        assert_eq!(m.ports[AddSub::OUT].value, BinData::new(2));
        assert_eq!(m.ports[AddSub::CARRY].value, BinData::new(1));
    }

    #[test]
    fn addsub_subtracts_twos_complement() {
        let mut m = module(ModuleKind::AddSub);
        drive(&mut m, AddSub::CTRL_IN, BinData::new(1));
        drive(&mut m, AddSub::IN_A, BinData::new(3));
        drive(&mut m, AddSub::IN_B, BinData::new(5));
        m.propagate();
        // 3 - 5 wraps; carry low signals the borrow.
        assert_eq!(m.ports[AddSub::OUT].value, BinData::new(14));
        assert_eq!(m.ports[AddSub::CARRY].value, BinData::new(0));

        drive(&mut m, AddSub::IN_A, BinData::new(5));
        drive(&mut m, AddSub::IN_B, BinData::new(3));
        m.propagate();
        assert_eq!(m.ports[AddSub::OUT].value, BinData::new(2));
        assert_eq!(m.ports[AddSub::CARRY].value, BinData::new(1));
    }

    #[test]
    fn addsub_mirrors_control_and_treats_disconnected_as_zero() {
        let mut m = module(ModuleKind::AddSub);
        drive(&mut m, AddSub::CTRL_IN, BinData::new(1));
        drive(&mut m, AddSub::IN_A, BinData::new(6));
        m.propagate();
        // B disconnected reads as zero: 6 - 0.
        assert_eq!(m.ports[AddSub::OUT].value, BinData::new(6));
        assert_eq!(m.ports[AddSub::CTRL_OUT].value, BinData::new(1));
    }

    #[test]
    fn logic_operation_table() {
        let mut m = module(ModuleKind::Logic);
        drive(&mut m, Logic::IN_A, BinData::new(0b1100));
        drive(&mut m, Logic::IN_B, BinData::new(0b1010));
        let expect = [
            (0u8, 0b1000u8), // AND
            (1, 0b1110),     // OR
            (2, 0b0110),     // XOR
            (3, 0b0011),     // NOT A
        ];
        for (sel, out) in expect {
            drive(&mut m, Logic::CTRL_IN, BinData::new(sel));
            m.propagate();
            assert_eq!(m.ports[Logic::OUT].value, BinData::new(out), "sel {sel}");
        }
    }

    #[test]
    fn logic_defaults_to_and_through_its_pull() {
        let mut m = module(ModuleKind::Logic);
        drive(&mut m, Logic::IN_A, BinData::new(0b0110));
        drive(&mut m, Logic::IN_B, BinData::new(0b0011));
        m.propagate();
        assert_eq!(m.ports[Logic::OUT].value, BinData::new(0b0010));
    }

    #[test]
    fn or_outputs_defined_zero_when_undriven() {
        let mut m = module(ModuleKind::Or);
        m.propagate();
        assert_eq!(m.ports[OrGate::OUT].value, BinData::new(0));
        drive(&mut m, OrGate::IN_A, BinData::new(0b0101));
        drive(&mut m, OrGate::IN_B, BinData::new(0b0011));
        m.propagate();
        assert_eq!(m.ports[OrGate::OUT].value, BinData::new(0b0111));
    }

    #[test]
    fn shifters_shift_by_the_control_amount() {
        let mut l = module(ModuleKind::ShiftLeft);
        drive(&mut l, Shift::IN, BinData::new(0b0011));
        drive(&mut l, Shift::CTRL_IN, BinData::new(2));
        l.propagate();
        assert_eq!(l.ports[Shift::OUT].value, BinData::new(0b1100));

        let mut r = module(ModuleKind::ShiftRight);
        drive(&mut r, Shift::IN, BinData::new(0b1100));
        drive(&mut r, Shift::CTRL_IN, BinData::new(2));
        r.propagate();
        assert_eq!(r.ports[Shift::OUT].value, BinData::new(0b0011));
    }

    #[test]
    fn shift_amount_pulls_to_zero() {
        let mut m = module(ModuleKind::ShiftLeft);
        drive(&mut m, Shift::IN, BinData::new(0b1001));
        m.propagate();
        assert_eq!(m.ports[Shift::OUT].value, BinData::new(0b1001));
    }

    #[test]
    fn data_inputs_do_not_reach_the_control_mirror() {
        let m = module(ModuleKind::AddSub);
        let from_data = m.affected(AddSub::IN_A);
        assert!(!from_data.contains(&AddSub::CTRL_OUT));
        assert!(from_data.contains(&AddSub::OUT));
        let from_ctrl = m.affected(AddSub::CTRL_IN);
        assert!(from_ctrl.contains(&AddSub::CTRL_OUT));
    }
}
