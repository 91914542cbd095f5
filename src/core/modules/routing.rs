//! Routing kinds: demultiplexer, fanout, multiplexer, splitter/merger.

use crate::core::geom::Vec2;
use crate::core::port::{Port, SignalTag};
use crate::core::types::PortIx;
use crate::core::value::BinData;

use super::{ModuleBehavior, Part};

/// One-to-four demultiplexer. Control bits 0..1 pick the live output;
/// the rest float disconnected. The control word is mirrored on
/// `Control out` so selection chains can continue downstream.
#[derive(Debug, Default)]
pub struct Demux;

impl Demux {
    pub const IN: PortIx = 0;
    pub const CTRL_IN: PortIx = 1;
    pub const OUT_A: PortIx = 2;
    pub const OUT_B: PortIx = 3;
    pub const OUT_C: PortIx = 4;
    pub const OUT_D: PortIx = 5;
    pub const CTRL_OUT: PortIx = 6;

    const OUTS: [PortIx; 4] = [Self::OUT_A, Self::OUT_B, Self::OUT_C, Self::OUT_D];
}

impl ModuleBehavior for Demux {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input", 0.0, SignalTag::Data),
            Port::input_pulled("Control in", 1.0, SignalTag::Control, BinData::new(0)),
            Port::output("Output A", -1.5, SignalTag::Data),
            Port::output("Output B", -0.5, SignalTag::Data),
            Port::output("Output C", 0.5, SignalTag::Data),
            Port::output("Output D", 1.5, SignalTag::Data),
            Port::output("Control out", 2.0, SignalTag::Control),
        ]
    }

    fn parts(&self) -> Vec<Part> {
        let mut parts = vec![Part::led_row(Vec2::new(0.0, 0.5))];
        for i in 0..4 {
            parts.push(Part::led(
                Vec2::new(-1.5 + i as f64, -0.5),
                SignalTag::Control,
            ));
        }
        parts
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        let input = ports[Self::IN].read();
        let ctrl = ports[Self::CTRL_IN].read();
        let sel = (ctrl.get_uint() & 3) as usize;
        for (i, out) in Self::OUTS.into_iter().enumerate() {
            ports[out].value = if i == sel {
                input
            } else {
                BinData::disconnected()
            };
        }
        ports[Self::CTRL_OUT].value = ctrl;
        if let Some(Part::LedRow { value, .. }) = parts.get_mut(0) {
            *value = input;
        }
        for i in 0..4 {
            if let Some(Part::Led { lit, .. }) = parts.get_mut(1 + i) {
                *lit = i == sel;
            }
        }
    }

    fn affected(&self, _ports: &[Port], input: PortIx) -> Vec<PortIx> {
        match input {
            Self::IN => Self::OUTS.to_vec(),
            Self::CTRL_IN => {
                let mut all = Self::OUTS.to_vec();
                all.push(Self::CTRL_OUT);
                all
            }
            _ => Vec::new(),
        }
    }
}

/// Buffers one input to four identical outputs. Disconnection passes
/// through.
#[derive(Debug, Default)]
pub struct Fanout;

impl Fanout {
    pub const IN: PortIx = 0;
    pub const OUT_A: PortIx = 1;
    pub const OUT_B: PortIx = 2;
    pub const OUT_C: PortIx = 3;
    pub const OUT_D: PortIx = 4;
}

impl ModuleBehavior for Fanout {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input", 0.0, SignalTag::Generic),
            Port::output("Output A", -1.5, SignalTag::Generic),
            Port::output("Output B", -0.5, SignalTag::Generic),
            Port::output("Output C", 0.5, SignalTag::Generic),
            Port::output("Output D", 1.5, SignalTag::Generic),
        ]
    }

    fn propagate(&mut self, ports: &mut [Port], _parts: &mut [Part]) {
        let v = ports[Self::IN].read();
        for out in [Self::OUT_A, Self::OUT_B, Self::OUT_C, Self::OUT_D] {
            ports[out].value = v;
        }
    }
}

/// Four-to-one multiplexer, the inverse of [`Demux`].
#[derive(Debug, Default)]
pub struct Mux;

impl Mux {
    pub const IN_A: PortIx = 0;
    pub const IN_B: PortIx = 1;
    pub const IN_C: PortIx = 2;
    pub const IN_D: PortIx = 3;
    pub const CTRL_IN: PortIx = 4;
    pub const OUT: PortIx = 5;
    pub const CTRL_OUT: PortIx = 6;
}

impl ModuleBehavior for Mux {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input A", -1.5, SignalTag::Data),
            Port::input("Input B", -0.5, SignalTag::Data),
            Port::input("Input C", 0.5, SignalTag::Data),
            Port::input("Input D", 1.5, SignalTag::Data),
            Port::input_pulled("Control in", 2.0, SignalTag::Control, BinData::new(0)),
            Port::output("Output", 0.0, SignalTag::Data),
            Port::output("Control out", 1.0, SignalTag::Control),
        ]
    }

    fn parts(&self) -> Vec<Part> {
        vec![Part::led_row(Vec2::new(0.0, -0.5))]
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        let ctrl = ports[Self::CTRL_IN].read();
        let sel = (ctrl.get_uint() & 3) as usize;
        let out = ports[Self::IN_A + sel].read();
        ports[Self::OUT].value = out;
        ports[Self::CTRL_OUT].value = ctrl;
        if let Some(Part::LedRow { value, .. }) = parts.get_mut(0) {
            *value = out;
        }
    }

    fn affected(&self, _ports: &[Port], input: PortIx) -> Vec<PortIx> {
        match input {
            Self::IN_A | Self::IN_B | Self::IN_C | Self::IN_D => vec![Self::OUT],
            Self::CTRL_IN => vec![Self::OUT, Self::CTRL_OUT],
            _ => Vec::new(),
        }
    }
}

/// Routes bit slices: splits a full word into its bit pairs and merges
/// two bit pairs back into a word. The split and merge datapaths are
/// independent, which the affected sets reflect.
#[derive(Debug, Default)]
pub struct SplitMerge;

impl SplitMerge {
    pub const IN: PortIx = 0;
    pub const MERGE_A: PortIx = 1;
    pub const MERGE_B: PortIx = 2;
    pub const SPLIT_A: PortIx = 3;
    pub const SPLIT_B: PortIx = 4;
    pub const OUT: PortIx = 5;
}

impl ModuleBehavior for SplitMerge {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input", -1.0, SignalTag::Data),
            Port::input("Merge A", 0.0, SignalTag::Data),
            Port::input("Merge B", 1.0, SignalTag::Data),
            Port::output("Split A", -1.0, SignalTag::Data),
            Port::output("Split B", 0.0, SignalTag::Data),
            Port::output("Output", 1.0, SignalTag::Data),
        ]
    }

    fn propagate(&mut self, ports: &mut [Port], _parts: &mut [Part]) {
        let full = ports[Self::IN].read();
        let (lo, hi) = if full.is_disconnected() {
            (BinData::disconnected(), BinData::disconnected())
        } else {
            let v = full.get_uint();
            (BinData::new(v & 3), BinData::new((v >> 2) & 3))
        };
        ports[Self::SPLIT_A].value = lo;
        ports[Self::SPLIT_B].value = hi;

        let ma = ports[Self::MERGE_A].read();
        let mb = ports[Self::MERGE_B].read();
        ports[Self::OUT].value = if ma.is_disconnected() && mb.is_disconnected() {
            BinData::disconnected()
        } else {
            BinData::new((ma.get_uint() & 3) | ((mb.get_uint() & 3) << 2))
        };
    }

    fn affected(&self, _ports: &[Port], input: PortIx) -> Vec<PortIx> {
        match input {
            Self::IN => vec![Self::SPLIT_A, Self::SPLIT_B],
            Self::MERGE_A | Self::MERGE_B => vec![Self::OUT],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::Vec2;
    use crate::core::modules::{Module, ModuleKind};
    use crate::core::port::SignalTag;
    use crate::core::types::{LinkId, ModuleId, PortIx};

    fn module(kind: ModuleKind) -> Module {
        Module::new(ModuleId(0), kind, Vec2::default())
    }

    fn drive(m: &mut Module, ix: PortIx, v: BinData) {
        let p = &mut m.ports[ix];
        p.link = Some(LinkId(99));
        p.value = v;
    }

    #[test]
    fn demux_routes_to_the_selected_output() {
        let mut m = module(ModuleKind::Demux);
        drive(&mut m, Demux::IN, BinData::new(0b1001));
        drive(&mut m, Demux::CTRL_IN, BinData::new(2));
        m.propagate();
        assert!(m.ports[Demux::OUT_A].value.is_disconnected());
        assert!(m.ports[Demux::OUT_B].value.is_disconnected());
        assert_eq!(m.ports[Demux::OUT_C].value, BinData::new(0b1001));
        assert!(m.ports[Demux::OUT_D].value.is_disconnected());
        assert_eq!(m.ports[Demux::CTRL_OUT].value, BinData::new(2));
        assert_eq!(
            m.parts[3],
            Part::Led {
                pos: Vec2::new(0.5, -0.5),
                tag: SignalTag::Control,
                lit: true
            }
        );
    }

    #[test]
    fn demux_data_input_does_not_touch_the_control_mirror() {
        let m = module(ModuleKind::Demux);
        let from_data = m.affected(Demux::IN);
        assert_eq!(from_data, vec![Demux::OUT_A, Demux::OUT_B, Demux::OUT_C, Demux::OUT_D]);
        let from_ctrl = m.affected(Demux::CTRL_IN);
        assert!(from_ctrl.contains(&Demux::CTRL_OUT));
    }

    #[test]
    fn fanout_copies_including_disconnection() {
        let mut m = module(ModuleKind::Fanout);
        m.propagate();
        assert!(m.ports[Fanout::OUT_C].value.is_disconnected());
        drive(&mut m, Fanout::IN, BinData::new(7));
        m.propagate();
        for out in [Fanout::OUT_A, Fanout::OUT_B, Fanout::OUT_C, Fanout::OUT_D] {
            assert_eq!(m.ports[out].value, BinData::new(7));
        }
    }

    #[test]
    fn mux_selects_one_input() {
        let mut m = module(ModuleKind::Mux);
        for (ix, v) in [(Mux::IN_A, 1u8), (Mux::IN_B, 2), (Mux::IN_C, 4), (Mux::IN_D, 8)] {
            drive(&mut m, ix, BinData::new(v));
        }
        for sel in 0..4u8 {
            drive(&mut m, Mux::CTRL_IN, BinData::new(sel));
            m.propagate();
            assert_eq!(m.ports[Mux::OUT].value, BinData::new(1 << sel), "sel {sel}");
        }
    }

    #[test]
    fn splitmerge_slices_and_rebuilds() {
        let mut m = module(ModuleKind::SplitMerge);
        drive(&mut m, SplitMerge::IN, BinData::new(0b1101));
        drive(&mut m, SplitMerge::MERGE_A, BinData::new(0b10));
        drive(&mut m, SplitMerge::MERGE_B, BinData::new(0b11));
        m.propagate();
        assert_eq!(m.ports[SplitMerge::SPLIT_A].value, BinData::new(0b01));
        assert_eq!(m.ports[SplitMerge::SPLIT_B].value, BinData::new(0b11));
        assert_eq!(m.ports[SplitMerge::OUT].value, BinData::new(0b1110));
    }

    #[test]
    fn splitmerge_keeps_datapaths_independent() {
        let m = module(ModuleKind::SplitMerge);
        assert_eq!(m.affected(SplitMerge::IN), vec![SplitMerge::SPLIT_A, SplitMerge::SPLIT_B]);
        assert_eq!(m.affected(SplitMerge::MERGE_A), vec![SplitMerge::OUT]);
        assert_eq!(m.affected(SplitMerge::MERGE_B), vec![SplitMerge::OUT]);
    }

    #[test]
    fn splitmerge_propagates_disconnection_per_path() {
        let mut m = module(ModuleKind::SplitMerge);
        m.propagate();
        assert!(m.ports[SplitMerge::SPLIT_A].value.is_disconnected());
        assert!(m.ports[SplitMerge::OUT].value.is_disconnected());
        drive(&mut m, SplitMerge::MERGE_A, BinData::new(0b01));
        m.propagate();
        assert_eq!(m.ports[SplitMerge::OUT].value, BinData::new(0b0001));
    }
}
