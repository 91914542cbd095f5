//! Sequential kinds: register and addressable RAM. Both latch on the
//! rising clock edge and terminate combinational loops.

use std::collections::BTreeMap;

use crate::core::geom::Vec2;
use crate::core::port::{Port, PortMode, SignalTag, Side};
use crate::core::types::PortIx;
use crate::core::value::BinData;

use super::{ModuleBehavior, Part};

/// Four-bit register: latches its input on the clock's rising edge and
/// drives the latched word combinationally.
#[derive(Debug, Default, PartialEq)]
pub struct Register {
    latched: BinData,
    last_clock: bool,
}

impl Register {
    pub const IN: PortIx = 0;
    pub const CLK: PortIx = 1;
    pub const OUT: PortIx = 2;
    pub const CTRL_OUT: PortIx = 3;

    pub fn new() -> Self {
        Register::default()
    }

    pub fn latched(&self) -> BinData {
        self.latched
    }
}

impl ModuleBehavior for Register {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input("Input", 0.0, SignalTag::Data),
            Port::input_pulled("Clock in", 1.0, SignalTag::Clock, BinData::new(0)),
            Port::output("Output", 0.0, SignalTag::Data),
            Port::output("Control out", 1.0, SignalTag::Control),
        ]
    }

    fn parts(&self) -> Vec<Part> {
        vec![Part::led_row(Vec2::new(0.0, 0.0))]
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        let clock = ports[Self::CLK].read();
        let high = clock.get_uint() & 1 == 1;
        if high && !self.last_clock {
            self.latched = ports[Self::IN].read();
        }
        self.last_clock = high;
        ports[Self::OUT].value = self.latched;
        ports[Self::CTRL_OUT].value = clock;
        if let Some(Part::LedRow { value, .. }) = parts.get_mut(0) {
            *value = self.latched;
        }
    }

    fn affected(&self, _ports: &[Port], input: PortIx) -> Vec<PortIx> {
        // The datapath is cut by the latch; only the clock mirror is
        // combinational.
        match input {
            Self::CLK => vec![Self::CTRL_OUT],
            _ => Vec::new(),
        }
    }

    fn data_out(&self) -> Option<BTreeMap<String, String>> {
        if self.latched.is_disconnected() {
            return None;
        }
        let mut data = BTreeMap::new();
        data.insert("latched".to_string(), self.latched.get_uint().to_string());
        Some(data)
    }

    fn data_in(&mut self, data: &BTreeMap<String, String>) -> Result<(), String> {
        if let Some(raw) = data.get("latched") {
            let v: u8 = raw
                .parse()
                .map_err(|_| format!("latched value {raw:?} is not a number"))?;
            if v > 0xF {
                return Err(format!("latched value {v} exceeds four bits"));
            }
            self.latched = BinData::new(v);
        }
        Ok(())
    }
}

pub const NRAM_CELLS: usize = 256;

/// Addressable memory: 256 four-bit cells behind two address nibbles.
///
/// Banks cascade through the chain ports: a bank is selected while its
/// `Chain in` reads zero and hands `chain - 1` to the next bank, so a
/// selector value of `n` on the first bank activates the `n`-th bank
/// down the chain. Data ports are bidirectional; whichever is resolved
/// to Output drives the addressed cell, whichever is resolved to Input
/// supplies write data on the clock edge when write-enable (control
/// bit 0) is high.
#[derive(Debug)]
pub struct Nram {
    cells: Box<[u8; NRAM_CELLS]>,
    last_clock: bool,
}

impl Nram {
    pub const ADDR_A: PortIx = 0;
    pub const ADDR_B: PortIx = 1;
    pub const CTRL_IN: PortIx = 2;
    pub const CLK: PortIx = 3;
    pub const CHAIN_IN: PortIx = 4;
    pub const DATA_A: PortIx = 5;
    pub const DATA_B: PortIx = 6;
    pub const CHAIN_OUT: PortIx = 7;

    pub fn new() -> Self {
        Nram {
            cells: Box::new([0; NRAM_CELLS]),
            last_clock: false,
        }
    }

    pub fn cell(&self, addr: usize) -> u8 {
        self.cells[addr % NRAM_CELLS]
    }

    pub fn set_cell(&mut self, addr: usize, val: u8) {
        self.cells[addr % NRAM_CELLS] = val & 0xF;
    }
}

impl Default for Nram {
    fn default() -> Self {
        Nram::new()
    }
}

impl ModuleBehavior for Nram {
    fn ports(&self) -> Vec<Port> {
        vec![
            Port::input_pulled("Address A", -1.5, SignalTag::Control, BinData::new(0)),
            Port::input_pulled("Address B", -0.5, SignalTag::Control, BinData::new(0)),
            Port::input_pulled("Control in", 0.5, SignalTag::Control, BinData::new(0)),
            Port::input_pulled("Clock in", 1.5, SignalTag::Clock, BinData::new(0)),
            Port::input_pulled("Chain in", 2.5, SignalTag::Control, BinData::new(0)),
            Port::bidir("Data A", -2.5, SignalTag::Data, Side::Face),
            Port::bidir("Data B", -1.0, SignalTag::Data, Side::Back),
            Port::output("Chain out", 1.0, SignalTag::Control).chained(),
        ]
    }

    fn parts(&self) -> Vec<Part> {
        vec![
            Part::label(Vec2::new(0.0, -1.0), "RAM"),
            Part::led_row(Vec2::new(0.0, 0.0)),
        ]
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        let chain = ports[Self::CHAIN_IN].read().get_uint();
        let selected = chain == 0;
        ports[Self::CHAIN_OUT].value = BinData::new(chain.wrapping_sub(1) & 0xF);

        let addr = ((ports[Self::ADDR_B].read().get_uint() as usize) << 4)
            | ports[Self::ADDR_A].read().get_uint() as usize;
        let write_enable = ports[Self::CTRL_IN].read().get_uint() & 1 == 1;
        let high = ports[Self::CLK].read().get_uint() & 1 == 1;

        if high && !self.last_clock && write_enable && selected {
            for data in [Self::DATA_A, Self::DATA_B] {
                if ports[data].mode == PortMode::Input {
                    let v = ports[data].read();
                    if !v.is_disconnected() {
                        self.cells[addr] = v.get_uint();
                        break;
                    }
                }
            }
        }
        self.last_clock = high;

        let out = if selected {
            BinData::new(self.cells[addr])
        } else {
            BinData::disconnected()
        };
        for data in [Self::DATA_A, Self::DATA_B] {
            if ports[data].mode == PortMode::Output {
                ports[data].value = out;
            }
        }
        if let Some(Part::LedRow { value, .. }) = parts.get_mut(1) {
            *value = out;
        }
    }

    fn affected(&self, ports: &[Port], input: PortIx) -> Vec<PortIx> {
        let data_outs = || {
            [Self::DATA_A, Self::DATA_B]
                .into_iter()
                .filter(|d| ports[*d].mode == PortMode::Output)
                .collect::<Vec<_>>()
        };
        match input {
            Self::ADDR_A | Self::ADDR_B => data_outs(),
            Self::CHAIN_IN => {
                let mut v = data_outs();
                v.push(Self::CHAIN_OUT);
                v
            }
            // Write enable and clock act on the edge, not combinationally.
            _ => Vec::new(),
        }
    }

    fn data_out(&self) -> Option<BTreeMap<String, String>> {
        if self.cells.iter().all(|c| *c == 0) {
            return None;
        }
        let hex: String = self
            .cells
            .iter()
            .map(|c| char::from_digit(*c as u32, 16).unwrap_or('0'))
            .collect();
        let mut data = BTreeMap::new();
        data.insert("cells".to_string(), hex);
        Some(data)
    }

    fn data_in(&mut self, data: &BTreeMap<String, String>) -> Result<(), String> {
        if let Some(hex) = data.get("cells") {
            if hex.chars().count() > NRAM_CELLS {
                return Err(format!("cell string holds more than {NRAM_CELLS} entries"));
            }
            for (i, c) in hex.chars().enumerate() {
                let v = c
                    .to_digit(16)
                    .ok_or_else(|| format!("bad cell digit {c:?} at {i}"))?;
                self.cells[i] = (v & 0xF) as u8;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::Vec2;
    use crate::core::modules::{Module, ModuleCore, ModuleKind};
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
    fn register_latches_only_on_the_rising_edge() {
        let mut m = module(ModuleKind::Register);
        drive(&mut m, Register::IN, BinData::new(9));
        m.propagate();
        assert!(m.ports[Register::OUT].value.is_disconnected());

        drive(&mut m, Register::CLK, BinData::new(1));
        m.propagate();
        assert_eq!(m.ports[Register::OUT].value, BinData::new(9));

        // Input changes while the clock stays high are ignored.
        drive(&mut m, Register::IN, BinData::new(4));
        m.propagate();
        assert_eq!(m.ports[Register::OUT].value, BinData::new(9));

        drive(&mut m, Register::CLK, BinData::new(0));
        m.propagate();
        drive(&mut m, Register::CLK, BinData::new(1));
        m.propagate();
        assert_eq!(m.ports[Register::OUT].value, BinData::new(4));
    }

    #[test]
    fn register_round_trips_its_latch_through_data() {
        let mut a = Register::new();
        a.latched = BinData::new(11);
        let data = a.data_out().expect("latched state should persist");
        let mut b = Register::new();
        b.data_in(&data).expect("same data should parse");
        assert_eq!(b.latched(), BinData::new(11));

        assert!(Register::new().data_out().is_none());
        assert!(b.data_in(&BTreeMap::from([("latched".into(), "31".into())])).is_err());
    }

    #[test]
    fn nram_reads_combinationally_when_selected() {
        let mut m = module(ModuleKind::Nram);
        if let ModuleCore::Nram(ram) = &mut m.core {
            ram.set_cell(0x2A, 0b0110);
        }
        m.ports[Nram::DATA_B].mode = PortMode::Output;
        drive(&mut m, Nram::ADDR_A, BinData::new(0xA));
        drive(&mut m, Nram::ADDR_B, BinData::new(0x2));
        m.propagate();
        assert_eq!(m.ports[Nram::DATA_B].value, BinData::new(0b0110));

        // Deselecting the bank floats the bus.
        drive(&mut m, Nram::CHAIN_IN, BinData::new(1));
        m.propagate();
        assert!(m.ports[Nram::DATA_B].value.is_disconnected());
    }

    #[test]
    fn nram_writes_on_the_clock_edge_from_the_input_bus() {
        let mut m = module(ModuleKind::Nram);
        m.ports[Nram::DATA_A].mode = PortMode::Input;
        m.ports[Nram::DATA_B].mode = PortMode::Output;
        drive(&mut m, Nram::ADDR_A, BinData::new(5));
        drive(&mut m, Nram::DATA_A, BinData::new(0b1011));
        drive(&mut m, Nram::CTRL_IN, BinData::new(1));
        m.propagate();
        // No edge yet: reads the old cell.
        assert_eq!(m.ports[Nram::DATA_B].value, BinData::new(0));

        drive(&mut m, Nram::CLK, BinData::new(1));
        m.propagate();
        assert_eq!(m.ports[Nram::DATA_B].value, BinData::new(0b1011));

        // Write enable low blocks the next edge.
        drive(&mut m, Nram::CLK, BinData::new(0));
        drive(&mut m, Nram::CTRL_IN, BinData::new(0));
        drive(&mut m, Nram::DATA_A, BinData::new(0b0001));
        drive(&mut m, Nram::CLK, BinData::new(1));
        m.propagate();
        assert_eq!(m.ports[Nram::DATA_B].value, BinData::new(0b1011));
    }

    #[test]
    fn nram_chain_counts_down_and_wraps() {
        let mut m = module(ModuleKind::Nram);
        m.propagate();
        // Selected bank hands 15 to the next, parking it inactive.
        assert_eq!(m.ports[Nram::CHAIN_OUT].value, BinData::new(15));

        drive(&mut m, Nram::CHAIN_IN, BinData::new(2));
        m.propagate();
        assert_eq!(m.ports[Nram::CHAIN_OUT].value, BinData::new(1));
    }

    #[test]
    fn nram_cells_round_trip_as_hex() {
        let mut a = Nram::new();
        a.set_cell(0, 0xF);
        a.set_cell(7, 3);
        let data = a.data_out().expect("non-zero cells should persist");
        let mut b = Nram::new();
        b.data_in(&data).expect("same data should parse");
        assert_eq!(b.cell(0), 0xF);
        assert_eq!(b.cell(7), 3);
        assert_eq!(b.cell(100), 0);

        assert!(Nram::new().data_out().is_none());
        let bad = BTreeMap::from([("cells".to_string(), "12g4".to_string())]);
        assert!(b.data_in(&bad).is_err());
    }
}
