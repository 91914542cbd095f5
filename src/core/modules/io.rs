//! Source kinds: the free-running clock and the user-driven switch
//! bank.

use std::collections::BTreeMap;

use crate::core::geom::Vec2;
use crate::core::port::{Port, SignalTag};
use crate::core::types::PortIx;
use crate::core::value::BinData;

use super::{ModuleBehavior, Part};

/// Free-running clock. The ticker flips the phase; propagation feeds
/// it to the output as 0/1.
#[derive(Debug, Default, PartialEq)]
pub struct Clock {
    phase: bool,
}

impl Clock {
    pub const OUT: PortIx = 0;

    pub fn new() -> Self {
        Clock::default()
    }

    pub fn phase(&self) -> bool {
        self.phase
    }

    pub fn tick(&mut self) {
        self.phase = !self.phase;
    }
}

impl ModuleBehavior for Clock {
    fn ports(&self) -> Vec<Port> {
        vec![Port::output("Clock out", 0.0, SignalTag::Clock)]
    }

    fn parts(&self) -> Vec<Part> {
        vec![Part::led(Vec2::new(0.0, 0.0), SignalTag::Clock)]
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        ports[Self::OUT].value = BinData::new(self.phase as u8);
        if let Some(Part::Led { lit, .. }) = parts.get_mut(0) {
            *lit = self.phase;
        }
    }
}

/// User-controlled constant source: four latching switches drive the
/// output bits, and a momentary button pulses bit 0 while held (handy
/// as a hand-cranked clock).
#[derive(Debug, Default, PartialEq)]
pub struct SwitchInput {
    switches: [bool; 4],
    button: bool,
}

impl SwitchInput {
    pub const OUT: PortIx = 0;

    pub fn new() -> Self {
        SwitchInput::default()
    }

    /// Sets one switch directly. True when `bit` names a switch.
    pub fn set(&mut self, bit: usize, on: bool) -> bool {
        match self.switches.get_mut(bit) {
            Some(s) => {
                *s = on;
                true
            }
            None => false,
        }
    }

    pub fn value(&self) -> BinData {
        let mut v = BinData::from_bits(self.switches);
        if self.button {
            v.set_bit(0, true);
        }
        v
    }
}

impl ModuleBehavior for SwitchInput {
    fn ports(&self) -> Vec<Port> {
        vec![Port::output("Output", 0.0, SignalTag::Generic)]
    }

    fn parts(&self) -> Vec<Part> {
        let mut parts: Vec<Part> = (0..4)
            .map(|bit| Part::toggle(Vec2::new(-1.5 + bit as f64, 0.0), bit))
            .collect();
        parts.push(Part::push_button(Vec2::new(0.0, 1.0)));
        parts
    }

    fn propagate(&mut self, ports: &mut [Port], parts: &mut [Part]) {
        ports[Self::OUT].value = self.value();
        for part in parts.iter_mut() {
            match part {
                Part::ToggleSwitch { bit, on, .. } => *on = self.switches[*bit % 4],
                Part::PushButton { held, .. } => *held = self.button,
                _ => {}
            }
        }
    }

    fn data_out(&self) -> Option<BTreeMap<String, String>> {
        if self.switches.iter().all(|s| !*s) {
            return None;
        }
        // Bit 3 first, like a written binary number.
        let bits: String = (0..4)
            .rev()
            .map(|i| if self.switches[i] { '1' } else { '0' })
            .collect();
        let mut data = BTreeMap::new();
        data.insert("switches".to_string(), bits);
        Some(data)
    }

    fn data_in(&mut self, data: &BTreeMap<String, String>) -> Result<(), String> {
        if let Some(bits) = data.get("switches") {
            if bits.chars().count() != 4 {
                return Err(format!("switch string {bits:?} is not four bits"));
            }
            for (i, c) in bits.chars().enumerate() {
                self.switches[3 - i] = match c {
                    '0' => false,
                    '1' => true,
                    _ => return Err(format!("bad switch digit {c:?}")),
                };
            }
        }
        Ok(())
    }

    fn part_pressed(&mut self, part: &Part) -> bool {
        match part {
            Part::ToggleSwitch { bit, .. } => {
                self.switches[*bit % 4] = !self.switches[*bit % 4];
                true
            }
            Part::PushButton { .. } => {
                self.button = true;
                true
            }
            _ => false,
        }
    }

    fn part_released(&mut self, part: &Part) -> bool {
        match part {
            Part::PushButton { .. } => {
                self.button = false;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::Vec2;
    use crate::core::modules::{Module, ModuleKind};
    use crate::core::port::SignalTag;
    use crate::core::types::ModuleId;

    fn module(kind: ModuleKind) -> Module {
        Module::new(ModuleId(0), kind, Vec2::default())
    }

    #[test]
    fn clock_output_follows_the_phase() {
        let mut m = module(ModuleKind::Clock);
        m.propagate();
        assert_eq!(m.ports[Clock::OUT].value, BinData::new(0));
        assert!(m.tick());
        m.propagate();
        assert_eq!(m.ports[Clock::OUT].value, BinData::new(1));
        assert_eq!(m.parts[0], Part::Led { pos: Vec2::new(0.0, 0.0), tag: SignalTag::Clock, lit: true });
        m.tick();
        m.propagate();
        assert_eq!(m.ports[Clock::OUT].value, BinData::new(0));
    }

    #[test]
    fn switches_compose_the_output_word() {
        let mut m = module(ModuleKind::SwitchInput);
        assert!(m.set_switch(0, true));
        assert!(m.set_switch(2, true));
        assert!(!m.set_switch(9, true));
        m.propagate();
        assert_eq!(m.ports[SwitchInput::OUT].value, BinData::new(0b0101));
    }

    #[test]
    fn pressing_parts_flips_switches_and_pulses_the_button() {
        let mut m = module(ModuleKind::SwitchInput);
        // Part 1 is the bit-1 toggle.
        assert!(m.press_part(1));
        m.propagate();
        assert_eq!(m.ports[SwitchInput::OUT].value, BinData::new(0b0010));
        assert_eq!(m.parts[1], Part::ToggleSwitch { pos: Vec2::new(-0.5, 0.0), bit: 1, on: true });

        // Part 4 is the momentary button on bit 0.
        assert!(m.press_part(4));
        m.propagate();
        assert_eq!(m.ports[SwitchInput::OUT].value, BinData::new(0b0011));
        assert!(m.release_part(4));
        m.propagate();
        assert_eq!(m.ports[SwitchInput::OUT].value, BinData::new(0b0010));
    }

    #[test]
    fn releasing_a_toggle_changes_nothing() {
        let mut m = module(ModuleKind::SwitchInput);
        assert!(!m.release_part(0));
    }

    #[test]
    fn switch_state_round_trips_msb_first() {
        let mut a = SwitchInput::new();
        a.set(3, true);
        a.set(0, true);
        let data = a.data_out().expect("set switches should persist");
        assert_eq!(data.get("switches").map(String::as_str), Some("1001"));

        let mut b = SwitchInput::new();
        b.data_in(&data).expect("same data should parse");
        assert_eq!(b.value(), BinData::new(0b1001));

        assert!(SwitchInput::new().data_out().is_none());
        let bad = BTreeMap::from([("switches".to_string(), "10x1".to_string())]);
        assert!(b.data_in(&bad).is_err());
    }
}
