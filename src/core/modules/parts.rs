//! Visible parts: the indicators and controls drawn on module faces.
//!
//! Parts are a render mirror plus interaction surface. Truth lives in
//! the kind state; `propagate` refreshes the mirror, and pointer
//! presses are routed to the kind through `Module::press_part`.

use crate::core::geom::Vec2;
use crate::core::port::SignalTag;
use crate::core::value::BinData;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Part {
    /// Single indicator lamp, coloured by signal class.
    Led { pos: Vec2, tag: SignalTag, lit: bool },
    /// Four-lamp row showing a whole word.
    LedRow { pos: Vec2, value: BinData },
    /// Latching switch bound to one output bit.
    ToggleSwitch { pos: Vec2, bit: usize, on: bool },
    /// Momentary pulse button.
    PushButton { pos: Vec2, held: bool },
    Label { pos: Vec2, text: &'static str },
}

impl Part {
    pub fn led(pos: Vec2, tag: SignalTag) -> Self {
        Part::Led {
            pos,
            tag,
            lit: false,
        }
    }

    pub fn led_row(pos: Vec2) -> Self {
        Part::LedRow {
            pos,
            value: BinData::disconnected(),
        }
    }

    pub fn toggle(pos: Vec2, bit: usize) -> Self {
        Part::ToggleSwitch {
            pos,
            bit,
            on: false,
        }
    }

    pub fn push_button(pos: Vec2) -> Self {
        Part::PushButton { pos, held: false }
    }

    pub fn label(pos: Vec2, text: &'static str) -> Self {
        Part::Label { pos, text }
    }

    /// Whether pointer presses mean anything to this part.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Part::ToggleSwitch { .. } | Part::PushButton { .. })
    }
}
