//! Links: directed wires between two ports.
//!
//! A `Link` is pure data; creation goes through the guarded factory on
//! `SimContext` so every link in the registry has passed validation,
//! orientation and the loop check.

use crate::core::geom::WirePath;
use crate::core::port::SignalTag;
use crate::core::types::PortRef;

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    /// Driving end. After orientation this port can always output.
    pub src: PortRef,
    /// Driven end.
    pub targ: PortRef,
    pub path: WirePath,
}

impl Link {
    pub fn new(src: PortRef, targ: PortRef, path: WirePath) -> Self {
        Link { src, targ, path }
    }

    pub fn has_end(&self, p: PortRef) -> bool {
        self.src == p || self.targ == p
    }

    /// The opposite endpoint, if `p` is one of ours.
    pub fn other_end(&self, p: PortRef) -> Option<PortRef> {
        if p == self.src {
            Some(self.targ)
        } else if p == self.targ {
            Some(self.src)
        } else {
            None
        }
    }
}

/// Colour class a renderer gives a link, derived from the endpoint
/// signal tags. Clock wins outright; `Generic` defers to the other
/// end; disagreeing tags read as `Mixed`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkTint {
    Clock,
    Neutral,
    Data,
    Control,
    Mixed,
}

impl LinkTint {
    pub fn pick(a: SignalTag, b: SignalTag) -> LinkTint {
        use SignalTag::*;
        match (a, b) {
            (Clock, _) | (_, Clock) => LinkTint::Clock,
            (Generic, Generic) => LinkTint::Neutral,
            (Data, Data) | (Data, Generic) | (Generic, Data) => LinkTint::Data,
            (Control, Control) | (Control, Generic) | (Generic, Control) => LinkTint::Control,
            (Data, Control) | (Control, Data) => LinkTint::Mixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ModuleId, PortRef};

    fn pr(m: u32, p: usize) -> PortRef {
        PortRef::new(ModuleId(m), p)
    }

    #[test]
    fn other_end_flips_and_rejects_strangers() {
        let l = Link::new(pr(0, 1), pr(2, 0), WirePath::new());
        assert_eq!(l.other_end(pr(0, 1)), Some(pr(2, 0)));
        assert_eq!(l.other_end(pr(2, 0)), Some(pr(0, 1)));
        assert_eq!(l.other_end(pr(5, 5)), None);
        assert!(l.has_end(pr(0, 1)));
        assert!(!l.has_end(pr(5, 5)));
    }

    #[test]
    fn tint_table() {
        use SignalTag::*;
        assert_eq!(LinkTint::pick(Clock, Data), LinkTint::Clock);
        assert_eq!(LinkTint::pick(Generic, Clock), LinkTint::Clock);
        assert_eq!(LinkTint::pick(Generic, Generic), LinkTint::Neutral);
        assert_eq!(LinkTint::pick(Data, Generic), LinkTint::Data);
        assert_eq!(LinkTint::pick(Generic, Control), LinkTint::Control);
        assert_eq!(LinkTint::pick(Data, Control), LinkTint::Mixed);
    }
}
