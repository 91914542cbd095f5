//! Direction resolution for bidirectional ports.
//!
//! Committing one bidir port ripples outward: sibling bidirs on the
//! same module take the matching or opposite mode depending on which
//! face they sit on, and each linked sibling pushes a mode across its
//! link, which can commit ports on the far module, and so on. The walk
//! is a worklist with a visited set so clustered rings settle at a
//! fixpoint instead of recursing forever.

use std::collections::{HashSet, VecDeque};

use log::trace;

use crate::core::port::PortMode;
use crate::core::sim::Sim;
use crate::core::types::PortRef;

/// Assigns `mode` to `root` and resolves the whole connected bidir
/// cluster. Unidirectional ports ignore assignments.
pub(crate) fn set_port_mode(sim: &mut Sim, root: PortRef, mode: PortMode) {
    let mut work: VecDeque<(PortRef, PortMode)> = VecDeque::new();
    let mut visited: HashSet<(PortRef, PortMode)> = HashSet::new();
    work.push_back((root, mode));

    while let Some((at, m)) = work.pop_front() {
        if !visited.insert((at, m)) {
            continue;
        }
        let Some(port) = sim.port_mut(at) else {
            continue;
        };
        if !port.is_bidir() {
            continue;
        }
        if port.mode == m {
            continue;
        }
        port.mode = m;
        trace!("{} committed {:?}", at, m);

        // The changed port acts as the root for its own module: every
        // other bidir takes a mode relative to it, and linked siblings
        // push a mode to the far end of their link.
        let Some(module) = sim.module(at.module) else {
            continue;
        };
        let root_side = module.ports[at.port].side;
        for (ix, sibling) in module.ports.iter().enumerate() {
            if ix == at.port || !sibling.is_bidir() {
                continue;
            }
            let same_side = sibling.side == root_side;
            let sibling_mode = if same_side { m } else { m.opposite() };
            let here = PortRef::new(at.module, ix);
            work.push_back((here, sibling_mode));

            if let Some(link) = sibling.link.and_then(|id| sim.link(id)) {
                if m == PortMode::Bidir {
                    work.push_back((link.src, PortMode::Bidir));
                    work.push_back((link.targ, PortMode::Bidir));
                } else if let Some(far) = link.other_end(here) {
                    let far_mode = if same_side { m.opposite() } else { m };
                    work.push_back((far, far_mode));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::{Vec2, WirePath};
    use crate::core::link::Link;
    use crate::core::modules::{ModuleKind, Nram};
    use crate::core::types::LinkId;

    fn wire(sim: &mut Sim, src: PortRef, targ: PortRef) -> LinkId {
        let id = sim.mint_link_id();
        sim.insert_link(id, Link::new(src, targ, WirePath::new()));
        sim.port_mut(src).unwrap().link = Some(id);
        sim.port_mut(targ).unwrap().link = Some(id);
        id
    }

    fn mode(sim: &Sim, r: PortRef) -> PortMode {
        sim.port(r).unwrap().mode
    }

    #[test]
    fn committing_one_data_port_orients_the_sibling() {
        let mut sim = Sim::new();
        let ram = sim.add_module(ModuleKind::Nram, Vec2::default());
        let front = PortRef::new(ram, Nram::DATA_A);
        let back = PortRef::new(ram, Nram::DATA_B);

        set_port_mode(&mut sim, front, PortMode::Output);
        assert_eq!(mode(&sim, front), PortMode::Output);
        assert_eq!(mode(&sim, back), PortMode::Input);
    }

    #[test]
    fn commitment_crosses_links_to_the_far_module() {
        let mut sim = Sim::new();
        let a = sim.add_module(ModuleKind::Nram, Vec2::default());
        let b = sim.add_module(ModuleKind::Nram, Vec2::default());
        wire(
            &mut sim,
            PortRef::new(a, Nram::DATA_B),
            PortRef::new(b, Nram::DATA_A),
        );

        set_port_mode(&mut sim, PortRef::new(a, Nram::DATA_A), PortMode::Output);

        // a's back port receives, so b's front port must drive it, and
        // b's own back port flips to receive in turn.
        assert_eq!(mode(&sim, PortRef::new(a, Nram::DATA_B)), PortMode::Input);
        assert_eq!(mode(&sim, PortRef::new(b, Nram::DATA_A)), PortMode::Output);
        assert_eq!(mode(&sim, PortRef::new(b, Nram::DATA_B)), PortMode::Input);
    }

    #[test]
    fn bidir_assignment_releases_both_ends_of_each_link() {
        let mut sim = Sim::new();
        let a = sim.add_module(ModuleKind::Nram, Vec2::default());
        let b = sim.add_module(ModuleKind::Nram, Vec2::default());
        wire(
            &mut sim,
            PortRef::new(a, Nram::DATA_B),
            PortRef::new(b, Nram::DATA_A),
        );
        set_port_mode(&mut sim, PortRef::new(a, Nram::DATA_A), PortMode::Output);
        set_port_mode(&mut sim, PortRef::new(a, Nram::DATA_A), PortMode::Bidir);

        for (m, ix) in [(a, Nram::DATA_A), (a, Nram::DATA_B), (b, Nram::DATA_A), (b, Nram::DATA_B)] {
            assert_eq!(mode(&sim, PortRef::new(m, ix)), PortMode::Bidir);
        }
    }

    #[test]
    fn a_ring_of_buses_settles() {
        let mut sim = Sim::new();
        let rams: Vec<_> = (0..3)
            .map(|_| sim.add_module(ModuleKind::Nram, Vec2::default()))
            .collect();
        for i in 0..3 {
            wire(
                &mut sim,
                PortRef::new(rams[i], Nram::DATA_B),
                PortRef::new(rams[(i + 1) % 3], Nram::DATA_A),
            );
        }

        set_port_mode(&mut sim, PortRef::new(rams[0], Nram::DATA_A), PortMode::Output);

        for &ram in &rams {
            assert_eq!(mode(&sim, PortRef::new(ram, Nram::DATA_A)), PortMode::Output);
            assert_eq!(mode(&sim, PortRef::new(ram, Nram::DATA_B)), PortMode::Input);
        }
    }

    #[test]
    fn unidirectional_ports_ignore_assignments() {
        let mut sim = Sim::new();
        let or = sim.add_module(ModuleKind::Or, Vec2::default());
        let input = PortRef::new(or, 0);
        set_port_mode(&mut sim, input, PortMode::Output);
        assert_eq!(mode(&sim, input), PortMode::Input);
    }
}
