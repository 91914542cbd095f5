//! Combinational-cycle detection, run while a link is being created.
//!
//! The graph is acyclic before the candidate link goes in, so the only
//! possible cycle runs through the candidate itself. The search walks
//! forward from the candidate's target asking at every hop whether the
//! link about to be crossed is the candidate.

use crate::core::sim::Sim;
use crate::core::types::{LinkId, ModuleId, PortRef};

/// Walks forward from `check`'s target. `Some` carries every module on
/// the cycle, innermost first, for the caller to flag.
pub(crate) fn find_loop(sim: &Sim, check: LinkId) -> Option<Vec<ModuleId>> {
    let targ = sim.link(check)?.targ;
    let mut modules = Vec::new();
    if walk(sim, check, targ, &mut modules) {
        Some(modules)
    } else {
        None
    }
}

fn walk(sim: &Sim, check: LinkId, entry: PortRef, out: &mut Vec<ModuleId>) -> bool {
    let Some(module) = sim.module(entry.module) else {
        return false;
    };
    // Clocked kinds break combinational feedback at themselves.
    if module.kind().terminates_loops() {
        return false;
    }
    for ix in module.affected(entry.port) {
        let Some(port) = module.ports.get(ix) else {
            continue;
        };
        // Chain outputs carry addressing, not data; they never close a
        // combinational cycle.
        if !port.can_output() || port.chain_out {
            continue;
        }
        let Some(link_id) = port.link else {
            continue;
        };
        if link_id == check {
            out.push(entry.module);
            return true;
        }
        let Some(next) = sim.link(link_id) else {
            continue;
        };
        if walk(sim, check, next.targ, out) {
            out.push(entry.module);
            return true;
        }
    }
    false
}
