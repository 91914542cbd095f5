//! Identity types for everything the registry owns.
//!
//! All identity is numeric and session-local: the registry mints ids
//! monotonically and never reuses one, so an id stays valid across
//! delete/undo cycles and map iteration order equals creation order.
//! Saved files re-key everything (see `persist`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a module within one session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Stable identity of a link within one session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct LinkId(pub u32);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Index of a port within its module's port list. Port lists are built
/// once per module by the kind catalogue, so indices are stable.
pub type PortIx = usize;

/// A port, addressed through its owning module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PortRef {
    pub module: ModuleId,
    pub port: PortIx,
}

impl PortRef {
    pub fn new(module: ModuleId, port: PortIx) -> Self {
        PortRef { module, port }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.port)
    }
}

/// Anything the editor can pick up and move.
///
/// Control points are addressed by their position inside the owning
/// link's wire path; operation replay is strictly LIFO, which keeps
/// those indices consistent across undo/redo.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityId {
    Module(ModuleId),
    CtrlPt { link: LinkId, index: usize },
}

/// Quarter-turn rotation direction for module transforms.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RotationDir {
    Clockwise,
    CounterClockwise,
}

impl RotationDir {
    pub fn opposite(self) -> Self {
        match self {
            RotationDir::Clockwise => RotationDir::CounterClockwise,
            RotationDir::CounterClockwise => RotationDir::Clockwise,
        }
    }
}
