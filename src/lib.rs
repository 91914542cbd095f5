//! Simulation core for a grid-based schematic editor of 4-bit logic.
//!
//! The crate owns the data model (modules, ports, links), event-driven
//! value propagation, combinational-loop rejection, bidirectional port
//! resolution, an undoable operation history, and the save-document
//! boundary. Rendering and input handling live elsewhere and drive
//! this crate through [`SimContext`].

pub mod core;

// Re-export the working surface
pub use crate::core::context::{SharedContext, SimContext, ViewState};
pub use crate::core::error::{LinkError, OpError, PersistError};
pub use crate::core::geom::{Vec2, WirePath, GRID};
pub use crate::core::link::{Link, LinkTint};
pub use crate::core::modules::{Module, ModuleKind};
pub use crate::core::persist::{capture, restore, SimDocument};
pub use crate::core::port::{Port, PortMode, Side, SignalTag};
pub use crate::core::sim::Sim;
pub use crate::core::ticker::{Ticker, DEFAULT_TICK};
pub use crate::core::types::{EntityId, LinkId, ModuleId, PortIx, PortRef, RotationDir};
pub use crate::core::value::BinData;
