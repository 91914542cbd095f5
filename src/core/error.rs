//! Error taxonomy for link creation, the operation stack and
//! persistence. Runaway propagation and propagate-time invariant
//! violations are flagged and logged rather than returned; see `sim`.

use thiserror::Error;

use crate::core::types::ModuleId;

/// Why a requested link could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("port does not exist")]
    MissingPort,
    #[error("cannot link a port to itself")]
    SelfLink,
    #[error("cannot link a module to itself")]
    SelfModule,
    #[error("both ports drive the same direction")]
    SameDirection,
    #[error("link would close a combinational loop through {modules:?}")]
    WouldLoop { modules: Vec<ModuleId> },
    #[error("no direction assignment satisfies both ports")]
    Unresolvable,
}

/// Operation stack misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("nothing to undo")]
    UndoEmpty,
    #[error("nothing to redo")]
    RedoEmpty,
    #[error("compound operation frames are mismatched")]
    MismatchedCompound,
}

/// Failure while rebuilding a simulation from a saved document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("unknown module kind {0:?}")]
    UnknownKind(String),
    #[error("link references unknown port id {0}")]
    DanglingPort(u32),
    #[error("bad saved data for {kind}: {detail}")]
    BadData { kind: String, detail: String },
    #[error(transparent)]
    Link(#[from] LinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(LinkError::SelfLink.to_string(), "cannot link a port to itself");
        assert_eq!(OpError::UndoEmpty.to_string(), "nothing to undo");
        assert_eq!(
            PersistError::UnknownKind("GATE".into()).to_string(),
            "unknown module kind \"GATE\""
        );
    }

    #[test]
    fn link_errors_nest_into_persist_errors() {
        let e: PersistError = LinkError::SelfModule.into();
        assert_eq!(e, PersistError::Link(LinkError::SelfModule));
        assert_eq!(e.to_string(), "cannot link a module to itself");
    }
}
