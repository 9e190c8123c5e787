use caos_ir::opcode::{ArgType, OpCode};
use caos_world::{AgentKind, WorldError};

/// Failure of a single opcode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmError {
    #[error("malformed {opcode}: {reason}")]
    MalformedInstruction { opcode: OpCode, reason: String },

    #[error("{opcode}: operand {position} ({param}) must be {expected}, found {found}")]
    TypeMismatch {
        opcode: OpCode,
        position: usize,
        param: &'static str,
        expected: ArgType,
        found: &'static str,
    },

    #[error("{opcode} needs a target but TARG is empty")]
    NoTarget { opcode: OpCode },

    #[error("{opcode}: {source}")]
    ResourceLoad { opcode: OpCode, source: WorldError },

    #[error("{opcode} is not implemented")]
    Unimplemented { opcode: OpCode },

    #[error("{opcode} needs {capability}, but TARG is a {kind}")]
    MissingCapability {
        opcode: OpCode,
        kind: AgentKind,
        capability: &'static str,
    },

    #[error("{opcode}: {reason}")]
    InvalidAgent { opcode: OpCode, reason: String },

    #[error("instruction limit of {0} exceeded")]
    InstructionLimit(usize),
}

impl VmError {
    pub fn malformed(opcode: OpCode, reason: impl Into<String>) -> Self {
        VmError::MalformedInstruction { opcode, reason: reason.into() }
    }

    /// Soft errors are diagnostics; the script carries on regardless of policy.
    pub fn is_soft(&self) -> bool {
        matches!(self, VmError::Unimplemented { .. })
    }
}
