use std::fmt;

use caos_ir::instruction::Literal;
use caos_world::AgentRef;

/// Runtime value representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Str(String),
    /// Raw byte-string text, validated by the opcode that consumes it.
    Bytes(String),
    Agent(AgentRef),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "byte-string",
            Value::Agent(_) => "agent",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_agent(&self) -> Option<AgentRef> {
        match self {
            Value::Agent(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::Str(s) => Value::Str(s.clone()),
            Literal::Bytes(b) => Value::Bytes(b.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "[{}]", b),
            Value::Agent(r) if r.id().is_none() => write!(f, "<null agent>"),
            Value::Agent(_) => write!(f, "<agent>"),
        }
    }
}
