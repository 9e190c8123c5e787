use caos_common::span::Span;
use crate::opcode::OpCode;

/// A literal operand as written in the script.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f32),
    Str(String),
    /// Raw contents of a `[...]` byte string.
    Bytes(String),
}

/// One operand of a call: a literal, or a nested query whose result is the
/// operand value (`TARG PNTR`, `OUTV FMLY`).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    Query(Call),
}

impl Operand {
    pub fn int(value: i32) -> Self {
        Operand::Literal(Literal::Int(value))
    }

    pub fn float(value: f32) -> Self {
        Operand::Literal(Literal::Float(value))
    }

    pub fn string(value: &str) -> Self {
        Operand::Literal(Literal::Str(value.to_string()))
    }

    pub fn bytes(value: &str) -> Self {
        Operand::Literal(Literal::Bytes(value.to_string()))
    }

    /// A nested query with no operands of its own.
    pub fn query(op: OpCode) -> Self {
        Operand::Query(Call::new(op, Vec::new()))
    }
}

/// A decoded opcode invocation.
///
/// The operand count is *not* guaranteed to match the opcode's signature;
/// the interpreter checks arity before reading any operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: OpCode,
    pub args: Vec<Operand>,
    pub span: Span,
}

impl Call {
    pub fn new(op: OpCode, args: Vec<Operand>) -> Self {
        Self { op, args, span: Span::default() }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Bytes(b) => write!(f, "[{}]", b),
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Literal(lit) => write!(f, "{}", lit),
            Operand::Query(call) => write!(f, "{}", call),
        }
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.op)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
