use crate::instruction::{Call, Operand};
use crate::opcode::OpCode;

/// A decoded script: the ordered list of top-level command calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub calls: Vec<Call>,
}

impl Script {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Call> {
        self.calls.iter()
    }
}

impl From<Vec<Call>> for Script {
    fn from(calls: Vec<Call>) -> Self {
        Self { calls }
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Call;
    type IntoIter = std::slice::Iter<'a, Call>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.iter()
    }
}

/// Builder for assembling a script call by call, mostly from host code and
/// tests that bypass the text front end.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    script: Script,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self { script: Script::new() }
    }

    pub fn call(mut self, op: OpCode, args: Vec<Operand>) -> Self {
        self.script.calls.push(Call::new(op, args));
        self
    }

    pub fn push(&mut self, call: Call) {
        self.script.calls.push(call);
    }

    pub fn build(self) -> Script {
        self.script
    }
}
