use caos_world::{AgentRef, World};

use crate::value::Value;

/// An agent register a query result can stay linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Targ,
    Ownr,
}

/// The pending result of the last query.
///
/// A linked result reads the register at consumption time rather than at
/// production time, so `TARG` followed by something that rebinds TARG hands
/// the consumer the current binding.
#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Value(Value),
    Linked(Register),
}

/// Per-script execution state: the TARG and OWNR registers, the query result
/// slot and the text output buffer.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    targ: AgentRef,
    ownr: AgentRef,
    result: Option<Pending>,
    output: String,
}

impl ExecContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a script run on behalf of `ownr`.
    pub fn with_owner(ownr: AgentRef) -> Self {
        Self { ownr, ..Self::default() }
    }

    pub fn targ(&self) -> AgentRef {
        self.targ
    }

    /// Rebind TARG. The previous binding is released first.
    pub fn set_targ(&mut self, agent: AgentRef) {
        self.targ.reset();
        if let Some(id) = agent.id() {
            self.targ.set(id);
        }
    }

    pub fn reset_targ(&mut self) {
        self.targ.reset();
    }

    pub fn ownr(&self) -> AgentRef {
        self.ownr
    }

    pub fn register(&self, register: Register) -> AgentRef {
        match register {
            Register::Targ => self.targ,
            Register::Ownr => self.ownr,
        }
    }

    /// Forget registers that point at destroyed agents.
    pub fn refresh(&mut self, world: &World) {
        self.targ.refresh(world);
        self.ownr.refresh(world);
    }

    pub fn set_result(&mut self, value: Value) {
        self.result = Some(Pending::Value(value));
    }

    pub fn set_result_linked(&mut self, register: Register) {
        self.result = Some(Pending::Linked(register));
    }

    /// Peek at the pending result, reading linked registers now.
    pub fn result(&self) -> Option<Value> {
        self.result.as_ref().map(|pending| self.read(pending))
    }

    /// Consume the pending result.
    pub fn take_result(&mut self) -> Option<Value> {
        let pending = self.result.take()?;
        Some(self.read(&pending))
    }

    fn read(&self, pending: &Pending) -> Value {
        match pending {
            Pending::Value(value) => value.clone(),
            Pending::Linked(register) => Value::Agent(self.register(*register)),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caos_world::{AgentKind, Classifier, VisualSpec};

    fn spawn(world: &mut World) -> AgentRef {
        let id = world
            .create_agent(
                AgentKind::Simple,
                Classifier::new(1, 2, 3),
                0,
                &VisualSpec::new("ball", 1, 0),
            )
            .unwrap();
        AgentRef::to(id)
    }

    #[test]
    fn test_linked_result_follows_register() {
        let mut world = World::default();
        let first = spawn(&mut world);
        let second = spawn(&mut world);

        let mut ctx = ExecContext::new();
        ctx.set_targ(first);
        ctx.set_result_linked(Register::Targ);
        ctx.set_targ(second);

        assert_eq!(ctx.take_result(), Some(Value::Agent(second)));
        assert_eq!(ctx.take_result(), None);
    }

    #[test]
    fn test_plain_result_is_a_snapshot() {
        let mut ctx = ExecContext::new();
        ctx.set_result(Value::Int(7));
        assert_eq!(ctx.result(), Some(Value::Int(7)));
        assert_eq!(ctx.take_result(), Some(Value::Int(7)));
    }

    #[test]
    fn test_refresh_drops_dead_targ() {
        let mut world = World::default();
        let agent = spawn(&mut world);
        let mut ctx = ExecContext::with_owner(agent);
        ctx.set_targ(agent);

        world.destroy_agent(agent.id().unwrap()).unwrap();
        ctx.refresh(&world);

        assert_eq!(ctx.targ(), AgentRef::NULL);
        assert_eq!(ctx.ownr(), AgentRef::NULL);
    }

    #[test]
    fn test_output_buffer() {
        let mut ctx = ExecContext::new();
        ctx.write_output("42");
        ctx.write_output(" hi");
        assert_eq!(ctx.output(), "42 hi");
        assert_eq!(ctx.take_output(), "42 hi");
        assert!(ctx.output().is_empty());
    }
}
