use caos_ir::instruction::{Call, Operand};
use caos_ir::opcode::{ArgType, OpCode, OpKind, Param};
use caos_ir::script::Script;
use caos_world::{Agent, AgentKind, AgentRef, Animation, Classifier, VisualSpec, World};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::config::{ErrorPolicy, VmConfig};
use crate::context::{ExecContext, Register};
use crate::error::VmError;
use crate::handler::{Diagnostic, DiagnosticHandler, TracingHandler};
use crate::value::Value;

/// An operand after coercion to its declared parameter type.
#[derive(Debug, Clone)]
enum Arg {
    Int(i32),
    Text(String),
    Agent(AgentRef),
}

/// Coerced operands of one call, in script order.
struct Args {
    opcode: OpCode,
    params: &'static [Param],
    values: Vec<Arg>,
}

impl Args {
    fn mismatch(&self, index: usize, found: &'static str) -> VmError {
        let param = self.params.get(index);
        VmError::TypeMismatch {
            opcode: self.opcode,
            position: index + 1,
            param: param.map_or("?", |p| p.name),
            expected: param.map_or(ArgType::Integer, |p| p.ty),
            found,
        }
    }

    fn int(&self, index: usize) -> Result<i32, VmError> {
        match self.values.get(index) {
            Some(Arg::Int(n)) => Ok(*n),
            _ => Err(self.mismatch(index, "non-integer")),
        }
    }

    fn text(&self, index: usize) -> Result<&str, VmError> {
        match self.values.get(index) {
            Some(Arg::Text(s)) => Ok(s),
            _ => Err(self.mismatch(index, "non-string")),
        }
    }

    fn agent(&self, index: usize) -> Result<AgentRef, VmError> {
        match self.values.get(index) {
            Some(Arg::Agent(r)) => Ok(*r),
            _ => Err(self.mismatch(index, "non-agent")),
        }
    }
}

/// The CAOS interpreter.
///
/// Holds no world state of its own: every call operates on the [`World`] and
/// [`ExecContext`] it is handed.
pub struct Vm {
    config: VmConfig,
    handler: Box<dyn DiagnosticHandler>,
    /// Diagnostics raised by the current or most recent run.
    diagnostics: Vec<Diagnostic>,
    rng: StdRng,
    /// Calls executed in the current run, nested queries included.
    executed: usize,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl Vm {
    pub fn new(config: VmConfig) -> Self {
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let rng = StdRng::seed_from_u64(seed);
        Self {
            config,
            handler: Box::new(TracingHandler),
            diagnostics: Vec::new(),
            rng,
            executed: 0,
        }
    }

    pub fn with_handler(mut self, handler: Box<dyn DiagnosticHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Run every call of `script` in order.
    ///
    /// Soft errors never stop the script. Hard errors stop it under
    /// [`ErrorPolicy::AbortScript`]; under [`ErrorPolicy::ContinueScript`]
    /// they become [`Diagnostic::Recovered`]. Exceeding the instruction
    /// limit always stops the script.
    ///
    /// Diagnostics left over from the previous run are discarded.
    pub fn run(
        &mut self,
        script: &Script,
        ctx: &mut ExecContext,
        world: &mut World,
    ) -> Result<(), VmError> {
        self.executed = 0;
        self.diagnostics.clear();
        for call in script {
            match self.execute(call, ctx, world) {
                Ok(()) => {}
                Err(err) if err.is_soft() => {}
                Err(err @ VmError::InstructionLimit(_)) => return Err(err),
                Err(err) => match self.config.error_policy {
                    ErrorPolicy::AbortScript => {
                        debug!(%err, "script aborted");
                        return Err(err);
                    }
                    ErrorPolicy::ContinueScript => self.report(Diagnostic::Recovered(err)),
                },
            }
        }
        Ok(())
    }

    /// Execute one call.
    ///
    /// The operand count is checked before any operand is read, and every
    /// operand is evaluated and type-checked before the opcode touches the
    /// world, so a failing call leaves the world and registers unchanged.
    /// Queries leave their value in the context's result slot.
    pub fn execute(
        &mut self,
        call: &Call,
        ctx: &mut ExecContext,
        world: &mut World,
    ) -> Result<(), VmError> {
        self.count_instruction()?;
        let signature = call.op.signature();
        if call.args.len() != signature.arity() {
            return Err(VmError::malformed(
                call.op,
                format!("expected {} operands, found {}", signature.arity(), call.args.len()),
            ));
        }

        let mut values = Vec::with_capacity(call.args.len());
        for (index, (operand, param)) in call.args.iter().zip(signature.params).enumerate() {
            let value = self.evaluate(operand, ctx, world)?;
            values.push(coerce(call.op, index, param, value, world)?);
        }
        let args = Args { opcode: call.op, params: signature.params, values };

        self.dispatch(call.op, &args, ctx, world)
    }

    fn count_instruction(&mut self) -> Result<(), VmError> {
        self.executed += 1;
        if self.executed > self.config.instruction_limit {
            return Err(VmError::InstructionLimit(self.config.instruction_limit));
        }
        Ok(())
    }

    fn evaluate(
        &mut self,
        operand: &Operand,
        ctx: &mut ExecContext,
        world: &mut World,
    ) -> Result<Value, VmError> {
        match operand {
            Operand::Literal(literal) => Ok(Value::from(literal)),
            Operand::Query(call) => {
                if call.op.signature().is_command() {
                    return Err(VmError::malformed(call.op, "command used as an operand"));
                }
                match self.execute(call, ctx, world) {
                    Ok(()) => {}
                    // Unimplemented queries still leave a default result.
                    Err(err) if err.is_soft() => {}
                    Err(err) => return Err(err),
                }
                ctx.take_result()
                    .ok_or_else(|| VmError::malformed(call.op, "query produced no value"))
            }
        }
    }

    fn dispatch(
        &mut self,
        op: OpCode,
        args: &Args,
        ctx: &mut ExecContext,
        world: &mut World,
    ) -> Result<(), VmError> {
        match op {
            // =================================================================
            // Creation
            // =================================================================
            OpCode::NewSimp => self.new_agent(op, AgentKind::Simple, args, ctx, world),
            OpCode::NewComp => self.new_agent(op, AgentKind::Compound, args, ctx, world),
            OpCode::NewVhcl => self.new_agent(op, AgentKind::Vehicle, args, ctx, world),

            // =================================================================
            // Registers
            // =================================================================
            OpCode::TargSet => {
                ctx.set_targ(args.agent(0)?);
                Ok(())
            }
            OpCode::Targ => {
                ctx.set_result_linked(Register::Targ);
                Ok(())
            }
            OpCode::Ownr => {
                ctx.refresh(world);
                ctx.set_result_linked(Register::Ownr);
                Ok(())
            }
            OpCode::Null => {
                ctx.set_result(Value::Agent(AgentRef::NULL));
                Ok(())
            }
            OpCode::Pntr => {
                ctx.set_result(Value::Agent(world.hand()));
                Ok(())
            }
            OpCode::Rtar => {
                let filter = Classifier::new(args.int(0)?, args.int(1)?, args.int(2)?);
                ctx.reset_targ();
                let candidates = world.find_matching(filter);
                if let Some(id) = candidates.choose(&mut self.rng) {
                    ctx.set_targ(AgentRef::to(*id));
                }
                debug!(
                    %filter,
                    candidates = candidates.len(),
                    found = ctx.targ().id().is_some(),
                    "RTAR"
                );
                Ok(())
            }

            // =================================================================
            // Target properties
            // =================================================================
            OpCode::AttrSet => {
                let attributes = args.int(0)?;
                target_mut(op, ctx, world)?.set_attributes(attributes);
                Ok(())
            }
            OpCode::Attr => self.query_int(op, ctx, world, Agent::attributes),
            OpCode::Fmly => self.query_int(op, ctx, world, Agent::family),
            OpCode::Gnus => self.query_int(op, ctx, world, Agent::genus),
            OpCode::Spcs => self.query_int(op, ctx, world, Agent::species),
            OpCode::Plne => self.query_int(op, ctx, world, Agent::plane),
            OpCode::Anim => self.anim(op, args, ctx, world),

            // =================================================================
            // Destruction
            // =================================================================
            OpCode::Kill => {
                let victim = args.agent(0)?;
                let id = victim.live(world).ok_or_else(|| VmError::InvalidAgent {
                    opcode: op,
                    reason: "no such agent".to_string(),
                })?;
                world
                    .destroy_agent(id)
                    .map_err(|err| VmError::InvalidAgent { opcode: op, reason: err.to_string() })?;
                ctx.refresh(world);
                Ok(())
            }

            // =================================================================
            // Output
            // =================================================================
            OpCode::Outv => {
                let value = args.int(0)?;
                ctx.write_output(&value.to_string());
                Ok(())
            }
            OpCode::Outs => {
                let text = args.text(0)?;
                ctx.write_output(text);
                Ok(())
            }

            // =================================================================
            // Accepted, not yet implemented
            // =================================================================
            OpCode::PoseSet
            | OpCode::Pose
            | OpCode::BaseSet
            | OpCode::Base
            | OpCode::Abba
            | OpCode::Tick
            | OpCode::BhvrSet
            | OpCode::Bhvr
            | OpCode::Next
            | OpCode::Scrx
            | OpCode::From
            | OpCode::Carr => self.unimplemented(op, ctx),
        }
    }

    fn new_agent(
        &mut self,
        op: OpCode,
        kind: AgentKind,
        args: &Args,
        ctx: &mut ExecContext,
        world: &mut World,
    ) -> Result<(), VmError> {
        let classifier = Classifier::new(args.int(0)?, args.int(1)?, args.int(2)?);
        let sprite = args.text(3)?;
        let image_count = u32::try_from(args.int(4)?)
            .map_err(|_| VmError::malformed(op, "image_count must not be negative"))?;
        let first_image = u32::try_from(args.int(5)?)
            .map_err(|_| VmError::malformed(op, "first_image must not be negative"))?;
        let plane = args.int(6)?;

        let visual = VisualSpec::new(sprite, image_count, first_image);
        let id = world
            .create_agent(kind, classifier, plane, &visual)
            .map_err(|source| VmError::ResourceLoad { opcode: op, source })?;
        ctx.set_targ(AgentRef::to(id));
        Ok(())
    }

    fn query_int(
        &mut self,
        op: OpCode,
        ctx: &mut ExecContext,
        world: &World,
        read: fn(&Agent) -> i32,
    ) -> Result<(), VmError> {
        let value = read(target(op, ctx, world)?);
        ctx.set_result(Value::Int(value));
        Ok(())
    }

    fn anim(
        &mut self,
        op: OpCode,
        args: &Args,
        ctx: &mut ExecContext,
        world: &mut World,
    ) -> Result<(), VmError> {
        let poses = args.text(0)?;
        let agent = target_mut(op, ctx, world)?;
        let kind = agent.kind();
        let animatable = agent.as_animatable_mut().ok_or(VmError::MissingCapability {
            opcode: op,
            kind,
            capability: "pose animation",
        })?;

        // Parse and range-check fully before touching the agent.
        match Animation::parse(poses).map_err(|err| VmError::malformed(op, err.to_string()))? {
            Some(animation) => {
                let sprite = animatable.sprite();
                let stray = animation.frames().iter().find(|&&pose| !sprite.owns_pose(pose));
                if let Some(&pose) = stray {
                    return Err(VmError::malformed(
                        op,
                        format!(
                            "pose {} outside the agent's {} images",
                            pose,
                            sprite.image_count()
                        ),
                    ));
                }
                animatable.set_animation(animation);
                Ok(())
            }
            None => {
                animatable.clear_animation();
                warn!(opcode = %op, "empty animation string");
                self.report(Diagnostic::EmptyAnimation);
                Ok(())
            }
        }
    }

    fn unimplemented(&mut self, op: OpCode, ctx: &mut ExecContext) -> Result<(), VmError> {
        if let OpKind::Query(ty) = op.signature().kind {
            ctx.set_result(default_value(ty));
        }
        warn!(opcode = %op, "unimplemented opcode; running as a no-op");
        self.report(Diagnostic::Unimplemented { opcode: op });
        Err(VmError::Unimplemented { opcode: op })
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.handler.on_diagnostic(&diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

fn target<'w>(op: OpCode, ctx: &ExecContext, world: &'w World) -> Result<&'w Agent, VmError> {
    ctx.targ().resolve(world).ok_or(VmError::NoTarget { opcode: op })
}

fn target_mut<'w>(
    op: OpCode,
    ctx: &ExecContext,
    world: &'w mut World,
) -> Result<&'w mut Agent, VmError> {
    ctx.targ().resolve_mut(world).ok_or(VmError::NoTarget { opcode: op })
}

/// Placeholder result of an unimplemented query.
fn default_value(ty: ArgType) -> Value {
    match ty {
        ArgType::Integer => Value::Int(0),
        ArgType::String => Value::Str(String::new()),
        ArgType::ByteString => Value::Bytes(String::new()),
        ArgType::Agent => Value::Agent(AgentRef::NULL),
    }
}

/// Convert an evaluated operand to the parameter's declared type.
///
/// Floats are accepted where integers are expected and truncate toward
/// zero. A plain string is accepted where a byte string is expected. Agent
/// operands may be null; a reference to a destroyed agent reads as null.
fn coerce(
    op: OpCode,
    index: usize,
    param: &Param,
    value: Value,
    world: &World,
) -> Result<Arg, VmError> {
    let mismatch = |found: &'static str| VmError::TypeMismatch {
        opcode: op,
        position: index + 1,
        param: param.name,
        expected: param.ty,
        found,
    };
    match (param.ty, value) {
        (ArgType::Integer, Value::Int(n)) => Ok(Arg::Int(n)),
        (ArgType::Integer, Value::Float(n)) => Ok(Arg::Int(n as i32)),
        (ArgType::String, Value::Str(s)) => Ok(Arg::Text(s)),
        (ArgType::ByteString, Value::Bytes(s) | Value::Str(s)) => Ok(Arg::Text(s)),
        (ArgType::Agent, Value::Agent(mut r)) => {
            r.refresh(world);
            Ok(Arg::Agent(r))
        }
        (_, other) => Err(mismatch(other.type_name())),
    }
}
