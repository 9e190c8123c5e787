use caos_ir::opcode::OpCode;
use tracing::{debug, error};

use crate::error::VmError;

/// Something the VM reports without failing the running opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The opcode has no behaviour yet; it ran as a no-op and any query
    /// result is a placeholder default, not a real empty value.
    Unimplemented { opcode: OpCode },
    /// `ANIM` produced no frames; the agent was left without an animation.
    EmptyAnimation,
    /// A hard error that did not abort the script under
    /// [`ErrorPolicy::ContinueScript`](crate::ErrorPolicy::ContinueScript).
    Recovered(VmError),
}

/// Receives diagnostics as they happen.
pub trait DiagnosticHandler: Send {
    fn on_diagnostic(&self, diagnostic: &Diagnostic);
}

/// Default handler: forwards to `tracing`. The VM already warns at the
/// point of origin, so only recovered errors are logged above debug.
pub struct TracingHandler;

impl DiagnosticHandler for TracingHandler {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::Unimplemented { opcode } => {
                debug!(%opcode, "unimplemented opcode reported")
            }
            Diagnostic::EmptyAnimation => debug!("empty animation reported"),
            Diagnostic::Recovered(err) => error!(%err, "opcode failed; continuing script"),
        }
    }
}

/// Convenience: no-op handler for testing.
pub struct SilentHandler;

impl DiagnosticHandler for SilentHandler {
    fn on_diagnostic(&self, _: &Diagnostic) {}
}
