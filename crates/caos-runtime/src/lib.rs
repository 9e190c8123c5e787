pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod value;
pub mod vm;

pub use config::{ErrorPolicy, VmConfig};
pub use context::{ExecContext, Register};
pub use error::VmError;
pub use handler::{Diagnostic, DiagnosticHandler, SilentHandler, TracingHandler};
pub use value::Value;
pub use vm::Vm;
