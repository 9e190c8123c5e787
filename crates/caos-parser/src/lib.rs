pub mod parser;

pub use parser::{Injection, Parser, compile, compile_injection, lex};
