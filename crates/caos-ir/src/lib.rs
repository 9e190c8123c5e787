pub mod instruction;
pub mod opcode;
pub mod script;
