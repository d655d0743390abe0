pub mod ast;
pub mod expr;
pub mod vmod;
pub mod include_processor;
pub mod types;
pub mod compiler;
pub mod writer;

pub use keytypes_core::*;

pub use compiler::{compile_key_types, Compiler, INCLUDE_FAILURE_PENALTY, MAX_ERRORS};
pub use include_processor::{IncludeLoader, MemoryIncludeLoader};
pub use writer::types_to_string;
