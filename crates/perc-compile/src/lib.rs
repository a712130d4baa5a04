mod compiler;
mod emit;
mod error;
mod node;
mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::compiler::CompileInput;
pub use crate::compiler::Compiled;
pub use crate::compiler::Compiler;
pub use crate::compiler::CompilerOutput;
pub use crate::compiler::MapTarget;
pub use crate::compiler::RawSourceMap;
pub use crate::compiler::V3SourceMap;
pub use crate::compiler::COMPILER_NAME;
pub use crate::emit::emit;
pub use crate::emit::EmitOutcome;
pub use crate::error::CompileError;
pub use crate::node::NodeCompiler;
pub use crate::node::DEFAULT_MODULE;
pub use crate::request::CompileRequest;
