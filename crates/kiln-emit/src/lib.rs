//! Emission of Cranelift IR modules
//!
//! An [`IrModule`] is run through a [`PassPipeline`] whose last stage, supplied
//! by the target machine, writes assembly or an object file. The module can
//! also be written and read back as CLIF text.

pub mod asm;
pub mod emit;
pub mod errors;
pub mod module;
pub mod object_writer;
pub mod passes;
pub mod pipeline;
pub mod target;
pub mod text;

pub use emit::{emit_assembly, emit_object};
pub use errors::{EmitError, EmitErrorKind, EmitResult};
pub use kiln_target::{FileType, OptLevel};
pub use module::{IrModule, duplicate_symbol, has_body, normalize_symbol, symbol_name};
pub use pipeline::{FunctionPass, FunctionUnit, PassContext, PassPipeline};
pub use target::TargetMachineExt;
pub use text::{module_to_string, parse_module, write_ir_text, write_module};
