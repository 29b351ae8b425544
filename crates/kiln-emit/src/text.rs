//! Textual CLIF form of a module
//!
//! ```text
//! ; module <name>
//!
//! function %first() -> i64 system_v {
//! ...
//! }
//!
//! function %puts(i64) system_v {
//! }
//! ```
//!
//! Declarations print with an empty body. The header is a CLIF comment, so the
//! whole file is still readable by `cranelift-reader` and other CLIF tools.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::emit::write_output_file;
use crate::{EmitResult, IrModule};

const HEADER: &str = "; module ";

/// Name given to modules read from text without a header.
pub const DEFAULT_MODULE_NAME: &str = "module";

/// Write the textual form of `module` to `path`, replacing any existing file.
pub fn write_ir_text(module: &IrModule, path: impl AsRef<Path>) -> EmitResult<()> {
    let path = path.as_ref();
    debug!(module = module.name(), path = %path.display(), "writing CLIF text");
    write_output_file(path, |out| write_module(module, out))
}

pub fn write_module(module: &IrModule, out: &mut dyn Write) -> EmitResult<()> {
    writeln!(out, "{HEADER}{}", module.name())?;
    for func in module.functions() {
        writeln!(out)?;
        write!(out, "{}", func.display())?;
    }
    Ok(())
}

pub fn module_to_string(module: &IrModule) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_module(module, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Read a module back from its textual form. Text without a `; module` header
/// is accepted and gets [`DEFAULT_MODULE_NAME`].
pub fn parse_module(text: &str) -> EmitResult<IrModule> {
    let name = text
        .lines()
        .next()
        .and_then(|line| line.strip_prefix(HEADER))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_MODULE_NAME);

    let functions = cranelift_reader::parse_functions(text)?;
    Ok(IrModule::with_functions(name, functions))
}
