//! File emission entry points

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use kiln_target::{FileType, OptLevel, TargetMachine};
use tracing::{debug, info, warn};

use crate::passes::DataLayoutPass;
use crate::pipeline::PassPipeline;
use crate::target::TargetMachineExt;
use crate::{EmitError, EmitResult, IrModule};

/// Compile every defined function of `module` and write textual assembly to
/// `path`.
pub fn emit_assembly(
    machine: &TargetMachine,
    module: &IrModule,
    path: impl AsRef<Path>,
    aggressive: bool,
) -> EmitResult<()> {
    emit_file(machine, module, path.as_ref(), FileType::Assembly, aggressive)
}

/// Compile every defined function of `module` into a relocatable object file
/// at `path`.
pub fn emit_object(
    machine: &TargetMachine,
    module: &IrModule,
    path: impl AsRef<Path>,
    aggressive: bool,
) -> EmitResult<()> {
    emit_file(machine, module, path.as_ref(), FileType::Object, aggressive)
}

fn emit_file(
    machine: &TargetMachine,
    module: &IrModule,
    path: &Path,
    file_type: FileType,
    aggressive: bool,
) -> EmitResult<()> {
    let opt_level = OptLevel::from_aggressive(aggressive);
    debug!(
        module = module.name(),
        path = %path.display(),
        %file_type,
        ?opt_level,
        "emitting file"
    );

    write_output_file(path, |out| run_pipeline(machine, module, out, file_type, opt_level))?;
    info!(path = %path.display(), "wrote {file_type} file");
    Ok(())
}

/// Create `path`, hand a buffered writer for it to `write` and flush. If
/// anything fails after the file was created it is removed again, so a
/// failed call never leaves truncated output behind.
pub(crate) fn write_output_file<F>(path: &Path, write: F) -> EmitResult<()>
where
    F: FnOnce(&mut dyn Write) -> EmitResult<()>,
{
    let file = File::create(path).map_err(|e| EmitError::io(path, e))?;
    let mut out = BufWriter::new(file);
    let result = write(&mut out).and_then(|()| out.flush().map_err(EmitError::from));
    drop(out);

    if result.is_err() {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), %err, "failed to remove partial output");
        }
    }
    result
}

fn run_pipeline(
    machine: &TargetMachine,
    module: &IrModule,
    out: &mut dyn Write,
    file_type: FileType,
    opt_level: OptLevel,
) -> EmitResult<()> {
    let mut pipeline = PassPipeline::new(machine.isa(opt_level)?);
    pipeline.add(DataLayoutPass::new(machine.data_layout().clone()));
    machine.add_passes_to_emit_file(&mut pipeline, file_type, opt_level)?;
    pipeline.run(module, out)
}
