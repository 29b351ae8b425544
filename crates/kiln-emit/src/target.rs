//! Emission stages provided by a target machine

use kiln_target::{FileType, OptLevel, TargetMachine};
use tracing::debug;

use crate::asm::AsmPrinterPass;
use crate::object_writer::ObjectWriterPass;
use crate::passes::{ConstantPhiPass, EgraphPass, UnreachableCodePass, VerifierPass};
use crate::pipeline::PassPipeline;
use crate::{EmitError, EmitResult};

pub trait TargetMachineExt {
    /// Append the stages that lower every function and write `file_type`
    /// output. Fails without touching the pipeline when the backend cannot
    /// produce that kind of file.
    fn add_passes_to_emit_file(
        &self,
        pipeline: &mut PassPipeline,
        file_type: FileType,
        opt_level: OptLevel,
    ) -> EmitResult<()>;
}

impl TargetMachineExt for TargetMachine {
    fn add_passes_to_emit_file(
        &self,
        pipeline: &mut PassPipeline,
        file_type: FileType,
        opt_level: OptLevel,
    ) -> EmitResult<()> {
        let backend = self.backend();
        if !backend.supports(file_type) {
            return Err(EmitError::unsupported_file_type(backend.name, file_type));
        }

        if pipeline.isa().flags().enable_verifier() {
            pipeline.add(VerifierPass);
        }
        if opt_level == OptLevel::Aggressive {
            pipeline.add(UnreachableCodePass);
            pipeline.add(ConstantPhiPass);
            pipeline.add(EgraphPass);
        }

        match file_type {
            FileType::Assembly => pipeline.add(AsmPrinterPass::new(&self.triple().architecture)),
            FileType::Object => pipeline.add(ObjectWriterPass::new()),
        }

        debug!(
            backend = backend.name,
            %file_type,
            passes = ?pipeline.pass_names(),
            "added emission passes"
        );
        Ok(())
    }
}
