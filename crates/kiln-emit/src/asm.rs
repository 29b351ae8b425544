//! Assembly printer stage
//!
//! Compiles each function with the pipeline's ISA and writes the backend's
//! disassembly, wrapped in GNU-assembler style directives. Symbols get the
//! data layout's global prefix. Block labels are kept as comments because the
//! backend numbers them per function; unwind pseudo-instructions become
//! comments too, since they carry no machine code.

use cranelift_codegen::control::ControlPlane;
use kiln_target::Mangling;
use target_lexicon::Architecture;
use tracing::trace;

use crate::pipeline::{FunctionPass, FunctionUnit, PassContext};
use crate::{EmitError, EmitResult, IrModule};

pub struct AsmPrinterPass {
    comment: &'static str,
    prefix: &'static str,
    elf: bool,
    emitted: usize,
}

impl AsmPrinterPass {
    pub fn new(architecture: &Architecture) -> Self {
        let comment = match architecture {
            Architecture::Aarch64(_) => "//",
            _ => "#",
        };
        Self {
            comment,
            prefix: "",
            elf: false,
            emitted: 0,
        }
    }
}

impl FunctionPass for AsmPrinterPass {
    fn name(&self) -> &'static str {
        "asm-printer"
    }

    fn do_initialization(&mut self, module: &IrModule, cx: &mut PassContext<'_>) -> EmitResult<()> {
        let layout = cx.data_layout()?;
        self.prefix = layout.global_prefix();
        self.elf = layout.mangling() == Mangling::Elf;

        let isa_name = cx.isa().name();
        let comment = self.comment;
        let out = cx.out();
        writeln!(out, "\t.file\t\"{}\"", module.name())?;
        writeln!(out, "\t{comment} target: {isa_name}")?;
        writeln!(out, "\t.text")?;
        Ok(())
    }

    fn run_on_function(
        &mut self,
        unit: &mut FunctionUnit,
        cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        unit.ctx.set_disasm(true);
        let alignment = cx.isa().function_alignment().preferred;
        let compiled = unit
            .ctx
            .compile(cx.isa(), &mut ControlPlane::default())
            .map_err(|err| EmitError::codegen(&unit.symbol, err.inner))?;

        let symbol = format!("{}{}", self.prefix, unit.symbol);
        let end_label = format!(".Lfunc_end{}", self.emitted);
        let code_size = compiled.code_buffer().len();
        trace!(function = %unit.symbol, code_size, "printing assembly");

        let comment = self.comment;
        let out = cx.out();
        writeln!(out, "\t.globl\t{symbol}")?;
        writeln!(out, "\t.p2align\t{}", alignment.max(1).trailing_zeros())?;
        if self.elf {
            writeln!(out, "\t.type\t{symbol},@function")?;
        }
        writeln!(out, "{symbol}:")?;
        match compiled.vcode.as_deref() {
            Some(disasm) => {
                for line in disasm.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line.ends_with(':') || line.starts_with("unwind ") {
                        writeln!(out, "{comment} {line}")?;
                    } else {
                        writeln!(out, "\t{line}")?;
                    }
                }
            }
            None => writeln!(out, "\t{comment} no disassembly available")?,
        }
        writeln!(out, "{end_label}:")?;
        if self.elf {
            writeln!(out, "\t.size\t{symbol}, {end_label}-{symbol}")?;
        }
        writeln!(out, "\t{comment} -- code size: {code_size} bytes")?;
        writeln!(out)?;

        self.emitted += 1;
        Ok(())
    }

    fn do_finalization(&mut self, _module: &IrModule, cx: &mut PassContext<'_>) -> EmitResult<()> {
        if self.elf {
            writeln!(cx.out(), "\t.section\t\".note.GNU-stack\",\"\",@progbits")?;
        }
        Ok(())
    }
}
