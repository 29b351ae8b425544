//! Pipeline stages that are not tied to an output format
//!
//! [`DataLayoutPass`] makes the target's layout available to later stages; the
//! others wrap Cranelift's own verifier and per-function transforms.

use cranelift_codegen::control::ControlPlane;
use cranelift_codegen::print_errors::pretty_verifier_error;
use kiln_target::DataLayout;

use crate::pipeline::{FunctionPass, FunctionUnit, PassContext};
use crate::{EmitError, EmitResult, IrModule};

/// Publishes the target data layout to the pipeline. Must come first.
pub struct DataLayoutPass {
    layout: DataLayout,
}

impl DataLayoutPass {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }
}

impl FunctionPass for DataLayoutPass {
    fn name(&self) -> &'static str {
        "datalayout"
    }

    fn do_initialization(
        &mut self,
        _module: &IrModule,
        cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        cx.set_data_layout(self.layout.clone());
        Ok(())
    }

    fn run_on_function(
        &mut self,
        _unit: &mut FunctionUnit,
        _cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        Ok(())
    }
}

/// Runs the Cranelift IR verifier on each function.
pub struct VerifierPass;

impl FunctionPass for VerifierPass {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn run_on_function(
        &mut self,
        unit: &mut FunctionUnit,
        cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        unit.ctx.verify(cx.isa()).map_err(|errors| {
            let message = pretty_verifier_error(&unit.ctx.func, None, errors);
            EmitError::verifier(&unit.symbol, message)
        })
    }
}

/// Removes blocks unreachable from the entry block.
pub struct UnreachableCodePass;

impl FunctionPass for UnreachableCodePass {
    fn name(&self) -> &'static str {
        "unreachable-code"
    }

    fn run_on_function(
        &mut self,
        unit: &mut FunctionUnit,
        cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        unit.ctx.compute_cfg();
        unit.ctx.compute_domtree();
        unit.ctx
            .eliminate_unreachable_code(cx.isa())
            .map_err(|e| EmitError::codegen(&unit.symbol, e))
    }
}

/// Replaces block parameters that always receive the same value.
pub struct ConstantPhiPass;

impl FunctionPass for ConstantPhiPass {
    fn name(&self) -> &'static str {
        "constant-phis"
    }

    fn run_on_function(
        &mut self,
        unit: &mut FunctionUnit,
        cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        unit.ctx.compute_cfg();
        unit.ctx.compute_domtree();
        unit.ctx
            .remove_constant_phis(cx.isa())
            .map_err(|e| EmitError::codegen(&unit.symbol, e))
    }
}

/// Cranelift's e-graph optimizer: rewrites, GVN and LICM. Pure values
/// nothing uses are not elaborated back, so this also deletes dead code.
pub struct EgraphPass;

impl FunctionPass for EgraphPass {
    fn name(&self) -> &'static str {
        "egraph"
    }

    fn run_on_function(
        &mut self,
        unit: &mut FunctionUnit,
        cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        unit.ctx.compute_cfg();
        unit.ctx.compute_domtree();
        unit.ctx
            .egraph_pass(cx.isa(), &mut ControlPlane::default())
            .map_err(|e| EmitError::codegen(&unit.symbol, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmitErrorKind;
    use kiln_target::{OptLevel, create_target_machine};

    fn context(out: &mut Vec<u8>) -> PassContext<'_> {
        let isa = create_target_machine("x86-64", "x86_64-unknown-linux", &[] as &[&str], false)
            .unwrap()
            .isa(OptLevel::None)
            .unwrap();
        PassContext::new(isa, out)
    }

    fn unit(text: &str) -> FunctionUnit {
        FunctionUnit::new(cranelift_reader::parse_functions(text).unwrap().remove(0))
    }

    #[test]
    fn test_data_layout_published_at_initialization() {
        let mut out = Vec::new();
        let mut cx = context(&mut out);
        let layout = kiln_target::DataLayout::from_isa(cx.isa());

        let err = cx.data_layout().unwrap_err();
        assert!(matches!(err.kind(), EmitErrorKind::MissingDataLayout));

        let mut pass = DataLayoutPass::new(layout.clone());
        pass.do_initialization(&IrModule::new("m"), &mut cx).unwrap();
        assert_eq!(cx.data_layout().unwrap(), &layout);
    }

    #[test]
    fn test_egraph_removes_dead_code() {
        let mut out = Vec::new();
        let mut cx = context(&mut out);
        let mut unit = unit(
            "function %f() -> i64 {\n\
             block0:\n\
             v0 = iconst.i64 1\n\
             v1 = iconst.i64 2\n\
             return v0\n\
             }\n",
        );

        EgraphPass.run_on_function(&mut unit, &mut cx).unwrap();
        let text = unit.ctx.func.display().to_string();
        assert!(text.contains("iconst.i64 1"));
        assert!(!text.contains("iconst.i64 2"));
    }

    #[test]
    fn test_unreachable_block_removed() {
        let mut out = Vec::new();
        let mut cx = context(&mut out);
        let mut unit = unit(
            "function %f() -> i64 {\n\
             block0:\n\
             v0 = iconst.i64 1\n\
             return v0\n\
             \n\
             block1:\n\
             v1 = iconst.i64 2\n\
             return v1\n\
             }\n",
        );

        UnreachableCodePass.run_on_function(&mut unit, &mut cx).unwrap();
        assert!(!unit.ctx.func.display().to_string().contains("block1"));
    }

    #[test]
    fn test_verifier_rejects_bad_return() {
        let mut out = Vec::new();
        let mut cx = context(&mut out);
        let mut unit = unit(
            "function %bad() -> i64 {\n\
             block0:\n\
             v0 = iconst.i32 1\n\
             return v0\n\
             }\n",
        );

        let err = VerifierPass.run_on_function(&mut unit, &mut cx).unwrap_err();
        assert!(matches!(err.kind(), EmitErrorKind::Verifier { .. }));
        assert!(err.to_string().contains("bad"));
    }
}
