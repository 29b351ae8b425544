//! Function pass pipeline
//!
//! A [`PassPipeline`] is an ordered list of [`FunctionPass`] stages run over one
//! module with a three-phase protocol:
//!
//! ```text
//! do_initialization   (every stage, once, in order)
//!     │
//!     ▼
//! run_on_function     (every stage, for each defined function in declaration order)
//!     │
//!     ▼
//! do_finalization     (every stage, once, in order)
//! ```
//!
//! Declarations are never handed to `run_on_function`. Functions are processed
//! strictly in order because stages may carry state from one function to the
//! next and into finalization.

use std::io::Write;

use cranelift_codegen::Context;
use cranelift_codegen::ir::Function;
use cranelift_codegen::isa::{OwnedTargetIsa, TargetIsa};
use kiln_target::DataLayout;
use tracing::{debug, trace};

use crate::module::{IrModule, duplicate_symbol, has_body, symbol_name};
use crate::{EmitError, EmitResult};

/// State shared by all stages during one pipeline run.
pub struct PassContext<'a> {
    isa: OwnedTargetIsa,
    data_layout: Option<DataLayout>,
    out: &'a mut dyn Write,
}

impl<'a> PassContext<'a> {
    pub fn new(isa: OwnedTargetIsa, out: &'a mut dyn Write) -> Self {
        Self {
            isa,
            data_layout: None,
            out,
        }
    }

    pub fn isa(&self) -> &dyn TargetIsa {
        &*self.isa
    }

    pub fn owned_isa(&self) -> OwnedTargetIsa {
        self.isa.clone()
    }

    pub fn set_data_layout(&mut self, layout: DataLayout) {
        self.data_layout = Some(layout);
    }

    pub fn data_layout(&self) -> EmitResult<&DataLayout> {
        self.data_layout
            .as_ref()
            .ok_or_else(|| crate::EmitErrorKind::MissingDataLayout.into())
    }

    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }
}

/// One function on its way through the pipeline.
pub struct FunctionUnit {
    pub symbol: String,
    pub ctx: Context,
}

impl FunctionUnit {
    pub fn new(func: Function) -> Self {
        Self {
            symbol: symbol_name(&func),
            ctx: Context::for_function(func),
        }
    }
}

pub trait FunctionPass {
    fn name(&self) -> &'static str;

    fn do_initialization(
        &mut self,
        _module: &IrModule,
        _cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        Ok(())
    }

    fn run_on_function(
        &mut self,
        unit: &mut FunctionUnit,
        cx: &mut PassContext<'_>,
    ) -> EmitResult<()>;

    fn do_finalization(
        &mut self,
        _module: &IrModule,
        _cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        Ok(())
    }
}

/// Ordered stages bound to one target ISA, consumed by a single run.
pub struct PassPipeline {
    isa: OwnedTargetIsa,
    passes: Vec<Box<dyn FunctionPass>>,
}

impl PassPipeline {
    pub fn new(isa: OwnedTargetIsa) -> Self {
        Self {
            isa,
            passes: Vec::new(),
        }
    }

    pub fn isa(&self) -> &dyn TargetIsa {
        &*self.isa
    }

    pub fn add(&mut self, pass: impl FunctionPass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every stage over `module`, writing to `out`, then flush `out`.
    pub fn run(mut self, module: &IrModule, out: &mut dyn Write) -> EmitResult<()> {
        debug!(module = module.name(), passes = ?self.pass_names(), "running pass pipeline");
        if let Some(symbol) = duplicate_symbol(module) {
            return Err(EmitError::duplicate_symbol(symbol));
        }

        let mut cx = PassContext::new(self.isa.clone(), out);

        for pass in &mut self.passes {
            pass.do_initialization(module, &mut cx)?;
        }

        for func in module.functions() {
            if !has_body(func) {
                trace!(function = %func.name, "skipping declaration");
                continue;
            }

            let mut unit = FunctionUnit::new(func.clone());
            trace!(function = %unit.symbol, "running function passes");
            for pass in &mut self.passes {
                pass.run_on_function(&mut unit, &mut cx)?;
            }
        }

        for pass in &mut self.passes {
            pass.do_finalization(module, &mut cx)?;
        }

        cx.out().flush().map_err(EmitError::from)
    }
}
