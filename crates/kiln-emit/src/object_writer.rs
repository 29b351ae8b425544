//! Relocatable object writer stage

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use cranelift_codegen::ir::{ExternalName, FuncRef, UserExternalName};
use cranelift_module::{FuncId, Linkage, Module, default_libcall_names};
use cranelift_object::{ObjectBuilder, ObjectModule};
use tracing::{debug, trace};

use crate::module::{has_body, normalize_symbol, symbol_name};
use crate::pipeline::{FunctionPass, FunctionUnit, PassContext};
use crate::{EmitError, EmitResult, IrModule};

/// Collects every defined function into one object file, written out at
/// finalization. Declarations become undefined imports.
#[derive(Default)]
pub struct ObjectWriterPass {
    object: Option<ObjectModule>,
    ids: HashMap<String, FuncId>,
}

impl ObjectWriterPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every direct callee of the unit at the id declared for its
    /// symbol. Library calls and known symbols are resolved by the module.
    fn link_callees(&self, unit: &mut FunctionUnit) -> EmitResult<()> {
        let func = &mut unit.ctx.func;
        let func_refs: Vec<FuncRef> = func.dfg.ext_funcs.keys().collect();

        for func_ref in func_refs {
            let name = &func.dfg.ext_funcs[func_ref].name;
            let callee = match name {
                ExternalName::User(_) | ExternalName::TestCase(_) => {
                    normalize_symbol(&name.display(Some(&func.params)).to_string())
                }
                _ => continue,
            };
            let id = match self.ids.get(&callee) {
                Some(id) => *id,
                None => return Err(EmitError::unknown_callee(&unit.symbol, callee)),
            };

            let user_ref =
                func.declare_imported_user_function(UserExternalName::new(0, id.as_u32()));
            func.dfg.ext_funcs[func_ref].name = ExternalName::user(user_ref);
            trace!(function = %unit.symbol, %callee, ?id, "linked callee");
        }
        Ok(())
    }
}

impl FunctionPass for ObjectWriterPass {
    fn name(&self) -> &'static str {
        "object-writer"
    }

    fn do_initialization(&mut self, module: &IrModule, cx: &mut PassContext<'_>) -> EmitResult<()> {
        let builder = ObjectBuilder::new(cx.owned_isa(), module.name(), default_libcall_names())?;
        let mut object = ObjectModule::new(builder);

        for func in module.functions() {
            let symbol = symbol_name(func);
            let linkage = if has_body(func) {
                Linkage::Export
            } else {
                Linkage::Import
            };
            let entry = match self.ids.entry(symbol) {
                Entry::Vacant(entry) => entry,
                Entry::Occupied(entry) => {
                    return Err(EmitError::duplicate_symbol(entry.key().clone()));
                }
            };
            let id = object.declare_function(entry.key(), linkage, &func.signature)?;
            trace!(symbol = %entry.key(), ?linkage, "declared function");
            entry.insert(id);
        }

        self.object = Some(object);
        Ok(())
    }

    fn run_on_function(
        &mut self,
        unit: &mut FunctionUnit,
        _cx: &mut PassContext<'_>,
    ) -> EmitResult<()> {
        let id = *self
            .ids
            .get(&unit.symbol)
            .ok_or_else(|| EmitError::pass_protocol("object-writer", "function was not declared"))?;
        self.link_callees(unit)?;

        let object = self
            .object
            .as_mut()
            .ok_or_else(|| EmitError::pass_protocol("object-writer", "not initialized"))?;
        object.define_function(id, &mut unit.ctx)?;
        Ok(())
    }

    fn do_finalization(&mut self, _module: &IrModule, cx: &mut PassContext<'_>) -> EmitResult<()> {
        let object = self
            .object
            .take()
            .ok_or_else(|| EmitError::pass_protocol("object-writer", "not initialized"))?;

        let bytes = object.finish().emit()?;
        debug!(size = bytes.len(), "writing object file");
        cx.out().write_all(&bytes)?;
        Ok(())
    }
}
