//! Modules of Cranelift IR functions
//!
//! Cranelift compiles one function at a time and has no notion of a module, so
//! [`IrModule`] groups functions in declaration order. A function without any
//! block is a declaration: it has a signature but no body.

use std::collections::HashSet;

use cranelift_codegen::ir::{Function, Signature, UserFuncName};

#[derive(Debug, Clone)]
pub struct IrModule {
    name: String,
    functions: Vec<Function>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn with_functions(name: impl Into<String>, functions: Vec<Function>) -> Self {
        Self {
            name: name.into(),
            functions,
        }
    }

    /// Read a module from the text written by [`crate::write_ir_text`].
    pub fn parse(text: &str) -> crate::EmitResult<Self> {
        crate::text::parse_module(text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All functions, in declaration order.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Functions that have a body, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|func| has_body(func))
    }

    pub fn push(&mut self, function: Function) {
        self.functions.push(function);
    }

    /// Add a body-less function.
    pub fn declare(&mut self, name: &str, signature: Signature) {
        self.functions.push(Function::with_name_signature(
            UserFuncName::testcase(name),
            signature,
        ));
    }

    pub fn get(&self, symbol: &str) -> Option<&Function> {
        self.functions.iter().find(|func| symbol_name(func) == symbol)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

pub fn has_body(func: &Function) -> bool {
    func.layout.entry_block().is_some()
}

/// Symbol a function is emitted under: `%name` becomes `name`, `u0:7`
/// becomes `u0_7`.
pub fn symbol_name(func: &Function) -> String {
    normalize_symbol(&func.name.to_string())
}

/// Symbol for a CLIF name as printed (`%name`, `u0:7`).
pub fn normalize_symbol(name: &str) -> String {
    name.strip_prefix('%').unwrap_or(name).replace(':', "_")
}

/// First symbol shared by two functions of `module`, if any.
pub fn duplicate_symbol(module: &IrModule) -> Option<String> {
    let mut seen = HashSet::new();
    module
        .functions()
        .iter()
        .map(symbol_name)
        .find(|symbol| !seen.insert(symbol.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_codegen::ir::{AbiParam, UserExternalName, types};
    use cranelift_codegen::isa::CallConv;

    fn signature() -> Signature {
        let mut sig = Signature::new(CallConv::SystemV);
        sig.params.push(AbiParam::new(types::I64));
        sig.returns.push(AbiParam::new(types::I64));
        sig
    }

    #[test]
    fn test_declaration_has_no_body() {
        let mut module = IrModule::new("test");
        module.declare("puts", signature());

        assert_eq!(module.len(), 1);
        assert!(!has_body(&module.functions()[0]));
        assert_eq!(module.definitions().count(), 0);
        assert!(module.get("puts").is_some());
    }

    #[test]
    fn test_symbol_names() {
        let func = Function::with_name_signature(UserFuncName::testcase("main"), signature());
        assert_eq!(symbol_name(&func), "main");

        let func = Function::with_name_signature(
            UserFuncName::User(UserExternalName::new(0, 7)),
            signature(),
        );
        assert_eq!(symbol_name(&func), "u0_7");
    }

    #[test]
    fn test_clashing_symbols_are_detected() {
        let mut module = IrModule::new("clash");
        module.push(Function::with_name_signature(
            UserFuncName::User(UserExternalName::new(0, 7)),
            signature(),
        ));
        assert_eq!(duplicate_symbol(&module), None);

        module.declare("u0_7", signature());
        assert_eq!(duplicate_symbol(&module).as_deref(), Some("u0_7"));
    }
}
