//! Registry of code-generation backends
//!
//! The registry is built once and never changes afterwards. Lookups are exact,
//! case-sensitive matches on the backend name; when two descriptors share a
//! name the one registered first wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use target_lexicon::Architecture;
use tracing::debug;

use crate::machine::{FileType, MachineConfig, TargetMachine, cranelift_factory};
use crate::{TargetError, TargetResult};

/// Produces a target machine for a configuration, or `None` when the backend
/// declines it.
pub type MachineFactory = fn(&BackendDescriptor, &MachineConfig) -> Option<TargetMachine>;

/// A registered code-generation backend
#[derive(Clone, Copy)]
pub struct BackendDescriptor {
    /// Lookup key, e.g. `x86-64`
    pub name: &'static str,
    pub description: &'static str,
    /// Architectures this backend generates code for
    pub architecture: fn(&Architecture) -> bool,
    /// Output kinds this backend can emit
    pub file_types: &'static [FileType],
    pub factory: MachineFactory,
}

impl BackendDescriptor {
    pub fn matches(&self, architecture: &Architecture) -> bool {
        (self.architecture)(architecture)
    }

    pub fn supports(&self, file_type: FileType) -> bool {
        self.file_types.contains(&file_type)
    }

    pub fn create_machine(&self, config: &MachineConfig) -> Option<TargetMachine> {
        (self.factory)(self, config)
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("file_types", &self.file_types)
            .finish_non_exhaustive()
    }
}

const ALL_FILE_TYPES: &[FileType] = &[FileType::Assembly, FileType::Object];

fn is_x86_64(arch: &Architecture) -> bool {
    matches!(arch, Architecture::X86_64 | Architecture::X86_64h)
}

fn is_aarch64(arch: &Architecture) -> bool {
    matches!(arch, Architecture::Aarch64(_))
}

fn is_riscv64(arch: &Architecture) -> bool {
    matches!(arch, Architecture::Riscv64(_))
}

fn is_s390x(arch: &Architecture) -> bool {
    matches!(arch, Architecture::S390x)
}

pub const X86_64: BackendDescriptor = BackendDescriptor {
    name: "x86-64",
    description: "64-bit X86: EM64T and AMD64",
    architecture: is_x86_64,
    file_types: ALL_FILE_TYPES,
    factory: cranelift_factory,
};

pub const AARCH64: BackendDescriptor = BackendDescriptor {
    name: "aarch64",
    description: "AArch64 (little endian)",
    architecture: is_aarch64,
    file_types: ALL_FILE_TYPES,
    factory: cranelift_factory,
};

pub const RISCV64: BackendDescriptor = BackendDescriptor {
    name: "riscv64",
    description: "64-bit RISC-V",
    architecture: is_riscv64,
    file_types: ALL_FILE_TYPES,
    factory: cranelift_factory,
};

pub const S390X: BackendDescriptor = BackendDescriptor {
    name: "s390x",
    description: "SystemZ",
    architecture: is_s390x,
    file_types: ALL_FILE_TYPES,
    factory: cranelift_factory,
};

/// Read-only name → backend map
pub struct BackendRegistry {
    /// Registration order
    backends: Vec<BackendDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl BackendRegistry {
    pub fn new(backends: impl IntoIterator<Item = BackendDescriptor>) -> Self {
        let backends: Vec<_> = backends.into_iter().collect();
        let mut index = HashMap::with_capacity(backends.len());
        for (position, backend) in backends.iter().enumerate() {
            index.entry(backend.name).or_insert(position);
        }
        Self { backends, index }
    }

    /// The process-wide registry of the Cranelift backends compiled into this
    /// build. Initialized on first use.
    pub fn global() -> &'static BackendRegistry {
        static REGISTRY: OnceLock<BackendRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let registry = BackendRegistry::new([X86_64, AARCH64, RISCV64, S390X]);
            debug!(backends = ?registry.names(), "initialized backend registry");
            registry
        })
    }

    pub fn get(&self, name: &str) -> Option<&BackendDescriptor> {
        self.index.get(name).map(|&position| &self.backends[position])
    }

    pub fn resolve(&self, name: &str) -> TargetResult<&BackendDescriptor> {
        self.get(name)
            .ok_or_else(|| TargetError::unknown_backend(name, self.names()))
    }

    /// First registered backend that generates code for `architecture`.
    pub fn find_for_architecture(&self, architecture: &Architecture) -> Option<&BackendDescriptor> {
        self.backends.iter().find(|backend| backend.matches(architecture))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|backend| backend.name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BackendDescriptor> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl<'a> IntoIterator for &'a BackendRegistry {
    type Item = &'a BackendDescriptor;
    type IntoIter = std::slice::Iter<'a, BackendDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.backends.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetErrorKind;

    #[test]
    fn test_global_registry_order() {
        let registry = BackendRegistry::global();
        assert_eq!(registry.names(), vec!["x86-64", "aarch64", "riscv64", "s390x"]);
    }

    #[test]
    fn test_resolve_exact_match() {
        let registry = BackendRegistry::global();
        assert_eq!(registry.resolve("aarch64").unwrap().name, "aarch64");
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let registry = BackendRegistry::global();
        let err = registry.resolve("X86-64").unwrap_err();
        assert!(matches!(err.kind(), TargetErrorKind::UnknownBackend { .. }));
        assert!(err.to_string().contains("x86-64"));
    }

    #[test]
    fn test_first_registration_wins() {
        const SHADOW: BackendDescriptor = BackendDescriptor {
            description: "shadowed duplicate",
            ..X86_64
        };
        let registry = BackendRegistry::new([X86_64, SHADOW]);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.resolve("x86-64").unwrap().description,
            X86_64.description
        );
    }

    #[test]
    fn test_find_for_architecture() {
        let registry = BackendRegistry::global();
        let backend = registry
            .find_for_architecture(&Architecture::S390x)
            .unwrap();
        assert_eq!(backend.name, "s390x");
        assert!(registry.find_for_architecture(&Architecture::Wasm32).is_none());
    }
}
