//! Target selection for Cranelift code generation
//!
//! This crate resolves a backend by name from a process-wide registry, composes
//! the requested feature flags into a feature string, and configures an owned
//! [`TargetMachine`] whose [`DataLayout`] downstream passes rely on.

pub mod errors;
pub mod features;
pub mod layout;
pub mod machine;
pub mod registry;

pub use errors::{TargetError, TargetErrorKind, TargetResult};
pub use features::{Feature, FeatureSetBuilder, compose_feature_string, parse_feature_string};
pub use layout::{DataLayout, Endianness, Mangling};
pub use machine::{
    CodeModel, FileType, GENERIC_CPU, MachineConfig, OptLevel, RelocModel, TargetMachine,
    TargetOptions, create_target_machine, dispose_target_machine,
};
pub use registry::{BackendDescriptor, BackendRegistry, MachineFactory};
