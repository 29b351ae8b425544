//! Target machines
//!
//! A [`TargetMachine`] binds a registered backend to a triple, a CPU, a feature
//! string, a relocation model and a code model. It is owned by whoever created
//! it and released exactly once, either by [`TargetMachine::dispose`] or by
//! dropping it. The [`DataLayout`] it hands out borrows the machine, so it
//! cannot outlive it.

use std::fmt;
use std::str::FromStr;

use cranelift_codegen::isa::{self, OwnedTargetIsa};
use cranelift_codegen::settings::{self, Configurable};
use target_lexicon::Triple;
use tracing::{debug, trace, warn};

use crate::features::{FeatureSetBuilder, resolve_feature_string};
use crate::layout::DataLayout;
use crate::registry::{BackendDescriptor, BackendRegistry};
use crate::{TargetError, TargetResult};

/// CPU name meaning "no particular microarchitecture".
pub const GENERIC_CPU: &str = "generic";

/// Whether generated code may assume a fixed load address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelocModel {
    #[default]
    Default,
    Pic,
}

impl RelocModel {
    pub fn from_position_independent(pic: bool) -> Self {
        if pic { RelocModel::Pic } else { RelocModel::Default }
    }

    pub fn is_pic(self) -> bool {
        self == RelocModel::Pic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodeModel {
    #[default]
    Default,
    Small,
    Large,
}

/// Code generation optimization level. Only the two extremes are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptLevel {
    #[default]
    None,
    Aggressive,
}

impl OptLevel {
    pub fn from_aggressive(aggressive: bool) -> Self {
        if aggressive { OptLevel::Aggressive } else { OptLevel::None }
    }

    fn setting_value(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Aggressive => "speed_and_size",
        }
    }
}

/// Kind of file a target machine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Assembly,
    Object,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileType::Assembly => "assembly",
            FileType::Object => "object",
        })
    }
}

/// What the caller asks for when creating a target machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOptions {
    /// Registered backend name, e.g. `x86-64`
    pub backend: String,
    pub triple: String,
    /// CPU microarchitecture, e.g. `haswell`
    pub cpu: String,
    pub features: Vec<String>,
    pub reloc: RelocModel,
}

impl TargetOptions {
    pub fn new(backend: impl Into<String>, triple: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            triple: triple.into(),
            cpu: GENERIC_CPU.to_owned(),
            features: Vec::new(),
            reloc: RelocModel::Default,
        }
    }

    pub fn cpu(mut self, cpu: impl Into<String>) -> Self {
        self.cpu = cpu.into();
        self
    }

    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    pub fn position_independent(mut self, pic: bool) -> Self {
        self.reloc = RelocModel::from_position_independent(pic);
        self
    }
}

/// Resolved configuration handed to a backend factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub triple: Triple,
    pub cpu: String,
    /// Composed feature string
    pub features: String,
    pub reloc: RelocModel,
    pub code_model: CodeModel,
}

/// A backend configured for one target
pub struct TargetMachine {
    backend: BackendDescriptor,
    config: MachineConfig,
    isa_builder: isa::Builder,
    layout: DataLayout,
}

impl TargetMachine {
    /// Resolve the backend, compose the feature string and ask the backend's
    /// factory for a machine.
    pub fn create(registry: &BackendRegistry, options: &TargetOptions) -> TargetResult<Self> {
        let backend = registry.resolve(&options.backend)?;

        let mut features = FeatureSetBuilder::new();
        features.extend(&options.features);

        let triple = Triple::from_str(&options.triple)
            .map_err(|e| TargetError::invalid_triple(&options.triple, e))?;

        let config = MachineConfig {
            triple,
            cpu: options.cpu.clone(),
            features: features.finish(),
            reloc: options.reloc,
            code_model: CodeModel::Default,
        };
        debug!(
            backend = backend.name,
            triple = %config.triple,
            cpu = %config.cpu,
            features = %config.features,
            reloc = ?config.reloc,
            "creating target machine"
        );

        backend
            .create_machine(&config)
            .ok_or_else(|| TargetError::machine_creation(backend.name, &config.triple))
    }

    /// Build a machine from an already configured ISA builder. Fails when the
    /// ISA cannot be finished with default shared flags.
    pub fn new(
        backend: &BackendDescriptor,
        config: MachineConfig,
        isa_builder: isa::Builder,
    ) -> TargetResult<Self> {
        let isa = isa_builder.finish(shared_flags(config.reloc, OptLevel::None)?)?;
        let layout = DataLayout::from_isa(&*isa);

        Ok(TargetMachine {
            backend: *backend,
            config,
            isa_builder,
            layout,
        })
    }

    pub fn backend(&self) -> &BackendDescriptor {
        &self.backend
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn triple(&self) -> &Triple {
        &self.config.triple
    }

    pub fn cpu(&self) -> &str {
        &self.config.cpu
    }

    pub fn feature_string(&self) -> &str {
        &self.config.features
    }

    pub fn reloc_model(&self) -> RelocModel {
        self.config.reloc
    }

    pub fn code_model(&self) -> CodeModel {
        self.config.code_model
    }

    pub fn data_layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Finish the configured ISA for an optimization level.
    pub fn isa(&self, opt_level: OptLevel) -> TargetResult<OwnedTargetIsa> {
        let flags = shared_flags(self.config.reloc, opt_level)?;
        Ok(self.isa_builder.finish(flags)?)
    }

    /// Release the machine. Consuming `self` makes a second release or any
    /// later use a compile error.
    pub fn dispose(self) {
        debug!(
            backend = self.backend.name,
            triple = %self.config.triple,
            "disposing target machine"
        );
    }
}

impl Drop for TargetMachine {
    fn drop(&mut self) {
        trace!(backend = self.backend.name, "released target machine");
    }
}

impl fmt::Debug for TargetMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetMachine")
            .field("backend", &self.backend.name)
            .field("config", &self.config)
            .field("layout", &self.layout)
            .finish()
    }
}

/// Create a machine through the global registry with the generic CPU.
pub fn create_target_machine<S: AsRef<str>>(
    backend: &str,
    triple: &str,
    features: &[S],
    position_independent: bool,
) -> TargetResult<TargetMachine> {
    let options = TargetOptions::new(backend, triple)
        .features(features.iter().map(|f| f.as_ref().to_owned()))
        .position_independent(position_independent);
    TargetMachine::create(BackendRegistry::global(), &options)
}

pub fn dispose_target_machine(machine: TargetMachine) {
    machine.dispose();
}

/// Shared (ISA independent) Cranelift flags for a relocation model and
/// optimization level.
pub fn shared_flags(reloc: RelocModel, opt_level: OptLevel) -> TargetResult<settings::Flags> {
    let mut flag_builder = settings::builder();
    flag_builder.set("opt_level", opt_level.setting_value())?;
    flag_builder.set("is_pic", if reloc.is_pic() { "true" } else { "false" })?;
    flag_builder.set("use_colocated_libcalls", "false")?;
    Ok(settings::Flags::new(flag_builder))
}

/// Factory shared by the Cranelift backends.
///
/// Declines when the triple belongs to another architecture, the code model
/// is not supported, the CPU is not a known preset or the ISA cannot be built.
/// Unknown features are reported and ignored.
pub fn cranelift_factory(
    backend: &BackendDescriptor,
    config: &MachineConfig,
) -> Option<TargetMachine> {
    if !backend.matches(&config.triple.architecture) {
        warn!(
            backend = backend.name,
            triple = %config.triple,
            "triple architecture does not belong to this backend"
        );
        return None;
    }

    if config.code_model == CodeModel::Large {
        warn!(backend = backend.name, "large code model is not supported");
        return None;
    }

    let mut isa_builder = match isa::lookup(config.triple.clone()) {
        Ok(builder) => builder,
        Err(err) => {
            warn!(backend = backend.name, %err, "no Cranelift ISA for triple");
            return None;
        }
    };

    if !config.cpu.is_empty() && config.cpu != GENERIC_CPU {
        if let Err(err) = isa_builder.enable(&config.cpu) {
            warn!(backend = backend.name, cpu = %config.cpu, %err, "unknown CPU");
            return None;
        }
    }

    for feature in resolve_feature_string(&config.features) {
        let setting = feature.setting_name();
        let result = if feature.enabled {
            isa_builder.enable(&setting)
        } else {
            isa_builder.set(&setting, "false")
        };
        if let Err(err) = result {
            warn!(
                backend = backend.name,
                %err,
                "'{feature}' is not a recognized feature for this target (ignoring feature)"
            );
        }
    }

    match TargetMachine::new(backend, config.clone(), isa_builder) {
        Ok(machine) => Some(machine),
        Err(err) => {
            warn!(backend = backend.name, %err, "failed to finish ISA");
            None
        }
    }
}
