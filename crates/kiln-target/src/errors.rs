//! Error types for target resolution and machine construction

use derive_more::Display;

pub type TargetResult<T> = Result<T, TargetError>;

#[derive(Display, Debug)]
#[display("{kind}")]
pub struct TargetError {
    kind: Box<TargetErrorKind>,
}

impl<E> From<E> for TargetError
where
    TargetErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        TargetError {
            kind: Box::new(TargetErrorKind::from(error)),
        }
    }
}

impl TargetError {
    pub fn kind(&self) -> &TargetErrorKind {
        &self.kind
    }

    pub(crate) fn unknown_backend(name: &str, available: Vec<&'static str>) -> Self {
        TargetErrorKind::UnknownBackend {
            name: name.to_owned(),
            available,
        }
        .into()
    }

    pub(crate) fn invalid_triple(triple: &str, message: impl std::fmt::Display) -> Self {
        TargetErrorKind::InvalidTriple {
            triple: triple.to_owned(),
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn machine_creation(backend: &'static str, triple: impl std::fmt::Display) -> Self {
        TargetErrorKind::MachineCreation {
            backend,
            triple: triple.to_string(),
        }
        .into()
    }
}

#[derive(Display, Debug)]
pub enum TargetErrorKind {
    #[display("no backend named `{name}` is registered (available: {})", available.join(", "))]
    UnknownBackend {
        name: String,
        available: Vec<&'static str>,
    },

    #[display("invalid target triple `{triple}`: {message}")]
    InvalidTriple { triple: String, message: String },

    #[display("backend `{backend}` could not create a target machine for `{triple}`")]
    MachineCreation {
        backend: &'static str,
        triple: String,
    },

    #[display("Invalid codegen setting: {_0}")]
    Settings(cranelift_codegen::settings::SetError),

    #[display("Invalid target: {_0}")]
    Lookup(cranelift_codegen::isa::LookupError),

    #[display("Code generation error: {_0}")]
    Codegen(cranelift_codegen::CodegenError),
}

impl From<cranelift_codegen::settings::SetError> for TargetErrorKind {
    fn from(error: cranelift_codegen::settings::SetError) -> Self {
        TargetErrorKind::Settings(error)
    }
}

impl From<cranelift_codegen::isa::LookupError> for TargetErrorKind {
    fn from(error: cranelift_codegen::isa::LookupError) -> Self {
        TargetErrorKind::Lookup(error)
    }
}

impl From<cranelift_codegen::CodegenError> for TargetErrorKind {
    fn from(error: cranelift_codegen::CodegenError) -> Self {
        TargetErrorKind::Codegen(error)
    }
}

impl std::error::Error for TargetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            TargetErrorKind::Settings(e) => Some(e),
            TargetErrorKind::Lookup(e) => Some(e),
            TargetErrorKind::Codegen(e) => Some(e),
            _ => None,
        }
    }
}
