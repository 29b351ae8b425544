//! Error types for emission and IR text I/O

use std::path::{Path, PathBuf};

use derive_more::Display;
use kiln_target::{FileType, TargetError};

pub type EmitResult<T> = Result<T, EmitError>;

#[derive(Display, Debug)]
#[display("{kind}")]
pub struct EmitError {
    kind: Box<EmitErrorKind>,
}

impl<E> From<E> for EmitError
where
    EmitErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        EmitError {
            kind: Box::new(EmitErrorKind::from(error)),
        }
    }
}

impl EmitError {
    pub fn kind(&self) -> &EmitErrorKind {
        &self.kind
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        EmitErrorKind::Io {
            path: path.to_path_buf(),
            source,
        }
        .into()
    }

    pub(crate) fn unsupported_file_type(backend: &'static str, file_type: FileType) -> Self {
        EmitErrorKind::UnsupportedFileType { backend, file_type }.into()
    }

    pub(crate) fn codegen(function: &str, message: impl std::fmt::Display) -> Self {
        EmitErrorKind::Codegen {
            function: function.to_owned(),
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn verifier(function: &str, message: String) -> Self {
        EmitErrorKind::Verifier {
            function: function.to_owned(),
            message,
        }
        .into()
    }

    pub(crate) fn duplicate_symbol(symbol: String) -> Self {
        EmitErrorKind::DuplicateSymbol { symbol }.into()
    }

    pub(crate) fn unknown_callee(function: &str, callee: String) -> Self {
        EmitErrorKind::UnknownCallee {
            function: function.to_owned(),
            callee,
        }
        .into()
    }

    pub(crate) fn pass_protocol(pass: &'static str, message: &'static str) -> Self {
        EmitErrorKind::PassProtocol { pass, message }.into()
    }
}

#[derive(Display, Debug)]
pub enum EmitErrorKind {
    #[display("cannot open `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("failed to write output: {_0}")]
    Write(std::io::Error),

    #[display("target `{backend}` does not support emission of {file_type} files")]
    UnsupportedFileType {
        backend: &'static str,
        file_type: FileType,
    },

    #[display("no data layout is available to the pass pipeline")]
    MissingDataLayout,

    #[display("symbol `{symbol}` is defined by more than one function")]
    DuplicateSymbol { symbol: String },

    #[display("`{function}` calls `{callee}`, which is not in the module")]
    UnknownCallee { function: String, callee: String },

    #[display("pass `{pass}`: {message}")]
    PassProtocol {
        pass: &'static str,
        message: &'static str,
    },

    #[display("Code generation error in `{function}`: {message}")]
    Codegen { function: String, message: String },

    #[display("Verifier errors in `{function}`:\n{message}")]
    Verifier { function: String, message: String },

    #[display("Module error: {_0}")]
    Module(cranelift_module::ModuleError),

    #[display("Object generation failed: {_0}")]
    Object(object::write::Error),

    #[display("Parse error: {_0}")]
    Parse(cranelift_reader::ParseError),

    #[display("{_0}")]
    Target(TargetError),
}

impl From<std::io::Error> for EmitErrorKind {
    fn from(error: std::io::Error) -> Self {
        EmitErrorKind::Write(error)
    }
}

impl From<cranelift_module::ModuleError> for EmitErrorKind {
    fn from(error: cranelift_module::ModuleError) -> Self {
        EmitErrorKind::Module(error)
    }
}

impl From<object::write::Error> for EmitErrorKind {
    fn from(error: object::write::Error) -> Self {
        EmitErrorKind::Object(error)
    }
}

impl From<cranelift_reader::ParseError> for EmitErrorKind {
    fn from(error: cranelift_reader::ParseError) -> Self {
        EmitErrorKind::Parse(error)
    }
}

impl From<TargetError> for EmitErrorKind {
    fn from(error: TargetError) -> Self {
        EmitErrorKind::Target(error)
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            EmitErrorKind::Io { source, .. } => Some(source),
            EmitErrorKind::Write(e) => Some(e),
            EmitErrorKind::Module(e) => Some(e),
            EmitErrorKind::Object(e) => Some(e),
            EmitErrorKind::Target(e) => Some(e),
            _ => None,
        }
    }
}
