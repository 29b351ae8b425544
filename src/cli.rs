//! Command-line interface for kiln.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(about = "Drive Cranelift backends over CLIF modules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the registered backends
    Targets,

    /// Print the data layout of a configured target machine
    Layout {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Compile a CLIF module to assembly or an object file
    Emit {
        /// Input CLIF file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Kind of output to write
        #[arg(long, value_enum, default_value_t = EmitKind::Asm)]
        emit: EmitKind,

        /// Enable the aggressive optimization pipeline
        #[arg(short = 'O', long = "optimize")]
        optimize: bool,

        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Backend name; defaults to the first backend for the triple's architecture
    #[arg(long)]
    pub backend: Option<String>,

    /// Target triple; defaults to the host
    #[arg(long)]
    pub triple: Option<String>,

    /// CPU preset
    #[arg(long, default_value = kiln_target::GENERIC_CPU)]
    pub cpu: String,

    /// Feature flag such as `+sse4.2` or `-avx`; may be repeated
    #[arg(short = 'f', long = "feature", allow_hyphen_values = true)]
    pub features: Vec<String>,

    /// Generate position independent code
    #[arg(long)]
    pub pic: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitKind {
    /// Textual assembly
    Asm,
    /// Relocatable object file
    Obj,
    /// Canonical CLIF text of the parsed module
    Clif,
}
