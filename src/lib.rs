//! kiln: target machines and file emission for Cranelift IR modules.
//!
//! The heavy lifting lives in [`kiln_target`] and [`kiln_emit`]; this crate
//! adds the `kiln` command-line driver on top of them.

pub mod cli;
pub mod commands;

pub use kiln_emit;
pub use kiln_target;
