//! Command implementations behind the `kiln` binary.

use std::error::Error;
use std::path::Path;

use kiln_emit::text::DEFAULT_MODULE_NAME;
use kiln_emit::{IrModule, emit_assembly, emit_object, write_ir_text};
use kiln_target::{BackendRegistry, TargetMachine, TargetOptions};
use target_lexicon::Triple;
use tracing::info;

use crate::cli::{Cli, Command, EmitKind, TargetArgs};

pub type CliResult<T> = Result<T, Box<dyn Error>>;

pub fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Targets => {
            print!("{}", list_targets(BackendRegistry::global()));
            Ok(())
        }
        Command::Layout { target } => {
            let machine = create_machine(&target)?;
            println!("{}", machine.data_layout());
            machine.dispose();
            Ok(())
        }
        Command::Emit {
            input,
            output,
            emit,
            optimize,
            target,
        } => emit_file(&input, &output, emit, optimize, &target),
    }
}

/// One line per registered backend: name, supported file types, description.
pub fn list_targets(registry: &BackendRegistry) -> String {
    let width = registry.names().iter().map(|name| name.len()).max().unwrap_or(0);
    let mut listing = String::new();
    for backend in registry {
        let file_types: Vec<String> = backend.file_types.iter().map(ToString::to_string).collect();
        listing.push_str(&format!(
            "{:width$}  [{}]  {}\n",
            backend.name,
            file_types.join(", "),
            backend.description,
        ));
    }
    listing
}

/// Build a machine from command-line target arguments. Without `--triple`
/// the host is targeted; without `--backend` the first backend generating
/// code for the triple's architecture is used.
pub fn create_machine(args: &TargetArgs) -> CliResult<TargetMachine> {
    let registry = BackendRegistry::global();
    let triple = match &args.triple {
        Some(triple) => triple.clone(),
        None => Triple::host().to_string(),
    };
    let backend = match &args.backend {
        Some(backend) => backend.clone(),
        None => {
            let parsed: Triple = triple.parse()?;
            registry
                .find_for_architecture(&parsed.architecture)
                .map(|backend| backend.name.to_owned())
                .ok_or_else(|| format!("no backend generates code for `{triple}`"))?
        }
    };

    let options = TargetOptions::new(backend, triple)
        .cpu(args.cpu.clone())
        .features(args.features.iter().cloned())
        .position_independent(args.pic);
    Ok(TargetMachine::create(registry, &options)?)
}

fn read_module(path: &Path) -> CliResult<IrModule> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read `{}`: {e}", path.display()))?;
    let module = IrModule::parse(&text)?;

    if module.name() != DEFAULT_MODULE_NAME {
        return Ok(module);
    }
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_MODULE_NAME.to_owned());
    Ok(IrModule::with_functions(name, module.functions().to_vec()))
}

fn emit_file(
    input: &Path,
    output: &Path,
    kind: EmitKind,
    optimize: bool,
    target: &TargetArgs,
) -> CliResult<()> {
    let module = read_module(input)?;
    info!(
        module = module.name(),
        functions = module.len(),
        "read CLIF module"
    );

    match kind {
        EmitKind::Clif => write_ir_text(&module, output)?,
        EmitKind::Asm | EmitKind::Obj => {
            let machine = create_machine(target)?;
            if kind == EmitKind::Asm {
                emit_assembly(&machine, &module, output, optimize)?;
            } else {
                emit_object(&machine, &module, output, optimize)?;
            }
            machine.dispose();
        }
    }
    Ok(())
}
