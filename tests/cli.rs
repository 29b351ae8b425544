use std::fs;
use std::process::Command;

use kiln::kiln_emit::{IrModule, module_to_string};

const MODULE: &str = "\
; module answer

function %answer() -> i64 system_v {
block0:
    v0 = iconst.i64 42
    return v0
}
";

fn kiln() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kiln"))
}

#[test]
fn test_targets_lists_every_backend() {
    let output = kiln().arg("targets").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for backend in ["x86-64", "aarch64", "riscv64", "s390x"] {
        assert!(stdout.contains(backend), "missing {backend} in:\n{stdout}");
    }
}

#[test]
fn test_layout_for_x86_64() {
    let output = kiln()
        .args(["layout", "--triple", "x86_64-unknown-linux", "-f", "+sse4.2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "e-m:e-p:64:64-i64:64-n8:16:32:64-S128\n"
    );
}

#[test]
fn test_unknown_backend_exits_with_error() {
    let output = kiln()
        .args(["layout", "--backend", "X86-64", "--triple", "x86_64-unknown-linux"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr).unwrap().contains("X86-64"));
}

#[test]
fn test_emit_assembly_object_and_clif() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("answer.clif");
    fs::write(&input, MODULE).unwrap();

    let asm = dir.path().join("answer.s");
    let status = kiln()
        .arg("emit")
        .arg(&input)
        .arg("-o")
        .arg(&asm)
        .args(["--triple", "x86_64-unknown-linux", "-O"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(fs::read_to_string(&asm).unwrap().contains("\nanswer:\n"));

    let obj = dir.path().join("answer.o");
    let status = kiln()
        .arg("emit")
        .arg(&input)
        .arg("-o")
        .arg(&obj)
        .args(["--emit", "obj", "--triple", "x86_64-unknown-linux", "--pic"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(fs::read(&obj).unwrap().starts_with(b"\x7fELF"));

    let clif = dir.path().join("copy.clif");
    let status = kiln()
        .arg("emit")
        .arg(&input)
        .arg("-o")
        .arg(&clif)
        .args(["--emit", "clif"])
        .status()
        .unwrap();
    assert!(status.success());

    let written = fs::read_to_string(&clif).unwrap();
    let expected = module_to_string(&IrModule::parse(MODULE).unwrap());
    assert_eq!(written, expected);
    assert_eq!(module_to_string(&IrModule::parse(&written).unwrap()), written);
}

#[test]
fn test_emit_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = kiln()
        .arg("emit")
        .arg(dir.path().join("missing.clif"))
        .arg("-o")
        .arg(dir.path().join("out.s"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("out.s").exists());
}
