use std::fs;

use kiln_emit::{EmitErrorKind, IrModule, module_to_string, parse_module, write_ir_text};

const MODULE_TEXT: &str = "\
; module roundtrip

function %add(i64, i64) -> i64 system_v {
block0(v0: i64, v1: i64):
    v2 = iadd v0, v1
    return v2
}

function %puts(i64) system_v {
}

function %pick(i8, i64, i64) -> i64 fast {
block0(v0: i8, v1: i64, v2: i64):
    brif v0, block1, block2(v2)

block1:
    jump block2(v1)

block2(v3: i64):
    return v3
}

function %scaled(i64) -> i64 system_v {
block0(v0: i64):
    v1 = iconst.i64 3
    v2 = imul v0, v1
    v3 = iadd_imm v2, 7
    return v3
}
";

#[test]
fn test_text_round_trip_is_stable() {
    let module = parse_module(MODULE_TEXT).unwrap();
    assert_eq!(module.name(), "roundtrip");
    assert_eq!(module.len(), 4);
    assert_eq!(module.definitions().count(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.clif");
    write_ir_text(&module, &path).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, module_to_string(&module));
    assert!(written.starts_with("; module roundtrip\n"));
    assert!(written.contains("iconst.i64 3"));
    assert!(written.contains("iadd_imm v2, 7"));

    // Cranelift annotates constant operands when printing, so only the
    // printed form is a fixed point.
    let reparsed = IrModule::parse(&written).unwrap();
    assert_eq!(reparsed.len(), module.len());
    assert_eq!(module_to_string(&reparsed), written);
}

#[test]
fn test_write_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.clif");
    fs::write(&path, "stale contents that are longer than the module header\n").unwrap();

    write_ir_text(&IrModule::new("fresh"), &path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "; module fresh\n");
}

#[test]
fn test_write_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope").join("out.clif");

    let err = write_ir_text(&IrModule::new("m"), &path).unwrap_err();

    match err.kind() {
        EmitErrorKind::Io { path: reported, source } => {
            assert_eq!(reported, &path);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}
