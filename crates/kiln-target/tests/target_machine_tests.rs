//! Integration tests for target machine construction
//!
//! These tests go through the global registry the same way a front-end
//! would: backend name, triple, feature flags and relocation model in, an
//! owned target machine out.

use insta::assert_snapshot;
use kiln_target::{
    BackendRegistry, CodeModel, Endianness, TargetErrorKind, TargetMachine, TargetOptions,
    create_target_machine, dispose_target_machine,
};

/// (backend, triple, features, expected endianness)
const TARGETS: &[(&str, &str, &[&str], Endianness)] = &[
    ("x86-64", "x86_64-unknown-linux-gnu", &[], Endianness::Little),
    ("aarch64", "aarch64-unknown-linux-gnu", &[], Endianness::Little),
    (
        "riscv64",
        "riscv64gc-unknown-linux-gnu",
        &["+m", "+a", "+f", "+d", "+zicsr", "+zifencei"],
        Endianness::Little,
    ),
    ("s390x", "s390x-unknown-linux-gnu", &[], Endianness::Big),
];

#[test]
fn test_every_registered_backend_creates_a_machine() {
    for &(backend, triple, features, endianness) in TARGETS {
        let machine = create_target_machine(backend, triple, features, false)
            .unwrap_or_else(|e| panic!("{backend} / {triple}: {e}"));

        let layout = machine.data_layout();
        assert_eq!(layout.endianness(), endianness, "{backend}");
        assert_eq!(layout.pointer_size(), 8, "{backend}");
        assert_eq!(machine.code_model(), CodeModel::Default);
        dispose_target_machine(machine);
    }
}

#[test]
fn test_sse42_scenario() {
    let machine =
        create_target_machine("x86-64", "x86_64-unknown-linux", &["+sse4.2"], false).unwrap();

    let layout = machine.data_layout();
    assert!(layout.is_little_endian());
    assert_eq!(layout.pointer_size(), 8);
    assert_snapshot!(layout.to_string(), @"e-m:e-p:64:64-i64:64-n8:16:32:64-S128");
}

#[test]
fn test_unregistered_names_fail_without_panicking() {
    for name in ["", "x86", "X86-64", "arm", "wasm32"] {
        let err =
            create_target_machine(name, "x86_64-unknown-linux", &[] as &[&str], false).unwrap_err();
        assert!(
            matches!(err.kind(), TargetErrorKind::UnknownBackend { .. }),
            "{name}: {err}"
        );
    }
}

#[test]
fn test_feature_history_reaches_the_machine() {
    let options = TargetOptions::new("x86-64", "x86_64-unknown-linux")
        .features(["+sse4.1", "+sse4.2", "-avx"])
        .position_independent(true);
    let machine = TargetMachine::create(BackendRegistry::global(), &options).unwrap();

    assert_eq!(
        machine.feature_string(),
        "+sse4.1,+sse4.1,+sse4.2,+sse4.1,+sse4.2,-avx"
    );
    assert!(machine.reloc_model().is_pic());
}

#[test]
fn test_macho_triple_layout() {
    let machine =
        create_target_machine("aarch64", "aarch64-apple-darwin", &[] as &[&str], true).unwrap();
    assert_eq!(machine.data_layout().global_prefix(), "_");
}

#[test]
fn test_dispose_once() {
    let machine =
        create_target_machine("x86-64", "x86_64-unknown-linux", &[] as &[&str], false).unwrap();
    machine.dispose();
}
