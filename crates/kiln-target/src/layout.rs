//! Data layout of a target machine
//!
//! The layout describes sizes, alignments and byte order that generated code
//! assumes for in-memory values. It is derived from the configured ISA and
//! renders in the familiar `e-m:e-p:64:64-...` form.

use std::fmt;

use cranelift_codegen::isa::TargetIsa;
use target_lexicon::{Architecture, BinaryFormat, Triple};

/// Byte order of the target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

/// Symbol mangling scheme of the target's object format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mangling {
    Elf,
    MachO,
    Coff,
    None,
}

impl Mangling {
    fn from_binary_format(format: BinaryFormat) -> Self {
        match format {
            BinaryFormat::Elf => Mangling::Elf,
            BinaryFormat::Macho => Mangling::MachO,
            BinaryFormat::Coff => Mangling::Coff,
            _ => Mangling::None,
        }
    }

    fn code(self) -> Option<char> {
        match self {
            Mangling::Elf => Some('e'),
            Mangling::MachO => Some('o'),
            Mangling::Coff => Some('w'),
            Mangling::None => None,
        }
    }

    /// Prefix prepended to global symbol names.
    pub fn global_prefix(self) -> &'static str {
        match self {
            Mangling::MachO => "_",
            _ => "",
        }
    }
}

/// Size, alignment and byte-order rules of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    endianness: Endianness,
    /// Pointer size in bytes
    pointer_size: u8,
    /// Pointer ABI alignment in bytes
    pointer_align: u8,
    /// Natural stack alignment in bytes
    stack_align: u8,
    mangling: Mangling,
    /// Integer widths (in bits) the target handles natively
    native_int_widths: &'static [u16],
}

impl DataLayout {
    /// Derive the layout from a triple alone.
    pub fn from_triple(triple: &Triple) -> Self {
        let pointer_size = match triple.pointer_width() {
            Ok(target_lexicon::PointerWidth::U16) => 2,
            Ok(target_lexicon::PointerWidth::U32) => 4,
            Ok(target_lexicon::PointerWidth::U64) => 8,
            _ => 8,
        };

        let endianness = match triple.endianness() {
            Ok(target_lexicon::Endianness::Big) => Endianness::Big,
            _ => Endianness::Little,
        };

        let (stack_align, native_int_widths): (u8, &'static [u16]) = match triple.architecture {
            Architecture::X86_64 | Architecture::X86_64h | Architecture::X86_32(_) => {
                (16, &[8, 16, 32, 64])
            }
            Architecture::S390x => (8, &[32, 64]),
            Architecture::Riscv64(_) => (16, &[64]),
            _ => (16, &[32, 64]),
        };

        Self {
            endianness,
            pointer_size,
            pointer_align: pointer_size,
            stack_align,
            mangling: Mangling::from_binary_format(triple.binary_format),
            native_int_widths,
        }
    }

    /// Derive the layout from a configured ISA. The ISA's own view of byte
    /// order and pointer size takes precedence over the triple.
    pub fn from_isa(isa: &dyn TargetIsa) -> Self {
        let mut layout = Self::from_triple(isa.triple());
        layout.endianness = match isa.endianness() {
            cranelift_codegen::ir::Endianness::Little => Endianness::Little,
            cranelift_codegen::ir::Endianness::Big => Endianness::Big,
        };
        layout.pointer_size = isa.pointer_bytes();
        layout.pointer_align = layout.pointer_size;
        layout
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn pointer_size(&self) -> u8 {
        self.pointer_size
    }

    pub fn pointer_align(&self) -> u8 {
        self.pointer_align
    }

    pub fn stack_align(&self) -> u8 {
        self.stack_align
    }

    pub fn mangling(&self) -> Mangling {
        self.mangling
    }

    pub fn native_int_widths(&self) -> &[u16] {
        self.native_int_widths
    }

    pub fn global_prefix(&self) -> &'static str {
        self.mangling.global_prefix()
    }

    pub fn is_little_endian(&self) -> bool {
        self.endianness == Endianness::Little
    }

    pub fn is_64bit(&self) -> bool {
        self.pointer_size == 8
    }

    pub fn is_legal_integer(&self, bits: u16) -> bool {
        self.native_int_widths.contains(&bits)
    }
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.endianness {
            Endianness::Little => "e",
            Endianness::Big => "E",
        })?;
        if let Some(code) = self.mangling.code() {
            write!(f, "-m:{code}")?;
        }
        let pointer_bits = u32::from(self.pointer_size) * 8;
        let pointer_align_bits = u32::from(self.pointer_align) * 8;
        write!(f, "-p:{pointer_bits}:{pointer_align_bits}-i64:64")?;
        let widths = self
            .native_int_widths
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(":");
        write!(f, "-n{widths}-S{}", u32::from(self.stack_align) * 8)
    }
}
