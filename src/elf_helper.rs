//! Helper functions for parsing ELF files

use std::fs;
use std::path::Path;

use object::elf;
use object::read::elf::FileHeader;
use object::read::elf::ProgramHeader;
use object::Endianness;

use crate::error::ElfError;

pub type ELFReaderType = elf::FileHeader32<Endianness>;
pub type Segment = elf::ProgramHeader32<Endianness>;

/// Returns the pair (ELF reader, binary data)
pub fn parse_elf_file(file_path: &Path) -> Result<(ELFReaderType, Vec<u8>), ElfError> {
    let data = fs::read(file_path)
        .map_err(|e| ElfError::FileReadError(file_path.to_path_buf(), e))?;
    let elf = elf::FileHeader32::<Endianness>::parse(&*data)
        .map_err(|e| ElfError::ParseError(file_path.to_path_buf(), e.to_string()))?;
    Ok((*elf, data))
}

/// Returns the endianness
pub fn get_elf_endian(elf_reader: &ELFReaderType) -> Result<Endianness, ElfError> {
    elf_reader
        .endian()
        .map_err(|e| ElfError::InvalidFormat(e.to_string()))
}

/// Returns the program entry address
pub fn get_elf_entry(elf_reader: &ELFReaderType) -> Result<u32, ElfError> {
    Ok(elf_reader.e_entry(get_elf_endian(elf_reader)?))
}

/// Returns the machine type
pub fn get_elf_machine(elf_reader: &ELFReaderType) -> Result<u16, ElfError> {
    Ok(elf_reader.e_machine(get_elf_endian(elf_reader)?))
}

/// Rejects anything but a little-endian RISC-V executable
pub fn check_elf_target(elf_reader: &ELFReaderType) -> Result<(), ElfError> {
    if get_elf_endian(elf_reader)? != Endianness::Little {
        return Err(ElfError::InvalidFormat(
            "expected a little-endian image".to_string(),
        ));
    }
    let machine = get_elf_machine(elf_reader)?;
    if machine != elf::EM_RISCV {
        return Err(ElfError::InvalidMachine(machine));
    }
    Ok(())
}

/// Returns the PT_LOAD segments
pub fn get_elf_segments(
    elf_reader: &ELFReaderType,
    elf_data: &[u8],
) -> Result<Vec<Segment>, ElfError> {
    let endian = get_elf_endian(elf_reader)?;
    let headers = elf_reader
        .program_headers(endian, elf_data)
        .map_err(|e| ElfError::InvalidFormat(e.to_string()))?;
    Ok(headers
        .iter()
        .filter(|segment| segment.p_type(endian) == elf::PT_LOAD)
        .copied()
        .collect())
}
