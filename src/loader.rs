//! Utility functions for preparing the registers and memory for execution

use object::read::elf::ProgramHeader;
use tracing::debug;

use crate::elf_helper::*;
use crate::error::ElfError;
use crate::error::SimulatorResult;
use crate::instruction::RegIndex;
use crate::memory::mmu::MMU;
use crate::register_file::RegisterFile;

/// Stack pointer
const SP: u32 = 2;

/// Initializes the stack pointer.
/// Stack pages are allocated on first touch.
pub fn set_stack(regfile: &mut RegisterFile, stack_base: u32) {
    regfile.preload(RegIndex::new(SP), stack_base);
}

/// Loads an ELF file into memory and returns its entry point
pub fn load_elf(
    mem: &mut MMU,
    elf_reader: &ELFReaderType,
    elf_data: &[u8],
) -> SimulatorResult<u32> {
    check_elf_target(elf_reader)?;
    let endian = get_elf_endian(elf_reader)?;
    let entry = get_elf_entry(elf_reader)?;
    debug!("initial pc: {:#010x}", entry);

    for segment in get_elf_segments(elf_reader, elf_data)? {
        let memory_size = segment.p_memsz(endian);
        let virtual_address = segment.p_vaddr(endian);
        let file_size = segment.p_filesz(endian);
        let offset = segment.p_offset(endian) as usize;

        // Can't handle with 32b memory
        if virtual_address.checked_add(memory_size).is_none() {
            return Err(ElfError::AddressOutOfBounds(virtual_address).into());
        }
        if file_size > memory_size {
            return Err(ElfError::InvalidFormat(format!(
                "segment at {:#010x} is larger in the file than in memory",
                virtual_address
            ))
            .into());
        }

        debug!(
            "loading segment: vaddr = {:#010x}, memsz = {:#x}, filesz = {:#x}",
            virtual_address, memory_size, file_size
        );

        let bytes = elf_data
            .get(offset..offset + file_size as usize)
            .ok_or_else(|| {
                ElfError::InvalidFormat(format!(
                    "segment at {:#010x} extends past the end of the file",
                    virtual_address
                ))
            })?;
        mem.load_bytes(virtual_address, bytes);
        // The rest of the segment is zero-filled
        for address in virtual_address + file_size..virtual_address + memory_size {
            mem.set8(address, 0);
        }
    }

    Ok(entry)
}

/// Copies a flat binary image to `base`
pub fn load_raw(mem: &mut MMU, base: u32, image: &[u8]) -> SimulatorResult<()> {
    if base.checked_add(image.len() as u32).is_none() {
        return Err(ElfError::AddressOutOfBounds(base).into());
    }
    debug!("loading {} raw bytes at {:#010x}", image.len(), base);
    mem.load_bytes(base, image);
    Ok(())
}
