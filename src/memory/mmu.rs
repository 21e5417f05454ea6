//! Paged byte storage behind both memory ports,
//! implemented with a two-level page table

const WORD_WIDTH: usize = 32;
const FIRST_LEVEL_WIDTH: usize = 10;
const SECOND_LEVEL_WIDTH: usize = 10;
const PAGE_WIDTH: usize = 12;

const FIRST_LEVEL_SIZE: usize = 1 << FIRST_LEVEL_WIDTH;
const SECOND_LEVEL_SIZE: usize = 1 << SECOND_LEVEL_WIDTH;
pub const PAGE_SIZE: usize = 1 << PAGE_WIDTH;

// Defines page type
type PageType = Box<[u8; PAGE_SIZE]>;

/// Memory management unit
#[derive(Clone)]
pub struct MMU {
    // data[x][y][z] stores the byte at (x << 22) | (y << 12) | z
    // Pages are allocated lazily on first write
    data: Vec<Option<Vec<Option<PageType>>>>,
}

impl Default for MMU {
    fn default() -> Self {
        Self::make()
    }
}

impl MMU {
    /// Make a new MMU
    pub fn make() -> Self {
        Self { data: vec![None; FIRST_LEVEL_SIZE] }
    }

    /// The first-level index of the address
    fn get_first_level_index(address: u32) -> usize {
        (address >> (WORD_WIDTH - FIRST_LEVEL_WIDTH)) as usize
    }
    /// The second-level index of the address
    fn get_second_level_index(address: u32) -> usize {
        ((address >> (WORD_WIDTH - FIRST_LEVEL_WIDTH - SECOND_LEVEL_WIDTH))
            & ((SECOND_LEVEL_SIZE - 1) as u32)) as usize
    }
    /// The page offset
    fn get_page_offset(address: u32) -> usize {
        (address & ((PAGE_SIZE - 1) as u32)) as usize
    }

    /// Check if a page is allocated at the given address
    pub fn page_exists(&self, address: u32) -> bool {
        let (i, j) = (
            Self::get_first_level_index(address),
            Self::get_second_level_index(address),
        );

        self.data[i].as_ref().is_some_and(|second_level| second_level[j].is_some())
    }

    /// Returns the page holding the address, allocating it if needed
    fn page_mut(&mut self, address: u32) -> &mut PageType {
        let (i, j) = (
            Self::get_first_level_index(address),
            Self::get_second_level_index(address),
        );

        let second_level =
            self.data[i].get_or_insert_with(|| vec![None; SECOND_LEVEL_SIZE]);
        second_level[j].get_or_insert_with(|| Box::new([0; PAGE_SIZE]))
    }

    /// Set the byte at the given address
    pub fn set8(&mut self, address: u32, byte: u8) {
        let k = Self::get_page_offset(address);
        self.page_mut(address)[k] = byte;
    }

    /// Get the byte at the given address.
    /// Unallocated memory reads as zero.
    pub fn get8(&self, address: u32) -> u8 {
        let (i, j, k) = (
            Self::get_first_level_index(address),
            Self::get_second_level_index(address),
            Self::get_page_offset(address),
        );

        self.data[i]
            .as_ref()
            .and_then(|second_level| second_level[j].as_ref())
            .map_or(0, |page| page[k])
    }

    /// Little-endian read of `size` bytes (1, 2 or 4)
    pub fn get(&self, address: u32, size: u32) -> u32 {
        (0..size).fold(0, |value, i| {
            value | (self.get8(address.wrapping_add(i)) as u32) << (8 * i)
        })
    }

    /// Little-endian write of the low `size` bytes of `value`
    pub fn set(&mut self, address: u32, size: u32, value: u32) {
        for i in 0..size {
            self.set8(address.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    pub fn get32(&self, address: u32) -> u32 {
        self.get(address, 4)
    }

    pub fn set32(&mut self, address: u32, value: u32) {
        self.set(address, 4, value)
    }

    /// Copies a byte slice starting at `base`
    pub fn load_bytes(&mut self, base: u32, bytes: &[u8]) {
        for (offset, byte) in bytes.iter().enumerate() {
            self.set8(base.wrapping_add(offset as u32), *byte);
        }
    }
}
