//! The flat `4096` byte ram of the chip.
//!
//! - `0x000-0x04F` - Built in `4x5` pixel font set (`0-F`)
//! - `0x050-0x1FF` - Unused (reserved for the interpreter)
//! - `0x200-0xE9F` - Program ROM and work RAM
//! - `0xEA0-0xFFF` - Work RAM
use std::ops::Range;

use crate::{
    definitions::{cpu, display::fontset, memory},
    opcode::{build_opcode, Opcode},
    MemoryError,
};

/// Represents the whole addressable memory, every access is
/// checked against the memory size.
#[derive(Clone, PartialEq)]
pub struct Memory {
    data: Box<[u8; memory::SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Will create a new zeroed memory with the font preloaded.
    pub fn new() -> Self {
        let mut mem = Self {
            data: Box::new([0; memory::SIZE]),
        };
        mem.load_font();
        mem
    }

    /// Zeroes the whole memory and restores the font set.
    pub fn reset(&mut self) {
        self.data.fill(0);
        self.load_font();
    }

    fn load_font(&mut self) {
        let range = fontset::LOCATION..(fontset::LOCATION + fontset::FONTSET.len());
        self.data[range].copy_from_slice(&fontset::FONTSET);
    }

    /// Copies the rom into the program region starting at `0x200`.
    /// Everything past the program capacity is silently dropped.
    ///
    /// Returns the amount of bytes actually copied.
    pub fn load(&mut self, rom: &[u8]) -> usize {
        let len = rom.len().min(cpu::PROGRAM_SIZE);
        if len < rom.len() {
            log::info!(
                "Rom is {} bytes long, truncating the last {} bytes.",
                rom.len(),
                rom.len() - len
            );
        }
        let start = cpu::PROGRAM_COUNTER;
        self.data[start..(start + len)].copy_from_slice(&rom[..len]);
        len
    }

    /// Verifies that `len` bytes starting at `address` lie inside of the memory.
    fn range(address: usize, len: usize) -> Result<Range<usize>, MemoryError> {
        match address.checked_add(len) {
            Some(end) if end <= memory::SIZE => Ok(address..end),
            _ => Err(MemoryError::OutOfBounds { address, len }),
        }
    }

    pub fn read_byte(&self, address: usize) -> Result<u8, MemoryError> {
        let range = Self::range(address, 1)?;
        Ok(self.data[range.start])
    }

    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<(), MemoryError> {
        let range = Self::range(address, 1)?;
        self.data[range.start] = value;
        Ok(())
    }

    /// Returns `len` bytes starting at `address`.
    pub fn read_slice(&self, address: usize, len: usize) -> Result<&[u8], MemoryError> {
        let range = Self::range(address, len)?;
        Ok(&self.data[range])
    }

    /// Writes all of `data` starting at `address`, nothing is written if the
    /// data would not fit.
    pub fn write_slice(&mut self, address: usize, data: &[u8]) -> Result<(), MemoryError> {
        let range = Self::range(address, data.len())?;
        self.data[range].copy_from_slice(data);
        Ok(())
    }

    /// Reads the big endian opcode at the given address.
    pub fn read_opcode(&self, address: usize) -> Result<Opcode, MemoryError> {
        build_opcode(&self.data[..], address)
    }

    /// The whole memory as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("size", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_is_loaded() {
        let mem = Memory::new();
        let font = mem
            .read_slice(fontset::LOCATION, fontset::FONTSET.len())
            .unwrap();
        assert_eq!(&fontset::FONTSET[..], font);
    }

    #[test]
    fn test_load_rom() {
        let mut mem = Memory::new();
        let rom = [0x00, 0xE0, 0x12, 0x00];
        assert_eq!(mem.load(&rom), rom.len());
        assert_eq!(
            mem.read_slice(cpu::PROGRAM_COUNTER, rom.len()).unwrap(),
            &rom[..]
        );
        assert_eq!(mem.read_opcode(cpu::PROGRAM_COUNTER), Ok(0x00E0));
    }

    #[test]
    fn test_load_truncates_oversized_rom() {
        let mut mem = Memory::new();
        let rom: Vec<u8> = (0..(cpu::PROGRAM_SIZE + 100))
            .map(|i| (i % 251) as u8 + 1)
            .collect();

        assert_eq!(mem.load(&rom), cpu::PROGRAM_SIZE);

        let end = cpu::PROGRAM_COUNTER + cpu::PROGRAM_SIZE;
        assert_eq!(
            &mem.as_slice()[cpu::PROGRAM_COUNTER..end],
            &rom[..cpu::PROGRAM_SIZE]
        );
        // nothing past the program capacity was touched
        assert!(mem.as_slice()[end..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bounds() {
        let mut mem = Memory::new();
        let last = memory::SIZE - 1;

        assert!(mem.write_byte(last, 0x42).is_ok());
        assert_eq!(mem.read_byte(last), Ok(0x42));

        let err = MemoryError::OutOfBounds {
            address: memory::SIZE,
            len: 1,
        };
        assert_eq!(mem.read_byte(memory::SIZE), Err(err));
        assert_eq!(mem.write_byte(memory::SIZE, 1), Err(err));

        // slices that only partially fit are rejected as a whole
        assert_eq!(
            mem.write_slice(last, &[1, 2]),
            Err(MemoryError::OutOfBounds {
                address: last,
                len: 2
            })
        );
        assert_eq!(mem.read_byte(last), Ok(0x42));
        assert!(mem.read_slice(usize::MAX, 2).is_err());
        assert!(mem.read_opcode(last).is_err());
    }

    #[test]
    fn test_reset() {
        let mut mem = Memory::new();
        mem.write_byte(0, 0xFF).unwrap();
        mem.write_byte(0x300, 0xAA).unwrap();

        mem.reset();

        assert_eq!(mem, Memory::new());
        assert_eq!(mem.read_byte(0), Ok(fontset::FONTSET[0]));
        assert_eq!(mem.read_byte(0x300), Ok(0));
    }
}
