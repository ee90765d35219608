// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! The Chip-8's memory.
//!
//! Memory is a flat array of `MEM_SIZE` bytes.  The low region holds the
//! built-in hex digit fonts and programs are loaded at `PROG_START`.  Every
//! access is bounds-checked, and a multi-byte access is checked as a whole
//! before anything is written, so a failed write never leaves memory
//! partially modified.

use std::fmt;

use MEM_SIZE;
use error::VmError;

/// The address of the low-resolution (5-byte) hex digit sprites.
pub const FONT_START: usize = 0x050;
/// The address of the high-resolution (10-byte) hex digit sprites.
pub const BIG_FONT_START: usize = FONT_START + FONT_HEIGHT * 16;

/// The height of a low-resolution hex digit sprite.
pub const FONT_HEIGHT: usize = 5;
/// The height of a high-resolution hex digit sprite.
pub const BIG_FONT_HEIGHT: usize = 10;

/// The low-resolution hex digit sprites.
pub const FONT: [[u8; FONT_HEIGHT]; 16] = [
    [0xF0, 0x90, 0x90, 0x90, 0xF0],
    [0x20, 0x60, 0x20, 0x20, 0x70],
    [0xF0, 0x10, 0xF0, 0x80, 0xF0],
    [0xF0, 0x10, 0xF0, 0x10, 0xF0],
    [0x90, 0x90, 0xF0, 0x10, 0x10],
    [0xF0, 0x80, 0xF0, 0x10, 0xF0],
    [0xF0, 0x80, 0xF0, 0x90, 0xF0],
    [0xF0, 0x10, 0x20, 0x40, 0x40],
    [0xF0, 0x90, 0xF0, 0x90, 0xF0],
    [0xF0, 0x90, 0xF0, 0x10, 0xF0],
    [0xF0, 0x90, 0xF0, 0x90, 0x90],
    [0xE0, 0x90, 0xE0, 0x90, 0xE0],
    [0xF0, 0x80, 0x80, 0x80, 0xF0],
    [0xE0, 0x90, 0x90, 0x90, 0xE0],
    [0xF0, 0x80, 0xF0, 0x80, 0xF0],
    [0xF0, 0x80, 0xF0, 0x80, 0x80],
];

/// The high-resolution hex digit sprites.
pub const BIG_FONT: [[u8; BIG_FONT_HEIGHT]; 16] = [
    [0x3C, 0x42, 0x81, 0x81, 0x81, 0x81, 0x81, 0x81, 0x42, 0x3C],
    [0x18, 0x28, 0x48, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x7F],
    [0x3C, 0x42, 0x81, 0x81, 0x02, 0x0C, 0x30, 0x40, 0x80, 0xFF],
    [0x7C, 0x82, 0x01, 0x01, 0x1E, 0x01, 0x01, 0x01, 0x82, 0x7C],
    [0x81, 0x81, 0x81, 0x81, 0xFF, 0x01, 0x01, 0x01, 0x01, 0x01],
    [0xFF, 0x80, 0x80, 0x80, 0xFC, 0x02, 0x01, 0x01, 0x02, 0xFC],
    [0x3E, 0x40, 0x80, 0x80, 0x80, 0xFE, 0x81, 0x81, 0x81, 0x7E],
    [0xFF, 0x01, 0x02, 0x04, 0x08, 0x08, 0x10, 0x10, 0x20, 0x20],
    [0x3C, 0x42, 0x81, 0x42, 0x3C, 0x42, 0x81, 0x81, 0x42, 0x3C],
    [0x7E, 0x81, 0x81, 0x81, 0x7F, 0x01, 0x01, 0x01, 0x02, 0x7C],
    [0x18, 0x24, 0x24, 0x24, 0x42, 0x7E, 0x42, 0x81, 0x81, 0x81],
    [0xFC, 0x82, 0x82, 0x84, 0xF8, 0x84, 0x82, 0x82, 0x82, 0xFC],
    [0x3C, 0x42, 0x81, 0x80, 0x80, 0x80, 0x80, 0x81, 0x42, 0x3C],
    [0xFC, 0x82, 0x81, 0x81, 0x81, 0x81, 0x81, 0x81, 0x82, 0xFC],
    [0xFF, 0x80, 0x80, 0x80, 0xFC, 0x80, 0x80, 0x80, 0x80, 0xFF],
    [0xFF, 0x80, 0x80, 0x80, 0xFC, 0x80, 0x80, 0x80, 0x80, 0x80],
];

/// Returns the address of the low-resolution sprite for the given digit.
///
/// Only the low nibble of `digit` is used.
pub fn font_addr(digit: u8) -> usize {
    FONT_START + FONT_HEIGHT * (digit as usize & 0xF)
}

/// Returns the address of the high-resolution sprite for the given digit.
///
/// Only the low nibble of `digit` is used.
pub fn big_font_addr(digit: u8) -> usize {
    BIG_FONT_START + BIG_FONT_HEIGHT * (digit as usize & 0xF)
}

/// The Chip-8's memory.
pub struct Memory {
    bytes: [u8; MEM_SIZE],
}

impl Memory {
    /// Returns a memory with every byte zeroed except for the fonts.
    pub fn new() -> Self {
        let mut memory = Memory {
            bytes: [0; MEM_SIZE],
        };
        memory.load_fonts();
        memory
    }

    /// Zeroes all of memory and rewrites the fonts.
    pub fn reset(&mut self) {
        self.bytes = [0; MEM_SIZE];
        self.load_fonts();
    }

    /// Returns the byte at the given address.
    pub fn read(&self, addr: usize) -> Result<u8, VmError> {
        self.bytes
            .get(addr)
            .cloned()
            .ok_or(VmError::InvalidAddress(addr))
    }

    /// Returns `len` bytes starting at the given address.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8], VmError> {
        let end = check_range(addr, len)?;
        Ok(&self.bytes[addr..end])
    }

    /// Writes a byte to the given address.
    pub fn write(&mut self, addr: usize, val: u8) -> Result<(), VmError> {
        match self.bytes.get_mut(addr) {
            Some(byte) => {
                *byte = val;
                Ok(())
            }
            None => Err(VmError::InvalidAddress(addr)),
        }
    }

    /// Writes the given bytes starting at the given address.
    ///
    /// Nothing is written unless the whole range is in bounds.
    pub fn write_slice(&mut self, addr: usize, data: &[u8]) -> Result<(), VmError> {
        let end = check_range(addr, data.len())?;
        self.bytes[addr..end].copy_from_slice(data);
        Ok(())
    }

    /// Returns a reference to the raw bytes.
    pub fn bytes(&self) -> &[u8; MEM_SIZE] {
        &self.bytes
    }

    fn load_fonts(&mut self) {
        for (i, sprite) in FONT.iter().enumerate() {
            let start = FONT_START + i * FONT_HEIGHT;
            self.bytes[start..start + FONT_HEIGHT].copy_from_slice(sprite);
        }
        for (i, sprite) in BIG_FONT.iter().enumerate() {
            let start = BIG_FONT_START + i * BIG_FONT_HEIGHT;
            self.bytes[start..start + BIG_FONT_HEIGHT].copy_from_slice(sprite);
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Memory({} bytes)", self.bytes.len())
    }
}

/// Checks that `len` bytes starting at `addr` lie within memory, returning
/// the (exclusive) end of the range.
///
/// The reported address is the first one that is out of bounds.
fn check_range(addr: usize, len: usize) -> Result<usize, VmError> {
    let end = addr.checked_add(len).ok_or(VmError::InvalidAddress(addr))?;
    if addr > MEM_SIZE || end > MEM_SIZE {
        Err(VmError::InvalidAddress(if addr >= MEM_SIZE { addr } else { MEM_SIZE }))
    } else {
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use MEM_SIZE;
    use error::VmError;
    use memory::*;

    #[test]
    fn fonts_are_loaded() {
        let memory = Memory::new();

        for digit in 0..16u8 {
            let addr = font_addr(digit);
            assert_eq!(
                memory.slice(addr, FONT_HEIGHT).unwrap(),
                &FONT[digit as usize],
                "digit {:X}",
                digit
            );
            let addr = big_font_addr(digit);
            assert_eq!(
                memory.slice(addr, BIG_FONT_HEIGHT).unwrap(),
                &BIG_FONT[digit as usize],
                "digit {:X}",
                digit
            );
        }
        // The fonts must stay out of the program area.
        assert!(big_font_addr(0xF) + BIG_FONT_HEIGHT <= ::PROG_START);
    }

    #[test]
    fn font_addr_uses_low_nibble() {
        assert_eq!(font_addr(0x1A), font_addr(0xA));
        assert_eq!(big_font_addr(0xF3), big_font_addr(0x3));
    }

    #[test]
    fn out_of_bounds_accesses() {
        let mut memory = Memory::new();

        assert_eq!(memory.read(MEM_SIZE), Err(VmError::InvalidAddress(MEM_SIZE)));
        assert_eq!(
            memory.write(0x1234, 1),
            Err(VmError::InvalidAddress(0x1234))
        );
        assert_eq!(
            memory.slice(MEM_SIZE - 2, 3),
            Err(VmError::InvalidAddress(MEM_SIZE))
        );
        assert!(memory.slice(MEM_SIZE - 3, 3).is_ok());
        assert!(memory.slice(MEM_SIZE, 0).is_ok());
    }

    #[test]
    fn huge_ranges() {
        use std::usize;

        let mut memory = Memory::new();

        // Test cases, in the format (addr, len).
        let cases = [(usize::MAX, 1), (1, usize::MAX), (usize::MAX, usize::MAX)];
        for &(addr, len) in cases.iter() {
            assert!(memory.slice(addr, len).is_err(), "case {:?}", (addr, len));
        }
        assert_eq!(
            memory.slice(usize::MAX, 1),
            Err(VmError::InvalidAddress(usize::MAX))
        );
        assert_eq!(
            memory.write_slice(usize::MAX, &[1, 2]),
            Err(VmError::InvalidAddress(usize::MAX))
        );
    }

    /// A write that doesn't fit must not touch memory at all.
    #[test]
    fn failed_write_is_atomic() {
        let mut memory = Memory::new();

        let result = memory.write_slice(MEM_SIZE - 2, &[1, 2, 3]);
        assert_eq!(result, Err(VmError::InvalidAddress(MEM_SIZE)));
        assert_eq!(memory.read(MEM_SIZE - 2), Ok(0));
        assert_eq!(memory.read(MEM_SIZE - 1), Ok(0));
    }

    #[test]
    fn reset_keeps_fonts() {
        let mut memory = Memory::new();
        memory.write_slice(0x300, &[0xAA; 16]).unwrap();
        memory.write(FONT_START, 0).unwrap();

        memory.reset();
        assert_eq!(memory.slice(0x300, 16).unwrap(), &[0; 16]);
        assert_eq!(memory.read(FONT_START), Ok(FONT[0][0]));
    }
}
