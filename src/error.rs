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

//! Errors raised by the virtual machine.
//!
//! Every error here is recoverable: the interpreter reports it to the host
//! and never panics or aborts because of it.

use instruction::Opcode;

/// An error raised by the virtual machine.
#[derive(Debug, Fail, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// The program counter, `I` or a memory operation pointed outside of
    /// memory (or the program counter became misaligned).
    #[fail(display = "invalid address: {:#05X}", _0)]
    InvalidAddress(usize),
    /// An opcode that does not correspond to any instruction in the active
    /// instruction table.
    #[fail(display = "unknown opcode: {}", _0)]
    UnknownOpcode(Opcode),
    /// A `CALL` with a full call stack.
    #[fail(display = "call stack overflow")]
    StackOverflow,
    /// A `RET` with no subroutine to return from.
    #[fail(display = "no subroutine to return from")]
    StackUnderflow,
    /// A program that does not fit between the load origin and the end of
    /// memory.
    #[fail(display = "program is too large ({} bytes)", _0)]
    RomTooLarge(usize),
    /// A key code outside of `0x0`-`0xF`.
    #[fail(display = "invalid key code: {}", _0)]
    InvalidKeyCode(u8),
}

impl VmError {
    /// Returns the numeric status code used to report this error across the
    /// C interface.
    ///
    /// Codes are always positive; zero means success.
    pub fn code(&self) -> i32 {
        use self::VmError::*;

        match *self {
            InvalidAddress(_) => 1,
            UnknownOpcode(_) => 2,
            StackOverflow => 3,
            StackUnderflow => 4,
            RomTooLarge(_) => 5,
            InvalidKeyCode(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use error::VmError;
    use instruction::Opcode;

    #[test]
    fn codes_are_distinct_and_positive() {
        let errors = [
            VmError::InvalidAddress(0x1000),
            VmError::UnknownOpcode(Opcode(0x5121)),
            VmError::StackOverflow,
            VmError::StackUnderflow,
            VmError::RomTooLarge(4000),
            VmError::InvalidKeyCode(16),
        ];

        for (i, a) in errors.iter().enumerate() {
            assert!(a.code() > 0, "case {:?}", a);
            for b in errors[i + 1..].iter() {
                assert_ne!(a.code(), b.code(), "case {:?} / {:?}", a, b);
            }
        }
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            VmError::InvalidAddress(0x1000).to_string(),
            "invalid address: 0x1000"
        );
        assert_eq!(
            VmError::UnknownOpcode(Opcode(0xE0FF)).to_string(),
            "unknown opcode: #E0FF"
        );
        assert_eq!(VmError::InvalidKeyCode(17).to_string(), "invalid key code: 17");
    }
}
