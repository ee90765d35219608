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

//! Chip-8 instructions and opcodes.
//!
//! This module provides the basic types and functions for working with Chip-8
//! instructions and opcodes, including (most notably) the translation of
//! opcodes to the internal `Instruction` type.  Decoding is a pure function of
//! the opcode and the active `Mode`, and it cannot fail: anything that is not
//! a valid instruction in the active table decodes to `Instruction::Unknown`,
//! which the interpreter then reports when it tries to execute it.

use std::fmt;
use std::ops::Add;
use std::ops::Deref;

use num::FromPrimitive;

use MEM_SIZE;
use error::VmError;
use mode::Mode;

enum_from_primitive! {
/// A Chip-8 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    V0 = 0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
}

impl Register {
    /// Returns the register with the given index (modulo 16).
    pub fn from_index(i: usize) -> Register {
        Register::from_usize(i & 0xF).unwrap()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

/// A Chip-8 opcode.
///
/// Having this as a wrapper around an ordinary `u16` allows for some nice
/// helper methods to be implemented, which make decoding opcodes much easier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Returns the opcode made up of the given bytes (in big-endian order).
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode((high as u16) << 8 | low as u16)
    }

    /// Returns the `Vx` register corresponding to this opcode.
    ///
    /// This does not guarantee that the result is actually meaningful.
    fn vx(&self) -> Register {
        Register::from_index(((self.0 & 0x0F00) >> 8) as usize)
    }

    /// Returns the `Vy` register corresponding to this opcode.
    ///
    /// This does not guarantee that the result is actually meaningful.
    fn vy(&self) -> Register {
        Register::from_index(((self.0 & 0x00F0) >> 4) as usize)
    }

    /// Returns the `nibble` corresponding to this opcode.
    fn nibble(&self) -> u8 {
        self.0 as u8 & 0xF
    }

    /// Returns the `byte` corresponding to this opcode.
    fn byte(&self) -> u8 {
        self.0 as u8
    }

    /// Returns the `addr` corresponding to this opcode.
    ///
    /// Twelve bits always fit in memory, so this can't fail.
    fn addr(&self) -> Address {
        Address((self.0 & 0xFFF) as usize)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:04X}", self.0)
    }
}

/// An address pointing to a Chip-8 memory location.
///
/// All addresses must be within the addressable range, and some addresses (but
/// not all) must be aligned on a 2-byte boundary.  The former condition is
/// guaranteed to be satisfied for any instance of this type; the latter
/// condition is satisfied by the `AlignedAddress` type, which can be produced
/// from an `Address` using the `aligned` method.
///
/// # Examples
///
/// Addresses must be within the proper bounds, and can be further verified as
/// properly aligned:
///
/// ```
/// use superchip::Address;
///
/// let addr = Address::from_u16(0x204).unwrap();
/// assert_eq!(addr.addr(), 0x204);
/// let aligned = addr.aligned().unwrap();
/// assert_eq!(aligned.addr(), 0x204);
///
/// assert!(Address::from_u16(0x1000).is_err());
/// assert!(Address::from_u16(0x203).unwrap().aligned().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(usize);

impl Address {
    /// Verifies whether the given `u16` address value is valid, returning the
    /// corresponding `Address` if it is.
    pub fn from_u16(addr: u16) -> Result<Self, VmError> {
        Address::from_usize(addr as usize)
    }

    /// Verifies whether the given `usize` address is valid, returning the
    /// corresponding `Address` if it is.
    pub fn from_usize(addr: usize) -> Result<Self, VmError> {
        if addr >= MEM_SIZE {
            Err(VmError::InvalidAddress(addr))
        } else {
            Ok(Address(addr))
        }
    }

    /// Returns the value of the address.
    pub fn addr(&self) -> usize {
        self.0
    }

    /// Returns the corresponding `AlignedAddress` if the address is aligned,
    /// and an error if not.
    pub fn aligned(&self) -> Result<AlignedAddress, VmError> {
        if self.0 & 1 == 0 {
            Ok(AlignedAddress(*self))
        } else {
            Err(VmError::InvalidAddress(self.0))
        }
    }
}

impl Add<usize> for Address {
    type Output = Result<Self, VmError>;

    fn add(self, rhs: usize) -> Self::Output {
        Address::from_usize(self.0 + rhs)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:03X}", self.0)
    }
}

/// A Chip-8 address which is guaranteed to be aligned.
///
/// An `AlignedAddress` is like an `Address` (and dereferences to one), but is
/// guaranteed to be aligned to a 2-byte boundary.  Thus, it is suitable for
/// use as a program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedAddress(Address);

impl Add<usize> for AlignedAddress {
    type Output = Result<Self, VmError>;

    fn add(self, rhs: usize) -> Self::Output {
        (self.0 + rhs)?.aligned()
    }
}

impl Deref for AlignedAddress {
    type Target = Address;

    fn deref(&self) -> &Address {
        &self.0
    }
}

impl fmt::Display for AlignedAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A Chip-8 instruction.
///
/// This is an internal representation used to make working with instructions
/// easier; if this type were not present, then opcodes would have to be
/// deciphered every time an instruction is used, which would quickly become
/// inconvenient.  Instructions whose exact behavior depends on a quirk (such
/// as the shifts) carry every operand the quirk might need, and the
/// interpreter picks the right behavior when executing them.
///
/// # Examples
///
/// Instructions can be created from opcodes:
///
/// ```
/// use superchip::{Instruction, Mode, Opcode, Register};
///
/// let instr = Instruction::from_opcode(Opcode(0x7510), Mode::Standard);
/// assert_eq!(instr, Instruction::AddByte(Register::V5, 0x10));
/// ```
///
/// Super-Chip instructions only exist in extended mode:
///
/// ```
/// use superchip::{Instruction, Mode, Opcode, Register};
///
/// let op = Opcode(0xF330);
/// assert_eq!(Instruction::from_opcode(op, Mode::Extended), Instruction::LdHf(Register::V3));
/// assert_eq!(Instruction::from_opcode(op, Mode::Standard), Instruction::Unknown(op));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `SYS addr` (`0nnn`), ignored.
    Sys(Address),
    /// `SCD nibble` (`00Cn`).
    Scd(u8),
    /// `CLS` (`00E0`).
    Cls,
    /// `RET` (`00EE`).
    Ret,
    /// `SCR` (`00FB`).
    Scr,
    /// `SCL` (`00FC`).
    Scl,
    /// `EXIT` (`00FD`).
    Exit,
    /// `LOW` (`00FE`).
    Low,
    /// `HIGH` (`00FF`).
    High,
    /// `JP addr` (`1nnn`).
    Jp(Address),
    /// `CALL addr` (`2nnn`).
    Call(Address),
    /// `SE Vx, byte` (`3xkk`).
    SeByte(Register, u8),
    /// `SNE Vx, byte` (`4xkk`).
    SneByte(Register, u8),
    /// `SE Vx, Vy` (`5xy0`).
    SeReg(Register, Register),
    /// `LD Vx, byte` (`6xkk`).
    LdByte(Register, u8),
    /// `ADD Vx, byte` (`7xkk`).
    AddByte(Register, u8),
    /// `LD Vx, Vy` (`8xy0`).
    LdReg(Register, Register),
    /// `OR Vx, Vy` (`8xy1`).
    Or(Register, Register),
    /// `AND Vx, Vy` (`8xy2`).
    And(Register, Register),
    /// `XOR Vx, Vy` (`8xy3`).
    Xor(Register, Register),
    /// `ADD Vx, Vy` (`8xy4`).
    AddReg(Register, Register),
    /// `SUB Vx, Vy` (`8xy5`).
    Sub(Register, Register),
    /// `SHR Vx, Vy` (`8xy6`).
    Shr(Register, Register),
    /// `SUBN Vx, Vy` (`8xy7`).
    Subn(Register, Register),
    /// `SHL Vx, Vy` (`8xyE`).
    Shl(Register, Register),
    /// `SNE Vx, Vy` (`9xy0`).
    SneReg(Register, Register),
    /// `LD I, addr` (`Annn`).
    LdI(Address),
    /// `JP V0, addr` (`Bxnn`); `x` is only used under the jump quirk.
    JpV0(Register, Address),
    /// `RND Vx, byte` (`Cxkk`).
    Rnd(Register, u8),
    /// `DRW Vx, Vy, nibble` (`Dxyn`).
    Drw(Register, Register, u8),
    /// `DRW Vx, Vy, 0` (`Dxy0`), drawing a 16x16 sprite.
    DrwHigh(Register, Register),
    /// `SKP Vx` (`Ex9E`).
    Skp(Register),
    /// `SKNP Vx` (`ExA1`).
    Sknp(Register),
    /// `LD Vx, DT` (`Fx07`).
    LdRegDt(Register),
    /// `LD Vx, K` (`Fx0A`).
    LdKey(Register),
    /// `LD DT, Vx` (`Fx15`).
    LdDtReg(Register),
    /// `LD ST, Vx` (`Fx18`).
    LdSt(Register),
    /// `ADD I, Vx` (`Fx1E`).
    AddI(Register),
    /// `LD F, Vx` (`Fx29`).
    LdF(Register),
    /// `LD HF, Vx` (`Fx30`).
    LdHf(Register),
    /// `LD B, Vx` (`Fx33`).
    LdB(Register),
    /// `LD [I], Vx` (`Fx55`).
    LdDerefIReg(Register),
    /// `LD Vx, [I]` (`Fx65`).
    LdRegDerefI(Register),
    /// `LD R, Vx` (`Fx75`).
    LdRReg(Register),
    /// `LD Vx, R` (`Fx85`).
    LdRegR(Register),
    /// An opcode with no meaning in the active instruction table.
    Unknown(Opcode),
}

impl Instruction {
    /// Returns the instruction corresponding to the given opcode in the given
    /// mode.
    ///
    /// The Super-Chip instructions are only decoded in extended mode; in
    /// standard mode, `00Cn` and `00Fx` are plain `SYS` calls, `Dxy0` draws
    /// nothing and the `Fx30`/`Fx75`/`Fx85` opcodes are unknown.
    pub fn from_opcode(opcode: Opcode, mode: Mode) -> Self {
        use self::Instruction::*;

        let ext = mode.is_extended();
        let unknown = Unknown(opcode);

        match (opcode.0 & 0xF000) >> 12 {
            0x0 => match opcode.0 {
                0x00E0 => Cls,
                0x00EE => Ret,
                0x00C0..=0x00CF if ext => Scd(opcode.nibble()),
                0x00FB if ext => Scr,
                0x00FC if ext => Scl,
                0x00FD if ext => Exit,
                0x00FE if ext => Low,
                0x00FF if ext => High,
                _ => Sys(opcode.addr()),
            },
            0x1 => Jp(opcode.addr()),
            0x2 => Call(opcode.addr()),
            0x3 => SeByte(opcode.vx(), opcode.byte()),
            0x4 => SneByte(opcode.vx(), opcode.byte()),
            0x5 => if opcode.nibble() == 0 {
                SeReg(opcode.vx(), opcode.vy())
            } else {
                unknown
            },
            0x6 => LdByte(opcode.vx(), opcode.byte()),
            0x7 => AddByte(opcode.vx(), opcode.byte()),
            0x8 => match opcode.nibble() {
                0x0 => LdReg(opcode.vx(), opcode.vy()),
                0x1 => Or(opcode.vx(), opcode.vy()),
                0x2 => And(opcode.vx(), opcode.vy()),
                0x3 => Xor(opcode.vx(), opcode.vy()),
                0x4 => AddReg(opcode.vx(), opcode.vy()),
                0x5 => Sub(opcode.vx(), opcode.vy()),
                0x6 => Shr(opcode.vx(), opcode.vy()),
                0x7 => Subn(opcode.vx(), opcode.vy()),
                0xE => Shl(opcode.vx(), opcode.vy()),
                _ => unknown,
            },
            0x9 => if opcode.nibble() == 0 {
                SneReg(opcode.vx(), opcode.vy())
            } else {
                unknown
            },
            0xA => LdI(opcode.addr()),
            0xB => JpV0(opcode.vx(), opcode.addr()),
            0xC => Rnd(opcode.vx(), opcode.byte()),
            0xD => if ext && opcode.nibble() == 0 {
                DrwHigh(opcode.vx(), opcode.vy())
            } else {
                Drw(opcode.vx(), opcode.vy(), opcode.nibble())
            },
            0xE => match opcode.byte() {
                0x9E => Skp(opcode.vx()),
                0xA1 => Sknp(opcode.vx()),
                _ => unknown,
            },
            0xF => match opcode.byte() {
                0x07 => LdRegDt(opcode.vx()),
                0x0A => LdKey(opcode.vx()),
                0x15 => LdDtReg(opcode.vx()),
                0x18 => LdSt(opcode.vx()),
                0x1E => AddI(opcode.vx()),
                0x29 => LdF(opcode.vx()),
                0x30 if ext => LdHf(opcode.vx()),
                0x33 => LdB(opcode.vx()),
                0x55 => LdDerefIReg(opcode.vx()),
                0x65 => LdRegDerefI(opcode.vx()),
                // There are only eight flag registers.
                0x75 if ext && (opcode.vx() as usize) < 8 => LdRReg(opcode.vx()),
                0x85 if ext && (opcode.vx() as usize) < 8 => LdRegR(opcode.vx()),
                _ => unknown,
            },
            _ => unreachable!("4-bit quantity didn't match 0-15"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Instruction::*;

        match *self {
            Sys(addr) => write!(f, "SYS {}", addr),
            Scd(n) => write!(f, "SCD {}", n),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Scr => write!(f, "SCR"),
            Scl => write!(f, "SCL"),
            Exit => write!(f, "EXIT"),
            Low => write!(f, "LOW"),
            High => write!(f, "HIGH"),
            Jp(addr) => write!(f, "JP {}", addr),
            Call(addr) => write!(f, "CALL {}", addr),
            SeByte(reg, b) => write!(f, "SE {}, #{:02X}", reg, b),
            SneByte(reg, b) => write!(f, "SNE {}, #{:02X}", reg, b),
            SeReg(reg1, reg2) => write!(f, "SE {}, {}", reg1, reg2),
            LdByte(reg, b) => write!(f, "LD {}, #{:02X}", reg, b),
            AddByte(reg, b) => write!(f, "ADD {}, #{:02X}", reg, b),
            LdReg(reg1, reg2) => write!(f, "LD {}, {}", reg1, reg2),
            Or(reg1, reg2) => write!(f, "OR {}, {}", reg1, reg2),
            And(reg1, reg2) => write!(f, "AND {}, {}", reg1, reg2),
            Xor(reg1, reg2) => write!(f, "XOR {}, {}", reg1, reg2),
            AddReg(reg1, reg2) => write!(f, "ADD {}, {}", reg1, reg2),
            Sub(reg1, reg2) => write!(f, "SUB {}, {}", reg1, reg2),
            Shr(reg1, reg2) => write!(f, "SHR {}, {}", reg1, reg2),
            Subn(reg1, reg2) => write!(f, "SUBN {}, {}", reg1, reg2),
            Shl(reg1, reg2) => write!(f, "SHL {}, {}", reg1, reg2),
            SneReg(reg1, reg2) => write!(f, "SNE {}, {}", reg1, reg2),
            LdI(addr) => write!(f, "LD I, {}", addr),
            JpV0(_, addr) => write!(f, "JP V0, {}", addr),
            Rnd(reg, b) => write!(f, "RND {}, #{:02X}", reg, b),
            Drw(reg1, reg2, n) => write!(f, "DRW {}, {}, {}", reg1, reg2, n),
            DrwHigh(reg1, reg2) => write!(f, "DRW {}, {}, 0", reg1, reg2),
            Skp(reg) => write!(f, "SKP {}", reg),
            Sknp(reg) => write!(f, "SKNP {}", reg),
            LdRegDt(reg) => write!(f, "LD {}, DT", reg),
            LdKey(reg) => write!(f, "LD {}, K", reg),
            LdDtReg(reg) => write!(f, "LD DT, {}", reg),
            LdSt(reg) => write!(f, "LD ST, {}", reg),
            AddI(reg) => write!(f, "ADD I, {}", reg),
            LdF(reg) => write!(f, "LD F, {}", reg),
            LdHf(reg) => write!(f, "LD HF, {}", reg),
            LdB(reg) => write!(f, "LD B, {}", reg),
            LdDerefIReg(reg) => write!(f, "LD [I], {}", reg),
            LdRegDerefI(reg) => write!(f, "LD {}, [I]", reg),
            LdRReg(reg) => write!(f, "LD R, {}", reg),
            LdRegR(reg) => write!(f, "LD {}, R", reg),
            Unknown(op) => write!(f, "DW {}", op),
        }
    }
}

#[cfg(test)]
mod tests {
    use instruction::{Address, Instruction, Opcode};
    use mode::Mode;

    fn addr(a: usize) -> Address {
        Address::from_usize(a).unwrap()
    }

    /// Tests decoding of the instructions shared by both modes.
    #[test]
    fn decode_common() {
        use Instruction::*;
        use Register::*;

        let cases = [
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x0123, Sys(addr(0x123))),
            (0x1ABC, Jp(addr(0xABC))),
            (0x2204, Call(addr(0x204))),
            (0x3A42, SeByte(VA, 0x42)),
            (0x4B00, SneByte(VB, 0x00)),
            (0x5120, SeReg(V1, V2)),
            (0x6F7F, LdByte(VF, 0x7F)),
            (0x7001, AddByte(V0, 0x01)),
            (0x8120, LdReg(V1, V2)),
            (0x8121, Or(V1, V2)),
            (0x8122, And(V1, V2)),
            (0x8123, Xor(V1, V2)),
            (0x8124, AddReg(V1, V2)),
            (0x8125, Sub(V1, V2)),
            (0x8126, Shr(V1, V2)),
            (0x8127, Subn(V1, V2)),
            (0x812E, Shl(V1, V2)),
            (0x9EF0, SneReg(VE, VF)),
            (0xA050, LdI(addr(0x050))),
            (0xB300, JpV0(V3, addr(0x300))),
            (0xC50F, Rnd(V5, 0x0F)),
            (0xD125, Drw(V1, V2, 5)),
            (0xE39E, Skp(V3)),
            (0xE3A1, Sknp(V3)),
            (0xF407, LdRegDt(V4)),
            (0xF40A, LdKey(V4)),
            (0xF415, LdDtReg(V4)),
            (0xF418, LdSt(V4)),
            (0xF41E, AddI(V4)),
            (0xF429, LdF(V4)),
            (0xF433, LdB(V4)),
            (0xF455, LdDerefIReg(V4)),
            (0xF465, LdRegDerefI(V4)),
        ];

        for &(op, ref instr) in cases.iter() {
            for &mode in [Mode::Standard, Mode::Extended].iter() {
                assert_eq!(
                    &Instruction::from_opcode(Opcode(op), mode),
                    instr,
                    "case {:04X} ({:?})",
                    op,
                    mode
                );
            }
        }
    }

    /// Tests that the Super-Chip instructions only decode in extended mode.
    #[test]
    fn decode_extended() {
        use Instruction::*;
        use Register::*;

        // Test cases, in the format (opcode, extended, standard).
        let cases = [
            (0x00C4, Scd(4), Sys(addr(0x0C4))),
            (0x00FB, Scr, Sys(addr(0x0FB))),
            (0x00FC, Scl, Sys(addr(0x0FC))),
            (0x00FD, Exit, Sys(addr(0x0FD))),
            (0x00FE, Low, Sys(addr(0x0FE))),
            (0x00FF, High, Sys(addr(0x0FF))),
            (0xD120, DrwHigh(V1, V2), Drw(V1, V2, 0)),
            (0xF530, LdHf(V5), Unknown(Opcode(0xF530))),
            (0xF775, LdRReg(V7), Unknown(Opcode(0xF775))),
            (0xF085, LdRegR(V0), Unknown(Opcode(0xF085))),
        ];

        for &(op, ref ext, ref std) in cases.iter() {
            let opcode = Opcode(op);
            assert_eq!(
                &Instruction::from_opcode(opcode, Mode::Extended),
                ext,
                "case {:04X}",
                op
            );
            assert_eq!(
                &Instruction::from_opcode(opcode, Mode::Standard),
                std,
                "case {:04X}",
                op
            );
        }
    }

    #[test]
    fn decode_unknown() {
        let cases = [0x5121, 0x8128, 0x812F, 0x9121, 0xE000, 0xE19F, 0xF000, 0xFF99, 0xF875, 0xFF85];

        for &op in cases.iter() {
            for &mode in [Mode::Standard, Mode::Extended].iter() {
                assert_eq!(
                    Instruction::from_opcode(Opcode(op), mode),
                    Instruction::Unknown(Opcode(op)),
                    "case {:04X} ({:?})",
                    op,
                    mode
                );
            }
        }
    }

    #[test]
    fn opcode_from_bytes() {
        assert_eq!(Opcode::from_bytes(0x12, 0x34), Opcode(0x1234));
        assert_eq!(Opcode::from_bytes(0xFF, 0x00), Opcode(0xFF00));
    }

    #[test]
    fn aligned_address_arithmetic() {
        let pc = addr(0x200).aligned().unwrap();
        assert_eq!((pc + 2).unwrap().addr(), 0x202);
        assert!((pc + 1).is_err());

        let last = addr(0xFFE).aligned().unwrap();
        assert!((last + 2).is_err());
    }

    #[test]
    fn display() {
        use Instruction::*;
        use Register::*;

        assert_eq!(AddByte(V5, 0x10).to_string(), "ADD V5, #10");
        assert_eq!(Jp(addr(0x2A4)).to_string(), "JP #2A4");
        assert_eq!(DrwHigh(V0, V1).to_string(), "DRW V0, V1, 0");
        assert_eq!(Unknown(Opcode(0xF0FF)).to_string(), "DW #F0FF");
    }
}
