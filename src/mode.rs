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

//! Interpreter modes and quirks.
//!
//! The mode decides which instruction table is used to decode opcodes, the
//! default display resolution and the set of quirks that the interpreter
//! applies.  The quirks are the places where historical Chip-8
//! implementations disagree on what an instruction does; the standard set
//! matches the original COSMAC VIP interpreter, and the extended set matches
//! the Super-Chip.

use std::fmt;

use display::Resolution;

/// The instruction set variant in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plain Chip-8.
    Standard,
    /// Super-Chip.
    Extended,
}

impl Mode {
    /// Returns whether this is the extended (Super-Chip) mode.
    pub fn is_extended(&self) -> bool {
        *self == Mode::Extended
    }

    /// Returns the display resolution that this mode starts out in.
    pub fn default_resolution(&self) -> Resolution {
        match *self {
            Mode::Standard => Resolution::Low,
            Mode::Extended => Resolution::High,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Standard
    }
}

impl From<bool> for Mode {
    /// Converts the "extended" flag used by hosts into a mode.
    fn from(extended: bool) -> Self {
        if extended {
            Mode::Extended
        } else {
            Mode::Standard
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Mode::Standard => write!(f, "Chip-8"),
            Mode::Extended => write!(f, "Super-Chip"),
        }
    }
}

/// The set of quirks applied by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// Whether `SHR`/`SHL` shift `Vy` into `Vx` (instead of shifting `Vx` in
    /// place).
    pub shift_uses_vy: bool,
    /// Whether `OR`, `AND` and `XOR` reset `VF` to 0.
    pub logic_resets_vf: bool,
    /// Whether `LD [I], Vx` and `LD Vx, [I]` leave `I` pointing just past the
    /// last byte accessed.
    pub load_increments_i: bool,
    /// Whether `JP V0, addr` (`Bxnn`) adds `Vx` instead of `V0`.
    pub jump_uses_vx: bool,
    /// Whether sprites are clipped at the edges of the display instead of
    /// wrapping around.
    pub clip_sprites: bool,
}

impl Quirks {
    /// Returns the quirks of the original Chip-8 interpreter.
    pub fn standard() -> Self {
        Quirks {
            shift_uses_vy: true,
            logic_resets_vf: true,
            load_increments_i: true,
            jump_uses_vx: false,
            clip_sprites: false,
        }
    }

    /// Returns the quirks of the Super-Chip interpreter.
    pub fn extended() -> Self {
        Quirks {
            shift_uses_vy: false,
            logic_resets_vf: false,
            load_increments_i: false,
            jump_uses_vx: true,
            clip_sprites: false,
        }
    }

    /// Returns the quirks belonging to the given mode.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Standard => Quirks::standard(),
            Mode::Extended => Quirks::extended(),
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::standard()
    }
}
