/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! A Chip-8/Super-Chip virtual machine.
//!
//! The crate is built around the `Interpreter`, which is driven entirely by
//! its host: the host calls `cycle` some number of times per frame, then
//! `tick` once per frame, and repaints whenever the display reports that it
//! was updated.  Nothing in here spawns threads or reads the clock on its
//! own, so any number of independent interpreters can coexist.

#[macro_use]
extern crate enum_primitive;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate num;
extern crate rand;
extern crate time;

/// The size of the Chip-8's memory, in bytes.
pub const MEM_SIZE: usize = 0x1000;
/// The address where programs should be loaded.
pub const PROG_START: usize = 0x200;
/// The maximum size of a Chip-8 program, in bytes.
pub const PROG_SIZE: usize = MEM_SIZE - PROG_START;
/// The maximum depth of the call stack.
pub const STACK_SIZE: usize = 16;

pub mod display;
pub mod error;
pub mod ffi;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod mode;
pub mod timer;

pub use error::VmError;
pub use instruction::{Address, AlignedAddress, Instruction, Opcode, Register};
pub use interpreter::{Interpreter, Options, RunState};
pub use mode::{Mode, Quirks};
