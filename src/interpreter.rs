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

//! The Chip-8 interpreter.
//!
//! The main focus of this module is the `Interpreter` struct, which contains
//! the state of a Chip-8 interpreter and provides the main interface to be
//! used by the front-end.  The front-end is in charge of time: it calls
//! `cycle` to execute instructions, `tick` to count the timers down at 60 Hz,
//! and reads the display whenever `is_display_updated` says it changed.
//!
//! When an instruction fails (for example, by reading past the end of memory
//! or returning with an empty call stack), the interpreter stops executing
//! and remembers the fault until the program is loaded or reloaded again.
//! The faulting instruction's memory and stack accesses are validated before
//! anything is written, and the program counter is left pointing at it.

use std::default::Default;
use std::io::Read;
use std::num::Wrapping;
use std::u8;

use failure::{Error, ResultExt};
use rand;

use PROG_SIZE;
use PROG_START;
use Register;
use STACK_SIZE;
use display::{self, Resolution};
use error::VmError;
use input::{self, Key};
use instruction::{Address, AlignedAddress, Instruction, Opcode};
use memory::{self, Memory};
use mode::{Mode, Quirks};
use timer::Timers;

/// The number of Super-Chip flag registers.
const N_FLAGS: usize = 8;
/// The number of pixels moved by `SCR` and `SCL`.
const SCROLL_AMOUNT: usize = 4;

/// Options for the interpreter.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// The mode to start in (default `Mode::Standard`).
    pub mode: Mode,
    /// Whether to clip sprites at the display edges instead of wrapping them
    /// (default `false`).
    pub clip_sprites: bool,
}

impl Options {
    /// Returns the default set of options.
    pub fn new() -> Self {
        Options {
            mode: Mode::Standard,
            clip_sprites: false,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// Whether the interpreter is running normally or blocked on `LD Vx, K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Instructions are executed normally.
    Running,
    /// Waiting for a key press to store in the given register.
    WaitingForKey(Register),
}

/// A Chip-8 interpreter.
///
/// This struct contains the entire state of a Chip-8 interpreter and provides
/// all the expected methods for interacting with an interpreter, such as
/// stepping through execution and inspecting the internal state.
///
/// # Examples
///
/// ```
/// use superchip::{Interpreter, Register};
///
/// let mut interpreter = Interpreter::new();
/// interpreter.load_rom(&[0x60, 0x05, 0x70, 0x03]).unwrap();
/// interpreter.cycle().unwrap();
/// interpreter.cycle().unwrap();
///
/// assert_eq!(interpreter.register(Register::V0), 8);
/// assert_eq!(interpreter.pc().addr(), 0x204);
/// ```
pub struct Interpreter {
    /// The internal memory.
    mem: Memory,
    /// The display buffer.
    display: display::Buffer,
    /// The input state.
    input: input::State,
    /// The general-purpose registers `V0`-`VF`.
    regs: [Wrapping<u8>; 16],
    /// The special register `I`.
    reg_i: u16,
    /// The delay and sound timers.
    timers: Timers,
    /// The program counter.
    pc: AlignedAddress,
    /// The call stack (for returning from subroutines).
    call_stack: Vec<AlignedAddress>,
    /// The Super-Chip flag registers, which survive a reload.
    flags: [u8; N_FLAGS],
    /// Whether we are blocked on a key press.
    state: RunState,

    /// The active mode.
    mode: Mode,
    /// The active quirks.
    quirks: Quirks,
    /// The last program loaded, kept around for `reload`.
    rom: Vec<u8>,

    /// Whether execution has been paused by the front-end.
    paused: bool,
    /// Whether the program has exited.
    halted: bool,
    /// The fault that stopped execution, if any.
    fault: Option<VmError>,
}

impl Interpreter {
    /// Returns a new interpreter with the default options.
    pub fn new() -> Self {
        Interpreter::with_options(Options::default())
    }

    /// Returns a new interpreter using the given options.
    ///
    /// The interpreter starts out with no program loaded (that is, memory is
    /// empty apart from the fonts).
    pub fn with_options(options: Options) -> Self {
        Interpreter {
            mem: Memory::new(),
            display: display::Buffer::with_resolution(options.mode.default_resolution()),
            input: input::State::new(),
            regs: [Wrapping(0); 16],
            reg_i: 0,
            timers: Timers::new(),
            pc: start_pc(),
            call_stack: Vec::with_capacity(STACK_SIZE),
            flags: [0; N_FLAGS],
            state: RunState::Running,

            mode: options.mode,
            quirks: Quirks {
                clip_sprites: options.clip_sprites,
                ..Quirks::for_mode(options.mode)
            },
            rom: Vec::new(),

            paused: false,
            halted: false,
            fault: None,
        }
    }

    /// Loads program data from the specified source.
    pub fn load_program<R: Read>(&mut self, input: &mut R) -> Result<(), Error> {
        let mut program = Vec::new();
        // One byte more than will fit is enough to know that it won't.
        input
            .take(PROG_SIZE as u64 + 1)
            .read_to_end(&mut program)
            .context("could not read program data")?;
        self.load_rom(&program)?;
        Ok(())
    }

    /// Resets the interpreter and loads the given program at `PROG_START`.
    ///
    /// A program that is too large is rejected without changing anything.
    /// The mode and the paused state are kept.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), VmError> {
        if rom.len() > PROG_SIZE {
            return Err(VmError::RomTooLarge(rom.len()));
        }

        self.rom = rom.to_vec();
        self.flags = [0; N_FLAGS];
        self.reset();
        debug!("loaded {}-byte program", rom.len());
        Ok(())
    }

    /// Resets the interpreter and loads the last program again.
    pub fn reload(&mut self) {
        self.reset();
        debug!("reloaded {}-byte program", self.rom.len());
    }

    /// Returns a reference to the display buffer.
    pub fn display(&self) -> &display::Buffer {
        &self.display
    }

    /// Returns a mutable reference to the display buffer.
    pub fn display_mut(&mut self) -> &mut display::Buffer {
        &mut self.display
    }

    /// Returns whether the display has changed since this was last called.
    ///
    /// Calling this clears the flag.
    pub fn is_display_updated(&mut self) -> bool {
        self.display.take_updated()
    }

    /// Returns whether the display is at its high (128x64) resolution.
    pub fn is_hires(&self) -> bool {
        self.display.high()
    }

    /// Returns the active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches to the given mode.
    ///
    /// This replaces the quirks with those of the new mode (keeping the
    /// sprite clipping setting) and resets the display to the mode's
    /// resolution, clearing it, even if the mode doesn't change.  Registers,
    /// memory and timers are left alone.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.quirks = Quirks {
            clip_sprites: self.quirks.clip_sprites,
            ..Quirks::for_mode(mode)
        };
        self.display.set_resolution(mode.default_resolution());
        info!("switched to {} mode", mode);
    }

    /// Returns the active quirks.
    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Replaces the active quirks until the next mode switch.
    pub fn set_quirks(&mut self, quirks: Quirks) {
        self.quirks = quirks;
    }

    /// Pauses execution, or resumes it if it is paused.
    ///
    /// Pausing only stops `cycle`; the timers keep counting down.
    pub fn pause(&mut self) {
        self.paused = !self.paused;
        info!("{}", if self.paused { "paused" } else { "resumed" });
    }

    /// Returns whether execution is paused.
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Returns whether the program has exited.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Returns the fault that stopped execution, if there was one.
    pub fn fault(&self) -> Option<VmError> {
        self.fault
    }

    /// Returns whether the interpreter is running or waiting for a key.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns a reference to the input state.
    pub fn input(&self) -> &input::State {
        &self.input
    }

    /// Returns a mutable reference to the input state.
    pub fn input_mut(&mut self) -> &mut input::State {
        &mut self.input
    }

    /// Presses the key with the given code.
    pub fn press(&mut self, code: u8) -> Result<(), VmError> {
        let key = Key::from_code(code)?;
        self.input.press(key);
        Ok(())
    }

    /// Releases the key with the given code.
    pub fn release(&mut self, code: u8) -> Result<(), VmError> {
        let key = Key::from_code(code)?;
        self.input.release(key);
        Ok(())
    }

    /// Returns a reference to the internal memory.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Returns a mutable reference to the internal memory.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Returns the value of register `I`.
    pub fn i(&self) -> u16 {
        self.reg_i
    }

    /// Sets the value of register `I`.
    pub fn set_i(&mut self, val: u16) {
        self.reg_i = val;
    }

    /// Returns the value of the delay timer.
    pub fn dt(&self) -> u8 {
        self.timers.delay
    }

    /// Sets the value of the delay timer.
    pub fn set_dt(&mut self, val: u8) {
        self.timers.delay = val;
    }

    /// Returns the value of the sound timer.
    pub fn st(&self) -> u8 {
        self.timers.sound
    }

    /// Sets the value of the sound timer.
    pub fn set_st(&mut self, val: u8) {
        self.timers.sound = val;
    }

    /// Returns whether the buzzer should be sounding.
    pub fn tone_active(&self) -> bool {
        self.timers.tone_active()
    }

    /// Counts the timers down by one.  Call this at 60 Hz.
    pub fn tick(&mut self) {
        self.timers.tick();
    }

    /// Returns the value in the given register.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize].0
    }

    /// Sets the given register to the given value.
    pub fn set_register(&mut self, reg: Register, val: u8) {
        self.regs[reg as usize].0 = val
    }

    /// Returns the value of the given flag register.
    pub fn flag(&self, n: usize) -> Option<u8> {
        self.flags.get(n).cloned()
    }

    /// Returns the value of the program counter.
    pub fn pc(&self) -> AlignedAddress {
        self.pc
    }

    /// Returns the number of return addresses on the call stack.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Returns the instruction at the program counter.
    pub fn current_instruction(&self) -> Instruction {
        Instruction::from_opcode(self.current_opcode(), self.mode)
    }

    /// Returns the opcode at the program counter.
    pub fn current_opcode(&self) -> Opcode {
        // An aligned address is at most MEM_SIZE - 2.
        let bytes = self.mem.bytes();
        let pc = self.pc.addr();
        Opcode::from_bytes(bytes[pc], bytes[pc + 1])
    }

    /// Performs a single execution step.
    ///
    /// This does nothing if execution is paused, the program has exited or
    /// faulted, or if we are waiting for a key press that hasn't happened
    /// yet.  When a key press does arrive, this call stores it and returns;
    /// execution resumes on the next call.
    ///
    /// An error is returned only by the call in which a fault happens.
    pub fn cycle(&mut self) -> Result<(), VmError> {
        if self.paused || self.halted || self.fault.is_some() {
            return Ok(());
        }
        if let RunState::WaitingForKey(reg) = self.state {
            if let Some(key) = self.input.take_pressed() {
                self.set_register(reg, key as u8);
                self.state = RunState::Running;
            }
            return Ok(());
        }

        let ins = self.current_instruction();
        trace!("{}: {}", self.pc, ins);
        let result = self.execute(ins);
        if let Err(e) = result {
            warn!("execution stopped at {}: {}", self.pc, e);
            self.fault = Some(e);
        }
        result
    }

    /// Executes the given instruction in the current interpreter context.
    ///
    /// The interpreter will behave as if the given instruction were executed
    /// at the current program location in memory.
    pub fn execute(&mut self, ins: Instruction) -> Result<(), VmError> {
        use self::Instruction::*;

        match ins {
            Sys(_) => {}
            Scd(n) => self.display.scroll_down(n as usize),
            Cls => self.display.clear(),
            Ret => {
                let ret = *self.call_stack.last().ok_or(VmError::StackUnderflow)?;
                self.pc = (ret + 2)?;
                self.call_stack.pop();
                return Ok(());
            }
            Scr => self.display.scroll_right(SCROLL_AMOUNT),
            Scl => self.display.scroll_left(SCROLL_AMOUNT),
            Exit => {
                self.halted = true;
                info!("program exited");
                return Ok(());
            }
            Low => self.set_resolution(Resolution::Low),
            High => self.set_resolution(Resolution::High),
            Jp(addr) => {
                self.pc = addr.aligned()?;
                return Ok(());
            }
            Call(addr) => {
                let target = addr.aligned()?;
                if self.call_stack.len() >= STACK_SIZE {
                    return Err(VmError::StackOverflow);
                }
                self.call_stack.push(self.pc);
                self.pc = target;
                return Ok(());
            }
            SeByte(reg, b) => if self.register(reg) == b {
                return self.skip();
            },
            SneByte(reg, b) => if self.register(reg) != b {
                return self.skip();
            },
            SeReg(reg1, reg2) => if self.register(reg1) == self.register(reg2) {
                return self.skip();
            },
            LdByte(reg, b) => self.set_register(reg, b),
            AddByte(reg, b) => self.regs[reg as usize] += Wrapping(b),
            LdReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.set_register(reg1, r2);
            }
            Or(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 | r2);
                self.logic_flag();
            }
            And(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 & r2);
                self.logic_flag();
            }
            Xor(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 ^ r2);
                self.logic_flag();
            }
            AddReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.add(reg1, r2);
            }
            Sub(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.sub(reg1, r2);
            }
            Shr(reg1, reg2) => {
                let src = self.shift_source(reg1, reg2);
                self.shr(reg1, src);
            }
            Subn(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.subn(reg1, r2);
            }
            Shl(reg1, reg2) => {
                let src = self.shift_source(reg1, reg2);
                self.shl(reg1, src);
            }
            SneReg(reg1, reg2) => if self.register(reg1) != self.register(reg2) {
                return self.skip();
            },
            LdI(addr) => self.reg_i = addr.addr() as u16,
            JpV0(reg, addr) => {
                let offset = if self.quirks.jump_uses_vx {
                    self.register(reg)
                } else {
                    self.register(Register::V0)
                };
                self.pc = (addr + offset as usize)?.aligned()?;
                return Ok(());
            }
            Rnd(reg, b) => self.set_register(reg, rand::random::<u8>() & b),
            Drw(reg1, reg2, n) => self.drw(reg1, reg2, n)?,
            DrwHigh(reg1, reg2) => self.drw_high(reg1, reg2)?,
            Skp(reg) => if self.input.is_pressed(Key::from_byte(self.register(reg))) {
                return self.skip();
            },
            Sknp(reg) => if !self.input.is_pressed(Key::from_byte(self.register(reg))) {
                return self.skip();
            },
            LdRegDt(reg) => {
                let dt = self.dt();
                self.set_register(reg, dt);
            }
            LdKey(reg) => {
                // Only presses from now on count.
                self.input.clear_pending();
                self.state = RunState::WaitingForKey(reg);
            }
            LdDtReg(reg) => {
                let r = self.register(reg);
                self.set_dt(r);
            }
            LdSt(reg) => {
                let r = self.register(reg);
                self.set_st(r);
            }
            AddI(reg) => {
                let r = self.register(reg) as u16;
                self.reg_i = self.reg_i.wrapping_add(r);
            }
            LdF(reg) => self.reg_i = memory::font_addr(self.register(reg)) as u16,
            LdHf(reg) => self.reg_i = memory::big_font_addr(self.register(reg)) as u16,
            LdB(reg) => self.ld_b(reg)?,
            LdDerefIReg(reg) => self.ld_deref_i_reg(reg)?,
            LdRegDerefI(reg) => self.ld_reg_deref_i(reg)?,
            LdRReg(reg) => {
                let n = (reg as usize + 1).min(N_FLAGS);
                for (dest, src) in self.flags[..n].iter_mut().zip(self.regs.iter()) {
                    *dest = src.0;
                }
            }
            LdRegR(reg) => {
                let n = (reg as usize + 1).min(N_FLAGS);
                for (dest, src) in self.regs[..n].iter_mut().zip(self.flags.iter()) {
                    *dest = Wrapping(*src);
                }
            }
            Unknown(op) => return Err(VmError::UnknownOpcode(op)),
        }

        self.pc = (self.pc + 2)?;
        Ok(())
    }

    /// Puts the interpreter back in its freshly-loaded state.
    fn reset(&mut self) {
        self.mem.reset();
        // The program's size was checked when it was loaded.
        self.mem.write_slice(PROG_START, &self.rom).unwrap();
        self.display.set_resolution(self.mode.default_resolution());
        self.input.clear_pending();
        self.regs = [Wrapping(0); 16];
        self.reg_i = 0;
        self.timers = Timers::new();
        self.pc = start_pc();
        self.call_stack.clear();
        self.state = RunState::Running;
        self.halted = false;
        self.fault = None;
    }

    /// Skips the next instruction.
    fn skip(&mut self) -> Result<(), VmError> {
        self.pc = (self.pc + 4)?;
        Ok(())
    }

    /// Switches the display resolution (`LOW`/`HIGH`).
    fn set_resolution(&mut self, resolution: Resolution) {
        self.display.set_resolution(resolution);
        info!(
            "switched to {}x{} display",
            resolution.width(),
            resolution.height()
        );
    }

    /// Adds the given byte to the given register, setting `VF` to 1 on carry
    /// or 0 otherwise.
    fn add(&mut self, reg: Register, val: u8) {
        let carry = val > u8::MAX - self.register(reg);
        self.regs[reg as usize] += Wrapping(val);
        self.set_register(Register::VF, carry as u8);
    }

    /// Implements the `DRW` operation with an 8-pixel-wide sprite.
    fn drw(&mut self, reg1: Register, reg2: Register, n: u8) -> Result<(), VmError> {
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;
        let collision = {
            let sprite = self.mem.slice(self.reg_i as usize, n as usize)?;
            self.display
                .draw_sprite(sprite, x, y, self.quirks.clip_sprites)
        };
        self.set_register(Register::VF, collision as u8);
        Ok(())
    }

    /// Implements the `DRW` operation with a 16x16 sprite.
    fn drw_high(&mut self, reg1: Register, reg2: Register) -> Result<(), VmError> {
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;
        let collision = {
            let sprite = self.mem.slice(self.reg_i as usize, 32)?;
            self.display
                .draw_sprite_16x16(sprite, x, y, self.quirks.clip_sprites)
        };
        self.set_register(Register::VF, collision as u8);
        Ok(())
    }

    /// Implements the `LD B, Vx` operation.
    fn ld_b(&mut self, reg: Register) -> Result<(), VmError> {
        let val = self.register(reg);
        let digits = [val / 100, val % 100 / 10, val % 10];
        self.mem.write_slice(self.reg_i as usize, &digits)
    }

    /// Implements the `LD [I], Vx` operation.
    fn ld_deref_i_reg(&mut self, reg: Register) -> Result<(), VmError> {
        let n = reg as usize + 1;
        let mut vals = [0u8; 16];
        for (dest, src) in vals.iter_mut().zip(self.regs.iter()) {
            *dest = src.0;
        }

        self.mem.write_slice(self.reg_i as usize, &vals[..n])?;
        if self.quirks.load_increments_i {
            self.reg_i = self.reg_i.wrapping_add(n as u16);
        }
        Ok(())
    }

    /// Implements the `LD Vx, [I]` operation.
    fn ld_reg_deref_i(&mut self, reg: Register) -> Result<(), VmError> {
        let n = reg as usize + 1;

        for (dest, src) in self.regs[..n]
            .iter_mut()
            .zip(self.mem.slice(self.reg_i as usize, n)?.iter())
        {
            *dest = Wrapping(*src);
        }
        if self.quirks.load_increments_i {
            self.reg_i = self.reg_i.wrapping_add(n as u16);
        }
        Ok(())
    }

    /// Resets `VF` after a logical operation, if the quirk is enabled.
    fn logic_flag(&mut self) {
        if self.quirks.logic_resets_vf {
            self.set_register(Register::VF, 0);
        }
    }

    /// Returns the register that a shift reads from.
    fn shift_source(&self, reg1: Register, reg2: Register) -> Register {
        if self.quirks.shift_uses_vy {
            reg2
        } else {
            reg1
        }
    }

    /// Sets `reg1` to `reg2 << 1`, setting `VF` to the old highest bit.
    fn shl(&mut self, reg1: Register, reg2: Register) {
        let old = (self.register(reg2) & 1 << 7) >> 7;
        let r2 = self.register(reg2);
        self.set_register(reg1, r2 << 1);
        self.set_register(Register::VF, old);
    }

    /// Sets `reg1` to `reg2 >> 1`, setting `VF` to the old lowest bit.
    fn shr(&mut self, reg1: Register, reg2: Register) {
        let old = self.register(reg2) & 1;
        let r2 = self.register(reg2);
        self.set_register(reg1, r2 >> 1);
        self.set_register(Register::VF, old);
    }

    /// Subtracts the given byte from the given register, setting `VF` to 0 on
    /// borrow or 1 otherwise.
    fn sub(&mut self, reg: Register, val: u8) {
        let borrow = val > self.register(reg);
        self.regs[reg as usize] -= Wrapping(val);
        self.set_register(Register::VF, !borrow as u8);
    }

    /// Sets `reg` to `val - reg`, setting `VF` to 0 on borrow or 1 otherwise.
    fn subn(&mut self, reg: Register, val: u8) {
        let borrow = self.register(reg) > val;
        self.regs[reg as usize] = Wrapping(val) - self.regs[reg as usize];
        self.set_register(Register::VF, !borrow as u8);
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Returns the address where execution starts.
fn start_pc() -> AlignedAddress {
    // PROG_START is a valid, aligned address.
    Address::from_usize(PROG_START)
        .and_then(|addr| addr.aligned())
        .unwrap()
}
