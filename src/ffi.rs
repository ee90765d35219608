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

//! A C interface to the interpreter, for hosts that aren't written in Rust
//! (such as a browser page loading the library compiled to WebAssembly).
//!
//! Every function takes the handle returned by `chip8_init`.  Functions that
//! can fail return a status: 0 on success, `VmError::code` for an interpreter
//! error, or -1 if a pointer argument was null.  Functions returning a flag
//! return 0 for a null handle.

use std::os::raw::c_int;
use std::ptr;
use std::slice;
use std::u8;

use error::VmError;
use interpreter::Interpreter;
use mode::Mode;

/// The status returned on success.
const OK: c_int = 0;
/// The status returned when a pointer argument is null.
const NULL_POINTER: c_int = -1;

/// Converts a result into a status code.
fn status(result: Result<(), VmError>) -> c_int {
    match result {
        Ok(()) => OK,
        Err(e) => e.code(),
    }
}

/// Converts a C key code to the byte the interpreter expects.
fn key_code(code: c_int) -> Result<u8, VmError> {
    if code < 0 || code > u8::MAX as c_int {
        Err(VmError::InvalidKeyCode(u8::MAX))
    } else {
        Ok(code as u8)
    }
}

/// Creates a new interpreter in the standard mode, with no program loaded.
///
/// The handle must be released with `chip8_destroy`.
#[no_mangle]
pub extern "C" fn chip8_init() -> *mut Interpreter {
    Box::into_raw(Box::new(Interpreter::new()))
}

/// Releases an interpreter created by `chip8_init`.
#[no_mangle]
pub unsafe extern "C" fn chip8_destroy(vm: *mut Interpreter) {
    if !vm.is_null() {
        drop(Box::from_raw(vm));
    }
}

/// Loads `len` bytes starting at `data` as the program.
#[no_mangle]
pub unsafe extern "C" fn chip8_load_rom(vm: *mut Interpreter, data: *const u8, len: usize) -> c_int {
    let vm = match vm.as_mut() {
        Some(vm) => vm,
        None => return NULL_POINTER,
    };
    if data.is_null() && len != 0 {
        return NULL_POINTER;
    }
    let rom: &[u8] = if len == 0 {
        &[]
    } else {
        slice::from_raw_parts(data, len)
    };
    status(vm.load_rom(rom))
}

/// Reloads the last program.
#[no_mangle]
pub unsafe extern "C" fn chip8_reload(vm: *mut Interpreter) {
    if let Some(vm) = vm.as_mut() {
        vm.reload();
    }
}

/// Performs a single execution step.
#[no_mangle]
pub unsafe extern "C" fn chip8_cycle(vm: *mut Interpreter) -> c_int {
    match vm.as_mut() {
        Some(vm) => status(vm.cycle()),
        None => NULL_POINTER,
    }
}

/// Counts the timers down by one.
#[no_mangle]
pub unsafe extern "C" fn chip8_tick(vm: *mut Interpreter) {
    if let Some(vm) = vm.as_mut() {
        vm.tick();
    }
}

/// Presses the key with the given code (`0x0`-`0xF`).
#[no_mangle]
pub unsafe extern "C" fn chip8_press_key(vm: *mut Interpreter, code: c_int) -> c_int {
    match vm.as_mut() {
        Some(vm) => status(key_code(code).and_then(|code| vm.press(code))),
        None => NULL_POINTER,
    }
}

/// Releases the key with the given code (`0x0`-`0xF`).
#[no_mangle]
pub unsafe extern "C" fn chip8_release_key(vm: *mut Interpreter, code: c_int) -> c_int {
    match vm.as_mut() {
        Some(vm) => status(key_code(code).and_then(|code| vm.release(code))),
        None => NULL_POINTER,
    }
}

/// Returns the display buffer: one byte (0 or 1) per pixel, row by row, at
/// the current resolution.
///
/// The pointer stays the same until `chip8_destroy`.  There is always room
/// for 128x64 pixels behind it; at 64x32 only the first 2048 bytes are in
/// use.
#[no_mangle]
pub unsafe extern "C" fn chip8_get_display(vm: *const Interpreter) -> *const u8 {
    match vm.as_ref() {
        Some(vm) => vm.display().data().as_ptr(),
        None => ptr::null(),
    }
}

/// Returns 1 if the display changed since the last call, and clears the flag.
#[no_mangle]
pub unsafe extern "C" fn chip8_is_display_updated(vm: *mut Interpreter) -> c_int {
    vm.as_mut().map_or(0, |vm| vm.is_display_updated() as c_int)
}

/// Returns 1 if the display is at 128x64, or 0 at 64x32.
#[no_mangle]
pub unsafe extern "C" fn chip8_is_hires(vm: *const Interpreter) -> c_int {
    vm.as_ref().map_or(0, |vm| vm.is_hires() as c_int)
}

/// Switches to the standard (0) or extended (anything else) mode.
#[no_mangle]
pub unsafe extern "C" fn chip8_set_mode(vm: *mut Interpreter, mode: c_int) {
    if let Some(vm) = vm.as_mut() {
        vm.set_mode(Mode::from(mode != 0));
    }
}

/// Pauses execution, or resumes it if it is paused.
#[no_mangle]
pub unsafe extern "C" fn chip8_pause(vm: *mut Interpreter) {
    if let Some(vm) = vm.as_mut() {
        vm.pause();
    }
}

/// Returns the code of the fault that stopped execution, or 0 if there is
/// none.
#[no_mangle]
pub unsafe extern "C" fn chip8_fault(vm: *const Interpreter) -> c_int {
    match vm.as_ref() {
        Some(vm) => vm.fault().map_or(OK, |e| e.code()),
        None => NULL_POINTER,
    }
}
