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

//! Input handling for the Chip-8 interpreter.

use std::default::Default;

use num::traits::FromPrimitive;

use error::VmError;

/// The number of keys on the Chip-8 controller.
const N_KEYS: usize = 16;

enum_from_primitive!{
/// The keys on the Chip-8 controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    K0 = 0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF
}
}

impl Key {
    /// Returns the key corresponding to the lowest four bits of the given
    /// byte.
    pub fn from_byte(b: u8) -> Key {
        Key::from_u8(b % N_KEYS as u8).unwrap()
    }

    /// Returns the key with the given code, rejecting anything outside of
    /// `0x0`-`0xF`.
    pub fn from_code(code: u8) -> Result<Key, VmError> {
        Key::from_u8(code).ok_or(VmError::InvalidKeyCode(code))
    }
}

/// Represents the state of the input device.
///
/// Besides the current state of each key, this keeps track of which keys went
/// from released to pressed since the last call to `take_pressed`, which is
/// what the blocking `LD Vx, K` instruction waits for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// The key states (`true` means "pressed").
    keys: [bool; N_KEYS],
    /// The keys that were newly pressed since they were last taken.
    pending: [bool; N_KEYS],
}

impl State {
    /// Returns a new input state with all keys unpressed.
    pub fn new() -> Self {
        State::default()
    }

    /// Presses the given key.
    pub fn press(&mut self, key: Key) {
        let i = key as usize;
        if !self.keys[i] {
            self.pending[i] = true;
        }
        self.keys[i] = true;
    }

    /// Releases the given key.
    pub fn release(&mut self, key: Key) {
        self.keys[key as usize] = false;
    }

    /// Returns whether the given key is pressed.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys[key as usize]
    }

    /// Returns the lowest key that was newly pressed since the last call, and
    /// forgets about all other new presses.
    pub fn take_pressed(&mut self) -> Option<Key> {
        let key = self.pending
            .iter()
            .position(|&p| p)
            .map(|i| Key::from_usize(i).unwrap());
        self.clear_pending();
        key
    }

    /// Forgets about all new presses, without changing which keys are held.
    pub fn clear_pending(&mut self) {
        self.pending = [false; N_KEYS];
    }
}

#[cfg(test)]
mod tests {
    use error::VmError;
    use input::{Key, State};

    #[test]
    fn key_codes() {
        assert_eq!(Key::from_code(0), Ok(Key::K0));
        assert_eq!(Key::from_code(0xF), Ok(Key::KF));
        assert_eq!(Key::from_code(16), Err(VmError::InvalidKeyCode(16)));
        assert_eq!(Key::from_code(255), Err(VmError::InvalidKeyCode(255)));
        assert_eq!(Key::from_byte(0x1A), Key::KA);
    }

    #[test]
    fn press_and_release() {
        let mut state = State::new();

        state.press(Key::K5);
        assert!(state.is_pressed(Key::K5));
        assert!(!state.is_pressed(Key::K4));
        state.release(Key::K5);
        assert!(!state.is_pressed(Key::K5));
    }

    /// Simultaneous presses resolve to the lowest key, and the rest are
    /// dropped.
    #[test]
    fn take_lowest_press() {
        let mut state = State::new();

        state.press(Key::KC);
        state.press(Key::K3);
        state.press(Key::K7);
        assert_eq!(state.take_pressed(), Some(Key::K3));
        assert_eq!(state.take_pressed(), None);
        // Taking a press doesn't release anything.
        assert!(state.is_pressed(Key::KC));
    }

    /// Holding a key down is not a new press.
    #[test]
    fn held_key_is_not_a_new_press() {
        let mut state = State::new();

        state.press(Key::K1);
        state.clear_pending();
        state.press(Key::K1);
        assert_eq!(state.take_pressed(), None);

        // A quick tap between two checks still counts.
        state.release(Key::K1);
        state.press(Key::K1);
        state.release(Key::K1);
        assert_eq!(state.take_pressed(), Some(Key::K1));
    }
}
