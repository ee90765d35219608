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

//! The Chip-8 display buffer.
//!
//! Pixels are stored row-major, one byte per pixel (0 or 1), so that a host
//! can read pixel `(x, y)` at index `y * width + x` of `Buffer::data`.  The
//! storage is allocated once at the highest resolution and never moves, so a
//! host may keep a pointer to it; changing the resolution only clears it and
//! changes how much of it is in use.

use std::default::Default;

use failure::Fail;

/// The largest width of the display.
pub const WIDTH: usize = 128;
/// The largest height of the display.
pub const HEIGHT: usize = 64;

/// A display resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 64x32 pixels.
    Low,
    /// 128x64 pixels.
    High,
}

impl Resolution {
    /// Returns the width of the display at this resolution.
    pub fn width(&self) -> usize {
        match *self {
            Resolution::Low => WIDTH / 2,
            Resolution::High => WIDTH,
        }
    }

    /// Returns the height of the display at this resolution.
    pub fn height(&self) -> usize {
        match *self {
            Resolution::Low => HEIGHT / 2,
            Resolution::High => HEIGHT,
        }
    }
}

/// A Chip-8 display buffer.
#[derive(Debug, Clone)]
pub struct Buffer {
    /// The underlying pixel data, row-major at the active width.  Always
    /// `WIDTH * HEIGHT` bytes long.
    data: Vec<u8>,
    /// The active resolution.
    resolution: Resolution,
    /// Whether the display needs to be refreshed.
    needs_refresh: bool,
}

impl Buffer {
    /// Returns a new low-resolution display buffer with all pixels clear.
    pub fn new() -> Self {
        Buffer::with_resolution(Resolution::Low)
    }

    /// Returns a new display buffer at the given resolution with all pixels
    /// clear.
    pub fn with_resolution(resolution: Resolution) -> Self {
        Buffer {
            data: vec![0; WIDTH * HEIGHT],
            resolution,
            needs_refresh: true,
        }
    }

    /// Clears the display.
    pub fn clear(&mut self) {
        for elem in self.data.iter_mut() {
            *elem = 0;
        }
        self.needs_refresh = true;
    }

    /// Returns the pixel data at the active resolution.
    ///
    /// The slice always starts at the same address for the life of the
    /// buffer.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Returns the number of pixels at the active resolution.
    fn len(&self) -> usize {
        self.width() * self.height()
    }

    /// Returns the width of the display.
    pub fn width(&self) -> usize {
        self.resolution.width()
    }

    /// Returns the height of the display.
    pub fn height(&self) -> usize {
        self.resolution.height()
    }

    /// Returns whether the pixel at the given position is on.
    ///
    /// Positions outside of the display are always off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height() && self.data[y * self.width() + x] != 0
    }

    /// Returns the active resolution.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns whether the display is in high-resolution mode.
    pub fn high(&self) -> bool {
        self.resolution == Resolution::High
    }

    /// Switches to the given resolution.
    ///
    /// The display is always cleared, even if the resolution doesn't change.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
        self.clear();
    }

    /// Draws the given 8-pixel-wide sprite at the given position.
    ///
    /// The position wraps around the display.  Pixels which extend past the
    /// edge either wrap as well or, if `clip` is set, are not drawn.
    ///
    /// Returns whether there was a collision.
    pub fn draw_sprite(&mut self, sprite: &[u8], x: usize, y: usize, clip: bool) -> bool {
        let rows = sprite.iter().map(|&row| (row as u16) << 8);
        self.draw_rows(rows, 8, x, y, clip)
    }

    /// Draws the given 16x16 sprite at the given position.
    ///
    /// Each row is two bytes, most significant first.  Wrapping and clipping
    /// work like in `draw_sprite`.
    ///
    /// Returns whether there was a collision.
    pub fn draw_sprite_16x16(&mut self, sprite: &[u8], x: usize, y: usize, clip: bool) -> bool {
        let rows = sprite
            .chunks(2)
            .take(16)
            .map(|row| (row[0] as u16) << 8 | *row.get(1).unwrap_or(&0) as u16);
        self.draw_rows(rows, 16, x, y, clip)
    }

    /// Forces a refresh on the next call to `refresh`, even if no draw
    /// operation has been performed.
    pub fn force_refresh(&mut self) {
        self.needs_refresh = true;
    }

    /// Returns whether the display has changed since the last refresh.
    pub fn is_updated(&self) -> bool {
        self.needs_refresh
    }

    /// Returns whether the display has changed since the last refresh and
    /// marks it as refreshed.
    pub fn take_updated(&mut self) -> bool {
        let updated = self.needs_refresh;
        self.needs_refresh = false;
        updated
    }

    /// Refreshes the display using the given refresh function.
    ///
    /// If a refresh is unnecessary, nothing will be done.  The refresh
    /// function receives a "snapshot" of the display, and should draw that to
    /// whatever user-facing display buffer is currently being used.
    pub fn refresh<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
        E: Fail,
    {
        if self.needs_refresh {
            f(self)?;
            self.needs_refresh = false;
        }
        Ok(())
    }

    /// Scrolls the display down the given number of pixels.
    pub fn scroll_down(&mut self, amt: usize) {
        let width = self.width();
        let amt = amt.min(self.height());
        let shift = amt * width;
        let len = self.len();

        for i in (shift..len).rev() {
            self.data[i] = self.data[i - shift];
        }
        for elem in self.data[..shift].iter_mut() {
            *elem = 0;
        }
        self.needs_refresh = true;
    }

    /// Scrolls the display left the given number of pixels.
    pub fn scroll_left(&mut self, amt: usize) {
        let width = self.width();
        let amt = amt.min(width);
        let len = self.len();

        for row in self.data[..len].chunks_mut(width) {
            for i in 0..width - amt {
                row[i] = row[i + amt];
            }
            for elem in row[width - amt..].iter_mut() {
                *elem = 0;
            }
        }
        self.needs_refresh = true;
    }

    /// Scrolls the display right the given number of pixels.
    pub fn scroll_right(&mut self, amt: usize) {
        let width = self.width();
        let amt = amt.min(width);
        let len = self.len();

        for row in self.data[..len].chunks_mut(width) {
            for i in (amt..width).rev() {
                row[i] = row[i - amt];
            }
            for elem in row[..amt].iter_mut() {
                *elem = 0;
            }
        }
        self.needs_refresh = true;
    }

    /// Draws rows of `width` pixels (taken from the top bits of each `u16`)
    /// at the given position, returning whether there was a collision.
    fn draw_rows<I>(&mut self, rows: I, width: usize, x: usize, y: usize, clip: bool) -> bool
    where
        I: Iterator<Item = u16>,
    {
        let (w, h) = (self.width(), self.height());
        let (x, y) = (x % w, y % h);
        let mut collision = false;

        for (j, row) in rows.enumerate() {
            for i in 0..width {
                if row & (0x8000 >> i) == 0 {
                    continue;
                }
                let (px, py) = (x + i, y + j);
                if clip && (px >= w || py >= h) {
                    continue;
                }
                if self.toggle(px % w, py % h) {
                    collision = true;
                }
            }
        }

        collision
    }

    /// Flips the on/off state of the given pixel, returning whether it was
    /// flipped off from the on state.
    fn toggle(&mut self, x: usize, y: usize) -> bool {
        let idx = y * self.width() + x;
        let old = self.data[idx] != 0;
        self.data[idx] ^= 1;
        self.needs_refresh = true;

        old
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

#[cfg(test)]
mod tests {
    use display::{Buffer, Resolution};

    /// Returns the pixels in row `y` from column `x` on, as a string of `#`
    /// and `.`.
    fn row(buf: &Buffer, x: usize, y: usize, len: usize) -> String {
        (x..x + len)
            .map(|x| if buf.pixel(x, y) { '#' } else { '.' })
            .collect()
    }

    #[test]
    fn draw_and_erase() {
        let mut buf = Buffer::new();
        assert!(buf.take_updated());

        assert!(!buf.draw_sprite(&[0xFF], 0, 0, false));
        assert_eq!(row(&buf, 0, 0, 9), "########.");
        assert!(buf.take_updated());

        assert!(buf.draw_sprite(&[0xFF], 0, 0, false));
        assert_eq!(row(&buf, 0, 0, 9), ".........");
        assert!(buf.data().iter().all(|&p| p == 0));
        assert!(buf.take_updated());
    }

    /// Drawing the same sprite twice must restore the original pixels, and
    /// the second draw must report a collision exactly when the first one
    /// turned any pixel on.
    #[test]
    fn xor_idempotence() {
        // Test cases, in the format (sprite, x, y).
        let cases: [(&[u8], usize, usize); 4] = [
            (&[0x3C, 0x42, 0x81], 5, 7),
            (&[0x80, 0x01], 60, 30),
            (&[0x00, 0x00], 10, 10),
            (&[0xAA, 0x55, 0xAA, 0x55], 200, 100),
        ];

        for &(sprite, x, y) in cases.iter() {
            let mut buf = Buffer::new();
            buf.draw_sprite(&[0xF0, 0x0F], 4, 6, false);
            let before = buf.data().to_vec();

            buf.draw_sprite(sprite, x, y, false);
            let set_any = buf.data()
                .iter()
                .zip(before.iter())
                .any(|(&now, &was)| now == 1 && was == 0);
            let collision = buf.draw_sprite(sprite, x, y, false);

            assert_eq!(buf.data(), &before[..], "case {:?}", (sprite, x, y));
            assert_eq!(collision, set_any, "case {:?}", (sprite, x, y));
        }
    }

    #[test]
    fn unchanged_draw_is_not_an_update() {
        let mut buf = Buffer::new();
        buf.take_updated();

        assert!(!buf.draw_sprite(&[0x00, 0x00], 3, 3, false));
        assert!(!buf.is_updated());
    }

    #[test]
    fn origin_wraps() {
        let mut buf = Buffer::new();

        buf.draw_sprite(&[0x80], 64 + 3, 32 + 2, false);
        assert!(buf.pixel(3, 2));
    }

    #[test]
    fn wrap_and_clip() {
        let mut buf = Buffer::new();
        buf.draw_sprite(&[0xFF, 0xFF], 60, 31, false);
        assert_eq!(row(&buf, 60, 31, 4), "####");
        assert_eq!(row(&buf, 0, 31, 5), "####.");
        assert_eq!(row(&buf, 0, 0, 5), "####.");
        assert_eq!(row(&buf, 60, 0, 4), "####");

        let mut buf = Buffer::new();
        buf.draw_sprite(&[0xFF, 0xFF], 60, 31, true);
        assert_eq!(row(&buf, 60, 31, 4), "####");
        assert_eq!(row(&buf, 0, 31, 5), ".....");
        assert_eq!(row(&buf, 0, 0, 5), ".....");
        assert_eq!(buf.data().iter().filter(|&&p| p != 0).count(), 4);
    }

    #[test]
    fn sprite_16x16() {
        let mut buf = Buffer::with_resolution(Resolution::High);
        let mut sprite = [0u8; 32];
        sprite[0] = 0xFF;
        sprite[1] = 0xFF;
        sprite[30] = 0x80;
        sprite[31] = 0x01;

        assert!(!buf.draw_sprite_16x16(&sprite, 100, 40, false));
        assert_eq!(row(&buf, 100, 40, 17), "################.");
        assert!(buf.pixel(100, 55));
        assert!(buf.pixel(115, 55));
        assert!(!buf.pixel(101, 55));

        assert!(buf.draw_sprite_16x16(&sprite, 100, 40, false));
        assert!(buf.data().iter().all(|&p| p == 0));
    }

    #[test]
    fn resolution_change_clears() {
        let mut buf = Buffer::new();
        assert_eq!(buf.data().len(), 64 * 32);
        buf.draw_sprite(&[0xFF], 0, 0, false);
        buf.take_updated();

        buf.set_resolution(Resolution::High);
        assert!(buf.high());
        assert_eq!((buf.width(), buf.height()), (128, 64));
        assert_eq!(buf.data().len(), 128 * 64);
        assert!(buf.data().iter().all(|&p| p == 0));
        assert!(buf.is_updated());

        buf.draw_sprite(&[0xFF], 0, 0, false);
        buf.set_resolution(Resolution::High);
        assert!(buf.data().iter().all(|&p| p == 0));
    }

    /// Changing the resolution must keep the pixels where they are in memory.
    #[test]
    fn resolution_change_keeps_storage() {
        let mut buf = Buffer::new();
        let ptr = buf.data().as_ptr();

        for &res in [Resolution::High, Resolution::High, Resolution::Low].iter() {
            buf.draw_sprite(&[0xFF; 4], 60, 30, false);
            buf.set_resolution(res);
            assert_eq!(buf.data().as_ptr(), ptr, "case {:?}", res);
            assert_eq!(buf.data().len(), res.width() * res.height(), "case {:?}", res);
            assert!(buf.data().iter().all(|&p| p == 0), "case {:?}", res);
        }
    }

    /// Low-resolution scrolling must not touch pixels beyond the active
    /// area.
    #[test]
    fn scroll_low_resolution() {
        let mut buf = Buffer::new();
        buf.draw_sprite(&[0x80], 0, 31, false);

        buf.scroll_down(1);
        assert!(buf.data().iter().all(|&p| p == 0));
        buf.set_resolution(Resolution::High);
        buf.set_resolution(Resolution::Low);
        buf.draw_sprite(&[0x01], 56, 0, false);
        buf.scroll_right(4);
        assert!(buf.data().iter().all(|&p| p == 0));
    }

    #[test]
    fn scroll() {
        let mut buf = Buffer::new();
        buf.draw_sprite(&[0x81], 8, 0, false);

        buf.scroll_right(4);
        assert_eq!(row(&buf, 8, 0, 12), "....#......#");

        buf.scroll_left(4);
        assert_eq!(row(&buf, 8, 0, 12), "#......#....");

        buf.scroll_down(3);
        assert_eq!(row(&buf, 8, 0, 8), "........");
        assert_eq!(row(&buf, 8, 3, 8), "#......#");
    }

    #[test]
    fn scroll_off_the_edge() {
        let mut buf = Buffer::new();
        buf.draw_sprite(&[0x0F], 56, 31, false);

        buf.scroll_right(4);
        buf.scroll_down(1);
        assert!(buf.data().iter().all(|&p| p == 0));
    }

    #[test]
    fn refresh_only_when_needed() {
        #[derive(Debug, Fail)]
        #[fail(display = "never")]
        struct Never;

        let mut buf = Buffer::new();
        let mut calls = 0;
        buf.refresh(|_| -> Result<(), Never> {
            calls += 1;
            Ok(())
        }).unwrap();
        buf.refresh(|_| -> Result<(), Never> {
            calls += 1;
            Ok(())
        }).unwrap();
        assert_eq!(calls, 1);
    }
}
