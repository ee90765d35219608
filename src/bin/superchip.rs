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

//! The `superchip` binary program.
//!
//! This is a desktop host for the interpreter: it owns the frame loop,
//! running a fixed number of instructions per frame followed by one timer
//! tick, and repaints the window whenever the display changes.

extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate maplit;
extern crate sdl2;
extern crate superchip;

use std::collections::HashMap;
use std::default::Default;
use std::fs::File;
use std::io::Write;
use std::process;
use std::thread;
use std::time::Duration;

use clap::{App, Arg, ArgMatches};
use failure::{Error, ResultExt};
use log::LevelFilter;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::Canvas;
use sdl2::video::Window;

use superchip::display;
use superchip::input::Key;
use superchip::interpreter::{Interpreter, Options};
use superchip::mode::Mode;
use superchip::timer::Clock;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The most frames to run at once when the host falls behind.
const MAX_CATCH_UP: u32 = 4;

/// An SDL error.
#[derive(Debug, Fail)]
#[fail(display = "SDL error: {}", _0)]
struct SdlError(String);

/// The display window for the interpreter.
struct Display {
    /// The underlying SDL canvas.
    canvas: Canvas<Window>,
    /// The background color to use.
    bg: Color,
    /// The foreground color to use.
    fg: Color,
}

impl Display {
    /// Initializes the display and returns the resulting object.
    fn new(
        video_subsystem: sdl2::VideoSubsystem,
        width: u32,
        height: u32,
        bg: Color,
        fg: Color,
    ) -> Result<Self, Error> {
        let window = video_subsystem.window("Super-Chip", width, height).build()?;
        let mut canvas = window.into_canvas().build()?;

        canvas.set_draw_color(bg);
        canvas.clear();
        canvas.present();

        Ok(Display { canvas, bg, fg })
    }

    /// Draws the given display buffer to the window, scaling it to fill the
    /// window at whatever resolution it has.
    fn draw(&mut self, buffer: &display::Buffer) -> Result<(), SdlError> {
        let (width, height) = self.canvas.window().size();
        let scalex = width / buffer.width() as u32;
        let scaley = height / buffer.height() as u32;

        self.canvas.set_draw_color(self.bg);
        self.canvas.clear();
        self.canvas.set_draw_color(self.fg);
        for (y, row) in buffer.data().chunks(buffer.width()).enumerate() {
            for (x, &pixel) in row.iter().enumerate() {
                if pixel != 0 {
                    let x = x as i32 * scalex as i32;
                    let y = y as i32 * scaley as i32;

                    self.canvas
                        .fill_rect(Rect::new(x, y, scalex, scaley))
                        .map_err(SdlError)?;
                }
            }
        }
        self.canvas.present();
        Ok(())
    }
}

/// A utility to process SDL key events and press/release the corresponding
/// buttons in the interpreter's input buffer.
///
/// A few keys outside of the keypad also control the interpreter itself:
/// Backspace reloads the program, P pauses and M switches modes.
struct Controller {
    /// The map from keycodes to Chip-8 keys.
    keymap: HashMap<Keycode, Key>,
}

impl Controller {
    /// Returns a controller with the default keymap.
    fn new() -> Self {
        use Keycode::*;
        use Key::*;

        Controller::with_keymap(hashmap![
            Num1 => K1,
            Num2 => K2,
            Num3 => K3,
            Num4 => KC,
            Q => K4,
            W => K5,
            E => K6,
            R => KD,
            A => K7,
            S => K8,
            D => K9,
            F => KE,
            Z => KA,
            X => K0,
            C => KB,
            V => KF,
        ])
    }

    /// Returns a controller with the given keymap.
    fn with_keymap(keymap: HashMap<Keycode, Key>) -> Self {
        Controller { keymap }
    }

    /// Processes the given SDL event, applying the corresponding action to the
    /// given interpreter.
    fn process(&self, event: Event, interpreter: &mut Interpreter) {
        match event {
            Event::KeyDown {
                keycode: Some(key),
                repeat,
                ..
            } => {
                if let Some(&key) = self.keymap.get(&key) {
                    interpreter.input_mut().press(key);
                } else if !repeat {
                    self.command(key, interpreter);
                }
            }
            Event::KeyUp {
                keycode: Some(key), ..
            } => if let Some(&key) = self.keymap.get(&key) {
                interpreter.input_mut().release(key);
            },
            _ => {}
        }
    }

    /// Runs the interpreter command bound to the given key, if there is one.
    fn command(&self, key: Keycode, interpreter: &mut Interpreter) {
        match key {
            Keycode::Backspace => interpreter.reload(),
            Keycode::P => interpreter.pause(),
            Keycode::M => {
                let mode = Mode::from(!interpreter.mode().is_extended());
                interpreter.set_mode(mode);
            }
            _ => {}
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Controller::new()
    }
}

fn main() {
    let matches = App::new("superchip")
        .version(VERSION)
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("A Chip-8/Super-Chip interpreter")
        .help_message("show this help message and exit")
        .version_message("show version information and exit")
        .arg(
            Arg::with_name("clip")
                .short("c")
                .long("clip")
                .help("clip sprites at the screen edges instead of wrapping"),
        )
        .arg(
            Arg::with_name("extended")
                .short("x")
                .long("extended")
                .help("start in Super-Chip mode"),
        )
        .arg(
            Arg::with_name("frequency")
                .long("frequency")
                .value_name("FREQ")
                .help("set frame rate (in Hz)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ipf")
                .short("i")
                .long("ipf")
                .value_name("N")
                .help("set number of instructions executed per frame")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("scale")
                .short("s")
                .long("scale")
                .value_name("SCALE")
                .help("set game display scale")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase verbosity"),
        )
        .arg(
            Arg::with_name("FILE")
                .help("set the program file to run")
                .required(true)
                .index(1),
        )
        .get_matches();

    let verbosity = matches.occurrences_of("verbose");
    let filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, filter)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.causes().skip(1) {
            info!("caused by: {}", cause);
        }
        trace!("backtrace: {}", e.backtrace());
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut opts = Options::new();
    process_opts(&mut opts, matches)?;
    let scale = matches
        .value_of("scale")
        .map(|n| n.parse::<u32>())
        .unwrap_or(Ok(6))
        .context("invalid scale argument")?;
    let ipf = matches
        .value_of("ipf")
        .map(|n| n.parse::<u32>())
        .unwrap_or(Ok(10))
        .context("invalid instructions per frame argument")?;
    let frequency = matches
        .value_of("frequency")
        .map(|n| n.parse::<u32>())
        .unwrap_or(Ok(60))
        .context("invalid frequency argument")?;
    if frequency == 0 {
        bail!("frame rate must be positive");
    }

    let filename = matches.value_of("FILE").unwrap();
    let mut input =
        File::open(filename).with_context(|_| format!("could not open file '{}'", filename))?;
    let mut interpreter = Interpreter::with_options(opts);
    interpreter
        .load_program(&mut input)
        .with_context(|_| format!("could not load program from file '{}'", filename))?;

    let sdl_context = sdl2::init()
        .map_err(SdlError)
        .context("could not initialize SDL")?;
    let video_subsystem = sdl_context
        .video()
        .map_err(SdlError)
        .context("could not initialize SDL video subsystem")?;
    let mut event_pump = sdl_context
        .event_pump()
        .map_err(SdlError)
        .context("could not initialize SDL event loop")?;
    let mut display = Display::new(
        video_subsystem,
        display::WIDTH as u32 * scale,
        display::HEIGHT as u32 * scale,
        Color::RGB(0, 0, 0),
        Color::RGB(255, 255, 255),
    )?;
    let controller = Controller::new();
    let mut clock = Clock::new(frequency);

    'main: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,
                Event::Window { .. } => interpreter.display_mut().force_refresh(),
                e => controller.process(e, &mut interpreter),
            }
        }

        for _ in 0..clock.lap().min(MAX_CATCH_UP) {
            for _ in 0..ipf {
                // The interpreter logs the fault itself and stays stopped
                // until it is reloaded.
                if interpreter.cycle().is_err() {
                    info!("press Backspace to reload the program");
                    break;
                }
            }
            interpreter.tick();
        }

        interpreter
            .display_mut()
            .refresh(|buf| display.draw(buf))
            .context("could not refresh display window")?;
        thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}

/// Processes the command-line arguments and changes the necessary fields of
/// the given interpreter options.
fn process_opts(opts: &mut Options, matches: &ArgMatches) -> Result<(), Error> {
    if matches.is_present("extended") {
        opts.mode = Mode::Extended;
    }
    if matches.is_present("clip") {
        opts.clip_sprites = true;
    }

    Ok(())
}
